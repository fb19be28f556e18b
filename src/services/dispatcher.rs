//! Batch dispatch.
//!
//! Sends the batch message to every address on the dispatch list through the
//! gateway adapter with bounded concurrency, appending each result to the
//! ledger as soon as its attempt completes.
//!
//! Ordering: results are appended and returned in completion order. With a
//! concurrency of 1 this is dispatch-list order; otherwise callers that need
//! submission order must sort by their own recipient index.

use std::sync::{Arc, OnceLock};

use futures_util::stream::{self, StreamExt};
use uuid::Uuid;

use super::pacing::Pacer;
use super::resolver::Resolution;
use crate::error::{AppError, AppResult};
use crate::gateway::GatewayAdapter;
use crate::ledger::DynDeliveryLedger;
use crate::models::{Channel, DeliveryResult, NotificationBatch, OverallStatus};

/// Results of one dispatch run
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub results: Vec<DeliveryResult>,
    pub overall_status: OverallStatus,
}

/// Drives delivery of one batch
#[derive(Clone)]
pub struct Dispatcher {
    gateways: GatewayAdapter,
    ledger: DynDeliveryLedger,
    pacer: Arc<Pacer>,
    concurrency: usize,
}

impl Dispatcher {
    pub fn new(
        gateways: GatewayAdapter,
        ledger: DynDeliveryLedger,
        pacer: Arc<Pacer>,
        concurrency: usize,
    ) -> Self {
        Self {
            gateways,
            ledger,
            pacer,
            concurrency: concurrency.max(1),
        }
    }

    /// Attempts every resolved recipient once and records every outcome.
    ///
    /// Unresolved entries are recorded first, without a gateway call. A single
    /// failed delivery never stops the batch. A provider configuration fault
    /// does: that recipient and every one not yet started fail with the
    /// same reason and no further calls are made.
    pub async fn run(
        &self,
        batch: &NotificationBatch,
        resolution: Resolution,
    ) -> AppResult<DispatchOutcome> {
        let mut results = Vec::with_capacity(resolution.expected_results());
        let mut ledger_error = None;

        for failure in resolution.pre_dispatch_failures {
            let result = failure.into_result();
            log::warn!(
                "Batch {}: not dispatching to '{}': {}",
                batch.id,
                result.recipient,
                result.error.as_deref().unwrap_or_default()
            );
            self.record(batch.id, &result, &mut ledger_error).await;
            results.push(result);
        }

        let breaker = OnceLock::new();
        let breaker = &breaker;
        let channel = batch.channel;
        let message = batch.message.as_str();

        let mut attempts = stream::iter(resolution.dispatch_list)
            .map(|recipient| self.attempt(batch.id, channel, recipient, message, breaker))
            .buffer_unordered(self.concurrency);

        while let Some(result) = attempts.next().await {
            if let Some(error) = &result.error {
                log::warn!(
                    "Batch {}: delivery to {} failed: {}",
                    batch.id,
                    result.recipient,
                    error
                );
            }
            self.record(batch.id, &result, &mut ledger_error).await;
            results.push(result);
        }

        if let Some(e) = ledger_error {
            return Err(e);
        }

        Ok(DispatchOutcome {
            overall_status: OverallStatus::from_results(&results),
            results,
        })
    }

    async fn attempt(
        &self,
        batch_id: Uuid,
        channel: Channel,
        recipient: String,
        message: &str,
        breaker: &OnceLock<String>,
    ) -> DeliveryResult {
        if let Some(reason) = breaker.get() {
            return DeliveryResult::failure(recipient, reason.clone());
        }

        self.pacer.wait_turn(channel).await;

        // The breaker may have tripped while this attempt waited for its slot
        if let Some(reason) = breaker.get() {
            return DeliveryResult::failure(recipient, reason.clone());
        }

        match self.gateways.send_one(channel, &recipient, message).await {
            Ok(result) => result,
            Err(e) => {
                let reason = format!("provider configuration error: {}", e);
                if breaker.set(reason.clone()).is_ok() {
                    log::error!(
                        "Batch {}: {} provider misconfigured, skipping remaining recipients: {}",
                        batch_id,
                        channel,
                        e
                    );
                }
                DeliveryResult::failure(recipient, reason)
            }
        }
    }

    /// Appends a result, keeping the first ledger error for the caller.
    /// Dispatch continues because messages already sent cannot be recalled.
    async fn record(
        &self,
        batch_id: Uuid,
        result: &DeliveryResult,
        ledger_error: &mut Option<AppError>,
    ) {
        if let Err(e) = self.ledger.append_result(batch_id, result).await {
            log::error!(
                "Batch {}: failed to record result for {}: {}",
                batch_id,
                result.recipient,
                e
            );
            ledger_error.get_or_insert(e);
        }
    }
}

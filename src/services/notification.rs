//! Notification request handler: the single entry point for batch submission.

use std::sync::Arc;

use uuid::Uuid;

use super::directory::DynContactDirectory;
use super::dispatcher::Dispatcher;
use super::pacing::Pacer;
use super::resolver::RecipientResolver;
use crate::config::DispatchConfig;
use crate::error::{AppError, AppResult};
use crate::gateway::GatewayAdapter;
use crate::ledger::DynDeliveryLedger;
use crate::models::{
    BatchFilter, BatchOutcome, BatchSummary, Channel, CreateBatchRequest, NewBatch,
    NotificationBatch, OverallStatus,
};
use crate::pagination::{OffsetPaginatedResponse, PageParams};

/// A request that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub channel: Channel,
    pub message: String,
    pub recipients: Vec<String>,
}

pub struct NotificationService {
    gateways: GatewayAdapter,
    ledger: DynDeliveryLedger,
    resolver: RecipientResolver,
    dispatcher: Dispatcher,
    limits: DispatchConfig,
}

impl NotificationService {
    /// Wires the pipeline with a pacer built from `config`
    pub fn new(
        config: &DispatchConfig,
        gateways: GatewayAdapter,
        ledger: DynDeliveryLedger,
        directory: DynContactDirectory,
    ) -> Self {
        Self::with_pacer(
            config,
            gateways,
            ledger,
            directory,
            Arc::new(Pacer::new(config)),
        )
    }

    pub fn with_pacer(
        config: &DispatchConfig,
        gateways: GatewayAdapter,
        ledger: DynDeliveryLedger,
        directory: DynContactDirectory,
        pacer: Arc<Pacer>,
    ) -> Self {
        let dispatcher = Dispatcher::new(
            gateways.clone(),
            ledger.clone(),
            pacer,
            config.concurrency,
        );

        Self {
            gateways,
            ledger,
            resolver: RecipientResolver::new(directory),
            dispatcher,
            limits: config.clone(),
        }
    }

    /// Checks a request before anything is persisted
    pub fn validate(&self, request: CreateBatchRequest) -> AppResult<ValidatedRequest> {
        let channel: Channel = request.channel.parse()?;

        let message = request.message.trim();
        if message.is_empty() {
            return Err(AppError::Validation("message must not be empty".to_string()));
        }

        let length = message.chars().count();
        if length > self.limits.max_message_length {
            return Err(AppError::Validation(format!(
                "message is {} characters long, the limit is {}",
                length, self.limits.max_message_length
            )));
        }

        if request.recipients.is_empty() {
            return Err(AppError::Validation(
                "recipients must not be empty".to_string(),
            ));
        }

        if request.recipients.len() > self.limits.max_recipients_per_batch {
            return Err(AppError::Validation(format!(
                "a batch may have at most {} recipients, got {}",
                self.limits.max_recipients_per_batch,
                request.recipients.len()
            )));
        }

        if !self.gateways.supports(channel) {
            return Err(AppError::ProviderConfiguration(format!(
                "no provider is configured for the {} channel",
                channel
            )));
        }

        Ok(ValidatedRequest {
            channel,
            message: message.to_string(),
            recipients: request.recipients,
        })
    }

    /// Validates, records, resolves, dispatches and finalizes one batch
    pub async fn submit(
        &self,
        request: CreateBatchRequest,
        submitted_by: &str,
    ) -> AppResult<BatchOutcome> {
        let request = self.validate(request)?;

        let batch = self
            .ledger
            .create(NewBatch {
                channel: request.channel,
                message: request.message,
                recipients: request.recipients,
                submitted_by: submitted_by.to_string(),
            })
            .await?;

        log::info!(
            "Batch {} accepted: {} message to {} recipient entries from {}",
            batch.id,
            batch.channel,
            batch.recipients.len(),
            batch.submitted_by
        );

        let resolution = match self.resolver.resolve(batch.channel, &batch.recipients).await {
            Ok(resolution) => resolution,
            Err(e) => {
                self.abandon(&batch).await;
                return Err(e);
            }
        };

        let outcome = match self.dispatcher.run(&batch, resolution).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.abandon(&batch).await;
                return Err(e);
            }
        };

        let finalized = self.ledger.finalize(batch.id, outcome.overall_status).await?;

        let succeeded = finalized.results.iter().filter(|r| r.is_success()).count();
        log::info!(
            "Batch {} finished as {}: {} delivered, {} failed",
            finalized.id,
            finalized.overall_status,
            succeeded,
            finalized.results.len() - succeeded
        );

        Ok(finalized.into())
    }

    pub async fn get_batch(&self, batch_id: Uuid) -> AppResult<NotificationBatch> {
        self.ledger.get_by_id(batch_id).await
    }

    pub async fn list_batches(
        &self,
        filter: &BatchFilter,
        page: PageParams,
    ) -> AppResult<OffsetPaginatedResponse<BatchSummary>> {
        let batches = self.ledger.list(filter, page.clamped()).await?;
        Ok(batches.map(|b| b.to_summary()))
    }

    pub fn gateways(&self) -> &GatewayAdapter {
        &self.gateways
    }

    pub async fn ledger_healthy(&self) -> bool {
        self.ledger.health_check().await
    }

    /// Closes a batch that could not run to completion so it never stays
    /// pending. The status reflects whatever results were recorded.
    async fn abandon(&self, batch: &NotificationBatch) {
        let status = match self.ledger.get_by_id(batch.id).await {
            Ok(stored) => OverallStatus::from_results(&stored.results),
            Err(_) => OverallStatus::Failed,
        };

        if let Err(e) = self.ledger.finalize(batch.id, status).await {
            log::error!("Batch {}: failed to close after error: {}", batch.id, e);
        } else {
            log::warn!("Batch {} closed early as {}", batch.id, status);
        }
    }
}

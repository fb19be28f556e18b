//! Notification batch models for the delivery ledger.
//!
//! A batch is one message sent over one channel to many recipients. Each
//! attempted (or unresolvable) recipient gets exactly one `DeliveryResult`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

// =============================================================================
// Channel Enum
// =============================================================================

/// Transport used for a whole batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Sms,
    Whatsapp,
    Email,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Sms, Channel::Whatsapp, Channel::Email];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Sms => "sms",
            Channel::Whatsapp => "whatsapp",
            Channel::Email => "email",
        }
    }

    /// SMS and WhatsApp address recipients by phone number
    pub fn is_phone_based(&self) -> bool {
        matches!(self, Channel::Sms | Channel::Whatsapp)
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Channel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sms" => Ok(Channel::Sms),
            "whatsapp" => Ok(Channel::Whatsapp),
            "email" => Ok(Channel::Email),
            "" => Err(AppError::Validation("channel is required".to_string())),
            other => Err(AppError::Validation(format!(
                "Unsupported channel '{}', expected one of: sms, whatsapp, email",
                other
            ))),
        }
    }
}

// =============================================================================
// Delivery Result
// =============================================================================

/// Outcome of one delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Success,
    Failed,
}

/// Result of delivering the batch message to one recipient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryResult {
    /// Normalized address (or the original entry when it never resolved)
    pub recipient: String,
    pub status: DeliveryStatus,
    /// Present only when `status` is `failed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub attempted_at: DateTime<Utc>,
}

impl DeliveryResult {
    /// Creates a successful result
    pub fn success(recipient: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            status: DeliveryStatus::Success,
            error: None,
            attempted_at: Utc::now(),
        }
    }

    /// Creates a failed result
    pub fn failure(recipient: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            status: DeliveryStatus::Failed,
            error: Some(error.into()),
            attempted_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == DeliveryStatus::Success
    }
}

// =============================================================================
// Overall Status
// =============================================================================

/// Batch-level status, derived from the results once dispatch completes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Pending,
    Sent,
    PartiallyFailed,
    Failed,
}

impl OverallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverallStatus::Pending => "pending",
            OverallStatus::Sent => "sent",
            OverallStatus::PartiallyFailed => "partially_failed",
            OverallStatus::Failed => "failed",
        }
    }

    /// `sent` iff every result succeeded, `failed` iff every result failed,
    /// `partially_failed` otherwise. A batch with no results delivered nothing
    /// and counts as `failed`.
    pub fn from_results(results: &[DeliveryResult]) -> Self {
        let succeeded = results.iter().filter(|r| r.is_success()).count();

        if results.is_empty() || succeeded == 0 {
            OverallStatus::Failed
        } else if succeeded == results.len() {
            OverallStatus::Sent
        } else {
            OverallStatus::PartiallyFailed
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, OverallStatus::Pending)
    }
}

impl std::fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Notification Batch
// =============================================================================

/// Persisted audit record of one batch
#[derive(Debug, Clone, Serialize)]
pub struct NotificationBatch {
    pub id: Uuid,
    pub channel: Channel,
    pub message: String,
    /// Entries as submitted, before resolution
    pub recipients: Vec<String>,
    /// Appended in attempt completion order
    pub results: Vec<DeliveryResult>,
    pub overall_status: OverallStatus,
    pub submitted_by: String,
    pub created_at: DateTime<Utc>,
    pub finalized_at: Option<DateTime<Utc>>,
}

/// Input for creating a batch in the ledger
#[derive(Debug, Clone)]
pub struct NewBatch {
    pub channel: Channel,
    pub message: String,
    pub recipients: Vec<String>,
    pub submitted_by: String,
}

impl NewBatch {
    /// Builds the initial pending record with a fresh id
    pub fn into_batch(self) -> NotificationBatch {
        NotificationBatch {
            id: Uuid::new_v4(),
            channel: self.channel,
            message: self.message,
            recipients: self.recipients,
            results: Vec::new(),
            overall_status: OverallStatus::Pending,
            submitted_by: self.submitted_by,
            created_at: Utc::now(),
            finalized_at: None,
        }
    }
}

/// Filters for listing batch history
#[derive(Debug, Clone, Default)]
pub struct BatchFilter {
    pub channel: Option<Channel>,
    pub status: Option<OverallStatus>,
    pub submitted_by: Option<String>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
}

impl BatchFilter {
    /// In-process equivalent of the ledger's SQL filter
    pub fn matches(&self, batch: &NotificationBatch) -> bool {
        self.channel.is_none_or(|c| batch.channel == c)
            && self.status.is_none_or(|s| batch.overall_status == s)
            && self
                .submitted_by
                .as_deref()
                .is_none_or(|s| batch.submitted_by == s)
            && self.created_after.is_none_or(|t| batch.created_at >= t)
            && self.created_before.is_none_or(|t| batch.created_at < t)
    }
}

// =============================================================================
// Request / Response DTOs
// =============================================================================

/// DTO for submitting a batch
///
/// Fields default to empty so that missing values surface as validation
/// errors from the handler instead of JSON decoding errors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateBatchRequest {
    #[serde(default, alias = "type")]
    pub channel: String,
    #[serde(default)]
    pub recipients: Vec<String>,
    #[serde(default)]
    pub message: String,
}

/// Aggregate result returned to the submitter
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub batch_id: Uuid,
    pub overall_status: OverallStatus,
    pub results: Vec<DeliveryResult>,
}

impl From<NotificationBatch> for BatchOutcome {
    fn from(batch: NotificationBatch) -> Self {
        Self {
            batch_id: batch.id,
            overall_status: batch.overall_status,
            results: batch.results,
        }
    }
}

/// Summary row for history listings (omits the per-recipient results)
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub id: Uuid,
    pub channel: Channel,
    pub message: String,
    pub recipient_count: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub overall_status: OverallStatus,
    pub submitted_by: String,
    pub created_at: DateTime<Utc>,
    pub finalized_at: Option<DateTime<Utc>>,
}

impl NotificationBatch {
    pub fn to_summary(&self) -> BatchSummary {
        let success_count = self.results.iter().filter(|r| r.is_success()).count();
        BatchSummary {
            id: self.id,
            channel: self.channel,
            message: self.message.clone(),
            recipient_count: self.recipients.len(),
            success_count,
            failure_count: self.results.len() - success_count,
            overall_status: self.overall_status,
            submitted_by: self.submitted_by.clone(),
            created_at: self.created_at,
            finalized_at: self.finalized_at,
        }
    }
}

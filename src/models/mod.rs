pub mod api_token;
pub mod contact;
pub mod notification;

pub use api_token::{ApiToken, CreateApiToken};
pub use contact::{ContactCard, EntityKind, EntityRef};
pub use notification::{
    BatchFilter, BatchOutcome, BatchSummary, Channel, CreateBatchRequest, DeliveryResult,
    DeliveryStatus, NewBatch, NotificationBatch, OverallStatus,
};

pub mod api_token;
pub mod directory;
pub mod dispatcher;
pub mod notification;
pub mod pacing;
pub mod resolver;

pub use api_token::ApiTokenService;
pub use directory::{ContactDirectory, DynContactDirectory, MemoryDirectory, PgContactDirectory};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use notification::{NotificationService, ValidatedRequest};
pub use pacing::Pacer;
pub use resolver::{PreDispatchFailure, RecipientResolver, Resolution};

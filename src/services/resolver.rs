//! Recipient resolution.
//!
//! Turns the submitted recipient entries into a deduplicated dispatch list of
//! canonical addresses, plus the entries that could not be resolved.

use std::collections::HashSet;

use uuid::Uuid;

use super::directory::DynContactDirectory;
use crate::error::{AppError, AppResult};
use crate::models::{Channel, DeliveryResult, EntityKind, EntityRef};

/// E.164 allows at most 15 digits; shorter than 8 is never a reachable mobile
const MIN_PHONE_DIGITS: usize = 8;
const MAX_PHONE_DIGITS: usize = 15;

/// An entry that will not be dispatched, and why
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreDispatchFailure {
    pub original: String,
    pub reason: String,
}

impl PreDispatchFailure {
    fn new(original: &str, reason: impl Into<String>) -> Self {
        Self {
            original: original.to_string(),
            reason: reason.into(),
        }
    }

    /// Failed result recorded on the batch in place of a delivery attempt
    pub fn into_result(self) -> DeliveryResult {
        DeliveryResult::failure(
            self.original,
            format!("unresolved address: {}", self.reason),
        )
    }
}

/// Output of resolving one batch's recipients
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Canonical addresses, first-seen order, no duplicates
    pub dispatch_list: Vec<String>,
    pub pre_dispatch_failures: Vec<PreDispatchFailure>,
}

impl Resolution {
    /// Number of results the batch will hold once dispatch completes
    pub fn expected_results(&self) -> usize {
        self.dispatch_list.len() + self.pre_dispatch_failures.len()
    }
}

/// Expands entity references and normalizes addresses for a channel
#[derive(Clone)]
pub struct RecipientResolver {
    directory: DynContactDirectory,
}

impl RecipientResolver {
    pub fn new(directory: DynContactDirectory) -> Self {
        Self { directory }
    }

    pub async fn resolve(&self, channel: Channel, entries: &[String]) -> AppResult<Resolution> {
        if entries.is_empty() {
            return Err(AppError::Validation(
                "recipients must not be empty".to_string(),
            ));
        }

        let mut resolution = Resolution::default();
        let mut seen_addresses = HashSet::new();
        let mut seen_failures = HashSet::new();

        for entry in entries {
            let outcome = match parse_entity_ref(entry) {
                Some(Ok(entity)) => self.expand(channel, entity).await?,
                Some(Err(reason)) => Err(reason),
                None => Ok(entry.trim().to_string()),
            };

            match outcome.and_then(|raw| normalize_address(channel, &raw)) {
                Ok(address) => {
                    if seen_addresses.insert(address.clone()) {
                        resolution.dispatch_list.push(address);
                    }
                }
                Err(reason) => {
                    if seen_failures.insert(entry.as_str()) {
                        resolution
                            .pre_dispatch_failures
                            .push(PreDispatchFailure::new(entry, reason));
                    }
                }
            }
        }

        Ok(resolution)
    }

    /// Looks up the raw address on file for an entity.
    /// The outer error is infrastructure; the inner one is a resolution failure.
    async fn expand(
        &self,
        channel: Channel,
        entity: EntityRef,
    ) -> AppResult<Result<String, String>> {
        let card = match self.directory.lookup(entity).await? {
            Some(card) => card,
            None => return Ok(Err(format!("unknown {}", entity.kind))),
        };

        Ok(match card.address_for(channel) {
            Some(address) => Ok(address.to_string()),
            None if channel.is_phone_based() => Err("no phone number on file".to_string()),
            None => Err("no email address on file".to_string()),
        })
    }
}

/// Parses `student:<uuid>` / `staff:<uuid>`. Returns `None` for plain addresses.
pub fn parse_entity_ref(entry: &str) -> Option<Result<EntityRef, String>> {
    let (prefix, id) = entry.trim().split_once(':')?;

    let kind = match prefix.trim().to_ascii_lowercase().as_str() {
        "student" => EntityKind::Student,
        "staff" => EntityKind::Staff,
        _ => return None,
    };

    Some(
        Uuid::parse_str(id.trim())
            .map(|id| EntityRef { kind, id })
            .map_err(|_| format!("invalid {} id", kind)),
    )
}

/// Canonical form of an address for the channel
pub fn normalize_address(channel: Channel, raw: &str) -> Result<String, String> {
    if channel.is_phone_based() {
        normalize_phone(raw)
    } else {
        normalize_email(raw)
    }
}

/// Normalizes a phone number to `+<digits>`
///
/// Accepts digits with spaces, dashes, dots, parentheses and one leading `+`.
/// A leading `00` international prefix is treated like `+`.
pub fn normalize_phone(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("empty phone number".to_string());
    }

    let body = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if !body
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '.' | '(' | ')'))
    {
        return Err("invalid phone number".to_string());
    }

    let digits: String = body.chars().filter(|c| c.is_ascii_digit()).collect();
    let digits = match digits.strip_prefix("00") {
        Some(rest) if !trimmed.starts_with('+') => rest.to_string(),
        _ => digits,
    };

    if digits.starts_with('0') {
        return Err("invalid phone number: missing country code".to_string());
    }
    if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits.len()) {
        return Err(format!(
            "invalid phone number: expected {}-{} digits",
            MIN_PHONE_DIGITS, MAX_PHONE_DIGITS
        ));
    }

    Ok(format!("+{}", digits))
}

/// Normalizes an email address to lower case and checks its shape
pub fn normalize_email(raw: &str) -> Result<String, String> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err("empty email address".to_string());
    }
    if !is_valid_email(&email) {
        return Err("invalid email address".to_string());
    }
    Ok(email)
}

fn is_valid_email(email: &str) -> bool {
    // Must have exactly one @
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return false;
    }
    let (local, domain) = (parts[0], parts[1]);

    if local.is_empty() || local.len() > 64 || local.chars().any(char::is_whitespace) {
        return false;
    }

    if domain.is_empty() || domain.len() > 255 || !domain.contains('.') {
        return false;
    }

    // Catches "user@.com", "user@domain." and "user@a..com"
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.iter().any(|l| l.is_empty()) {
        return false;
    }

    if !domain
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
    {
        return false;
    }

    labels.last().is_some_and(|tld| tld.len() >= 2)
}

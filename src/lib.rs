//! Schoolcast
//!
//! Bulk notification dispatch for school administration: resolves recipients,
//! fans a message out over SMS, WhatsApp or email, and keeps a delivery
//! ledger of every batch. The library is exposed for the binary and tests.

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod ledger;
pub mod models;
pub mod pagination;
pub mod routes;
pub mod services;

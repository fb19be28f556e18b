pub mod health;
pub mod notifications;
pub mod tokens;

use actix_web::web;

use crate::error::AppError;

/// Maximum accepted JSON body size
const JSON_LIMIT: usize = 1024 * 1024;

/// JSON extractor config: body errors use the same error shape as the handlers
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err, _req| {
            AppError::Validation(format!("Invalid JSON body: {}", err)).into()
        })
}

/// Query extractor config, same treatment as `json_config`
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        AppError::Validation(format!("Invalid query parameters: {}", err)).into()
    })
}

/// Path extractor config: malformed ids are reported as not found
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|err, _req| AppError::NotFound(format!("Invalid path: {}", err)).into())
}

/// Registers every route with its extractor configs
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .configure(health::configure)
        .configure(notifications::configure)
        .configure(tokens::configure);
}

use actix_web::{error::JsonPayloadError, web, HttpRequest};

use crate::error::RelayError;
use crate::web::handlers;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(web::JsonConfig::default().error_handler(json_error))
            .route("/ai", web::post().to(handlers::ai))
            .route("/config", web::get().to(handlers::config)),
    )
    .route("/health", web::get().to(handlers::health_check));
}

// Undecodable bodies get the same `{ "error": ... }` shape as other failures
fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    RelayError::InvalidInput(format!("Invalid JSON body: {}", err)).into()
}

//! HTTP surface.
//!
//! Three JSON endpoints mirror the service operations, and `/` serves a
//! single embedded page that calls them.

mod error;
mod handlers;

pub use error::ErrorBody;
pub use handlers::CodeRequest;

use actix_web::{error::InternalError, web, App, HttpResponse, HttpServer};
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::service::CodeService;

/// Register every route on `cfg`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::index))
        .route("/analyze", web::post().to(handlers::analyze))
        .route("/complexity", web::post().to(handlers::complexity))
        .route("/improve", web::post().to(handlers::improve));
}

/// JSON extractor settings: body limit, and malformed bodies answered as
/// `400 {"error": "Invalid request: ..."}`.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| {
            let detail = err.to_string();
            warn!(error = %detail, "rejected request body");
            let response = HttpResponse::BadRequest().json(ErrorBody {
                error: format!("Invalid request: {}", detail),
            });
            InternalError::from_response(err, response).into()
        })
}

/// Serve until the process is stopped.
pub async fn run(config: &ServerConfig, service: CodeService) -> std::io::Result<()> {
    let ai = service.has_generator();
    let service = web::Data::new(service);
    let limit = config.max_body_bytes;

    let server = HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .app_data(json_config(limit))
            .configure(configure)
    })
    .bind((config.host.as_str(), config.port))?;

    info!(host = %config.host, port = config.port, ai, "codexplain listening");
    server.run().await
}

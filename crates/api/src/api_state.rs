use actix_web::web;

use crate::core_services::CoreServices;
use crate::health;
use crate::response::ApiResponse;

#[derive(Clone, Copy)]
pub struct ApiConfiguration {
    pub enable_docs: bool,
}

impl Default for ApiConfiguration {
    fn default() -> Self {
        Self { enable_docs: false }
    }
}

pub fn configure_app(cfg: &mut web::ServiceConfig, services: web::Data<CoreServices>) {
    configure_app_with_options(cfg, services, ApiConfiguration::default());
}

/// Wires the ambient HTTP boundary: a health check bound to `services`, plus
/// a catch-all 404. The emulated service endpoints that would exercise
/// `CoreServices`'s isolation/orchestration surface live outside this crate's
/// scope.
pub fn configure_app_with_options(
    cfg: &mut web::ServiceConfig,
    services: web::Data<CoreServices>,
    _options: ApiConfiguration,
) {
    cfg.app_data(services)
        .service(health::public_health_check)
        .service(health::admin_health_check);

    async fn not_found_handler() -> impl actix_web::Responder {
        ApiResponse::<()>::not_found("API resource not found")
    }
    let scope = web::scope("").default_service(web::route().to(not_found_handler));
    cfg.service(scope);
}

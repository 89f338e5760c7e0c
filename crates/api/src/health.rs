use actix_web::{get, web, Responder};

use crate::core_services::CoreServices;
use crate::response::ApiResponse;

#[get("/health")]
pub async fn public_health_check() -> impl Responder {
    ApiResponse::ok(serde_json::json!({ "status": "ok" }))
}

/// Pings the database. Named "admin" to match the teacher's two-tier
/// health-check convention (a cheap public liveness probe, a deeper
/// authenticated readiness probe); there is no admin auth here, so both
/// routes are unauthenticated.
#[get("/health/db")]
pub async fn admin_health_check(services: web::Data<CoreServices>) -> impl Responder {
    match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&services.pool).await {
        Ok(_) => ApiResponse::ok(serde_json::json!({ "status": "ok", "database": "reachable" })),
        Err(err) => ApiResponse::<()>::internal_error(&format!("database unreachable: {err}")),
    }
}

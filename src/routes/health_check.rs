use actix_web::HttpResponse;

use crate::context::RequestContext;

/// GET /health_check
///
/// Liveness only; the session store is not probed.
pub async fn health_check(ctx: RequestContext) -> HttpResponse {
    tracing::debug!(request_id = %ctx.request_id, "Health check endpoint called");
    HttpResponse::Ok().finish()
}

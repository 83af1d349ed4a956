use axum::{body::Body, http::Request, middleware::Next, response::Response};
use tracelog_types::Identity;

use crate::api::ApiError;

/// Header carrying the caller identity.
pub const CALLER_HEADER: &str = "X-Tracelog-Caller";

/// The authenticated caller of a request, stored in request extensions.
#[derive(Clone, Debug)]
pub struct Caller(pub Identity);

/// Middleware that resolves the caller via `X-Tracelog-Caller` or
/// `Authorization: Bearer`.
///
/// The header value is taken as the caller identity as-is. Whether that
/// identity may do anything is decided by the tracing service, not here;
/// this layer only rejects requests that name no caller at all.
pub async fn caller_middleware(mut req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let caller = extract_caller(&req).ok_or(ApiError::MissingCaller)?;
    req.extensions_mut().insert(Caller(caller));
    Ok(next.run(req).await)
}

fn extract_caller(req: &Request<Body>) -> Option<Identity> {
    let raw = if let Some(val) = req.headers().get(CALLER_HEADER) {
        val.to_str().ok()?
    } else {
        let val = req.headers().get(axum::http::header::AUTHORIZATION)?;
        val.to_str().ok()?.strip_prefix("Bearer ")?
    };

    let raw = raw.trim();
    if raw.is_empty() {
        None
    } else {
        Some(Identity::new(raw))
    }
}

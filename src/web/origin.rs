//! Origin gate
//!
//! Browser requests are only let through when their `Origin` header is on a
//! fixed allow-list. Requests without an `Origin` (curl, server-to-server)
//! always pass. `enforce` answers foreign origins with a JSON 403; the CORS
//! headers and preflight answers for allowed origins come from `cors`.

use actix_cors::Cors;
use actix_web::{
    body::{EitherBody, MessageBody},
    dev::{ServiceRequest, ServiceResponse},
    http::{header, Method},
    middleware::Next,
    web, Error, HttpResponse,
};
use log::warn;
use serde_json::json;

#[derive(Debug, Clone)]
pub struct OriginGate {
    allowed: Vec<String>,
}

impl OriginGate {
    pub fn new(allowed: Vec<String>) -> Self {
        Self { allowed }
    }

    /// Exact match against the allow-list; a missing origin is allowed.
    pub fn is_allowed(&self, origin: Option<&str>) -> bool {
        match origin {
            None => true,
            Some(origin) => self.allowed.iter().any(|a| a == origin),
        }
    }
}

/// CORS policy for the origins the gate lets through.
pub fn cors(gate: OriginGate) -> Cors {
    Cors::default()
        .allowed_origin_fn(move |origin, _req| {
            origin
                .to_str()
                .map(|o| gate.is_allowed(Some(o)))
                .unwrap_or(false)
        })
        .allowed_methods([Method::GET, Method::POST])
        .allow_any_header()
}

/// Middleware enforcing the `OriginGate` registered as app data.
pub async fn enforce(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<EitherBody<impl MessageBody>>, Error> {
    let gate = match req.app_data::<web::Data<OriginGate>>() {
        Some(gate) => gate.clone(),
        None => return Ok(next.call(req).await?.map_into_left_body()),
    };

    // A present but unreadable header never counts as a missing one
    let blocked = match req.headers().get(header::ORIGIN) {
        None => None,
        Some(value) => match value.to_str() {
            Ok(origin) if gate.is_allowed(Some(origin)) => None,
            Ok(origin) => Some(origin.to_string()),
            Err(_) => Some(String::from_utf8_lossy(value.as_bytes()).into_owned()),
        },
    };

    match blocked {
        None => Ok(next.call(req).await?.map_into_left_body()),
        Some(origin) => {
            warn!("CORS blocked for origin: {}", origin);
            let response = HttpResponse::Forbidden().json(json!({
                "error": format!("CORS blocked for origin: {}", origin),
            }));
            Ok(req.into_response(response).map_into_right_body())
        }
    }
}

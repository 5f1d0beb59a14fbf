//! Request Context Extractor
//!
//! Pulls tenant and actor identity out of the headers the upstream auth
//! gateway stamps on every request. This server trusts them as-is.

use axum::{extract::FromRequestParts, http::request::Parts};

use shared::error::AppError;

/// Identity attached to a request.
///
/// `X-Tenant-Id` is mandatory; `X-Actor-Id` and `X-Actor-Name` travel along
/// when a staff member is acting.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub tenant_id: String,
    pub actor_id: Option<String>,
    pub actor_name: Option<String>,
}

impl RequestContext {
    /// Identity recorded as transition provenance. Falls back to the actor
    /// name, then to "anonymous" for customer-facing flows with no staff.
    pub fn actor(&self) -> &str {
        self.actor_id
            .as_deref()
            .or(self.actor_name.as_deref())
            .unwrap_or("anonymous")
    }
}

fn header_value(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Check if already extracted (from another extractor on the same request)
        if let Some(context) = parts.extensions.get::<RequestContext>() {
            return Ok(context.clone());
        }

        let tenant_id = header_value(parts, "x-tenant-id")
            .ok_or_else(|| AppError::validation("Missing X-Tenant-Id header"))?;

        let context = RequestContext {
            tenant_id,
            actor_id: header_value(parts, "x-actor-id"),
            actor_name: header_value(parts, "x-actor-name"),
        };

        // Store in extensions for potential reuse
        parts.extensions.insert(context.clone());

        Ok(context)
    }
}

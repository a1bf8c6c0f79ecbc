//! Actor Extractor
//!
//! Reads the identity headers set by the upstream gateway. A missing
//! `x-actor-id` means no session; unparsable roles are rejected rather
//! than defaulted so a misconfigured gateway fails loudly.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::Actor;
use crate::utils::AppError;
use shared::models::Role;

fn header_str<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|h| h.to_str().ok())
}

fn header_flag(parts: &Parts, name: &str) -> bool {
    header_str(parts, name).is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Check if already extracted on this request
        if let Some(actor) = parts.extensions.get::<Actor>() {
            return Ok(actor.clone());
        }

        let user_id = match header_str(parts, "x-actor-id") {
            Some(id) if !id.trim().is_empty() => id.trim().to_string(),
            _ => return Err(AppError::Unauthorized),
        };

        let role: Role = match header_str(parts, "x-actor-role") {
            Some(raw) => raw
                .parse()
                .map_err(|_| AppError::Validation(format!("unknown role '{raw}'")))?,
            None => Role::Buyer,
        };

        let partner_level = header_str(parts, "x-actor-tier")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        let actor = Actor {
            user_id: user_id.clone(),
            name: header_str(parts, "x-actor-name")
                .map(str::to_string)
                .unwrap_or_else(|| user_id),
            role,
            partner_level,
            verified: header_flag(parts, "x-actor-verified"),
            bypass_quota: header_flag(parts, "x-actor-quota-bypass"),
            gateway_trusted: header_flag(parts, "x-actor-platinum"),
        };

        // Store in extensions for potential reuse
        parts.extensions.insert(actor.clone());

        Ok(actor)
    }
}

//! Identity extractor
//!
//! Builds [`CurrentUser`] from the trusted gateway headers. Missing tenant
//! or employee headers reject the request before any handler runs.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::{
    CurrentUser, EMPLOYEE_ID_HEADER, EMPLOYEE_NAME_HEADER, ROLE_HEADER, TENANT_HEADER,
};
use crate::core::ServerState;
use crate::security_log;
use crate::utils::AppError;

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        // Check if already extracted (from middleware)
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let Some(tenant_id) = header(parts, TENANT_HEADER) else {
            security_log!("WARN", "auth_missing_tenant", uri = format!("{:?}", parts.uri));
            return Err(AppError::Unauthorized);
        };
        let Some(employee_id) = header(parts, EMPLOYEE_ID_HEADER) else {
            security_log!("WARN", "auth_missing_employee", uri = format!("{:?}", parts.uri));
            return Err(AppError::Unauthorized);
        };

        let display_name = header(parts, EMPLOYEE_NAME_HEADER)
            .unwrap_or(employee_id)
            .to_string();
        let is_admin = header(parts, ROLE_HEADER)
            .map(|r| r.eq_ignore_ascii_case("admin"))
            .unwrap_or(false);

        let user = CurrentUser {
            tenant_id: tenant_id.to_string(),
            id: employee_id.to_string(),
            display_name,
            is_admin,
        };

        // Store in extensions for potential reuse
        parts.extensions.insert(user.clone());

        Ok(user)
    }
}

//! Caller identity as forwarded by the gateway.

use axum::extract::FromRequestParts;
use http::HeaderMap;
use http::request::Parts;
use uuid::Uuid;

use spriie_core::error::AppError;
use spriie_domain::user::UserRole;

pub const USER_ID_HEADER: &str = "x-spriie-user-id";
pub const USER_ROLE_HEADER: &str = "x-spriie-user-role";

/// Who is calling. Extraction fails with [`AppError::MissingIdentity`] when
/// either header is absent or unparsable; ownership is a use case concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityHeaders {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl IdentityHeaders {
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

        let user_id = header(USER_ID_HEADER)?.parse::<Uuid>().ok()?;
        let role = header(USER_ROLE_HEADER)?
            .parse::<u8>()
            .ok()
            .and_then(UserRole::from_u8)?;
        Some(Self { user_id, role })
    }
}

impl<S> FromRequestParts<S> for IdentityHeaders
where
    S: Send + Sync,
{
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let identity = Self::from_headers(&parts.headers);
        async move { identity.ok_or(AppError::MissingIdentity) }
    }
}

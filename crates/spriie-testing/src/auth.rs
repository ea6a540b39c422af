//! Mock auth helpers for tests.
//!
//! Services behind the gateway receive `x-spriie-user-id` + `x-spriie-user-role`
//! headers injected by the gateway. Tests build those headers directly so no
//! real gateway or session is needed.

use http::{HeaderMap, HeaderName, HeaderValue};
use uuid::Uuid;

use spriie_auth_types::identity::{IdentityHeaders, USER_ID_HEADER, USER_ROLE_HEADER};
use spriie_domain::user::UserRole;

/// Configurable identity injected into test requests.
pub struct MockAuth {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl MockAuth {
    pub fn new(user_id: Uuid, role: UserRole) -> Self {
        Self { user_id, role }
    }

    pub fn buyer(user_id: Uuid) -> Self {
        Self::new(user_id, UserRole::Buyer)
    }

    /// The extracted identity, for calling use cases directly.
    pub fn identity(&self) -> IdentityHeaders {
        IdentityHeaders {
            user_id: self.user_id,
            role: self.role,
        }
    }

    /// Return headers as if the gateway injected them.
    pub fn headers(&self) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(
            HeaderName::from_static(USER_ID_HEADER),
            HeaderValue::from_str(&self.user_id.to_string()).unwrap(),
        );
        map.insert(
            HeaderName::from_static(USER_ROLE_HEADER),
            HeaderValue::from(u16::from(self.role.as_u8())),
        );
        map
    }
}

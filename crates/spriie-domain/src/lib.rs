//! Domain types shared across Spriie services.
//!
//! Pure types with no framework dependencies. Each enum round-trips through
//! `as_str`/`FromStr` for storage and through serde (snake_case) on the wire.

pub mod email;
pub mod order;
pub mod payment;
pub mod user;

/// Returned when a persisted or wire string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

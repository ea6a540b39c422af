//! Auth types shared across Spriie services.
//!
//! Sessions are owned by the gateway; services only see the identity it injects.

pub mod identity;

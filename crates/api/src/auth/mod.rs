//! Authentication primitives: JWT access tokens.
//!
//! Users authenticate with an external identity service; this crate only
//! verifies (and, for that service and tests, issues) the bearer tokens.

pub mod jwt;

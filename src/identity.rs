//! Caller identities, stored-target identifiers, and redacted signing secrets.

pub mod id;
pub mod secret;

pub use id::*;
pub use secret::*;

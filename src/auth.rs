//! Credential models: redacted token secrets and the access/refresh pair.

pub mod pair;
pub mod secret;

pub use pair::*;
pub use secret::*;

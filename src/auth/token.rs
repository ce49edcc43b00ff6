//! Token payload models: raw endpoint records, redacted secrets, and decoded claims.

pub mod claims;
pub mod record;
pub mod secret;

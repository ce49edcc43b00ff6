//! Cache identities, raw token records, and decoded claims.

pub mod key;
pub mod token;

pub use key::*;
pub use token::{claims::*, record::*, secret::*};

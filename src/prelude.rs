//! Prelude module for the datepick_core crate.
//!
//! Re-exports the derive_more macros the value types use.

#[allow(unused_imports)]
pub use derive_more::{Deref, Display, From, FromStr, Into, TryInto};

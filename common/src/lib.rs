//! Obmin Common Types
//!
//! This crate contains shared types used across the obmin currency
//! converter, including currency codes, rate entries, the rate table,
//! and time constants.

pub mod currency;
pub mod time;

pub use currency::*;
pub use time::*;

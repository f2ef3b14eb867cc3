//! Core data types shared by the wallet watch bot.

pub mod chain;
pub mod wrapped;

pub use chain::*;
pub use wrapped::*;

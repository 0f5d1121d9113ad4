//! Core data types for the betting risk alert job.

pub mod event;
pub mod money;
pub mod rules;

pub use event::*;
pub use money::*;
pub use rules::*;

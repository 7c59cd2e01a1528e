//! Command handlers exposed to callers.

pub mod upload;

pub use upload::*;

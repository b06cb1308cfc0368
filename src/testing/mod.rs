//! Test support utilities
//!
//! Mock implementations and data helpers usable from unit and integration
//! tests without external dependencies.

pub mod mocks;

pub use mocks::{object, MockCompletionClient};

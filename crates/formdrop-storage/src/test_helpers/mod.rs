//! Test helpers for storage unit tests
//!
//! This module provides an in-memory remote store with failure injection so
//! session and transfer logic can be tested without a server.

pub mod mock_remote;

pub use mock_remote::*;

//! Shared test utilities

#![allow(dead_code)]

pub mod fixtures;
pub mod mock_service;
pub mod mock_store;

pub use fixtures::*;
pub use mock_service::MockSubmissionService;
pub use mock_store::MockQueueStore;

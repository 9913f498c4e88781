//! Service layer: long-running tasks that feed the client registry.

pub mod tail_service;

pub use tail_service::TailService;

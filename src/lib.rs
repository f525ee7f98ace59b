//! computectl library
//!
//! This library provides the core functionality for the computectl CLI:
//! the resource pool allocation model, cost estimation, validation, and the
//! project configuration API client.

pub mod allocation;
pub mod api;
pub mod config;
pub mod cost;
pub mod error;
pub mod format;
pub mod retry;
pub mod service_url;
pub mod state;
pub mod validation;

// Re-export commonly used types
pub use allocation::{ResourcePool, Service, ServiceAllocation, Unallocated};
pub use cost::{estimate_cost, ComputeShape, VCPU_MULTIPLIER};
pub use error::{ComputectlError, Result};

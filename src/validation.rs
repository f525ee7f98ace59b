//! Input validation utilities
//!
//! Provides validation functions for user-supplied allocation values to
//! prevent invalid data from reaching the pool or the backend.

use crate::allocation::ResourcePool;
use crate::error::{ComputectlError, Result};
use crate::format::{prettify_memory, prettify_vcpu};

/// Replica bounds per service.
pub const MIN_SERVICE_REPLICAS: u32 = 1;
pub const MAX_SERVICE_REPLICAS: u32 = 32;

/// vCPU bounds per service, in milli-units; sliders move in steps of 250.
pub const MIN_SERVICE_VCPU: u32 = 250;
pub const MAX_SERVICE_VCPU: u32 = 15000;
pub const VCPU_STEP: u32 = 250;

/// Memory bounds per service, in MiB; sliders move in steps of 128.
pub const MIN_SERVICE_MEMORY: u32 = 256;
pub const MAX_SERVICE_MEMORY: u32 = 30720;
pub const MEMORY_STEP: u32 = 128;

/// Validate a replica count against the service bounds.
pub fn validate_replicas(replicas: u32) -> Result<()> {
    if !(MIN_SERVICE_REPLICAS..=MAX_SERVICE_REPLICAS).contains(&replicas) {
        return Err(ComputectlError::Validation {
            field: "replicas".to_string(),
            reason: format!(
                "Replicas must be between {} and {}, got: {}",
                MIN_SERVICE_REPLICAS, MAX_SERVICE_REPLICAS, replicas
            ),
        });
    }
    Ok(())
}

/// Validate a per-service vcpu value: in range and on the slider step.
pub fn validate_vcpu(vcpu: u32) -> Result<()> {
    if !(MIN_SERVICE_VCPU..=MAX_SERVICE_VCPU).contains(&vcpu) {
        return Err(ComputectlError::Validation {
            field: "vcpu".to_string(),
            reason: format!(
                "vCPU must be between {} and {} milli-units, got: {}",
                MIN_SERVICE_VCPU, MAX_SERVICE_VCPU, vcpu
            ),
        });
    }

    if vcpu % VCPU_STEP != 0 {
        return Err(ComputectlError::Validation {
            field: "vcpu".to_string(),
            reason: format!(
                "vCPU must be a multiple of {} milli-units, got: {}",
                VCPU_STEP, vcpu
            ),
        });
    }

    Ok(())
}

/// Validate a per-service memory value: in range and on the slider step.
pub fn validate_memory(memory: u32) -> Result<()> {
    if !(MIN_SERVICE_MEMORY..=MAX_SERVICE_MEMORY).contains(&memory) {
        return Err(ComputectlError::Validation {
            field: "memory".to_string(),
            reason: format!(
                "Memory must be between {} and {} MiB, got: {}",
                MIN_SERVICE_MEMORY, MAX_SERVICE_MEMORY, memory
            ),
        });
    }

    if memory % MEMORY_STEP != 0 {
        return Err(ComputectlError::Validation {
            field: "memory".to_string(),
            reason: format!("Memory must be a multiple of {} MiB, got: {}", MEMORY_STEP, memory),
        });
    }

    Ok(())
}

/// The submission-time check: every unit of the pool must be assigned.
///
/// Returns `UnusedResources` with a message naming the leftover quantities
/// ("1.5 vCPUs and 512 MiB of Memory") when the pool has a strictly positive
/// unallocated remainder in either dimension.
pub fn check_fully_allocated(pool: &ResourcePool) -> Result<()> {
    let unallocated = pool.unallocated();
    if unallocated.vcpu <= 0 && unallocated.memory <= 0 {
        return Ok(());
    }

    let summary = [
        (unallocated.vcpu > 0).then(|| format!("{} vCPUs", prettify_vcpu(unallocated.vcpu))),
        (unallocated.memory > 0)
            .then(|| format!("{} of Memory", prettify_memory(unallocated.memory))),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" and ");

    Err(ComputectlError::UnusedResources {
        summary,
        unallocated_vcpu: unallocated.vcpu,
        unallocated_memory: unallocated.memory,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::Service;

    #[test]
    fn test_validate_replicas_bounds() {
        assert!(validate_replicas(0).is_err());
        assert!(validate_replicas(1).is_ok());
        assert!(validate_replicas(32).is_ok());
        assert!(validate_replicas(33).is_err());
    }

    #[test]
    fn test_validate_vcpu_step() {
        assert!(validate_vcpu(250).is_ok());
        assert!(validate_vcpu(1000).is_ok());
        assert!(validate_vcpu(300).is_err());
        assert!(validate_vcpu(0).is_err());
        assert!(validate_vcpu(15250).is_err());
    }

    #[test]
    fn test_validate_memory_step() {
        assert!(validate_memory(256).is_ok());
        assert!(validate_memory(1536).is_ok());
        assert!(validate_memory(300).is_err());
        assert!(validate_memory(128).is_err());
    }

    #[test]
    fn test_fully_allocated_pool_passes() {
        let pool = ResourcePool::default();
        assert!(check_fully_allocated(&pool).is_ok());
    }

    #[test]
    fn test_unused_vcpu_blocks_with_message() {
        let mut pool = ResourcePool::default();
        pool.set_vcpu(Service::Database, 800).unwrap();
        let err = check_fully_allocated(&pool).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("0.2 vCPUs"));
        assert!(msg.contains("unused"));
        assert!(!msg.contains("Memory"));
    }

    #[test]
    fn test_unused_both_dimensions_listed() {
        let mut pool = ResourcePool::default();
        pool.set_vcpu(Service::Hasura, 250).unwrap();
        pool.set_memory(Service::Hasura, 1024).unwrap();
        let err = check_fully_allocated(&pool).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("0.25 vCPUs and 512 MiB of Memory"));
    }
}

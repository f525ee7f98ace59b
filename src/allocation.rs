//! Resource pool allocation model
//!
//! A project has a fixed pool of dedicated vCPU and memory that is split
//! across four services: the Postgres database, the GraphQL engine (hasura),
//! auth and storage. This module owns the arithmetic over that pool: summing
//! allocations, computing the unallocated remainder, capping what a single
//! service may claim, and guarding mutations so the pool can never be pushed
//! over capacity.
//!
//! vCPU values are in milli-units (1000 = 1 vCPU); memory is in MiB. The
//! remainder is signed so that an over-allocated pool (possible when totals
//! are edited out-of-band) is still representable.

use crate::error::{ComputectlError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four services a pool is divided between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    Database,
    Hasura,
    Auth,
    Storage,
}

impl Service {
    /// All services, in display order.
    pub const ALL: [Service; 4] = [
        Service::Database,
        Service::Hasura,
        Service::Auth,
        Service::Storage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Database => "database",
            Service::Hasura => "hasura",
            Service::Auth => "auth",
            Service::Storage => "storage",
        }
    }

    /// Human-readable name used in tables and messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Service::Database => "Database",
            Service::Hasura => "GraphQL Engine",
            Service::Auth => "Auth",
            Service::Storage => "Storage",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Service {
    type Err = ComputectlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "database" | "postgres" | "db" => Ok(Service::Database),
            "hasura" | "graphql" => Ok(Service::Hasura),
            "auth" => Ok(Service::Auth),
            "storage" => Ok(Service::Storage),
            other => Err(ComputectlError::Validation {
                field: "service".to_string(),
                reason: format!(
                    "Unknown service '{}' (expected database, hasura, auth or storage)",
                    other
                ),
            }),
        }
    }
}

/// Per-service allocation: replica count plus compute per replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAllocation {
    pub replicas: u32,
    /// Milli-vCPU (1000 = 1 vCPU)
    pub vcpu: u32,
    /// MiB
    pub memory: u32,
}

impl ServiceAllocation {
    pub fn new(replicas: u32, vcpu: u32, memory: u32) -> Self {
        Self {
            replicas,
            vcpu,
            memory,
        }
    }
}

/// Capacity left in the pool after subtracting all service allocations.
///
/// Negative values mean the pool is over-allocated; the mutation guards make
/// that unreachable through this API, but totals loaded from a file or the
/// backend are not trusted to be consistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unallocated {
    pub vcpu: i64,
    pub memory: i64,
}

impl Unallocated {
    /// True when every unit of the pool is assigned to some service.
    pub fn is_fully_allocated(&self) -> bool {
        self.vcpu == 0 && self.memory == 0
    }
}

/// The full resource pool: capacity totals plus one allocation per service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePool {
    /// Whether dedicated resources are active at all.
    pub enabled: bool,
    /// Milli-vCPU capacity chosen by the user.
    pub total_available_vcpu: u32,
    /// MiB capacity chosen by the user.
    pub total_available_memory: u32,
    pub database: ServiceAllocation,
    pub hasura: ServiceAllocation,
    pub auth: ServiceAllocation,
    pub storage: ServiceAllocation,
}

impl Default for ResourcePool {
    /// The shipped defaults: a 2 vCPU / 4 GiB pool, fully allocated.
    fn default() -> Self {
        Self {
            enabled: true,
            total_available_vcpu: 2000,
            total_available_memory: 4096,
            database: ServiceAllocation::new(1, 1000, 2048),
            hasura: ServiceAllocation::new(1, 500, 1536),
            auth: ServiceAllocation::new(1, 250, 256),
            storage: ServiceAllocation::new(1, 250, 256),
        }
    }
}

impl ResourcePool {
    /// The pool written back when dedicated resources are disabled.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn service(&self, service: Service) -> &ServiceAllocation {
        match service {
            Service::Database => &self.database,
            Service::Hasura => &self.hasura,
            Service::Auth => &self.auth,
            Service::Storage => &self.storage,
        }
    }

    fn service_mut(&mut self, service: Service) -> &mut ServiceAllocation {
        match service {
            Service::Database => &mut self.database,
            Service::Hasura => &mut self.hasura,
            Service::Auth => &mut self.auth,
            Service::Storage => &mut self.storage,
        }
    }

    // Sums are widened to u64 before adding: per-service values come from
    // state files and backend responses that are not trusted to be in range,
    // and four u32 values can overflow a u32 sum.
    pub fn total_allocated_vcpu(&self) -> u64 {
        Service::ALL
            .iter()
            .map(|s| self.service(*s).vcpu as u64)
            .sum()
    }

    pub fn total_allocated_memory(&self) -> u64 {
        Service::ALL
            .iter()
            .map(|s| self.service(*s).memory as u64)
            .sum()
    }

    /// Capacity not yet assigned to any service, per dimension.
    pub fn unallocated(&self) -> Unallocated {
        Unallocated {
            vcpu: self.total_available_vcpu as i64 - self.total_allocated_vcpu() as i64,
            memory: self.total_available_memory as i64 - self.total_allocated_memory() as i64,
        }
    }

    /// The highest vcpu value `service` may be set to without starving the
    /// others: the unallocated remainder plus whatever it already holds.
    pub fn allowed_vcpu(&self, service: Service) -> i64 {
        self.unallocated().vcpu + self.service(service).vcpu as i64
    }

    /// Memory counterpart of [`allowed_vcpu`](Self::allowed_vcpu).
    pub fn allowed_memory(&self, service: Service) -> i64 {
        self.unallocated().memory + self.service(service).memory as i64
    }

    /// Set a service's vcpu, rejecting the change if it falls below the
    /// per-service minimum or if the other services' combined allocation
    /// plus the new value would exceed the pool total.
    ///
    /// Validation happens here, at the point of mutation, so the pool state
    /// is never transiently over capacity. The slider step and upper bound
    /// are input-granularity concerns checked at the CLI, not here.
    pub fn set_vcpu(&mut self, service: Service, vcpu: u32) -> Result<()> {
        if vcpu < crate::validation::MIN_SERVICE_VCPU {
            return Err(ComputectlError::Validation {
                field: format!("{}.vcpu", service),
                reason: format!(
                    "{} milli-vCPU is below the per-service minimum of {}",
                    vcpu,
                    crate::validation::MIN_SERVICE_VCPU
                ),
            });
        }
        let others = self.total_allocated_vcpu() - self.service(service).vcpu as u64;
        if others + vcpu as u64 > self.total_available_vcpu as u64 {
            return Err(ComputectlError::Validation {
                field: format!("{}.vcpu", service),
                reason: format!(
                    "{} milli-vCPU would exceed the available total of {} (at most {} for this service)",
                    vcpu,
                    self.total_available_vcpu,
                    self.allowed_vcpu(service)
                ),
            });
        }
        self.service_mut(service).vcpu = vcpu;
        Ok(())
    }

    /// Memory counterpart of [`set_vcpu`](Self::set_vcpu).
    pub fn set_memory(&mut self, service: Service, memory: u32) -> Result<()> {
        if memory < crate::validation::MIN_SERVICE_MEMORY {
            return Err(ComputectlError::Validation {
                field: format!("{}.memory", service),
                reason: format!(
                    "{} MiB is below the per-service minimum of {}",
                    memory,
                    crate::validation::MIN_SERVICE_MEMORY
                ),
            });
        }
        let others = self.total_allocated_memory() - self.service(service).memory as u64;
        if others + memory as u64 > self.total_available_memory as u64 {
            return Err(ComputectlError::Validation {
                field: format!("{}.memory", service),
                reason: format!(
                    "{} MiB would exceed the available total of {} (at most {} for this service)",
                    memory,
                    self.total_available_memory,
                    self.allowed_memory(service)
                ),
            });
        }
        self.service_mut(service).memory = memory;
        Ok(())
    }

    pub fn set_replicas(&mut self, service: Service, replicas: u32) -> Result<()> {
        crate::validation::validate_replicas(replicas)?;
        self.service_mut(service).replicas = replicas;
        Ok(())
    }

    /// Shrink or grow the pool totals. Dropping a total below what is
    /// already allocated is rejected; free capacity first.
    pub fn set_totals(&mut self, vcpu: Option<u32>, memory: Option<u32>) -> Result<()> {
        if let Some(vcpu) = vcpu {
            if (vcpu as u64) < self.total_allocated_vcpu() {
                return Err(ComputectlError::Validation {
                    field: "total_available_vcpu".to_string(),
                    reason: format!(
                        "Total of {} milli-vCPU is below the {} already allocated",
                        vcpu,
                        self.total_allocated_vcpu()
                    ),
                });
            }
            self.total_available_vcpu = vcpu;
        }
        if let Some(memory) = memory {
            if (memory as u64) < self.total_allocated_memory() {
                return Err(ComputectlError::Validation {
                    field: "total_available_memory".to_string(),
                    reason: format!(
                        "Total of {} MiB is below the {} already allocated",
                        memory,
                        self.total_allocated_memory()
                    ),
                });
            }
            self.total_available_memory = memory;
        }
        Ok(())
    }
}

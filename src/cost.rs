//! Approximate monthly cost estimation
//!
//! Pricing is per vCPU per month. The estimate for a set of services is the
//! sum of `replicas * vcpu` converted from milli-units, times the price. A
//! service with a missing or zero replica count or vcpu value contributes
//! nothing; malformed input is deliberately not an error here.

use crate::allocation::ResourcePool;
use serde::{Deserialize, Serialize};

/// Milli-vCPU per vCPU.
pub const VCPU_MULTIPLIER: u32 = 1000;

/// The shape cost estimation needs from a service: replica count and vcpu,
/// either of which may be absent.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ComputeShape {
    pub replicas: Option<u32>,
    pub vcpu: Option<u32>,
}

impl ComputeShape {
    pub fn new(replicas: u32, vcpu: u32) -> Self {
        Self {
            replicas: Some(replicas),
            vcpu: Some(vcpu),
        }
    }
}

/// Approximate monthly cost of a list of services at the given price per
/// vCPU. Services missing either field (or with it set to zero) contribute 0.
pub fn estimate_cost(price_per_vcpu: f64, services: &[ComputeShape]) -> f64 {
    let total_vcpus: f64 = services
        .iter()
        .map(|service| match (service.replicas, service.vcpu) {
            (Some(replicas), Some(vcpu)) if replicas > 0 && vcpu > 0 => {
                (replicas as f64 * vcpu as f64) / VCPU_MULTIPLIER as f64
            }
            _ => 0.0,
        })
        .sum();

    price_per_vcpu * total_vcpus
}

/// Line items behind an approximate monthly price.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PriceBreakdown {
    pub plan_price: f64,
    /// Price of the reserved pool total, regardless of how it is split.
    pub total_pool_price: f64,
    /// Price of the per-service allocations including replicas.
    pub services_price: f64,
    /// `plan_price` plus the larger of the two dedicated-resource prices
    /// (zero when dedicated resources are disabled).
    pub monthly_total: f64,
}

/// Approximate monthly price of a pool on top of a base plan.
///
/// Replicas multiply the per-service price but not the pool total, so the
/// two can differ; the customer is billed the larger one.
pub fn approximate_monthly_price(
    pool: &ResourcePool,
    plan_price: f64,
    price_per_vcpu: f64,
) -> PriceBreakdown {
    let total_pool_price =
        price_per_vcpu * pool.total_available_vcpu as f64 / VCPU_MULTIPLIER as f64;

    let shapes: Vec<ComputeShape> = crate::allocation::Service::ALL
        .iter()
        .map(|s| {
            let alloc = pool.service(*s);
            ComputeShape::new(alloc.replicas, alloc.vcpu)
        })
        .collect();
    let services_price = estimate_cost(price_per_vcpu, &shapes);

    let monthly_total = if pool.enabled {
        plan_price + total_pool_price.max(services_price)
    } else {
        plan_price
    };

    PriceBreakdown {
        plan_price,
        total_pool_price,
        services_price,
        monthly_total,
    }
}

//! Project configuration API client
//!
//! The only external boundary of the allocation logic: fetching the current
//! per-service compute config and submitting the batch update. Each service
//! entry in the update is `{ compute: { cpu, memory }, replicas }` or JSON
//! `null`, where null disables dedicated resources for that service.

use crate::allocation::{ResourcePool, Service, ServiceAllocation};
use crate::config::ApiConfig;
use crate::error::{ComputectlError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Compute assigned to one replica of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeResources {
    /// Milli-vCPU
    pub cpu: u32,
    /// MiB
    pub memory: u32,
}

/// Dedicated resources of one service as the backend stores them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceResources {
    pub compute: ComputeResources,
    pub replicas: u32,
}

/// One service entry of the config; `resources: None` serializes as JSON
/// `null` and means dedicated resources are off for that service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub resources: Option<ServiceResources>,
}

/// The batch shape exchanged with the backend, keyed by the four fixed
/// service names. The database service is `postgres` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcesConfig {
    pub postgres: ServiceConfig,
    pub hasura: ServiceConfig,
    pub auth: ServiceConfig,
    pub storage: ServiceConfig,
}

impl ResourcesConfig {
    /// Build the batch update for a pool. When the pool is disabled every
    /// entry is null. The replica slider feeds the cost preview only; the
    /// update always pins one replica per service.
    pub fn from_pool(pool: &ResourcePool) -> Self {
        let entry = |service: Service| {
            let alloc = pool.service(service);
            ServiceConfig {
                resources: pool.enabled.then_some(ServiceResources {
                    compute: ComputeResources {
                        cpu: alloc.vcpu,
                        memory: alloc.memory,
                    },
                    replicas: 1,
                }),
            }
        };

        Self {
            postgres: entry(Service::Database),
            hasura: entry(Service::Hasura),
            auth: entry(Service::Auth),
            storage: entry(Service::Storage),
        }
    }

    fn service(&self, service: Service) -> &ServiceConfig {
        match service {
            Service::Database => &self.postgres,
            Service::Hasura => &self.hasura,
            Service::Auth => &self.auth,
            Service::Storage => &self.storage,
        }
    }
}

/// Turn fetched backend config into a pool, filling gaps with the shipped
/// defaults: a service with no compute block falls back to its default
/// allocation, and a config with no compute at all comes back as a disabled
/// default pool.
pub fn pool_from_remote(remote: &ResourcesConfig) -> ResourcePool {
    let compute = |service: Service| {
        remote
            .service(service)
            .resources
            .map(|r| (r.compute.cpu, r.compute.memory))
            .unwrap_or((0, 0))
    };

    // Backend values are not trusted to be in range; sum wide and clamp the
    // derived totals instead of wrapping.
    let total_vcpu: u64 = Service::ALL.iter().map(|s| compute(*s).0 as u64).sum();
    let total_memory: u64 = Service::ALL.iter().map(|s| compute(*s).1 as u64).sum();
    let clamp = |total: u64| total.min(u32::MAX as u64) as u32;

    let defaults = ResourcePool::default();
    let alloc = |service: Service| {
        let (vcpu, memory) = compute(service);
        let default = defaults.service(service);
        ServiceAllocation::new(
            1,
            if vcpu > 0 { vcpu } else { default.vcpu },
            if memory > 0 { memory } else { default.memory },
        )
    };

    ResourcePool {
        enabled: total_vcpu > 0 && total_memory > 0,
        total_available_vcpu: if total_vcpu > 0 {
            clamp(total_vcpu)
        } else {
            defaults.total_available_vcpu
        },
        total_available_memory: if total_memory > 0 {
            clamp(total_memory)
        } else {
            defaults.total_available_memory
        },
        database: alloc(Service::Database),
        hasura: alloc(Service::Hasura),
        auth: alloc(Service::Auth),
        storage: alloc(Service::Storage),
    }
}

#[derive(Debug, Deserialize)]
struct GetResourcesResponse {
    config: ResourcesConfig,
}

#[derive(Debug, Serialize)]
struct UpdateResourcesRequest<'a> {
    #[serde(rename = "appId")]
    app_id: &'a str,
    config: &'a ResourcesConfig,
}

/// HTTP client for the project configuration API
pub struct ResourcesClient {
    base_url: String,
    client: reqwest::Client,
    admin_secret: Option<String>,
    timeout: Duration,
}

impl ResourcesClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
            admin_secret: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        let mut client = Self::new(config.base_url.clone())
            .with_timeout(Duration::from_secs(config.timeout_secs));
        if let Some(secret) = &config.admin_secret {
            client = client.with_admin_secret(secret.clone());
        }
        client
    }

    pub fn with_admin_secret(mut self, secret: String) -> Self {
        self.admin_secret = Some(secret);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetch the current per-service compute config of a project.
    pub async fn fetch_resources(&self, app_id: &str) -> Result<ResourcesConfig> {
        let response: GetResourcesResponse =
            self.get(&format!("/apps/{}/resources", app_id)).await?;
        Ok(response.config)
    }

    /// Submit the batch update for all four services at once.
    pub async fn update_resources(&self, app_id: &str, config: &ResourcesConfig) -> Result<()> {
        let request = UpdateResourcesRequest { app_id, config };
        let _: serde_json::Value = self
            .post(&format!("/apps/{}/resources", app_id), &request)
            .await?;
        Ok(())
    }

    async fn get<T>(&self, path: &str) -> Result<T>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);
        let mut request = self.client.get(&url).timeout(self.timeout);

        if let Some(secret) = &self.admin_secret {
            request = request.header("x-admin-secret", secret);
        }

        let response = request.send().await?;
        Self::parse(response).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: serde::Serialize,
        T: for<'de> serde::Deserialize<'de>,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);
        let mut request = self.client.post(&url).json(body).timeout(self.timeout);

        if let Some(secret) = &self.admin_secret {
            request = request.header("x-admin-secret", secret);
        }

        let response = request.send().await?;
        Self::parse(response).await
    }

    async fn parse<T>(response: reqwest::Response) -> Result<T>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ComputectlError::Network(e.to_string()))?;

        if status.is_success() {
            serde_json::from_str(&body).map_err(ComputectlError::from)
        } else {
            Err(ComputectlError::Api {
                status: status.as_u16(),
                message: if body.is_empty() {
                    status.to_string()
                } else {
                    body
                },
                retryable: status.is_server_error(),
            })
        }
    }
}

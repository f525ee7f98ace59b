//! Per-service endpoint URL construction
//!
//! Each project exposes its services (auth, graphql, functions, storage,
//! hasura) under environment-dependent hosts and path slugs: locally
//! everything hangs off one localhost port with per-service paths, while in
//! the cloud each service gets its own subdomain and a flat `/v1` slug.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Addressable project services. This is a wider set than the services that
/// take part in resource allocation: functions has an endpoint but no
/// dedicated compute of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    Auth,
    Graphql,
    Functions,
    Storage,
    Hasura,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Auth => "auth",
            Endpoint::Graphql => "graphql",
            Endpoint::Functions => "functions",
            Endpoint::Storage => "storage",
            Endpoint::Hasura => "hasura",
        }
    }

    /// Path slug used when the backend runs locally behind a single port.
    fn local_slug(&self) -> &'static str {
        match self {
            Endpoint::Auth => "/v1/auth",
            Endpoint::Graphql => "/v1/graphql",
            Endpoint::Functions => "/v1/functions",
            Endpoint::Storage => "/v1/files",
            Endpoint::Hasura => "",
        }
    }

    /// Path slug used against the cloud backend, where each service already
    /// has its own host.
    fn remote_slug(&self) -> &'static str {
        match self {
            Endpoint::Hasura => "",
            _ => "/v1",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which backend the project points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Production,
    Staging,
    Dev,
    Local,
}

impl Environment {
    fn backend_domain(&self) -> &'static str {
        match self {
            Environment::Staging => "staging.stackbird.run",
            _ => "stackbird.run",
        }
    }
}

/// Build the endpoint URL for one service of a project.
///
/// A non-localhost subdomain with no region is treated as a custom domain
/// pointing at the cloud backend (hasura still resolves to the local console
/// port in that case). Local and dev environments serve every service from a
/// single localhost port with per-service slugs.
pub fn service_url(
    subdomain: &str,
    region: &str,
    endpoint: Endpoint,
    environment: Environment,
    local_backend_port: Option<u16>,
) -> String {
    if !subdomain.is_empty() && subdomain != "localhost" && region.is_empty() {
        if endpoint == Endpoint::Hasura {
            return format!(
                "http://localhost:{}{}",
                local_backend_port.unwrap_or(8080),
                endpoint.local_slug()
            );
        }

        let custom_subdomain =
            if subdomain.starts_with("https://") || subdomain.starts_with("http://") {
                subdomain.to_string()
            } else {
                format!("https://{}", subdomain)
            };

        return match local_backend_port {
            Some(port) if port != 443 => format!(
                "{}.{}:{}{}",
                custom_subdomain,
                environment.backend_domain(),
                port,
                endpoint.local_slug()
            ),
            _ => format!(
                "{}.{}{}",
                custom_subdomain,
                environment.backend_domain(),
                endpoint.local_slug()
            ),
        };
    }

    match environment {
        Environment::Local | Environment::Dev => format!(
            "http://localhost:{}{}",
            local_backend_port.unwrap_or(1337),
            endpoint.local_slug()
        ),
        Environment::Staging | Environment::Production => format!(
            "https://{}.{}.{}.{}{}",
            subdomain,
            endpoint,
            region,
            environment.backend_domain(),
            endpoint.remote_slug()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_url_per_service_host() {
        let url = service_url(
            "myproject",
            "eu-central-1",
            Endpoint::Graphql,
            Environment::Production,
            None,
        );
        assert_eq!(url, "https://myproject.graphql.eu-central-1.stackbird.run/v1");
    }

    #[test]
    fn test_hasura_has_no_slug() {
        let url = service_url(
            "myproject",
            "eu-central-1",
            Endpoint::Hasura,
            Environment::Production,
            None,
        );
        assert_eq!(url, "https://myproject.hasura.eu-central-1.stackbird.run");
    }

    #[test]
    fn test_local_url_single_port() {
        let url = service_url("localhost", "", Endpoint::Storage, Environment::Local, None);
        assert_eq!(url, "http://localhost:1337/v1/files");

        let url = service_url(
            "localhost",
            "",
            Endpoint::Auth,
            Environment::Local,
            Some(4000),
        );
        assert_eq!(url, "http://localhost:4000/v1/auth");
    }

    #[test]
    fn test_custom_subdomain_without_region() {
        let url = service_url("custom", "", Endpoint::Graphql, Environment::Production, None);
        assert_eq!(url, "https://custom.stackbird.run/v1/graphql");

        // Hasura special case: local console
        let url = service_url("custom", "", Endpoint::Hasura, Environment::Production, None);
        assert_eq!(url, "http://localhost:8080");
    }

    #[test]
    fn test_staging_domain() {
        let url = service_url(
            "myproject",
            "us-east-1",
            Endpoint::Auth,
            Environment::Staging,
            None,
        );
        assert_eq!(url, "https://myproject.auth.us-east-1.staging.stackbird.run/v1");
    }
}

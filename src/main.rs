use anyhow::Result;
use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table};
use console::style;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use computectl::allocation::Service;
use computectl::api::{pool_from_remote, ResourcesClient, ResourcesConfig};
use computectl::config::{self, Config, DEFAULT_STATE_FILE};
use computectl::cost::approximate_monthly_price;
use computectl::error::ComputectlError;
use computectl::format::{format_monthly_price, prettify_memory, prettify_vcpu};
use computectl::retry::{ExponentialBackoffPolicy, RetryPolicy};
use computectl::service_url::{service_url, Endpoint};
use computectl::state::AllocationState;
use computectl::validation;

#[derive(Parser)]
#[command(name = "computectl")]
#[command(
    about = "Manage dedicated compute resources of cloud projects",
    long_about = "computectl manages the dedicated compute pool of a cloud project.\n\nWorkflow:\n  - fetch the current allocation from the backend into a local state file\n  - adjust per-service vCPU/memory/replicas with validation on every change\n  - preview the approximate monthly cost\n  - apply the batch update once the whole pool is allocated\n\nThe pool is split across four services: database, hasura (GraphQL engine),\nauth and storage."
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Pending allocation state file
    #[arg(short, long, global = true, default_value = DEFAULT_STATE_FILE)]
    state: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(long, global = true, default_value = "text")]
    output: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = ".computectl.toml")]
        output: PathBuf,
    },
    /// Fetch the current allocation from the backend into the state file
    Fetch,
    /// Show the pending allocation, remainder and approximate cost
    Show,
    /// Adjust one service's allocation (validated against the pool total)
    Set {
        /// Service to adjust (database, hasura, auth, storage)
        service: Service,
        /// Milli-vCPU (1000 = 1 vCPU), in steps of 250
        #[arg(long)]
        vcpu: Option<u32>,
        /// Memory in MiB, in steps of 128
        #[arg(long)]
        memory: Option<u32>,
        /// Replica count
        #[arg(long)]
        replicas: Option<u32>,
    },
    /// Adjust the pool capacity totals
    Total {
        /// Total milli-vCPU available
        #[arg(long)]
        vcpu: Option<u32>,
        /// Total memory available in MiB
        #[arg(long)]
        memory: Option<u32>,
    },
    /// Print the approximate monthly cost breakdown
    Estimate,
    /// Submit the pending allocation to the backend
    Apply,
    /// Disable dedicated resources and reset the state file
    Disable,
    /// Print the endpoint URL of a project service
    Url {
        /// Service endpoint (auth, graphql, functions, storage, hasura)
        endpoint: Endpoint,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Suppress INFO by default, only show warnings and errors
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Init { output } => {
            config::init_config(&output)?;
        }
        Commands::Fetch => {
            fetch(&config, &cli.state).await?;
        }
        Commands::Show => {
            show(&config, &cli.state, &cli.output)?;
        }
        Commands::Set {
            service,
            vcpu,
            memory,
            replicas,
        } => {
            set(&cli.state, service, vcpu, memory, replicas)?;
        }
        Commands::Total { vcpu, memory } => {
            set_totals(&cli.state, vcpu, memory)?;
        }
        Commands::Estimate => {
            estimate(&config, &cli.state, &cli.output)?;
        }
        Commands::Apply => {
            apply(&config, &cli.state).await?;
        }
        Commands::Disable => {
            disable(&config, &cli.state).await?;
        }
        Commands::Url { endpoint } => {
            let url = service_url(
                &config.project.subdomain,
                &config.project.region,
                endpoint,
                config.project.environment,
                config.project.local_backend_port,
            );
            println!("{}", url);
        }
    }

    Ok(())
}

fn require_app_id(config: &Config) -> Result<&str> {
    config
        .project
        .app_id
        .as_deref()
        .ok_or_else(|| {
            anyhow::Error::from(ComputectlError::Config(
                computectl::error::ConfigError::MissingField("project.app_id".to_string()),
            ))
        })
}

async fn fetch(config: &Config, state_path: &PathBuf) -> Result<()> {
    let app_id = require_app_id(config)?;
    let client = ResourcesClient::from_config(&config.api);
    let policy = ExponentialBackoffPolicy::new(config.api.max_retries);

    let remote = policy
        .execute_with_retry(|| client.fetch_resources(app_id))
        .await?;

    let mut state = AllocationState::load(state_path)?;
    state.seed(pool_from_remote(&remote));
    state.save(state_path)?;

    let status = if state.pool.enabled {
        "enabled"
    } else {
        "disabled"
    };
    println!(
        "Fetched allocation for {} (dedicated resources {})",
        app_id, status
    );
    Ok(())
}

fn show(config: &Config, state_path: &PathBuf, output_format: &str) -> Result<()> {
    let state = AllocationState::load(state_path)?;
    let pool = &state.pool;
    let unallocated = pool.unallocated();
    let breakdown =
        approximate_monthly_price(pool, config.billing.plan_price, config.billing.vcpu_price);

    if output_format == "json" {
        let summary = serde_json::json!({
            "pool": pool,
            "unallocated": unallocated,
            "approximate_monthly_cost": breakdown.monthly_total,
            "fetched_at": state.fetched_at,
            "applied_at": state.applied_at,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if !pool.enabled {
        println!(
            "{}",
            style("Dedicated resources are disabled for this project.").yellow()
        );
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Service", "Replicas", "vCPUs", "Memory"]);
    for service in Service::ALL {
        let alloc = pool.service(service);
        table.add_row(vec![
            Cell::new(service.display_name()),
            Cell::new(alloc.replicas),
            Cell::new(prettify_vcpu(alloc.vcpu as i64)),
            Cell::new(prettify_memory(alloc.memory as i64)),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total available"),
        Cell::new(""),
        Cell::new(prettify_vcpu(pool.total_available_vcpu as i64)),
        Cell::new(prettify_memory(pool.total_available_memory as i64)),
    ]);
    println!("{table}");

    if unallocated.is_fully_allocated() {
        println!("{}", style("Pool fully allocated.").green());
    } else {
        println!(
            "{}",
            style(format!(
                "Unallocated: {} vCPUs, {} of Memory",
                prettify_vcpu(unallocated.vcpu),
                prettify_memory(unallocated.memory)
            ))
            .yellow()
        );
    }

    println!(
        "Approximate cost: {}",
        style(format_monthly_price(breakdown.monthly_total)).bold()
    );
    Ok(())
}

fn set(
    state_path: &PathBuf,
    service: Service,
    vcpu: Option<u32>,
    memory: Option<u32>,
    replicas: Option<u32>,
) -> Result<()> {
    if vcpu.is_none() && memory.is_none() && replicas.is_none() {
        anyhow::bail!("Nothing to set: pass at least one of --vcpu, --memory, --replicas");
    }

    let mut state = AllocationState::load(state_path)?;

    // Field bounds first, then the pool guard; a rejected change leaves the
    // state file untouched.
    if let Some(vcpu) = vcpu {
        validation::validate_vcpu(vcpu)?;
        state.pool.set_vcpu(service, vcpu)?;
    }
    if let Some(memory) = memory {
        validation::validate_memory(memory)?;
        state.pool.set_memory(service, memory)?;
    }
    if let Some(replicas) = replicas {
        state.pool.set_replicas(service, replicas)?;
    }

    state.save(state_path)?;

    let unallocated = state.pool.unallocated();
    println!(
        "{}: {} vCPUs, {} ({} replicas)",
        service.display_name(),
        prettify_vcpu(state.pool.service(service).vcpu as i64),
        prettify_memory(state.pool.service(service).memory as i64),
        state.pool.service(service).replicas,
    );
    if !unallocated.is_fully_allocated() {
        println!(
            "Remaining: {} vCPUs, {} of Memory",
            prettify_vcpu(unallocated.vcpu),
            prettify_memory(unallocated.memory)
        );
    }
    Ok(())
}

fn set_totals(state_path: &PathBuf, vcpu: Option<u32>, memory: Option<u32>) -> Result<()> {
    if vcpu.is_none() && memory.is_none() {
        anyhow::bail!("Nothing to set: pass at least one of --vcpu, --memory");
    }

    let mut state = AllocationState::load(state_path)?;
    state.pool.set_totals(vcpu, memory)?;
    state.save(state_path)?;

    println!(
        "Pool capacity: {} vCPUs, {}",
        prettify_vcpu(state.pool.total_available_vcpu as i64),
        prettify_memory(state.pool.total_available_memory as i64)
    );
    Ok(())
}

fn estimate(config: &Config, state_path: &PathBuf, output_format: &str) -> Result<()> {
    let state = AllocationState::load(state_path)?;
    let breakdown = approximate_monthly_price(
        &state.pool,
        config.billing.plan_price,
        config.billing.vcpu_price,
    );

    if output_format == "json" {
        println!("{}", serde_json::to_string_pretty(&breakdown)?);
        return Ok(());
    }

    println!("Plan:               {}", format_monthly_price(breakdown.plan_price));
    println!(
        "Reserved pool:      {}",
        format_monthly_price(breakdown.total_pool_price)
    );
    println!(
        "Service allocation: {}",
        format_monthly_price(breakdown.services_price)
    );
    println!(
        "Approximate total:  {} (this is just an estimation)",
        style(format_monthly_price(breakdown.monthly_total)).bold()
    );
    Ok(())
}

async fn apply(config: &Config, state_path: &PathBuf) -> Result<()> {
    let app_id = require_app_id(config)?;
    let mut state = AllocationState::load(state_path)?;

    // The pool must be used exactly: leftover capacity blocks submission.
    validation::check_fully_allocated(&state.pool)?;

    let update = ResourcesConfig::from_pool(&state.pool);
    let client = ResourcesClient::from_config(&config.api);
    let policy = ExponentialBackoffPolicy::new(config.api.max_retries);

    policy
        .execute_with_retry(|| client.update_resources(app_id, &update))
        .await?;

    state.mark_applied();
    state.save(state_path)?;

    println!(
        "{}",
        style("Resources have been updated successfully.").green()
    );
    Ok(())
}

async fn disable(config: &Config, state_path: &PathBuf) -> Result<()> {
    let app_id = require_app_id(config)?;
    let mut state = AllocationState::load(state_path)?;
    state.pool.enabled = false;

    let update = ResourcesConfig::from_pool(&state.pool);
    let client = ResourcesClient::from_config(&config.api);
    let policy = ExponentialBackoffPolicy::new(config.api.max_retries);

    policy
        .execute_with_retry(|| client.update_resources(app_id, &update))
        .await?;

    state.reset_disabled();
    state.save(state_path)?;

    println!(
        "{}",
        style("Dedicated resources disabled; allocation reset to defaults.").green()
    );
    Ok(())
}

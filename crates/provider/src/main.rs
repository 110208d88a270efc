//! OneView Managed SAN module
//!
//! Reconciles one Managed SAN per invocation and prints the result (or the
//! failure) as JSON on stdout. Logs go to stderr.

use std::path::PathBuf;

use clap::Parser;
use serde_json::{Map, Value};
use tracing::{info, warn};

use oneview_common::{Error, ModuleOutput, Operation};
use oneview_managed_san::config::ConfigOverrides;
use oneview_managed_san::module::{self, ModuleParams};
use oneview_managed_san::OneViewClient;

/// Manage HPE OneView Managed SAN resources
#[derive(Parser)]
#[command(name = "oneview-managed-san")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Appliance config file (TOML)
    #[arg(long, env = "ONEVIEWSDK_CONFIG")]
    config: Option<PathBuf>,

    /// Appliance hostname or IP address
    #[arg(long, env = "ONEVIEWSDK_IP")]
    hostname: Option<String>,

    #[arg(long, env = "ONEVIEWSDK_USERNAME")]
    username: Option<String>,

    #[arg(long, env = "ONEVIEWSDK_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[arg(long, env = "ONEVIEWSDK_AUTH_LOGIN_DOMAIN")]
    auth_login_domain: Option<String>,

    #[arg(long, env = "ONEVIEWSDK_API_VERSION")]
    api_version: Option<u32>,

    /// Send `If-Match: *` instead of validating ETags
    #[arg(long)]
    no_validate_etag: bool,

    /// Parameter file (YAML or JSON) with `state` and `data`
    #[arg(long, conflicts_with_all = ["state", "data"])]
    params: Option<PathBuf>,

    /// Desired state: present, refresh_state_set, endpoints_csv_file_created, issues_report_created
    #[arg(long)]
    state: Option<Operation>,

    /// Managed SAN properties as a JSON or YAML mapping
    #[arg(long)]
    data: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            hostname: self.hostname.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            auth_login_domain: self.auth_login_domain.clone(),
            api_version: self.api_version,
            validate_etag: self.no_validate_etag.then_some(false),
        }
    }

    fn module_params(&self) -> oneview_common::Result<ModuleParams> {
        if let Some(path) = &self.params {
            return ModuleParams::from_file(path);
        }

        let data = self
            .data
            .as_deref()
            .ok_or_else(|| Error::InvalidArgument("either --params or --data is required".into()))?;
        let data: Map<String, Value> = serde_yaml::from_str(data)?;

        Ok(ModuleParams {
            state: self.state.unwrap_or_default(),
            data,
            config: None,
            connection: ConfigOverrides::default(),
        })
    }
}

async fn execute(cli: &Cli) -> oneview_common::Result<ModuleOutput> {
    let params = cli.module_params()?;
    let config = params.appliance_config(cli.config.as_deref(), &cli.overrides())?;
    let desired = params.desired_state();

    let mut client = OneViewClient::connect(&config).await?;
    let output = module::run(&desired, &client).await;

    if let Err(e) = client.logout().await {
        warn!("Failed to close OneView session: {}", e);
    }
    Ok(output)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for the result document
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    info!("OneView Managed SAN module v{}", oneview_common::VERSION);

    let output = match execute(&cli).await {
        Ok(output) => output,
        Err(e) => module::failure(&e),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    if output.is_failure() {
        std::process::exit(1);
    }
    Ok(())
}

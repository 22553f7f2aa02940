//! # tenantcfg
//!
//! Command-line front end for the tenantcfg library: load a per-tenant
//! configuration document, enable/disable applications, get/set/remove
//! settings, and validate a tenant against a requested release level.
//!
//! **Examples:**
//! ```sh
//! tenantcfg --config tenants.json --add-tenant acme --enable-app client
//! tenantcfg --config tenants.json --tenant acme --set ui.theme --value '"dark"'
//! tenantcfg --config tenants.json --tenant acme --validate --release 16.1
//! ```
//!
//! See `tenantcfg --help` for all options.

use anyhow::Result;
use clap::Parser as _;
use tenantcfg::cli::Args;
use tenantcfg::error::ConfigError;
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing subscriber based on verbose flag
    let log_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_target(false).with_env_filter(filter).init();

    match tenantcfg::run(args) {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            error!("{:#}", err);
            std::process::exit(
                err.downcast_ref::<ConfigError>()
                    .map_or(1, ConfigError::exit_code),
            );
        }
    }
}

use clap::Parser;

/// Command-line arguments for tenantcfg
#[derive(Parser, Debug, Clone)]
#[command(name = "tenantcfg")]
#[command(about = "A CLI tool for managing per-tenant application configuration documents")]
#[command(long_about = None)]
#[command(version)]
pub struct Args {
    /// Configuration document path
    #[arg(long, value_name = "PATH", default_value = "./tenants.json")]
    pub config: String,

    /// Write the mutated document to this path instead of back to --config
    #[arg(long, value_name = "PATH")]
    pub output: Option<String>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// List all tenants of the document
    #[arg(long = "list-tenants")]
    pub list_tenants: bool,

    /// Create a new tenant
    #[arg(long = "add-tenant", value_name = "NAME")]
    pub add_tenant: Option<String>,

    /// Tenant the operation applies to
    #[arg(long, value_name = "NAME")]
    pub tenant: Option<String>,

    /// Application the operation applies to (client, dokumente, workflow)
    #[arg(long, value_name = "APP", default_value = "client")]
    pub app: String,

    /// Platform of a get/set/remove (unspecified, web, app)
    #[arg(long, value_name = "PLATFORM", default_value = "unspecified")]
    pub platform: String,

    /// Enable an application for the tenant
    #[arg(long = "enable-app", value_name = "APP")]
    pub enable_app: Option<String>,

    /// Disable an application for the tenant
    #[arg(long = "disable-app", value_name = "APP")]
    pub disable_app: Option<String>,

    /// Read the value of a dotted setting path
    #[arg(long, value_name = "PATH")]
    pub get: Option<String>,

    /// Write the value of a dotted setting path (requires --value)
    #[arg(long, value_name = "PATH", requires = "value")]
    pub set: Option<String>,

    /// JSON value for --set
    #[arg(long, value_name = "JSON")]
    pub value: Option<String>,

    /// Remedy unmet dependencies instead of failing
    #[arg(long = "ensure-dependencies")]
    pub ensure_dependencies: bool,

    /// Remove the value of a dotted setting path (all platforms unless
    /// --platform is given)
    #[arg(long, value_name = "PATH")]
    pub remove: Option<String>,

    /// Validate the tenant's whole document
    #[arg(long)]
    pub validate: bool,

    /// Release level for --validate (16, 16.1, 17, 18, 19)
    #[arg(long, value_name = "RELEASE", default_value = "19")]
    pub release: String,
}

use serde::Deserialize;

/// Application configuration
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Database URL (SQLite path)
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Bearer token lifetime in hours
    #[serde(default = "default_session_hours")]
    pub session_hours: u64,

    /// Prefix for turning stored image references into client URLs
    #[serde(default = "default_uploads_base_url")]
    pub uploads_base_url: String,

    /// Allow cross-origin requests from any origin
    #[serde(default = "default_cors_allow_any_origin")]
    pub cors_allow_any_origin: bool,

    /// Page size used when a list request omits `limit`
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Upper bound for `limit` on list requests
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,

    /// Account provisioned at start-up when no admin exists
    #[serde(default)]
    pub default_admin: DefaultAdminConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DefaultAdminConfig {
    #[serde(default = "default_admin_name")]
    pub name: String,

    #[serde(default = "default_admin_email")]
    pub email: String,

    #[serde(default = "default_admin_password")]
    pub password: String,
}

impl Default for DefaultAdminConfig {
    fn default() -> Self {
        Self {
            name: default_admin_name(),
            email: default_admin_email(),
            password: default_admin_password(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_url: default_database_url(),
            session_hours: default_session_hours(),
            uploads_base_url: default_uploads_base_url(),
            cors_allow_any_origin: default_cors_allow_any_origin(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            default_admin: DefaultAdminConfig::default(),
        }
    }
}

/// Ten years
const MAX_SESSION_HOURS: u64 = 24 * 365 * 10;

// Default value functions
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3007
}

fn default_database_url() -> String {
    "sqlite:data/admin_dashboard.db".to_string()
}

fn default_session_hours() -> u64 {
    24 * 30 // 30 days
}

fn default_uploads_base_url() -> String {
    "http://localhost:3007/uploads".to_string()
}

fn default_cors_allow_any_origin() -> bool {
    true
}

fn default_page_size() -> u32 {
    10
}

fn default_max_page_size() -> u32 {
    100
}

fn default_admin_name() -> String {
    "Default Admin".to_string()
}

fn default_admin_email() -> String {
    "admin@example.com".to_string()
}

fn default_admin_password() -> String {
    "admin123".to_string()
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> anyhow::Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            // Start with defaults
            .set_default("host", default_host())?
            .set_default("port", default_port())?
            .set_default("database_url", default_database_url())?
            .set_default("session_hours", default_session_hours())?
            .set_default("uploads_base_url", default_uploads_base_url())?
            .set_default("default_page_size", default_page_size())?
            .set_default("max_page_size", default_max_page_size())?
            // Load from config file if exists
            .add_source(config::File::with_name("config").required(false))
            // Override with environment variables (ADMIN_DASHBOARD_ prefix)
            .add_source(
                config::Environment::with_prefix("ADMIN_DASHBOARD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;

        if config.default_admin.password == default_admin_password() {
            tracing::warn!("default_admin.password is the built-in default; override it outside development");
        }

        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.default_admin.email.trim().is_empty() {
            anyhow::bail!("default_admin.email is required");
        }
        if self.default_admin.password.len() < 6 {
            anyhow::bail!("default_admin.password must be at least 6 characters");
        }
        if !(1..=MAX_SESSION_HOURS).contains(&self.session_hours) {
            anyhow::bail!("session_hours must be between 1 and {}", MAX_SESSION_HOURS);
        }
        if self.default_page_size == 0 || self.max_page_size < self.default_page_size {
            anyhow::bail!("page sizes must satisfy 1 <= default_page_size <= max_page_size");
        }
        Ok(())
    }
}

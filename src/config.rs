use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub pinning: PinningConfig,
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret shared with the identity provider that issues tokens.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinningProvider {
    Local,
    Pinata,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PinningConfig {
    #[serde(default = "default_pinning_provider")]
    pub provider: PinningProvider,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub secret_api_key: String,
    #[serde(default = "default_pin_path")]
    pub local_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// Address of the registry NFT contract. Empty means "not deployed yet":
    /// confirmations then store no contract address and cannot be verified.
    #[serde(default)]
    pub contract_address: String,
    /// When true, confirm-mint checks the transaction receipt on chain
    /// before persisting anything.
    #[serde(default = "default_verify_mints")]
    pub verify_mints: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Lifetime number of timestamp records on the free tier.
    #[serde(default = "default_record_limit")]
    pub free_record_limit: i64,
    /// Lifetime bytes of pinned file content on the free tier.
    #[serde(default = "default_storage_limit")]
    pub free_storage_limit_bytes: i64,
    /// Per-request upload ceiling enforced before hashing.
    #[serde(default = "default_max_upload")]
    pub max_upload_bytes: usize,
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5001
}

fn default_db_path() -> String {
    "data/veltis.db".to_string()
}

fn default_jwt_secret() -> String {
    "change-this-shared-secret".to_string()
}

fn default_pinning_provider() -> PinningProvider {
    PinningProvider::Local
}

fn default_pin_path() -> String {
    "data/pins".to_string()
}

fn default_rpc_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

fn default_verify_mints() -> bool {
    true
}

fn default_record_limit() -> i64 {
    5
}

fn default_storage_limit() -> i64 {
    100 * 1024 * 1024
}

fn default_max_upload() -> usize {
    10 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
        }
    }
}

impl Default for PinningConfig {
    fn default() -> Self {
        Self {
            provider: default_pinning_provider(),
            api_key: String::new(),
            secret_api_key: String::new(),
            local_path: default_pin_path(),
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            contract_address: String::new(),
            verify_mints: default_verify_mints(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            free_record_limit: default_record_limit(),
            free_storage_limit_bytes: default_storage_limit(),
            max_upload_bytes: default_max_upload(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            pinning: PinningConfig::default(),
            chain: ChainConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_from_file()?;
        config.apply_env_overrides();
        config.validate()?;
        config.ensure_directories()?;
        config.ensure_jwt_secret()?;
        Ok(config)
    }

    /// Load configuration from conf.ini or config.toml
    fn load_from_file() -> anyhow::Result<Self> {
        let config_paths = ["conf.ini", "config.toml", "data/conf.ini", "data/config.toml"];

        for path in config_paths {
            if Path::new(path).exists() {
                let content = fs::read_to_string(path)?;
                let config: Config = toml::from_str(&content)?;
                tracing::info!("Loaded configuration from {}", path);
                return Ok(config);
            }
        }

        tracing::info!("No configuration file found, using defaults");
        Ok(Config::default())
    }

    /// Apply environment variable overrides
    /// Format: VELTIS_<SECTION>_<KEY>
    fn apply_env_overrides(&mut self) {
        // Server overrides
        if let Ok(val) = env::var("VELTIS_SERVER_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = env::var("VELTIS_SERVER_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }

        // Database overrides
        if let Ok(val) = env::var("VELTIS_DATABASE_PATH") {
            self.database.path = val;
        }

        // Auth overrides
        if let Ok(val) = env::var("VELTIS_AUTH_JWT_SECRET") {
            self.auth.jwt_secret = val;
        }

        // Pinning overrides
        if let Ok(val) = env::var("VELTIS_PINNING_PROVIDER") {
            match val.to_ascii_lowercase().as_str() {
                "local" => self.pinning.provider = PinningProvider::Local,
                "pinata" => self.pinning.provider = PinningProvider::Pinata,
                other => tracing::warn!("Unknown pinning provider '{}', keeping configured value", other),
            }
        }
        if let Ok(val) = env::var("VELTIS_PINNING_API_KEY") {
            self.pinning.api_key = val;
        }
        if let Ok(val) = env::var("VELTIS_PINNING_SECRET_API_KEY") {
            self.pinning.secret_api_key = val;
        }
        if let Ok(val) = env::var("VELTIS_PINNING_LOCAL_PATH") {
            self.pinning.local_path = val;
        }

        // Chain overrides
        if let Ok(val) = env::var("VELTIS_CHAIN_RPC_URL") {
            self.chain.rpc_url = val;
        }
        if let Ok(val) = env::var("VELTIS_CHAIN_CONTRACT_ADDRESS") {
            self.chain.contract_address = val;
        }
        if let Ok(val) = env::var("VELTIS_CHAIN_VERIFY_MINTS") {
            if let Ok(v) = val.parse() {
                self.chain.verify_mints = v;
            }
        }

        // Limit overrides
        if let Ok(val) = env::var("VELTIS_LIMITS_FREE_RECORD_LIMIT") {
            if let Ok(v) = val.parse() {
                self.limits.free_record_limit = v;
            }
        }
        if let Ok(val) = env::var("VELTIS_LIMITS_FREE_STORAGE_LIMIT_BYTES") {
            if let Ok(v) = val.parse() {
                self.limits.free_storage_limit_bytes = v;
            }
        }
        if let Ok(val) = env::var("VELTIS_LIMITS_MAX_UPLOAD_BYTES") {
            if let Ok(v) = val.parse() {
                self.limits.max_upload_bytes = v;
            }
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.chain.verify_mints && self.chain.contract_address.trim().is_empty() {
            anyhow::bail!(
                "chain.verify_mints is enabled but chain.contract_address is empty; \
                 set the contract address or disable verification"
            );
        }
        Ok(())
    }

    /// Ensure required directories exist
    fn ensure_directories(&self) -> anyhow::Result<()> {
        // Ensure database directory exists
        if let Some(parent) = Path::new(&self.database.path).parent() {
            fs::create_dir_all(parent)?;
        }

        // Local pin storage only matters when the local provider is selected
        if self.pinning.provider == PinningProvider::Local {
            fs::create_dir_all(&self.pinning.local_path)?;
        }

        Ok(())
    }

    /// Ensure the JWT secret is non-default and persisted
    fn ensure_jwt_secret(&mut self) -> anyhow::Result<()> {
        if self.auth.jwt_secret == default_jwt_secret() || self.auth.jwt_secret.is_empty() {
            let secret_path = Path::new("data/.jwt_secret");

            if secret_path.exists() {
                let secret = fs::read_to_string(secret_path)?;
                self.auth.jwt_secret = secret.trim().to_string();
                tracing::info!("Loaded persisted JWT secret from data/.jwt_secret");
            } else {
                let secret = uuid::Uuid::new_v4().to_string();

                if let Some(parent) = secret_path.parent() {
                    fs::create_dir_all(parent)?;
                }

                fs::write(secret_path, &secret)?;
                self.auth.jwt_secret = secret;
                tracing::warn!(
                    "Generated a JWT secret at data/.jwt_secret; share it with the \
                     identity provider that issues bearer tokens"
                );
            }
        }
        Ok(())
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Gateway Configuration Types
//
// Defines the configuration schema for a session gateway deployment:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - HTTP server binding
// - Community (chain, RPC endpoint, session manager, provider)
// - Provider signing key reference
// - SMS gateway
// - Per-salt request limits
// - Observability settings

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::domain::address::parse_address;

pub const API_VERSION: &str = "session-gateway/v1";
pub const KIND: &str = "SessionGatewayConfig";

pub const CONFIG_PATH_ENV: &str = "SESSION_GATEWAY_CONFIG_PATH";
pub const RPC_URL_ENV: &str = "SESSION_GATEWAY_RPC_URL";
pub const PROVIDER_KEY_ENV: &str = "SESSION_GATEWAY_PROVIDER_PRIVATE_KEY";
pub const PORT_ENV: &str = "SESSION_GATEWAY_PORT";

/// Top-level Kubernetes-style gateway configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfigManifest {
    /// API version (must be "session-gateway/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "SessionGatewayConfig")
    pub kind: String,

    /// Deployment metadata (name, labels, version)
    pub metadata: ManifestMetadata,

    /// Gateway configuration specification
    pub spec: GatewayConfigSpec,
}

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Human-readable deployment name
    pub name: String,

    /// Optional: Configuration version for tracking
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Optional: Labels for categorization and discovery
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

/// Gateway configuration specification (content under spec:)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfigSpec {
    #[serde(default)]
    pub server: ServerConfig,

    /// Target community for on-chain relay
    pub community: CommunityConfig,

    /// Provider signing key
    #[serde(default)]
    pub signer: SignerConfig,

    /// SMS gateway used to deliver challenges
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sms: Option<SmsConfig>,

    #[serde(default)]
    pub limits: LimitsConfig,

    /// Outbound HTTP client settings (RPC and SMS)
    #[serde(default)]
    pub http: HttpClientConfig,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub observability: Option<ObservabilityConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Network bind address (e.g. "0.0.0.0" or "127.0.0.1")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP API port
    #[serde(default = "default_api_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityConfig {
    /// Short community identifier used in logs (e.g. "wallet.pay.brussels")
    pub alias: String,

    /// EIP-155 chain id of the community's network
    pub chain_id: u64,

    /// JSON-RPC endpoint
    pub rpc_url: String,

    /// Session-manager contract address
    pub session_manager: String,

    /// Provider address the session manager trusts
    pub session_provider: String,

    /// Safety margin applied to `eth_estimateGas`
    #[serde(default = "default_gas_limit_multiplier")]
    pub gas_limit_multiplier: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignerConfig {
    /// Provider private key (supports "env:VAR_NAME" for environment variables)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsConfig {
    /// Twilio-compatible REST base URL
    #[serde(default = "default_sms_endpoint")]
    pub endpoint: String,

    /// Account SID used in the request path and as basic-auth user
    pub account_sid: String,

    /// Auth token (supports "env:VAR_NAME")
    pub auth_token: String,

    /// Sender number or messaging service name
    pub from: String,

    /// Message body; `{challenge}` is replaced by the code
    #[serde(default = "default_sms_template")]
    pub template: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum accepted session requests per salt within the window
    #[serde(default = "default_max_requests_per_salt")]
    pub max_requests_per_salt: u32,

    /// Window length in seconds
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpClientConfig {
    /// Per-request timeout for outbound calls
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,

    /// Expose Prometheus metrics at /metrics
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "trace")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format ("json" or "text")
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8000
}

fn default_gas_limit_multiplier() -> f64 {
    1.2
}

fn default_sms_endpoint() -> String {
    "https://api.twilio.com/2010-04-01".to_string()
}

fn default_sms_template() -> String {
    "{challenge} is your verification code".to_string()
}

fn default_max_requests_per_salt() -> u32 {
    5
}

fn default_window_seconds() -> u64 {
    3600
}

fn default_timeout_seconds() -> u64 {
    15
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_api_port(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_requests_per_salt: default_max_requests_per_salt(),
            window_seconds: default_window_seconds(),
        }
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for CommunityConfig {
    fn default() -> Self {
        Self {
            alias: "local".to_string(),
            chain_id: 31337,
            rpc_url: "http://127.0.0.1:8545".to_string(),
            session_manager: Address::ZERO.to_string(),
            session_provider: Address::ZERO.to_string(),
            gas_limit_multiplier: default_gas_limit_multiplier(),
        }
    }
}

impl Default for GatewayConfigSpec {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            community: CommunityConfig::default(),
            signer: SignerConfig::default(),
            sms: None,
            limits: LimitsConfig::default(),
            http: HttpClientConfig::default(),
            observability: None,
        }
    }
}

impl Default for GatewayConfigManifest {
    fn default() -> Self {
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "session-gateway".to_string());

        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: hostname,
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: GatewayConfigSpec::default(),
        }
    }
}

impl CommunityConfig {
    pub fn session_manager_address(&self) -> anyhow::Result<Address> {
        parse_address(&self.session_manager)
            .map_err(|e| anyhow::anyhow!("spec.community.session_manager: {}", e))
    }

    pub fn session_provider_address(&self) -> anyhow::Result<Address> {
        parse_address(&self.session_provider)
            .map_err(|e| anyhow::anyhow!("spec.community.session_provider: {}", e))
    }
}

impl GatewayConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Candidate paths checked by [`Self::discover_config`], in order.
    pub fn discovery_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            paths.push(PathBuf::from(path));
        }
        paths.push(PathBuf::from("./session-gateway.yaml"));
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".session-gateway").join("config.yaml"));
        }
        #[cfg(unix)]
        paths.push(PathBuf::from("/etc/session-gateway/config.yaml"));
        #[cfg(windows)]
        paths.push(PathBuf::from("C:\\ProgramData\\SessionGateway\\config.yaml"));
        paths
    }

    /// Discover configuration file using precedence order
    /// 1. SESSION_GATEWAY_CONFIG_PATH environment variable
    /// 2. ./session-gateway.yaml (working directory)
    /// 3. ~/.session-gateway/config.yaml (user home)
    /// 4. /etc/session-gateway/config.yaml (system)
    pub fn discover_config() -> Option<PathBuf> {
        Self::discovery_paths().into_iter().find(|p| p.exists())
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // 1. Explicit CLI path (Fail if missing/invalid)
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        // 2. Discovery (Env -> Cwd -> Home -> System)
        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    /// This allows container deployments to override config via env vars
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(RPC_URL_ENV) {
            tracing::info!("Environment override: {}", RPC_URL_ENV);
            self.spec.community.rpc_url = url;
        }

        // The key itself stays in the environment; only the reference is stored.
        if std::env::var(PROVIDER_KEY_ENV).is_ok() {
            tracing::info!("Environment override: {} (provider key)", PROVIDER_KEY_ENV);
            self.spec.signer.private_key = Some(format!("env:{}", PROVIDER_KEY_ENV));
        }

        if let Ok(val) = std::env::var(PORT_ENV) {
            match val.parse::<u16>() {
                Ok(port) => {
                    tracing::info!("Environment override: {}={}", PORT_ENV, port);
                    self.spec.server.port = port;
                }
                Err(_) => {
                    tracing::warn!(
                        "Invalid value for {}: '{}'. Expected a port number. Ignoring.",
                        PORT_ENV,
                        val
                    );
                }
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        let community = &self.spec.community;
        if community.alias.is_empty() {
            anyhow::bail!("spec.community.alias cannot be empty");
        }
        url::Url::parse(&community.rpc_url).map_err(|e| {
            anyhow::anyhow!("spec.community.rpc_url is not a valid URL: {}", e)
        })?;
        if community.session_manager_address()? == Address::ZERO {
            anyhow::bail!("spec.community.session_manager must be set");
        }
        if community.session_provider_address()? == Address::ZERO {
            anyhow::bail!("spec.community.session_provider must be set");
        }
        if !(community.gas_limit_multiplier >= 1.0) {
            anyhow::bail!("spec.community.gas_limit_multiplier must be >= 1.0");
        }

        if let Some(sms) = &self.spec.sms {
            url::Url::parse(&sms.endpoint)
                .map_err(|e| anyhow::anyhow!("spec.sms.endpoint is not a valid URL: {}", e))?;
            if sms.account_sid.is_empty() || sms.auth_token.is_empty() || sms.from.is_empty() {
                anyhow::bail!("spec.sms requires account_sid, auth_token and from");
            }
            if !sms.template.contains("{challenge}") {
                anyhow::bail!("spec.sms.template must contain the {{challenge}} placeholder");
            }
        }

        if self.spec.limits.max_requests_per_salt == 0 {
            anyhow::bail!("spec.limits.max_requests_per_salt must be at least 1");
        }
        if self.spec.limits.window_seconds == 0 {
            anyhow::bail!("spec.limits.window_seconds must be at least 1");
        }
        if self.spec.http.timeout_seconds == 0 {
            anyhow::bail!("spec.http.timeout_seconds must be at least 1");
        }

        Ok(())
    }
}

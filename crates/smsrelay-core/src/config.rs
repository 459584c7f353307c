//! Configuration management for smsrelay
//!
//! The configuration is read once at startup from a YAML file, overlaid with
//! `SMSRELAY_*` environment variables, validated, and then shared immutably.

use std::path::Path;
use std::time::Duration;

use config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use crate::error::{Error, Result};
use crate::provider::ContentType;

const MAX_NAME_LEN: usize = 25;

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Relay settings (provider, recipients, routing)
    pub smsrelay: RelayConfig,

    /// HTTP server configuration
    pub server: ServerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Load and validate the configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading configuration");

        let config: Config = config::Config::builder()
            .add_source(File::from(path).format(FileFormat::Yaml))
            .add_source(
                Environment::with_prefix("SMSRELAY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Parse and validate configuration from an in-memory YAML document.
    pub fn from_yaml(source: &str) -> Result<Self> {
        let config: Config = config::Config::builder()
            .add_source(File::from_str(source, FileFormat::Yaml))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Check every field constraint; the first violation is reported.
    pub fn validate(&self) -> Result<()> {
        self.smsrelay.validate()?;

        if self.server.port == 0 {
            return Err(Error::validation("server.port", "must be greater than 0"));
        }
        if !self.server.path.starts_with('/') {
            return Err(Error::validation("server.path", "must start with '/'"));
        }

        Ok(())
    }
}

/// Relay configuration, stored under the `smsrelay` key
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Basic authentication on the inbound webhook
    pub auth: AuthConfig,

    /// Log requests instead of calling the provider
    pub simulation: bool,

    /// SMS provider API
    pub provider: ProviderConfig,

    /// Recipient directory
    pub recipients: Vec<Recipient>,

    /// Which alert fields carry the message and recipient group
    pub alert: AlertFieldsConfig,

    /// Background dispatch pool
    pub dispatch: DispatchConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            auth: AuthConfig::default(),
            simulation: true,
            provider: ProviderConfig::default(),
            recipients: Vec::new(),
            alert: AlertFieldsConfig::default(),
            dispatch: DispatchConfig::default(),
        }
    }
}

impl RelayConfig {
    /// Members of the first recipient group named `name`.
    pub fn members_of(&self, name: &str) -> Option<&[String]> {
        self.recipients
            .iter()
            .find(|recipient| recipient.name == name)
            .map(|recipient| recipient.members.as_slice())
    }

    fn validate(&self) -> Result<()> {
        self.auth.validate()?;
        self.provider.validate()?;

        if self.recipients.is_empty() {
            return Err(Error::validation(
                "smsrelay.recipients",
                "at least one recipient is required",
            ));
        }
        for recipient in &self.recipients {
            recipient.validate()?;
        }

        if self.dispatch.workers == 0 {
            return Err(Error::validation(
                "smsrelay.dispatch.workers",
                "must be at least 1",
            ));
        }
        if self.dispatch.queue_capacity == 0 {
            return Err(Error::validation(
                "smsrelay.dispatch.queue_capacity",
                "must be at least 1",
            ));
        }

        Ok(())
    }
}

/// Inbound webhook basic authentication
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Require credentials on the webhook route
    pub enabled: bool,
    /// Expected username
    pub username: String,
    /// Expected password
    pub password: String,
}

impl AuthConfig {
    fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let len = self.username.chars().count();
        if !(2..=MAX_NAME_LEN).contains(&len) {
            return Err(Error::validation(
                "smsrelay.auth.username",
                "must be between 2 and 25 characters",
            ));
        }
        if self.password.chars().count() < 8 {
            return Err(Error::validation(
                "smsrelay.auth.password",
                "must be at least 8 characters",
            ));
        }

        Ok(())
    }
}

/// SMS provider API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Endpoint receiving the POST
    pub url: String,

    /// Timeout applied to each provider request
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Encoding of the request body
    pub content_type: String,

    /// Optional `Authorization` header
    pub authentication: ProviderAuthentication,

    /// Parameter mapping rules
    pub parameters: Parameters,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout: Duration::from_secs(10),
            content_type: ContentType::Json.as_str().to_string(),
            authentication: ProviderAuthentication::default(),
            parameters: Parameters::default(),
        }
    }
}

impl ProviderConfig {
    fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(Error::validation("smsrelay.provider.url", "is required"));
        }
        let url = Url::parse(&self.url)
            .map_err(|e| Error::validation("smsrelay.provider.url", e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::validation(
                "smsrelay.provider.url",
                "scheme must be http or https",
            ));
        }

        if self.timeout.is_zero() {
            return Err(Error::validation(
                "smsrelay.provider.timeout",
                "must be greater than 0",
            ));
        }

        self.content_type.parse::<ContentType>().map_err(|_| {
            Error::validation(
                "smsrelay.provider.content_type",
                format!("unsupported content type: {}", self.content_type),
            )
        })?;

        self.authentication.validate()?;
        self.parameters.validate()
    }
}

/// Provider authentication block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderAuthentication {
    /// Send an `Authorization` header
    pub enabled: bool,
    /// Header contents
    pub authorization: Authorization,
}

impl ProviderAuthentication {
    /// The `Authorization` header value, when enabled.
    pub fn header_value(&self) -> Option<String> {
        self.enabled.then(|| {
            format!(
                "{} {}",
                self.authorization.auth_type, self.authorization.credential
            )
        })
    }

    fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let auth_type = &self.authorization.auth_type;
        if auth_type.is_empty() || auth_type.chars().count() > MAX_NAME_LEN {
            return Err(Error::validation(
                "smsrelay.provider.authentication.authorization.type",
                "must be between 1 and 25 characters",
            ));
        }
        if self.authorization.credential.is_empty() {
            return Err(Error::validation(
                "smsrelay.provider.authentication.authorization.credential",
                "is required",
            ));
        }

        Ok(())
    }
}

/// `Authorization: <type> <credential>`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Authorization {
    /// Scheme, e.g. `Bearer`
    #[serde(rename = "type")]
    pub auth_type: String,
    /// Token or encoded credentials
    pub credential: String,
}

/// Where a parameter is placed in the outbound request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamMethod {
    /// In the request body
    #[default]
    Post,
    /// In the query string
    Query,
}

/// Sender parameter, carrying a static value
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FromParameter {
    /// Name used by the provider API
    pub param_name: String,
    /// Sender identity sent with every message
    pub param_value: String,
    /// Body or query placement
    pub param_method: ParamMethod,
}

impl Default for FromParameter {
    fn default() -> Self {
        Self {
            param_name: "from".to_string(),
            param_value: String::new(),
            param_method: ParamMethod::Post,
        }
    }
}

/// Destination parameter, receiving the member phone number
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToParameter {
    /// Name used by the provider API
    pub param_name: String,
    /// Body or query placement
    pub param_method: ParamMethod,
}

impl Default for ToParameter {
    fn default() -> Self {
        Self {
            param_name: "to".to_string(),
            param_method: ParamMethod::Post,
        }
    }
}

/// Text parameter; has no default name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageParameter {
    /// Name used by the provider API
    pub param_name: String,
    /// Must stay `post`
    pub param_method: ParamMethod,
}

/// The `from`, `to` and `message` parameter rules
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// Sender
    pub from: FromParameter,
    /// Destination
    pub to: ToParameter,
    /// Text body, always sent in the request body
    pub message: MessageParameter,
}

impl Parameters {
    fn validate(&self) -> Result<()> {
        validate_param_name(&self.from.param_name, "from")?;
        validate_param_name(&self.to.param_name, "to")?;
        validate_param_name(&self.message.param_name, "message")?;

        let len = self.from.param_value.chars().count();
        if len == 0 || len > MAX_NAME_LEN {
            return Err(Error::validation(
                "smsrelay.provider.parameters.from.param_value",
                "must be between 1 and 25 characters",
            ));
        }
        if self.message.param_method != ParamMethod::Post {
            return Err(Error::validation(
                "smsrelay.provider.parameters.message.param_method",
                "message is always sent with post",
            ));
        }

        Ok(())
    }
}

fn validate_param_name(name: &str, field: &str) -> Result<()> {
    let len = name.chars().count();
    if len == 0 || len > MAX_NAME_LEN {
        return Err(Error::validation(
            format!("smsrelay.provider.parameters.{field}.param_name"),
            "must be between 1 and 25 characters",
        ));
    }
    Ok(())
}

/// A named group of phone numbers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    /// Group name matched against the alert's recipient field
    pub name: String,
    /// Phone numbers
    pub members: Vec<String>,
}

impl Recipient {
    fn validate(&self) -> Result<()> {
        let len = self.name.chars().count();
        if len == 0 || len > MAX_NAME_LEN {
            return Err(Error::validation(
                "smsrelay.recipients.name",
                "must be between 1 and 25 characters",
            ));
        }
        if self.members.is_empty() {
            return Err(Error::validation(
                format!("smsrelay.recipients[{}].members", self.name),
                "at least one member is required",
            ));
        }
        for member in &self.members {
            let len = member.chars().count();
            if len == 0 || len > MAX_NAME_LEN {
                return Err(Error::validation(
                    format!("smsrelay.recipients[{}].members", self.name),
                    "each member must be between 1 and 25 characters",
                ));
            }
        }
        Ok(())
    }
}

/// Alert map an attribute is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldSource {
    /// `alert.labels`
    Labels,
    /// `alert.annotations`
    Annotations,
}

/// Reference to a single label or annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRef {
    /// Map to read
    pub source: FieldSource,
    /// Key within the map
    pub key: String,
}

/// Alert attribute selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertFieldsConfig {
    /// Field holding the SMS text
    pub message: FieldRef,
    /// Field holding the recipient group name
    pub recipient: FieldRef,
}

impl Default for AlertFieldsConfig {
    fn default() -> Self {
        Self {
            message: FieldRef {
                source: FieldSource::Annotations,
                key: "message".to_string(),
            },
            recipient: FieldRef {
                source: FieldSource::Labels,
                key: "recipient".to_string(),
            },
        }
    }
}

/// Background dispatch pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Concurrent dispatch workers
    pub workers: usize,
    /// Webhooks that may wait for a worker
    pub queue_capacity: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 256,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// HTTP port
    pub port: u16,
    /// Route receiving Alertmanager webhooks
    pub path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9087,
            path: "/alert".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (json or pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

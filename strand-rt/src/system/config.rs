//! System configuration with sensible defaults.

// Layer 1: Standard library
// (none)

// Layer 2: Third-party
use serde::{Deserialize, Serialize};

// Layer 3: Internal
// (none)

/// Default system name, used as the prefix of actor thread names.
pub const DEFAULT_SYSTEM_NAME: &str = "strand";

/// Default mailbox depth at which a one-shot warning is logged.
pub const DEFAULT_MAILBOX_WARN_THRESHOLD: usize = 10_000;

/// System-wide configuration for the actor runtime.
///
/// # Examples
///
/// ```rust
/// use strand_rt::system::{SystemConfig, DEFAULT_MAILBOX_WARN_THRESHOLD};
///
/// // Use default configuration
/// let config = SystemConfig::default();
/// assert_eq!(config.mailbox_warn_threshold, DEFAULT_MAILBOX_WARN_THRESHOLD);
///
/// // Use builder for custom configuration
/// let config = SystemConfig::builder()
///     .with_name("pipeline")
///     .with_mailbox_warn_threshold(500)
///     .build()
///     .unwrap();
/// assert_eq!(config.name, "pipeline");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    /// System name; actor and timer threads are named `{name}/{actor}`.
    pub name: String,

    /// Mailbox depth at which a single warning is logged per mailbox.
    /// Mailboxes stay unbounded; this only controls observability.
    pub mailbox_warn_threshold: usize,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_SYSTEM_NAME.to_owned(),
            mailbox_warn_threshold: DEFAULT_MAILBOX_WARN_THRESHOLD,
        }
    }
}

impl SystemConfig {
    /// Create a new configuration builder.
    pub fn builder() -> SystemConfigBuilder {
        SystemConfigBuilder::default()
    }

    /// Validate configuration values.
    ///
    /// Returns `Err` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("name must not be empty".to_owned());
        }
        if self.mailbox_warn_threshold == 0 {
            return Err("mailbox_warn_threshold must be > 0".to_owned());
        }
        Ok(())
    }
}

/// Builder for [`SystemConfig`] with a fluent API.
#[derive(Debug, Default)]
pub struct SystemConfigBuilder {
    config: SystemConfig,
}

impl SystemConfigBuilder {
    /// Set the system name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Set the mailbox depth warning threshold.
    pub fn with_mailbox_warn_threshold(mut self, threshold: usize) -> Self {
        self.config.mailbox_warn_threshold = threshold;
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<SystemConfig, String> {
        self.config.validate()?;
        Ok(self.config)
    }
}

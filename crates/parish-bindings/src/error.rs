//! Error types for the bindings layer
//!
//! The binding hooks themselves never fail. Errors here cover setting the
//! layer up:
//! - Configuration loading and validation
//! - Binding source registration

/// Errors while loading or validating [`crate::SyncConfig`]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML could not be parsed into a configuration
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field holds a value the synchronizer cannot work with
    #[error("invalid configuration: {field}: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

impl ConfigError {
    /// Create invalid field error
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors from [`crate::BindingSourceRegistry`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A source with this name is already registered
    #[error("binding source already registered: '{0}'")]
    AlreadyRegistered(String),

    /// Name is not of the form `namespace/name`
    #[error("invalid binding source name: '{0}'")]
    InvalidName(String),
}

/// Combined bindings layer error
#[derive(Debug, thiserror::Error)]
pub enum BindingsError {
    /// Configuration rejected
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Source could not be registered
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
}

/// Result type alias for bindings layer setup
pub type BindingsResult<T> = Result<T, BindingsError>;

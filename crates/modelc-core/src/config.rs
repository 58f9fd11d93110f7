//! Generator configuration.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default name of the generic identifier domain.
pub const DEFAULT_IDENTIFIER_DOMAIN: &str = "DO_ID";

/// Default name of the free-form alias domain.
pub const DEFAULT_FREE_ALIAS_DOMAIN: &str = "DO_ALIAS";

/// Default persisted target.
pub const DEFAULT_PERSISTED_TARGET: &str = "sql";

/// Default client target.
pub const DEFAULT_CLIENT_TARGET: &str = "ts";

/// Default persisted type of identity primary keys.
pub const DEFAULT_IDENTITY_COLUMN_TYPE: &str = "serial";

/// Default client type of structured data.
pub const DEFAULT_OPEN_OBJECT_TYPE: &str = "Record<string, unknown>";

/// Top-level settings of a resolution run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Application name (root namespace). Required.
    pub app_name: Option<String>,

    /// Declared modules. When non-empty, every file must belong to one.
    pub modules: Vec<String>,

    /// Domain of generated identifiers (auto-increment keys).
    pub identifier_domain: String,

    /// Domain marking free-form alias fields.
    pub free_alias_domain: String,

    /// Target name of the persisted schema.
    pub persisted_target: String,

    /// Target name of the client side.
    pub client_target: String,

    /// Persisted type of identifier primary keys.
    pub identity_column_type: String,

    /// Client type of structured data.
    pub open_object_type: String,
}

impl GeneratorConfig {
    /// Create a configuration for the given application.
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: Some(app_name.into()),
            ..Self::default()
        }
    }

    /// Declare a module.
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.modules.push(module.into());
        self
    }

    /// Set the identifier domain.
    pub fn with_identifier_domain(mut self, domain: impl Into<String>) -> Self {
        self.identifier_domain = domain.into();
        self
    }

    /// Set the free-form alias domain.
    pub fn with_free_alias_domain(mut self, domain: impl Into<String>) -> Self {
        self.free_alias_domain = domain.into();
        self
    }

    /// Set the persisted target name.
    pub fn with_persisted_target(mut self, target: impl Into<String>) -> Self {
        self.persisted_target = target.into();
        self
    }

    /// Set the client target name.
    pub fn with_client_target(mut self, target: impl Into<String>) -> Self {
        self.client_target = target.into();
        self
    }

    /// Set the persisted type of identifier primary keys.
    pub fn with_identity_column_type(mut self, ty: impl Into<String>) -> Self {
        self.identity_column_type = ty.into();
        self
    }

    /// Set the client type of structured data.
    pub fn with_open_object_type(mut self, ty: impl Into<String>) -> Self {
        self.open_object_type = ty.into();
        self
    }

    /// Application name, once validated.
    pub fn app_name(&self) -> &str {
        self.app_name.as_deref().unwrap_or_default()
    }

    /// Check that every required setting is present.
    pub fn validate(&self) -> Result<(), Error> {
        let required = [
            ("app_name", self.app_name.as_deref().unwrap_or_default()),
            ("identifier_domain", self.identifier_domain.as_str()),
            ("persisted_target", self.persisted_target.as_str()),
            ("client_target", self.client_target.as_str()),
        ];
        for (setting, value) in required {
            if value.trim().is_empty() {
                return Err(Error::MissingSetting {
                    setting: setting.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Check whether files of a module may be loaded.
    pub fn is_module_declared(&self, module: &str) -> bool {
        self.modules.is_empty() || self.modules.iter().any(|m| m == module)
    }

    /// Parse a JSON configuration document.
    pub fn from_json(text: &str) -> Result<Self, Error> {
        serde_json::from_str(text).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    /// Read a JSON configuration file.
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            app_name: None,
            modules: Vec::new(),
            identifier_domain: DEFAULT_IDENTIFIER_DOMAIN.to_string(),
            free_alias_domain: DEFAULT_FREE_ALIAS_DOMAIN.to_string(),
            persisted_target: DEFAULT_PERSISTED_TARGET.to_string(),
            client_target: DEFAULT_CLIENT_TARGET.to_string(),
            identity_column_type: DEFAULT_IDENTITY_COLUMN_TYPE.to_string(),
            open_object_type: DEFAULT_OPEN_OBJECT_TYPE.to_string(),
        }
    }
}

//! Where adapters look up their API keys.
//!
//! Adapters never read the process environment directly; they ask a
//! [`CredentialProvider`], which lets tests inject keys and lets the CLI
//! layer the environment over keys found in the config file.
use std::collections::HashMap;
use std::sync::Arc;

pub const SERPER_API_KEY: &str = "SERPER_API_KEY";
pub const XAI_API_KEY: &str = "XAI_API_KEY";

pub trait CredentialProvider: Send + Sync {
    /// Value of the named credential, or `None` when it is unset or blank.
    fn get(&self, name: &str) -> Option<String>;
}

impl<F> CredentialProvider for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn get(&self, name: &str) -> Option<String> {
        usable(self(name))
    }
}

fn usable(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Reads the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialProvider for EnvCredentials {
    fn get(&self, name: &str) -> Option<String> {
        usable(std::env::var(name).ok())
    }
}

/// Fixed key/value pairs.
///
/// ```
/// use hybrid_config::{CredentialProvider, StaticCredentials, SERPER_API_KEY};
///
/// let creds = StaticCredentials::default().with(SERPER_API_KEY, "k");
/// assert_eq!(creds.get(SERPER_API_KEY).as_deref(), Some("k"));
/// assert!(creds.get("XAI_API_KEY").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    values: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

impl CredentialProvider for StaticCredentials {
    fn get(&self, name: &str) -> Option<String> {
        usable(self.values.get(name).cloned())
    }
}

/// Keys taken from the loaded config file.
///
/// A placeholder such as `${XAI_API_KEY}` that survived expansion means the
/// variable was never set, so it counts as absent.
#[derive(Debug, Clone, Default)]
pub struct ConfigCredentials {
    serper: Option<String>,
    xai: Option<String>,
}

impl ConfigCredentials {
    pub fn new(serper: Option<String>, xai: Option<String>) -> Self {
        let clean = |v: Option<String>| usable(v).filter(|v| !v.contains("${"));
        Self {
            serper: clean(serper),
            xai: clean(xai),
        }
    }
}

impl CredentialProvider for ConfigCredentials {
    fn get(&self, name: &str) -> Option<String> {
        match name {
            SERPER_API_KEY => self.serper.clone(),
            XAI_API_KEY => self.xai.clone(),
            _ => None,
        }
    }
}

/// First provider with a value wins.
#[derive(Clone, Default)]
pub struct LayeredCredentials {
    layers: Vec<Arc<dyn CredentialProvider>>,
}

impl LayeredCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<P: CredentialProvider + 'static>(mut self, provider: P) -> Self {
        self.layers.push(Arc::new(provider));
        self
    }
}

impl CredentialProvider for LayeredCredentials {
    fn get(&self, name: &str) -> Option<String> {
        self.layers.iter().find_map(|layer| layer.get(name))
    }
}

impl std::fmt::Debug for LayeredCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayeredCredentials")
            .field("layers", &self.layers.len())
            .finish()
    }
}

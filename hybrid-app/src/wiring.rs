//! Builds the adapter registry from configuration.
use std::sync::Arc;

use anyhow::{Context, Result};
use hybrid_common::GrokMode;
use hybrid_config::{CredentialProvider, EnvCredentials, HybridConfig, LayeredCredentials};
use hybrid_runtime::Coordinator;
use hybrid_sources::{GoogleSource, GrokSource};

/// Process environment first, then keys from the config file.
pub fn credentials(cfg: &HybridConfig) -> Arc<dyn CredentialProvider> {
    Arc::new(
        LayeredCredentials::new()
            .push(EnvCredentials)
            .push(cfg.credentials()),
    )
}

/// Register every known source. Missing keys are detected per request, so
/// a source without credentials is still registered.
pub fn build_coordinator(
    cfg: &HybridConfig,
    credentials: Arc<dyn CredentialProvider>,
) -> Result<Coordinator> {
    let mut coordinator = Coordinator::new();

    let google = GoogleSource::new(&cfg.google.endpoint, credentials.clone())
        .with_context(|| format!("invalid google.endpoint: {}", cfg.google.endpoint))?;
    coordinator.register(Arc::new(google));

    for mode in [GrokMode::Web, GrokMode::X, GrokMode::Both] {
        let grok = GrokSource::new(mode, &cfg.grok.endpoint, credentials.clone())
            .with_context(|| format!("invalid grok.endpoint: {}", cfg.grok.endpoint))?;
        coordinator.register(Arc::new(grok));
    }

    tracing::debug!(sources = ?coordinator.sources(), "app.coordinator.ready");
    Ok(coordinator)
}

use std::sync::{Arc, OnceLock};

use hybrid_common::observability::{LogConfig, LogFormat, LogSink};
use hybrid_config::{CredentialProvider, StaticCredentials};

static INIT: OnceLock<LogSink> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT.get_or_init(|| {
        let config = LogConfig {
            app_name: "hybrid-tests",
            to_file: false,
            format: if std::env::var("HYBRID_LOG_FORMAT")
                .map(|raw| raw.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(false)
            {
                LogFormat::Json
            } else {
                LogFormat::Text
            },
            default_filter: "debug".into(),
            ..LogConfig::default()
        };
        hybrid_common::observability::init_logging(config).unwrap_or(LogSink::Stderr)
    });
}

pub fn creds(pairs: &[(&str, &str)]) -> Arc<dyn CredentialProvider> {
    let store = pairs
        .iter()
        .fold(StaticCredentials::default(), |acc, (k, v)| acc.with(*k, *v));
    Arc::new(store)
}

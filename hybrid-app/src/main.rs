use anyhow::{Context, Result, bail};
use clap::Parser;
use hybrid_common::observability::init_logging;
use hybrid_common::{HybridError, SearchRequest, SourceName};
use hybrid_config::{HybridConfig, HybridConfigLoader, default_config_path};
use hybrid_report::{render_json, render_text};

mod cli;
mod wiring;

use cli::{Cli, Command, OutputArgs, join_query};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Config: file (explicit or default location), then HYBRID__* env.
    let mut loader = HybridConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_file(path);
    } else if let Some(path) = default_config_path() {
        loader = loader.with_optional_file(path);
    }
    let mut cfg = loader.load().context("failed to load configuration")?;

    // 2) Logging, with CLI flags taking precedence over the file.
    if let Some(format) = cli.log_format {
        cfg.logging.format = format.into();
    }
    if cli.verbose {
        cfg.logging.stderr = true;
        cfg.logging.filter = "debug".into();
    }
    let sink = init_logging(cfg.log_config())?;
    tracing::debug!(?sink, "app.logging.ready");

    // 3) Run.
    match cli.command {
        Command::Config => {
            print!("{}", cfg.to_redacted_yaml()?);
            Ok(())
        }
        Command::Search {
            query,
            sources,
            output,
        } => {
            let sources = if sources.is_empty() {
                cfg.search.sources.clone()
            } else {
                sources
            };
            search(&cfg, join_query(&query), &sources, &output).await
        }
        Command::Google { query, num, output } => {
            if let Some(num) = num {
                cfg.google.num = num;
            }
            search(&cfg, join_query(&query), &[SourceName::Google], &output).await
        }
        Command::Grok {
            query,
            mode,
            output,
        } => search(&cfg, join_query(&query), &[mode.source()], &output).await,
    }
}

async fn search(
    cfg: &HybridConfig,
    query: String,
    sources: &[SourceName],
    output: &OutputArgs,
) -> Result<()> {
    let credentials = wiring::credentials(cfg);
    let coordinator = wiring::build_coordinator(cfg, credentials)?;
    let request = SearchRequest::new(query, output.deadline(cfg.deadline()))
        .with_options(cfg.search_options());

    let report = match coordinator.run(&request, sources).await {
        Ok(report) => report,
        Err(HybridError::MissingCredentials { missing }) => {
            let exports = missing
                .iter()
                .map(|var| format!("  export {var}=\"your_key\""))
                .collect::<Vec<_>>()
                .join("\n");
            bail!(
                "missing API keys: {}\nSet them in the environment or in the config file, e.g.:\n{exports}",
                missing.join(", ")
            );
        }
        Err(e) => return Err(e.into()),
    };

    if report.all_failed() {
        tracing::warn!(report_id = %report.id, "app.search.no_results");
    }

    let rendered = if output.json {
        render_json(&report)?
    } else {
        render_text(&report)
    };
    println!("{rendered}");
    Ok(())
}

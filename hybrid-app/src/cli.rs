use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use hybrid_common::observability::LogFormat;
use hybrid_common::{GrokMode, SourceName};

#[derive(Debug, Parser)]
#[command(
    name = "hybrid-search",
    version,
    about = "Query Google (Serper) and xAI Grok in parallel and merge the results",
    after_help = "Examples:\n  hybrid-search search \"Taiwan news today\"\n  hybrid-search search \"BTC price\" --sources google grok_web\n  hybrid-search grok \"rust 2024 edition\" --mode x --json"
)]
pub struct Cli {
    /// Config file (defaults to ~/.config/hybrid-search/config.yaml when present).
    #[arg(long, global = true, env = "HYBRID_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormatArg>,

    /// Mirror debug logs to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Search several sources at once and merge the results.
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        /// Sources to query (defaults to `search.sources` from config).
        #[arg(long, num_args = 1.., value_delimiter = ',')]
        sources: Vec<SourceName>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Google search through Serper only.
    Google {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        /// Number of organic results.
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=100))]
        num: Option<u32>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Grok search with web and/or X tools.
    Grok {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        #[arg(long, default_value = "web")]
        mode: GrokMode,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Print the effective configuration with secrets masked.
    Config,
}

#[derive(Debug, Clone, Args)]
pub struct OutputArgs {
    /// Overall deadline in seconds (defaults to `search.timeout_secs`).
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,
    /// Print the full report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl OutputArgs {
    pub fn deadline(&self, fallback: Duration) -> Duration {
        self.timeout.map(Duration::from_secs).unwrap_or(fallback)
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Text,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => LogFormat::Text,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

pub fn join_query(words: &[String]) -> String {
    words.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_accepts_space_and_comma_separated_sources() {
        let cli = Cli::try_parse_from([
            "hybrid-search",
            "search",
            "BTC",
            "price",
            "--sources",
            "google",
            "grok-web,grok_x",
            "--timeout",
            "30",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Command::Search {
                query,
                sources,
                output,
            } => {
                assert_eq!(join_query(&query), "BTC price");
                assert_eq!(
                    sources,
                    vec![SourceName::Google, SourceName::GrokWeb, SourceName::GrokX]
                );
                assert_eq!(output.deadline(Duration::from_secs(60)), Duration::from_secs(30));
                assert!(output.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn grok_mode_defaults_to_web() {
        let cli = Cli::try_parse_from(["hybrid-search", "grok", "rust"]).unwrap();
        assert!(matches!(cli.command, Command::Grok { mode: GrokMode::Web, .. }));

        let cli = Cli::try_parse_from(["hybrid-search", "-v", "grok", "rust", "--mode", "both"])
            .unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Grok { mode: GrokMode::Both, .. }));
    }

    #[test]
    fn rejects_unknown_sources_and_bad_numbers() {
        assert!(Cli::try_parse_from(["hybrid-search", "search", "q", "--sources", "bing"]).is_err());
        assert!(Cli::try_parse_from(["hybrid-search", "google", "q", "--num", "0"]).is_err());
        assert!(Cli::try_parse_from(["hybrid-search", "search", "q", "--timeout", "0"]).is_err());
        assert!(Cli::try_parse_from(["hybrid-search", "search"]).is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

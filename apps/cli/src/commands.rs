//! CLI command definitions, routing, and tracing setup.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use url::Url;

use seoscribe_core::{RewriteOutcome, RewritePhase, RewriteProgress, RewriteRequest, Rewriter};
use seoscribe_shared::{
    AppConfig, EmbeddingProvider, SeoscribeError, init_config, load_config, load_config_from,
    validate_api_key,
};

use crate::frontend::BlockingRewriter;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// seoscribe — SEO rewrites grounded on a website's own content.
#[derive(Parser)]
#[command(
    name = "seoscribe",
    version,
    about = "Rewrite text for SEO using knowledge fetched from a website.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.seoscribe/seoscribe.toml.
    #[arg(long, global = true, env = "SEOSCRIBE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Embedding backend selectable from the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum EmbedderArg {
    Ollama,
    Hashing,
}

impl From<EmbedderArg> for EmbeddingProvider {
    fn from(arg: EmbedderArg) -> Self {
        match arg {
            EmbedderArg::Ollama => Self::Ollama,
            EmbedderArg::Hashing => Self::Hashing,
        }
    }
}

/// Backend overrides shared by `rewrite` and `session`.
#[derive(clap::Args, Debug, Clone, Default)]
pub(crate) struct BackendArgs {
    /// Embedding backend (overrides config).
    #[arg(long, value_enum)]
    pub embedder: Option<EmbedderArg>,

    /// Chat model used for the rewrite (overrides config).
    #[arg(long)]
    pub model: Option<String>,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch a page and rewrite TEXT using its content.
    Rewrite {
        /// Page to learn from.
        #[arg(long)]
        url: String,

        /// Keyword to optimize for (defaults to the text itself).
        #[arg(short, long)]
        keyword: Option<String>,

        #[command(flatten)]
        backend: BackendArgs,

        /// Text to rewrite.
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Interactive loop; knowledge persists across rewrites until exit.
    Session {
        #[command(flatten)]
        backend: BackendArgs,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "seoscribe=warn",
        1 => "seoscribe=info",
        2 => "seoscribe=debug",
        _ => "seoscribe=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Rewrite {
            url,
            keyword,
            backend,
            text,
        } => cmd_rewrite(config_path, &backend, &url, keyword, &text.join(" ")),
        Command::Session { backend } => cmd_session(config_path, &backend),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

/// Load config from `path` (or the default location) and apply flag overrides.
fn resolve_config(path: Option<&Path>, backend: &BackendArgs) -> Result<AppConfig> {
    let mut config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };

    if let Some(embedder) = backend.embedder {
        config.embedding.provider = embedder.into();
    }
    if let Some(model) = &backend.model {
        config.llm.model.clone_from(model);
    }

    config.validate()?;
    validate_api_key(&config)?;
    Ok(config)
}

fn build_frontend(config: &AppConfig) -> Result<BlockingRewriter> {
    let rewriter = Rewriter::from_config(config)?;
    info!(
        embedder = ?config.embedding.provider,
        llm = ?config.llm.provider,
        model = %config.llm.model,
        retrieval = ?config.knowledge.retrieval,
        "pipeline ready"
    );
    BlockingRewriter::new(rewriter)
}

fn cmd_rewrite(
    config_path: Option<&Path>,
    backend: &BackendArgs,
    url: &str,
    keyword: Option<String>,
    text: &str,
) -> Result<()> {
    Url::parse(url).map_err(|e| eyre!("invalid URL '{url}': {e}"))?;

    let config = resolve_config(config_path, backend)?;
    let frontend = build_frontend(&config)?;

    let mut request = RewriteRequest::new(url, text);
    request.keyword = keyword;

    let progress = CliProgress::new();
    let message = frontend.rewrite(&request, &progress)?;
    drop(progress);

    println!("{message}");
    Ok(())
}

fn cmd_session(config_path: Option<&Path>, backend: &BackendArgs) -> Result<()> {
    let config = resolve_config(config_path, backend)?;
    let frontend = build_frontend(&config)?;

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    println!("seoscribe session. Leave URL blank to reuse stored knowledge; Ctrl-D to quit.");

    loop {
        let Some(url) = prompt_line(&mut lines, "URL> ")? else {
            break;
        };
        let Some(text) = prompt_line(&mut lines, "Text> ")? else {
            break;
        };
        if text.trim().is_empty() {
            println!("(nothing to rewrite)");
            continue;
        }
        if !url.trim().is_empty() {
            if let Err(e) = Url::parse(url.trim()) {
                println!("invalid URL '{}': {e}", url.trim());
                continue;
            }
        }

        let progress = CliProgress::new();
        let result = frontend.rewrite(&RewriteRequest::new(url, text), &progress);
        drop(progress);

        match result {
            Ok(message) => println!("\n{message}\n"),
            Err(report) => match report.downcast_ref::<SeoscribeError>() {
                Some(SeoscribeError::Cancelled { stage }) => println!("(cancelled during {stage})"),
                _ => println!("error: {report}"),
            },
        }

        let stats = frontend.block_on(frontend.rewriter().store().stats());
        info!(vectors = stats.vectors, has_current = stats.has_current, "store state");
    }

    Ok(())
}

/// Print `label`, then read one line. `None` on end of input.
fn prompt_line(
    lines: &mut impl Iterator<Item = std::io::Result<String>>,
    label: &str,
) -> Result<Option<String>> {
    print!("{label}");
    std::io::stdout().flush()?;
    match lines.next() {
        Some(line) => Ok(Some(line?)),
        None => Ok(None),
    }
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config: AppConfig = match config_path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Spinner showing the current rewrite phase.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .expect("valid spinner template")
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl RewriteProgress for CliProgress {
    fn phase(&self, phase: RewritePhase) {
        self.spinner.set_message(phase.label());
    }

    fn done(&self, _outcome: &RewriteOutcome) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_rewrite_with_overrides() {
        let cli = Cli::try_parse_from([
            "seoscribe",
            "-vv",
            "rewrite",
            "--url",
            "https://acme.example",
            "--keyword",
            "blue widgets",
            "--embedder",
            "hashing",
            "--model",
            "llama3",
            "Our",
            "widgets",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        let Command::Rewrite {
            url,
            keyword,
            backend,
            text,
        } = cli.command
        else {
            panic!("expected rewrite command");
        };
        assert_eq!(url, "https://acme.example");
        assert_eq!(keyword.as_deref(), Some("blue widgets"));
        assert_eq!(backend.embedder, Some(EmbedderArg::Hashing));
        assert_eq!(backend.model.as_deref(), Some("llama3"));
        assert_eq!(text.join(" "), "Our widgets");
    }

    #[test]
    fn rewrite_requires_text_and_url() {
        assert!(Cli::try_parse_from(["seoscribe", "rewrite", "--url", "https://a.example"]).is_err());
        assert!(Cli::try_parse_from(["seoscribe", "rewrite", "hello"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "seoscribe",
            "session",
            "--log-format",
            "json",
            "--config",
            "/tmp/seoscribe.toml",
        ])
        .unwrap();
        assert!(matches!(cli.log_format, LogFormat::Json));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/seoscribe.toml")));
        assert!(matches!(cli.command, Command::Session { .. }));
    }

    #[test]
    fn resolve_config_applies_overrides() {
        let dir = std::env::temp_dir().join(format!("seoscribe-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("seoscribe.toml");
        std::fs::write(&path, "[llm]\nmodel = \"from-file\"\n").unwrap();

        let config = resolve_config(
            Some(&path),
            &BackendArgs {
                embedder: Some(EmbedderArg::Hashing),
                model: Some("from-flag".into()),
            },
        )
        .unwrap();
        assert_eq!(config.embedding.provider, EmbeddingProvider::Hashing);
        assert_eq!(config.llm.model, "from-flag");

        let config = resolve_config(Some(&path), &BackendArgs::default()).unwrap();
        assert_eq!(config.llm.model, "from-file");

        let _ = std::fs::remove_dir_all(&dir);
    }
}

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use factotum::kernel::binder::RawArguments;
use factotum::kernel::config::FactotumConfig;
use factotum::kernel::session::{InteractiveSession, TerminalPrompter};
use factotum::kernel::task_log::TASK_LOG_TARGET;
use factotum::kernel::{render, InvocationRequest, Kernel};
use factotum::tools::{build_registry, Value};

/// Factotum: your personal command-line assistant
#[derive(Parser, Debug)]
#[command(name = "factotum", version, about)]
struct Cli {
    /// Task to run (`list`, `help`, or a task id such as `generate-password`)
    #[arg(long, required_unless_present = "interactive")]
    task: Option<String>,

    /// Pick tasks from a menu and answer prompts for their arguments
    #[arg(long, short = 'i')]
    interactive: bool,

    /// Password length
    #[arg(long, allow_negative_numbers = true)]
    length: Option<i64>,

    /// Include special characters (y/n); a bare flag means yes
    #[arg(long, num_args = 0..=1, default_missing_value = "y")]
    specials: Option<String>,

    /// Directory to organize
    #[arg(long)]
    directory: Option<String>,

    /// Crypto coin id
    #[arg(long)]
    coin: Option<String>,

    /// Webpage URL
    #[arg(long)]
    url: Option<String>,

    /// Output filename
    #[arg(long)]
    output: Option<String>,

    /// Task to document, used with `--task help`
    #[arg(long)]
    tool: Option<String>,

    /// Any other task parameter, as KEY=VALUE (repeatable)
    #[arg(long = "arg", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    args: Vec<(String, String)>,

    /// Path to factotum.toml config file
    #[arg(long, default_value = "factotum.toml")]
    config: PathBuf,

    /// Console log filter (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Path to the task log, overriding `logging.file`
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Flag values as raw arguments. Absent flags stay unset.
    fn raw_arguments(&self) -> RawArguments {
        let mut raw = RawArguments::new();
        raw.set("length", self.length.map(Value::Int));
        raw.set("specials", self.specials.clone().map(Value::String));
        for (name, value) in [
            ("directory", &self.directory),
            ("coin", &self.coin),
            ("url", &self.url),
            ("output", &self.output),
            ("tool", &self.tool),
        ] {
            raw.set(name, value.clone().map(Value::String));
        }
        for (key, value) in &self.args {
            raw.insert(key.as_str(), value.as_str());
        }
        raw
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

fn init_tracing(log_level: &str, log_file: &Path) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_filter(filter);

    let parent = match log_file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let filename = log_file
        .file_name()
        .with_context(|| format!("Invalid log file path: {}", log_file.display()))?;
    let file_appender = tracing_appender::rolling::never(parent, filename);
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(false)
        .with_filter(Targets::new().with_target(TASK_LOG_TARGET, LevelFilter::INFO));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let config = FactotumConfig::load(&cli.config).with_context(|| "Failed to load config")?;
    let log_file = cli.log_file.clone().unwrap_or_else(|| config.logging.file.clone());
    init_tracing(&cli.log_level, &log_file)?;

    tracing::debug!(
        config = %cli.config.display(),
        log_file = %log_file.display(),
        "Config loaded"
    );

    let registry = build_registry(&config).with_context(|| "Failed to build tool registry")?;
    tracing::debug!(tools = registry.len(), "Registry built");
    let kernel = Kernel::new(registry, config);

    if cli.interactive {
        println!("{}", render::banner());
        let prompter = TerminalPrompter::new()?;
        let mut session = InteractiveSession::new(&kernel, prompter);
        let report = session.run().await?;
        println!("👋 Goodbye! ({} task(s) run, {} failed)", report.runs, report.failures);
        return Ok(ExitCode::SUCCESS);
    }

    let Some(task) = cli.task.clone() else {
        anyhow::bail!("--task is required unless --interactive is given");
    };
    let request = InvocationRequest::new(task).with_arguments(cli.raw_arguments());

    match kernel.dispatch(request).await {
        Ok(outcome) => {
            println!("{}", render::outcome(&outcome));
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("{}", render::error(&err));
            if err.wants_listing() {
                eprintln!("{}", render::listing(&kernel.listing()));
            }
            Ok(ExitCode::from(err.exit_code()))
        }
    }
}

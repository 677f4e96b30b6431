//! RFP compliance analyzer CLI.
//!
//! # Usage
//!
//! ```bash
//! # Is the backend up?
//! rfp-agents probe
//!
//! # Vendors per security domain
//! rfp-agents vendors --domain ngfw
//!
//! # Analyze a requirement file and write a Markdown matrix
//! rfp-agents analyze --domain ngfw --vendor Fortinet --input rfp.txt --format markdown
//!
//! # Same, from a spreadsheet, writing an Excel matrix
//! rfp-agents analyze --domain ngfw --vendor Fortinet --input rfp.xlsx --format xlsx
//!
//! # Different backend / model
//! RFP_OLLAMA_BASE_URL=http://gpu-01:11434 RFP_OLLAMA_MODEL=qwen2.5:7b rfp-agents analyze ...
//! ```
//!
//! Ctrl-C cancels a running batch; the item in flight goes back to pending.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use requirements::{export, ingest, Language, SecurityDomain, VendorContext};
use rfp_agents::{
    AnalyzerConfig, BatchOrchestrator, InferenceBackend, OllamaClient, RequirementAnalyzer,
    RetryPolicy, RunEvent,
};
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file (environment variables still take precedence)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the inference backend is reachable
    Probe,

    /// List the vendor catalog
    Vendors {
        /// Restrict to one domain (slug such as `ngfw`, `edr`, `waf`)
        #[arg(long)]
        domain: Option<SecurityDomain>,
    },

    /// Analyze requirements and export the compliance matrix
    Analyze {
        #[arg(long)]
        domain: SecurityDomain,

        #[arg(long)]
        vendor: String,

        /// Response language: pt, en or es
        #[arg(long, default_value = "pt")]
        lang: Language,

        /// Requirement file (.txt, .csv, .xlsx, .xls or .ods)
        #[arg(long, conflicts_with = "text", required_unless_present = "text")]
        input: Option<PathBuf>,

        /// Requirements pasted inline, separated by `;` or newlines
        #[arg(long)]
        text: Option<String>,

        #[arg(long, value_enum, default_value_t = Format::Markdown)]
        format: Format,

        /// Output file; defaults to `RFP_Analysis_<vendor>.<ext>` in the working directory
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Json,
    Markdown,
    Xlsx,
}

impl Format {
    fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
            Self::Xlsx => "xlsx",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => AnalyzerConfig::load(path)?,
        None => AnalyzerConfig::from_env(),
    };
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;

    match args.command {
        Command::Probe => probe(&config).await,
        Command::Vendors { domain } => {
            list_vendors(domain);
            Ok(())
        }
        Command::Analyze {
            domain,
            vendor,
            lang,
            input,
            text,
            format,
            output,
        } => {
            let context = VendorContext::new(domain, &vendor)?;
            let lines = match (input, text) {
                (Some(path), _) => ingest::read_requirements_file(&path)?,
                (None, Some(text)) => ingest::split_pasted(&text),
                (None, None) => bail!("either --input or --text is required"),
            };
            if lines.is_empty() {
                bail!("No technical requirements found in the input");
            }
            analyze(&config, context, lang, lines, format, output).await
        }
    }
}

async fn probe(config: &AnalyzerConfig) -> Result<()> {
    let client = OllamaClient::new(config.backend.clone())?;
    if client.probe().await {
        println!("Backend available at {} (model {})", config.backend.base_url, config.backend.model);
        Ok(())
    } else {
        bail!("Backend not reachable at {}", config.backend.base_url)
    }
}

fn list_vendors(domain: Option<SecurityDomain>) {
    let domains = match domain {
        Some(d) => vec![d],
        None => SecurityDomain::ALL.to_vec(),
    };
    for d in domains {
        println!("{} ({})", d.label(), d.slug());
        for vendor in d.vendors() {
            println!("  - {vendor}");
        }
    }
}

async fn analyze(
    config: &AnalyzerConfig,
    context: VendorContext,
    lang: Language,
    lines: Vec<String>,
    format: Format,
    output: Option<PathBuf>,
) -> Result<()> {
    let client = Arc::new(OllamaClient::new(config.backend.clone())?);
    let analyzer = RequirementAnalyzer::new(client, config.backend.model.clone())
        .with_retry(RetryPolicy::new(config.retry.clone()));

    let (tx, mut rx) = mpsc::unbounded_channel();
    let orchestrator = Arc::new(
        BatchOrchestrator::new(analyzer, config.pacing.clone())
            .with_context(context.clone())
            .with_language(lang)
            .with_events(tx),
    );
    orchestrator.add_requirements(lines);

    let progress = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                RunEvent::ItemStarted { index, total, .. } => {
                    eprintln!("[{}/{}] analyzing...", index + 1, total);
                }
                RunEvent::ItemCompleted { verdict, .. } => {
                    eprintln!("        {}", verdict.label(lang));
                }
                RunEvent::ItemFailed { message, .. } => eprintln!("        error: {message}"),
                RunEvent::HardwareLocked { model } => eprintln!("        hardware locked: {model}"),
                RunEvent::RunFinished(_) => break,
                _ => {}
            }
        }
    });

    let signal_target = Arc::clone(&orchestrator);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing current item and stopping");
            signal_target.cancel();
        }
    });

    let report = orchestrator.start().await?;
    progress.await.context("progress printer panicked")?;

    let items = orchestrator.items();
    let rendered: Vec<u8> = match format {
        Format::Json => export::to_json(&items, lang)
            .context("Failed to render JSON export")?
            .into_bytes(),
        Format::Markdown => export::to_markdown(&items, lang).into_bytes(),
        Format::Xlsx => export::to_xlsx(&items, lang).context("Failed to render XLSX export")?,
    };
    let path = output.unwrap_or_else(|| {
        PathBuf::from(format!(
            "{}.{}",
            export::file_stem(context.vendor()),
            format.extension()
        ))
    });
    std::fs::write(&path, rendered)
        .with_context(|| format!("Failed to write export to {}", path.display()))?;

    info!(
        path = %path.display(),
        completed = report.completed,
        failed = report.failed,
        skipped = report.skipped,
        cancelled = report.cancelled,
        hardware_lock = report.hardware_lock.as_deref().unwrap_or("-"),
        "Compliance matrix written"
    );
    Ok(())
}

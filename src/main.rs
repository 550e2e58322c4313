// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand};
use contract_audit::pipeline::Classifier;
use contract_audit::utils::{format_severity, format_success, format_warning, init_logger};
use contract_audit::{
    AnalysisError, AnalysisReport, ChatClient, Config, JsonExporter, Orchestrator, Segmenter,
    TextExtractor,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

#[derive(Parser)]
#[command(name = "contract_audit")]
#[command(version = "0.1.0")]
#[command(about = "AI-assisted contract risk analysis", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full risk analysis pipeline on a document
    Analyze {
        file: PathBuf,

        /// Write a JSON report to this path
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        pretty: bool,
    },

    /// Preview how a document would be segmented
    Segments { file: PathBuf },

    /// Identify the contract type only
    Classify { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.color, cli.verbose);

    let config = Config::load(Some(&cli.config))
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;

    match cli.command {
        Commands::Analyze {
            file,
            output,
            pretty,
        } => analyze(config, file, output, pretty).await,
        Commands::Segments { file } => segments(config, file),
        Commands::Classify { file } => classify(config, file).await,
    }
}

async fn analyze(
    config: Config,
    file: PathBuf,
    output: Option<PathBuf>,
    pretty: bool,
) -> Result<()> {
    let orchestrator = Orchestrator::from_config(config, None);

    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
            .expect("Failed to create progress bar template")
            .progress_chars("█▓▒░"),
    );

    let bar_handle = bar.clone();
    let on_progress = Arc::new(move |percent: u8| {
        bar_handle.set_position(percent as u64);
    });

    // Cooperative cancellation: ctrl-c flips a flag the orchestrator polls at
    // stage boundaries; in-flight inference calls are left to finish.
    let cancel_flag = Arc::new(AtomicBool::new(false));
    let signal_flag = cancel_flag.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_flag.store(true, Ordering::SeqCst);
        }
    });
    let is_cancelled: contract_audit::CancelFn =
        Arc::new(move || cancel_flag.load(Ordering::SeqCst));

    let result = orchestrator
        .run(&file, Some(on_progress), Some(is_cancelled))
        .await;
    bar.finish_and_clear();

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(AnalysisError::Cancelled) => {
            println!("{}", format_warning("Analysis cancelled"));
            return Ok(());
        }
        Err(e) => bail!(e),
    };

    println!(
        "{}",
        format_success(&format!(
            "Analysis complete: {} ({} findings, {} high / {} medium / {} low)",
            outcome.category,
            outcome.summary.total(),
            outcome.summary.high,
            outcome.summary.medium,
            outcome.summary.low,
        ))
    );

    for finding in &outcome.findings {
        println!(
            "\n[{}] {} ({}) - {}",
            finding.id,
            finding.title,
            format_severity(&finding.severity),
            finding.category
        );
        if !finding.description.is_empty() {
            println!("    {}", finding.description);
        }
        if !finding.suggestion.is_empty() {
            println!("    Suggestion: {}", finding.suggestion);
        }
        if !finding.clause.is_empty() {
            println!("    Clause: {}", finding.clause);
        }
    }

    if let Some(output) = output {
        let report = AnalysisReport::from_outcome(file.display().to_string(), &outcome);
        JsonExporter::new(pretty)
            .write_report(&report, &output)
            .context("failed to write report")?;
        println!("\n{}", format_success(&format!("Report written to {}", output.display())));
    }

    Ok(())
}

fn segments(config: Config, file: PathBuf) -> Result<()> {
    let text = TextExtractor::new()
        .extract(&file)
        .context("text extraction failed")?;

    let segmenter = Segmenter::from_config(&config.segmenter);
    let chunks = segmenter.split_text(&text);

    info!("Document yields {} segments", chunks.len());
    for (index, chunk) in chunks.iter().enumerate() {
        let preview: String = chunk.chars().take(80).collect();
        println!(
            "segment {:>3} | {:>6} chars | {}",
            index,
            chunk.chars().count(),
            preview.replace('\n', " ")
        );
    }

    Ok(())
}

async fn classify(config: Config, file: PathBuf) -> Result<()> {
    let text = TextExtractor::new()
        .extract(&file)
        .context("text extraction failed")?;

    let client = ChatClient::from_config(&config.inference)
        .context("inference capability unavailable")?;

    let classifier = Classifier::new(Arc::new(client), &config.classifier);
    let category = classifier.classify(&text).await;

    println!("{}", format_success(&category));
    Ok(())
}

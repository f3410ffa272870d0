use clap::{Args, Parser, Subcommand};
use plannav::prelude::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "plannav")]
#[command(about = "Health plan navigator - extract, score, and rank insurance plan documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze plan documents against a client profile
    Analyze(AnalyzeArgs),
    /// Parse plan documents and export the plan set without scoring
    Ingest(IngestArgs),
    /// Re-score a previously ingested plan set
    Rescore(RescoreArgs),
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Path to the client profile JSON file
    #[arg(short, long)]
    client: PathBuf,
    /// Plan document files or directories (PDF, DOCX, TXT, JSON, CSV)
    #[arg(required = true)]
    sources: Vec<PathBuf>,
    /// Write the full report as JSON to this path
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// How many top plans to print
    #[arg(long, default_value_t = 5)]
    top: usize,
    /// Per-source parse timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
    /// Disable the progress bar
    #[arg(long)]
    no_progress: bool,
    /// Custom metric weights: network,medication,cost,protection,admin,quality
    #[arg(long, value_delimiter = ',', num_args = 6)]
    weights: Option<Vec<f64>>,
}

#[derive(Args)]
struct IngestArgs {
    /// Plan document files or directories
    #[arg(required = true)]
    sources: Vec<PathBuf>,
    /// Output file path for the plan set JSON
    #[arg(short, long)]
    output: PathBuf,
    /// Per-source parse timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
    /// Disable the progress bar
    #[arg(long)]
    no_progress: bool,
}

#[derive(Args)]
struct RescoreArgs {
    /// Path to the client profile JSON file
    #[arg(short, long)]
    client: PathBuf,
    /// Path to a plan set JSON produced by `ingest`
    #[arg(short, long)]
    plans: PathBuf,
    /// Write the full report as JSON to this path
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// How many top plans to print
    #[arg(long, default_value_t = 5)]
    top: usize,
    /// Custom metric weights: network,medication,cost,protection,admin,quality
    #[arg(long, value_delimiter = ',', num_args = 6)]
    weights: Option<Vec<f64>>,
}

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze(args) => cmd_analyze(args),
        Commands::Ingest(args) => cmd_ingest(args),
        Commands::Rescore(args) => cmd_rescore(args),
    }
}

fn build_config(timeout: Option<u64>, no_progress: bool) -> NavigatorConfig {
    let mut builder = ConfigBuilder::new().show_progress(!no_progress);
    if let Some(secs) = timeout {
        builder = builder.parse_timeout_secs(secs);
    }
    builder.build()
}

fn build_weights(weights: Option<Vec<f64>>) -> Result<ScoreWeights> {
    match weights {
        Some(w) => ScoreWeights::new(w[0], w[1], w[2], w[3], w[4], w[5]),
        None => Ok(ScoreWeights::default()),
    }
}

fn cmd_analyze(args: AnalyzeArgs) {
    let client = match load_client(&args.client) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error loading client profile: {}", e.user_message());
            std::process::exit(1);
        }
    };
    let engine = match build_weights(args.weights)
        .and_then(|w| AnalysisEngine::with_config(build_config(args.timeout, args.no_progress), w))
    {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("{}", e.user_message());
            std::process::exit(1);
        }
    };
    match engine.analyze(&client, &args.sources) {
        Ok(report) => finish_report(&engine, &report, args.top, args.output.as_deref()),
        Err(e) => {
            eprintln!("Analysis failed: {}", e.user_message());
            std::process::exit(1);
        }
    }
}

fn cmd_ingest(args: IngestArgs) {
    let parser = DocumentParser::with_config(build_config(args.timeout, args.no_progress));
    let outcome = parser.parse_batch(&args.sources);

    for failure in &outcome.failures {
        eprintln!("Skipped: {}", failure);
    }
    if outcome.plans.is_empty() {
        eprintln!(
            "No plans could be extracted from {} source(s)",
            args.sources.len()
        );
        std::process::exit(1);
    }
    match export_plans(&outcome.plans, &args.output) {
        Ok(_) => println!(
            "Exported {} plan(s) to {} ({} source(s) failed)",
            outcome.plans.len(),
            args.output.display(),
            outcome.failures.len()
        ),
        Err(e) => {
            eprintln!("Export error: {}", e);
            std::process::exit(1);
        }
    }
}

fn cmd_rescore(args: RescoreArgs) {
    let client = match load_client(&args.client) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error loading client profile: {}", e.user_message());
            std::process::exit(1);
        }
    };
    let plans = match load_plans(&args.plans) {
        Ok(plans) => plans,
        Err(e) => {
            eprintln!("Error loading plan set: {}", e.user_message());
            std::process::exit(1);
        }
    };
    let engine = match build_weights(args.weights)
        .and_then(|w| AnalysisEngine::with_config(NavigatorConfig::default(), w))
    {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("{}", e.user_message());
            std::process::exit(1);
        }
    };
    match engine.analyze_plans(&client, plans) {
        Ok(report) => finish_report(&engine, &report, args.top, args.output.as_deref()),
        Err(e) => {
            eprintln!("Analysis failed: {}", e.user_message());
            std::process::exit(1);
        }
    }
}

fn finish_report(
    engine: &AnalysisEngine,
    report: &AnalysisReport,
    top: usize,
    output: Option<&std::path::Path>,
) {
    print_report(engine, report, top);
    if let Some(path) = output {
        match export_report(report, path) {
            Ok(_) => println!("\nFull report written to {}", path.display()),
            Err(e) => {
                eprintln!("Export error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn print_report(engine: &AnalysisEngine, report: &AnalysisReport, top: usize) {
    println!(
        "Analyzed {} plan(s) for {}",
        report.analyses.len(),
        report.client.personal.full_name
    );
    if !report.failures.is_empty() {
        println!("{} source(s) could not be parsed:", report.failures.len());
        for failure in &report.failures {
            println!("  - {}", failure);
        }
    }

    println!("\nTop recommendations:");
    for (rank, analysis) in report.top(top).iter().enumerate() {
        println!(
            "  {}. {} - {:.1}/10, est. ${:.0}/yr",
            rank + 1,
            analysis.plan.display_name(),
            analysis.metrics.weighted_total,
            analysis.estimated_annual_cost
        );
        for strength in &analysis.strengths {
            println!("     + {}", strength);
        }
        for concern in &analysis.concerns {
            println!("     - {}", concern);
        }
    }

    let summary = engine.comparison_summary(report);
    println!("\nCategory leaders:");
    println!(
        "  Cheapest: {} (${:.0}/yr)",
        summary.leaders.cheapest.plan_id, summary.leaders.cheapest.value
    );
    println!(
        "  Best network: {} ({:.1}/10)",
        summary.leaders.best_network.plan_id, summary.leaders.best_network.value
    );
    println!(
        "  Best medication coverage: {} ({:.1}/10)",
        summary.leaders.best_medication_coverage.plan_id,
        summary.leaders.best_medication_coverage.value
    );
    println!(
        "  Best financial protection: {} ({:.1}/10)",
        summary.leaders.best_financial_protection.plan_id,
        summary.leaders.best_financial_protection.value
    );
}

/*!
 * # PlanNav — Health Insurance Plan Analysis Library
 *
 * A Rust library for extracting health-insurance plan data from mixed
 * document formats and scoring plans against an individual consumer's
 * medical and financial profile.
 *
 * ## Features
 *
 * - 🚀 **Batch Ingestion**: Parse whole directories of plan documents with
 *   progress tracking and per-source fault isolation
 * - 🧩 **Multi-Format**: PDF/DOCX/TXT text extraction plus structured JSON
 *   and CSV, behind one parser interface
 * - 📊 **Six-Metric Scoring**: Provider network, medication coverage, total
 *   cost, financial protection, administrative simplicity, and plan quality
 * - 🛡️ **Honest Extraction**: Fields a document never stated stay missing;
 *   they are never conflated with zero
 * - 🏆 **Deterministic Ranking**: The same inputs always produce the same
 *   ranked report, whatever the input order
 * - 💾 **JSON Hand-Off**: Reports and ingested plan sets round-trip through
 *   JSON for downstream tooling
 *
 * ## Quick Start
 *
 * ```no_run
 * use plannav::prelude::*;
 * use std::path::PathBuf;
 *
 * # fn main() -> Result<()> {
 * let client = plannav::export::load_client("client.json")?;
 *
 * let engine = AnalysisEngine::new();
 * let report = engine.analyze(&client, &[PathBuf::from("./plan_documents")])?;
 *
 * let best = report.best();
 * println!(
 *     "Best plan: {} ({:.1}/10)",
 *     best.plan.display_name(),
 *     best.metrics.weighted_total
 * );
 *
 * plannav::export::export_report(&report, "report.json")?;
 * # Ok(())
 * # }
 * ```
 *
 * ## Custom Weights
 *
 * ```no_run
 * # use plannav::prelude::*;
 * # fn main() -> Result<()> {
 * // Emphasize cost over network
 * let weights = ScoreWeights::new(0.20, 0.25, 0.30, 0.10, 0.10, 0.05)?;
 * let engine = AnalysisEngine::with_config(NavigatorConfig::default(), weights)?;
 * # Ok(())
 * # }
 * ```
 *
 * ## Configuration
 *
 * ```no_run
 * # use plannav::prelude::*;
 * # fn main() -> Result<()> {
 * let config = ConfigBuilder::new()
 *     .parse_timeout_secs(30)
 *     .parallel_threads(Some(4))
 *     .show_progress(false)
 *     .build();
 * let engine = AnalysisEngine::with_config(config, ScoreWeights::default())?;
 * # Ok(())
 * # }
 * ```
 *
 * ## Performance Tips
 *
 * 1. **Enable Parallel Parsing**: The `parallel` feature fans batch
 *    ingestion out across cores
 * 2. **Re-Analyze From JSON**: Export an ingested plan set once, then
 *    re-run scoring with different weights without touching documents
 * 3. **Tune the Timeout**: Raise `parse_timeout_secs` for very large
 *    documents, lower it for untrusted input
 */

// Re-export error types from root
pub use error::{ExtractionFailure, FailureReason, PlanNavError, Result};

// Public modules
pub mod config;
pub mod data_types;
pub mod engine;
pub mod error;
pub mod export;
pub mod parser;
pub mod score;

/// Prelude module for convenient imports
///
/// Import everything you need with:
/// ```
/// use plannav::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{ConfigBuilder, NavigatorConfig};
    pub use crate::data_types::*;
    pub use crate::engine::{AnalysisEngine, ComparisonSummary, MatrixRow};
    pub use crate::error::{ExtractionFailure, FailureReason, PlanNavError, Result};
    pub use crate::export::{export_plans, export_report, load_client, load_plans};
    pub use crate::parser::{BatchOutcome, DocumentParser};
    pub use crate::score::{PlanScorer, ScoreWeights};
}

/// Plan-analysis constants
pub mod constants {
    /// Every file extension the parser accepts
    pub const SUPPORTED_EXTENSIONS: [&str; 7] = ["pdf", "docx", "doc", "txt", "md", "json", "csv"];

    /// Extensions handled by the free-text extraction strategy
    pub const TEXT_EXTENSIONS: [&str; 5] = ["pdf", "docx", "doc", "txt", "md"];

    /// Metric weights must sum to 1.0 within this tolerance
    pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-3;

    /// Annual visit count above which meeting the deductible is assumed
    pub const DEDUCTIBLE_UTILIZATION_THRESHOLD: u32 = 10;

    /// Per-dose market-price fallback for an uncovered, unassisted drug
    pub const UNCOVERED_DRUG_DOSE_COST: f64 = 500.0;

    /// Worst-case monthly premium when no candidate states one
    pub const FALLBACK_MONTHLY_PREMIUM: f64 = 600.0;

    /// Worst-case annual deductible when no candidate states one
    pub const FALLBACK_DEDUCTIBLE: f64 = 5000.0;

    /// Worst-case primary-care visit copay when no candidate states one
    pub const FALLBACK_COPAY_PRIMARY: f64 = 60.0;

    /// Worst-case specialist visit copay when no candidate states one
    pub const FALLBACK_COPAY_SPECIALIST: f64 = 120.0;
}

/// Common recipes and utility functions
pub mod cookbook {
    use crate::prelude::*;
    use std::path::PathBuf;

    /// Analyze one directory of plan documents with default settings
    ///
    /// # Example
    /// ```no_run
    /// # use plannav::prelude::*;
    /// # use plannav::cookbook::analyze_directory;
    /// # fn main() -> Result<()> {
    /// # let client = plannav::export::load_client("client.json")?;
    /// let report = analyze_directory(&client, "./plan_documents")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn analyze_directory(
        client: &Client,
        directory: impl Into<PathBuf>,
    ) -> Result<AnalysisReport> {
        AnalysisEngine::new().analyze(client, &[directory.into()])
    }

    /// Re-score a previously exported plan set under custom weights
    ///
    /// Pairs with [`export_plans`] so slow document ingestion happens once.
    pub fn reanalyze_with_weights(
        client: &Client,
        plans_path: impl Into<PathBuf>,
        weights: ScoreWeights,
    ) -> Result<AnalysisReport> {
        let plans = load_plans(plans_path.into())?;
        let engine = AnalysisEngine::with_config(NavigatorConfig::default(), weights)?;
        engine.analyze_plans(client, plans)
    }

    /// Plans whose network contains every must-keep provider
    pub fn plans_keeping_every_provider<'a>(
        report: &'a AnalysisReport,
    ) -> Vec<&'a PlanAnalysis> {
        report
            .analyses
            .iter()
            .filter(|a| {
                report
                    .client
                    .medical_profile
                    .must_keep_providers()
                    .all(|p| a.plan.covers_provider(&p.name))
            })
            .collect()
    }
}

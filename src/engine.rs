/*!
 * Analysis orchestrator
 *
 * Wires the document parser and the scorer into one end-to-end run:
 * validate the client, ingest every source, score the surviving plans
 * against the frozen candidate set, rank deterministically, and scan the
 * category leaders. Partial ingestion failures ride along in the report;
 * a run only fails outright when zero plans survive.
 */

use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::NavigatorConfig;
use crate::data_types::{
    AnalysisReport, CategoryLeader, CategoryLeaders, Client, Plan, PlanAnalysis,
};
use crate::error::{ExtractionFailure, PlanNavError, Result};
use crate::parser::DocumentParser;
use crate::score::{PlanScorer, ScoreWeights};

/// One row of the flattened scoring matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixRow {
    pub rank: usize,
    pub plan_id: String,
    pub display_name: String,
    pub provider_network: f64,
    pub medication_coverage: f64,
    pub total_cost: f64,
    pub financial_protection: f64,
    pub administrative_simplicity: f64,
    pub plan_quality: f64,
    pub weighted_total: f64,
    pub estimated_annual_cost: f64,
}

/// Run-level aggregates for quick comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub plans_analyzed: usize,
    pub sources_failed: usize,
    pub best_plan_id: String,
    pub best_weighted_total: f64,
    pub average_weighted_total: f64,
    pub leaders: CategoryLeaders,
}

/// End-to-end analysis pipeline
#[derive(Debug, Clone)]
pub struct AnalysisEngine {
    parser: DocumentParser,
    scorer: PlanScorer,
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        // Default weights always validate
        Self {
            parser: DocumentParser::new(),
            scorer: PlanScorer::new(ScoreWeights::default())
                .unwrap_or_else(|_| unreachable!("default weights sum to 1.0")),
        }
    }
}

impl AnalysisEngine {
    /// Create an engine with default configuration and weights
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with explicit configuration and weights
    pub fn with_config(config: NavigatorConfig, weights: ScoreWeights) -> Result<Self> {
        Ok(Self {
            parser: DocumentParser::with_config(config),
            scorer: PlanScorer::new(weights)?,
        })
    }

    /// Parse every source and produce a ranked report
    ///
    /// Individual source failures are recorded and carried in the report.
    /// Fails with `NoPlansAvailable` when not a single plan survives
    /// ingestion, rather than ranking an empty set.
    pub fn analyze(&self, client: &Client, sources: &[PathBuf]) -> Result<AnalysisReport> {
        client.validate()?;
        let outcome = self.parser.parse_batch(sources);
        if outcome.plans.is_empty() {
            return Err(PlanNavError::NoPlansAvailable {
                sources: sources.len(),
                failure_count: outcome.failures.len(),
            });
        }
        self.build_report(client, outcome.plans, outcome.failures)
    }

    /// Score an already-ingested plan set, bypassing document parsing
    pub fn analyze_plans(&self, client: &Client, plans: Vec<Plan>) -> Result<AnalysisReport> {
        client.validate()?;
        if plans.is_empty() {
            return Err(PlanNavError::NoPlansAvailable {
                sources: 0,
                failure_count: 0,
            });
        }
        self.build_report(client, plans, Vec::new())
    }

    fn build_report(
        &self,
        client: &Client,
        plans: Vec<Plan>,
        failures: Vec<ExtractionFailure>,
    ) -> Result<AnalysisReport> {
        let mut analyses: Vec<PlanAnalysis> = plans
            .iter()
            .map(|plan| self.scorer.score(client, plan, &plans))
            .collect();
        rank(&mut analyses);
        let leaders = scan_leaders(&analyses);

        Ok(AnalysisReport {
            client: client.clone(),
            analyses,
            leaders,
            failures,
            generated_at: Utc::now(),
        })
    }

    /// Flatten a report into per-plan metric rows, rank order preserved
    pub fn scoring_matrix(&self, report: &AnalysisReport) -> Vec<MatrixRow> {
        report
            .analyses
            .iter()
            .enumerate()
            .map(|(idx, a)| MatrixRow {
                rank: idx + 1,
                plan_id: a.plan.plan_id.clone(),
                display_name: a.plan.display_name(),
                provider_network: a.metrics.provider_network,
                medication_coverage: a.metrics.medication_coverage,
                total_cost: a.metrics.total_cost,
                financial_protection: a.metrics.financial_protection,
                administrative_simplicity: a.metrics.administrative_simplicity,
                plan_quality: a.metrics.plan_quality,
                weighted_total: a.metrics.weighted_total,
                estimated_annual_cost: a.estimated_annual_cost,
            })
            .collect()
    }

    /// Run-level aggregates for a finished report
    pub fn comparison_summary(&self, report: &AnalysisReport) -> ComparisonSummary {
        let best = report.best();
        let average = report
            .analyses
            .iter()
            .map(|a| a.metrics.weighted_total)
            .sum::<f64>()
            / report.analyses.len() as f64;

        ComparisonSummary {
            plans_analyzed: report.analyses.len(),
            sources_failed: report.failures.len(),
            best_plan_id: best.plan.plan_id.clone(),
            best_weighted_total: best.metrics.weighted_total,
            average_weighted_total: average,
            leaders: report.leaders.clone(),
        }
    }
}

/// Deterministic ranking: weighted total descending, then estimated
/// annual cost ascending, then plan id ascending
fn rank(analyses: &mut [PlanAnalysis]) {
    analyses.sort_by(|a, b| {
        b.metrics
            .weighted_total
            .partial_cmp(&a.metrics.weighted_total)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                a.estimated_annual_cost
                    .partial_cmp(&b.estimated_annual_cost)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| a.plan.plan_id.cmp(&b.plan.plan_id))
    });
}

/// Pick the leader for one category, ties broken by plan id
fn leader_by<F>(analyses: &[PlanAnalysis], better: F) -> CategoryLeader
where
    F: Fn(&PlanAnalysis, &PlanAnalysis) -> bool,
{
    // Callers guarantee a non-empty set
    let mut best = &analyses[0];
    for candidate in &analyses[1..] {
        if better(candidate, best)
            || (!better(best, candidate) && candidate.plan.plan_id < best.plan.plan_id)
        {
            best = candidate;
        }
    }
    CategoryLeader {
        plan_id: best.plan.plan_id.clone(),
        value: 0.0,
    }
}

fn scan_leaders(analyses: &[PlanAnalysis]) -> CategoryLeaders {
    let mut cheapest = leader_by(analyses, |a, b| {
        a.estimated_annual_cost < b.estimated_annual_cost
    });
    cheapest.value = lookup(analyses, &cheapest.plan_id, |a| a.estimated_annual_cost);

    let mut best_network = leader_by(analyses, |a, b| {
        a.metrics.provider_network > b.metrics.provider_network
    });
    best_network.value = lookup(analyses, &best_network.plan_id, |a| {
        a.metrics.provider_network
    });

    let mut best_medication_coverage = leader_by(analyses, |a, b| {
        a.metrics.medication_coverage > b.metrics.medication_coverage
    });
    best_medication_coverage.value = lookup(analyses, &best_medication_coverage.plan_id, |a| {
        a.metrics.medication_coverage
    });

    let mut best_financial_protection = leader_by(analyses, |a, b| {
        a.metrics.financial_protection > b.metrics.financial_protection
    });
    best_financial_protection.value = lookup(analyses, &best_financial_protection.plan_id, |a| {
        a.metrics.financial_protection
    });

    CategoryLeaders {
        cheapest,
        best_network,
        best_medication_coverage,
        best_financial_protection,
    }
}

fn lookup<F: Fn(&PlanAnalysis) -> f64>(analyses: &[PlanAnalysis], plan_id: &str, get: F) -> f64 {
    analyses
        .iter()
        .find(|a| a.plan.plan_id == plan_id)
        .map(get)
        .unwrap_or(0.0)
}

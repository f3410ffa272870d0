/*!
 * Multi-metric scoring engine for plan analysis
 *
 * Computes six independent 0-10 metrics per plan plus a weighted total,
 * and a best-effort annual-cost estimate. Cost is scored *relative* to the
 * full candidate set (min-max normalized), so the scorer must see the same
 * frozen candidate set for every plan in a run.
 *
 * Monetary fields the parser could not extract are treated conservatively:
 * substituted with the worst known value across candidates (or fixed
 * worst-case defaults), never scored as a favorable zero.
 */

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEDUCTIBLE_UTILIZATION_THRESHOLD, FALLBACK_COPAY_PRIMARY, FALLBACK_COPAY_SPECIALIST,
    FALLBACK_DEDUCTIBLE, FALLBACK_MONTHLY_PREMIUM, UNCOVERED_DRUG_DOSE_COST,
    WEIGHT_SUM_TOLERANCE,
};
use crate::data_types::{
    Client, Extracted, FormularyTier, Medication, Plan, PlanAnalysis, ProgramType, ScoringMetrics,
};
use crate::error::{PlanNavError, Result};

/// Per-metric weights, validated to sum to 1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub provider_network: f64,
    pub medication_coverage: f64,
    pub total_cost: f64,
    pub financial_protection: f64,
    pub administrative_simplicity: f64,
    pub plan_quality: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            provider_network: 0.30,
            medication_coverage: 0.25,
            total_cost: 0.20,
            financial_protection: 0.10,
            administrative_simplicity: 0.10,
            plan_quality: 0.05,
        }
    }
}

impl ScoreWeights {
    /// Build a custom weight configuration, validating the sum
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        provider_network: f64,
        medication_coverage: f64,
        total_cost: f64,
        financial_protection: f64,
        administrative_simplicity: f64,
        plan_quality: f64,
    ) -> Result<Self> {
        let weights = Self {
            provider_network,
            medication_coverage,
            total_cost,
            financial_protection,
            administrative_simplicity,
            plan_quality,
        };
        weights.validate()?;
        Ok(weights)
    }

    pub fn sum(&self) -> f64 {
        self.provider_network
            + self.medication_coverage
            + self.total_cost
            + self.financial_protection
            + self.administrative_simplicity
            + self.plan_quality
    }

    /// Weights must sum to 1.0 within tolerance
    pub fn validate(&self) -> Result<()> {
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(PlanNavError::InvalidWeights {
                sum,
                tolerance: WEIGHT_SUM_TOLERANCE,
            });
        }
        Ok(())
    }
}

/// Conservative substitutes for monetary fields the parser could not extract
///
/// Derived once per scoring call from the candidate set: a missing field
/// takes the *maximum* known value of that field across candidates, falling
/// back to fixed worst-case defaults when no candidate knows it.
#[derive(Debug, Clone, Copy)]
struct CostAssumptions {
    premium: f64,
    deductible: f64,
    copay_primary: f64,
    copay_specialist: f64,
}

impl CostAssumptions {
    fn from_candidates(candidates: &[Plan]) -> Self {
        let max_known = |get: fn(&Plan) -> Extracted<f64>, fallback: f64| {
            candidates
                .iter()
                .filter_map(|p| get(p).known())
                .fold(None::<f64>, |acc, v| Some(acc.map_or(v, |a| a.max(v))))
                .unwrap_or(fallback)
        };
        Self {
            premium: max_known(|p| p.monthly_premium, FALLBACK_MONTHLY_PREMIUM),
            deductible: max_known(|p| p.deductible, FALLBACK_DEDUCTIBLE),
            copay_primary: max_known(|p| p.copay_primary, FALLBACK_COPAY_PRIMARY),
            copay_specialist: max_known(|p| p.copay_specialist, FALLBACK_COPAY_SPECIALIST),
        }
    }
}

/// The six-metric plan scorer
///
/// Weights are supplied at construction, validated once, never mutated.
#[derive(Debug, Clone)]
pub struct PlanScorer {
    weights: ScoreWeights,
}

impl PlanScorer {
    /// Create a scorer, failing on a weight configuration that does not
    /// sum to 1.0
    pub fn new(weights: ScoreWeights) -> Result<Self> {
        weights.validate()?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    /// Score one plan against the client, relative to the full candidate set
    ///
    /// Must be called with the same `candidates` for every plan in a run;
    /// the candidate set drives cost normalization and the conservative
    /// substitutes for missing monetary fields.
    pub fn score(&self, client: &Client, plan: &Plan, candidates: &[Plan]) -> PlanAnalysis {
        let assumptions = CostAssumptions::from_candidates(candidates);
        let estimated_annual_cost = estimate_annual_cost(client, plan, &assumptions);

        let mut metrics = ScoringMetrics {
            provider_network: score_provider_network(client, plan),
            medication_coverage: score_medication_coverage(client, plan),
            total_cost: self.score_total_cost(client, estimated_annual_cost, candidates, &assumptions),
            financial_protection: score_financial_protection(plan),
            administrative_simplicity: score_administrative_simplicity(client, plan),
            plan_quality: score_plan_quality(plan),
            weighted_total: 0.0,
        };
        metrics.weighted_total = self.weighted_total(&metrics);

        let strengths = identify_strengths(&metrics);
        let concerns = identify_concerns(&metrics);

        PlanAnalysis {
            plan: plan.clone(),
            metrics,
            estimated_annual_cost,
            strengths,
            concerns,
        }
    }

    /// Best-effort annual cost estimate for one plan
    pub fn estimate_cost(&self, client: &Client, plan: &Plan, candidates: &[Plan]) -> f64 {
        estimate_annual_cost(client, plan, &CostAssumptions::from_candidates(candidates))
    }

    /// Metric 3: total annual cost, min-max normalized across candidates
    ///
    /// Lowest cost scores 10, highest 0, linear in between. When every
    /// candidate costs the same there is no signal and every plan gets 5.0.
    fn score_total_cost(
        &self,
        client: &Client,
        estimated_cost: f64,
        candidates: &[Plan],
        assumptions: &CostAssumptions,
    ) -> f64 {
        if candidates.is_empty() {
            return 5.0;
        }
        let costs: Vec<f64> = candidates
            .iter()
            .map(|p| estimate_annual_cost(client, p, assumptions))
            .collect();
        let min_cost = costs.iter().cloned().fold(f64::INFINITY, f64::min);
        let max_cost = costs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        if (max_cost - min_cost).abs() < 1e-9 {
            return 5.0;
        }
        let score = 10.0 * (max_cost - estimated_cost) / (max_cost - min_cost);
        score.clamp(0.0, 10.0)
    }

    fn weighted_total(&self, metrics: &ScoringMetrics) -> f64 {
        let total = metrics.provider_network * self.weights.provider_network
            + metrics.medication_coverage * self.weights.medication_coverage
            + metrics.total_cost * self.weights.total_cost
            + metrics.financial_protection * self.weights.financial_protection
            + metrics.administrative_simplicity * self.weights.administrative_simplicity
            + metrics.plan_quality * self.weights.plan_quality;
        total.clamp(0.0, 10.0)
    }
}

/// Metric 1: provider network adequacy
///
/// Piecewise-linear in the fraction of must-keep providers found in-network,
/// with a -2 referral penalty (floored at 0). No must-keep providers is a
/// perfect score regardless of network.
fn score_provider_network(client: &Client, plan: &Plan) -> f64 {
    let must_keep: Vec<_> = client.medical_profile.must_keep_providers().collect();

    let mut score: f64 = if must_keep.is_empty() {
        10.0
    } else {
        let found = must_keep
            .iter()
            .filter(|p| plan.covers_provider(&p.name))
            .count();
        let ratio = found as f64 / must_keep.len() as f64;

        if ratio >= 1.0 {
            10.0
        } else if ratio >= 0.8 {
            7.0 + (ratio - 0.8) * 15.0
        } else if ratio >= 0.5 {
            4.0 + (ratio - 0.5) * 6.0
        } else {
            ratio * 8.0
        }
    };

    if plan.requires_referral {
        score = (score - 2.0).max(0.0);
    }
    score
}

/// Per-medication coverage score before averaging
fn medication_item_score(medication: &Medication, plan: &Plan) -> f64 {
    let item: f64 = match plan.formulary_tier(&medication.name) {
        Some(FormularyTier::Generic) | Some(FormularyTier::PreferredGeneric) => 10.0,
        Some(FormularyTier::Preferred) => 9.0,
        Some(FormularyTier::NonPreferred) => 7.0,
        // Prior-authorization likelihood modifier
        Some(FormularyTier::Specialty) => 5.0 - 2.0,
        Some(FormularyTier::Unspecified) => 6.0,
        None => {
            if medication.manufacturer_program.is_some() {
                6.0
            } else {
                0.0
            }
        }
    };
    item.max(0.0)
}

/// Metric 2: medication coverage and access
///
/// Mean of per-medication tier scores; no medications is a perfect score.
fn score_medication_coverage(client: &Client, plan: &Plan) -> f64 {
    let medications = &client.medical_profile.medications;
    if medications.is_empty() {
        return 10.0;
    }
    let total: f64 = medications
        .iter()
        .map(|m| medication_item_score(m, plan))
        .sum();
    total / medications.len() as f64
}

/// Metric 4: financial protection
///
/// Absolute joint thresholds on deductible and out-of-pocket maximum; both
/// conditions in a tier must hold. A plan whose deductible or OOP max was
/// not extracted cannot demonstrate protection and scores 0.
fn score_financial_protection(plan: &Plan) -> f64 {
    let (deductible, oop_max) = match (plan.deductible.known(), plan.oop_max.known()) {
        (Some(d), Some(o)) => (d, o),
        _ => return 0.0,
    };

    if deductible <= 500.0 && oop_max <= 3000.0 {
        10.0
    } else if deductible <= 1000.0 && oop_max <= 5000.0 {
        7.0
    } else if deductible <= 2000.0 && oop_max <= 7000.0 {
        4.0
    } else {
        0.0
    }
}

/// Whether prior authorization is likely frequent for this client on this
/// plan (heuristic: any medication sits on a specialty tier)
fn prior_auth_likely(client: &Client, plan: &Plan) -> bool {
    client
        .medical_profile
        .medications
        .iter()
        .any(|m| plan.formulary_tier(&m.name) == Some(FormularyTier::Specialty))
}

fn relies_on_maximizer(client: &Client) -> bool {
    client.medical_profile.medications.iter().any(|m| {
        m.manufacturer_program
            .as_ref()
            .map(|p| p.program_type == ProgramType::Maximizer)
            .unwrap_or(false)
    })
}

/// Metric 5: administrative simplicity
///
/// Start at 10 and subtract penalties; floored at 0.
fn score_administrative_simplicity(client: &Client, plan: &Plan) -> f64 {
    let mut score: f64 = 10.0;

    if plan.requires_referral {
        score -= 3.0;
    }
    if prior_auth_likely(client, plan) {
        score -= 2.0;
    }
    if relies_on_maximizer(client) {
        score -= 2.0;
    }
    if plan.star_rating.map(|s| s < 3.0).unwrap_or(false) {
        score -= 1.0;
    }

    score.max(0.0)
}

/// Metric 6: plan quality
///
/// Star rating doubled when present; neutral 5.0 when absent.
fn score_plan_quality(plan: &Plan) -> f64 {
    match plan.star_rating {
        Some(star) => (star * 2.0).min(10.0),
        None => 5.0,
    }
}

/// Per-dose out-of-pocket default for a covered drug tier
fn tier_dose_copay(tier: FormularyTier) -> f64 {
    match tier {
        FormularyTier::Generic => 10.0,
        FormularyTier::PreferredGeneric => 15.0,
        FormularyTier::Preferred => 50.0,
        FormularyTier::NonPreferred => 100.0,
        FormularyTier::Specialty => 300.0,
        FormularyTier::Unspecified => 50.0,
    }
}

/// Best-effort annual cost for one (client, plan) pair
///
/// premium + expected visit copays + medication out-of-pocket, plus 75% of
/// the deductible when expected utilization makes meeting it likely.
fn estimate_annual_cost(client: &Client, plan: &Plan, assumptions: &CostAssumptions) -> f64 {
    let premium_annual = plan.monthly_premium.unwrap_or(assumptions.premium) * 12.0;

    let copay_primary = plan.copay_primary.unwrap_or(assumptions.copay_primary);
    let copay_specialist = plan.copay_specialist.unwrap_or(assumptions.copay_specialist);
    let visit_costs: f64 = client
        .medical_profile
        .providers
        .iter()
        .map(|p| {
            let copay = if p.is_primary_care() {
                copay_primary
            } else {
                copay_specialist
            };
            f64::from(p.annual_visits) * copay
        })
        .sum();

    let medication_costs: f64 = client
        .medical_profile
        .medications
        .iter()
        .map(|m| {
            let doses = f64::from(m.annual_doses);
            match plan.formulary_tier(&m.name) {
                Some(tier) => doses * tier_dose_copay(tier),
                None => match &m.manufacturer_program {
                    Some(program) => doses * program.expected_copay.unwrap_or(0.0),
                    None => doses * UNCOVERED_DRUG_DOSE_COST,
                },
            }
        })
        .sum();

    // Recurring treatments bill at the plan's coinsurance share; an
    // unknown coinsurance charges the full allowed cost
    let treatment_costs: f64 = client
        .medical_profile
        .special_treatments
        .iter()
        .map(|t| {
            let share = plan.coinsurance.unwrap_or(1.0);
            f64::from(t.frequency) * t.allowed_cost * share
        })
        .sum();

    // High utilization makes meeting the deductible likely
    let deductible_exposure =
        if client.medical_profile.total_annual_visits() > DEDUCTIBLE_UTILIZATION_THRESHOLD {
            0.75 * plan.deductible.unwrap_or(assumptions.deductible)
        } else {
            0.0
        };

    premium_annual + visit_costs + medication_costs + treatment_costs + deductible_exposure
}

/// Narrative strengths derived from metric thresholds
fn identify_strengths(metrics: &ScoringMetrics) -> Vec<String> {
    let mut strengths = Vec::new();
    if metrics.provider_network >= 8.0 {
        strengths.push("Excellent provider network coverage".to_string());
    }
    if metrics.medication_coverage >= 8.0 {
        strengths.push("Strong medication formulary coverage".to_string());
    }
    if metrics.total_cost >= 8.0 {
        strengths.push("Very competitive total cost".to_string());
    }
    if metrics.financial_protection >= 8.0 {
        strengths.push("Strong financial protection with low deductible/OOPM".to_string());
    }
    if metrics.administrative_simplicity >= 8.0 {
        strengths.push("Simple administration with minimal barriers".to_string());
    }
    if metrics.plan_quality >= 8.0 {
        strengths.push("High plan quality rating".to_string());
    }
    strengths
}

/// Narrative concerns derived from metric thresholds
fn identify_concerns(metrics: &ScoringMetrics) -> Vec<String> {
    let mut concerns = Vec::new();
    if metrics.provider_network <= 4.0 {
        concerns.push("Limited provider network coverage".to_string());
    }
    if metrics.medication_coverage <= 4.0 {
        concerns.push("Poor medication formulary coverage".to_string());
    }
    if metrics.total_cost <= 4.0 {
        concerns.push("Higher than average total cost".to_string());
    }
    if metrics.financial_protection <= 4.0 {
        concerns.push("High deductible or out-of-pocket maximum".to_string());
    }
    if metrics.administrative_simplicity <= 4.0 {
        concerns.push("Complex administration with potential barriers".to_string());
    }
    if metrics.plan_quality <= 4.0 {
        concerns.push("Below average plan quality rating".to_string());
    }
    concerns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::{
        ManufacturerProgram, MedicalProfile, Medication, MetalLevel, PersonalInfo, Plan, PlanType,
        Priorities, Provider, ProviderPriority, SpecialTreatment,
    };
    use chrono::NaiveDate;
    use std::collections::{BTreeMap, BTreeSet};

    fn test_client(providers: Vec<Provider>, medications: Vec<Medication>) -> Client {
        Client {
            personal: PersonalInfo {
                full_name: "Test Person".to_string(),
                dob: NaiveDate::from_ymd_opt(1985, 6, 1).unwrap(),
                zipcode: "85004".to_string(),
                household_size: 2,
                annual_income: 65_000.0,
                subsidy_eligible: false,
            },
            medical_profile: MedicalProfile {
                providers,
                medications,
                special_treatments: Vec::new(),
            },
            priorities: Priorities::default(),
        }
    }

    fn test_plan(id: &str) -> Plan {
        Plan {
            plan_id: id.to_string(),
            issuer: "Acme Health".to_string(),
            marketing_name: format!("Acme {}", id),
            plan_type: PlanType::Ppo,
            metal_level: MetalLevel::Silver,
            monthly_premium: Extracted::Value(400.0),
            deductible: Extracted::Value(1500.0),
            oop_max: Extracted::Value(6000.0),
            copay_primary: Extracted::Value(25.0),
            copay_specialist: Extracted::Value(50.0),
            copay_er: Extracted::Value(250.0),
            coinsurance: Extracted::Value(0.2),
            network_providers: BTreeSet::new(),
            formulary: BTreeMap::new(),
            requires_referral: false,
            star_rating: Some(4.0),
        }
    }

    fn must_keep(name: &str) -> Provider {
        Provider {
            name: name.to_string(),
            specialty: "Cardiology".to_string(),
            priority: ProviderPriority::MustKeep,
            annual_visits: 2,
        }
    }

    #[test]
    fn default_weights_sum_to_one() {
        assert!(ScoreWeights::default().validate().is_ok());
    }

    #[test]
    fn invalid_weight_sum_fails_construction() {
        let result = ScoreWeights::new(0.5, 0.5, 0.5, 0.1, 0.1, 0.05);
        assert!(matches!(result, Err(PlanNavError::InvalidWeights { .. })));
        assert!(PlanScorer::new(ScoreWeights {
            provider_network: 0.9,
            ..ScoreWeights::default()
        })
        .is_err());
    }

    #[test]
    fn weight_sum_tolerance_accepts_small_drift() {
        let result = ScoreWeights::new(0.3005, 0.25, 0.20, 0.10, 0.10, 0.05);
        assert!(result.is_ok());
    }

    #[test]
    fn no_must_keep_providers_scores_ten() {
        let client = test_client(
            vec![Provider {
                name: "Dr. Optional".to_string(),
                specialty: "Dermatology".to_string(),
                priority: ProviderPriority::NiceToKeep,
                annual_visits: 1,
            }],
            vec![],
        );
        let plan = test_plan("P1");
        assert_eq!(score_provider_network(&client, &plan), 10.0);
    }

    #[test]
    fn referral_with_perfect_coverage_scores_eight() {
        let client = test_client(vec![must_keep("Dr. Heart")], vec![]);
        let mut plan = test_plan("P1");
        plan.network_providers.insert("Dr. Heart".to_string());
        plan.requires_referral = true;
        assert_eq!(score_provider_network(&client, &plan), 8.0);
    }

    #[test]
    fn provider_network_piecewise_bands() {
        let providers: Vec<Provider> = (0..10).map(|i| must_keep(&format!("Dr. {}", i))).collect();
        let client = test_client(providers, vec![]);

        // 9/10 in network: 7 + 0.1*15 = 8.5
        let mut plan = test_plan("P1");
        for i in 0..9 {
            plan.network_providers.insert(format!("Dr. {}", i));
        }
        assert!((score_provider_network(&client, &plan) - 8.5).abs() < 1e-9);

        // 6/10: 4 + 0.1*6 = 4.6
        let mut plan = test_plan("P2");
        for i in 0..6 {
            plan.network_providers.insert(format!("Dr. {}", i));
        }
        assert!((score_provider_network(&client, &plan) - 4.6).abs() < 1e-9);

        // 3/10: 0.3*8 = 2.4
        let mut plan = test_plan("P3");
        for i in 0..3 {
            plan.network_providers.insert(format!("Dr. {}", i));
        }
        assert!((score_provider_network(&client, &plan) - 2.4).abs() < 1e-9);
    }

    #[test]
    fn medication_scenario_two_generic_one_uncovered() {
        let meds = vec![
            Medication {
                name: "metformin".to_string(),
                dosage: String::new(),
                frequency: String::new(),
                annual_doses: 12,
                manufacturer_program: None,
            },
            Medication {
                name: "lisinopril".to_string(),
                dosage: String::new(),
                frequency: String::new(),
                annual_doses: 12,
                manufacturer_program: None,
            },
            Medication {
                name: "orphanol".to_string(),
                dosage: String::new(),
                frequency: String::new(),
                annual_doses: 12,
                manufacturer_program: None,
            },
        ];
        let client = test_client(vec![], meds);
        let mut plan = test_plan("P1");
        plan.formulary.insert("metformin".to_string(), FormularyTier::Generic);
        plan.formulary.insert("lisinopril".to_string(), FormularyTier::Generic);

        let score = score_medication_coverage(&client, &plan);
        assert!((score - 20.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn medication_tier_and_program_scores() {
        let med = |name: &str| Medication {
            name: name.to_string(),
            dosage: String::new(),
            frequency: String::new(),
            annual_doses: 12,
            manufacturer_program: None,
        };
        let mut plan = test_plan("P1");
        plan.formulary.insert("a".to_string(), FormularyTier::Preferred);
        plan.formulary.insert("b".to_string(), FormularyTier::NonPreferred);
        plan.formulary.insert("c".to_string(), FormularyTier::Specialty);
        plan.formulary.insert("d".to_string(), FormularyTier::Unspecified);

        assert_eq!(medication_item_score(&med("a"), &plan), 9.0);
        assert_eq!(medication_item_score(&med("b"), &plan), 7.0);
        // Specialty carries the prior-authorization modifier
        assert_eq!(medication_item_score(&med("c"), &plan), 3.0);
        assert_eq!(medication_item_score(&med("d"), &plan), 6.0);
        assert_eq!(medication_item_score(&med("uncovered"), &plan), 0.0);

        let assisted = Medication {
            manufacturer_program: Some(ManufacturerProgram {
                program_type: ProgramType::CopayCard,
                expected_copay: Some(5.0),
            }),
            ..med("uncovered")
        };
        assert_eq!(medication_item_score(&assisted, &plan), 6.0);
    }

    #[test]
    fn no_medications_scores_ten() {
        let client = test_client(vec![], vec![]);
        assert_eq!(score_medication_coverage(&client, &test_plan("P1")), 10.0);
    }

    #[test]
    fn financial_protection_threshold_table() {
        let with = |ded: f64, oop: f64| {
            let mut plan = test_plan("P1");
            plan.deductible = Extracted::Value(ded);
            plan.oop_max = Extracted::Value(oop);
            score_financial_protection(&plan)
        };
        assert_eq!(with(500.0, 3000.0), 10.0);
        assert_eq!(with(1000.0, 5000.0), 7.0);
        assert_eq!(with(2000.0, 7000.0), 4.0);
        assert_eq!(with(5000.0, 10000.0), 0.0);
        // Both conditions must hold
        assert_eq!(with(400.0, 4000.0), 7.0);
    }

    #[test]
    fn missing_deductible_or_oop_scores_zero_protection() {
        let mut plan = test_plan("P1");
        plan.deductible = Extracted::Missing;
        assert_eq!(score_financial_protection(&plan), 0.0);
        let mut plan = test_plan("P2");
        plan.oop_max = Extracted::Missing;
        assert_eq!(score_financial_protection(&plan), 0.0);
    }

    #[test]
    fn administrative_penalties_stack_and_floor() {
        let specialty_med = Medication {
            name: "humira".to_string(),
            dosage: String::new(),
            frequency: String::new(),
            annual_doses: 26,
            manufacturer_program: Some(ManufacturerProgram {
                program_type: ProgramType::Maximizer,
                expected_copay: Some(5.0),
            }),
        };
        let client = test_client(vec![], vec![specialty_med]);
        let mut plan = test_plan("P1");
        plan.formulary.insert("humira".to_string(), FormularyTier::Specialty);
        plan.requires_referral = true;
        plan.star_rating = Some(2.0);

        // 10 - 3 (referral) - 2 (prior auth) - 2 (maximizer) - 1 (low stars)
        assert_eq!(score_administrative_simplicity(&client, &plan), 2.0);

        // Missing star rating draws no penalty
        plan.star_rating = None;
        assert_eq!(score_administrative_simplicity(&client, &plan), 3.0);
    }

    #[test]
    fn plan_quality_star_doubled_or_neutral() {
        let mut plan = test_plan("P1");
        plan.star_rating = Some(4.5);
        assert_eq!(score_plan_quality(&plan), 9.0);
        plan.star_rating = None;
        assert_eq!(score_plan_quality(&plan), 5.0);
        plan.star_rating = Some(5.0);
        assert_eq!(score_plan_quality(&plan), 10.0);
    }

    #[test]
    fn equal_costs_score_five_for_everyone() {
        let client = test_client(vec![], vec![]);
        let plans: Vec<Plan> = (0..3).map(|i| test_plan(&format!("P{}", i))).collect();
        let scorer = PlanScorer::new(ScoreWeights::default()).unwrap();

        for plan in &plans {
            let analysis = scorer.score(&client, plan, &plans);
            assert_eq!(analysis.metrics.total_cost, 5.0);
        }
    }

    #[test]
    fn cheapest_plan_scores_ten_most_expensive_zero() {
        let client = test_client(vec![], vec![]);
        let mut cheap = test_plan("CHEAP");
        cheap.monthly_premium = Extracted::Value(200.0);
        let mut mid = test_plan("MID");
        mid.monthly_premium = Extracted::Value(400.0);
        let mut dear = test_plan("DEAR");
        dear.monthly_premium = Extracted::Value(600.0);
        let plans = vec![cheap.clone(), mid.clone(), dear.clone()];
        let scorer = PlanScorer::new(ScoreWeights::default()).unwrap();

        assert_eq!(scorer.score(&client, &cheap, &plans).metrics.total_cost, 10.0);
        assert_eq!(scorer.score(&client, &dear, &plans).metrics.total_cost, 0.0);
        let mid_score = scorer.score(&client, &mid, &plans).metrics.total_cost;
        assert!((mid_score - 5.0).abs() < 1e-9);
    }

    #[test]
    fn missing_premium_is_treated_as_worst_case_not_zero() {
        let client = test_client(vec![], vec![]);
        let mut known = test_plan("KNOWN");
        known.monthly_premium = Extracted::Value(300.0);
        let mut unknown = test_plan("UNKNOWN");
        unknown.monthly_premium = Extracted::Missing;
        let plans = vec![known.clone(), unknown.clone()];
        let scorer = PlanScorer::new(ScoreWeights::default()).unwrap();

        let known_cost = scorer.estimate_cost(&client, &known, &plans);
        let unknown_cost = scorer.estimate_cost(&client, &unknown, &plans);
        // The unknown premium substitutes the worst known premium (300),
        // so the unknown plan can never look cheaper than the known one
        assert!(unknown_cost >= known_cost);
    }

    #[test]
    fn deductible_counts_only_under_high_utilization() {
        let low_use = test_client(
            vec![Provider {
                name: "Dr. A".to_string(),
                specialty: "Primary Care".to_string(),
                priority: ProviderPriority::NiceToKeep,
                annual_visits: 2,
            }],
            vec![],
        );
        let high_use = test_client(
            vec![Provider {
                name: "Dr. A".to_string(),
                specialty: "Primary Care".to_string(),
                priority: ProviderPriority::NiceToKeep,
                annual_visits: 20,
            }],
            vec![],
        );
        let plan = test_plan("P1");
        let assumptions = CostAssumptions::from_candidates(std::slice::from_ref(&plan));

        let low = estimate_annual_cost(&low_use, &plan, &assumptions);
        let high = estimate_annual_cost(&high_use, &plan, &assumptions);

        // low: premium + 2 visits; high adds 18 more visits plus 75% deductible
        let expected_low = 400.0 * 12.0 + 2.0 * 25.0;
        let expected_high = 400.0 * 12.0 + 20.0 * 25.0 + 0.75 * 1500.0;
        assert!((low - expected_low).abs() < 1e-9);
        assert!((high - expected_high).abs() < 1e-9);
    }

    #[test]
    fn treatments_bill_at_the_coinsurance_share() {
        let mut client = test_client(vec![], vec![]);
        client.medical_profile.special_treatments.push(SpecialTreatment {
            name: "physical therapy".to_string(),
            frequency: 10,
            allowed_cost: 150.0,
        });
        let mut plan = test_plan("P1");
        let assumptions = CostAssumptions::from_candidates(std::slice::from_ref(&plan));

        // coinsurance 0.2: 10 * 150 * 0.2 = 300 on top of the premium
        let with_coinsurance = estimate_annual_cost(&client, &plan, &assumptions);
        assert!((with_coinsurance - (400.0 * 12.0 + 300.0)).abs() < 1e-9);

        // Unknown coinsurance charges the full allowed cost
        plan.coinsurance = Extracted::Missing;
        let unknown = estimate_annual_cost(&client, &plan, &assumptions);
        assert!((unknown - (400.0 * 12.0 + 1500.0)).abs() < 1e-9);
    }

    #[test]
    fn all_metrics_stay_in_range() {
        let specialty_med = Medication {
            name: "humira".to_string(),
            dosage: String::new(),
            frequency: String::new(),
            annual_doses: 26,
            manufacturer_program: None,
        };
        let client = test_client(
            vec![must_keep("Dr. A"), must_keep("Dr. B"), must_keep("Dr. C")],
            vec![specialty_med],
        );
        let mut harsh = test_plan("HARSH");
        harsh.requires_referral = true;
        harsh.star_rating = Some(1.0);
        harsh.deductible = Extracted::Value(9000.0);
        harsh.oop_max = Extracted::Value(9200.0);
        let plans = vec![test_plan("OK"), harsh.clone()];
        let scorer = PlanScorer::new(ScoreWeights::default()).unwrap();

        for plan in &plans {
            let m = scorer.score(&client, plan, &plans).metrics;
            for value in [
                m.provider_network,
                m.medication_coverage,
                m.total_cost,
                m.financial_protection,
                m.administrative_simplicity,
                m.plan_quality,
                m.weighted_total,
            ] {
                assert!((0.0..=10.0).contains(&value), "metric out of range: {}", value);
            }
        }
    }
}

/*!
 * Data type definitions for plan analysis
 *
 * Type-safe representations of the consumer profile (Client), the canonical
 * plan record (Plan), and scoring results. Records are immutable once
 * constructed; re-extraction or re-scoring produces new values.
 */

use std::collections::{BTreeMap, BTreeSet};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ExtractionFailure, PlanNavError, Result};

/// A field value that may not have been extracted from a source document
///
/// Distinct from a value that is genuinely zero: collapsing "not found" into
/// "0" would silently corrupt downstream scoring. Serializes as the value or
/// `null`; absent or `null` JSON keys deserialize to `Missing`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Extracted<T> {
    Value(T),
    Missing,
}

impl<T> Extracted<T> {
    /// The extracted value, if a rule found one
    pub fn value(&self) -> Option<&T> {
        match self {
            Extracted::Value(v) => Some(v),
            Extracted::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Extracted::Missing)
    }

    pub fn unwrap_or(self, default: T) -> T {
        match self {
            Extracted::Value(v) => v,
            Extracted::Missing => default,
        }
    }
}

impl<T: Copy> Extracted<T> {
    /// Copy of the value, if present
    pub fn known(&self) -> Option<T> {
        match self {
            Extracted::Value(v) => Some(*v),
            Extracted::Missing => None,
        }
    }
}

impl<T> Default for Extracted<T> {
    fn default() -> Self {
        Extracted::Missing
    }
}

impl<T> From<Option<T>> for Extracted<T> {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => Extracted::Value(v),
            None => Extracted::Missing,
        }
    }
}

impl<T> From<Extracted<T>> for Option<T> {
    fn from(e: Extracted<T>) -> Self {
        match e {
            Extracted::Value(v) => Some(v),
            Extracted::Missing => None,
        }
    }
}

impl<T: Serialize> Serialize for Extracted<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.value().serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Extracted<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Extracted::from)
    }
}

/// ACA plan tier indicating premium-vs-cost-sharing tradeoff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetalLevel {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Catastrophic,
}

impl MetalLevel {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_lowercase().as_str() {
            "bronze" => Some(MetalLevel::Bronze),
            "silver" => Some(MetalLevel::Silver),
            "gold" => Some(MetalLevel::Gold),
            "platinum" => Some(MetalLevel::Platinum),
            "catastrophic" => Some(MetalLevel::Catastrophic),
            _ => None,
        }
    }

    pub fn as_code(&self) -> &'static str {
        match self {
            MetalLevel::Bronze => "Bronze",
            MetalLevel::Silver => "Silver",
            MetalLevel::Gold => "Gold",
            MetalLevel::Platinum => "Platinum",
            MetalLevel::Catastrophic => "Catastrophic",
        }
    }
}

impl std::fmt::Display for MetalLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_code())
    }
}

/// Managed-care plan type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanType {
    #[serde(rename = "HMO")]
    Hmo,
    #[serde(rename = "PPO")]
    Ppo,
    #[serde(rename = "EPO")]
    Epo,
    #[serde(rename = "POS")]
    Pos,
    #[serde(rename = "HDHP")]
    Hdhp,
}

impl PlanType {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_uppercase().as_str() {
            "HMO" => Some(PlanType::Hmo),
            "PPO" => Some(PlanType::Ppo),
            "EPO" => Some(PlanType::Epo),
            "POS" => Some(PlanType::Pos),
            "HDHP" => Some(PlanType::Hdhp),
            _ => None,
        }
    }

    pub fn as_code(&self) -> &'static str {
        match self {
            PlanType::Hmo => "HMO",
            PlanType::Ppo => "PPO",
            PlanType::Epo => "EPO",
            PlanType::Pos => "POS",
            PlanType::Hdhp => "HDHP",
        }
    }
}

impl std::fmt::Display for PlanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_code())
    }
}

/// A drug's coverage category within a plan's formulary
///
/// `Unspecified` means the drug is listed on the formulary but its tier
/// could not be determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormularyTier {
    Generic,
    PreferredGeneric,
    Preferred,
    NonPreferred,
    Specialty,
    Unspecified,
}

impl FormularyTier {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_lowercase().as_str() {
            "generic" | "tier1" => Some(FormularyTier::Generic),
            "preferred-generic" | "preferred_generic" => Some(FormularyTier::PreferredGeneric),
            "preferred" | "tier2" => Some(FormularyTier::Preferred),
            "non-preferred" | "non_preferred" | "tier3" => Some(FormularyTier::NonPreferred),
            "specialty" | "tier4" => Some(FormularyTier::Specialty),
            "unspecified" | "covered" => Some(FormularyTier::Unspecified),
            _ => None,
        }
    }

    pub fn as_code(&self) -> &'static str {
        match self {
            FormularyTier::Generic => "generic",
            FormularyTier::PreferredGeneric => "preferred-generic",
            FormularyTier::Preferred => "preferred",
            FormularyTier::NonPreferred => "non-preferred",
            FormularyTier::Specialty => "specialty",
            FormularyTier::Unspecified => "unspecified",
        }
    }
}

/// How hard the consumer requires a provider to stay in-network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderPriority {
    MustKeep,
    NiceToKeep,
}

/// Kind of drug-maker-funded assistance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgramType {
    CopayCard,
    Rebate,
    Maximizer,
}

/// A drug-maker-funded copay reduction for an otherwise uncovered medication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManufacturerProgram {
    pub program_type: ProgramType,
    pub expected_copay: Option<f64>,
}

/// A provider in the consumer's care team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub name: String,
    pub specialty: String,
    pub priority: ProviderPriority,
    /// Expected annual visit count
    pub annual_visits: u32,
}

impl Provider {
    /// Whether this provider counts as primary care for the cost model
    pub fn is_primary_care(&self) -> bool {
        matches!(
            self.specialty.to_ascii_lowercase().as_str(),
            "primary care" | "family medicine" | "internal medicine"
        )
    }
}

/// A medication the consumer takes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub name: String,
    #[serde(default)]
    pub dosage: String,
    #[serde(default)]
    pub frequency: String,
    /// Expected annual dose count
    pub annual_doses: u32,
    #[serde(default)]
    pub manufacturer_program: Option<ManufacturerProgram>,
}

/// A recurring treatment outside regular visits and medications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialTreatment {
    pub name: String,
    /// Occurrences per year
    pub frequency: u32,
    pub allowed_cost: f64,
}

/// The consumer's care team, medications, and recurring treatments
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MedicalProfile {
    #[serde(default)]
    pub providers: Vec<Provider>,
    #[serde(default)]
    pub medications: Vec<Medication>,
    #[serde(default)]
    pub special_treatments: Vec<SpecialTreatment>,
}

impl MedicalProfile {
    /// Providers the consumer requires to stay in-network
    pub fn must_keep_providers(&self) -> impl Iterator<Item = &Provider> {
        self.providers
            .iter()
            .filter(|p| p.priority == ProviderPriority::MustKeep)
    }

    /// Total expected annual visit count across all providers
    pub fn total_annual_visits(&self) -> u32 {
        self.providers.iter().map(|p| p.annual_visits).sum()
    }
}

/// Identifying and household information for the consumer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub full_name: String,
    pub dob: NaiveDate,
    pub zipcode: String,
    pub household_size: u32,
    pub annual_income: f64,
    #[serde(default)]
    pub subsidy_eligible: bool,
}

/// Consumer preference weights on a 1-5 scale
///
/// Used only for narrative insights, never in the scoring formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Priorities {
    pub keep_providers: u8,
    pub minimize_total_cost: u8,
    pub predictable_costs: u8,
    pub avoid_prior_auth: u8,
    pub simple_admin: u8,
}

impl Default for Priorities {
    fn default() -> Self {
        Self {
            keep_providers: 3,
            minimize_total_cost: 3,
            predictable_costs: 3,
            avoid_prior_auth: 3,
            simple_admin: 3,
        }
    }
}

impl Priorities {
    fn validate(&self) -> Result<()> {
        let all = [
            ("keep_providers", self.keep_providers),
            ("minimize_total_cost", self.minimize_total_cost),
            ("predictable_costs", self.predictable_costs),
            ("avoid_prior_auth", self.avoid_prior_auth),
            ("simple_admin", self.simple_admin),
        ];
        for (name, value) in all {
            if !(1..=5).contains(&value) {
                return Err(PlanNavError::validation(
                    format!("priority '{}' must be between 1 and 5", name),
                    name,
                    value,
                ));
            }
        }
        Ok(())
    }
}

/// The complete consumer profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub personal: PersonalInfo,
    pub medical_profile: MedicalProfile,
    #[serde(default)]
    pub priorities: Priorities,
}

impl Client {
    /// Validate the profile's structural invariants
    ///
    /// Surfaced synchronously to the caller; never silently defaulted.
    pub fn validate(&self) -> Result<()> {
        if self.personal.household_size < 1 {
            return Err(PlanNavError::validation(
                "household size must be at least 1",
                "household_size",
                self.personal.household_size,
            ));
        }
        if self.personal.annual_income < 0.0 {
            return Err(PlanNavError::validation(
                "annual income cannot be negative",
                "annual_income",
                self.personal.annual_income,
            ));
        }
        self.priorities.validate()
    }
}

/// Canonical plan record extracted from a source document
///
/// Monetary fields are `Extracted` so that "value is zero" and "value was
/// not found in the document" are never conflated. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub plan_id: String,
    pub issuer: String,
    pub marketing_name: String,
    pub plan_type: PlanType,
    pub metal_level: MetalLevel,
    #[serde(default)]
    pub monthly_premium: Extracted<f64>,
    #[serde(default)]
    pub deductible: Extracted<f64>,
    #[serde(default)]
    pub oop_max: Extracted<f64>,
    #[serde(default)]
    pub copay_primary: Extracted<f64>,
    #[serde(default)]
    pub copay_specialist: Extracted<f64>,
    #[serde(default)]
    pub copay_er: Extracted<f64>,
    #[serde(default)]
    pub coinsurance: Extracted<f64>,
    #[serde(default)]
    pub network_providers: BTreeSet<String>,
    #[serde(default)]
    pub formulary: BTreeMap<String, FormularyTier>,
    #[serde(default)]
    pub requires_referral: bool,
    #[serde(default)]
    pub star_rating: Option<f64>,
}

impl Plan {
    /// Validate the record's structural invariants
    pub fn validate(&self) -> Result<()> {
        if self.plan_id.trim().is_empty() {
            return Err(PlanNavError::validation(
                "plan identifier cannot be empty",
                "plan_id",
                "\"\"",
            ));
        }
        let non_negative = [
            ("monthly_premium", self.monthly_premium),
            ("deductible", self.deductible),
            ("oop_max", self.oop_max),
            ("copay_primary", self.copay_primary),
            ("copay_specialist", self.copay_specialist),
            ("copay_er", self.copay_er),
        ];
        for (name, field) in non_negative {
            if let Some(v) = field.known() {
                if v < 0.0 {
                    return Err(PlanNavError::validation(
                        format!("{} cannot be negative", name),
                        name,
                        v,
                    ));
                }
            }
        }
        if let (Some(ded), Some(oop)) = (self.deductible.known(), self.oop_max.known()) {
            if oop < ded {
                return Err(PlanNavError::validation(
                    "out-of-pocket maximum cannot be below the deductible",
                    "oop_max",
                    oop,
                ));
            }
        }
        if let Some(c) = self.coinsurance.known() {
            if !(0.0..=1.0).contains(&c) {
                return Err(PlanNavError::validation(
                    "coinsurance must be between 0.0 and 1.0",
                    "coinsurance",
                    c,
                ));
            }
        }
        if let Some(star) = self.star_rating {
            if !(0.0..=5.0).contains(&star) {
                return Err(PlanNavError::validation(
                    "star rating must be between 0 and 5",
                    "star_rating",
                    star,
                ));
            }
        }
        Ok(())
    }

    /// Whether a named provider is in this plan's network
    pub fn covers_provider(&self, name: &str) -> bool {
        self.network_providers.contains(name)
    }

    /// Formulary tier for a named drug, if covered at all
    pub fn formulary_tier(&self, drug: &str) -> Option<FormularyTier> {
        self.formulary.get(drug).copied()
    }

    /// Display name combining marketing name and issuer
    pub fn display_name(&self) -> String {
        if self.marketing_name.is_empty() {
            format!("{} ({})", self.plan_id, self.issuer)
        } else {
            format!("{} ({})", self.marketing_name, self.issuer)
        }
    }
}

/// Six independent 0-10 sub-scores plus the weighted total
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoringMetrics {
    pub provider_network: f64,
    pub medication_coverage: f64,
    pub total_cost: f64,
    pub financial_protection: f64,
    pub administrative_simplicity: f64,
    pub plan_quality: f64,
    pub weighted_total: f64,
}

/// A scored plan: one Plan, its metrics, cost estimate, and narrative
///
/// Created fresh per (client, candidate-set) evaluation; never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanAnalysis {
    pub plan: Plan,
    pub metrics: ScoringMetrics,
    pub estimated_annual_cost: f64,
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
}

/// A category winner: which plan led and with what value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryLeader {
    pub plan_id: String,
    pub value: f64,
}

/// Per-category leaders scanned from the scored candidate set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryLeaders {
    /// Lowest estimated annual cost
    pub cheapest: CategoryLeader,
    /// Highest provider-network score
    pub best_network: CategoryLeader,
    /// Highest medication-coverage score
    pub best_medication_coverage: CategoryLeader,
    /// Highest financial-protection score
    pub best_financial_protection: CategoryLeader,
}

/// The complete output of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub client: Client,
    /// Ranked best-first with a deterministic tiebreak
    pub analyses: Vec<PlanAnalysis>,
    pub leaders: CategoryLeaders,
    /// Sources that could not be parsed, kept for transparency
    pub failures: Vec<ExtractionFailure>,
    pub generated_at: DateTime<Utc>,
}

impl AnalysisReport {
    /// The top-ranked analysis
    pub fn best(&self) -> &PlanAnalysis {
        // Construction guarantees at least one analysis (NoPlansAvailable otherwise)
        &self.analyses[0]
    }

    /// Top N recommendations
    pub fn top(&self, n: usize) -> &[PlanAnalysis] {
        &self.analyses[..self.analyses.len().min(n)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_plan() -> Plan {
        Plan {
            plan_id: "PLAN001".to_string(),
            issuer: "Acme Health".to_string(),
            marketing_name: "Acme Silver".to_string(),
            plan_type: PlanType::Ppo,
            metal_level: MetalLevel::Silver,
            monthly_premium: Extracted::Value(400.0),
            deductible: Extracted::Value(1000.0),
            oop_max: Extracted::Value(5000.0),
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

    #[test]
    fn extracted_missing_is_not_zero() {
        let missing: Extracted<f64> = Extracted::Missing;
        assert!(missing.is_missing());
        assert_eq!(missing.known(), None);
        assert_eq!(Extracted::Value(0.0).known(), Some(0.0));
    }

    #[test]
    fn extracted_serde_round_trips_through_null() {
        let json = serde_json::to_string(&Extracted::<f64>::Missing).unwrap();
        assert_eq!(json, "null");
        let back: Extracted<f64> = serde_json::from_str("null").unwrap();
        assert!(back.is_missing());
        let back: Extracted<f64> = serde_json::from_str("12.5").unwrap();
        assert_eq!(back.known(), Some(12.5));
    }

    #[test]
    fn plan_validation_rejects_oop_below_deductible() {
        let mut plan = minimal_plan();
        plan.deductible = Extracted::Value(6000.0);
        plan.oop_max = Extracted::Value(3000.0);
        assert!(plan.validate().is_err());
    }

    #[test]
    fn plan_validation_accepts_missing_monetary_fields() {
        let mut plan = minimal_plan();
        plan.deductible = Extracted::Missing;
        plan.oop_max = Extracted::Missing;
        plan.monthly_premium = Extracted::Missing;
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn plan_validation_rejects_bad_coinsurance() {
        let mut plan = minimal_plan();
        plan.coinsurance = Extracted::Value(1.5);
        assert!(plan.validate().is_err());
    }

    #[test]
    fn metal_level_codes() {
        assert_eq!(MetalLevel::from_code("gold"), Some(MetalLevel::Gold));
        assert_eq!(MetalLevel::from_code("CATASTROPHIC"), Some(MetalLevel::Catastrophic));
        assert_eq!(MetalLevel::from_code("copper"), None);
        assert_eq!(MetalLevel::Silver.as_code(), "Silver");
    }

    #[test]
    fn formulary_tier_accepts_legacy_tier_codes() {
        assert_eq!(FormularyTier::from_code("tier1"), Some(FormularyTier::Generic));
        assert_eq!(FormularyTier::from_code("TIER4"), Some(FormularyTier::Specialty));
        assert_eq!(FormularyTier::from_code("covered"), Some(FormularyTier::Unspecified));
    }

    #[test]
    fn client_validation_enforces_household_size() {
        let client = Client {
            personal: PersonalInfo {
                full_name: "Test Person".to_string(),
                dob: NaiveDate::from_ymd_opt(1990, 1, 15).unwrap(),
                zipcode: "85001".to_string(),
                household_size: 0,
                annual_income: 50_000.0,
                subsidy_eligible: false,
            },
            medical_profile: MedicalProfile::default(),
            priorities: Priorities::default(),
        };
        assert!(client.validate().is_err());
    }

    #[test]
    fn primary_care_specialties_recognized() {
        let p = Provider {
            name: "Dr. A".to_string(),
            specialty: "Family Medicine".to_string(),
            priority: ProviderPriority::MustKeep,
            annual_visits: 2,
        };
        assert!(p.is_primary_care());
        let s = Provider {
            name: "Dr. B".to_string(),
            specialty: "Cardiology".to_string(),
            priority: ProviderPriority::NiceToKeep,
            annual_visits: 4,
        };
        assert!(!s.is_primary_care());
    }
}

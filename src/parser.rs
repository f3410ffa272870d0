/*!
 * Document parser for health plan sources
 *
 * Detects the source format (text-bearing documents, structured JSON,
 * tabular CSV) and extracts canonical `Plan` records through per-format
 * strategies. A field a text rule cannot find is marked `Missing`, never
 * zero. Batch parsing collects per-source failures instead of propagating
 * them, and every source parses under a bounded per-source timeout.
 */

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use serde::Deserialize;

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::NavigatorConfig;
use crate::data_types::{FormularyTier, MetalLevel, Plan, PlanType};
use crate::error::{ExtractionFailure, FailureReason};
use crate::constants::{SUPPORTED_EXTENSIONS, TEXT_EXTENSIONS};

/// Source format resolved from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceFormat {
    /// PDF, Word-processor, or plain-text documents: raw text + field rules
    Text,
    /// Structured single records or arrays
    Json,
    /// Tabular batches, one plan per row
    Csv,
}

fn detect_format(path: &Path) -> Option<SourceFormat> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if TEXT_EXTENSIONS.contains(&ext.as_str()) {
        return Some(SourceFormat::Text);
    }
    match ext.as_str() {
        "json" => Some(SourceFormat::Json),
        "csv" => Some(SourceFormat::Csv),
        _ => None,
    }
}

/// Result of parsing a batch of sources
///
/// Failures are collected, not propagated: one corrupt file cannot abort
/// an entire run.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub plans: Vec<Plan>,
    pub failures: Vec<ExtractionFailure>,
}

impl BatchOutcome {
    fn merge(&mut self, mut other: BatchOutcome) {
        self.plans.append(&mut other.plans);
        self.failures.append(&mut other.failures);
    }
}

/// Multi-format plan document parser
#[derive(Debug, Clone)]
pub struct DocumentParser {
    config: NavigatorConfig,
}

impl Default for DocumentParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentParser {
    /// Create a parser with default configuration
    pub fn new() -> Self {
        Self {
            config: NavigatorConfig::default(),
        }
    }

    /// Create a parser with an explicit configuration
    pub fn with_config(config: NavigatorConfig) -> Self {
        Self { config }
    }

    /// Parse a single source into one plan
    ///
    /// Multi-record sources (CSV, JSON arrays) yield their first record.
    /// Runs under the same per-source timeout as batch parsing.
    pub fn parse(&self, path: impl AsRef<Path>) -> std::result::Result<Plan, ExtractionFailure> {
        let path = path.as_ref();
        let outcome = self.parse_source_with_timeout(path);
        if let Some(plan) = outcome.plans.into_iter().next() {
            return Ok(plan);
        }
        Err(outcome
            .failures
            .into_iter()
            .next()
            .unwrap_or_else(|| ExtractionFailure::new(path, FailureReason::EmptyDocument)))
    }

    /// Parse a batch of sources, collecting plans and failures
    ///
    /// Directory sources are expanded to their supported files (sorted for
    /// deterministic ordering). Each source runs under the configured
    /// per-source timeout; an overrun is reported as a `Timeout` failure.
    pub fn parse_batch(&self, sources: &[PathBuf]) -> BatchOutcome {
        let expanded = self.expand_sources(sources);

        #[cfg(feature = "progress")]
        let progress_bar = if self.config.show_progress && expanded.len() > 1 {
            let pb = ProgressBar::new(expanded.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} sources")
                    .unwrap()
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        let parse_one = |path: &PathBuf| {
            let outcome = self.parse_source_with_timeout(path);
            #[cfg(feature = "progress")]
            if let Some(ref pb) = progress_bar {
                pb.inc(1);
            }
            outcome
        };

        #[cfg(feature = "parallel")]
        let per_source: Vec<BatchOutcome> = match self.config.parallel_threads {
            Some(threads) => match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => pool.install(|| expanded.par_iter().map(parse_one).collect()),
                Err(_) => expanded.par_iter().map(parse_one).collect(),
            },
            None => expanded.par_iter().map(parse_one).collect(),
        };

        #[cfg(not(feature = "parallel"))]
        let per_source: Vec<BatchOutcome> = expanded.iter().map(parse_one).collect();

        #[cfg(feature = "progress")]
        if let Some(pb) = progress_bar {
            pb.finish_and_clear();
        }

        let mut outcome = BatchOutcome::default();
        for one in per_source {
            outcome.merge(one);
        }
        outcome
    }

    /// Expand directory sources into their supported files
    fn expand_sources(&self, sources: &[PathBuf]) -> Vec<PathBuf> {
        let mut expanded = Vec::new();
        for source in sources {
            if source.is_dir() && self.config.follow_directories {
                let mut entries: Vec<PathBuf> = fs::read_dir(source)
                    .into_iter()
                    .flatten()
                    .flatten()
                    .map(|e| e.path())
                    .filter(|p| {
                        p.is_file()
                            && p.extension()
                                .and_then(|e| e.to_str())
                                .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                                .unwrap_or(false)
                    })
                    .collect();
                entries.sort();
                expanded.extend(entries);
            } else {
                expanded.push(source.clone());
            }
        }
        expanded
    }

    /// Run one source's extraction with the configured time bound
    ///
    /// The extraction runs in a worker thread; on overrun the worker is
    /// abandoned and the source reported as a `Timeout` failure so the
    /// batch as a whole always terminates.
    fn parse_source_with_timeout(&self, path: &Path) -> BatchOutcome {
        let (tx, rx) = mpsc::channel();
        let parser = self.clone();
        let worker_path = path.to_path_buf();
        thread::spawn(move || {
            let outcome = parser.parse_source(&worker_path);
            let _ = tx.send(outcome);
        });

        match rx.recv_timeout(self.config.parse_timeout()) {
            Ok(outcome) => outcome,
            Err(_) => BatchOutcome {
                plans: Vec::new(),
                failures: vec![ExtractionFailure::new(
                    path,
                    FailureReason::Timeout {
                        limit_secs: self.config.parse_timeout_secs,
                    },
                )],
            },
        }
    }

    /// Dispatch a single source to its format strategy
    fn parse_source(&self, path: &Path) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();

        if !path.exists() {
            outcome.failures.push(ExtractionFailure::new(
                path,
                FailureReason::Io {
                    message: "file not found".to_string(),
                },
            ));
            return outcome;
        }

        match detect_format(path) {
            Some(SourceFormat::Text) => match self.parse_text_document(path) {
                Ok(plan) => outcome.plans.push(plan),
                Err(reason) => outcome.failures.push(ExtractionFailure::new(path, reason)),
            },
            Some(SourceFormat::Json) => outcome.merge(self.parse_json(path)),
            Some(SourceFormat::Csv) => outcome.merge(self.parse_csv(path)),
            None => {
                let extension = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("")
                    .to_string();
                outcome.failures.push(ExtractionFailure::new(
                    path,
                    FailureReason::UnsupportedFormat { extension },
                ));
            }
        }
        outcome
    }

    // ---- Text strategy ----------------------------------------------------

    /// Extract a plan from a text-bearing document (PDF, DOCX, TXT)
    ///
    /// An ordered set of field rules runs independently over the raw text;
    /// a field whose rule finds no match is recorded as `Missing`.
    fn parse_text_document(&self, path: &Path) -> std::result::Result<Plan, FailureReason> {
        let metadata = fs::metadata(path).map_err(|e| FailureReason::Io {
            message: e.to_string(),
        })?;
        if metadata.len() > self.config.max_text_bytes {
            return Err(FailureReason::Malformed {
                message: format!(
                    "source is {} bytes, larger than the {} byte limit",
                    metadata.len(),
                    self.config.max_text_bytes
                ),
            });
        }

        let bytes = fs::read(path).map_err(|e| FailureReason::Io {
            message: e.to_string(),
        })?;
        let text = printable_text(&bytes);
        if text.trim().is_empty() {
            return Err(FailureReason::EmptyDocument);
        }

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_string();
        let text_lower = text.to_ascii_lowercase();
        let stem_lower = stem.to_ascii_lowercase();

        let plan = Plan {
            plan_id: extract_plan_id(&stem, &text),
            issuer: extract_issuer(&stem_lower, &text_lower),
            marketing_name: extract_marketing_name(&stem, &text, &text_lower),
            plan_type: extract_plan_type(&stem_lower, &text_lower),
            metal_level: extract_metal_level(&stem_lower, &text_lower),
            monthly_premium: scan_amount(&text_lower, &["monthly premium", "premium"]).into(),
            deductible: scan_amount(
                &text_lower,
                &["individual deductible", "annual deductible", "deductible"],
            )
            .into(),
            oop_max: scan_amount(
                &text_lower,
                &[
                    "out-of-pocket maximum",
                    "out of pocket maximum",
                    "maximum out-of-pocket",
                    "oop max",
                    "oopm",
                ],
            )
            .into(),
            copay_primary: scan_amount(
                &text_lower,
                &["primary care copay", "primary care", "pcp"],
            )
            .into(),
            copay_specialist: scan_amount(
                &text_lower,
                &["specialist copay", "specialty care", "specialist"],
            )
            .into(),
            copay_er: scan_amount(&text_lower, &["emergency room", "er copay"]).into(),
            coinsurance: scan_coinsurance(&text_lower).into(),
            network_providers: BTreeSet::new(),
            formulary: BTreeMap::new(),
            requires_referral: detect_referral_requirement(&text_lower),
            star_rating: scan_amount(&text_lower, &["star rating"])
                .filter(|v| (0.0..=5.0).contains(v)),
        };

        plan.validate().map_err(|e| FailureReason::Malformed {
            message: e.to_string(),
        })?;
        Ok(plan)
    }

    // ---- JSON strategy ----------------------------------------------------

    /// Parse a structured JSON source (single record or array)
    fn parse_json(&self, path: &Path) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();

        let contents = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                outcome.failures.push(ExtractionFailure::new(
                    path,
                    FailureReason::Io {
                        message: e.to_string(),
                    },
                ));
                return outcome;
            }
        };

        let value: serde_json::Value = match serde_json::from_str(&contents) {
            Ok(v) => v,
            Err(e) => {
                outcome.failures.push(ExtractionFailure::new(
                    path,
                    FailureReason::Malformed {
                        message: e.to_string(),
                    },
                ));
                return outcome;
            }
        };

        match value {
            serde_json::Value::Array(elements) => {
                // Each element fails independently; siblings are kept
                for (idx, element) in elements.into_iter().enumerate() {
                    match raw_record_from_value(element) {
                        Ok(plan) => outcome.plans.push(plan),
                        Err(message) => outcome.failures.push(ExtractionFailure::new(
                            path,
                            FailureReason::MalformedRow {
                                line: idx + 1,
                                message,
                            },
                        )),
                    }
                }
            }
            other => match raw_record_from_value(other) {
                Ok(plan) => outcome.plans.push(plan),
                Err(message) => outcome
                    .failures
                    .push(ExtractionFailure::new(path, FailureReason::Malformed { message })),
            },
        }
        outcome
    }

    // ---- CSV strategy -----------------------------------------------------

    /// Parse a tabular CSV batch, one plan per row
    ///
    /// Headers are normalized through the shared alias table; a malformed
    /// row is its own failure without discarding sibling rows.
    fn parse_csv(&self, path: &Path) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();

        let mut reader = match csv::ReaderBuilder::new().has_headers(true).from_path(path) {
            Ok(r) => r,
            Err(e) => {
                outcome.failures.push(ExtractionFailure::new(
                    path,
                    FailureReason::Io {
                        message: e.to_string(),
                    },
                ));
                return outcome;
            }
        };

        let headers: Vec<Option<&'static str>> = match reader.headers() {
            Ok(h) => h.iter().map(canonical_header).collect(),
            Err(e) => {
                outcome.failures.push(ExtractionFailure::new(
                    path,
                    FailureReason::Malformed {
                        message: format!("unreadable header row: {}", e),
                    },
                ));
                return outcome;
            }
        };

        for (idx, result) in reader.records().enumerate() {
            let line = idx + 2; // header occupies line 1
            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    outcome.failures.push(ExtractionFailure::new(
                        path,
                        FailureReason::MalformedRow {
                            line,
                            message: e.to_string(),
                        },
                    ));
                    continue;
                }
            };

            match csv_row_to_plan(&headers, &record) {
                Ok(plan) => outcome.plans.push(plan),
                Err(message) => outcome.failures.push(ExtractionFailure::new(
                    path,
                    FailureReason::MalformedRow { line, message },
                )),
            }
        }
        outcome
    }
}

// ---- Shared canonical record (JSON + CSV alias table) ----------------------

/// Canonical plan record shape with legacy/alternate key aliases
#[derive(Debug, Clone, Deserialize)]
struct RawPlanRecord {
    #[serde(alias = "id")]
    plan_id: String,
    #[serde(default, alias = "issuer_name")]
    issuer: Option<String>,
    #[serde(default, alias = "plan_marketing_name", alias = "name")]
    marketing_name: Option<String>,
    #[serde(default)]
    plan_type: Option<String>,
    #[serde(default)]
    metal_level: Option<String>,
    #[serde(default, alias = "premium")]
    monthly_premium: Option<f64>,
    #[serde(default, alias = "deductible_individual", alias = "medical_deductible")]
    deductible: Option<f64>,
    #[serde(
        default,
        alias = "oop_max_individual",
        alias = "out_of_pocket_max",
        alias = "medical_moop"
    )]
    oop_max: Option<f64>,
    #[serde(default, alias = "primary_care_copay")]
    copay_primary: Option<f64>,
    #[serde(default, alias = "specialist_copay")]
    copay_specialist: Option<f64>,
    #[serde(default, alias = "emergency_room_copay")]
    copay_er: Option<f64>,
    #[serde(default)]
    coinsurance: Option<f64>,
    #[serde(default, alias = "network")]
    network_providers: Vec<String>,
    #[serde(default)]
    formulary: BTreeMap<String, String>,
    #[serde(default, alias = "requires_referrals")]
    requires_referral: bool,
    #[serde(default, alias = "quality_rating", alias = "plan_rating")]
    star_rating: Option<f64>,
}

impl RawPlanRecord {
    fn into_plan(self) -> std::result::Result<Plan, String> {
        let plan = Plan {
            plan_id: self.plan_id,
            issuer: self.issuer.unwrap_or_else(|| "Unknown Issuer".to_string()),
            marketing_name: self.marketing_name.unwrap_or_default(),
            plan_type: self
                .plan_type
                .as_deref()
                .and_then(PlanType::from_code)
                .unwrap_or(PlanType::Ppo),
            metal_level: self
                .metal_level
                .as_deref()
                .and_then(MetalLevel::from_code)
                .unwrap_or(MetalLevel::Silver),
            monthly_premium: self.monthly_premium.into(),
            deductible: self.deductible.into(),
            oop_max: self.oop_max.into(),
            copay_primary: self.copay_primary.into(),
            copay_specialist: self.copay_specialist.into(),
            copay_er: self.copay_er.into(),
            coinsurance: self.coinsurance.into(),
            network_providers: self
                .network_providers
                .into_iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
            formulary: self
                .formulary
                .into_iter()
                .map(|(drug, tier)| {
                    let tier = FormularyTier::from_code(&tier).unwrap_or(FormularyTier::Unspecified);
                    (drug, tier)
                })
                .collect(),
            requires_referral: self.requires_referral,
            star_rating: self.star_rating,
        };
        plan.validate().map_err(|e| e.to_string())?;
        Ok(plan)
    }
}

fn raw_record_from_value(value: serde_json::Value) -> std::result::Result<Plan, String> {
    let raw: RawPlanRecord = serde_json::from_value(value).map_err(|e| e.to_string())?;
    raw.into_plan()
}

/// Map a CSV header name onto the canonical schema, if recognized
fn canonical_header(name: &str) -> Option<&'static str> {
    match name.trim().to_ascii_lowercase().as_str() {
        "plan_id" | "id" => Some("plan_id"),
        "issuer" | "issuer_name" => Some("issuer"),
        "marketing_name" | "plan_marketing_name" | "name" => Some("marketing_name"),
        "plan_type" => Some("plan_type"),
        "metal_level" => Some("metal_level"),
        "monthly_premium" | "premium" => Some("monthly_premium"),
        "deductible" | "deductible_individual" | "medical_deductible" => Some("deductible"),
        "oop_max" | "oop_max_individual" | "out_of_pocket_max" | "medical_moop" => Some("oop_max"),
        "copay_primary" | "primary_care_copay" => Some("copay_primary"),
        "copay_specialist" | "specialist_copay" => Some("copay_specialist"),
        "copay_er" | "emergency_room_copay" => Some("copay_er"),
        "coinsurance" => Some("coinsurance"),
        "network_providers" | "network" => Some("network_providers"),
        "formulary" => Some("formulary"),
        "requires_referral" | "requires_referrals" => Some("requires_referral"),
        "star_rating" | "quality_rating" | "plan_rating" => Some("star_rating"),
        _ => None,
    }
}

fn csv_row_to_plan(
    headers: &[Option<&'static str>],
    record: &csv::StringRecord,
) -> std::result::Result<Plan, String> {
    let get_field = |canonical: &str| -> Option<&str> {
        headers
            .iter()
            .position(|h| *h == Some(canonical))
            .and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };

    let parse_money = |canonical: &str| -> std::result::Result<Option<f64>, String> {
        match get_field(canonical) {
            Some(raw) => raw
                .trim_start_matches('$')
                .replace(',', "")
                .parse::<f64>()
                .map(Some)
                .map_err(|_| format!("field '{}' is not a number: '{}'", canonical, raw)),
            None => Ok(None),
        }
    };

    let plan_id = get_field("plan_id")
        .ok_or_else(|| "missing plan_id".to_string())?
        .to_string();

    let network_providers: Vec<String> = get_field("network_providers")
        .map(|s| {
            s.split(';')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect()
        })
        .unwrap_or_default();

    // "drug:tier;drug:tier" pairs
    let mut formulary = BTreeMap::new();
    if let Some(raw) = get_field("formulary") {
        for entry in raw.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            let (drug, tier) = entry
                .split_once(':')
                .ok_or_else(|| format!("formulary entry '{}' is not drug:tier", entry))?;
            formulary.insert(drug.trim().to_string(), tier.trim().to_string());
        }
    }

    let raw = RawPlanRecord {
        plan_id,
        issuer: get_field("issuer").map(str::to_string),
        marketing_name: get_field("marketing_name").map(str::to_string),
        plan_type: get_field("plan_type").map(str::to_string),
        metal_level: get_field("metal_level").map(str::to_string),
        monthly_premium: parse_money("monthly_premium")?,
        deductible: parse_money("deductible")?,
        oop_max: parse_money("oop_max")?,
        copay_primary: parse_money("copay_primary")?,
        copay_specialist: parse_money("copay_specialist")?,
        copay_er: parse_money("copay_er")?,
        coinsurance: parse_money("coinsurance")?,
        network_providers,
        formulary,
        requires_referral: get_field("requires_referral")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "yes" | "1"))
            .unwrap_or(false),
        star_rating: parse_money("star_rating")?,
    };
    raw.into_plan()
}

// ---- Text field rules ------------------------------------------------------

/// Reduce raw bytes to printable ASCII text for rule scanning
fn printable_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .map(|c| {
            if c == '\n' || c == '\t' || (' '..='~').contains(&c) {
                c
            } else {
                ' '
            }
        })
        .collect()
}

/// Parse a leading money-style number ("1,500" / "450.50"), if present
fn leading_number(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut end = 0;
    while end < bytes.len() {
        let c = bytes[end] as char;
        if c.is_ascii_digit() || c == ',' || c == '.' {
            end += 1;
        } else {
            break;
        }
    }
    if end == 0 {
        return None;
    }
    let digits: String = s[..end].chars().filter(|&c| c != ',').collect();
    digits.trim_end_matches('.').parse().ok()
}

/// Scan lowercased text for the first labelled amount among ordered labels
///
/// Returns None when no label yields a value, which the caller records as
/// `Missing` rather than zero.
fn scan_amount(text_lower: &str, labels: &[&str]) -> Option<f64> {
    for label in labels {
        let mut from = 0;
        while let Some(pos) = text_lower[from..].find(label) {
            let after = from + pos + label.len();
            let rest = text_lower[after..]
                .trim_start_matches(|c: char| matches!(c, ':' | '=' | ' ' | '\t' | '$'));
            if let Some(value) = leading_number(rest) {
                return Some(value);
            }
            from = after;
        }
    }
    None
}

/// Coinsurance rule: percentage forms normalize into [0,1]
fn scan_coinsurance(text_lower: &str) -> Option<f64> {
    let value = scan_amount(text_lower, &["coinsurance"])?;
    if value > 1.0 {
        Some(value / 100.0)
    } else {
        Some(value)
    }
}

/// Plan id rule: long digit runs in the filename, labelled ids in the text,
/// then the file stem as a last resort
fn extract_plan_id(stem: &str, text: &str) -> String {
    if let Some(id) = longest_digit_run(stem, 6) {
        return id;
    }
    let text_lower = text.to_ascii_lowercase();
    for label in ["plan id", "plan identifier"] {
        if let Some(pos) = text_lower.find(label) {
            let after = &text[pos + label.len()..];
            let token: String = after
                .chars()
                .skip_while(|c| matches!(c, ':' | ' ' | '\t'))
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
                .collect();
            if token.len() >= 4 {
                return token;
            }
        }
    }
    stem.to_string()
}

fn longest_digit_run(s: &str, min_len: usize) -> Option<String> {
    let mut best: Option<String> = None;
    let mut current = String::new();
    for c in s.chars().chain(std::iter::once(' ')) {
        if c.is_ascii_digit() {
            current.push(c);
        } else {
            if current.len() >= min_len
                && best.as_ref().map(|b| current.len() > b.len()).unwrap_or(true)
            {
                best = Some(current.clone());
            }
            current.clear();
        }
    }
    best
}

/// Known-issuer table applied to filename and text
fn extract_issuer(stem_lower: &str, text_lower: &str) -> String {
    const ISSUERS: &[(&str, &str)] = &[
        ("ambetter", "Ambetter"),
        ("amb", "Ambetter"),
        ("blue cross", "Blue Cross Blue Shield"),
        ("bcbs", "Blue Cross Blue Shield"),
        ("unitedhealth", "UnitedHealthcare"),
        ("uhc", "UnitedHealthcare"),
        ("banner", "Banner Health"),
        ("imperial", "Imperial Health"),
        ("oscar", "Oscar Health"),
        ("aetna", "Aetna"),
        ("cigna", "Cigna"),
        ("humana", "Humana"),
    ];
    for (needle, full_name) in ISSUERS {
        if stem_lower.contains(needle) || text_lower.contains(needle) {
            return full_name.to_string();
        }
    }
    "Unknown Issuer".to_string()
}

fn extract_metal_level(stem_lower: &str, text_lower: &str) -> MetalLevel {
    for metal in [
        MetalLevel::Catastrophic,
        MetalLevel::Platinum,
        MetalLevel::Gold,
        MetalLevel::Silver,
        MetalLevel::Bronze,
    ] {
        let needle = metal.as_code().to_ascii_lowercase();
        if stem_lower.contains(&needle) || text_lower.contains(&needle) {
            return metal;
        }
    }
    MetalLevel::Silver
}

fn extract_plan_type(stem_lower: &str, text_lower: &str) -> PlanType {
    for plan_type in [
        PlanType::Hdhp,
        PlanType::Hmo,
        PlanType::Epo,
        PlanType::Pos,
        PlanType::Ppo,
    ] {
        let needle = plan_type.as_code().to_ascii_lowercase();
        if stem_lower.contains(&needle) || text_lower.contains(&needle) {
            return plan_type;
        }
    }
    PlanType::Ppo
}

fn extract_marketing_name(stem: &str, text: &str, text_lower: &str) -> String {
    for label in ["marketing name", "plan name"] {
        if let Some(pos) = text_lower.find(label) {
            let after = &text[pos + label.len()..];
            let name: String = after
                .chars()
                .skip_while(|c| matches!(c, ':' | ' ' | '\t'))
                .take_while(|c| *c != '\n')
                .collect();
            let name = name.trim();
            if !name.is_empty() {
                return name.to_string();
            }
        }
    }
    stem.replace('_', " ")
}

fn detect_referral_requirement(text_lower: &str) -> bool {
    if let Some(pos) = text_lower.find("referral") {
        let window = &text_lower[pos..text_lower.len().min(pos + 60)];
        return window.contains("required") || window.contains("needed");
    }
    false
}

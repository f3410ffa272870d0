/*!
 * JSON import and export
 *
 * Structured hand-off at the system boundary: client profiles and
 * pre-ingested plan sets come in as JSON, finished reports and plan sets
 * go out as JSON. Reports round-trip losslessly, with missing extracted
 * fields serialized as `null` rather than dropped or zeroed.
 */

use std::fs;
use std::path::Path;

use crate::data_types::{AnalysisReport, Client, Plan};
use crate::error::{PlanNavError, Result};

/// Load a client profile from a JSON file and validate it
pub fn load_client(path: impl AsRef<Path>) -> Result<Client> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|err| PlanNavError::Io {
        message: format!("failed to read client profile: {}", err),
        source: err,
        path: Some(path.to_path_buf()),
    })?;
    let client: Client = serde_json::from_str(&content).map_err(|err| PlanNavError::JsonParse {
        message: err.to_string(),
        path: Some(path.to_path_buf()),
    })?;
    client.validate()?;
    Ok(client)
}

/// Load a previously exported plan set from a JSON file
///
/// Accepts either a JSON array of plans or a single plan object.
pub fn load_plans(path: impl AsRef<Path>) -> Result<Vec<Plan>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|err| PlanNavError::Io {
        message: format!("failed to read plan set: {}", err),
        source: err,
        path: Some(path.to_path_buf()),
    })?;
    let wrap = |err: serde_json::Error| PlanNavError::JsonParse {
        message: err.to_string(),
        path: Some(path.to_path_buf()),
    };
    let plans = match serde_json::from_str::<Vec<Plan>>(&content) {
        Ok(plans) => plans,
        Err(_) => vec![serde_json::from_str::<Plan>(&content).map_err(wrap)?],
    };
    for plan in &plans {
        plan.validate()?;
    }
    Ok(plans)
}

/// Load a previously exported report from a JSON file
///
/// An engine-built report always ranks at least one plan; a report with an
/// empty analysis list is rejected here so `AnalysisReport::best` stays
/// safe for loaded reports too.
pub fn load_report(path: impl AsRef<Path>) -> Result<AnalysisReport> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|err| PlanNavError::Io {
        message: format!("failed to read report: {}", err),
        source: err,
        path: Some(path.to_path_buf()),
    })?;
    let report: AnalysisReport =
        serde_json::from_str(&content).map_err(|err| PlanNavError::JsonParse {
            message: err.to_string(),
            path: Some(path.to_path_buf()),
        })?;
    if report.analyses.is_empty() {
        return Err(PlanNavError::validation(
            "report contains no plan analyses",
            "analyses",
            "[]",
        ));
    }
    Ok(report)
}

fn write_json<T: serde::Serialize>(value: &T, path: &Path, what: &str) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|err| PlanNavError::Export {
        message: format!("failed to serialize {}: {}", what, err),
        path: Some(path.to_path_buf()),
    })?;
    fs::write(path, json).map_err(|err| PlanNavError::Export {
        message: format!("failed to write {}: {}", what, err),
        path: Some(path.to_path_buf()),
    })
}

/// Write a finished report to a pretty-printed JSON file
pub fn export_report(report: &AnalysisReport, path: impl AsRef<Path>) -> Result<()> {
    write_json(report, path.as_ref(), "report")
}

/// Write an ingested plan set to a pretty-printed JSON file
///
/// The output is accepted back by [`load_plans`], so a slow multi-document
/// ingestion can be done once and re-analyzed cheaply.
pub fn export_plans(plans: &[Plan], path: impl AsRef<Path>) -> Result<()> {
    write_json(&plans, path.as_ref(), "plan set")
}

/// Serialize a report to a JSON string
pub fn report_to_json(report: &AnalysisReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(|err| PlanNavError::Export {
        message: format!("failed to serialize report: {}", err),
        path: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::{Extracted, MetalLevel, PlanType};
    use std::collections::{BTreeMap, BTreeSet};
    use tempfile::TempDir;

    fn sample_plan() -> Plan {
        Plan {
            plan_id: "91450AZ0010001".to_string(),
            issuer: "Acme Health".to_string(),
            marketing_name: "Acme Silver Saver".to_string(),
            plan_type: PlanType::Hmo,
            metal_level: MetalLevel::Silver,
            monthly_premium: Extracted::Value(385.5),
            deductible: Extracted::Missing,
            oop_max: Extracted::Value(7200.0),
            copay_primary: Extracted::Value(30.0),
            copay_specialist: Extracted::Missing,
            copay_er: Extracted::Value(400.0),
            coinsurance: Extracted::Value(0.3),
            network_providers: BTreeSet::from(["Dr. Ruiz".to_string()]),
            formulary: BTreeMap::from([("metformin".to_string(), crate::data_types::FormularyTier::Generic)]),
            requires_referral: true,
            star_rating: None,
        }
    }

    #[test]
    fn plan_set_round_trips_through_a_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plans.json");
        let plans = vec![sample_plan()];

        export_plans(&plans, &path).unwrap();
        let loaded = load_plans(&path).unwrap();
        assert_eq!(loaded, plans);
        // Missing stays missing, never becomes zero
        assert!(loaded[0].deductible.is_missing());
    }

    #[test]
    fn missing_fields_serialize_as_null() {
        let json = serde_json::to_string(&sample_plan()).unwrap();
        assert!(json.contains("\"deductible\":null"));
        assert!(json.contains("\"copay_specialist\":null"));
    }

    #[test]
    fn loading_an_empty_report_is_rejected() {
        use crate::data_types::{
            AnalysisReport, CategoryLeader, CategoryLeaders, Client, MedicalProfile,
            PersonalInfo, Priorities,
        };
        use chrono::{NaiveDate, Utc};

        let no_leader = || CategoryLeader {
            plan_id: String::new(),
            value: 0.0,
        };
        let report = AnalysisReport {
            client: Client {
                personal: PersonalInfo {
                    full_name: "Test Person".to_string(),
                    dob: NaiveDate::from_ymd_opt(1985, 6, 1).unwrap(),
                    zipcode: "85004".to_string(),
                    household_size: 1,
                    annual_income: 52_000.0,
                    subsidy_eligible: false,
                },
                medical_profile: MedicalProfile::default(),
                priorities: Priorities::default(),
            },
            analyses: Vec::new(),
            leaders: CategoryLeaders {
                cheapest: no_leader(),
                best_network: no_leader(),
                best_medication_coverage: no_leader(),
                best_financial_protection: no_leader(),
            },
            failures: Vec::new(),
            generated_at: Utc::now(),
        };

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty_report.json");
        fs::write(&path, serde_json::to_string(&report).unwrap()).unwrap();

        assert!(matches!(
            load_report(&path),
            Err(PlanNavError::DataValidation { .. })
        ));
    }

    #[test]
    fn loading_a_missing_file_is_an_io_error() {
        let result = load_client("/nonexistent/client.json");
        assert!(matches!(result, Err(PlanNavError::Io { .. })));
    }

    #[test]
    fn loading_malformed_json_reports_the_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        match load_plans(&path) {
            Err(PlanNavError::JsonParse { path: Some(p), .. }) => {
                assert!(p.ends_with("broken.json"));
            }
            other => panic!("expected JsonParse, got {:?}", other),
        }
    }
}

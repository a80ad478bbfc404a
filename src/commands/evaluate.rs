use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use photo_intent::{EntityType, Intent, IntentHandler, SemanticQuery};

use super::load_handler;
use crate::cli::EvaluateArgs;
use crate::util::{now_utc_string, read_json, write_json_pretty};

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioManifest {
    pub manifest_version: u32,
    pub scenarios: Vec<Scenario>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub query: String,
    pub expected_intent: Intent,
    #[serde(default)]
    pub expected_entities: Vec<ExpectedEntity>,
    #[serde(default)]
    pub expected_entity_counts: BTreeMap<EntityType, usize>,
    #[serde(default)]
    pub min_confidence: Option<f64>,
    #[serde(default)]
    pub max_confidence: Option<f64>,
    #[serde(default)]
    pub expect_clarification: Option<bool>,
    #[serde(default)]
    pub expected_action_ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExpectedEntity {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutcome {
    pub id: String,
    pub query: String,
    pub expected_intent: Intent,
    pub intent: Intent,
    pub confidence: f64,
    pub status: &'static str,
    pub failures: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub manifest_path: String,
    pub generated_at: String,
    pub rules_version: String,
    pub rules_fingerprint: String,
    pub scenario_count: usize,
    pub passed: usize,
    pub failed: usize,
    pub intent_accuracy: Option<f64>,
    pub results: Vec<ScenarioOutcome>,
}

pub async fn run(args: EvaluateArgs) -> Result<()> {
    let handler = load_handler(args.rules_path.as_deref())?;
    let manifest: ScenarioManifest = read_json(&args.manifest_path)?;
    info!(
        path = %args.manifest_path.display(),
        manifest_version = manifest.manifest_version,
        scenarios = manifest.scenarios.len(),
        "loaded scenario manifest"
    );

    let report = evaluate_manifest(&handler, &args.manifest_path, &manifest).await;

    for outcome in report.results.iter().filter(|outcome| outcome.status == "fail") {
        warn!(
            id = %outcome.id,
            query = %outcome.query,
            failures = %outcome.failures.join("; "),
            "scenario failed"
        );
    }

    if let Some(report_path) = &args.report_path {
        write_json_pretty(report_path, &report)?;
        info!(path = %report_path.display(), "wrote evaluation report");
    }

    info!(
        passed = report.passed,
        failed = report.failed,
        intent_accuracy = report.intent_accuracy.unwrap_or(0.0),
        fingerprint = %report.rules_fingerprint,
        "evaluation completed"
    );

    if report.failed > 0 {
        bail!(
            "{} of {} scenarios failed",
            report.failed,
            report.scenario_count
        );
    }
    Ok(())
}

pub async fn evaluate_manifest(
    handler: &IntentHandler,
    manifest_path: &Path,
    manifest: &ScenarioManifest,
) -> EvaluationReport {
    let mut results = Vec::with_capacity(manifest.scenarios.len());
    for scenario in &manifest.scenarios {
        let result = handler.classify(&scenario.query).await;
        results.push(evaluate_scenario(scenario, &result));
    }

    let passed = results
        .iter()
        .filter(|outcome| outcome.status == "pass")
        .count();
    let intent_hits = results
        .iter()
        .filter(|outcome| outcome.intent == outcome.expected_intent)
        .count();

    EvaluationReport {
        manifest_path: manifest_path.display().to_string(),
        generated_at: now_utc_string(),
        rules_version: handler.rules().version().to_string(),
        rules_fingerprint: handler.rules().fingerprint().to_string(),
        scenario_count: results.len(),
        passed,
        failed: results.len() - passed,
        intent_accuracy: ratio(intent_hits, results.len()),
        results,
    }
}

pub fn evaluate_scenario(scenario: &Scenario, result: &SemanticQuery) -> ScenarioOutcome {
    let mut failures = Vec::new();

    if result.intent != scenario.expected_intent {
        failures.push(format!(
            "intent {} != expected {}",
            result.intent, scenario.expected_intent
        ));
    }

    for expected in &scenario.expected_entities {
        let found = result.entities.iter().any(|entity| {
            entity.entity_type == expected.entity_type
                && entity.value.eq_ignore_ascii_case(&expected.value)
        });
        if !found {
            failures.push(format!(
                "missing {} entity {:?}",
                expected.entity_type, expected.value
            ));
        }
    }

    for (entity_type, expected_count) in &scenario.expected_entity_counts {
        let count = result
            .entities
            .iter()
            .filter(|entity| entity.entity_type == *entity_type)
            .count();
        if count != *expected_count {
            failures.push(format!(
                "{entity_type} entity count {count} != expected {expected_count}"
            ));
        }
    }

    if let Some(min) = scenario.min_confidence {
        if result.confidence < min {
            failures.push(format!(
                "confidence {:.3} below minimum {min:.3}",
                result.confidence
            ));
        }
    }
    if let Some(max) = scenario.max_confidence {
        if result.confidence > max {
            failures.push(format!(
                "confidence {:.3} above maximum {max:.3}",
                result.confidence
            ));
        }
    }

    if let Some(expected) = scenario.expect_clarification {
        if result.needs_clarification != expected {
            failures.push(format!(
                "needs_clarification {} != expected {expected}",
                result.needs_clarification
            ));
        }
    }

    for action_id in &scenario.expected_action_ids {
        if !result
            .suggested_actions
            .iter()
            .any(|action| &action.id == action_id)
        {
            failures.push(format!("missing suggested action {action_id}"));
        }
    }

    ScenarioOutcome {
        id: scenario.id.clone(),
        query: scenario.query.clone(),
        expected_intent: scenario.expected_intent,
        intent: result.intent,
        confidence: result.confidence,
        status: if failures.is_empty() { "pass" } else { "fail" },
        failures,
    }
}

fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    if denominator == 0 {
        None
    } else {
        Some(numerator as f64 / denominator as f64)
    }
}

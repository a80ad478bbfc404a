pub mod classify;
pub mod entities;
pub mod evaluate;
pub mod rules;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use photo_intent::IntentHandler;
use photo_intent::rules::{CompiledRules, RuleSet};

fn load_rules(rules_path: Option<&Path>) -> Result<CompiledRules> {
    match rules_path {
        Some(path) => {
            let rule_set = RuleSet::from_json_file(path)?;
            let compiled = CompiledRules::compile(rule_set)
                .with_context(|| format!("invalid rule set: {}", path.display()))?;
            info!(
                path = %path.display(),
                version = %compiled.version(),
                fingerprint = %compiled.fingerprint(),
                "loaded rule set"
            );
            Ok(compiled)
        }
        None => Ok(photo_intent::rules::builtin().clone()),
    }
}

fn load_handler(rules_path: Option<&Path>) -> Result<IntentHandler> {
    Ok(IntentHandler::with_rules(load_rules(rules_path)?))
}

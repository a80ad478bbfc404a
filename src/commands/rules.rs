use anyhow::Result;
use tracing::info;

use super::load_rules;
use crate::cli::RulesArgs;
use crate::util::{write_json_pretty, write_json_stdout};

pub fn run(args: RulesArgs) -> Result<()> {
    let compiled = load_rules(args.rules_path.as_deref())?;
    info!(
        version = %compiled.version(),
        fingerprint = %compiled.fingerprint(),
        intent_patterns = compiled.intent_patterns().len(),
        "active rule set"
    );

    match args.output_path {
        Some(path) => {
            write_json_pretty(&path, compiled.rule_set())?;
            info!(path = %path.display(), "wrote rule set");
            Ok(())
        }
        None => write_json_stdout(compiled.rule_set()),
    }
}

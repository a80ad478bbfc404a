use std::io::{self, Write};

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use photo_intent::SemanticQuery;
use photo_intent::pipeline::IntentScores;

use super::load_handler;
use crate::cli::ClassifyArgs;

#[derive(Debug, Serialize)]
struct ExplainedQuery<'a> {
    #[serde(flatten)]
    result: &'a SemanticQuery,
    scores: IntentScores,
    rules_version: &'a str,
    rules_fingerprint: &'a str,
}

pub async fn run(args: ClassifyArgs) -> Result<()> {
    let handler = load_handler(args.rules_path.as_deref())?;
    let result = handler.classify(&args.query).await;

    info!(
        intent = %result.intent,
        confidence = result.confidence,
        entities = result.entities.len(),
        needs_clarification = result.needs_clarification,
        "query classified"
    );

    let scores = handler.score_intents(&args.query);
    if args.json {
        if args.explain {
            return crate::util::write_json_stdout(&ExplainedQuery {
                result: &result,
                scores,
                rules_version: handler.rules().version(),
                rules_fingerprint: handler.rules().fingerprint(),
            });
        }
        return crate::util::write_json_stdout(&result);
    }

    write_text_response(&result, args.explain.then_some(scores))
}

fn write_text_response(result: &SemanticQuery, scores: Option<IntentScores>) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(output, "Query: {}", result.original_query)?;
    writeln!(
        output,
        "Intent: {} confidence={:.3} needs_clarification={}",
        result.intent, result.confidence, result.needs_clarification
    )?;
    if let Some(scores) = scores {
        writeln!(
            output,
            "Scores: filter={} search={} navigate={} manage={}",
            scores.filter, scores.search, scores.navigate, scores.manage
        )?;
    }

    writeln!(output, "Entities: {}", result.entities.len())?;
    for entity in &result.entities {
        writeln!(
            output,
            "\t{}\t{}\tconfidence={:.2}\tspan={}..{}",
            entity.entity_type, entity.value, entity.confidence, entity.span.start, entity.span.end
        )?;
    }

    for (group, values) in &result.parameters {
        writeln!(output, "Parameter {group}: {}", values.join(", "))?;
    }

    for question in &result.clarification_questions {
        writeln!(output, "Clarify: {question}")?;
    }

    for action in &result.suggested_actions {
        let required = action
            .required_parameters()
            .map(|parameter| parameter.name.as_str())
            .collect::<Vec<&str>>();
        writeln!(
            output,
            "Action: {}\trequires=[{}]\t{}",
            action.id,
            required.join(", "),
            action.human_equivalent
        )?;
    }

    output.flush()?;
    Ok(())
}

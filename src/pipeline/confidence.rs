use tracing::trace;

use crate::model::{Entity, EntityType, Intent};
use crate::rules::CompiledRules;

pub const UNKNOWN_INTENT_QUESTION: &str = "Could you clarify what you want to do with your photos?";
pub const SEARCH_SUBJECT_QUESTION: &str = "What type of photos would you like to see?";
pub const FILTER_CRITERIA_QUESTION: &str = "What criteria would you like to filter by?";
pub const ALBUM_NAME_QUESTION: &str = "Which album would you like to open?";
pub const MORE_DETAIL_QUESTION: &str =
    "Could you add more detail, such as a subject, date, place or album?";

pub fn calculate_confidence(
    rules: &CompiledRules,
    intent: Intent,
    entities: &[Entity],
    query: &str,
) -> f64 {
    if intent == Intent::Unknown {
        return 0.0;
    }

    let settings = &rules.rule_set().confidence;
    let lowered = query.to_lowercase();
    let mut confidence = settings.base;

    let is_vague = rules
        .vague_terms()
        .map(|regex| regex.is_match(&lowered))
        .unwrap_or(false);
    if is_vague {
        confidence = settings.vague_confidence;
    } else if rules
        .specific_action_keywords()
        .map(|regex| regex.is_match(&lowered))
        .unwrap_or(false)
    {
        confidence += settings.specific_action_boost;
    }

    if !entities.is_empty() {
        let mean = entities.iter().map(|entity| entity.confidence).sum::<f64>()
            / entities.len() as f64;
        confidence += mean * settings.entity_weight;
    }

    let length = query.trim().chars().count();
    if length < settings.short_query_chars {
        confidence -= settings.short_query_penalty;
    } else if length > settings.long_query_chars {
        confidence -= settings.long_query_penalty;
    }

    if confidence < settings.floor_trigger {
        confidence = settings.floor_value;
    }

    let confidence = confidence.clamp(0.0, 1.0);
    trace!(intent = %intent, vague = is_vague, length, confidence, "calculated confidence");
    confidence
}

pub fn needs_clarification(
    rules: &CompiledRules,
    intent: Intent,
    entities: &[Entity],
    confidence: f64,
) -> bool {
    confidence < rules.rule_set().confidence.clarification_threshold
        || intent == Intent::Unknown
        || (matches!(intent, Intent::Filter | Intent::Search) && entities.is_empty())
}

pub fn clarification_questions(intent: Intent, entities: &[Entity]) -> Vec<String> {
    let mut questions = Vec::new();

    if intent == Intent::Unknown {
        questions.push(UNKNOWN_INTENT_QUESTION.to_string());
    }
    if intent == Intent::Search && entities.is_empty() {
        questions.push(SEARCH_SUBJECT_QUESTION.to_string());
    }
    if intent == Intent::Filter && entities.is_empty() {
        questions.push(FILTER_CRITERIA_QUESTION.to_string());
    }
    if intent == Intent::Navigate
        && !entities
            .iter()
            .any(|entity| entity.entity_type == EntityType::Album)
    {
        questions.push(ALBUM_NAME_QUESTION.to_string());
    }

    questions
}

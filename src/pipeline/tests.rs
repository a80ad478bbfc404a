use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::*;
use crate::model::{AgentAction, EntityType, Intent, Permission};
use crate::pipeline::confidence::{
    MORE_DETAIL_QUESTION, SEARCH_SUBJECT_QUESTION, UNKNOWN_INTENT_QUESTION,
};
use crate::rules::{CompiledRules, RuleSet};

const CORPUS: &[&str] = &[
    "show me photos with sunset",
    "open vacation album",
    "delete this photo",
    "asdf qwerty random text",
    "photos from 2023-01-15",
    "display pictures containing dogs and cats",
    "sunset and beach and mountain",
    "find pics taken in New York last summer",
    "um could you please show me stuff",
    "go to the album called 'Road Trip' from June 5, 2021",
    "🎉🎉🎉",
    "!!! ??? ...",
    "写真を見せて",
    "move",
    "show me photos of stuff",
    "delete my vacation album",
    "show the album from 2022",
    "photos from Monday",
    "photos with İstanbul",
    "create a new album called Summer",
    "",
    "   ",
];

#[tokio::test]
async fn show_photos_with_sunset_is_a_confident_search() {
    let result = classify_intent("show me photos with sunset").await;
    assert_eq!(result.intent, Intent::Search);
    assert!(result.confidence > 0.7, "confidence {}", result.confidence);
    assert_eq!(result.entities.len(), 1);
    assert_eq!(result.entities[0].entity_type, EntityType::Keyword);
    assert_eq!(result.entities[0].value, "sunset");
    assert!(!result.needs_clarification);
    assert!(result.clarification_questions.is_empty());
    assert_eq!(result.parameters["keywords"], vec!["sunset"]);
}

#[tokio::test]
async fn empty_query_is_unknown_and_asks_for_clarification() {
    let result = classify_intent("").await;
    assert_eq!(result.intent, Intent::Unknown);
    assert_eq!(result.confidence, 0.0);
    assert!(result.needs_clarification);
    assert_eq!(
        result.clarification_questions,
        vec![UNKNOWN_INTENT_QUESTION.to_string()]
    );
    assert!(result.entities.is_empty());
    assert!(result.suggested_actions.is_empty());
}

#[tokio::test]
async fn open_album_navigates_with_album_entity() {
    let result = classify_intent("open vacation album").await;
    assert_eq!(result.intent, Intent::Navigate);
    let albums = result
        .entities
        .iter()
        .filter(|entity| entity.entity_type == EntityType::Album)
        .collect::<Vec<_>>();
    assert_eq!(albums.len(), 1);
    assert_eq!(albums[0].value, "vacation");
    assert_eq!(result.suggested_actions[0].id, "open_album");
    assert_eq!(result.parameters["albums"], vec!["vacation"]);
}

#[tokio::test]
async fn delete_photo_suggests_destructive_action() {
    let result = classify_intent("delete this photo").await;
    assert_eq!(result.intent, Intent::Manage);
    assert!(result.suggested_actions.iter().any(|action| {
        action.requires(Permission::Write) && action.requires(Permission::Delete)
    }));
}

#[tokio::test]
async fn gibberish_is_unknown_with_low_confidence() {
    let result = classify_intent("asdf qwerty random text").await;
    assert_eq!(result.intent, Intent::Unknown);
    assert!(result.confidence < 0.3);
    assert!(result.needs_clarification);
}

#[tokio::test]
async fn iso_date_yields_single_date_entity() {
    let result = classify_intent("photos from 2023-01-15").await;
    let dates = result
        .entities
        .iter()
        .filter(|entity| entity.entity_type == EntityType::Date)
        .collect::<Vec<_>>();
    assert_eq!(dates.len(), 1);
    assert_eq!(dates[0].value, "2023-01-15");
}

#[tokio::test]
async fn vague_search_asks_what_to_show() {
    let result = classify_intent("um could you please show me stuff").await;
    assert_eq!(result.intent, Intent::Search);
    assert!((result.confidence - 0.5).abs() < 1e-9);
    assert!(result.needs_clarification);
    assert_eq!(
        result.clarification_questions,
        vec![SEARCH_SUBJECT_QUESTION.to_string()]
    );
}

#[tokio::test]
async fn vague_subject_list_still_asks_for_a_subject() {
    let result = classify_intent("show me photos of stuff").await;
    assert_eq!(result.intent, Intent::Search);
    assert!(result.entities.is_empty());
    assert!((result.confidence - 0.5).abs() < 1e-9);
    assert!(result.needs_clarification);
    assert_eq!(
        result.clarification_questions,
        vec![SEARCH_SUBJECT_QUESTION.to_string()]
    );
}

#[tokio::test]
async fn deleting_an_album_names_only_the_album() {
    let result = classify_intent("delete my vacation album").await;
    assert_eq!(result.intent, Intent::Manage);
    assert_eq!(result.parameters["albums"], vec!["vacation"]);
}

#[tokio::test]
async fn low_confidence_without_canned_prompt_asks_for_detail() {
    let result = classify_intent("move").await;
    assert_eq!(result.intent, Intent::Manage);
    assert!(result.confidence < 0.5);
    assert!(result.needs_clarification);
    assert_eq!(
        result.clarification_questions,
        vec![MORE_DETAIL_QUESTION.to_string()]
    );
}

#[tokio::test]
async fn classify_is_total_over_awkward_input() {
    let handler = IntentHandler::new();
    let long_text = "sunset ".repeat(1_500);
    let mut inputs = CORPUS
        .iter()
        .map(|query| query.to_string())
        .collect::<Vec<String>>();
    inputs.push("a".repeat(10_000));
    inputs.push(long_text);

    for input in &inputs {
        let result = handler.classify(input).await;
        assert_eq!(&result.original_query, input);
        assert!((0.0..=1.0).contains(&result.confidence));
        if !result.needs_clarification {
            assert!(result.clarification_questions.is_empty());
        } else {
            assert!(!result.clarification_questions.is_empty());
        }
    }

    let missing = handler.classify_optional(None).await;
    assert_eq!(missing.intent, Intent::Unknown);
    assert_eq!(missing.original_query, "");
}

#[tokio::test]
async fn unknown_intent_and_zero_confidence_coincide() {
    for query in CORPUS {
        let result = classify_intent(query).await;
        assert_eq!(
            result.intent == Intent::Unknown,
            result.confidence == 0.0,
            "query {query:?} gave {} at {}",
            result.intent,
            result.confidence
        );
    }
}

#[test]
fn entity_spans_cover_their_values() {
    for query in CORPUS {
        for entity in extract_entities(query) {
            let covered = entity.span.slice(query).to_lowercase();
            assert_eq!(
                covered,
                entity.value.to_lowercase(),
                "query {query:?} entity {entity:?}"
            );
            assert_eq!(
                entity.span.end - entity.span.start,
                entity.value.chars().count()
            );
        }
    }
}

#[tokio::test]
async fn repeated_classification_is_identical() {
    let handler = IntentHandler::new();
    for query in CORPUS {
        let first = handler.classify(query).await;
        let second = handler.classify(query).await;
        assert_eq!(first, second, "query {query:?}");
    }
}

#[tokio::test]
async fn clarification_matches_gating_rule() {
    let handler = IntentHandler::new();
    let threshold = handler.rules().rule_set().confidence.clarification_threshold;
    for query in CORPUS {
        let result = handler.classify(query).await;
        let expected = result.confidence < threshold
            || result.intent == Intent::Unknown
            || (matches!(result.intent, Intent::Filter | Intent::Search)
                && result.entities.is_empty());
        assert_eq!(result.needs_clarification, expected, "query {query:?}");
    }
}

#[tokio::test]
async fn semantic_query_serializes_with_camel_case_keys() {
    let result = classify_intent("find pics taken in New York last summer").await;
    let json = serde_json::to_value(&result).expect("result should serialize");
    assert_eq!(json["intent"], "search");
    assert_eq!(json["originalQuery"], "find pics taken in New York last summer");
    assert!(json["needsClarification"].is_boolean());
    assert!(json["suggestedActions"].is_array());
    assert_eq!(json["parameters"]["locations"][0], "New York");
    assert_eq!(json["parameters"]["dates"][0], "last summer");
}

struct RecordingRegistry {
    calls: Mutex<Vec<Intent>>,
}

#[async_trait]
impl ActionRegistry for RecordingRegistry {
    async fn suggest_actions(&self, intent: Intent) -> Vec<AgentAction> {
        self.calls
            .lock()
            .expect("registry lock poisoned")
            .push(intent);
        Vec::new()
    }
}

#[tokio::test]
async fn custom_registry_receives_classified_intent() {
    let registry = Arc::new(RecordingRegistry {
        calls: Mutex::new(Vec::new()),
    });
    let handler = IntentHandler::new().with_registry(registry.clone());

    let result = handler.classify("filter by beach").await;
    assert_eq!(result.intent, Intent::Filter);
    assert!(result.suggested_actions.is_empty());

    handler.classify("").await;
    assert_eq!(
        *registry.calls.lock().expect("registry lock poisoned"),
        vec![Intent::Filter]
    );
}

#[tokio::test]
async fn custom_rules_change_the_clarification_threshold() {
    let mut rules = RuleSet::builtin();
    rules.confidence.clarification_threshold = 0.95;
    let handler = IntentHandler::with_rules(CompiledRules::compile(rules).expect("rules compile"));

    let result = handler.classify("delete this photo").await;
    assert_eq!(result.intent, Intent::Manage);
    assert!(result.needs_clarification);
}

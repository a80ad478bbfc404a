use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use super::actions::{ActionRegistry, StaticActionRegistry};
use super::classifier::{IntentScores, classify_intent, score_intents};
use super::confidence::{
    MORE_DETAIL_QUESTION, UNKNOWN_INTENT_QUESTION, calculate_confidence, clarification_questions,
    needs_clarification,
};
use super::entities::{extract_entities, extract_parameters};
use crate::model::{Entity, Intent, SemanticQuery};
use crate::rules::{self, CompiledRules};

/// Runs the full interpretation pipeline for one query at a time.
#[derive(Clone)]
pub struct IntentHandler {
    rules: Arc<CompiledRules>,
    registry: Arc<dyn ActionRegistry>,
}

impl Default for IntentHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for IntentHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentHandler")
            .field("rules_version", &self.rules.version())
            .field("rules_fingerprint", &self.rules.fingerprint())
            .finish()
    }
}

impl IntentHandler {
    pub fn new() -> Self {
        Self::with_rules(rules::builtin().clone())
    }

    pub fn with_rules(rules: CompiledRules) -> Self {
        Self {
            rules: Arc::new(rules),
            registry: Arc::new(StaticActionRegistry),
        }
    }

    pub fn with_registry(mut self, registry: Arc<dyn ActionRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn rules(&self) -> &CompiledRules {
        &self.rules
    }

    pub fn extract_entities(&self, query: &str) -> Vec<Entity> {
        extract_entities(&self.rules, query)
    }

    pub fn score_intents(&self, query: &str) -> IntentScores {
        score_intents(&self.rules, query)
    }

    /// Interprets `query`. Never fails: input that cannot be classified comes
    /// back as `unknown` with zero confidence and a clarification prompt.
    pub async fn classify(&self, query: &str) -> SemanticQuery {
        if query.trim().is_empty() {
            debug!("empty query, returning unknown");
            return unknown_query(query);
        }

        let entities = extract_entities(&self.rules, query);
        let intent = classify_intent(&self.rules, query);
        let confidence = calculate_confidence(&self.rules, intent, &entities, query);

        let needs_clarification = needs_clarification(&self.rules, intent, &entities, confidence);
        let mut clarification_questions = if needs_clarification {
            clarification_questions(intent, &entities)
        } else {
            Vec::new()
        };
        if needs_clarification && clarification_questions.is_empty() {
            clarification_questions.push(MORE_DETAIL_QUESTION.to_string());
        }

        let parameters = extract_parameters(&entities);
        let suggested_actions = self.registry.suggest_actions(intent).await;

        debug!(
            intent = %intent,
            confidence,
            entities = entities.len(),
            needs_clarification,
            actions = suggested_actions.len(),
            "classified query"
        );

        SemanticQuery {
            intent,
            confidence,
            entities,
            parameters,
            needs_clarification,
            clarification_questions,
            suggested_actions,
            original_query: query.to_string(),
        }
    }

    pub async fn classify_optional(&self, query: Option<&str>) -> SemanticQuery {
        self.classify(query.unwrap_or_default()).await
    }
}

fn unknown_query(original_query: &str) -> SemanticQuery {
    SemanticQuery {
        intent: Intent::Unknown,
        confidence: 0.0,
        entities: Vec::new(),
        parameters: BTreeMap::new(),
        needs_clarification: true,
        clarification_questions: vec![UNKNOWN_INTENT_QUESTION.to_string()],
        suggested_actions: Vec::new(),
        original_query: original_query.to_string(),
    }
}

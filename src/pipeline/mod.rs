pub mod actions;
pub mod classifier;
pub mod confidence;
pub mod entities;
mod handler;

#[cfg(test)]
mod tests;

use std::sync::LazyLock;

pub use actions::{ActionRegistry, StaticActionRegistry};
pub use classifier::IntentScores;
pub use handler::IntentHandler;

use crate::model::{Entity, SemanticQuery};

static DEFAULT_HANDLER: LazyLock<IntentHandler> = LazyLock::new(IntentHandler::new);

/// Interprets `query` with the built-in rules and action table.
pub async fn classify_intent(query: &str) -> SemanticQuery {
    DEFAULT_HANDLER.classify(query).await
}

/// Extracts entities from `query` with the built-in rules.
pub fn extract_entities(query: &str) -> Vec<Entity> {
    DEFAULT_HANDLER.extract_entities(query)
}

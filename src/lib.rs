pub mod model;
pub mod pipeline;
pub mod rules;

pub use model::{AgentAction, Entity, EntityType, Intent, Permission, SemanticQuery, Span};
pub use pipeline::{IntentHandler, classify_intent, extract_entities};

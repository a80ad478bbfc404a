use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Keyword,
    Date,
    Location,
    Album,
}

impl EntityType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Keyword => "KEYWORD",
            Self::Date => "DATE",
            Self::Location => "LOCATION",
            Self::Album => "ALBUM",
        }
    }

    pub fn parameter_group(self) -> &'static str {
        match self {
            Self::Keyword => "keywords",
            Self::Date => "dates",
            Self::Location => "locations",
            Self::Album => "albums",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Character offsets into the original query. `end` is exclusive.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        let start = char_to_byte(source, self.start);
        let end = char_to_byte(source, self.end);
        &source[start..end.max(start)]
    }
}

fn char_to_byte(source: &str, char_offset: usize) -> usize {
    source
        .char_indices()
        .nth(char_offset)
        .map(|(index, _)| index)
        .unwrap_or(source.len())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub value: String,
    pub confidence: f64,
    pub span: Span,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Filter,
    Search,
    Navigate,
    Manage,
    Unknown,
}

impl Intent {
    pub const SCORED: [Intent; 4] = [
        Intent::Filter,
        Intent::Search,
        Intent::Navigate,
        Intent::Manage,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Filter => "filter",
            Self::Search => "search",
            Self::Navigate => "navigate",
            Self::Manage => "manage",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticQuery {
    pub intent: Intent,
    pub confidence: f64,
    pub entities: Vec<Entity>,
    pub parameters: BTreeMap<String, Vec<String>>,
    pub needs_clarification: bool,
    pub clarification_questions: Vec<String>,
    pub suggested_actions: Vec<AgentAction>,
    pub original_query: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Read,
    Write,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
    pub required: bool,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionReturn {
    #[serde(rename = "type")]
    pub return_type: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionExample {
    pub description: String,
    pub input: serde_json::Value,
    pub output: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentAction {
    pub id: String,
    pub name: String,
    pub description: String,
    pub parameters: Vec<ActionParameter>,
    pub returns: ActionReturn,
    pub permissions: BTreeSet<Permission>,
    pub human_equivalent: String,
    pub examples: Vec<ActionExample>,
}

impl AgentAction {
    pub fn requires(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    pub fn required_parameters(&self) -> impl Iterator<Item = &ActionParameter> {
        self.parameters.iter().filter(|parameter| parameter.required)
    }
}

mod builtin;
mod compile;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::model::{EntityType, Intent};

pub use compile::{CompiledEntityPattern, CompiledIntentPattern, CompiledRules, builtin};

pub const RULESET_VERSION: &str = "2024.06-2";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub version: String,
    pub stop_words: Vec<String>,
    pub intent_keywords: Vec<IntentKeywordRule>,
    pub intent_patterns: Vec<IntentPatternRule>,
    pub phrase_boosts: Vec<PhraseBoostRule>,
    pub entities: EntityRules,
    pub confidence: ConfidenceSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentKeywordRule {
    pub intent: Intent,
    pub keywords: Vec<String>,
    pub weight: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentPatternRule {
    pub intent: Intent,
    pub pattern: String,
    pub weight: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhraseBoostRule {
    pub intent: Intent,
    pub all_of: Vec<String>,
    #[serde(default)]
    pub any_of: Vec<String>,
    pub weight: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarCheck {
    IsoDate,
    MonthDayYear,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityPatternRule {
    pub name: String,
    pub entity_type: EntityType,
    pub pattern: String,
    pub base_confidence: f64,
    #[serde(default)]
    pub calendar_check: Option<CalendarCheck>,
    #[serde(default)]
    pub strip_leading_filler: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRules {
    pub keyword_vocabulary: Vec<String>,
    pub keyword_vocabulary_confidence: f64,
    pub keyword_list_decay: f64,
    pub keyword_min_confidence: f64,
    pub keyword_skip_words: Vec<String>,
    pub patterns: Vec<EntityPatternRule>,
    pub location_stop_words: Vec<String>,
    pub album_leading_filler: Vec<String>,
    pub album_trailing_stop_words: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceSettings {
    pub base: f64,
    pub vague_terms: Vec<String>,
    pub vague_confidence: f64,
    pub specific_action_keywords: Vec<String>,
    pub specific_action_boost: f64,
    pub entity_weight: f64,
    pub short_query_chars: usize,
    pub short_query_penalty: f64,
    pub long_query_chars: usize,
    pub long_query_penalty: f64,
    pub floor_trigger: f64,
    pub floor_value: f64,
    pub clarification_threshold: f64,
}

impl RuleSet {
    pub fn builtin() -> Self {
        builtin::rule_set()
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read(path)
            .with_context(|| format!("failed to read rule set: {}", path.display()))?;
        let rules: RuleSet = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse rule set: {}", path.display()))?;
        Ok(rules)
    }

    pub fn fingerprint(&self) -> Result<String> {
        let canonical = serde_json::to_vec(self).context("failed to serialize rule set")?;
        let mut hasher = Sha256::new();
        hasher.update(&canonical);
        Ok(format!("{:x}", hasher.finalize()))
    }
}

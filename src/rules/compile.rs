use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

use super::{CalendarCheck, EntityRules, IntentKeywordRule, PhraseBoostRule, RuleSet};
use crate::model::{EntityType, Intent};

static BUILTIN: LazyLock<CompiledRules> = LazyLock::new(|| {
    CompiledRules::compile(RuleSet::builtin()).expect("valid builtin rule set")
});

pub fn builtin() -> &'static CompiledRules {
    &BUILTIN
}

#[derive(Debug, Clone)]
pub struct CompiledIntentPattern {
    pub intent: Intent,
    pub regex: Regex,
    pub weight: u32,
}

#[derive(Debug, Clone)]
pub struct CompiledEntityPattern {
    pub name: String,
    pub entity_type: EntityType,
    pub regex: Regex,
    pub base_confidence: f64,
    pub calendar_check: Option<CalendarCheck>,
    pub strip_leading_filler: bool,
}

#[derive(Debug, Clone)]
pub struct CompiledRules {
    rules: RuleSet,
    fingerprint: String,
    stop_words: Option<Regex>,
    intent_patterns: Vec<CompiledIntentPattern>,
    entity_patterns: Vec<CompiledEntityPattern>,
    keyword_vocabulary: Option<Regex>,
    vague_terms: Option<Regex>,
    specific_action_keywords: Option<Regex>,
}

impl CompiledRules {
    pub fn compile(rules: RuleSet) -> Result<Self> {
        let fingerprint = rules.fingerprint()?;

        let stop_words = word_set_regex(&rules.stop_words, false)
            .context("failed to compile stop word list")?;

        let mut intent_patterns = Vec::with_capacity(rules.intent_patterns.len());
        for (index, rule) in rules.intent_patterns.iter().enumerate() {
            let regex = Regex::new(&rule.pattern).with_context(|| {
                format!(
                    "failed to compile intent pattern #{index} for {}: {}",
                    rule.intent, rule.pattern
                )
            })?;
            intent_patterns.push(CompiledIntentPattern {
                intent: rule.intent,
                regex,
                weight: rule.weight,
            });
        }

        let mut entity_patterns = Vec::with_capacity(rules.entities.patterns.len());
        for rule in &rules.entities.patterns {
            let regex = Regex::new(&rule.pattern).with_context(|| {
                format!(
                    "failed to compile entity pattern {} ({}): {}",
                    rule.name, rule.entity_type, rule.pattern
                )
            })?;
            if regex.capture_names().all(|name| name != Some("value")) {
                anyhow::bail!(
                    "entity pattern {} ({}) has no `value` capture group",
                    rule.name,
                    rule.entity_type
                );
            }
            entity_patterns.push(CompiledEntityPattern {
                name: rule.name.clone(),
                entity_type: rule.entity_type,
                regex,
                base_confidence: rule.base_confidence,
                calendar_check: rule.calendar_check,
                strip_leading_filler: rule.strip_leading_filler,
            });
        }

        let keyword_vocabulary = word_set_regex(&rules.entities.keyword_vocabulary, true)
            .context("failed to compile keyword vocabulary")?;
        let vague_terms = word_set_regex(&rules.confidence.vague_terms, true)
            .context("failed to compile vague term list")?;
        let specific_action_keywords =
            word_set_regex(&rules.confidence.specific_action_keywords, true)
                .context("failed to compile specific action keyword list")?;

        Ok(Self {
            rules,
            fingerprint,
            stop_words,
            intent_patterns,
            entity_patterns,
            keyword_vocabulary,
            vague_terms,
            specific_action_keywords,
        })
    }

    pub fn rule_set(&self) -> &RuleSet {
        &self.rules
    }

    pub fn version(&self) -> &str {
        &self.rules.version
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn stop_words(&self) -> Option<&Regex> {
        self.stop_words.as_ref()
    }

    pub fn intent_keywords(&self) -> &[IntentKeywordRule] {
        &self.rules.intent_keywords
    }

    pub fn intent_patterns(&self) -> &[CompiledIntentPattern] {
        &self.intent_patterns
    }

    pub fn phrase_boosts(&self) -> &[PhraseBoostRule] {
        &self.rules.phrase_boosts
    }

    pub fn entity_rules(&self) -> &EntityRules {
        &self.rules.entities
    }

    pub fn entity_patterns(
        &self,
        entity_type: EntityType,
    ) -> impl Iterator<Item = &CompiledEntityPattern> {
        self.entity_patterns
            .iter()
            .filter(move |pattern| pattern.entity_type == entity_type)
    }

    pub fn keyword_vocabulary(&self) -> Option<&Regex> {
        self.keyword_vocabulary.as_ref()
    }

    pub fn vague_terms(&self) -> Option<&Regex> {
        self.vague_terms.as_ref()
    }

    pub fn specific_action_keywords(&self) -> Option<&Regex> {
        self.specific_action_keywords.as_ref()
    }
}

fn word_set_regex(words: &[String], case_insensitive: bool) -> Result<Option<Regex>> {
    let mut terms = words
        .iter()
        .map(|word| word.trim().to_lowercase())
        .filter(|word| !word.is_empty())
        .collect::<Vec<String>>();
    if terms.is_empty() {
        return Ok(None);
    }
    terms.sort_by(|left, right| right.len().cmp(&left.len()).then(left.cmp(right)));
    terms.dedup();

    let alternation = terms
        .iter()
        .map(|term| {
            term.split_whitespace()
                .map(regex::escape)
                .collect::<Vec<String>>()
                .join(r"\s+")
        })
        .collect::<Vec<String>>()
        .join("|");
    let flags = if case_insensitive { "(?i)" } else { "" };
    let pattern = format!(r"{flags}\b(?:{alternation})\b");

    Regex::new(&pattern)
        .map(Some)
        .with_context(|| format!("invalid word list pattern: {pattern}"))
}

use serde::Serialize;
use tracing::debug;

use crate::model::Intent;
use crate::rules::CompiledRules;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IntentScores {
    pub filter: u32,
    pub search: u32,
    pub navigate: u32,
    pub manage: u32,
}

impl IntentScores {
    pub fn get(&self, intent: Intent) -> u32 {
        match intent {
            Intent::Filter => self.filter,
            Intent::Search => self.search,
            Intent::Navigate => self.navigate,
            Intent::Manage => self.manage,
            Intent::Unknown => 0,
        }
    }

    fn add(&mut self, intent: Intent, weight: u32) {
        let slot = match intent {
            Intent::Filter => &mut self.filter,
            Intent::Search => &mut self.search,
            Intent::Navigate => &mut self.navigate,
            Intent::Manage => &mut self.manage,
            Intent::Unknown => return,
        };
        *slot = slot.saturating_add(weight);
    }

    pub fn best(&self) -> Intent {
        let mut best = Intent::Unknown;
        let mut best_score = 0;
        for intent in Intent::SCORED {
            let score = self.get(intent);
            if score > best_score {
                best = intent;
                best_score = score;
            }
        }
        best
    }
}

pub fn normalize_query(rules: &CompiledRules, query: &str) -> String {
    let collapsed = collapse_whitespace(&query.to_lowercase());
    match rules.stop_words() {
        Some(stop_words) => collapse_whitespace(&stop_words.replace_all(&collapsed, " ")),
        None => collapsed,
    }
}

pub fn score_intents(rules: &CompiledRules, query: &str) -> IntentScores {
    let normalized = normalize_query(rules, query);
    let mut scores = IntentScores::default();
    if normalized.is_empty() {
        return scores;
    }

    for rule in rules.intent_keywords() {
        for keyword in &rule.keywords {
            if normalized.contains(keyword.as_str()) {
                scores.add(rule.intent, rule.weight);
            }
        }
    }

    for pattern in rules.intent_patterns() {
        if pattern.regex.is_match(&normalized) {
            scores.add(pattern.intent, pattern.weight);
        }
    }

    for boost in rules.phrase_boosts() {
        let all_present = boost
            .all_of
            .iter()
            .all(|term| normalized.contains(term.as_str()));
        let any_present = boost.any_of.is_empty()
            || boost
                .any_of
                .iter()
                .any(|term| normalized.contains(term.as_str()));
        if all_present && any_present {
            scores.add(boost.intent, boost.weight);
        }
    }

    scores
}

pub fn classify_intent(rules: &CompiledRules, query: &str) -> Intent {
    let scores = score_intents(rules, query);
    let intent = scores.best();
    debug!(
        intent = %intent,
        filter = scores.filter,
        search = scores.search,
        navigate = scores.navigate,
        manage = scores.manage,
        "scored intents"
    );
    intent
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<&str>>().join(" ")
}

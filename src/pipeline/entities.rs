use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use tracing::trace;

use crate::model::{Entity, EntityType, Span};
use crate::rules::{CalendarCheck, CompiledRules};

static CONJUNCT_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|\s+and\s+)(?:(?:a|an|the|my|some|any)\s+)?(?P<item>[\p{L}\p{N}'-]+)")
        .expect("valid conjunct item regex")
});

static CONJUNCTION_GAP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:,\s*(?:and\s+)?|and\s+)(?:(?:a|an|the|my|some|any)\s+)?$")
        .expect("valid conjunction gap regex")
});

pub fn extract_entities(rules: &CompiledRules, query: &str) -> Vec<Entity> {
    if query.trim().is_empty() {
        return Vec::new();
    }

    let dates = extract_dates(rules, query);
    let mut entities = extract_keywords(rules, query, &dates);
    entities.extend(dates);
    entities.extend(extract_locations(rules, query));
    entities.extend(extract_albums(rules, query));

    trace!(count = entities.len(), "extracted entities");
    entities
}

pub fn extract_parameters(entities: &[Entity]) -> BTreeMap<String, Vec<String>> {
    let mut parameters = BTreeMap::<String, Vec<String>>::new();
    for entity in entities {
        parameters
            .entry(entity.entity_type.parameter_group().to_string())
            .or_default()
            .push(entity.value.clone());
    }
    parameters
}

#[derive(Debug, Clone)]
struct KeywordCandidate {
    start: usize,
    end: usize,
    base_confidence: f64,
}

fn extract_keywords(rules: &CompiledRules, query: &str, dates: &[Entity]) -> Vec<Entity> {
    let settings = rules.entity_rules();
    let vague_terms = &rules.rule_set().confidence.vague_terms;
    let mut candidates = Vec::<KeywordCandidate>::new();

    if let Some(vocabulary) = rules.keyword_vocabulary() {
        for found in vocabulary.find_iter(query) {
            candidates.push(KeywordCandidate {
                start: found.start(),
                end: found.end(),
                base_confidence: settings.keyword_vocabulary_confidence,
            });
        }
    }

    for pattern in rules.entity_patterns(EntityType::Keyword) {
        for captures in pattern.regex.captures_iter(query) {
            let Some(list) = captures.name("value") else {
                continue;
            };
            for item_captures in CONJUNCT_ITEM.captures_iter(list.as_str()) {
                let Some(item) = item_captures.name("item") else {
                    continue;
                };
                let text = item.as_str();
                let skipped = contains_word(&settings.keyword_skip_words, text)
                    || contains_word(vague_terms, text);
                if skipped || text.chars().all(|character| character.is_numeric()) {
                    continue;
                }
                let start = list.start() + item.start();
                let end = list.start() + item.end();
                let span = char_span(query, start, end);
                if dates.iter().any(|date| date.span.overlaps(&span)) {
                    continue;
                }
                candidates.push(KeywordCandidate {
                    start,
                    end,
                    base_confidence: pattern.base_confidence,
                });
            }
        }
    }

    candidates.sort_by(|left, right| {
        left.start
            .cmp(&right.start)
            .then(right.base_confidence.total_cmp(&left.base_confidence))
    });

    let mut accepted = Vec::<KeywordCandidate>::new();
    for candidate in candidates {
        let overlaps = accepted
            .last()
            .map(|previous| candidate.start < previous.end)
            .unwrap_or(false);
        if !overlaps {
            accepted.push(candidate);
        }
    }

    let mut entities = Vec::with_capacity(accepted.len());
    let mut chain_index = 0_usize;
    let mut previous: Option<(&KeywordCandidate, f64)> = None;
    for candidate in &accepted {
        let chained = previous
            .map(|(prior, _)| CONJUNCTION_GAP.is_match(&query[prior.end..candidate.start]))
            .unwrap_or(false);

        let confidence = match previous {
            Some((_, prior_confidence)) if chained => {
                chain_index += 1;
                let decayed = (candidate.base_confidence
                    - settings.keyword_list_decay * chain_index as f64)
                    .max(settings.keyword_min_confidence);
                decayed.min(prior_confidence)
            }
            _ => {
                chain_index = 0;
                candidate.base_confidence
            }
        };

        let value = lowercase_per_char(&query[candidate.start..candidate.end]);
        entities.push(build_entity(
            query,
            EntityType::Keyword,
            candidate.start,
            candidate.end,
            value,
            confidence,
        ));
        previous = Some((candidate, confidence));
    }

    entities
}

fn extract_dates(rules: &CompiledRules, query: &str) -> Vec<Entity> {
    let mut entities = Vec::new();
    let mut accepted_texts = Vec::<String>::new();

    for pattern in rules.entity_patterns(EntityType::Date) {
        let higher_priority = accepted_texts.clone();

        for captures in pattern.regex.captures_iter(query) {
            let Some(found) = captures.name("value") else {
                continue;
            };
            let text = found.as_str().trim();
            if text.is_empty() {
                continue;
            }

            if let Some(check) = pattern.calendar_check {
                if !is_calendar_date(check, text) {
                    trace!(rule = %pattern.name, value = text, "rejected non-calendar date");
                    continue;
                }
            }

            let lowered = text.to_lowercase();
            let suppressed = higher_priority
                .iter()
                .any(|accepted| accepted.contains(&lowered) || lowered.contains(accepted.as_str()));
            if suppressed {
                continue;
            }

            entities.push(build_entity(
                query,
                EntityType::Date,
                found.start(),
                found.start() + text.len(),
                text.to_string(),
                pattern.base_confidence,
            ));
            accepted_texts.push(lowered);
        }
    }

    entities
}

fn is_calendar_date(check: CalendarCheck, text: &str) -> bool {
    match check {
        CalendarCheck::IsoDate => NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok(),
        CalendarCheck::MonthDayYear => parse_month_day_year(text).is_some(),
    }
}

fn parse_month_day_year(text: &str) -> Option<NaiveDate> {
    let cleaned = text.replace([',', '.'], " ");
    let mut tokens = cleaned.split_whitespace();

    let month_name = tokens.next()?.to_ascii_lowercase();
    let day_token = tokens.next()?;
    let year_token = tokens.next()?;

    let month = match month_name.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    let day = day_token
        .trim_end_matches(|character: char| character.is_ascii_alphabetic())
        .parse::<u32>()
        .ok()?;
    let year = year_token.parse::<i32>().ok()?;

    NaiveDate::from_ymd_opt(year, month, day)
}

fn extract_locations(rules: &CompiledRules, query: &str) -> Vec<Entity> {
    let stop_words = &rules.entity_rules().location_stop_words;
    let mut entities = Vec::<Entity>::new();

    for pattern in rules.entity_patterns(EntityType::Location) {
        for captures in pattern.regex.captures_iter(query) {
            let Some(found) = captures.name("value") else {
                continue;
            };

            let words = word_spans(found.as_str());
            let kept = words
                .iter()
                .take_while(|(start, end)| !contains_word(stop_words, &found.as_str()[*start..*end]))
                .count();
            if kept == 0 {
                continue;
            }

            let start = found.start() + words[0].0;
            let end = found.start() + words[kept - 1].1;
            let entity = build_entity(
                query,
                EntityType::Location,
                start,
                end,
                query[start..end].to_string(),
                pattern.base_confidence,
            );
            if !entities.iter().any(|other| other.span.overlaps(&entity.span)) {
                entities.push(entity);
            }
        }
    }

    entities
}

fn extract_albums(rules: &CompiledRules, query: &str) -> Vec<Entity> {
    let settings = rules.entity_rules();
    let mut entities = Vec::<Entity>::new();

    for pattern in rules.entity_patterns(EntityType::Album) {
        for captures in pattern.regex.captures_iter(query) {
            let Some(found) = captures.name("value") else {
                continue;
            };

            let words = word_spans(found.as_str());
            let first = if pattern.strip_leading_filler {
                words.iter().position(|(start, end)| {
                    !contains_word(&settings.album_leading_filler, &found.as_str()[*start..*end])
                })
            } else {
                (!words.is_empty()).then_some(0)
            };
            let Some(first) = first else {
                continue;
            };
            let kept = words[first..]
                .iter()
                .take_while(|(start, end)| {
                    !contains_word(
                        &settings.album_trailing_stop_words,
                        &found.as_str()[*start..*end],
                    )
                })
                .count();
            if kept == 0 {
                continue;
            }

            let raw_start = found.start() + words[first].0;
            let raw_end = found.start() + words[first + kept - 1].1;
            let Some((start, end)) = trim_quotes(query, raw_start, raw_end) else {
                continue;
            };
            let entity = build_entity(
                query,
                EntityType::Album,
                start,
                end,
                query[start..end].to_string(),
                pattern.base_confidence,
            );
            if !entities.iter().any(|other| other.span.overlaps(&entity.span)) {
                entities.push(entity);
            }
        }
    }

    entities
}

fn trim_quotes(query: &str, start: usize, end: usize) -> Option<(usize, usize)> {
    let slice = &query[start..end];
    let leading = slice.len() - slice.trim_start_matches(['\'', '"']).len();
    let trimmed = slice.trim_matches(['\'', '"']);
    if trimmed.is_empty() {
        return None;
    }
    let new_start = start + leading;
    Some((new_start, new_start + trimmed.len()))
}

fn word_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut word_start = None;
    for (index, character) in text.char_indices() {
        if character.is_whitespace() {
            if let Some(start) = word_start.take() {
                spans.push((start, index));
            }
        } else if word_start.is_none() {
            word_start = Some(index);
        }
    }
    if let Some(start) = word_start {
        spans.push((start, text.len()));
    }
    spans
}

fn contains_word(list: &[String], word: &str) -> bool {
    list.iter().any(|entry| entry.eq_ignore_ascii_case(word))
}

// Characters whose lowercase form is longer ("İ") are kept as written so the
// value stays as long as its span.
fn lowercase_per_char(text: &str) -> String {
    text.chars()
        .map(|character| {
            let mut lower = character.to_lowercase();
            match (lower.next(), lower.next()) {
                (Some(single), None) => single,
                _ => character,
            }
        })
        .collect()
}

fn char_span(query: &str, byte_start: usize, byte_end: usize) -> Span {
    let start = query[..byte_start].chars().count();
    let end = start + query[byte_start..byte_end].chars().count();
    Span { start, end }
}

fn build_entity(
    query: &str,
    entity_type: EntityType,
    byte_start: usize,
    byte_end: usize,
    value: String,
    confidence: f64,
) -> Entity {
    Entity {
        entity_type,
        value,
        confidence: confidence.clamp(0.0, 1.0),
        span: char_span(query, byte_start, byte_end),
    }
}

#[cfg(test)]
mod tests {
    use super::{extract_entities, extract_parameters, parse_month_day_year};
    use crate::model::{Entity, EntityType};
    use crate::rules::builtin;

    fn of_type(entities: &[Entity], entity_type: EntityType) -> Vec<&Entity> {
        entities
            .iter()
            .filter(|entity| entity.entity_type == entity_type)
            .collect()
    }

    #[test]
    fn iso_date_suppresses_bare_year_duplicate() {
        let entities = extract_entities(builtin(), "photos from 2023-01-15");
        let dates = of_type(&entities, EntityType::Date);
        assert_eq!(dates.len(), 1);
        assert_eq!(dates[0].value, "2023-01-15");
        assert_eq!(dates[0].span.start, 12);
        assert_eq!(dates[0].span.end, 22);
    }

    #[test]
    fn month_name_date_suppresses_its_year() {
        let entities = extract_entities(builtin(), "pictures from March 3rd, 2021 please");
        let dates = of_type(&entities, EntityType::Date);
        assert_eq!(dates.len(), 1);
        assert_eq!(dates[0].value, "March 3rd, 2021");
        assert!(of_type(&entities, EntityType::Location).is_empty());
    }

    #[test]
    fn impossible_iso_date_falls_back_to_year() {
        let entities = extract_entities(builtin(), "photos from 2023-13-45");
        let dates = of_type(&entities, EntityType::Date);
        assert_eq!(dates.len(), 1);
        assert_eq!(dates[0].value, "2023");
    }

    #[test]
    fn relative_dates_and_years_coexist() {
        let entities = extract_entities(builtin(), "beach photos from last summer and 2019");
        let values = of_type(&entities, EntityType::Date)
            .into_iter()
            .map(|entity| entity.value.as_str())
            .collect::<Vec<&str>>();
        assert_eq!(values, vec!["2019", "last summer"]);
    }

    #[test]
    fn conjunctive_keywords_decay_monotonically() {
        let entities = extract_entities(builtin(), "sunset and beach and mountain");
        let keywords = of_type(&entities, EntityType::Keyword);
        let values = keywords
            .iter()
            .map(|entity| entity.value.as_str())
            .collect::<Vec<&str>>();
        assert_eq!(values, vec!["sunset", "beach", "mountain"]);
        assert!(keywords[0].confidence > keywords[1].confidence);
        assert!(keywords[1].confidence > keywords[2].confidence);
    }

    #[test]
    fn subject_list_yields_one_keyword_per_conjunct() {
        let entities = extract_entities(builtin(), "photos with tulips and the daisies");
        let keywords = of_type(&entities, EntityType::Keyword);
        let values = keywords
            .iter()
            .map(|entity| entity.value.as_str())
            .collect::<Vec<&str>>();
        assert_eq!(values, vec!["tulips", "daisies"]);
        assert!(keywords[1].confidence < keywords[0].confidence);
    }

    #[test]
    fn subject_list_skips_pronouns_and_numbers() {
        let entities = extract_entities(builtin(), "photos of me and 42");
        assert!(of_type(&entities, EntityType::Keyword).is_empty());
    }

    #[test]
    fn location_stops_at_photo_noun() {
        let query = "holiday taken in Lisbon Pictures.";
        let entities = extract_entities(builtin(), query);
        let locations = of_type(&entities, EntityType::Location);
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].value, "Lisbon");
        assert_eq!(locations[0].span.slice(query), "Lisbon");
    }

    #[test]
    fn location_requires_capitalized_place() {
        let entities = extract_entities(builtin(), "photos from the beach at night");
        assert!(of_type(&entities, EntityType::Location).is_empty());
    }

    #[test]
    fn album_suffix_drops_leading_filler() {
        let entities = extract_entities(builtin(), "open vacation album");
        let albums = of_type(&entities, EntityType::Album);
        assert_eq!(albums.len(), 1);
        assert_eq!(albums[0].value, "vacation");
        assert_eq!(albums[0].span.start, 5);
    }

    #[test]
    fn calendar_names_are_not_places() {
        for query in [
            "photos from Monday",
            "beach pictures taken in June",
            "go to the album called 'Road Trip' from June 5, 2021",
        ] {
            let entities = extract_entities(builtin(), query);
            assert!(
                of_type(&entities, EntityType::Location).is_empty(),
                "query {query:?} gave {entities:?}"
            );
        }

        let entities = extract_entities(builtin(), "photos from Paris on Friday");
        let locations = of_type(&entities, EntityType::Location);
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].value, "Paris");
    }

    #[test]
    fn subject_list_skips_vague_and_date_words() {
        let entities = extract_entities(builtin(), "show me photos of stuff");
        assert!(entities.is_empty(), "{entities:?}");

        let entities = extract_entities(builtin(), "photos of last summer");
        assert!(of_type(&entities, EntityType::Keyword).is_empty());
        let dates = of_type(&entities, EntityType::Date);
        assert_eq!(dates.len(), 1);
        assert_eq!(dates[0].value, "last summer");

        let entities = extract_entities(builtin(), "photos of everything");
        assert!(of_type(&entities, EntityType::Keyword).is_empty());
    }

    #[test]
    fn album_suffix_drops_management_verbs() {
        for (query, expected) in [
            ("delete my vacation album", "vacation"),
            ("rename the wedding album", "wedding"),
            ("remove the beach album", "beach"),
            ("trash that party album", "party"),
        ] {
            let entities = extract_entities(builtin(), query);
            let albums = of_type(&entities, EntityType::Album);
            assert_eq!(albums.len(), 1, "query {query:?}");
            assert_eq!(albums[0].value, expected, "query {query:?}");
            assert_eq!(albums[0].span.slice(query), expected);
        }
    }

    #[test]
    fn album_followed_by_preposition_is_not_named() {
        let entities = extract_entities(builtin(), "show the album from 2022");
        assert!(of_type(&entities, EntityType::Album).is_empty());
        let dates = of_type(&entities, EntityType::Date);
        assert_eq!(dates.len(), 1);
        assert_eq!(dates[0].value, "2022");
    }

    #[test]
    fn keyword_value_keeps_span_length_for_expanding_lowercase() {
        let query = "photos with İstanbul";
        let entities = extract_entities(builtin(), query);
        let keywords = of_type(&entities, EntityType::Keyword);
        assert_eq!(keywords.len(), 1);
        assert_eq!(keywords[0].value, "İstanbul");
        assert_eq!(
            keywords[0].span.end - keywords[0].span.start,
            keywords[0].value.chars().count()
        );
    }

    #[test]
    fn album_called_stops_at_trailing_filler() {
        let query = "open the album called 'Summer Trip' from 2022";
        let entities = extract_entities(builtin(), query);
        let albums = of_type(&entities, EntityType::Album);
        assert_eq!(albums.len(), 1);
        assert_eq!(albums[0].value, "Summer Trip");
        assert_eq!(albums[0].span.slice(query), "Summer Trip");
    }

    #[test]
    fn spans_point_into_original_text_for_non_ascii_queries() {
        let query = "Ünïcödé sunset from Zürich";
        for entity in extract_entities(builtin(), query) {
            assert!(
                entity
                    .span
                    .slice(query)
                    .eq_ignore_ascii_case(&entity.value),
                "span {:?} does not cover {}",
                entity.span,
                entity.value
            );
        }
    }

    #[test]
    fn repeated_extraction_does_not_skip_matches() {
        let query = "sunset and beach photos from 2021 in Lisbon";
        let first = extract_entities(builtin(), query);
        for _ in 0..5 {
            assert_eq!(extract_entities(builtin(), query), first);
        }
        assert_eq!(first.len(), 4);
    }

    #[test]
    fn parameters_group_by_plural_type_in_insertion_order() {
        let entities = extract_entities(builtin(), "beach and sunset photos from 2020 and 2021");
        let parameters = extract_parameters(&entities);
        assert_eq!(parameters["keywords"], vec!["beach", "sunset"]);
        assert_eq!(parameters["dates"], vec!["2020", "2021"]);
        assert!(!parameters.contains_key("albums"));
    }

    #[test]
    fn month_day_year_rejects_impossible_days() {
        assert!(parse_month_day_year("Feb 30 2023").is_none());
        assert!(parse_month_day_year("February 28th, 2023").is_some());
    }
}

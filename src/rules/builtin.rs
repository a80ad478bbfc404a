use super::{
    CalendarCheck, ConfidenceSettings, EntityPatternRule, EntityRules, IntentKeywordRule,
    IntentPatternRule, PhraseBoostRule, RULESET_VERSION, RuleSet,
};
use crate::model::{EntityType, Intent};

const KEYWORD_WEIGHT: u32 = 1;
const PATTERN_WEIGHT: u32 = 2;
const BOOST_WEIGHT: u32 = 1;
const CREATE_ALBUM_WEIGHT: u32 = 4;

const KEYWORD_VOCABULARY_CONFIDENCE: f64 = 0.8;
const KEYWORD_LIST_CONFIDENCE: f64 = 0.7;
const KEYWORD_LIST_DECAY: f64 = 0.05;
const KEYWORD_MIN_CONFIDENCE: f64 = 0.5;
const DATE_CONFIDENCE: f64 = 0.9;
const LOCATION_CONFIDENCE: f64 = 0.65;
const ALBUM_SUFFIX_CONFIDENCE: f64 = 0.85;
const ALBUM_NAMED_CONFIDENCE: f64 = 0.8;

const MONTH_NAMES: &[&str] = &[
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december", "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep",
    "sept", "oct", "nov", "dec",
];
const WEEKDAY_NAMES: &[&str] = &[
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday", "weekend",
];

const PHOTO_NOUNS: &str = "photos|pictures|pics|images|photo|picture|pic|image";

pub(super) fn rule_set() -> RuleSet {
    RuleSet {
        version: RULESET_VERSION.to_string(),
        stop_words: words(&[
            "um", "uh", "please", "hey", "can", "could", "would", "you know", "like",
        ]),
        intent_keywords: intent_keywords(),
        intent_patterns: intent_patterns(),
        phrase_boosts: phrase_boosts(),
        entities: entity_rules(),
        confidence: ConfidenceSettings {
            base: 0.6,
            vague_terms: words(&["stuff", "things"]),
            vague_confidence: 0.5,
            specific_action_keywords: words(&[
                "filter", "search", "find", "show", "open", "delete", "upload",
            ]),
            specific_action_boost: 0.15,
            entity_weight: 0.3,
            short_query_chars: 5,
            short_query_penalty: 0.2,
            long_query_chars: 200,
            long_query_penalty: 0.1,
            floor_trigger: 0.3,
            floor_value: 0.4,
            clarification_threshold: 0.5,
        },
    }
}

fn intent_keywords() -> Vec<IntentKeywordRule> {
    let table: [(Intent, &[&str]); 4] = [
        (
            Intent::Filter,
            &[
                "filter",
                "containing",
                "contains",
                "with",
                "only",
                "tagged",
                "that have",
                "where",
            ],
        ),
        (
            Intent::Search,
            &[
                "search", "find", "show", "look for", "photos", "pictures", "pics", "images",
            ],
        ),
        (
            Intent::Navigate,
            &["open", "go to", "navigate", "album", "browse"],
        ),
        (
            Intent::Manage,
            &[
                "delete", "remove", "upload", "rename", "move", "edit", "organize", "trash",
            ],
        ),
    ];

    table
        .into_iter()
        .map(|(intent, keywords)| IntentKeywordRule {
            intent,
            keywords: words(keywords),
            weight: KEYWORD_WEIGHT,
        })
        .collect()
}

fn intent_patterns() -> Vec<IntentPatternRule> {
    let table = [
        (Intent::Filter, r"\bfilter(?:ed)?\b".to_string()),
        (
            Intent::Filter,
            format!(r"\b(?:{PHOTO_NOUNS})\s+(?:with|containing|that have|tagged)\b"),
        ),
        (
            Intent::Filter,
            format!(r"\bonly\b.*\b(?:{PHOTO_NOUNS})\b"),
        ),
        (Intent::Search, r"\b(?:search|find|look for|looking for)\b".to_string()),
        (
            Intent::Search,
            format!(r"\bshow\s+(?:me\s+)?(?:(?:all|my|the|some)\s+)*(?:{PHOTO_NOUNS})\b"),
        ),
        (
            Intent::Search,
            format!(r"\b(?:{PHOTO_NOUNS})\s+(?:of|from|taken)\b"),
        ),
        (
            Intent::Navigate,
            r"\b(?:open|go to|navigate to|browse|view)\b.*\balbum\b".to_string(),
        ),
        (Intent::Navigate, r"\balbum\s+(?:called|named)\b".to_string()),
        (Intent::Manage, r"\b(?:delete|remove|trash)\b".to_string()),
        (Intent::Manage, r"\b(?:upload|rename|move|organize)\b".to_string()),
    ];

    // "create a new album called X" also matches both navigate album rules.
    let create_album = IntentPatternRule {
        intent: Intent::Manage,
        pattern: r"\b(?:create|make)\s+(?:an?\s+)?(?:new\s+)?album\b".to_string(),
        weight: CREATE_ALBUM_WEIGHT,
    };

    table
        .into_iter()
        .map(|(intent, pattern)| IntentPatternRule {
            intent,
            pattern,
            weight: PATTERN_WEIGHT,
        })
        .chain(std::iter::once(create_album))
        .collect()
}

fn phrase_boosts() -> Vec<PhraseBoostRule> {
    vec![
        PhraseBoostRule {
            intent: Intent::Search,
            all_of: words(&["show"]),
            any_of: words(&["pics", "photos", "pictures"]),
            weight: BOOST_WEIGHT,
        },
        PhraseBoostRule {
            intent: Intent::Filter,
            all_of: words(&["display", "containing"]),
            any_of: Vec::new(),
            weight: BOOST_WEIGHT,
        },
        PhraseBoostRule {
            intent: Intent::Navigate,
            all_of: words(&["open", "album"]),
            any_of: Vec::new(),
            weight: BOOST_WEIGHT,
        },
    ]
}

fn entity_rules() -> EntityRules {
    let determiner = r"(?:(?:a|an|the|my|some|any)\s+)?";
    let item = r"[\p{L}\p{N}'-]+";

    let patterns = vec![
        EntityPatternRule {
            name: "subject_list".to_string(),
            entity_type: EntityType::Keyword,
            pattern: format!(
                r"(?i)\b(?:with|of|containing|featuring|showing|tagged(?:\s+with)?)\s+(?P<value>{determiner}{item}(?:\s+and\s+{determiner}{item})*)"
            ),
            base_confidence: KEYWORD_LIST_CONFIDENCE,
            calendar_check: None,
            strip_leading_filler: false,
        },
        EntityPatternRule {
            name: "iso_date".to_string(),
            entity_type: EntityType::Date,
            pattern: r"\b(?P<value>\d{4}-\d{2}-\d{2})\b".to_string(),
            base_confidence: DATE_CONFIDENCE,
            calendar_check: Some(CalendarCheck::IsoDate),
            strip_leading_filler: false,
        },
        EntityPatternRule {
            name: "month_day_year".to_string(),
            entity_type: EntityType::Date,
            pattern: r"(?i)\b(?P<value>(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?\s+\d{1,2}(?:st|nd|rd|th)?,?\s+\d{4})\b".to_string(),
            base_confidence: DATE_CONFIDENCE,
            calendar_check: Some(CalendarCheck::MonthDayYear),
            strip_leading_filler: false,
        },
        EntityPatternRule {
            name: "bare_year".to_string(),
            entity_type: EntityType::Date,
            pattern: r"\b(?P<value>(?:19|20)\d{2})\b".to_string(),
            base_confidence: DATE_CONFIDENCE,
            calendar_check: None,
            strip_leading_filler: false,
        },
        EntityPatternRule {
            name: "relative_date".to_string(),
            entity_type: EntityType::Date,
            pattern: r"(?i)\b(?P<value>(?:last|this|next)\s+(?:year|month|week|weekend|summer|winter|spring|fall|autumn)|yesterday|today)\b".to_string(),
            base_confidence: DATE_CONFIDENCE,
            calendar_check: None,
            strip_leading_filler: false,
        },
        EntityPatternRule {
            name: "preposition_place".to_string(),
            entity_type: EntityType::Location,
            pattern: r"\b(?i:taken\s+in|in|from|at)\s+(?P<value>\p{Lu}[\p{L}'-]*(?:[ \t]+\p{Lu}[\p{L}'-]*)*)".to_string(),
            base_confidence: LOCATION_CONFIDENCE,
            calendar_check: None,
            strip_leading_filler: false,
        },
        EntityPatternRule {
            name: "album_suffix".to_string(),
            entity_type: EntityType::Album,
            pattern: format!(r"(?i)\b(?P<value>{item}(?:\s+{item}){{0,2}})\s+album\b"),
            base_confidence: ALBUM_SUFFIX_CONFIDENCE,
            calendar_check: None,
            strip_leading_filler: true,
        },
        EntityPatternRule {
            name: "album_named".to_string(),
            entity_type: EntityType::Album,
            pattern: format!(
                r#"(?i)\balbum\s+(?:(?:called|named)\s+)?["']?(?P<value>{item}(?:\s+{item}){{0,3}})"#
            ),
            base_confidence: ALBUM_NAMED_CONFIDENCE,
            calendar_check: None,
            strip_leading_filler: false,
        },
    ];

    EntityRules {
        keyword_vocabulary: words(&[
            "sunset",
            "sunrise",
            "beach",
            "ocean",
            "sea",
            "mountain",
            "mountains",
            "forest",
            "lake",
            "river",
            "snow",
            "city",
            "cityscape",
            "landscape",
            "portrait",
            "family",
            "friends",
            "wedding",
            "birthday",
            "party",
            "vacation",
            "holiday",
            "travel",
            "dog",
            "dogs",
            "cat",
            "cats",
            "pets",
            "food",
            "flowers",
            "nature",
            "night",
            "sky",
            "clouds",
            "selfie",
            "kids",
            "baby",
            "car",
            "architecture",
        ]),
        keyword_vocabulary_confidence: KEYWORD_VOCABULARY_CONFIDENCE,
        keyword_list_decay: KEYWORD_LIST_DECAY,
        keyword_min_confidence: KEYWORD_MIN_CONFIDENCE,
        keyword_skip_words: words(&[
            "me", "us", "them", "it", "this", "that", "these", "those", "photos", "pictures",
            "pics", "images", "photo", "picture", "pic", "image", "album", "and", "all", "any",
            "every", "everything", "anything", "something", "some", "last", "next", "yesterday",
            "today", "recent",
        ]),
        patterns,
        location_stop_words: [
            &["photos", "pictures", "pics", "images", "photo", "picture", "album"][..],
            MONTH_NAMES,
            WEEKDAY_NAMES,
        ]
        .concat()
        .into_iter()
        .map(str::to_string)
        .collect(),
        album_leading_filler: words(&[
            "open", "show", "view", "browse", "navigate", "go", "to", "into", "in", "from", "the",
            "my", "our", "me", "a", "an", "please", "add", "new", "create", "make", "photos",
            "pictures", "pics", "images", "all", "this", "that", "delete", "remove", "rename",
            "move", "trash", "upload", "edit", "organize",
        ]),
        album_trailing_stop_words: words(&[
            "photos", "pictures", "pics", "images", "from", "with", "in", "and", "of", "for",
            "please", "to", "on", "taken", "that",
        ]),
    }
}

fn words(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

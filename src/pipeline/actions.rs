use std::collections::BTreeSet;

use async_trait::async_trait;
use serde_json::json;

use crate::model::{ActionExample, ActionParameter, ActionReturn, AgentAction, Intent, Permission};

/// Source of the actions a classified intent can be turned into.
#[async_trait]
pub trait ActionRegistry: Send + Sync {
    async fn suggest_actions(&self, intent: Intent) -> Vec<AgentAction>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StaticActionRegistry;

#[async_trait]
impl ActionRegistry for StaticActionRegistry {
    async fn suggest_actions(&self, intent: Intent) -> Vec<AgentAction> {
        actions_for(intent)
    }
}

pub fn actions_for(intent: Intent) -> Vec<AgentAction> {
    match intent {
        Intent::Filter => vec![filter_photos(), advanced_filter()],
        Intent::Search => vec![search_photos(), filter_photos()],
        Intent::Navigate => vec![open_album()],
        Intent::Manage => vec![delete_photos(), upload_photos()],
        Intent::Unknown => Vec::new(),
    }
}

fn parameter(name: &str, param_type: &str, required: bool, description: &str) -> ActionParameter {
    ActionParameter {
        name: name.to_string(),
        param_type: param_type.to_string(),
        required,
        description: description.to_string(),
    }
}

fn permissions(values: &[Permission]) -> BTreeSet<Permission> {
    values.iter().copied().collect()
}

fn filter_photos() -> AgentAction {
    AgentAction {
        id: "filter_photos".to_string(),
        name: "Filter Photos".to_string(),
        description: "Narrow the photo grid to photos whose tags or AI descriptions match keywords"
            .to_string(),
        parameters: vec![parameter(
            "keywords",
            "string[]",
            true,
            "Terms every visible photo must match",
        )],
        returns: ActionReturn {
            return_type: "Photo[]".to_string(),
            description: "Photos matching all keywords".to_string(),
        },
        permissions: permissions(&[Permission::Read]),
        human_equivalent: "Type keywords into the filter bar above the photo grid".to_string(),
        examples: vec![ActionExample {
            description: "Show only sunset photos".to_string(),
            input: json!({ "keywords": ["sunset"] }),
            output: json!({ "count": 12 }),
        }],
    }
}

fn advanced_filter() -> AgentAction {
    AgentAction {
        id: "advanced_filter".to_string(),
        name: "Advanced Filter".to_string(),
        description: "Filter photos by any combination of keywords, dates, locations and albums"
            .to_string(),
        parameters: vec![
            parameter("keywords", "string[]", false, "Subject or scene terms"),
            parameter("dates", "string[]", false, "Dates, years or relative periods"),
            parameter("locations", "string[]", false, "Places the photos were taken"),
            parameter("albums", "string[]", false, "Albums to restrict the filter to"),
        ],
        returns: ActionReturn {
            return_type: "Photo[]".to_string(),
            description: "Photos matching every supplied criterion".to_string(),
        },
        permissions: permissions(&[Permission::Read]),
        human_equivalent: "Open the advanced filter panel and fill in the criteria".to_string(),
        examples: vec![ActionExample {
            description: "Beach photos from 2023 taken in Lisbon".to_string(),
            input: json!({
                "keywords": ["beach"],
                "dates": ["2023"],
                "locations": ["Lisbon"]
            }),
            output: json!({ "count": 4 }),
        }],
    }
}

fn search_photos() -> AgentAction {
    AgentAction {
        id: "search_photos".to_string(),
        name: "Search Photos".to_string(),
        description: "Free-text search across photo titles, tags and AI descriptions".to_string(),
        parameters: vec![
            parameter("query", "string", true, "Text to search for"),
            parameter("limit", "number", false, "Maximum number of results"),
        ],
        returns: ActionReturn {
            return_type: "Photo[]".to_string(),
            description: "Photos ranked by relevance".to_string(),
        },
        permissions: permissions(&[Permission::Read]),
        human_equivalent: "Type into the search box and press enter".to_string(),
        examples: vec![ActionExample {
            description: "Find beach photos".to_string(),
            input: json!({ "query": "beach" }),
            output: json!({ "count": 8 }),
        }],
    }
}

fn open_album() -> AgentAction {
    AgentAction {
        id: "open_album".to_string(),
        name: "Open Album".to_string(),
        description: "Navigate to an album and show its photos".to_string(),
        parameters: vec![parameter(
            "album_name",
            "string",
            true,
            "Name of the album to open",
        )],
        returns: ActionReturn {
            return_type: "Album".to_string(),
            description: "The opened album with its photos".to_string(),
        },
        permissions: permissions(&[Permission::Read]),
        human_equivalent: "Click the album in the album list".to_string(),
        examples: vec![ActionExample {
            description: "Open the vacation album".to_string(),
            input: json!({ "album_name": "vacation" }),
            output: json!({ "album": "vacation", "count": 42 }),
        }],
    }
}

fn delete_photos() -> AgentAction {
    AgentAction {
        id: "delete_photos".to_string(),
        name: "Delete Photos".to_string(),
        description: "Permanently delete the selected photos".to_string(),
        parameters: vec![parameter(
            "photo_ids",
            "string[]",
            true,
            "Identifiers of the photos to delete",
        )],
        returns: ActionReturn {
            return_type: "DeleteResult".to_string(),
            description: "Identifiers that were deleted".to_string(),
        },
        permissions: permissions(&[Permission::Write, Permission::Delete]),
        human_equivalent: "Select the photos and click the trash icon, then confirm".to_string(),
        examples: vec![ActionExample {
            description: "Delete one photo".to_string(),
            input: json!({ "photo_ids": ["p_123"] }),
            output: json!({ "deleted": ["p_123"] }),
        }],
    }
}

fn upload_photos() -> AgentAction {
    AgentAction {
        id: "upload_photos".to_string(),
        name: "Upload Photos".to_string(),
        description: "Upload new photos, optionally into an album".to_string(),
        parameters: vec![
            parameter("files", "File[]", true, "Image files to upload"),
            parameter("album_name", "string", false, "Album to add the uploads to"),
        ],
        returns: ActionReturn {
            return_type: "Photo[]".to_string(),
            description: "The uploaded photos".to_string(),
        },
        permissions: permissions(&[Permission::Write]),
        human_equivalent: "Click Upload and pick files from your device".to_string(),
        examples: vec![ActionExample {
            description: "Upload two photos to the vacation album".to_string(),
            input: json!({ "files": ["a.jpg", "b.jpg"], "album_name": "vacation" }),
            output: json!({ "count": 2 }),
        }],
    }
}

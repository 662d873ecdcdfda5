//! Structured-output schemas sent with each generation request

use crate::story::{BackgroundTheme, Companion, EvolType};
use serde_json::{json, Value};

pub fn scene_schema() -> Value {
    let themes: Vec<&str> = BackgroundTheme::ALL.iter().map(|t| t.as_str()).collect();
    json!({
        "type": "OBJECT",
        "properties": {
            "narrative": {
                "type": "STRING",
                "description": "One paragraph describing the current situation in the N109 Zone with Sylus. Atmospheric, tense, mature."
            },
            "question": {
                "type": "STRING",
                "description": "The decision the user must make."
            },
            "options": {
                "type": "ARRAY",
                "minItems": 2,
                "maxItems": 4,
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "id": { "type": "STRING" },
                        "text": { "type": "STRING", "description": "The action the user takes." },
                        "traitSignal": {
                            "type": "STRING",
                            "description": "One-word personality trait about power dynamics, e.g. Dominance, Submission, Defiance, Seduction."
                        }
                    },
                    "required": ["id", "text", "traitSignal"]
                }
            },
            "backgroundTheme": {
                "type": "STRING",
                "enum": themes,
                "description": "Where the scene takes place."
            }
        },
        "required": ["narrative", "question", "options", "backgroundTheme"]
    })
}

pub fn analysis_schema() -> Value {
    let evol_types: Vec<&str> = EvolType::ALL.iter().map(|e| e.as_str()).collect();
    json!({
        "type": "OBJECT",
        "properties": {
            "hunterTitle": {
                "type": "STRING",
                "description": "A unique title for the user's N109 persona."
            },
            "evolType": { "type": "STRING", "enum": evol_types },
            "description": {
                "type": "STRING",
                "description": "A psychological reading of the user's dynamic with Sylus."
            },
            "notableTraits": { "type": "ARRAY", "items": { "type": "STRING" } },
            "destinedCompanion": { "type": "STRING", "enum": [Companion::Sylus.as_str()] },
            "weapon": {
                "type": "STRING",
                "description": "A weapon that suits the user's style in the N109 Zone."
            },
            "compatibilityRate": {
                "type": "STRING",
                "description": "A percentage string such as 99%."
            }
        },
        "required": [
            "hunterTitle", "evolType", "description", "notableTraits",
            "destinedCompanion", "weapon", "compatibilityRate"
        ]
    })
}

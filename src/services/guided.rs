// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

//! Schema-directed fallback used when a free-form response cannot be parsed.

use std::sync::LazyLock;

use serde_json::{Map, Value, json};

use crate::domain::{ClassificationSchema, ContentCategory};
use crate::services::sanitizer::ResponseSanitizer;

/// JSON Schema of the classification record.
///
/// Sent as the structured-output constraint on the guided re-query, embedded
/// in the guided prompt, and walked by [`fill_from_schema`].
pub static CLASSIFICATION_JSON_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    let entry = json!({
        "type": "object",
        "properties": {
            "Severity": {"type": "string", "enum": ["None", "Mid", "Moderate", "Severe"]},
            "Reason": {"type": "string"}
        },
        "required": ["Severity", "Reason"]
    });

    let categories: Map<String, Value> = ContentCategory::ALL
        .iter()
        .map(|c| (c.label().to_string(), entry.clone()))
        .collect();
    let required: Vec<&str> = ContentCategory::ALL.iter().map(|c| c.label()).collect();

    json!({
        "type": "object",
        "properties": {
            "AgeCategory": {"type": "string", "enum": ["0+", "6+", "12+", "16+", "18+"]},
            "ParentsGuide": {
                "type": "object",
                "properties": categories,
                "required": required
            },
            "Summary": {"type": "string"}
        },
        "required": ["AgeCategory", "ParentsGuide", "Summary"]
    })
});

/// Prompt for the constrained re-query.
pub fn guided_prompt(script: &str, context: &str) -> String {
    format!(
        "Analyze the following movie script fragment and output its age classification as JSON.\n\n\
         Legal context:\n{context}\n\n\
         Script:\n{script}\n\n\
         Output JSON schema:\n{}\n\
         Return only valid JSON.",
        *CLASSIFICATION_JSON_SCHEMA
    )
}

/// Walk the declared shape one level deep: object fields with declared
/// sub-keys become `"Unknown"` per sub-key, arrays become `[]`, anything
/// else becomes `"Unknown"`.
pub fn fill_from_schema(schema: &Value) -> Value {
    let mut filled = Map::new();

    let Some(Value::Object(properties)) = schema.get("properties") else {
        return Value::Object(filled);
    };

    for (key, property) in properties {
        let value = match property.get("type").and_then(Value::as_str) {
            Some("object") => {
                let sub_keys = property
                    .get("properties")
                    .and_then(Value::as_object)
                    .map(|props| {
                        props
                            .keys()
                            .map(|k| (k.clone(), Value::String("Unknown".into())))
                            .collect::<Map<_, _>>()
                    })
                    .unwrap_or_default();
                Value::Object(sub_keys)
            }
            Some("array") => Value::Array(Vec::new()),
            _ => Value::String("Unknown".into()),
        };
        filled.insert(key.clone(), value);
    }

    Value::Object(filled)
}

/// The terminal fallback record: every category `Unknown`.
pub fn unknown_record() -> ClassificationSchema {
    let filled = fill_from_schema(&CLASSIFICATION_JSON_SCHEMA);
    ResponseSanitizer::from_value(&filled)
        .unwrap_or_else(ClassificationSchema::error)
}

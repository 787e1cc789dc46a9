// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::domain::{AgeCategory, ClassificationSchema, ContentCategory, GuideEntry, Severity};

/// Result of reading one model response.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Parsed(ClassificationSchema),
    /// Nothing schema-conformant in the response; carries the reason.
    NeedsFallback(String),
}

static THINK_BLOCK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").unwrap());

/// Balanced candidates tried before giving up on a response.
const MAX_JSON_CANDIDATES: usize = 64;

pub struct ResponseSanitizer;

impl ResponseSanitizer {
    /// Parse a free-text model response into the classification record.
    pub fn parse(raw: &str) -> ParseOutcome {
        let cleaned = THINK_BLOCK_REGEX.replace_all(raw, "");

        let Some(value) = Self::extract_json_object(&cleaned) else {
            return ParseOutcome::NeedsFallback("no JSON object in model response".into());
        };

        match Self::from_value(&value) {
            Ok(record) => ParseOutcome::Parsed(record),
            Err(reason) => ParseOutcome::NeedsFallback(reason),
        }
    }

    /// First balanced `{...}` span that parses as JSON.
    ///
    /// Handles direct JSON, fenced JSON and JSON surrounded by prose. Braces
    /// inside string literals do not count towards nesting.
    pub fn extract_json_object(text: &str) -> Option<Value> {
        let mut search_from = 0;

        for _ in 0..MAX_JSON_CANDIDATES {
            let start = search_from + text[search_from..].find('{')?;
            if let Some(end) = Self::balanced_end(&text[start..]) {
                let candidate = &text[start..start + end];
                if let Ok(value) = serde_json::from_str::<Value>(candidate) {
                    return Some(value);
                }
            }
            search_from = start + 1;
        }

        None
    }

    /// Byte length of the balanced object starting at `text[0] == '{'`.
    fn balanced_end(text: &str) -> Option<usize> {
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;

        for (pos, ch) in text.char_indices() {
            if in_string {
                match ch {
                    _ if escaped => escaped = false,
                    '\\' => escaped = true,
                    '"' => in_string = false,
                    _ => {}
                }
                continue;
            }

            match ch {
                '"' => in_string = true,
                '{' => depth += 1,
                '}' => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(pos + 1);
                    }
                }
                _ => {}
            }
        }

        None
    }

    /// Convert a JSON value into the record, normalizing on the way.
    ///
    /// Errors (schema violations) are: a non-object top level, a missing
    /// or non-object `ParentsGuide`, and a `ParentsGuide` without a single
    /// recognised category. Categories the model left out are filled with
    /// `None`.
    pub fn from_value(value: &Value) -> std::result::Result<ClassificationSchema, String> {
        let Value::Object(root) = value else {
            return Err("top-level JSON value is not an object".into());
        };

        let age_category = match field(root, "agecategory") {
            Some(Value::String(s)) => AgeCategory::parse(s),
            _ => AgeCategory::Unknown,
        };

        let guide = match field(root, "parentsguide") {
            Some(Value::Object(guide)) => guide,
            Some(_) => return Err("ParentsGuide is not an object".into()),
            None => return Err("ParentsGuide is missing".into()),
        };

        let mut record = ClassificationSchema {
            age_category,
            parents_guide: Default::default(),
            summary: match field(root, "summary") {
                Some(Value::String(s)) => s.trim().to_string(),
                _ => String::new(),
            },
        };

        let recognised: Vec<_> = guide
            .iter()
            .filter_map(|(key, raw_entry)| ContentCategory::from_key(key).map(|c| (c, raw_entry)))
            .collect();
        if recognised.is_empty() {
            return Err("ParentsGuide has no recognised categories".into());
        }

        for (category, raw_entry) in recognised {
            record
                .parents_guide
                .entry(category)
                .or_insert_with(|| Self::guide_entry(raw_entry));
        }

        for category in ContentCategory::ALL {
            record
                .parents_guide
                .entry(category)
                .or_insert_with(|| GuideEntry::rated(Severity::None, ""));
        }

        Ok(record)
    }

    fn guide_entry(raw: &Value) -> GuideEntry {
        match raw {
            Value::String(s) if s.trim().eq_ignore_ascii_case("unknown") => GuideEntry::Unknown,
            Value::String(s) => GuideEntry::rated(Severity::normalize(s), ""),
            Value::Object(entry) => {
                let severity = match field(entry, "severity") {
                    Some(Value::String(s)) => Severity::normalize(s),
                    _ => Severity::None,
                };
                let reason = match field(entry, "reason").or_else(|| field(entry, "justification")) {
                    Some(Value::String(s)) => s.trim().to_string(),
                    _ => String::new(),
                };
                GuideEntry::rated(severity, reason)
            }
            _ => GuideEntry::rated(Severity::None, ""),
        }
    }
}

/// Case/punctuation-insensitive object lookup; `folded` is lowercase alphanumerics.
fn field<'a>(map: &'a Map<String, Value>, folded: &str) -> Option<&'a Value> {
    map.iter()
        .find(|(key, _)| {
            key.chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .eq(folded.chars())
        })
        .map(|(_, value)| value)
}

// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

mod helpers;

use helpers::model_json;
use proptest::prelude::*;
use scriptrate::domain::{AgeCategory, ClassificationSchema, ContentCategory, GuideEntry, Severity};
use scriptrate::services::sanitizer::{ParseOutcome, ResponseSanitizer};

fn parsed(raw: &str) -> ClassificationSchema {
    match ResponseSanitizer::parse(raw) {
        ParseOutcome::Parsed(record) => record,
        ParseOutcome::NeedsFallback(reason) => panic!("expected a record, got fallback: {reason}"),
    }
}

fn needs_fallback(raw: &str) -> bool {
    matches!(ResponseSanitizer::parse(raw), ParseOutcome::NeedsFallback(_))
}

// ─── Extraction ──────────────────────────────────────────────────────────────

#[test]
fn parse_direct_json() {
    let raw = model_json("12+", ["None", "Moderate", "Mid", "None", "Mid"], "A tense thriller.");
    let record = parsed(&raw);
    assert_eq!(record.age_category, AgeCategory::TwelvePlus);
    assert_eq!(record.severity_of(ContentCategory::ViolenceGore), Severity::Moderate);
    assert_eq!(record.severity_of(ContentCategory::Frightening), Severity::Mid);
    assert_eq!(record.summary, "A tense thriller.");
    assert!(record.is_complete());
}

#[test]
fn parse_json_in_code_fence() {
    let raw = format!(
        "```json\n{}\n```",
        model_json("6+", ["None", "Mid", "Mid", "None", "None"], "Cartoon fights.")
    );
    let record = parsed(&raw);
    assert_eq!(record.age_category, AgeCategory::SixPlus);
    assert_eq!(record.severity_of(ContentCategory::Profanity), Severity::Mid);
}

#[test]
fn parse_json_surrounded_by_prose() {
    let raw = format!(
        "Sure! Here is my assessment:\n{}\nLet me know if you need more.",
        model_json("16+", ["Moderate", "Moderate", "None", "None", "None"], "Adult themes.")
    );
    assert_eq!(parsed(&raw).age_category, AgeCategory::SixteenPlus);
}

#[test]
fn parse_skips_braces_before_the_object() {
    let raw = format!(
        "Format used: {{AgeCategory}} then {{ParentsGuide}}.\n{}",
        model_json("0+", ["None"; 5], "Nothing notable.")
    );
    assert_eq!(parsed(&raw).age_category, AgeCategory::ZeroPlus);
}

#[test]
fn think_block_is_stripped() {
    let raw = format!(
        "<think>maybe {{\"AgeCategory\": \"18+\"}} is wrong</think>\n{}",
        model_json("12+", ["None", "Mid", "Mid", "Mid", "Mid"], "ok")
    );
    assert_eq!(parsed(&raw).age_category, AgeCategory::TwelvePlus);
}

// ─── Normalization ───────────────────────────────────────────────────────────

#[test]
fn severity_synonyms_are_normalized() {
    let raw = r#"{
        "AgeCategory": "16+",
        "ParentsGuide": {
            "Sex & Nudity": {"Severity": "mild", "Reason": "a kiss"},
            "Violence & Gore": {"Severity": "СИЛЬНЫЙ", "Reason": "shootout"},
            "Profanity": {"Severity": "medium", "Reason": "swearing"},
            "Alcohol, Drugs & Smoking": {"Severity": "нет", "Reason": ""},
            "Frightening & Intense Scenes": {"Severity": "???", "Reason": ""}
        },
        "Summary": "x"
    }"#;
    let record = parsed(raw);
    assert_eq!(record.severity_of(ContentCategory::SexNudity), Severity::Mid);
    assert_eq!(record.severity_of(ContentCategory::ViolenceGore), Severity::Severe);
    assert_eq!(record.severity_of(ContentCategory::Profanity), Severity::Moderate);
    assert_eq!(record.severity_of(ContentCategory::Substances), Severity::None);
    assert_eq!(record.severity_of(ContentCategory::Frightening), Severity::None);
}

#[test]
fn keys_match_loosely() {
    let raw = r#"{
        "age_category": "18+",
        "parents_guide": {
            "violence": "Severe",
            "Alcohol/Drugs/Smoking": {"severity": "Moderate", "justification": "bar scene"}
        },
        "summary": "Gritty."
    }"#;
    let record = parsed(raw);
    assert_eq!(record.age_category, AgeCategory::EighteenPlus);
    assert_eq!(record.severity_of(ContentCategory::ViolenceGore), Severity::Severe);
    assert_eq!(
        record.parents_guide[&ContentCategory::Substances].reason(),
        "bar scene"
    );
}

#[test]
fn missing_categories_are_filled_with_none() {
    let raw = r#"{"AgeCategory": "6+", "ParentsGuide": {"Profanity": {"Severity": "Mid", "Reason": "darn"}}, "Summary": ""}"#;
    let record = parsed(raw);
    assert!(record.is_complete());
    assert_eq!(record.severity_of(ContentCategory::SexNudity), Severity::None);
    assert_eq!(record.severity_of(ContentCategory::Profanity), Severity::Mid);
}

#[test]
fn invalid_age_category_becomes_unknown() {
    let raw = model_json("PG-13", ["None"; 5], "");
    assert_eq!(parsed(&raw).age_category, AgeCategory::Unknown);
}

#[test]
fn unknown_marker_is_kept() {
    let raw = r#"{"AgeCategory": "Unknown", "ParentsGuide": {"Profanity": "Unknown"}, "Summary": "Unknown"}"#;
    let record = parsed(raw);
    assert_eq!(
        record.parents_guide[&ContentCategory::Profanity],
        GuideEntry::Unknown
    );
}

// ─── Schema violations ───────────────────────────────────────────────────────

#[test]
fn prose_only_needs_fallback() {
    assert!(needs_fallback("I think this film is suitable for teenagers."));
}

#[test]
fn missing_parents_guide_needs_fallback() {
    assert!(needs_fallback(r#"{"AgeCategory": "12+", "Summary": "no guide"}"#));
}

#[test]
fn non_object_parents_guide_needs_fallback() {
    assert!(needs_fallback(r#"{"AgeCategory": "12+", "ParentsGuide": ["Severe"]}"#));
}

#[test]
fn unrecognised_guide_keys_need_fallback() {
    assert!(needs_fallback(
        r#"{"AgeCategory": "0+", "ParentsGuide": {"Насилие": {"Severity": "Severe"}, "Нагота": {"Severity": "Severe"}}}"#
    ));
    assert!(needs_fallback(r#"{"AgeCategory": "0+", "ParentsGuide": {}}"#));
}

#[test]
fn one_recognised_key_is_enough() {
    let record = parsed(
        r#"{"ParentsGuide": {"Насилие": {"Severity": "Severe"}, "Violence": {"Severity": "Severe"}}}"#,
    );
    assert_eq!(record.severity_of(ContentCategory::ViolenceGore), Severity::Severe);
    assert!(record.is_complete());
}

#[test]
fn truncated_json_needs_fallback() {
    assert!(needs_fallback(r#"{"AgeCategory": "12+", "ParentsGuide": {"Profanity": "#));
}

// ─── Snapshots ───────────────────────────────────────────────────────────────

#[test]
fn parsed_record_serializes_in_wire_shape() {
    let raw = model_json("12+", ["None", "Moderate", "Mid", "None", "Mid"], "A tense thriller.");
    let record = parsed(&raw);
    insta::assert_snapshot!(serde_json::to_string_pretty(&record).unwrap(), @r#"
    {
      "AgeCategory": "12+",
      "ParentsGuide": {
        "Sex & Nudity": {
          "Severity": "None",
          "Reason": "Sex & Nudity looked None"
        },
        "Violence & Gore": {
          "Severity": "Moderate",
          "Reason": "Violence & Gore looked Moderate"
        },
        "Profanity": {
          "Severity": "Mid",
          "Reason": "Profanity looked Mid"
        },
        "Alcohol, Drugs & Smoking": {
          "Severity": "None",
          "Reason": "Alcohol, Drugs & Smoking looked None"
        },
        "Frightening & Intense Scenes": {
          "Severity": "Mid",
          "Reason": "Frightening & Intense Scenes looked Mid"
        }
      },
      "Summary": "A tense thriller."
    }
    "#);
}

// ─── Property tests ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn parse_never_panics(input in any::<String>()) {
        let _ = ResponseSanitizer::parse(&input);
    }

    #[test]
    fn parsed_records_are_always_complete(
        age in "(0|6|12|16|18)\\+",
        severities in proptest::collection::vec(
            prop_oneof!["None", "Mid", "Moderate", "Severe", "mild", "strong", "garbage"],
            5,
        ),
        prefix in "[a-zA-Z .,!]{0,40}",
    ) {
        let severities: [&str; 5] = [
            severities[0].as_str(),
            severities[1].as_str(),
            severities[2].as_str(),
            severities[3].as_str(),
            severities[4].as_str(),
        ];
        let raw = format!("{prefix}{}", model_json(&age, severities, "s"));
        match ResponseSanitizer::parse(&raw) {
            ParseOutcome::Parsed(record) => {
                prop_assert!(record.is_complete());
                prop_assert!(record.age_category.is_valid());
            }
            ParseOutcome::NeedsFallback(reason) => {
                prop_assert!(false, "unexpected fallback: {}", reason);
            }
        }
    }
}

// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{AgeCategory, ContentCategory, Severity};

/// One parents-guide value.
///
/// `Unknown` is what the guided fill writes when nothing usable came back;
/// it serializes as the bare string `"Unknown"` and reads as `Severity::None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "GuideEntryRepr", into = "GuideEntryRepr")]
pub enum GuideEntry {
    Rated { severity: Severity, reason: String },
    Unknown,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum GuideEntryRepr {
    Rated {
        #[serde(rename = "Severity")]
        severity: Severity,
        #[serde(rename = "Reason", default)]
        reason: String,
    },
    Marker(String),
}

impl From<GuideEntryRepr> for GuideEntry {
    fn from(repr: GuideEntryRepr) -> Self {
        match repr {
            GuideEntryRepr::Rated { severity, reason } => Self::Rated { severity, reason },
            GuideEntryRepr::Marker(_) => Self::Unknown,
        }
    }
}

impl From<GuideEntry> for GuideEntryRepr {
    fn from(entry: GuideEntry) -> Self {
        match entry {
            GuideEntry::Rated { severity, reason } => Self::Rated { severity, reason },
            GuideEntry::Unknown => Self::Marker("Unknown".into()),
        }
    }
}

impl GuideEntry {
    pub fn rated(severity: Severity, reason: impl Into<String>) -> Self {
        Self::Rated {
            severity,
            reason: reason.into(),
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::Rated { severity, .. } => *severity,
            Self::Unknown => Severity::None,
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            Self::Rated { reason, .. } => reason,
            Self::Unknown => "",
        }
    }
}

pub type ParentsGuide = BTreeMap<ContentCategory, GuideEntry>;

/// The fixed record every model call is parsed into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationSchema {
    #[serde(rename = "AgeCategory", default)]
    pub age_category: AgeCategory,
    #[serde(rename = "ParentsGuide", default)]
    pub parents_guide: ParentsGuide,
    #[serde(rename = "Summary", default)]
    pub summary: String,
}

/// Final output of one submission.
pub type AnalysisResult = ClassificationSchema;

impl ClassificationSchema {
    /// Minimal record for failures: `Unknown`, empty guide, error in summary.
    pub fn error(message: impl std::fmt::Display) -> Self {
        Self {
            age_category: AgeCategory::Unknown,
            parents_guide: ParentsGuide::new(),
            summary: format!("Error: {message}"),
        }
    }

    pub fn severity_of(&self, category: ContentCategory) -> Severity {
        self.parents_guide
            .get(&category)
            .map(GuideEntry::severity)
            .unwrap_or_default()
    }

    /// All five categories present.
    pub fn is_complete(&self) -> bool {
        ContentCategory::ALL
            .iter()
            .all(|c| self.parents_guide.contains_key(c))
    }

    /// At least one category carries a real rating rather than a fill marker.
    pub fn is_informative(&self) -> bool {
        self.parents_guide
            .values()
            .any(|entry| matches!(entry, GuideEntry::Rated { .. }))
    }
}

// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

use serde::{Deserialize, Serialize};

/// Ordinal severity scale for one content category.
///
/// Variant order is the ordering: `None < Mid < Moderate < Severe`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Severity {
    #[default]
    None,
    Mid,
    Moderate,
    Severe,
}

/// Every word the models use for a severity level, English and the
/// localized scale the prompts ask for. The only place synonyms live.
const SEVERITY_SYNONYMS: &[(&str, Severity)] = &[
    ("none", Severity::None),
    ("no", Severity::None),
    ("n/a", Severity::None),
    ("нет", Severity::None),
    ("отсутствует", Severity::None),
    ("mid", Severity::Mid),
    ("mild", Severity::Mid),
    ("weak", Severity::Mid),
    ("low", Severity::Mid),
    ("слабый", Severity::Mid),
    ("слабая", Severity::Mid),
    ("moderate", Severity::Moderate),
    ("medium", Severity::Moderate),
    ("средний", Severity::Moderate),
    ("средняя", Severity::Moderate),
    ("severe", Severity::Severe),
    ("strong", Severity::Severe),
    ("high", Severity::Severe),
    ("сильный", Severity::Severe),
    ("сильная", Severity::Severe),
];

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::None,
        Severity::Mid,
        Severity::Moderate,
        Severity::Severe,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Mid => "Mid",
            Self::Moderate => "Moderate",
            Self::Severe => "Severe",
        }
    }

    /// Map a model-provided severity word onto the canonical scale.
    ///
    /// Exact (case-insensitive) matches win, which keeps `"n/a"` intact;
    /// otherwise the first word of the value that is a known synonym
    /// decides, so `"Strong (2 scenes)"` and `"Severe/Strong"` both read as
    /// `Severe`. Anything unrecognised is `None`.
    pub fn normalize(raw: &str) -> Self {
        let lowered = raw.trim().to_lowercase();
        let trimmed = lowered.trim_matches(|c: char| !c.is_alphanumeric() && c != '/');

        if let Some(severity) = Self::lookup(trimmed) {
            return severity;
        }

        trimmed
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .find_map(Self::lookup)
            .unwrap_or_default()
    }

    fn lookup(word: &str) -> Option<Self> {
        SEVERITY_SYNONYMS
            .iter()
            .find(|(synonym, _)| *synonym == word)
            .map(|(_, severity)| *severity)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

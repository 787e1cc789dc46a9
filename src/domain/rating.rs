// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

use serde::{Deserialize, Serialize};

/// The fixed set of parents-guide categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContentCategory {
    #[serde(rename = "Sex & Nudity")]
    SexNudity,
    #[serde(rename = "Violence & Gore")]
    ViolenceGore,
    #[serde(rename = "Profanity")]
    Profanity,
    #[serde(rename = "Alcohol, Drugs & Smoking")]
    Substances,
    #[serde(rename = "Frightening & Intense Scenes")]
    Frightening,
}

impl ContentCategory {
    pub const ALL: [ContentCategory; 5] = [
        ContentCategory::SexNudity,
        ContentCategory::ViolenceGore,
        ContentCategory::Profanity,
        ContentCategory::Substances,
        ContentCategory::Frightening,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::SexNudity => "Sex & Nudity",
            Self::ViolenceGore => "Violence & Gore",
            Self::Profanity => "Profanity",
            Self::Substances => "Alcohol, Drugs & Smoking",
            Self::Frightening => "Frightening & Intense Scenes",
        }
    }

    /// Match a model-written key to a category.
    ///
    /// Comparison ignores case, whitespace and punctuation, so
    /// `"Alcohol/Drugs/Smoking"` and `"alcohol, drugs & smoking"` both hit.
    pub fn from_key(key: &str) -> Option<Self> {
        let folded = fold_key(key);
        if folded.is_empty() {
            return None;
        }

        Self::ALL.into_iter().find(|category| {
            fold_key(category.label()) == folded
                || category.aliases().iter().any(|alias| fold_key(alias) == folded)
        })
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::SexNudity => &["sex", "nudity", "sex and nudity", "sexual content"],
            Self::ViolenceGore => &["violence", "gore", "violence and gore"],
            Self::Profanity => &["language", "swearing", "bad language"],
            Self::Substances => &[
                "alcohol drugs smoking",
                "alcohol, drugs and smoking",
                "substances",
                "drugs",
            ],
            Self::Frightening => &[
                "frightening",
                "frightening and intense scenes",
                "intense scenes",
            ],
        }
    }
}

/// Lowercased alphanumerics with the word "and" dropped, so `&` and `and`
/// fold alike.
fn fold_key(key: &str) -> String {
    key.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty() && !word.eq_ignore_ascii_case("and"))
        .flat_map(str::chars)
        .flat_map(char::to_lowercase)
        .collect()
}

impl std::fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Final age rating label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeCategory {
    #[serde(rename = "0+")]
    ZeroPlus,
    #[serde(rename = "6+")]
    SixPlus,
    #[serde(rename = "12+")]
    TwelvePlus,
    #[serde(rename = "16+")]
    SixteenPlus,
    #[serde(rename = "18+")]
    EighteenPlus,
    #[default]
    Unknown,
}

impl AgeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ZeroPlus => "0+",
            Self::SixPlus => "6+",
            Self::TwelvePlus => "12+",
            Self::SixteenPlus => "16+",
            Self::EighteenPlus => "18+",
            Self::Unknown => "Unknown",
        }
    }

    /// Restrictiveness rank `0+ < 6+ < 12+ < 16+ < 18+`; `Unknown` has none.
    pub fn rank(&self) -> Option<u8> {
        match self {
            Self::ZeroPlus => Some(0),
            Self::SixPlus => Some(1),
            Self::TwelvePlus => Some(2),
            Self::SixteenPlus => Some(3),
            Self::EighteenPlus => Some(4),
            Self::Unknown => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.rank().is_some()
    }

    /// Parse a model-proposed label; anything outside the five valid
    /// labels is `Unknown`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "0+" => Self::ZeroPlus,
            "6+" => Self::SixPlus,
            "12+" => Self::TwelvePlus,
            "16+" => Self::SixteenPlus,
            "18+" => Self::EighteenPlus,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for AgeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

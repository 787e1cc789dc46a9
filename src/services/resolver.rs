// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

use crate::domain::{AgeCategory, ContentCategory, Severity};
use crate::services::aggregator::AggregatedSeverities;

pub struct AgeResolver;

impl AgeResolver {
    /// Threshold ladder over the five aggregated severities, first match wins:
    ///
    /// 1. two or more `Severe` -> `18+`
    /// 2. two or more `Moderate`, no `Severe` -> `16+`
    /// 3. all five `Mid` -> `12+`
    /// 4. two or more `Mid`, nothing above -> `6+`
    /// 5. all five `None` -> `0+`
    ///
    /// Between rules 1 and 2 sits one extension: a single `Severe` category
    /// also yields `18+`, so worst-case content is never rated below it.
    /// Anything else is `Unknown`. A category missing from the map counts
    /// as `None`.
    pub fn resolve(aggregated: &AggregatedSeverities) -> AgeCategory {
        let count = |level: Severity| {
            ContentCategory::ALL
                .iter()
                .filter(|c| aggregated.get(c).copied().unwrap_or_default() == level)
                .count()
        };

        let total = ContentCategory::ALL.len();
        let severe = count(Severity::Severe);
        let moderate = count(Severity::Moderate);
        let mid = count(Severity::Mid);
        let none = count(Severity::None);

        if severe >= 2 {
            AgeCategory::EighteenPlus
        } else if severe == 1 {
            AgeCategory::EighteenPlus
        } else if moderate >= 2 && severe == 0 {
            AgeCategory::SixteenPlus
        } else if mid == total {
            AgeCategory::TwelvePlus
        } else if mid >= 2 && moderate == 0 && severe == 0 {
            AgeCategory::SixPlus
        } else if none == total {
            AgeCategory::ZeroPlus
        } else {
            AgeCategory::Unknown
        }
    }

    /// Escalate, never downgrade: a valid model proposal only ever raises
    /// the computed category; an invalid one is ignored.
    pub fn reconcile(proposed: AgeCategory, computed: AgeCategory) -> AgeCategory {
        match (proposed.rank(), computed.rank()) {
            (Some(p), Some(c)) if p > c => proposed,
            (Some(_), None) => proposed,
            _ => computed,
        }
    }

    /// The most restrictive valid label in `categories`, or `Unknown`.
    pub fn most_restrictive(categories: impl IntoIterator<Item = AgeCategory>) -> AgeCategory {
        categories
            .into_iter()
            .filter(AgeCategory::is_valid)
            .max_by_key(AgeCategory::rank)
            .unwrap_or(AgeCategory::Unknown)
    }
}

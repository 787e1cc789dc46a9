// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

use std::collections::BTreeMap;

use crate::domain::{ClassificationSchema, ContentCategory, GuideEntry, ParentsGuide, Severity};

/// One severity per category after combining all units.
pub type AggregatedSeverities = BTreeMap<ContentCategory, Severity>;

pub struct SeverityAggregator;

impl SeverityAggregator {
    /// Worst case per category across `results`; categories nobody
    /// reported stay at `None`. Order of `results` does not matter.
    pub fn aggregate(results: &[ClassificationSchema]) -> AggregatedSeverities {
        ContentCategory::ALL
            .into_iter()
            .map(|category| {
                let worst = results
                    .iter()
                    .map(|r| r.severity_of(category))
                    .max()
                    .unwrap_or_default();
                (category, worst)
            })
            .collect()
    }

    /// Final parents guide: the aggregated severity per category, with the
    /// reason of the first unit (in `results` order) that reported it.
    pub fn merge_guide(
        results: &[ClassificationSchema],
        aggregated: &AggregatedSeverities,
    ) -> ParentsGuide {
        aggregated
            .iter()
            .map(|(&category, &severity)| {
                let reason = results
                    .iter()
                    .filter_map(|r| r.parents_guide.get(&category))
                    .filter(|entry| entry.severity() == severity)
                    .map(GuideEntry::reason)
                    .find(|reason| !reason.is_empty())
                    .unwrap_or_default();
                (category, GuideEntry::rated(severity, reason))
            })
            .collect()
    }
}

// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

mod helpers;

use helpers::{ALL_NONE, make_record};
use proptest::prelude::*;
use scriptrate::domain::{AgeCategory, ContentCategory, Severity};
use scriptrate::services::aggregator::{AggregatedSeverities, SeverityAggregator};
use scriptrate::services::resolver::AgeResolver;

use Severity::{Mid, Moderate, None as No, Severe};

fn resolve(severities: [Severity; 5]) -> AgeCategory {
    let aggregated: AggregatedSeverities = ContentCategory::ALL.into_iter().zip(severities).collect();
    AgeResolver::resolve(&aggregated)
}

// ─── Aggregation ─────────────────────────────────────────────────────────────

#[test]
fn aggregate_takes_worst_case_per_category() {
    let results = vec![
        make_record(AgeCategory::SixPlus, [Mid, No, No, No, No]),
        make_record(AgeCategory::SixPlus, [No, Severe, No, No, No]),
        make_record(AgeCategory::SixPlus, [No, Mid, Moderate, No, No]),
    ];
    let aggregated = SeverityAggregator::aggregate(&results);
    assert_eq!(aggregated[&ContentCategory::SexNudity], Mid);
    assert_eq!(aggregated[&ContentCategory::ViolenceGore], Severe);
    assert_eq!(aggregated[&ContentCategory::Profanity], Moderate);
    assert_eq!(aggregated[&ContentCategory::Substances], No);
}

#[test]
fn aggregate_of_nothing_is_all_none() {
    let aggregated = SeverityAggregator::aggregate(&[]);
    assert_eq!(aggregated.len(), 5);
    assert!(aggregated.values().all(|s| *s == No));
}

#[test]
fn merged_guide_carries_the_worst_reason() {
    let results = vec![
        make_record(AgeCategory::ZeroPlus, ALL_NONE),
        make_record(AgeCategory::EighteenPlus, [No, Severe, No, No, No]),
    ];
    let aggregated = SeverityAggregator::aggregate(&results);
    let guide = SeverityAggregator::merge_guide(&results, &aggregated);
    let violence = &guide[&ContentCategory::ViolenceGore];
    assert_eq!(violence.severity(), Severe);
    assert_eq!(violence.reason(), "Violence & Gore: Severe");
}

// ─── Threshold ladder ────────────────────────────────────────────────────────

#[test]
fn ladder_rules() {
    assert_eq!(resolve([Severe, Severe, No, No, No]), AgeCategory::EighteenPlus);
    assert_eq!(resolve([Moderate, Moderate, Mid, No, No]), AgeCategory::SixteenPlus);
    assert_eq!(resolve([Mid; 5]), AgeCategory::TwelvePlus);
    assert_eq!(resolve([Mid, Mid, No, No, No]), AgeCategory::SixPlus);
    assert_eq!(resolve(ALL_NONE), AgeCategory::ZeroPlus);
}

#[test]
fn single_severe_category_is_adult_only() {
    assert_eq!(resolve([No, Severe, No, No, No]), AgeCategory::EighteenPlus);
    assert_eq!(resolve([Mid, Severe, Mid, No, No]), AgeCategory::EighteenPlus);
}

#[test]
fn ladder_gaps_resolve_to_unknown() {
    assert_eq!(resolve([Moderate, No, No, No, No]), AgeCategory::Unknown);
    assert_eq!(resolve([Mid, No, No, No, No]), AgeCategory::Unknown);
    assert_eq!(resolve([Moderate, Mid, Mid, No, No]), AgeCategory::Unknown);
}

#[test]
fn missing_categories_count_as_none() {
    assert_eq!(
        AgeResolver::resolve(&AggregatedSeverities::new()),
        AgeCategory::ZeroPlus
    );
}

// ─── Reconciliation ──────────────────────────────────────────────────────────

#[test]
fn reconcile_escalates_never_downgrades() {
    use AgeCategory::*;
    assert_eq!(AgeResolver::reconcile(SixteenPlus, SixPlus), SixteenPlus);
    assert_eq!(AgeResolver::reconcile(TwelvePlus, EighteenPlus), EighteenPlus);
    assert_eq!(AgeResolver::reconcile(ZeroPlus, ZeroPlus), ZeroPlus);
}

#[test]
fn reconcile_ignores_invalid_proposals() {
    use AgeCategory::*;
    assert_eq!(AgeResolver::reconcile(Unknown, SixPlus), SixPlus);
    assert_eq!(AgeResolver::reconcile(Unknown, Unknown), Unknown);
    assert_eq!(AgeResolver::reconcile(TwelvePlus, Unknown), TwelvePlus);
}

// ─── Property tests ──────────────────────────────────────────────────────────

fn severity() -> impl Strategy<Value = Severity> {
    prop_oneof![Just(No), Just(Mid), Just(Moderate), Just(Severe)]
}

fn severities() -> impl Strategy<Value = [Severity; 5]> {
    [severity(), severity(), severity(), severity(), severity()]
}

fn age() -> impl Strategy<Value = AgeCategory> {
    use AgeCategory::*;
    prop_oneof![
        Just(ZeroPlus),
        Just(SixPlus),
        Just(TwelvePlus),
        Just(SixteenPlus),
        Just(EighteenPlus),
        Just(Unknown),
    ]
}

proptest! {
    #[test]
    fn aggregation_ignores_unit_order(units in proptest::collection::vec(severities(), 0..8)) {
        let forward: Vec<_> = units.iter().map(|s| make_record(AgeCategory::Unknown, *s)).collect();
        let mut backward = forward.clone();
        backward.reverse();
        prop_assert_eq!(
            SeverityAggregator::aggregate(&forward),
            SeverityAggregator::aggregate(&backward)
        );
    }

    #[test]
    fn adding_a_unit_never_lowers_severity(
        units in proptest::collection::vec(severities(), 1..8),
        extra in severities(),
    ) {
        let mut records: Vec<_> = units.iter().map(|s| make_record(AgeCategory::Unknown, *s)).collect();
        let before = SeverityAggregator::aggregate(&records);
        records.push(make_record(AgeCategory::Unknown, extra));
        let after = SeverityAggregator::aggregate(&records);
        for category in ContentCategory::ALL {
            prop_assert!(after[&category] >= before[&category]);
        }
    }

    #[test]
    fn reconcile_is_never_below_a_valid_computed_category(proposed in age(), computed in age()) {
        let result = AgeResolver::reconcile(proposed, computed);
        if let Some(c) = computed.rank() {
            prop_assert!(result.rank().is_some_and(|r| r >= c));
        }
        if result != computed {
            prop_assert_eq!(result, proposed);
        }
    }
}

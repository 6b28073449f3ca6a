//! Property-based tests for identity normalization and reconciliation.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use std::collections::BTreeSet;

use proptest::prelude::*;

use maintainerd::core::identity::{normalize, NormalizedIdentity};
use maintainerd::core::types::ProjectId;
use maintainerd::reconcile::{diff, reconcile, ProjectMembershipSnapshot};

/// Strategy for e-mail-like identities, with case and padding noise.
fn raw_identity() -> impl Strategy<Value = String> {
    ("[a-fA-F]{1,4}", "[a-cA-C]{1,3}", " {0,2}", " {0,2}")
        .prop_map(|(local, domain, lead, trail)| {
            format!("{}{}@{}.org{}", lead, local, domain, trail)
        })
}

/// Strategy for raw identity lists, occasionally including blanks.
fn raw_identities() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop_oneof![
            8 => raw_identity(),
            1 => Just(String::new()),
            1 => Just("   ".to_string()),
        ],
        0..20,
    )
}

fn normalized_set(raw: &[String]) -> BTreeSet<NormalizedIdentity> {
    raw.iter().filter_map(|r| normalize(r).ok()).collect()
}

fn is_strictly_sorted(ids: &[NormalizedIdentity]) -> bool {
    ids.windows(2).all(|w| w[0] < w[1])
}

proptest! {
    #[test]
    fn normalize_is_idempotent(raw in raw_identity()) {
        let once = normalize(&raw).unwrap();
        let twice = normalize(once.as_str()).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn case_and_padding_variants_agree(raw in raw_identity()) {
        let upper = format!("  {}  ", raw.to_uppercase());
        prop_assert_eq!(normalize(&upper).unwrap(), normalize(&raw.to_lowercase()).unwrap());
    }

    #[test]
    fn diff_is_symmetric(registered in raw_identities(), external in raw_identities()) {
        let r = normalized_set(&registered);
        let e = normalized_set(&external);
        prop_assert_eq!(diff(&r, &e).missing_externally, diff(&e, &r).unregistered_external);
        prop_assert_eq!(diff(&r, &e).unregistered_external, diff(&e, &r).missing_externally);
    }

    #[test]
    fn covered_iff_nothing_missing(registered in raw_identities(), external in raw_identities()) {
        let snapshot = ProjectMembershipSnapshot::new(ProjectId(1), registered, external);
        let outcome = reconcile(&snapshot);
        prop_assert_eq!(outcome.fully_covered, outcome.missing_externally.is_empty());
    }

    #[test]
    fn reconcile_is_deterministic(registered in raw_identities(), external in raw_identities()) {
        let snapshot = ProjectMembershipSnapshot::new(ProjectId(7), registered, external);
        prop_assert_eq!(reconcile(&snapshot), reconcile(&snapshot.clone()));
    }

    #[test]
    fn outputs_are_sorted_unique_and_partitioned(
        registered in raw_identities(),
        external in raw_identities(),
    ) {
        let r = normalized_set(&registered);
        let e = normalized_set(&external);
        let snapshot =
            ProjectMembershipSnapshot::new(ProjectId(1), registered.clone(), external.clone());
        let outcome = reconcile(&snapshot);

        prop_assert!(is_strictly_sorted(&outcome.missing_externally));
        prop_assert!(is_strictly_sorted(&outcome.unregistered_external));
        for id in &outcome.missing_externally {
            prop_assert!(r.contains(id) && !e.contains(id));
        }
        for id in &outcome.unregistered_external {
            prop_assert!(e.contains(id) && !r.contains(id));
        }
        let covered = r.iter().filter(|id| e.contains(*id)).count();
        prop_assert_eq!(covered + outcome.missing_externally.len(), r.len());
    }

    #[test]
    fn blanks_are_counted(registered in raw_identities(), external in raw_identities()) {
        let blank = |raw: &[String]| raw.iter().filter(|r| r.trim().is_empty()).count();
        let snapshot =
            ProjectMembershipSnapshot::new(ProjectId(1), registered.clone(), external.clone());
        let outcome = reconcile(&snapshot);
        prop_assert_eq!(outcome.discarded.registered, blank(&registered));
        prop_assert_eq!(outcome.discarded.external, blank(&external));
    }
}

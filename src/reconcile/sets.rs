//! reconcile::sets
//!
//! Builds the two normalized membership sets for one project.
//!
//! Invalid identities never reach the sets. They are counted per side in
//! [`DiscardCounts`] so callers can log or report them.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::core::identity::{normalize, NormalizedIdentity};

/// How many raw identities were dropped as invalid, per side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiscardCounts {
    pub registered: usize,
    pub external: usize,
}

impl DiscardCounts {
    /// Total number of discarded identities.
    pub fn total(&self) -> usize {
        self.registered + self.external
    }
}

/// Normalized registered and external membership.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipSets {
    pub registered: BTreeSet<NormalizedIdentity>,
    pub external: BTreeSet<NormalizedIdentity>,
    pub discarded: DiscardCounts,
}

/// Normalize both identity lists into ordered sets.
///
/// Duplicates (including case and whitespace variants) collapse. Empty
/// entries are dropped and counted.
pub fn build_sets<R, E>(registered: R, external: E) -> MembershipSets
where
    R: IntoIterator,
    R::Item: AsRef<str>,
    E: IntoIterator,
    E::Item: AsRef<str>,
{
    let (registered, registered_discarded) = normalize_all(registered);
    let (external, external_discarded) = normalize_all(external);

    MembershipSets {
        registered,
        external,
        discarded: DiscardCounts {
            registered: registered_discarded,
            external: external_discarded,
        },
    }
}

fn normalize_all<I>(raw: I) -> (BTreeSet<NormalizedIdentity>, usize)
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut set = BTreeSet::new();
    let mut discarded = 0;
    for item in raw {
        match normalize(item.as_ref()) {
            Ok(identity) => {
                set.insert(identity);
            }
            Err(_) => discarded += 1,
        }
    }
    (set, discarded)
}

//! reconcile::diff
//!
//! Directional set differences between registered and external membership.
//!
//! # Ordering
//!
//! Both outputs are sorted ascending on the normalized identity. The inputs
//! are ordered sets, so a single merge walk yields sorted output in
//! O(n + m) without a separate sort.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::Serialize;

use crate::core::identity::NormalizedIdentity;

/// Result of comparing registered and external membership.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MembershipDiff {
    /// Registered identities absent from the external set.
    pub missing_externally: Vec<NormalizedIdentity>,
    /// External identities absent from the registered set.
    pub unregistered_external: Vec<NormalizedIdentity>,
}

/// Compute `registered − external` and `external − registered`.
///
/// # Example
///
/// ```
/// use std::collections::BTreeSet;
/// use maintainerd::core::identity::normalize;
/// use maintainerd::reconcile::diff::diff;
///
/// let set = |emails: &[&str]| -> BTreeSet<_> {
///     emails.iter().map(|s| normalize(s).unwrap()).collect()
/// };
/// let registered = set(&["a@x.org", "b@x.org"]);
/// let external = set(&["a@x.org", "c@x.org"]);
///
/// let d = diff(&registered, &external);
/// assert_eq!(d.missing_externally[0].as_str(), "b@x.org");
/// assert_eq!(d.unregistered_external[0].as_str(), "c@x.org");
/// ```
pub fn diff(
    registered: &BTreeSet<NormalizedIdentity>,
    external: &BTreeSet<NormalizedIdentity>,
) -> MembershipDiff {
    let mut out = MembershipDiff::default();
    let mut left = registered.iter().peekable();
    let mut right = external.iter().peekable();

    loop {
        let step = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => l.cmp(r),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => break,
        };
        match step {
            Ordering::Less => {
                if let Some(l) = left.next() {
                    out.missing_externally.push(l.clone());
                }
            }
            Ordering::Greater => {
                if let Some(r) = right.next() {
                    out.unregistered_external.push(r.clone());
                }
            }
            Ordering::Equal => {
                left.next();
                right.next();
            }
        }
    }

    out
}

//! Appearance tracking — which identities just entered the picture.

use std::collections::BTreeSet;

/// Names present in `current` but absent from `previous`.
///
/// "New" means not seen in the immediately preceding frame, not "never seen
/// this run": an identity that drops out for a single frame and returns is
/// newly appeared again.
pub fn newly_appeared(
    current: &BTreeSet<String>,
    previous: &BTreeSet<String>,
) -> BTreeSet<String> {
    current.difference(previous).cloned().collect()
}

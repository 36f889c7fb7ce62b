//! Stateless proof verification

use crate::model::{Branch, Digest, ProofHash};

/// Replay `trail` from `target` and compare the result to `root`
///
/// A `Right` step hashes `running || sibling`, a `Left` step hashes
/// `sibling || running`. An empty trail compares `target` to `root`
/// directly. A trail containing an `OldRoot` step is rejected, since no
/// consistency-proof replay exists.
pub fn verify_audit(root: &Digest, target: &Digest, trail: &[ProofHash]) -> bool {
    let mut running = *target;

    for step in trail {
        running = match step.direction {
            Branch::Right => Digest::combine(&running, Some(&step.hash)),
            Branch::Left => Digest::combine(&step.hash, Some(&running)),
            Branch::OldRoot => {
                tracing::debug!("rejecting trail with an old-root step");
                return false;
            }
        };
    }

    running == *root
}

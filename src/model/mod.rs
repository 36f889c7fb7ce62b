//! Core data model types for merkle_audit

mod digest;
mod proof;

pub use digest::{Digest, DIGEST_LEN};
pub use proof::{AuditProof, Branch, ProofHash};

//! Operations on proofs that need no live tree

mod verify;

pub use verify::verify_audit;

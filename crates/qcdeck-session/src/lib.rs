#![forbid(unsafe_code)]
//! QC edit session.
//!
//! Wraps exactly one asset's QC document. Setters mark the session dirty by
//! appending explicit change events; commit is a single whole-document
//! write that clears them. Children never hold parent back-references.

mod session;

pub use session::{
    CommitOutcome, QcEditSession, SessionError, SessionEvent, SessionPhase,
};

pub const CRATE_NAME: &str = "qcdeck-session";

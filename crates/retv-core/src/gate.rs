//! Approval gates — the human-in-the-loop boundary of the archival workflow.
//!
//! A gate is consulted exactly once per workflow run, after the candidate
//! summary is known and before any record is mutated. The console prompt in
//! the CLI implements this trait; tests use the library-provided gates.

use crate::archive::BatchSummary;

/// Outcome of consulting a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approved,
    Declined,
}

impl Decision {
    /// Whether the gated batch may proceed.
    pub fn is_approved(self) -> bool {
        matches!(self, Decision::Approved)
    }
}

/// Yes/no decision point invoked once per archival run.
///
/// `decide` may block indefinitely (a console prompt has no timeout). Callers
/// that cannot afford an open-ended suspension should use the
/// prepare/commit entry points instead and gate between them.
pub trait ApprovalGate: Send + Sync {
    fn decide(&self, summary: &BatchSummary) -> Decision;
}

/// Gate that approves every batch. Used for unattended runs (`--yes`).
#[derive(Debug, Default)]
pub struct AutoApprove;

impl ApprovalGate for AutoApprove {
    fn decide(&self, _summary: &BatchSummary) -> Decision {
        Decision::Approved
    }
}

/// Gate that declines every batch.
#[derive(Debug, Default)]
pub struct AutoDecline;

impl ApprovalGate for AutoDecline {
    fn decide(&self, _summary: &BatchSummary) -> Decision {
        Decision::Declined
    }
}

/// Wrapper gate that counts invocations, for asserting the once-per-run
/// contract in tests.
#[derive(Debug)]
pub struct CountingGate<G> {
    inner: G,
    calls: std::sync::atomic::AtomicUsize,
}

impl<G: ApprovalGate> CountingGate<G> {
    pub fn new(inner: G) -> Self {
        CountingGate {
            inner,
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Number of times `decide` has been invoked.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

impl<G: ApprovalGate> ApprovalGate for CountingGate<G> {
    fn decide(&self, summary: &BatchSummary) -> Decision {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.inner.decide(summary)
    }
}

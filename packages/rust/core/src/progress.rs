//! Progress callbacks for long-running workflows.

/// Receives workflow progress. Implementations must tolerate calls from
/// many tasks at once.
pub trait Progress: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called once the number of records to process is known.
    fn planned(&self, total: usize);
    /// Called when one record has finished, successfully or not.
    fn record_done(&self, record_id: &str, succeeded: bool);
}

/// No-op reporter for headless and test usage.
pub struct SilentProgress;

impl Progress for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn planned(&self, _total: usize) {}
    fn record_done(&self, _record_id: &str, _succeeded: bool) {}
}

//! The adapter-supplied `Logger` contract (spec.md §6): printf-style
//! `debug`/`warn`/`error`, plus optional span timing that adapters may
//! choose not to implement.

/// `time`/`timeEnd` default to no-ops — "absence of time/timeEnd must
/// be tolerated" (spec.md §6).
pub trait Logger: Send + Sync {
    fn debug(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);

    fn time(&self, _label: &str) {}
    fn time_end(&self, _label: &str) {}
}

//! Shared run error log
//!
//! One log exists per publishing run. Every component appends to it:
//! upload workers, the registry reconciler, and the failure escalator.
//! The pipeline reads it exactly once at the end of the run; a non-empty
//! log is the sole trigger for issue escalation and the sole determinant
//! of the run's boolean verdict.

use std::sync::{Arc, Mutex};

/// Append-only error log scoped to a single publishing run.
///
/// Cheap to clone; clones share the same underlying log, so it can be
/// handed to concurrent upload workers.
#[derive(Debug, Clone, Default)]
pub struct RunErrorLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl RunErrorLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an error entry
    pub fn record(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("{message}");
        self.entries.lock().unwrap().push(message);
    }

    /// Whether any error has been recorded
    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }

    /// Number of recorded entries
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Snapshot of all entries, in recording order
    pub fn snapshot(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_new_log_is_empty() {
        let log = RunErrorLog::new();
        assert!(log.is_empty());
        assert_eq!(log.len(), 0);
        assert!(log.snapshot().is_empty());
    }

    #[test]
    fn test_record_preserves_order() {
        let log = RunErrorLog::new();
        log.record("first");
        log.record("second");

        assert!(!log.is_empty());
        assert_eq!(log.snapshot(), vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn test_clones_share_entries() {
        let log = RunErrorLog::new();
        let clone = log.clone();

        clone.record("from clone");

        assert_eq!(log.len(), 1);
        assert_eq!(log.snapshot(), vec!["from clone".to_string()]);
    }

    #[test]
    fn test_concurrent_producers() {
        let log = RunErrorLog::new();

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let log = log.clone();
                thread::spawn(move || {
                    for i in 0..50 {
                        log.record(format!("worker {} entry {}", worker, i));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("producer thread panicked");
        }

        assert_eq!(log.len(), 400);
    }
}

//! Best-effort failure log for rejected operations.

use std::io::Write;
use std::path::PathBuf;

use serde_json::json;

/// Appends one JSON line per rejected operation to a local file, keeping the
/// raw envelope for postmortems. A write failure is logged and swallowed so
/// it can never mask the error that triggered it.
#[derive(Debug, Clone)]
pub struct DiagnosticLog {
    path: Option<PathBuf>,
}

impl DiagnosticLog {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    /// Records one rejected operation with the raw envelope text.
    pub fn record_failure(&self, operation: &str, raw_envelope: &str) {
        let Some(path) = &self.path else { return };
        let line = json!({
            "ts": chrono::Utc::now().to_rfc3339(),
            "operation": operation,
            "envelope": raw_envelope,
        });
        let written = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| writeln!(file, "{line}"));
        if let Err(e) = written {
            tracing::warn!(path = %path.display(), error = %e, "diagnostic log write failed");
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("failures.jsonl");
        let log = DiagnosticLog::new(Some(path.clone()));

        log.record_failure("BotCreateMutation", r#"{"success":false}"#);
        log.record_failure("ViewerQuery", r#"{"data":null}"#);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["operation"], "BotCreateMutation");
        assert_eq!(first["envelope"], r#"{"success":false}"#);
        assert!(first["ts"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn disabled_log_writes_nothing() {
        let log = DiagnosticLog::disabled();
        // Nothing to assert beyond "does not panic and creates no file";
        // the path is None so there is no destination at all.
        log.record_failure("ViewerQuery", "{}");
    }

    #[test]
    fn unwritable_path_does_not_panic() {
        let log = DiagnosticLog::new(Some(PathBuf::from("/nonexistent-dir/x/failures.jsonl")));
        log.record_failure("ViewerQuery", "{}");
    }
}

//! Batch compile reporting.

use serde::Serialize;

/// One item that failed to compile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileFailure {
    pub name: String,
    pub error: String,
}

/// Outcome of compiling a batch of agents.
///
/// Lists are sorted by agent name so the report does not depend on the order
/// parallel work happened to finish in.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CompileReport {
    pub compiled: Vec<String>,
    pub failed: Vec<CompileFailure>,
    pub warnings: Vec<String>,
}

impl CompileReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// One-line summary for CLI output.
    pub fn summary(&self) -> String {
        let mut line = format!("Compiled {} agent(s)", self.compiled.len());
        if !self.failed.is_empty() {
            line.push_str(&format!(", {} failed", self.failed.len()));
        }
        if !self.warnings.is_empty() {
            line.push_str(&format!(", {} warning(s)", self.warnings.len()));
        }
        line
    }

    pub(crate) fn finish(mut self) -> Self {
        self.compiled.sort();
        self.failed.sort_by(|a, b| a.name.cmp(&b.name));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_sorts_by_name() {
        let report = CompileReport {
            compiled: vec!["zeta".into(), "alpha".into()],
            failed: vec![
                CompileFailure {
                    name: "tester".into(),
                    error: "x".into(),
                },
                CompileFailure {
                    name: "backend".into(),
                    error: "y".into(),
                },
            ],
            warnings: vec!["w".into()],
        }
        .finish();
        assert_eq!(report.compiled, ["alpha", "zeta"]);
        assert_eq!(report.failed[0].name, "backend");
        assert!(!report.is_success());
        assert_eq!(report.summary(), "Compiled 2 agent(s), 2 failed, 1 warning(s)");
    }

    #[test]
    fn empty_report_is_success() {
        let report = CompileReport::default();
        assert!(report.is_success());
        assert_eq!(report.summary(), "Compiled 0 agent(s)");
    }
}

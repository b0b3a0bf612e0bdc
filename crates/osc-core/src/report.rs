//! Run reports: plain text, JSON and JUnit XML

use crate::error::InterpreterError;
use osc_kernel::{ActionFailure, Verdict};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Outcome of one scenario run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Scenario name
    pub scenario: String,
    /// Final verdict
    pub verdict: Verdict,
    /// Ticks executed
    pub ticks: u64,
    /// Simulated seconds
    pub simulation_time: f64,
    /// Recoverable failures in the order they occurred
    pub failures: Vec<ActionFailure>,
    /// Why the run stopped early: fatal error or exceeded limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl RunReport {
    /// True for a SUCCESS verdict
    #[must_use]
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Success
    }

    /// Human-readable summary
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut report = String::new();

        report.push_str(&format!("=== Scenario Report: {} ===\n\n", self.scenario));
        report.push_str(&format!("Ticks: {}\n", self.ticks));
        report.push_str(&format!("Simulation Time: {:.3}s\n", self.simulation_time));
        report.push_str(&format!("Failures: {}\n", self.failures.len()));
        if let Some(reason) = &self.reason {
            report.push_str(&format!("Stopped: {reason}\n"));
        }

        if !self.failures.is_empty() {
            report.push_str("\n=== Failures ===\n");
            for (i, failure) in self.failures.iter().enumerate() {
                report.push_str(&format!(
                    "{}. [tick {} @ {:.3}s] {}: {}\n",
                    i + 1,
                    failure.tick,
                    failure.time,
                    failure.element,
                    failure.message
                ));
            }
        }

        report.push_str(&format!("\n=== Result: {} ===\n", self.verdict));
        report
    }

    /// Pretty-printed JSON
    ///
    /// # Errors
    /// Serialization failure.
    pub fn to_json(&self) -> Result<String, InterpreterError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// JUnit XML with the run as a single test case
    #[must_use]
    pub fn to_junit_xml(&self) -> String {
        let failed = usize::from(!self.passed());
        let name = escape(&self.scenario);
        let time = format!("{:.3}", self.simulation_time);

        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str(&format!("<testsuites tests=\"1\" failures=\"{failed}\">\n"));
        xml.push_str(&format!(
            "  <testsuite name=\"osc\" tests=\"1\" failures=\"{failed}\" time=\"{time}\">\n"
        ));
        xml.push_str(&format!(
            "    <testcase classname=\"osc\" name=\"{name}\" time=\"{time}\""
        ));

        if self.passed() {
            xml.push_str("/>\n");
        } else {
            let message = self
                .reason
                .clone()
                .or_else(|| self.failures.first().map(|f| f.message.clone()))
                .unwrap_or_else(|| self.verdict.to_string());
            xml.push_str(">\n");
            xml.push_str(&format!(
                "      <failure message=\"{}\" type=\"{}\">",
                escape(&message),
                self.verdict
            ));
            for failure in &self.failures {
                xml.push_str(&escape(&format!(
                    "\n[tick {}] {}: {}",
                    failure.tick, failure.element, failure.message
                )));
            }
            xml.push_str("</failure>\n    </testcase>\n");
        }

        xml.push_str("  </testsuite>\n</testsuites>\n");
        xml
    }

    /// Write `<scenario>.json` and `<scenario>.junit.xml` into `directory`
    ///
    /// # Errors
    /// Directory creation or file write failures.
    pub fn write_to(&self, directory: impl AsRef<Path>) -> Result<Vec<PathBuf>, InterpreterError> {
        let directory = directory.as_ref();
        std::fs::create_dir_all(directory).map_err(|e| InterpreterError::io(directory, e))?;

        let json = directory.join(format!("{}.json", self.scenario));
        let junit = directory.join(format!("{}.junit.xml", self.scenario));
        for (path, contents) in [(&json, self.to_json()?), (&junit, self.to_junit_xml())] {
            std::fs::write(path, contents).map_err(|e| InterpreterError::io(path, e))?;
        }
        Ok(vec![json, junit])
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn failed() -> RunReport {
        RunReport {
            scenario: "cut_in".into(),
            verdict: Verdict::Failure,
            ticks: 42,
            simulation_time: 1.9,
            failures: vec![ActionFailure {
                tick: 7,
                time: 0.15,
                element: "slow_down".into(),
                message: "entity \"ego\" is not in the simulation".into(),
            }],
            reason: None,
        }
    }

    #[test]
    fn text_lists_failures() {
        let text = failed().generate_text();

        assert!(text.contains("Ticks: 42"));
        assert!(text.contains("1. [tick 7 @ 0.150s] slow_down:"));
        assert!(text.ends_with("=== Result: FAILURE ===\n"));
    }

    #[test]
    fn json_uses_uppercase_verdict() {
        let report = failed();
        let json = report.to_json().unwrap();

        assert!(json.contains("\"verdict\": \"FAILURE\""));
        assert!(!json.contains("reason"));
        let back: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn junit_escapes_failure_message() {
        let xml = failed().to_junit_xml();

        assert!(xml.contains("<testsuites tests=\"1\" failures=\"1\">"));
        assert!(xml.contains("message=\"entity &quot;ego&quot; is not in the simulation\""));
        assert!(xml.contains("type=\"FAILURE\""));
    }

    #[test]
    fn junit_success_has_no_failure_element() {
        let report = RunReport {
            verdict: Verdict::Success,
            failures: Vec::new(),
            ..failed()
        };
        let xml = report.to_junit_xml();

        assert!(xml.contains("failures=\"0\""));
        assert!(xml.contains("<testcase classname=\"osc\" name=\"cut_in\" time=\"1.900\"/>"));
        assert!(!xml.contains("<failure"));
    }

    #[test]
    fn writes_both_reports() {
        let dir = tempfile::tempdir().unwrap();
        let written = failed().write_to(dir.path().join("reports")).unwrap();

        assert_eq!(written.len(), 2);
        for path in written {
            assert!(path.exists());
        }
    }
}

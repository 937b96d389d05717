//! Trivy 취약점 어댑터
//!
//! `trivy image --format json --quiet <image>`를 실행하고 JSON 보고서를 파싱합니다.

use std::sync::Arc;
use std::time::Duration;

use imagewarden_core::types::ImageRef;

use crate::adapters::{disabled_warning, log_outcome};
use crate::error::ScanEngineError;
use crate::outcome::{AdapterKind, ScanOutcome, VulnerabilityReport};
use crate::tool::ToolRunner;

const UNKNOWN_ERROR: &str = "Unknown Trivy error";
const EMPTY_OUTPUT: &str = "Trivy returned empty output";
const PARSE_FAILURE: &str = "Failed to parse Trivy JSON output";
const TIMED_OUT: &str = "Trivy scan timed out";

/// 취약점 스캔 어댑터
pub struct VulnerabilityAdapter<T: ToolRunner> {
    runner: Arc<T>,
    binary: String,
    timeout: Duration,
    enabled: bool,
}

impl<T: ToolRunner> VulnerabilityAdapter<T> {
    /// 새 어댑터를 생성합니다.
    pub fn new(runner: Arc<T>, binary: impl Into<String>, timeout: Duration, enabled: bool) -> Self {
        Self {
            runner,
            binary: binary.into(),
            timeout,
            enabled,
        }
    }

    /// 이미지의 알려진 취약점을 스캔합니다.
    pub async fn scan(&self, image: &ImageRef, scan_id: &str) -> ScanOutcome<VulnerabilityReport> {
        let outcome = self.run(image).await;
        log_outcome(AdapterKind::Vulnerability, scan_id, &outcome);
        outcome
    }

    async fn run(&self, image: &ImageRef) -> ScanOutcome<VulnerabilityReport> {
        if !self.enabled {
            return ScanOutcome::Warning(disabled_warning(AdapterKind::Vulnerability));
        }

        let args = vec![
            "image".to_owned(),
            "--format".to_owned(),
            "json".to_owned(),
            "--quiet".to_owned(),
            image.as_str().to_owned(),
        ];

        let output = match self.runner.run(&self.binary, &args, self.timeout).await {
            Ok(output) => output,
            Err(ScanEngineError::Timeout { .. }) => {
                return ScanOutcome::Error(TIMED_OUT.to_owned());
            }
            Err(e) => return ScanOutcome::Error(e.to_string()),
        };

        if !output.success() {
            let message = output.diagnostic().unwrap_or(UNKNOWN_ERROR);
            return ScanOutcome::Error(message.to_owned());
        }

        let stdout = output.stdout.trim();
        if stdout.is_empty() {
            return ScanOutcome::Error(EMPTY_OUTPUT.to_owned());
        }

        match VulnerabilityReport::from_json(stdout) {
            Ok(report) => ScanOutcome::Success(report),
            Err(e) => {
                tracing::debug!(error = %e, "trivy output is not valid json");
                ScanOutcome::Error(PARSE_FAILURE.to_owned())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::MockToolRunner;

    fn adapter(runner: MockToolRunner) -> VulnerabilityAdapter<MockToolRunner> {
        VulnerabilityAdapter::new(Arc::new(runner), "trivy", Duration::from_secs(120), true)
    }

    fn image() -> ImageRef {
        ImageRef::parse("alpine:3.19").unwrap()
    }

    const REPORT: &str = r#"{"Results":[{"Target":"alpine","Vulnerabilities":[{"VulnerabilityID":"CVE-1","Severity":"HIGH"}]}]}"#;

    #[tokio::test]
    async fn success_parses_report() {
        let runner = MockToolRunner::new().with_output("trivy", 0, REPORT, "");
        let outcome = adapter(runner).scan(&image(), "s1").await;
        let report = outcome.success().unwrap();
        assert_eq!(report.severity_counts().high, 1);
    }

    #[tokio::test]
    async fn passes_structured_output_flags() {
        let runner = Arc::new(MockToolRunner::new().with_output("trivy", 0, REPORT, ""));
        let adapter =
            VulnerabilityAdapter::new(Arc::clone(&runner), "trivy", Duration::from_secs(1), true);
        adapter.scan(&image(), "s1").await;

        let calls = runner.calls();
        assert_eq!(
            calls[0].1,
            vec!["image", "--format", "json", "--quiet", "alpine:3.19"]
        );
    }

    #[tokio::test]
    async fn non_zero_exit_uses_stderr() {
        let runner = MockToolRunner::new().with_output("trivy", 1, "", "FATAL: image not found\n");
        let outcome = adapter(runner).scan(&image(), "s1").await;
        assert_eq!(outcome, ScanOutcome::Error("FATAL: image not found".to_owned()));
    }

    #[tokio::test]
    async fn non_zero_exit_without_output_is_unknown_error() {
        let runner = MockToolRunner::new().with_output("trivy", 2, "", "");
        let outcome = adapter(runner).scan(&image(), "s1").await;
        assert_eq!(outcome, ScanOutcome::Error(UNKNOWN_ERROR.to_owned()));
    }

    #[tokio::test]
    async fn empty_output_is_error() {
        let runner = MockToolRunner::new().with_output("trivy", 0, "  \n", "");
        let outcome = adapter(runner).scan(&image(), "s1").await;
        assert_eq!(outcome, ScanOutcome::Error(EMPTY_OUTPUT.to_owned()));
    }

    #[tokio::test]
    async fn malformed_json_is_parse_failure() {
        let runner = MockToolRunner::new().with_output("trivy", 0, "{not json", "");
        let outcome = adapter(runner).scan(&image(), "s1").await;
        assert_eq!(outcome, ScanOutcome::Error(PARSE_FAILURE.to_owned()));
    }

    #[tokio::test]
    async fn timeout_is_error() {
        let runner = MockToolRunner::new().with_timeout("trivy");
        let outcome = adapter(runner).scan(&image(), "s1").await;
        assert_eq!(outcome, ScanOutcome::Error(TIMED_OUT.to_owned()));
    }

    #[tokio::test]
    async fn missing_binary_is_error() {
        let outcome = adapter(MockToolRunner::new()).scan(&image(), "s1").await;
        assert!(outcome.is_error());
    }

    #[tokio::test]
    async fn disabled_adapter_warns_without_running() {
        let runner = Arc::new(MockToolRunner::new());
        let adapter =
            VulnerabilityAdapter::new(Arc::clone(&runner), "trivy", Duration::from_secs(1), false);
        let outcome = adapter.scan(&image(), "s1").await;
        assert_eq!(
            outcome,
            ScanOutcome::Warning("Trivy disabled by configuration".to_owned())
        );
        assert!(runner.calls().is_empty());
    }
}

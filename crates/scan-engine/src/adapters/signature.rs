//! YARA 시그니처 어댑터
//!
//! 스테이징된 추출 디렉토리 전체에 `yara -r <rules> <dir>`를 실행합니다.

use std::sync::Arc;
use std::time::Duration;

use crate::adapters::{disabled_warning, log_outcome};
use crate::archive::Archiver;
use crate::context::ScanContext;
use crate::error::ScanEngineError;
use crate::outcome::{AdapterKind, ScanOutcome, SignatureMatches};
use crate::runtime::ContainerRuntime;
use crate::stager::ArtifactStager;
use crate::tool::ToolRunner;

const TIMED_OUT: &str = "YARA scan timed out";

/// 시그니처 스캔 어댑터
pub struct SignatureAdapter<T: ToolRunner, R: ContainerRuntime, A: Archiver> {
    runner: Arc<T>,
    stager: Arc<ArtifactStager<R, A>>,
    binary: String,
    rules_path: String,
    timeout: Duration,
    enabled: bool,
}

impl<T: ToolRunner, R: ContainerRuntime, A: Archiver> SignatureAdapter<T, R, A> {
    /// 새 어댑터를 생성합니다.
    pub fn new(
        runner: Arc<T>,
        stager: Arc<ArtifactStager<R, A>>,
        binary: impl Into<String>,
        rules_path: impl Into<String>,
        timeout: Duration,
        enabled: bool,
    ) -> Self {
        Self {
            runner,
            stager,
            binary: binary.into(),
            rules_path: rules_path.into(),
            timeout,
            enabled,
        }
    }

    /// 추출된 이미지 파일 트리에서 악성 시그니처를 찾습니다.
    pub async fn scan(&self, ctx: &ScanContext) -> ScanOutcome<SignatureMatches> {
        let outcome = self.run(ctx).await;
        log_outcome(AdapterKind::Signature, ctx.scan_id(), &outcome);
        outcome
    }

    async fn run(&self, ctx: &ScanContext) -> ScanOutcome<SignatureMatches> {
        if !self.enabled {
            return ScanOutcome::Warning(disabled_warning(AdapterKind::Signature));
        }

        let staged = match self.stager.stage(ctx).await {
            Ok(staged) => staged,
            Err(e) => return ScanOutcome::Error(e.to_string()),
        };

        let args = vec![
            "-r".to_owned(),
            self.rules_path.clone(),
            staged.extract_dir.display().to_string(),
        ];

        let output = match self.runner.run(&self.binary, &args, self.timeout).await {
            Ok(output) => output,
            Err(ScanEngineError::Timeout { .. }) => {
                return ScanOutcome::Error(TIMED_OUT.to_owned());
            }
            Err(e) => return ScanOutcome::Error(e.to_string()),
        };

        // yara는 매치 여부와 무관하게 정상 종료 시 0을 반환
        if !output.success() {
            let message = output
                .diagnostic()
                .map(str::to_owned)
                .unwrap_or_else(|| exit_message(&self.binary, output.status));
            return ScanOutcome::Error(message);
        }

        ScanOutcome::Success(SignatureMatches::from_output(&output.stdout))
    }
}

pub(crate) fn exit_message(binary: &str, status: Option<i32>) -> String {
    match status {
        Some(code) => format!("{binary} exited with status {code}"),
        None => format!("{binary} terminated by signal"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::MockArchiver;
    use crate::runtime::MockRuntime;
    use crate::tool::MockToolRunner;
    use imagewarden_core::types::ImageRef;

    struct Fixture {
        _dir: tempfile::TempDir,
        ctx: ScanContext,
        runtime: Arc<MockRuntime>,
        stager: Arc<ArtifactStager<MockRuntime, MockArchiver>>,
    }

    fn fixture(runtime: MockRuntime) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ScanContext::new(ImageRef::parse("alpine:3.19").unwrap(), dir.path());
        let runtime = Arc::new(runtime);
        let stager = Arc::new(ArtifactStager::new(
            Arc::clone(&runtime),
            Arc::new(MockArchiver::new()),
            Duration::from_secs(5),
            Duration::from_secs(5),
            true,
        ));
        Fixture {
            _dir: dir,
            ctx,
            runtime,
            stager,
        }
    }

    fn adapter(
        runner: MockToolRunner,
        fx: &Fixture,
        enabled: bool,
    ) -> SignatureAdapter<MockToolRunner, MockRuntime, MockArchiver> {
        SignatureAdapter::new(
            Arc::new(runner),
            Arc::clone(&fx.stager),
            "yara",
            "rules/malware.yar",
            Duration::from_secs(30),
            enabled,
        )
    }

    #[tokio::test]
    async fn matches_are_collected() {
        let fx = fixture(MockRuntime::new());
        let runner =
            MockToolRunner::new().with_output("yara", 0, "CryptoMiner /tmp/x/bin/xmrig\n", "");
        let outcome = adapter(runner, &fx, true).scan(&fx.ctx).await;

        let matches = outcome.success().unwrap();
        assert!(matches.detected());
        assert_eq!(matches.matches, vec!["CryptoMiner /tmp/x/bin/xmrig"]);
    }

    #[tokio::test]
    async fn no_output_means_no_detection() {
        let fx = fixture(MockRuntime::new());
        let runner = MockToolRunner::new().with_output("yara", 0, "", "");
        let outcome = adapter(runner, &fx, true).scan(&fx.ctx).await;
        assert!(!outcome.success().unwrap().detected());
    }

    #[tokio::test]
    async fn scans_extract_dir_with_rules() {
        let fx = fixture(MockRuntime::new());
        let runner = Arc::new(MockToolRunner::new().with_output("yara", 0, "", ""));
        let adapter = SignatureAdapter::new(
            Arc::clone(&runner),
            Arc::clone(&fx.stager),
            "yara",
            "rules/malware.yar",
            Duration::from_secs(30),
            true,
        );
        adapter.scan(&fx.ctx).await;

        let calls = runner.calls();
        assert_eq!(calls[0].1[0], "-r");
        assert_eq!(calls[0].1[1], "rules/malware.yar");
        assert_eq!(
            calls[0].1[2],
            fx.ctx.artifact().extract_dir.display().to_string()
        );
    }

    #[tokio::test]
    async fn non_zero_exit_is_error() {
        let fx = fixture(MockRuntime::new());
        let runner = MockToolRunner::new().with_output(
            "yara",
            1,
            "",
            "error: could not open file: rules/malware.yar",
        );
        let outcome = adapter(runner, &fx, true).scan(&fx.ctx).await;
        assert_eq!(
            outcome,
            ScanOutcome::Error("error: could not open file: rules/malware.yar".to_owned())
        );
    }

    #[tokio::test]
    async fn staging_failure_is_error_without_running_tool() {
        let fx = fixture(MockRuntime::new().with_failing_save());
        let runner = Arc::new(MockToolRunner::new().with_output("yara", 0, "", ""));
        let adapter = SignatureAdapter::new(
            Arc::clone(&runner),
            Arc::clone(&fx.stager),
            "yara",
            "rules/malware.yar",
            Duration::from_secs(30),
            true,
        );

        let outcome = adapter.scan(&fx.ctx).await;
        assert!(outcome.is_error());
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn timeout_is_error() {
        let fx = fixture(MockRuntime::new());
        let runner = MockToolRunner::new().with_timeout("yara");
        let outcome = adapter(runner, &fx, true).scan(&fx.ctx).await;
        assert_eq!(outcome, ScanOutcome::Error(TIMED_OUT.to_owned()));
    }

    #[tokio::test]
    async fn disabled_adapter_does_not_stage() {
        let fx = fixture(MockRuntime::new());
        let outcome = adapter(MockToolRunner::new(), &fx, false)
            .scan(&fx.ctx)
            .await;
        assert_eq!(
            outcome,
            ScanOutcome::Warning("YARA disabled by configuration".to_owned())
        );
        assert_eq!(MockRuntime::count(&fx.runtime.save_calls), 0);
    }

    #[test]
    fn exit_message_formats() {
        assert_eq!(exit_message("yara", Some(2)), "yara exited with status 2");
        assert_eq!(exit_message("yara", None), "yara terminated by signal");
    }
}

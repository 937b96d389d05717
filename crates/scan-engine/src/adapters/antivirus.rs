//! ClamAV 안티바이러스 어댑터
//!
//! 시그니처 어댑터와 같은 스테이저를 공유하므로 추출은 한 번만 일어납니다.
//! `clamscan -r -i --no-summary <dir>`의 종료 코드는 0(깨끗함), 1(감염 발견),
//! 2(에러)입니다.

use std::sync::Arc;
use std::time::Duration;

use crate::adapters::signature::exit_message;
use crate::adapters::{disabled_warning, log_outcome};
use crate::archive::Archiver;
use crate::context::ScanContext;
use crate::error::ScanEngineError;
use crate::outcome::{AdapterKind, AntivirusReport, ScanOutcome};
use crate::runtime::ContainerRuntime;
use crate::stager::ArtifactStager;
use crate::tool::ToolRunner;

const TIMED_OUT: &str = "ClamAV scan timed out";

/// clamscan "virus(es) found" 종료 코드
const EXIT_INFECTED: i32 = 1;

/// 안티바이러스 스캔 어댑터
pub struct AntivirusAdapter<T: ToolRunner, R: ContainerRuntime, A: Archiver> {
    runner: Arc<T>,
    stager: Arc<ArtifactStager<R, A>>,
    binary: String,
    timeout: Duration,
    enabled: bool,
}

impl<T: ToolRunner, R: ContainerRuntime, A: Archiver> AntivirusAdapter<T, R, A> {
    /// 새 어댑터를 생성합니다.
    pub fn new(
        runner: Arc<T>,
        stager: Arc<ArtifactStager<R, A>>,
        binary: impl Into<String>,
        timeout: Duration,
        enabled: bool,
    ) -> Self {
        Self {
            runner,
            stager,
            binary: binary.into(),
            timeout,
            enabled,
        }
    }

    /// 추출된 이미지 파일 트리에서 감염 파일을 찾습니다.
    pub async fn scan(&self, ctx: &ScanContext) -> ScanOutcome<AntivirusReport> {
        let outcome = self.run(ctx).await;
        log_outcome(AdapterKind::Antivirus, ctx.scan_id(), &outcome);
        outcome
    }

    async fn run(&self, ctx: &ScanContext) -> ScanOutcome<AntivirusReport> {
        if !self.enabled {
            return ScanOutcome::Warning(disabled_warning(AdapterKind::Antivirus));
        }

        let staged = match self.stager.stage(ctx).await {
            Ok(staged) => staged,
            Err(e) => return ScanOutcome::Error(e.to_string()),
        };

        let args = vec![
            "-r".to_owned(),
            "-i".to_owned(),
            "--no-summary".to_owned(),
            staged.extract_dir.display().to_string(),
        ];

        let output = match self.runner.run(&self.binary, &args, self.timeout).await {
            Ok(output) => output,
            Err(ScanEngineError::Timeout { .. }) => {
                return ScanOutcome::Error(TIMED_OUT.to_owned());
            }
            Err(e) => return ScanOutcome::Error(e.to_string()),
        };

        match output.status {
            Some(0) | Some(EXIT_INFECTED) => {
                ScanOutcome::Success(AntivirusReport::from_output(&output.stdout))
            }
            status => {
                let message = output
                    .diagnostic()
                    .map(str::to_owned)
                    .unwrap_or_else(|| exit_message(&self.binary, status));
                ScanOutcome::Error(message)
            }
        }
    }
}

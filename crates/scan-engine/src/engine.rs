//! 스캔 엔진 오케스트레이터 -- 이미지 확인부터 위험 평가까지 전체 흐름 관리
//!
//! # 내부 아키텍처
//! ```text
//! raw image ──> ImageRef::parse ──> ImageResolver.ensure
//!                                        │
//!                                   ScanContext
//!                                        │
//!        ┌──────────────┬────────────────┼──────────────────┐
//!        ▼              ▼                ▼                  ▼
//!  Vulnerability    Signature        Antivirus        Sandbox launch
//!   (trivy)          (yara)          (clamscan)             │
//!                       └─ ArtifactStager ─┘          RuntimeAlerts
//!                          (스캔당 1회)                      │
//!                                                      Sandbox stop
//!        └──────────────┴────────────────┴──────────────────┘
//!                                        │
//!                                   aggregate ──> cleanup ──> ScanReport
//! ```
//!
//! 네 갈래는 `tokio::join!`으로 동시에 실행됩니다. 어댑터 실패는 파이프라인을
//! 중단하지 않고 `ScanOutcome`으로 위험 평가에 반영됩니다.

use std::sync::Arc;
use std::time::{Duration, Instant};

use imagewarden_core::metrics as m;
use imagewarden_core::types::ImageRef;
use tracing::{info, warn};

use crate::adapters::runtime_alert::DYNAMIC_DISABLED;
use crate::adapters::{
    AntivirusAdapter, RuntimeAlertAdapter, SignatureAdapter, VulnerabilityAdapter, log_outcome,
};
use crate::aggregator::aggregate;
use crate::archive::{Archiver, TarArchiver};
use crate::cleanup::cleanup;
use crate::config::ScanEngineConfig;
use crate::context::ScanContext;
use crate::error::{ScanEngineError, ScanError};
use crate::outcome::{AdapterKind, RuntimeAlerts, ScanOutcome};
use crate::report::ScanReport;
use crate::resolver::ImageResolver;
use crate::runtime::ContainerRuntime;
use crate::sandbox::SandboxController;
use crate::stager::ArtifactStager;
use crate::tool::{ProcessToolRunner, ToolRunner};

/// 스캔 엔진
///
/// # 사용 예시
/// ```ignore
/// use std::sync::Arc;
/// use imagewarden_scan_engine::{BollardRuntime, ScanEngineBuilder};
///
/// let engine = ScanEngineBuilder::new()
///     .config(config)
///     .runtime(Arc::new(BollardRuntime::connect_local()?))
///     .build()?;
///
/// let report = engine.run_scan("nginx latest").await?;
/// println!("{} ({})", report.risk.score, report.risk.level);
/// ```
pub struct ScanEngine<R: ContainerRuntime, T: ToolRunner = ProcessToolRunner, A: Archiver = TarArchiver>
{
    config: ScanEngineConfig,
    runtime: Arc<R>,
    resolver: ImageResolver<R>,
    vulnerability: VulnerabilityAdapter<T>,
    signature: SignatureAdapter<T, R, A>,
    antivirus: AntivirusAdapter<T, R, A>,
    sandbox: SandboxController<R>,
    runtime_alerts: RuntimeAlertAdapter,
}

impl<R: ContainerRuntime, T: ToolRunner, A: Archiver> ScanEngine<R, T, A> {
    /// 엔진 설정
    pub fn config(&self) -> &ScanEngineConfig {
        &self.config
    }

    /// 컨테이너 런타임 연결을 확인합니다.
    ///
    /// # Errors
    ///
    /// 데몬에 연결할 수 없으면 `ScanEngineError::DockerConnection`을 반환합니다.
    pub async fn ping(&self) -> Result<(), ScanEngineError> {
        self.runtime.ping().await
    }

    /// 이미지 하나를 스캔하고 보고서를 반환합니다.
    ///
    /// # Errors
    ///
    /// - `ScanError::InvalidImageRef`: 입력이 비어 있음
    /// - `ScanError::ResolutionFailure`: 이미지가 없고 pull도 실패함 (어댑터는 실행되지 않음)
    pub async fn run_scan(&self, raw: &str) -> Result<ScanReport, ScanError> {
        let started = Instant::now();

        let image = match ImageRef::parse(raw) {
            Ok(image) => image,
            Err(e) => {
                metrics::counter!(m::SCANS_TOTAL, m::LABEL_RESULT => "invalid_image").increment(1);
                return Err(e.into());
            }
        };

        if !self.resolver.ensure(&image).await {
            warn!(image = %image, "image resolution failed, aborting scan");
            metrics::counter!(m::SCANS_TOTAL, m::LABEL_RESULT => "resolution_failure")
                .increment(1);
            return Err(ScanError::ResolutionFailure {
                image: image.as_str().to_owned(),
            });
        }

        let ctx = ScanContext::new(image, &self.config.work_dir);
        info!(image = %ctx.image(), scan_id = ctx.scan_id(), "scan started");

        let (vulnerability, signature, antivirus, runtime) = tokio::join!(
            self.vulnerability.scan(ctx.image(), ctx.scan_id()),
            self.signature.scan(&ctx),
            self.antivirus.scan(&ctx),
            self.dynamic_analysis(&ctx),
        );

        let risk = aggregate(&vulnerability, &signature, &antivirus, &runtime);
        let cleanup = cleanup(&ctx, self.config.keep_artifacts).await;

        let elapsed = started.elapsed();
        let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        record_metrics(
            &[
                (AdapterKind::Vulnerability, vulnerability.status_name()),
                (AdapterKind::Signature, signature.status_name()),
                (AdapterKind::Antivirus, antivirus.status_name()),
                (AdapterKind::Runtime, runtime.status_name()),
            ],
            risk.score,
            elapsed,
        );

        info!(
            image = %ctx.image(),
            scan_id = ctx.scan_id(),
            score = risk.score,
            level = %risk.level,
            high_priority = risk.high_priority.len(),
            duration_ms,
            "scan completed"
        );

        Ok(ScanReport {
            image: ctx.image().clone(),
            scan_id: ctx.scan_id().to_owned(),
            vulnerability,
            signature,
            antivirus,
            runtime,
            risk,
            cleanup,
            duration_ms,
        })
    }

    /// 샌드박스 실행 -> 알림 수집 -> 정지.
    ///
    /// 정지는 수집 결과와 무관하게 항상 수행됩니다.
    async fn dynamic_analysis(&self, ctx: &ScanContext) -> ScanOutcome<RuntimeAlerts> {
        let outcome = if self.config.sandbox_enabled {
            let handle = self.sandbox.launch(ctx.image()).await;
            let outcome = self.runtime_alerts.collect(handle.as_ref()).await;
            if let Some(handle) = &handle {
                self.sandbox.stop(handle).await;
            }
            outcome
        } else {
            ScanOutcome::Warning(DYNAMIC_DISABLED.to_owned())
        };

        log_outcome(AdapterKind::Runtime, ctx.scan_id(), &outcome);
        outcome
    }
}

fn record_metrics(statuses: &[(AdapterKind, &'static str)], score: u8, elapsed: Duration) {
    metrics::counter!(m::SCANS_TOTAL, m::LABEL_RESULT => "completed").increment(1);
    for (kind, status) in statuses {
        metrics::counter!(
            m::ADAPTER_OUTCOMES_TOTAL,
            m::LABEL_ADAPTER => kind.label(),
            m::LABEL_STATUS => *status
        )
        .increment(1);
    }
    metrics::histogram!(m::SCAN_DURATION_SECONDS).record(elapsed.as_secs_f64());
    metrics::gauge!(m::RISK_SCORE).set(f64::from(score));
}

/// 스캔 엔진 빌더
///
/// 컨테이너 런타임은 필수입니다. 도구 실행기와 아카이버는 기본값
/// ([`ProcessToolRunner`], [`TarArchiver`])을 사용하며 테스트에서 교체할 수 있습니다.
pub struct ScanEngineBuilder<R: ContainerRuntime, T: ToolRunner = ProcessToolRunner, A: Archiver = TarArchiver>
{
    config: ScanEngineConfig,
    runtime: Option<Arc<R>>,
    tool_runner: Arc<T>,
    archiver: Arc<A>,
}

impl<R: ContainerRuntime> ScanEngineBuilder<R> {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: ScanEngineConfig::default(),
            runtime: None,
            tool_runner: Arc::new(ProcessToolRunner),
            archiver: Arc::new(TarArchiver),
        }
    }
}

impl<R: ContainerRuntime> Default for ScanEngineBuilder<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ContainerRuntime, T: ToolRunner, A: Archiver> ScanEngineBuilder<R, T, A> {
    /// 엔진 설정을 지정합니다.
    pub fn config(mut self, config: ScanEngineConfig) -> Self {
        self.config = config;
        self
    }

    /// 컨테이너 런타임을 설정합니다.
    pub fn runtime(mut self, runtime: Arc<R>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// 외부 도구 실행기를 교체합니다.
    pub fn tool_runner<T2: ToolRunner>(self, runner: Arc<T2>) -> ScanEngineBuilder<R, T2, A> {
        ScanEngineBuilder {
            config: self.config,
            runtime: self.runtime,
            tool_runner: runner,
            archiver: self.archiver,
        }
    }

    /// 아카이버를 교체합니다.
    pub fn archiver<A2: Archiver>(self, archiver: Arc<A2>) -> ScanEngineBuilder<R, T, A2> {
        ScanEngineBuilder {
            config: self.config,
            runtime: self.runtime,
            tool_runner: self.tool_runner,
            archiver,
        }
    }

    /// 엔진을 빌드합니다.
    ///
    /// # Errors
    ///
    /// 설정 검증에 실패하거나 런타임이 지정되지 않으면 `ScanEngineError::Config`를 반환합니다.
    pub fn build(self) -> Result<ScanEngine<R, T, A>, ScanEngineError> {
        self.config.validate()?;

        let runtime = self.runtime.ok_or_else(|| ScanEngineError::Config {
            field: "runtime".to_owned(),
            reason: "container runtime must be provided".to_owned(),
        })?;
        let config = self.config;

        let stager = Arc::new(ArtifactStager::new(
            Arc::clone(&runtime),
            self.archiver,
            Duration::from_secs(config.save_timeout_secs),
            Duration::from_secs(config.extract_timeout_secs),
            config.reuse_existing_extraction,
        ));

        let resolver = ImageResolver::new(Arc::clone(&runtime), config.pull_timeout());
        let vulnerability = VulnerabilityAdapter::new(
            Arc::clone(&self.tool_runner),
            config.trivy_binary.clone(),
            Duration::from_secs(config.vulnerability_timeout_secs),
            config.vulnerability_enabled,
        );
        let signature = SignatureAdapter::new(
            Arc::clone(&self.tool_runner),
            Arc::clone(&stager),
            config.yara_binary.clone(),
            config.yara_rules_path.clone(),
            Duration::from_secs(config.signature_timeout_secs),
            config.signature_enabled,
        );
        let antivirus = AntivirusAdapter::new(
            Arc::clone(&self.tool_runner),
            stager,
            config.clamscan_binary.clone(),
            Duration::from_secs(config.antivirus_timeout_secs),
            config.antivirus_enabled,
        );
        let sandbox = SandboxController::new(
            Arc::clone(&runtime),
            config.observation_window(),
            config.sandbox_name_prefix.clone(),
        );
        let runtime_alerts = RuntimeAlertAdapter::new(
            config.alert_log_path.clone(),
            config.alert_tail_lines,
            Duration::from_secs(config.collect_timeout_secs),
        );

        Ok(ScanEngine {
            config,
            runtime,
            resolver,
            vulnerability,
            signature,
            antivirus,
            sandbox,
            runtime_alerts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::MockArchiver;
    use crate::config::ScanEngineConfigBuilder;
    use crate::runtime::{MockRuntime, MockStopError};
    use crate::tool::MockToolRunner;
    use imagewarden_core::types::RiskLevel;

    const CLEAN_TRIVY: &str = r#"{"Results":[]}"#;

    fn config(work_dir: &std::path::Path, sandbox: bool) -> ScanEngineConfig {
        ScanEngineConfigBuilder::new()
            .work_dir(work_dir)
            .sandbox_enabled(sandbox)
            .observation_window_secs(0)
            .alert_log_path(work_dir.join("falco.log"))
            .build()
            .unwrap()
    }

    fn clean_tools() -> MockToolRunner {
        MockToolRunner::new()
            .with_output("trivy", 0, CLEAN_TRIVY, "")
            .with_output("yara", 0, "", "")
            .with_output("clamscan", 0, "", "")
    }

    fn engine(
        runtime: &Arc<MockRuntime>,
        tools: MockToolRunner,
        config: ScanEngineConfig,
    ) -> ScanEngine<MockRuntime, MockToolRunner, MockArchiver> {
        ScanEngineBuilder::new()
            .config(config)
            .runtime(Arc::clone(runtime))
            .tool_runner(Arc::new(tools))
            .archiver(Arc::new(MockArchiver::new()))
            .build()
            .unwrap()
    }

    #[test]
    fn build_without_runtime_fails() {
        let result = ScanEngineBuilder::<MockRuntime>::new().build();
        assert!(matches!(result, Err(ScanEngineError::Config { .. })));
    }

    #[test]
    fn build_with_invalid_config_fails() {
        let mut config = ScanEngineConfig::default();
        config.alert_tail_lines = 0;
        let result = ScanEngineBuilder::new()
            .config(config)
            .runtime(Arc::new(MockRuntime::new()))
            .build();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn empty_image_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = Arc::new(MockRuntime::new());
        let engine = engine(&runtime, clean_tools(), config(dir.path(), false));

        let err = engine.run_scan("   ").await.unwrap_err();
        assert!(matches!(err, ScanError::InvalidImageRef(_)));
        assert_eq!(MockRuntime::count(&runtime.inspect_calls), 0);
    }

    #[tokio::test]
    async fn resolution_failure_aborts_before_adapters() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = Arc::new(MockRuntime::new().without_local_image());
        let engine = engine(&runtime, clean_tools(), config(dir.path(), true));

        let err = engine.run_scan("nosuchimage").await.unwrap_err();

        assert_eq!(
            err,
            ScanError::ResolutionFailure {
                image: "nosuchimage".to_owned()
            }
        );
        assert_eq!(MockRuntime::count(&runtime.save_calls), 0);
        assert_eq!(MockRuntime::count(&runtime.run_calls), 0);
    }

    #[tokio::test]
    async fn clean_scan_is_low_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("falco.log"), "").unwrap();
        let runtime = Arc::new(MockRuntime::new());
        let engine = engine(&runtime, clean_tools(), config(dir.path(), true));

        let report = engine.run_scan("alpine 3.19").await.unwrap();

        assert_eq!(report.image.as_str(), "alpine:3.19");
        assert_eq!(report.risk.level, RiskLevel::Low);
        assert_eq!(report.risk.findings.len(), 4);
        assert!(report.cleanup.removed_dir);
        assert!(report.cleanup.removed_archive);
        assert_eq!(MockRuntime::count(&runtime.save_calls), 1);
        assert_eq!(MockRuntime::count(&runtime.stop_calls), 1);
    }

    #[tokio::test]
    async fn disabled_sandbox_is_warning() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = Arc::new(MockRuntime::new());
        let engine = engine(&runtime, clean_tools(), config(dir.path(), false));

        let report = engine.run_scan("alpine:3.19").await.unwrap();

        assert_eq!(
            report.runtime,
            ScanOutcome::Warning(DYNAMIC_DISABLED.to_owned())
        );
        assert_eq!(MockRuntime::count(&runtime.run_calls), 0);
    }

    #[tokio::test]
    async fn sandbox_stopped_even_when_stop_reports_gone() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = Arc::new(MockRuntime::new().with_stop_error(MockStopError::NotFound));
        let engine = engine(&runtime, clean_tools(), config(dir.path(), true));

        // 로그 파일이 없어 수집은 Warning
        let report = engine.run_scan("alpine:3.19").await.unwrap();

        assert!(matches!(report.runtime, ScanOutcome::Warning(_)));
        assert_eq!(MockRuntime::count(&runtime.stop_calls), 1);
    }

    #[tokio::test]
    async fn ping_delegates_to_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = Arc::new(MockRuntime::new());
        let engine = engine(&runtime, clean_tools(), config(dir.path(), false));
        assert!(engine.ping().await.is_ok());
        assert!(!engine.config().sandbox_enabled);
    }
}

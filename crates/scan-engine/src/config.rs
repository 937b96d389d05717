//! 스캔 엔진 설정
//!
//! [`ScanEngineConfig`]는 core의 [`WardenConfig`]를 엔진 구성요소가 바로 쓸 수 있는
//! 평면 구조로 변환한 설정입니다.
//!
//! # 사용 예시
//! ```ignore
//! use imagewarden_core::config::WardenConfig;
//! use imagewarden_scan_engine::config::ScanEngineConfig;
//!
//! let core_config = WardenConfig::default();
//! let config = ScanEngineConfig::from_core(&core_config);
//! ```

use std::path::PathBuf;
use std::time::Duration;

use imagewarden_core::config::WardenConfig;
use serde::{Deserialize, Serialize};

use crate::error::ScanEngineError;

/// 설정 상한값 상수
const MAX_TIMEOUT_SECS: u64 = 3600;
const MAX_OBSERVATION_WINDOW_SECS: u64 = 600;
const MAX_TAIL_LINES: usize = 10_000;

/// 스캔 엔진 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanEngineConfig {
    /// 스테이징 작업 디렉토리
    pub work_dir: PathBuf,

    // --- 이미지 확인 / 스테이징 ---
    /// 이미지 pull 타임아웃 (초)
    pub pull_timeout_secs: u64,
    /// `docker save` 타임아웃 (초)
    pub save_timeout_secs: u64,
    /// 아카이브 추출 타임아웃 (초)
    pub extract_timeout_secs: u64,
    /// 기존 추출 디렉토리 재사용 여부
    pub reuse_existing_extraction: bool,

    // --- 정적 분석 ---
    /// 취약점 스캐너 활성화
    pub vulnerability_enabled: bool,
    /// trivy 실행 파일
    pub trivy_binary: String,
    /// 취약점 스캔 타임아웃 (초)
    pub vulnerability_timeout_secs: u64,
    /// 시그니처 스캐너 활성화
    pub signature_enabled: bool,
    /// yara 실행 파일
    pub yara_binary: String,
    /// YARA 룰 파일 경로
    pub yara_rules_path: String,
    /// 시그니처 스캔 타임아웃 (초)
    pub signature_timeout_secs: u64,
    /// 안티바이러스 활성화
    pub antivirus_enabled: bool,
    /// clamscan 실행 파일
    pub clamscan_binary: String,
    /// 안티바이러스 스캔 타임아웃 (초)
    pub antivirus_timeout_secs: u64,

    // --- 동적 분석 ---
    /// 샌드박스 활성화
    pub sandbox_enabled: bool,
    /// 관찰 윈도우 (초)
    pub observation_window_secs: u64,
    /// 샌드박스 컨테이너 이름 접두어
    pub sandbox_name_prefix: String,
    /// Falco 알림 로그 경로
    pub alert_log_path: PathBuf,
    /// 읽어올 알림 라인 수
    pub alert_tail_lines: usize,
    /// 알림 수집 타임아웃 (초)
    pub collect_timeout_secs: u64,

    // --- 정리 ---
    /// 스캔 후 아티팩트 보존 여부
    pub keep_artifacts: bool,
}

impl Default for ScanEngineConfig {
    fn default() -> Self {
        Self::from_core(&WardenConfig::default())
    }
}

impl ScanEngineConfig {
    /// core의 `WardenConfig`에서 엔진 설정을 생성합니다.
    pub fn from_core(core: &WardenConfig) -> Self {
        Self {
            work_dir: PathBuf::from(&core.general.work_dir),
            pull_timeout_secs: core.docker.pull_timeout_secs,
            save_timeout_secs: core.stage.save_timeout_secs,
            extract_timeout_secs: core.stage.extract_timeout_secs,
            reuse_existing_extraction: core.stage.reuse_existing_extraction,
            vulnerability_enabled: core.vulnerability.enabled,
            trivy_binary: core.vulnerability.binary.clone(),
            vulnerability_timeout_secs: core.vulnerability.timeout_secs,
            signature_enabled: core.signature.enabled,
            yara_binary: core.signature.binary.clone(),
            yara_rules_path: core.signature.rules_path.clone(),
            signature_timeout_secs: core.signature.timeout_secs,
            antivirus_enabled: core.antivirus.enabled,
            clamscan_binary: core.antivirus.binary.clone(),
            antivirus_timeout_secs: core.antivirus.timeout_secs,
            sandbox_enabled: core.sandbox.enabled,
            observation_window_secs: core.sandbox.observation_window_secs,
            sandbox_name_prefix: core.sandbox.name_prefix.clone(),
            alert_log_path: PathBuf::from(&core.runtime.alert_log_path),
            alert_tail_lines: core.runtime.tail_lines,
            collect_timeout_secs: core.runtime.collect_timeout_secs,
            keep_artifacts: core.cleanup.keep_artifacts,
        }
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ScanEngineError> {
        if self.work_dir.as_os_str().is_empty() {
            return Err(config_error("work_dir", "must not be empty".to_owned()));
        }

        for (field, secs) in [
            ("pull_timeout_secs", self.pull_timeout_secs),
            ("save_timeout_secs", self.save_timeout_secs),
            ("extract_timeout_secs", self.extract_timeout_secs),
            ("vulnerability_timeout_secs", self.vulnerability_timeout_secs),
            ("signature_timeout_secs", self.signature_timeout_secs),
            ("antivirus_timeout_secs", self.antivirus_timeout_secs),
            ("collect_timeout_secs", self.collect_timeout_secs),
        ] {
            if secs == 0 || secs > MAX_TIMEOUT_SECS {
                return Err(config_error(field, format!("must be 1-{MAX_TIMEOUT_SECS}")));
            }
        }

        if self.vulnerability_enabled && self.trivy_binary.is_empty() {
            return Err(config_error(
                "trivy_binary",
                "trivy_binary must not be empty when enabled".to_owned(),
            ));
        }
        if self.signature_enabled && self.yara_binary.is_empty() {
            return Err(config_error(
                "yara_binary",
                "yara_binary must not be empty when enabled".to_owned(),
            ));
        }
        if self.signature_enabled && self.yara_rules_path.is_empty() {
            return Err(config_error(
                "yara_rules_path",
                "yara_rules_path must not be empty when enabled".to_owned(),
            ));
        }
        if self.antivirus_enabled && self.clamscan_binary.is_empty() {
            return Err(config_error(
                "clamscan_binary",
                "clamscan_binary must not be empty when enabled".to_owned(),
            ));
        }

        if self.observation_window_secs > MAX_OBSERVATION_WINDOW_SECS {
            return Err(config_error(
                "observation_window_secs",
                format!("must be 0-{MAX_OBSERVATION_WINDOW_SECS}"),
            ));
        }
        if self.sandbox_enabled && self.sandbox_name_prefix.is_empty() {
            return Err(config_error(
                "sandbox_name_prefix",
                "sandbox_name_prefix must not be empty when enabled".to_owned(),
            ));
        }

        if self.alert_tail_lines == 0 || self.alert_tail_lines > MAX_TAIL_LINES {
            return Err(config_error(
                "alert_tail_lines",
                format!("must be 1-{MAX_TAIL_LINES}"),
            ));
        }

        Ok(())
    }

    /// pull 타임아웃
    pub fn pull_timeout(&self) -> Duration {
        Duration::from_secs(self.pull_timeout_secs)
    }

    /// 관찰 윈도우
    pub fn observation_window(&self) -> Duration {
        Duration::from_secs(self.observation_window_secs)
    }
}

fn config_error(field: &str, reason: String) -> ScanEngineError {
    ScanEngineError::Config {
        field: field.to_owned(),
        reason,
    }
}

/// 스캔 엔진 설정 빌더
#[derive(Default)]
pub struct ScanEngineConfigBuilder {
    config: ScanEngineConfig,
}

impl ScanEngineConfigBuilder {
    /// 기본값으로 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 작업 디렉토리를 설정합니다.
    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.work_dir = dir.into();
        self
    }

    /// pull 타임아웃(초)을 설정합니다.
    pub fn pull_timeout_secs(mut self, secs: u64) -> Self {
        self.config.pull_timeout_secs = secs;
        self
    }

    /// `docker save` 타임아웃(초)을 설정합니다.
    pub fn save_timeout_secs(mut self, secs: u64) -> Self {
        self.config.save_timeout_secs = secs;
        self
    }

    /// 추출 타임아웃(초)을 설정합니다.
    pub fn extract_timeout_secs(mut self, secs: u64) -> Self {
        self.config.extract_timeout_secs = secs;
        self
    }

    /// 기존 추출 디렉토리 재사용 여부를 설정합니다.
    pub fn reuse_existing_extraction(mut self, reuse: bool) -> Self {
        self.config.reuse_existing_extraction = reuse;
        self
    }

    /// 취약점 스캐너 활성화 여부를 설정합니다.
    pub fn vulnerability_enabled(mut self, enabled: bool) -> Self {
        self.config.vulnerability_enabled = enabled;
        self
    }

    /// trivy 실행 파일을 설정합니다.
    pub fn trivy_binary(mut self, binary: impl Into<String>) -> Self {
        self.config.trivy_binary = binary.into();
        self
    }

    /// 취약점 스캔 타임아웃(초)을 설정합니다.
    pub fn vulnerability_timeout_secs(mut self, secs: u64) -> Self {
        self.config.vulnerability_timeout_secs = secs;
        self
    }

    /// 시그니처 스캐너 활성화 여부를 설정합니다.
    pub fn signature_enabled(mut self, enabled: bool) -> Self {
        self.config.signature_enabled = enabled;
        self
    }

    /// yara 실행 파일을 설정합니다.
    pub fn yara_binary(mut self, binary: impl Into<String>) -> Self {
        self.config.yara_binary = binary.into();
        self
    }

    /// YARA 룰 파일 경로를 설정합니다.
    pub fn yara_rules_path(mut self, path: impl Into<String>) -> Self {
        self.config.yara_rules_path = path.into();
        self
    }

    /// 시그니처 스캔 타임아웃(초)을 설정합니다.
    pub fn signature_timeout_secs(mut self, secs: u64) -> Self {
        self.config.signature_timeout_secs = secs;
        self
    }

    /// 안티바이러스 활성화 여부를 설정합니다.
    pub fn antivirus_enabled(mut self, enabled: bool) -> Self {
        self.config.antivirus_enabled = enabled;
        self
    }

    /// clamscan 실행 파일을 설정합니다.
    pub fn clamscan_binary(mut self, binary: impl Into<String>) -> Self {
        self.config.clamscan_binary = binary.into();
        self
    }

    /// 안티바이러스 스캔 타임아웃(초)을 설정합니다.
    pub fn antivirus_timeout_secs(mut self, secs: u64) -> Self {
        self.config.antivirus_timeout_secs = secs;
        self
    }

    /// 샌드박스 활성화 여부를 설정합니다.
    pub fn sandbox_enabled(mut self, enabled: bool) -> Self {
        self.config.sandbox_enabled = enabled;
        self
    }

    /// 관찰 윈도우(초)를 설정합니다.
    pub fn observation_window_secs(mut self, secs: u64) -> Self {
        self.config.observation_window_secs = secs;
        self
    }

    /// 샌드박스 이름 접두어를 설정합니다.
    pub fn sandbox_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.sandbox_name_prefix = prefix.into();
        self
    }

    /// Falco 알림 로그 경로를 설정합니다.
    pub fn alert_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.alert_log_path = path.into();
        self
    }

    /// 읽어올 알림 라인 수를 설정합니다.
    pub fn alert_tail_lines(mut self, lines: usize) -> Self {
        self.config.alert_tail_lines = lines;
        self
    }

    /// 알림 수집 타임아웃(초)을 설정합니다.
    pub fn collect_timeout_secs(mut self, secs: u64) -> Self {
        self.config.collect_timeout_secs = secs;
        self
    }

    /// 아티팩트 보존 여부를 설정합니다.
    pub fn keep_artifacts(mut self, keep: bool) -> Self {
        self.config.keep_artifacts = keep;
        self
    }

    /// 설정을 검증하고 `ScanEngineConfig`를 생성합니다.
    pub fn build(self) -> Result<ScanEngineConfig, ScanEngineError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        ScanEngineConfig::default().validate().unwrap();
    }

    #[test]
    fn from_core_preserves_values() {
        let mut core = WardenConfig::default();
        core.general.work_dir = "/var/tmp/imagewarden".to_owned();
        core.signature.rules_path = "/etc/yara/rules.yar".to_owned();
        core.sandbox.enabled = false;
        core.runtime.tail_lines = 50;
        core.cleanup.keep_artifacts = true;

        let config = ScanEngineConfig::from_core(&core);
        assert_eq!(config.work_dir, PathBuf::from("/var/tmp/imagewarden"));
        assert_eq!(config.yara_rules_path, "/etc/yara/rules.yar");
        assert!(!config.sandbox_enabled);
        assert_eq!(config.alert_tail_lines, 50);
        assert!(config.keep_artifacts);
        assert_eq!(config.vulnerability_timeout_secs, 120);
        assert_eq!(config.signature_timeout_secs, 30);
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let config = ScanEngineConfig {
            signature_timeout_secs: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("signature_timeout_secs"));
    }

    #[test]
    fn validate_rejects_excessive_timeout() {
        let config = ScanEngineConfig {
            pull_timeout_secs: MAX_TIMEOUT_SECS + 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_binary_when_enabled() {
        let config = ScanEngineConfig {
            clamscan_binary: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_accepts_empty_binary_when_disabled() {
        let config = ScanEngineConfig {
            trivy_binary: String::new(),
            vulnerability_enabled: false,
            ..Default::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_zero_tail_lines() {
        let config = ScanEngineConfig {
            alert_tail_lines: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn builder_creates_valid_config() {
        let config = ScanEngineConfigBuilder::new()
            .work_dir("/scratch")
            .observation_window_secs(0)
            .sandbox_enabled(false)
            .alert_tail_lines(100)
            .build()
            .unwrap();
        assert_eq!(config.work_dir, PathBuf::from("/scratch"));
        assert_eq!(config.observation_window(), Duration::ZERO);
        assert_eq!(config.alert_tail_lines, 100);
    }

    #[test]
    fn builder_rejects_invalid_config() {
        let result = ScanEngineConfigBuilder::new()
            .observation_window_secs(MAX_OBSERVATION_WINDOW_SECS + 1)
            .build();
        assert!(result.is_err());
    }
}

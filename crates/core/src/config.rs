//! 설정 관리 -- imagewarden.toml 파싱 및 런타임 설정
//!
//! [`WardenConfig`]는 스캔 엔진의 모든 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`IMAGEWARDEN_SANDBOX_ENABLED=false` 형식)
//! 3. 설정 파일 (`imagewarden.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), imagewarden_core::error::WardenError> {
//! use imagewarden_core::config::WardenConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = WardenConfig::load("imagewarden.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = WardenConfig::parse("[sandbox]\nenabled = false")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, WardenError};

/// 타임아웃 상한값 (초)
const MAX_TIMEOUT_SECS: u64 = 3600;
/// 관찰 윈도우 상한값 (초)
const MAX_OBSERVATION_WINDOW_SECS: u64 = 600;
/// 알림 로그 tail 라인 상한
const MAX_TAIL_LINES: usize = 10_000;

/// imagewarden 통합 설정
///
/// `imagewarden.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WardenConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 컨테이너 런타임 설정
    #[serde(default)]
    pub docker: DockerConfig,
    /// 아티팩트 스테이징 설정
    #[serde(default)]
    pub stage: StageConfig,
    /// 취약점 스캐너 (Trivy) 설정
    #[serde(default)]
    pub vulnerability: VulnerabilityConfig,
    /// 시그니처 스캐너 (YARA) 설정
    #[serde(default)]
    pub signature: SignatureConfig,
    /// 안티바이러스 (ClamAV) 설정
    #[serde(default)]
    pub antivirus: AntivirusConfig,
    /// 동적 샌드박스 설정
    #[serde(default)]
    pub sandbox: SandboxConfig,
    /// 런타임 알림 (Falco) 설정
    #[serde(default)]
    pub runtime: RuntimeConfig,
    /// 정리 설정
    #[serde(default)]
    pub cleanup: CleanupConfig,
}

impl WardenConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    /// 3. 유효성 검증
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, WardenError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 파일이 없으면 기본값에서 시작하여 설정을 로드합니다.
    ///
    /// CLI에서 설정 파일 없이 바로 스캔할 수 있도록 사용합니다.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, WardenError> {
        let path = path.as_ref();
        let mut config = match Self::from_file(path).await {
            Ok(config) => config,
            Err(WardenError::Config(ConfigError::FileNotFound { .. })) => {
                tracing::debug!(path = %path.display(), "config file not found, using defaults");
                Self::default()
            }
            Err(e) => return Err(e),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, WardenError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                WardenError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                WardenError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, WardenError> {
        toml::from_str(toml_str).map_err(|e| {
            WardenError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `IMAGEWARDEN_{SECTION}_{FIELD}`
    /// 예: `IMAGEWARDEN_RUNTIME_ALERT_LOG_PATH=/var/log/falco/events.log`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "IMAGEWARDEN_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "IMAGEWARDEN_GENERAL_LOG_FORMAT");
        override_string(&mut self.general.work_dir, "IMAGEWARDEN_GENERAL_WORK_DIR");

        // Docker
        override_string(&mut self.docker.socket, "IMAGEWARDEN_DOCKER_SOCKET");
        override_u64(
            &mut self.docker.pull_timeout_secs,
            "IMAGEWARDEN_DOCKER_PULL_TIMEOUT_SECS",
        );

        // Stage
        override_u64(
            &mut self.stage.save_timeout_secs,
            "IMAGEWARDEN_STAGE_SAVE_TIMEOUT_SECS",
        );
        override_u64(
            &mut self.stage.extract_timeout_secs,
            "IMAGEWARDEN_STAGE_EXTRACT_TIMEOUT_SECS",
        );
        override_bool(
            &mut self.stage.reuse_existing_extraction,
            "IMAGEWARDEN_STAGE_REUSE_EXISTING_EXTRACTION",
        );

        // Vulnerability
        override_bool(
            &mut self.vulnerability.enabled,
            "IMAGEWARDEN_VULNERABILITY_ENABLED",
        );
        override_string(
            &mut self.vulnerability.binary,
            "IMAGEWARDEN_VULNERABILITY_BINARY",
        );
        override_u64(
            &mut self.vulnerability.timeout_secs,
            "IMAGEWARDEN_VULNERABILITY_TIMEOUT_SECS",
        );

        // Signature
        override_bool(&mut self.signature.enabled, "IMAGEWARDEN_SIGNATURE_ENABLED");
        override_string(&mut self.signature.binary, "IMAGEWARDEN_SIGNATURE_BINARY");
        override_string(
            &mut self.signature.rules_path,
            "IMAGEWARDEN_SIGNATURE_RULES_PATH",
        );
        override_u64(
            &mut self.signature.timeout_secs,
            "IMAGEWARDEN_SIGNATURE_TIMEOUT_SECS",
        );

        // Antivirus
        override_bool(&mut self.antivirus.enabled, "IMAGEWARDEN_ANTIVIRUS_ENABLED");
        override_string(&mut self.antivirus.binary, "IMAGEWARDEN_ANTIVIRUS_BINARY");
        override_u64(
            &mut self.antivirus.timeout_secs,
            "IMAGEWARDEN_ANTIVIRUS_TIMEOUT_SECS",
        );

        // Sandbox
        override_bool(&mut self.sandbox.enabled, "IMAGEWARDEN_SANDBOX_ENABLED");
        override_u64(
            &mut self.sandbox.observation_window_secs,
            "IMAGEWARDEN_SANDBOX_OBSERVATION_WINDOW_SECS",
        );
        override_string(
            &mut self.sandbox.name_prefix,
            "IMAGEWARDEN_SANDBOX_NAME_PREFIX",
        );

        // Runtime
        override_string(
            &mut self.runtime.alert_log_path,
            "IMAGEWARDEN_RUNTIME_ALERT_LOG_PATH",
        );
        override_usize(&mut self.runtime.tail_lines, "IMAGEWARDEN_RUNTIME_TAIL_LINES");
        override_u64(
            &mut self.runtime.collect_timeout_secs,
            "IMAGEWARDEN_RUNTIME_COLLECT_TIMEOUT_SECS",
        );

        // Cleanup
        override_bool(
            &mut self.cleanup.keep_artifacts,
            "IMAGEWARDEN_CLEANUP_KEEP_ARTIFACTS",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), WardenError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.general.work_dir.is_empty() {
            return Err(invalid("general.work_dir", "must not be empty".to_owned()));
        }

        check_timeout("docker.pull_timeout_secs", self.docker.pull_timeout_secs)?;
        check_timeout("stage.save_timeout_secs", self.stage.save_timeout_secs)?;
        check_timeout("stage.extract_timeout_secs", self.stage.extract_timeout_secs)?;
        check_timeout(
            "vulnerability.timeout_secs",
            self.vulnerability.timeout_secs,
        )?;
        check_timeout("signature.timeout_secs", self.signature.timeout_secs)?;
        check_timeout("antivirus.timeout_secs", self.antivirus.timeout_secs)?;
        check_timeout(
            "runtime.collect_timeout_secs",
            self.runtime.collect_timeout_secs,
        )?;

        // 활성화된 스캐너는 실행 파일 경로가 필요
        if self.vulnerability.enabled && self.vulnerability.binary.is_empty() {
            return Err(invalid(
                "vulnerability.binary",
                "binary must not be empty when enabled".to_owned(),
            ));
        }
        if self.signature.enabled {
            if self.signature.binary.is_empty() {
                return Err(invalid(
                    "signature.binary",
                    "binary must not be empty when enabled".to_owned(),
                ));
            }
            if self.signature.rules_path.is_empty() {
                return Err(invalid(
                    "signature.rules_path",
                    "rules_path must not be empty when enabled".to_owned(),
                ));
            }
        }
        if self.antivirus.enabled && self.antivirus.binary.is_empty() {
            return Err(invalid(
                "antivirus.binary",
                "binary must not be empty when enabled".to_owned(),
            ));
        }

        if self.sandbox.observation_window_secs > MAX_OBSERVATION_WINDOW_SECS {
            return Err(invalid(
                "sandbox.observation_window_secs",
                format!("must be 0-{MAX_OBSERVATION_WINDOW_SECS}"),
            ));
        }
        if self.sandbox.enabled && self.sandbox.name_prefix.is_empty() {
            return Err(invalid(
                "sandbox.name_prefix",
                "name_prefix must not be empty when enabled".to_owned(),
            ));
        }

        if self.runtime.tail_lines == 0 || self.runtime.tail_lines > MAX_TAIL_LINES {
            return Err(invalid(
                "runtime.tail_lines",
                format!("must be 1-{MAX_TAIL_LINES}"),
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: String) -> WardenError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

fn check_timeout(field: &str, secs: u64) -> Result<(), WardenError> {
    if secs == 0 || secs > MAX_TIMEOUT_SECS {
        return Err(invalid(field, format!("must be 1-{MAX_TIMEOUT_SECS}")));
    }
    Ok(())
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// 스테이징 아티팩트 작업 디렉토리
    pub work_dir: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
            work_dir: "/tmp".to_owned(),
        }
    }
}

/// 컨테이너 런타임 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DockerConfig {
    /// Docker 소켓 경로 (비어 있으면 플랫폼 기본값)
    pub socket: String,
    /// 이미지 pull 타임아웃 (초)
    pub pull_timeout_secs: u64,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            socket: String::new(),
            pull_timeout_secs: 300,
        }
    }
}

/// 아티팩트 스테이징 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// `docker save` 타임아웃 (초)
    pub save_timeout_secs: u64,
    /// 아카이브 추출 타임아웃 (초)
    pub extract_timeout_secs: u64,
    /// 기존 추출 디렉토리 재사용 여부
    ///
    /// 재사용 시 내용이 현재 이미지와 일치하는지 검증하지 않습니다.
    pub reuse_existing_extraction: bool,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            save_timeout_secs: 60,
            extract_timeout_secs: 300,
            reuse_existing_extraction: true,
        }
    }
}

/// 취약점 스캐너 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VulnerabilityConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// trivy 실행 파일
    pub binary: String,
    /// 스캔 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for VulnerabilityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            binary: "trivy".to_owned(),
            timeout_secs: 120,
        }
    }
}

/// 시그니처 스캐너 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatureConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// yara 실행 파일
    pub binary: String,
    /// YARA 룰 파일 경로
    pub rules_path: String,
    /// 스캔 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            binary: "yara".to_owned(),
            rules_path: "static_scan/malware_rules.yar".to_owned(),
            timeout_secs: 30,
        }
    }
}

/// 안티바이러스 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AntivirusConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// clamscan 실행 파일
    pub binary: String,
    /// 스캔 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for AntivirusConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            binary: "clamscan".to_owned(),
            timeout_secs: 120,
        }
    }
}

/// 동적 샌드박스 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 알림 수집 전 대기 시간 (초)
    pub observation_window_secs: u64,
    /// 샌드박스 컨테이너 이름 접두어
    pub name_prefix: String,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            observation_window_secs: 5,
            name_prefix: "imagewarden-sandbox".to_owned(),
        }
    }
}

/// 런타임 알림 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Falco 알림 로그 경로
    pub alert_log_path: String,
    /// 읽어올 마지막 라인 수
    pub tail_lines: usize,
    /// 수집 타임아웃 (초)
    pub collect_timeout_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            alert_log_path: "/var/log/falco.log".to_owned(),
            tail_lines: 20,
            collect_timeout_secs: 10,
        }
    }
}

/// 정리 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    /// 스캔 후 스테이징 아티팩트를 남길지 여부 (디버깅용)
    pub keep_artifacts: bool,
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn default_config_has_sane_values() {
        let config = WardenConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.work_dir, "/tmp");
        assert_eq!(config.vulnerability.timeout_secs, 120);
        assert_eq!(config.signature.timeout_secs, 30);
        assert_eq!(config.antivirus.timeout_secs, 120);
        assert_eq!(config.sandbox.observation_window_secs, 5);
        assert_eq!(config.runtime.tail_lines, 20);
        assert!(config.stage.reuse_existing_extraction);
        assert!(!config.cleanup.keep_artifacts);
    }

    #[test]
    fn default_config_passes_validation() {
        WardenConfig::default().validate().unwrap();
    }

    #[test]
    fn parse_empty_toml_uses_defaults() {
        let config = WardenConfig::parse("").unwrap();
        assert_eq!(config.runtime.alert_log_path, "/var/log/falco.log");
        assert_eq!(config.signature.binary, "yara");
    }

    #[test]
    fn parse_partial_toml_merges_with_defaults() {
        let toml = r#"
[sandbox]
enabled = false

[signature]
rules_path = "/etc/imagewarden/rules.yar"
"#;
        let config = WardenConfig::parse(toml).unwrap();
        assert!(!config.sandbox.enabled);
        // observation window은 기본값 유지
        assert_eq!(config.sandbox.observation_window_secs, 5);
        assert_eq!(config.signature.rules_path, "/etc/imagewarden/rules.yar");
        assert_eq!(config.signature.timeout_secs, 30);
    }

    #[test]
    fn parse_invalid_toml_returns_error() {
        let err = WardenConfig::parse("invalid = [[[toml").unwrap_err();
        assert!(matches!(
            err,
            WardenError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = WardenConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = WardenConfig::default();
        config.antivirus.timeout_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("antivirus.timeout_secs"));
    }

    #[test]
    fn validate_rejects_excessive_timeout() {
        let mut config = WardenConfig::default();
        config.vulnerability.timeout_secs = MAX_TIMEOUT_SECS + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_binary_when_enabled() {
        let mut config = WardenConfig::default();
        config.vulnerability.binary = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("vulnerability.binary"));
    }

    #[test]
    fn validate_accepts_empty_binary_when_disabled() {
        let mut config = WardenConfig::default();
        config.antivirus.enabled = false;
        config.antivirus.binary = String::new();
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_zero_tail_lines() {
        let mut config = WardenConfig::default();
        config.runtime.tail_lines = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_accepts_zero_observation_window() {
        let mut config = WardenConfig::default();
        config.sandbox.observation_window_secs = 0;
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_excessive_observation_window() {
        let mut config = WardenConfig::default();
        config.sandbox.observation_window_secs = MAX_OBSERVATION_WINDOW_SECS + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn env_override_string() {
        let mut val = "original".to_owned();
        // SAFETY: serial 테스트에서만 환경변수를 조작합니다.
        unsafe { std::env::set_var("TEST_IMAGEWARDEN_STR", "overridden") };
        override_string(&mut val, "TEST_IMAGEWARDEN_STR");
        assert_eq!(val, "overridden");
        unsafe { std::env::remove_var("TEST_IMAGEWARDEN_STR") };
    }

    #[test]
    #[serial]
    fn env_override_bool_invalid_keeps_original() {
        let mut val = true;
        // SAFETY: serial 테스트에서만 환경변수를 조작합니다.
        unsafe { std::env::set_var("TEST_IMAGEWARDEN_BOOL_BAD", "nope") };
        override_bool(&mut val, "TEST_IMAGEWARDEN_BOOL_BAD");
        assert!(val);
        unsafe { std::env::remove_var("TEST_IMAGEWARDEN_BOOL_BAD") };
    }

    #[test]
    #[serial]
    fn env_override_u64_valid() {
        let mut val = 5_u64;
        // SAFETY: serial 테스트에서만 환경변수를 조작합니다.
        unsafe { std::env::set_var("TEST_IMAGEWARDEN_U64", "42") };
        override_u64(&mut val, "TEST_IMAGEWARDEN_U64");
        assert_eq!(val, 42);
        unsafe { std::env::remove_var("TEST_IMAGEWARDEN_U64") };
    }

    #[test]
    #[serial]
    fn apply_env_overrides_updates_sections() {
        let mut config = WardenConfig::default();
        // SAFETY: serial 테스트에서만 환경변수를 조작합니다.
        unsafe {
            std::env::set_var("IMAGEWARDEN_SANDBOX_ENABLED", "false");
            std::env::set_var("IMAGEWARDEN_RUNTIME_TAIL_LINES", "50");
        }
        config.apply_env_overrides();
        unsafe {
            std::env::remove_var("IMAGEWARDEN_SANDBOX_ENABLED");
            std::env::remove_var("IMAGEWARDEN_RUNTIME_TAIL_LINES");
        }
        assert!(!config.sandbox.enabled);
        assert_eq!(config.runtime.tail_lines, 50);
    }

    #[test]
    fn config_serialize_roundtrip() {
        let config = WardenConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = WardenConfig::parse(&toml_str).unwrap();
        assert_eq!(config.signature.rules_path, parsed.signature.rules_path);
        assert_eq!(config.runtime.tail_lines, parsed.runtime.tail_lines);
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let err = WardenConfig::from_file("/nonexistent/path/imagewarden.toml")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WardenError::Config(ConfigError::FileNotFound { .. })
        ));
    }

    #[tokio::test]
    #[serial]
    async fn load_or_default_falls_back_when_missing() {
        let config = WardenConfig::load_or_default("/nonexistent/path/imagewarden.toml")
            .await
            .unwrap();
        assert_eq!(config.runtime.tail_lines, 20);
    }
}

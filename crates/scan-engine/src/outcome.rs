//! 어댑터 결과 타입
//!
//! 모든 분석 어댑터는 정확히 하나의 [`ScanOutcome`]을 반환합니다.
//! 어댑터 내부의 어떤 실패도 호출자에게 에러로 전파되지 않고
//! `Warning` 또는 `Error` 변형으로 기록됩니다.

use std::fmt;

use imagewarden_core::types::Severity;
use serde::{Deserialize, Serialize};

/// 단일 어댑터의 정규화된 결과
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "lowercase")]
pub enum ScanOutcome<T> {
    /// 정상 완료, 도구별 결과 포함
    Success(T),
    /// 기능 사용 불가 (도구 미설치, 설정으로 비활성화 등)
    Warning(String),
    /// 실행 실패 (타임아웃, 비정상 종료, 파싱 실패 등)
    Error(String),
}

impl<T> ScanOutcome<T> {
    /// 메트릭 레이블용 상태 이름
    pub fn status_name(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::Warning(_) => "warning",
            Self::Error(_) => "error",
        }
    }

    /// 성공 결과를 참조로 반환합니다.
    pub fn success(&self) -> Option<&T> {
        match self {
            Self::Success(payload) => Some(payload),
            _ => None,
        }
    }

    /// 에러 여부
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// 분석 어댑터 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterKind {
    /// 취약점 스캐너 (Trivy)
    Vulnerability,
    /// 시그니처 스캐너 (YARA)
    Signature,
    /// 안티바이러스 (ClamAV)
    Antivirus,
    /// 런타임 알림 (Falco)
    Runtime,
}

impl AdapterKind {
    /// 결과 라인에 쓰이는 도구 이름
    pub fn tool_name(self) -> &'static str {
        match self {
            Self::Vulnerability => "Trivy",
            Self::Signature => "YARA",
            Self::Antivirus => "ClamAV",
            Self::Runtime => "Falco",
        }
    }

    /// 메트릭 레이블 값
    pub fn label(self) -> &'static str {
        match self {
            Self::Vulnerability => "vulnerability",
            Self::Signature => "signature",
            Self::Antivirus => "antivirus",
            Self::Runtime => "runtime",
        }
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// --- Vulnerability (Trivy JSON) ---

/// Trivy JSON 보고서
///
/// `Results[].Vulnerabilities[].Severity`만 집계에 사용하며
/// 나머지 필드는 표시용으로 보존합니다. 알 수 없는 필드는 무시됩니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VulnerabilityReport {
    /// 스캔 대상 이름 (이미지)
    #[serde(default)]
    pub artifact_name: Option<String>,
    /// 대상별 결과
    #[serde(default)]
    pub results: Vec<TargetResult>,
}

/// 스캔 대상 하나의 결과 (OS 패키지, 언어별 lockfile 등)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TargetResult {
    /// 대상 경로 또는 이름
    #[serde(default)]
    pub target: String,
    /// 발견된 취약점 (Trivy는 없으면 `null`을 출력)
    #[serde(default)]
    pub vulnerabilities: Option<Vec<VulnerabilityEntry>>,
}

/// 개별 취약점
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VulnerabilityEntry {
    /// CVE 등 식별자
    #[serde(default, rename = "VulnerabilityID")]
    pub vulnerability_id: String,
    /// 패키지 이름
    #[serde(default)]
    pub pkg_name: String,
    /// 설치된 버전
    #[serde(default)]
    pub installed_version: String,
    /// 수정된 버전
    #[serde(default)]
    pub fixed_version: Option<String>,
    /// 심각도 문자열 (CRITICAL, HIGH, MEDIUM, LOW, UNKNOWN)
    #[serde(default)]
    pub severity: String,
}

impl VulnerabilityEntry {
    /// 심각도를 파싱합니다. 알 수 없는 값은 `Info`로 취급합니다.
    pub fn severity_level(&self) -> Severity {
        Severity::from_str_loose(&self.severity).unwrap_or_default()
    }
}

/// 심각도별 취약점 수
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityCounts {
    /// 전체
    pub total: usize,
    /// CRITICAL
    pub critical: usize,
    /// HIGH
    pub high: usize,
    /// MEDIUM
    pub medium: usize,
    /// LOW
    pub low: usize,
}

impl VulnerabilityReport {
    /// Trivy JSON 출력을 파싱합니다.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// 모든 대상의 취약점을 순회합니다.
    pub fn vulnerabilities(&self) -> impl Iterator<Item = &VulnerabilityEntry> {
        self.results
            .iter()
            .filter_map(|r| r.vulnerabilities.as_deref())
            .flatten()
    }

    /// 심각도별 개수를 집계합니다.
    pub fn severity_counts(&self) -> SeverityCounts {
        let mut counts = SeverityCounts::default();
        for vuln in self.vulnerabilities() {
            counts.total += 1;
            match vuln.severity_level() {
                Severity::Critical => counts.critical += 1,
                Severity::High => counts.high += 1,
                Severity::Medium => counts.medium += 1,
                Severity::Low => counts.low += 1,
                Severity::Info => {}
            }
        }
        counts
    }
}

// --- Signature (YARA) ---

/// YARA 매치 결과
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SignatureMatches {
    /// `<rule> <file>` 형식의 매치 라인 (출력 순서 유지)
    pub matches: Vec<String>,
}

impl SignatureMatches {
    /// YARA stdout에서 비어 있지 않은 라인을 수집합니다.
    pub fn from_output(stdout: &str) -> Self {
        let matches = stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect();
        Self { matches }
    }

    /// 시그니처가 하나라도 매치되었는지
    pub fn detected(&self) -> bool {
        !self.matches.is_empty()
    }
}

// --- Antivirus (ClamAV) ---

/// clamscan이 감염 파일에 붙이는 표식
pub const INFECTION_MARKER: &str = "FOUND";

/// 출력이 비어 있을 때 사용하는 문구
pub const NO_THREATS_OUTPUT: &str = "No threats found";

/// ClamAV 스캔 결과
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AntivirusReport {
    /// 감염 파일 목록 (출력 원문)
    pub output: String,
    /// 감염 여부
    pub infected: bool,
}

impl AntivirusReport {
    /// clamscan stdout에서 보고서를 만듭니다.
    pub fn from_output(stdout: &str) -> Self {
        let trimmed = stdout.trim();
        let infected = trimmed.contains(INFECTION_MARKER);
        let output = if trimmed.is_empty() {
            NO_THREATS_OUTPUT.to_owned()
        } else {
            trimmed.to_owned()
        };
        Self { output, infected }
    }
}

// --- Runtime (Falco) ---

/// 런타임 알림 스냅샷
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuntimeAlerts {
    /// 관찰 대상 샌드박스 이름
    pub sandbox: Option<String>,
    /// 알림 로그 마지막 라인들
    pub alerts: Vec<String>,
}

impl RuntimeAlerts {
    /// 알림 수
    pub fn count(&self) -> usize {
        self.alerts.len()
    }
}

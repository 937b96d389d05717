//! 도메인 타입 -- 시스템 전역에서 사용되는 공통 타입
//!
//! 스캔 엔진과 CLI가 공유하는 데이터 구조를 정의합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ImageRefError;

/// 컨테이너 이미지 참조 (`name[:tag]`)
///
/// 사용자 입력에서 한 번 생성된 후 변경되지 않습니다.
/// 생성 시 다음 정규화를 적용합니다:
/// - 앞뒤 공백 제거
/// - 내부 공백은 태그 구분자 `:`로 치환 (`"nginx latest"` -> `"nginx:latest"`)
/// - 빈 문자열 거부
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    /// 원시 입력을 정규화하여 이미지 참조를 생성합니다.
    pub fn parse(raw: &str) -> Result<Self, ImageRefError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ImageRefError::Empty);
        }

        let normalized = trimmed.split_whitespace().collect::<Vec<_>>().join(":");
        Ok(Self(normalized))
    }

    /// 정규화된 참조 문자열을 반환합니다.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 파일시스템에서 안전하게 쓸 수 있는 결정적 키를 반환합니다.
    ///
    /// 스테이징 아카이브와 추출 디렉토리 이름에 사용됩니다.
    /// 예: `"library/nginx:1.25"` -> `"library_nginx_1.25"`
    pub fn artifact_key(&self) -> String {
        self.0
            .chars()
            .map(|c| match c {
                ':' | '/' | '@' | '\\' => '_',
                other => other,
            })
            .collect()
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ImageRef {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// 심각도 레벨
///
/// 취약점 스캐너가 보고하는 개별 취약점의 심각도를 나타냅니다.
/// `Ord` 구현으로 심각도 비교가 가능합니다 (`Info < Low < Medium < High < Critical`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Severity {
    /// 정보성 또는 미분류 (Trivy의 `UNKNOWN` 포함)
    #[default]
    Info,
    /// 낮은 심각도
    Low,
    /// 중간 심각도
    Medium,
    /// 높은 심각도
    High,
    /// 치명적 -- 즉시 대응 필요
    Critical,
}

impl Severity {
    /// 문자열에서 심각도를 파싱합니다.
    ///
    /// 대소문자를 구분하지 않습니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "info" | "informational" | "unknown" | "negligible" => Some(Self::Info),
            "low" => Some(Self::Low),
            "medium" | "med" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" | "crit" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "Info"),
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
            Self::Critical => write!(f, "Critical"),
        }
    }
}

/// 종합 위험 등급
///
/// 0..=100 범위의 위험 점수에서 파생됩니다. [`RiskLevel::from_score`] 참고.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    /// 0..=19
    #[default]
    Low,
    /// 20..=49
    Medium,
    /// 50..=79
    High,
    /// 80..=100
    Critical,
}

/// `Critical` 등급 하한 점수
pub const CRITICAL_THRESHOLD: u8 = 80;
/// `High` 등급 하한 점수
pub const HIGH_THRESHOLD: u8 = 50;
/// `Medium` 등급 하한 점수
pub const MEDIUM_THRESHOLD: u8 = 20;

impl RiskLevel {
    /// 위험 점수를 등급으로 매핑합니다.
    pub fn from_score(score: u8) -> Self {
        if score >= CRITICAL_THRESHOLD {
            Self::Critical
        } else if score >= HIGH_THRESHOLD {
            Self::High
        } else if score >= MEDIUM_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// 문자열에서 등급을 파싱합니다 (대소문자 무시).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

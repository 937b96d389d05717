//! 스캔 보고서 -- 엔진의 최종 출력

use imagewarden_core::types::ImageRef;
use serde::Serialize;

use crate::aggregator::RiskAssessment;
use crate::cleanup::CleanupSummary;
use crate::outcome::{
    AntivirusReport, RuntimeAlerts, ScanOutcome, SignatureMatches, VulnerabilityReport,
};

/// 스캔 하나의 전체 결과
///
/// 어댑터별 원본 결과를 위험 평가와 함께 보존하여 호출자가 판정 근거를
/// 함께 표시할 수 있게 합니다.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    /// 정규화된 이미지 참조
    pub image: ImageRef,
    /// 스캔 고유 ID
    pub scan_id: String,
    /// 취약점 스캔 결과
    pub vulnerability: ScanOutcome<VulnerabilityReport>,
    /// 시그니처 스캔 결과
    pub signature: ScanOutcome<SignatureMatches>,
    /// 안티바이러스 결과
    pub antivirus: ScanOutcome<AntivirusReport>,
    /// 런타임 알림 결과
    pub runtime: ScanOutcome<RuntimeAlerts>,
    /// 종합 위험 평가
    pub risk: RiskAssessment,
    /// 아티팩트 정리 결과
    pub cleanup: CleanupSummary,
    /// 전체 소요 시간 (밀리초)
    pub duration_ms: u64,
}

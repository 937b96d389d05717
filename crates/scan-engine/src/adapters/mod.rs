//! 분석 어댑터 -- 외부 보안 도구 하나를 감싸 [`ScanOutcome`]으로 정규화
//!
//! - [`vulnerability`]: Trivy 취약점 스캔 (이미지 참조 대상)
//! - [`signature`]: YARA 시그니처 매칭 (추출 디렉토리 대상)
//! - [`antivirus`]: ClamAV 감염 파일 검사 (추출 디렉토리 대상)
//! - [`runtime_alert`]: 샌드박스 실행 중 Falco 알림 수집
//!
//! 어댑터는 `Result`를 반환하지 않습니다. 모든 실패는 `Error`, 기능 부재는
//! `Warning` 변형으로 변환되어 위험도 집계에 기록됩니다.

pub mod antivirus;
pub mod runtime_alert;
pub mod signature;
pub mod vulnerability;

pub use antivirus::AntivirusAdapter;
pub use runtime_alert::RuntimeAlertAdapter;
pub use signature::SignatureAdapter;
pub use vulnerability::VulnerabilityAdapter;

use tracing::{info, warn};

use crate::outcome::{AdapterKind, ScanOutcome};

/// 설정으로 비활성화된 어댑터의 경고 메시지
pub fn disabled_warning(kind: AdapterKind) -> String {
    format!("{} disabled by configuration", kind.tool_name())
}

/// 어댑터 결과를 로그로 남깁니다.
pub(crate) fn log_outcome<T>(kind: AdapterKind, scan_id: &str, outcome: &ScanOutcome<T>) {
    match outcome {
        ScanOutcome::Success(_) => {
            info!(adapter = %kind, scan_id, "adapter completed");
        }
        ScanOutcome::Warning(message) => {
            warn!(adapter = %kind, scan_id, message = %message, "adapter unavailable");
        }
        ScanOutcome::Error(message) => {
            warn!(adapter = %kind, scan_id, error = %message, "adapter failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_warning_names_tool() {
        assert_eq!(
            disabled_warning(AdapterKind::Antivirus),
            "ClamAV disabled by configuration"
        );
    }
}

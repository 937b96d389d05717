//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 스캔 엔진은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! 레코더(exporter)는 번들하지 않습니다. 레코더가 설치되지 않으면
//! 모든 기록은 no-op입니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `imagewarden_`
//! - 접미어: `_total` (counter), `_seconds` (histogram), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(imagewarden_core::metrics::SCANS_TOTAL, "result" => "completed").increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 결과 레이블 키 (completed, resolution_failure, invalid_image)
pub const LABEL_RESULT: &str = "result";

/// 어댑터 레이블 키 (vulnerability, signature, antivirus, runtime)
pub const LABEL_ADAPTER: &str = "adapter";

/// 결과 상태 레이블 키 (success, warning, error)
pub const LABEL_STATUS: &str = "status";

// ─── 스캔 메트릭 ────────────────────────────────────────────────────

/// 실행된 스캔 수 (counter, label: result)
pub const SCANS_TOTAL: &str = "imagewarden_scans_total";

/// 어댑터별 결과 수 (counter, labels: adapter, status)
pub const ADAPTER_OUTCOMES_TOTAL: &str = "imagewarden_adapter_outcomes_total";

/// 스캔 소요 시간 (histogram, 초)
pub const SCAN_DURATION_SECONDS: &str = "imagewarden_scan_duration_seconds";

/// 마지막 스캔의 위험 점수 (gauge, 0-100)
pub const RISK_SCORE: &str = "imagewarden_risk_score";

/// 샌드박스 실행 실패 수 (counter)
pub const SANDBOX_LAUNCH_FAILURES_TOTAL: &str = "imagewarden_sandbox_launch_failures_total";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// 스캔 소요 시간 히스토그램 버킷 (초)
///
/// 1s ~ 600s 범위 (이미지 pull, save, 추출 포함)
pub const SCAN_DURATION_BUCKETS: [f64; 9] = [1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 450.0, 600.0];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_metrics() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    describe_counter!(
        SCANS_TOTAL,
        "Total number of image scans, labelled by final result"
    );
    describe_counter!(
        ADAPTER_OUTCOMES_TOTAL,
        "Scanner adapter outcomes by adapter and status"
    );
    describe_histogram!(
        SCAN_DURATION_SECONDS,
        "Wall-clock duration of a full image scan in seconds"
    );
    describe_gauge!(RISK_SCORE, "Risk score (0-100) of the most recent scan");
    describe_counter!(
        SANDBOX_LAUNCH_FAILURES_TOTAL,
        "Total number of sandbox containers that failed to launch"
    );
}

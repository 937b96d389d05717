//! 에러 타입 -- 도메인별 에러 정의

/// imagewarden 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum WardenError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 스캔 실행 에러
    #[error("scan error: {0}")]
    Scan(#[from] ScanFailure),

    /// 이미지 참조 파싱 에러
    #[error("image reference error: {0}")]
    ImageRef(#[from] ImageRefError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 스캔 실행 중 발생하는 치명적 에러
///
/// 개별 어댑터 실패는 여기에 해당하지 않습니다.
/// 어댑터 실패는 `ScanOutcome::Error`로 위험도 평가에 반영됩니다.
#[derive(Debug, thiserror::Error)]
pub enum ScanFailure {
    /// 이미지를 로컬에서 찾지 못했고 pull도 실패함
    #[error("image resolution failed: {0}")]
    Resolution(String),

    /// 컨테이너 런타임 연결 실패
    #[error("container runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    /// 내부 처리 실패
    #[error("internal scan failure: {0}")]
    Internal(String),
}

/// 이미지 참조 파싱 에러
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageRefError {
    /// 공백 제거 후 빈 문자열
    #[error("image reference must not be empty")]
    Empty,
}

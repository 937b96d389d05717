//! 스캔 엔진 에러 타입
//!
//! [`ScanEngineError`]는 엔진 내부 구성요소(런타임, 외부 도구, 스테이징)에서 발생하는
//! 에러를 표현합니다. 어댑터는 이 에러를 `ScanOutcome::Error`로 변환하므로
//! 스캔 파이프라인 밖으로 전파되지 않습니다.
//!
//! [`ScanError`]는 스캔 요청 전체를 중단시키는 사용자 대상 에러입니다.
//! 두 타입 모두 `From<_> for WardenError` 변환이 구현되어 있습니다.

use imagewarden_core::error::{ConfigError, ImageRefError, ScanFailure, WardenError};

/// 스캔 엔진 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum ScanEngineError {
    /// Docker API 호출 실패
    #[error("docker api error: {0}")]
    Docker(String),

    /// Docker 소켓 연결 실패
    #[error("docker connection error: {0}")]
    DockerConnection(String),

    /// 이미지를 찾을 수 없음
    #[error("image not found: {0}")]
    ImageNotFound(String),

    /// 컨테이너를 찾을 수 없음 (404)
    #[error("container not found: {0}")]
    ContainerNotFound(String),

    /// 컨테이너가 이미 정지됨 (304)
    #[error("container already stopped: {0}")]
    ContainerNotRunning(String),

    /// 외부 도구 실행 실패
    #[error("tool '{tool}' failed: {reason}")]
    Tool {
        /// 도구 이름
        tool: String,
        /// 실패 사유
        reason: String,
    },

    /// 작업 타임아웃
    #[error("{operation} timed out after {secs}s")]
    Timeout {
        /// 작업 이름
        operation: String,
        /// 적용된 타임아웃 (초)
        secs: u64,
    },

    /// 아티팩트 스테이징 실패
    #[error("staging failed: {0}")]
    Stage(String),

    /// 파일 I/O 에러
    #[error("io error: {path}: {source}")]
    Io {
        /// 대상 경로
        path: String,
        /// 원인 에러
        #[source]
        source: std::io::Error,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },
}

impl From<ScanEngineError> for WardenError {
    fn from(err: ScanEngineError) -> Self {
        match err {
            ScanEngineError::DockerConnection(msg) => {
                WardenError::Scan(ScanFailure::RuntimeUnavailable(msg))
            }
            ScanEngineError::ImageNotFound(image) => {
                WardenError::Scan(ScanFailure::Resolution(image))
            }
            ScanEngineError::Config { field, reason } => {
                WardenError::Config(ConfigError::InvalidValue { field, reason })
            }
            ScanEngineError::Io { source, .. } => WardenError::Io(source),
            other => WardenError::Scan(ScanFailure::Internal(other.to_string())),
        }
    }
}

/// 스캔 요청 전체를 중단시키는 에러
///
/// 이 에러가 반환되면 위험도 평가는 생성되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    /// 이미지 참조가 비어 있음
    #[error("Please enter a Docker image name.")]
    InvalidImageRef(#[from] ImageRefError),

    /// 로컬에 없고 pull도 실패함
    #[error("Could not find or pull image '{image}'. Check spelling or internet connection.")]
    ResolutionFailure {
        /// 정규화된 이미지 참조
        image: String,
    },
}

impl From<ScanError> for WardenError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::InvalidImageRef(e) => WardenError::ImageRef(e),
            ScanError::ResolutionFailure { image } => {
                WardenError::Scan(ScanFailure::Resolution(image))
            }
        }
    }
}

//! 스캔 단위 컨텍스트
//!
//! [`ScanContext`]는 스캔 하나에 속한 모든 상태를 명시적으로 담습니다.
//! 이미지 참조, 파생된 아티팩트 경로, 그리고 시그니처/안티바이러스 어댑터가
//! 공유하는 1회성 스테이징 셀을 포함합니다.

use std::path::{Path, PathBuf};

use imagewarden_core::types::ImageRef;
use serde::Serialize;
use tokio::sync::OnceCell;

/// 스테이징된 이미지 아티팩트 경로 쌍
///
/// 두 경로 모두 `work_dir`과 [`ImageRef::artifact_key`]에서 결정적으로 파생됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagedArtifact {
    /// `docker save` 아카이브 경로 (`<key>.tar`)
    pub archive_path: PathBuf,
    /// 추출 디렉토리 경로 (`<key>_extracted`)
    pub extract_dir: PathBuf,
}

impl StagedArtifact {
    /// 작업 디렉토리와 이미지 참조에서 경로를 파생합니다.
    pub fn for_image(work_dir: &Path, image: &ImageRef) -> Self {
        let key = image.artifact_key();
        Self {
            archive_path: work_dir.join(format!("{key}.tar")),
            extract_dir: work_dir.join(format!("{key}_extracted")),
        }
    }
}

/// 스캔 하나의 컨텍스트
pub struct ScanContext {
    image: ImageRef,
    scan_id: String,
    work_dir: PathBuf,
    artifact: StagedArtifact,
    /// 스테이징 결과 (성공/실패 모두 캐시)
    staged: OnceCell<Result<StagedArtifact, String>>,
}

impl ScanContext {
    /// 새 스캔 컨텍스트를 생성합니다.
    pub fn new(image: ImageRef, work_dir: impl Into<PathBuf>) -> Self {
        let work_dir = work_dir.into();
        let artifact = StagedArtifact::for_image(&work_dir, &image);
        Self {
            image,
            scan_id: uuid::Uuid::new_v4().to_string(),
            work_dir,
            artifact,
            staged: OnceCell::new(),
        }
    }

    /// 스캔 대상 이미지
    pub fn image(&self) -> &ImageRef {
        &self.image
    }

    /// 스캔 고유 ID
    pub fn scan_id(&self) -> &str {
        &self.scan_id
    }

    /// 작업 디렉토리
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// 예정된 아티팩트 경로
    pub fn artifact(&self) -> &StagedArtifact {
        &self.artifact
    }

    /// 스테이징 1회 실행 셀
    pub(crate) fn staged(&self) -> &OnceCell<Result<StagedArtifact, String>> {
        &self.staged
    }

    /// 스테이징이 이미 시도되었는지
    pub fn is_staged(&self) -> bool {
        self.staged.initialized()
    }
}

//! 스테이징 아티팩트 정리
//!
//! 집계 후 추출 디렉토리와 아카이브를 제거합니다. 이미 없는 경로는 에러가 아닙니다.

use std::io::ErrorKind;

use serde::Serialize;
use tracing::{debug, warn};

use crate::context::ScanContext;

/// 정리 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupSummary {
    /// 추출 디렉토리를 제거했는지
    pub removed_dir: bool,
    /// 아카이브 파일을 제거했는지
    pub removed_archive: bool,
}

/// 스캔 컨텍스트의 아티팩트를 제거합니다.
///
/// `keep_artifacts`가 켜져 있으면 아무것도 제거하지 않습니다.
pub async fn cleanup(ctx: &ScanContext, keep_artifacts: bool) -> CleanupSummary {
    let artifact = ctx.artifact();
    if keep_artifacts {
        debug!(
            scan_id = ctx.scan_id(),
            extract_dir = %artifact.extract_dir.display(),
            "keeping staged artifacts"
        );
        return CleanupSummary::default();
    }

    let removed_dir = match tokio::fs::remove_dir_all(&artifact.extract_dir).await {
        Ok(()) => true,
        Err(e) if e.kind() == ErrorKind::NotFound => false,
        Err(e) => {
            warn!(
                path = %artifact.extract_dir.display(),
                error = %e,
                "failed to remove extraction directory"
            );
            false
        }
    };

    let removed_archive = match tokio::fs::remove_file(&artifact.archive_path).await {
        Ok(()) => true,
        Err(e) if e.kind() == ErrorKind::NotFound => false,
        Err(e) => {
            warn!(
                path = %artifact.archive_path.display(),
                error = %e,
                "failed to remove image archive"
            );
            false
        }
    };

    debug!(scan_id = ctx.scan_id(), removed_dir, removed_archive, "cleanup finished");
    CleanupSummary {
        removed_dir,
        removed_archive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imagewarden_core::types::ImageRef;

    fn staged_context(dir: &std::path::Path) -> ScanContext {
        let ctx = ScanContext::new(ImageRef::parse("busybox:1.36").unwrap(), dir);
        std::fs::create_dir_all(ctx.artifact().extract_dir.join("layer")).unwrap();
        std::fs::write(&ctx.artifact().archive_path, b"tar").unwrap();
        ctx
    }

    #[tokio::test]
    async fn removes_directory_and_archive() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = staged_context(dir.path());

        let summary = cleanup(&ctx, false).await;

        assert!(summary.removed_dir);
        assert!(summary.removed_archive);
        assert!(!ctx.artifact().extract_dir.exists());
        assert!(!ctx.artifact().archive_path.exists());
    }

    #[tokio::test]
    async fn missing_artifacts_are_not_errors() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ScanContext::new(ImageRef::parse("busybox").unwrap(), dir.path());

        assert_eq!(cleanup(&ctx, false).await, CleanupSummary::default());
    }

    #[tokio::test]
    async fn keep_artifacts_skips_removal() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = staged_context(dir.path());

        let summary = cleanup(&ctx, true).await;

        assert_eq!(summary, CleanupSummary::default());
        assert!(ctx.artifact().extract_dir.exists());
        assert!(ctx.artifact().archive_path.exists());
    }
}

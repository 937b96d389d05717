//! 아티팩트 스테이징 -- `docker save` 후 아카이브 추출
//!
//! 시그니처 어댑터와 안티바이러스 어댑터는 같은 추출 디렉토리를 읽습니다.
//! 두 어댑터 모두 [`ArtifactStager::stage`]를 호출하지만 실제 save/추출은
//! [`ScanContext`]의 `OnceCell`을 통해 스캔당 최대 한 번만 실행됩니다.
//! 먼저 호출한 쪽이 스테이징을 수행하고, 나중 호출은 같은 결과(성공 또는 실패)를 받습니다.
//!
//! # 재사용 정책
//!
//! `reuse_existing_extraction`이 켜져 있으면 추출 디렉토리가 존재하는 것만으로
//! 완전한 추출로 간주합니다. 내용이 현재 이미지와 일치하는지는 검사하지 않습니다.
//! 실패한 스테이징이 남긴 디렉토리도 롤백하지 않습니다.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::archive::Archiver;
use crate::context::{ScanContext, StagedArtifact};
use crate::error::ScanEngineError;
use crate::runtime::ContainerRuntime;

/// 아티팩트 스테이저
pub struct ArtifactStager<R: ContainerRuntime, A: Archiver> {
    runtime: Arc<R>,
    archiver: Arc<A>,
    save_timeout: Duration,
    extract_timeout: Duration,
    reuse_existing: bool,
}

impl<R: ContainerRuntime, A: Archiver> ArtifactStager<R, A> {
    /// 새 스테이저를 생성합니다.
    pub fn new(
        runtime: Arc<R>,
        archiver: Arc<A>,
        save_timeout: Duration,
        extract_timeout: Duration,
        reuse_existing: bool,
    ) -> Self {
        Self {
            runtime,
            archiver,
            save_timeout,
            extract_timeout,
            reuse_existing,
        }
    }

    /// 스캔 대상 이미지를 스테이징합니다 (멱등).
    ///
    /// # Errors
    ///
    /// 어느 단계든 실패하면 `ScanEngineError::Stage`를 반환합니다.
    pub async fn stage(&self, ctx: &ScanContext) -> Result<StagedArtifact, ScanEngineError> {
        let result = ctx
            .staged()
            .get_or_init(|| async {
                match self.stage_artifact(ctx).await {
                    Ok(()) => Ok(ctx.artifact().clone()),
                    Err(e) => {
                        warn!(
                            image = %ctx.image(),
                            scan_id = ctx.scan_id(),
                            error = %e,
                            "artifact staging failed"
                        );
                        Err(e.to_string())
                    }
                }
            })
            .await;

        result.clone().map_err(ScanEngineError::Stage)
    }

    async fn stage_artifact(&self, ctx: &ScanContext) -> Result<(), ScanEngineError> {
        let artifact = ctx.artifact();
        let extract_dir = &artifact.extract_dir;

        if path_exists(extract_dir).await {
            if self.reuse_existing {
                debug!(
                    image = %ctx.image(),
                    extract_dir = %extract_dir.display(),
                    "reusing existing extraction without staleness check"
                );
                return Ok(());
            }
            info!(
                extract_dir = %extract_dir.display(),
                "removing previous extraction before re-staging"
            );
            tokio::fs::remove_dir_all(extract_dir)
                .await
                .map_err(|e| io_error(extract_dir, e))?;
        }

        tokio::fs::create_dir_all(ctx.work_dir())
            .await
            .map_err(|e| io_error(ctx.work_dir(), e))?;

        // 1. docker save
        let bytes = match tokio::time::timeout(
            self.save_timeout,
            self.runtime
                .save_image(ctx.image().as_str(), &artifact.archive_path),
        )
        .await
        {
            Ok(result) => result?,
            Err(_elapsed) => {
                return Err(ScanEngineError::Timeout {
                    operation: "docker save".to_owned(),
                    secs: self.save_timeout.as_secs(),
                });
            }
        };
        debug!(
            image = %ctx.image(),
            archive = %artifact.archive_path.display(),
            bytes,
            "image saved"
        );

        // 2. 추출 디렉토리 생성
        tokio::fs::create_dir_all(extract_dir)
            .await
            .map_err(|e| io_error(extract_dir, e))?;

        // 3. 추출 (타임아웃이 나도 blocking 추출 스레드는 끝까지 실행됨)
        match tokio::time::timeout(
            self.extract_timeout,
            self.archiver.extract(&artifact.archive_path, extract_dir),
        )
        .await
        {
            Ok(result) => result?,
            Err(_elapsed) => {
                return Err(ScanEngineError::Timeout {
                    operation: "archive extraction".to_owned(),
                    secs: self.extract_timeout.as_secs(),
                });
            }
        }

        info!(
            image = %ctx.image(),
            extract_dir = %extract_dir.display(),
            "image staged"
        );
        Ok(())
    }
}

async fn path_exists(path: &std::path::Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

fn io_error(path: &std::path::Path, source: std::io::Error) -> ScanEngineError {
    ScanEngineError::Io {
        path: path.display().to_string(),
        source,
    }
}

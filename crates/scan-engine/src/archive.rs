//! 아카이브 추출
//!
//! [`Archiver`]는 `docker save` 아카이브를 디렉토리로 푸는 동작을 추상화합니다.
//! [`TarArchiver`]는 `tar` 크레이트를 blocking 스레드에서 실행합니다.

use std::future::Future;
use std::path::Path;

use tracing::debug;

use crate::error::ScanEngineError;

/// 아카이브 추출 trait
pub trait Archiver: Send + Sync + 'static {
    /// `archive`를 `dest` 디렉토리에 풉니다.
    ///
    /// `dest`는 호출 전에 존재해야 합니다.
    fn extract(
        &self,
        archive: &Path,
        dest: &Path,
    ) -> impl Future<Output = Result<(), ScanEngineError>> + Send;
}

/// `tar` 크레이트 기반 추출기
#[derive(Debug, Clone, Copy, Default)]
pub struct TarArchiver;

impl Archiver for TarArchiver {
    async fn extract(&self, archive: &Path, dest: &Path) -> Result<(), ScanEngineError> {
        let archive_path = archive.to_path_buf();
        let dest_path = dest.to_path_buf();

        tokio::task::spawn_blocking(move || unpack(&archive_path, &dest_path))
            .await
            .map_err(|e| ScanEngineError::Stage(format!("spawn_blocking failed: {e}")))?
    }
}

/// 동기 tar 추출 (`spawn_blocking` 내에서 호출)
fn unpack(archive: &Path, dest: &Path) -> Result<(), ScanEngineError> {
    let file = std::fs::File::open(archive).map_err(|e| ScanEngineError::Io {
        path: archive.display().to_string(),
        source: e,
    })?;

    let mut tarball = tar::Archive::new(std::io::BufReader::new(file));
    tarball.set_preserve_permissions(false);
    tarball.unpack(dest).map_err(|e| ScanEngineError::Io {
        path: dest.display().to_string(),
        source: e,
    })?;

    debug!(
        archive = %archive.display(),
        dest = %dest.display(),
        "archive extracted"
    );
    Ok(())
}

/// 테스트용 Mock 추출기
///
/// 추출 대신 `dest`에 표식 파일을 만들고 호출 횟수를 기록합니다.
#[cfg(test)]
#[derive(Default)]
pub struct MockArchiver {
    pub fail: bool,
    pub calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockArchiver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
impl Archiver for MockArchiver {
    async fn extract(&self, archive: &Path, dest: &Path) -> Result<(), ScanEngineError> {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if self.fail {
            return Err(ScanEngineError::Io {
                path: archive.display().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, "corrupt archive"),
            });
        }
        tokio::fs::write(dest.join("manifest.json"), b"[]")
            .await
            .map_err(|source| ScanEngineError::Io {
                path: dest.display().to_string(),
                source,
            })
    }
}

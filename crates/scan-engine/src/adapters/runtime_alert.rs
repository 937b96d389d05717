//! Falco 런타임 알림 어댑터
//!
//! 샌드박스 관찰 구간이 끝난 뒤 Falco 알림 로그의 마지막 N 라인을 읽습니다.
//! 로그는 샌드박스 컨테이너 기준으로 필터링하지 않으므로 같은 호스트의 다른
//! 컨테이너 알림도 포함될 수 있습니다.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::outcome::{RuntimeAlerts, ScanOutcome};
use crate::runtime::SandboxHandle;

/// 샌드박스가 설정으로 비활성화되었을 때의 경고
pub const DYNAMIC_DISABLED: &str = "dynamic analysis disabled by configuration";

/// 샌드박스 실행 실패 시의 경고
pub const SANDBOX_UNAVAILABLE: &str = "sandbox launch failed; no dynamic data available";

/// 알림 로그가 없을 때의 경고
pub const LOG_UNAVAILABLE: &str = "Falco not installed or logs not available";

const TIMED_OUT: &str = "Falco alert collection timed out";

/// 로그 끝에서 처음 읽는 바이트 수. 라인이 부족하면 두 배씩 넓힙니다.
const INITIAL_TAIL_WINDOW: u64 = 64 * 1024;

/// 런타임 알림 수집 어댑터
pub struct RuntimeAlertAdapter {
    log_path: PathBuf,
    tail_lines: usize,
    timeout: Duration,
}

impl RuntimeAlertAdapter {
    /// 새 어댑터를 생성합니다.
    pub fn new(log_path: impl Into<PathBuf>, tail_lines: usize, timeout: Duration) -> Self {
        Self {
            log_path: log_path.into(),
            tail_lines,
            timeout,
        }
    }

    /// 알림 로그 경로
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// 관찰이 끝난 샌드박스에 대한 알림을 수집합니다.
    ///
    /// `sandbox`가 `None`이면 로그를 읽지 않고 `Warning`을 반환합니다.
    /// 로그 파일 전체가 아니라 끝부분만 읽으며, 잘못된 UTF-8 바이트는
    /// 대체 문자로 바뀝니다.
    pub async fn collect(&self, sandbox: Option<&SandboxHandle>) -> ScanOutcome<RuntimeAlerts> {
        let Some(handle) = sandbox else {
            return ScanOutcome::Warning(SANDBOX_UNAVAILABLE.to_owned());
        };

        let content =
            match tokio::time::timeout(self.timeout, read_tail(&self.log_path, self.tail_lines))
                .await
            {
                Ok(Ok(content)) => content,
                Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                    return ScanOutcome::Warning(LOG_UNAVAILABLE.to_owned());
                }
                Ok(Err(e)) => {
                    return ScanOutcome::Error(format!(
                        "failed to read {}: {e}",
                        self.log_path.display()
                    ));
                }
                Err(_elapsed) => return ScanOutcome::Error(TIMED_OUT.to_owned()),
            };

        ScanOutcome::Success(RuntimeAlerts {
            sandbox: Some(handle.name.clone()),
            alerts: tail(&content, self.tail_lines),
        })
    }
}

/// 파일 끝에서 비어 있지 않은 라인이 `n`개 이상 들어오도록 읽습니다.
///
/// 윈도우 시작이 파일 중간이면 첫 번째 (잘린) 라인은 버립니다.
async fn read_tail(path: &Path, n: usize) -> std::io::Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let len = file.metadata().await?.len();
    let mut window = INITIAL_TAIL_WINDOW;

    loop {
        let start = len.saturating_sub(window);
        file.seek(SeekFrom::Start(start)).await?;

        let mut buf = Vec::new();
        (&mut file).take(len - start).read_to_end(&mut buf).await?;

        let bytes = if start == 0 {
            &buf[..]
        } else {
            match buf.iter().position(|&b| b == b'\n') {
                Some(i) => &buf[i + 1..],
                None => &[][..],
            }
        };
        let text = String::from_utf8_lossy(bytes);

        if start == 0 || tail(&text, n).len() >= n {
            return Ok(text.into_owned());
        }
        window = window.saturating_mul(2);
    }
}

/// 비어 있지 않은 마지막 `n` 라인을 원래 순서대로 반환합니다.
fn tail(content: &str, n: usize) -> Vec<String> {
    let mut lines: Vec<String> = content
        .lines()
        .rev()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .take(n)
        .map(str::to_owned)
        .collect();
    lines.reverse();
    lines
}

//! 동적 샌드박스 컨트롤러
//!
//! 이미지를 분리 실행(detached)하고 관찰 구간 동안 대기합니다.
//! 컨테이너는 `auto_remove`로 생성되므로 정지되면 데몬이 제거합니다.
//!
//! [`SandboxController::stop`]은 best-effort이며 여러 번 호출해도 안전합니다.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use imagewarden_core::metrics as m;
use imagewarden_core::types::ImageRef;
use tracing::{debug, info, warn};

use crate::error::ScanEngineError;
use crate::runtime::{ContainerRuntime, SandboxHandle};

/// 샌드박스 컨트롤러
pub struct SandboxController<R: ContainerRuntime> {
    runtime: Arc<R>,
    observation_window: Duration,
    name_prefix: String,
}

impl<R: ContainerRuntime> SandboxController<R> {
    /// 새 컨트롤러를 생성합니다.
    pub fn new(runtime: Arc<R>, observation_window: Duration, name_prefix: impl Into<String>) -> Self {
        Self {
            runtime,
            observation_window,
            name_prefix: name_prefix.into(),
        }
    }

    /// 샌드박스 컨테이너를 시작하고 관찰 구간이 끝날 때까지 대기합니다.
    ///
    /// 실행에 실패하면 경고를 남기고 `None`을 반환합니다.
    pub async fn launch(&self, image: &ImageRef) -> Option<SandboxHandle> {
        let name = self.container_name();

        let handle = match self.runtime.run_sandbox(image.as_str(), &name).await {
            Ok(handle) => handle,
            Err(e) => {
                warn!(image = %image, sandbox = %name, error = %e, "sandbox launch failed");
                metrics::counter!(m::SANDBOX_LAUNCH_FAILURES_TOTAL).increment(1);
                return None;
            }
        };

        info!(
            image = %image,
            sandbox = %handle.name,
            container_id = %handle.id,
            window_secs = self.observation_window.as_secs(),
            "sandbox started, observing"
        );
        tokio::time::sleep(self.observation_window).await;

        Some(handle)
    }

    /// 샌드박스 컨테이너를 정지합니다.
    ///
    /// 이미 사라졌거나 정지된 컨테이너는 정상으로 취급합니다.
    pub async fn stop(&self, handle: &SandboxHandle) {
        match self.runtime.stop_container(&handle.id).await {
            Ok(()) => {
                debug!(sandbox = %handle.name, "sandbox stopped");
            }
            Err(ScanEngineError::ContainerNotFound(_) | ScanEngineError::ContainerNotRunning(_)) => {
                debug!(sandbox = %handle.name, "sandbox already gone");
            }
            Err(e) => {
                warn!(sandbox = %handle.name, error = %e, "failed to stop sandbox");
            }
        }
    }

    fn container_name(&self) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        format!("{}-{millis}", self.name_prefix)
    }
}

//! 이미지 확인 -- 로컬 존재 여부 검사 후 필요 시 pull
//!
//! [`ImageResolver::ensure`]가 `false`를 반환하면 스캔은 진행되지 않습니다.

use std::sync::Arc;
use std::time::Duration;

use imagewarden_core::types::ImageRef;
use tracing::{debug, info, warn};

use crate::runtime::ContainerRuntime;

/// 이미지 확인기
pub struct ImageResolver<R: ContainerRuntime> {
    runtime: Arc<R>,
    pull_timeout: Duration,
}

impl<R: ContainerRuntime> ImageResolver<R> {
    /// 새 확인기를 생성합니다.
    pub fn new(runtime: Arc<R>, pull_timeout: Duration) -> Self {
        Self {
            runtime,
            pull_timeout,
        }
    }

    /// 이미지가 로컬에 있음을 보장합니다.
    ///
    /// 로컬에 이미 있거나 pull에 성공하면 `true`를 반환합니다.
    /// pull 실패와 타임아웃은 로그로 남기고 `false`로 변환됩니다.
    pub async fn ensure(&self, image: &ImageRef) -> bool {
        match self.runtime.inspect_image(image.as_str()).await {
            Ok(()) => {
                debug!(image = %image, "image present locally");
                return true;
            }
            Err(e) => {
                info!(image = %image, reason = %e, "image not available locally, pulling");
            }
        }

        match tokio::time::timeout(self.pull_timeout, self.runtime.pull_image(image.as_str()))
            .await
        {
            Ok(Ok(())) => {
                info!(image = %image, "image pulled");
                true
            }
            Ok(Err(e)) => {
                warn!(image = %image, error = %e, "image pull failed");
                false
            }
            Err(_elapsed) => {
                warn!(
                    image = %image,
                    timeout_secs = self.pull_timeout.as_secs(),
                    "image pull timed out"
                );
                false
            }
        }
    }
}

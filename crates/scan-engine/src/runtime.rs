//! Container runtime abstraction for testability.
//!
//! The [`ContainerRuntime`] trait abstracts the bollard Docker API, allowing
//! production code to use [`BollardRuntime`] while tests use `MockRuntime`.
//!
//! # Architecture
//!
//! ```text
//!   ImageResolver   ArtifactStager   SandboxController
//!         │               │                 │
//!         └───────────────┼─────────────────┘
//!                         ▼
//!                ┌──────────────────┐
//!                │ ContainerRuntime │ (trait)
//!                └──────────────────┘
//!                     │        │
//!                     ▼        ▼
//!                ┌───────┐ ┌──────┐
//!                │Bollard│ │ Mock │
//!                └───┬───┘ └──────┘
//!                    ▼
//!              Docker Daemon
//! ```
//!
//! # Examples
//!
//! ```ignore
//! use imagewarden_scan_engine::runtime::{BollardRuntime, ContainerRuntime};
//!
//! let runtime = BollardRuntime::connect_local()?;
//! runtime.ping().await?;
//! runtime.inspect_image("alpine:3.19").await?;
//! # Ok::<(), imagewarden_scan_engine::ScanEngineError>(())
//! ```

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use bollard::errors::Error as BollardError;
use futures_util::StreamExt;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::ScanEngineError;

/// Handle to a running sandbox container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SandboxHandle {
    /// Container ID assigned by the daemon
    pub id: String,
    /// Container name chosen by the controller
    pub name: String,
}

/// Validates a container ID before it reaches the Docker API.
///
/// Docker container IDs are 64-character hex strings (or shorter prefix forms).
fn validate_container_id(id: &str) -> Result<(), ScanEngineError> {
    if id.is_empty() || id.len() > 64 {
        return Err(ScanEngineError::Docker(format!(
            "invalid container ID: length {} (must be 1-64)",
            id.len()
        )));
    }
    if !id.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ScanEngineError::Docker(
            "invalid container ID: contains non-hex characters".to_owned(),
        ));
    }
    Ok(())
}

/// Splits an image reference into the `fromImage` and `tag` pull parameters.
///
/// The Docker API pulls every tag of a repository when `tag` is empty, so an
/// untagged reference is pinned to `latest`. Digest references keep the digest
/// inside `fromImage` and send no tag.
fn split_reference(image: &str) -> (&str, &str) {
    if image.contains('@') {
        return (image, "");
    }
    let name_start = image.rfind('/').map_or(0, |i| i + 1);
    match image[name_start..].rfind(':') {
        Some(i) => {
            let split = name_start + i;
            (&image[..split], &image[split + 1..])
        }
        None => (image, "latest"),
    }
}

/// Trait abstracting container runtime operations.
///
/// All Docker API calls go through this trait, enabling testability via mocking.
/// The trait is `Send + Sync + 'static`, allowing safe sharing across async contexts.
///
/// # Error Handling
///
/// - **404 on images**: `ScanEngineError::ImageNotFound`
/// - **404 on containers**: `ScanEngineError::ContainerNotFound`
/// - **304 on stop**: `ScanEngineError::ContainerNotRunning`
/// - **Connection errors**: `ScanEngineError::DockerConnection`
pub trait ContainerRuntime: Send + Sync + 'static {
    /// Checks whether the image is present locally.
    ///
    /// # Errors
    ///
    /// - `ScanEngineError::ImageNotFound`: Image is not present (404)
    /// - `ScanEngineError::Docker`: Other API errors
    fn inspect_image(&self, image: &str)
    -> impl Future<Output = Result<(), ScanEngineError>> + Send;

    /// Pulls the image from its registry.
    ///
    /// Completes only after the daemon reports the pull finished.
    fn pull_image(&self, image: &str) -> impl Future<Output = Result<(), ScanEngineError>> + Send;

    /// Exports the image as a `docker save` tarball to `dest`.
    ///
    /// Returns the number of bytes written.
    fn save_image(
        &self,
        image: &str,
        dest: &Path,
    ) -> impl Future<Output = Result<u64, ScanEngineError>> + Send;

    /// Creates and starts a detached, self-removing container.
    fn run_sandbox(
        &self,
        image: &str,
        name: &str,
    ) -> impl Future<Output = Result<SandboxHandle, ScanEngineError>> + Send;

    /// Stops a container with a 10-second grace period.
    ///
    /// # Errors
    ///
    /// - `ScanEngineError::ContainerNotFound`: Container does not exist (404)
    /// - `ScanEngineError::ContainerNotRunning`: Container already stopped (304)
    fn stop_container(&self, id: &str)
    -> impl Future<Output = Result<(), ScanEngineError>> + Send;

    /// Checks Docker daemon connectivity.
    fn ping(&self) -> impl Future<Output = Result<(), ScanEngineError>> + Send;
}

/// Production runtime implementation using `bollard`.
///
/// Internally uses `Arc<bollard::Docker>` for safe sharing across async tasks.
///
/// # Connection Management
///
/// - Connection timeout: 120 seconds
/// - API version: Default (auto-negotiated)
/// - Socket path: Configurable (default: platform local socket)
pub struct BollardRuntime {
    docker: Arc<bollard::Docker>,
}

impl BollardRuntime {
    /// Connects to Docker using the default local socket.
    ///
    /// # Errors
    ///
    /// Returns `ScanEngineError::DockerConnection` if the connection fails.
    pub fn connect_local() -> Result<Self, ScanEngineError> {
        let docker = bollard::Docker::connect_with_local_defaults().map_err(|e| {
            ScanEngineError::DockerConnection(format!("failed to connect to docker: {e}"))
        })?;
        Ok(Self {
            docker: Arc::new(docker),
        })
    }

    /// Connects to Docker using a specific socket path.
    ///
    /// # Errors
    ///
    /// Returns `ScanEngineError::DockerConnection` if the connection fails.
    pub fn connect_with_socket(socket_path: &str) -> Result<Self, ScanEngineError> {
        let docker =
            bollard::Docker::connect_with_socket(socket_path, 120, bollard::API_DEFAULT_VERSION)
                .map_err(|e| {
                    ScanEngineError::DockerConnection(format!(
                        "failed to connect to docker at {socket_path}: {e}"
                    ))
                })?;
        Ok(Self {
            docker: Arc::new(docker),
        })
    }

    /// Connects to `socket_path`, or to the local defaults when it is empty.
    pub fn connect(socket_path: &str) -> Result<Self, ScanEngineError> {
        if socket_path.is_empty() {
            Self::connect_local()
        } else {
            Self::connect_with_socket(socket_path)
        }
    }
}

fn status_code(err: &BollardError) -> Option<u16> {
    match err {
        BollardError::DockerResponseServerError { status_code, .. } => Some(*status_code),
        _ => None,
    }
}

impl ContainerRuntime for BollardRuntime {
    async fn inspect_image(&self, image: &str) -> Result<(), ScanEngineError> {
        self.docker
            .inspect_image(image)
            .await
            .map(|_| ())
            .map_err(|e| {
                if status_code(&e) == Some(404) {
                    ScanEngineError::ImageNotFound(image.to_owned())
                } else {
                    ScanEngineError::Docker(format!("inspect image failed: {e}"))
                }
            })
    }

    async fn pull_image(&self, image: &str) -> Result<(), ScanEngineError> {
        use bollard::image::CreateImageOptions;

        let (from_image, tag) = split_reference(image);
        let options = CreateImageOptions {
            from_image,
            tag,
            ..Default::default()
        };

        let mut stream = std::pin::pin!(self.docker.create_image(Some(options), None, None));
        while let Some(progress) = stream.next().await {
            let info = progress.map_err(|e| {
                if status_code(&e) == Some(404) {
                    ScanEngineError::ImageNotFound(image.to_owned())
                } else {
                    ScanEngineError::Docker(format!("pull image failed: {e}"))
                }
            })?;
            if let Some(status) = info.status {
                debug!(image = image, status = %status, "pull progress");
            }
        }
        Ok(())
    }

    async fn save_image(&self, image: &str, dest: &Path) -> Result<u64, ScanEngineError> {
        let io_err = |source: std::io::Error| ScanEngineError::Io {
            path: dest.display().to_string(),
            source,
        };

        let mut file = tokio::fs::File::create(dest).await.map_err(io_err)?;
        let mut stream = std::pin::pin!(self.docker.export_image(image));
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk
                .map_err(|e| ScanEngineError::Docker(format!("export image failed: {e}")))?;
            file.write_all(&chunk).await.map_err(io_err)?;
            written = written.saturating_add(u64::try_from(chunk.len()).unwrap_or(u64::MAX));
        }
        file.flush().await.map_err(io_err)?;

        Ok(written)
    }

    async fn run_sandbox(&self, image: &str, name: &str) -> Result<SandboxHandle, ScanEngineError> {
        use bollard::container::{
            Config, CreateContainerOptions, RemoveContainerOptions, StartContainerOptions,
        };
        use bollard::models::HostConfig;

        let options = CreateContainerOptions {
            name,
            platform: None,
        };
        let config = Config {
            image: Some(image),
            host_config: Some(HostConfig {
                auto_remove: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };

        let created = self
            .docker
            .create_container(Some(options), config)
            .await
            .map_err(|e| ScanEngineError::Docker(format!("create container failed: {e}")))?;

        if let Err(e) = self
            .docker
            .start_container(&created.id, None::<StartContainerOptions<String>>)
            .await
        {
            // auto_remove는 시작된 컨테이너에만 적용되므로 직접 제거
            let remove = RemoveContainerOptions {
                force: true,
                ..Default::default()
            };
            if let Err(remove_err) = self.docker.remove_container(&created.id, Some(remove)).await
            {
                warn!(
                    container_id = %created.id,
                    error = %remove_err,
                    "failed to remove sandbox container after start failure"
                );
            }
            return Err(ScanEngineError::Docker(format!(
                "start container failed: {e}"
            )));
        }

        Ok(SandboxHandle {
            id: created.id,
            name: name.to_owned(),
        })
    }

    async fn stop_container(&self, id: &str) -> Result<(), ScanEngineError> {
        validate_container_id(id)?;

        use bollard::container::StopContainerOptions;

        self.docker
            .stop_container(id, Some(StopContainerOptions { t: 10 }))
            .await
            .map_err(|e| match status_code(&e) {
                Some(404) => ScanEngineError::ContainerNotFound(id.to_owned()),
                Some(304) => ScanEngineError::ContainerNotRunning(id.to_owned()),
                _ => ScanEngineError::Docker(format!("stop container failed: {e}")),
            })
    }

    async fn ping(&self) -> Result<(), ScanEngineError> {
        self.docker
            .ping()
            .await
            .map_err(|e| ScanEngineError::DockerConnection(format!("ping failed: {e}")))?;
        Ok(())
    }
}

/// 테스트용 Mock 컨테이너 런타임
///
/// 설정 가능한 응답을 반환하고 호출 횟수를 기록합니다.
#[cfg(test)]
#[derive(Default)]
pub struct MockRuntime {
    /// 로컬에 이미지가 있는지
    pub image_present: bool,
    /// pull 성공 여부
    pub pull_succeeds: bool,
    /// save 실패 시뮬레이션
    pub fail_save: bool,
    /// 샌드박스 실행 실패 시뮬레이션
    pub fail_sandbox: bool,
    /// stop 호출 시 반환할 에러 종류
    pub stop_error: Option<MockStopError>,
    /// save 호출 전 대기 시간
    pub save_delay: Option<std::time::Duration>,
    pub inspect_calls: std::sync::atomic::AtomicUsize,
    pub pull_calls: std::sync::atomic::AtomicUsize,
    pub save_calls: std::sync::atomic::AtomicUsize,
    pub run_calls: std::sync::atomic::AtomicUsize,
    pub stop_calls: std::sync::atomic::AtomicUsize,
}

/// Mock stop 에러 종류
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub enum MockStopError {
    NotFound,
    NotRunning,
    Api,
}

#[cfg(test)]
impl MockRuntime {
    /// 이미지가 로컬에 있는 mock 런타임을 생성합니다.
    pub fn new() -> Self {
        Self {
            image_present: true,
            ..Self::default()
        }
    }

    /// 로컬에 이미지가 없도록 설정합니다.
    pub fn without_local_image(mut self) -> Self {
        self.image_present = false;
        self
    }

    /// pull이 성공하도록 설정합니다.
    pub fn with_pull_success(mut self) -> Self {
        self.pull_succeeds = true;
        self
    }

    /// save가 실패하도록 설정합니다.
    pub fn with_failing_save(mut self) -> Self {
        self.fail_save = true;
        self
    }

    /// save 전에 대기하도록 설정합니다.
    pub fn with_save_delay(mut self, delay: std::time::Duration) -> Self {
        self.save_delay = Some(delay);
        self
    }

    /// 샌드박스 실행이 실패하도록 설정합니다.
    pub fn with_failing_sandbox(mut self) -> Self {
        self.fail_sandbox = true;
        self
    }

    /// stop 호출이 주어진 에러를 반환하도록 설정합니다.
    pub fn with_stop_error(mut self, err: MockStopError) -> Self {
        self.stop_error = Some(err);
        self
    }

    pub fn count(counter: &std::sync::atomic::AtomicUsize) -> usize {
        counter.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
impl ContainerRuntime for MockRuntime {
    async fn inspect_image(&self, image: &str) -> Result<(), ScanEngineError> {
        self.inspect_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if self.image_present {
            Ok(())
        } else {
            Err(ScanEngineError::ImageNotFound(image.to_owned()))
        }
    }

    async fn pull_image(&self, image: &str) -> Result<(), ScanEngineError> {
        self.pull_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if self.pull_succeeds {
            Ok(())
        } else {
            Err(ScanEngineError::Docker(format!(
                "pull access denied for {image}"
            )))
        }
    }

    async fn save_image(&self, _image: &str, dest: &Path) -> Result<u64, ScanEngineError> {
        self.save_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if let Some(delay) = self.save_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_save {
            return Err(ScanEngineError::Docker("no space left on device".to_owned()));
        }
        tokio::fs::write(dest, b"mock archive")
            .await
            .map_err(|source| ScanEngineError::Io {
                path: dest.display().to_string(),
                source,
            })?;
        Ok(12)
    }

    async fn run_sandbox(&self, _image: &str, name: &str) -> Result<SandboxHandle, ScanEngineError> {
        self.run_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if self.fail_sandbox {
            return Err(ScanEngineError::Docker("create container failed".to_owned()));
        }
        Ok(SandboxHandle {
            id: "abc123def456".to_owned(),
            name: name.to_owned(),
        })
    }

    async fn stop_container(&self, id: &str) -> Result<(), ScanEngineError> {
        self.stop_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        match self.stop_error {
            None => Ok(()),
            Some(MockStopError::NotFound) => Err(ScanEngineError::ContainerNotFound(id.to_owned())),
            Some(MockStopError::NotRunning) => {
                Err(ScanEngineError::ContainerNotRunning(id.to_owned()))
            }
            Some(MockStopError::Api) => Err(ScanEngineError::Docker("daemon busy".to_owned())),
        }
    }

    async fn ping(&self) -> Result<(), ScanEngineError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_container_id_accepts_hex() {
        assert!(validate_container_id("abc123def456").is_ok());
        assert!(validate_container_id(&"a".repeat(64)).is_ok());
    }

    #[test]
    fn validate_container_id_rejects_invalid() {
        assert!(validate_container_id("").is_err());
        assert!(validate_container_id(&"a".repeat(65)).is_err());
        assert!(validate_container_id("abc; rm -rf /").is_err());
        assert!(validate_container_id("imagewarden-sandbox-1").is_err());
    }

    #[test]
    fn split_reference_with_tag() {
        assert_eq!(split_reference("nginx:1.25"), ("nginx", "1.25"));
        assert_eq!(
            split_reference("ghcr.io/org/app:v1"),
            ("ghcr.io/org/app", "v1")
        );
    }

    #[test]
    fn split_reference_without_tag_defaults_to_latest() {
        assert_eq!(split_reference("alpine"), ("alpine", "latest"));
        // 레지스트리 포트는 태그가 아님
        assert_eq!(
            split_reference("localhost:5000/app"),
            ("localhost:5000/app", "latest")
        );
    }

    #[test]
    fn split_reference_with_digest() {
        let image = "alpine@sha256:abcdef";
        assert_eq!(split_reference(image), (image, ""));
    }

    #[tokio::test]
    async fn mock_runtime_counts_calls() {
        let runtime = MockRuntime::new();
        runtime.inspect_image("alpine").await.unwrap();
        runtime.inspect_image("alpine").await.unwrap();
        assert_eq!(MockRuntime::count(&runtime.inspect_calls), 2);
        assert_eq!(MockRuntime::count(&runtime.pull_calls), 0);
    }

    #[tokio::test]
    async fn mock_runtime_missing_image() {
        let runtime = MockRuntime::new().without_local_image();
        let err = runtime.inspect_image("ghost").await.unwrap_err();
        assert!(matches!(err, ScanEngineError::ImageNotFound(_)));
        assert!(runtime.pull_image("ghost").await.is_err());
    }

    #[tokio::test]
    async fn mock_runtime_stop_errors() {
        let runtime = MockRuntime::new().with_stop_error(MockStopError::NotRunning);
        let err = runtime.stop_container("abc123").await.unwrap_err();
        assert!(matches!(err, ScanEngineError::ContainerNotRunning(_)));
    }

    #[test]
    fn container_runtime_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<MockRuntime>();
        assert_send_sync::<BollardRuntime>();
    }
}

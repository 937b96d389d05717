//! 외부 도구 실행 -- trivy, yara, clamscan 프로세스 호출
//!
//! [`ToolRunner`]는 외부 프로그램 실행을 추상화합니다.
//! 프로덕션에서는 [`ProcessToolRunner`]가 `tokio::process::Command`로 실행하고,
//! 테스트에서는 미리 정해진 출력을 반환하는 mock을 사용합니다.

use std::future::Future;
use std::process::Stdio;
use std::time::Duration;

use tracing::debug;

use crate::error::ScanEngineError;

/// 외부 도구 실행 결과
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// 종료 코드 (시그널로 종료된 경우 `None`)
    pub status: Option<i32>,
    /// 표준 출력 (손실 허용 UTF-8)
    pub stdout: String,
    /// 표준 에러 (손실 허용 UTF-8)
    pub stderr: String,
}

impl ToolOutput {
    /// 종료 코드 0 여부
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// 사용자에게 보여줄 진단 메시지
    ///
    /// stderr, stdout 순으로 비어 있지 않은 첫 번째 값을 반환합니다.
    pub fn diagnostic(&self) -> Option<&str> {
        [self.stderr.trim(), self.stdout.trim()]
            .into_iter()
            .find(|s| !s.is_empty())
    }
}

/// 외부 도구 실행 trait
///
/// 구현체는 `timeout` 안에 프로세스가 끝나지 않으면 프로세스를 종료하고
/// `ScanEngineError::Timeout`을 반환해야 합니다.
pub trait ToolRunner: Send + Sync + 'static {
    /// 프로그램을 인자와 함께 실행하고 출력을 수집합니다.
    ///
    /// 0이 아닌 종료 코드는 에러가 아니며 `ToolOutput::status`로 전달됩니다.
    ///
    /// # Errors
    ///
    /// - `ScanEngineError::Tool`: 프로세스 실행 실패 (실행 파일 없음, 권한 등)
    /// - `ScanEngineError::Timeout`: 제한 시간 초과
    fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> impl Future<Output = Result<ToolOutput, ScanEngineError>> + Send;
}

/// `tokio::process` 기반 도구 실행기
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessToolRunner;

impl ToolRunner for ProcessToolRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<ToolOutput, ScanEngineError> {
        debug!(program, ?args, timeout_secs = timeout.as_secs(), "spawning tool");

        let child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ScanEngineError::Tool {
                tool: program.to_owned(),
                reason: e.to_string(),
            })?;

        // 타임아웃 시 future가 drop되면서 kill_on_drop으로 프로세스가 종료됨
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(ScanEngineError::Tool {
                    tool: program.to_owned(),
                    reason: e.to_string(),
                });
            }
            Err(_elapsed) => {
                return Err(ScanEngineError::Timeout {
                    operation: program.to_owned(),
                    secs: timeout.as_secs(),
                });
            }
        };

        Ok(ToolOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// 테스트용 Mock 도구 실행기
///
/// 프로그램 이름별로 미리 정한 결과를 반환하고 호출 인자를 기록합니다.
#[cfg(test)]
#[derive(Default)]
pub struct MockToolRunner {
    responses: std::collections::HashMap<String, MockResponse>,
    calls: std::sync::Mutex<Vec<(String, Vec<String>)>>,
}

#[cfg(test)]
#[derive(Clone)]
enum MockResponse {
    Output(ToolOutput),
    Timeout,
    SpawnError(String),
}

#[cfg(test)]
impl MockToolRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// 프로그램이 주어진 종료 코드와 출력을 반환하도록 설정합니다.
    pub fn with_output(mut self, program: &str, status: i32, stdout: &str, stderr: &str) -> Self {
        self.responses.insert(
            program.to_owned(),
            MockResponse::Output(ToolOutput {
                status: Some(status),
                stdout: stdout.to_owned(),
                stderr: stderr.to_owned(),
            }),
        );
        self
    }

    /// 프로그램이 타임아웃되도록 설정합니다.
    pub fn with_timeout(mut self, program: &str) -> Self {
        self.responses
            .insert(program.to_owned(), MockResponse::Timeout);
        self
    }

    /// 프로그램 실행 자체가 실패하도록 설정합니다.
    pub fn with_spawn_error(mut self, program: &str, reason: &str) -> Self {
        self.responses.insert(
            program.to_owned(),
            MockResponse::SpawnError(reason.to_owned()),
        );
        self
    }

    /// 기록된 호출 목록
    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
impl ToolRunner for MockToolRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<ToolOutput, ScanEngineError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((program.to_owned(), args.to_vec()));
        }
        match self.responses.get(program).cloned() {
            Some(MockResponse::Output(output)) => Ok(output),
            Some(MockResponse::Timeout) => Err(ScanEngineError::Timeout {
                operation: program.to_owned(),
                secs: timeout.as_secs(),
            }),
            Some(MockResponse::SpawnError(reason)) => Err(ScanEngineError::Tool {
                tool: program.to_owned(),
                reason,
            }),
            None => Err(ScanEngineError::Tool {
                tool: program.to_owned(),
                reason: "No such file or directory (os error 2)".to_owned(),
            }),
        }
    }
}

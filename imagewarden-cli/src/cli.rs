//! Command-line argument definitions (clap derive)

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use imagewarden_core::types::RiskLevel;

/// imagewarden -- 컨테이너 이미지 보안 스캔 및 위험도 판정 도구
#[derive(Debug, Parser)]
#[command(name = "imagewarden", version, about)]
pub struct Cli {
    /// 설정 파일 경로
    #[arg(short, long, default_value = "imagewarden.toml")]
    pub config: PathBuf,

    /// 로그 레벨 (설정 파일과 환경변수보다 우선)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// 출력 형식
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored text
    Text,
    /// Pretty-printed JSON
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// 이미지를 스캔하고 위험도를 판정합니다
    Scan(ScanArgs),

    /// 설정 파일 검증 및 조회
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// 이미지 참조 (예: `nginx:latest`, `nginx latest`)
    #[arg(required = true, num_args = 1..)]
    pub image: Vec<String>,

    /// 동적 샌드박스 분석을 건너뜁니다
    #[arg(long)]
    pub no_sandbox: bool,

    /// 판정이 이 등급 이상이면 exit code 4로 종료합니다
    #[arg(long, value_enum)]
    pub fail_on: Option<FailOn>,
}

impl ScanArgs {
    /// Joins the raw words with a space, as typed into a single input field.
    pub fn image_input(&self) -> String {
        self.image.join(" ")
    }
}

/// `--fail-on` threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FailOn {
    Low,
    Medium,
    High,
    Critical,
}

impl From<FailOn> for RiskLevel {
    fn from(level: FailOn) -> Self {
        match level {
            FailOn::Low => RiskLevel::Low,
            FailOn::Medium => RiskLevel::Medium,
            FailOn::High => RiskLevel::High,
            FailOn::Critical => RiskLevel::Critical,
        }
    }
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// 설정 파일을 로드하고 유효성을 검증합니다
    Validate,

    /// 적용되는 설정을 TOML로 출력합니다
    Show {
        /// 특정 섹션만 출력 (general, docker, stage, vulnerability, signature,
        /// antivirus, sandbox, runtime, cleanup)
        #[arg(long)]
        section: Option<String>,
    },
}

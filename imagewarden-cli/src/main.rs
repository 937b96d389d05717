//! imagewarden CLI -- 컨테이너 이미지 보안 스캔 명령줄 도구
//!
//! # 사용 예시
//!
//! ```text
//! imagewarden scan nginx:latest
//! imagewarden scan nginx latest --no-sandbox --fail-on high
//! imagewarden --output json scan alpine:3.19
//! imagewarden config validate
//! imagewarden config show --section sandbox
//! ```

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;
use colored::Colorize;

use imagewarden_core::config::WardenConfig;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            e.exit_code()
        }
    };

    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<(), CliError> {
    // 로깅 설정만 먼저 읽습니다. 설정 파일 자체의 오류는 각 명령이 보고합니다.
    let general = WardenConfig::load_or_default(&cli.config)
        .await
        .map(|config| config.general)
        .unwrap_or_default();

    logging::init_tracing(&general, cli.log_level.as_deref())
        .map_err(|e| CliError::Config(e.to_string()))?;
    imagewarden_core::metrics::describe_metrics();

    let writer = OutputWriter::new(cli.output);

    match cli.command {
        Commands::Scan(args) => commands::scan::execute(args, &cli.config, &writer).await,
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
    }
}

//! `imagewarden scan` command handler

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use colored::{ColoredString, Colorize};
use tracing::info;

use imagewarden_core::config::WardenConfig;
use imagewarden_core::types::{ImageRef, RiskLevel};
use imagewarden_scan_engine::{
    BollardRuntime, RiskAssessment, ScanEngineBuilder, ScanEngineConfig, ScanError, ScanOutcome,
    ScanReport,
};

use crate::cli::ScanArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `scan` command.
///
/// 이미지 하나를 끝까지 스캔하고 보고서를 출력한 뒤, `--fail-on`이 지정되어
/// 있으면 판정 등급을 임계값과 비교합니다.
pub async fn execute(
    args: ScanArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    // 입력 오류는 Docker 연결 전에 보고
    let image = parse_input(&args)?;

    let mut config = WardenConfig::load_or_default(config_path).await?;
    if args.no_sandbox {
        config.sandbox.enabled = false;
    }

    let runtime = BollardRuntime::connect(&config.docker.socket)?;
    let engine = ScanEngineBuilder::<BollardRuntime>::new()
        .config(ScanEngineConfig::from_core(&config))
        .runtime(Arc::new(runtime))
        .build()?;

    engine.ping().await?;

    info!(image = %image, sandbox = config.sandbox.enabled, "starting image scan");

    let report = engine.run_scan(image.as_str()).await?;
    writer.render(&report)?;

    check_fail_on(&report.risk, args.fail_on.map(RiskLevel::from))
}

fn parse_input(args: &ScanArgs) -> Result<ImageRef, CliError> {
    ImageRef::parse(&args.image_input()).map_err(|e| CliError::from(ScanError::from(e)))
}

/// 판정 등급이 임계값 이상이면 `CliError::RiskThreshold`를 반환합니다.
fn check_fail_on(risk: &RiskAssessment, threshold: Option<RiskLevel>) -> Result<(), CliError> {
    match threshold {
        Some(threshold) if risk.level >= threshold => Err(CliError::RiskThreshold {
            level: risk.level,
            score: risk.score,
            threshold,
        }),
        _ => Ok(()),
    }
}

fn colored_level(level: RiskLevel) -> ColoredString {
    let text = level.to_string();
    match level {
        RiskLevel::Critical => text.red().bold(),
        RiskLevel::High => text.red(),
        RiskLevel::Medium => text.yellow(),
        RiskLevel::Low => text.green(),
    }
}

/// 폭 8로 패딩한 뒤 색을 입힙니다 (escape 코드가 폭 계산에 섞이지 않도록).
fn outcome_status<T>(outcome: &ScanOutcome<T>) -> ColoredString {
    let status = format!("{:<8}", outcome.status_name());
    match outcome {
        ScanOutcome::Success(_) => status.green(),
        ScanOutcome::Warning(_) => status.yellow(),
        ScanOutcome::Error(_) => status.red(),
    }
}

/// 어댑터 결과 한 줄: 성공이면 요약, 아니면 메시지
fn outcome_detail<T>(outcome: &ScanOutcome<T>, summarize: impl Fn(&T) -> String) -> String {
    match outcome {
        ScanOutcome::Success(payload) => summarize(payload),
        ScanOutcome::Warning(msg) | ScanOutcome::Error(msg) => msg.clone(),
    }
}

impl Render for ScanReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "Image: {}", self.image.as_str().bold())?;
        writeln!(w, "Scan ID: {}", self.scan_id)?;
        writeln!(w)?;

        let score = format!("{}/100", self.risk.score);
        writeln!(
            w,
            "Risk: {} ({})",
            colored_level(self.risk.level),
            score.bold()
        )?;
        writeln!(w)?;

        if !self.risk.high_priority.is_empty() {
            writeln!(w, "{}", "High priority:".red().bold())?;
            for item in &self.risk.high_priority {
                writeln!(w, "  ! {}", item)?;
            }
            writeln!(w)?;
        }

        writeln!(w, "{}", "Findings:".bold())?;
        for finding in &self.risk.findings {
            writeln!(w, "  - {}", finding)?;
        }
        writeln!(w)?;

        writeln!(w, "{:<8} {:<8} Detail", "Tool", "Status")?;
        writeln!(w, "{}", "-".repeat(60))?;

        let vulnerability = outcome_detail(&self.vulnerability, |report| {
            let c = report.severity_counts();
            format!(
                "{} total (C:{} H:{} M:{} L:{})",
                c.total, c.critical, c.high, c.medium, c.low
            )
        });
        let signature = outcome_detail(&self.signature, |matches| {
            format!("{} rule match(es)", matches.matches.len())
        });
        let antivirus = outcome_detail(&self.antivirus, |report| report.output.clone());
        let runtime = outcome_detail(&self.runtime, |alerts| {
            format!("{} alert line(s)", alerts.alerts.len())
        });

        let rows = [
            ("Trivy", outcome_status(&self.vulnerability), vulnerability),
            ("YARA", outcome_status(&self.signature), signature),
            ("ClamAV", outcome_status(&self.antivirus), antivirus),
            ("Falco", outcome_status(&self.runtime), runtime),
        ];
        for (tool, status, detail) in rows {
            writeln!(w, "{:<8} {} {}", tool, status, detail)?;
        }

        if let ScanOutcome::Success(matches) = &self.signature {
            for line in &matches.matches {
                writeln!(w, "  yara: {}", line)?;
            }
        }
        if let ScanOutcome::Success(alerts) = &self.runtime {
            for line in &alerts.alerts {
                writeln!(w, "  falco: {}", line.dimmed())?;
            }
        }

        writeln!(w)?;
        writeln!(w, "Completed in {} ms", self.duration_ms)?;

        Ok(())
    }
}

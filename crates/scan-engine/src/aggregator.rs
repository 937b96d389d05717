//! 위험도 집계기
//!
//! 네 어댑터의 결과를 하나의 [`RiskAssessment`]로 정규화하는 순수 함수입니다.
//! 어떤 `Success`/`Warning`/`Error` 조합에도 실패하지 않습니다 (total).
//!
//! # 점수 정책
//!
//! | 입력 | 기여 점수 | 고우선순위 |
//! |------|-----------|------------|
//! | 취약점 | `min(critical*10 + high*5, 30)` | `critical > 0` 또는 `high > 3` |
//! | 시그니처 매치 | 70 | 항상 |
//! | 감염 파일 | 70 | 항상 |
//! | 런타임 알림 > 5 | `min(count*3, 25)` | 항상 |
//! | 런타임 알림 1..=5 | 0 | 아니오 |
//!
//! `Error`/`Warning` 결과는 점수에 기여하지 않고 진단 라인만 추가합니다.
//! 가중치는 정책 상수이며 측정값이 아닙니다.

use imagewarden_core::types::RiskLevel;
use serde::Serialize;

use crate::outcome::{
    AdapterKind, AntivirusReport, RuntimeAlerts, ScanOutcome, SignatureMatches,
    VulnerabilityReport,
};

/// CRITICAL 취약점 1건당 점수
pub const CRITICAL_VULN_WEIGHT: u32 = 10;
/// HIGH 취약점 1건당 점수
pub const HIGH_VULN_WEIGHT: u32 = 5;
/// 취약점 기여 점수 상한
pub const VULN_SCORE_CAP: u32 = 30;
/// 시그니처 매치 점수
pub const SIGNATURE_MATCH_SCORE: u32 = 70;
/// 감염 파일 점수
pub const INFECTION_SCORE: u32 = 70;
/// 런타임 알림 1건당 점수
pub const RUNTIME_ALERT_WEIGHT: u32 = 3;
/// 런타임 기여 점수 상한
pub const RUNTIME_SCORE_CAP: u32 = 25;
/// 이 개수를 초과하면 런타임 알림이 의심 행위로 분류됨
pub const RUNTIME_ALERT_THRESHOLD: usize = 5;
/// 이 개수를 초과하는 HIGH 취약점은 고우선순위
pub const HIGH_VULN_PRIORITY_THRESHOLD: usize = 3;
/// 최대 점수
pub const MAX_SCORE: u32 = 100;

/// 종합 위험 평가
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskAssessment {
    /// 0..=100
    pub score: u8,
    /// 점수에서 파생된 등급
    pub level: RiskLevel,
    /// 어댑터 순서(취약점, 시그니처, 안티바이러스, 런타임)를 따르는 결과 라인
    pub findings: Vec<String>,
    /// 배포 전 조치가 필요한 항목 (같은 상대 순서)
    pub high_priority: Vec<String>,
}

#[derive(Default)]
struct Tally {
    score: u32,
    findings: Vec<String>,
    high_priority: Vec<String>,
}

impl Tally {
    fn finding(&mut self, line: String) {
        self.findings.push(line);
    }

    fn priority(&mut self, line: String) {
        self.high_priority.push(line);
    }

    /// `Warning`/`Error` 결과를 진단 라인으로 기록합니다. 성공 결과를 반환합니다.
    fn unwrap_outcome<'a, T>(&mut self, kind: AdapterKind, outcome: &'a ScanOutcome<T>) -> Option<&'a T> {
        match outcome {
            ScanOutcome::Success(payload) => Some(payload),
            ScanOutcome::Warning(msg) => {
                self.finding(format!("{}: Warning - {msg}", kind.tool_name()));
                None
            }
            ScanOutcome::Error(msg) => {
                self.finding(format!("{}: Scan error - {msg}", kind.tool_name()));
                None
            }
        }
    }
}

/// 네 어댑터 결과를 집계합니다.
pub fn aggregate(
    vulnerability: &ScanOutcome<VulnerabilityReport>,
    signature: &ScanOutcome<SignatureMatches>,
    antivirus: &ScanOutcome<AntivirusReport>,
    runtime: &ScanOutcome<RuntimeAlerts>,
) -> RiskAssessment {
    let mut tally = Tally::default();

    if let Some(report) = tally.unwrap_outcome(AdapterKind::Vulnerability, vulnerability) {
        let counts = report.severity_counts();
        if counts.total > 0 {
            tally.finding(format!(
                "Trivy: {} vulnerabilities (CRITICAL={}, HIGH={})",
                counts.total, counts.critical, counts.high
            ));
        } else {
            tally.finding("Trivy: No known vulnerabilities found".to_owned());
        }

        let weighted = saturating_weight(counts.critical, CRITICAL_VULN_WEIGHT)
            .saturating_add(saturating_weight(counts.high, HIGH_VULN_WEIGHT));
        tally.score += weighted.min(VULN_SCORE_CAP);

        if counts.critical > 0 || counts.high > HIGH_VULN_PRIORITY_THRESHOLD {
            tally.priority("Trivy: Fix critical/high vulnerabilities before deployment".to_owned());
        }
    }

    if let Some(matches) = tally.unwrap_outcome(AdapterKind::Signature, signature) {
        if matches.detected() {
            tally.finding("YARA: MALWARE signature(s) detected".to_owned());
            tally.priority("YARA: Remove or replace image - malware signature present".to_owned());
            tally.score += SIGNATURE_MATCH_SCORE;
        } else {
            tally.finding("YARA: No malware signatures found".to_owned());
        }
    }

    if let Some(report) = tally.unwrap_outcome(AdapterKind::Antivirus, antivirus) {
        if report.infected {
            tally.finding("ClamAV: Infected files detected".to_owned());
            tally.priority("ClamAV: Infected files - image must NOT be used".to_owned());
            tally.score += INFECTION_SCORE;
        } else {
            tally.finding("ClamAV: Image is clean (no infected files)".to_owned());
        }
    }

    if let Some(alerts) = tally.unwrap_outcome(AdapterKind::Runtime, runtime) {
        let count = alerts.count();
        if count > RUNTIME_ALERT_THRESHOLD {
            tally.finding(format!("Falco: {count} suspicious runtime alerts"));
            tally.priority(
                "Falco: Investigate suspicious container behavior before deployment".to_owned(),
            );
            tally.score += saturating_weight(count, RUNTIME_ALERT_WEIGHT).min(RUNTIME_SCORE_CAP);
        } else if count > 0 {
            tally.finding(format!("Falco: {count} minor runtime alerts"));
        } else {
            tally.finding("Falco: No runtime anomalies detected".to_owned());
        }
    }

    let score = u8::try_from(tally.score.min(MAX_SCORE)).unwrap_or(u8::MAX);
    RiskAssessment {
        score,
        level: RiskLevel::from_score(score),
        findings: tally.findings,
        high_priority: tally.high_priority,
    }
}

fn saturating_weight(count: usize, weight: u32) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX).saturating_mul(weight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{TargetResult, VulnerabilityEntry};

    fn vulns(severities: &[&str]) -> ScanOutcome<VulnerabilityReport> {
        let entries = severities
            .iter()
            .enumerate()
            .map(|(i, s)| VulnerabilityEntry {
                vulnerability_id: format!("CVE-2024-{i:04}"),
                severity: (*s).to_owned(),
                ..Default::default()
            })
            .collect();
        ScanOutcome::Success(VulnerabilityReport {
            artifact_name: None,
            results: vec![TargetResult {
                target: "image".to_owned(),
                vulnerabilities: Some(entries),
            }],
        })
    }

    fn clean_sig() -> ScanOutcome<SignatureMatches> {
        ScanOutcome::Success(SignatureMatches::default())
    }

    fn clean_av() -> ScanOutcome<AntivirusReport> {
        ScanOutcome::Success(AntivirusReport::from_output(""))
    }

    fn alerts(n: usize) -> ScanOutcome<RuntimeAlerts> {
        ScanOutcome::Success(RuntimeAlerts {
            sandbox: Some("imagewarden-sandbox-1".to_owned()),
            alerts: (0..n).map(|i| format!("alert {i}")).collect(),
        })
    }

    #[test]
    fn clean_image_is_low() {
        let risk = aggregate(&vulns(&[]), &clean_sig(), &clean_av(), &alerts(0));
        assert_eq!(risk.score, 0);
        assert_eq!(risk.level, RiskLevel::Low);
        assert_eq!(
            risk.findings,
            vec![
                "Trivy: No known vulnerabilities found",
                "YARA: No malware signatures found",
                "ClamAV: Image is clean (no infected files)",
                "Falco: No runtime anomalies detected",
            ]
        );
        assert!(risk.high_priority.is_empty());
    }

    #[test]
    fn vulnerabilities_only() {
        // 2 CRITICAL + 1 HIGH = 25
        let risk = aggregate(
            &vulns(&["CRITICAL", "CRITICAL", "HIGH", "LOW"]),
            &clean_sig(),
            &clean_av(),
            &alerts(0),
        );
        assert_eq!(risk.score, 25);
        assert_eq!(risk.level, RiskLevel::Medium);
        assert_eq!(risk.findings[0], "Trivy: 4 vulnerabilities (CRITICAL=2, HIGH=1)");
        assert_eq!(
            risk.high_priority,
            vec!["Trivy: Fix critical/high vulnerabilities before deployment"]
        );
    }

    #[test]
    fn vulnerability_contribution_is_capped() {
        let severities = vec!["CRITICAL"; 20];
        let risk = aggregate(&vulns(&severities), &clean_sig(), &clean_av(), &alerts(0));
        assert_eq!(risk.score, 30);
    }

    #[test]
    fn few_high_vulnerabilities_are_not_priority() {
        let risk = aggregate(
            &vulns(&["HIGH", "HIGH", "HIGH"]),
            &clean_sig(),
            &clean_av(),
            &alerts(0),
        );
        assert_eq!(risk.score, 15);
        assert!(risk.high_priority.is_empty());

        let risk = aggregate(
            &vulns(&["HIGH", "HIGH", "HIGH", "HIGH"]),
            &clean_sig(),
            &clean_av(),
            &alerts(0),
        );
        assert_eq!(risk.high_priority.len(), 1);
    }

    #[test]
    fn malware_and_infection_reach_critical() {
        let sig = ScanOutcome::Success(SignatureMatches::from_output("Miner /x/bin/xmrig\n"));
        let av = ScanOutcome::Success(AntivirusReport::from_output("/x/evil: Eicar FOUND"));
        let risk = aggregate(&vulns(&[]), &sig, &av, &alerts(0));

        assert_eq!(risk.score, 100);
        assert_eq!(risk.level, RiskLevel::Critical);
        assert_eq!(
            risk.high_priority,
            vec![
                "YARA: Remove or replace image - malware signature present",
                "ClamAV: Infected files - image must NOT be used",
            ]
        );
    }

    #[test]
    fn degraded_adapters_add_diagnostic_lines() {
        let risk = aggregate(
            &ScanOutcome::Error("Trivy scan timed out".to_owned()),
            &ScanOutcome::Error("staging failed: disk full".to_owned()),
            &ScanOutcome::Warning("ClamAV disabled by configuration".to_owned()),
            &ScanOutcome::Warning("Falco not installed or logs not available".to_owned()),
        );

        assert_eq!(risk.score, 0);
        assert_eq!(risk.level, RiskLevel::Low);
        assert_eq!(
            risk.findings,
            vec![
                "Trivy: Scan error - Trivy scan timed out",
                "YARA: Scan error - staging failed: disk full",
                "ClamAV: Warning - ClamAV disabled by configuration",
                "Falco: Warning - Falco not installed or logs not available",
            ]
        );
    }

    #[test]
    fn minor_runtime_alerts_do_not_score() {
        let risk = aggregate(&vulns(&[]), &clean_sig(), &clean_av(), &alerts(5));
        assert_eq!(risk.score, 0);
        assert_eq!(risk.findings[3], "Falco: 5 minor runtime alerts");
        assert!(risk.high_priority.is_empty());
    }

    #[test]
    fn suspicious_runtime_alerts_score_and_cap() {
        let risk = aggregate(&vulns(&[]), &clean_sig(), &clean_av(), &alerts(6));
        assert_eq!(risk.score, 18);
        assert_eq!(risk.findings[3], "Falco: 6 suspicious runtime alerts");
        assert_eq!(risk.high_priority.len(), 1);

        let risk = aggregate(&vulns(&[]), &clean_sig(), &clean_av(), &alerts(20));
        assert_eq!(risk.score, 25);
        assert_eq!(risk.level, RiskLevel::Medium);
    }

    #[test]
    fn combined_contributions_clamp_to_100() {
        let sig = ScanOutcome::Success(SignatureMatches::from_output("Miner x\n"));
        let risk = aggregate(&vulns(&["CRITICAL"; 5]), &sig, &clean_av(), &alerts(10));
        // 30 + 70 + 25 = 125 -> 100
        assert_eq!(risk.score, 100);
    }

    #[test]
    fn assessment_serializes_level_uppercase() {
        let risk = aggregate(&vulns(&[]), &clean_sig(), &clean_av(), &alerts(0));
        let json = serde_json::to_value(&risk).unwrap();
        assert_eq!(json["level"], "LOW");
        assert_eq!(json["score"], 0);
    }
}

#![no_main]

use arbitrary::Arbitrary;
use imagewarden_core::types::RiskLevel;
use imagewarden_scan_engine::{
    AntivirusReport, RuntimeAlerts, ScanOutcome, SignatureMatches, VulnerabilityReport, aggregate,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Status {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Arbitrary)]
struct Input {
    trivy: (Status, String),
    yara: (Status, String),
    clamav: (Status, String),
    falco: (Status, Vec<String>),
}

fn outcome<T>(status: &Status, payload: T, msg: &str) -> ScanOutcome<T> {
    match status {
        Status::Success => ScanOutcome::Success(payload),
        Status::Warning => ScanOutcome::Warning(msg.to_owned()),
        Status::Error => ScanOutcome::Error(msg.to_owned()),
    }
}

fuzz_target!(|input: Input| {
    let vuln = outcome(
        &input.trivy.0,
        VulnerabilityReport::from_json(&input.trivy.1).unwrap_or_default(),
        &input.trivy.1,
    );
    let sig = outcome(
        &input.yara.0,
        SignatureMatches::from_output(&input.yara.1),
        &input.yara.1,
    );
    let av = outcome(
        &input.clamav.0,
        AntivirusReport::from_output(&input.clamav.1),
        &input.clamav.1,
    );
    let rt = outcome(
        &input.falco.0,
        RuntimeAlerts {
            sandbox: None,
            alerts: input.falco.1.clone(),
        },
        "falco",
    );

    let risk = aggregate(&vuln, &sig, &av, &rt);
    assert!(risk.score <= 100);
    assert_eq!(risk.level, RiskLevel::from_score(risk.score));
    assert_eq!(risk.findings.len(), 4);
});

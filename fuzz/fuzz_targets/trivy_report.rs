#![no_main]

use imagewarden_scan_engine::{
    AntivirusReport, RuntimeAlerts, ScanOutcome, SignatureMatches, VulnerabilityReport, aggregate,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(raw) = std::str::from_utf8(data) {
        if let Ok(report) = VulnerabilityReport::from_json(raw) {
            let counts = report.severity_counts();
            assert!(counts.critical + counts.high + counts.medium + counts.low <= counts.total);

            let risk = aggregate(
                &ScanOutcome::Success(report),
                &ScanOutcome::Success(SignatureMatches::default()),
                &ScanOutcome::Success(AntivirusReport::default()),
                &ScanOutcome::Success(RuntimeAlerts::default()),
            );
            assert!(risk.score <= 100);
        }
    }
});

//! 위험도 집계 벤치마크
//!
//! 취약점 보고서 크기에 따른 집계 비용과 Trivy JSON 파싱 비용을 측정합니다.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use imagewarden_scan_engine::outcome::{TargetResult, VulnerabilityEntry};
use imagewarden_scan_engine::{
    AntivirusReport, RuntimeAlerts, ScanOutcome, SignatureMatches, VulnerabilityReport, aggregate,
};

const SEVERITIES: [&str; 5] = ["CRITICAL", "HIGH", "MEDIUM", "LOW", "UNKNOWN"];

fn create_report(count: usize) -> VulnerabilityReport {
    let entries = (0..count)
        .map(|i| VulnerabilityEntry {
            vulnerability_id: format!("CVE-2024-{i:05}"),
            pkg_name: format!("pkg-{}", i % 50),
            installed_version: "1.0.0".to_owned(),
            fixed_version: Some("1.0.1".to_owned()),
            severity: SEVERITIES[i % SEVERITIES.len()].to_owned(),
        })
        .collect();
    VulnerabilityReport {
        artifact_name: Some("bench:latest".to_owned()),
        results: vec![TargetResult {
            target: "bench:latest (debian 12)".to_owned(),
            vulnerabilities: Some(entries),
        }],
    }
}

fn create_alerts(count: usize) -> RuntimeAlerts {
    RuntimeAlerts {
        sandbox: Some("imagewarden-sandbox-1".to_owned()),
        alerts: (0..count)
            .map(|i| format!("12:00:00.{i:03}: Warning Shell spawned in a container"))
            .collect(),
    }
}

fn bench_aggregate_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate_scaling");
    let sig = ScanOutcome::Success(SignatureMatches::default());
    let av = ScanOutcome::Success(AntivirusReport::from_output(""));
    let rt = ScanOutcome::Success(create_alerts(20));

    for count in &[0usize, 10, 100, 1_000, 10_000] {
        let vuln = ScanOutcome::Success(create_report(*count));
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &vuln, |b, vuln| {
            b.iter(|| aggregate(black_box(vuln), black_box(&sig), black_box(&av), black_box(&rt)));
        });
    }

    group.finish();
}

fn bench_aggregate_degraded(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate_degraded");
    let vuln: ScanOutcome<VulnerabilityReport> =
        ScanOutcome::Error("Trivy scan timed out".to_owned());
    let sig: ScanOutcome<SignatureMatches> =
        ScanOutcome::Error("staging failed: disk full".to_owned());
    let av: ScanOutcome<AntivirusReport> =
        ScanOutcome::Warning("ClamAV disabled by configuration".to_owned());
    let rt: ScanOutcome<RuntimeAlerts> =
        ScanOutcome::Warning("Falco not installed or logs not available".to_owned());

    group.bench_function("all_degraded", |b| {
        b.iter(|| aggregate(black_box(&vuln), black_box(&sig), black_box(&av), black_box(&rt)));
    });

    group.finish();
}

fn bench_trivy_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("trivy_parse");

    for count in &[10usize, 1_000] {
        let json = serde_json::to_string(&create_report(*count)).expect("serialize report");
        group.throughput(Throughput::Bytes(json.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &json, |b, json| {
            b.iter(|| VulnerabilityReport::from_json(black_box(json)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_aggregate_scaling,
    bench_aggregate_degraded,
    bench_trivy_parse
);
criterion_main!(benches);

#![no_main]

use imagewarden_core::config::WardenConfig;
use imagewarden_scan_engine::ScanEngineConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        if let Ok(config) = WardenConfig::parse(content) {
            if config.validate().is_ok() {
                // 코어 검증을 통과한 설정은 엔진 검증도 통과해야 함
                assert!(ScanEngineConfig::from_core(&config).validate().is_ok());
            }
        }
    }
});

#![no_main]

use std::path::Path;

use covreport::{ConfigLayer, PipelineConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Anything that parses must also resolve without panicking
        if let Ok(layer) = ConfigLayer::from_json_str(s) {
            if let Ok(config) = PipelineConfig::from_layer(Path::new("/fuzz/src"), layer) {
                let _ = config.paths();
            }
        }
    }
});

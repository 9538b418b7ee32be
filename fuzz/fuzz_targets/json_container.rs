#![no_main]

use libfuzzer_sys::fuzz_target;
use psub_core::HistogramContainer;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(container) = HistogramContainer::from_json_str(text) {
        let _ = container.to_json_string();
    }
});

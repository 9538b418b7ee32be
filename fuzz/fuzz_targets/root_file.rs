#![no_main]

use libfuzzer_sys::fuzz_target;
use psub_root::RootFile;

fuzz_target!(|data: &[u8]| {
    let Ok(file) = RootFile::from_bytes(data.to_vec(), "fuzz.root".into()) else {
        return;
    };
    let Ok(keys) = file.list_keys() else {
        return;
    };
    for key in keys {
        let _ = file.get_histogram(&key.name);
    }
});

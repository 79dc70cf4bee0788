#![no_main]

use cades_batch::infrastructure::providers::verify_container;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let split = data.first().map(|&b| b as usize).unwrap_or(0).min(data.len());
    let (container, document) = data.split_at(split);
    let _ = verify_container(container, document);
});

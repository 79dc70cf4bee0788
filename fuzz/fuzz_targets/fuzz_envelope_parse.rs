#![no_main]

use cades_batch::infrastructure::providers::{MAX_ENVELOPE_SIZE, SignatureEnvelope, SignerRecord};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(envelope) = SignatureEnvelope::from_bytes(data) {
        let _ = envelope.certificate_der();
        for signer in &envelope.signers {
            let _ = signer.digest_bytes();
            let _ = signer.signature_bytes();
        }
        if let Ok(bytes) = envelope.to_bytes()
            && bytes.len() <= MAX_ENVELOPE_SIZE
        {
            assert!(SignatureEnvelope::from_bytes(&bytes).is_ok());
        }
    }
    let _ = SignerRecord::from_bytes(data);
});

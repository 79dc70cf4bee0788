//! Shared test helpers: an instrumented fake provider and fixture paths

#![allow(dead_code)]

use cades_batch::domain::entities::{HashAlgorithm, KeyType, SignAlgorithm};
use cades_batch::domain::repositories::{CertificateInfo, ProviderError, SigningProvider, codes};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

pub const FAKE_PASSWORD: &str = "secret";
pub const FAKE_CERTIFICATE: &[u8] = b"FAKE-CERTIFICATE";
pub const PANIC_CONTENT: &[u8] = b"panic";

pub const FIXTURE_PASSWORD: &str = "test-password";

pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

pub fn write_file(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Call counters of a [`FakeProvider`]
#[derive(Debug, Default)]
pub struct Calls {
    pub load_key: AtomicUsize,
    pub owning_certificate: AtomicUsize,
    pub hash: AtomicUsize,
    pub create_signer: AtomicUsize,
    pub validation_data: AtomicUsize,
    pub empty_container: AtomicUsize,
    pub append_signer: AtomicUsize,
}

/// Provider double that records how it is used
#[derive(Debug)]
pub struct FakeProvider {
    key_type: KeyType,
    thread_safe: bool,
    remaining_failures: AtomicU32,
    always_fail: bool,
    validation_fails: bool,
    append_fails: bool,
    supported: Option<SignAlgorithm>,
    slow_document: Option<(Vec<u8>, Duration)>,
    delay: Duration,
    pub calls: Calls,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self {
            key_type: KeyType::Rsa,
            thread_safe: true,
            remaining_failures: AtomicU32::new(0),
            always_fail: false,
            validation_fails: false,
            append_fails: false,
            supported: None,
            slow_document: None,
            delay: Duration::ZERO,
            calls: Calls::default(),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_key_type(mut self, key_type: KeyType) -> Self {
        self.key_type = key_type;
        self
    }

    /// `create_signer` fails for the first `n` calls
    pub fn failing_first(self, n: u32) -> Self {
        self.remaining_failures.store(n, Ordering::SeqCst);
        self
    }

    pub fn always_failing(mut self) -> Self {
        self.always_fail = true;
        self
    }

    pub fn without_validation_data(mut self) -> Self {
        self.validation_fails = true;
        self
    }

    /// `append_signer_to_container` fails after the empty container is written
    pub fn failing_append(mut self) -> Self {
        self.append_fails = true;
        self
    }

    /// Reports `algorithm` as the only one it can sign with
    pub fn supporting_only(mut self, algorithm: SignAlgorithm) -> Self {
        self.supported = Some(algorithm);
        self
    }

    pub fn not_thread_safe(mut self) -> Self {
        self.thread_safe = false;
        self
    }

    /// Hashing a document with exactly `content` takes `delay`
    pub fn slow_on(mut self, content: &[u8], delay: Duration) -> Self {
        self.slow_document = Some((content.to_vec(), delay));
        self
    }

    /// Time spent inside each `create_signer` call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn fail_now(&self) -> bool {
        if self.always_fail {
            return true;
        }
        self.remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl SigningProvider for FakeProvider {
    type Key = String;

    fn is_thread_safe(&self) -> bool {
        self.thread_safe
    }

    fn supports_algorithm(&self, algorithm: SignAlgorithm) -> bool {
        self.supported.is_none_or(|only| only == algorithm)
    }

    fn load_private_key(&self, key_bytes: &[u8], password: &str) -> Result<String, ProviderError> {
        self.calls.load_key.fetch_add(1, Ordering::SeqCst);
        if password != FAKE_PASSWORD {
            return Err(ProviderError::new(codes::INVALID_KEY, "wrong password"));
        }
        Ok(String::from_utf8_lossy(key_bytes).into_owned())
    }

    fn get_owning_certificate(&self, _key: &String) -> Result<Vec<u8>, ProviderError> {
        self.calls.owning_certificate.fetch_add(1, Ordering::SeqCst);
        Ok(FAKE_CERTIFICATE.to_vec())
    }

    fn parse_certificate(&self, _certificate: &[u8]) -> Result<CertificateInfo, ProviderError> {
        Ok(CertificateInfo {
            public_key_type: self.key_type,
            subject: "CN=Fake Signer".to_string(),
            serial: "01".to_string(),
        })
    }

    fn hash(&self, _algorithm: HashAlgorithm, data: &[u8]) -> Result<Vec<u8>, ProviderError> {
        self.calls.hash.fetch_add(1, Ordering::SeqCst);
        if data == PANIC_CONTENT {
            panic!("fake provider exploded");
        }
        if let Some((content, delay)) = &self.slow_document
            && data == content.as_slice()
        {
            thread::sleep(*delay);
        }
        Ok(vec![data.iter().fold(0u8, |acc, b| acc ^ b), data.len() as u8, 0xAA])
    }

    fn create_signer(
        &self,
        key: &String,
        algorithm: SignAlgorithm,
        digest: &[u8],
        include_timestamp: bool,
    ) -> Result<Vec<u8>, ProviderError> {
        self.calls.create_signer.fetch_add(1, Ordering::SeqCst);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_now() {
            return Err(ProviderError::new(codes::SIGNING_FAILED, "simulated signer failure"));
        }

        Ok(format!("signer:{}:{}:{:?}:{}", key, algorithm, digest, include_timestamp).into_bytes())
    }

    fn append_validation_data(
        &self,
        signer: &[u8],
        _certificate: &[u8],
    ) -> Result<Vec<u8>, ProviderError> {
        self.calls.validation_data.fetch_add(1, Ordering::SeqCst);
        if self.validation_fails {
            return Err(ProviderError::new(codes::NO_TRUST_SERVICE, "no trust service"));
        }
        let mut augmented = signer.to_vec();
        augmented.extend_from_slice(b"+validation");
        Ok(augmented)
    }

    fn create_empty_signature_container(
        &self,
        _algorithm: SignAlgorithm,
        _certificate: &[u8],
        path: &Path,
    ) -> Result<(), ProviderError> {
        self.calls.empty_container.fetch_add(1, Ordering::SeqCst);
        fs::write(path, b"CONTAINER\n").map_err(|e| ProviderError::io(path, &e))
    }

    fn append_signer_to_container(
        &self,
        _algorithm: SignAlgorithm,
        signer: &[u8],
        _certificate: &[u8],
        path: &Path,
    ) -> Result<(), ProviderError> {
        self.calls.append_signer.fetch_add(1, Ordering::SeqCst);
        if self.append_fails {
            return Err(ProviderError::new(codes::INVALID_CONTAINER, "simulated append failure"));
        }
        let mut file = OpenOptions::new()
            .append(true)
            .open(path)
            .map_err(|e| ProviderError::io(path, &e))?;
        file.write_all(signer).map_err(|e| ProviderError::io(path, &e))
    }
}

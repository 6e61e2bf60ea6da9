//! Checksum and detached signature verification of downloaded artifacts.
//!
//! The digest is computed while the artifact streams to disk (see
//! [`DigestWriter`]) and compared against the published checksum file. The
//! signature is only looked at once the content is known to match that
//! digest, and is checked against a read-only mapping of the staged file.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use obsimg_schema::{DownloadTarget, ResolvedArtifact};
use sha2::{Digest, Sha256, Sha512};
use memmap2::Mmap;
use tracing::debug;

use crate::{Fetch, ResolveError};

/// Digest algorithm named by a checksum file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumAlgorithm {
    Sha256,
    Sha512,
}

impl ChecksumAlgorithm {
    /// Algorithm implied by `extension` (`sha256`, `sha512`).
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Config`] for any other extension.
    pub fn from_extension(extension: &str) -> Result<Self, ResolveError> {
        match extension.to_ascii_lowercase().as_str() {
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            other => Err(ResolveError::Config(format!(
                "unsupported checksum extension '{other}'"
            ))),
        }
    }

    /// Lowercase hex digest of `bytes`.
    pub fn digest_hex(self, bytes: &[u8]) -> String {
        match self {
            Self::Sha256 => hex::encode(Sha256::digest(bytes)),
            Self::Sha512 => hex::encode(Sha512::digest(bytes)),
        }
    }

    /// Length of the hex digest.
    pub fn hex_len(self) -> usize {
        match self {
            Self::Sha256 => 64,
            Self::Sha512 => 128,
        }
    }
}

enum Hasher {
    Sha256(Sha256),
    Sha512(Sha512),
}

impl Hasher {
    fn update(&mut self, bytes: &[u8]) {
        match self {
            Self::Sha256(h) => h.update(bytes),
            Self::Sha512(h) => h.update(bytes),
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            Self::Sha256(h) => hex::encode(h.finalize()),
            Self::Sha512(h) => hex::encode(h.finalize()),
        }
    }
}

/// Writer that hashes everything passed through to `inner`.
///
/// With no algorithm it is a plain pass-through.
pub struct DigestWriter<W> {
    inner: W,
    hasher: Option<Hasher>,
}

impl<W: Write> DigestWriter<W> {
    pub fn new(inner: W, algorithm: Option<ChecksumAlgorithm>) -> Self {
        let hasher = algorithm.map(|algorithm| match algorithm {
            ChecksumAlgorithm::Sha256 => Hasher::Sha256(Sha256::new()),
            ChecksumAlgorithm::Sha512 => Hasher::Sha512(Sha512::new()),
        });
        Self { inner, hasher }
    }

    /// Flush `inner` and return the lowercase hex digest, if hashing.
    ///
    /// # Errors
    ///
    /// Any error from flushing `inner`.
    pub fn finish(mut self) -> io::Result<Option<String>> {
        self.inner.flush()?;
        Ok(self.hasher.map(Hasher::finalize_hex))
    }
}

impl<W: Write> Write for DigestWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        if let Some(hasher) = &mut self.hasher {
            hasher.update(&buf[..n]);
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// What a successful verification checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    /// Raw checksum file, kept so it can be written next to the artifact.
    pub checksum_file: Vec<u8>,
    /// Digest of the artifact content.
    pub digest: String,
    /// Whether a detached signature was verified.
    pub signed: bool,
}

/// Verifies artifact bytes against the material published next to them.
pub struct IntegrityVerifier<'a, F: Fetch + ?Sized> {
    fetcher: &'a F,
    public_key: Option<&'a str>,
}

impl<'a, F: Fetch + ?Sized> IntegrityVerifier<'a, F> {
    /// `public_key` is the base64 ed25519 key used for detached signatures.
    pub fn new(fetcher: &'a F, public_key: Option<&'a str>) -> Self {
        Self {
            fetcher,
            public_key,
        }
    }

    /// Verify the downloaded `content` of `artifact`, whose digest under
    /// the target's checksum algorithm is `digest`.
    ///
    /// # Errors
    ///
    /// [`ResolveError::ChecksumMismatch`] or
    /// [`ResolveError::SignatureVerification`] on a failed check,
    /// [`ResolveError::Network`] if the verification material cannot be
    /// fetched, and [`ResolveError::Config`] for an unsupported checksum
    /// extension.
    pub fn verify(
        &self,
        content: &Path,
        digest: &str,
        artifact: &ResolvedArtifact,
        target: &DownloadTarget,
    ) -> Result<Verification, ResolveError> {
        let algorithm = ChecksumAlgorithm::from_extension(&target.checksum_extension)?;
        let checksum_url = format!("{}.{}", artifact.url, target.checksum_extension);
        let checksum_file = self.fetcher.get(&checksum_url)?;

        self.check_digest(digest, &checksum_file, algorithm, &artifact.filename)?;
        debug!("Checksum OK for {}: {digest}", artifact.filename);

        let signed = match &target.signature_extension {
            Some(extension) => {
                self.check_signature(content, artifact, extension)?;
                debug!("Signature OK for {}", artifact.filename);
                true
            }
            None => false,
        };

        Ok(Verification {
            checksum_file,
            digest: digest.to_string(),
            signed,
        })
    }

    fn check_digest(
        &self,
        actual: &str,
        checksum_file: &[u8],
        algorithm: ChecksumAlgorithm,
        filename: &str,
    ) -> Result<(), ResolveError> {
        let text = String::from_utf8_lossy(checksum_file);
        let expected = expected_digest(&text, algorithm.hex_len()).ok_or_else(|| {
            ResolveError::parse(
                format!("checksum file for {filename}"),
                format!("no {}-character hex digest found", algorithm.hex_len()),
            )
        })?;

        if !actual.eq_ignore_ascii_case(expected) {
            return Err(ResolveError::ChecksumMismatch {
                filename: filename.to_string(),
                expected: expected.to_lowercase(),
                actual: actual.to_string(),
            });
        }
        Ok(())
    }

    fn check_signature(
        &self,
        content: &Path,
        artifact: &ResolvedArtifact,
        extension: &str,
    ) -> Result<(), ResolveError> {
        let fail = |reason: String| ResolveError::SignatureVerification {
            filename: artifact.filename.clone(),
            reason,
        };

        let key_b64 = self
            .public_key
            .ok_or_else(|| fail("no public key configured".to_string()))?;
        let key_bytes = BASE64
            .decode(key_b64.trim())
            .map_err(|e| fail(format!("invalid public key: {e}")))?;
        let key_bytes: &[u8; 32] = key_bytes
            .as_slice()
            .try_into()
            .map_err(|_| fail("invalid public key length".to_string()))?;
        let key = VerifyingKey::from_bytes(key_bytes)
            .map_err(|e| fail(format!("invalid public key: {e}")))?;

        let sig_url = format!("{}.{extension}", artifact.url);
        let sig_b64 = self.fetcher.get_text(&sig_url)?;
        let sig_bytes = BASE64
            .decode(sig_b64.trim())
            .map_err(|e| fail(format!("invalid base64 signature: {e}")))?;
        let sig_bytes: &[u8; 64] = sig_bytes
            .as_slice()
            .try_into()
            .map_err(|_| fail("invalid signature length".to_string()))?;
        let signature = Signature::from_bytes(sig_bytes);

        let file = File::open(content)?;
        if file.metadata()?.len() == 0 {
            return key
                .verify(&[], &signature)
                .map_err(|_| fail("signature does not match".to_string()));
        }
        // SAFETY: the staged file is private to this run and is not written
        // to while mapped.
        let mapped = unsafe { Mmap::map(&file)? };
        key.verify(&mapped, &signature)
            .map_err(|_| fail("signature does not match".to_string()))
    }
}

/// First whitespace-separated token of exactly `len` hex characters.
fn expected_digest(text: &str, len: usize) -> Option<&str> {
    text.split_whitespace()
        .find(|token| token.len() == len && token.chars().all(|c| c.is_ascii_hexdigit()))
}

//! Artifact fingerprints using BLAKE3
//!
//! Every written artifact gets a truncated BLAKE3 fingerprint in the run
//! summary. Aggregation is deterministic for a given record set, so two
//! runs over the same store must produce identical fingerprints; comparing
//! them is the cheap way to verify that.

/// Fingerprint of artifact bytes: first 128 bits of BLAKE3, hex-encoded
pub fn artifact_fingerprint(bytes: &[u8]) -> String {
    let hash = blake3::hash(bytes);
    hex::encode(&hash.as_bytes()[..16])
}

use std::fmt;

/// Digest of a datastream's canonical content bytes.
///
/// Two byte strings with the same digest are treated as the same content.
/// The cache keeps digests of baselines instead of holding a second copy of
/// every payload it has already loaded.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    /// Digest raw content bytes.
    pub fn of(data: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"dsync-content-v1:");
        hasher.update(data);
        Self(*hasher.finalize().as_bytes())
    }

    /// Returns `true` if this digest was computed from `data`.
    pub fn matches(&self, data: &[u8]) -> bool {
        *self == Self::of(data)
    }

    /// First 8 hex characters, used in log fields.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({})", self.short_hex())
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_deterministic() {
        assert_eq!(ContentDigest::of(b"<xml/>"), ContentDigest::of(b"<xml/>"));
    }

    #[test]
    fn different_content_produces_different_digests() {
        assert_ne!(ContentDigest::of(b"<a/>"), ContentDigest::of(b"<b/>"));
    }

    #[test]
    fn matches_only_its_own_content() {
        let digest = ContentDigest::of(b"");
        assert!(digest.matches(b""));
        assert!(!digest.matches(b" "));
    }

    #[test]
    fn hex_forms() {
        let digest = ContentDigest::of(b"x");
        let full = digest.to_string();
        assert_eq!(full.len(), 64);
        assert!(full.starts_with(&digest.short_hex()));
        assert_eq!(format!("{digest:?}"), format!("ContentDigest({})", digest.short_hex()));
    }
}

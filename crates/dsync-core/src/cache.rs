use dsync_types::ContentDigest;

use crate::representation::Representation;
use crate::state::CacheState;

/// The structured and byte caches of one datastream.
///
/// Only [`Datastream`](crate::Datastream) moves the cache between states.
/// While dirty, the structured value is authoritative and the cached bytes
/// are merely the last rendering.
#[derive(Debug)]
pub struct ContentCache<R> {
    state: CacheState,
    structured: Option<R>,
    bytes: Option<Vec<u8>>,
    baseline: Option<ContentDigest>,
}

impl<R> ContentCache<R> {
    pub fn new() -> Self {
        Self {
            state: CacheState::Unloaded,
            structured: None,
            bytes: None,
            baseline: None,
        }
    }

    pub fn state(&self) -> CacheState {
        self.state
    }

    pub fn is_materialized(&self) -> bool {
        self.structured.is_some()
    }

    pub fn structured(&self) -> Option<&R> {
        self.structured.as_ref()
    }

    pub(crate) fn structured_mut(&mut self) -> Option<&mut R> {
        self.structured.as_mut()
    }

    /// Last known serialized or raw bytes.
    pub fn bytes(&self) -> Option<&[u8]> {
        self.bytes.as_deref()
    }

    /// Digest of the bytes the value was loaded from or last persisted as.
    pub fn baseline(&self) -> Option<&ContentDigest> {
        self.baseline.as_ref()
    }

    /// Store a freshly loaded value. `canonical` becomes the baseline.
    pub(crate) fn load(&mut self, structured: R, canonical: Option<Vec<u8>>) {
        self.baseline = canonical.as_deref().map(ContentDigest::of);
        self.bytes = canonical;
        self.structured = Some(structured);
        self.state = CacheState::LoadedClean;
    }

    pub(crate) fn set_bytes(&mut self, bytes: Vec<u8>) {
        self.bytes = Some(bytes);
    }

    /// No-op unless a value is loaded.
    pub(crate) fn mark_dirty(&mut self) {
        if self.is_materialized() {
            self.state = CacheState::LoadedDirty;
        }
    }

    pub(crate) fn mark_clean(&mut self) {
        if self.is_materialized() {
            self.state = CacheState::LoadedClean;
        }
    }

    /// `bytes` were stored; they become the new baseline.
    pub(crate) fn mark_persisted(&mut self, bytes: Vec<u8>) {
        self.baseline = Some(ContentDigest::of(&bytes));
        self.bytes = Some(bytes);
        self.mark_clean();
    }

    /// Drop everything and return to [`CacheState::Unloaded`].
    pub(crate) fn reset(&mut self) {
        self.structured = None;
        self.bytes = None;
        self.baseline = None;
        self.state = CacheState::Unloaded;
    }
}

impl<R: Representation> ContentCache<R> {
    /// Swap in a new value through [`Representation::replace`]. The
    /// baseline is kept.
    pub(crate) fn replace(&mut self, structured: R, bytes: Option<Vec<u8>>, dirty: bool) {
        match &mut self.structured {
            Some(current) => current.replace(structured),
            None => self.structured = Some(structured),
        }
        if bytes.is_some() {
            self.bytes = bytes;
        }
        if dirty {
            self.state = CacheState::LoadedDirty;
        } else if self.state == CacheState::Unloaded {
            self.state = CacheState::LoadedClean;
        }
    }
}

impl<R> Default for ContentCache<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use dsync_xml::XmlDocument;

    use super::*;

    #[test]
    fn starts_unloaded() {
        let cache: ContentCache<String> = ContentCache::new();
        assert_eq!(cache.state(), CacheState::Unloaded);
        assert!(!cache.is_materialized());
        assert!(cache.bytes().is_none());
        assert!(cache.baseline().is_none());
    }

    #[test]
    fn load_sets_baseline() {
        let mut cache = ContentCache::new();
        cache.load("v".to_string(), Some(b"v".to_vec()));
        assert_eq!(cache.state(), CacheState::LoadedClean);
        assert!(cache.baseline().unwrap().matches(b"v"));
        assert_eq!(cache.bytes(), Some(&b"v"[..]));
    }

    #[test]
    fn replace_keeps_baseline() {
        let mut cache = ContentCache::new();
        cache.load(XmlDocument::parse(b"<a/>").unwrap(), Some(b"<a/>".to_vec()));
        cache.replace(XmlDocument::parse(b"<b/>").unwrap(), Some(b"<b/>".to_vec()), true);
        assert_eq!(cache.state(), CacheState::LoadedDirty);
        assert!(cache.baseline().unwrap().matches(b"<a/>"));
        assert_eq!(
            cache.structured().unwrap().to_xml_string().unwrap(),
            "<b/>"
        );
    }

    #[test]
    fn replace_into_an_empty_cache_loads_clean() {
        let mut cache = ContentCache::new();
        cache.replace(XmlDocument::parse(b"<a/>").unwrap(), None, false);
        assert_eq!(cache.state(), CacheState::LoadedClean);
        assert!(cache.baseline().is_none());
        assert!(cache.bytes().is_none());
    }

    #[test]
    fn dirty_transitions_need_a_value() {
        let mut cache: ContentCache<String> = ContentCache::new();
        cache.mark_dirty();
        assert_eq!(cache.state(), CacheState::Unloaded);
        cache.load("a".to_string(), None);
        cache.mark_dirty();
        assert_eq!(cache.state(), CacheState::LoadedDirty);
        cache.mark_clean();
        assert_eq!(cache.state(), CacheState::LoadedClean);
    }

    #[test]
    fn persisted_bytes_become_baseline() {
        let mut cache = ContentCache::new();
        cache.load("a".to_string(), Some(b"a".to_vec()));
        cache.mark_dirty();
        cache.mark_persisted(b"b".to_vec());
        assert_eq!(cache.state(), CacheState::LoadedClean);
        assert!(cache.baseline().unwrap().matches(b"b"));
    }

    #[test]
    fn reset_drops_everything() {
        let mut cache = ContentCache::new();
        cache.load("a".to_string(), Some(b"a".to_vec()));
        cache.mark_dirty();
        cache.reset();
        assert_eq!(cache.state(), CacheState::Unloaded);
        assert!(!cache.is_materialized());
        assert!(cache.bytes().is_none());
        assert!(cache.baseline().is_none());
    }
}

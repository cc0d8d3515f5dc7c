use std::fmt;
use std::sync::Arc;

use dsync_types::ResourceUri;
use sophia_iri::resolve::BaseIri;

use crate::error::{DatastreamError, DatastreamResult};

type ResolveFn = dyn Fn(&ResourceUri) -> Option<String> + Send + Sync;

/// Derives a graph's primary subject from a datastream address.
///
/// The default strips the last path segment: a datastream at
/// `info:fedora/test:1/descMetadata` describes `info:fedora/test:1`.
#[derive(Clone)]
pub struct SubjectResolver {
    resolve: Arc<ResolveFn>,
}

impl SubjectResolver {
    pub fn new<F>(resolve: F) -> Self
    where
        F: Fn(&ResourceUri) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            resolve: Arc::new(resolve),
        }
    }

    /// The address with its last path segment removed.
    pub fn parent() -> Self {
        Self::new(|uri| uri.parent().map(|p| p.as_str().to_string()))
    }

    /// The address itself.
    pub fn identity() -> Self {
        Self::new(|uri| Some(uri.as_str().to_string()))
    }

    /// Always `iri`, whatever the address.
    pub fn fixed(iri: impl Into<String>) -> Self {
        let iri = iri.into();
        Self::new(move |_| Some(iri.clone()))
    }

    /// Resolve whatever this resolver yields against `base`, so relative
    /// addresses give absolute subjects. Results that cannot be resolved
    /// are declined.
    pub fn against_base(self, base: &str) -> DatastreamResult<Self> {
        let base = BaseIri::new(base.to_string())
            .map_err(|e| DatastreamError::Config(format!("invalid base IRI {base:?}: {e}")))?;
        let inner = self.resolve;
        Ok(Self::new(move |uri| {
            let derived = inner(uri)?;
            base.resolve(derived.as_str())
                .ok()
                .map(|iri| iri.as_str().to_string())
        }))
    }

    /// `None` without an address, or if the resolver declines.
    pub fn resolve(&self, uri: Option<&ResourceUri>) -> Option<String> {
        uri.and_then(|uri| (self.resolve)(uri))
    }
}

impl Default for SubjectResolver {
    fn default() -> Self {
        Self::parent()
    }
}

impl fmt::Debug for SubjectResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SubjectResolver(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(s: &str) -> ResourceUri {
        ResourceUri::new(s).unwrap()
    }

    #[test]
    fn default_strips_last_segment() {
        let r = SubjectResolver::default();
        assert_eq!(r.resolve(Some(&uri("items/42"))).as_deref(), Some("items"));
        assert_eq!(
            r.resolve(Some(&uri("info:fedora/test:1/descMetadata"))).as_deref(),
            Some("info:fedora/test:1")
        );
    }

    #[test]
    fn no_address_no_subject() {
        assert!(SubjectResolver::default().resolve(None).is_none());
        assert!(SubjectResolver::fixed("urn:x").resolve(None).is_none());
    }

    #[test]
    fn single_segment_has_no_parent() {
        assert!(SubjectResolver::default().resolve(Some(&uri("lonely"))).is_none());
    }

    #[test]
    fn base_makes_relative_subjects_absolute() {
        let r = SubjectResolver::parent()
            .against_base("http://example.org/repo/")
            .unwrap();
        assert_eq!(
            r.resolve(Some(&uri("items/42"))).as_deref(),
            Some("http://example.org/repo/items")
        );
        // Absolute results pass through.
        assert_eq!(
            r.resolve(Some(&uri("info:fedora/test:1/descMetadata"))).as_deref(),
            Some("info:fedora/test:1")
        );
    }

    #[test]
    fn relative_base_is_rejected() {
        assert!(matches!(
            SubjectResolver::parent().against_base("repo/"),
            Err(DatastreamError::Config(_))
        ));
    }

    #[test]
    fn custom_resolvers() {
        assert_eq!(
            SubjectResolver::identity().resolve(Some(&uri("a/b"))).as_deref(),
            Some("a/b")
        );
        assert_eq!(
            SubjectResolver::fixed("urn:x:1").resolve(Some(&uri("a/b"))).as_deref(),
            Some("urn:x:1")
        );
    }
}

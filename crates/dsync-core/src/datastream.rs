use std::any::Any;
use std::fmt;
use std::sync::Arc;

use dsync_source::ByteSource;
use dsync_types::{DatastreamId, ResourceUri};
use tracing::{debug, warn};

use crate::cache::ContentCache;
use crate::config::DatastreamProfile;
use crate::error::{DatastreamError, DatastreamResult};
use crate::representation::{Assignment, ChangePolicy, LoadContext, Representation};
use crate::state::CacheState;

/// One named content unit of a repository object.
///
/// Content is reachable both as bytes ([`content`](Self::content)) and as a
/// structured value ([`structured`](Self::structured)). Nothing is fetched
/// until one of them is asked for, and the fetch happens at most once per
/// load.
pub struct Datastream<R: Representation> {
    id: DatastreamId,
    uri: Option<ResourceUri>,
    source: Arc<dyn ByteSource>,
    profile: Arc<DatastreamProfile<R>>,
    pub(crate) cache: ContentCache<R>,
    frozen: bool,
}

impl<R: Representation> Datastream<R> {
    pub fn new(
        id: DatastreamId,
        source: Arc<dyn ByteSource>,
        profile: Arc<DatastreamProfile<R>>,
    ) -> Self {
        Self {
            id,
            uri: None,
            source,
            profile,
            cache: ContentCache::new(),
            frozen: false,
        }
    }

    pub fn with_uri(mut self, uri: ResourceUri) -> Self {
        self.uri = Some(uri);
        self
    }

    pub fn id(&self) -> &DatastreamId {
        &self.id
    }

    pub fn uri(&self) -> Option<&ResourceUri> {
        self.uri.as_ref()
    }

    pub fn profile(&self) -> &DatastreamProfile<R> {
        &self.profile
    }

    pub fn state(&self) -> CacheState {
        self.cache.state()
    }

    pub fn cache(&self) -> &ContentCache<R> {
        &self.cache
    }

    pub fn is_new_record(&self) -> bool {
        self.source.is_new_record(&self.id)
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Reject every further mutation. Reads keep working.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Datastream content is always descriptive metadata.
    pub fn is_metadata(&self) -> bool {
        true
    }

    pub fn mime_type(&self) -> String {
        self.profile.mime_type()
    }

    pub(crate) fn ensure_mutable(&self) -> DatastreamResult<()> {
        if self.frozen {
            return Err(DatastreamError::FrozenStateViolation {
                dsid: self.id.clone(),
            });
        }
        Ok(())
    }

    fn context(&self) -> LoadContext<'_, R::Options> {
        LoadContext::new(&self.id, self.uri.as_ref(), &self.profile.options)
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Build the structured value if it is not cached yet.
    pub(crate) fn materialize(&mut self) -> DatastreamResult<()> {
        if self.cache.is_materialized() {
            return Ok(());
        }
        let ctx = self.context();
        let (value, canonical) = if self.source.is_new_record(&self.id) {
            debug!(dsid = %self.id, "materializing template for new record");
            (self.profile.decorate(R::template(&ctx)?), None)
        } else {
            let fetched = self.source.fetch(&self.id)?;
            debug!(
                dsid = %self.id,
                bytes = fetched.as_ref().map_or(0, Vec::len),
                "fetched datastream content"
            );
            let mut value = R::parse(fetched.as_deref().unwrap_or_default(), &ctx)?;
            value.resolve_identity(&ctx);
            let value = self.profile.decorate(value);
            let canonical = value.serialize(&ctx)?;
            (value, Some(canonical))
        };
        self.cache.load(value, canonical);
        if let Some(baseline) = self.cache.baseline() {
            debug!(dsid = %self.id, baseline = %baseline.short_hex(), "recorded load baseline");
        }
        Ok(())
    }

    /// Canonical bytes of the current content, or `None` when there are no
    /// prior bytes to compare against.
    fn current_canonical(&mut self) -> DatastreamResult<Option<Vec<u8>>> {
        let reserialize = self.cache.state() == CacheState::LoadedDirty
            || (R::CHANGE_POLICY == ChangePolicy::Reserialize && self.cache.is_materialized());
        if reserialize {
            return self.render().map(Some);
        }
        if let Some(bytes) = self.cache.bytes() {
            return Ok(Some(bytes.to_vec()));
        }
        if self.cache.is_materialized() || self.is_new_record() {
            return Ok(None);
        }
        self.materialize()?;
        Ok(self.cache.bytes().map(<[u8]>::to_vec))
    }

    /// Serialize the cached value, settling its identity first.
    fn render(&mut self) -> DatastreamResult<Vec<u8>> {
        let ctx = LoadContext::new(&self.id, self.uri.as_ref(), &self.profile.options);
        match self.cache.structured_mut() {
            Some(value) => {
                if value.resolve_identity(&ctx) {
                    debug!(dsid = %self.id, "resolved identity before serializing");
                }
                value.serialize(&ctx)
            }
            None => Ok(Vec::new()),
        }
    }

    // -----------------------------------------------------------------------
    // Byte accessors
    // -----------------------------------------------------------------------

    /// Content bytes.
    ///
    /// Re-serializes when the structured value is dirty, when a new record
    /// auto-creates its template, or when the variant always re-serializes.
    /// Otherwise returns the last known bytes, fetching them once for an
    /// existing record. A new record without content is empty.
    pub fn content(&mut self) -> DatastreamResult<Vec<u8>> {
        let autocreating = self.profile.autocreate && self.is_new_record();
        let reserialize = self.cache.state() == CacheState::LoadedDirty
            || autocreating
            || (R::CHANGE_POLICY == ChangePolicy::Reserialize && self.cache.is_materialized());
        if reserialize {
            self.materialize()?;
            let bytes = self.render()?;
            self.cache.set_bytes(bytes.clone());
            return Ok(bytes);
        }
        if let Some(bytes) = self.cache.bytes() {
            return Ok(bytes.to_vec());
        }
        if self.is_new_record() {
            return Ok(Vec::new());
        }
        self.materialize()?;
        Ok(self.cache.bytes().map(<[u8]>::to_vec).unwrap_or_default())
    }

    /// Content as text. Bytes that are not valid UTF-8 are an
    /// [`EncodingError`](DatastreamError::EncodingError).
    pub fn content_string(&mut self) -> DatastreamResult<String> {
        let bytes = self.content()?;
        into_text(&self.id, bytes)
    }

    /// Replace the content with `bytes`. Returns whether a change was
    /// recorded; content canonically equal to the current content is a
    /// no-op.
    pub fn set_content(&mut self, bytes: impl AsRef<[u8]>) -> DatastreamResult<bool> {
        self.ensure_mutable()?;
        let parsed = R::parse(bytes.as_ref(), &self.context())?;
        let parsed = self.settle(parsed);
        let proposed = parsed.serialize(&self.context())?;

        let current = self.current_canonical()?;
        if current.as_deref() == Some(proposed.as_slice()) {
            debug!(dsid = %self.id, "content unchanged, ignoring write");
            return Ok(false);
        }
        self.cache.replace(parsed, Some(proposed), true);
        debug!(dsid = %self.id, "content replaced");
        Ok(true)
    }

    /// Whether the datastream diverged from its last known bytes. Never
    /// fetches.
    pub fn changed(&self) -> DatastreamResult<bool> {
        match R::CHANGE_POLICY {
            ChangePolicy::DirtyFlag => {
                if self.profile.autocreate && self.is_new_record() {
                    return Ok(true);
                }
                Ok(self.cache.state() == CacheState::LoadedDirty)
            }
            ChangePolicy::Reserialize => {
                let Some(value) = self.cache.structured() else {
                    return Ok(false);
                };
                if value.has_pending_identity() {
                    return Ok(true);
                }
                let rendered = value.serialize(&self.context())?;
                Ok(match self.cache.baseline() {
                    Some(baseline) => !baseline.matches(&rendered),
                    None => !value.is_empty(),
                })
            }
        }
    }

    // -----------------------------------------------------------------------
    // Structured accessors
    // -----------------------------------------------------------------------

    /// The structured value, loading it on first access.
    pub fn structured(&mut self) -> DatastreamResult<&R> {
        self.materialize()?;
        self.cache
            .structured()
            .ok_or_else(|| self.missing_value())
    }

    /// Mutable access. The datastream is marked dirty up front.
    pub fn structured_mut(&mut self) -> DatastreamResult<&mut R> {
        self.ensure_mutable()?;
        self.materialize()?;
        self.cache.mark_dirty();
        let dsid = self.id.clone();
        self.cache
            .structured_mut()
            .ok_or(DatastreamError::MalformedContent {
                dsid,
                reason: "structured value missing after load".into(),
            })
    }

    /// Replace the structured value wholesale. Returns whether the new value
    /// differs canonically from the current content; when there is no prior
    /// content it always does.
    pub fn set_structured(&mut self, assignment: Assignment<R>) -> DatastreamResult<bool> {
        self.ensure_mutable()?;
        let ctx = self.context();
        let kind = assignment.kind();
        let incoming = match assignment {
            Assignment::Whole(value) => value,
            Assignment::Fragment(fragment) => R::from_fragment(fragment, &ctx)?,
            Assignment::Raw(bytes) => R::parse(&bytes, &ctx)?,
        };
        let incoming = self.settle(incoming);
        let proposed = incoming.serialize(&self.context())?;

        let current = self.current_canonical()?;
        let differs = current.as_deref() != Some(proposed.as_slice());
        if differs {
            debug!(dsid = %self.id, assignment = kind, "structured value replaced, marking dirty");
        }
        self.cache.replace(incoming, differs.then_some(proposed), differs);
        Ok(differs)
    }

    /// Settle the identity of a value about to replace the cached one, then
    /// decorate it. A resolved identity of the cached value carries over.
    fn settle(&self, mut incoming: R) -> R {
        if let Some(current) = self.cache.structured() {
            if incoming.inherit_identity(current) {
                debug!(dsid = %self.id, "kept identity of the replaced value");
            }
        }
        incoming.resolve_identity(&self.context());
        self.profile.decorate(incoming)
    }

    /// [`set_structured`](Self::set_structured) with dynamic type dispatch.
    pub fn assign(&mut self, value: Box<dyn Any>) -> DatastreamResult<bool> {
        let assignment = Assignment::from_any(value)?;
        self.set_structured(assignment)
    }

    /// Drop both caches. The next access loads again.
    pub fn invalidate(&mut self) {
        debug!(dsid = %self.id, state = %self.cache.state(), "invalidating datastream cache");
        self.cache.reset();
    }

    pub fn mark_dirty(&mut self) -> DatastreamResult<()> {
        self.ensure_mutable()?;
        self.materialize()?;
        self.cache.mark_dirty();
        Ok(())
    }

    pub fn mark_clean(&mut self) {
        self.cache.mark_clean();
    }

    // -----------------------------------------------------------------------
    // Persistence hand-off
    // -----------------------------------------------------------------------

    /// Content to store, or `None` when it is blank.
    pub fn persistable_content(&mut self) -> DatastreamResult<Option<Vec<u8>>> {
        let bytes = self.content()?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            warn!(dsid = %self.id, "refusing to save a datastream with empty content");
            return Ok(None);
        }
        Ok(Some(bytes))
    }

    /// The owning layer stored [`content`](Self::content); it becomes the
    /// new baseline.
    pub fn mark_persisted(&mut self) -> DatastreamResult<()> {
        let bytes = self.content()?;
        let len = bytes.len();
        self.cache.mark_persisted(bytes);
        if let Some(baseline) = self.cache.baseline() {
            debug!(dsid = %self.id, bytes = len, baseline = %baseline, "datastream persisted");
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Addressing
    // -----------------------------------------------------------------------

    /// Record a new address. A loaded value with a pending identity settles
    /// it immediately; otherwise the next load derives it.
    pub fn set_uri(&mut self, uri: ResourceUri) -> DatastreamResult<()> {
        self.ensure_mutable()?;
        self.uri = Some(uri);
        let ctx = LoadContext::new(&self.id, self.uri.as_ref(), &self.profile.options);
        if let Some(value) = self.cache.structured_mut() {
            if value.has_pending_identity() && value.resolve_identity(&ctx) {
                debug!(dsid = %self.id, "identity resolved from new address");
            }
        }
        Ok(())
    }

    /// Stored bytes, straight from the source. The cache is not consulted.
    pub(crate) fn fetch_stored(&self) -> DatastreamResult<Option<Vec<u8>>> {
        let fetched = self.source.fetch(&self.id)?;
        debug!(dsid = %self.id, found = fetched.is_some(), "fetched stored bytes");
        Ok(fetched)
    }

    fn missing_value(&self) -> DatastreamError {
        DatastreamError::MalformedContent {
            dsid: self.id.clone(),
            reason: "structured value missing after load".into(),
        }
    }
}

fn into_text(dsid: &DatastreamId, bytes: Vec<u8>) -> DatastreamResult<String> {
    String::from_utf8(bytes).map_err(|e| DatastreamError::EncodingError {
        dsid: dsid.clone(),
        offset: e.utf8_error().valid_up_to(),
        detail: e.utf8_error().to_string(),
    })
}

impl<R: Representation> fmt::Debug for Datastream<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Datastream")
            .field("id", &self.id)
            .field("uri", &self.uri)
            .field("state", &self.cache.state())
            .field("frozen", &self.frozen)
            .finish()
    }
}

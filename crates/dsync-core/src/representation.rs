use std::any::{type_name, Any};

use dsync_types::{DatastreamId, ResourceUri};

use crate::config::ProfileConfig;
use crate::error::{DatastreamError, DatastreamResult};

/// How a variant decides whether it has diverged from its bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangePolicy {
    /// Trust the cache's dirty flag.
    DirtyFlag,
    /// Re-serialize and compare against the baseline digest.
    Reserialize,
}

/// What a representation sees while being built or serialized.
#[derive(Debug)]
pub struct LoadContext<'a, O> {
    pub dsid: &'a DatastreamId,
    pub uri: Option<&'a ResourceUri>,
    pub options: &'a O,
}

impl<'a, O> LoadContext<'a, O> {
    pub fn new(dsid: &'a DatastreamId, uri: Option<&'a ResourceUri>, options: &'a O) -> Self {
        Self { dsid, uri, options }
    }
}

/// A structured form of datastream content.
///
/// Implementations convert between canonical bytes and an in-memory value.
/// The synchronization rules live in [`Datastream`](crate::Datastream);
/// implementations only parse, serialize, and report on themselves.
pub trait Representation: Sized + 'static {
    /// Per-profile settings: template, format, field declarations.
    type Options;

    /// A partial value that can be wrapped into a whole representation.
    type Fragment: 'static;

    const CHANGE_POLICY: ChangePolicy;

    /// The value of a datastream that has never been stored.
    fn template(ctx: &LoadContext<'_, Self::Options>) -> DatastreamResult<Self>;

    /// Build a value from raw stored bytes. Blank input is empty content.
    fn parse(bytes: &[u8], ctx: &LoadContext<'_, Self::Options>) -> DatastreamResult<Self>;

    /// Canonical bytes.
    fn serialize(&self, ctx: &LoadContext<'_, Self::Options>) -> DatastreamResult<Vec<u8>>;

    fn is_empty(&self) -> bool;

    /// Wholesale replacement.
    fn replace(&mut self, other: Self) {
        *self = other;
    }

    fn from_fragment(
        fragment: Self::Fragment,
        ctx: &LoadContext<'_, Self::Options>,
    ) -> DatastreamResult<Self>;

    /// Whether the value's identity (e.g. a graph subject) is still unknown.
    fn has_pending_identity(&self) -> bool {
        false
    }

    /// Carry a settled identity over from the value this one replaces.
    /// Returns `true` if anything changed.
    fn inherit_identity(&mut self, _previous: &Self) -> bool {
        false
    }

    /// Settle a pending identity from the context. Returns `true` if
    /// anything changed.
    fn resolve_identity(&mut self, _ctx: &LoadContext<'_, Self::Options>) -> bool {
        false
    }

    fn default_mime_type(options: &Self::Options) -> String;

    /// Variant-specific options from the serializable part of a profile.
    fn options_from_config(config: &ProfileConfig) -> DatastreamResult<Self::Options>;
}

/// A value offered to the structured setter.
pub enum Assignment<R: Representation> {
    Whole(R),
    Fragment(R::Fragment),
    Raw(Vec<u8>),
}

impl<R: Representation> Assignment<R> {
    pub fn whole(value: R) -> Self {
        Self::Whole(value)
    }

    pub fn fragment(fragment: R::Fragment) -> Self {
        Self::Fragment(fragment)
    }

    pub fn raw(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Raw(bytes.into())
    }

    /// Dispatch on the dynamic type of `value`.
    ///
    /// Accepts the representation itself, its fragment type, `Vec<u8>`,
    /// `String` and `&'static str`.
    pub fn from_any(value: Box<dyn Any>) -> DatastreamResult<Self> {
        let value = match value.downcast::<R>() {
            Ok(whole) => return Ok(Self::Whole(*whole)),
            Err(other) => other,
        };
        let value = match value.downcast::<R::Fragment>() {
            Ok(fragment) => return Ok(Self::Fragment(*fragment)),
            Err(other) => other,
        };
        let value = match value.downcast::<Vec<u8>>() {
            Ok(bytes) => return Ok(Self::Raw(*bytes)),
            Err(other) => other,
        };
        let value = match value.downcast::<String>() {
            Ok(text) => return Ok(Self::Raw(text.into_bytes())),
            Err(other) => other,
        };
        match value.downcast::<&'static str>() {
            Ok(text) => Ok(Self::Raw(text.as_bytes().to_vec())),
            Err(_) => Err(DatastreamError::UnsupportedAssignment {
                expected: type_name::<R>(),
            }),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Whole(_) => "whole",
            Self::Fragment(_) => "fragment",
            Self::Raw(_) => "raw",
        }
    }
}

impl<R: Representation> std::fmt::Debug for Assignment<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Raw(bytes) => f.debug_tuple("Raw").field(&bytes.len()).finish(),
            other => f.debug_tuple("Assignment").field(&other.kind()).finish(),
        }
    }
}

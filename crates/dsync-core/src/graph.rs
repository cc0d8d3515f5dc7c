//! Graph datastreams: content held as an [`RdfResource`].

use dsync_rdf::codec;
use dsync_rdf::{Graph, IntoObject, PrimarySubject, RdfError, RdfResource, Term};
use dsync_types::{DatastreamId, SerializationFormat};
use sophia_iri::Iri;
use tracing::debug;

use crate::config::{GraphOptions, ProfileConfig};
use crate::datastream::Datastream;
use crate::error::{DatastreamError, DatastreamResult};
use crate::representation::{ChangePolicy, LoadContext, Representation};
use crate::subject::SubjectResolver;

/// A datastream whose content is a graph of statements.
pub type GraphDatastream = Datastream<RdfResource>;

fn rdf_error(dsid: &DatastreamId, err: RdfError) -> DatastreamError {
    match err {
        RdfError::Encoding { offset, detail } => DatastreamError::EncodingError {
            dsid: dsid.clone(),
            offset,
            detail,
        },
        RdfError::Serialize(reason) => DatastreamError::Serialization {
            dsid: dsid.clone(),
            reason,
        },
        err @ (RdfError::InvalidIri(_) | RdfError::UnsupportedTerm(_)) => {
            DatastreamError::Serialization {
                dsid: dsid.clone(),
                reason: err.to_string(),
            }
        }
        other => DatastreamError::MalformedContent {
            dsid: dsid.clone(),
            reason: other.to_string(),
        },
    }
}

fn format_of(ctx: &LoadContext<'_, GraphOptions>) -> DatastreamResult<SerializationFormat> {
    ctx.options
        .format
        .ok_or_else(|| DatastreamError::FormatNotConfigured {
            dsid: ctx.dsid.clone(),
        })
}

impl Representation for RdfResource {
    type Options = GraphOptions;
    type Fragment = Graph;

    const CHANGE_POLICY: ChangePolicy = ChangePolicy::Reserialize;

    fn template(ctx: &LoadContext<'_, GraphOptions>) -> DatastreamResult<Self> {
        Ok(match ctx.options.subject_resolver.resolve(ctx.uri) {
            Some(iri) => RdfResource::with_subject(iri),
            None => RdfResource::new(),
        })
    }

    /// The subject is left pending; callers settle it through
    /// [`inherit_identity`](Representation::inherit_identity) and
    /// [`resolve_identity`](Representation::resolve_identity).
    fn parse(bytes: &[u8], ctx: &LoadContext<'_, GraphOptions>) -> DatastreamResult<Self> {
        let format = format_of(ctx)?;
        let graph = codec::parse_bytes(bytes, format).map_err(|e| rdf_error(ctx.dsid, e))?;
        Ok(RdfResource::from_graph(graph))
    }

    fn serialize(&self, ctx: &LoadContext<'_, GraphOptions>) -> DatastreamResult<Vec<u8>> {
        let format = format_of(ctx)?;
        codec::serialize(self.graph(), format)
            .map(String::into_bytes)
            .map_err(|e| rdf_error(ctx.dsid, e))
    }

    fn is_empty(&self) -> bool {
        RdfResource::is_empty(self)
    }

    fn from_fragment(graph: Graph, _ctx: &LoadContext<'_, GraphOptions>) -> DatastreamResult<Self> {
        Ok(RdfResource::from_graph(graph))
    }

    fn has_pending_identity(&self) -> bool {
        self.is_subject_pending()
    }

    /// A subject that was already resolved, explicitly or from the address,
    /// outlives content replacement.
    fn inherit_identity(&mut self, previous: &Self) -> bool {
        match previous.subject() {
            PrimarySubject::Resolved(iri) if self.is_subject_pending() => {
                self.set_subject(iri.clone())
            }
            _ => false,
        }
    }

    /// The address decides first. Without one, a graph about a single IRI
    /// is taken to be about that IRI.
    fn resolve_identity(&mut self, ctx: &LoadContext<'_, GraphOptions>) -> bool {
        if !self.is_subject_pending() {
            return false;
        }
        match ctx.options.subject_resolver.resolve(ctx.uri) {
            Some(iri) => self.set_subject(iri),
            None => self.adopt_sole_subject(),
        }
    }

    fn default_mime_type(options: &GraphOptions) -> String {
        options
            .format
            .map_or("text/plain", |format| format.mime_type())
            .to_string()
    }

    fn options_from_config(config: &ProfileConfig) -> DatastreamResult<GraphOptions> {
        if config.template.is_some() {
            return Err(DatastreamError::Config(
                "template applies to tree datastreams only".into(),
            ));
        }
        let mut options = GraphOptions::default();
        options.format = config.format;
        if let Some(base) = &config.base_iri {
            options.subject_resolver = SubjectResolver::parent().against_base(base)?;
        }
        for property in &config.properties {
            Iri::new(property.predicate.as_str()).map_err(|e| {
                DatastreamError::Config(format!(
                    "predicate of field {:?} is not an absolute IRI: {:?}",
                    property.name, e.0
                ))
            })?;
            options = options.property(property.name.clone(), property.predicate.clone());
        }
        Ok(options)
    }
}

/// Outcome of [`Datastream::update_fields`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    pub applied: Vec<String>,
    pub skipped: Vec<String>,
}

impl UpdateSummary {
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty() && self.skipped.is_empty()
    }
}

impl Datastream<RdfResource> {
    /// Anchor the graph on `iri`. Returns `false` if it already is the
    /// subject.
    pub fn set_subject(&mut self, iri: impl Into<String>) -> DatastreamResult<bool> {
        let iri = iri.into();
        let resource = self.structured_mut()?;
        let changed = resource.set_subject(iri);
        Ok(changed)
    }

    /// Resolve a pending subject from the address. No-op once resolved.
    pub fn resolve_subject(&mut self) -> DatastreamResult<bool> {
        self.materialize()?;
        let ctx = LoadContext::new(self.id(), self.uri(), &self.profile().options);
        let resolved = match self.cache.structured() {
            Some(resource) if resource.is_subject_pending() => {
                ctx.options.subject_resolver.resolve(ctx.uri)
            }
            _ => None,
        };
        let Some(iri) = resolved else {
            return Ok(false);
        };
        debug!(dsid = %self.id(), subject = %iri, "resolved graph subject");
        self.ensure_mutable()?;
        Ok(self.structured_mut()?.set_subject(iri))
    }

    /// The primary subject, resolving it first if possible.
    pub fn rdf_subject(&mut self) -> DatastreamResult<Term> {
        if !self.is_frozen() {
            self.resolve_subject()?;
        }
        Ok(self.structured()?.subject_term())
    }

    /// Parse `bytes`, or the stored bytes when none are given, without
    /// touching the cache. A new record with no bytes is an empty graph and
    /// nothing is fetched. The subject is settled the way a content write
    /// would settle it.
    pub fn deserialize(&self, bytes: Option<&[u8]>) -> DatastreamResult<RdfResource> {
        let ctx = LoadContext::new(self.id(), self.uri(), &self.profile().options);
        let mut resource = match bytes {
            Some(bytes) => RdfResource::parse(bytes, &ctx)?,
            None if self.is_new_record() => return RdfResource::template(&ctx),
            None => {
                let fetched = self.fetch_stored()?;
                RdfResource::parse(fetched.as_deref().unwrap_or_default(), &ctx)?
            }
        };
        if let Some(current) = self.cache.structured() {
            resource.inherit_identity(current);
        }
        resource.resolve_identity(&ctx);
        Ok(resource)
    }

    /// Declared field names, in declaration order.
    pub fn fields(&self) -> Vec<&str> {
        self.profile().options.fields()
    }

    fn predicate(&self, field: &str) -> DatastreamResult<String> {
        self.profile()
            .options
            .predicate_for(field)
            .map(str::to_string)
            .ok_or_else(|| DatastreamError::UnknownField {
                dsid: self.id().clone(),
                field: field.to_string(),
            })
    }

    pub fn get_values(&mut self, field: &str) -> DatastreamResult<Vec<Term>> {
        let predicate = self.predicate(field)?;
        Ok(self.structured()?.get_values(&predicate))
    }

    pub fn set_values<I, T>(&mut self, field: &str, values: I) -> DatastreamResult<()>
    where
        I: IntoIterator<Item = T>,
        T: IntoObject,
    {
        let predicate = self.predicate(field)?;
        self.structured_mut()?.set_values(&predicate, values);
        Ok(())
    }

    pub fn append_value(&mut self, field: &str, value: impl IntoObject) -> DatastreamResult<bool> {
        let predicate = self.predicate(field)?;
        Ok(self.structured_mut()?.append_value(&predicate, value))
    }

    pub fn clear_values(&mut self, field: &str) -> DatastreamResult<usize> {
        let predicate = self.predicate(field)?;
        Ok(self.structured_mut()?.clear_values(&predicate))
    }

    /// Apply each update in order. Unknown fields are skipped; applied
    /// updates stay applied.
    pub fn update_fields<I, F, V>(&mut self, updates: I) -> DatastreamResult<UpdateSummary>
    where
        I: IntoIterator<Item = (F, V)>,
        F: Into<String>,
        V: IntoIterator,
        V::Item: IntoObject,
    {
        self.ensure_mutable()?;
        let mut summary = UpdateSummary::default();
        for (field, values) in updates {
            let field = field.into();
            match self.profile().options.predicate_for(&field).map(str::to_string) {
                Some(predicate) => {
                    self.structured_mut()?.set_values(&predicate, values);
                    summary.applied.push(field);
                }
                None => {
                    debug!(dsid = %self.id(), field = %field, "skipping unknown field");
                    summary.skipped.push(field);
                }
            }
        }
        Ok(summary)
    }
}

//! Tree datastreams: content held as an [`XmlDocument`].

use dsync_types::DatastreamId;
use dsync_xml::{XmlDocument, XmlError, XmlNode};

use crate::config::{ProfileConfig, TreeOptions, DEFAULT_TEMPLATE};
use crate::datastream::Datastream;
use crate::error::{DatastreamError, DatastreamResult};
use crate::representation::{ChangePolicy, LoadContext, Representation};

/// A datastream whose content is an XML document.
pub type TreeDatastream = Datastream<XmlDocument>;

fn xml_error(dsid: &DatastreamId, err: XmlError) -> DatastreamError {
    match err {
        XmlError::Encoding { offset, detail } => DatastreamError::EncodingError {
            dsid: dsid.clone(),
            offset,
            detail,
        },
        XmlError::UnsupportedGraftTarget(kind) => {
            DatastreamError::UnsupportedGraftTarget(kind.to_string())
        }
        XmlError::Serialize(e) => DatastreamError::Serialization {
            dsid: dsid.clone(),
            reason: e.to_string(),
        },
        other => DatastreamError::MalformedContent {
            dsid: dsid.clone(),
            reason: other.to_string(),
        },
    }
}

impl Representation for XmlDocument {
    type Options = TreeOptions;
    type Fragment = XmlNode;

    const CHANGE_POLICY: ChangePolicy = ChangePolicy::DirtyFlag;

    fn template(ctx: &LoadContext<'_, TreeOptions>) -> DatastreamResult<Self> {
        XmlDocument::from_template(&ctx.options.template).map_err(|e| xml_error(ctx.dsid, e))
    }

    fn parse(bytes: &[u8], ctx: &LoadContext<'_, TreeOptions>) -> DatastreamResult<Self> {
        XmlDocument::parse(bytes).map_err(|e| xml_error(ctx.dsid, e))
    }

    fn serialize(&self, ctx: &LoadContext<'_, TreeOptions>) -> DatastreamResult<Vec<u8>> {
        self.to_bytes().map_err(|e| xml_error(ctx.dsid, e))
    }

    fn is_empty(&self) -> bool {
        XmlDocument::is_empty(self)
    }

    fn from_fragment(node: XmlNode, ctx: &LoadContext<'_, TreeOptions>) -> DatastreamResult<Self> {
        XmlDocument::from_fragment(&node).map_err(|e| xml_error(ctx.dsid, e))
    }

    fn default_mime_type(_options: &TreeOptions) -> String {
        "text/xml".to_string()
    }

    fn options_from_config(config: &ProfileConfig) -> DatastreamResult<TreeOptions> {
        if config.format.is_some() {
            return Err(DatastreamError::Config(
                "format applies to graph datastreams only".into(),
            ));
        }
        if !config.properties.is_empty() {
            return Err(DatastreamError::Config(
                "properties apply to graph datastreams only".into(),
            ));
        }
        if config.base_iri.is_some() {
            return Err(DatastreamError::Config(
                "base_iri applies to graph datastreams only".into(),
            ));
        }
        Ok(TreeOptions::default().with_template(
            config.template.as_deref().unwrap_or(DEFAULT_TEMPLATE),
        ))
    }
}

impl Datastream<XmlDocument> {
    /// Serialize the document, optionally grafting it onto `target` first.
    ///
    /// Without a root element the profile's root builder, if any, supplies
    /// the document to render; the cache keeps its own. With a target other
    /// than the document itself, the root is moved under the target (under
    /// its root element for a document target, as a child for an element
    /// target) and the target is rendered instead.
    pub fn to_xml(&mut self, target: Option<&XmlNode>) -> DatastreamResult<String> {
        self.materialize()?;
        let cached = self.structured()?.clone();
        let doc = match (&self.profile().options.root_builder, cached.has_root()) {
            (Some(builder), false) => builder().map_err(|e| xml_error(self.id(), e))?,
            _ => cached,
        };
        let rendered = match target {
            None => doc.to_xml_string(),
            Some(node) if node.same_node(&doc.as_node()) => doc.to_xml_string(),
            Some(node) => {
                doc.graft_root_onto(node)
                    .map_err(|e| xml_error(self.id(), e))?;
                node.to_xml_string().map(|s| s.trim().to_string())
            }
        };
        rendered.map_err(|e| xml_error(self.id(), e))
    }

    /// The root element, if the document has one.
    pub fn root(&mut self) -> DatastreamResult<Option<XmlNode>> {
        Ok(self.structured()?.root())
    }
}

use std::fmt;
use std::sync::Arc;

use dsync_types::SerializationFormat;
use dsync_xml::{XmlDocument, XmlResult};
use serde::{Deserialize, Serialize};

use crate::error::{DatastreamError, DatastreamResult};
use crate::representation::Representation;
use crate::subject::SubjectResolver;

/// Template of a tree datastream that has never been stored.
pub const DEFAULT_TEMPLATE: &str = "<xml/>";

/// Runs after every parse and assignment of a structured value.
pub type Decorator<R> = Arc<dyn Fn(R) -> R + Send + Sync>;

/// Builds a document for a tree datastream whose cached document has no
/// root element.
pub type RootBuilder = Arc<dyn Fn() -> XmlResult<XmlDocument> + Send + Sync>;

/// Serializable part of a profile, as read from TOML.
///
/// ```toml
/// autocreate = true
/// format = "ntriples"
/// base_iri = "http://example.org/repo/"
///
/// [[properties]]
/// name = "title"
/// predicate = "http://purl.org/dc/terms/title"
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileConfig {
    pub autocreate: bool,
    pub mime_type: Option<String>,
    pub format: Option<SerializationFormat>,
    pub template: Option<String>,
    /// Graph subjects derived from relative addresses are resolved
    /// against this IRI.
    pub base_iri: Option<String>,
    pub properties: Vec<PropertyConfig>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertyConfig {
    pub name: String,
    pub predicate: String,
}

impl ProfileConfig {
    pub fn from_toml_str(text: &str) -> DatastreamResult<Self> {
        toml::from_str(text).map_err(|e| DatastreamError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> DatastreamResult<String> {
        toml::to_string(self).map_err(|e| DatastreamError::Config(e.to_string()))
    }
}

/// Per-datastream-type configuration, shared by every datastream of that
/// type.
pub struct DatastreamProfile<R: Representation> {
    /// Render the template for new records even when untouched.
    pub autocreate: bool,
    pub mime_type: Option<String>,
    pub decorator: Option<Decorator<R>>,
    pub options: R::Options,
}

impl<R: Representation> DatastreamProfile<R> {
    pub fn new(options: R::Options) -> Self {
        Self {
            autocreate: false,
            mime_type: None,
            decorator: None,
            options,
        }
    }

    /// Build a profile from its serializable part. Hooks are attached
    /// afterwards.
    pub fn from_config(config: &ProfileConfig) -> DatastreamResult<Self> {
        Ok(Self {
            autocreate: config.autocreate,
            mime_type: config.mime_type.clone(),
            decorator: None,
            options: R::options_from_config(config)?,
        })
    }

    pub fn with_autocreate(mut self, autocreate: bool) -> Self {
        self.autocreate = autocreate;
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn with_decorator<F>(mut self, decorator: F) -> Self
    where
        F: Fn(R) -> R + Send + Sync + 'static,
    {
        self.decorator = Some(Arc::new(decorator));
        self
    }

    pub fn mime_type(&self) -> String {
        self.mime_type
            .clone()
            .unwrap_or_else(|| R::default_mime_type(&self.options))
    }

    pub(crate) fn decorate(&self, value: R) -> R {
        match &self.decorator {
            Some(decorator) => decorator(value),
            None => value,
        }
    }
}

impl<R: Representation> Default for DatastreamProfile<R>
where
    R::Options: Default,
{
    fn default() -> Self {
        Self::new(R::Options::default())
    }
}

impl<R: Representation> fmt::Debug for DatastreamProfile<R>
where
    R::Options: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatastreamProfile")
            .field("autocreate", &self.autocreate)
            .field("mime_type", &self.mime_type)
            .field("decorator", &self.decorator.is_some())
            .field("options", &self.options)
            .finish()
    }
}

/// Options of tree datastreams.
#[derive(Clone)]
pub struct TreeOptions {
    pub template: String,
    pub root_builder: Option<RootBuilder>,
}

impl TreeOptions {
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn with_root_builder<F>(mut self, builder: F) -> Self
    where
        F: Fn() -> XmlResult<XmlDocument> + Send + Sync + 'static,
    {
        self.root_builder = Some(Arc::new(builder));
        self
    }
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
            root_builder: None,
        }
    }
}

impl fmt::Debug for TreeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeOptions")
            .field("template", &self.template)
            .field("root_builder", &self.root_builder.is_some())
            .finish()
    }
}

/// Options of graph datastreams.
#[derive(Clone, Debug, Default)]
pub struct GraphOptions {
    pub format: Option<SerializationFormat>,
    pub subject_resolver: SubjectResolver,
    properties: Vec<(String, String)>,
}

impl GraphOptions {
    pub fn with_format(mut self, format: SerializationFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_subject_resolver(mut self, resolver: SubjectResolver) -> Self {
        self.subject_resolver = resolver;
        self
    }

    /// Declare a field backed by `predicate`. Redeclaring a field replaces
    /// its predicate in place.
    pub fn property(mut self, name: impl Into<String>, predicate: impl Into<String>) -> Self {
        let name = name.into();
        let predicate = predicate.into();
        match self.properties.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = predicate,
            None => self.properties.push((name, predicate)),
        }
        self
    }

    pub fn predicate_for(&self, field: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, predicate)| predicate.as_str())
    }

    /// Declared field names, in declaration order.
    pub fn fields(&self) -> Vec<&str> {
        self.properties.iter().map(|(name, _)| name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_graph_profile() {
        let config = ProfileConfig::from_toml_str(
            r#"
            autocreate = true
            format = "nt"

            [[properties]]
            name = "title"
            predicate = "http://purl.org/dc/terms/title"

            [[properties]]
            name = "creator"
            predicate = "http://purl.org/dc/terms/creator"
            "#,
        )
        .unwrap();
        assert!(config.autocreate);
        assert_eq!(config.format, Some(SerializationFormat::NTriples));
        assert_eq!(config.properties.len(), 2);
        assert_eq!(config.properties[1].name, "creator");
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = ProfileConfig::from_toml_str("").unwrap();
        assert_eq!(config, ProfileConfig::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            ProfileConfig::from_toml_str("colour = \"blue\""),
            Err(DatastreamError::Config(_))
        ));
        assert!(matches!(
            ProfileConfig::from_toml_str("format = \"json\""),
            Err(DatastreamError::Config(_))
        ));
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = ProfileConfig {
            autocreate: false,
            mime_type: Some("text/xml".into()),
            format: None,
            template: Some("<fields/>".into()),
            base_iri: None,
            properties: Vec::new(),
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(ProfileConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn graph_options_keep_field_order() {
        let options = GraphOptions::default()
            .property("title", "http://purl.org/dc/terms/title")
            .property("creator", "http://purl.org/dc/terms/creator")
            .property("title", "http://purl.org/dc/elements/1.1/title");
        assert_eq!(options.fields(), vec!["title", "creator"]);
        assert_eq!(
            options.predicate_for("title"),
            Some("http://purl.org/dc/elements/1.1/title")
        );
        assert!(options.predicate_for("missing").is_none());
    }

    #[test]
    fn tree_options_default_template() {
        let options = TreeOptions::default();
        assert_eq!(options.template, "<xml/>");
        assert!(options.root_builder.is_none());
    }
}

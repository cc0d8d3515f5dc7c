use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Name of one content unit attached to a repository object.
///
/// Datastream ids are short, human-assigned names such as `descMetadata`
/// or `items/42`. They are the key handed to the byte source.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DatastreamId(String);

impl DatastreamId {
    /// Create a validated datastream id.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        if id.is_empty() {
            return Err(TypeError::EmptyId);
        }
        if id.chars().any(char::is_whitespace) {
            return Err(TypeError::InvalidId(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for DatastreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DatastreamId({})", self.0)
    }
}

impl fmt::Display for DatastreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DatastreamId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for DatastreamId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DatastreamId> for String {
    fn from(id: DatastreamId) -> Self {
        id.0
    }
}

/// Address of a datastream inside the repository.
///
/// The address is opaque apart from its `/`-separated path structure, which
/// [`ResourceUri::parent`] uses to find the owning object's address.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceUri(String);

impl ResourceUri {
    pub fn new(uri: impl Into<String>) -> Result<Self, TypeError> {
        let uri = uri.into();
        if uri.trim().is_empty() {
            return Err(TypeError::EmptyUri);
        }
        Ok(Self(uri))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The address with its last path segment removed.
    ///
    /// `http://host/rest/items/42` becomes `http://host/rest/items`. Returns
    /// `None` when there is no `/` or nothing precedes it.
    pub fn parent(&self) -> Option<ResourceUri> {
        let (head, _) = self.0.rsplit_once('/')?;
        if head.is_empty() {
            return None;
        }
        Some(Self(head.to_string()))
    }

    /// The last path segment.
    pub fn last_segment(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Debug for ResourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceUri({})", self.0)
    }
}

impl fmt::Display for ResourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ResourceUri {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ResourceUri {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ResourceUri> for String {
    fn from(uri: ResourceUri) -> Self {
        uri.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // -----------------------------------------------------------------------
    // DatastreamId
    // -----------------------------------------------------------------------

    #[test]
    fn datastream_id_accepts_plain_names() {
        let id = DatastreamId::new("descMetadata").unwrap();
        assert_eq!(id.as_str(), "descMetadata");
        assert_eq!(id.to_string(), "descMetadata");
    }

    #[test]
    fn datastream_id_rejects_empty() {
        assert_eq!(DatastreamId::new(""), Err(TypeError::EmptyId));
    }

    #[test]
    fn datastream_id_rejects_whitespace() {
        assert!(matches!(
            DatastreamId::new("desc metadata"),
            Err(TypeError::InvalidId(_))
        ));
    }

    #[test]
    fn datastream_id_serde_validates() {
        let id: DatastreamId = serde_json::from_str("\"items/42\"").unwrap();
        assert_eq!(id.as_str(), "items/42");
        assert!(serde_json::from_str::<DatastreamId>("\"\"").is_err());
    }

    // -----------------------------------------------------------------------
    // ResourceUri
    // -----------------------------------------------------------------------

    #[test]
    fn parent_strips_last_segment() {
        let uri = ResourceUri::new("items/42").unwrap();
        assert_eq!(uri.parent().unwrap().as_str(), "items");
    }

    #[test]
    fn parent_of_absolute_address() {
        let uri = ResourceUri::new("http://localhost:8080/rest/test/123/descMetadata").unwrap();
        assert_eq!(
            uri.parent().unwrap().as_str(),
            "http://localhost:8080/rest/test/123"
        );
    }

    #[test]
    fn parent_of_single_segment_is_none() {
        assert!(ResourceUri::new("items").unwrap().parent().is_none());
        assert!(ResourceUri::new("/items").unwrap().parent().is_none());
    }

    #[test]
    fn parent_of_trailing_slash_keeps_head() {
        let uri = ResourceUri::new("items/").unwrap();
        assert_eq!(uri.parent().unwrap().as_str(), "items");
    }

    #[test]
    fn last_segment() {
        assert_eq!(ResourceUri::new("a/b/c").unwrap().last_segment(), "c");
        assert_eq!(ResourceUri::new("abc").unwrap().last_segment(), "abc");
    }

    #[test]
    fn empty_uri_rejected() {
        assert_eq!(ResourceUri::new("  "), Err(TypeError::EmptyUri));
    }

    proptest! {
        #[test]
        fn parent_inverts_push_segment(
            head in "[a-z]{1,8}(/[a-z0-9]{1,8}){0,3}",
            segment in "[a-zA-Z0-9:]{0,8}",
        ) {
            let uri = ResourceUri::new(format!("{head}/{segment}")).unwrap();
            let parent = uri.parent().unwrap();
            prop_assert_eq!(parent.as_str(), head.as_str());
            prop_assert_eq!(uri.last_segment(), segment.as_str());
        }
    }
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Wire format of graph-shaped datastream content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SerializationFormat {
    /// One statement per line, absolute IRIs.
    NTriples,
    /// Terse triple language with prefixes.
    Turtle,
    /// RDF/XML.
    RdfXml,
}

impl SerializationFormat {
    pub const ALL: [SerializationFormat; 3] = [Self::NTriples, Self::Turtle, Self::RdfXml];

    /// Canonical configuration name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NTriples => "ntriples",
            Self::Turtle => "turtle",
            Self::RdfXml => "rdfxml",
        }
    }

    /// Mime type a datastream in this format advertises by default.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::NTriples => "text/plain",
            Self::Turtle => "text/turtle",
            Self::RdfXml => "text/xml",
        }
    }
}

impl fmt::Display for SerializationFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SerializationFormat {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ntriples" | "n-triples" | "nt" => Ok(Self::NTriples),
            "turtle" | "ttl" => Ok(Self::Turtle),
            "rdfxml" | "rdf/xml" | "xml" => Ok(Self::RdfXml),
            _ => Err(TypeError::UnknownFormat(s.to_string())),
        }
    }
}

impl TryFrom<String> for SerializationFormat {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SerializationFormat> for String {
    fn from(format: SerializationFormat) -> Self {
        format.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_names() {
        for format in SerializationFormat::ALL {
            assert_eq!(format.as_str().parse::<SerializationFormat>().unwrap(), format);
        }
    }

    #[test]
    fn parses_aliases_case_insensitively() {
        assert_eq!("NT".parse::<SerializationFormat>().unwrap(), SerializationFormat::NTriples);
        assert_eq!("ttl".parse::<SerializationFormat>().unwrap(), SerializationFormat::Turtle);
        assert_eq!("RDF/XML".parse::<SerializationFormat>().unwrap(), SerializationFormat::RdfXml);
    }

    #[test]
    fn unknown_format_is_an_error() {
        assert_eq!(
            "jsonld".parse::<SerializationFormat>(),
            Err(TypeError::UnknownFormat("jsonld".into()))
        );
    }

    #[test]
    fn mime_types() {
        assert_eq!(SerializationFormat::NTriples.mime_type(), "text/plain");
        assert_eq!(SerializationFormat::RdfXml.mime_type(), "text/xml");
    }

    #[test]
    fn serde_uses_config_names() {
        let json = serde_json::to_string(&SerializationFormat::Turtle).unwrap();
        assert_eq!(json, "\"turtle\"");
        let parsed: SerializationFormat = serde_json::from_str("\"nt\"").unwrap();
        assert_eq!(parsed, SerializationFormat::NTriples);
    }
}

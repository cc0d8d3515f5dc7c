//! Parsing and serialization of graphs through the `sophia` toolkit.
//!
//! Parsed triples are collected straight into a [`Graph`]. Serialization
//! refuses relative or malformed IRIs, since no parser would accept them
//! back.

use dsync_types::{normalize_text, SerializationFormat, TypeError};
use sophia_api::graph::CollectibleGraph;
use sophia_api::parser::TripleParser;
use sophia_api::serializer::{Stringifier, TripleSerializer};
use sophia_api::source::StreamError;
use sophia_api::term::SimpleTerm;
use sophia_iri::Iri;
use sophia_turtle::parser::nt::NTriplesParser;
use sophia_turtle::parser::turtle::TurtleParser;
use sophia_turtle::serializer::nt::NtSerializer;
use sophia_turtle::serializer::turtle::TurtleSerializer;
use sophia_xml::parser::RdfXmlParser;
use sophia_xml::serializer::RdfXmlSerializer;
use tracing::debug;

use crate::error::{RdfError, RdfResult};
use crate::graph::Graph;
use crate::term::Term;

/// Decode raw bytes and parse them in `format`.
///
/// A UTF-8 byte order mark is dropped and UTF-16 with a byte order mark is
/// transcoded. Blank input is an empty graph.
pub fn parse_bytes(bytes: &[u8], format: SerializationFormat) -> RdfResult<Graph> {
    let text = normalize_text(bytes).map_err(|e| match e {
        TypeError::Encoding { offset, detail } => RdfError::Encoding { offset, detail },
        other => RdfError::Malformed(other.to_string()),
    })?;
    parse_str(&text, format)
}

/// Parse text in `format`.
pub fn parse_str(text: &str, format: SerializationFormat) -> RdfResult<Graph> {
    if text.trim().is_empty() {
        return Ok(Graph::new());
    }
    let graph = match format {
        SerializationFormat::NTriples => {
            Graph::from_triple_source(NTriplesParser::default().parse_str(text))
                .map_err(stream_error)
        }
        SerializationFormat::Turtle => {
            Graph::from_triple_source(TurtleParser::default().parse_str(text))
                .map_err(stream_error)
        }
        SerializationFormat::RdfXml => {
            Graph::from_triple_source(RdfXmlParser::default().parse_str(text))
                .map_err(stream_error)
        }
    }?;
    debug!(%format, statements = graph.len(), "parsed graph");
    Ok(graph)
}

fn stream_error<E: std::error::Error>(e: StreamError<E, std::convert::Infallible>) -> RdfError {
    match e {
        StreamError::SourceError(e) => RdfError::Malformed(e.to_string()),
        StreamError::SinkError(never) => match never {},
    }
}

/// Serialize `graph` in `format`. An empty graph serializes to an empty
/// string in every format.
pub fn serialize(graph: &Graph, format: SerializationFormat) -> RdfResult<String> {
    if graph.is_empty() {
        return Ok(String::new());
    }
    for triple in graph.iter() {
        triple.iter().try_for_each(check_term)?;
    }
    let out = match format {
        SerializationFormat::NTriples => {
            let mut stringifier = NtSerializer::new_stringifier();
            stringifier
                .serialize_graph(graph)
                .map_err(|e| RdfError::Serialize(e.to_string()))?;
            stringifier.as_str().to_string()
        }
        SerializationFormat::Turtle => {
            let mut stringifier = TurtleSerializer::new_stringifier();
            stringifier
                .serialize_graph(graph)
                .map_err(|e| RdfError::Serialize(e.to_string()))?;
            stringifier.as_str().to_string()
        }
        SerializationFormat::RdfXml => {
            let mut stringifier = RdfXmlSerializer::new_stringifier();
            stringifier
                .serialize_graph(graph)
                .map_err(|e| RdfError::Serialize(e.to_string()))?;
            stringifier.as_str().to_string()
        }
    };
    Ok(out)
}

fn check_iri(iri: &str) -> RdfResult<()> {
    Iri::new(iri)
        .map(|_| ())
        .map_err(|e| RdfError::InvalidIri(e.0))
}

fn check_term(term: &Term) -> RdfResult<()> {
    match term {
        SimpleTerm::Iri(iri) => check_iri(iri.as_str()),
        SimpleTerm::LiteralDatatype(_, datatype) => check_iri(datatype.as_str()),
        SimpleTerm::BlankNode(_) | SimpleTerm::LiteralLanguage(..) => Ok(()),
        SimpleTerm::Triple(_) => Err(RdfError::UnsupportedTerm("quoted triple".into())),
        SimpleTerm::Variable(name) => Err(RdfError::UnsupportedTerm(format!(
            "variable ?{}",
            name.as_str()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::graph::Triple;
    use crate::term::{blank, iri, literal, tagged_literal, typed_literal};

    const DESCRIPTION: &str = "http://purl.org/dc/terms/description";
    const TITLE: &str = "http://purl.org/dc/terms/title";

    fn st(subject: Term, predicate: &str, object: Term) -> Triple {
        [subject, iri(predicate), object]
    }

    fn sample() -> Graph {
        let s = iri("info:fedora/test:1");
        [
            st(s.clone(), TITLE, literal("Hello")),
            st(
                s.clone(),
                DESCRIPTION,
                tagged_literal("Bonjour", "fr").unwrap(),
            ),
            st(
                s,
                "http://purl.org/dc/terms/extent",
                typed_literal("12", "http://www.w3.org/2001/XMLSchema#integer"),
            ),
        ]
        .into_iter()
        .collect()
    }

    // -----------------------------------------------------------------------
    // Parsing
    // -----------------------------------------------------------------------

    #[test]
    fn parse_ntriples() {
        let nt = "<info:fedora/test:1> <http://purl.org/dc/terms/title> \"Hello\" .\n";
        let g = parse_str(nt, SerializationFormat::NTriples).unwrap();
        assert_eq!(g.len(), 1);
        assert!(g.has(&iri("info:fedora/test:1"), TITLE, &literal("Hello")));
    }

    #[test]
    fn parse_turtle_with_prefixes() {
        let ttl = "@prefix dc: <http://purl.org/dc/terms/> .\n<urn:x:1> dc:title \"T\"@en .\n";
        let g = parse_str(ttl, SerializationFormat::Turtle).unwrap();
        assert_eq!(
            g.objects_of(&iri("urn:x:1"), TITLE),
            vec![tagged_literal("T", "en").unwrap()]
        );
    }

    #[test]
    fn blank_input_is_empty_graph() {
        for format in SerializationFormat::ALL {
            assert!(parse_str("  \n", format).unwrap().is_empty());
            assert_eq!(serialize(&Graph::new(), format).unwrap(), "");
        }
    }

    #[test]
    fn malformed_input_is_rejected() {
        assert!(matches!(
            parse_str("<urn:x> <urn:p> .", SerializationFormat::NTriples),
            Err(RdfError::Malformed(_))
        ));
    }

    // -----------------------------------------------------------------------
    // Encoding
    // -----------------------------------------------------------------------

    #[test]
    fn raw_multibyte_bytes_match_utf8_literal() {
        let raw: &[u8] = b"<info:fedora/scholarsphere:qv33rx50r> <http://purl.org/dc/terms/description> \"\\n\xE2\x80\x99 \" .\n";
        let from_bytes = parse_bytes(raw, SerializationFormat::NTriples).unwrap();
        let from_text = parse_str(
            "<info:fedora/scholarsphere:qv33rx50r> <http://purl.org/dc/terms/description> \"\\n\u{2019} \" .\n",
            SerializationFormat::NTriples,
        )
        .unwrap();
        assert_eq!(from_bytes, from_text);
        assert_eq!(
            from_bytes.objects_of(&iri("info:fedora/scholarsphere:qv33rx50r"), DESCRIPTION),
            vec![literal("\n\u{2019} ")]
        );
    }

    #[test]
    fn invalid_utf8_reports_offset() {
        let raw: &[u8] = b"<urn:x> <urn:p> \"\xC3\x28\" .\n";
        match parse_bytes(raw, SerializationFormat::NTriples) {
            Err(RdfError::Encoding { offset, .. }) => assert_eq!(offset, 17),
            other => panic!("expected encoding error, got {other:?}"),
        }
    }

    // -----------------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------------

    #[test]
    fn round_trip_every_format() {
        let graph = sample();
        for format in SerializationFormat::ALL {
            let text = serialize(&graph, format).unwrap();
            assert_eq!(parse_str(&text, format).unwrap(), graph, "format {format}");
        }
    }

    #[test]
    fn serialization_is_deterministic() {
        let a = serialize(&sample(), SerializationFormat::NTriples).unwrap();
        let b = serialize(&sample(), SerializationFormat::NTriples).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn relative_iris_are_refused() {
        let graph: Graph = [st(iri("items"), TITLE, literal("Hello"))]
            .into_iter()
            .collect();
        for format in SerializationFormat::ALL {
            assert_eq!(
                serialize(&graph, format),
                Err(RdfError::InvalidIri("items".into()))
            );
        }
        let typed: Graph = [st(iri("urn:x"), TITLE, typed_literal("1", "integer"))]
            .into_iter()
            .collect();
        assert!(matches!(
            serialize(&typed, SerializationFormat::NTriples),
            Err(RdfError::InvalidIri(_))
        ));
    }

    #[test]
    fn blank_subjects_serialize() {
        let graph: Graph = [st(blank("b0"), TITLE, literal("x"))].into_iter().collect();
        let text = serialize(&graph, SerializationFormat::NTriples).unwrap();
        assert_eq!(parse_str(&text, SerializationFormat::NTriples).unwrap().len(), 1);
    }

    fn arb_statement() -> impl Strategy<Value = Triple> {
        let subject = (0u8..4).prop_map(|n| iri(format!("http://example.org/item/{n}")));
        let predicate = prop::sample::select(vec![
            TITLE,
            DESCRIPTION,
            "http://purl.org/dc/terms/creator",
        ]);
        let object = prop_oneof![
            "[a-zA-Z0-9 .,!?'\u{e9}\u{2019}]{0,16}".prop_map(|s: String| literal(s)),
            ("[a-z]{1,8}", prop::sample::select(vec!["en", "fr", "de"]))
                .prop_map(|(lex, lang)| tagged_literal(lex, lang).unwrap()),
            (0u8..4).prop_map(|n| iri(format!("http://example.org/item/{n}"))),
        ];
        (subject, predicate, object).prop_map(|(s, p, o)| st(s, p, o))
    }

    proptest! {
        #[test]
        fn ntriples_round_trip(statements in prop::collection::vec(arb_statement(), 0..12)) {
            let graph: Graph = statements.into_iter().collect();
            let text = serialize(&graph, SerializationFormat::NTriples).unwrap();
            prop_assert_eq!(parse_str(&text, SerializationFormat::NTriples).unwrap(), graph);
        }

        #[test]
        fn turtle_round_trip(statements in prop::collection::vec(arb_statement(), 0..12)) {
            let graph: Graph = statements.into_iter().collect();
            let text = serialize(&graph, SerializationFormat::Turtle).unwrap();
            prop_assert_eq!(parse_str(&text, SerializationFormat::Turtle).unwrap(), graph);
        }
    }
}

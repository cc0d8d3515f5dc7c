//! Constructors and accessors for the owned terms stored in a [`Graph`].
//!
//! [`Graph`]: crate::Graph

use sophia_api::term::{BnodeId, IriRef, LanguageTag, SimpleTerm};
use sophia_api::MownStr;

use crate::error::{RdfError, RdfResult};

/// An owned RDF term.
pub type Term = SimpleTerm<'static>;

/// `xsd:string`, the implicit datatype of plain literals.
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

fn owned(text: impl Into<String>) -> MownStr<'static> {
    MownStr::from(text.into())
}

/// An IRI term. `iri` must be a valid IRI reference; debug builds panic
/// otherwise. Relative references are accepted here and refused when
/// serializing.
pub fn iri(iri: impl Into<String>) -> Term {
    SimpleTerm::Iri(IriRef::new_unchecked(owned(iri)))
}

pub fn blank(label: impl Into<String>) -> Term {
    SimpleTerm::BlankNode(BnodeId::new_unchecked(owned(label)))
}

/// A plain string literal.
pub fn literal(lexical: impl Into<String>) -> Term {
    typed_literal(lexical, XSD_STRING)
}

pub fn typed_literal(lexical: impl Into<String>, datatype: impl Into<String>) -> Term {
    SimpleTerm::LiteralDatatype(owned(lexical), IriRef::new_unchecked(owned(datatype)))
}

/// A language-tagged literal. Tags are stored lowercased.
pub fn tagged_literal(
    lexical: impl Into<String>,
    language: impl Into<String>,
) -> RdfResult<Term> {
    let language = language.into().to_ascii_lowercase();
    let tag = LanguageTag::new(owned(language))
        .map_err(|e| RdfError::InvalidLanguageTag(e.0))?;
    Ok(SimpleTerm::LiteralLanguage(owned(lexical), tag))
}

pub fn as_iri(term: &Term) -> Option<&str> {
    match term {
        SimpleTerm::Iri(iri) => Some(iri.as_str()),
        _ => None,
    }
}

/// The IRI, blank label, lexical form or variable name. Quoted triples
/// have none.
pub fn value(term: &Term) -> &str {
    match term {
        SimpleTerm::Iri(iri) => iri.as_str(),
        SimpleTerm::BlankNode(id) => id.as_str(),
        SimpleTerm::LiteralDatatype(lexical, _) | SimpleTerm::LiteralLanguage(lexical, _) => {
            &**lexical
        }
        SimpleTerm::Variable(name) => name.as_str(),
        SimpleTerm::Triple(_) => "",
    }
}

/// Values accepted as statement objects. Strings become plain literals.
pub trait IntoObject {
    fn into_object(self) -> Term;
}

impl IntoObject for Term {
    fn into_object(self) -> Term {
        self
    }
}

impl IntoObject for &str {
    fn into_object(self) -> Term {
        literal(self)
    }
}

impl IntoObject for String {
    fn into_object(self) -> Term {
        literal(self)
    }
}

impl IntoObject for &String {
    fn into_object(self) -> Term {
        literal(self.as_str())
    }
}

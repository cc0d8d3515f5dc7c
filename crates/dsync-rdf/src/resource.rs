use tracing::debug;

use crate::graph::Graph;
use crate::term::{self, IntoObject, Term};

/// Blank label standing in for a subject that has not been resolved yet.
pub const PENDING_SUBJECT_LABEL: &str = "dsync-pending-subject";

/// The "this document is about" node of a graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PrimarySubject {
    /// A blank placeholder, awaiting an address to derive an IRI from.
    Unresolved,
    /// A permanent IRI.
    Resolved(String),
}

impl PrimarySubject {
    pub fn term(&self) -> Term {
        match self {
            Self::Unresolved => term::blank(PENDING_SUBJECT_LABEL),
            Self::Resolved(iri) => term::iri(iri.clone()),
        }
    }

    pub fn iri(&self) -> Option<&str> {
        match self {
            Self::Unresolved => None,
            Self::Resolved(iri) => Some(iri),
        }
    }
}

/// A graph anchored on one primary subject.
///
/// Field accessors take a predicate IRI and act on statements whose subject
/// is the primary subject.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RdfResource {
    graph: Graph,
    subject: PrimarySubject,
}

impl RdfResource {
    /// An empty graph with an unresolved subject.
    pub fn new() -> Self {
        Self::from_graph(Graph::new())
    }

    /// An empty graph anchored on `iri`.
    pub fn with_subject(iri: impl Into<String>) -> Self {
        Self {
            graph: Graph::new(),
            subject: PrimarySubject::Resolved(iri.into()),
        }
    }

    /// Wrap a parsed graph. The subject stays unresolved until it is set,
    /// derived, or adopted.
    pub fn from_graph(graph: Graph) -> Self {
        Self {
            graph,
            subject: PrimarySubject::Unresolved,
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub fn into_graph(self) -> Graph {
        self.graph
    }

    pub fn subject(&self) -> &PrimarySubject {
        &self.subject
    }

    pub fn subject_term(&self) -> Term {
        self.subject.term()
    }

    pub fn is_subject_pending(&self) -> bool {
        self.subject == PrimarySubject::Unresolved
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    /// Anchor the graph on `iri`, rewriting statements on the previous
    /// subject. Returns `false` if `iri` already is the subject.
    pub fn set_subject(&mut self, iri: impl Into<String>) -> bool {
        let iri = iri.into();
        if self.subject.iri() == Some(iri.as_str()) {
            return false;
        }
        let old = self.subject.term();
        let moved = self.graph.rename_subject(&old, &term::iri(iri.clone()));
        debug!(subject = %iri, moved, "anchored graph subject");
        self.subject = PrimarySubject::Resolved(iri);
        true
    }

    /// Make the graph's only IRI subject the primary subject. No-op unless
    /// the subject is pending and exactly one IRI subject exists.
    pub fn adopt_sole_subject(&mut self) -> bool {
        if !self.is_subject_pending() {
            return false;
        }
        let only = {
            let mut iris = self.graph.subject_terms().into_iter().filter_map(term::as_iri);
            match (iris.next(), iris.next()) {
                (Some(only), None) => only.to_string(),
                _ => return false,
            }
        };
        self.set_subject(only)
    }

    /// Objects for `predicate` on the primary subject.
    pub fn get_values(&self, predicate: &str) -> Vec<Term> {
        self.graph.objects_of(&self.subject_term(), predicate)
    }

    /// Replace all values for `predicate`.
    pub fn set_values<I, T>(&mut self, predicate: &str, values: I)
    where
        I: IntoIterator<Item = T>,
        T: IntoObject,
    {
        let subject = self.subject_term();
        self.graph.remove_objects(&subject, predicate);
        for value in values {
            self.graph.add(&subject, predicate, value.into_object());
        }
    }

    /// Add one value for `predicate`. Returns `false` if it was present.
    pub fn append_value(&mut self, predicate: &str, value: impl IntoObject) -> bool {
        let subject = self.subject_term();
        self.graph.add(&subject, predicate, value.into_object())
    }

    /// Remove all values for `predicate`. Returns the number removed.
    pub fn clear_values(&mut self, predicate: &str) -> usize {
        self.graph.remove_objects(&self.subject_term(), predicate)
    }

    /// Drop every statement, keeping the subject.
    pub fn clear(&mut self) {
        self.graph.clear();
    }
}

impl Default for RdfResource {
    fn default() -> Self {
        Self::new()
    }
}

use std::collections::BTreeSet;
use std::convert::Infallible;

use sophia_api::graph::{
    CollectibleGraph, GTripleSource, Graph as SophiaGraph, MgResult, MutableGraph,
};
use sophia_api::source::{StreamResult, TripleSource};
use sophia_api::term::matcher::Any;
use sophia_api::term::{IriRef, Term as SophiaTerm};

use crate::term::Term;

/// A subject-predicate-object statement.
pub type Triple = [Term; 3];

/// A set of statements, backed by sophia's ordered set graph. Duplicates
/// collapse and iteration follows term order, so serialization is
/// deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Graph {
    triples: BTreeSet<Triple>,
}

fn ok<T>(result: Result<T, Infallible>) -> T {
    match result {
        Ok(value) => value,
        Err(never) => match never {},
    }
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn clear(&mut self) {
        self.triples.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    /// Add one statement. Returns `false` if it was present.
    pub fn add(&mut self, subject: &Term, predicate: &str, object: Term) -> bool {
        ok(MutableGraph::insert(
            &mut self.triples,
            subject,
            IriRef::new_unchecked(predicate),
            object,
        ))
    }

    pub fn has(&self, subject: &Term, predicate: &str, object: &Term) -> bool {
        ok(SophiaGraph::contains(
            &self.triples,
            subject,
            IriRef::new_unchecked(predicate),
            object,
        ))
    }

    /// Objects of every statement matching `subject` and `predicate`, in
    /// term order.
    pub fn objects_of(&self, subject: &Term, predicate: &str) -> Vec<Term> {
        SophiaGraph::triples_matching(
            &self.triples,
            [subject],
            [IriRef::new_unchecked(predicate)],
            Any,
        )
        .map(|triple| {
            let [_, _, object] = ok(triple);
            object.clone()
        })
        .collect()
    }

    /// Remove every statement matching `subject` and `predicate`. Returns the
    /// number removed.
    pub fn remove_objects(&mut self, subject: &Term, predicate: &str) -> usize {
        ok(MutableGraph::remove_matching(
            &mut self.triples,
            [subject],
            [IriRef::new_unchecked(predicate)],
            Any,
        ))
    }

    /// Distinct subjects, in term order.
    pub fn subject_terms(&self) -> BTreeSet<&Term> {
        self.triples.iter().map(|[s, _, _]| s).collect()
    }

    /// Rewrite every statement whose subject is `from` to use `to`. Objects
    /// are left alone. Returns the number of statements rewritten.
    pub fn rename_subject(&mut self, from: &Term, to: &Term) -> usize {
        if from == to {
            return 0;
        }
        let moved: Vec<Triple> = SophiaGraph::triples_matching(&self.triples, [from], Any, Any)
            .map(|triple| ok(triple).map(|term| term.clone()))
            .collect();
        for [s, p, o] in &moved {
            ok(MutableGraph::remove(&mut self.triples, s, p, o));
            ok(MutableGraph::insert(&mut self.triples, to, p, o));
        }
        moved.len()
    }
}

impl SophiaGraph for Graph {
    type Triple<'x> = [&'x Term; 3] where Self: 'x;
    type Error = Infallible;

    fn triples(&self) -> GTripleSource<Self> {
        self.triples.triples()
    }
}

impl MutableGraph for Graph {
    type MutationError = Infallible;

    fn insert<TS, TP, TO>(&mut self, s: TS, p: TP, o: TO) -> MgResult<Self, bool>
    where
        TS: SophiaTerm,
        TP: SophiaTerm,
        TO: SophiaTerm,
    {
        MutableGraph::insert(&mut self.triples, s, p, o)
    }

    fn remove<TS, TP, TO>(&mut self, s: TS, p: TP, o: TO) -> MgResult<Self, bool>
    where
        TS: SophiaTerm,
        TP: SophiaTerm,
        TO: SophiaTerm,
    {
        MutableGraph::remove(&mut self.triples, s, p, o)
    }
}

impl CollectibleGraph for Graph {
    fn from_triple_source<TS: TripleSource>(
        triples: TS,
    ) -> StreamResult<Self, TS::Error, Self::Error> {
        BTreeSet::<Triple>::from_triple_source(triples).map(|triples| Self { triples })
    }
}

impl FromIterator<Triple> for Graph {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        Self {
            triples: iter.into_iter().collect(),
        }
    }
}

impl Extend<Triple> for Graph {
    fn extend<I: IntoIterator<Item = Triple>>(&mut self, iter: I) {
        self.triples.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::{blank, iri, literal, value};

    const TITLE: &str = "http://purl.org/dc/terms/title";
    const CREATOR: &str = "http://purl.org/dc/terms/creator";

    fn s() -> Term {
        iri("info:fedora/test:1")
    }

    fn st(subject: Term, predicate: &str, object: Term) -> Triple {
        [subject, iri(predicate), object]
    }

    #[test]
    fn duplicates_collapse() {
        let mut g = Graph::new();
        assert!(g.add(&s(), TITLE, literal("a")));
        assert!(!g.add(&s(), TITLE, literal("a")));
        assert_eq!(g.len(), 1);
        assert!(g.has(&s(), TITLE, &literal("a")));
    }

    #[test]
    fn objects_filter_by_subject_and_predicate() {
        let g: Graph = [
            st(s(), TITLE, literal("b")),
            st(s(), TITLE, literal("a")),
            st(s(), CREATOR, literal("c")),
            st(iri("urn:other"), TITLE, literal("d")),
        ]
        .into_iter()
        .collect();
        let titles: Vec<String> = g
            .objects_of(&s(), TITLE)
            .iter()
            .map(|t| value(t).to_string())
            .collect();
        assert_eq!(titles, vec!["a", "b"]);
    }

    #[test]
    fn remove_objects_counts() {
        let mut g: Graph = [
            st(s(), TITLE, literal("a")),
            st(s(), TITLE, literal("b")),
            st(s(), CREATOR, literal("c")),
        ]
        .into_iter()
        .collect();
        assert_eq!(g.remove_objects(&s(), TITLE), 2);
        assert_eq!(g.len(), 1);
        assert_eq!(g.remove_objects(&s(), TITLE), 0);
    }

    #[test]
    fn rename_subject_moves_statements() {
        let pending = blank("pending");
        let mut g: Graph = [
            st(pending.clone(), TITLE, literal("a")),
            st(iri("urn:other"), TITLE, pending.clone()),
        ]
        .into_iter()
        .collect();
        assert_eq!(g.rename_subject(&pending, &s()), 1);
        assert!(g.has(&s(), TITLE, &literal("a")));
        // Objects are left alone.
        assert!(g.has(&iri("urn:other"), TITLE, &pending));
    }

    #[test]
    fn subjects_are_distinct() {
        let g: Graph = [st(s(), TITLE, literal("a")), st(s(), CREATOR, literal("b"))]
            .into_iter()
            .collect();
        assert_eq!(g.subject_terms().len(), 1);
    }

    #[test]
    fn usable_through_sophia_traits() {
        let mut g = Graph::new();
        assert!(MutableGraph::insert(&mut g, &s(), &iri(TITLE), &literal("a")).unwrap());
        assert_eq!(SophiaGraph::triples(&g).count(), 1);
        assert!(SophiaGraph::contains(&g, &s(), &iri(TITLE), &literal("a")).unwrap());
    }
}

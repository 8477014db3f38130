//! SHACL property paths.
//!
//! Implements the [property paths](https://www.w3.org/TR/shacl/#property-paths) of SHACL:
//! - Predicate path (an IRI, possibly traversed backwards)
//! - Sequence path (an RDF list of paths)
//! - Alternative path (`sh:alternativePath`)
//! - Inverse path (`sh:inversePath`)
//! - Zero-or-more path (`sh:zeroOrMorePath`)
//! - One-or-more path (`sh:oneOrMorePath`)
//! - Zero-or-one path (`sh:zeroOrOnePath`)

use oxrdf::vocab::rdf;
use oxrdf::{BlankNode, BlankNodeRef, Graph, NamedNode, Term, TermRef};
use rustc_hash::FxHashSet;
use std::fmt;

use crate::error::ShapeParseError;
use crate::list::{DEFAULT_MAX_LIST_LENGTH, decode_list_with_limit, is_list_node};
use crate::vocab::shacl;

/// A SHACL property path.
///
/// Inversion is pushed down to the predicates when an [`Inverse`](Self::Inverse) path is built:
/// its operand already carries the flipped direction so that resolving it needs no special case.
///
/// ```
/// use oxrdf::{Graph, NamedNode, Term, Triple};
/// use oxshacl::PropertyPath;
///
/// let a = NamedNode::new("http://example.com/a")?;
/// let b = NamedNode::new("http://example.com/b")?;
/// let p = NamedNode::new("http://example.com/p")?;
/// let mut graph = Graph::new();
/// graph.insert(&Triple::new(a.clone(), p.clone(), b.clone()));
///
/// let path = PropertyPath::inverse(PropertyPath::predicate(p));
/// assert_eq!(path.to_string(), "^<http://example.com/p>");
/// assert!(path.resolve(&graph, b.as_ref().into()).contains(&Term::from(a)));
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyPath {
    /// A predicate, traversed from subject to object or, if `inverse` is set, from object to
    /// subject.
    Predicate { predicate: NamedNode, inverse: bool },

    /// A sequence of paths (executed in order).
    Sequence(Vec<PropertyPath>),

    /// Alternative paths, the first one returning values wins.
    Alternative(Vec<PropertyPath>),

    /// Inverse path. The operand has already been inverted.
    ///
    /// Resolving it resolves the operand as is, so it may only be built with
    /// [`PropertyPath::inverse`]:
    ///
    /// ```compile_fail
    /// use oxrdf::NamedNode;
    /// use oxshacl::PropertyPath;
    ///
    /// let p = PropertyPath::predicate(NamedNode::new_unchecked("http://example.com/p"));
    /// let _ = PropertyPath::Inverse(Box::new(p));
    /// ```
    #[non_exhaustive]
    Inverse(Box<PropertyPath>),

    /// Zero or more repetitions of the path.
    ZeroOrMore(Box<PropertyPath>),

    /// One or more repetitions of the path.
    OneOrMore(Box<PropertyPath>),

    /// Zero or one occurrence of the path.
    ZeroOrOne(Box<PropertyPath>),
}

impl PropertyPath {
    /// Creates a predicate path from a named node.
    pub fn predicate(predicate: impl Into<NamedNode>) -> Self {
        Self::Predicate {
            predicate: predicate.into(),
            inverse: false,
        }
    }

    /// Creates a sequence path from a list of paths.
    pub fn sequence(paths: Vec<PropertyPath>) -> Self {
        Self::Sequence(paths)
    }

    /// Creates an alternative path from a list of paths.
    pub fn alternative(paths: Vec<PropertyPath>) -> Self {
        Self::Alternative(paths)
    }

    /// Creates an inverse path, flipping the direction of every predicate of `path`.
    pub fn inverse(path: PropertyPath) -> Self {
        Self::Inverse(Box::new(path.inverted()))
    }

    /// Creates a zero-or-more path.
    pub fn zero_or_more(path: PropertyPath) -> Self {
        Self::ZeroOrMore(Box::new(path))
    }

    /// Creates a one-or-more path.
    pub fn one_or_more(path: PropertyPath) -> Self {
        Self::OneOrMore(Box::new(path))
    }

    /// Creates a zero-or-one path.
    pub fn zero_or_one(path: PropertyPath) -> Self {
        Self::ZeroOrOne(Box::new(path))
    }

    /// Returns the path that traverses the same edges in the other direction.
    ///
    /// The order of sequences is reversed: `^(a / b)` is `^b / ^a`.
    #[must_use]
    pub fn inverted(&self) -> Self {
        match self {
            Self::Predicate { predicate, inverse } => Self::Predicate {
                predicate: predicate.clone(),
                inverse: !inverse,
            },
            Self::Sequence(paths) => {
                Self::Sequence(paths.iter().rev().map(Self::inverted).collect())
            }
            Self::Alternative(paths) => {
                Self::Alternative(paths.iter().map(Self::inverted).collect())
            }
            Self::Inverse(inner) => Self::Inverse(Box::new(inner.inverted())),
            Self::ZeroOrMore(inner) => Self::ZeroOrMore(Box::new(inner.inverted())),
            Self::OneOrMore(inner) => Self::OneOrMore(Box::new(inner.inverted())),
            Self::ZeroOrOne(inner) => Self::ZeroOrOne(Box::new(inner.inverted())),
        }
    }

    /// Parses a property path from its node in an RDF graph.
    pub fn parse(graph: &Graph, term: TermRef<'_>) -> Result<Self, ShapeParseError> {
        Self::parse_with_limit(graph, term, DEFAULT_MAX_LIST_LENGTH)
    }

    pub(crate) fn parse_with_limit(
        graph: &Graph,
        term: TermRef<'_>,
        max_list_length: usize,
    ) -> Result<Self, ShapeParseError> {
        PathParser {
            graph,
            max_list_length,
            active: FxHashSet::default(),
        }
        .parse(term)
    }

    /// Returns the set of value nodes reached from `focus_node` by following the path.
    pub fn resolve(&self, graph: &Graph, focus_node: TermRef<'_>) -> FxHashSet<Term> {
        match self {
            Self::Predicate {
                predicate,
                inverse: false,
            } => match focus_node {
                TermRef::NamedNode(subject) => graph
                    .objects_for_subject_predicate(subject, predicate)
                    .map(TermRef::into_owned)
                    .collect(),
                TermRef::BlankNode(subject) => graph
                    .objects_for_subject_predicate(subject, predicate)
                    .map(TermRef::into_owned)
                    .collect(),
                _ => FxHashSet::default(),
            },
            Self::Predicate {
                predicate,
                inverse: true,
            } => graph
                .subjects_for_predicate_object(predicate, focus_node)
                .map(|subject| subject.into_owned().into())
                .collect(),
            Self::Sequence(paths) => {
                let mut current: FxHashSet<Term> = [focus_node.into_owned()].into_iter().collect();
                for path in paths {
                    current = current
                        .iter()
                        .flat_map(|node| path.resolve(graph, node.as_ref()))
                        .collect();
                }
                current
            }
            Self::Alternative(paths) => paths
                .iter()
                .map(|path| path.resolve(graph, focus_node))
                .find(|values| !values.is_empty())
                .unwrap_or_default(),
            Self::Inverse(inner) => inner.resolve(graph, focus_node),
            Self::ZeroOrMore(inner) => {
                transitive_closure([focus_node.into_owned()], |node| {
                    inner.resolve(graph, node.as_ref())
                })
            }
            Self::OneOrMore(inner) => transitive_closure(inner.resolve(graph, focus_node), |node| {
                inner.resolve(graph, node.as_ref())
            }),
            Self::ZeroOrOne(inner) => {
                let mut values = inner.resolve(graph, focus_node);
                values.insert(focus_node.into_owned());
                values
            }
        }
    }

    /// Returns true if this is a simple predicate path.
    pub fn is_predicate(&self) -> bool {
        matches!(self, Self::Predicate { inverse: false, .. })
    }

    /// Returns the predicate if this is a simple predicate path.
    pub fn as_predicate(&self) -> Option<&NamedNode> {
        match self {
            Self::Predicate {
                predicate,
                inverse: false,
            } => Some(predicate),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Predicate { predicate, inverse } => {
                if *inverse {
                    write!(f, "^")?;
                }
                write!(f, "{predicate}")
            }
            Self::Sequence(paths) => write_list(f, paths, " / "),
            Self::Alternative(paths) => write_list(f, paths, " | "),
            Self::Inverse(inner) => write!(f, "{inner}"),
            Self::ZeroOrMore(inner) => write!(f, "{inner}*"),
            Self::OneOrMore(inner) => write!(f, "{inner}+"),
            Self::ZeroOrOne(inner) => write!(f, "{inner}?"),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, paths: &[PropertyPath], separator: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, path) in paths.iter().enumerate() {
        if i > 0 {
            write!(f, "{separator}")?;
        }
        write!(f, "{path}")?;
    }
    write!(f, ")")
}

/// Computes the closure of `start` under `next`.
///
/// Each node is expanded at most once, so the computation terminates on cyclic graphs.
fn transitive_closure(
    start: impl IntoIterator<Item = Term>,
    mut next: impl FnMut(&Term) -> FxHashSet<Term>,
) -> FxHashSet<Term> {
    let mut todo = start.into_iter().collect::<Vec<_>>();
    let mut all = todo.iter().cloned().collect::<FxHashSet<_>>();
    while let Some(e) = todo.pop() {
        for e in next(&e) {
            if all.insert(e.clone()) {
                todo.push(e);
            }
        }
    }
    all
}

struct PathParser<'a> {
    graph: &'a Graph,
    max_list_length: usize,
    /// Path nodes currently being parsed, to reject self-referencing paths.
    active: FxHashSet<BlankNode>,
}

impl PathParser<'_> {
    fn parse(&mut self, term: TermRef<'_>) -> Result<PropertyPath, ShapeParseError> {
        match term {
            TermRef::NamedNode(node) if node == rdf::NIL => Err(ShapeParseError::malformed_path(
                node.into_owned(),
                "a sequence path needs at least two paths",
            )),
            TermRef::NamedNode(node) if is_list_node(self.graph, term) => {
                Err(ShapeParseError::malformed_path(
                    node.into_owned(),
                    "a sequence path must be a blank node",
                ))
            }
            TermRef::NamedNode(node) => Ok(PropertyPath::predicate(node)),
            TermRef::BlankNode(node) => {
                if !self.active.insert(node.into_owned()) {
                    return Err(ShapeParseError::malformed_path(
                        node.into_owned(),
                        "the path contains itself",
                    ));
                }
                let path = self.parse_blank_node(node);
                self.active.remove(&node.into_owned());
                path
            }
            _ => Err(ShapeParseError::malformed_path(
                term.into_owned(),
                "a property path must be an IRI or a blank node",
            )),
        }
    }

    fn parse_blank_node(
        &mut self,
        node: BlankNodeRef<'_>,
    ) -> Result<PropertyPath, ShapeParseError> {
        let graph = self.graph;

        if let Some(list_head) =
            graph.object_for_subject_predicate(node, shacl::ALTERNATIVE_PATH)
        {
            let paths = self.parse_list(node, list_head)?;
            if paths.len() < 2 {
                return Err(ShapeParseError::malformed_path(
                    node.into_owned(),
                    "sh:alternativePath needs at least two paths",
                ));
            }
            return Ok(PropertyPath::Alternative(paths));
        }

        if let Some(inner) = graph.object_for_subject_predicate(node, shacl::INVERSE_PATH) {
            return Ok(PropertyPath::inverse(self.parse(inner)?));
        }

        if let Some(inner) = graph.object_for_subject_predicate(node, shacl::ZERO_OR_MORE_PATH) {
            return Ok(PropertyPath::zero_or_more(self.parse(inner)?));
        }

        if let Some(inner) = graph.object_for_subject_predicate(node, shacl::ONE_OR_MORE_PATH) {
            return Ok(PropertyPath::one_or_more(self.parse(inner)?));
        }

        if let Some(inner) = graph.object_for_subject_predicate(node, shacl::ZERO_OR_ONE_PATH) {
            return Ok(PropertyPath::zero_or_one(self.parse(inner)?));
        }

        if is_list_node(graph, node.into()) {
            let paths = self.parse_list(node, node.into())?;
            if paths.len() < 2 {
                return Err(ShapeParseError::malformed_path(
                    node.into_owned(),
                    "a sequence path needs at least two paths",
                ));
            }
            return Ok(PropertyPath::Sequence(paths));
        }

        Err(ShapeParseError::malformed_path(
            node.into_owned(),
            "unknown property path structure",
        ))
    }

    fn parse_list(
        &mut self,
        node: BlankNodeRef<'_>,
        list_head: TermRef<'_>,
    ) -> Result<Vec<PropertyPath>, ShapeParseError> {
        decode_list_with_limit(self.graph, list_head, self.max_list_length)
            .map_err(|e| ShapeParseError::malformed_path(node.into_owned(), e.to_string()))?
            .iter()
            .map(|element| self.parse(element.as_ref()))
            .collect()
    }
}

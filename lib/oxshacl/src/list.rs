//! Decoding of RDF collections (`rdf:first`/`rdf:rest` chains terminated by `rdf:nil`).

use oxrdf::vocab::rdf;
use oxrdf::{Graph, NamedOrBlankNodeRef, Term, TermRef};
use rustc_hash::FxHashSet;

use crate::error::RdfListError;

/// Default bound on the number of elements of a decoded list.
pub const DEFAULT_MAX_LIST_LENGTH: usize = 65_536;

/// Decodes the RDF list starting at `head` into its ordered elements.
///
/// ```
/// use oxrdf::Graph;
/// use oxrdfio::{RdfFormat, RdfParser};
/// use oxshacl::list::decode_list;
///
/// let mut graph = Graph::new();
/// for quad in RdfParser::from_format(RdfFormat::Turtle)
///     .for_reader(b"<http://example.com/s> <http://example.com/p> (1 2 3) .".as_slice())
/// {
///     graph.insert(quad?.as_ref());
/// }
/// let head = graph
///     .iter()
///     .find(|t| t.predicate.as_str() == "http://example.com/p")
///     .map(|t| t.object)
///     .unwrap();
/// let elements = decode_list(&graph, head)?;
/// assert_eq!(elements.len(), 3);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
pub fn decode_list<'a>(graph: &'a Graph, head: TermRef<'a>) -> Result<Vec<Term>, RdfListError> {
    decode_list_with_limit(graph, head, DEFAULT_MAX_LIST_LENGTH)
}

/// Same as [`decode_list`] with an explicit bound on the list length.
pub fn decode_list_with_limit<'a>(
    graph: &'a Graph,
    head: TermRef<'a>,
    max_length: usize,
) -> Result<Vec<Term>, RdfListError> {
    let mut current = match head {
        TermRef::NamedNode(node) => NamedOrBlankNodeRef::from(node),
        TermRef::BlankNode(node) => NamedOrBlankNodeRef::from(node),
        _ => {
            return Err(RdfListError::NotAList {
                node: head.into_owned(),
            });
        }
    };
    let mut elements = Vec::new();
    let mut visited = FxHashSet::default();
    loop {
        if current == NamedOrBlankNodeRef::NamedNode(rdf::NIL) {
            return Ok(elements);
        }
        if !visited.insert(current) {
            return Err(RdfListError::Cycle {
                node: current.into_owned(),
            });
        }
        if elements.len() >= max_length {
            return Err(RdfListError::TooLong { limit: max_length });
        }

        let mut firsts = graph.objects_for_subject_predicate(current, rdf::FIRST);
        let Some(first) = firsts.next() else {
            return Err(RdfListError::MissingFirst {
                node: current.into_owned(),
            });
        };
        if firsts.next().is_some() {
            return Err(RdfListError::MultipleFirst {
                node: current.into_owned(),
            });
        }
        elements.push(first.into_owned());

        current = match graph.object_for_subject_predicate(current, rdf::REST) {
            Some(TermRef::NamedNode(node)) => node.into(),
            Some(TermRef::BlankNode(node)) => node.into(),
            Some(rest) => {
                return Err(RdfListError::InvalidRest {
                    node: current.into_owned(),
                    rest: rest.into_owned(),
                });
            }
            None => {
                return Err(RdfListError::MissingRest {
                    node: current.into_owned(),
                });
            }
        };
    }
}

/// Returns true if `term` is a list node, i.e. has an `rdf:first`.
pub(crate) fn is_list_node(graph: &Graph, term: TermRef<'_>) -> bool {
    match term {
        TermRef::NamedNode(node) => graph.object_for_subject_predicate(node, rdf::FIRST),
        TermRef::BlankNode(node) => graph.object_for_subject_predicate(node, rdf::FIRST),
        _ => None,
    }
    .is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::{BlankNode, Literal, NamedNode, Triple};

    fn build_list(graph: &mut Graph, items: &[Term]) -> Term {
        let mut head = Term::from(rdf::NIL.into_owned());
        for item in items.iter().rev() {
            let node = BlankNode::default();
            graph.insert(&Triple::new(node.clone(), rdf::FIRST, item.clone()));
            graph.insert(&Triple::new(node.clone(), rdf::REST, head));
            head = node.into();
        }
        head
    }

    fn items(count: usize) -> Vec<Term> {
        (0..count)
            .map(|i| Literal::from(i64::try_from(i).unwrap()).into())
            .collect()
    }

    #[test]
    fn decodes_in_order() {
        let mut graph = Graph::new();
        let expected = items(4);
        let head = build_list(&mut graph, &expected);
        assert_eq!(decode_list(&graph, head.as_ref()).unwrap(), expected);
    }

    #[test]
    fn nil_is_the_empty_list() {
        let graph = Graph::new();
        assert!(decode_list(&graph, rdf::NIL.into()).unwrap().is_empty());
    }

    #[test]
    fn literal_rest_is_rejected() {
        let mut graph = Graph::new();
        let node = BlankNode::default();
        graph.insert(&Triple::new(node.clone(), rdf::FIRST, Literal::from(1)));
        graph.insert(&Triple::new(node.clone(), rdf::REST, Literal::from(2)));
        assert!(matches!(
            decode_list(&graph, node.as_ref().into()),
            Err(RdfListError::InvalidRest { .. })
        ));
    }

    #[test]
    fn rest_to_a_non_list_node_is_rejected() {
        let mut graph = Graph::new();
        let node = BlankNode::default();
        let other = NamedNode::new("http://example.org/other").unwrap();
        graph.insert(&Triple::new(node.clone(), rdf::FIRST, Literal::from(1)));
        graph.insert(&Triple::new(node.clone(), rdf::REST, other));
        assert!(matches!(
            decode_list(&graph, node.as_ref().into()),
            Err(RdfListError::MissingFirst { .. })
        ));
    }

    #[test]
    fn missing_links_are_rejected() {
        let mut graph = Graph::new();
        let no_rest = BlankNode::default();
        graph.insert(&Triple::new(no_rest.clone(), rdf::FIRST, Literal::from(1)));
        assert!(matches!(
            decode_list(&graph, no_rest.as_ref().into()),
            Err(RdfListError::MissingRest { .. })
        ));

        let no_first = BlankNode::default();
        graph.insert(&Triple::new(no_first.clone(), rdf::REST, rdf::NIL));
        assert!(matches!(
            decode_list(&graph, no_first.as_ref().into()),
            Err(RdfListError::MissingFirst { .. })
        ));
    }

    #[test]
    fn ambiguous_first_is_rejected() {
        let mut graph = Graph::new();
        let node = BlankNode::default();
        graph.insert(&Triple::new(node.clone(), rdf::FIRST, Literal::from(1)));
        graph.insert(&Triple::new(node.clone(), rdf::FIRST, Literal::from(2)));
        graph.insert(&Triple::new(node.clone(), rdf::REST, rdf::NIL));
        assert!(matches!(
            decode_list(&graph, node.as_ref().into()),
            Err(RdfListError::MultipleFirst { .. })
        ));
    }

    #[test]
    fn cyclic_list_terminates() {
        let mut graph = Graph::new();
        let a = BlankNode::default();
        let b = BlankNode::default();
        graph.insert(&Triple::new(a.clone(), rdf::FIRST, Literal::from(1)));
        graph.insert(&Triple::new(a.clone(), rdf::REST, b.clone()));
        graph.insert(&Triple::new(b.clone(), rdf::FIRST, Literal::from(2)));
        graph.insert(&Triple::new(b.clone(), rdf::REST, a.clone()));
        assert!(matches!(
            decode_list(&graph, a.as_ref().into()),
            Err(RdfListError::Cycle { .. })
        ));
    }

    #[test]
    fn length_bound() {
        let mut graph = Graph::new();
        let head = build_list(&mut graph, &items(5));
        assert_eq!(
            decode_list_with_limit(&graph, head.as_ref(), 5).unwrap().len(),
            5
        );
        assert!(matches!(
            decode_list_with_limit(&graph, head.as_ref(), 4),
            Err(RdfListError::TooLong { limit: 4 })
        ));
    }

    #[test]
    fn literal_head_is_not_a_list() {
        let graph = Graph::new();
        let head = Term::from(Literal::from(1));
        assert!(matches!(
            decode_list(&graph, head.as_ref()),
            Err(RdfListError::NotAList { .. })
        ));
    }
}

//! Error types for reading shapes graphs.

use oxrdf::{IriParseError, NamedNode, NamedOrBlankNode, Term};
use oxrdfio::RdfParseError;

/// Main error type of the reading entry points that start from a serialized RDF document.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ShapesError {
    /// The shapes graph is not a valid set of shape declarations.
    #[error(transparent)]
    Parse(#[from] ShapeParseError),

    /// The RDF document itself could not be parsed.
    #[error(transparent)]
    Syntax(#[from] RdfParseError),

    /// The requested shape subject is not a valid IRI.
    #[error("Invalid shape subject IRI: {0}")]
    InvalidSubject(#[from] IriParseError),
}

/// Error raised while decoding shapes from an RDF graph.
///
/// Every variant carries the subject (and predicate when relevant) that caused the failure.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ShapeParseError {
    /// A property shape has no `sh:path`.
    #[error("Property shape {shape} has no sh:path")]
    MissingPath { shape: NamedOrBlankNode },

    /// An RDF list used by a collection-valued parameter is malformed.
    #[error("Malformed RDF list for {predicate} on shape {shape}: {source}")]
    MalformedList {
        shape: NamedOrBlankNode,
        predicate: NamedNode,
        #[source]
        source: RdfListError,
    },

    /// A property path node does not match any path variant or has too few operands.
    #[error("Malformed property path {node}: {message}")]
    MalformedPath { node: Term, message: String },

    /// A parameter value does not have the type its constraint expects.
    #[error("Invalid value for {predicate} on shape {shape}: {source}")]
    Coercion {
        shape: NamedOrBlankNode,
        predicate: NamedNode,
        #[source]
        source: CoercionError,
    },

    /// A nested shape reference is a literal.
    #[error("Invalid shape reference {value} for {predicate} on shape {shape}")]
    InvalidShapeReference {
        shape: NamedOrBlankNode,
        predicate: NamedNode,
        value: Term,
    },

    /// Decoding the shapes graph would go over the bound on decoded shapes.
    #[error("The shapes graph expands to more than {limit} shapes")]
    TooManyShapes { limit: usize },
}

impl ShapeParseError {
    pub(crate) fn missing_path(shape: impl Into<NamedOrBlankNode>) -> Self {
        Self::MissingPath {
            shape: shape.into(),
        }
    }

    pub(crate) fn malformed_list(
        shape: impl Into<NamedOrBlankNode>,
        predicate: impl Into<NamedNode>,
        source: RdfListError,
    ) -> Self {
        Self::MalformedList {
            shape: shape.into(),
            predicate: predicate.into(),
            source,
        }
    }

    pub(crate) fn malformed_path(node: impl Into<Term>, message: impl Into<String>) -> Self {
        Self::MalformedPath {
            node: node.into(),
            message: message.into(),
        }
    }

    pub(crate) fn coercion(
        shape: impl Into<NamedOrBlankNode>,
        predicate: impl Into<NamedNode>,
        source: CoercionError,
    ) -> Self {
        Self::Coercion {
            shape: shape.into(),
            predicate: predicate.into(),
            source,
        }
    }

    pub(crate) fn invalid_shape_reference(
        shape: impl Into<NamedOrBlankNode>,
        predicate: impl Into<NamedNode>,
        value: impl Into<Term>,
    ) -> Self {
        Self::InvalidShapeReference {
            shape: shape.into(),
            predicate: predicate.into(),
            value: value.into(),
        }
    }
}

/// Error raised by the RDF list decoder.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum RdfListError {
    /// The list head is a literal.
    #[error("{node} is not an RDF list")]
    NotAList { node: Term },

    /// A list node has no `rdf:first`.
    #[error("List node {node} has no rdf:first")]
    MissingFirst { node: NamedOrBlankNode },

    /// A list node has several `rdf:first`.
    #[error("List node {node} has more than one rdf:first")]
    MultipleFirst { node: NamedOrBlankNode },

    /// A list node has no `rdf:rest`.
    #[error("List node {node} has no rdf:rest")]
    MissingRest { node: NamedOrBlankNode },

    /// The `rdf:rest` of a list node is neither `rdf:nil` nor a list node.
    #[error("The rdf:rest of list node {node} is {rest}, which is neither rdf:nil nor a list node")]
    InvalidRest { node: NamedOrBlankNode, rest: Term },

    /// The list loops back on one of its own nodes.
    #[error("List node {node} is reached twice, the list is cyclic")]
    Cycle { node: NamedOrBlankNode },

    /// The list is longer than the configured bound.
    #[error("The list has more than {limit} elements")]
    TooLong { limit: usize },
}

/// A literal could not be converted to the type a constraint parameter expects.
///
/// Absence of a value is never an error, it is represented by [`None`] or an empty list.
#[derive(Debug, Clone, thiserror::Error)]
#[error("expected {expected}, got {value}")]
pub struct CoercionError {
    expected: &'static str,
    value: Term,
}

impl CoercionError {
    pub(crate) fn new(expected: &'static str, value: impl Into<Term>) -> Self {
        Self {
            expected,
            value: value.into(),
        }
    }

    /// The kind of value that was expected, e.g. `"xsd:integer"`.
    pub fn expected(&self) -> &'static str {
        self.expected
    }

    /// The offending value.
    pub fn value(&self) -> &Term {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::{Literal, vocab::xsd};

    #[test]
    fn coercion_error_message() {
        let error = CoercionError::new(
            "xsd:boolean",
            Literal::new_typed_literal("maybe", xsd::STRING),
        );
        assert_eq!(error.to_string(), "expected xsd:boolean, got \"maybe\"");
        assert_eq!(error.expected(), "xsd:boolean");
    }

    #[test]
    fn missing_path_names_the_shape() {
        let shape = NamedNode::new("http://example.org/s").unwrap();
        let error = ShapeParseError::missing_path(shape);
        assert_eq!(
            error.to_string(),
            "Property shape <http://example.org/s> has no sh:path"
        );
    }
}

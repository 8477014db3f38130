//! SHACL shape model types.
//!
//! This module defines the constraint tree produced by the [`ShapesParser`](crate::ShapesParser):
//! - [`Shape`] - Base shape type carrying all the constraint components
//! - [`NodeShape`] - Top-level node shape
//! - [`PropertyShape`] - Shape applied to the values reached through a [`PropertyPath`]
//! - [`NestedShape`] - Reference from a constraint component to another shape
//! - [`Target`] - Target declarations for selecting focus nodes
//! - [`ShapeGraph`] - Collection of shapes parsed from an RDF graph

use oxrdf::{Graph, Literal, NamedNode, NamedOrBlankNode, Term};
use oxsdatatypes::Decimal;
use regex::{Regex, RegexBuilder};
use std::collections::BTreeMap;

use crate::error::ShapeParseError;
use crate::parser::ShapesParser;
use crate::path::PropertyPath;

/// Target declaration for selecting focus nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// `sh:targetNode`: a specific node.
    Node(Term),
    /// `sh:targetClass`: all instances of a class.
    Class(NamedNode),
    /// `sh:targetSubjectsOf`: all subjects of triples with the given predicate.
    SubjectsOf(NamedNode),
    /// `sh:targetObjectsOf`: all objects of triples with the given predicate.
    ObjectsOf(NamedNode),
}

/// Constraint components shared by all kinds of shapes.
///
/// Absent parameters are [`None`] or empty lists. List-valued components keep the order of
/// their RDF list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    /// The shape subject.
    pub id: NamedOrBlankNode,

    // Targets
    pub targets: Vec<Target>,
    /// The subject is also typed `rdfs:Class`.
    pub implicit_class_target: bool,

    // Metadata
    pub severity: Option<NamedNode>,
    pub messages: Vec<Literal>,
    pub deactivated: bool,

    // Value type
    pub classes: Vec<NamedNode>,
    pub datatype: Option<NamedNode>,
    pub node_kind: Option<NamedNode>,

    // Value range
    pub min_exclusive: Option<Literal>,
    pub min_inclusive: Option<Literal>,
    pub max_exclusive: Option<Literal>,
    pub max_inclusive: Option<Literal>,

    // String based
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<String>,
    pub flags: Option<String>,
    pub language_in: Vec<String>,

    // Property pair
    pub equals: Vec<NamedNode>,
    pub disjoint: Vec<NamedNode>,

    // Logical
    pub not: Option<NestedShape>,
    pub and: Vec<NestedShape>,
    pub or: Vec<NestedShape>,
    pub xone: Vec<NestedShape>,

    // Shape based
    pub node: Vec<NestedShape>,
    pub property: Vec<PropertyShape>,

    // Other
    pub closed: bool,
    pub ignored_properties: Vec<NamedNode>,
    pub has_value: Option<Term>,
    pub in_values: Vec<Term>,
}

impl Shape {
    /// Creates a shape with no constraint.
    pub fn new(id: impl Into<NamedOrBlankNode>) -> Self {
        Self {
            id: id.into(),
            targets: Vec::new(),
            implicit_class_target: false,
            severity: None,
            messages: Vec::new(),
            deactivated: false,
            classes: Vec::new(),
            datatype: None,
            node_kind: None,
            min_exclusive: None,
            min_inclusive: None,
            max_exclusive: None,
            max_inclusive: None,
            min_length: None,
            max_length: None,
            pattern: None,
            flags: None,
            language_in: Vec::new(),
            equals: Vec::new(),
            disjoint: Vec::new(),
            not: None,
            and: Vec::new(),
            or: Vec::new(),
            xone: Vec::new(),
            node: Vec::new(),
            property: Vec::new(),
            closed: false,
            ignored_properties: Vec::new(),
            has_value: None,
            in_values: Vec::new(),
        }
    }

    /// Returns true if this shape selects focus nodes, explicitly or through an implicit class
    /// target.
    pub fn has_targets(&self) -> bool {
        !self.targets.is_empty() || self.implicit_class_target
    }

    /// Compiles `sh:pattern` together with `sh:flags`.
    ///
    /// Returns [`None`] if the shape has no pattern.
    ///
    /// ```
    /// use oxrdf::NamedNode;
    /// use oxshacl::Shape;
    ///
    /// let mut shape = Shape::new(NamedNode::new("http://example.com/s")?);
    /// shape.pattern = Some("^abc".into());
    /// shape.flags = Some("i".into());
    /// assert!(shape.pattern_regex().unwrap()?.is_match("ABCD"));
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn pattern_regex(&self) -> Option<Result<Regex, regex::Error>> {
        let pattern = self.pattern.as_deref()?;
        let flags = self.flags.as_deref().unwrap_or_default();
        let pattern = if flags.contains('q') {
            regex::escape(pattern)
        } else {
            pattern.to_owned()
        };
        Some(
            RegexBuilder::new(&pattern)
                .dot_matches_new_line(flags.contains('s'))
                .multi_line(flags.contains('m'))
                .case_insensitive(flags.contains('i'))
                .ignore_whitespace(flags.contains('x'))
                .build(),
        )
    }
}

/// A node shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeShape {
    /// Base shape data.
    pub base: Shape,
}

impl NodeShape {
    pub fn new(id: impl Into<NamedOrBlankNode>) -> Self {
        Self {
            base: Shape::new(id),
        }
    }

    pub fn id(&self) -> &NamedOrBlankNode {
        &self.base.id
    }
}

/// A property shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyShape {
    /// Base shape data.
    pub base: Shape,
    /// The property path to follow from the focus node.
    pub path: PropertyPath,

    // Non-validating metadata
    pub names: Vec<Literal>,
    pub descriptions: Vec<Literal>,
    pub order: Option<Decimal>,
    pub group: Option<NamedOrBlankNode>,
    pub default_value: Option<Term>,

    // Cardinality, unset means unconstrained
    pub min_count: Option<u64>,
    pub max_count: Option<u64>,

    pub unique_lang: bool,
    pub less_than: Vec<NamedNode>,
    pub less_than_or_equals: Vec<NamedNode>,

    // Qualified value shape
    pub qualified_value_shape: Option<NestedShape>,
    pub qualified_value_shapes_disjoint: bool,
    pub qualified_min_count: Option<u64>,
    pub qualified_max_count: Option<u64>,
}

impl PropertyShape {
    pub fn new(id: impl Into<NamedOrBlankNode>, path: PropertyPath) -> Self {
        Self {
            base: Shape::new(id),
            path,
            names: Vec::new(),
            descriptions: Vec::new(),
            order: None,
            group: None,
            default_value: None,
            min_count: None,
            max_count: None,
            unique_lang: false,
            less_than: Vec::new(),
            less_than_or_equals: Vec::new(),
            qualified_value_shape: None,
            qualified_value_shapes_disjoint: false,
            qualified_min_count: None,
            qualified_max_count: None,
        }
    }

    pub fn id(&self) -> &NamedOrBlankNode {
        &self.base.id
    }

    pub fn path(&self) -> &PropertyPath {
        &self.path
    }
}

/// A shape referenced from a constraint component (`sh:not`, `sh:and`, `sh:node`, ...).
///
/// The kind is decided per reference: a subject with `sh:property` is a node shape, one with
/// `sh:path` a property shape and anything else a plain shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NestedShape {
    Shape(Box<Shape>),
    Node(Box<NodeShape>),
    Property(Box<PropertyShape>),
    /// The reference loops back to a shape that is already being decoded.
    Unresolved(NamedOrBlankNode),
}

impl NestedShape {
    /// The subject of the referenced shape.
    pub fn id(&self) -> &NamedOrBlankNode {
        match self {
            Self::Shape(shape) => &shape.id,
            Self::Node(shape) => shape.id(),
            Self::Property(shape) => shape.id(),
            Self::Unresolved(id) => id,
        }
    }

    /// The constraint components of the referenced shape, if it has been decoded.
    pub fn as_shape(&self) -> Option<&Shape> {
        match self {
            Self::Shape(shape) => Some(shape),
            Self::Node(shape) => Some(&shape.base),
            Self::Property(shape) => Some(&shape.base),
            Self::Unresolved(_) => None,
        }
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::Unresolved(_))
    }
}

/// An entry of a [`ShapeGraph`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopLevelShape {
    Node(NodeShape),
    /// A property shape that is not nested in any node shape.
    Property(PropertyShape),
}

impl TopLevelShape {
    pub fn id(&self) -> &NamedOrBlankNode {
        match self {
            Self::Node(shape) => shape.id(),
            Self::Property(shape) => shape.id(),
        }
    }

    pub fn as_shape(&self) -> &Shape {
        match self {
            Self::Node(shape) => &shape.base,
            Self::Property(shape) => &shape.base,
        }
    }
}

/// A collection of shapes parsed from an RDF graph, along with its namespace table.
///
/// Top-level shapes are kept in discovery order, so parsing the same graph twice gives equal
/// shape graphs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShapeGraph {
    namespaces: BTreeMap<String, NamedNode>,
    shapes: Vec<TopLevelShape>,
}

impl ShapeGraph {
    pub(crate) fn new(namespaces: BTreeMap<String, NamedNode>, shapes: Vec<TopLevelShape>) -> Self {
        Self { namespaces, shapes }
    }

    /// Parses all the shapes of a graph with the default [`ShapesParser`] configuration.
    pub fn from_graph(graph: &Graph) -> Result<Self, ShapeParseError> {
        ShapesParser::new().parse_graph(graph)
    }

    /// The prefix to namespace IRI table.
    pub fn namespaces(&self) -> &BTreeMap<String, NamedNode> {
        &self.namespaces
    }

    /// Looks up a namespace IRI by prefix.
    pub fn namespace(&self, prefix: &str) -> Option<&NamedNode> {
        self.namespaces.get(prefix)
    }

    pub fn shapes(&self) -> &[TopLevelShape] {
        &self.shapes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TopLevelShape> {
        self.shapes.iter()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Returns the top-level shape with the given subject.
    pub fn get(&self, id: &NamedOrBlankNode) -> Option<&TopLevelShape> {
        self.shapes.iter().find(|shape| shape.id() == id)
    }

    pub fn node_shapes(&self) -> impl Iterator<Item = &NodeShape> {
        self.shapes.iter().filter_map(|shape| match shape {
            TopLevelShape::Node(shape) => Some(shape),
            TopLevelShape::Property(_) => None,
        })
    }

    /// Property shapes that are not nested in a node shape.
    pub fn property_shapes(&self) -> impl Iterator<Item = &PropertyShape> {
        self.shapes.iter().filter_map(|shape| match shape {
            TopLevelShape::Property(shape) => Some(shape),
            TopLevelShape::Node(_) => None,
        })
    }
}

impl<'a> IntoIterator for &'a ShapeGraph {
    type Item = &'a TopLevelShape;
    type IntoIter = std::slice::Iter<'a, TopLevelShape>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for ShapeGraph {
    type Item = TopLevelShape;
    type IntoIter = std::vec::IntoIter<TopLevelShape>;

    fn into_iter(self) -> Self::IntoIter {
        self.shapes.into_iter()
    }
}

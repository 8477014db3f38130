use oxrdf::vocab::{rdf, rdfs};
use oxrdf::{
    Graph, IriParseError, NamedNode, NamedNodeRef, NamedOrBlankNode, NamedOrBlankNodeRef, TermRef,
    Triple, TripleRef,
};
use oxrdfio::{RdfFormat, RdfParser};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeMap;
use std::io::Read;
use std::mem;
use tracing::{debug, trace};

use crate::error::{CoercionError, ShapeParseError, ShapesError};
use crate::list::{DEFAULT_MAX_LIST_LENGTH, decode_list_with_limit};
use crate::model::{
    NestedShape, NodeShape, PropertyShape, Shape, ShapeGraph, Target, TopLevelShape,
};
use crate::path::PropertyPath;
use crate::value;
use crate::vocab::shacl;

/// Default bound on the number of shapes decoded while reading a shapes graph.
pub const DEFAULT_MAX_DECODED_SHAPES: usize = 100_000;

/// Reads SHACL shapes from an RDF graph.
///
/// Top-level shapes and multi-valued parameters follow the order of the triples in the parsed
/// document. Graphs given directly to [`parse_graph`](Self::parse_graph) have no document order,
/// their triples are ordered by their N-Triples serialization instead.
///
/// ```
/// use oxshacl::{RdfFormat, ShapesParser, TopLevelShape};
///
/// let file = r#"
/// @prefix sh: <http://www.w3.org/ns/shacl#> .
/// @prefix ex: <http://example.com/> .
///
/// ex:PersonShape a sh:NodeShape ;
///     sh:targetClass ex:Person ;
///     sh:property [ sh:path ex:name ; sh:minCount 1 ] ."#;
///
/// let shapes = ShapesParser::new().parse_read(file.as_bytes(), RdfFormat::Turtle)?;
/// assert_eq!(shapes.len(), 1);
/// assert_eq!(shapes.namespace("ex").map(|n| n.as_str()), Some("http://example.com/"));
/// let TopLevelShape::Node(person) = &shapes.shapes()[0] else {
///     panic!("expected a node shape")
/// };
/// assert_eq!(person.base.property[0].min_count, Some(1));
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct ShapesParser {
    namespaces: BTreeMap<String, NamedNode>,
    max_list_length: usize,
    max_decoded_shapes: usize,
}

impl Default for ShapesParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ShapesParser {
    pub fn new() -> Self {
        Self {
            namespaces: BTreeMap::new(),
            max_list_length: DEFAULT_MAX_LIST_LENGTH,
            max_decoded_shapes: DEFAULT_MAX_DECODED_SHAPES,
        }
    }

    /// Adds an entry to the namespace table of the built [`ShapeGraph`].
    ///
    /// Entries set here take precedence over the prefixes declared in a parsed document.
    pub fn with_prefix(
        mut self,
        prefix: impl Into<String>,
        iri: impl Into<String>,
    ) -> Result<Self, IriParseError> {
        self.namespaces.insert(prefix.into(), NamedNode::new(iri)?);
        Ok(self)
    }

    /// Bounds the number of elements of the RDF lists read from the graph.
    ///
    /// Longer lists make the parsing fail with a [`ShapeParseError::MalformedList`] error.
    pub fn with_max_list_length(mut self, max_list_length: usize) -> Self {
        self.max_list_length = max_list_length;
        self
    }

    /// Bounds the total number of shapes, top-level and nested, decoded by a single parsing.
    ///
    /// Nested shapes are decoded once per reference, so densely cross-referencing shapes expand
    /// quickly. Going over the bound makes the parsing fail with a
    /// [`ShapeParseError::TooManyShapes`] error.
    pub fn with_max_decoded_shapes(mut self, max_decoded_shapes: usize) -> Self {
        self.max_decoded_shapes = max_decoded_shapes;
        self
    }

    /// Parses all the shapes of `graph`.
    ///
    /// The top-level shapes are the IRI subjects typed `sh:NodeShape` or having a `sh:property`,
    /// followed by the IRI subjects typed `sh:PropertyShape` that are not nested in one of them.
    pub fn parse_graph(&self, graph: &Graph) -> Result<ShapeGraph, ShapeParseError> {
        self.build(graph, TripleOrder::lexical(graph), self.namespaces.clone())
    }

    /// Parses the single node shape `subject` of `graph`.
    pub fn parse_shape(
        &self,
        graph: &Graph,
        subject: NamedNodeRef<'_>,
    ) -> Result<NodeShape, ShapeParseError> {
        self.decoder(graph, TripleOrder::lexical(graph))
            .node_shape(subject.into())
    }

    /// Parses an RDF document and all the shapes it contains.
    ///
    /// The prefixes declared in the document are added to the namespace table.
    pub fn parse_read(
        &self,
        reader: impl Read,
        format: RdfFormat,
    ) -> Result<ShapeGraph, ShapesError> {
        let document = Document::read(reader, format)?;
        let mut namespaces = self.namespaces.clone();
        for (prefix, iri) in &document.prefixes {
            namespaces
                .entry(prefix.clone())
                .or_insert_with(|| iri.clone());
        }
        Ok(self.build(&document.graph, document.order(), namespaces)?)
    }

    /// Parses an RDF document and the single node shape `subject` it contains.
    pub fn parse_shape_read(
        &self,
        reader: impl Read,
        format: RdfFormat,
        subject: &str,
    ) -> Result<NodeShape, ShapesError> {
        let subject = NamedNode::new(subject)?;
        let document = Document::read(reader, format)?;
        Ok(self
            .decoder(&document.graph, document.order())
            .node_shape(subject.as_ref().into())?)
    }

    fn decoder<'a>(&self, graph: &'a Graph, order: TripleOrder<'a>) -> ShapeDecoder<'a> {
        ShapeDecoder {
            graph,
            order,
            max_list_length: self.max_list_length,
            max_decoded_shapes: self.max_decoded_shapes,
            decoded: 0,
            in_progress: FxHashSet::default(),
            property_shapes: FxHashSet::default(),
        }
    }

    fn build(
        &self,
        graph: &Graph,
        order: TripleOrder<'_>,
        namespaces: BTreeMap<String, NamedNode>,
    ) -> Result<ShapeGraph, ShapeParseError> {
        let mut seen = FxHashSet::default();
        let mut attachments = graph
            .triples_for_predicate(shacl::PROPERTY)
            .collect::<Vec<_>>();
        attachments.sort_by_key(|triple| order.position(*triple));
        let candidates = order
            .typed_subjects(graph, shacl::NODE_SHAPE)
            .into_iter()
            .chain(attachments.into_iter().map(|triple| triple.subject))
            .filter_map(|subject| match subject {
                NamedOrBlankNodeRef::NamedNode(subject) => Some(subject),
                NamedOrBlankNodeRef::BlankNode(_) => None,
            })
            .filter(|subject| seen.insert(*subject))
            .collect::<Vec<_>>();
        let typed_property_shapes = order.typed_subjects(graph, shacl::PROPERTY_SHAPE);

        let mut decoder = self.decoder(graph, order);
        let mut shapes = Vec::with_capacity(candidates.len());
        for subject in candidates {
            shapes.push(TopLevelShape::Node(decoder.node_shape(subject.into())?));
        }

        let nested = mem::take(&mut decoder.property_shapes);
        let standalone = typed_property_shapes
            .into_iter()
            .filter_map(|subject| match subject {
                NamedOrBlankNodeRef::NamedNode(subject) => Some(subject),
                NamedOrBlankNodeRef::BlankNode(_) => None,
            })
            .filter(|subject| {
                !seen.contains(subject)
                    && !nested.contains(&NamedOrBlankNode::from(subject.into_owned()))
            })
            .collect::<Vec<_>>();
        for subject in standalone {
            shapes.push(TopLevelShape::Property(
                decoder.property_shape(subject.into())?,
            ));
        }

        debug!(
            shapes = shapes.len(),
            decoded = decoder.decoded,
            namespaces = namespaces.len(),
            "Parsed shapes graph"
        );
        Ok(ShapeGraph::new(namespaces, shapes))
    }
}

/// An RDF document loaded in memory.
struct Document {
    graph: Graph,
    /// The triples in the order they appear in the document.
    triples: Vec<Triple>,
    prefixes: Vec<(String, NamedNode)>,
}

impl Document {
    fn read(reader: impl Read, format: RdfFormat) -> Result<Self, ShapesError> {
        let mut parser = RdfParser::from_format(format).for_reader(reader);
        let mut graph = Graph::new();
        let mut triples = Vec::new();
        for quad in &mut parser {
            let triple = Triple::from(quad?);
            if graph.insert(&triple) {
                triples.push(triple);
            }
        }
        let prefixes = parser
            .prefixes()
            // Prefix IRIs have already been validated by the parser
            .map(|(prefix, iri)| (prefix.to_owned(), NamedNode::new_unchecked(iri)))
            .collect();
        Ok(Self {
            graph,
            triples,
            prefixes,
        })
    }

    fn order(&self) -> TripleOrder<'_> {
        TripleOrder::from_sequence(self.triples.iter().map(Triple::as_ref))
    }
}

/// Reading order of the triples of a graph.
struct TripleOrder<'a> {
    positions: FxHashMap<TripleRef<'a>, usize>,
}

impl<'a> TripleOrder<'a> {
    fn from_sequence(triples: impl IntoIterator<Item = TripleRef<'a>>) -> Self {
        let mut positions = FxHashMap::default();
        for triple in triples {
            let position = positions.len();
            positions.entry(triple).or_insert(position);
        }
        Self { positions }
    }

    /// Orders the triples by their N-Triples serialization.
    fn lexical(graph: &'a Graph) -> Self {
        let mut triples = graph.iter().collect::<Vec<_>>();
        triples.sort_by_cached_key(ToString::to_string);
        Self::from_sequence(triples)
    }

    /// Triples unknown to the order come last.
    fn position(&self, triple: TripleRef<'_>) -> usize {
        let positions: &FxHashMap<TripleRef<'_>, usize> = &self.positions;
        positions.get(&triple).copied().unwrap_or(usize::MAX)
    }

    fn typed_subjects<'g>(
        &self,
        graph: &'g Graph,
        class: NamedNodeRef<'_>,
    ) -> Vec<NamedOrBlankNodeRef<'g>> {
        let mut subjects = graph
            .subjects_for_predicate_object(rdf::TYPE, class)
            .collect::<Vec<_>>();
        subjects.sort_by_key(|subject| self.position(TripleRef::new(*subject, rdf::TYPE, class)));
        subjects
    }
}

/// Recursive decoding of shape subjects.
///
/// `in_progress` holds the subjects on the active decoding path. A nested reference to one of
/// them is not decoded again, which bounds the recursion depth by the number of subjects.
/// `decoded` counts every decoding and bounds the total work.
struct ShapeDecoder<'a> {
    graph: &'a Graph,
    order: TripleOrder<'a>,
    max_list_length: usize,
    max_decoded_shapes: usize,
    decoded: usize,
    in_progress: FxHashSet<NamedOrBlankNode>,
    /// Property shapes decoded so far.
    property_shapes: FxHashSet<NamedOrBlankNode>,
}

impl<'a> ShapeDecoder<'a> {
    fn node_shape(
        &mut self,
        subject: NamedOrBlankNodeRef<'_>,
    ) -> Result<NodeShape, ShapeParseError> {
        trace!(shape = %subject, "Decoding node shape");
        self.with_active(subject, |this| {
            Ok(NodeShape {
                base: this.shape(subject)?,
            })
        })
    }

    fn property_shape(
        &mut self,
        subject: NamedOrBlankNodeRef<'_>,
    ) -> Result<PropertyShape, ShapeParseError> {
        trace!(shape = %subject, "Decoding property shape");
        self.with_active(subject, |this| this.property_shape_body(subject))
    }

    fn plain_shape(&mut self, subject: NamedOrBlankNodeRef<'_>) -> Result<Shape, ShapeParseError> {
        trace!(shape = %subject, "Decoding shape");
        self.with_active(subject, |this| this.shape(subject))
    }

    fn with_active<T>(
        &mut self,
        subject: NamedOrBlankNodeRef<'_>,
        decode: impl FnOnce(&mut Self) -> Result<T, ShapeParseError>,
    ) -> Result<T, ShapeParseError> {
        self.decoded += 1;
        if self.decoded > self.max_decoded_shapes {
            return Err(ShapeParseError::TooManyShapes {
                limit: self.max_decoded_shapes,
            });
        }
        self.in_progress.insert(subject.into_owned());
        let result = decode(self);
        self.in_progress.remove(&subject.into_owned());
        result
    }

    fn is_in_progress(&self, subject: NamedOrBlankNodeRef<'_>) -> bool {
        self.in_progress.contains(&subject.into_owned())
    }

    fn shape(&mut self, subject: NamedOrBlankNodeRef<'_>) -> Result<Shape, ShapeParseError> {
        let mut shape = Shape::new(subject.into_owned());

        shape.targets.extend(
            self.objects(subject, shacl::TARGET_NODE)
                .into_iter()
                .map(|node| Target::Node(node.into_owned())),
        );
        for (predicate, target) in [
            (shacl::TARGET_CLASS, Target::Class as fn(NamedNode) -> Target),
            (shacl::TARGET_SUBJECTS_OF, Target::SubjectsOf),
            (shacl::TARGET_OBJECTS_OF, Target::ObjectsOf),
        ] {
            shape.targets.extend(
                self.all(subject, predicate, value::to_named_node)?
                    .into_iter()
                    .map(target),
            );
        }
        shape.implicit_class_target = self
            .graph
            .contains(TripleRef::new(subject, rdf::TYPE, rdfs::CLASS));

        shape.severity = self.single(subject, shacl::SEVERITY, value::to_named_node)?;
        shape.messages = self.all(subject, shacl::MESSAGE, value::to_literal)?;
        shape.deactivated = self.flag(subject, shacl::DEACTIVATED)?;

        shape.classes = self.all(subject, shacl::CLASS, value::to_named_node)?;
        shape.datatype = self.single(subject, shacl::DATATYPE, value::to_named_node)?;
        shape.node_kind = self.single(subject, shacl::NODE_KIND, value::to_named_node)?;

        shape.min_exclusive = self.single(subject, shacl::MIN_EXCLUSIVE, value::to_literal)?;
        shape.min_inclusive = self.single(subject, shacl::MIN_INCLUSIVE, value::to_literal)?;
        shape.max_exclusive = self.single(subject, shacl::MAX_EXCLUSIVE, value::to_literal)?;
        shape.max_inclusive = self.single(subject, shacl::MAX_INCLUSIVE, value::to_literal)?;

        shape.min_length =
            self.single(subject, shacl::MIN_LENGTH, value::to_non_negative_integer)?;
        shape.max_length =
            self.single(subject, shacl::MAX_LENGTH, value::to_non_negative_integer)?;
        shape.pattern = self.single(subject, shacl::PATTERN, value::to_string)?;
        shape.flags = self.single(subject, shacl::FLAGS, value::to_string)?;
        shape.language_in = self.list(subject, shacl::LANGUAGE_IN, value::to_string)?;

        shape.equals = self.all(subject, shacl::EQUALS, value::to_named_node)?;
        shape.disjoint = self.all(subject, shacl::DISJOINT, value::to_named_node)?;

        shape.not = self.single_nested(subject, shacl::NOT)?;
        shape.and = self.nested_list(subject, shacl::AND)?;
        shape.or = self.nested_list(subject, shacl::OR)?;
        shape.xone = self.nested_list(subject, shacl::XONE)?;

        shape.node = self.nested_all(subject, shacl::NODE)?;
        shape.property = self.properties(subject)?;

        shape.closed = self.flag(subject, shacl::CLOSED)?;
        shape.ignored_properties =
            self.list(subject, shacl::IGNORED_PROPERTIES, value::to_named_node)?;
        shape.has_value = self
            .object(subject, shacl::HAS_VALUE)
            .map(TermRef::into_owned);
        shape.in_values = self.list(subject, shacl::IN, |term| Ok(term.into_owned()))?;

        Ok(shape)
    }

    fn property_shape_body(
        &mut self,
        subject: NamedOrBlankNodeRef<'_>,
    ) -> Result<PropertyShape, ShapeParseError> {
        let graph = self.graph;
        let mut paths = graph.objects_for_subject_predicate(subject, shacl::PATH);
        let path = paths
            .next()
            .ok_or_else(|| ShapeParseError::missing_path(subject.into_owned()))?;
        if paths.next().is_some() {
            return Err(ShapeParseError::malformed_path(
                subject.into_owned(),
                "a property shape must have exactly one sh:path",
            ));
        }
        let path = PropertyPath::parse_with_limit(graph, path, self.max_list_length)?;
        self.property_shapes.insert(subject.into_owned());

        let mut shape = PropertyShape::new(subject.into_owned(), path);
        shape.base = self.shape(subject)?;

        shape.names = self.all(subject, shacl::NAME, value::to_literal)?;
        shape.descriptions = self.all(subject, shacl::DESCRIPTION, value::to_literal)?;
        shape.order = self.single(subject, shacl::ORDER, value::to_decimal)?;
        shape.group = self.single(subject, shacl::GROUP, value::to_resource)?;
        shape.default_value = self
            .object(subject, shacl::DEFAULT_VALUE)
            .map(TermRef::into_owned);

        shape.min_count =
            self.single(subject, shacl::MIN_COUNT, value::to_non_negative_integer)?;
        shape.max_count =
            self.single(subject, shacl::MAX_COUNT, value::to_non_negative_integer)?;

        shape.unique_lang = self.flag(subject, shacl::UNIQUE_LANG)?;
        shape.less_than = self.all(subject, shacl::LESS_THAN, value::to_named_node)?;
        shape.less_than_or_equals =
            self.all(subject, shacl::LESS_THAN_OR_EQUALS, value::to_named_node)?;

        shape.qualified_value_shape =
            self.single_nested(subject, shacl::QUALIFIED_VALUE_SHAPE)?;
        shape.qualified_value_shapes_disjoint =
            self.flag(subject, shacl::QUALIFIED_VALUE_SHAPES_DISJOINT)?;
        shape.qualified_min_count = self.single(
            subject,
            shacl::QUALIFIED_MIN_COUNT,
            value::to_non_negative_integer,
        )?;
        shape.qualified_max_count = self.single(
            subject,
            shacl::QUALIFIED_MAX_COUNT,
            value::to_non_negative_integer,
        )?;

        Ok(shape)
    }

    /// Decodes the shape referenced by `value`, choosing its kind from its triples.
    fn nested_shape(
        &mut self,
        subject: NamedOrBlankNodeRef<'_>,
        predicate: NamedNodeRef<'_>,
        value: TermRef<'_>,
    ) -> Result<NestedShape, ShapeParseError> {
        let reference = shape_reference(subject, predicate, value)?;
        if self.is_in_progress(reference) {
            debug!(
                shape = %subject,
                predicate = %predicate,
                reference = %reference,
                "Cyclic shape reference left unresolved"
            );
            return Ok(NestedShape::Unresolved(reference.into_owned()));
        }
        let graph = self.graph;
        Ok(
            if graph
                .object_for_subject_predicate(reference, shacl::PROPERTY)
                .is_some()
            {
                NestedShape::Node(Box::new(self.node_shape(reference)?))
            } else if graph
                .object_for_subject_predicate(reference, shacl::PATH)
                .is_some()
            {
                NestedShape::Property(Box::new(self.property_shape(reference)?))
            } else {
                NestedShape::Shape(Box::new(self.plain_shape(reference)?))
            },
        )
    }

    fn single_nested(
        &mut self,
        subject: NamedOrBlankNodeRef<'_>,
        predicate: NamedNodeRef<'_>,
    ) -> Result<Option<NestedShape>, ShapeParseError> {
        self.object(subject, predicate)
            .map(|value| self.nested_shape(subject, predicate, value))
            .transpose()
    }

    fn nested_all(
        &mut self,
        subject: NamedOrBlankNodeRef<'_>,
        predicate: NamedNodeRef<'_>,
    ) -> Result<Vec<NestedShape>, ShapeParseError> {
        self.objects(subject, predicate)
            .into_iter()
            .map(|value| self.nested_shape(subject, predicate, value))
            .collect()
    }

    fn nested_list(
        &mut self,
        subject: NamedOrBlankNodeRef<'_>,
        predicate: NamedNodeRef<'_>,
    ) -> Result<Vec<NestedShape>, ShapeParseError> {
        self.list(subject, predicate, |term| Ok(term.into_owned()))?
            .iter()
            .map(|value| self.nested_shape(subject, predicate, value.as_ref()))
            .collect()
    }

    /// Decodes the `sh:property` values, leaving out the ones that are already being decoded.
    fn properties(
        &mut self,
        subject: NamedOrBlankNodeRef<'_>,
    ) -> Result<Vec<PropertyShape>, ShapeParseError> {
        let values = self.objects(subject, shacl::PROPERTY);
        let mut properties = Vec::with_capacity(values.len());
        for value in values {
            let reference = shape_reference(subject, shacl::PROPERTY, value)?;
            if self.is_in_progress(reference) {
                debug!(
                    shape = %subject,
                    reference = %reference,
                    "Cyclic sh:property reference skipped"
                );
                continue;
            }
            properties.push(self.property_shape(reference)?);
        }
        Ok(properties)
    }

    /// The values of `predicate`, in reading order.
    fn objects(
        &self,
        subject: NamedOrBlankNodeRef<'_>,
        predicate: NamedNodeRef<'_>,
    ) -> Vec<TermRef<'a>> {
        let mut values = self
            .graph
            .objects_for_subject_predicate(subject, predicate)
            .collect::<Vec<_>>();
        values.sort_by_key(|value| self.order.position(TripleRef::new(subject, predicate, *value)));
        values
    }

    /// The first value of `predicate`, in reading order.
    fn object(
        &self,
        subject: NamedOrBlankNodeRef<'_>,
        predicate: NamedNodeRef<'_>,
    ) -> Option<TermRef<'a>> {
        self.graph
            .objects_for_subject_predicate(subject, predicate)
            .min_by_key(|value| self.order.position(TripleRef::new(subject, predicate, *value)))
    }

    /// Reads the first value of `predicate`.
    fn single<T>(
        &self,
        subject: NamedOrBlankNodeRef<'_>,
        predicate: NamedNodeRef<'_>,
        coerce: impl Fn(TermRef<'_>) -> Result<T, CoercionError>,
    ) -> Result<Option<T>, ShapeParseError> {
        self.object(subject, predicate)
            .map(|value| {
                coerce(value)
                    .map_err(|e| ShapeParseError::coercion(subject.into_owned(), predicate, e))
            })
            .transpose()
    }

    fn flag(
        &self,
        subject: NamedOrBlankNodeRef<'_>,
        predicate: NamedNodeRef<'_>,
    ) -> Result<bool, ShapeParseError> {
        Ok(self
            .single(subject, predicate, value::to_boolean)?
            .unwrap_or(false))
    }

    /// Reads all the values of `predicate`.
    fn all<T>(
        &self,
        subject: NamedOrBlankNodeRef<'_>,
        predicate: NamedNodeRef<'_>,
        coerce: impl Fn(TermRef<'_>) -> Result<T, CoercionError>,
    ) -> Result<Vec<T>, ShapeParseError> {
        self.objects(subject, predicate)
            .into_iter()
            .map(|value| {
                coerce(value)
                    .map_err(|e| ShapeParseError::coercion(subject.into_owned(), predicate, e))
            })
            .collect()
    }

    /// Reads the elements of the RDF list value of `predicate`.
    fn list<T>(
        &self,
        subject: NamedOrBlankNodeRef<'_>,
        predicate: NamedNodeRef<'_>,
        coerce: impl Fn(TermRef<'_>) -> Result<T, CoercionError>,
    ) -> Result<Vec<T>, ShapeParseError> {
        let Some(head) = self.object(subject, predicate) else {
            return Ok(Vec::new());
        };
        decode_list_with_limit(self.graph, head, self.max_list_length)
            .map_err(|e| ShapeParseError::malformed_list(subject.into_owned(), predicate, e))?
            .iter()
            .map(|element| {
                coerce(element.as_ref())
                    .map_err(|e| ShapeParseError::coercion(subject.into_owned(), predicate, e))
            })
            .collect()
    }
}

fn shape_reference<'b>(
    subject: NamedOrBlankNodeRef<'_>,
    predicate: NamedNodeRef<'_>,
    value: TermRef<'b>,
) -> Result<NamedOrBlankNodeRef<'b>, ShapeParseError> {
    match value {
        TermRef::NamedNode(node) => Ok(node.into()),
        TermRef::BlankNode(node) => Ok(node.into()),
        _ => Err(ShapeParseError::invalid_shape_reference(
            subject.into_owned(),
            predicate,
            value.into_owned(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RdfListError;
    use oxrdf::Term;

    const PREFIXES: &str = r"
@prefix sh: <http://www.w3.org/ns/shacl#> .
@prefix ex: <http://example.org/> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
";

    fn ex(name: &str) -> NamedNode {
        NamedNode::new(format!("http://example.org/{name}")).unwrap()
    }

    fn parse(turtle: &str) -> Result<ShapeGraph, ShapesError> {
        ShapesParser::new()
            .parse_read(format!("{PREFIXES}{turtle}").as_bytes(), RdfFormat::Turtle)
    }

    fn node_shape(shapes: &ShapeGraph, name: &str) -> NodeShape {
        match shapes.get(&ex(name).into()) {
            Some(TopLevelShape::Node(shape)) => shape.clone(),
            other => panic!("expected node shape {name}, got {other:?}"),
        }
    }

    #[test]
    fn empty_graph() {
        let shapes = ShapeGraph::from_graph(&Graph::new()).unwrap();
        assert!(shapes.is_empty());
    }

    #[test]
    fn targets_in_kind_order() {
        let shapes = parse(
            r"ex:S a sh:NodeShape, rdfs:Class ;
                sh:targetObjectsOf ex:o ;
                sh:targetSubjectsOf ex:s ;
                sh:targetClass ex:C ;
                sh:targetNode ex:n .",
        )
        .unwrap();
        let shape = node_shape(&shapes, "S");
        assert_eq!(
            shape.base.targets,
            [
                Target::Node(ex("n").into()),
                Target::Class(ex("C")),
                Target::SubjectsOf(ex("s")),
                Target::ObjectsOf(ex("o")),
            ]
        );
        assert!(shape.base.implicit_class_target);
    }

    #[test]
    fn multi_valued_parameters_keep_document_order() {
        let turtle = r#"ex:S a sh:NodeShape ;
                sh:targetClass ex:Z, ex:A, ex:M ;
                sh:message "zeta", "alpha" ;
                sh:class ex:Y, ex:B ;
                sh:node ex:N2, ex:N1 ;
                sh:property ex:P2, ex:P1 ;
                sh:datatype ex:Second .
            ex:S sh:datatype ex:First .
            ex:P1 sh:path ex:p1 .
            ex:P2 sh:path ex:p2 ."#;
        for _ in 0..8 {
            let shape = node_shape(&parse(turtle).unwrap(), "S").base;
            assert_eq!(
                shape.targets,
                [
                    Target::Class(ex("Z")),
                    Target::Class(ex("A")),
                    Target::Class(ex("M")),
                ]
            );
            let messages = shape.messages.iter().map(|m| m.value()).collect::<Vec<_>>();
            assert_eq!(messages, ["zeta", "alpha"]);
            assert_eq!(shape.classes, [ex("Y"), ex("B")]);
            let nodes = shape.node.iter().map(NestedShape::id).cloned().collect::<Vec<_>>();
            assert_eq!(
                nodes,
                [
                    NamedOrBlankNode::from(ex("N2")),
                    NamedOrBlankNode::from(ex("N1")),
                ]
            );
            let properties = shape
                .property
                .iter()
                .map(|p| p.id().clone())
                .collect::<Vec<_>>();
            assert_eq!(
                properties,
                [
                    NamedOrBlankNode::from(ex("P2")),
                    NamedOrBlankNode::from(ex("P1")),
                ]
            );
            // The first triple of the document wins
            assert_eq!(shape.datatype, Some(ex("Second")));
        }
    }

    #[test]
    fn graph_order_is_stable_across_graph_instances() {
        let turtle = format!(
            "{PREFIXES} ex:H a sh:NodeShape . ex:C a sh:NodeShape . ex:F a sh:NodeShape .
             ex:A a sh:NodeShape ; sh:class ex:Q, ex:B, ex:K ."
        );
        let read = || {
            let mut graph = Graph::new();
            for quad in RdfParser::from_format(RdfFormat::Turtle).for_reader(turtle.as_bytes()) {
                graph.insert(quad.unwrap().as_ref());
            }
            let shapes = ShapeGraph::from_graph(&graph).unwrap();
            let classes = node_shape(&shapes, "A").base.classes;
            let ids = shapes.iter().map(|s| s.id().clone()).collect::<Vec<_>>();
            (ids, classes)
        };
        let first = read();
        // Without document order, subjects and values are sorted by their serialization
        assert_eq!(
            first.0,
            ["A", "C", "F", "H"].map(|name| NamedOrBlankNode::from(ex(name)))
        );
        assert_eq!(first.1, [ex("B"), ex("K"), ex("Q")]);
        for _ in 0..8 {
            assert_eq!(read(), first);
        }
    }

    #[test]
    fn scalar_parameters() {
        let shapes = parse(
            r#"ex:S a sh:NodeShape ;
                sh:severity sh:Warning ;
                sh:message "m1" ;
                sh:deactivated true ;
                sh:datatype ex:T ;
                sh:nodeKind sh:IRI ;
                sh:minInclusive 1 ;
                sh:maxExclusive 10 ;
                sh:minLength 2 ;
                sh:pattern "^a" ;
                sh:flags "i" ;
                sh:languageIn ( "en" "fr" ) ;
                sh:closed true ;
                sh:ignoredProperties ( ex:p ) ;
                sh:hasValue ex:v ;
                sh:in ( ex:a 1 "b" ) ."#,
        )
        .unwrap();
        let shape = node_shape(&shapes, "S").base;
        assert_eq!(shape.severity.as_ref(), Some(&shacl::WARNING.into_owned()));
        assert_eq!(shape.messages.len(), 1);
        assert!(shape.deactivated);
        assert_eq!(shape.datatype, Some(ex("T")));
        assert_eq!(shape.node_kind, Some(shacl::IRI.into_owned()));
        assert_eq!(shape.min_inclusive.as_ref().map(|l| l.value()), Some("1"));
        assert_eq!(shape.max_exclusive.as_ref().map(|l| l.value()), Some("10"));
        assert_eq!(shape.min_length, Some(2));
        assert_eq!(shape.max_length, None);
        assert_eq!(shape.language_in, ["en", "fr"]);
        assert!(shape.closed);
        assert_eq!(shape.ignored_properties, [ex("p")]);
        assert_eq!(shape.has_value, Some(ex("v").into()));
        assert_eq!(shape.in_values.len(), 3);
        assert_eq!(shape.in_values[0], Term::from(ex("a")));
        assert!(shape.pattern_regex().unwrap().unwrap().is_match("ABC"));
    }

    #[test]
    fn property_shape_parameters() {
        let shapes = parse(
            r#"ex:S a sh:NodeShape ; sh:property ex:P .
            ex:P sh:path ex:p ;
                sh:name "n" ;
                sh:order 1.5 ;
                sh:group ex:G ;
                sh:defaultValue 0 ;
                sh:minCount 1 ;
                sh:maxCount 3 ;
                sh:uniqueLang true ;
                sh:lessThan ex:q ;
                sh:qualifiedValueShape [ sh:class ex:C ] ;
                sh:qualifiedMinCount 1 ."#,
        )
        .unwrap();
        let shape = node_shape(&shapes, "S");
        let property = &shape.base.property[0];
        assert_eq!(property.path, PropertyPath::predicate(ex("p")));
        assert_eq!(property.names.len(), 1);
        assert_eq!(property.order, Some("1.5".parse().unwrap()));
        assert_eq!(property.group, Some(ex("G").into()));
        assert_eq!(property.min_count, Some(1));
        assert_eq!(property.max_count, Some(3));
        assert!(property.unique_lang);
        assert_eq!(property.less_than, [ex("q")]);
        assert!(matches!(
            property.qualified_value_shape,
            Some(NestedShape::Shape(_))
        ));
        assert_eq!(property.qualified_min_count, Some(1));
        assert_eq!(property.qualified_max_count, None);
        assert!(!property.qualified_value_shapes_disjoint);
    }

    #[test]
    fn several_paths_are_rejected() {
        let result = parse("ex:S a sh:NodeShape ; sh:property ex:P . ex:P sh:path ex:a, ex:b .");
        let Err(ShapesError::Parse(ShapeParseError::MalformedPath { node, .. })) = result else {
            panic!("expected a malformed path error, got {result:?}")
        };
        assert_eq!(node, Term::from(ex("P")));
    }

    #[test]
    fn negative_count_is_a_coercion_error() {
        let result = parse("ex:S sh:property [ sh:path ex:p ; sh:minCount -1 ] .");
        assert!(matches!(
            result,
            Err(ShapesError::Parse(ShapeParseError::Coercion { .. }))
        ));
    }

    #[test]
    fn literal_shape_reference_is_rejected() {
        let result = parse("ex:S a sh:NodeShape ; sh:not \"x\" .");
        assert!(matches!(
            result,
            Err(ShapesError::Parse(
                ShapeParseError::InvalidShapeReference { .. }
            ))
        ));
    }

    #[test]
    fn list_length_bound() {
        let turtle = format!("{PREFIXES} ex:S a sh:NodeShape ; sh:in ( 1 2 3 ) .");
        assert!(
            ShapesParser::new()
                .with_max_list_length(3)
                .parse_read(turtle.as_bytes(), RdfFormat::Turtle)
                .is_ok()
        );
        let result = ShapesParser::new()
            .with_max_list_length(2)
            .parse_read(turtle.as_bytes(), RdfFormat::Turtle);
        assert!(matches!(
            result,
            Err(ShapesError::Parse(ShapeParseError::MalformedList {
                source: RdfListError::TooLong { limit: 2 },
                ..
            }))
        ));
    }

    #[test]
    fn decoded_shapes_bound() {
        // S, its nested A and B, and the second reference to A
        let turtle = format!(
            "{PREFIXES} ex:S a sh:NodeShape ; sh:node ex:A ; sh:not ex:B . ex:B sh:node ex:A ."
        );
        let shapes = ShapesParser::new()
            .with_max_decoded_shapes(4)
            .parse_read(turtle.as_bytes(), RdfFormat::Turtle)
            .unwrap();
        assert_eq!(shapes.len(), 1);
        let result = ShapesParser::new()
            .with_max_decoded_shapes(3)
            .parse_read(turtle.as_bytes(), RdfFormat::Turtle);
        assert!(matches!(
            result,
            Err(ShapesError::Parse(ShapeParseError::TooManyShapes { limit: 3 }))
        ));
    }

    #[test]
    fn configured_prefixes_take_precedence() {
        let shapes = ShapesParser::new()
            .with_prefix("ex", "http://example.com/other/")
            .unwrap()
            .with_prefix("foo", "http://example.com/foo#")
            .unwrap()
            .parse_read(PREFIXES.as_bytes(), RdfFormat::Turtle)
            .unwrap();
        assert_eq!(
            shapes.namespace("ex").map(NamedNode::as_str),
            Some("http://example.com/other/")
        );
        assert_eq!(
            shapes.namespace("sh").map(NamedNode::as_str),
            Some("http://www.w3.org/ns/shacl#")
        );
        assert!(shapes.namespace("foo").is_some());
        assert!(
            ShapesParser::new()
                .with_prefix("bad", "not an iri")
                .is_err()
        );
    }

    #[test]
    fn invalid_subject() {
        let result = ShapesParser::new().parse_shape_read(
            PREFIXES.as_bytes(),
            RdfFormat::Turtle,
            "not an iri",
        );
        assert!(matches!(result, Err(ShapesError::InvalidSubject(_))));
    }

    #[test]
    fn syntax_error() {
        let result = ShapesParser::new().parse_read("ex:S a".as_bytes(), RdfFormat::Turtle);
        assert!(matches!(result, Err(ShapesError::Syntax(_))));
    }
}

//! Provides ready to use [`NamedNodeRef`](oxrdf::NamedNodeRef)s for the [SHACL](https://www.w3.org/TR/shacl/) vocabulary.
//!
//! The `rdf` and `rdfs` terms the shapes reader needs are taken from [`oxrdf::vocab`].

pub mod shacl {
    //! [SHACL](https://www.w3.org/TR/shacl/) vocabulary.
    use oxrdf::NamedNodeRef;

    /// The SHACL namespace: `http://www.w3.org/ns/shacl#`
    pub const NAMESPACE: &str = "http://www.w3.org/ns/shacl#";

    // === SHAPE CLASSES ===
    /// The class of all node shapes.
    pub const NODE_SHAPE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#NodeShape");
    /// The class of all property shapes.
    pub const PROPERTY_SHAPE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#PropertyShape");
    /// The class of all shapes.
    pub const SHAPE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#Shape");

    // === TARGETS ===
    /// Links a shape to a class whose instances are focus nodes.
    pub const TARGET_CLASS: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#targetClass");
    /// Links a shape to individual focus nodes.
    pub const TARGET_NODE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#targetNode");
    /// Links a shape to a predicate whose objects are focus nodes.
    pub const TARGET_OBJECTS_OF: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#targetObjectsOf");
    /// Links a shape to a predicate whose subjects are focus nodes.
    pub const TARGET_SUBJECTS_OF: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#targetSubjectsOf");

    // === SHAPE CHARACTERISTICS ===
    /// If set to true then all nodes conform to this shape.
    pub const DEACTIVATED: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#deactivated");
    /// A human-readable message explaining the cause of a result.
    pub const MESSAGE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#message");
    /// Defines the severity that validation results produced by a shape must have.
    pub const SEVERITY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#severity");

    // === SEVERITIES ===
    /// The severity for an informational validation result.
    pub const INFO: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#Info");
    /// The severity for a violation validation result.
    pub const VIOLATION: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#Violation");
    /// The severity for a warning validation result.
    pub const WARNING: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#Warning");

    // === PROPERTY PATHS ===
    /// The (single) value of this property must be a list of path elements, representing the elements of alternative paths.
    pub const ALTERNATIVE_PATH: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#alternativePath");
    /// The (single) value of this property represents an inverse path (object to subject).
    pub const INVERSE_PATH: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#inversePath");
    /// The (single) value of this property represents a path that is matched one or more times.
    pub const ONE_OR_MORE_PATH: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#oneOrMorePath");
    /// Specifies the property path of a property shape.
    pub const PATH: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#path");
    /// The (single) value of this property represents a path that is matched zero or more times.
    pub const ZERO_OR_MORE_PATH: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#zeroOrMorePath");
    /// The (single) value of this property represents a path that is matched zero or one times.
    pub const ZERO_OR_ONE_PATH: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#zeroOrOnePath");

    // === NON-VALIDATING CHARACTERISTICS ===
    /// A default value for the property.
    pub const DEFAULT_VALUE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#defaultValue");
    /// Human-readable descriptions for the property in the context of the surrounding shape.
    pub const DESCRIPTION: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#description");
    /// Can be used to link to a property group to indicate that a property shape belongs to a group of related property shapes.
    pub const GROUP: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#group");
    /// Human-readable labels for the property in the context of the surrounding shape.
    pub const NAME: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#name");
    /// Specifies the relative order of this compared to its siblings.
    pub const ORDER: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#order");

    // === VALUE TYPE ===
    /// The type that all value nodes must have.
    pub const CLASS: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#class");
    /// Specifies an RDF datatype that all value nodes must have.
    pub const DATATYPE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#datatype");
    /// Specifies the node kind (e.g. IRI or literal) each value node.
    pub const NODE_KIND: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#nodeKind");

    // === NODE KINDS ===
    /// The node kind of all blank nodes.
    pub const BLANK_NODE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#BlankNode");
    /// The node kind of all blank nodes or IRIs.
    pub const BLANK_NODE_OR_IRI: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#BlankNodeOrIRI");
    /// The node kind of all blank nodes or literals.
    pub const BLANK_NODE_OR_LITERAL: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#BlankNodeOrLiteral");
    /// The node kind of all IRIs.
    pub const IRI: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#IRI");
    /// The node kind of all IRIs or literals.
    pub const IRI_OR_LITERAL: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#IRIOrLiteral");
    /// The node kind of all literals.
    pub const LITERAL: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#Literal");

    // === CARDINALITY ===
    /// Specifies the maximum number of values in the set of value nodes.
    pub const MAX_COUNT: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#maxCount");
    /// Specifies the minimum number of values in the set of value nodes.
    pub const MIN_COUNT: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#minCount");

    // === VALUE RANGE ===
    /// Specifies the maximum exclusive value of each value node.
    pub const MAX_EXCLUSIVE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#maxExclusive");
    /// Specifies the maximum inclusive value of each value node.
    pub const MAX_INCLUSIVE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#maxInclusive");
    /// Specifies the minimum exclusive value of each value node.
    pub const MIN_EXCLUSIVE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#minExclusive");
    /// Specifies the minimum inclusive value of each value node.
    pub const MIN_INCLUSIVE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#minInclusive");

    // === STRING BASED ===
    /// An optional flag to be used with regular expression pattern matching.
    pub const FLAGS: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#flags");
    /// Specifies a list of language tags that all value nodes must have.
    pub const LANGUAGE_IN: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#languageIn");
    /// Specifies the maximum string length of each value node.
    pub const MAX_LENGTH: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#maxLength");
    /// Specifies the minimum string length of each value node.
    pub const MIN_LENGTH: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#minLength");
    /// Specifies a regular expression pattern that the string representations of the value nodes must match.
    pub const PATTERN: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#pattern");
    /// Specifies whether all node values must have a unique (or no) language tag.
    pub const UNIQUE_LANG: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#uniqueLang");

    // === PROPERTY PAIR ===
    /// Specifies a property that must not share any values with the value nodes.
    pub const DISJOINT: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#disjoint");
    /// Specifies a property that must have the same values as the value nodes.
    pub const EQUALS: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#equals");
    /// Specifies a property that must have smaller values than the value nodes.
    pub const LESS_THAN: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#lessThan");
    /// Specifies a property that must have smaller or equal values than the value nodes.
    pub const LESS_THAN_OR_EQUALS: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#lessThanOrEquals");

    // === LOGICAL ===
    /// RDF list of shapes to validate the value nodes against.
    pub const AND: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#and");
    /// Specifies a shape that the value nodes must not conform to.
    pub const NOT: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#not");
    /// Specifies a list of shapes so that the value nodes must conform to at least one of the shapes.
    pub const OR: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#or");
    /// Specifies a list of shapes so that the value nodes must conform to exactly one of the shapes.
    pub const XONE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#xone");

    // === SHAPE BASED ===
    /// Specifies the node shape that all value nodes must conform to.
    pub const NODE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#node");
    /// Links a shape to its property shapes.
    pub const PROPERTY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#property");
    /// The maximum number of value nodes that can conform to the shape.
    pub const QUALIFIED_MAX_COUNT: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#qualifiedMaxCount");
    /// The minimum number of value nodes that must conform to the shape.
    pub const QUALIFIED_MIN_COUNT: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#qualifiedMinCount");
    /// The shape that a specified number of values must conform to.
    pub const QUALIFIED_VALUE_SHAPE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#qualifiedValueShape");
    /// Can be used to mark the qualified value shape to be disjoint with its sibling shapes.
    pub const QUALIFIED_VALUE_SHAPES_DISJOINT: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#qualifiedValueShapesDisjoint");

    // === OTHER ===
    /// If set to true then the shape is closed.
    pub const CLOSED: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#closed");
    /// Specifies a value that must be among the value nodes.
    pub const HAS_VALUE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#hasValue");
    /// An optional RDF list of properties that are also permitted in addition to those explicitly enumerated via sh:property/sh:path.
    pub const IGNORED_PROPERTIES: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#ignoredProperties");
    /// Specifies a list of allowed values so that each value node must be among the members of the given list.
    pub const IN: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#in");
}

//! Typed coercion of constraint parameter values.
//!
//! Literal lexical forms are parsed with the [`oxsdatatypes`] types so that the accepted
//! syntax is the XML Schema one (e.g. `"1"` and `"true"` are both valid booleans).

use oxrdf::{Literal, LiteralRef, NamedNode, NamedOrBlankNode, TermRef};
use oxsdatatypes::{Boolean, Decimal, Integer};
use std::str::FromStr;

use crate::error::CoercionError;

/// Reads a literal as an `xsd:boolean`.
pub fn to_boolean(term: TermRef<'_>) -> Result<bool, CoercionError> {
    let literal = expect_literal(term, "xsd:boolean")?;
    Boolean::from_str(literal.value())
        .map(bool::from)
        .map_err(|_| CoercionError::new("xsd:boolean", term.into_owned()))
}

/// Reads a literal as an `xsd:integer`.
pub fn to_integer(term: TermRef<'_>) -> Result<i64, CoercionError> {
    let literal = expect_literal(term, "xsd:integer")?;
    Integer::from_str(literal.value())
        .map(i64::from)
        .map_err(|_| CoercionError::new("xsd:integer", term.into_owned()))
}

/// Reads a literal as an `xsd:nonNegativeInteger`, the type of counts and lengths.
pub fn to_non_negative_integer(term: TermRef<'_>) -> Result<u64, CoercionError> {
    let value = to_integer(term)
        .map_err(|_| CoercionError::new("xsd:nonNegativeInteger", term.into_owned()))?;
    u64::try_from(value)
        .map_err(|_| CoercionError::new("xsd:nonNegativeInteger", term.into_owned()))
}

/// Reads a literal as an `xsd:decimal`.
pub fn to_decimal(term: TermRef<'_>) -> Result<Decimal, CoercionError> {
    let literal = expect_literal(term, "xsd:decimal")?;
    Decimal::from_str(literal.value())
        .map_err(|_| CoercionError::new("xsd:decimal", term.into_owned()))
}

/// Reads the lexical form of a literal.
pub fn to_string(term: TermRef<'_>) -> Result<String, CoercionError> {
    Ok(expect_literal(term, "a literal")?.value().to_owned())
}

/// Returns the literal itself.
pub fn to_literal(term: TermRef<'_>) -> Result<Literal, CoercionError> {
    match term {
        TermRef::Literal(literal) => Ok(literal.into_owned()),
        _ => Err(CoercionError::new("a literal", term.into_owned())),
    }
}

/// Returns the IRI itself.
pub fn to_named_node(term: TermRef<'_>) -> Result<NamedNode, CoercionError> {
    match term {
        TermRef::NamedNode(node) => Ok(node.into_owned()),
        _ => Err(CoercionError::new("an IRI", term.into_owned())),
    }
}

/// Returns the IRI or blank node itself.
pub fn to_resource(term: TermRef<'_>) -> Result<NamedOrBlankNode, CoercionError> {
    match term {
        TermRef::NamedNode(node) => Ok(node.into_owned().into()),
        TermRef::BlankNode(node) => Ok(node.into_owned().into()),
        _ => Err(CoercionError::new("an IRI or a blank node", term.into_owned())),
    }
}

fn expect_literal<'a>(
    term: TermRef<'a>,
    expected: &'static str,
) -> Result<LiteralRef<'a>, CoercionError> {
    match term {
        TermRef::Literal(literal) => Ok(literal),
        _ => Err(CoercionError::new(expected, term.into_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::{NamedNodeRef, Term, vocab::xsd};

    fn typed(value: &str, datatype: NamedNodeRef<'_>) -> Term {
        Literal::new_typed_literal(value, datatype).into()
    }

    #[test]
    fn boolean_lexical_forms() {
        assert!(to_boolean(typed("true", xsd::BOOLEAN).as_ref()).unwrap());
        assert!(to_boolean(typed("1", xsd::BOOLEAN).as_ref()).unwrap());
        assert!(!to_boolean(typed("false", xsd::BOOLEAN).as_ref()).unwrap());
        to_boolean(typed("yes", xsd::BOOLEAN).as_ref()).unwrap_err();
    }

    #[test]
    fn non_negative_integer_rejects_negative_values() {
        assert_eq!(
            to_non_negative_integer(typed("3", xsd::INTEGER).as_ref()).unwrap(),
            3
        );
        let error = to_non_negative_integer(typed("-1", xsd::INTEGER).as_ref()).unwrap_err();
        assert_eq!(error.expected(), "xsd:nonNegativeInteger");
        to_non_negative_integer(typed("one", xsd::INTEGER).as_ref()).unwrap_err();
    }

    #[test]
    fn decimal_accepts_integers() {
        assert_eq!(
            to_decimal(typed("2", xsd::INTEGER).as_ref()).unwrap(),
            Decimal::from(2)
        );
        assert_eq!(
            to_decimal(typed("1.5", xsd::DECIMAL).as_ref()).unwrap(),
            Decimal::from_str("1.5").unwrap()
        );
    }

    #[test]
    fn kind_mismatch() {
        let iri = Term::from(NamedNode::new("http://example.org/a").unwrap());
        to_integer(iri.as_ref()).unwrap_err();
        to_literal(iri.as_ref()).unwrap_err();
        assert_eq!(
            to_named_node(iri.as_ref()).unwrap().as_str(),
            "http://example.org/a"
        );
        to_named_node(typed("a", xsd::STRING).as_ref()).unwrap_err();
        to_resource(typed("a", xsd::STRING).as_ref()).unwrap_err();
        assert_eq!(
            to_resource(iri.as_ref()).unwrap(),
            NamedOrBlankNode::from(NamedNode::new("http://example.org/a").unwrap())
        );
    }
}

#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc(html_favicon_url = "https://raw.githubusercontent.com/oxigraph/oxigraph/main/logo.svg")]
#![doc(html_logo_url = "https://raw.githubusercontent.com/oxigraph/oxigraph/main/logo.svg")]

mod error;
pub mod list;
mod model;
mod parser;
mod path;
pub mod value;
pub mod vocab;

pub use error::{CoercionError, RdfListError, ShapeParseError, ShapesError};
pub use model::{
    NestedShape, NodeShape, PropertyShape, Shape, ShapeGraph, Target, TopLevelShape,
};
pub use oxrdfio::RdfFormat;
pub use parser::{DEFAULT_MAX_DECODED_SHAPES, ShapesParser};
pub use path::PropertyPath;

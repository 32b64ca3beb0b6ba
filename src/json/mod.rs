pub mod equality;
pub mod error;
pub mod matcher;
pub mod predicate;
pub mod value;

pub use equality::QueryValue;
pub use error::ParseError;
pub use predicate::JsonPredicate;
pub use value::{parse, parse_field, render_scalar, serialize};

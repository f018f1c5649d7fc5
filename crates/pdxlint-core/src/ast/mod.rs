//! Typed AST: data model, lowering from the red tree, scalar
//! interpretation, and consumer views.

mod lower;
mod model;
mod scalar;
mod views;

pub use lower::lower_syntax_tree;
pub use model::{
    AstBlock, AstError, AstKeyValue, AstObject, AstObjectMultimap, AstScalar, AstSourceFile,
    AstStatement, AstTaggedBlockValue, AstValue,
};
pub use scalar::{
    DateLike, NumberValue, ScalarInterpretation, interpret_scalar, parse_bool, parse_date_like,
    parse_number,
};
pub use views::AstBlockView;

#[cfg(test)]
mod tests;

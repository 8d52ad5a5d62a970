// Card Template Library
// Expression language and template renderer for workflow notification cards

pub mod context;
pub mod expression;
pub mod template;

// Re-export the public surface
pub use context::{Context, PartialContext, Scope, SCOPE_NAMES};
pub use expression::{
    evaluate, ExpressionError, LexError, Lexer, Op, ParseError, Token, Value, MAX_DEPTH,
};
pub use template::render;

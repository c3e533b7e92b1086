//! Typed expressions and path-based pruning over annotated documents.
//!
//! ```
//! use trellis::{EvaluationContext, Value, parse_expression, parse_value};
//!
//! let doc = parse_value(r#"{ order: { total: 120.50d0, status: "open" } }"#).unwrap();
//! let expr = parse_expression(r#"/order/total > 100 and /order/status in ("open", "held")"#).unwrap();
//! assert_eq!(expr.evaluate(&EvaluationContext::new(&doc)).unwrap(), Value::bool(true));
//! ```

pub mod ast;
pub mod cli;
pub mod error;
pub mod evaluator;
pub mod grouping;
pub mod matching;
pub mod options;
pub mod output;
pub mod parser;
pub mod path;
pub mod syntax;
pub mod tree;
pub mod value;

pub use ast::{Expression, ExpressionKind};
pub use error::{EvalError, GroupingError, ParseError, PruneError, SyntaxError, TreeError};
pub use evaluator::EvaluationContext;
pub use matching::RegexCache;
pub use options::Options;
pub use output::{to_text, to_text_pretty};
pub use parser::{Parser, parse_expression, parse_path, parse_paths, parse_query};
pub use path::{Key, MatchType, PathQuery, PathSegment, QueryMatch, Selection, Selector};
pub use tree::{DataTreeBuilder, DataTreeNode, provenance_indices, provenance_indices_with};
pub use value::{Data, Kind, Value, parse_value};

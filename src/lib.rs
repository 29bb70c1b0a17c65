pub mod action_translator;
pub mod c_ast;
pub mod context;
pub mod errors;
pub mod java_model;
pub mod java_writer;
pub mod parser;
pub mod schema;
pub mod tokenizer;
pub mod type_translator;

// Re-export the items most callers need
pub use action_translator::ActionTranslator;
pub use c_ast::{CRenderer, CType, CodeGen, Expr, Param, Stmt, VarDecl};
pub use context::GeneratorContext;
pub use java_model::{Class, Field, Interface, Method, VisitorInterface};
pub use java_writer::JavaWriter;
pub use parser::{Parser, ParserContext};
pub use schema::{SchemaGenerator, SchemaModule};
pub use tokenizer::{MacroTable, Token, TokenKind, Tokenizer};
pub use type_translator::TypeTranslator;

// Re-export commonly used error types for convenience
pub use errors::{GenError, Result, SourceLocation};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

// Tally Language Interpreter Library
//
// Core pipeline for tally, a tiny line-oriented language with integer
// variables, arithmetic and a print statement: lexer, parser, interpreter.

// Public modules
pub mod ast;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod runner;

// Re-export commonly used items
pub use ast::{BinaryOp, Expr, Program, Stmt, UnaryOp};
pub use error::{ErrorKind, RuntimeErrorKind, Span, TallyError};
pub use interpreter::{Environment, Interpreter};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{Parser, TokenSource, TokenStream};

// Re-export main functions
pub use runner::{execute, run, RunOptions};

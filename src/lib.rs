//! `jsrt` is an ECMAScript runtime that evaluates already-parsed scripts.
//!
//! Scripts arrive as [`ast::Script`] trees; [`Interpreter::run`] evaluates one
//! against the interpreter's realm and returns the script's completion value
//! or the uncaught exception.

pub mod ast;
pub mod builder;
pub mod interpreter;
pub mod types;

pub use interpreter::{
    Completion, EngineError, EngineOptions, Interpreter, JsError, JsResult, ObjectId, ScriptError,
};
pub use types::{JsBigInt, JsString, JsSymbol, JsValue};

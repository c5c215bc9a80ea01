#![allow(dead_code)]

use jsrt::ast::Statement;
use jsrt::builder::{script, strict_script};
use jsrt::{Interpreter, JsValue, ScriptError};

/// Runs a sloppy-mode script and returns its completion value.
pub fn eval(body: Vec<Statement>) -> JsValue {
    let mut interp = Interpreter::new().expect("realm setup");
    interp.run(&script(body)).expect("script should complete normally")
}

/// Runs a script and renders its completion value the way a host would.
pub fn eval_display(body: Vec<Statement>) -> String {
    eval(body).to_string()
}

pub fn eval_strict_display(body: Vec<Statement>) -> String {
    let mut interp = Interpreter::new().expect("realm setup");
    interp
        .run(&strict_script(body))
        .expect("script should complete normally")
        .to_string()
}

pub fn eval_err(body: Vec<Statement>) -> ScriptError {
    let mut interp = Interpreter::new().expect("realm setup");
    interp.run(&script(body)).expect_err("script should throw")
}

pub fn eval_strict_err(body: Vec<Statement>) -> ScriptError {
    let mut interp = Interpreter::new().expect("realm setup");
    interp.run(&strict_script(body)).expect_err("script should throw")
}

/// The host rendering of the uncaught exception, e.g. `TypeError: ...`.
pub fn thrown(body: Vec<Statement>) -> String {
    match eval_err(body) {
        ScriptError::Uncaught { message, .. } => message,
        other => panic!("expected an uncaught exception, got {other}"),
    }
}

pub fn thrown_strict(body: Vec<Statement>) -> String {
    match eval_strict_err(body) {
        ScriptError::Uncaught { message, .. } => message,
        other => panic!("expected an uncaught exception, got {other}"),
    }
}

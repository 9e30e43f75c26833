mod ast;
mod builtins;
pub mod error;
mod eval;
mod hostio;
mod lex;
mod parse;
mod position;
mod str;
mod symbol;
#[cfg(test)]
mod tests;
mod token;
mod value;

pub use hostio::{BufferHostIo, HostIo, StdHostIo};
pub use position::Span;
pub use symbol::SymbolTable;
pub use value::Value;

use std::cell::RefCell;
use std::rc::Rc;

use ast::Node;

/// Lex, parse and evaluate `source` against an existing scope (the REPL's
/// persistent root, or a fresh `SymbolTable::root()` for one-shot file runs).
///
/// On a parse failure, returns the bare parser message and the span of the
/// token that triggered it rather than evaluating anything; the caller (the
/// CLI) is responsible for rendering it against the source text.
pub fn run(
    source: &str,
    file_name: &str,
    scope: &Rc<RefCell<SymbolTable>>,
    io: &mut dyn HostIo,
) -> Result<Value, (String, Span)> {
    let tokens = lex::lex_all(source, Rc::from(file_name));
    let nodes = parse::parse(tokens);
    if let Some(Node::Error(msg, span)) = nodes.iter().find(|n| n.is_error()) {
        return Err((msg.clone(), span.clone()));
    }
    Ok(eval::eval_program(&nodes, scope, io))
}

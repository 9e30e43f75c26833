//! Lexically chained name-to-value mapping.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use smol_str::SmolStr;

use crate::token::{builtin_const_value, BUILTIN_ALGOS, BUILTIN_CONSTS};
use crate::value::Value;

#[derive(Debug)]
pub struct SymbolTable {
    values: HashMap<SmolStr, Value>,
    parent: Option<Rc<RefCell<SymbolTable>>>,
}

impl SymbolTable {
    pub fn new(parent: Option<Rc<RefCell<SymbolTable>>>) -> Self {
        Self {
            values: HashMap::new(),
            parent,
        }
    }

    /// The root table, pre-populated with the `TRUE`/`FALSE`/`NONE` constants
    /// and the built-in algorithm descriptors.
    pub fn root() -> Rc<RefCell<SymbolTable>> {
        let mut table = SymbolTable::new(None);
        for name in BUILTIN_CONSTS {
            let value = builtin_const_value(name).expect("BUILTIN_CONSTS are all known");
            table.values.insert(SmolStr::new(*name), Value::Int(value));
        }
        for name in BUILTIN_ALGOS {
            table
                .values
                .insert(SmolStr::new(*name), Value::BuiltinAlgo(SmolStr::new(*name)));
        }
        Rc::new(RefCell::new(table))
    }

    /// Search self, then the parent chain. Missing names are an `ERROR`
    /// value, not a panic — name resolution failure is an ordinary runtime
    /// error in this language.
    pub fn get(&self, name: &str) -> Value {
        if let Some(value) = self.values.get(name) {
            return value.clone();
        }
        match &self.parent {
            Some(parent) => parent.borrow().get(name),
            None => Value::error(format!("Runtime ERROR: '{name}' is not defined")),
        }
    }

    /// Define-or-overwrite in *this* scope only; assignment never walks
    /// outward to mutate an enclosing binding.
    pub fn set(&mut self, name: &str, value: Value) {
        self.values.insert(SmolStr::new(name), value);
    }

    pub fn erase(&mut self, name: &str) {
        self.values.remove(name);
    }

    pub fn parent(&self) -> Option<Rc<RefCell<SymbolTable>>> {
        self.parent.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_searches_parent_chain() {
        let root = SymbolTable::root();
        root.borrow_mut().set("x", Value::Int(42));
        let child = Rc::new(RefCell::new(SymbolTable::new(Some(root.clone()))));
        assert!(matches!(child.borrow().get("x"), Value::Int(42)));
    }

    #[test]
    fn set_never_walks_outward() {
        let root = SymbolTable::root();
        root.borrow_mut().set("x", Value::Int(1));
        let child = Rc::new(RefCell::new(SymbolTable::new(Some(root.clone()))));
        child.borrow_mut().set("x", Value::Int(2));
        assert!(matches!(child.borrow().get("x"), Value::Int(2)));
        assert!(matches!(root.borrow().get("x"), Value::Int(1)));
    }

    #[test]
    fn missing_name_is_an_error_value() {
        let root = SymbolTable::root();
        assert!(root.borrow().get("nope").is_error());
    }

    #[test]
    fn root_has_builtin_constants_and_algorithms() {
        let root = SymbolTable::root();
        assert!(matches!(root.borrow().get("TRUE"), Value::Int(1)));
        assert!(matches!(root.borrow().get("FALSE"), Value::Int(0)));
        assert!(matches!(root.borrow().get("print"), Value::BuiltinAlgo(_)));
    }
}

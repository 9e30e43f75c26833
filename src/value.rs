//! The dynamically-typed runtime value and its operator table.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use smol_str::SmolStr;

use crate::ast::AlgoDef;
use crate::str::LossyStr;
use crate::symbol::SymbolTable;

/// A struct definition at runtime: its declared member list plus a method
/// table that can gain entries after construction (`Algorithm S::method`
/// attaches to an already-defined struct).
#[derive(Debug)]
pub struct StructDefHandle {
    pub name: SmolStr,
    pub members: Vec<SmolStr>,
    pub methods: RefCell<HashMap<SmolStr, Rc<AlgoDef>>>,
}

impl StructDefHandle {
    pub fn method(&self, name: &str) -> Option<Rc<AlgoDef>> {
        self.methods.borrow().get(name).cloned()
    }
}

/// A live struct instance: a reference to its definition plus its own
/// member map. Shared by reference so mutation through any alias is
/// visible everywhere (a linked-list node's `next` pointing at itself,
/// for instance).
#[derive(Debug)]
pub struct InstanceHandle {
    pub struct_def: Rc<StructDefHandle>,
    pub members: RefCell<HashMap<SmolStr, Value>>,
}

#[derive(Clone, Debug)]
pub enum Value {
    Int(i64),
    Float(f64),
    String(LossyStr),
    Array(Rc<RefCell<Vec<Value>>>),
    /// The unit-like absence value: uninitialized struct members, and the
    /// return value of side-effecting builtins (`print`, `clear`, `quit`).
    None,
    /// Carries a message; propagates eagerly through any operator or
    /// statement that receives it as an operand.
    Error(String),
    Algo(Rc<AlgoDef>, Rc<RefCell<SymbolTable>>),
    BuiltinAlgo(SmolStr),
    StructDef(Rc<StructDefHandle>),
    Instance(Rc<InstanceHandle>),
    BoundMethod(Box<Value>, SmolStr),
}

impl Value {
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    pub fn error(msg: impl Into<String>) -> Value {
        Value::Error(msg.into())
    }

    /// A value is "truthy" iff its numeric interpretation is non-zero.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            _ => false,
        }
    }

    pub(crate) fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    fn is_float(&self) -> bool {
        matches!(self, Value::Float(_))
    }

    /// The plain rendering used by `print`/`string(...)` and at the top
    /// level of array display: numbers and strings render raw, arrays
    /// recurse through [`Value::repr`] for their elements.
    pub fn display(&self) -> String {
        match self {
            Value::String(s) => s.to_string(),
            Value::Array(items) => {
                let items = items.borrow();
                let mut out = String::from("{");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&item.repr());
                }
                out.push('}');
                out
            }
            _ => self.repr(),
        }
    }

    /// The quoting rendering used for nested values (string elements of an
    /// array are shown with surrounding quotes and escaped control bytes).
    pub fn repr(&self) -> String {
        match self {
            Value::Int(n) => n.to_string(),
            Value::Float(f) => format!("{f}"),
            Value::String(s) => quote_and_escape(s),
            Value::Array(items) => {
                let items = items.borrow();
                let mut out = String::from("{");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&item.repr());
                }
                out.push('}');
                out
            }
            Value::None => String::new(),
            Value::Error(msg) => msg.clone(),
            Value::Algo(def, _) => format!("<algorithm {}>", def.name),
            Value::BuiltinAlgo(name) => format!("<builtin {name}>"),
            Value::StructDef(def) => format!("<struct {}>", def.name),
            Value::Instance(inst) => format!("<instance of {}>", inst.struct_def.name),
            Value::BoundMethod(_, name) => format!("<bound method {name}>"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

fn quote_and_escape(s: &LossyStr) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for &byte in s.as_bytes() {
        match byte {
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x07 => out.push_str("\\a"),
            0x08 => out.push_str("\\b"),
            0x0B => out.push_str("\\v"),
            0x0C => out.push_str("\\f"),
            b'\\' => out.push_str("\\\\"),
            b'"' => out.push_str("\\\""),
            _ => out.push(byte as char),
        }
    }
    out.push('"');
    out
}

macro_rules! numeric_binop {
    ($a:expr, $b:expr, $op_name:expr, $int_op:expr, $float_op:expr) => {{
        match ($a, $b) {
            (Value::Int(x), Value::Int(y)) => $int_op(*x, *y),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => $float_op(x, y),
                _ => Value::error(format!(
                    "Runtime ERROR: {} operation can only apply on numbers",
                    $op_name
                )),
            },
        }
    }};
}

pub fn add(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::String(x), Value::String(y)) => Value::String(x.concat(y)),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            numeric_binop!(a, b, "ADD", |x, y| Value::Int(x + y), |x, y| Value::Float(
                x + y
            ))
        }
        _ => Value::error("Runtime ERROR: ADD operation can only apply on number or two string"),
    }
}

pub fn sub(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            numeric_binop!(a, b, "SUB", |x, y| Value::Int(x - y), |x, y| Value::Float(
                x - y
            ))
        }
        _ => Value::error("Runtime ERROR: SUB operation can only apply on number"),
    }
}

pub fn mul(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::String(s), Value::Int(n)) | (Value::Int(n), Value::String(s)) => {
            if *n < 0 {
                Value::error("Runtime ERROR: MUL repetition count cannot be negative")
            } else {
                Value::String(s.repeat(*n as usize))
            }
        }
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            numeric_binop!(a, b, "MUL", |x, y| Value::Int(x * y), |x, y| Value::Float(
                x * y
            ))
        }
        _ => Value::error(
            "Runtime ERROR: MUL operation can only apply on number or string and int",
        ),
    }
}

pub fn div(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            if b.as_f64() == Some(0.0) {
                return Value::error("Runtime ERROR: DIV by 0");
            }
            numeric_binop!(
                a,
                b,
                "DIV",
                |x: i64, y: i64| Value::Int(x / y),
                |x, y| Value::Float(x / y)
            )
        }
        _ => Value::error("Runtime ERROR: DIV operation can only apply on number"),
    }
}

pub fn rem(a: &Value, b: &Value) -> Value {
    match (a.as_i64(), b.as_i64()) {
        (Some(_), Some(0)) => Value::error("Runtime ERROR: DIV by 0"),
        (Some(x), Some(y)) => Value::Int(x % y),
        _ => Value::error("Runtime ERROR: MOD operation can only apply on two ints"),
    }
}

pub fn pow(a: &Value, b: &Value) -> Value {
    let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) else {
        return Value::error("Runtime ERROR: POW operation can only apply on numbers");
    };
    if x == 0.0 && y == 0.0 {
        return Value::error("Runtime ERROR: 0 to the 0");
    }
    if a.is_float() || b.is_float() {
        Value::Float(x.powf(y))
    } else {
        Value::Int((x.powf(y)) as i64)
    }
}

fn compare(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.partial_cmp(y),
        (Value::String(x), Value::String(y)) => x.partial_cmp(y),
        (a, b) => a.as_f64().and_then(|x| b.as_f64().map(|y| (x, y))).and_then(|(x, y)| x.partial_cmp(&y)),
    }
}

macro_rules! compare_op {
    ($name:ident, $op_name:expr, $ord:expr) => {
        pub fn $name(a: &Value, b: &Value) -> Value {
            match compare(a, b) {
                Some(ord) => Value::Int($ord(ord) as i64),
                None => Value::error(format!(
                    "Runtime ERROR: {} cannot compare these values",
                    $op_name
                )),
            }
        }
    };
}

compare_op!(lt, "LESS", |ord: std::cmp::Ordering| ord.is_lt());
compare_op!(gt, "GREATER", |ord: std::cmp::Ordering| ord.is_gt());
compare_op!(le, "LESS_EQ", |ord: std::cmp::Ordering| ord.is_le());
compare_op!(ge, "GREATER_EQ", |ord: std::cmp::Ordering| ord.is_ge());

pub fn eq(a: &Value, b: &Value) -> Value {
    match compare(a, b) {
        Some(ord) => Value::Int(ord.is_eq() as i64),
        None => Value::error("Runtime ERROR: EQUAL cannot compare these values"),
    }
}

pub fn neq(a: &Value, b: &Value) -> Value {
    match compare(a, b) {
        Some(ord) => Value::Int(ord.is_ne() as i64),
        None => Value::error("Runtime ERROR: NOT_EQUAL cannot compare these values"),
    }
}

/// Not short-circuiting: both operands have already been evaluated by the
/// caller before this applies.
pub fn and(a: &Value, b: &Value) -> Value {
    Value::Int((a.is_truthy() && b.is_truthy()) as i64)
}

pub fn or(a: &Value, b: &Value) -> Value {
    Value::Int((a.is_truthy() || b.is_truthy()) as i64)
}

pub fn not(a: &Value) -> Value {
    Value::Int(!a.is_truthy() as i64)
}

pub fn neg(a: &Value) -> Value {
    match a {
        Value::Int(n) => Value::Int(-n),
        Value::Float(f) => Value::Float(-f),
        _ => Value::error("Runtime ERROR: unary - operation can only apply on number"),
    }
}

pub fn pos(a: &Value) -> Value {
    match a {
        Value::Int(_) | Value::Float(_) => a.clone(),
        _ => Value::error("Runtime ERROR: unary + operation can only apply on number"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_add_stays_int() {
        assert!(matches!(add(&Value::Int(1), &Value::Int(2)), Value::Int(3)));
    }

    #[test]
    fn mixed_add_promotes_to_float() {
        assert!(matches!(add(&Value::Int(1), &Value::Float(2.5)), Value::Float(x) if x == 3.5));
    }

    #[test]
    fn div_by_zero_is_error() {
        assert!(div(&Value::Int(1), &Value::Int(0)).is_error());
    }

    #[test]
    fn zero_pow_zero_is_error() {
        assert!(pow(&Value::Int(0), &Value::Int(0)).is_error());
    }

    #[test]
    fn integer_division_truncates_toward_zero() {
        assert!(matches!(div(&Value::Int(-7), &Value::Int(2)), Value::Int(-3)));
    }

    #[test]
    fn and_or_are_not_short_circuiting_but_still_compute_correctly() {
        assert!(matches!(and(&Value::Int(0), &Value::Int(5)), Value::Int(0)));
        assert!(matches!(or(&Value::Int(0), &Value::Int(5)), Value::Int(1)));
    }

    #[test]
    fn string_concat_and_repeat() {
        let a = Value::String(LossyStr::from_bytes(b"ab"));
        let b = Value::String(LossyStr::from_bytes(b"cd"));
        match add(&a, &b) {
            Value::String(s) => assert_eq!(s.as_bytes(), b"abcd"),
            other => panic!("expected string, got {other:?}"),
        }
        match mul(&a, &Value::Int(3)) {
            Value::String(s) => assert_eq!(s.as_bytes(), b"ababab"),
            other => panic!("expected string, got {other:?}"),
        }
    }

    #[test]
    fn array_display_quotes_nested_strings() {
        let arr = Value::Array(Rc::new(RefCell::new(vec![
            Value::Int(1),
            Value::String(LossyStr::from_bytes(b"hi")),
        ])));
        assert_eq!(arr.display(), "{1, \"hi\"}");
    }

    #[test]
    fn top_level_string_display_is_bare_but_repr_quotes() {
        let s = Value::String(LossyStr::from_bytes(b"hello"));
        assert_eq!(s.display(), "hello");
        assert_eq!(s.repr(), "\"hello\"");
    }
}

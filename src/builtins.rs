//! Built-in algorithm descriptors and their execution.
//!
//! Parameter names here are cosmetic (used only for arity-error messages);
//! dispatch happens by name, mirroring `BuiltinAlgoValue::execute` in the
//! original interpreter.

use crate::hostio::HostIo;
use crate::str::LossyStr;
use crate::value::Value;

/// The fixed arity of each built-in, used by the evaluator's arity check
/// before dispatch.
pub fn arity(name: &str) -> Option<usize> {
    match name {
        "print" => Some(1),
        "read" | "read_line" | "clear" | "quit" => Some(0),
        "int" | "float" | "string" => Some(1),
        "open" => Some(1),
        _ => None,
    }
}

/// Execute a built-in by name against already-evaluated arguments.
pub fn call(name: &str, args: &[Value], io: &mut dyn HostIo) -> Value {
    match name {
        "print" => {
            io.print_line(&args[0].display());
            Value::None
        }
        "read" => Value::String(LossyStr::from_bytes(io.read_token().as_bytes())),
        "read_line" => Value::String(LossyStr::from_bytes(io.read_line().as_bytes())),
        "clear" => {
            io.clear_screen();
            Value::None
        }
        "quit" => io.terminate(0),
        "open" => Value::error("Runtime ERROR: Not found!"),
        "int" => execute_int(&args[0]),
        "float" => execute_float(&args[0]),
        "string" => Value::String(LossyStr::from_bytes(args[0].display().as_bytes())),
        other => Value::error(format!("Runtime ERROR: unknown built-in '{other}'")),
    }
}

fn execute_int(arg: &Value) -> Value {
    let text = arg.display();
    let bytes = text.as_bytes();
    if is_valid_int_literal(bytes) {
        match text.parse::<i64>() {
            Ok(n) => Value::Int(n),
            Err(_) => Value::error(format!("Runtime ERROR: Cannot convert \"{text}\" to an int")),
        }
    } else {
        Value::error(format!("Runtime ERROR: Cannot convert \"{text}\" to an int"))
    }
}

fn execute_float(arg: &Value) -> Value {
    let text = arg.display();
    let bytes = text.as_bytes();
    if is_valid_float_literal(bytes) {
        match text.parse::<f64>() {
            Ok(f) => Value::Float(f),
            Err(_) => Value::error(format!(
                "Runtime ERROR: Cannot convert \"{text}\" to a float"
            )),
        }
    } else {
        Value::error(format!(
            "Runtime ERROR: Cannot convert \"{text}\" to a float"
        ))
    }
}

fn is_valid_int_literal(bytes: &[u8]) -> bool {
    if bytes.is_empty() {
        return false;
    }
    let digits = if bytes[0] == b'-' { &bytes[1..] } else { bytes };
    !digits.is_empty() && digits.iter().all(u8::is_ascii_digit)
}

fn is_valid_float_literal(bytes: &[u8]) -> bool {
    if bytes.is_empty() {
        return false;
    }
    let digits = if bytes[0] == b'-' { &bytes[1..] } else { bytes };
    if digits.is_empty() {
        return false;
    }
    let mut seen_dot = false;
    let mut seen_digit = false;
    for &b in digits {
        if b == b'.' {
            if seen_dot {
                return false;
            }
            seen_dot = true;
        } else if b.is_ascii_digit() {
            seen_digit = true;
        } else {
            return false;
        }
    }
    seen_digit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hostio::BufferHostIo;

    #[test]
    fn print_writes_display_form_and_returns_none() {
        let mut io = BufferHostIo::default();
        let result = call("print", &[Value::Int(7)], &mut io);
        assert!(matches!(result, Value::None));
        assert_eq!(io.output, "7\n");
    }

    #[test]
    fn int_parses_valid_literals_and_errors_otherwise() {
        let mut io = BufferHostIo::default();
        assert!(matches!(
            call("int", &[Value::String(LossyStr::from_bytes(b"-42"))], &mut io),
            Value::Int(-42)
        ));
        assert!(call("int", &[Value::String(LossyStr::from_bytes(b"4.2"))], &mut io).is_error());
    }

    #[test]
    fn float_parses_valid_literals_and_errors_otherwise() {
        let mut io = BufferHostIo::default();
        assert!(matches!(
            call("float", &[Value::String(LossyStr::from_bytes(b"3.5"))], &mut io),
            Value::Float(x) if x == 3.5
        ));
        assert!(call("float", &[Value::String(LossyStr::from_bytes(b"abc"))], &mut io).is_error());
    }

    #[test]
    fn read_and_read_line_pull_from_the_buffer() {
        let mut io = BufferHostIo::with_input(["hello world", "second line"]);
        match call("read", &[], &mut io) {
            Value::String(s) => assert_eq!(s.as_bytes(), b"hello world"),
            other => panic!("expected string, got {other:?}"),
        }
        match call("read_line", &[], &mut io) {
            Value::String(s) => assert_eq!(s.as_bytes(), b"second line"),
            other => panic!("expected string, got {other:?}"),
        }
    }
}

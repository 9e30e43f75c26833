//! Tree-walking evaluator: [`ast::Node`] → [`Value`].
//!
//! Every visit takes the symbol table it runs against and the host-io
//! capability, and returns a `Value` — never a `Result`. An `ERROR` value is
//! the propagation channel: any visit that receives one as an operand or
//! sub-result returns it unchanged without evaluating anything further.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use smol_str::SmolStr;

use crate::ast::{AlgoDef, Literal, Node};
use crate::builtins;
use crate::hostio::HostIo;
use crate::symbol::SymbolTable;
use crate::token::TokenKind;
use crate::value::{self, InstanceHandle, StructDefHandle, Value};

const ARRAY_METHODS: &[&str] = &["push", "push_back", "pop", "pop_back", "size", "back", "resize"];

type Scope = Rc<RefCell<SymbolTable>>;

/// Evaluate a top-level program: the value of its last statement, or
/// `NONE` for an empty program. Stops at the first `ERROR`.
pub fn eval_program(nodes: &[Node], scope: &Scope, io: &mut dyn HostIo) -> Value {
    tracing::debug!("evaluating {} top-level statement(s)", nodes.len());
    eval_block(nodes, scope, io)
}

/// Evaluate a statement list in order, returning the last statement's
/// value. Used for top-level programs, `if`/`else` bodies, algorithm and
/// method bodies — everywhere a block's *result* (not an accumulated
/// array) is wanted.
fn eval_block(nodes: &[Node], scope: &Scope, io: &mut dyn HostIo) -> Value {
    let mut result = Value::None;
    for node in nodes {
        result = eval_node(node, scope, io);
        if result.is_error() {
            return result;
        }
    }
    result
}

fn eval_node(node: &Node, scope: &Scope, io: &mut dyn HostIo) -> Value {
    tracing::trace!("evaluating {node:?}");
    match node {
        Node::Value(lit, _) => match lit {
            Literal::Int(v) => Value::Int(*v),
            Literal::Float(v) => Value::Float(*v),
            Literal::String(s) => Value::String(s.clone()),
        },

        Node::VarAccess(name, _) => scope.borrow().get(name),

        Node::VarAssign(name, rhs, _) => {
            let value = eval_node(rhs, scope, io);
            if value.is_error() {
                return value;
            }
            scope.borrow_mut().set(name, value.clone());
            value
        }

        Node::BinOp(lhs, rhs, op_tok) => {
            let left = eval_node(lhs, scope, io);
            if left.is_error() {
                return left;
            }
            let right = eval_node(rhs, scope, io);
            if right.is_error() {
                return right;
            }
            dispatch_binop(&op_tok.kind, &left, &right)
        }

        Node::UnaryOp(operand, op_tok) => {
            let value = eval_node(operand, scope, io);
            if value.is_error() {
                return value;
            }
            dispatch_unaryop(&op_tok.kind, &value)
        }

        Node::Array(elements, _) => {
            let mut values = Vec::with_capacity(elements.len());
            for element in elements {
                let value = eval_node(element, scope, io);
                if value.is_error() {
                    return value;
                }
                values.push(value);
            }
            Value::Array(Rc::new(RefCell::new(values)))
        }

        Node::ArrAccess(target, index, _) => {
            let target = eval_node(target, scope, io);
            if target.is_error() {
                return target;
            }
            let index = eval_node(index, scope, io);
            if index.is_error() {
                return index;
            }
            array_get(&target, &index)
        }

        Node::ArrAssign(lvalue, rhs, _) => eval_assign(lvalue, rhs, scope, io),

        Node::MemAccess(object, member, _) => {
            let object = eval_node(object, scope, io);
            if object.is_error() {
                return object;
            }
            member_access(&object, member)
        }

        Node::If {
            cond,
            then_body,
            else_body,
            ..
        } => {
            let cond = eval_node(cond, scope, io);
            if cond.is_error() {
                return cond;
            }
            if cond.is_truthy() {
                eval_block(then_body, scope, io)
            } else if let Some(else_body) = else_body {
                eval_block(else_body, scope, io)
            } else {
                Value::Int(0)
            }
        }

        Node::For {
            var,
            start,
            end,
            step,
            body,
            ..
        } => eval_for(var, start, end, step.as_deref(), body, scope, io),

        Node::While { cond, body, .. } => {
            let mut results = Vec::new();
            loop {
                let cond_value = eval_node(cond, scope, io);
                if cond_value.is_error() {
                    return cond_value;
                }
                if !cond_value.is_truthy() {
                    break;
                }
                let result = eval_block(body, scope, io);
                if result.is_error() {
                    return result;
                }
                results.push(result);
            }
            Value::Array(Rc::new(RefCell::new(results)))
        }

        Node::Repeat { body, cond, .. } => {
            let mut results = Vec::new();
            loop {
                let result = eval_block(body, scope, io);
                if result.is_error() {
                    return result;
                }
                results.push(result);
                let cond_value = eval_node(cond, scope, io);
                if cond_value.is_error() {
                    return cond_value;
                }
                if cond_value.is_truthy() {
                    break;
                }
            }
            Value::Array(Rc::new(RefCell::new(results)))
        }

        Node::AlgoDef(def, _) => eval_algo_def(def, scope),

        Node::AlgoCall(callee, args, _) => eval_algo_call(callee, args, scope, io),

        Node::StructDef(def, _) => {
            let handle = Rc::new(StructDefHandle {
                name: def.name.clone(),
                members: def.members.clone(),
                methods: RefCell::new(
                    def.methods
                        .iter()
                        .map(|m| (m.name.clone(), m.clone()))
                        .collect(),
                ),
            });
            let value = Value::StructDef(handle);
            scope.borrow_mut().set(&def.name, value.clone());
            value
        }

        // There is no non-local exit: `return expr` is just the value of
        // the statement it appears in, same as any other expression.
        Node::Return(expr, _) => match expr {
            Some(expr) => eval_node(expr, scope, io),
            None => Value::None,
        },

        Node::Error(msg, _) => Value::error(msg.clone()),
    }
}

fn dispatch_binop(kind: &TokenKind, left: &Value, right: &Value) -> Value {
    match kind {
        TokenKind::Add => value::add(left, right),
        TokenKind::Sub => value::sub(left, right),
        TokenKind::Mul => value::mul(left, right),
        TokenKind::Div => value::div(left, right),
        TokenKind::Mod => value::rem(left, right),
        TokenKind::Pow => value::pow(left, right),
        TokenKind::Equal => value::eq(left, right),
        TokenKind::NotEqual => value::neq(left, right),
        TokenKind::Less => value::lt(left, right),
        TokenKind::Greater => value::gt(left, right),
        TokenKind::LessEq => value::le(left, right),
        TokenKind::GreaterEq => value::ge(left, right),
        TokenKind::Keyword(k) if k == "and" => value::and(left, right),
        TokenKind::Keyword(k) if k == "or" => value::or(left, right),
        other => Value::error(format!("Runtime ERROR: unknown binary operator {other:?}")),
    }
}

fn dispatch_unaryop(kind: &TokenKind, operand: &Value) -> Value {
    match kind {
        TokenKind::Sub => value::neg(operand),
        TokenKind::Add => value::pos(operand),
        TokenKind::Keyword(k) if k == "not" => value::not(operand),
        other => Value::error(format!("Runtime ERROR: unknown unary operator {other:?}")),
    }
}

fn as_index(value: &Value) -> Option<i64> {
    match value {
        Value::Int(n) => Some(*n),
        _ => None,
    }
}

fn array_get(target: &Value, index: &Value) -> Value {
    let Value::Array(items) = target else {
        return Value::error("Runtime ERROR: cannot index a non-array value");
    };
    let Some(idx) = as_index(index) else {
        return Value::error("Runtime ERROR: array index must be an integer");
    };
    let items = items.borrow();
    if idx < 1 || idx as usize > items.len() {
        return Value::error(format!(
            "Runtime ERROR: Index out of range, size: {}",
            items.len()
        ));
    }
    items[idx as usize - 1].clone()
}

fn array_set(target: &Value, index: &Value, new_value: Value) -> Value {
    let Value::Array(items) = target else {
        return Value::error("Runtime ERROR: cannot index a non-array value");
    };
    let Some(idx) = as_index(index) else {
        return Value::error("Runtime ERROR: array index must be an integer");
    };
    let mut items = items.borrow_mut();
    if idx < 1 || idx as usize > items.len() {
        return Value::error(format!(
            "Runtime ERROR: Index out of range, size: {}",
            items.len()
        ));
    }
    items[idx as usize - 1] = new_value.clone();
    new_value
}

/// `lvalue <- rhs`: the lvalue is either a member access on an INSTANCE
/// (dynamic member creation is permitted, matching the original
/// interpreter) or an array index.
fn eval_assign(lvalue: &Node, rhs: &Node, scope: &Scope, io: &mut dyn HostIo) -> Value {
    match lvalue {
        Node::MemAccess(object, member, _) => {
            let object = eval_node(object, scope, io);
            if object.is_error() {
                return object;
            }
            let value = eval_node(rhs, scope, io);
            if value.is_error() {
                return value;
            }
            match object {
                Value::Instance(instance) => {
                    instance
                        .members
                        .borrow_mut()
                        .insert(member.clone(), value.clone());
                    value
                }
                _ => Value::error("Runtime ERROR: cannot assign a member of a non-instance value"),
            }
        }
        Node::ArrAccess(target, index, _) => {
            let target = eval_node(target, scope, io);
            if target.is_error() {
                return target;
            }
            let index = eval_node(index, scope, io);
            if index.is_error() {
                return index;
            }
            let value = eval_node(rhs, scope, io);
            if value.is_error() {
                return value;
            }
            array_set(&target, &index, value)
        }
        _ => Value::error("Runtime ERROR: invalid assignment target"),
    }
}

fn member_access(object: &Value, member: &str) -> Value {
    match object {
        Value::Instance(instance) => {
            if let Some(value) = instance.members.borrow().get(member) {
                return value.clone();
            }
            if instance.struct_def.method(member).is_some() {
                return Value::BoundMethod(Box::new(object.clone()), SmolStr::new(member));
            }
            Value::error(format!(
                "Runtime ERROR: '{member}' is not a member of {}",
                instance.struct_def.name
            ))
        }
        Value::Array(_) if ARRAY_METHODS.contains(&member) => {
            Value::BoundMethod(Box::new(object.clone()), SmolStr::new(member))
        }
        Value::Array(_) => Value::error(format!("Runtime ERROR: arrays have no method '{member}'")),
        _ => Value::error("Runtime ERROR: cannot access a member of this value"),
    }
}

fn eval_for(
    var: &str,
    start: &Node,
    end: &Node,
    step: Option<&Node>,
    body: &[Node],
    scope: &Scope,
    io: &mut dyn HostIo,
) -> Value {
    let start_value = eval_node(start, scope, io);
    if start_value.is_error() {
        return start_value;
    }
    scope.borrow_mut().set(var, start_value);

    let end_value = eval_node(end, scope, io);
    if end_value.is_error() {
        return end_value;
    }

    let step_value = match step {
        Some(step) => {
            let value = eval_node(step, scope, io);
            if value.is_error() {
                return value;
            }
            value
        }
        None => Value::Int(1),
    };
    let Some(step_f) = step_value.as_f64() else {
        return Value::error("Runtime ERROR: for-loop step must be a number");
    };
    if step_f == 0.0 {
        return Value::error("Runtime ERROR: Infinite for loop");
    }
    let ascending = step_f > 0.0;

    let mut results = Vec::new();
    loop {
        let current = scope.borrow().get(var);
        let keep_going = if ascending {
            value::le(&current, &end_value)
        } else {
            value::ge(&current, &end_value)
        };
        if keep_going.is_error() {
            return keep_going;
        }
        if !keep_going.is_truthy() {
            break;
        }
        let result = eval_block(body, scope, io);
        if result.is_error() {
            return result;
        }
        results.push(result);
        let next = value::add(&current, &step_value);
        if next.is_error() {
            return next;
        }
        scope.borrow_mut().set(var, next);
    }
    Value::Array(Rc::new(RefCell::new(results)))
}

/// Binds the algorithm under its own name, unless that name is
/// `Struct::method`, in which case it installs into the struct's method
/// table instead of the enclosing scope.
fn eval_algo_def(def: &Rc<AlgoDef>, scope: &Scope) -> Value {
    let algo = Value::Algo(def.clone(), scope.clone());
    match def.name.split_once("::") {
        Some((struct_name, method_name)) => match scope.borrow().get(struct_name) {
            Value::StructDef(handle) => {
                handle
                    .methods
                    .borrow_mut()
                    .insert(SmolStr::new(method_name), def.clone());
                algo
            }
            _ => Value::error(format!("Runtime ERROR: struct '{struct_name}' is not defined")),
        },
        None => {
            scope.borrow_mut().set(&def.name, algo.clone());
            algo
        }
    }
}

fn eval_args(args: &[Node], scope: &Scope, io: &mut dyn HostIo) -> Result<Vec<Value>, Value> {
    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        let value = eval_node(arg, scope, io);
        if value.is_error() {
            return Err(value);
        }
        values.push(value);
    }
    Ok(values)
}

fn eval_algo_call(callee: &Node, args: &[Node], scope: &Scope, io: &mut dyn HostIo) -> Value {
    let callee = eval_node(callee, scope, io);
    if callee.is_error() {
        return callee;
    }
    match callee {
        Value::Algo(def, captured) => call_algo(&def, &captured, args, scope, io),
        Value::BuiltinAlgo(name) => call_builtin(&name, args, scope, io),
        Value::StructDef(handle) => construct_instance(&handle, args, scope, io),
        Value::BoundMethod(receiver, method) => call_bound_method(*receiver, &method, args, scope, io),
        _ => Value::error("Runtime ERROR: Not callable"),
    }
}

fn call_algo(
    def: &Rc<AlgoDef>,
    captured: &Scope,
    args: &[Node],
    caller_scope: &Scope,
    io: &mut dyn HostIo,
) -> Value {
    let values = match eval_args(args, caller_scope, io) {
        Ok(values) => values,
        Err(err) => return err,
    };
    tracing::debug!(name = %def.name, arity = values.len(), "calling algorithm");
    if values.len() < def.params.len() {
        return Value::error("Runtime ERROR: Too few arguments");
    }
    if values.len() > def.params.len() {
        return Value::error("Runtime ERROR: Too many arguments");
    }
    let call_scope = Rc::new(RefCell::new(SymbolTable::new(Some(captured.clone()))));
    for (param, value) in def.params.iter().zip(values) {
        call_scope.borrow_mut().set(param, value);
    }
    eval_block(&def.body, &call_scope, io)
}

fn call_builtin(name: &str, args: &[Node], scope: &Scope, io: &mut dyn HostIo) -> Value {
    let values = match eval_args(args, scope, io) {
        Ok(values) => values,
        Err(err) => return err,
    };
    if let Some(expected) = builtins::arity(name) {
        if values.len() != expected {
            return Value::error(format!(
                "Runtime ERROR: '{name}' expects {expected} argument(s), got {}",
                values.len()
            ));
        }
    }
    builtins::call(name, &values, io)
}

fn construct_instance(
    handle: &Rc<StructDefHandle>,
    args: &[Node],
    scope: &Scope,
    io: &mut dyn HostIo,
) -> Value {
    let members = handle
        .members
        .iter()
        .map(|m| (m.clone(), Value::None))
        .collect::<HashMap<_, _>>();
    let instance = Rc::new(InstanceHandle {
        struct_def: handle.clone(),
        members: RefCell::new(members),
    });
    if let Some(ctor) = handle.method("constructor") {
        let receiver = Value::Instance(instance.clone());
        let result = call_method(&ctor, receiver, args, scope, io);
        if result.is_error() {
            return result;
        }
    }
    Value::Instance(instance)
}

fn call_bound_method(
    receiver: Value,
    method: &str,
    args: &[Node],
    scope: &Scope,
    io: &mut dyn HostIo,
) -> Value {
    match &receiver {
        Value::Instance(instance) => {
            let Some(def) = instance.struct_def.method(method) else {
                return Value::error(format!(
                    "Runtime ERROR: '{method}' is not a method of {}",
                    instance.struct_def.name
                ));
            };
            call_method(&def, receiver, args, scope, io)
        }
        Value::Array(items) => array_method(items, method, args, scope, io),
        _ => Value::error("Runtime ERROR: Not callable"),
    }
}

/// A method call on an INSTANCE: `self` is bound in a scope parented at
/// root (not at the method's own captured scope — instances have no
/// lexical closure of their own), then the declared parameters are bound
/// from the call's arguments.
fn call_method(def: &Rc<AlgoDef>, receiver: Value, args: &[Node], caller_scope: &Scope, io: &mut dyn HostIo) -> Value {
    let values = match eval_args(args, caller_scope, io) {
        Ok(values) => values,
        Err(err) => return err,
    };
    if values.len() < def.params.len() {
        return Value::error("Runtime ERROR: Too few arguments");
    }
    if values.len() > def.params.len() {
        return Value::error("Runtime ERROR: Too many arguments");
    }
    let root = root_of(caller_scope);
    let call_scope = Rc::new(RefCell::new(SymbolTable::new(Some(root))));
    call_scope.borrow_mut().set("self", receiver);
    for (param, value) in def.params.iter().zip(values) {
        call_scope.borrow_mut().set(param, value);
    }
    eval_block(&def.body, &call_scope, io)
}

fn root_of(scope: &Scope) -> Scope {
    match scope.borrow().parent() {
        Some(parent) => root_of(&parent),
        None => scope.clone(),
    }
}

fn array_method(
    items: &Rc<RefCell<Vec<Value>>>,
    method: &str,
    args: &[Node],
    scope: &Scope,
    io: &mut dyn HostIo,
) -> Value {
    let values = match eval_args(args, scope, io) {
        Ok(values) => values,
        Err(err) => return err,
    };
    match method {
        "push" | "push_back" => {
            if values.len() != 1 {
                return Value::error(format!("Runtime ERROR: Expect one argument for {method}"));
            }
            items.borrow_mut().push(values.into_iter().next().unwrap());
            items.borrow().last().cloned().expect("just pushed")
        }
        "pop" | "pop_back" => {
            if !values.is_empty() {
                return Value::error(format!("Runtime ERROR: Expect zero argument for {method}"));
            }
            let popped = items.borrow_mut().pop();
            match popped {
                Some(value) => value,
                None => Value::error(format!("Runtime ERROR: Cannot {method} from an empty array")),
            }
        }
        "size" => {
            if !values.is_empty() {
                return Value::error("Runtime ERROR: Expect zero argument for size");
            }
            Value::Int(items.borrow().len() as i64)
        }
        "back" => {
            if !values.is_empty() {
                return Value::error("Runtime ERROR: Expect zero arguments for back");
            }
            match items.borrow().last() {
                Some(value) => value.clone(),
                None => Value::error("Runtime ERROR: Cannot call back on an empty array"),
            }
        }
        "resize" => {
            if values.len() != 1 {
                return Value::error("Runtime ERROR: Expect one argument for resize");
            }
            let Value::Int(new_size) = values[0] else {
                return Value::error("Runtime ERROR: Argument for resize must be an integer");
            };
            if new_size < 0 {
                return Value::error("Runtime ERROR: Resize argument cannot be negative");
            }
            items.borrow_mut().resize(new_size as usize, Value::None);
            Value::Array(items.clone())
        }
        other => Value::error(format!("Runtime ERROR: arrays have no method '{other}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hostio::BufferHostIo;
    use crate::lex::lex_all;
    use crate::parse::parse;
    use std::rc::Rc as StdRc;

    fn run(src: &str) -> (Value, BufferHostIo) {
        let tokens = lex_all(src, StdRc::from("test"));
        let nodes = parse(tokens);
        let root = SymbolTable::root();
        let mut io = BufferHostIo::default();
        let result = eval_program(&nodes, &root, &mut io);
        (result, io)
    }

    #[test]
    fn arithmetic_precedence_prints_seven() {
        let (_, io) = run("print(1 + 2 * 3)\n");
        assert_eq!(io.output, "7\n");
    }

    #[test]
    fn for_loop_accumulates_sum() {
        let (_, io) = run("s <- 0\nfor i <- 1 to 5 do s <- s + i\nprint(s)\n");
        assert_eq!(io.output, "15\n");
    }

    #[test]
    fn array_index_assignment_mutates_in_place() {
        let (_, io) = run("a <- {10, 20, 30}\na[2] <- 99\nprint(a)\n");
        assert_eq!(io.output, "{10, 99, 30}\n");
    }

    #[test]
    fn recursive_algorithm_computes_factorial() {
        let (_, io) = run("Algorithm fact(n):\n\tif n <= 1 then 1 else n * fact(n-1)\nprint(fact(5))\n");
        assert_eq!(io.output, "120\n");
    }

    #[test]
    fn struct_constructor_and_member_access() {
        let (_, io) = run(
            "Struct Pair:\n\tx\n\ty\n\tAlgorithm constructor(a, b):\n\t\tself.x <- a\n\t\tself.y <- b\np <- Pair(3, 4)\nprint(p.x + p.y)\n",
        );
        assert_eq!(io.output, "7\n");
    }

    #[test]
    fn division_by_zero_surfaces_as_error_value() {
        let (result, _) = run("print(1 / 0)\n");
        assert!(result.is_error());
    }

    #[test]
    fn array_push_and_pop_round_trip() {
        let (result, _) = run("a <- {1, 2}\na.push(3)\na.pop()\n");
        assert!(matches!(result, Value::Int(3)));
    }

    #[test]
    fn closures_capture_their_defining_scope() {
        let (_, io) = run(
            "x <- 10\nAlgorithm addx(n):\n\treturn n + x\nprint(addx(5))\n",
        );
        assert_eq!(io.output, "15\n");
    }
}

use indoc::indoc;

use crate::hostio::BufferHostIo;
use crate::run;
use crate::symbol::SymbolTable;
use crate::value::Value;

fn eval(source: &str) -> Value {
    let scope = SymbolTable::root();
    let mut io = BufferHostIo::default();
    run(source, "test", &scope, &mut io).expect("parses")
}

fn array_ints(value: &Value) -> Vec<i64> {
    match value {
        Value::Array(items) => items
            .borrow()
            .iter()
            .map(|v| match v {
                Value::Int(n) => *n,
                other => panic!("expected Int element, got {other:?}"),
            })
            .collect(),
        other => panic!("expected Array, got {other:?}"),
    }
}

#[test]
fn if_then_without_else_yields_zero_on_false_condition() {
    let result = eval("a <- 0\nif 1 then\n\ta <- 5\n");
    assert!(matches!(result, Value::Int(5)));
    let result = eval("a <- 0\nif 0 then\n\ta <- 5\n");
    assert!(matches!(result, Value::Int(0)));
}

#[test]
fn if_then_else_picks_the_taken_branch() {
    let result = eval("a <- 0\nif 1 then\n\ta <- 5\nelse\n\ta <- 10\n");
    assert!(matches!(result, Value::Int(5)));
    let result = eval("a <- 0\nif 0 then\n\ta <- 5\nelse\n\ta <- 10\n");
    assert!(matches!(result, Value::Int(10)));
}

#[test]
fn else_if_chain_falls_through_to_the_matching_branch() {
    let source = indoc! {"
        a <- 0
        if 0 then
        \ta <- 5
        else if 1 then
        \ta <- 10
        else
        \ta <- 15
    "};
    assert!(matches!(eval(source), Value::Int(10)));
}

#[test]
fn while_loop_accumulates_each_iteration_result_into_an_array() {
    let result = eval("i <- 0\nwhile i < 5 do\n\ti <- i + 1\n");
    assert_eq!(array_ints(&result), vec![1, 2, 3, 4, 5]);
}

#[test]
fn repeat_until_accumulates_each_iteration_result_into_an_array() {
    let result = eval("i <- 0; repeat i <- i + 1 until i = 5\n");
    assert_eq!(array_ints(&result), vec![1, 2, 3, 4, 5]);
}

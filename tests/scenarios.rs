// ABOUTME: Black-box end-to-end scenarios exercising the public parse/evaluate API

use lotus::{evaluate, parse};

fn run(source: &str) -> lotus::object::Value {
    let (program, errors) = parse(source);
    assert!(errors.is_empty(), "unexpected parse errors: {:?}", errors);
    evaluate(&program, None)
}

#[test]
fn reassignment_updates_the_existing_binding() {
    assert_eq!(run("integer a = 5; a = 6; a;").to_string(), "6");
}

#[test]
fn insert_shifts_later_elements() {
    assert_eq!(
        run("collection<integer> c = [1,2,3]; c.insert(1, 10); c;").to_string(),
        "[1, 10, 2, 3]"
    );
}

#[test]
fn function_call_returns_its_result() {
    assert_eq!(run("integer(integer x) f { return x + 2; } f(3);").to_string(), "5");
}

#[test]
fn dictionary_lookups_combine() {
    assert_eq!(
        run("dictionary<character, integer> d = {'a':1,'b':2}; d['a'] + d['b'];").to_string(),
        "3"
    );
}

#[test]
fn for_loop_accumulates() {
    assert_eq!(
        run("integer i = 0; for (integer j=0; j<5; j=j+1) { i = i + j; } i;").to_string(),
        "10"
    );
}

#[test]
fn iterate_breaks_early() {
    assert_eq!(
        run("integer i = 0; iterate(v : [1,2,3,4]) { if (v==3) { break; } i = i + v; } i;").to_string(),
        "3"
    );
}

#[test]
fn mismatched_infix_types_report_the_operator() {
    assert_eq!(run("5 + true;").to_string(), "Evaluation Error: 'integer + boolean' is not supported.");
}

#[test]
fn division_by_zero_is_reported() {
    assert_eq!(run("5 / 0;").to_string(), "Evaluation Error: Attempted division by zero.");
}

#[test]
fn top_level_break_is_reported() {
    assert_eq!(run("break;").to_string(), "Evaluation Error: Attempted to break outside a loop.");
}

#[test]
fn non_hashable_dictionary_key_is_reported() {
    assert_eq!(
        run("{\"hello\": 2};").to_string(),
        "Evaluation Error: Invalid dictionary key type. string is not a hashable type."
    );
}

#[test]
fn non_hashable_key_is_reported_before_the_value_expression_ever_runs() {
    // The key is fully validated before the value is evaluated, so a
    // division-by-zero value expression never runs here.
    assert_eq!(
        run("{\"hello\": 1/0};").to_string(),
        "Evaluation Error: Invalid dictionary key type. string is not a hashable type."
    );
}

#[test]
fn integer_literal_round_trips_through_display() {
    let (program, errors) = parse("42;");
    assert!(errors.is_empty());
    assert_eq!(program.to_string(), "42;");
}

#[test]
fn append_extends_a_declared_collection() {
    assert_eq!(
        run("collection<integer> c = [1, 2]; c.append(9); c[c.size - 1];").to_string(),
        "9"
    );
}

#[test]
fn calling_a_property_with_parens_is_an_error() {
    assert_eq!(
        run("collection<integer> c = [1, 2]; c.size();").to_string(),
        "Evaluation Error: 'integer' is not callable."
    );
}

#[test]
fn dictionary_index_assignment_is_read_back() {
    assert_eq!(
        run("dictionary<integer, integer> d = {1: 10}; d[1] = 20; d[1];").to_string(),
        "20"
    );
}

#[test]
fn integer_infix_never_promotes_without_a_float_operand() {
    assert_eq!(run("float f = 1 + 2; f;").to_string(), "Evaluation Error: Declared type float does not match initializer type integer.");
}

#[test]
fn function_declaration_does_not_execute_its_body() {
    // The function body references an undefined name; if the body ran at
    // declaration time this would error before `f(1)` is ever called.
    assert_eq!(
        run("integer(integer x) f { return undefined_name; } integer y = 1; y;").to_string(),
        "1"
    );
}

#[test]
fn continue_skips_to_the_next_iteration() {
    assert_eq!(
        run("integer total = 0; for (integer j = 0; j < 5; j = j + 1) { if (j == 2) { continue; } total += j; } total;")
            .to_string(),
        "8"
    );
}

#[test]
fn shadowing_in_a_block_does_not_affect_the_outer_binding() {
    assert_eq!(
        run("integer x = 1; if (true) { integer x = 2; } x;").to_string(),
        "1"
    );
}

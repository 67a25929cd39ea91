// ABOUTME: Tree-walking evaluator over the parsed AST

use crate::ast::{Expression, Program, Statement};
use crate::builtins;
use crate::env::Environment;
use crate::error::EvalError;
use crate::object::{DictKey, Function, Value, ValueType};
use std::rc::Rc;
use std::time::Instant;

fn err(e: EvalError) -> Value {
    Value::Error(e.to_string())
}

fn check_deadline(deadline: Option<Instant>) -> Option<Value> {
    if let Some(d) = deadline {
        if Instant::now() >= d {
            return Some(err(EvalError::Timeout));
        }
    }
    None
}

/// Converts a bare `Break`/`Continue` that escaped every enclosing loop into
/// the error the language specifies; passes everything else through.
fn finalize_loop_control(value: Value) -> Value {
    match value {
        Value::Break => err(EvalError::BreakOutsideLoop),
        Value::Continue => err(EvalError::ContinueOutsideLoop),
        other => other,
    }
}

/// Evaluates a whole program, unwrapping a top-level `return` into its
/// value and converting a top-level `break`/`continue` into an error.
pub fn evaluate(program: &Program, env: &Rc<Environment>, deadline: Option<Instant>) -> Value {
    let mut result = Value::Null;
    for stmt in &program.statements {
        result = eval_statement(stmt, env, deadline);
        match result {
            Value::Return(inner) => return *inner,
            Value::Break | Value::Continue => return finalize_loop_control(result),
            Value::Error(_) => return result,
            _ => {}
        }
    }
    result
}

fn eval_block(block: &crate::ast::BlockStatement, env: &Rc<Environment>, deadline: Option<Instant>) -> Value {
    for stmt in &block.statements {
        let result = eval_statement(stmt, env, deadline);
        match result {
            Value::Return(_) | Value::Break | Value::Continue | Value::Error(_) => return result,
            _ => {}
        }
    }
    Value::Null
}

fn eval_statement(stmt: &Statement, env: &Rc<Environment>, deadline: Option<Instant>) -> Value {
    if let Some(timeout) = check_deadline(deadline) {
        return timeout;
    }
    match stmt {
        Statement::DeclareVariable {
            var_type,
            name,
            value,
            ..
        } => {
            if env.is_locally_bound(name) {
                return err(EvalError::AlreadyDefined { name: name.clone() });
            }
            let declared = ValueType::from_type_token(*var_type).expect("declared variable type token");
            let val = match value {
                Some(expr) => {
                    let v = eval_expression(expr, env, deadline);
                    if v.is_error() {
                        return v;
                    }
                    v
                }
                None => Value::Null,
            };
            if val.value_type() != ValueType::Null && val.value_type() != declared {
                return err(EvalError::DeclarationTypeMismatch {
                    declared: declared.name().to_string(),
                    actual: val.type_name(),
                });
            }
            env.set(name.clone(), val);
            Value::Null
        }
        Statement::DeclareCollection {
            element_type,
            name,
            value,
            ..
        } => {
            if env.is_locally_bound(name) {
                return err(EvalError::AlreadyDefined { name: name.clone() });
            }
            let declared_elem =
                ValueType::from_type_token(*element_type).expect("declared collection element type token");
            let val = match value {
                Some(expr) => {
                    let v = eval_expression(expr, env, deadline);
                    if v.is_error() {
                        return v;
                    }
                    match &v {
                        Value::Collection { element_type, .. } => {
                            let inferred = element_type.get();
                            if inferred != ValueType::Null && inferred != declared_elem {
                                return err(EvalError::DeclarationTypeMismatch {
                                    declared: declared_elem.name().to_string(),
                                    actual: inferred.name().to_string(),
                                });
                            }
                            element_type.set(declared_elem);
                        }
                        other => {
                            return err(EvalError::DeclarationTypeMismatch {
                                declared: ValueType::Collection.name().to_string(),
                                actual: other.type_name(),
                            });
                        }
                    }
                    v
                }
                None => Value::new_collection(declared_elem, vec![]),
            };
            env.set(name.clone(), val);
            Value::Null
        }
        Statement::DeclareDictionary {
            key_type,
            value_type,
            name,
            value,
            ..
        } => {
            if env.is_locally_bound(name) {
                return err(EvalError::AlreadyDefined { name: name.clone() });
            }
            let declared_key = ValueType::from_type_token(*key_type).expect("declared dictionary key type token");
            let declared_value =
                ValueType::from_type_token(*value_type).expect("declared dictionary value type token");
            let val = match value {
                Some(expr) => {
                    let v = eval_expression(expr, env, deadline);
                    if v.is_error() {
                        return v;
                    }
                    match &v {
                        Value::Dictionary {
                            key_type: inferred_key,
                            value_type: inferred_value,
                            ..
                        } => {
                            let ik = inferred_key.get();
                            let iv = inferred_value.get();
                            if ik != ValueType::Null && ik != declared_key {
                                return err(EvalError::DeclarationTypeMismatch {
                                    declared: declared_key.name().to_string(),
                                    actual: ik.name().to_string(),
                                });
                            }
                            if iv != ValueType::Null && iv != declared_value {
                                return err(EvalError::DeclarationTypeMismatch {
                                    declared: declared_value.name().to_string(),
                                    actual: iv.name().to_string(),
                                });
                            }
                            inferred_key.set(declared_key);
                            inferred_value.set(declared_value);
                        }
                        other => {
                            return err(EvalError::DeclarationTypeMismatch {
                                declared: ValueType::Dictionary.name().to_string(),
                                actual: other.type_name(),
                            });
                        }
                    }
                    v
                }
                None => Value::new_dictionary(declared_key, declared_value, indexmap::IndexMap::new()),
            };
            env.set(name.clone(), val);
            Value::Null
        }
        Statement::DeclareFunction {
            return_type,
            name,
            parameters,
            body,
            ..
        } => {
            if env.is_locally_bound(name) {
                return err(EvalError::AlreadyDefined { name: name.clone() });
            }
            let function = Value::Function(Rc::new(Function {
                name: name.clone(),
                return_type: ValueType::from_type_token(*return_type).expect("declared function return type token"),
                parameters: parameters.clone(),
                body: body.clone(),
                env: env.clone(),
            }));
            env.set(name.clone(), function);
            Value::Null
        }
        Statement::Return { value, .. } => {
            let v = match value {
                Some(expr) => {
                    let v = eval_expression(expr, env, deadline);
                    if v.is_error() {
                        return v;
                    }
                    v
                }
                None => Value::Null,
            };
            Value::Return(Box::new(v))
        }
        Statement::ExpressionStatement { expression, .. } => eval_expression(expression, env, deadline),
        Statement::If {
            condition,
            consequence,
            alternative,
            ..
        } => match condition {
            None => {
                let child = Environment::with_parent(env.clone());
                eval_block(consequence, &child, deadline)
            }
            Some(cond_expr) => {
                let cond_val = eval_expression(cond_expr, env, deadline);
                if cond_val.is_error() {
                    return cond_val;
                }
                let truthy = match cond_val.truthy() {
                    Some(b) => b,
                    None => return err(EvalError::NotTruthy(cond_val.to_string())),
                };
                if truthy {
                    let child = Environment::with_parent(env.clone());
                    eval_block(consequence, &child, deadline)
                } else if let Some(alt) = alternative {
                    eval_statement(alt, env, deadline)
                } else {
                    Value::Null
                }
            }
        },
        Statement::While { condition, body, .. } => {
            let loop_env = Environment::with_parent(env.clone());
            loop {
                if let Some(t) = check_deadline(deadline) {
                    return t;
                }
                let cond_val = eval_expression(condition, &loop_env, deadline);
                if cond_val.is_error() {
                    return cond_val;
                }
                let truthy = match cond_val.truthy() {
                    Some(b) => b,
                    None => return err(EvalError::NotTruthy(cond_val.to_string())),
                };
                if !truthy {
                    break;
                }
                let body_env = Environment::with_parent(loop_env.clone());
                match eval_block(body, &body_env, deadline) {
                    Value::Break => break,
                    Value::Continue => continue,
                    result @ (Value::Return(_) | Value::Error(_)) => return result,
                    _ => {}
                }
            }
            Value::Null
        }
        Statement::DoWhile { body, condition, .. } => {
            let loop_env = Environment::with_parent(env.clone());
            loop {
                if let Some(t) = check_deadline(deadline) {
                    return t;
                }
                let body_env = Environment::with_parent(loop_env.clone());
                match eval_block(body, &body_env, deadline) {
                    Value::Break => break,
                    Value::Continue => {}
                    result @ (Value::Return(_) | Value::Error(_)) => return result,
                    _ => {}
                }
                let cond_val = eval_expression(condition, &loop_env, deadline);
                if cond_val.is_error() {
                    return cond_val;
                }
                let truthy = match cond_val.truthy() {
                    Some(b) => b,
                    None => return err(EvalError::NotTruthy(cond_val.to_string())),
                };
                if !truthy {
                    break;
                }
            }
            Value::Null
        }
        Statement::For {
            init,
            condition,
            update,
            body,
            ..
        } => {
            let loop_env = Environment::with_parent(env.clone());
            if let Some(init_stmt) = init {
                let r = eval_statement(init_stmt, &loop_env, deadline);
                if r.is_error() {
                    return r;
                }
            }
            loop {
                if let Some(t) = check_deadline(deadline) {
                    return t;
                }
                let cond_val = eval_expression(condition, &loop_env, deadline);
                if cond_val.is_error() {
                    return cond_val;
                }
                let truthy = match cond_val.truthy() {
                    Some(b) => b,
                    None => return err(EvalError::NotTruthy(cond_val.to_string())),
                };
                if !truthy {
                    break;
                }
                let inner_env = Environment::with_parent(loop_env.clone());
                match eval_block(body, &inner_env, deadline) {
                    Value::Break => break,
                    Value::Continue => {}
                    result @ (Value::Return(_) | Value::Error(_)) => return result,
                    _ => {}
                }
                if let Some(update_stmt) = update {
                    let r = eval_statement(update_stmt, &loop_env, deadline);
                    if r.is_error() {
                        return r;
                    }
                }
            }
            Value::Null
        }
        Statement::Iterate {
            variable,
            iterable,
            body,
            ..
        } => {
            let iterable_val = eval_expression(iterable, env, deadline);
            if iterable_val.is_error() {
                return iterable_val;
            }
            let elements = match &iterable_val {
                Value::Collection { elements, .. } => elements.borrow().clone(),
                other => return err(EvalError::NotIterable(other.type_name())),
            };
            // Reuses one frame across every iteration, per the loop variable's
            // persistent identity.
            let iter_env = Environment::with_parent(env.clone());
            for element in elements {
                if let Some(t) = check_deadline(deadline) {
                    return t;
                }
                iter_env.set(variable.clone(), element);
                match eval_block(body, &iter_env, deadline) {
                    Value::Break => break,
                    Value::Continue => continue,
                    result @ (Value::Return(_) | Value::Error(_)) => return result,
                    _ => {}
                }
            }
            Value::Null
        }
        Statement::Break { .. } => Value::Break,
        Statement::Continue { .. } => Value::Continue,
    }
}

fn eval_expression(expr: &Expression, env: &Rc<Environment>, deadline: Option<Instant>) -> Value {
    if let Some(timeout) = check_deadline(deadline) {
        return timeout;
    }
    match expr {
        Expression::Identifier { name, .. } => match env.get(name) {
            Some(v) => v,
            None => match builtins::lookup_global(name) {
                Some(v) => v,
                None => err(EvalError::NotDefined(name.clone())),
            },
        },
        Expression::IntegerLiteral { value, .. } => Value::Integer(*value),
        Expression::FloatLiteral { value, .. } => Value::Float(*value),
        Expression::BooleanLiteral { value, .. } => Value::Boolean(*value),
        Expression::CharacterLiteral { value, .. } => Value::Character(*value),
        Expression::CollectionLiteral { elements, .. } => {
            let mut values = Vec::with_capacity(elements.len());
            let mut elem_type = ValueType::Null;
            for (i, e) in elements.iter().enumerate() {
                let v = eval_expression(e, env, deadline);
                if v.is_error() {
                    return v;
                }
                if i == 0 {
                    elem_type = v.value_type();
                } else if v.value_type() != elem_type {
                    return err(EvalError::NonUniformCollection { text: expr.to_string() });
                }
                values.push(v);
            }
            Value::new_collection(elem_type, values)
        }
        Expression::DictionaryLiteral { pairs, .. } => {
            // Each key is fully validated (error, hashability, uniform key
            // type, duplicate) before its value expression is evaluated.
            let mut map = indexmap::IndexMap::new();
            let mut key_type = ValueType::Null;
            let mut value_type = ValueType::Null;
            for (k_expr, v_expr) in pairs.iter() {
                let k_val = eval_expression(k_expr, env, deadline);
                if k_val.is_error() {
                    return k_val;
                }
                if !k_val.value_type().is_hashable() {
                    return err(EvalError::NonHashableKey(k_val.type_name()));
                }
                if key_type != ValueType::Null && k_val.value_type() != key_type {
                    return err(EvalError::NonUniformDictionaryKeys { text: expr.to_string() });
                }
                if key_type == ValueType::Null {
                    key_type = k_val.value_type();
                }
                let key = DictKey::try_from(&k_val).expect("hashability already checked");
                if map.contains_key(&key) {
                    return err(EvalError::DuplicateKey);
                }

                let v_val = eval_expression(v_expr, env, deadline);
                if v_val.is_error() {
                    return v_val;
                }
                if value_type != ValueType::Null && v_val.value_type() != value_type {
                    return err(EvalError::NonUniformDictionaryValues { text: expr.to_string() });
                }
                if value_type == ValueType::Null {
                    value_type = v_val.value_type();
                }

                map.insert(key, v_val);
            }
            Value::new_dictionary(key_type, value_type, map)
        }
        Expression::StringLiteral { characters, .. } => {
            let mut s = String::with_capacity(characters.len());
            for c in characters {
                match eval_expression(c, env, deadline) {
                    Value::Character(ch) => s.push(ch),
                    other if other.is_error() => return other,
                    _ => unreachable!("string literal children are always CharacterLiteral"),
                }
            }
            Value::String(Rc::new(s))
        }
        Expression::FunctionLiteral {
            return_type,
            parameters,
            body,
            ..
        } => Value::Function(Rc::new(Function {
            name: "<anonymous>".to_string(),
            return_type: ValueType::from_type_token(*return_type).expect("function literal return type token"),
            parameters: parameters.clone(),
            body: body.clone(),
            env: env.clone(),
        })),
        Expression::Prefix { operator, right, .. } => {
            let r = eval_expression(right, env, deadline);
            if r.is_error() {
                return r;
            }
            eval_prefix_op(operator, &r)
        }
        Expression::Postfix { operator, left, .. } => {
            let current = eval_expression(left, env, deadline);
            if current.is_error() {
                return current;
            }
            let new_val = match &current {
                Value::Integer(i) => Value::Integer(if operator == "++" { i.wrapping_add(1) } else { i.wrapping_sub(1) }),
                Value::Float(v) => Value::Float(if operator == "++" { v + 1.0 } else { v - 1.0 }),
                other => {
                    return err(EvalError::UnaryOperatorNotSupported {
                        op: operator.clone(),
                        operand_type: other.type_name(),
                    });
                }
            };
            let write = eval_assign_to(left, new_val, env, deadline);
            if write.is_error() {
                return write;
            }
            current
        }
        Expression::Infix {
            operator, left, right, ..
        } => match operator.as_str() {
            "=" => eval_assign(left, right, env, deadline),
            "+=" | "-=" | "*=" | "/=" | "%=" => eval_compound_assign(operator, left, right, env, deadline),
            "&&" => {
                let l = eval_expression(left, env, deadline);
                if l.is_error() {
                    return l;
                }
                let lt = match l.truthy() {
                    Some(b) => b,
                    None => return err(EvalError::NotTruthy(l.to_string())),
                };
                if !lt {
                    return Value::Boolean(false);
                }
                let r = eval_expression(right, env, deadline);
                if r.is_error() {
                    return r;
                }
                match r.truthy() {
                    Some(b) => Value::Boolean(b),
                    None => err(EvalError::NotTruthy(r.to_string())),
                }
            }
            "||" => {
                let l = eval_expression(left, env, deadline);
                if l.is_error() {
                    return l;
                }
                let lt = match l.truthy() {
                    Some(b) => b,
                    None => return err(EvalError::NotTruthy(l.to_string())),
                };
                if lt {
                    return Value::Boolean(true);
                }
                let r = eval_expression(right, env, deadline);
                if r.is_error() {
                    return r;
                }
                match r.truthy() {
                    Some(b) => Value::Boolean(b),
                    None => err(EvalError::NotTruthy(r.to_string())),
                }
            }
            op => {
                let l = eval_expression(left, env, deadline);
                if l.is_error() {
                    return l;
                }
                let r = eval_expression(right, env, deadline);
                if r.is_error() {
                    return r;
                }
                eval_binary_op(op, &l, &r)
            }
        },
        Expression::Call { function, arguments, .. } => {
            let callee = eval_expression(function, env, deadline);
            if callee.is_error() {
                return callee;
            }
            let mut args = Vec::with_capacity(arguments.len());
            for a in arguments {
                let v = eval_expression(a, env, deadline);
                if v.is_error() {
                    return v;
                }
                args.push(v);
            }
            match callee {
                Value::Function(func) => call_function(&func, args, deadline),
                Value::Builtin(b) => match (b.func)(b.receiver.as_deref(), &args) {
                    Ok(v) => v,
                    Err(e) => err(e),
                },
                other => err(EvalError::NotCallable(describe_callee(function, &other))),
            }
        }
        Expression::Index { left, index, .. } => {
            let container = eval_expression(left, env, deadline);
            if container.is_error() {
                return container;
            }
            let idx = eval_expression(index, env, deadline);
            if idx.is_error() {
                return idx;
            }
            eval_index_read(&container, &idx)
        }
        Expression::Member { object, name, .. } => {
            let obj = eval_expression(object, env, deadline);
            if obj.is_error() {
                return obj;
            }
            match builtins::member(&obj, name) {
                Ok(v) => v,
                Err(e) => err(e),
            }
        }
    }
}

fn describe_callee(function: &Expression, value: &Value) -> String {
    if let Expression::Identifier { name, .. } = function {
        name.clone()
    } else {
        value.type_name()
    }
}

fn eval_prefix_op(operator: &str, right: &Value) -> Value {
    match operator {
        "!" => match right {
            Value::Integer(i) => Value::Boolean(*i == 0),
            Value::Float(v) => Value::Boolean(*v == 0.0),
            Value::Boolean(b) => Value::Boolean(!b),
            other => err(EvalError::UnaryOperatorNotSupported {
                op: "!".to_string(),
                operand_type: other.type_name(),
            }),
        },
        "-" => match right {
            Value::Integer(i) => Value::Integer(i.wrapping_neg()),
            Value::Float(v) => Value::Float(-v),
            other => err(EvalError::UnaryOperatorNotSupported {
                op: "-".to_string(),
                operand_type: other.type_name(),
            }),
        },
        _ => err(EvalError::UnaryOperatorNotSupported {
            op: operator.to_string(),
            operand_type: right.type_name(),
        }),
    }
}

fn eval_binary_op(op: &str, l: &Value, r: &Value) -> Value {
    match (l, r) {
        (Value::Integer(a), Value::Integer(b)) => eval_integer_op(op, *a, *b),
        (Value::Float(a), Value::Float(b)) => eval_float_op(op, *a, *b),
        (Value::Integer(a), Value::Float(b)) => eval_float_op(op, *a as f32, *b),
        (Value::Float(a), Value::Integer(b)) => eval_float_op(op, *a, *b as f32),
        (Value::Boolean(a), Value::Boolean(b)) => eval_bool_op(op, *a, *b, l, r),
        (Value::Character(a), Value::Character(b)) => eval_char_op(op, *a, *b, l, r),
        _ => err(EvalError::OperatorNotSupported {
            lhs: l.type_name(),
            op: op.to_string(),
            rhs: r.type_name(),
        }),
    }
}

fn eval_integer_op(op: &str, a: i32, b: i32) -> Value {
    match op {
        "+" => Value::Integer(a.wrapping_add(b)),
        "-" => Value::Integer(a.wrapping_sub(b)),
        "*" => Value::Integer(a.wrapping_mul(b)),
        "/" => {
            if b == 0 {
                err(EvalError::DivisionByZero)
            } else {
                Value::Integer(a.wrapping_div(b))
            }
        }
        "%" => {
            if b == 0 {
                err(EvalError::ModuloByZero)
            } else {
                Value::Integer(a.wrapping_rem(b))
            }
        }
        "<" => Value::Boolean(a < b),
        ">" => Value::Boolean(a > b),
        "<=" => Value::Boolean(a <= b),
        ">=" => Value::Boolean(a >= b),
        "==" => Value::Boolean(a == b),
        "!=" => Value::Boolean(a != b),
        _ => err(EvalError::OperatorNotSupported {
            lhs: "integer".to_string(),
            op: op.to_string(),
            rhs: "integer".to_string(),
        }),
    }
}

fn eval_float_op(op: &str, a: f32, b: f32) -> Value {
    match op {
        "+" => Value::Float(a + b),
        "-" => Value::Float(a - b),
        "*" => Value::Float(a * b),
        "/" => {
            if b == 0.0 {
                err(EvalError::DivisionByZero)
            } else {
                Value::Float(a / b)
            }
        }
        "%" => {
            if b == 0.0 {
                err(EvalError::ModuloByZero)
            } else {
                Value::Float(a % b)
            }
        }
        "<" => Value::Boolean(a < b),
        ">" => Value::Boolean(a > b),
        "<=" => Value::Boolean(a <= b),
        ">=" => Value::Boolean(a >= b),
        "==" => Value::Boolean(a == b),
        "!=" => Value::Boolean(a != b),
        _ => err(EvalError::OperatorNotSupported {
            lhs: "float".to_string(),
            op: op.to_string(),
            rhs: "float".to_string(),
        }),
    }
}

fn eval_bool_op(op: &str, a: bool, b: bool, l: &Value, r: &Value) -> Value {
    match op {
        "==" => Value::Boolean(a == b),
        "!=" => Value::Boolean(a != b),
        _ => err(EvalError::OperatorNotSupported {
            lhs: l.type_name(),
            op: op.to_string(),
            rhs: r.type_name(),
        }),
    }
}

fn eval_char_op(op: &str, a: char, b: char, l: &Value, r: &Value) -> Value {
    match op {
        "==" => Value::Boolean(a == b),
        "!=" => Value::Boolean(a != b),
        "<" => Value::Boolean(a < b),
        ">" => Value::Boolean(a > b),
        "<=" => Value::Boolean(a <= b),
        ">=" => Value::Boolean(a >= b),
        _ => err(EvalError::OperatorNotSupported {
            lhs: l.type_name(),
            op: op.to_string(),
            rhs: r.type_name(),
        }),
    }
}

fn eval_index_read(container: &Value, idx: &Value) -> Value {
    match container {
        Value::Collection { elements, .. } => {
            let i = match idx {
                Value::Integer(i) => *i,
                other => return err(EvalError::NotIndexable(other.type_name())),
            };
            let elems = elements.borrow();
            if i < 0 || i as usize >= elems.len() {
                return err(EvalError::IndexOutOfBounds { index: i, size: elems.len() });
            }
            elems[i as usize].clone()
        }
        Value::Dictionary { key_type, entries, .. } => {
            let key = match DictKey::try_from(idx) {
                Ok(k) => k,
                Err(()) => return err(EvalError::NonHashableKey(idx.type_name())),
            };
            let kt = key_type.get();
            if kt != ValueType::Null && idx.value_type() != kt {
                return err(EvalError::OperatorNotSupported {
                    lhs: kt.name().to_string(),
                    op: "[]".to_string(),
                    rhs: idx.type_name(),
                });
            }
            match entries.borrow().get(&key) {
                Some(v) => v.clone(),
                None => err(EvalError::KeyNotFound),
            }
        }
        Value::String(s) => {
            let i = match idx {
                Value::Integer(i) => *i,
                other => return err(EvalError::NotIndexable(other.type_name())),
            };
            let chars: Vec<char> = s.chars().collect();
            if i < 0 || i as usize >= chars.len() {
                return err(EvalError::IndexOutOfBounds { index: i, size: chars.len() });
            }
            Value::Character(chars[i as usize])
        }
        other => err(EvalError::NotIndexable(other.type_name())),
    }
}

fn eval_assign(left: &Expression, right: &Expression, env: &Rc<Environment>, deadline: Option<Instant>) -> Value {
    let val = eval_expression(right, env, deadline);
    if val.is_error() {
        return val;
    }
    eval_assign_to(left, val, env, deadline)
}

fn eval_assign_to(left: &Expression, val: Value, env: &Rc<Environment>, deadline: Option<Instant>) -> Value {
    match left {
        Expression::Identifier { name, .. } => {
            let existing = match env.get(name) {
                Some(v) => v,
                None => return err(EvalError::NotDefined(name.clone())),
            };
            if existing.value_type() != val.value_type() {
                return err(EvalError::AssignTypeMismatch {
                    name: name.clone(),
                    target_type: existing.type_name(),
                    value_type: val.type_name(),
                });
            }
            env.reassign(name, val.clone());
            val
        }
        Expression::Index { left, index, .. } => eval_index_assign(left, index, val, env, deadline),
        other => err(EvalError::NotIndexable(other.to_string())),
    }
}

fn eval_index_assign(
    container_expr: &Expression,
    index_expr: &Expression,
    val: Value,
    env: &Rc<Environment>,
    deadline: Option<Instant>,
) -> Value {
    let container = eval_expression(container_expr, env, deadline);
    if container.is_error() {
        return container;
    }
    let idx = eval_expression(index_expr, env, deadline);
    if idx.is_error() {
        return idx;
    }
    match &container {
        Value::Collection { element_type, elements } => {
            let i = match &idx {
                Value::Integer(i) => *i,
                other => return err(EvalError::NotIndexable(other.type_name())),
            };
            let mut elems = elements.borrow_mut();
            if i < 0 || i as usize >= elems.len() {
                return err(EvalError::IndexOutOfBounds { index: i, size: elems.len() });
            }
            let current = element_type.get();
            if current != ValueType::Null && val.value_type() != current {
                return err(EvalError::OperatorNotSupported {
                    lhs: current.name().to_string(),
                    op: "=".to_string(),
                    rhs: val.type_name(),
                });
            }
            elems[i as usize] = val.clone();
            val
        }
        Value::Dictionary {
            key_type,
            value_type,
            entries,
        } => {
            let key = match DictKey::try_from(&idx) {
                Ok(k) => k,
                Err(()) => return err(EvalError::NonHashableKey(idx.type_name())),
            };
            let kt = key_type.get();
            if kt != ValueType::Null && idx.value_type() != kt {
                return err(EvalError::OperatorNotSupported {
                    lhs: kt.name().to_string(),
                    op: "[]".to_string(),
                    rhs: idx.type_name(),
                });
            }
            let vt = value_type.get();
            if vt != ValueType::Null && val.value_type() != vt {
                return err(EvalError::OperatorNotSupported {
                    lhs: vt.name().to_string(),
                    op: "=".to_string(),
                    rhs: val.type_name(),
                });
            }
            key_type.set(idx.value_type());
            value_type.set(val.value_type());
            entries.borrow_mut().insert(key, val.clone());
            val
        }
        Value::String(_) => err(EvalError::ImmutableString),
        other => err(EvalError::NotIndexable(other.type_name())),
    }
}

fn eval_compound_assign(
    op: &str,
    left: &Expression,
    right: &Expression,
    env: &Rc<Environment>,
    deadline: Option<Instant>,
) -> Value {
    let is_location = matches!(left, Expression::Identifier { .. } | Expression::Index { .. });
    let current = eval_expression(left, env, deadline);
    if current.is_error() {
        return current;
    }
    let rhs = eval_expression(right, env, deadline);
    if rhs.is_error() {
        return rhs;
    }
    if !is_location {
        return err(EvalError::OperatorNotSupported {
            lhs: current.type_name(),
            op: op.to_string(),
            rhs: rhs.type_name(),
        });
    }
    let base_op = &op[..op.len() - 1];
    let combined = eval_binary_op(base_op, &current, &rhs);
    if combined.is_error() {
        return combined;
    }
    eval_assign_to(left, combined, env, deadline)
}

fn call_function(func: &Function, args: Vec<Value>, deadline: Option<Instant>) -> Value {
    if args.len() != func.parameters.len() {
        return err(EvalError::ArityMismatch {
            function: func.name.clone(),
            expected: func.parameters.len(),
            actual: args.len(),
        });
    }
    for (param, arg) in func.parameters.iter().zip(args.iter()) {
        let expected = ValueType::from_type_token(param.var_type).expect("parameter type token");
        if arg.value_type() != expected {
            return err(EvalError::ParameterTypeMismatch {
                function: func.name.clone(),
                parameter: param.name.clone(),
                expected: expected.name().to_string(),
                actual: arg.type_name(),
            });
        }
    }
    let call_env = Environment::with_parent(func.env.clone());
    for (param, arg) in func.parameters.iter().zip(args.into_iter()) {
        call_env.set(param.name.clone(), arg);
    }
    let result = finalize_loop_control(eval_block(&func.body, &call_env, deadline));
    match result {
        Value::Return(inner) => {
            let inner = *inner;
            if inner.value_type() != func.return_type {
                return err(EvalError::ReturnTypeMismatch {
                    function: func.name.clone(),
                    expected: func.return_type.name().to_string(),
                    actual: inner.type_name(),
                });
            }
            inner
        }
        Value::Null => err(EvalError::NoReturnValue(func.name.clone())),
        other => other,
    }
}

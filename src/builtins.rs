// ABOUTME: Global functions and the per-type member access table

use crate::error::EvalError;
use crate::object::{Builtin, DictKey, Value, ValueType};

/// Declares a function matching the uniform `(receiver, args)` signature
/// every builtin — global or bound — is invoked through.
macro_rules! define_builtin {
    ($name:ident, |$receiver:ident, $args:ident| $body:block) => {
        fn $name($receiver: Option<&Value>, $args: &[Value]) -> Result<Value, EvalError> {
            $body
        }
    };
}

define_builtin!(log_builtin, |_receiver, args| {
    let rendered: Vec<String> = args.iter().map(|v| v.to_string()).collect();
    println!("{}", rendered.join(" "));
    Ok(Value::Null)
});

/// Looks up a global (unbound) builtin by name — currently only `log`.
/// Consulted when an identifier does not resolve in the environment.
pub fn lookup_global(name: &str) -> Option<Value> {
    match name {
        "log" => Some(Value::Builtin(Box::new(Builtin {
            name: "log".to_string(),
            func: log_builtin,
            receiver: None,
        }))),
        _ => None,
    }
}

fn arity_error(function: &str, expected: usize, actual: usize) -> EvalError {
    EvalError::ArityMismatch {
        function: function.to_string(),
        expected,
        actual,
    }
}

fn expect_integer(function: &str, value: &Value) -> Result<i32, EvalError> {
    match value {
        Value::Integer(i) => Ok(*i),
        other => Err(EvalError::ParameterTypeMismatch {
            function: function.to_string(),
            parameter: "index".to_string(),
            expected: ValueType::Integer.name().to_string(),
            actual: other.type_name(),
        }),
    }
}

define_builtin!(collection_append, |receiver, args| {
    let receiver = receiver.expect("append is always invoked with a bound receiver");
    let Value::Collection {
        element_type,
        elements,
    } = receiver
    else {
        unreachable!("append is only ever bound to a Collection value")
    };
    if args.len() != 1 {
        return Err(arity_error("append", 1, args.len()));
    }
    let value = &args[0];
    let current = element_type.get();
    if current == ValueType::Null {
        element_type.set(value.value_type());
    } else if value.value_type() != current {
        return Err(EvalError::NonUniformCollection {
            text: receiver.to_string(),
        });
    }
    elements.borrow_mut().push(value.clone());
    Ok(Value::Null)
});

define_builtin!(collection_pop, |receiver, args| {
    let receiver = receiver.expect("pop is always invoked with a bound receiver");
    let Value::Collection { elements, .. } = receiver else {
        unreachable!("pop is only ever bound to a Collection value")
    };
    if args.len() > 1 {
        return Err(arity_error("pop", 1, args.len()));
    }
    let mut elements = elements.borrow_mut();
    let index = if let Some(arg) = args.first() {
        let i = expect_integer("pop", arg)?;
        if i < 0 || i as usize >= elements.len() {
            return Err(EvalError::IndexOutOfBounds {
                index: i,
                size: elements.len(),
            });
        }
        i as usize
    } else {
        if elements.is_empty() {
            return Err(EvalError::IndexOutOfBounds { index: 0, size: 0 });
        }
        elements.len() - 1
    };
    Ok(elements.remove(index))
});

define_builtin!(collection_insert, |receiver, args| {
    let receiver = receiver.expect("insert is always invoked with a bound receiver");
    let Value::Collection {
        element_type,
        elements,
    } = receiver
    else {
        unreachable!("insert is only ever bound to a Collection value")
    };
    if args.len() != 2 {
        return Err(arity_error("insert", 2, args.len()));
    }
    let index = expect_integer("insert", &args[0])?;
    let value = &args[1];

    let current = element_type.get();
    if current == ValueType::Null {
        element_type.set(value.value_type());
    } else if value.value_type() != current {
        return Err(EvalError::NonUniformCollection {
            text: receiver.to_string(),
        });
    }

    let mut elements = elements.borrow_mut();
    if index < 0 || index as usize > elements.len() {
        return Err(EvalError::IndexOutOfBounds {
            index,
            size: elements.len(),
        });
    }
    elements.insert(index as usize, value.clone());
    Ok(Value::Null)
});

define_builtin!(dictionary_keys, |receiver, _args| {
    let receiver = receiver.expect("keys is always invoked with a bound receiver");
    let Value::Dictionary {
        key_type, entries, ..
    } = receiver
    else {
        unreachable!("keys is only ever bound to a Dictionary value")
    };
    let elements = entries
        .borrow()
        .keys()
        .map(|k| k.clone().into_value())
        .collect();
    Ok(Value::new_collection(key_type.get(), elements))
});

define_builtin!(dictionary_values, |receiver, _args| {
    let receiver = receiver.expect("values is always invoked with a bound receiver");
    let Value::Dictionary {
        value_type,
        entries,
        ..
    } = receiver
    else {
        unreachable!("values is only ever bound to a Dictionary value")
    };
    let elements = entries.borrow().values().cloned().collect();
    Ok(Value::new_collection(value_type.get(), elements))
});

/// Resolves `object.name` to either a property value (evaluated eagerly) or
/// a bound builtin (the receiver travels with the value, invoked only when
/// the result is subsequently called).
pub fn member(object: &Value, name: &str) -> Result<Value, EvalError> {
    match object {
        Value::Collection { elements, .. } => match name {
            "size" => Ok(Value::Integer(elements.borrow().len() as i32)),
            "append" => Ok(bound(object, name, collection_append)),
            "pop" => Ok(bound(object, name, collection_pop)),
            "insert" => Ok(bound(object, name, collection_insert)),
            _ => Err(no_such_member(name, object)),
        },
        Value::Dictionary { entries, .. } => match name {
            "size" => Ok(Value::Integer(entries.borrow().len() as i32)),
            "keys" => Ok(bound(object, name, dictionary_keys)),
            "values" => Ok(bound(object, name, dictionary_values)),
            _ => Err(no_such_member(name, object)),
        },
        Value::String(s) => match name {
            "length" => Ok(Value::Integer(s.chars().count() as i32)),
            _ => Err(no_such_member(name, object)),
        },
        other => Err(no_such_member(name, other)),
    }
}

fn bound(receiver: &Value, name: &str, func: crate::object::BuiltinFn) -> Value {
    Value::Builtin(Box::new(Builtin {
        name: name.to_string(),
        func,
        receiver: Some(Box::new(receiver.clone())),
    }))
}

fn no_such_member(name: &str, object: &Value) -> EvalError {
    EvalError::NoSuchMember {
        name: name.to_string(),
        object_type: object.type_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_returns_null() {
        let result = log_builtin(None, &[Value::Integer(1), Value::Integer(2)]).unwrap();
        assert_eq!(result, Value::Null);
    }

    #[test]
    fn test_append_sets_element_type_on_empty_collection() {
        let collection = Value::new_collection(ValueType::Null, vec![]);
        collection_append(Some(&collection), &[Value::Integer(5)]).unwrap();
        if let Value::Collection { element_type, elements } = &collection {
            assert_eq!(element_type.get(), ValueType::Integer);
            assert_eq!(elements.borrow().len(), 1);
        } else {
            panic!("expected Collection");
        }
    }

    #[test]
    fn test_append_rejects_mismatched_type() {
        let collection = Value::new_collection(ValueType::Integer, vec![Value::Integer(1)]);
        let err = collection_append(Some(&collection), &[Value::Boolean(true)]).unwrap_err();
        assert!(matches!(err, EvalError::NonUniformCollection { .. }));
    }

    #[test]
    fn test_pop_by_index() {
        let collection = Value::new_collection(
            ValueType::Integer,
            vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)],
        );
        let popped = collection_pop(Some(&collection), &[Value::Integer(1)]).unwrap();
        assert_eq!(popped, Value::Integer(2));
    }

    #[test]
    fn test_pop_out_of_bounds() {
        let collection = Value::new_collection(ValueType::Integer, vec![Value::Integer(1)]);
        let err = collection_pop(Some(&collection), &[Value::Integer(5)]).unwrap_err();
        assert!(matches!(err, EvalError::IndexOutOfBounds { .. }));
    }

    #[test]
    fn test_insert_shifts_elements() {
        let collection = Value::new_collection(
            ValueType::Integer,
            vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)],
        );
        collection_insert(Some(&collection), &[Value::Integer(1), Value::Integer(10)]).unwrap();
        if let Value::Collection { elements, .. } = &collection {
            let values: Vec<Value> = elements.borrow().clone();
            assert_eq!(
                values,
                vec![
                    Value::Integer(1),
                    Value::Integer(10),
                    Value::Integer(2),
                    Value::Integer(3)
                ]
            );
        } else {
            panic!("expected Collection");
        }
    }

    #[test]
    fn test_dictionary_keys_and_values_insertion_order() {
        let mut map = indexmap::IndexMap::new();
        map.insert(DictKey::Character('a'), Value::Integer(1));
        map.insert(DictKey::Character('b'), Value::Integer(2));
        let dict = Value::new_dictionary(ValueType::Character, ValueType::Integer, map);

        let keys = dictionary_keys(Some(&dict), &[]).unwrap();
        assert_eq!(keys.to_string(), "[a, b]");

        let values = dictionary_values(Some(&dict), &[]).unwrap();
        assert_eq!(values.to_string(), "[1, 2]");
    }

    #[test]
    fn test_string_length_member() {
        let s = Value::String(std::rc::Rc::new("hello".to_string()));
        let len = member(&s, "length").unwrap();
        assert_eq!(len, Value::Integer(5));
    }

    #[test]
    fn test_unknown_member_errors() {
        let s = Value::String(std::rc::Rc::new("hello".to_string()));
        let err = member(&s, "bogus").unwrap_err();
        assert!(matches!(err, EvalError::NoSuchMember { .. }));
    }
}

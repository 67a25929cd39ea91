// ABOUTME: Runtime value representation and Inspect-style display

use crate::ast::{BlockStatement, Parameter};
use crate::env::Environment;
use crate::error::EvalError;
use crate::token::TokenKind;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// The element/key/value type tag carried by declarations and container
/// values. `Null` is the sentinel "undetermined" type used by empty
/// collection/dictionary literals until reconciled against a declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Integer,
    Float,
    Boolean,
    Character,
    Collection,
    Dictionary,
    String,
    Null,
    Function,
    Builtin,
    Error,
}

impl ValueType {
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::Boolean => "boolean",
            ValueType::Character => "character",
            ValueType::Collection => "collection",
            ValueType::Dictionary => "dictionary",
            ValueType::String => "string",
            ValueType::Null => "null",
            ValueType::Function => "function",
            ValueType::Builtin => "builtin",
            ValueType::Error => "error",
        }
    }

    pub fn from_type_token(kind: TokenKind) -> Option<ValueType> {
        match kind {
            TokenKind::IntegerType => Some(ValueType::Integer),
            TokenKind::FloatType => Some(ValueType::Float),
            TokenKind::BooleanType => Some(ValueType::Boolean),
            TokenKind::CharacterType => Some(ValueType::Character),
            TokenKind::CollectionType => Some(ValueType::Collection),
            TokenKind::DictionaryType => Some(ValueType::Dictionary),
            TokenKind::StringType => Some(ValueType::String),
            _ => None,
        }
    }

    pub fn is_hashable(&self) -> bool {
        matches!(
            self,
            ValueType::Integer | ValueType::Float | ValueType::Boolean | ValueType::Character
        )
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A hashable dictionary key. Float uses bit-pattern equality/hashing since
/// `f32` has no native `Eq`/`Hash` impl — dictionary keys are never produced
/// by arithmetic, only by literal or lookup, so bit-identity is adequate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DictKey {
    Integer(i32),
    Float(f32),
    Boolean(bool),
    Character(char),
}

impl Eq for DictKey {}

impl Hash for DictKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            DictKey::Integer(i) => {
                0u8.hash(state);
                i.hash(state);
            }
            DictKey::Float(v) => {
                1u8.hash(state);
                v.to_bits().hash(state);
            }
            DictKey::Boolean(b) => {
                2u8.hash(state);
                b.hash(state);
            }
            DictKey::Character(c) => {
                3u8.hash(state);
                c.hash(state);
            }
        }
    }
}

impl fmt::Display for DictKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DictKey::Integer(i) => write!(f, "{}", i),
            DictKey::Float(v) => write!(f, "{}", v),
            DictKey::Boolean(b) => write!(f, "{}", b),
            DictKey::Character(c) => write!(f, "{}", c),
        }
    }
}

impl DictKey {
    pub fn value_type(&self) -> ValueType {
        match self {
            DictKey::Integer(_) => ValueType::Integer,
            DictKey::Float(_) => ValueType::Float,
            DictKey::Boolean(_) => ValueType::Boolean,
            DictKey::Character(_) => ValueType::Character,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            DictKey::Integer(i) => Value::Integer(i),
            DictKey::Float(v) => Value::Float(v),
            DictKey::Boolean(b) => Value::Boolean(b),
            DictKey::Character(c) => Value::Character(c),
        }
    }
}

impl TryFrom<&Value> for DictKey {
    type Error = ();

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Integer(i) => Ok(DictKey::Integer(*i)),
            Value::Float(v) => Ok(DictKey::Float(*v)),
            Value::Boolean(b) => Ok(DictKey::Boolean(*b)),
            Value::Character(c) => Ok(DictKey::Character(*c)),
            _ => Err(()),
        }
    }
}

pub type BuiltinFn = fn(receiver: Option<&Value>, args: &[Value]) -> Result<Value, EvalError>;

#[derive(Clone)]
pub struct Builtin {
    pub name: String,
    pub func: BuiltinFn,
    pub receiver: Option<Box<Value>>,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin").field("name", &self.name).finish()
    }
}

impl PartialEq for Builtin {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub return_type: ValueType,
    pub parameters: Vec<Parameter>,
    pub body: BlockStatement,
    pub env: Rc<Environment>,
}

/// Runtime values. Collection and Dictionary contents are wrapped in
/// `Rc<RefCell<_>>` so that a value shared across environment frames is
/// mutated for every holder, matching the reference-sharing semantics the
/// language specifies for composite values.
#[derive(Debug, Clone)]
pub enum Value {
    Integer(i32),
    Float(f32),
    Boolean(bool),
    Character(char),
    Collection {
        element_type: Rc<Cell<ValueType>>,
        elements: Rc<RefCell<Vec<Value>>>,
    },
    Dictionary {
        key_type: Rc<Cell<ValueType>>,
        value_type: Rc<Cell<ValueType>>,
        entries: Rc<RefCell<indexmap::IndexMap<DictKey, Value>>>,
    },
    String(Rc<String>),
    Null,
    Return(Box<Value>),
    Break,
    Continue,
    Function(Rc<Function>),
    Builtin(Box<Builtin>),
    Error(String),
}

impl Value {
    pub fn new_collection(element_type: ValueType, elements: Vec<Value>) -> Value {
        Value::Collection {
            element_type: Rc::new(Cell::new(element_type)),
            elements: Rc::new(RefCell::new(elements)),
        }
    }

    pub fn new_dictionary(
        key_type: ValueType,
        value_type: ValueType,
        entries: indexmap::IndexMap<DictKey, Value>,
    ) -> Value {
        Value::Dictionary {
            key_type: Rc::new(Cell::new(key_type)),
            value_type: Rc::new(Cell::new(value_type)),
            entries: Rc::new(RefCell::new(entries)),
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Integer(_) => ValueType::Integer,
            Value::Float(_) => ValueType::Float,
            Value::Boolean(_) => ValueType::Boolean,
            Value::Character(_) => ValueType::Character,
            Value::Collection { .. } => ValueType::Collection,
            Value::Dictionary { .. } => ValueType::Dictionary,
            Value::String(_) => ValueType::String,
            Value::Null => ValueType::Null,
            Value::Return(inner) => inner.value_type(),
            Value::Break | Value::Continue => ValueType::Null,
            Value::Function(_) => ValueType::Function,
            Value::Builtin(_) => ValueType::Builtin,
            Value::Error(_) => ValueType::Error,
        }
    }

    pub fn type_name(&self) -> String {
        self.value_type().name().to_string()
    }

    /// Truthiness per the language's rule: Boolean as itself, numeric
    /// non-zero is true; every other type is not a valid truthy value.
    pub fn truthy(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            Value::Integer(i) => Some(*i != 0),
            Value::Float(v) => Some(*v != 0.0),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Character(a), Value::Character(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Break, Value::Break) => true,
            (Value::Continue, Value::Continue) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Character(c) => write!(f, "{}", c),
            Value::Collection { elements, .. } => {
                write!(f, "[")?;
                for (i, el) in elements.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", el)?;
                }
                write!(f, "]")
            }
            Value::Dictionary { entries, .. } => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::String(s) => write!(f, "{}", s),
            Value::Null => write!(f, "null"),
            Value::Return(inner) => write!(f, "{}", inner),
            Value::Break => write!(f, "break"),
            Value::Continue => write!(f, "continue"),
            Value::Function(func) => {
                write!(f, "{}(", func.return_type)?;
                for (i, p) in func.parameters.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ") {}", func.body)
            }
            Value::Builtin(b) => write!(f, "<builtin {}>", b.name),
            Value::Error(msg) => write!(f, "Evaluation Error: {}", msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inspect_collection() {
        let v = Value::new_collection(
            ValueType::Integer,
            vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)],
        );
        assert_eq!(v.to_string(), "[1, 2, 3]");
    }

    #[test]
    fn test_inspect_dictionary_insertion_order() {
        let mut map = indexmap::IndexMap::new();
        map.insert(DictKey::Character('b'), Value::Integer(2));
        map.insert(DictKey::Character('a'), Value::Integer(1));
        let v = Value::new_dictionary(ValueType::Character, ValueType::Integer, map);
        assert_eq!(v.to_string(), "{b: 2, a: 1}");
    }

    #[test]
    fn test_inspect_error() {
        let v = Value::Error("boom".to_string());
        assert_eq!(v.to_string(), "Evaluation Error: boom");
    }

    #[test]
    fn test_truthy_rules() {
        assert_eq!(Value::Boolean(false).truthy(), Some(false));
        assert_eq!(Value::Integer(0).truthy(), Some(false));
        assert_eq!(Value::Integer(3).truthy(), Some(true));
        assert_eq!(Value::Float(0.0).truthy(), Some(false));
        assert_eq!(Value::Null.truthy(), None);
        assert_eq!(Value::Character('a').truthy(), None);
    }

    #[test]
    fn test_hashable_types() {
        assert!(ValueType::Integer.is_hashable());
        assert!(ValueType::Float.is_hashable());
        assert!(ValueType::Boolean.is_hashable());
        assert!(ValueType::Character.is_hashable());
        assert!(!ValueType::String.is_hashable());
        assert!(!ValueType::Collection.is_hashable());
    }
}

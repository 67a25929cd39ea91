// ABOUTME: Evaluator error taxonomy with spec-fixed message text

use thiserror::Error;

/// Evaluation-time errors. Each variant's `#[error(...)]` string reproduces
/// the exact message text the language's error contract specifies — these
/// strings are part of the public, testable behavior, not freeform
/// diagnostics.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("'{lhs} {op} {rhs}' is not supported.")]
    OperatorNotSupported {
        lhs: String,
        op: String,
        rhs: String,
    },

    #[error("Attempted division by zero.")]
    DivisionByZero,

    #[error("Attempted modulo by zero.")]
    ModuloByZero,

    #[error("'{0}' is not defined.")]
    NotDefined(String),

    #[error("Cannot assign '{name}' of type {target_type} a value of type {value_type}.")]
    AssignTypeMismatch {
        name: String,
        target_type: String,
        value_type: String,
    },

    #[error("Strings are immutable.")]
    ImmutableString,

    #[error("'{0}' has no return value.")]
    NoReturnValue(String),

    #[error("'{function}' must return {expected}, got {actual}.")]
    ReturnTypeMismatch {
        function: String,
        expected: String,
        actual: String,
    },

    #[error("Index not in dictionary.")]
    KeyNotFound,

    #[error("Index {index} out of bounds for collection of size {size}.")]
    IndexOutOfBounds { index: i32, size: usize },

    #[error("{name} is not a member variable or function for an object of type {object_type}.")]
    NoSuchMember { name: String, object_type: String },

    #[error("'{0}' is not a valid truthy value.")]
    NotTruthy(String),

    #[error("'{op}{operand_type}' is not supported.")]
    UnaryOperatorNotSupported { op: String, operand_type: String },

    #[error("Attempted to break outside a loop.")]
    BreakOutsideLoop,

    #[error("Attempted to continue outside a loop.")]
    ContinueOutsideLoop,

    #[error("The collection {text} must have uniform typing of elements.")]
    NonUniformCollection { text: String },

    #[error("The dictionary {text} must have uniform typing of keys.")]
    NonUniformDictionaryKeys { text: String },

    #[error("The dictionary {text} must have uniform typing of values.")]
    NonUniformDictionaryValues { text: String },

    #[error("Dictionary initialized with duplicate key.")]
    DuplicateKey,

    #[error("Invalid dictionary key type. {0} is not a hashable type.")]
    NonHashableKey(String),

    #[error("'{0}' is not callable.")]
    NotCallable(String),

    #[error("'{0}' is not indexable.")]
    NotIndexable(String),

    #[error("Cannot iterate over a value of type {0}.")]
    NotIterable(String),

    #[error("'{name}' is already defined in this scope.")]
    AlreadyDefined { name: String },

    #[error("'{function}' expects {expected} argument(s), got {actual}.")]
    ArityMismatch {
        function: String,
        expected: usize,
        actual: usize,
    },

    #[error("'{function}' expected parameter '{parameter}' of type {expected}, got {actual}.")]
    ParameterTypeMismatch {
        function: String,
        parameter: String,
        expected: String,
        actual: String,
    },

    #[error("Declared type {declared} does not match initializer type {actual}.")]
    DeclarationTypeMismatch { declared: String, actual: String },

    #[error("Evaluation of the program timed out.")]
    Timeout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_not_supported_message() {
        let err = EvalError::OperatorNotSupported {
            lhs: "integer".to_string(),
            op: "+".to_string(),
            rhs: "boolean".to_string(),
        };
        assert_eq!(err.to_string(), "'integer + boolean' is not supported.");
    }

    #[test]
    fn test_division_by_zero_message() {
        assert_eq!(
            EvalError::DivisionByZero.to_string(),
            "Attempted division by zero."
        );
    }

    #[test]
    fn test_break_outside_loop_message() {
        assert_eq!(
            EvalError::BreakOutsideLoop.to_string(),
            "Attempted to break outside a loop."
        );
    }

    #[test]
    fn test_non_hashable_key_message() {
        let err = EvalError::NonHashableKey("string".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid dictionary key type. string is not a hashable type."
        );
    }
}

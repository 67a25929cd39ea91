// ABOUTME: Abstract syntax tree node types produced by the parser

use crate::token::{Token, TokenKind};
use std::fmt;

fn type_name(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::IntegerType => "integer",
        TokenKind::FloatType => "float",
        TokenKind::BooleanType => "boolean",
        TokenKind::CharacterType => "character",
        TokenKind::CollectionType => "collection",
        TokenKind::DictionaryType => "dictionary",
        TokenKind::StringType => "string",
        _ => "unknown",
    }
}

/// A function parameter: a declared type and a name, carried without an
/// initializer (parameters cannot have default values).
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub var_type: TokenKind,
    pub name: String,
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", type_name(self.var_type), self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockStatement {
    pub token: Token,
    pub statements: Vec<Statement>,
}

impl fmt::Display for BlockStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ ")?;
        for stmt in &self.statements {
            write!(f, "{} ", stmt)?;
        }
        write!(f, "}}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Identifier {
        token: Token,
        name: String,
    },
    IntegerLiteral {
        token: Token,
        value: i32,
    },
    FloatLiteral {
        token: Token,
        value: f32,
    },
    BooleanLiteral {
        token: Token,
        value: bool,
    },
    CharacterLiteral {
        token: Token,
        value: char,
    },
    CollectionLiteral {
        token: Token,
        elements: Vec<Expression>,
    },
    DictionaryLiteral {
        token: Token,
        pairs: Vec<(Expression, Expression)>,
    },
    /// A string literal expands at parse time into its character children,
    /// one `CharacterLiteral` per code unit, preserving source order.
    StringLiteral {
        token: Token,
        value: String,
        characters: Vec<Expression>,
    },
    FunctionLiteral {
        token: Token,
        return_type: TokenKind,
        parameters: Vec<Parameter>,
        body: BlockStatement,
    },
    Prefix {
        token: Token,
        operator: String,
        right: Box<Expression>,
    },
    Postfix {
        token: Token,
        operator: String,
        left: Box<Expression>,
    },
    Infix {
        token: Token,
        operator: String,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Call {
        token: Token,
        function: Box<Expression>,
        arguments: Vec<Expression>,
    },
    Index {
        token: Token,
        left: Box<Expression>,
        index: Box<Expression>,
    },
    /// `left.name` — member access; invoked as a call if `name` resolves to
    /// a bound builtin, otherwise read as a property value.
    Member {
        token: Token,
        object: Box<Expression>,
        name: String,
    },
}

impl Expression {
    pub fn token(&self) -> &Token {
        match self {
            Expression::Identifier { token, .. }
            | Expression::IntegerLiteral { token, .. }
            | Expression::FloatLiteral { token, .. }
            | Expression::BooleanLiteral { token, .. }
            | Expression::CharacterLiteral { token, .. }
            | Expression::CollectionLiteral { token, .. }
            | Expression::DictionaryLiteral { token, .. }
            | Expression::StringLiteral { token, .. }
            | Expression::FunctionLiteral { token, .. }
            | Expression::Prefix { token, .. }
            | Expression::Postfix { token, .. }
            | Expression::Infix { token, .. }
            | Expression::Call { token, .. }
            | Expression::Index { token, .. }
            | Expression::Member { token, .. } => token,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Identifier { name, .. } => write!(f, "{}", name),
            Expression::IntegerLiteral { value, .. } => write!(f, "{}", value),
            Expression::FloatLiteral { value, .. } => write!(f, "{}", value),
            Expression::BooleanLiteral { value, .. } => write!(f, "{}", value),
            Expression::CharacterLiteral { value, .. } => write!(f, "'{}'", value),
            Expression::CollectionLiteral { elements, .. } => {
                write!(f, "[")?;
                for (i, el) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", el)?;
                }
                write!(f, "]")
            }
            Expression::DictionaryLiteral { pairs, .. } => {
                write!(f, "{{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Expression::StringLiteral { value, .. } => write!(f, "\"{}\"", value),
            Expression::FunctionLiteral {
                return_type,
                parameters,
                body,
                ..
            } => {
                write!(f, "{}(", type_name(*return_type))?;
                for (i, p) in parameters.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ") {}", body)
            }
            Expression::Prefix {
                operator, right, ..
            } => write!(f, "({}{})", operator, right),
            Expression::Postfix { operator, left, .. } => write!(f, "({}{})", left, operator),
            Expression::Infix {
                operator,
                left,
                right,
                ..
            } => write!(f, "({} {} {})", left, operator, right),
            Expression::Call {
                function,
                arguments,
                ..
            } => {
                write!(f, "{}(", function)?;
                for (i, a) in arguments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", a)?;
                }
                write!(f, ")")
            }
            Expression::Index { left, index, .. } => write!(f, "({}[{}])", left, index),
            Expression::Member { object, name, .. } => write!(f, "({}.{})", object, name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    DeclareVariable {
        token: Token,
        var_type: TokenKind,
        name: String,
        value: Option<Expression>,
    },
    DeclareCollection {
        token: Token,
        element_type: TokenKind,
        name: String,
        value: Option<Expression>,
    },
    DeclareDictionary {
        token: Token,
        key_type: TokenKind,
        value_type: TokenKind,
        name: String,
        value: Option<Expression>,
    },
    DeclareFunction {
        token: Token,
        return_type: TokenKind,
        name: String,
        parameters: Vec<Parameter>,
        body: BlockStatement,
    },
    Return {
        token: Token,
        value: Option<Expression>,
    },
    ExpressionStatement {
        token: Token,
        expression: Expression,
    },
    /// A single chained if-node. `alternative` is `None` for no else, a
    /// nested `If` with `condition: Some(..)` for an else-if, or a nested
    /// `If` with `condition: None` for a terminal bare `else`.
    If {
        token: Token,
        condition: Option<Expression>,
        consequence: BlockStatement,
        alternative: Option<Box<Statement>>,
    },
    While {
        token: Token,
        condition: Expression,
        body: BlockStatement,
    },
    DoWhile {
        token: Token,
        body: BlockStatement,
        condition: Expression,
    },
    For {
        token: Token,
        init: Option<Box<Statement>>,
        condition: Expression,
        update: Option<Box<Statement>>,
        body: BlockStatement,
    },
    Iterate {
        token: Token,
        variable: String,
        iterable: Expression,
        body: BlockStatement,
    },
    Break {
        token: Token,
    },
    Continue {
        token: Token,
    },
}

impl Statement {
    pub fn token(&self) -> &Token {
        match self {
            Statement::DeclareVariable { token, .. }
            | Statement::DeclareCollection { token, .. }
            | Statement::DeclareDictionary { token, .. }
            | Statement::DeclareFunction { token, .. }
            | Statement::Return { token, .. }
            | Statement::ExpressionStatement { token, .. }
            | Statement::If { token, .. }
            | Statement::While { token, .. }
            | Statement::DoWhile { token, .. }
            | Statement::For { token, .. }
            | Statement::Iterate { token, .. }
            | Statement::Break { token }
            | Statement::Continue { token } => token,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::DeclareVariable {
                var_type,
                name,
                value,
                ..
            } => {
                write!(f, "{} {}", type_name(*var_type), name)?;
                if let Some(v) = value {
                    write!(f, " = {}", v)?;
                }
                write!(f, ";")
            }
            Statement::DeclareCollection {
                element_type,
                name,
                value,
                ..
            } => {
                write!(f, "collection<{}> {}", type_name(*element_type), name)?;
                if let Some(v) = value {
                    write!(f, " = {}", v)?;
                }
                write!(f, ";")
            }
            Statement::DeclareDictionary {
                key_type,
                value_type,
                name,
                value,
                ..
            } => {
                write!(
                    f,
                    "dictionary<{}, {}> {}",
                    type_name(*key_type),
                    type_name(*value_type),
                    name
                )?;
                if let Some(v) = value {
                    write!(f, " = {}", v)?;
                }
                write!(f, ";")
            }
            Statement::DeclareFunction {
                return_type,
                name,
                parameters,
                body,
                ..
            } => {
                write!(f, "{}(", type_name(*return_type))?;
                for (i, p) in parameters.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ") {} {}", name, body)
            }
            Statement::Return { value, .. } => {
                write!(f, "return")?;
                if let Some(v) = value {
                    write!(f, " {}", v)?;
                }
                write!(f, ";")
            }
            Statement::ExpressionStatement { expression, .. } => write!(f, "{};", expression),
            Statement::If {
                condition,
                consequence,
                alternative,
                ..
            } => {
                match condition {
                    Some(cond) => write!(f, "if ({}) {}", cond, consequence)?,
                    None => write!(f, "{}", consequence)?,
                }
                if let Some(alt) = alternative {
                    write!(f, " else {}", alt)?;
                }
                Ok(())
            }
            Statement::While {
                condition, body, ..
            } => write!(f, "while ({}) {}", condition, body),
            Statement::DoWhile {
                body, condition, ..
            } => write!(f, "do {} while ({});", body, condition),
            Statement::For {
                init,
                condition,
                update,
                body,
                ..
            } => {
                write!(f, "for (")?;
                if let Some(s) = init {
                    write!(f, "{}", s)?;
                } else {
                    write!(f, ";")?;
                }
                write!(f, " {};", condition)?;
                if let Some(s) = update {
                    // Update statement is rendered without its own trailing
                    // semicolon (it is never terminated at parse time).
                    let rendered = s.to_string();
                    write!(f, " {}", rendered.trim_end_matches(';'))?;
                }
                write!(f, ") {}", body)
            }
            Statement::Iterate {
                variable,
                iterable,
                body,
                ..
            } => write!(f, "iterate ({} : {}) {}", variable, iterable, body),
            Statement::Break { .. } => write!(f, "break;"),
            Statement::Continue { .. } => write!(f, "continue;"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

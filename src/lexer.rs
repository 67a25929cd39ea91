// ABOUTME: Forward-only character-cursor lexer turning source text into tokens

use crate::token::{Token, TokenKind};

/// A forward-only cursor over the input source with one-character lookahead.
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    read_position: usize,
    ch: Option<char>,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        let mut lexer = Lexer {
            input: input.chars().collect(),
            position: 0,
            read_position: 0,
            ch: None,
        };
        lexer.read_char();
        lexer
    }

    fn read_char(&mut self) {
        self.ch = self.input.get(self.read_position).copied();
        self.position = self.read_position;
        self.read_position += 1;
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.read_position).copied()
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while matches!(self.ch, Some(' ') | Some('\t') | Some('\n') | Some('\r')) {
                self.read_char();
            }

            if self.ch == Some('-') && self.peek_char() == Some('-') {
                self.skip_single_comment();
            } else if self.ch == Some('-') && self.peek_char() == Some('*') {
                self.skip_multi_comment();
            } else {
                break;
            }
        }
    }

    fn skip_single_comment(&mut self) {
        while self.ch.is_some() && self.ch != Some('\n') {
            self.read_char();
        }
    }

    fn skip_multi_comment(&mut self) {
        // Consume "-*"
        self.read_char();
        self.read_char();
        while self.ch.is_some() && !(self.ch == Some('*') && self.peek_char() == Some('-')) {
            self.read_char();
        }
        // Consume "*-"
        self.read_char();
        self.read_char();
    }

    fn read_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let start = self.position;
        while self.ch.map(&pred).unwrap_or(false) {
            self.read_char();
        }
        self.input[start..self.position].iter().collect()
    }

    fn read_identifier(&mut self) -> String {
        self.read_while(is_identifier_char)
    }

    /// Classifies and consumes a numeric literal. Decides between
    /// integer-literal, float-literal, and illegal-numeric per the rules in
    /// the language specification: a bare dot without `f`, two dots, or `f`
    /// followed by more digits are all illegal.
    fn read_number(&mut self) -> Token {
        let start = self.position;
        let mut seen_dot = false;
        let mut seen_f = false;

        while self.ch.map(|c| c.is_ascii_digit()).unwrap_or(false) {
            self.read_char();
        }

        if self.ch == Some('.') {
            seen_dot = true;
            self.read_char();
            while self.ch.map(|c| c.is_ascii_digit()).unwrap_or(false) {
                self.read_char();
            }
        }

        if self.ch == Some('f') {
            seen_f = true;
            self.read_char();
        }

        // Anything trailing that still looks numeric-ish makes this illegal:
        // a second dot, digits after the 'f', or another 'f'.
        let trailing_start = self.position;
        while self
            .ch
            .map(|c| c.is_ascii_digit() || c == '.' || c == 'f')
            .unwrap_or(false)
        {
            self.read_char();
        }
        let has_trailing = self.position > trailing_start;

        let text: String = self.input[start..self.position].iter().collect();

        if has_trailing {
            return Token::new(TokenKind::IllegalNumeric, text);
        }

        if !seen_dot && !seen_f {
            return Token::new(TokenKind::IntegerLiteral, text);
        }

        if seen_dot && !text[..text.len() - usize::from(seen_f)]
            .ends_with('.')
        {
            // Has at least one digit after the dot (or no dot at all), and
            // carried an 'f' suffix: valid float. Strip the trailing 'f'.
            if seen_f {
                let without_f = &text[..text.len() - 1];
                return Token::new(TokenKind::FloatLiteral, without_f.to_string());
            }
            // Dot with digits but no trailing f is not representable as
            // integer or float per the closed literal grammar.
            return Token::new(TokenKind::IllegalNumeric, text);
        }

        if seen_f {
            // "Nf" form: integer digits directly followed by f, no dot.
            let without_f = &text[..text.len() - 1];
            return Token::new(TokenKind::FloatLiteral, without_f.to_string());
        }

        // Bare dot with no digits following and no 'f': illegal.
        Token::new(TokenKind::IllegalNumeric, text)
    }

    fn read_string(&mut self) -> String {
        // self.ch == '"'
        self.read_char();
        let start = self.position;
        while self.ch.is_some() && self.ch != Some('"') {
            self.read_char();
        }
        let text: String = self.input[start..self.position].iter().collect();
        // Consume closing quote if present; unterminated literals fall
        // through with whatever was accumulated, surfaced downstream as a
        // parse error.
        if self.ch == Some('"') {
            self.read_char();
        }
        text
    }

    fn read_character(&mut self) -> String {
        self.read_char();
        let start = self.position;
        while self.ch.is_some() && self.ch != Some('\'') {
            self.read_char();
        }
        let text: String = self.input[start..self.position].iter().collect();
        if self.ch == Some('\'') {
            self.read_char();
        }
        text
    }

    /// Advances past whitespace and comments and returns the next token.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        let token = match self.ch {
            Some('=') => {
                if self.peek_char() == Some('=') {
                    self.read_char();
                    Token::new(TokenKind::Eq, "==")
                } else {
                    Token::new(TokenKind::Assign, "=")
                }
            }
            Some('+') => {
                if self.peek_char() == Some('+') {
                    self.read_char();
                    Token::new(TokenKind::Increment, "++")
                } else if self.peek_char() == Some('=') {
                    self.read_char();
                    Token::new(TokenKind::PlusAssign, "+=")
                } else {
                    Token::new(TokenKind::Plus, "+")
                }
            }
            Some('-') => {
                if self.peek_char() == Some('-') {
                    self.read_char();
                    Token::new(TokenKind::Decrement, "--")
                } else if self.peek_char() == Some('=') {
                    self.read_char();
                    Token::new(TokenKind::MinusAssign, "-=")
                } else {
                    Token::new(TokenKind::Minus, "-")
                }
            }
            Some('*') => {
                if self.peek_char() == Some('=') {
                    self.read_char();
                    Token::new(TokenKind::AsteriskAssign, "*=")
                } else {
                    Token::new(TokenKind::Asterisk, "*")
                }
            }
            Some('/') => {
                if self.peek_char() == Some('=') {
                    self.read_char();
                    Token::new(TokenKind::SlashAssign, "/=")
                } else {
                    Token::new(TokenKind::Slash, "/")
                }
            }
            Some('%') => {
                if self.peek_char() == Some('=') {
                    self.read_char();
                    Token::new(TokenKind::PercentAssign, "%=")
                } else {
                    Token::new(TokenKind::Percent, "%")
                }
            }
            Some('!') => {
                if self.peek_char() == Some('=') {
                    self.read_char();
                    Token::new(TokenKind::Neq, "!=")
                } else {
                    Token::new(TokenKind::Bang, "!")
                }
            }
            Some('&') => {
                if self.peek_char() == Some('&') {
                    self.read_char();
                    Token::new(TokenKind::And, "&&")
                } else {
                    Token::new(TokenKind::Ampersand, "&")
                }
            }
            Some('|') => {
                if self.peek_char() == Some('|') {
                    self.read_char();
                    Token::new(TokenKind::Or, "||")
                } else {
                    Token::new(TokenKind::Pipe, "|")
                }
            }
            Some('<') => {
                if self.peek_char() == Some('=') {
                    self.read_char();
                    Token::new(TokenKind::Leq, "<=")
                } else {
                    Token::new(TokenKind::LChevron, "<")
                }
            }
            Some('>') => {
                if self.peek_char() == Some('=') {
                    self.read_char();
                    Token::new(TokenKind::Geq, ">=")
                } else {
                    Token::new(TokenKind::RChevron, ">")
                }
            }
            Some(',') => Token::new(TokenKind::Comma, ","),
            Some(':') => Token::new(TokenKind::Colon, ":"),
            Some(';') => Token::new(TokenKind::Semicolon, ";"),
            Some('.') => Token::new(TokenKind::Dot, "."),
            Some('(') => Token::new(TokenKind::LParen, "("),
            Some(')') => Token::new(TokenKind::RParen, ")"),
            Some('{') => Token::new(TokenKind::LBrace, "{"),
            Some('}') => Token::new(TokenKind::RBrace, "}"),
            Some('[') => Token::new(TokenKind::LBracket, "["),
            Some(']') => Token::new(TokenKind::RBracket, "]"),
            Some('\'') => {
                let literal = self.read_character();
                return Token::new(TokenKind::CharacterLiteral, literal);
            }
            Some('"') => {
                let literal = self.read_string();
                return Token::new(TokenKind::StringLiteral, literal);
            }
            None => Token::new(TokenKind::Eof, ""),
            Some(c) if c.is_ascii_digit() => {
                return self.read_number();
            }
            Some(c) if is_identifier_start(c) => {
                let literal = self.read_identifier();
                let kind = TokenKind::lookup_identifier(&literal);
                return Token::new(kind, literal);
            }
            Some(c) => Token::new(TokenKind::Illegal, c.to_string()),
        };

        self.read_char();
        token
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token();
            let done = tok.kind == TokenKind::Eof;
            out.push(tok.kind);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn test_single_char_operators() {
        assert_eq!(tokens("+")[0], TokenKind::Plus);
        assert_eq!(tokens("-")[0], TokenKind::Minus);
        assert_eq!(tokens("*")[0], TokenKind::Asterisk);
        assert_eq!(tokens("/")[0], TokenKind::Slash);
        assert_eq!(tokens("%")[0], TokenKind::Percent);
        assert_eq!(tokens("=")[0], TokenKind::Assign);
        assert_eq!(tokens("!")[0], TokenKind::Bang);
        assert_eq!(tokens("&")[0], TokenKind::Ampersand);
        assert_eq!(tokens("|")[0], TokenKind::Pipe);
        assert_eq!(tokens("<")[0], TokenKind::LChevron);
        assert_eq!(tokens(">")[0], TokenKind::RChevron);
    }

    #[test]
    fn test_two_char_operators() {
        assert_eq!(tokens("==")[0], TokenKind::Eq);
        assert_eq!(tokens("!=")[0], TokenKind::Neq);
        assert_eq!(tokens("<=")[0], TokenKind::Leq);
        assert_eq!(tokens(">=")[0], TokenKind::Geq);
        assert_eq!(tokens("&&")[0], TokenKind::And);
        assert_eq!(tokens("||")[0], TokenKind::Or);
        assert_eq!(tokens("++")[0], TokenKind::Increment);
        assert_eq!(tokens("--")[0], TokenKind::Decrement);
        assert_eq!(tokens("+=")[0], TokenKind::PlusAssign);
        assert_eq!(tokens("-=")[0], TokenKind::MinusAssign);
        assert_eq!(tokens("*=")[0], TokenKind::AsteriskAssign);
        assert_eq!(tokens("/=")[0], TokenKind::SlashAssign);
        assert_eq!(tokens("%=")[0], TokenKind::PercentAssign);
    }

    #[test]
    fn test_delimiters() {
        assert_eq!(tokens(",")[0], TokenKind::Comma);
        assert_eq!(tokens(":")[0], TokenKind::Colon);
        assert_eq!(tokens(";")[0], TokenKind::Semicolon);
        assert_eq!(tokens(".")[0], TokenKind::Dot);
        assert_eq!(tokens("(")[0], TokenKind::LParen);
        assert_eq!(tokens(")")[0], TokenKind::RParen);
        assert_eq!(tokens("{")[0], TokenKind::LBrace);
        assert_eq!(tokens("}")[0], TokenKind::RBrace);
        assert_eq!(tokens("[")[0], TokenKind::LBracket);
        assert_eq!(tokens("]")[0], TokenKind::RBracket);
    }

    #[test]
    fn test_keywords() {
        for (src, expected) in [
            ("integer", TokenKind::IntegerType),
            ("boolean", TokenKind::BooleanType),
            ("float", TokenKind::FloatType),
            ("character", TokenKind::CharacterType),
            ("collection", TokenKind::CollectionType),
            ("dictionary", TokenKind::DictionaryType),
            ("string", TokenKind::StringType),
            ("if", TokenKind::If),
            ("else", TokenKind::Else),
            ("do", TokenKind::Do),
            ("while", TokenKind::While),
            ("for", TokenKind::For),
            ("iterate", TokenKind::Iterate),
            ("return", TokenKind::Return),
            ("break", TokenKind::Break),
            ("continue", TokenKind::Continue),
            ("true", TokenKind::TrueLiteral),
            ("false", TokenKind::FalseLiteral),
        ] {
            assert_eq!(tokens(src)[0], expected, "source {src}");
        }
    }

    #[test]
    fn test_identifier() {
        let toks = tokens("foo_bar");
        assert_eq!(toks[0], TokenKind::Identifier);
    }

    #[test]
    fn test_integer_literal() {
        let mut lexer = Lexer::new("12345");
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::IntegerLiteral);
        assert_eq!(tok.literal, "12345");
    }

    #[test]
    fn test_float_literal_with_dot() {
        let mut lexer = Lexer::new("3.14f");
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::FloatLiteral);
        assert_eq!(tok.literal, "3.14");
    }

    #[test]
    fn test_float_literal_no_dot() {
        let mut lexer = Lexer::new("5f");
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::FloatLiteral);
        assert_eq!(tok.literal, "5");
    }

    #[test]
    fn test_illegal_numeric_two_dots() {
        let mut lexer = Lexer::new("1.2.3");
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::IllegalNumeric);
    }

    #[test]
    fn test_illegal_numeric_f_then_digits() {
        let mut lexer = Lexer::new("5f6");
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::IllegalNumeric);
    }

    #[test]
    fn test_illegal_numeric_bare_dot() {
        let mut lexer = Lexer::new("1.");
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::IllegalNumeric);
    }

    #[test]
    fn test_character_literal() {
        let mut lexer = Lexer::new("'a'");
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::CharacterLiteral);
        assert_eq!(tok.literal, "a");
    }

    #[test]
    fn test_string_literal() {
        let mut lexer = Lexer::new("\"hello world\"");
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::StringLiteral);
        assert_eq!(tok.literal, "hello world");
    }

    #[test]
    fn test_illegal_character() {
        let mut lexer = Lexer::new("@");
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::Illegal);
    }

    #[test]
    fn test_single_line_comment_skipped() {
        let mut lexer = Lexer::new("-- a comment\n42");
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::IntegerLiteral);
        assert_eq!(tok.literal, "42");
    }

    #[test]
    fn test_multi_line_comment_skipped() {
        let mut lexer = Lexer::new("-* this\nspans lines *-42");
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::IntegerLiteral);
        assert_eq!(tok.literal, "42");
    }

    #[test]
    fn test_eof() {
        let mut lexer = Lexer::new("");
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::Eof);
    }

    #[test]
    fn test_full_declaration() {
        let kinds = tokens("integer a = 5;");
        assert_eq!(
            kinds,
            vec![
                TokenKind::IntegerType,
                TokenKind::Identifier,
                TokenKind::Assign,
                TokenKind::IntegerLiteral,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }
}

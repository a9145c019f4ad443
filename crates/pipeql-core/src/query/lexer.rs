//! Lexer for the PipeQL pipeline query language.
//!
//! Converts raw query text into a stream of position-tagged tokens.

use std::fmt;

use crate::error::LexError;

/// Token kinds produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Pipeline operators
    Pipe,     // |
    Filter,   // ?
    Select,   // !
    SortAsc,  // ^
    SortDesc, // v (only directly before '[')
    Group,    // @
    Limit,    // #
    Drop,     // _

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    Semicolon,
    Comma,

    // Operators
    Assign,  // :
    Plus,    // +
    Minus,   // -
    Star,    // *
    Percent, // % (divide)

    // Comparison
    Eq, // =
    Ne, // <>
    Lt, // <
    Gt, // >
    Le, // <=
    Ge, // >=

    // Logical
    And, // &
    Or,  // | inside brackets
    Not, // keyword `not`

    // Literals
    Identifier,
    Number,
    Str,
    Symbol, // `name

    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Pipe => "|",
            TokenKind::Filter => "?",
            TokenKind::Select => "!",
            TokenKind::SortAsc => "^",
            TokenKind::SortDesc => "v",
            TokenKind::Group => "@",
            TokenKind::Limit => "#",
            TokenKind::Drop => "_",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Semicolon => ";",
            TokenKind::Comma => ",",
            TokenKind::Assign => ":",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Percent => "%",
            TokenKind::Eq => "=",
            TokenKind::Ne => "<>",
            TokenKind::Lt => "<",
            TokenKind::Gt => ">",
            TokenKind::Le => "<=",
            TokenKind::Ge => ">=",
            TokenKind::And => "&",
            TokenKind::Or => "or",
            TokenKind::Not => "not",
            TokenKind::Identifier => "identifier",
            TokenKind::Number => "number",
            TokenKind::Str => "string",
            TokenKind::Symbol => "symbol",
            TokenKind::Eof => "end of input",
        };
        write!(f, "{}", s)
    }
}

/// A single lexical token with its source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>, line: usize, column: usize) -> Self {
        Token {
            kind,
            text: text.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind, self.text)
    }
}

/// Lexer state.
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    // `|` lexes as the pipe separator at top level but as logical OR inside
    // bracketed expressions.
    bracket_depth: usize,
}

impl Lexer {
    /// Create a new lexer over the given query text.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            bracket_depth: 0,
        }
    }

    /// Tokenize the entire input, ending with an `Eof` token.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        while self.position < self.input.len() {
            let ch = self.current_char();

            if ch == ' ' || ch == '\t' || ch == '\r' {
                self.advance();
                continue;
            }
            if ch == '\n' {
                self.position += 1;
                self.line += 1;
                self.column = 1;
                continue;
            }
            // // comment to end of line
            if ch == '/' && self.peek_char() == Some('/') {
                while self.position < self.input.len() && self.current_char() != '\n' {
                    self.advance();
                }
                continue;
            }

            if let Some(token) = self.two_char_operator() {
                tokens.push(token);
                continue;
            }

            let (line, column) = (self.line, self.column);
            match ch {
                '|' => {
                    let kind = if self.bracket_depth > 0 {
                        TokenKind::Or
                    } else {
                        TokenKind::Pipe
                    };
                    tokens.push(Token::new(kind, "|", line, column));
                    self.advance();
                }
                '?' => {
                    tokens.push(Token::new(TokenKind::Filter, "?", line, column));
                    self.advance();
                }
                '!' => {
                    tokens.push(Token::new(TokenKind::Select, "!", line, column));
                    self.advance();
                }
                '^' => {
                    tokens.push(Token::new(TokenKind::SortAsc, "^", line, column));
                    self.advance();
                }
                'v' if self.peek_char() == Some('[') => {
                    tokens.push(Token::new(TokenKind::SortDesc, "v", line, column));
                    self.advance();
                }
                '@' => {
                    tokens.push(Token::new(TokenKind::Group, "@", line, column));
                    self.advance();
                }
                '#' => {
                    tokens.push(Token::new(TokenKind::Limit, "#", line, column));
                    self.advance();
                }
                '_' => {
                    tokens.push(Token::new(TokenKind::Drop, "_", line, column));
                    self.advance();
                }
                '(' => {
                    tokens.push(Token::new(TokenKind::LParen, "(", line, column));
                    self.advance();
                }
                ')' => {
                    tokens.push(Token::new(TokenKind::RParen, ")", line, column));
                    self.advance();
                }
                '[' => {
                    tokens.push(Token::new(TokenKind::LBracket, "[", line, column));
                    self.bracket_depth += 1;
                    self.advance();
                }
                ']' => {
                    tokens.push(Token::new(TokenKind::RBracket, "]", line, column));
                    self.bracket_depth = self.bracket_depth.saturating_sub(1);
                    self.advance();
                }
                ';' => {
                    tokens.push(Token::new(TokenKind::Semicolon, ";", line, column));
                    self.advance();
                }
                ',' => {
                    tokens.push(Token::new(TokenKind::Comma, ",", line, column));
                    self.advance();
                }
                ':' => {
                    tokens.push(Token::new(TokenKind::Assign, ":", line, column));
                    self.advance();
                }
                '+' => {
                    tokens.push(Token::new(TokenKind::Plus, "+", line, column));
                    self.advance();
                }
                '-' => {
                    tokens.push(Token::new(TokenKind::Minus, "-", line, column));
                    self.advance();
                }
                '*' => {
                    tokens.push(Token::new(TokenKind::Star, "*", line, column));
                    self.advance();
                }
                '%' => {
                    tokens.push(Token::new(TokenKind::Percent, "%", line, column));
                    self.advance();
                }
                '=' => {
                    tokens.push(Token::new(TokenKind::Eq, "=", line, column));
                    self.advance();
                }
                '<' => {
                    tokens.push(Token::new(TokenKind::Lt, "<", line, column));
                    self.advance();
                }
                '>' => {
                    tokens.push(Token::new(TokenKind::Gt, ">", line, column));
                    self.advance();
                }
                '&' => {
                    tokens.push(Token::new(TokenKind::And, "&", line, column));
                    self.advance();
                }
                '"' => tokens.push(self.read_string()?),
                '`' => tokens.push(self.read_symbol()),
                c if c.is_ascii_digit() => tokens.push(self.read_number()),
                c if c.is_alphabetic() || c == '.' => tokens.push(self.read_identifier()),
                c => {
                    return Err(LexError::UnexpectedCharacter {
                        ch: c,
                        line,
                        column,
                    })
                }
            }
        }

        tokens.push(Token::new(TokenKind::Eof, "", self.line, self.column));
        Ok(tokens)
    }

    fn two_char_operator(&mut self) -> Option<Token> {
        let (line, column) = (self.line, self.column);
        let pair = match (self.current_char(), self.peek_char()?) {
            ('<', '=') => Some((TokenKind::Le, "<=")),
            ('>', '=') => Some((TokenKind::Ge, ">=")),
            ('<', '>') => Some((TokenKind::Ne, "<>")),
            _ => None,
        }?;
        self.advance();
        self.advance();
        Some(Token::new(pair.0, pair.1, line, column))
    }

    fn read_identifier(&mut self) -> Token {
        let (line, column) = (self.line, self.column);
        let mut text = String::new();

        while self.position < self.input.len() {
            let c = self.current_char();
            if c.is_alphanumeric() || c == '_' || c == '.' {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }

        if text == "not" {
            return Token::new(TokenKind::Not, text, line, column);
        }
        Token::new(TokenKind::Identifier, text, line, column)
    }

    fn read_number(&mut self) -> Token {
        let (line, column) = (self.line, self.column);
        let mut text = String::new();
        let mut has_dot = false;

        while self.position < self.input.len() {
            let c = self.current_char();
            if c.is_ascii_digit() {
                text.push(c);
                self.advance();
            } else if c == '.' && !has_dot {
                has_dot = true;
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }

        Token::new(TokenKind::Number, text, line, column)
    }

    fn read_string(&mut self) -> Result<Token, LexError> {
        let (line, column) = (self.line, self.column);
        self.advance(); // opening quote
        let mut text = String::new();

        while self.position < self.input.len() && self.current_char() != '"' {
            if self.current_char() == '\\' && self.position + 1 < self.input.len() {
                self.advance();
                let escaped = self.current_char();
                text.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    other => other,
                });
                self.advance();
            } else {
                text.push(self.current_char());
                self.advance();
            }
        }

        if self.position >= self.input.len() {
            return Err(LexError::UnterminatedString { line });
        }

        self.advance(); // closing quote
        Ok(Token::new(TokenKind::Str, text, line, column))
    }

    fn read_symbol(&mut self) -> Token {
        let (line, column) = (self.line, self.column);
        self.advance(); // backtick
        let mut text = String::new();

        while self.position < self.input.len() {
            let c = self.current_char();
            if c.is_alphanumeric() || c == '_' {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }

        Token::new(TokenKind::Symbol, text, line, column)
    }

    fn current_char(&self) -> char {
        self.input[self.position]
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
        self.column += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_simple_pipeline() {
        assert_eq!(
            kinds("employees | ?[salary > 80000]"),
            vec![
                TokenKind::Identifier,
                TokenKind::Pipe,
                TokenKind::Filter,
                TokenKind::LBracket,
                TokenKind::Identifier,
                TokenKind::Gt,
                TokenKind::Number,
                TokenKind::RBracket,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_sort_desc_vs_identifier() {
        // `v` directly before '[' is the descending-sort operator
        assert_eq!(
            kinds("t | v[salary]"),
            vec![
                TokenKind::Identifier,
                TokenKind::Pipe,
                TokenKind::SortDesc,
                TokenKind::LBracket,
                TokenKind::Identifier,
                TokenKind::RBracket,
                TokenKind::Eof,
            ]
        );
        // a bare `v` is an ordinary identifier
        let tokens = Lexer::new("v | #[1]").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].text, "v");
    }

    #[test]
    fn test_pipe_inside_brackets_is_or() {
        let tokens = Lexer::new("t | ?[a = 1 | b = 2]").tokenize().unwrap();
        let ors: Vec<_> = tokens.iter().filter(|t| t.kind == TokenKind::Or).collect();
        assert_eq!(ors.len(), 1);
        let pipes: Vec<_> = tokens.iter().filter(|t| t.kind == TokenKind::Pipe).collect();
        assert_eq!(pipes.len(), 1);
    }

    #[test]
    fn test_comparison_operators() {
        assert_eq!(
            kinds("= <> < > <= >="),
            vec![
                TokenKind::Eq,
                TokenKind::Ne,
                TokenKind::Lt,
                TokenKind::Gt,
                TokenKind::Le,
                TokenKind::Ge,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_string_with_escapes() {
        let tokens = Lexer::new("\"a\\nb\\\"c\"").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].text, "a\nb\"c");
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::new("\"oops").tokenize().unwrap_err();
        assert_eq!(err, LexError::UnterminatedString { line: 1 });
    }

    #[test]
    fn test_symbol_literal() {
        let tokens = Lexer::new("`sales").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Symbol);
        assert_eq!(tokens[0].text, "sales");
    }

    #[test]
    fn test_numbers() {
        let tokens = Lexer::new("42 3.5").tokenize().unwrap();
        assert_eq!(tokens[0].text, "42");
        assert_eq!(tokens[1].text, "3.5");
    }

    #[test]
    fn test_comment_skipped() {
        assert_eq!(
            kinds("t // trailing comment\n| #[1]"),
            vec![
                TokenKind::Identifier,
                TokenKind::Pipe,
                TokenKind::Limit,
                TokenKind::LBracket,
                TokenKind::Number,
                TokenKind::RBracket,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_position_tracking() {
        let tokens = Lexer::new("t\n| #[5]").tokenize().unwrap();
        let limit = tokens.iter().find(|t| t.kind == TokenKind::Limit).unwrap();
        assert_eq!(limit.line, 2);
        assert_eq!(limit.column, 3);
    }

    #[test]
    fn test_unexpected_character() {
        let err = Lexer::new("t | ?[a ~ 1]").tokenize().unwrap_err();
        assert!(matches!(err, LexError::UnexpectedCharacter { ch: '~', .. }));
    }
}

//! Parser for PipeQL queries.
//!
//! Recursive descent over the token stream with precedence climbing for
//! expressions. Produces a [`Pipeline`].

use crate::error::ParseError;
use crate::value::Value;

use super::ast::*;
use super::lexer::{Lexer, Token, TokenKind};

/// Parser state over a pre-lexed token stream.
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    /// Create a parser directly from query text.
    pub fn new(input: &str) -> Result<Self, ParseError> {
        let tokens = Lexer::new(input).tokenize()?;
        Ok(Self::from_tokens(tokens))
    }

    /// Create a parser from an already-tokenized stream.
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// Parse the full query into a pipeline.
    pub fn parse(&mut self) -> Result<Pipeline, ParseError> {
        let table_name = self.parse_table_name()?;

        let mut operations = Vec::new();
        while !self.is_at_end() {
            if self.matches(TokenKind::Pipe) {
                operations.push(self.parse_operation()?);
            } else {
                return Err(self.error("Expected pipe operator |"));
            }
        }

        Ok(Pipeline {
            table_name,
            operations,
        })
    }

    fn parse_table_name(&mut self) -> Result<String, ParseError> {
        if self.check(TokenKind::Identifier) {
            return Ok(self.advance().text.clone());
        }
        Err(self.error("Expected table name"))
    }

    fn parse_operation(&mut self) -> Result<Operation, ParseError> {
        match self.peek().kind {
            TokenKind::Filter => self.parse_filter(),
            TokenKind::Select => self.parse_select(),
            TokenKind::SortAsc | TokenKind::SortDesc => self.parse_sort(),
            TokenKind::Group => self.parse_group(),
            TokenKind::Limit => self.parse_limit(),
            TokenKind::Drop => self.parse_drop(),
            _ => Err(self.error("Unknown operation")),
        }
    }

    // ?[condition]
    fn parse_filter(&mut self) -> Result<Operation, ParseError> {
        self.consume(TokenKind::Filter, "Expected ?")?;
        self.consume(TokenKind::LBracket, "Expected [")?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::RBracket, "Expected ]")?;
        Ok(Operation::Filter(condition))
    }

    // ![spec; spec; ...] where spec is `*`, `alias:expr`, or `expr`
    fn parse_select(&mut self) -> Result<Operation, ParseError> {
        self.consume(TokenKind::Select, "Expected !")?;
        self.consume(TokenKind::LBracket, "Expected [")?;

        let mut columns = Vec::new();
        loop {
            if self.matches(TokenKind::Star) {
                columns.push(ColumnSpec::Wildcard);
            } else if self.check(TokenKind::Identifier)
                && self.peek_ahead(1).kind == TokenKind::Assign
            {
                let alias = self.advance().text.clone();
                self.consume(TokenKind::Assign, "Expected :")?;
                let expr = self.parse_expression()?;
                columns.push(ColumnSpec::Expr {
                    alias: Some(alias),
                    expr,
                });
            } else {
                let expr = self.parse_expression()?;
                columns.push(ColumnSpec::Expr { alias: None, expr });
            }

            if !self.matches(TokenKind::Semicolon) && !self.matches(TokenKind::Comma) {
                break;
            }
            // trailing separator before ] is tolerated
            if self.check(TokenKind::RBracket) {
                break;
            }
        }

        self.consume(TokenKind::RBracket, "Expected ]")?;
        Ok(Operation::Select(columns))
    }

    // ^[col] or v[col]
    fn parse_sort(&mut self) -> Result<Operation, ParseError> {
        let ascending = self.matches(TokenKind::SortAsc);
        if !ascending {
            self.consume(TokenKind::SortDesc, "Expected ^ or v")?;
        }
        self.consume(TokenKind::LBracket, "Expected [")?;
        let column = self
            .consume(TokenKind::Identifier, "Expected column name")?
            .text
            .clone();
        self.consume(TokenKind::RBracket, "Expected ]")?;
        Ok(Operation::Sort { column, ascending })
    }

    // @[col; col; ...]
    fn parse_group(&mut self) -> Result<Operation, ParseError> {
        self.consume(TokenKind::Group, "Expected @")?;
        self.consume(TokenKind::LBracket, "Expected [")?;

        let mut columns = Vec::new();
        loop {
            let col = self
                .consume(TokenKind::Identifier, "Expected column name")?
                .text
                .clone();
            columns.push(col);

            if !self.matches(TokenKind::Semicolon) && !self.matches(TokenKind::Comma) {
                break;
            }
            if self.check(TokenKind::RBracket) {
                break;
            }
        }

        self.consume(TokenKind::RBracket, "Expected ]")?;
        Ok(Operation::Group(columns))
    }

    // #[n] — an optional leading minus selects tail semantics
    fn parse_limit(&mut self) -> Result<Operation, ParseError> {
        self.consume(TokenKind::Limit, "Expected #")?;
        self.consume(TokenKind::LBracket, "Expected [")?;
        let negative = self.matches(TokenKind::Minus);
        let n = self.parse_count()?;
        self.consume(TokenKind::RBracket, "Expected ]")?;
        Ok(Operation::Limit(if negative { -n } else { n }))
    }

    // _[n]
    fn parse_drop(&mut self) -> Result<Operation, ParseError> {
        self.consume(TokenKind::Drop, "Expected _")?;
        self.consume(TokenKind::LBracket, "Expected [")?;
        let n = self.parse_count()?;
        self.consume(TokenKind::RBracket, "Expected ]")?;
        Ok(Operation::Drop(n))
    }

    fn parse_count(&mut self) -> Result<i64, ParseError> {
        let token = self.consume(TokenKind::Number, "Expected number")?;
        match token.text.parse::<f64>() {
            Ok(n) => Ok(n as i64),
            Err(_) => Err(self.error("Expected number")),
        }
    }

    // Expression precedence, lowest first: or < and < comparison < additive
    // < multiplicative < unary < primary.
    fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.parse_and()?;
        while self.matches(TokenKind::Or) {
            let right = self.parse_and()?;
            expr = Expression::BinaryOp {
                op: BinaryOperator::Or,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.parse_comparison()?;
        while self.matches(TokenKind::And) {
            let right = self.parse_comparison()?;
            expr = Expression::BinaryOp {
                op: BinaryOperator::And,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn parse_comparison(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.parse_additive()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Eq => BinaryOperator::Eq,
                TokenKind::Ne => BinaryOperator::Ne,
                TokenKind::Lt => BinaryOperator::Lt,
                TokenKind::Gt => BinaryOperator::Gt,
                TokenKind::Le => BinaryOperator::Le,
                TokenKind::Ge => BinaryOperator::Ge,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            expr = Expression::BinaryOp {
                op,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn parse_additive(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOperator::Add,
                TokenKind::Minus => BinaryOperator::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            expr = Expression::BinaryOp {
                op,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn parse_multiplicative(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.parse_unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOperator::Mul,
                TokenKind::Percent => BinaryOperator::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            expr = Expression::BinaryOp {
                op,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expression, ParseError> {
        if self.matches(TokenKind::Not) {
            let expr = self.parse_unary()?;
            return Ok(Expression::UnaryOp {
                op: UnaryOperator::Not,
                expr: Box::new(expr),
            });
        }
        if self.matches(TokenKind::Minus) {
            let expr = self.parse_unary()?;
            return Ok(Expression::UnaryOp {
                op: UnaryOperator::Negate,
                expr: Box::new(expr),
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expression, ParseError> {
        if self.check(TokenKind::Number) {
            let token = self.advance();
            let value = token
                .text
                .parse::<f64>()
                .map_err(|_| ParseError::UnexpectedToken {
                    expected: "Expected number".to_string(),
                    found: token.to_string(),
                    line: token.line,
                    column: token.column,
                })?;
            return Ok(Expression::Literal(Value::Number(value)));
        }

        // Quoted strings and backtick symbols both become text at runtime.
        if self.check(TokenKind::Str) || self.check(TokenKind::Symbol) {
            let text = self.advance().text.clone();
            return Ok(Expression::Literal(Value::Text(text)));
        }

        if self.check(TokenKind::Identifier) {
            let name = self.advance().text.clone();

            // An identifier directly followed by '[' is a function call.
            if self.matches(TokenKind::LBracket) {
                let mut args = Vec::new();
                if !self.check(TokenKind::RBracket) {
                    loop {
                        args.push(self.parse_expression()?);
                        if !self.matches(TokenKind::Semicolon)
                            && !self.matches(TokenKind::Comma)
                        {
                            break;
                        }
                    }
                }
                self.consume(TokenKind::RBracket, "Expected ]")?;
                return Ok(Expression::FunctionCall { name, args });
            }

            return Ok(Expression::Variable(name));
        }

        if self.matches(TokenKind::LParen) {
            let expr = self.parse_expression()?;
            self.consume(TokenKind::RParen, "Expected )")?;
            return Ok(expr);
        }

        Err(self.error("Expected expression"))
    }

    // Token stream helpers

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.position += 1;
        }
        &self.tokens[self.position - 1]
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.position]
    }

    fn peek_ahead(&self, offset: usize) -> &Token {
        let pos = (self.position + offset).min(self.tokens.len() - 1);
        &self.tokens[pos]
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> Result<&Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(message))
        }
    }

    fn error(&self, message: &str) -> ParseError {
        let token = self.peek();
        ParseError::UnexpectedToken {
            expected: message.to_string(),
            found: token.to_string(),
            line: token.line,
            column: token.column,
        }
    }
}

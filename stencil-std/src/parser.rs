//! Binding expression parser
//!
//! Tokenize, then recursive descent over the tokens. Left-associative
//! chains and prefix operator runs are parsed with loops; only parentheses
//! and conditional branches nest, and nesting is capped.
//! Precedence, lowest first: `? :` (conditional), `?:` (Elvis), `||`, `&&`,
//! comparisons, `+ -`, `* / %`, unary `! -`, primaries.

use crate::ast::{BinOp, Expr, UnaryOp};
use stencil_core::{ExprError, Value};
use stencil_plugin::parse_path;

/// Deepest nesting of parentheses and conditional branches
pub const MAX_DEPTH: usize = 64;

/// Most tokens a single expression may have
pub const MAX_TOKENS: usize = 1024;

/// How the standard provider treats a template text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    /// Starts with `$`: always an expression, parse errors surface
    Expression,
    /// Starts with `(`, `!` or a quote: an expression only if it parses
    Candidate,
    /// Plain text
    Literal,
}

pub fn classify(text: &str) -> TextKind {
    match text.trim_start().chars().next() {
        Some('$') => TextKind::Expression,
        Some('(' | '!' | '\'' | '"') => TextKind::Candidate,
        _ => TextKind::Literal,
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Str(String),
    Path(String),
    True,
    False,
    Null,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    AndAnd,
    OrOr,
    Compare(BinOp),
    Question,
    Elvis,
    Colon,
    LParen,
    RParen,
}

fn is_path_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

/// Tokenize expression string
fn tokenize(input: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&ch) = chars.peek() {
        chars.next();
        let token = match ch {
            c if c.is_whitespace() => continue,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '%' => Token::Percent,
            '(' => Token::LParen,
            ')' => Token::RParen,
            ':' => Token::Colon,
            '?' => {
                if chars.next_if_eq(&':').is_some() {
                    Token::Elvis
                } else {
                    Token::Question
                }
            }
            '!' => {
                if chars.next_if_eq(&'=').is_some() {
                    Token::Compare(BinOp::Ne)
                } else {
                    Token::Bang
                }
            }
            '=' => {
                if chars.next_if_eq(&'=').is_none() {
                    return Err(ExprError::parse_error("'=' is not an operator")
                        .with_suggestion("Use '==' for comparison"));
                }
                Token::Compare(BinOp::Eq)
            }
            '<' => match chars.next_if_eq(&'=') {
                Some(_) => Token::Compare(BinOp::Le),
                None => Token::Compare(BinOp::Lt),
            },
            '>' => match chars.next_if_eq(&'=') {
                Some(_) => Token::Compare(BinOp::Ge),
                None => Token::Compare(BinOp::Gt),
            },
            '&' | '|' => {
                if chars.next_if_eq(&ch).is_none() {
                    return Err(ExprError::parse_error(format!("'{}' is not an operator", ch))
                        .with_suggestion(format!("Use '{}{}'", ch, ch)));
                }
                if ch == '&' {
                    Token::AndAnd
                } else {
                    Token::OrOr
                }
            }
            '\'' | '"' => {
                let mut text = String::new();
                let mut closed = false;
                while let Some(c) = chars.next() {
                    match c {
                        '\\' => match chars.next() {
                            Some('n') => text.push('\n'),
                            Some('t') => text.push('\t'),
                            Some(other) => text.push(other),
                            None => break,
                        },
                        c if c == ch => {
                            closed = true;
                            break;
                        }
                        c => text.push(c),
                    }
                }
                if !closed {
                    return Err(ExprError::parse_error("Unterminated string literal"));
                }
                Token::Str(text)
            }
            '$' => {
                let mut path = String::new();
                while let Some(&c) = chars.peek() {
                    if is_path_char(c) {
                        path.push(c);
                        chars.next();
                    } else if c == '[' {
                        // Bracket segments may hold quoted keys with any character
                        let mut quote = None;
                        for c in chars.by_ref() {
                            path.push(c);
                            match quote {
                                Some(q) if c == q => quote = None,
                                Some(_) => {}
                                None if c == '\'' || c == '"' => quote = Some(c),
                                None if c == ']' => break,
                                None => {}
                            }
                        }
                    } else {
                        break;
                    }
                }
                if !path.is_empty() && parse_path(&path).is_none() {
                    return Err(ExprError::parse_error(format!("Invalid data path: ${}", path)));
                }
                Token::Path(path)
            }
            '0'..='9' | '.' => {
                let mut num_str = String::from(ch);
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' {
                        num_str.push(c);
                        chars.next();
                    } else if matches!(c, 'e' | 'E') && !num_str.contains(['e', 'E'].as_slice()) {
                        num_str.push(c);
                        chars.next();
                        if let Some(sign) = chars.next_if(|&s| s == '+' || s == '-') {
                            num_str.push(sign);
                        }
                    } else {
                        break;
                    }
                }
                if chars.peek().map_or(false, |&c| c.is_alphanumeric() || c == '_') {
                    return Err(ExprError::parse_error(format!("Invalid number: {}", num_str)));
                }
                match num_str.parse::<f64>() {
                    Ok(n) => Token::Number(n),
                    Err(_) => {
                        return Err(ExprError::parse_error(format!("Invalid number: {}", num_str)))
                    }
                }
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut ident = String::from(c);
                while let Some(c) = chars.next_if(|&c| c.is_alphanumeric() || c == '_') {
                    ident.push(c);
                }
                match ident.as_str() {
                    "true" => Token::True,
                    "false" => Token::False,
                    "null" => Token::Null,
                    _ => {
                        return Err(ExprError::parse_error(format!("Unexpected token: {}", ident))
                            .with_suggestion(
                                "Quote string literals ('text') and prefix data paths with '$'",
                            ))
                    }
                }
            }
            other => {
                return Err(ExprError::parse_error(format!("Unexpected character: {}", other)))
            }
        };
        tokens.push(token);
    }

    Ok(tokens)
}

/// Parse tokens into AST
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0, depth: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    /// Consume `token` if it is next.
    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn enter(&mut self) -> Result<(), ExprError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ExprError::parse_error("Expression nested too deeply")
                .with_suggestion(format!("Nest at most {} levels", MAX_DEPTH)));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    // ternary = elvis ('?' ternary ':' ternary)?
    fn parse_ternary(&mut self) -> Result<Expr, ExprError> {
        let cond = self.parse_elvis()?;
        if !self.eat(&Token::Question) {
            return Ok(cond);
        }

        self.enter()?;
        let then = self.parse_ternary()?;
        if !self.eat(&Token::Colon) {
            return Err(ExprError::parse_error("'?' without matching ':'"));
        }
        let otherwise = self.parse_ternary()?;
        self.leave();

        Ok(Expr::Ternary(Box::new(cond), Box::new(then), Box::new(otherwise)))
    }

    // elvis = or ('?:' or)*  (right associative)
    fn parse_elvis(&mut self) -> Result<Expr, ExprError> {
        let mut operands = vec![self.parse_or()?];
        while self.eat(&Token::Elvis) {
            operands.push(self.parse_or()?);
        }

        let mut expr = operands.pop().ok_or_else(|| ExprError::parse_error("Missing operand"))?;
        while let Some(value) = operands.pop() {
            expr = Expr::Elvis(Box::new(value), Box::new(expr));
        }
        Ok(expr)
    }

    // or = and ('||' and)*
    fn parse_or(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_and()?;
        while self.eat(&Token::OrOr) {
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    // and = comparison ('&&' comparison)*
    fn parse_and(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_comparison()?;
        while self.eat(&Token::AndAnd) {
            let right = self.parse_comparison()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    // comparison = additive (cmp additive)?  (comparisons do not chain)
    fn parse_comparison(&mut self) -> Result<Expr, ExprError> {
        let left = self.parse_additive()?;
        if let Some(&Token::Compare(op)) = self.peek() {
            self.advance();
            let right = self.parse_additive()?;
            if matches!(self.peek(), Some(Token::Compare(_))) {
                return Err(ExprError::parse_error("Comparisons cannot be chained")
                    .with_suggestion("Combine comparisons with '&&'"));
            }
            return Ok(Expr::Binary(Box::new(left), op, Box::new(right)));
        }
        Ok(left)
    }

    // additive = multiplicative (('+' | '-') multiplicative)*
    fn parse_additive(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    // multiplicative = unary (('*' | '/' | '%') unary)*
    fn parse_multiplicative(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                Some(Token::Percent) => BinOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    // unary = ('!' | '-')* primary
    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        let mut ops = Vec::new();
        loop {
            match self.peek() {
                Some(Token::Bang) => ops.push(UnaryOp::Not),
                Some(Token::Minus) => ops.push(UnaryOp::Neg),
                _ => break,
            }
            self.advance();
        }

        let mut expr = self.parse_primary()?;
        for op in ops.into_iter().rev() {
            expr = match (op, expr) {
                (UnaryOp::Neg, Expr::Literal(Value::Number(n))) => Expr::Literal(Value::Number(-n)),
                (op, inner) => Expr::Unary(op, Box::new(inner)),
            };
        }
        Ok(expr)
    }

    // primary = number | string | true | false | null | path | '(' ternary ')'
    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(Expr::Literal(Value::Number(n))),
            Some(Token::Str(s)) => Ok(Expr::Literal(Value::Text(s))),
            Some(Token::True) => Ok(Expr::Literal(Value::Bool(true))),
            Some(Token::False) => Ok(Expr::Literal(Value::Bool(false))),
            Some(Token::Null) => Ok(Expr::Literal(Value::Null)),
            Some(Token::Path(path)) => Ok(Expr::Path(path)),
            Some(Token::LParen) => {
                self.enter()?;
                let expr = self.parse_ternary()?;
                if !self.eat(&Token::RParen) {
                    return Err(ExprError::parse_error("Expected closing ')'"));
                }
                self.leave();
                Ok(expr)
            }
            Some(token) => Err(ExprError::parse_error(format!("Unexpected token: {:?}", token))),
            None => Err(ExprError::parse_error("Missing operand")),
        }
    }
}

/// Parse an expression string into an AST
pub fn parse_expr(input: &str) -> Result<Expr, ExprError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(ExprError::parse_error("Empty expression"));
    }
    if tokens.len() > MAX_TOKENS {
        return Err(ExprError::parse_error(format!(
            "Expression too long: {} tokens",
            tokens.len()
        ))
        .with_suggestion(format!("Keep expressions under {} tokens", MAX_TOKENS)));
    }

    let mut parser = Parser::new(tokens);
    let expr = parser.parse_ternary()?;

    if let Some(token) = parser.peek() {
        return Err(ExprError::parse_error(format!("Unexpected input: {:?}", token)));
    }

    Ok(expr)
}

//! Calculator
//!
//! In-process arithmetic evaluator. Supports `+ - * / % ^`, unary minus,
//! parentheses and decimal literals. Every binary operation is recorded as a
//! step so the caller can show the working.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::executor::ToolResult;
use crate::params::{ToolParameters, CALCULATOR};
use crate::trait_def::{Tool, ToolExecutionContext};

/// Longest accepted expression, in characters
const MAX_EXPRESSION_LEN: usize = 1000;
/// Deepest accepted nesting of parentheses / unary operators
const MAX_DEPTH: usize = 64;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    #[error("Expression is empty")]
    Empty,
    #[error("Expression is too long (max 1000 characters)")]
    TooLong,
    #[error("Unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },
    #[error("Invalid number '{0}'")]
    InvalidNumber(String),
    #[error("Unexpected {0}")]
    UnexpectedToken(String),
    #[error("Unexpected end of expression")]
    UnexpectedEnd,
    #[error("Expression is nested too deeply")]
    TooDeep,
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Result is not a finite number")]
    NotFinite,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    LParen,
    RParen,
    Eof,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Num(n) => format!("number {}", format_number(*n)),
            Token::Plus => "'+'".to_string(),
            Token::Minus => "'-'".to_string(),
            Token::Star => "'*'".to_string(),
            Token::Slash => "'/'".to_string(),
            Token::Percent => "'%'".to_string(),
            Token::Caret => "'^'".to_string(),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::Eof => "end of expression".to_string(),
        }
    }
}

fn lex(src: &str) -> Result<Vec<Token>, CalcError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = src.chars().collect();
    let mut pos = 0usize;

    while pos < chars.len() {
        let c = chars[pos];

        if c.is_whitespace() {
            pos += 1;
            continue;
        }

        if c.is_ascii_digit() || c == '.' {
            let start = pos;
            while pos < chars.len() && (chars[pos].is_ascii_digit() || chars[pos] == '.') {
                pos += 1;
            }
            let text: String = chars[start..pos].iter().collect();
            let value = text
                .parse::<f64>()
                .map_err(|_| CalcError::InvalidNumber(text.clone()))?;
            tokens.push(Token::Num(value));
            continue;
        }

        let token = match c {
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' | '×' => Token::Star,
            '/' | '÷' => Token::Slash,
            '%' => Token::Percent,
            '^' => Token::Caret,
            '(' => Token::LParen,
            ')' => Token::RParen,
            other => return Err(CalcError::UnexpectedChar { ch: other, pos }),
        };
        tokens.push(token);
        pos += 1;
    }

    tokens.push(Token::Eof);
    Ok(tokens)
}

/// Recursive-descent evaluator over the token stream.
///
/// ```text
/// expr    := term (('+' | '-') term)*
/// term    := unary (('*' | '/' | '%') unary)*
/// unary   := ('-' | '+') unary | power
/// power   := primary ('^' unary)?
/// primary := number | '(' expr ')'
/// ```
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    steps: Vec<String>,
}

impl Parser {
    fn peek(&self) -> Token {
        self.tokens.get(self.pos).copied().unwrap_or(Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn enter(&mut self) -> Result<(), CalcError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(CalcError::TooDeep);
        }
        Ok(())
    }

    fn record(&mut self, lhs: f64, op: &str, rhs: f64, result: f64) -> Result<f64, CalcError> {
        if !result.is_finite() {
            return Err(CalcError::NotFinite);
        }
        self.steps.push(format!(
            "{} {} {} = {}",
            format_number(lhs),
            op,
            format_number(rhs),
            format_number(result)
        ));
        Ok(result)
    }

    fn expr(&mut self) -> Result<f64, CalcError> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Token::Plus => {
                    self.advance();
                    let rhs = self.term()?;
                    value = self.record(value, "+", rhs, value + rhs)?;
                }
                Token::Minus => {
                    self.advance();
                    let rhs = self.term()?;
                    value = self.record(value, "-", rhs, value - rhs)?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> Result<f64, CalcError> {
        let mut value = self.unary()?;
        loop {
            match self.peek() {
                Token::Star => {
                    self.advance();
                    let rhs = self.unary()?;
                    value = self.record(value, "*", rhs, value * rhs)?;
                }
                Token::Slash => {
                    self.advance();
                    let rhs = self.unary()?;
                    if rhs == 0.0 {
                        return Err(CalcError::DivisionByZero);
                    }
                    value = self.record(value, "/", rhs, value / rhs)?;
                }
                Token::Percent => {
                    self.advance();
                    let rhs = self.unary()?;
                    if rhs == 0.0 {
                        return Err(CalcError::DivisionByZero);
                    }
                    value = self.record(value, "%", rhs, value % rhs)?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn unary(&mut self) -> Result<f64, CalcError> {
        match self.peek() {
            Token::Minus => {
                self.advance();
                self.enter()?;
                let value = self.unary()?;
                self.depth -= 1;
                Ok(-value)
            }
            Token::Plus => {
                self.advance();
                self.enter()?;
                let value = self.unary()?;
                self.depth -= 1;
                Ok(value)
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<f64, CalcError> {
        let base = self.primary()?;
        if self.peek() == Token::Caret {
            self.advance();
            self.enter()?;
            let exponent = self.unary()?;
            self.depth -= 1;
            return self.record(base, "^", exponent, base.powf(exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<f64, CalcError> {
        match self.advance() {
            Token::Num(n) => Ok(n),
            Token::LParen => {
                self.enter()?;
                let value = self.expr()?;
                self.depth -= 1;
                match self.advance() {
                    Token::RParen => Ok(value),
                    Token::Eof => Err(CalcError::UnexpectedEnd),
                    other => Err(CalcError::UnexpectedToken(other.describe())),
                }
            }
            Token::Eof => Err(CalcError::UnexpectedEnd),
            other => Err(CalcError::UnexpectedToken(other.describe())),
        }
    }
}

/// Outcome of a successful evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub result: f64,
    pub steps: Vec<String>,
}

/// Evaluate an arithmetic expression.
pub fn evaluate(expression: &str) -> Result<Evaluation, CalcError> {
    let trimmed = expression.trim();
    if trimmed.is_empty() {
        return Err(CalcError::Empty);
    }
    if trimmed.chars().count() > MAX_EXPRESSION_LEN {
        return Err(CalcError::TooLong);
    }

    let mut parser = Parser {
        tokens: lex(trimmed)?,
        pos: 0,
        depth: 0,
        steps: Vec::new(),
    };
    let result = parser.expr()?;
    match parser.peek() {
        Token::Eof => {}
        other => return Err(CalcError::UnexpectedToken(other.describe())),
    }

    // Normalize -0 so it displays as 0
    let result = if result == 0.0 { 0.0 } else { result };
    Ok(Evaluation {
        result,
        steps: parser.steps,
    })
}

/// Render a number without a trailing `.0` for integral values
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// The `calculator` tool
pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        CALCULATOR
    }

    fn description(&self) -> &str {
        "Perform mathematical calculations"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "Mathematical expression to evaluate (e.g., \"2 + 2 * 3\")"
                }
            },
            "required": ["expression"]
        })
    }

    async fn execute(&self, _ctx: &ToolExecutionContext, params: &ToolParameters) -> ToolResult {
        let ToolParameters::Calculator(calc) = params else {
            return ToolResult::err(format!("Invalid parameters for {}", CALCULATOR));
        };

        match evaluate(&calc.expression) {
            Ok(evaluation) => ToolResult::ok(json!(evaluation.result))
                .with_meta("expression", json!(calc.expression))
                .with_meta("steps", json!(evaluation.steps)),
            Err(e) => ToolResult::err(format!("Calculation failed: {}", e))
                .with_meta("expression", json!(calc.expression)),
        }
    }
}

// Arithmetic calculator tool
use anyhow::Error;
use async_trait::async_trait;

use super::tool::Tool;

const CALCULATOR_DESCRIPTION: &str = "Useful for when you need to answer questions about math. \
The input should be a plain arithmetic expression, for example '37593 * 67' or '(4 + 5) / 3'.";

// Evaluates plain arithmetic expressions so the model does not have to do
// the math itself: + - * /, parentheses, unary minus, decimal literals.
#[derive(Clone, Default)]
pub struct Calculator;

impl Calculator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for Calculator {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        CALCULATOR_DESCRIPTION
    }

    async fn invoke(&self, input: &str) -> Result<String, Error> {
        let result = evaluate(input)?;
        Ok(format!("{}", result))
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Evaluate an arithmetic expression.
pub fn evaluate(expression: &str) -> Result<f64, Error> {
    let mut parser = Parser::new(expression);
    let value = parser.parse_expression()?;
    parser.skip_whitespace();
    if parser.pos < parser.bytes.len() {
        return Err(Error::msg(format!(
            "Unexpected character '{}' in expression",
            parser.bytes[parser.pos] as char
        )));
    }
    Ok(value)
}

// Recursive descent over the byte representation. Expressions here are
// short model-generated strings, ASCII operators and digits only.
struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(expression: &'a str) -> Self {
        Self {
            bytes: expression.as_bytes(),
            pos: 0,
        }
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_whitespace();
        self.bytes.get(self.pos).copied()
    }

    // expression := term (('+' | '-') term)*
    fn parse_expression(&mut self) -> Result<f64, Error> {
        let mut value = self.parse_term()?;
        while let Some(op) = self.peek() {
            match op {
                b'+' => {
                    self.pos += 1;
                    value += self.parse_term()?;
                }
                b'-' => {
                    self.pos += 1;
                    value -= self.parse_term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    // term := factor (('*' | '/') factor)*
    fn parse_term(&mut self) -> Result<f64, Error> {
        let mut value = self.parse_factor()?;
        while let Some(op) = self.peek() {
            match op {
                b'*' => {
                    self.pos += 1;
                    value *= self.parse_factor()?;
                }
                b'/' => {
                    self.pos += 1;
                    let divisor = self.parse_factor()?;
                    if divisor == 0.0 {
                        return Err(Error::msg("Division by zero"));
                    }
                    value /= divisor;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    // factor := '-' factor | '(' expression ')' | number
    fn parse_factor(&mut self) -> Result<f64, Error> {
        match self.peek() {
            Some(b'-') => {
                self.pos += 1;
                Ok(-self.parse_factor()?)
            }
            Some(b'(') => {
                self.pos += 1;
                let value = self.parse_expression()?;
                if self.peek() != Some(b')') {
                    return Err(Error::msg("Missing closing parenthesis"));
                }
                self.pos += 1;
                Ok(value)
            }
            Some(c) if c.is_ascii_digit() || c == b'.' => self.parse_number(),
            Some(c) => Err(Error::msg(format!(
                "Unexpected character '{}' in expression",
                c as char
            ))),
            None => Err(Error::msg("Unexpected end of expression")),
        }
    }

    fn parse_number(&mut self) -> Result<f64, Error> {
        self.skip_whitespace();
        let start = self.pos;
        while self.pos < self.bytes.len()
            && (self.bytes[self.pos].is_ascii_digit() || self.bytes[self.pos] == b'.')
        {
            self.pos += 1;
        }
        let literal = std::str::from_utf8(&self.bytes[start..self.pos]).unwrap_or_default();
        literal
            .parse::<f64>()
            .map_err(|e| Error::msg(format!("Invalid number '{}': {}", literal, e)))
    }
}

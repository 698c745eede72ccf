use async_trait::async_trait;
use axon_plugin::{Permission, Plugin, PluginError, PluginOutput, Result};
use serde::Deserialize;
use serde_json::Value;

/// Calculator plugin for mathematical expressions.
///
/// Evaluates arithmetic with a small recursive-descent parser rather than any
/// form of code evaluation. Supported: `+`, `-`, `*`, `/`, `**` (power),
/// parentheses, and unary minus.
pub struct CalculatorPlugin;

#[derive(Debug, Deserialize)]
struct CalculatorParams {
    expression: String,
}

#[async_trait]
impl Plugin for CalculatorPlugin {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Calculate mathematical expressions. Supports +, -, *, /, ** (power). \
         Example: 25 * 4 + 10"
    }

    fn parameter_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "required": ["expression"],
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "Mathematical expression to evaluate"
                }
            }
        })
    }

    fn required_permission(&self) -> Permission {
        Permission::NONE
    }

    async fn execute(&self, input: Value) -> Result<PluginOutput> {
        let params: CalculatorParams = serde_json::from_value(input)
            .map_err(|e| PluginError::InvalidInput(format!("Invalid parameters: {}", e)))?;

        if params.expression.trim().is_empty() {
            return Err(PluginError::InvalidInput(
                "Expression is required".to_string(),
            ));
        }

        let result = evaluate(&params.expression)
            .map_err(|e| PluginError::ExecutionFailed(format!("Calculation error: {}", e)))?;

        Ok(PluginOutput::new(format_number(result)).with_metadata(serde_json::json!({
            "expression": params.expression,
            "result": result,
        })))
    }
}

/// Renders integers without a trailing ".0".
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Evaluates an arithmetic expression.
///
/// Grammar (Python-compatible precedence, `**` right-associative and binding
/// tighter than unary minus on its left):
///
/// ```text
/// expr    := term (('+' | '-') term)*
/// term    := unary (('*' | '/') unary)*
/// unary   := '-' unary | power
/// power   := primary ('**' unary)?
/// primary := number | '(' expr ')'
/// ```
fn evaluate(input: &str) -> std::result::Result<f64, String> {
    let mut parser = Parser {
        chars: input.chars().collect(),
        pos: 0,
    };
    let value = parser.expr()?;
    parser.skip_whitespace();
    if parser.pos < parser.chars.len() {
        return Err(format!(
            "Unexpected character '{}' at position {}",
            parser.chars[parser.pos], parser.pos
        ));
    }
    Ok(value)
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn expr(&mut self) -> std::result::Result<f64, String> {
        let mut value = self.term()?;
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('+') => {
                    self.pos += 1;
                    value += self.term()?;
                }
                Some('-') => {
                    self.pos += 1;
                    value -= self.term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn term(&mut self) -> std::result::Result<f64, String> {
        let mut value = self.unary()?;
        loop {
            self.skip_whitespace();
            match self.peek() {
                // A single '*'; '**' belongs to power and is never consumed here
                Some('*') if self.peek_at(1) != Some('*') => {
                    self.pos += 1;
                    value *= self.unary()?;
                }
                Some('/') => {
                    self.pos += 1;
                    let divisor = self.unary()?;
                    if divisor == 0.0 {
                        return Err("Division by zero".to_string());
                    }
                    value /= divisor;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn unary(&mut self) -> std::result::Result<f64, String> {
        self.skip_whitespace();
        if self.peek() == Some('-') {
            self.pos += 1;
            return Ok(-self.unary()?);
        }
        self.power()
    }

    fn power(&mut self) -> std::result::Result<f64, String> {
        let base = self.primary()?;
        self.skip_whitespace();
        if self.peek() == Some('*') && self.peek_at(1) == Some('*') {
            self.pos += 2;
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> std::result::Result<f64, String> {
        self.skip_whitespace();
        match self.peek() {
            Some('(') => {
                self.pos += 1;
                let value = self.expr()?;
                self.skip_whitespace();
                if self.peek() != Some(')') {
                    return Err("Expected closing parenthesis".to_string());
                }
                self.pos += 1;
                Ok(value)
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) => Err(format!("Unexpected character '{}'", c)),
            None => Err("Unexpected end of expression".to_string()),
        }
    }

    fn number(&mut self) -> std::result::Result<f64, String> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || c == '.')
        {
            self.pos += 1;
        }
        let literal: String = self.chars[start..self.pos].iter().collect();
        literal
            .parse::<f64>()
            .map_err(|_| format!("Invalid number '{}'", literal))
    }
}

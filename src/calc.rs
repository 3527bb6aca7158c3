//! Arithmetic for calculation blocks.
//!
//! Accepts digits, decimal points, `+ - * / %`, unary minus and parentheses.
//! Anything else makes the expression malformed.

/// Display value for an expression that cannot be evaluated.
pub const CALCULATION_SENTINEL: &str = "?";

/// Deepest nesting of parentheses and unary signs an expression may use
pub const MAX_NESTING: usize = 256;

/// Evaluates an arithmetic expression, returning `None` when it is malformed
/// or its result is not a finite number.
pub fn evaluate_expression(expr: &str) -> Option<f64> {
    let tokens = tokenize(expr)?;
    if tokens.is_empty() {
        return None;
    }
    let mut parser = ExprParser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expression()?;
    if parser.pos != parser.tokens.len() || !value.is_finite() {
        return None;
    }
    Some(value)
}

/// Formats the result of an expression for display, `"?"` when malformed.
pub fn format_calculation(expr: &str) -> String {
    match evaluate_expression(expr) {
        Some(value) if value.fract() == 0.0 && value.abs() < 1e15 => format!("{}", value as i64),
        Some(value) => {
            let rounded = format!("{:.6}", value);
            rounded.trim_end_matches('0').trim_end_matches('.').to_string()
        }
        None => CALCULATION_SENTINEL.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Op(char),
    Open,
    Close,
}

fn tokenize(expr: &str) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = expr.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        literal.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Number(literal.parse().ok()?));
            }
            '+' | '-' | '*' | '/' | '%' => {
                tokens.push(Token::Op(c));
                chars.next();
            }
            // Common typographic stand-ins typed on mobile keyboards
            '×' => {
                tokens.push(Token::Op('*'));
                chars.next();
            }
            '÷' => {
                tokens.push(Token::Op('/'));
                chars.next();
            }
            '(' => {
                tokens.push(Token::Open);
                chars.next();
            }
            ')' => {
                tokens.push(Token::Close);
                chars.next();
            }
            _ => return None,
        }
    }
    Some(tokens)
}

struct ExprParser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl ExprParser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn expression(&mut self) -> Option<f64> {
        let mut value = self.term()?;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Some(value)
    }

    fn term(&mut self) -> Option<f64> {
        let mut value = self.factor()?;
        while let Some(Token::Op(op @ ('*' | '/' | '%'))) = self.peek() {
            self.pos += 1;
            let rhs = self.factor()?;
            value = match op {
                '*' => value * rhs,
                '/' if rhs != 0.0 => value / rhs,
                '%' if rhs != 0.0 => value % rhs,
                _ => return None,
            };
        }
        Some(value)
    }

    fn factor(&mut self) -> Option<f64> {
        if self.depth >= MAX_NESTING {
            return None;
        }
        self.depth += 1;
        let value = self.nested_factor();
        self.depth -= 1;
        value
    }

    fn nested_factor(&mut self) -> Option<f64> {
        match self.peek()? {
            Token::Op('-') => {
                self.pos += 1;
                Some(-self.factor()?)
            }
            Token::Op('+') => {
                self.pos += 1;
                self.factor()
            }
            Token::Number(n) => {
                self.pos += 1;
                Some(n)
            }
            Token::Open => {
                self.pos += 1;
                let value = self.expression()?;
                if self.peek()? != Token::Close {
                    return None;
                }
                self.pos += 1;
                Some(value)
            }
            _ => None,
        }
    }
}

//! Rule types and loose comparison logic for segment criteria.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crm_core::types::Customer;
use thiserror::Error;

/// Why a rule string could not be turned into a [`Rule`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("expected `<field> <operator> <value>`, found {found} token(s)")]
    TokenCount { found: usize },

    #[error("unknown field `{0}`")]
    UnknownField(String),

    #[error("unknown operator `{0}`")]
    UnknownOperator(String),
}

/// Customer attribute a rule can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerField {
    Id,
    Name,
    Email,
    Phone,
    TotalPurchases,
}

impl CustomerField {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "id" => Some(CustomerField::Id),
            "name" => Some(CustomerField::Name),
            "email" => Some(CustomerField::Email),
            "phone" => Some(CustomerField::Phone),
            "totalPurchases" | "total_purchases" => Some(CustomerField::TotalPurchases),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerField::Id => "id",
            CustomerField::Name => "name",
            CustomerField::Email => "email",
            CustomerField::Phone => "phone",
            CustomerField::TotalPurchases => "totalPurchases",
        }
    }

    fn value<'c>(&self, customer: &'c Customer) -> Operand<'c> {
        match self {
            CustomerField::Id => Operand::Text(&customer.id),
            CustomerField::Name => Operand::Text(&customer.name),
            CustomerField::Email => Operand::Text(&customer.email),
            CustomerField::Phone => Operand::Text(&customer.phone),
            CustomerField::TotalPurchases => Operand::Number(customer.total_purchases),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOperator {
    /// `>`
    GreaterThan,
    /// `<`
    LessThan,
    /// `=`
    Equal,
    /// `==`, same semantics as `=`
    LooseEqual,
    /// `!=`
    NotEqual,
}

impl RuleOperator {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            ">" => Some(RuleOperator::GreaterThan),
            "<" => Some(RuleOperator::LessThan),
            "=" => Some(RuleOperator::Equal),
            "==" => Some(RuleOperator::LooseEqual),
            "!=" => Some(RuleOperator::NotEqual),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleOperator::GreaterThan => ">",
            RuleOperator::LessThan => "<",
            RuleOperator::Equal => "=",
            RuleOperator::LooseEqual => "==",
            RuleOperator::NotEqual => "!=",
        }
    }

    fn apply(&self, actual: Operand<'_>, expected: Operand<'_>) -> bool {
        match self {
            RuleOperator::GreaterThan => loose_cmp(actual, expected) == Some(Ordering::Greater),
            RuleOperator::LessThan => loose_cmp(actual, expected) == Some(Ordering::Less),
            RuleOperator::Equal | RuleOperator::LooseEqual => loose_eq(actual, expected),
            RuleOperator::NotEqual => !loose_eq(actual, expected),
        }
    }
}

/// Rule literal: numeric when [`to_number`] accepts the token, text otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleValue {
    Number(f64),
    Text(String),
}

impl RuleValue {
    pub fn coerce(token: &str) -> Self {
        let n = to_number(token);
        if n.is_nan() {
            RuleValue::Text(token.to_string())
        } else {
            RuleValue::Number(n)
        }
    }

    fn operand(&self) -> Operand<'_> {
        match self {
            RuleValue::Number(n) => Operand::Number(*n),
            RuleValue::Text(s) => Operand::Text(s),
        }
    }
}

impl fmt::Display for RuleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleValue::Number(n) if n.is_infinite() => {
                f.write_str(if *n > 0.0 { "Infinity" } else { "-Infinity" })
            }
            RuleValue::Number(n) => write!(f, "{n}"),
            RuleValue::Text(s) => f.write_str(s),
        }
    }
}

/// A single `<field> <operator> <value>` comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub field: CustomerField,
    pub operator: RuleOperator,
    pub value: RuleValue,
}

impl Rule {
    /// Parse a rule string. Tokens are separated by whitespace; there is no
    /// quoting, so text values cannot contain spaces.
    pub fn parse(input: &str) -> Result<Self, RuleError> {
        let tokens: Vec<&str> = input.split_whitespace().collect();
        let &[field, operator, value] = tokens.as_slice() else {
            return Err(RuleError::TokenCount {
                found: tokens.len(),
            });
        };

        let field = CustomerField::from_name(field)
            .ok_or_else(|| RuleError::UnknownField(field.to_string()))?;
        let operator = RuleOperator::from_token(operator)
            .ok_or_else(|| RuleError::UnknownOperator(operator.to_string()))?;

        Ok(Rule {
            field,
            operator,
            value: RuleValue::coerce(value),
        })
    }

    pub fn evaluate(&self, customer: &Customer) -> bool {
        self.operator
            .apply(self.field.value(customer), self.value.operand())
    }
}

impl FromStr for Rule {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rule::parse(s)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.field.as_str(),
            self.operator.as_str(),
            self.value
        )
    }
}

#[derive(Debug, Clone, Copy)]
enum Operand<'a> {
    Number(f64),
    Text(&'a str),
}

impl Operand<'_> {
    /// Numeric view used when a number meets text.
    fn as_number(&self) -> f64 {
        match self {
            Operand::Number(n) => *n,
            Operand::Text(s) => to_number(s),
        }
    }
}

/// Text to number with the same grammar as a browser's `Number(text)`.
///
/// Surrounding whitespace is ignored and blank text is zero. Accepted forms are
/// signed decimals with an optional exponent, `Infinity` with an optional sign,
/// and unsigned `0x`/`0o`/`0b` integers. Everything else (including `inf`,
/// `nan`, and digit separators) is NaN.
pub fn to_number(text: &str) -> f64 {
    let s = text.trim();
    match s {
        "" => return 0.0,
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if let Some(n) = radix_integer(s) {
        return n;
    }
    let decimal = s
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));
    if decimal {
        s.parse().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

/// `0x1A`, `0o17`, `0b101`. `None` when there is no radix prefix.
fn radix_integer(s: &str) -> Option<f64> {
    let radix = match s.get(..2)? {
        "0x" | "0X" => 16,
        "0o" | "0O" => 8,
        "0b" | "0B" => 2,
        _ => return None,
    };
    let digits = &s[2..];
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Some(f64::NAN);
    }
    Some(digits.chars().fold(0.0, |acc, c| {
        acc * f64::from(radix) + c.to_digit(radix).map_or(0.0, f64::from)
    }))
}

fn loose_cmp(a: Operand<'_>, b: Operand<'_>) -> Option<Ordering> {
    match (a, b) {
        (Operand::Text(x), Operand::Text(y)) => Some(x.cmp(y)),
        (x, y) => x.as_number().partial_cmp(&y.as_number()),
    }
}

fn loose_eq(a: Operand<'_>, b: Operand<'_>) -> bool {
    match (a, b) {
        (Operand::Text(x), Operand::Text(y)) => x == y,
        (x, y) => x.as_number() == y.as_number(),
    }
}

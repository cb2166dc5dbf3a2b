// SPDX: CC0-1.0

use crate::Number;
use core::{fmt, str::FromStr};
use thiserror::Error;

/// Divisors with a smaller magnitude than this make [`Operator::Divide`] undefined.
pub const DIVIDE_EPSILON: Number = 1e-12;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    pub const fn exhaustive() -> &'static [Operator] {
        &[Self::Add, Self::Subtract, Self::Multiply, Self::Divide]
    }

    pub const fn symbol(&self) -> char {
        match self {
            Self::Add => '+',
            Self::Subtract => '-',
            Self::Multiply => '*',
            Self::Divide => '/',
        }
    }

    pub const fn token(&self) -> &'static str {
        match self {
            Self::Add => "plus",
            Self::Subtract => "minus",
            Self::Multiply => "mul",
            Self::Divide => "div",
        }
    }

    /// Every spelling accepted by [`FromStr`].
    const fn spellings(&self) -> &'static [&'static str] {
        match self {
            Self::Add => &["+", "plus", "add"],
            Self::Subtract => &["-", "minus", "sub", "subtract"],
            Self::Multiply => &["*", "mul", "multiply", "times"],
            Self::Divide => &["/", "div", "divide"],
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown operator '{token}'{}", did_you_mean(.suggestion))]
pub struct UnknownOperator {
    pub token: String,
    pub suggestion: Option<&'static str>,
}

fn did_you_mean(suggestion: &Option<&'static str>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean '{s}'?)"),
        None => String::new(),
    }
}

impl UnknownOperator {
    fn new(token: &str) -> Self {
        let lower = token.to_ascii_lowercase();
        let suggestion = Operator::exhaustive()
            .iter()
            .flat_map(|op| op.spellings().iter().copied())
            .filter(|s| s.len() > 1)
            .map(|s| (strsim::normalized_damerau_levenshtein(&lower, s), s))
            .reduce(|acc, elem| if elem.0 > acc.0 { elem } else { acc })
            .and_then(|(sim, s)| (sim > 0.3).then_some(s));
        Self {
            token: token.to_string(),
            suggestion,
        }
    }
}

impl FromStr for Operator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        for op in Self::exhaustive() {
            if op
                .spellings()
                .iter()
                .any(|sp| sp.eq_ignore_ascii_case(trimmed))
            {
                return Ok(*op);
            }
        }
        Err(UnknownOperator::new(trimmed))
    }
}

/// Applies `op` to `(a, b)`. Division by a near-zero divisor yields `None`
/// instead of an infinity.
pub fn apply(op: Operator, a: Number, b: Number) -> Option<Number> {
    match op {
        Operator::Add => Some(a + b),
        Operator::Subtract => Some(a - b),
        Operator::Multiply => Some(a * b),
        Operator::Divide => {
            if b.abs() < DIVIDE_EPSILON {
                None
            } else {
                Some(a / b)
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperatorTriple(pub Operator, pub Operator, pub Operator);

impl OperatorTriple {
    pub const COUNT: usize = 64;

    /// All 64 triples, lexicographic in [`Operator::exhaustive`] order.
    pub fn all() -> Triples {
        Triples { next: 0 }
    }

    pub fn tokens(&self) -> String {
        format!("{}_{}_{}", self.0.token(), self.1.token(), self.2.token())
    }
}

impl fmt::Display for OperatorTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.0, self.1, self.2)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseTripleErr {
    #[error("expected 3 comma-separated operators, but found {found}")]
    Arity { found: usize },

    #[error(transparent)]
    Operator(#[from] UnknownOperator),
}

impl FromStr for OperatorTriple {
    type Err = ParseTripleErr;

    /// Parses `op1,op2,op3`, for example `plus,minus,div` or `+,-,/`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').collect();
        let [a, b, c] = parts[..] else {
            return Err(ParseTripleErr::Arity { found: parts.len() });
        };
        Ok(Self(a.parse()?, b.parse()?, c.parse()?))
    }
}

/// Lazy enumeration of every [`OperatorTriple`]; clone it to restart.
#[derive(Clone, Debug)]
pub struct Triples {
    next: usize,
}

impl Iterator for Triples {
    type Item = OperatorTriple;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= OperatorTriple::COUNT {
            return None;
        }
        let ops = Operator::exhaustive();
        let n = ops.len();
        let i = self.next;
        self.next += 1;
        Some(OperatorTriple(ops[i / (n * n)], ops[(i / n) % n], ops[i % n]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = OperatorTriple::COUNT.saturating_sub(self.next);
        (left, Some(left))
    }
}

impl ExactSizeIterator for Triples {}

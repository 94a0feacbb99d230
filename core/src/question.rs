use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Subtract,
}

impl Operation {
    pub fn symbol(&self) -> char {
        match self {
            Operation::Add => '+',
            Operation::Subtract => '-',
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Addition,
    Subtraction,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NumberRange {
    pub min: u32,
    pub max: u32,
}

impl NumberRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, n: u32) -> bool {
        self.min <= n && n <= self.max
    }
}

impl fmt::Display for NumberRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// A single arithmetic problem. Subtraction questions always have
/// `num1 >= num2` so the answer is never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Question {
    pub num1: u32,
    pub num2: u32,
    pub operation: Operation,
}

impl Question {
    pub fn new(num1: u32, num2: u32, operation: Operation) -> Self {
        Self {
            num1,
            num2,
            operation,
        }
    }

    pub fn add(num1: u32, num2: u32) -> Self {
        Self::new(num1, num2, Operation::Add)
    }

    pub fn subtract(num1: u32, num2: u32) -> Self {
        Self::new(num1, num2, Operation::Subtract)
    }

    pub fn answer(&self) -> u32 {
        match self.operation {
            Operation::Add => self.num1 + self.num2,
            Operation::Subtract => self.num1.saturating_sub(self.num2),
        }
    }

    pub fn is_correct(&self, user_answer: i64) -> bool {
        user_answer == i64::from(self.answer())
    }

    pub fn display(&self) -> String {
        format!("{} {} {} = ?", self.num1, self.operation, self.num2)
    }

    pub fn ones(&self) -> (u32, u32) {
        (self.num1 % 10, self.num2 % 10)
    }
}

/// Reads a typed answer. Empty or unparseable input is no answer at all.
pub fn parse_answer(input: &str) -> Option<i64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse().ok()
}

use serde::{Deserialize, Serialize};

use crate::question::{Operation, OperationKind, Question};
use crate::records::MistakeKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "scheme")]
pub enum MistakeScheme {
    /// `carry` / `borrow` / `basic`, from the ones digits.
    Digits,
    /// `mixed_error`, or `addition_error` / `subtraction_error`.
    LevelKind { kind: OperationKind },
}

pub fn classify(question: &Question, scheme: MistakeScheme) -> MistakeKind {
    match scheme {
        MistakeScheme::Digits => classify_digits(question),
        MistakeScheme::LevelKind { kind } => classify_level(question, kind),
    }
}

pub fn classify_digits(question: &Question) -> MistakeKind {
    let (a, b) = question.ones();
    match question.operation {
        Operation::Add if a + b >= 10 => MistakeKind::Carry,
        Operation::Subtract if a < b => MistakeKind::Borrow,
        _ => MistakeKind::Basic,
    }
}

pub fn classify_level(question: &Question, kind: OperationKind) -> MistakeKind {
    match (kind, question.operation) {
        (OperationKind::Mixed, _) => MistakeKind::MixedError,
        (_, Operation::Add) => MistakeKind::AdditionError,
        (_, Operation::Subtract) => MistakeKind::SubtractionError,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_scheme() {
        assert_eq!(classify_digits(&Question::add(27, 35)), MistakeKind::Carry);
        assert_eq!(classify_digits(&Question::add(5, 5)), MistakeKind::Carry);
        assert_eq!(classify_digits(&Question::add(21, 34)), MistakeKind::Basic);
        assert_eq!(classify_digits(&Question::subtract(42, 17)), MistakeKind::Borrow);
        assert_eq!(classify_digits(&Question::subtract(47, 12)), MistakeKind::Basic);
        assert_eq!(classify_digits(&Question::subtract(30, 30)), MistakeKind::Basic);
    }

    #[test]
    fn level_scheme_ignores_digits() {
        let carry = Question::add(27, 35);
        assert_eq!(
            classify(&carry, MistakeScheme::LevelKind { kind: OperationKind::Mixed }),
            MistakeKind::MixedError
        );
        assert_eq!(
            classify(&carry, MistakeScheme::LevelKind { kind: OperationKind::Addition }),
            MistakeKind::AdditionError
        );
        assert_eq!(
            classify_level(&Question::subtract(42, 17), OperationKind::Subtraction),
            MistakeKind::SubtractionError
        );
        assert_eq!(
            classify_level(&Question::subtract(42, 17), OperationKind::Mixed),
            MistakeKind::MixedError
        );
    }
}

use rand::Rng;
use tracing::warn;

use crate::catalog::SkillKind;
use crate::error::GenerateError;
use crate::question::{NumberRange, OperationKind, Question};

pub const MAX_RESAMPLE_ATTEMPTS: u32 = 1000;

pub const SUM_CEILING: u32 = 99;

pub const TENS_SUM_CEILING: u32 = 90;

fn check_range(generator: &'static str, range: NumberRange) -> Result<(), GenerateError> {
    if range.min > range.max {
        return Err(GenerateError::invalid(generator, range));
    }
    Ok(())
}

fn resample<R, F>(
    generator: &'static str,
    range: NumberRange,
    rng: &mut R,
    mut draw: F,
) -> Result<Question, GenerateError>
where
    R: Rng + ?Sized,
    F: FnMut(&mut R) -> Option<Question>,
{
    for _ in 0..MAX_RESAMPLE_ATTEMPTS {
        if let Some(question) = draw(rng) {
            return Ok(question);
        }
    }
    warn!(generator, %range, "resample limit reached");
    Err(GenerateError::ResampleLimit {
        generator,
        min: range.min,
        max: range.max,
        attempts: MAX_RESAMPLE_ATTEMPTS,
    })
}

fn draw<R: Rng + ?Sized>(rng: &mut R, range: NumberRange) -> u32 {
    rng.gen_range(range.min..=range.max)
}

/// Draws a minuend from `range` and a subtrahend from `[1, minuend]`.
fn draw_pair_below<R: Rng + ?Sized>(rng: &mut R, range: NumberRange) -> Option<(u32, u32)> {
    let num1 = draw(rng, range);
    if num1 == 0 {
        return None;
    }
    let num2 = rng.gen_range(1..=num1);
    Some((num1, num2))
}

/// Multiples of ten reachable from `range.min` in steps of ten, rounded to
/// the nearest ten.
fn draw_tens<R: Rng + ?Sized>(rng: &mut R, range: NumberRange) -> u32 {
    let steps = (range.max - range.min) / 10;
    let n = range.min + 10 * rng.gen_range(0..=steps);
    (n + 5) / 10 * 10
}

pub fn generate<R: Rng + ?Sized>(
    rng: &mut R,
    kind: OperationKind,
    range: NumberRange,
) -> Result<Question, GenerateError> {
    match kind {
        OperationKind::Addition => addition(rng, range),
        OperationKind::Subtraction => subtraction(rng, range),
        OperationKind::Mixed => {
            if rng.gen_bool(0.5) {
                addition(rng, range)
            } else {
                subtraction(rng, range)
            }
        }
    }
}

pub fn addition<R: Rng + ?Sized>(
    rng: &mut R,
    range: NumberRange,
) -> Result<Question, GenerateError> {
    check_range("addition", range)?;
    resample("addition", range, rng, |rng| {
        let (num1, num2) = (draw(rng, range), draw(rng, range));
        (num1 + num2 <= SUM_CEILING).then(|| Question::add(num1, num2))
    })
}

/// The subtrahend is drawn below the minuend, so `num1 >= num2 >= 1` holds
/// by construction.
pub fn subtraction<R: Rng + ?Sized>(
    rng: &mut R,
    range: NumberRange,
) -> Result<Question, GenerateError> {
    check_range("subtraction", range)?;
    resample("subtraction", range, rng, |rng| {
        draw_pair_below(rng, range).map(|(num1, num2)| Question::subtract(num1, num2))
    })
}

pub fn generate_skill<R: Rng + ?Sized>(
    rng: &mut R,
    skill: SkillKind,
    range: NumberRange,
) -> Result<Question, GenerateError> {
    let name = skill.as_str();
    check_range(name, range)?;

    match skill {
        SkillKind::AddNoCarry => resample(name, range, rng, |rng| {
            let q = Question::add(draw(rng, range), draw(rng, range));
            let (a, b) = q.ones();
            (a + b < 10 && q.answer() <= SUM_CEILING).then_some(q)
        }),
        SkillKind::AddWithCarry => resample(name, range, rng, |rng| {
            let q = Question::add(draw(rng, range), draw(rng, range));
            let (a, b) = q.ones();
            (a + b >= 10 && q.answer() <= SUM_CEILING).then_some(q)
        }),
        SkillKind::SubNoBorrow => resample(name, range, rng, |rng| {
            let (num1, num2) = draw_pair_below(rng, range)?;
            (num1 % 10 >= num2 % 10).then(|| Question::subtract(num1, num2))
        }),
        SkillKind::SubWithBorrow => resample(name, range, rng, |rng| {
            let num1 = draw(rng, range);
            if num1 < 2 {
                return None;
            }
            let num2 = rng.gen_range(1..num1);
            (num1 % 10 < num2 % 10 && num1 > num2).then(|| Question::subtract(num1, num2))
        }),
        // Both operands are redrawn; a first operand of 90 has no partner.
        SkillKind::AddTens => resample(name, range, rng, |rng| {
            let q = Question::add(draw_tens(rng, range), draw_tens(rng, range));
            (q.num1 >= 10 && q.num2 >= 10 && q.answer() <= TENS_SUM_CEILING).then_some(q)
        }),
        SkillKind::SubTens => resample(name, range, rng, |rng| {
            let num1 = draw_tens(rng, range);
            if num1 < 10 {
                return None;
            }
            let num2 = 10 * rng.gen_range(1..=num1 / 10);
            Some(Question::subtract(num1, num2))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn same_seed_same_questions() {
        let range = NumberRange::new(10, 50);
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            assert_eq!(
                generate(&mut a, OperationKind::Mixed, range).unwrap(),
                generate(&mut b, OperationKind::Mixed, range).unwrap()
            );
        }
    }

    #[test]
    fn reversed_range_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = addition(&mut rng, NumberRange::new(20, 10)).unwrap_err();
        assert!(matches!(err, GenerateError::InvalidRange { min: 20, max: 10, .. }));
    }

    #[test]
    fn unsatisfiable_range_fails_fast() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = addition(&mut rng, NumberRange::new(60, 90)).unwrap_err();
        assert_eq!(
            err,
            GenerateError::ResampleLimit {
                generator: "addition",
                min: 60,
                max: 90,
                attempts: MAX_RESAMPLE_ATTEMPTS,
            }
        );

        // Ones digits 0..=4 from [1, 4] always sum below ten.
        let err = generate_skill(&mut rng, SkillKind::AddWithCarry, NumberRange::new(1, 4));
        assert!(matches!(err, Err(GenerateError::ResampleLimit { .. })));
    }

    #[test]
    fn zero_only_subtraction_range_fails() {
        let mut rng = StdRng::seed_from_u64(3);
        let err = subtraction(&mut rng, NumberRange::new(0, 0));
        assert!(matches!(err, Err(GenerateError::ResampleLimit { .. })));
    }

    #[test]
    fn tens_are_whole() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let q = generate_skill(&mut rng, SkillKind::AddTens, NumberRange::new(10, 90)).unwrap();
            assert_eq!(q.num1 % 10, 0);
            assert_eq!(q.num2 % 10, 0);
            assert!(q.answer() <= TENS_SUM_CEILING);

            let q = generate_skill(&mut rng, SkillKind::SubTens, NumberRange::new(50, 90)).unwrap();
            assert_eq!(q.num1 % 10, 0);
            assert_eq!(q.num2 % 10, 0);
            assert!(q.num2 >= 10 && q.num2 <= q.num1);
        }
    }
}

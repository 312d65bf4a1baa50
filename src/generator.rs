use crate::problem::{create_problem, Problem, ProblemSpec};
use rand::Rng;
use std::collections::HashSet;
use thiserror::Error;

/// Draws allowed per requested problem before giving up
pub const ATTEMPTS_PER_PROBLEM: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    #[error("a session needs at least one problem")]
    ZeroCount,
    #[error("requested {requested} problems but these settings only allow {available} distinct ones")]
    SpaceTooSmall { requested: usize, available: u128 },
    #[error("problem {0} appears more than once")]
    DuplicateProblem(String),
    #[error("gave up after {attempts} draws with {collected} of {requested} distinct problems")]
    AttemptsExhausted {
        attempts: usize,
        collected: usize,
        requested: usize,
    },
}

/// Produce `count` problems with pairwise distinct ids, in draw order.
///
/// Requests larger than the distinct-problem space of `spec` are rejected up
/// front; otherwise sampling stops after `count * ATTEMPTS_PER_PROBLEM` draws.
pub fn create_problems<R: Rng + ?Sized>(
    spec: &ProblemSpec,
    count: usize,
    rng: &mut R,
) -> Result<Vec<Problem>, GenerateError> {
    if count == 0 {
        return Err(GenerateError::ZeroCount);
    }
    let available = spec.distinct_problem_count();
    if count as u128 > available {
        return Err(GenerateError::SpaceTooSmall {
            requested: count,
            available,
        });
    }

    let max_attempts = count.saturating_mul(ATTEMPTS_PER_PROBLEM);
    let mut seen = HashSet::with_capacity(count);
    let mut problems = Vec::with_capacity(count);
    let mut attempts = 0;

    while problems.len() < count {
        if attempts == max_attempts {
            return Err(GenerateError::AttemptsExhausted {
                attempts,
                collected: problems.len(),
                requested: count,
            });
        }
        attempts += 1;

        let problem = create_problem(spec, rng);
        if seen.insert(problem.id.clone()) {
            problems.push(problem);
        }
    }

    Ok(problems)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::Operator;
    use assert_matches::assert_matches;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_exact_count_and_distinct_ids() {
        let spec = ProblemSpec::new(Operator::ALL, 0, 10).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        for count in [1, 5, 50, 150] {
            let problems = create_problems(&spec, count, &mut rng).unwrap();
            assert_eq!(problems.len(), count);
            let ids: HashSet<&str> = problems.iter().map(|p| p.id.as_str()).collect();
            assert_eq!(ids.len(), count);
        }
    }

    #[test]
    fn test_can_exhaust_whole_space() {
        let spec = ProblemSpec::default();
        let mut rng = StdRng::seed_from_u64(11);
        let problems = create_problems(&spec, 64, &mut rng).unwrap();
        assert_eq!(problems.len(), 64);
        for p in &problems {
            assert!((2..=9).contains(&p.operand1));
            assert!((2..=9).contains(&p.operand2));
            assert_eq!(p.result, p.operand1 * p.operand2);
        }
    }

    #[test]
    fn test_zero_count_is_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_matches!(
            create_problems(&ProblemSpec::default(), 0, &mut rng),
            Err(GenerateError::ZeroCount)
        );
    }

    #[test]
    fn test_space_too_small_is_rejected() {
        let spec = ProblemSpec::new([Operator::Add], 1, 2).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert_matches!(
            create_problems(&spec, 5, &mut rng),
            Err(GenerateError::SpaceTooSmall {
                requested: 5,
                available: 4
            })
        );
    }

    #[test]
    fn test_attempt_ceiling_stops_a_stuck_source() {
        // A source that always yields the same draw can never produce two ids
        let spec = ProblemSpec::new([Operator::Add], 0, 9).unwrap();
        let mut rng = rand::rngs::mock::StepRng::new(0, 0);
        let err = create_problems(&spec, 2, &mut rng).unwrap_err();
        assert_eq!(
            err,
            GenerateError::AttemptsExhausted {
                attempts: 2 * ATTEMPTS_PER_PROBLEM,
                collected: 1,
                requested: 2,
            }
        );
    }

    #[test]
    fn test_same_seed_gives_same_problems() {
        let spec = ProblemSpec::default();
        let a = create_problems(&spec, 20, &mut StdRng::seed_from_u64(1234)).unwrap();
        let b = create_problems(&spec, 20, &mut StdRng::seed_from_u64(1234)).unwrap();
        assert_eq!(a, b);
    }
}

use crate::clock::{Clock, SystemClock, Timestamp};
use crate::generator::{create_problems, GenerateError};
use crate::history::GameHistoryEntry;
use crate::problem::{Problem, ProblemSpec};
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("no current problem: all {problem_count} problems have been answered")]
    Finished { problem_count: usize },
}

/// A problem together with the learner's answer
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemResult {
    pub problem: Problem,
    pub solution: Option<i64>,
    pub correct: bool,
}

impl ProblemResult {
    fn new(problem: Problem, solution: Option<i64>) -> Self {
        let correct = solution.is_some_and(|value| problem.is_solved_by(value));
        Self {
            problem,
            solution,
            correct,
        }
    }
}

/// Summary of a finished game, produced once when the last answer arrives
#[derive(Debug, Clone, PartialEq)]
pub struct GameResult {
    pub spec: ProblemSpec,
    pub problems: Vec<ProblemResult>,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
    pub problem_count: usize,
    pub correct_count: usize,
    pub correct_rate: f64,
    /// Milliseconds
    pub duration: i64,
    /// Milliseconds
    pub duration_per_problem: f64,
}

impl GameResult {
    /// The durable, aggregate-only part of this result
    pub fn history_entry(&self) -> GameHistoryEntry {
        GameHistoryEntry::from(self)
    }

    pub fn mistakes(&self) -> impl Iterator<Item = &ProblemResult> {
        self.problems.iter().filter(|p| !p.correct)
    }

    pub fn is_perfect(&self) -> bool {
        self.correct_count == self.problem_count
    }
}

/// One run through a fixed, ordered set of problems
#[derive(Debug)]
pub struct Game {
    spec: ProblemSpec,
    problems: Vec<Problem>,
    solutions: Vec<Option<i64>>,
    started_at: Timestamp,
    current_problem_index: usize,
    clock: Arc<dyn Clock>,
}

impl Game {
    /// Generate `count` problems with the thread RNG and start timing now
    pub fn new(spec: ProblemSpec, count: usize) -> Result<Self, GenerateError> {
        Self::with_rng(spec, count, &mut rand::thread_rng(), Arc::new(SystemClock))
    }

    pub fn with_rng<R: Rng + ?Sized>(
        spec: ProblemSpec,
        count: usize,
        rng: &mut R,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, GenerateError> {
        let problems = create_problems(&spec, count, rng)?;
        Self::from_problems(spec, problems, clock)
    }

    /// Start a game over an already generated problem list.
    ///
    /// The list must be non-empty with pairwise distinct ids.
    pub fn from_problems(
        spec: ProblemSpec,
        problems: Vec<Problem>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, GenerateError> {
        if problems.is_empty() {
            return Err(GenerateError::ZeroCount);
        }
        let mut seen = HashSet::with_capacity(problems.len());
        if let Some(duplicate) = problems.iter().find(|p| !seen.insert(p.id.as_str())) {
            return Err(GenerateError::DuplicateProblem(duplicate.id.clone()));
        }

        let started_at = clock.now();
        Ok(Self {
            spec,
            solutions: vec![None; problems.len()],
            problems,
            started_at,
            current_problem_index: 0,
            clock,
        })
    }

    pub fn spec(&self) -> &ProblemSpec {
        &self.spec
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn problem_count(&self) -> usize {
        self.problems.len()
    }

    pub fn current_problem_index(&self) -> usize {
        self.current_problem_index
    }

    pub fn current_problem(&self) -> Option<&Problem> {
        self.problems.get(self.current_problem_index)
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    /// Milliseconds since the game started, by the game's clock
    pub fn elapsed(&self) -> i64 {
        self.clock.now() - self.started_at
    }

    pub fn is_finished(&self) -> bool {
        self.current_problem_index >= self.problems.len()
    }

    /// Record `value` for the current problem and move to the next one.
    ///
    /// Returns the result when this answer was the last one.
    pub fn register_solution(&mut self, value: i64) -> Result<Option<GameResult>, GameError> {
        if self.is_finished() {
            return Err(GameError::Finished {
                problem_count: self.problems.len(),
            });
        }

        self.solutions[self.current_problem_index] = Some(value);
        self.current_problem_index += 1;

        Ok(self.create_result_if_finished())
    }

    fn create_result_if_finished(&self) -> Option<GameResult> {
        if self.current_problem_index != self.problems.len() {
            return None;
        }

        let finished_at = self.clock.now();
        let problems: Vec<ProblemResult> = self
            .problems
            .iter()
            .zip(&self.solutions)
            .map(|(problem, solution)| ProblemResult::new(problem.clone(), *solution))
            .collect();

        let problem_count = problems.len();
        let correct_count = problems.iter().filter(|p| p.correct).count();
        let duration = finished_at - self.started_at;

        Some(GameResult {
            spec: self.spec.clone(),
            problems,
            started_at: self.started_at,
            finished_at,
            problem_count,
            correct_count,
            correct_rate: correct_count as f64 / problem_count as f64,
            duration,
            duration_per_problem: duration as f64 / problem_count as f64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::problem::{Operator, Unknown};
    use assert_matches::assert_matches;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fixed_problems() -> Vec<Problem> {
        vec![
            Problem::new(Operator::Multiply, 3, 4, Unknown::Result).unwrap(),
            Problem::new(Operator::Multiply, 5, 6, Unknown::Operand1).unwrap(),
            Problem::new(Operator::Add, 7, 8, Unknown::Operand2).unwrap(),
        ]
    }

    fn create_test_game(clock: Arc<ManualClock>) -> Game {
        Game::from_problems(ProblemSpec::default(), fixed_problems(), clock).unwrap()
    }

    #[test]
    fn test_new_game_starts_at_first_problem() {
        let clock = Arc::new(ManualClock::new(10_000));
        let game = create_test_game(clock);

        assert_eq!(game.current_problem_index(), 0);
        assert_eq!(game.problem_count(), 3);
        assert_eq!(game.started_at(), 10_000);
        assert_eq!(game.current_problem().unwrap().id, "3*4=12");
        assert!(!game.is_finished());
    }

    #[test]
    fn test_register_solution_advances_and_returns_result_at_end() {
        let clock = Arc::new(ManualClock::new(0));
        let mut game = create_test_game(clock.clone());

        clock.advance(1_000);
        assert_eq!(game.register_solution(12).unwrap(), None);
        assert_eq!(game.current_problem_index(), 1);
        assert_eq!(game.current_problem().unwrap().id, "5*6=30");

        clock.advance(1_000);
        assert_eq!(game.register_solution(4).unwrap(), None);

        clock.advance(1_000);
        let result = game.register_solution(8).unwrap().expect("last answer yields result");

        assert!(game.is_finished());
        assert!(game.current_problem().is_none());
        assert_eq!(result.problem_count, 3);
        assert_eq!(result.correct_count, 2);
        assert!((result.correct_rate - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(result.started_at, 0);
        assert_eq!(result.finished_at, 3_000);
        assert_eq!(result.duration, 3_000);
        assert_eq!(result.duration_per_problem, 1_000.0);
    }

    #[test]
    fn test_correctness_compares_against_unknown_slot() {
        let clock = Arc::new(ManualClock::new(0));
        let mut game = create_test_game(clock);

        game.register_solution(12).unwrap();
        // 30 is the result, not the hidden operand
        game.register_solution(30).unwrap();
        let result = game.register_solution(8).unwrap().unwrap();

        let flags: Vec<bool> = result.problems.iter().map(|p| p.correct).collect();
        assert_eq!(flags, vec![true, false, true]);
        assert_eq!(result.problems[1].solution, Some(30));

        let mistakes: Vec<&str> = result.mistakes().map(|p| p.problem.id.as_str()).collect();
        assert_eq!(mistakes, vec!["5*6=30"]);
        assert!(!result.is_perfect());
    }

    #[test]
    fn test_register_after_finish_fails() {
        let clock = Arc::new(ManualClock::new(0));
        let mut game = Game::from_problems(
            ProblemSpec::default(),
            vec![Problem::new(Operator::Add, 1, 1, Unknown::Result).unwrap()],
            clock,
        )
        .unwrap();

        assert!(game.register_solution(2).unwrap().is_some());
        assert_matches!(
            game.register_solution(2),
            Err(GameError::Finished { problem_count: 1 })
        );
        assert_eq!(game.current_problem_index(), 1);
    }

    #[test]
    fn test_finished_at_is_taken_at_transition() {
        let clock = Arc::new(ManualClock::new(500));
        let mut game = Game::from_problems(
            ProblemSpec::default(),
            vec![Problem::new(Operator::Add, 1, 2, Unknown::Result).unwrap()],
            clock.clone(),
        )
        .unwrap();

        clock.advance(2_500);
        let result = game.register_solution(3).unwrap().unwrap();
        clock.advance(60_000);

        assert_eq!(result.finished_at, 3_000);
        assert_eq!(result.duration, 2_500);
    }

    #[test]
    fn test_from_problems_rejects_empty_list() {
        let clock = Arc::new(ManualClock::new(0));
        assert_matches!(
            Game::from_problems(ProblemSpec::default(), Vec::new(), clock),
            Err(GenerateError::ZeroCount)
        );
    }

    #[test]
    fn test_from_problems_rejects_duplicate_ids() {
        let clock = Arc::new(ManualClock::new(0));
        let problems = vec![
            Problem::new(Operator::Multiply, 3, 4, Unknown::Result).unwrap(),
            Problem::new(Operator::Add, 1, 1, Unknown::Result).unwrap(),
            Problem::new(Operator::Multiply, 3, 4, Unknown::Operand2).unwrap(),
        ];
        let err = Game::from_problems(ProblemSpec::default(), problems, clock).unwrap_err();
        assert_eq!(err, GenerateError::DuplicateProblem("3*4=12".to_string()));
    }

    #[test]
    fn test_elapsed_uses_game_clock() {
        let clock = Arc::new(ManualClock::new(100));
        let game = create_test_game(clock.clone());
        clock.advance(42);
        assert_eq!(game.elapsed(), 42);
    }

    #[test]
    fn test_with_rng_generates_requested_problems() {
        let clock = Arc::new(ManualClock::new(0));
        let mut rng = StdRng::seed_from_u64(5);
        let game = Game::with_rng(ProblemSpec::default(), 20, &mut rng, clock).unwrap();
        assert_eq!(game.problem_count(), 20);
    }

    #[test]
    fn test_with_rng_propagates_generation_errors() {
        let clock = Arc::new(ManualClock::new(0));
        let mut rng = StdRng::seed_from_u64(5);
        let spec = ProblemSpec::new([Operator::Add], 1, 1).unwrap();
        assert_matches!(
            Game::with_rng(spec, 2, &mut rng, clock),
            Err(GenerateError::SpaceTooSmall { .. })
        );
    }

    #[test]
    fn test_history_entry_projection() {
        let clock = Arc::new(ManualClock::new(1_000));
        let mut game = create_test_game(clock.clone());
        clock.advance(900);
        game.register_solution(12).unwrap();
        game.register_solution(5).unwrap();
        let result = game.register_solution(8).unwrap().unwrap();

        let entry = result.history_entry();
        assert_eq!(entry.started_at, 1_000);
        assert_eq!(entry.finished_at, 1_900);
        assert_eq!(entry.problem_count, 3);
        assert_eq!(entry.correct_count, 3);
        assert_eq!(entry.correct_rate, 1.0);
        assert_eq!(entry.duration, 900);
        assert_eq!(entry.duration_per_problem, 300.0);
        assert!(result.is_perfect());
    }
}

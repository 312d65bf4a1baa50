use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Binary operators a drill can use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "*")]
    Multiply,
}

impl Operator {
    pub const ALL: [Operator; 2] = [Operator::Add, Operator::Multiply];

    /// Plain ASCII form, used in problem ids and the config file
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Multiply => "*",
        }
    }

    /// Symbol shown to the learner
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Multiply => "×",
        }
    }

    /// `None` when the result does not fit in `i64`
    pub fn apply(&self, operand1: i64, operand2: i64) -> Option<i64> {
        match self {
            Operator::Add => operand1.checked_add(operand2),
            Operator::Multiply => operand1.checked_mul(operand2),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "+" | "add" | "plus" => Ok(Operator::Add),
            "*" | "x" | "×" | "mul" | "times" => Ok(Operator::Multiply),
            other => Err(SpecError::UnknownOperator(other.to_string())),
        }
    }
}

/// Which part of a problem is hidden from the learner
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum Unknown {
    Operand1,
    Operand2,
    Result,
}

impl Unknown {
    pub const ALL: [Unknown; 3] = [Unknown::Operand1, Unknown::Operand2, Unknown::Result];
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    #[error("at least one operator is required")]
    NoOperators,
    #[error("minimum operand {min} is greater than maximum operand {max}")]
    InvertedRange { min: i64, max: i64 },
    #[error("operand range {min}..={max} overflows with operator {operator}")]
    Overflow { min: i64, max: i64, operator: Operator },
    #[error("{operand1} {operator} {operand2} does not fit in a 64-bit integer")]
    ResultOverflow {
        operator: Operator,
        operand1: i64,
        operand2: i64,
    },
    #[error("unknown operator: {0:?}")]
    UnknownOperator(String),
}

/// Immutable description of the problems a session draws from.
///
/// Only constructible through [`ProblemSpec::new`], so every value has a
/// non-empty operator set, `min <= max`, and bounds whose results fit in `i64`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemSpec {
    operators: Vec<Operator>,
    min_operand_value: i64,
    max_operand_value: i64,
}

impl ProblemSpec {
    pub fn new(
        operators: impl IntoIterator<Item = Operator>,
        min_operand_value: i64,
        max_operand_value: i64,
    ) -> Result<Self, SpecError> {
        let mut unique: Vec<Operator> = Vec::new();
        for operator in operators {
            if !unique.contains(&operator) {
                unique.push(operator);
            }
        }

        if unique.is_empty() {
            return Err(SpecError::NoOperators);
        }
        if min_operand_value > max_operand_value {
            return Err(SpecError::InvertedRange {
                min: min_operand_value,
                max: max_operand_value,
            });
        }
        // Extremes of a product over an interval sit on its corners
        for operator in &unique {
            let corners = [
                (min_operand_value, min_operand_value),
                (min_operand_value, max_operand_value),
                (max_operand_value, max_operand_value),
            ];
            if corners
                .iter()
                .any(|&(a, b)| operator.apply(a, b).is_none())
            {
                return Err(SpecError::Overflow {
                    min: min_operand_value,
                    max: max_operand_value,
                    operator: *operator,
                });
            }
        }

        Ok(Self {
            operators: unique,
            min_operand_value,
            max_operand_value,
        })
    }

    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    pub fn min_operand_value(&self) -> i64 {
        self.min_operand_value
    }

    pub fn max_operand_value(&self) -> i64 {
        self.max_operand_value
    }

    /// Number of problems with distinct ids this spec can produce.
    ///
    /// The hidden slot is not part of the id, so it does not multiply the space.
    pub fn distinct_problem_count(&self) -> u128 {
        let width = (self.max_operand_value as i128 - self.min_operand_value as i128 + 1) as u128;
        (self.operators.len() as u128)
            .saturating_mul(width)
            .saturating_mul(width)
    }
}

impl Default for ProblemSpec {
    fn default() -> Self {
        Self {
            operators: vec![Operator::Multiply],
            min_operand_value: 2,
            max_operand_value: 9,
        }
    }
}

/// One arithmetic question with exactly one slot hidden
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub id: String,
    pub operator: Operator,
    pub operand1: i64,
    pub operand2: i64,
    pub result: i64,
    pub unknown: Unknown,
}

impl Problem {
    pub fn new(
        operator: Operator,
        operand1: i64,
        operand2: i64,
        unknown: Unknown,
    ) -> Result<Self, SpecError> {
        let result = operator
            .apply(operand1, operand2)
            .ok_or(SpecError::ResultOverflow {
                operator,
                operand1,
                operand2,
            })?;
        Ok(Self::with_result(operator, operand1, operand2, result, unknown))
    }

    fn with_result(
        operator: Operator,
        operand1: i64,
        operand2: i64,
        result: i64,
        unknown: Unknown,
    ) -> Self {
        Self {
            id: problem_id(operand1, operator, operand2, result),
            operator,
            operand1,
            operand2,
            result,
            unknown,
        }
    }

    /// Value of the hidden slot
    pub fn solution(&self) -> i64 {
        match self.unknown {
            Unknown::Operand1 => self.operand1,
            Unknown::Operand2 => self.operand2,
            Unknown::Result => self.result,
        }
    }

    pub fn is_solved_by(&self, value: i64) -> bool {
        self.solution() == value
    }

    /// The three numeric slots in display order, with the hidden one as `None`
    pub fn visible_slots(&self) -> [Option<i64>; 3] {
        let mut slots = [Some(self.operand1), Some(self.operand2), Some(self.result)];
        let hidden = match self.unknown {
            Unknown::Operand1 => 0,
            Unknown::Operand2 => 1,
            Unknown::Result => 2,
        };
        slots[hidden] = None;
        slots
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, r] = self
            .visible_slots()
            .map(|slot| slot.map_or_else(|| "?".to_string(), |v| v.to_string()));
        write!(f, "{} {} {} = {}", a, self.operator.symbol(), b, r)
    }
}

fn problem_id(operand1: i64, operator: Operator, operand2: i64, result: i64) -> String {
    format!("{operand1}{operator}{operand2}={result}")
}

/// Draw one problem from `spec`.
///
/// Operator, hidden slot and both operands are drawn independently and
/// uniformly; the operands come from the inclusive operand range.
pub fn create_problem<R: Rng + ?Sized>(spec: &ProblemSpec, rng: &mut R) -> Problem {
    let operator = spec.operators[rng.gen_range(0..spec.operators.len())];
    let unknown = Unknown::ALL[rng.gen_range(0..Unknown::ALL.len())];
    let operand1 = rng.gen_range(spec.min_operand_value..=spec.max_operand_value);
    let operand2 = rng.gen_range(spec.min_operand_value..=spec.max_operand_value);

    // ProblemSpec::new rejected ranges whose results leave i64
    let result = match operator {
        Operator::Add => operand1 + operand2,
        Operator::Multiply => operand1 * operand2,
    };
    Problem::with_result(operator, operand1, operand2, result, unknown)
}

//! Versioned on-disk schema for game history.
//!
//! The stored document is `{ "version": <n>, "games": [...] }`. Only version 1
//! exists. Reading another version fails; new versions get their own variant
//! in [`HistoryData`] and their own conversion, leaving v1 untouched.

use super::{GameHistory, GameHistoryEntry, HistoryError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fixed key the history document is stored under
pub const STORAGE_KEY: &str = "1x1:history";

pub const CURRENT_VERSION: u64 = 1;

/// One stored game, schema v1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GameRecordV1 {
    started_at: i64,
    finished_at: i64,
    problem_count: usize,
    correct_count: usize,
    correct_rate: f64,
    duration: i64,
    duration_per_problem: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct HistoryDataV1 {
    // checked by `version_number` before the payload is read
    #[serde(skip_deserializing, default = "current_version")]
    version: u64,
    #[serde(default)]
    games: Option<Vec<GameRecordV1>>,
}

fn current_version() -> u64 {
    CURRENT_VERSION
}

/// Integral version numbers, whether written as `1` or `1.0`
fn version_number(version: &Value) -> Option<u64> {
    let n = version.as_f64()?;
    (n >= 0.0 && n.fract() == 0.0 && n <= u64::MAX as f64).then_some(n as u64)
}

#[derive(Debug, Clone, PartialEq)]
enum HistoryData {
    V1(HistoryDataV1),
}

impl HistoryData {
    fn from_value(value: Value) -> Result<Self, HistoryError> {
        let Value::Object(ref fields) = value else {
            return Err(HistoryError::Malformed(format!(
                "expected an object, found {}",
                json_kind(&value)
            )));
        };

        let version = fields.get("version").cloned().unwrap_or(Value::Null);
        match version_number(&version) {
            Some(1) => Ok(HistoryData::V1(serde_json::from_value(value)?)),
            _ => Err(HistoryError::UnsupportedVersion(version)),
        }
    }

    fn into_history(self) -> GameHistory {
        match self {
            HistoryData::V1(data) => history_from_v1(data),
        }
    }
}

fn history_from_v1(data: HistoryDataV1) -> GameHistory {
    GameHistory {
        games: data
            .games
            .unwrap_or_default()
            .into_iter()
            .map(|game| GameHistoryEntry {
                started_at: game.started_at,
                finished_at: game.finished_at,
                problem_count: game.problem_count,
                correct_count: game.correct_count,
                correct_rate: game.correct_rate,
                duration: game.duration,
                duration_per_problem: game.duration_per_problem,
            })
            .collect(),
    }
}

/// JSON has no NaN or infinity; serde_json would write them as `null`
fn check_finite(index: usize, game: &GameHistoryEntry) -> Result<(), HistoryError> {
    for (field, value) in [
        ("correctRate", game.correct_rate),
        ("durationPerProblem", game.duration_per_problem),
    ] {
        if !value.is_finite() {
            return Err(HistoryError::NonFinite { index, field });
        }
    }
    Ok(())
}

fn history_to_v1(history: &GameHistory) -> Result<HistoryDataV1, HistoryError> {
    let games = history
        .games
        .iter()
        .enumerate()
        .map(|(index, game)| {
            check_finite(index, game)?;
            Ok(GameRecordV1 {
                started_at: game.started_at,
                finished_at: game.finished_at,
                problem_count: game.problem_count,
                correct_count: game.correct_count,
                correct_rate: game.correct_rate,
                duration: game.duration,
                duration_per_problem: game.duration_per_problem,
            })
        })
        .collect::<Result<Vec<_>, HistoryError>>()?;

    Ok(HistoryDataV1 {
        version: CURRENT_VERSION,
        games: Some(games),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Parse a stored document. Blank input is an empty history.
pub fn decode(json: &str) -> Result<GameHistory, HistoryError> {
    if json.trim().is_empty() {
        return Ok(GameHistory::default());
    }
    let value: Value = serde_json::from_str(json)?;
    Ok(HistoryData::from_value(value)?.into_history())
}

/// Serialize `history` as the current schema version.
///
/// Fails on a NaN or infinite rate, which could not be read back.
pub fn encode(history: &GameHistory) -> Result<String, HistoryError> {
    Ok(serde_json::to_string(&history_to_v1(history)?)?)
}

/// Like [`encode`], indented for people to read
pub fn encode_pretty(history: &GameHistory) -> Result<String, HistoryError> {
    Ok(serde_json::to_string_pretty(&history_to_v1(history)?)?)
}

use std::fmt;
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::game::{Game, GameResult};
use crate::history::{GameHistory, GameHistoryRepository};
use crate::problem::{Operator, Problem};

/// Longest answer the running screen accepts, sign included
pub const MAX_INPUT_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupField {
    Count,
    Min,
    Max,
    Operators,
}

impl SetupField {
    pub const ALL: [SetupField; 4] = [
        SetupField::Count,
        SetupField::Min,
        SetupField::Max,
        SetupField::Operators,
    ];

    fn next(self) -> Self {
        match self {
            SetupField::Count => SetupField::Min,
            SetupField::Min => SetupField::Max,
            SetupField::Max => SetupField::Operators,
            SetupField::Operators => SetupField::Count,
        }
    }

    fn prev(self) -> Self {
        match self {
            SetupField::Count => SetupField::Operators,
            SetupField::Min => SetupField::Count,
            SetupField::Max => SetupField::Min,
            SetupField::Operators => SetupField::Max,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SetupField::Count => "Problems",
            SetupField::Min => "Smallest operand",
            SetupField::Max => "Largest operand",
            SetupField::Operators => "Operators",
        }
    }
}

/// Editable copy of the session settings shown on the setup screen
#[derive(Debug, Clone, PartialEq)]
pub struct SetupForm {
    pub count: String,
    pub min: String,
    pub max: String,
    pub operators: Vec<Operator>,
    pub focus: SetupField,
    pub error: Option<String>,
}

impl SetupForm {
    pub fn from_config(config: &Config) -> Self {
        Self {
            count: config.problem_count.to_string(),
            min: config.min_operand_value.to_string(),
            max: config.max_operand_value.to_string(),
            operators: config.operators.clone(),
            focus: SetupField::Count,
            error: None,
        }
    }

    fn focused_text(&mut self) -> Option<&mut String> {
        match self.focus {
            SetupField::Count => Some(&mut self.count),
            SetupField::Min => Some(&mut self.min),
            SetupField::Max => Some(&mut self.max),
            SetupField::Operators => None,
        }
    }

    fn push(&mut self, c: char) {
        if let Some(text) = self.focused_text() {
            if text.len() < MAX_INPUT_LEN {
                text.push(c);
            }
        }
    }

    fn pop(&mut self) {
        if let Some(text) = self.focused_text() {
            text.pop();
        }
    }

    /// Switch `operator` on or off, keeping the canonical operator order
    pub fn toggle_operator(&mut self, operator: Operator) {
        let enabled = !self.operators.contains(&operator);
        self.operators = Operator::ALL
            .into_iter()
            .filter(|op| {
                if *op == operator {
                    enabled
                } else {
                    self.operators.contains(op)
                }
            })
            .collect();
    }

    /// Apply the form on top of `base`, rejecting values no session can use
    pub fn to_config(&self, base: &Config) -> Result<Config, String> {
        let problem_count = self
            .count
            .parse::<usize>()
            .map_err(|_| format!("'{}' is not a valid number of problems", self.count))?;
        let min_operand_value = self
            .min
            .parse::<i64>()
            .map_err(|_| format!("'{}' is not a valid operand", self.min))?;
        let max_operand_value = self
            .max
            .parse::<i64>()
            .map_err(|_| format!("'{}' is not a valid operand", self.max))?;

        let config = Config {
            problem_count,
            min_operand_value,
            max_operand_value,
            operators: self.operators.clone(),
            ..base.clone()
        };
        config.problem_spec().map_err(|e| e.to_string())?;
        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveStatus {
    Saved,
    Failed(String),
}

#[derive(Debug)]
pub enum AppState {
    Setup(SetupForm),
    Running {
        game: Game,
        input: String,
    },
    Finished {
        result: GameResult,
        save: SaveStatus,
    },
    History {
        history: Result<GameHistory, String>,
        scroll: usize,
        previous: Box<AppState>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Continue,
    Quit,
}

/// Front-end state machine: setup, running game, result and history views
pub struct App {
    pub state: AppState,
    settings: Config,
    repository: Box<dyn GameHistoryRepository>,
    clock: Arc<dyn Clock>,
    rng: StdRng,
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("state", &self.state)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl App {
    pub fn new(settings: Config, repository: Box<dyn GameHistoryRepository>) -> Self {
        Self::with_collaborators(
            settings,
            repository,
            Arc::new(SystemClock),
            StdRng::from_entropy(),
        )
    }

    pub fn with_collaborators(
        settings: Config,
        repository: Box<dyn GameHistoryRepository>,
        clock: Arc<dyn Clock>,
        rng: StdRng,
    ) -> Self {
        Self {
            state: AppState::Setup(SetupForm::from_config(&settings)),
            settings,
            repository,
            clock,
            rng,
        }
    }

    pub fn settings(&self) -> &Config {
        &self.settings
    }

    /// Replace the history repository used by every later load and save
    pub fn set_repository(&mut self, repository: Box<dyn GameHistoryRepository>) {
        self.repository = repository;
    }

    pub fn current_problem(&self) -> Option<&Problem> {
        match &self.state {
            AppState::Running { game, .. } => game.current_problem(),
            _ => None,
        }
    }

    /// Milliseconds into the running game
    pub fn elapsed(&self) -> Option<i64> {
        match &self.state {
            AppState::Running { game, .. } => Some(game.elapsed()),
            _ => None,
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) -> AppAction {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return AppAction::Quit;
        }

        match self.state {
            AppState::Setup(_) => self.on_setup_key(key),
            AppState::Running { .. } => self.on_running_key(key),
            AppState::Finished { .. } => self.on_finished_key(key),
            AppState::History { .. } => self.on_history_key(key),
        }
        AppAction::Continue
    }

    /// Start a game with the current settings; errors land back on the setup screen
    pub fn start_game(&mut self) {
        let started = match self.settings.problem_spec() {
            Ok(spec) => Game::with_rng(
                spec,
                self.settings.problem_count,
                &mut self.rng,
                self.clock.clone(),
            )
            .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        match started {
            Ok(game) => {
                tracing::info!(
                    problems = game.problem_count(),
                    min = self.settings.min_operand_value,
                    max = self.settings.max_operand_value,
                    "game started"
                );
                self.state = AppState::Running {
                    game,
                    input: String::new(),
                };
            }
            Err(e) => {
                tracing::warn!("cannot start game: {e}");
                let mut form = SetupForm::from_config(&self.settings);
                form.error = Some(e);
                self.state = AppState::Setup(form);
            }
        }
    }

    pub fn open_history(&mut self) {
        let history = self.repository.load().map_err(|e| {
            tracing::warn!("loading history failed: {e}");
            e.to_string()
        });
        let placeholder = self.setup_state();
        let previous = std::mem::replace(&mut self.state, placeholder);
        self.state = AppState::History {
            history,
            scroll: 0,
            previous: Box::new(previous),
        };
    }

    fn close_history(&mut self) {
        let placeholder = self.setup_state();
        if let AppState::History { previous, .. } = std::mem::replace(&mut self.state, placeholder) {
            self.state = *previous;
        }
    }

    fn setup_state(&self) -> AppState {
        AppState::Setup(SetupForm::from_config(&self.settings))
    }

    fn finish(&mut self, result: GameResult) {
        let save = match self.repository.save(&result.history_entry()) {
            Ok(()) => {
                tracing::info!(
                    correct = result.correct_count,
                    problems = result.problem_count,
                    duration_ms = result.duration,
                    "game saved"
                );
                SaveStatus::Saved
            }
            Err(e) => {
                tracing::warn!("saving game failed: {e}");
                SaveStatus::Failed(e.to_string())
            }
        };
        self.state = AppState::Finished { result, save };
    }

    fn on_setup_key(&mut self, key: KeyEvent) {
        let AppState::Setup(form) = &mut self.state else {
            return;
        };
        match key.code {
            KeyCode::Tab | KeyCode::Down => form.focus = form.focus.next(),
            KeyCode::BackTab | KeyCode::Up => form.focus = form.focus.prev(),
            KeyCode::Char('+') => form.toggle_operator(Operator::Add),
            KeyCode::Char('*') | KeyCode::Char('x') => form.toggle_operator(Operator::Multiply),
            KeyCode::Char(c) if c.is_ascii_digit() || c == '-' => form.push(c),
            KeyCode::Backspace => form.pop(),
            KeyCode::Char('h') => self.open_history(),
            KeyCode::Enter => match form.to_config(&self.settings) {
                Ok(settings) => {
                    self.settings = settings;
                    self.start_game();
                }
                Err(e) => form.error = Some(e),
            },
            _ => {}
        }
    }

    fn on_running_key(&mut self, key: KeyEvent) {
        let AppState::Running { game, input } = &mut self.state else {
            return;
        };
        match key.code {
            KeyCode::Char(c) if c.is_ascii_digit() && input.len() < MAX_INPUT_LEN => input.push(c),
            KeyCode::Char('-') if input.is_empty() => input.push('-'),
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Enter => {
                // Nothing to submit yet
                let Ok(value) = input.parse::<i64>() else {
                    return;
                };
                input.clear();
                match game.register_solution(value) {
                    Ok(Some(result)) => self.finish(result),
                    Ok(None) => {}
                    Err(e) => tracing::error!("{e}"),
                }
            }
            _ => {}
        }
    }

    fn on_finished_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('r') | KeyCode::Enter => self.start_game(),
            KeyCode::Char('s') => self.state = self.setup_state(),
            KeyCode::Char('h') => self.open_history(),
            _ => {}
        }
    }

    fn on_history_key(&mut self, key: KeyEvent) {
        let AppState::History {
            history, scroll, ..
        } = &mut self.state
        else {
            return;
        };
        let last = history
            .as_ref()
            .map(|h| h.len().saturating_sub(1))
            .unwrap_or(0);
        match key.code {
            KeyCode::Up => *scroll = scroll.saturating_sub(1),
            KeyCode::Down => *scroll = (*scroll + 1).min(last),
            KeyCode::Home => *scroll = 0,
            KeyCode::End => *scroll = last,
            KeyCode::Char('b') | KeyCode::Backspace => self.close_history(),
            _ => {}
        }
    }
}

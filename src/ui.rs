pub mod charting;
pub mod screen;

use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

use crate::app::{App, AppState};
use screen::{FinishedScreen, HistoryScreen, RunningScreen, Screen, SetupScreen};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

/// Helper to construct the screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen + '_> {
    match state {
        AppState::Setup(form) => Box::new(SetupScreen { form }),
        AppState::Running { game, input } => Box::new(RunningScreen {
            problem: game.current_problem(),
            index: game.current_problem_index(),
            count: game.problem_count(),
            input,
        }),
        AppState::Finished { result, save } => Box::new(FinishedScreen { result, save }),
        AppState::History {
            history, scroll, ..
        } => Box::new(HistoryScreen {
            history: history.as_ref().map_err(String::as_str),
            scroll: *scroll,
        }),
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        current_screen(&self.state).render(self, area, buf);
    }
}

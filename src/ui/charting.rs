use crate::history::GameHistory;

/// (game number, percent correct) for each game, oldest first
pub fn rate_coords(history: &GameHistory) -> Vec<(f64, f64)> {
    history
        .games
        .iter()
        .enumerate()
        .map(|(i, game)| ((i + 1) as f64, game.correct_rate * 100.0))
        .collect()
}

/// Compute X (games) and Y (percent) bounds for the history chart
pub fn compute_chart_params(rate_coords: &[(f64, f64)], min_y: f64) -> (f64, f64) {
    let mut highest_rate = min_y;
    for &(_, rate) in rate_coords {
        if rate > highest_rate {
            highest_rate = rate;
        }
    }

    let mut game_count = match rate_coords.last() {
        Some(x) => x.0,
        None => 1.0,
    };
    // A single point still needs a non-empty axis
    if game_count < 2.0 {
        game_count = 2.0;
    }

    (game_count, highest_rate.round())
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}

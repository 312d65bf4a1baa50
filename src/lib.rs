// Library surface for the binary, headless tests and reuse.
// The CLI and terminal setup stay in main.rs.
pub mod app;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod game;
pub mod generator;
pub mod history;
pub mod locale;
pub mod problem;
pub mod runtime;
pub mod ui;
pub mod util;

mod app;
mod cli;
mod config;
mod effects;
mod input;
mod logging;
mod navigation;
mod ui;

pub use app::run_app;

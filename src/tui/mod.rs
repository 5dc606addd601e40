//! TUI debugger for the LS-8 emulator.
//!
//! Provides an interactive terminal-based debugger with:
//! - Register and flag view
//! - Memory view highlighting PC and SP
//! - Step/run/breakpoint controls
//! - Program listing and captured output

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};

//! OpSH: type what you want, get the shell command run for you.
//!
//! Lines that already look like shell commands run directly; everything else
//! is translated by a hosted model into a single command line first.

pub mod core;
pub mod services;
pub mod ui;

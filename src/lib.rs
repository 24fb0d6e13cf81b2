//! HardBrake - interactive batch video encoding
//!
//! Runs an external encoder over a batch of files one at a time, parsing
//! each process's output for progress and rendering it live.

pub mod cleanup;
pub mod cli;
pub mod config;
pub mod encoder;
pub mod error;
pub mod job;
pub mod prompts;
pub mod report;
pub mod runner;
pub mod selection;
pub mod setup;
pub mod supervisor;
pub mod tracker;
pub mod workflow;

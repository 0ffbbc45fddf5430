//! Command-line interface for the network generator.
//!
//! A single `generate` command maps its flags onto the generator parameters,
//! runs the assembler with a seeded generator and renders the resulting
//! network as plain-text tables.

mod commands;

pub use commands::{
    BackfillArg, Cli, CliError, Command, ExecutionSummary, GenerateCommand, render_summary,
    run_cli,
};

#[cfg(test)]
mod tests;

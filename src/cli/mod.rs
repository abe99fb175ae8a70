//! Command-line front end over a [`BudgetSession`](crate::core::BudgetSession)
//! backed by the on-disk store.

pub mod commands;
pub mod output;

use std::{env, io};

use thiserror::Error;

use crate::config::ConfigError;
use crate::errors::BudgetError;

pub use commands::{Command, Invocation};

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Core(#[from] BudgetError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Parses the process arguments and runs the requested command.
pub fn run_cli() -> Result<(), CliError> {
    let args: Vec<String> = env::args().skip(1).collect();
    run_with_args(&args)
}

pub fn run_with_args(args: &[String]) -> Result<(), CliError> {
    let invocation = Invocation::parse(args)?;
    commands::execute(invocation)
}

//! # CLI Module
//!
//! Command-line access to the pattern compiler and the mock dispatcher.
//!
//! ## Commands
//!
//! ### `compile`
//!
//! ```bash
//! pathmock compile '/users/:id(\d+)/:tab?' --strict
//! ```
//!
//! ### `match`
//!
//! ```bash
//! pathmock match /users/:id /users/42 --exact
//! ```
//!
//! Exits non-zero when the path does not match.
//!
//! ### `dispatch`
//!
//! ```bash
//! pathmock dispatch --fixtures routes.yaml --config client.yaml GET /items/7
//! ```
//!
//! Prints the response (or failure) as JSON and exits non-zero on failure.

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{
    compile_command, dispatch_command, match_command, run_cli, Cli, Commands, DispatchArgs,
};

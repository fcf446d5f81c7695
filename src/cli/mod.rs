//! Command-line interface (`serve`, `migrate`).

pub mod args;

pub use args::{Cli, Commands, MigrateAction};

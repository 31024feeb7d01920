//! Command handlers for CLI subcommands
//!
//! Each subcommand lives in its own module; this module wires them up.

mod list;
mod run;
mod show;
mod utils;
mod validate;

pub use list::handle_list;
pub use run::handle_run;
pub use show::handle_show;
pub use utils::open_store;
pub use validate::handle_validate;

#[cfg(test)]
mod tests;

//! Command dispatch.

pub mod config_cmd;
pub mod firewall;
pub mod nat;
mod util;

use bbox_api::Session;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Run a command that needs an authenticated session.
pub async fn dispatch(cmd: Command, session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Firewall(args) => firewall::handle(session, args, global).await,
        Command::Nat(args) => nat::handle(session, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "command does not use a router session".into(),
        )),
    }
}

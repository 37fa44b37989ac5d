//! The non-interactive seam between a raw command line and a
//! [`CommandResult`]: parse, dispatch, done. The interactive binary wraps
//! this in a read/print loop over stdin/stdout; integration tests call it
//! directly with no terminal at all.

use crate::context::ShellContext;
use crate::dispatcher::{CommandResult, Dispatcher};
use crate::shell;

/// Parse and execute a single command line (which may itself be a
/// pipeline) against `ctx`. Blank input is a no-op success, matching the
/// REPL's "just print the prompt again" behavior for an empty line.
pub fn run_line(dispatcher: &Dispatcher, ctx: &mut ShellContext, line: &str) -> CommandResult {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return CommandResult::ok_empty();
    }
    tracing::debug!(line = trimmed, cwd = %ctx.cwd, "dispatching command line");
    let pipeline = shell::parse(trimmed, &ctx.env);
    dispatcher.execute_pipeline(ctx, &pipeline)
}

/// The prompt string for the current shell state, e.g. `"vfsh:/chats> "`.
pub fn prompt(ctx: &ShellContext) -> String {
    format!("vfsh:{}> ", ctx.cwd)
}

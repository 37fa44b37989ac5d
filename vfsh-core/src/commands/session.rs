//! `help`, `exit`, `quit`.

use crate::context::ShellContext;
use crate::dispatcher::{CommandResult, Dispatcher, ShellCommand};

pub struct Help;

impl ShellCommand for Help {
    fn name(&self) -> &'static str {
        "help"
    }
    fn usage(&self) -> &'static str {
        "help - list available commands"
    }
    fn run(&self, _ctx: &mut ShellContext, _args: &[String], _stdin: &str) -> CommandResult {
        // The dispatcher itself is not reachable from a handler (handlers
        // only see the shell context), so the binary re-registers `help`
        // with baked-in text from `render_help` right after it registers
        // every other builtin; see `vfsh`'s `main.rs`.
        CommandResult::ok_empty()
    }
}

/// Render the usage listing for every registered command. Exposed
/// separately from [`Help::run`] because a handler has no way to reach
/// back into the [`Dispatcher`] that is calling it.
pub fn render_help(dispatcher: &Dispatcher) -> String {
    let mut out = String::new();
    for (name, usage) in dispatcher.usages() {
        out.push_str(&format!("{name:<10} {usage}\n"));
    }
    out
}

pub struct Exit;

impl ShellCommand for Exit {
    fn name(&self) -> &'static str {
        "exit"
    }
    fn usage(&self) -> &'static str {
        "exit - leave the shell"
    }
    fn run(&self, ctx: &mut ShellContext, _args: &[String], _stdin: &str) -> CommandResult {
        ctx.should_exit = true;
        CommandResult::ok_empty()
    }
}

pub struct Quit;

impl ShellCommand for Quit {
    fn name(&self) -> &'static str {
        "quit"
    }
    fn usage(&self) -> &'static str {
        "quit - leave the shell"
    }
    fn run(&self, ctx: &mut ShellContext, _args: &[String], _stdin: &str) -> CommandResult {
        ctx.should_exit = true;
        CommandResult::ok_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryRepository;

    fn fixture_ctx() -> ShellContext {
        ShellContext::new(Box::new(InMemoryRepository::new()))
    }

    #[test]
    fn help_does_not_set_should_exit() {
        let mut ctx = fixture_ctx();
        let result = Help.run(&mut ctx, &[], "");
        assert!(result.success);
        assert!(!ctx.should_exit);
    }

    #[test]
    fn exit_sets_should_exit() {
        let mut ctx = fixture_ctx();
        let result = Exit.run(&mut ctx, &[], "");
        assert!(result.success);
        assert!(ctx.should_exit);
    }

    #[test]
    fn quit_sets_should_exit() {
        let mut ctx = fixture_ctx();
        let result = Quit.run(&mut ctx, &[], "");
        assert!(result.success);
        assert!(ctx.should_exit);
    }

    #[test]
    fn render_help_lists_registered_commands() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(Box::new(Help));
        dispatcher.register(Box::new(Exit));
        let text = render_help(&dispatcher);
        assert!(text.contains("help"));
        assert!(text.contains("exit"));
    }
}

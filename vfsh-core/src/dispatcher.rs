//! Command registration and pipeline execution.

use std::collections::HashMap;

use crate::context::ShellContext;

/// The single return shape every command handler produces.
///
/// The distillation this crate grew from let handlers return a
/// `CommandResult`, a bare tuple, a bare string, or nothing at all, and
/// normalized all four shapes at the dispatch boundary — a pattern
/// suited to an untyped language. Here every handler is written against
/// the same [`ShellCommand`] trait and returns `CommandResult` directly,
/// so the normalization step is unnecessary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub success: bool,
    pub output: String,
    pub error: Option<String>,
    pub exit_code: i32,
}

impl CommandResult {
    pub fn ok(output: impl Into<String>) -> Self {
        CommandResult {
            success: true,
            output: output.into(),
            error: None,
            exit_code: 0,
        }
    }

    pub fn ok_empty() -> Self {
        CommandResult::ok(String::new())
    }

    pub fn fail(error: impl Into<String>) -> Self {
        CommandResult {
            success: false,
            output: String::new(),
            error: Some(error.into()),
            exit_code: 1,
        }
    }

    pub fn fail_with_code(error: impl Into<String>, exit_code: i32) -> Self {
        CommandResult {
            success: false,
            output: String::new(),
            error: Some(error.into()),
            exit_code,
        }
    }

    fn not_found(name: &str) -> Self {
        CommandResult::fail_with_code(format!("Command not found: {name}"), 127)
    }
}

/// A single registered command. Implementors receive the full shell
/// context (mutably, since `cd` and the organization commands update
/// cwd/environment/repository state) plus the arguments and stdin for
/// this invocation.
pub trait ShellCommand {
    fn name(&self) -> &'static str;

    /// One-line usage summary shown by `help`.
    fn usage(&self) -> &'static str;

    fn run(&self, ctx: &mut ShellContext, args: &[String], stdin: &str) -> CommandResult;
}

pub struct Dispatcher {
    handlers: HashMap<String, Box<dyn ShellCommand>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Dispatcher {
            handlers: HashMap::new(),
        }
    }

    pub fn register(&mut self, command: Box<dyn ShellCommand>) {
        self.handlers.insert(command.name().to_lowercase(), command);
    }

    pub fn has_command(&self, name: &str) -> bool {
        self.handlers.contains_key(&name.to_lowercase())
    }

    pub fn usages(&self) -> Vec<(&'static str, &'static str)> {
        let mut list: Vec<_> = self.handlers.values().map(|h| (h.name(), h.usage())).collect();
        list.sort_by_key(|(name, _)| *name);
        list
    }

    /// Execute one command. Unknown command names and handler panics are
    /// both reported as a failed [`CommandResult`] rather than unwinding;
    /// `std::panic::catch_unwind` backstops handlers that are not
    /// written to be panic-free, mirroring the dispatcher's own
    /// exception-catching contract.
    pub fn execute(&self, ctx: &mut ShellContext, name: &str, args: &[String], stdin: &str) -> CommandResult {
        let key = name.to_lowercase();
        let Some(handler) = self.handlers.get(&key) else {
            return CommandResult::not_found(name);
        };

        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handler.run(ctx, args, stdin))) {
            Ok(result) => result,
            Err(_) => CommandResult::fail(format!("Error executing {name}: handler panicked")),
        }
    }

    /// Run each stage of a pipeline, feeding stage *i*'s full stdout as
    /// stage *i+1*'s stdin. Halts on the first failing stage.
    pub fn execute_pipeline(
        &self,
        ctx: &mut ShellContext,
        pipeline: &crate::shell::ParsedPipeline,
    ) -> CommandResult {
        if pipeline.commands.is_empty() {
            return CommandResult::fail("No command to execute");
        }

        let mut stdin = String::new();
        let mut last = CommandResult::ok_empty();
        for command in &pipeline.commands {
            last = self.execute(ctx, &command.name, &command.args, &stdin);
            if !last.success {
                return last;
            }
            stdin = last.output.clone();
        }
        last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryRepository;

    struct Echo;
    impl ShellCommand for Echo {
        fn name(&self) -> &'static str {
            "echo"
        }
        fn usage(&self) -> &'static str {
            "echo <text>"
        }
        fn run(&self, _ctx: &mut ShellContext, args: &[String], _stdin: &str) -> CommandResult {
            CommandResult::ok(format!("{}\n", args.join(" ")))
        }
    }

    struct Fail;
    impl ShellCommand for Fail {
        fn name(&self) -> &'static str {
            "fail"
        }
        fn usage(&self) -> &'static str {
            "fail"
        }
        fn run(&self, _ctx: &mut ShellContext, _args: &[String], _stdin: &str) -> CommandResult {
            CommandResult::fail("boom")
        }
    }

    fn test_ctx() -> ShellContext {
        ShellContext::new(Box::new(InMemoryRepository::new()))
    }

    #[test]
    fn unknown_command_is_127() {
        let dispatcher = Dispatcher::new();
        let mut ctx = test_ctx();
        let result = dispatcher.execute(&mut ctx, "nope", &[], "");
        assert_eq!(result.exit_code, 127);
        assert!(!result.success);
    }

    #[test]
    fn pipeline_halts_on_failure() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(Box::new(Echo));
        dispatcher.register(Box::new(Fail));
        let mut ctx = test_ctx();
        let pipeline = crate::shell::parse("fail | echo should-not-run", &ctx.env);
        let result = dispatcher.execute_pipeline(&mut ctx, &pipeline);
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("boom"));
    }

    #[test]
    fn pipeline_chains_stdout_to_stdin() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(Box::new(Echo));
        let mut ctx = test_ctx();
        let pipeline = crate::shell::parse("echo hello world", &ctx.env);
        let result = dispatcher.execute_pipeline(&mut ctx, &pipeline);
        assert_eq!(result.output, "hello world\n");
    }
}

//! Explicit, threaded shell state.
//!
//! The REPL and every command handler share exactly one of these,
//! passed by `&mut` reference. There is deliberately no module-level
//! singleton or thread-local holding cwd/environment/repository state —
//! that pattern makes testing and reasoning about mutation order harder
//! than it needs to be, and nothing here requires it.

use crate::env::Environment;
use crate::navigator::VFSNavigator;
use crate::repository::Repository;

pub struct ShellContext {
    pub cwd: String,
    pub env: Environment,
    pub navigator: VFSNavigator,
    pub repository: Box<dyn Repository>,
    /// Set by the `exit`/`quit` handlers; checked by the REPL loop after
    /// each command to decide whether to keep reading.
    pub should_exit: bool,
}

impl ShellContext {
    pub fn new(repository: Box<dyn Repository>) -> Self {
        let mut env = Environment::new();
        env.set("CWD", "/");
        env.set("PWD", "/");
        ShellContext {
            cwd: "/".to_string(),
            env,
            navigator: VFSNavigator::new(),
            repository,
            should_exit: false,
        }
    }

    /// Update cwd and refresh the environment variables derived from it.
    /// Called by `cd` and by any command that navigates into or out of a
    /// conversation.
    pub fn set_cwd(&mut self, new_cwd: String) {
        self.cwd = new_cwd.clone();
        self.env.set("CWD", new_cwd.clone());
        self.env.set("PWD", new_cwd.clone());

        match crate::path::parse(&self.cwd, "/") {
            Ok(parsed) => {
                if let Some(id) = parsed.conversation_id {
                    self.env.set("CONV_ID", id);
                    self.env.set("MSG_COUNT", parsed.message_path.len().to_string());
                } else {
                    self.env.unset("CONV_ID");
                    self.env.unset("MSG_COUNT");
                }
            }
            Err(_) => {
                self.env.unset("CONV_ID");
                self.env.unset("MSG_COUNT");
            }
        }
    }

    /// Invalidate cached listings after any mutation. Called by every
    /// handler that writes to the repository.
    pub fn invalidate_cache(&mut self) {
        self.navigator.clear_cache();
    }
}

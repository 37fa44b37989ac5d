//! Built-in command handlers and registration.

pub mod navigation;
pub mod organization;
pub mod search;
pub mod session;
pub mod tags;
pub mod unix;
pub mod visualization;

use crate::context::ShellContext;
use crate::dispatcher::Dispatcher;
use crate::path::{self, PathKind};

/// Resolve a conversation id from an explicit argument (a `/`-rooted
/// path, or a bare id/prefix resolved against `/chats`) or, absent an
/// argument, from the conversation the caller is currently inside.
/// Shared by every organization command (`star`, `pin`, `archive`,
/// `title`, ...).
pub(crate) fn resolve_conversation_target(
    ctx: &mut ShellContext,
    arg: Option<&str>,
) -> Result<String, String> {
    match arg {
        Some(value) => {
            if value.starts_with('/') {
                let parsed = path::parse(value, &ctx.cwd).map_err(|e| e.to_string())?;
                parsed
                    .conversation_id
                    .ok_or_else(|| format!("Not a conversation path: {value}"))
            } else {
                let chats = path::parse("/chats", "/").map_err(|e| e.to_string())?;
                match ctx.navigator.resolve_prefix(ctx.repository.as_ref(), value, &chats) {
                    Ok(Some(id)) => Ok(id),
                    Ok(None) | Err(_) => Ok(value.to_string()),
                }
            }
        }
        None => {
            let parsed = path::parse(&ctx.cwd, "/").map_err(|e| e.to_string())?;
            match parsed.path_kind {
                PathKind::Conversation | PathKind::ConversationRoot | PathKind::MessageNode => parsed
                    .conversation_id
                    .ok_or_else(|| "Not in a conversation directory".to_string()),
                _ => Err("Not in a conversation directory".to_string()),
            }
        }
    }
}

/// Register every built-in command onto `dispatcher`.
pub fn register_builtin_commands(dispatcher: &mut Dispatcher) {
    dispatcher.register(Box::new(navigation::Pwd));
    dispatcher.register(Box::new(navigation::Cd));
    dispatcher.register(Box::new(navigation::Ls));

    dispatcher.register(Box::new(unix::Cat));
    dispatcher.register(Box::new(unix::Head));
    dispatcher.register(Box::new(unix::Tail));
    dispatcher.register(Box::new(unix::Echo));
    dispatcher.register(Box::new(unix::Grep));

    dispatcher.register(Box::new(search::Find));

    dispatcher.register(Box::new(visualization::Tree));
    dispatcher.register(Box::new(visualization::Paths));

    dispatcher.register(Box::new(organization::Star));
    dispatcher.register(Box::new(organization::Unstar));
    dispatcher.register(Box::new(organization::Pin));
    dispatcher.register(Box::new(organization::Unpin));
    dispatcher.register(Box::new(organization::Archive));
    dispatcher.register(Box::new(organization::Unarchive));
    dispatcher.register(Box::new(organization::Title));

    dispatcher.register(Box::new(tags::Ln));
    dispatcher.register(Box::new(tags::Cp));
    dispatcher.register(Box::new(tags::Mv));
    dispatcher.register(Box::new(tags::Rm));
    dispatcher.register(Box::new(tags::Mkdir));

    dispatcher.register(Box::new(session::Help));
    dispatcher.register(Box::new(session::Exit));
    dispatcher.register(Box::new(session::Quit));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::Dispatcher;
    use crate::model::{ConversationMetadata, ConversationTree};
    use crate::repository::InMemoryRepository;
    use chrono::Utc;
    use indexmap::IndexMap;

    fn fixture_ctx() -> ShellContext {
        let tree = ConversationTree {
            id: "abc12345".to_string(),
            title: Some("Fixture".to_string()),
            metadata: ConversationMetadata::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            messages: IndexMap::new(),
            root_message_ids: Vec::new(),
        };
        let mut repo = InMemoryRepository::new();
        repo.insert(tree);
        ShellContext::new(Box::new(repo))
    }

    #[test]
    fn resolve_conversation_target_from_explicit_path() {
        let mut ctx = fixture_ctx();
        let id = resolve_conversation_target(&mut ctx, Some("/chats/abc12345")).expect("resolves");
        assert_eq!(id, "abc12345");
    }

    #[test]
    fn resolve_conversation_target_from_bare_prefix() {
        let mut ctx = fixture_ctx();
        let id = resolve_conversation_target(&mut ctx, Some("abc")).expect("resolves");
        assert_eq!(id, "abc12345");
    }

    #[test]
    fn resolve_conversation_target_from_cwd() {
        let mut ctx = fixture_ctx();
        ctx.set_cwd("/chats/abc12345".to_string());
        let id = resolve_conversation_target(&mut ctx, None).expect("resolves");
        assert_eq!(id, "abc12345");
    }

    #[test]
    fn resolve_conversation_target_fails_outside_a_conversation() {
        let mut ctx = fixture_ctx();
        assert!(resolve_conversation_target(&mut ctx, None).is_err());
    }

    #[test]
    fn register_builtin_commands_wires_up_every_handler() {
        let mut dispatcher = Dispatcher::new();
        register_builtin_commands(&mut dispatcher);
        let names: Vec<&str> = dispatcher.usages().into_iter().map(|(name, _)| name).collect();
        for expected in ["pwd", "cd", "ls", "cat", "find", "tree", "star", "ln", "help"] {
            assert!(names.contains(&expected), "missing command: {expected}");
        }
    }
}

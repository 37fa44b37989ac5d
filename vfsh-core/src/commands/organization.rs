//! `star`, `unstar`, `pin`, `unpin`, `archive`, `unarchive`, `title`.

use super::resolve_conversation_target;
use crate::context::ShellContext;
use crate::dispatcher::{CommandResult, ShellCommand};
use crate::repository::Repository;

fn short_id(id: &str) -> &str {
    let end = id.char_indices().nth(8).map(|(i, _)| i).unwrap_or(id.len());
    &id[..end]
}

macro_rules! flag_command {
    ($struct_name:ident, $name:literal, $usage:literal, $verb:literal, $setter:ident, $flag:expr) => {
        pub struct $struct_name;

        impl ShellCommand for $struct_name {
            fn name(&self) -> &'static str {
                $name
            }
            fn usage(&self) -> &'static str {
                $usage
            }
            fn run(&self, ctx: &mut ShellContext, args: &[String], _stdin: &str) -> CommandResult {
                let target = args.first().map(String::as_str);
                let id = match resolve_conversation_target(ctx, target) {
                    Ok(id) => id,
                    Err(e) => return CommandResult::fail(format!("{}: {e}", $name)),
                };
                match ctx.repository.$setter(&id, $flag) {
                    Ok(()) => {
                        ctx.invalidate_cache();
                        CommandResult::ok(format!("{} conversation: {}\n", $verb, short_id(&id)))
                    }
                    Err(e) => CommandResult::fail(format!("{}: {e}", $name)),
                }
            }
        }
    };
}

flag_command!(Star, "star", "star [conv_id] - star a conversation", "Starred", star, true);
flag_command!(Unstar, "unstar", "unstar [conv_id] - unstar a conversation", "Unstarred", star, false);
flag_command!(Pin, "pin", "pin [conv_id] - pin a conversation", "Pinned", pin, true);
flag_command!(Unpin, "unpin", "unpin [conv_id] - unpin a conversation", "Unpinned", pin, false);
flag_command!(Archive, "archive", "archive [conv_id] - archive a conversation", "Archived", archive, true);
flag_command!(Unarchive, "unarchive", "unarchive [conv_id] - unarchive a conversation", "Unarchived", archive, false);

pub struct Title;

impl ShellCommand for Title {
    fn name(&self) -> &'static str {
        "title"
    }
    fn usage(&self) -> &'static str {
        "title [conv_id] <new title...> - rename a conversation"
    }
    fn run(&self, ctx: &mut ShellContext, args: &[String], _stdin: &str) -> CommandResult {
        if args.is_empty() {
            return CommandResult::fail("title: no title provided");
        }

        let first = &args[0];
        let explicit_path = first.starts_with('/');
        let looks_like_id = explicit_path || first.chars().count() >= 8;

        let (conv_id, title_words): (String, &[String]) = if looks_like_id {
            // A bare (non-`/`) word never fails to "resolve" — absent a
            // unique prefix match it is handed back unchanged — so a long
            // title word that merely happens to look id-shaped must be
            // confirmed against the repository before it's treated as a
            // target rather than the start of the title text.
            let candidate = resolve_conversation_target(ctx, Some(first.as_str()));
            let resolved = match candidate {
                Ok(id) if explicit_path => Some(id),
                Ok(id) => match ctx.repository.load_conversation(&id) {
                    Ok(Some(_)) => Some(id),
                    _ => None,
                },
                Err(_) => None,
            };
            match resolved {
                Some(id) => {
                    if args.len() < 2 {
                        return CommandResult::fail("title: no title provided");
                    }
                    (id, &args[1..])
                }
                None => match resolve_conversation_target(ctx, None) {
                    Ok(id) => (id, &args[..]),
                    Err(e) => return CommandResult::fail(format!("title: {e}")),
                },
            }
        } else {
            match resolve_conversation_target(ctx, None) {
                Ok(id) => (id, &args[..]),
                Err(e) => return CommandResult::fail(format!("title: {e}")),
            }
        };

        let new_title = title_words.join(" ");
        match ctx.repository.update_conversation_metadata(&conv_id, Some(&new_title), None) {
            Ok(true) => {
                ctx.invalidate_cache();
                CommandResult::ok(format!("Set title to: {new_title}\n"))
            }
            Ok(false) => CommandResult::fail("title: Conversation not found"),
            Err(e) => CommandResult::fail(format!("title: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConversationMetadata, ConversationTree};
    use crate::repository::{ConversationFilter, InMemoryRepository};
    use chrono::Utc;
    use indexmap::IndexMap;

    fn fixture_ctx() -> ShellContext {
        let tree = ConversationTree {
            id: "abc12345".to_string(),
            title: Some("Original".to_string()),
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
    fn star_then_unstar_round_trips() {
        let mut ctx = fixture_ctx();
        let star_result = Star.run(&mut ctx, &["abc12345".to_string()], "");
        assert!(star_result.success, "{:?}", star_result.error);

        let starred = ctx
            .repository
            .list_conversations(&ConversationFilter {
                starred: Some(true),
                ..Default::default()
            })
            .expect("lists");
        assert_eq!(starred.len(), 1);

        let unstar_result = Unstar.run(&mut ctx, &["abc12345".to_string()], "");
        assert!(unstar_result.success, "{:?}", unstar_result.error);
        let starred = ctx
            .repository
            .list_conversations(&ConversationFilter {
                starred: Some(true),
                ..Default::default()
            })
            .expect("lists");
        assert!(starred.is_empty());
    }

    #[test]
    fn star_with_no_argument_and_not_in_a_conversation_fails() {
        let mut ctx = fixture_ctx();
        let result = Star.run(&mut ctx, &[], "");
        assert!(!result.success);
    }

    #[test]
    fn star_with_no_argument_resolves_current_conversation() {
        let mut ctx = fixture_ctx();
        ctx.set_cwd("/chats/abc12345".to_string());
        let result = Star.run(&mut ctx, &[], "");
        assert!(result.success, "{:?}", result.error);
    }

    #[test]
    fn title_renames_the_current_conversation() {
        let mut ctx = fixture_ctx();
        ctx.set_cwd("/chats/abc12345".to_string());
        let result = Title.run(&mut ctx, &["New".to_string(), "Title".to_string()], "");
        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.output, "Set title to: New Title\n");
    }

    #[test]
    fn title_with_no_words_fails() {
        let mut ctx = fixture_ctx();
        ctx.set_cwd("/chats/abc12345".to_string());
        let result = Title.run(&mut ctx, &[], "");
        assert!(!result.success);
    }

    #[test]
    fn title_with_a_long_first_word_that_is_not_a_real_id_uses_the_current_conversation() {
        let mut ctx = fixture_ctx();
        ctx.set_cwd("/chats/abc12345".to_string());
        let args = vec!["Amazingly".to_string(), "good".to_string(), "chat".to_string()];
        let result = Title.run(&mut ctx, &args, "");
        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.output, "Set title to: Amazingly good chat\n");
    }

    #[test]
    fn title_with_an_explicit_id_prefix_still_renames_that_conversation() {
        let mut ctx = fixture_ctx();
        let args = vec!["abc12345".to_string(), "New".to_string(), "Title".to_string()];
        let result = Title.run(&mut ctx, &args, "");
        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.output, "Set title to: New Title\n");
    }
}

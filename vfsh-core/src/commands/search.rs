//! `find`.

use regex::RegexBuilder;

use crate::context::ShellContext;
use crate::dispatcher::{CommandResult, ShellCommand};
use crate::model::{ConversationTree, Message, Role};
use crate::path::{self, PathKind};
use crate::repository::Repository;

struct FindOptions {
    search_path: Option<String>,
    name_pattern: Option<String>,
    content_pattern: Option<String>,
    role_filter: Option<Role>,
    type_filter: Option<char>,
    case_insensitive: bool,
    limit: Option<usize>,
    long_format: bool,
}

fn parse_options(args: &[String]) -> Result<FindOptions, String> {
    let mut opts = FindOptions {
        search_path: None,
        name_pattern: None,
        content_pattern: None,
        role_filter: None,
        type_filter: None,
        case_insensitive: false,
        limit: None,
        long_format: false,
    };

    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "-name" => {
                opts.name_pattern = Some(args.get(i + 1).cloned().ok_or("find: -name requires a value")?);
                i += 2;
            }
            "-content" => {
                opts.content_pattern = Some(args.get(i + 1).cloned().ok_or("find: -content requires a value")?);
                i += 2;
            }
            "-role" => {
                let raw = args.get(i + 1).ok_or("find: -role requires a value")?;
                opts.role_filter = Some(Role::from_str_lossy(raw).ok_or_else(|| format!("find: unknown role: {raw}"))?);
                i += 2;
            }
            "-type" => {
                let raw = args.get(i + 1).ok_or("find: -type requires a value")?;
                opts.type_filter = raw.chars().next();
                i += 2;
            }
            "-i" => {
                opts.case_insensitive = true;
                i += 1;
            }
            "-l" => {
                opts.long_format = true;
                i += 1;
            }
            "-limit" => {
                let raw = args.get(i + 1).ok_or("find: -limit requires a value")?;
                opts.limit = Some(raw.parse().map_err(|_| format!("find: invalid limit: {raw}"))?);
                i += 2;
            }
            other if other.starts_with('-') => return Err(format!("find: unknown option: {other}")),
            other => {
                opts.search_path = Some(other.to_string());
                i += 1;
            }
        }
    }

    Ok(opts)
}

/// Reconstruct the `m1/m2/...` path from the tree root to `message`,
/// using the same 1-based positional scheme the navigator uses for
/// directory listings.
fn message_path_string(tree: &ConversationTree, message: &Message) -> Option<String> {
    let mut chain = Vec::new();
    let mut current = message;
    loop {
        chain.push(current.id.clone());
        match &current.parent_id {
            Some(parent_id) => current = tree.get(parent_id)?,
            None => break,
        }
    }
    chain.reverse();

    let mut parts = Vec::new();
    for (depth, id) in chain.iter().enumerate() {
        let idx = if depth == 0 {
            tree.root_message_ids.iter().position(|r| r == id)?
        } else {
            let parent_id = &chain[depth - 1];
            tree.children_of(parent_id).iter().position(|m| &m.id == id)?
        };
        parts.push(format!("m{}", idx + 1));
    }
    Some(parts.join("/"))
}

fn search_messages_in(
    tree: &ConversationTree,
    content_regex: Option<&regex::Regex>,
    role_filter: Option<Role>,
) -> Vec<String> {
    let mut out = Vec::new();
    for msg in tree.messages.values() {
        if let Some(role) = role_filter {
            if msg.role != role {
                continue;
            }
        }
        if let Some(re) = content_regex {
            if !re.is_match(&msg.content) {
                continue;
            }
        }
        if let Some(p) = message_path_string(tree, msg) {
            out.push(p);
        }
    }
    out
}

fn search_conversations(
    ctx: &mut ShellContext,
    opts: &FindOptions,
    name_regex: Option<&regex::Regex>,
    content_regex: Option<&regex::Regex>,
    candidate_ids: Option<Vec<String>>,
) -> Result<Vec<String>, String> {
    let ids = match candidate_ids {
        Some(ids) => ids,
        None => ctx
            .repository
            .list_conversations(&crate::repository::ConversationFilter::default())
            .map_err(|e| e.to_string())?
            .into_iter()
            .map(|s| s.id)
            .collect(),
    };

    let mut results = Vec::new();
    for id in ids {
        if let Some(limit) = opts.limit {
            if results.len() >= limit {
                break;
            }
        }
        let Some(tree) = ctx.repository.load_conversation(&id).map_err(|e| e.to_string())? else {
            continue;
        };

        if opts.type_filter == Some('f') {
            // fall through to message-level search below
        } else if let Some(re) = name_regex {
            let matches_title = re.is_match(tree.title.as_deref().unwrap_or_default());
            if !matches_title && content_regex.is_none() && opts.role_filter.is_none() {
                continue;
            }
        }

        if content_regex.is_some() || opts.role_filter.is_some() {
            for msg_path in search_messages_in(&tree, content_regex, opts.role_filter) {
                if let Some(limit) = opts.limit {
                    if results.len() >= limit {
                        break;
                    }
                }
                results.push(format!("/chats/{id}/{msg_path}"));
            }
        } else if opts.type_filter != Some('f') {
            results.push(format!("/chats/{id}/"));
        }
    }
    Ok(results)
}

pub struct Find;

impl ShellCommand for Find {
    fn name(&self) -> &'static str {
        "find"
    }
    fn usage(&self) -> &'static str {
        "find [path] [-name p] [-content p] [-role r] [-type d|f] [-i] [-limit n] [-l] - search the VFS"
    }
    fn run(&self, ctx: &mut ShellContext, args: &[String], _stdin: &str) -> CommandResult {
        let opts = match parse_options(args) {
            Ok(o) => o,
            Err(e) => return CommandResult::fail(e),
        };

        let name_regex = match &opts.name_pattern {
            Some(p) => {
                let translated = p.replace('*', ".*").replace('?', ".");
                match RegexBuilder::new(&translated).case_insensitive(opts.case_insensitive).build() {
                    Ok(r) => Some(r),
                    Err(e) => return CommandResult::fail(format!("find: invalid pattern: {e}")),
                }
            }
            None => None,
        };
        let content_regex = match &opts.content_pattern {
            Some(p) => match RegexBuilder::new(p).case_insensitive(opts.case_insensitive).build() {
                Ok(r) => Some(r),
                Err(e) => return CommandResult::fail(format!("find: invalid pattern: {e}")),
            },
            None => None,
        };

        let search_path = opts.search_path.clone().unwrap_or_else(|| path::as_directory(&ctx.cwd));
        let parsed = match path::parse(&search_path, &ctx.cwd) {
            Ok(p) => p,
            Err(e) => return CommandResult::fail(format!("find: {e}")),
        };

        let results = match parsed.path_kind {
            PathKind::Root => search_conversations(ctx, &opts, name_regex.as_ref(), content_regex.as_ref(), None),
            PathKind::Chats
            | PathKind::Starred
            | PathKind::Pinned
            | PathKind::Archived
            | PathKind::Tags
            | PathKind::TagDir
            | PathKind::Source
            | PathKind::Model
            | PathKind::Recent => {
                let entries = match ctx.navigator.list_directory(ctx.repository.as_ref(), &parsed) {
                    Ok(e) => e,
                    Err(e) => return CommandResult::fail(format!("find: {e}")),
                };
                let ids: Vec<String> = entries.into_iter().filter(|e| e.is_directory).map(|e| e.name).collect();
                search_conversations(ctx, &opts, name_regex.as_ref(), content_regex.as_ref(), Some(ids))
            }
            PathKind::ConversationRoot | PathKind::MessageNode => {
                let Some(id) = parsed.conversation_id.clone() else {
                    return CommandResult::fail("find: missing conversation id");
                };
                search_conversations(ctx, &opts, name_regex.as_ref(), content_regex.as_ref(), Some(vec![id]))
            }
            _ => Err(format!("cannot search in {search_path}")),
        };

        match results {
            Ok(list) if list.is_empty() => CommandResult::ok_empty(),
            Ok(list) => CommandResult::ok(format!("{}\n", list.join("\n"))),
            Err(e) => CommandResult::fail(format!("find: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ConversationMetadata;
    use crate::repository::InMemoryRepository;
    use chrono::Utc;
    use indexmap::IndexMap;

    fn fixture_ctx() -> ShellContext {
        let mut messages = IndexMap::new();
        for (id, role, content, parent) in [
            ("root", Role::User, "Hi", None),
            ("reply-hello", Role::Assistant, "Hello", Some("root")),
            ("reply-howdy", Role::Assistant, "Howdy", Some("root")),
        ] {
            messages.insert(
                id.to_string(),
                Message {
                    id: id.to_string(),
                    role,
                    content: content.to_string(),
                    timestamp: None,
                    parent_id: parent.map(str::to_string),
                },
            );
        }
        let tree = ConversationTree {
            id: "abc12345".to_string(),
            title: Some("Greetings".to_string()),
            metadata: ConversationMetadata::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            messages,
            root_message_ids: vec!["root".to_string()],
        };
        let mut repo = InMemoryRepository::new();
        repo.insert(tree);
        ShellContext::new(Box::new(repo))
    }

    #[test]
    fn find_by_content_and_role_returns_the_message_path() {
        let mut ctx = fixture_ctx();
        let args = vec![
            "/chats".to_string(),
            "-content".to_string(),
            "Howdy".to_string(),
            "-role".to_string(),
            "assistant".to_string(),
        ];
        let result = Find.run(&mut ctx, &args, "");
        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.output, "/chats/abc12345/m1/m2\n");
    }

    #[test]
    fn find_limit_zero_is_empty() {
        let mut ctx = fixture_ctx();
        let args = vec!["/chats".to_string(), "-limit".to_string(), "0".to_string()];
        let result = Find.run(&mut ctx, &args, "");
        assert!(result.success);
        assert_eq!(result.output, "");
    }

    #[test]
    fn find_with_no_path_searches_from_cwd() {
        let mut ctx = fixture_ctx();
        ctx.set_cwd("/chats/abc12345".to_string());
        let result = Find.run(&mut ctx, &[], "");
        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.output, "/chats/abc12345/\n");
    }
}

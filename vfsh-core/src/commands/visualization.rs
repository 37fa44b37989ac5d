//! `tree`, `paths`.

use super::resolve_conversation_target;
use crate::context::ShellContext;
use crate::dispatcher::{CommandResult, ShellCommand};
use crate::model::{ConversationTree, Message, Role};
use crate::path;
use crate::repository::Repository;

const PREVIEW_LEN: usize = 40;

fn role_glyph(role: Role) -> &'static str {
    match role {
        Role::User => "👤",
        Role::Assistant => "🤖",
        Role::System => "⚙",
        Role::Tool => "🔧",
    }
}

fn short_id(id: &str) -> &str {
    let end = id.char_indices().nth(8).map(|(i, _)| i).unwrap_or(id.len());
    &id[..end]
}

fn preview(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= PREVIEW_LEN {
        trimmed.to_string()
    } else {
        let t: String = trimmed.chars().take(PREVIEW_LEN).collect();
        format!("{t}…")
    }
}

fn render_tree(tree: &ConversationTree, node: &Message, prefix: &str, is_last: bool, current_id: &str, out: &mut String) {
    let connector = if is_last { "└─ " } else { "├─ " };
    let marker = if node.id == current_id { " *" } else { "" };
    out.push_str(&format!(
        "{prefix}{connector}{} {} {}{marker}\n",
        role_glyph(node.role),
        short_id(&node.id),
        preview(&node.content)
    ));

    let children = tree.children_of(&node.id);
    let child_prefix = format!("{prefix}{}", if is_last { "   " } else { "│  " });
    let count = children.len();
    for (i, child) in children.into_iter().enumerate() {
        render_tree(tree, child, &child_prefix, i + 1 == count, current_id, out);
    }
}

fn resolve_conversation(ctx: &mut ShellContext, args: &[String], cmd: &str) -> Result<(ConversationTree, String), String> {
    let target = args.first().map(String::as_str);
    let conv_id = resolve_conversation_target(ctx, target).map_err(|e| format!("{cmd}: {e}"))?;
    let tree = ctx
        .repository
        .load_conversation(&conv_id)
        .map_err(|e| format!("{cmd}: {e}"))?
        .ok_or_else(|| format!("{cmd}: Conversation not found: {conv_id}"))?;
    Ok((tree, conv_id))
}

fn current_message_id(ctx: &ShellContext, tree: &ConversationTree) -> String {
    path::parse(&ctx.cwd, "/")
        .ok()
        .and_then(|parsed| {
            if parsed.message_path.is_empty() {
                None
            } else {
                crate::navigator::walk_message_path(tree, &parsed.message_path)
                    .ok()
                    .map(|m| m.id.clone())
            }
        })
        .unwrap_or_default()
}

pub struct Tree;

impl ShellCommand for Tree {
    fn name(&self) -> &'static str {
        "tree"
    }
    fn usage(&self) -> &'static str {
        "tree [conv_ref] - render a conversation's message tree"
    }
    fn run(&self, ctx: &mut ShellContext, args: &[String], _stdin: &str) -> CommandResult {
        let (tree, _) = match resolve_conversation(ctx, args, "tree") {
            Ok(v) => v,
            Err(e) => return CommandResult::fail(e),
        };
        let current_id = current_message_id(ctx, &tree);

        let mut out = String::new();
        let roots = tree.root_messages();
        let count = roots.len();
        for (i, root) in roots.into_iter().enumerate() {
            render_tree(&tree, root, "", i + 1 == count, &current_id, &mut out);
        }
        out.push_str(&format!("\n{} messages, {} paths\n", tree.messages.len(), tree.all_paths().len()));
        CommandResult::ok(out)
    }
}

pub struct Paths;

impl ShellCommand for Paths {
    fn name(&self) -> &'static str {
        "paths"
    }
    fn usage(&self) -> &'static str {
        "paths [conv_ref] - list every root-to-leaf path in a conversation"
    }
    fn run(&self, ctx: &mut ShellContext, args: &[String], _stdin: &str) -> CommandResult {
        let (tree, _) = match resolve_conversation(ctx, args, "paths") {
            Ok(v) => v,
            Err(e) => return CommandResult::fail(e),
        };

        let all_paths = tree.all_paths();
        let mut out = String::new();
        for (i, path) in all_paths.iter().enumerate() {
            out.push_str(&format!("Path {}:\n", i + 1));
            for msg in path {
                out.push_str(&format!("  {}: {}\n", msg.role.as_str(), preview(&msg.content)));
            }
            out.push('\n');
        }
        out.push_str(&format!("{} messages, {} paths\n", tree.messages.len(), all_paths.len()));
        CommandResult::ok(out)
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
    fn tree_renders_two_branches_from_the_explicit_conversation() {
        let mut ctx = fixture_ctx();
        let result = Tree.run(&mut ctx, &["abc12345".to_string()], "");
        assert!(result.success, "{:?}", result.error);
        assert!(result.output.contains("3 messages, 2 paths"));
    }

    #[test]
    fn paths_lists_every_root_to_leaf_path() {
        let mut ctx = fixture_ctx();
        let result = Paths.run(&mut ctx, &["abc12345".to_string()], "");
        assert!(result.success, "{:?}", result.error);
        assert!(result.output.contains("Path 1:"));
        assert!(result.output.contains("Path 2:"));
        assert!(result.output.contains("3 messages, 2 paths"));
    }

    #[test]
    fn tree_with_no_argument_and_not_in_a_conversation_fails() {
        let mut ctx = fixture_ctx();
        let result = Tree.run(&mut ctx, &[], "");
        assert!(!result.success);
    }
}

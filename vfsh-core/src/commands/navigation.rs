//! `cd`, `ls`, `pwd`.

use crate::context::ShellContext;
use crate::dispatcher::{CommandResult, ShellCommand};
use crate::navigator::VFSEntry;
use crate::path::{self, PathKind};

pub struct Pwd;

impl ShellCommand for Pwd {
    fn name(&self) -> &'static str {
        "pwd"
    }
    fn usage(&self) -> &'static str {
        "pwd - print the current VFS working directory"
    }
    fn run(&self, ctx: &mut ShellContext, _args: &[String], _stdin: &str) -> CommandResult {
        CommandResult::ok(format!("{}\n", ctx.cwd))
    }
}

/// Parents where an id-like last segment is eligible for prefix
/// resolution at all (named subdirectories still apply beneath these).
fn parent_supports_prefix(kind: PathKind) -> bool {
    matches!(
        kind,
        PathKind::Chats
            | PathKind::Starred
            | PathKind::Pinned
            | PathKind::Archived
            | PathKind::Tags
            | PathKind::TagDir
            | PathKind::Recent
            | PathKind::Source
            | PathKind::Model
    )
}

fn looks_like_id_candidate(segment: &str) -> bool {
    segment.len() >= 3
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

pub struct Cd;

impl ShellCommand for Cd {
    fn name(&self) -> &'static str {
        "cd"
    }
    fn usage(&self) -> &'static str {
        "cd [path] - change the VFS working directory"
    }
    fn run(&self, ctx: &mut ShellContext, args: &[String], _stdin: &str) -> CommandResult {
        let Some(target) = args.first() else {
            ctx.set_cwd("/".to_string());
            return CommandResult::ok_empty();
        };

        if target == ".." {
            if ctx.cwd == "/" {
                return CommandResult::ok("Already at root\n");
            }
            let parent = path::normalize_path("..", &ctx.cwd);
            ctx.set_cwd(parent);
            return CommandResult::ok_empty();
        }

        let mut candidate = target.clone();
        let mut resolution_note = String::new();

        // Attempt prefix resolution on the final segment when the parent
        // is a listing context that makes sense to resolve against.
        if let Some((parent_raw, last_seg)) = split_parent_and_last(target, &ctx.cwd) {
            if looks_like_id_candidate(last_seg) {
                if let Ok(parent_parsed) = path::parse(&parent_raw, &ctx.cwd) {
                    if parent_supports_prefix(parent_parsed.path_kind) {
                        match ctx.navigator.resolve_prefix(ctx.repository.as_ref(), last_seg, &parent_parsed) {
                            Ok(Some(full_id)) => {
                                if full_id != last_seg {
                                    let suffix = if target.ends_with('/') { "/" } else { "" };
                                    candidate = format!("{}/{full_id}{suffix}", parent_raw.trim_end_matches('/'));
                                    resolution_note = format!("Resolved '{last_seg}' to: {full_id}\n");
                                }
                            }
                            Ok(None) => {}
                            Err(e) => {
                                if parent_parsed.path_kind.is_id_only_listing() {
                                    return CommandResult::fail(format!("cd: {e}"));
                                }
                            }
                        }
                    }
                }
            }
        }

        let parsed = match path::parse(&candidate, &ctx.cwd) {
            Ok(p) => p,
            Err(e) => return CommandResult::fail(format!("cd: {e}")),
        };

        if !parsed.is_directory {
            return CommandResult::fail(format!("cd: Not a directory: {}", parsed.normalized_path));
        }

        if let Err(e) = ctx.navigator.list_directory(ctx.repository.as_ref(), &parsed) {
            return CommandResult::fail(format!("cd: {e}"));
        }

        ctx.set_cwd(parsed.normalized_path);
        CommandResult::ok(resolution_note)
    }
}

/// Split `target` into `(parent, last_segment)` for prefix resolution,
/// treating relative targets as relative to the caller's cwd by leaving
/// them as-is; `path::parse` will join against cwd downstream. A bare
/// segment with no `/` at all (e.g. `cd abc`) is still resolved: its
/// parent is the caller's current directory.
fn split_parent_and_last<'a>(target: &'a str, cwd: &str) -> Option<(String, &'a str)> {
    let trimmed = target.trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.rsplit_once('/') {
        Some((parent, last)) => {
            let parent = if parent.is_empty() { "/".to_string() } else { parent.to_string() };
            Some((parent, last))
        }
        None => Some((cwd.to_string(), trimmed)),
    }
}

pub struct Ls;

fn format_short(entries: &[VFSEntry]) -> String {
    let mut dirs: Vec<String> = Vec::new();
    let mut files: Vec<String> = Vec::new();
    for e in entries {
        let mut name = e.name.clone();
        if e.is_directory {
            name.push('/');
        }
        if let Some(info) = &e.conversation {
            let mut markers = String::new();
            if info.starred {
                markers.push('*');
            }
            if info.pinned {
                markers.push('!');
            }
            if info.archived {
                markers.push('~');
            }
            if !markers.is_empty() {
                name = format!("{name} [{markers}]");
            }
        }
        if e.is_directory {
            dirs.push(name);
        } else {
            files.push(name);
        }
    }
    dirs.sort();
    files.sort();
    dirs.extend(files);
    format!("{}\n", dirs.join("  "))
}

fn format_long(entries: &[VFSEntry]) -> String {
    let mut lines = Vec::new();
    for e in entries {
        if let Some(info) = &e.conversation {
            let mut markers = String::new();
            if info.starred {
                markers.push('*');
            }
            if info.pinned {
                markers.push('!');
            }
            if info.archived {
                markers.push('~');
            }
            let title = info.title.as_deref().unwrap_or("(untitled)");
            let title = if title.chars().count() > 40 {
                let t: String = title.chars().take(40).collect();
                format!("{t}…")
            } else {
                title.to_string()
            };
            let tag_preview = if info.tags.len() > 3 {
                format!("{}+{}", info.tags[..3].join(","), info.tags.len() - 3)
            } else {
                info.tags.join(",")
            };
            lines.push(format!(
                "{}{:<10}  dir   {}  {}  {}",
                e.name,
                markers,
                title,
                tag_preview,
                info.updated_at.to_rfc3339()
            ));
        } else if let Some(info) = &e.message {
            lines.push(format!(
                "{}  {}  {}  {}",
                e.name,
                if e.is_directory { "dir" } else { "file" },
                info.role.as_str(),
                info.content_preview
            ));
        } else {
            lines.push(e.name.clone());
        }
    }
    if lines.is_empty() {
        String::new()
    } else {
        format!("{}\n", lines.join("\n"))
    }
}

impl ShellCommand for Ls {
    fn name(&self) -> &'static str {
        "ls"
    }
    fn usage(&self) -> &'static str {
        "ls [-l] [path] - list a VFS directory"
    }
    fn run(&self, ctx: &mut ShellContext, args: &[String], _stdin: &str) -> CommandResult {
        let long = args.iter().any(|a| a == "-l");
        let path_arg = args.iter().find(|a| *a != "-l");
        let target = path_arg.cloned().unwrap_or_else(|| path::as_directory(&ctx.cwd));

        let parsed = match path::parse(&target, &ctx.cwd) {
            Ok(p) => p,
            Err(e) => return CommandResult::fail(format!("ls: {e}")),
        };
        if !parsed.is_directory {
            return CommandResult::fail(format!("ls: Not a directory: {}", parsed.normalized_path));
        }

        match ctx.navigator.list_directory(ctx.repository.as_ref(), &parsed) {
            Ok(entries) => {
                let output = if long { format_long(&entries) } else { format_short(&entries) };
                CommandResult::ok(output)
            }
            Err(e) => CommandResult::fail(format!("ls: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConversationMetadata, ConversationTree, Message, Role};
    use crate::repository::InMemoryRepository;
    use chrono::Utc;
    use indexmap::IndexMap;

    fn fixture_tree(id: &str) -> ConversationTree {
        let mut messages = IndexMap::new();
        messages.insert(
            "m1".to_string(),
            Message {
                id: "m1".to_string(),
                role: Role::User,
                content: "Hi".to_string(),
                timestamp: None,
                parent_id: None,
            },
        );
        ConversationTree {
            id: id.to_string(),
            title: Some("Fixture".to_string()),
            metadata: ConversationMetadata::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            messages,
            root_message_ids: vec!["m1".to_string()],
        }
    }

    fn fixture_ctx() -> ShellContext {
        let mut repo = InMemoryRepository::new();
        repo.insert(fixture_tree("abc12345"));
        ShellContext::new(Box::new(repo))
    }

    #[test]
    fn cd_into_conversation_root_keeps_trailing_slash_semantics() {
        let mut ctx = fixture_ctx();
        let result = Cd.run(&mut ctx, &["/chats/abc12345/".to_string()], "");
        assert!(result.success, "{:?}", result.error);
        assert_eq!(ctx.cwd, "/chats/abc12345");
    }

    #[test]
    fn ls_with_no_argument_lists_the_conversation_root_just_entered() {
        let mut ctx = fixture_ctx();
        let cd_result = Cd.run(&mut ctx, &["/chats/abc12345/".to_string()], "");
        assert!(cd_result.success, "{:?}", cd_result.error);

        let ls_result = Ls.run(&mut ctx, &[], "");
        assert!(ls_result.success, "{:?}", ls_result.error);
        assert_eq!(ls_result.output, "m1/\n");
    }

    #[test]
    fn cd_resolves_a_bare_prefix_against_the_current_directory() {
        let mut ctx = fixture_ctx();
        let cd_chats = Cd.run(&mut ctx, &["/chats".to_string()], "");
        assert!(cd_chats.success, "{:?}", cd_chats.error);

        let result = Cd.run(&mut ctx, &["abc".to_string()], "");
        assert!(result.success, "{:?}", result.error);
        assert_eq!(ctx.cwd, "/chats/abc12345");
        assert_eq!(result.output, "Resolved 'abc' to: abc12345\n");
    }

    #[test]
    fn cd_dotdot_at_root_reports_already_at_root() {
        let mut ctx = fixture_ctx();
        let result = Cd.run(&mut ctx, &["..".to_string()], "");
        assert!(result.success);
        assert_eq!(result.output, "Already at root\n");
        assert_eq!(ctx.cwd, "/");
    }

    #[test]
    fn cd_with_no_target_returns_to_root() {
        let mut ctx = fixture_ctx();
        ctx.set_cwd("/chats/abc12345".to_string());
        let result = Cd.run(&mut ctx, &[], "");
        assert!(result.success);
        assert_eq!(ctx.cwd, "/");
    }
}

//! `ln`, `cp`, `mv`, `rm`, `mkdir` — the tag-graph mutation commands.
//!
//! These have no counterpart in the distilled command set this crate
//! grew from; they are modeled directly on its `TagDir`/`Tags`
//! read-only-vs-mutable distinction (see [`path::is_read_only`] and
//! [`path::can_delete`]), generalized into the five POSIX verbs a tag
//! hierarchy naturally supports.

use crate::context::ShellContext;
use crate::dispatcher::{CommandResult, ShellCommand};
use crate::path::{self, PathKind};
use crate::repository::Repository;

fn parse_two(args: &[String], cmd: &str) -> Result<(&String, &String), String> {
    match (args.first(), args.get(1)) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(format!("{cmd}: requires a source and a destination")),
    }
}

pub struct Ln;

impl ShellCommand for Ln {
    fn name(&self) -> &'static str {
        "ln"
    }
    fn usage(&self) -> &'static str {
        "ln <conversation> <tag dir> - add a conversation to a tag"
    }
    fn run(&self, ctx: &mut ShellContext, args: &[String], _stdin: &str) -> CommandResult {
        let (src, dest) = match parse_two(args, "ln") {
            Ok(v) => v,
            Err(e) => return CommandResult::fail(e),
        };

        let src_parsed = match path::parse(src, &ctx.cwd) {
            Ok(p) => p,
            Err(e) => return CommandResult::fail(format!("ln: {e}")),
        };
        let Some(conv_id) = src_parsed.conversation_id.clone() else {
            return CommandResult::fail(format!("ln: {src}: not a conversation"));
        };

        let dest_parsed = match path::parse(dest, &ctx.cwd) {
            Ok(p) => p,
            Err(e) => return CommandResult::fail(format!("ln: {e}")),
        };
        if dest_parsed.path_kind != PathKind::TagDir {
            return CommandResult::fail(format!("ln: {dest}: not a tag directory"));
        }
        let Some(tag_path) = dest_parsed.tag_path.clone() else {
            return CommandResult::fail(format!("ln: {dest}: not a tag directory"));
        };

        match ctx.repository.add_tags(&conv_id, std::slice::from_ref(&tag_path)) {
            Ok(true) => {
                ctx.invalidate_cache();
                CommandResult::ok(format!("Linked {conv_id} into /tags/{tag_path}\n"))
            }
            Ok(false) => CommandResult::fail(format!("ln: Conversation not found: {conv_id}")),
            Err(e) => CommandResult::fail(format!("ln: {e}")),
        }
    }
}

pub struct Cp;

impl ShellCommand for Cp {
    fn name(&self) -> &'static str {
        "cp"
    }
    fn usage(&self) -> &'static str {
        "cp <conversation> [tag dir] - duplicate a conversation"
    }
    fn run(&self, ctx: &mut ShellContext, args: &[String], _stdin: &str) -> CommandResult {
        let Some(src) = args.first() else {
            return CommandResult::fail("cp: requires a source");
        };
        let src_parsed = match path::parse(src, &ctx.cwd) {
            Ok(p) => p,
            Err(e) => return CommandResult::fail(format!("cp: {e}")),
        };
        let Some(conv_id) = src_parsed.conversation_id.clone() else {
            return CommandResult::fail(format!("cp: {src}: not a conversation"));
        };

        let new_id = match ctx.repository.duplicate_conversation(&conv_id, None) {
            Ok(id) => id,
            Err(e) => return CommandResult::fail(format!("cp: {e}")),
        };

        if let Some(dest) = args.get(1) {
            if let Ok(dest_parsed) = path::parse(dest, &ctx.cwd) {
                if dest_parsed.path_kind == PathKind::TagDir {
                    if let Some(tag_path) = dest_parsed.tag_path {
                        if let Err(e) = ctx.repository.add_tags(&new_id, std::slice::from_ref(&tag_path)) {
                            return CommandResult::fail(format!("cp: {e}"));
                        }
                    }
                }
            }
        }

        ctx.invalidate_cache();
        CommandResult::ok(format!("Copied {conv_id} to {new_id}\n"))
    }
}

pub struct Mv;

impl ShellCommand for Mv {
    fn name(&self) -> &'static str {
        "mv"
    }
    fn usage(&self) -> &'static str {
        "mv <tagged conversation> <tag dir> - move a conversation between tags"
    }
    fn run(&self, ctx: &mut ShellContext, args: &[String], _stdin: &str) -> CommandResult {
        let (src, dest) = match parse_two(args, "mv") {
            Ok(v) => v,
            Err(e) => return CommandResult::fail(e),
        };

        let src_parsed = match path::parse(src, &ctx.cwd) {
            Ok(p) => p,
            Err(e) => return CommandResult::fail(format!("mv: {e}")),
        };
        if src_parsed.segments.first().map(String::as_str) != Some("tags") {
            return CommandResult::fail(format!("mv: {src}: not a tagged conversation"));
        }
        let (Some(conv_id), Some(old_tag)) = (src_parsed.conversation_id.clone(), src_parsed.tag_path.clone()) else {
            return CommandResult::fail(format!("mv: {src}: not a tagged conversation"));
        };

        let dest_parsed = match path::parse(dest, &ctx.cwd) {
            Ok(p) => p,
            Err(e) => return CommandResult::fail(format!("mv: {e}")),
        };
        if dest_parsed.path_kind != PathKind::TagDir {
            return CommandResult::fail(format!("mv: {dest}: not a tag directory"));
        }
        let Some(new_tag) = dest_parsed.tag_path.clone() else {
            return CommandResult::fail(format!("mv: {dest}: not a tag directory"));
        };

        if let Err(e) = ctx.repository.remove_tag(&conv_id, &old_tag) {
            return CommandResult::fail(format!("mv: {e}"));
        }
        if let Err(e) = ctx.repository.add_tags(&conv_id, std::slice::from_ref(&new_tag)) {
            // Best-effort restore of the original tag so the mutation is
            // not silently lossy.
            let _ = ctx.repository.add_tags(&conv_id, std::slice::from_ref(&old_tag));
            return CommandResult::fail(format!("mv: {e}"));
        }

        ctx.invalidate_cache();
        CommandResult::ok(format!("Moved {conv_id} from /tags/{old_tag} to /tags/{new_tag}\n"))
    }
}

pub struct Rm;

impl ShellCommand for Rm {
    fn name(&self) -> &'static str {
        "rm"
    }
    fn usage(&self) -> &'static str {
        "rm [-y] <path> - delete a conversation (requires -y) or remove it from a tag"
    }
    fn run(&self, ctx: &mut ShellContext, args: &[String], _stdin: &str) -> CommandResult {
        let confirmed = args.iter().any(|a| a == "-y" || a == "--yes");
        let Some(target) = args.iter().find(|a| a.as_str() != "-y" && a.as_str() != "--yes") else {
            return CommandResult::fail("rm: missing operand");
        };
        let parsed = match path::parse(target, &ctx.cwd) {
            Ok(p) => p,
            Err(e) => return CommandResult::fail(format!("rm: {e}")),
        };

        if !path::can_delete(&parsed) {
            return CommandResult::fail(format!("rm: {target}: cannot be deleted"));
        }

        let Some(conv_id) = parsed.conversation_id.clone() else {
            return CommandResult::fail(format!("rm: {target}: not a conversation"));
        };

        let result = match parsed.path_kind {
            PathKind::TagDir => {
                let Some(tag_path) = parsed.tag_path.clone() else {
                    return CommandResult::fail(format!("rm: {target}: not a tag directory"));
                };
                ctx.repository.remove_tag(&conv_id, &tag_path)
            }
            _ => {
                if !confirmed {
                    return CommandResult::fail(format!(
                        "rm: {target}: deleting a conversation requires -y to confirm"
                    ));
                }
                ctx.repository.delete_conversation(&conv_id)
            }
        };

        match result {
            Ok(true) => {
                ctx.invalidate_cache();
                CommandResult::ok(format!("Removed {conv_id}\n"))
            }
            Ok(false) => CommandResult::fail(format!("rm: Conversation not found: {conv_id}")),
            Err(e) => CommandResult::fail(format!("rm: {e}")),
        }
    }
}

pub struct Mkdir;

impl ShellCommand for Mkdir {
    fn name(&self) -> &'static str {
        "mkdir"
    }
    fn usage(&self) -> &'static str {
        "mkdir <tag path> - acknowledge a new tag directory"
    }
    fn run(&self, ctx: &mut ShellContext, args: &[String], _stdin: &str) -> CommandResult {
        let Some(target) = args.first() else {
            return CommandResult::fail("mkdir: missing operand");
        };
        let parsed = match path::parse(target, &ctx.cwd) {
            Ok(p) => p,
            Err(e) => return CommandResult::fail(format!("mkdir: {e}")),
        };
        if !matches!(parsed.path_kind, PathKind::TagDir | PathKind::Tags) {
            return CommandResult::fail(format!("mkdir: {target}: not under /tags"));
        }
        // Tag directories are conceptual: they exist exactly when some
        // conversation carries that tag. There is nothing to persist.
        CommandResult::ok(format!("{target}\n"))
    }
}

//! `cat`, `head`, `tail`, `echo`, `grep`.

use regex::RegexBuilder;

use crate::context::ShellContext;
use crate::dispatcher::{CommandResult, ShellCommand};
use crate::navigator::walk_message_path;
use crate::path::{self, PathKind};
use crate::repository::Repository;

/// Render a single conversation path (root to leaf) as alternating
/// `Role: text` blocks, the shape `cat` uses for whole-conversation reads.
fn render_message_sequence(messages: &[&crate::model::Message]) -> String {
    messages
        .iter()
        .map(|m| {
            let role = capitalize(m.role.as_str());
            format!("{role}: {}", m.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn read_one(ctx: &mut ShellContext, arg: &str) -> Result<String, String> {
    let parsed = path::parse(arg, &ctx.cwd).map_err(|e| format!("cat: {e}"))?;

    match parsed.path_kind {
        PathKind::MessageFile => {
            let id = parsed.conversation_id.as_deref().ok_or("cat: missing conversation id")?;
            let tree = ctx
                .repository
                .load_conversation(id)
                .map_err(|e| format!("cat: {e}"))?
                .ok_or_else(|| format!("cat: Conversation not found: {id}"))?;
            let message = walk_message_path(&tree, &parsed.message_path).map_err(|e| format!("cat: {e}"))?;
            let field = parsed.file_name.as_deref().unwrap_or_default();
            Ok(match field {
                "text" => {
                    if message.content.is_empty() {
                        "[empty]".to_string()
                    } else {
                        message.content.clone()
                    }
                }
                "role" => message.role.as_str().to_string(),
                "timestamp" => message
                    .timestamp
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_default(),
                "id" => message.id.clone(),
                _ => return Err(format!("cat: unknown metadata file: {field}")),
            })
        }
        PathKind::MessageNode => {
            let id = parsed.conversation_id.as_deref().ok_or("cat: missing conversation id")?;
            let tree = ctx
                .repository
                .load_conversation(id)
                .map_err(|e| format!("cat: {e}"))?
                .ok_or_else(|| format!("cat: Conversation not found: {id}"))?;
            let message = walk_message_path(&tree, &parsed.message_path).map_err(|e| format!("cat: {e}"))?;
            Ok(format!("{}: {}", capitalize(message.role.as_str()), message.content))
        }
        PathKind::Conversation | PathKind::ConversationRoot => {
            let id = parsed.conversation_id.as_deref().ok_or("cat: missing conversation id")?;
            let tree = ctx
                .repository
                .load_conversation(id)
                .map_err(|e| format!("cat: {e}"))?
                .ok_or_else(|| format!("cat: Conversation not found: {id}"))?;
            let longest = tree.longest_path();
            Ok(render_message_sequence(&longest))
        }
        _ => Err(format!("cat: {arg}: Not a message or conversation")),
    }
}

pub struct Cat;

impl ShellCommand for Cat {
    fn name(&self) -> &'static str {
        "cat"
    }
    fn usage(&self) -> &'static str {
        "cat <path...> - print message or conversation content"
    }
    fn run(&self, ctx: &mut ShellContext, args: &[String], stdin: &str) -> CommandResult {
        if args.is_empty() {
            return if stdin.is_empty() {
                CommandResult::fail("cat: missing operand")
            } else {
                CommandResult::ok(stdin.to_string())
            };
        }

        let mut out = Vec::new();
        for arg in args {
            match read_one(ctx, arg) {
                Ok(text) => out.push(text),
                Err(e) => return CommandResult::fail(e),
            }
        }
        CommandResult::ok(format!("{}\n", out.join("\n")))
    }
}

fn parse_count(args: &[String], default: usize) -> Result<(usize, Option<&String>), String> {
    let mut n = default;
    let mut path_arg = None;
    let mut iter = args.iter();
    while let Some(a) = iter.next() {
        if let Ok(value) = a.parse::<usize>() {
            n = value;
        } else if let Some(stripped) = a.strip_prefix('-') {
            n = stripped.parse::<usize>().map_err(|_| format!("invalid count: {a}"))?;
        } else {
            path_arg = Some(a);
        }
    }
    Ok((n, path_arg))
}

fn read_source(ctx: &mut ShellContext, path_arg: Option<&String>, stdin: &str, cmd: &str) -> Result<String, String> {
    match path_arg {
        Some(p) => read_one(ctx, p).map_err(|e| e.replacen("cat:", &format!("{cmd}:"), 1)),
        None => Ok(stdin.to_string()),
    }
}

fn slice_lines(text: &str, n: usize, from_tail: bool) -> String {
    let lines: Vec<&str> = if text.is_empty() { Vec::new() } else { text.lines().collect() };
    let selected: Vec<&str> = if from_tail {
        let start = lines.len().saturating_sub(n);
        lines[start..].to_vec()
    } else {
        lines.into_iter().take(n).collect()
    };
    if selected.is_empty() {
        String::new()
    } else {
        format!("{}\n", selected.join("\n"))
    }
}

pub struct Head;

impl ShellCommand for Head {
    fn name(&self) -> &'static str {
        "head"
    }
    fn usage(&self) -> &'static str {
        "head [N] [path] - print the first N lines"
    }
    fn run(&self, ctx: &mut ShellContext, args: &[String], stdin: &str) -> CommandResult {
        let (n, path_arg) = match parse_count(args, 10) {
            Ok(v) => v,
            Err(e) => return CommandResult::fail(format!("head: {e}")),
        };
        match read_source(ctx, path_arg, stdin, "head") {
            Ok(text) => CommandResult::ok(slice_lines(&text, n, false)),
            Err(e) => CommandResult::fail(e),
        }
    }
}

pub struct Tail;

impl ShellCommand for Tail {
    fn name(&self) -> &'static str {
        "tail"
    }
    fn usage(&self) -> &'static str {
        "tail [N] [path] - print the last N lines"
    }
    fn run(&self, ctx: &mut ShellContext, args: &[String], stdin: &str) -> CommandResult {
        let (n, path_arg) = match parse_count(args, 10) {
            Ok(v) => v,
            Err(e) => return CommandResult::fail(format!("tail: {e}")),
        };
        match read_source(ctx, path_arg, stdin, "tail") {
            Ok(text) => CommandResult::ok(slice_lines(&text, n, true)),
            Err(e) => CommandResult::fail(e),
        }
    }
}

pub struct Echo;

impl ShellCommand for Echo {
    fn name(&self) -> &'static str {
        "echo"
    }
    fn usage(&self) -> &'static str {
        "echo <args...> - print arguments"
    }
    fn run(&self, _ctx: &mut ShellContext, args: &[String], _stdin: &str) -> CommandResult {
        CommandResult::ok(format!("{}\n", args.join(" ")))
    }
}

pub struct Grep;

impl ShellCommand for Grep {
    fn name(&self) -> &'static str {
        "grep"
    }
    fn usage(&self) -> &'static str {
        "grep [-i] [-n] <pattern> [path] - filter lines matching a pattern"
    }
    fn run(&self, ctx: &mut ShellContext, args: &[String], stdin: &str) -> CommandResult {
        let mut case_insensitive = false;
        let mut show_line_numbers = false;
        let mut positional: Vec<&String> = Vec::new();

        for a in args {
            match a.as_str() {
                "-i" => case_insensitive = true,
                "-n" => show_line_numbers = true,
                _ => positional.push(a),
            }
        }

        let Some(pattern) = positional.first() else {
            return CommandResult::fail("grep: missing pattern");
        };
        let path_arg = positional.get(1).copied();

        let regex = match RegexBuilder::new(pattern).case_insensitive(case_insensitive).build() {
            Ok(r) => r,
            Err(e) => return CommandResult::fail(format!("grep: invalid pattern: {e}")),
        };

        let source = match read_source(ctx, path_arg, stdin, "grep") {
            Ok(text) => text,
            Err(e) => return CommandResult::fail(e),
        };

        let mut out = Vec::new();
        for (i, line) in source.lines().enumerate() {
            if regex.is_match(line) {
                if show_line_numbers {
                    out.push(format!("{}:{}", i + 1, line));
                } else {
                    out.push(line.to_string());
                }
            }
        }

        if out.is_empty() {
            CommandResult::ok_empty()
        } else {
            CommandResult::ok(format!("{}\n", out.join("\n")))
        }
    }
}

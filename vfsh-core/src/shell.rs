//! Variable expansion, pipeline splitting, and tokenization for command
//! lines. Pure and side-effect free; the dispatcher owns execution.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::env::Environment;

static VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)").expect("static regex is valid"));

/// The closed vocabulary of recognized shell commands, used only as a
/// soft hint by callers choosing between "this looks like a shell
/// command" and "this looks like chat input".
pub const SHELL_COMMANDS: &[&str] = &[
    "cd", "ls", "pwd", "cat", "head", "tail", "echo", "grep", "find", "tree", "paths", "star",
    "unstar", "pin", "unpin", "archive", "unarchive", "title", "ln", "cp", "mv", "rm", "mkdir",
    "help", "exit", "quit",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub name: String,
    pub args: Vec<String>,
    pub raw_line: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPipeline {
    pub commands: Vec<ParsedCommand>,
    pub has_pipe: bool,
}

/// Replace `$VAR` / `${VAR}` with their value from `env`. Unknown
/// variables are left unexpanded.
pub fn expand(text: &str, env: &Environment) -> String {
    VAR_PATTERN
        .replace_all(text, |caps: &regex::Captures| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            match env.get(name) {
                Some(value) => value.to_string(),
                None => caps.get(0).map(|m| m.as_str().to_string()).unwrap_or_default(),
            }
        })
        .into_owned()
}

/// Split a command line into pipeline stages on top-level `|`, honoring
/// single and double quotes (a `|` inside either quote kind is literal).
pub fn split_pipeline(line: &str) -> Vec<String> {
    let mut stages = Vec::new();
    let mut current = String::new();
    let mut in_single = false;
    let mut in_double = false;

    for ch in line.chars() {
        match ch {
            '\'' if !in_double => {
                in_single = !in_single;
                current.push(ch);
            }
            '"' if !in_single => {
                in_double = !in_double;
                current.push(ch);
            }
            '|' if !in_single && !in_double => {
                stages.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    stages.push(current.trim().to_string());
    stages.into_iter().filter(|s| !s.is_empty()).collect()
}

/// Tokenize one pipeline stage into a command name and its arguments,
/// honoring quotes. Degrades to a plain whitespace split on unterminated
/// quotes rather than failing the whole command line.
pub fn tokenize(segment: &str) -> ParsedCommand {
    let tokens = shell_words::split(segment)
        .unwrap_or_else(|_| segment.split_whitespace().map(str::to_string).collect());

    let mut iter = tokens.into_iter();
    let name = iter.next().unwrap_or_default();
    let args: Vec<String> = iter.collect();

    ParsedCommand {
        name,
        args,
        raw_line: segment.to_string(),
    }
}

/// Expand variables, split on pipes, then tokenize each stage.
pub fn parse(line: &str, env: &Environment) -> ParsedPipeline {
    let expanded = expand(line, env);
    let stages = split_pipeline(&expanded);
    let has_pipe = stages.len() > 1;
    ParsedPipeline {
        commands: stages.iter().map(|s| tokenize(s)).collect(),
        has_pipe,
    }
}

/// Soft hint: does `line`'s first token name a recognized shell command?
pub fn is_shell_command(line: &str) -> bool {
    line.split_whitespace()
        .next()
        .map(|first| SHELL_COMMANDS.contains(&first.to_lowercase().as_str()))
        .unwrap_or(false)
}

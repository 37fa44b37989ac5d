//! Path parsing and normalization for the conversation virtual filesystem.
//!
//! This module is pure: no I/O, no knowledge of any particular repository
//! or navigator. It only knows path syntax.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{CoreError, CoreResult};

static CONVERSATION_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[a-f0-9_-]{5,100}$").expect("static regex is valid"));
static MESSAGE_NODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^m(\d+)$").expect("static regex is valid"));

pub const METADATA_FILES: [&str; 4] = ["text", "role", "timestamp", "id"];

/// The family a path belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKind {
    Root,
    Chats,
    Starred,
    Pinned,
    Archived,
    Tags,
    TagDir,
    Recent,
    Source,
    Model,
    Views,
    ViewDir,
    /// `/chats/<id>` without a trailing slash: a non-directory reference.
    Conversation,
    /// `/chats/<id>/`: the conversation as a directory.
    ConversationRoot,
    MessageNode,
    MessageFile,
}

impl PathKind {
    pub fn is_directory(&self) -> bool {
        !matches!(self, PathKind::Conversation | PathKind::MessageFile)
    }

    /// Parents where prefix-miss/ambiguity must surface as a hard error
    /// rather than falling back to literal-path handling (see
    /// `VFSNavigator::resolve_prefix` callers).
    pub fn is_id_only_listing(&self) -> bool {
        matches!(
            self,
            PathKind::Chats | PathKind::Starred | PathKind::Pinned | PathKind::Archived
        )
    }
}

/// A fully parsed and classified VFS path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VFSPath {
    pub raw_path: String,
    pub normalized_path: String,
    pub segments: Vec<String>,
    pub path_kind: PathKind,
    pub conversation_id: Option<String>,
    pub tag_path: Option<String>,
    pub view_name: Option<String>,
    /// Ordered `m<N>` coordinate, already stripped of its leading `m`.
    pub message_path: Vec<u32>,
    pub file_name: Option<String>,
    pub is_directory: bool,
}

pub fn is_valid_conversation_id(segment: &str) -> bool {
    CONVERSATION_ID_RE.is_match(segment)
}

pub fn is_message_node(segment: &str) -> Option<u32> {
    MESSAGE_NODE_RE
        .captures(segment)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
}

/// Fold `.` / `..` / duplicate separators into a canonical absolute path.
pub fn normalize_path(raw: &str, cwd: &str) -> String {
    let base: Vec<&str> = if raw.starts_with('/') {
        Vec::new()
    } else {
        cwd.split('/').filter(|s| !s.is_empty()).collect()
    };
    let mut stack: Vec<&str> = base;
    for seg in raw.split('/').filter(|s| !s.is_empty()) {
        match seg {
            "." => {}
            ".." => {
                stack.pop();
            }
            other => stack.push(other),
        }
    }
    if stack.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", stack.join("/"))
    }
}

fn split_segments(normalized: &str) -> Vec<String> {
    normalized
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Parse `raw` (absolute or relative to `cwd`) into a classified [`VFSPath`].
pub fn parse(raw: &str, cwd: &str) -> CoreResult<VFSPath> {
    let normalized = normalize_path(raw, cwd);
    let segments = split_segments(&normalized);

    if segments.is_empty() {
        return Ok(VFSPath {
            raw_path: raw.to_string(),
            normalized_path: normalized,
            segments,
            path_kind: PathKind::Root,
            conversation_id: None,
            tag_path: None,
            view_name: None,
            message_path: Vec::new(),
            file_name: None,
            is_directory: true,
        });
    }

    let root = segments[0].as_str();
    let trailing_slash = raw.ends_with('/');

    match root {
        "chats" | "starred" | "pinned" | "archived" => {
            parse_conversation_family(root, &normalized, segments, trailing_slash)
        }
        "tags" => parse_tags(&normalized, segments),
        "recent" => parse_recent(&normalized, segments),
        "source" => parse_scoped_list("source", PathKind::Source, &normalized, segments),
        "model" => parse_scoped_list("model", PathKind::Model, &normalized, segments),
        "views" => parse_views(&normalized, segments),
        other => Err(CoreError::PathSyntax(format!(
            "unknown filesystem root: /{other}"
        ))),
    }
}

fn family_kind(root: &str) -> PathKind {
    match root {
        "chats" => PathKind::Chats,
        "starred" => PathKind::Starred,
        "pinned" => PathKind::Pinned,
        "archived" => PathKind::Archived,
        _ => unreachable!("family_kind called with non-family root"),
    }
}

fn parse_conversation_family(
    root: &str,
    normalized: &str,
    segments: Vec<String>,
    trailing_slash: bool,
) -> CoreResult<VFSPath> {
    if segments.len() == 1 {
        return Ok(VFSPath {
            raw_path: normalized.to_string(),
            normalized_path: normalized.to_string(),
            segments,
            path_kind: family_kind(root),
            conversation_id: None,
            tag_path: None,
            view_name: None,
            message_path: Vec::new(),
            file_name: None,
            is_directory: true,
        });
    }

    let id_seg = &segments[1];
    if !is_valid_conversation_id(id_seg) {
        return Err(CoreError::PathSyntax(format!(
            "invalid conversation id: {id_seg}"
        )));
    }
    let conv_id = id_seg.clone();
    let rest = &segments[2..];

    if rest.is_empty() {
        let kind = if root == "chats" {
            if trailing_slash {
                PathKind::ConversationRoot
            } else {
                PathKind::Conversation
            }
        } else {
            // starred/pinned/archived always present the conversation as
            // a directory, even without a trailing slash in the input.
            PathKind::ConversationRoot
        };
        return Ok(VFSPath {
            raw_path: normalized.to_string(),
            normalized_path: normalized.to_string(),
            segments,
            path_kind: kind,
            conversation_id: Some(conv_id),
            tag_path: None,
            view_name: None,
            message_path: Vec::new(),
            file_name: None,
            is_directory: kind.is_directory(),
        });
    }

    parse_message_tail(normalized, segments, conv_id, rest)
}

/// Parse the segments that follow a conversation id: either a chain of
/// `m<N>` coordinates ending optionally in a metadata file name, or a
/// syntax error.
fn parse_message_tail(
    normalized: &str,
    segments: Vec<String>,
    conv_id: String,
    rest: &[String],
) -> CoreResult<VFSPath> {
    let mut coords = Vec::new();
    let mut file_name = None;

    for (i, seg) in rest.iter().enumerate() {
        if let Some(n) = is_message_node(seg) {
            coords.push(n);
            continue;
        }
        if i == rest.len() - 1 && METADATA_FILES.contains(&seg.as_str()) {
            file_name = Some(seg.clone());
            continue;
        }
        return Err(CoreError::PathSyntax(format!(
            "Invalid message node: {seg}"
        )));
    }

    let kind = if file_name.is_some() {
        PathKind::MessageFile
    } else {
        PathKind::MessageNode
    };

    Ok(VFSPath {
        raw_path: normalized.to_string(),
        normalized_path: normalized.to_string(),
        segments,
        path_kind: kind,
        conversation_id: Some(conv_id),
        tag_path: None,
        view_name: None,
        message_path: coords,
        file_name,
        is_directory: kind.is_directory(),
    })
}

fn parse_tags(normalized: &str, segments: Vec<String>) -> CoreResult<VFSPath> {
    if segments.len() == 1 {
        return Ok(VFSPath {
            raw_path: normalized.to_string(),
            normalized_path: normalized.to_string(),
            segments,
            path_kind: PathKind::Tags,
            conversation_id: None,
            tag_path: None,
            view_name: None,
            message_path: Vec::new(),
            file_name: None,
            is_directory: true,
        });
    }

    // Walk the tag segments until one looks like a conversation id; that
    // segment and everything after it belongs to the conversation portion.
    let tag_segments = &segments[1..];
    let split_at = tag_segments
        .iter()
        .position(|s| is_valid_conversation_id(s));

    match split_at {
        None => {
            let tag_path = tag_segments.join("/");
            Ok(VFSPath {
                raw_path: normalized.to_string(),
                normalized_path: normalized.to_string(),
                segments,
                path_kind: PathKind::TagDir,
                conversation_id: None,
                tag_path: Some(tag_path),
                view_name: None,
                message_path: Vec::new(),
                file_name: None,
                is_directory: true,
            })
        }
        Some(idx) => {
            let tag_path = tag_segments[..idx].join("/");
            let conv_id = tag_segments[idx].clone();
            let rest = &tag_segments[idx + 1..];
            let mut path = if rest.is_empty() {
                VFSPath {
                    raw_path: normalized.to_string(),
                    normalized_path: normalized.to_string(),
                    segments: segments.clone(),
                    path_kind: PathKind::ConversationRoot,
                    conversation_id: Some(conv_id),
                    tag_path: Some(tag_path.clone()),
                    view_name: None,
                    message_path: Vec::new(),
                    file_name: None,
                    is_directory: true,
                }
            } else {
                parse_message_tail(normalized, segments.clone(), conv_id, rest)?
            };
            path.tag_path = Some(tag_path);
            Ok(path)
        }
    }
}

pub const RECENT_PERIODS: [&str; 4] = ["today", "this-week", "this-month", "older"];

fn parse_recent(normalized: &str, segments: Vec<String>) -> CoreResult<VFSPath> {
    if segments.len() == 1 {
        return Ok(VFSPath {
            raw_path: normalized.to_string(),
            normalized_path: normalized.to_string(),
            segments,
            path_kind: PathKind::Recent,
            conversation_id: None,
            tag_path: None,
            view_name: None,
            message_path: Vec::new(),
            file_name: None,
            is_directory: true,
        });
    }

    let period = &segments[1];
    if !RECENT_PERIODS.contains(&period.as_str()) {
        return Err(CoreError::PathSyntax(format!(
            "unknown recency period: {period}"
        )));
    }

    if segments.len() == 2 {
        return Ok(VFSPath {
            raw_path: normalized.to_string(),
            normalized_path: normalized.to_string(),
            segments,
            path_kind: PathKind::Recent,
            conversation_id: None,
            tag_path: Some(period.clone()),
            view_name: None,
            message_path: Vec::new(),
            file_name: None,
            is_directory: true,
        });
    }

    let conv_id = segments[2].clone();
    if !is_valid_conversation_id(&conv_id) {
        return Err(CoreError::PathSyntax(format!(
            "invalid conversation id: {conv_id}"
        )));
    }
    let rest = &segments[3..];
    if rest.is_empty() {
        Ok(VFSPath {
            raw_path: normalized.to_string(),
            normalized_path: normalized.to_string(),
            segments,
            path_kind: PathKind::ConversationRoot,
            conversation_id: Some(conv_id),
            tag_path: Some(period.clone()),
            view_name: None,
            message_path: Vec::new(),
            file_name: None,
            is_directory: true,
        })
    } else {
        parse_message_tail(normalized, segments, conv_id, rest)
    }
}

fn parse_scoped_list(
    _name: &str,
    kind: PathKind,
    normalized: &str,
    segments: Vec<String>,
) -> CoreResult<VFSPath> {
    if segments.len() == 1 {
        return Ok(VFSPath {
            raw_path: normalized.to_string(),
            normalized_path: normalized.to_string(),
            segments,
            path_kind: kind,
            conversation_id: None,
            tag_path: None,
            view_name: None,
            message_path: Vec::new(),
            file_name: None,
            is_directory: true,
        });
    }

    let scope_value = segments[1].clone();
    if segments.len() == 2 {
        return Ok(VFSPath {
            raw_path: normalized.to_string(),
            normalized_path: normalized.to_string(),
            segments,
            path_kind: kind,
            conversation_id: None,
            tag_path: Some(scope_value),
            view_name: None,
            message_path: Vec::new(),
            file_name: None,
            is_directory: true,
        });
    }

    let conv_id = segments[2].clone();
    if !is_valid_conversation_id(&conv_id) {
        return Err(CoreError::PathSyntax(format!(
            "invalid conversation id: {conv_id}"
        )));
    }
    let rest = &segments[3..];
    if rest.is_empty() {
        Ok(VFSPath {
            raw_path: normalized.to_string(),
            normalized_path: normalized.to_string(),
            segments,
            path_kind: PathKind::ConversationRoot,
            conversation_id: Some(conv_id),
            tag_path: Some(scope_value),
            view_name: None,
            message_path: Vec::new(),
            file_name: None,
            is_directory: true,
        })
    } else {
        parse_message_tail(normalized, segments, conv_id, rest)
    }
}

fn parse_views(normalized: &str, segments: Vec<String>) -> CoreResult<VFSPath> {
    if segments.len() == 1 {
        return Ok(VFSPath {
            raw_path: normalized.to_string(),
            normalized_path: normalized.to_string(),
            segments,
            path_kind: PathKind::Views,
            conversation_id: None,
            tag_path: None,
            view_name: None,
            message_path: Vec::new(),
            file_name: None,
            is_directory: true,
        });
    }

    let view_name = segments[1].clone();
    if segments.len() == 2 {
        return Ok(VFSPath {
            raw_path: normalized.to_string(),
            normalized_path: normalized.to_string(),
            segments,
            path_kind: PathKind::ViewDir,
            conversation_id: None,
            tag_path: None,
            view_name: Some(view_name),
            message_path: Vec::new(),
            file_name: None,
            is_directory: true,
        });
    }

    let conv_id = segments[2].clone();
    if !is_valid_conversation_id(&conv_id) {
        return Err(CoreError::PathSyntax(format!(
            "invalid conversation id: {conv_id}"
        )));
    }
    let rest = &segments[3..];
    if rest.is_empty() {
        Ok(VFSPath {
            raw_path: normalized.to_string(),
            normalized_path: normalized.to_string(),
            segments,
            path_kind: PathKind::ConversationRoot,
            conversation_id: Some(conv_id),
            tag_path: None,
            view_name: Some(view_name),
            message_path: Vec::new(),
            file_name: None,
            is_directory: true,
        })
    } else {
        let mut path = parse_message_tail(normalized, segments, conv_id, rest)?;
        path.view_name = Some(view_name);
        Ok(path)
    }
}

/// Mark `raw` as referring to a directory regardless of whether the
/// caller's string happens to carry a trailing slash. The current working
/// directory is always a directory by construction (you can only `cd`
/// into one), but [`normalize_path`] strips trailing slashes, so a
/// command that implicitly targets "here" (no explicit path argument)
/// must not hand the bare `cwd` string back to [`parse`] — for the
/// `/chats/<id>` family a missing trailing slash means the non-directory
/// `Conversation` reference rather than `ConversationRoot`.
pub fn as_directory(raw: &str) -> String {
    if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    }
}

/// A path is mutable (can accept `ln`/`mkdir`) only under the tag family.
pub fn is_read_only(path: &VFSPath) -> bool {
    !matches!(path.path_kind, PathKind::TagDir | PathKind::Tags)
}

/// A path can be the target of `rm` either as a hard conversation delete
/// or as a tag-membership removal.
pub fn can_delete(path: &VFSPath) -> bool {
    match path.path_kind {
        PathKind::Conversation | PathKind::ConversationRoot => {
            path.segments.first().map(String::as_str) == Some("chats")
        }
        PathKind::TagDir => path.conversation_id.is_some(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_dot_segments() {
        assert_eq!(normalize_path("/chats/abc/../def", "/"), "/chats/def");
        assert_eq!(normalize_path("./foo", "/chats"), "/chats/foo");
        assert_eq!(normalize_path("..", "/chats/abc"), "/chats");
        assert_eq!(normalize_path("..", "/"), "/");
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize_path("/chats/../tags//physics/", "/");
        let twice = normalize_path(&once, "/");
        assert_eq!(once, twice);
    }

    #[test]
    fn classifies_conversation_root_vs_reference() {
        let dir = parse("/chats/abc12345/", "/").expect("parses");
        assert_eq!(dir.path_kind, PathKind::ConversationRoot);
        assert!(dir.is_directory);

        let reference = parse("/chats/abc12345", "/").expect("parses");
        assert_eq!(reference.path_kind, PathKind::Conversation);
        assert!(!reference.is_directory);
    }

    #[test]
    fn classifies_message_node_and_file() {
        let node = parse("/chats/abc12345/m1/m2", "/").expect("parses");
        assert_eq!(node.path_kind, PathKind::MessageNode);
        assert_eq!(node.message_path, vec![1, 2]);

        let file = parse("/chats/abc12345/m1/text", "/").expect("parses");
        assert_eq!(file.path_kind, PathKind::MessageFile);
        assert_eq!(file.file_name.as_deref(), Some("text"));
    }

    #[test]
    fn rejects_bad_message_node() {
        let err = parse("/chats/abc12345/bogus", "/").unwrap_err();
        assert!(matches!(err, CoreError::PathSyntax(_)));
    }

    #[test]
    fn rejects_unknown_root() {
        let err = parse("/nope", "/").unwrap_err();
        assert!(matches!(err, CoreError::PathSyntax(_)));
    }

    #[test]
    fn tag_dir_without_conversation() {
        let p = parse("/tags/physics/simulator", "/").expect("parses");
        assert_eq!(p.path_kind, PathKind::TagDir);
        assert_eq!(p.tag_path.as_deref(), Some("physics/simulator"));
    }

    #[test]
    fn read_only_and_delete_rules() {
        let tag_dir = parse("/tags/physics", "/").expect("parses");
        assert!(!is_read_only(&tag_dir));

        let chats_root = parse("/chats", "/").expect("parses");
        assert!(is_read_only(&chats_root));

        let conv = parse("/chats/abc12345/", "/").expect("parses");
        assert!(can_delete(&conv));
    }
}

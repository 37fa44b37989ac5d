//! Deterministic demo data for the `--seed demo` binary flag and for
//! tests that want a slightly richer tree than a single three-message
//! fixture. Nothing here is used by the library at runtime unless a
//! caller explicitly asks for it.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::model::{ConversationMetadata, ConversationTree, Message, Role};
use crate::repository::InMemoryRepository;

fn ts(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .expect("fixture timestamp is valid RFC 3339")
        .with_timezone(&Utc)
}

fn message(id: &str, role: Role, content: &str, parent: Option<&str>, at: &str) -> Message {
    Message {
        id: id.to_string(),
        role,
        content: content.to_string(),
        timestamp: Some(ts(at)),
        parent_id: parent.map(str::to_string),
    }
}

/// A branching conversation: one user turn, two assistant replies, one of
/// which is followed up with a second user turn and a third reply. Covers
/// a tree deep enough to exercise `tree`/`paths`/`find` with more than a
/// single root-to-leaf path.
fn branching_conversation() -> ConversationTree {
    let mut messages = IndexMap::new();
    for m in [
        message(
            "msg-root",
            Role::User,
            "What's a good way to learn Rust ownership?",
            None,
            "2026-01-05T09:00:00Z",
        ),
        message(
            "msg-reply-a",
            Role::Assistant,
            "Start by writing a small linked list and letting the borrow checker fight you.",
            Some("msg-root"),
            "2026-01-05T09:00:05Z",
        ),
        message(
            "msg-reply-b",
            Role::Assistant,
            "Read the ownership chapter of the book twice, then build something real.",
            Some("msg-root"),
            "2026-01-05T09:00:06Z",
        ),
        message(
            "msg-followup",
            Role::User,
            "Which real project would you suggest first?",
            Some("msg-reply-a"),
            "2026-01-05T09:05:00Z",
        ),
        message(
            "msg-reply-c",
            Role::Assistant,
            "A small grep clone. It touches strings, iterators, and error handling without any async.",
            Some("msg-followup"),
            "2026-01-05T09:05:12Z",
        ),
    ] {
        messages.insert(m.id.clone(), m);
    }

    ConversationTree {
        id: "deadbeef-01".to_string(),
        title: Some("Learning Rust ownership".to_string()),
        metadata: ConversationMetadata {
            source: Some("cli".to_string()),
            model: Some("claude-3-5-sonnet".to_string()),
            project: Some("learning".to_string()),
            tags: vec!["rust".to_string(), "rust/ownership".to_string()],
        },
        created_at: ts("2026-01-05T09:00:00Z"),
        updated_at: ts("2026-01-05T09:05:12Z"),
        messages,
        root_message_ids: vec!["msg-root".to_string()],
    }
}

fn linear_conversation() -> ConversationTree {
    let mut messages = IndexMap::new();
    for m in [
        message(
            "msg-lin-root",
            Role::User,
            "Summarize the VFS path grammar in one paragraph.",
            None,
            "2026-01-10T14:00:00Z",
        ),
        message(
            "msg-lin-reply",
            Role::Assistant,
            "A path is a root family, optionally an id, optionally a chain of m<N> coordinates, optionally a metadata file name.",
            Some("msg-lin-root"),
            "2026-01-10T14:00:04Z",
        ),
    ] {
        messages.insert(m.id.clone(), m);
    }

    ConversationTree {
        id: "facade00-02".to_string(),
        title: Some("VFS grammar recap".to_string()),
        metadata: ConversationMetadata {
            source: Some("web".to_string()),
            model: Some("claude-3-opus".to_string()),
            project: Some("vfsh".to_string()),
            tags: vec!["docs".to_string()],
        },
        created_at: ts("2026-01-10T14:00:00Z"),
        updated_at: ts("2026-01-10T14:00:04Z"),
        messages,
        root_message_ids: vec!["msg-lin-root".to_string()],
    }
}

/// Build an [`InMemoryRepository`] seeded with a small, deterministic set
/// of conversations (one branching, one linear, one archived), with the
/// branching one starred. Used by the `vfsh --seed demo` binary flag and
/// by tests that want data richer than a three-message tree.
pub fn seeded_repository() -> InMemoryRepository {
    let mut repo = InMemoryRepository::new();
    repo.insert(branching_conversation());
    repo.insert(linear_conversation());

    let mut archived = linear_conversation();
    archived.id = "deadc0de-99".to_string();
    archived.title = Some("Q4 retro notes (archived)".to_string());
    archived.metadata.tags = vec!["retro".to_string()];
    repo.insert(archived.clone());

    repo.star("deadbeef-01", true).expect("seed conversation exists");
    repo.archive("deadc0de-99", true).expect("seed conversation exists");

    repo
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{ConversationFilter, Repository};

    #[test]
    fn seeded_repository_has_expected_shape() {
        let repo = seeded_repository();
        let all = repo
            .list_conversations(&ConversationFilter {
                include_archived: true,
                ..Default::default()
            })
            .expect("lists");
        assert_eq!(all.len(), 3);

        let starred = repo
            .list_conversations(&ConversationFilter {
                starred: Some(true),
                ..Default::default()
            })
            .expect("lists");
        assert_eq!(starred.len(), 1);
        assert_eq!(starred[0].id, "deadbeef-01");
    }
}

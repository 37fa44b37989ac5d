use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Role of a single message within a conversation tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
            Role::Tool => "tool",
        }
    }

    pub fn from_str_lossy(s: &str) -> Option<Role> {
        match s.to_ascii_lowercase().as_str() {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            "system" => Some(Role::System),
            "tool" => Some(Role::Tool),
            _ => None,
        }
    }
}

/// A single node in a conversation tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub parent_id: Option<String>,
}

/// Metadata attached to a conversation, independent of its message tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationMetadata {
    pub source: Option<String>,
    pub model: Option<String>,
    pub project: Option<String>,
    pub tags: Vec<String>,
}

/// A lightweight, read-only snapshot used for directory listings.
///
/// Distinct from [`ConversationTree`]: a summary never carries messages,
/// only what is needed to render one entry in a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: String,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tags: Vec<String>,
    pub source: Option<String>,
    pub model: Option<String>,
    pub project: Option<String>,
    pub starred: bool,
    pub pinned: bool,
    pub archived: bool,
}

/// A full conversation: metadata plus the message forest.
///
/// Messages are keyed by id; `root_message_ids` gives the deterministic
/// order of root messages (almost always exactly one). Only `parent_id`
/// is stored on each message — children are derived on demand via
/// [`ConversationTree::children_of`] rather than carried as a second,
/// redundantly-owned list, so the structure can never become a cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTree {
    pub id: String,
    pub title: Option<String>,
    pub metadata: ConversationMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub messages: IndexMap<String, Message>,
    pub root_message_ids: Vec<String>,
}

impl ConversationTree {
    pub fn get(&self, id: &str) -> Option<&Message> {
        self.messages.get(id)
    }

    /// Children of `parent_id` in deterministic insertion order.
    pub fn children_of(&self, parent_id: &str) -> Vec<&Message> {
        self.messages
            .values()
            .filter(|m| m.parent_id.as_deref() == Some(parent_id))
            .collect()
    }

    pub fn root_messages(&self) -> Vec<&Message> {
        self.root_message_ids
            .iter()
            .filter_map(|id| self.messages.get(id))
            .collect()
    }

    /// Enumerate every root-to-leaf path through the tree.
    pub fn all_paths(&self) -> Vec<Vec<&Message>> {
        let mut paths = Vec::new();
        for root in self.root_messages() {
            self.collect_paths(root, vec![root], &mut paths);
        }
        paths
    }

    fn collect_paths<'a>(
        &'a self,
        node: &'a Message,
        prefix: Vec<&'a Message>,
        out: &mut Vec<Vec<&'a Message>>,
    ) {
        let children = self.children_of(&node.id);
        if children.is_empty() {
            out.push(prefix);
            return;
        }
        for child in children {
            let mut next = prefix.clone();
            next.push(child);
            self.collect_paths(child, next, out);
        }
    }

    /// Any one of the longest root-to-leaf paths, ties broken by
    /// encounter order.
    pub fn longest_path(&self) -> Vec<&Message> {
        self.all_paths()
            .into_iter()
            .max_by_key(|p| p.len())
            .unwrap_or_default()
    }

    pub fn summary(&self) -> ConversationSummary {
        ConversationSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            tags: self.metadata.tags.clone(),
            source: self.metadata.source.clone(),
            model: self.metadata.model.clone(),
            project: self.metadata.project.clone(),
            starred: false,
            pinned: false,
            archived: false,
        }
    }
}

/// Sort key accepted by [`crate::repository::ConversationFilter::order_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    UpdatedAt,
    CreatedAt,
    Title,
}

impl Default for OrderBy {
    fn default() -> Self {
        OrderBy::UpdatedAt
    }
}

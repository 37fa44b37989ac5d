//! Directory listings over the conversation VFS.
//!
//! The navigator dispatches on [`PathKind`], consults a [`Repository`] for
//! conversation data, and caches the resulting listing for a short TTL.
//! It never outlives a single owning call site: everything it returns is
//! owned data, not a borrow into repository storage.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use chrono::{Datelike, Duration as ChronoDuration, Utc, Weekday};
use lru::LruCache;

use crate::error::{CoreError, CoreResult};
use crate::model::{ConversationSummary, Role};
use crate::path::{self, PathKind, VFSPath};
use crate::repository::{ConversationFilter, Repository};

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(2);
/// Bounds how many distinct listings the navigator remembers at once. A
/// busy session walking many conversations should not let the cache grow
/// without limit just because the TTL hasn't expired anything yet.
const DEFAULT_CACHE_CAPACITY: usize = 256;
const PREVIEW_LEN: usize = 50;

#[derive(Debug, Clone)]
pub struct ConversationEntryInfo {
    pub title: Option<String>,
    pub updated_at: chrono::DateTime<Utc>,
    pub starred: bool,
    pub pinned: bool,
    pub archived: bool,
    pub source: Option<String>,
    pub model: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct MessageEntryInfo {
    pub message_id: String,
    pub role: Role,
    pub content_preview: String,
    pub timestamp: Option<chrono::DateTime<Utc>>,
    pub has_children: bool,
}

#[derive(Debug, Clone)]
pub struct VFSEntry {
    pub name: String,
    pub is_directory: bool,
    pub conversation: Option<ConversationEntryInfo>,
    pub message: Option<MessageEntryInfo>,
}

impl VFSEntry {
    fn directory(name: impl Into<String>) -> Self {
        VFSEntry {
            name: name.into(),
            is_directory: true,
            conversation: None,
            message: None,
        }
    }

    fn from_summary(summary: &ConversationSummary) -> Self {
        VFSEntry {
            name: summary.id.clone(),
            is_directory: true,
            conversation: Some(ConversationEntryInfo {
                title: summary.title.clone(),
                updated_at: summary.updated_at,
                starred: summary.starred,
                pinned: summary.pinned,
                archived: summary.archived,
                source: summary.source.clone(),
                model: summary.model.clone(),
                tags: summary.tags.clone(),
            }),
            message: None,
        }
    }
}

fn truncate_preview(text: &str, max: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max {
        trimmed.to_string()
    } else {
        let truncated: String = trimmed.chars().take(max).collect();
        format!("{truncated}…")
    }
}

pub struct VFSNavigator {
    cache: LruCache<String, (Instant, Vec<VFSEntry>)>,
    ttl: Duration,
}

impl Default for VFSNavigator {
    fn default() -> Self {
        Self::new()
    }
}

fn new_cache() -> LruCache<String, (Instant, Vec<VFSEntry>)> {
    let capacity = NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
    LruCache::new(capacity)
}

impl VFSNavigator {
    pub fn new() -> Self {
        VFSNavigator {
            cache: new_cache(),
            ttl: DEFAULT_CACHE_TTL,
        }
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        VFSNavigator {
            cache: new_cache(),
            ttl,
        }
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    fn cache_key(parsed: &VFSPath) -> String {
        if parsed.message_path.is_empty() {
            parsed.normalized_path.clone()
        } else {
            let coords = parsed
                .message_path
                .iter()
                .map(|n| n.to_string())
                .collect::<Vec<_>>()
                .join(",");
            format!("{}::msg::{coords}", parsed.normalized_path)
        }
    }

    pub fn list_directory(
        &mut self,
        repo: &dyn Repository,
        parsed: &VFSPath,
    ) -> CoreResult<Vec<VFSEntry>> {
        if !parsed.is_directory {
            return Err(CoreError::NotADirectory(parsed.normalized_path.clone()));
        }

        let key = Self::cache_key(parsed);
        if let Some((stamp, entries)) = self.cache.get(&key) {
            if stamp.elapsed() < self.ttl {
                return Ok(entries.clone());
            }
        }

        let entries = self.compute_listing(repo, parsed)?;
        self.cache.put(key, (Instant::now(), entries.clone()));
        Ok(entries)
    }

    fn compute_listing(
        &self,
        repo: &dyn Repository,
        parsed: &VFSPath,
    ) -> CoreResult<Vec<VFSEntry>> {
        match parsed.path_kind {
            PathKind::Root => Ok(vec![
                VFSEntry::directory("chats"),
                VFSEntry::directory("tags"),
                VFSEntry::directory("starred"),
                VFSEntry::directory("pinned"),
                VFSEntry::directory("archived"),
                VFSEntry::directory("recent"),
                VFSEntry::directory("source"),
                VFSEntry::directory("model"),
            ]),
            PathKind::Chats => self.list_flag_conversations(repo, None),
            PathKind::Starred => self.list_flag_conversations(repo, Some(true)),
            PathKind::Pinned => self.list_pinned(repo),
            PathKind::Archived => self.list_archived(repo),
            PathKind::Tags => self
                .repo_tag_children(repo, None)
                .map(|names| names.into_iter().map(VFSEntry::directory).collect()),
            PathKind::TagDir => self.list_tag_dir(repo, parsed),
            PathKind::Recent => self.list_recent(repo, parsed),
            PathKind::Source => self.list_scoped(repo, parsed, true),
            PathKind::Model => self.list_scoped(repo, parsed, false),
            PathKind::Views | PathKind::ViewDir => Ok(Vec::new()),
            PathKind::ConversationRoot => self.list_conversation_root(repo, parsed),
            PathKind::MessageNode => self.list_message_node(repo, parsed),
            PathKind::Conversation | PathKind::MessageFile => {
                Err(CoreError::NotADirectory(parsed.normalized_path.clone()))
            }
        }
    }

    fn list_flag_conversations(
        &self,
        repo: &dyn Repository,
        starred: Option<bool>,
    ) -> CoreResult<Vec<VFSEntry>> {
        let filter = ConversationFilter {
            starred,
            ..Default::default()
        };
        Ok(repo
            .list_conversations(&filter)?
            .iter()
            .map(VFSEntry::from_summary)
            .collect())
    }

    fn list_pinned(&self, repo: &dyn Repository) -> CoreResult<Vec<VFSEntry>> {
        let filter = ConversationFilter {
            pinned: Some(true),
            ..Default::default()
        };
        Ok(repo
            .list_conversations(&filter)?
            .iter()
            .map(VFSEntry::from_summary)
            .collect())
    }

    fn list_archived(&self, repo: &dyn Repository) -> CoreResult<Vec<VFSEntry>> {
        let filter = ConversationFilter {
            archived: Some(true),
            include_archived: true,
            ..Default::default()
        };
        Ok(repo
            .list_conversations(&filter)?
            .iter()
            .map(VFSEntry::from_summary)
            .collect())
    }

    fn repo_tag_children(&self, repo: &dyn Repository, parent: Option<&str>) -> CoreResult<Vec<String>> {
        repo.list_tag_children(parent)
    }

    fn list_tag_dir(&self, repo: &dyn Repository, parsed: &VFSPath) -> CoreResult<Vec<VFSEntry>> {
        let tag_path = parsed
            .tag_path
            .as_deref()
            .ok_or_else(|| CoreError::Other("tag directory missing tag_path".to_string()))?;

        let mut entries: Vec<VFSEntry> = self
            .repo_tag_children(repo, Some(tag_path))?
            .into_iter()
            .map(VFSEntry::directory)
            .collect();

        entries.extend(
            repo.list_conversations_by_tag(tag_path)?
                .iter()
                .map(VFSEntry::from_summary),
        );
        Ok(entries)
    }

    fn list_recent(&self, repo: &dyn Repository, parsed: &VFSPath) -> CoreResult<Vec<VFSEntry>> {
        let Some(period) = parsed.tag_path.as_deref() else {
            return Ok(path::RECENT_PERIODS
                .iter()
                .map(|p| VFSEntry::directory(*p))
                .collect());
        };

        let now = Utc::now();
        let week_start = now.date_naive() - ChronoDuration::days(now.weekday().num_days_from_monday() as i64);
        let month_start = now.date_naive().with_day(1).unwrap_or(now.date_naive());

        let all = repo.list_conversations(&ConversationFilter::default())?;
        let filtered: Vec<_> = all
            .into_iter()
            .filter(|s| {
                let date = s.created_at.date_naive();
                match period {
                    "today" => date == now.date_naive(),
                    "this-week" => date >= week_start && date != now.date_naive(),
                    "this-month" => date >= month_start && date < week_start,
                    "older" => date < month_start,
                    _ => false,
                }
            })
            .collect();
        Ok(filtered.iter().map(VFSEntry::from_summary).collect())
    }

    fn list_scoped(&self, repo: &dyn Repository, parsed: &VFSPath, is_source: bool) -> CoreResult<Vec<VFSEntry>> {
        match &parsed.tag_path {
            None => {
                let values = if is_source {
                    repo.distinct_sources()?
                } else {
                    repo.distinct_models()?
                };
                Ok(values.into_iter().map(VFSEntry::directory).collect())
            }
            Some(scope) => {
                let filter = ConversationFilter {
                    source: if is_source { Some(scope.clone()) } else { None },
                    model: if is_source { None } else { Some(scope.clone()) },
                    ..Default::default()
                };
                Ok(repo
                    .list_conversations(&filter)?
                    .iter()
                    .map(VFSEntry::from_summary)
                    .collect())
            }
        }
    }

    fn list_conversation_root(&self, repo: &dyn Repository, parsed: &VFSPath) -> CoreResult<Vec<VFSEntry>> {
        let id = parsed
            .conversation_id
            .as_deref()
            .ok_or_else(|| CoreError::Other("conversation root missing id".to_string()))?;
        let tree = repo
            .load_conversation(id)?
            .ok_or_else(|| CoreError::NotFound(format!("Conversation not found: {id}")))?;

        Ok(tree
            .root_message_ids
            .iter()
            .enumerate()
            .filter_map(|(i, mid)| tree.get(mid).map(|m| (i, m)))
            .map(|(i, m)| {
                let has_children = !tree.children_of(&m.id).is_empty();
                VFSEntry {
                    name: format!("m{}", i + 1),
                    is_directory: true,
                    conversation: None,
                    message: Some(MessageEntryInfo {
                        message_id: m.id.clone(),
                        role: m.role,
                        content_preview: truncate_preview(&m.content, PREVIEW_LEN),
                        timestamp: m.timestamp,
                        has_children,
                    }),
                }
            })
            .collect())
    }

    fn list_message_node(&self, repo: &dyn Repository, parsed: &VFSPath) -> CoreResult<Vec<VFSEntry>> {
        let id = parsed
            .conversation_id
            .as_deref()
            .ok_or_else(|| CoreError::Other("message node missing conversation id".to_string()))?;
        let tree = repo
            .load_conversation(id)?
            .ok_or_else(|| CoreError::NotFound(format!("Conversation not found: {id}")))?;

        let current = walk_message_path(&tree, &parsed.message_path)?;

        let mut entries: Vec<VFSEntry> = path::METADATA_FILES
            .iter()
            .map(|name| VFSEntry {
                name: (*name).to_string(),
                is_directory: false,
                conversation: None,
                message: Some(MessageEntryInfo {
                    message_id: current.id.clone(),
                    role: current.role,
                    content_preview: truncate_preview(&current.content, PREVIEW_LEN),
                    timestamp: current.timestamp,
                    has_children: false,
                }),
            })
            .collect();

        for (i, child) in tree.children_of(&current.id).into_iter().enumerate() {
            let has_children = !tree.children_of(&child.id).is_empty();
            entries.push(VFSEntry {
                name: format!("m{}", i + 1),
                is_directory: true,
                conversation: None,
                message: Some(MessageEntryInfo {
                    message_id: child.id.clone(),
                    role: child.role,
                    content_preview: truncate_preview(&child.content, PREVIEW_LEN),
                    timestamp: child.timestamp,
                    has_children,
                }),
            });
        }

        Ok(entries)
    }

    /// Resolve a short identifier prefix against a listing context. Only
    /// attempted for prefixes of 3+ characters; the caller decides whether
    /// a miss/ambiguity is a hard error (see [`PathKind::is_id_only_listing`]).
    pub fn resolve_prefix(
        &mut self,
        repo: &dyn Repository,
        prefix: &str,
        parent: &VFSPath,
    ) -> CoreResult<Option<String>> {
        if prefix.len() < 3 {
            return Ok(None);
        }
        let entries = self.list_directory(repo, parent)?;
        let lowered = prefix.to_lowercase();
        let matches: Vec<&str> = entries
            .iter()
            .filter(|e| e.is_directory && e.name.to_lowercase().starts_with(&lowered))
            .map(|e| e.name.as_str())
            .collect();

        match matches.len() {
            0 => Err(CoreError::NotFound(format!(
                "No conversation found matching prefix '{prefix}'"
            ))),
            1 => Ok(Some(matches[0].to_string())),
            _ => {
                let sample: Vec<&str> = matches.iter().take(5).copied().collect();
                Err(CoreError::Ambiguous(format!(
                    "Ambiguous prefix '{prefix}', matches: {}",
                    sample.join(", ")
                )))
            }
        }
    }
}

/// Walk `message_path` (1-based positional coordinates) from a
/// conversation's roots down to the addressed message.
pub fn walk_message_path<'a>(
    tree: &'a crate::model::ConversationTree,
    message_path: &[u32],
) -> CoreResult<&'a crate::model::Message> {
    if message_path.is_empty() {
        return Err(CoreError::Other("empty message path".to_string()));
    }

    let first = message_path[0];
    let root_id = tree
        .root_message_ids
        .get(first.checked_sub(1).map(|n| n as usize).unwrap_or(usize::MAX))
        .ok_or_else(|| {
            CoreError::NotFound(format!(
                "Message node m{first} out of range (1-{})",
                tree.root_message_ids.len()
            ))
        })?;
    let mut current = tree
        .get(root_id)
        .ok_or_else(|| CoreError::Other("dangling root id".to_string()))?;

    for &coord in &message_path[1..] {
        let children = tree.children_of(&current.id);
        let idx = coord.checked_sub(1).map(|n| n as usize).unwrap_or(usize::MAX);
        current = *children.get(idx).ok_or_else(|| {
            CoreError::NotFound(format!(
                "Message node m{coord} out of range (1-{})",
                children.len()
            ))
        })?;
    }

    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConversationMetadata, ConversationTree, Message};
    use crate::repository::InMemoryRepository;
    use indexmap::IndexMap;

    fn fixture_repo() -> InMemoryRepository {
        let mut messages = IndexMap::new();
        messages.insert(
            "root".to_string(),
            Message {
                id: "root".to_string(),
                role: Role::User,
                content: "Hi".to_string(),
                timestamp: None,
                parent_id: None,
            },
        );
        messages.insert(
            "c1".to_string(),
            Message {
                id: "c1".to_string(),
                role: Role::Assistant,
                content: "Hello".to_string(),
                timestamp: None,
                parent_id: Some("root".to_string()),
            },
        );
        messages.insert(
            "c2".to_string(),
            Message {
                id: "c2".to_string(),
                role: Role::Assistant,
                content: "Howdy".to_string(),
                timestamp: None,
                parent_id: Some("root".to_string()),
            },
        );
        let tree = ConversationTree {
            id: "abc12345".to_string(),
            title: Some("Greeting".to_string()),
            metadata: ConversationMetadata::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            messages,
            root_message_ids: vec!["root".to_string()],
        };
        let mut repo = InMemoryRepository::new();
        repo.insert(tree);
        repo
    }

    #[test]
    fn conversation_root_lists_single_m1() {
        let repo = fixture_repo();
        let mut nav = VFSNavigator::new();
        let parsed = path::parse("/chats/abc12345/", "/").expect("parses");
        let entries = nav.list_directory(&repo, &parsed).expect("lists");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "m1");
    }

    #[test]
    fn message_node_lists_metadata_and_children() {
        let repo = fixture_repo();
        let mut nav = VFSNavigator::new();
        let parsed = path::parse("/chats/abc12345/m1", "/").expect("parses");
        let entries = nav.list_directory(&repo, &parsed).expect("lists");
        let dirs: Vec<_> = entries.iter().filter(|e| e.is_directory).collect();
        let files: Vec<_> = entries.iter().filter(|e| !e.is_directory).collect();
        assert_eq!(dirs.len(), 2);
        assert_eq!(files.len(), 4);
    }

    #[test]
    fn out_of_range_message_index_errors() {
        let repo = fixture_repo();
        let mut nav = VFSNavigator::new();
        let parsed = path::parse("/chats/abc12345/m9", "/").expect("parses");
        let err = nav.list_directory(&repo, &parsed).unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn prefix_resolution_requires_three_chars() {
        let repo = fixture_repo();
        let mut nav = VFSNavigator::new();
        let chats = path::parse("/chats", "/").expect("parses");
        assert_eq!(nav.resolve_prefix(&repo, "ab", &chats).expect("ok"), None);
        assert_eq!(
            nav.resolve_prefix(&repo, "abc", &chats).expect("ok"),
            Some("abc12345".to_string())
        );
    }
}

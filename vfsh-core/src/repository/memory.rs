use std::collections::BTreeSet;

use chrono::Utc;
use indexmap::IndexMap;

use super::{ConversationFilter, Repository};
use crate::error::{CoreError, CoreResult};
use crate::model::{ConversationSummary, ConversationTree, OrderBy};

/// Flags tracked alongside a conversation but not part of its tree data,
/// mirroring the way a real store keeps organizational state (star/pin/
/// archive) separate from conversation content.
#[derive(Debug, Clone, Default)]
struct Flags {
    starred: bool,
    pinned: bool,
    archived: bool,
}

/// An in-process, non-persistent [`Repository`]. Built for unit tests and
/// the standalone demo REPL; not a cache in front of a real store.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    conversations: IndexMap<String, ConversationTree>,
    flags: IndexMap<String, Flags>,
    next_duplicate_suffix: u64,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tree: ConversationTree) {
        self.flags.entry(tree.id.clone()).or_default();
        self.conversations.insert(tree.id.clone(), tree);
    }

    fn summary_of(&self, tree: &ConversationTree) -> ConversationSummary {
        let flags = self.flags.get(&tree.id).cloned().unwrap_or_default();
        let mut summary = tree.summary();
        summary.starred = flags.starred;
        summary.pinned = flags.pinned;
        summary.archived = flags.archived;
        summary
    }

    fn require(&self, id: &str) -> CoreResult<&ConversationTree> {
        self.conversations
            .get(id)
            .ok_or_else(|| CoreError::NotFound(format!("Conversation not found: {id}")))
    }
}

impl Repository for InMemoryRepository {
    fn list_conversations(&self, filter: &ConversationFilter) -> CoreResult<Vec<ConversationSummary>> {
        let mut out: Vec<ConversationSummary> = self
            .conversations
            .values()
            .map(|t| self.summary_of(t))
            .filter(|s| {
                if let Some(want) = filter.starred {
                    if s.starred != want {
                        return false;
                    }
                }
                if let Some(want) = filter.pinned {
                    if s.pinned != want {
                        return false;
                    }
                }
                if let Some(want) = filter.archived {
                    if s.archived != want {
                        return false;
                    }
                } else if !filter.include_archived && s.archived {
                    return false;
                }
                if let Some(src) = &filter.source {
                    if s.source.as_deref() != Some(src.as_str()) {
                        return false;
                    }
                }
                if let Some(model) = &filter.model {
                    if s.model.as_deref() != Some(model.as_str()) {
                        return false;
                    }
                }
                if let Some(project) = &filter.project {
                    if s.project.as_deref() != Some(project.as_str()) {
                        return false;
                    }
                }
                if !filter.tags.is_empty() && !filter.tags.iter().all(|t| s.tags.contains(t)) {
                    return false;
                }
                true
            })
            .collect();

        sort_summaries(&mut out, filter.order_by);
        if let Some(limit) = filter.limit {
            out.truncate(limit);
        }
        Ok(out)
    }

    fn load_conversation(&self, id: &str) -> CoreResult<Option<ConversationTree>> {
        Ok(self.conversations.get(id).cloned())
    }

    fn save_conversation(&mut self, tree: ConversationTree) -> CoreResult<()> {
        self.insert(tree);
        Ok(())
    }

    fn list_conversations_by_tag(&self, tag_path: &str) -> CoreResult<Vec<ConversationSummary>> {
        Ok(self
            .conversations
            .values()
            .filter(|t| t.metadata.tags.iter().any(|t2| t2 == tag_path))
            .map(|t| self.summary_of(t))
            .collect())
    }

    fn list_tag_children(&self, parent_tag: Option<&str>) -> CoreResult<Vec<String>> {
        let depth = parent_tag.map(|p| p.matches('/').count() + 1).unwrap_or(0);
        let mut children = BTreeSet::new();
        for tree in self.conversations.values() {
            for tag in &tree.metadata.tags {
                let matches_parent = match parent_tag {
                    Some(p) => tag == p || tag.starts_with(&format!("{p}/")),
                    None => true,
                };
                if !matches_parent {
                    continue;
                }
                let segments: Vec<&str> = tag.split('/').collect();
                if segments.len() > depth {
                    children.insert(segments[depth].to_string());
                }
            }
        }
        Ok(children.into_iter().collect())
    }

    fn search_conversations(
        &self,
        query: &str,
        filter: &ConversationFilter,
        title_only: bool,
        content_only: bool,
        limit: Option<usize>,
    ) -> CoreResult<Vec<ConversationSummary>> {
        let needle = query.to_lowercase();
        let mut out = Vec::new();
        for tree in self.conversations.values() {
            let summary = self.summary_of(tree);
            if let Some(want) = filter.archived {
                if summary.archived != want {
                    continue;
                }
            } else if !filter.include_archived && summary.archived {
                continue;
            }

            let title_hit = !content_only
                && tree
                    .title
                    .as_deref()
                    .unwrap_or_default()
                    .to_lowercase()
                    .contains(&needle);
            let content_hit = !title_only
                && tree
                    .messages
                    .values()
                    .any(|m| m.content.to_lowercase().contains(&needle));

            if title_hit || content_hit {
                out.push(summary);
            }
        }
        sort_summaries(&mut out, filter.order_by);
        if let Some(limit) = limit {
            out.truncate(limit);
        }
        Ok(out)
    }

    fn star(&mut self, id: &str, flag: bool) -> CoreResult<()> {
        self.require(id)?;
        self.flags.entry(id.to_string()).or_default().starred = flag;
        Ok(())
    }

    fn pin(&mut self, id: &str, flag: bool) -> CoreResult<()> {
        self.require(id)?;
        self.flags.entry(id.to_string()).or_default().pinned = flag;
        Ok(())
    }

    fn archive(&mut self, id: &str, flag: bool) -> CoreResult<()> {
        self.require(id)?;
        self.flags.entry(id.to_string()).or_default().archived = flag;
        Ok(())
    }

    fn update_conversation_metadata(
        &mut self,
        id: &str,
        title: Option<&str>,
        project: Option<&str>,
    ) -> CoreResult<bool> {
        let Some(tree) = self.conversations.get_mut(id) else {
            return Ok(false);
        };
        if let Some(title) = title {
            tree.title = Some(title.to_string());
        }
        if let Some(project) = project {
            tree.metadata.project = Some(project.to_string());
        }
        tree.updated_at = Utc::now();
        Ok(true)
    }

    fn add_tags(&mut self, id: &str, tags: &[String]) -> CoreResult<bool> {
        let Some(tree) = self.conversations.get_mut(id) else {
            return Ok(false);
        };
        for tag in tags {
            if !tree.metadata.tags.contains(tag) {
                tree.metadata.tags.push(tag.clone());
            }
        }
        Ok(true)
    }

    fn remove_tag(&mut self, id: &str, tag: &str) -> CoreResult<bool> {
        let Some(tree) = self.conversations.get_mut(id) else {
            return Ok(false);
        };
        let before = tree.metadata.tags.len();
        tree.metadata.tags.retain(|t| t != tag);
        Ok(tree.metadata.tags.len() != before)
    }

    fn duplicate_conversation(&mut self, id: &str, new_title: Option<&str>) -> CoreResult<String> {
        let mut clone = self.require(id)?.clone();
        self.next_duplicate_suffix += 1;
        clone.id = format!("{id}-{:05x}", self.next_duplicate_suffix);
        if let Some(title) = new_title {
            clone.title = Some(title.to_string());
        }
        clone.created_at = Utc::now();
        clone.updated_at = clone.created_at;
        let new_id = clone.id.clone();
        self.insert(clone);
        Ok(new_id)
    }

    fn delete_conversation(&mut self, id: &str) -> CoreResult<bool> {
        self.flags.shift_remove(id);
        Ok(self.conversations.shift_remove(id).is_some())
    }

    fn distinct_sources(&self) -> CoreResult<Vec<String>> {
        let mut set: BTreeSet<String> = BTreeSet::new();
        for tree in self.conversations.values() {
            if let Some(src) = &tree.metadata.source {
                set.insert(src.clone());
            }
        }
        Ok(set.into_iter().collect())
    }

    fn distinct_models(&self) -> CoreResult<Vec<String>> {
        let mut set: BTreeSet<String> = BTreeSet::new();
        for tree in self.conversations.values() {
            if let Some(model) = &tree.metadata.model {
                set.insert(model.clone());
            }
        }
        Ok(set.into_iter().collect())
    }
}

fn sort_summaries(summaries: &mut [ConversationSummary], order_by: OrderBy) {
    match order_by {
        OrderBy::UpdatedAt => summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
        OrderBy::CreatedAt => summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        OrderBy::Title => summaries.sort_by(|a, b| a.title.cmp(&b.title)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConversationMetadata, Message, Role};

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

    #[test]
    fn star_then_list_respects_filter() {
        let mut repo = InMemoryRepository::new();
        repo.insert(fixture_tree("abc12345"));
        repo.star("abc12345", true).expect("stars");

        let filter = ConversationFilter {
            starred: Some(true),
            ..Default::default()
        };
        let results = repo.list_conversations(&filter).expect("lists");
        assert_eq!(results.len(), 1);
        assert!(results[0].starred);
    }

    #[test]
    fn archive_excluded_by_default() {
        let mut repo = InMemoryRepository::new();
        repo.insert(fixture_tree("abc12345"));
        repo.archive("abc12345", true).expect("archives");

        let results = repo
            .list_conversations(&ConversationFilter::default())
            .expect("lists");
        assert!(results.is_empty());
    }

    #[test]
    fn duplicate_gets_new_id() {
        let mut repo = InMemoryRepository::new();
        repo.insert(fixture_tree("abc12345"));
        let new_id = repo
            .duplicate_conversation("abc12345", Some("Copy"))
            .expect("duplicates");
        assert_ne!(new_id, "abc12345");
        let loaded = repo.load_conversation(&new_id).expect("loads").expect("exists");
        assert_eq!(loaded.title.as_deref(), Some("Copy"));
    }
}

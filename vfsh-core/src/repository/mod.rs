//! The storage collaborator the core consumes but does not implement.
//!
//! Everything in this module describes an interface; [`memory`] carries
//! the one concrete implementation the core ships, used by tests and the
//! demo REPL. A real deployment is expected to supply its own.

mod memory;

pub use memory::InMemoryRepository;

use crate::error::CoreResult;
use crate::model::{ConversationSummary, ConversationTree, OrderBy};

/// Filter predicate accepted by [`Repository::list_conversations`].
#[derive(Debug, Clone, Default)]
pub struct ConversationFilter {
    pub starred: Option<bool>,
    pub pinned: Option<bool>,
    pub archived: Option<bool>,
    pub include_archived: bool,
    pub source: Option<String>,
    pub project: Option<String>,
    pub model: Option<String>,
    pub tags: Vec<String>,
    pub limit: Option<usize>,
    pub order_by: OrderBy,
}

/// The storage surface the core requires. An in-memory reference
/// implementation lives in [`InMemoryRepository`]; any other conforming
/// store (sqlite-backed, remote, ...) can replace it without the core
/// changing.
pub trait Repository {
    fn list_conversations(&self, filter: &ConversationFilter) -> CoreResult<Vec<ConversationSummary>>;
    fn load_conversation(&self, id: &str) -> CoreResult<Option<ConversationTree>>;
    fn save_conversation(&mut self, tree: ConversationTree) -> CoreResult<()>;

    fn list_conversations_by_tag(&self, tag_path: &str) -> CoreResult<Vec<ConversationSummary>>;
    fn list_tag_children(&self, parent_tag: Option<&str>) -> CoreResult<Vec<String>>;

    fn search_conversations(
        &self,
        query: &str,
        filter: &ConversationFilter,
        title_only: bool,
        content_only: bool,
        limit: Option<usize>,
    ) -> CoreResult<Vec<ConversationSummary>>;

    fn star(&mut self, id: &str, flag: bool) -> CoreResult<()>;
    fn pin(&mut self, id: &str, flag: bool) -> CoreResult<()>;
    fn archive(&mut self, id: &str, flag: bool) -> CoreResult<()>;

    fn update_conversation_metadata(
        &mut self,
        id: &str,
        title: Option<&str>,
        project: Option<&str>,
    ) -> CoreResult<bool>;

    fn add_tags(&mut self, id: &str, tags: &[String]) -> CoreResult<bool>;
    fn remove_tag(&mut self, id: &str, tag: &str) -> CoreResult<bool>;

    fn duplicate_conversation(&mut self, id: &str, new_title: Option<&str>) -> CoreResult<String>;
    fn delete_conversation(&mut self, id: &str) -> CoreResult<bool>;

    /// Distinct values seen across all conversations for `/source` and
    /// `/model` top-level listings.
    fn distinct_sources(&self) -> CoreResult<Vec<String>>;
    fn distinct_models(&self) -> CoreResult<Vec<String>>;
}

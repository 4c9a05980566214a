//! Category catalog aggregate -- the idea categories managed by admins.
//!
//! Categories can be created, edited, switched on and off, and deleted.
//! The only content rule is that a category needs a non-blank name.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::Aggregate;
use crate::command::CommandContext;
use crate::error::ExecuteError;
use crate::projection::Projection;
use crate::store::StateStore;

/// Icon given to categories created without one.
pub const DEFAULT_ICON: &str = "📌";
/// Color given to categories created without one.
pub const DEFAULT_COLOR: &str = "#6B7280";

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub Uuid);

impl CategoryId {
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An idea category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub icon: String,
    pub color: String,
    pub is_active: bool,
}

/// The editable fields of a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDraft {
    pub name: String,
    pub description: String,
    pub icon: String,
    pub color: String,
    pub is_active: bool,
}

impl Default for CategoryDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            icon: DEFAULT_ICON.to_string(),
            color: DEFAULT_COLOR.to_string(),
            is_active: true,
        }
    }
}

impl From<&Category> for CategoryDraft {
    fn from(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            description: category.description.clone().unwrap_or_default(),
            icon: category.icon.clone(),
            color: category.color.clone(),
            is_active: category.is_active,
        }
    }
}

impl CategoryDraft {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    fn into_category(self, id: CategoryId) -> Category {
        let description = self.description.trim();
        Category {
            id,
            name: self.name.trim().to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            icon: fallback(self.icon, DEFAULT_ICON),
            color: fallback(self.color, DEFAULT_COLOR),
            is_active: self.is_active,
        }
    }
}

fn fallback(value: String, default: &str) -> String {
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value
    }
}

/// All categories, in creation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub categories: Vec<Category>,
}

impl Catalog {
    pub fn get(&self, id: CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    fn require(&self, id: CategoryId) -> Result<&Category, CatalogError> {
        self.get(id).ok_or(CatalogError::NotFound(id))
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Commands accepted by the [`Catalog`] aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CatalogCommand {
    /// Create a category under an id chosen by the caller.
    Create { id: CategoryId, draft: CategoryDraft },
    Update { id: CategoryId, draft: CategoryDraft },
    /// Flip the active flag.
    ToggleStatus { id: CategoryId },
    Delete { id: CategoryId },
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Domain events produced by the [`Catalog`] aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CatalogEvent {
    Created { category: Category },
    Updated { category: Category },
    StatusChanged { id: CategoryId, is_active: bool },
    Deleted { id: CategoryId },
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur when handling a [`CatalogCommand`].
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("Category name is required")]
    NameRequired,
    #[error("category {0} does not exist")]
    NotFound(CategoryId),
    #[error("category {0} already exists")]
    AlreadyExists(CategoryId),
}

// ---------------------------------------------------------------------------
// Aggregate impl
// ---------------------------------------------------------------------------

impl Aggregate for Catalog {
    const AGGREGATE_TYPE: &'static str = "catalog";
    type Command = CatalogCommand;
    type DomainEvent = CatalogEvent;
    type Error = CatalogError;

    fn handle(&self, cmd: CatalogCommand) -> Result<Vec<CatalogEvent>, CatalogError> {
        match cmd {
            CatalogCommand::Create { id, draft } => {
                if draft.name.trim().is_empty() {
                    return Err(CatalogError::NameRequired);
                }
                if self.get(id).is_some() {
                    return Err(CatalogError::AlreadyExists(id));
                }
                Ok(vec![CatalogEvent::Created {
                    category: draft.into_category(id),
                }])
            }
            CatalogCommand::Update { id, draft } => {
                let current = self.require(id)?;
                if draft.name.trim().is_empty() {
                    return Err(CatalogError::NameRequired);
                }
                let category = draft.into_category(id);
                if &category == current {
                    return Ok(vec![]);
                }
                Ok(vec![CatalogEvent::Updated { category }])
            }
            CatalogCommand::ToggleStatus { id } => {
                let current = self.require(id)?;
                Ok(vec![CatalogEvent::StatusChanged {
                    id,
                    is_active: !current.is_active,
                }])
            }
            CatalogCommand::Delete { id } => {
                self.require(id)?;
                Ok(vec![CatalogEvent::Deleted { id }])
            }
        }
    }

    fn apply(mut self, event: &CatalogEvent) -> Self {
        match event {
            CatalogEvent::Created { category } => self.categories.push(category.clone()),
            CatalogEvent::Updated { category } => {
                if let Some(slot) = self.categories.iter_mut().find(|c| c.id == category.id) {
                    *slot = category.clone();
                }
            }
            CatalogEvent::StatusChanged { id, is_active } => {
                if let Some(c) = self.categories.iter_mut().find(|c| c.id == *id) {
                    c.is_active = *is_active;
                }
            }
            CatalogEvent::Deleted { id } => self.categories.retain(|c| c.id != *id),
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Projections
// ---------------------------------------------------------------------------

/// Counts shown above the category table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryStats {
    pub total: usize,
    pub active: usize,
}

impl Projection<Catalog> for CategoryStats {
    const NAME: &'static str = "category-stats";

    fn project(state: &Catalog) -> Self {
        Self {
            total: state.categories.len(),
            active: state.categories.iter().filter(|c| c.is_active).count(),
        }
    }
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

/// Result type of repository calls: the updated collection.
pub type CatalogResult = Result<Vec<Category>, ExecuteError<CatalogError>>;

/// Persistence collaborator behind the admin screens.
///
/// Mutations return the collection as it is after the change.
pub trait CategoryRepository {
    fn list(&self) -> Vec<Category>;
    fn create(&self, draft: CategoryDraft) -> CatalogResult;
    fn update(&self, id: CategoryId, draft: CategoryDraft) -> CatalogResult;
    fn toggle_status(&self, id: CategoryId) -> CatalogResult;
    fn delete(&self, id: CategoryId) -> CatalogResult;
    fn stats(&self) -> CategoryStats {
        CategoryStats::project(&Catalog {
            categories: self.list(),
        })
    }
}

/// [`CategoryRepository`] backed by a [`StateStore`].
#[derive(Debug, Clone)]
pub struct StoreCategoryRepository {
    store: StateStore<Catalog>,
    ctx: CommandContext,
}

impl StoreCategoryRepository {
    pub fn new(store: StateStore<Catalog>) -> Self {
        Self {
            store,
            ctx: CommandContext::default().with_metadata(serde_json::json!({"source": "admin"})),
        }
    }

    /// Attribute subsequent commands to `actor`.
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.ctx = self.ctx.with_actor(actor);
        self
    }

    pub fn store(&self) -> &StateStore<Catalog> {
        &self.store
    }

    fn run(&self, cmd: CatalogCommand) -> CatalogResult {
        self.store.execute(cmd, &self.ctx)?;
        Ok(self.list())
    }
}

impl CategoryRepository for StoreCategoryRepository {
    fn list(&self) -> Vec<Category> {
        self.store.state().categories
    }

    fn create(&self, draft: CategoryDraft) -> CatalogResult {
        self.run(CatalogCommand::Create {
            id: CategoryId::new_random(),
            draft,
        })
    }

    fn update(&self, id: CategoryId, draft: CategoryDraft) -> CatalogResult {
        self.run(CatalogCommand::Update { id, draft })
    }

    fn toggle_status(&self, id: CategoryId) -> CatalogResult {
        self.run(CatalogCommand::ToggleStatus { id })
    }

    fn delete(&self, id: CategoryId) -> CatalogResult {
        self.run(CatalogCommand::Delete { id })
    }

    fn stats(&self) -> CategoryStats {
        self.store.project::<CategoryStats>()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Admin screens for managing idea categories.
//!
//! [`CategoryListScreen`] owns the table and the add/edit form state;
//! [`CategoryForm`] validates and submits one draft. Confirmation and
//! alert dialogs go through the host's [`Prompt`].

use std::sync::Arc;

use tracing::{debug, info};

use crate::category::{CatalogError, Category, CategoryDraft, CategoryRepository, CategoryStats};
use crate::error::ExecuteError;

/// Icons offered by the category form.
pub const AVAILABLE_ICONS: [&str; 16] = [
    "🔄", "💡", "👥", "💻", "💰", "🎯", "📢", "⚙️", "📌", "🚀", "📊", "🎨", "🔧", "📝", "⭐", "🏆",
];

/// Colors offered by the category form.
pub const AVAILABLE_COLORS: [&str; 12] = [
    "#3B82F6", "#F59E0B", "#10B981", "#8B5CF6", "#EF4444", "#EC4899", "#F97316", "#6366F1",
    "#6B7280", "#14B8A6", "#F43F5E", "#84CC16",
];

/// Modal dialogs provided by the host.
pub trait Prompt: Send + Sync {
    /// Ask a yes/no question. `true` means the user accepted.
    fn confirm(&self, message: &str) -> bool;
    fn alert(&self, message: &str);
}

/// How a form interaction ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormOutcome {
    Saved,
    /// Validation failed; the form stays open.
    Rejected,
    Cancelled,
}

/// Add/edit form for one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryForm {
    editing: Option<Category>,
    pub data: CategoryDraft,
}

impl CategoryForm {
    /// Empty form with the default icon and color.
    pub fn add() -> Self {
        Self {
            editing: None,
            data: CategoryDraft::default(),
        }
    }

    /// Form prefilled from `category`.
    pub fn edit(category: &Category) -> Self {
        Self {
            editing: Some(category.clone()),
            data: CategoryDraft::from(category),
        }
    }

    /// The category being edited, `None` when adding.
    pub fn editing(&self) -> Option<&Category> {
        self.editing.as_ref()
    }

    pub fn is_edit(&self) -> bool {
        self.editing.is_some()
    }

    /// Validate and save through `repo`.
    ///
    /// A blank name raises the `"Category name is required"` alert and
    /// returns [`FormOutcome::Rejected`] without touching the repository.
    pub fn submit(
        &self,
        repo: &dyn CategoryRepository,
        prompt: &dyn Prompt,
    ) -> Result<FormOutcome, ExecuteError<CatalogError>> {
        if self.data.name.trim().is_empty() {
            prompt.alert(&CatalogError::NameRequired.to_string());
            return Ok(FormOutcome::Rejected);
        }
        let draft = self.data.clone();
        match &self.editing {
            Some(category) => repo.update(category.id, draft)?,
            None => repo.create(draft)?,
        };
        Ok(FormOutcome::Saved)
    }

    pub fn cancel(&self) -> FormOutcome {
        FormOutcome::Cancelled
    }
}

/// The category table with its add/edit form.
pub struct CategoryListScreen<R> {
    repo: R,
    prompt: Arc<dyn Prompt>,
    categories: Vec<Category>,
    form: Option<CategoryForm>,
}

impl<R: CategoryRepository> CategoryListScreen<R> {
    pub fn new(repo: R, prompt: Arc<dyn Prompt>) -> Self {
        let categories = repo.list();
        Self {
            repo,
            prompt,
            categories,
            form: None,
        }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn show_form(&self) -> bool {
        self.form.is_some()
    }

    /// The category open in the form, if the form is editing one.
    pub fn editing(&self) -> Option<&Category> {
        self.form.as_ref().and_then(CategoryForm::editing)
    }

    pub fn form(&self) -> Option<&CategoryForm> {
        self.form.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut CategoryForm> {
        self.form.as_mut()
    }

    pub fn stats(&self) -> CategoryStats {
        self.repo.stats()
    }

    /// Reload the table from the repository.
    pub fn refresh(&mut self) {
        self.categories = self.repo.list();
    }

    pub fn open_add_form(&mut self) {
        self.form = Some(CategoryForm::add());
    }

    pub fn open_edit_form(&mut self, category: &Category) {
        self.form = Some(CategoryForm::edit(category));
    }

    pub fn close_form(&mut self) {
        self.form = None;
    }

    pub fn toggle_status(&mut self, category: &Category) -> Result<(), ExecuteError<CatalogError>> {
        self.categories = self.repo.toggle_status(category.id)?;
        Ok(())
    }

    /// Delete `category` after the user confirms. Returns whether it was
    /// deleted.
    pub fn delete_category(
        &mut self,
        category: &Category,
    ) -> Result<bool, ExecuteError<CatalogError>> {
        let message = format!(
            "Are you sure you want to delete \"{}\"? This action cannot be undone.",
            category.name
        );
        if !self.prompt.confirm(&message) {
            debug!(category = %category.id, "delete declined");
            return Ok(false);
        }
        self.categories = self.repo.delete(category.id)?;
        info!(category = %category.id, name = %category.name, "category deleted");
        Ok(true)
    }

    /// Submit the open form. Closes it once saved.
    ///
    /// Returns `None` when no form is open.
    pub fn submit_form(&mut self) -> Result<Option<FormOutcome>, ExecuteError<CatalogError>> {
        let Some(form) = &self.form else {
            return Ok(None);
        };
        let outcome = form.submit(&self.repo, self.prompt.as_ref())?;
        if outcome == FormOutcome::Saved {
            self.close_form();
            self.refresh();
        }
        Ok(Some(outcome))
    }

    /// Cancel the open form.
    pub fn cancel_form(&mut self) -> Option<FormOutcome> {
        let outcome = self.form.as_ref().map(CategoryForm::cancel);
        self.close_form();
        outcome
    }
}

impl<R> std::fmt::Debug for CategoryListScreen<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CategoryListScreen")
            .field("categories", &self.categories.len())
            .field("form", &self.form)
            .finish_non_exhaustive()
    }
}

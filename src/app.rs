use crate::api::{ApiError, CatalogClient, CategoryForm, SubcategoryForm};
use crate::catalog::{
    sorted_subcategories, CatalogSnapshot, Category, Product, ProductView, ReorderError,
    ReorderSession, RowSpan, SelectionState, Subcategory,
};
use crate::config::Config;
use crate::keybindings::KeybindingRegistry;
use crate::theme::{StyleMap, ThemeVariant};
use ratatui::layout::Rect;
use ratatui::style::Style;
use std::borrow::Cow;
use tokio::time::Instant;

// ============================================================================
// Focus
// ============================================================================

/// Which pane has focus in the browse view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Categories,
    Subcategories,
    Products,
}

impl Focus {
    /// Categories → Subcategories → Products → Categories.
    pub fn next(self) -> Self {
        match self {
            Self::Categories => Self::Subcategories,
            Self::Subcategories => Self::Products,
            Self::Products => Self::Categories,
        }
    }
}

// ============================================================================
// Sort Dialog State
// ============================================================================

/// The open subcategory sort dialog.
///
/// Owning the dialog is the single-session flag: `App::sort_dialog` is
/// `Some` exactly while a reorder session exists.
pub struct SortDialog {
    pub session: ReorderSession,
    /// Highlighted display row.
    pub cursor: usize,
    /// Inner list area from the last render, for mouse hit testing.
    pub list_area: Option<Rect>,
    /// First display row visible in `list_area`.
    pub list_offset: usize,
    /// A mouse button is held on a picked-up row.
    pub mouse_drag: bool,
    /// Save in flight; input other than quit is ignored.
    pub saving: bool,
    /// Waiting for y/n before discarding a modified order.
    pub confirm_discard: bool,
    /// Last save failure, shown inside the dialog.
    pub error: Option<String>,
}

impl SortDialog {
    pub fn new(session: ReorderSession) -> Self {
        Self {
            session,
            cursor: 0,
            list_area: None,
            list_offset: 0,
            mouse_drag: false,
            saving: false,
            confirm_discard: false,
            error: None,
        }
    }

    /// Id of the subcategory at a display row.
    pub fn id_at(&self, row: usize) -> Option<i64> {
        self.session.visual_items().nth(row).map(|s| s.id)
    }

    /// One unit-height span per display row, in row units from the list top.
    pub fn row_spans(&self) -> Vec<RowSpan> {
        (0..self.session.len())
            .map(|i| RowSpan::new(i as f32, 1.0))
            .collect()
    }

    /// Map a terminal row to a display row, clamped to the list.
    ///
    /// Returns `None` when there is no recorded list area yet.
    pub fn display_row_at(&self, screen_row: u16) -> Option<usize> {
        let area = self.list_area?;
        let last = self.session.len().checked_sub(1)?;
        let relative = screen_row.saturating_sub(area.y) as usize;
        Some((self.list_offset + relative).min(last))
    }

    /// Whether a terminal cell lies inside the list area.
    pub fn contains(&self, column: u16, row: u16) -> bool {
        self.list_area.is_some_and(|area| {
            column >= area.x
                && column < area.x.saturating_add(area.width)
                && row >= area.y
                && row < area.y.saturating_add(area.height)
        })
    }

    /// Hover the dragged row over display row `target`.
    ///
    /// The pointer position is chosen so the midpoint rule lands the dragged
    /// row on `target`: the top edge when moving up, just past the midpoint
    /// when moving down.
    pub fn hover_row(&mut self, target: usize) -> bool {
        let Some(from) = self.session.dragging_position() else {
            return false;
        };
        let Some(over_id) = self.id_at(target) else {
            return false;
        };
        let pointer_y = if target > from {
            target as f32 + 0.5
        } else {
            target as f32
        };
        let rows = self.row_spans();
        let moved = self.session.hover_insertion_point(over_id, pointer_y, &rows);
        if let Some(pos) = self.session.dragging_position() {
            self.cursor = pos;
        }
        moved
    }

    /// Pick up the highlighted row.
    pub fn pick_up(&mut self) -> Result<(), ReorderError> {
        match self.id_at(self.cursor) {
            Some(id) => self.session.begin_drag(id),
            None => Err(ReorderError::NoSubcategories {
                category_id: self.session.category_id(),
            }),
        }
    }

    /// Drop the dragged row where it is displayed.
    pub fn drop_here(&mut self) {
        let position = self.session.dragging_position();
        self.session.complete_drop();
        self.mouse_drag = false;
        if let Some(pos) = position {
            self.cursor = pos;
        }
    }

    /// Cancel the drag; the highlight follows the row back to its place.
    pub fn abort(&mut self) {
        let id = self.session.dragging_id();
        self.session.abort_drag();
        self.mouse_drag = false;
        if let Some(pos) = id.and_then(|id| self.session.visual_items().position(|s| s.id == id)) {
            self.cursor = pos;
        }
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let last = self.session.len().saturating_sub(1);
        self.cursor = self.cursor.saturating_add_signed(delta).min(last);
    }
}

// ============================================================================
// Add / Edit Form State
// ============================================================================

/// What a form dialog creates or edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Category,
    Subcategory { category_id: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKey {
    Name,
    Code,
    Icon,
    ImageUrl,
    SortOrder,
    IsActive,
    StyleRedirectPage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub key: FieldKey,
    pub label: &'static str,
    pub value: FieldValue,
}

impl FormField {
    fn text(key: FieldKey, label: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            label,
            value: FieldValue::Text(value.into()),
        }
    }

    fn flag(key: FieldKey, label: &'static str, value: bool) -> Self {
        Self {
            key,
            label,
            value: FieldValue::Flag(value),
        }
    }
}

/// Add/edit dialog for a category or subcategory.
#[derive(Debug, Clone)]
pub struct FormDialog {
    pub kind: FormKind,
    /// `Some` when editing an existing row.
    pub editing_id: Option<i64>,
    pub fields: Vec<FormField>,
    pub active: usize,
    pub error: Option<String>,
    pub saving: bool,
    /// Waiting for the GET that prefills an edit.
    pub loading: bool,
}

impl FormDialog {
    pub fn new_category() -> Self {
        Self::from_category_form(CategoryForm::new(), None)
    }

    pub fn new_subcategory(category_id: i64) -> Self {
        Self::from_subcategory_form(SubcategoryForm::new(category_id), None)
    }

    pub fn edit_category(category: &Category) -> Self {
        let mut form = Self::from_category_form(CategoryForm::from(category), Some(category.id));
        form.loading = true;
        form
    }

    pub fn edit_subcategory(subcategory: &Subcategory) -> Self {
        let mut form =
            Self::from_subcategory_form(SubcategoryForm::from(subcategory), Some(subcategory.id));
        form.loading = true;
        form
    }

    fn from_category_form(f: CategoryForm, editing_id: Option<i64>) -> Self {
        Self {
            kind: FormKind::Category,
            editing_id,
            fields: vec![
                FormField::text(FieldKey::Name, "Name", f.name),
                FormField::text(FieldKey::Code, "Code", f.code),
                FormField::text(FieldKey::Icon, "Icon", f.icon),
                FormField::text(FieldKey::ImageUrl, "Image URL", f.image_url),
                FormField::text(FieldKey::SortOrder, "Sort order", f.sort_order.to_string()),
                FormField::flag(FieldKey::IsActive, "Active", f.is_active),
                FormField::text(
                    FieldKey::StyleRedirectPage,
                    "Style redirect page",
                    f.style_redirect_page,
                ),
            ],
            active: 0,
            error: None,
            saving: false,
            loading: false,
        }
    }

    fn from_subcategory_form(f: SubcategoryForm, editing_id: Option<i64>) -> Self {
        Self {
            kind: FormKind::Subcategory {
                category_id: f.category_id,
            },
            editing_id,
            fields: vec![
                FormField::text(FieldKey::Name, "Name", f.name),
                FormField::text(FieldKey::Code, "Code", f.code),
                FormField::text(FieldKey::Icon, "Icon", f.icon),
                FormField::text(FieldKey::SortOrder, "Sort order", f.sort_order.to_string()),
                FormField::flag(FieldKey::IsActive, "Active", f.is_active),
            ],
            active: 0,
            error: None,
            saving: false,
            loading: false,
        }
    }

    /// Replace field values with a fresh copy from the backend.
    pub fn prefill_category(&mut self, category: &Category) {
        let active = self.active;
        *self = Self::from_category_form(CategoryForm::from(category), Some(category.id));
        self.active = active;
    }

    pub fn prefill_subcategory(&mut self, subcategory: &Subcategory) {
        let active = self.active;
        *self =
            Self::from_subcategory_form(SubcategoryForm::from(subcategory), Some(subcategory.id));
        self.active = active;
    }

    pub fn title(&self) -> &'static str {
        match (self.kind, self.editing_id) {
            (FormKind::Category, None) => "Add category",
            (FormKind::Category, Some(_)) => "Edit category",
            (FormKind::Subcategory { .. }, None) => "Add subcategory",
            (FormKind::Subcategory { .. }, Some(_)) => "Edit subcategory",
        }
    }

    pub fn next_field(&mut self) {
        self.active = (self.active + 1) % self.fields.len().max(1);
    }

    pub fn prev_field(&mut self) {
        let len = self.fields.len().max(1);
        self.active = (self.active + len - 1) % len;
    }

    /// Type a character into the active field. Space toggles flags.
    pub fn insert_char(&mut self, c: char) {
        let Some(field) = self.fields.get_mut(self.active) else {
            return;
        };
        match &mut field.value {
            FieldValue::Text(text) => {
                if !c.is_control() {
                    text.push(c);
                }
            }
            FieldValue::Flag(on) => {
                if c == ' ' {
                    *on = !*on;
                }
            }
        }
        self.error = None;
    }

    pub fn backspace(&mut self) {
        if let Some(FormField {
            value: FieldValue::Text(text),
            ..
        }) = self.fields.get_mut(self.active)
        {
            text.pop();
        }
    }

    fn text(&self, key: FieldKey) -> &str {
        self.fields
            .iter()
            .find(|f| f.key == key)
            .and_then(|f| match &f.value {
                FieldValue::Text(t) => Some(t.as_str()),
                FieldValue::Flag(_) => None,
            })
            .unwrap_or("")
    }

    fn flag(&self, key: FieldKey) -> bool {
        self.fields.iter().any(|f| {
            f.key == key && matches!(f.value, FieldValue::Flag(true))
        })
    }

    fn sort_order(&self) -> Result<i64, ApiError> {
        let raw = self.text(FieldKey::SortOrder).trim();
        if raw.is_empty() {
            return Ok(0);
        }
        raw.parse::<i64>()
            .map_err(|_| ApiError::Validation("Sort order must be a whole number".into()))
    }

    /// Build and validate the category request body.
    pub fn to_category_form(&self) -> Result<CategoryForm, ApiError> {
        CategoryForm {
            name: self.text(FieldKey::Name).to_string(),
            code: self.text(FieldKey::Code).to_string(),
            icon: self.text(FieldKey::Icon).trim().to_string(),
            image_url: self.text(FieldKey::ImageUrl).trim().to_string(),
            sort_order: self.sort_order()?,
            is_active: self.flag(FieldKey::IsActive),
            style_redirect_page: self.text(FieldKey::StyleRedirectPage).to_string(),
        }
        .validate()
    }

    /// Build and validate the subcategory request body.
    pub fn to_subcategory_form(&self, category_id: i64) -> Result<SubcategoryForm, ApiError> {
        SubcategoryForm {
            category_id,
            name: self.text(FieldKey::Name).to_string(),
            code: self.text(FieldKey::Code).to_string(),
            icon: self.text(FieldKey::Icon).trim().to_string(),
            sort_order: self.sort_order()?,
            is_active: self.flag(FieldKey::IsActive),
        }
        .validate()
    }
}

// ============================================================================
// Product Detail Overlay
// ============================================================================

pub enum ProductDetail {
    Loading { product_id: i64 },
    Loaded { product: Box<Product>, scroll: u16 },
    Failed { product_id: i64, error: String },
}

// ============================================================================
// Background Events
// ============================================================================

/// Events from background tasks
pub enum AppEvent {
    /// Full catalog reload finished.
    SnapshotLoaded(Result<CatalogSnapshot, String>),
    /// One category's subcategory group was re-fetched.
    SubcategoriesLoaded {
        category_id: i64,
        result: Result<Vec<Subcategory>, String>,
    },
    /// Every sort update was applied.
    SortSaved { category_id: i64, applied: usize },
    /// The sort sequence stopped at a failing update.
    SortFailed {
        category_id: i64,
        failed_id: i64,
        applied: usize,
        total: usize,
        message: String,
    },
    /// Backend copy for an edit form.
    CategoryPrefilled {
        id: i64,
        result: Result<Category, String>,
    },
    SubcategoryPrefilled {
        id: i64,
        result: Result<Subcategory, String>,
    },
    /// Create/update accepted by the backend.
    FormSaved { message: String },
    FormFailed { error: String },
    ProductLoaded {
        product_id: i64,
        result: Result<Product, String>,
    },
    /// A background task panicked.
    ///
    /// Fields:
    /// - `task`: Name of the task that panicked (e.g., "reload", "save_sort")
    /// - `error`: The panic message extracted from the panic payload
    TaskPanicked { task: &'static str, error: String },
}

// ============================================================================
// Application State
// ============================================================================

/// Central application state
pub struct App {
    pub client: CatalogClient,

    // Theme
    pub theme_variant: ThemeVariant,
    pub theme: StyleMap,

    pub keybindings: KeybindingRegistry,

    // Data
    pub snapshot: CatalogSnapshot,
    pub selection: SelectionState,
    pub product_view: ProductView,
    /// Subcategories of the selected category, in display order.
    pub subcategory_rows: Vec<Subcategory>,

    // UI State
    pub focus: Focus,
    /// Highlighted rows; distinct from the committed `selection`.
    pub category_cursor: usize,
    pub subcategory_cursor: usize,
    pub product_cursor: usize,

    /// Full reload in flight.
    pub loading: bool,

    pub status_message: Option<(Cow<'static, str>, Instant)>,

    pub needs_redraw: bool,

    pub show_help: bool,
    pub help_scroll_offset: usize,

    /// Open sort dialog. At most one reorder session exists at a time.
    pub sort_dialog: Option<SortDialog>,
    pub form: Option<FormDialog>,
    pub product_detail: Option<ProductDetail>,

    /// Ask before Esc discards a modified sort order.
    pub confirm_discard_sort: bool,

    pub reload_handle: Option<tokio::task::JoinHandle<()>>,
    pub detail_handle: Option<tokio::task::JoinHandle<()>>,
}

impl App {
    pub fn new(client: CatalogClient, config: &Config) -> Self {
        let theme_variant = ThemeVariant::from_str_name(&config.theme).unwrap_or_else(|| {
            tracing::warn!(theme = %config.theme, "Unknown theme, using dark");
            ThemeVariant::Dark
        });

        let mut keybindings = KeybindingRegistry::new();
        for warning in keybindings.apply_overrides(&config.keybindings) {
            tracing::warn!(warning = %warning, "Keybinding override ignored");
        }

        Self {
            client,
            theme_variant,
            theme: StyleMap::from_palette(&theme_variant.palette()),
            keybindings,
            snapshot: CatalogSnapshot::default(),
            selection: SelectionState::default(),
            product_view: ProductView::default(),
            subcategory_rows: Vec::new(),
            focus: Focus::Categories,
            category_cursor: 0,
            subcategory_cursor: 0,
            product_cursor: 0,
            loading: false,
            status_message: None,
            needs_redraw: true,
            show_help: false,
            help_scroll_offset: 0,
            sort_dialog: None,
            form: None,
            product_detail: None,
            confirm_discard_sort: config.confirm_discard_sort,
            reload_handle: None,
            detail_handle: None,
        }
    }

    /// Resolve a semantic role name to its `Style`.
    pub fn style(&self, role: &str) -> Style {
        self.theme.resolve(role)
    }

    pub fn set_theme(&mut self, variant: ThemeVariant) {
        self.theme_variant = variant;
        self.theme = StyleMap::from_palette(&variant.palette());
        self.needs_redraw = true;
    }

    /// Cycle to the next theme variant (Dark → Light → Dark).
    ///
    /// Returns the name of the new theme for status display.
    pub fn cycle_theme(&mut self) -> &'static str {
        let next = self.theme_variant.next();
        self.set_theme(next);
        next.name()
    }

    // ------------------------------------------------------------------------
    // Catalog state
    // ------------------------------------------------------------------------

    /// Install a freshly loaded snapshot, keeping the selection when its ids
    /// still exist.
    pub fn apply_snapshot(&mut self, snapshot: CatalogSnapshot) {
        self.snapshot = snapshot;

        let previous = self.selection;
        self.selection.clear();
        if let Some(cat_id) = previous.selected_category_id {
            if self.snapshot.category(cat_id).is_some() {
                self.selection.select_category(cat_id);
                if let Some(sub_id) = previous.selected_subcategory_id {
                    self.selection.select_subcategory(&self.snapshot, sub_id);
                }
            }
        }
        if self.selection != previous {
            tracing::info!("Selection no longer exists after reload, cleared");
        }

        self.refresh_subcategory_rows();
        self.refresh_products();
        self.clamp_cursors();
    }

    /// Select the category under the cursor.
    ///
    /// Returns the selected id so the caller can re-fetch its subcategories.
    pub fn select_category_at_cursor(&mut self) -> Option<i64> {
        let id = self.snapshot.categories.get(self.category_cursor)?.id;
        self.selection.select_category(id);
        self.subcategory_cursor = 0;
        self.refresh_subcategory_rows();
        self.refresh_products();
        Some(id)
    }

    /// Select the subcategory under the cursor.
    pub fn select_subcategory_at_cursor(&mut self) -> bool {
        let Some(id) = self.subcategory_rows.get(self.subcategory_cursor).map(|s| s.id) else {
            return false;
        };
        if !self.selection.select_subcategory(&self.snapshot, id) {
            return false;
        }
        self.refresh_products();
        true
    }

    /// Drop the subcategory filter, or the whole selection if none.
    pub fn step_back_selection(&mut self) -> bool {
        if self.selection.selected_subcategory_id.is_some() {
            if let Some(cat_id) = self.selection.selected_category_id {
                self.selection.select_category(cat_id);
            }
        } else if self.selection.selected_category_id.is_some() {
            self.selection.clear();
            self.subcategory_cursor = 0;
        } else {
            return false;
        }
        self.refresh_subcategory_rows();
        self.refresh_products();
        true
    }

    pub fn show_all_products(&mut self) {
        self.selection.clear();
        self.subcategory_cursor = 0;
        self.refresh_subcategory_rows();
        self.refresh_products();
    }

    /// Replace one category's subcategories after a backend re-fetch.
    pub fn replace_subcategories(&mut self, category_id: i64, subcategories: Vec<Subcategory>) {
        self.snapshot
            .replace_subcategories(category_id, subcategories);

        // A subcategory that disappeared cannot stay selected
        if let Some(sub_id) = self.selection.selected_subcategory_id {
            if self.snapshot.subcategory(sub_id).is_none() {
                self.selection.select_category(category_id);
            }
        }

        self.refresh_subcategory_rows();
        self.refresh_products();
        self.clamp_cursors();
    }

    pub fn refresh_subcategory_rows(&mut self) {
        self.subcategory_rows = match self.selection.selected_category_id {
            Some(cat_id) => sorted_subcategories(&self.snapshot, cat_id),
            None => Vec::new(),
        };
    }

    pub fn refresh_products(&mut self) {
        self.product_view = self.selection.filter_products(&self.snapshot);
        self.product_cursor = self
            .product_cursor
            .min(self.product_view.count.saturating_sub(1));
    }

    pub fn visible_products(&self) -> impl Iterator<Item = &Product> + '_ {
        self.product_view
            .visible
            .iter()
            .filter_map(move |id| self.snapshot.products.iter().find(|p| p.id == *id))
    }

    pub fn highlighted_category(&self) -> Option<&Category> {
        self.snapshot.categories.get(self.category_cursor)
    }

    pub fn highlighted_subcategory(&self) -> Option<&Subcategory> {
        self.subcategory_rows.get(self.subcategory_cursor)
    }

    pub fn highlighted_product_id(&self) -> Option<i64> {
        self.product_view.visible.get(self.product_cursor).copied()
    }

    pub fn clamp_cursors(&mut self) {
        self.category_cursor = self
            .category_cursor
            .min(self.snapshot.categories.len().saturating_sub(1));
        self.subcategory_cursor = self
            .subcategory_cursor
            .min(self.subcategory_rows.len().saturating_sub(1));
        self.product_cursor = self
            .product_cursor
            .min(self.product_view.count.saturating_sub(1));
    }

    /// Navigate up in current list
    pub fn nav_up(&mut self) {
        let cursor = match self.focus {
            Focus::Categories => &mut self.category_cursor,
            Focus::Subcategories => &mut self.subcategory_cursor,
            Focus::Products => &mut self.product_cursor,
        };
        *cursor = cursor.saturating_sub(1);
    }

    /// Navigate down in current list
    pub fn nav_down(&mut self) {
        let len = match self.focus {
            Focus::Categories => self.snapshot.categories.len(),
            Focus::Subcategories => self.subcategory_rows.len(),
            Focus::Products => self.product_view.count,
        };
        let cursor = match self.focus {
            Focus::Categories => &mut self.category_cursor,
            Focus::Subcategories => &mut self.subcategory_cursor,
            Focus::Products => &mut self.product_cursor,
        };
        if len > 0 {
            *cursor = cursor.saturating_add(1).min(len - 1);
        }
    }

    // ------------------------------------------------------------------------
    // Sort dialog
    // ------------------------------------------------------------------------

    /// Open the sort dialog for the selected category.
    ///
    /// Rejections leave all state unchanged and set a status message.
    pub fn open_sort_dialog(&mut self) -> bool {
        if self.sort_dialog.is_some() {
            self.set_status("A sort session is already open");
            return false;
        }
        match ReorderSession::open(&self.selection, &self.snapshot) {
            Ok(session) => {
                tracing::info!(
                    category_id = session.category_id(),
                    items = session.len(),
                    "Opened sort dialog"
                );
                self.sort_dialog = Some(SortDialog::new(session));
                true
            }
            Err(e) => {
                self.set_status(e.to_string());
                false
            }
        }
    }

    pub fn close_sort_dialog(&mut self) {
        if let Some(dialog) = self.sort_dialog.take() {
            tracing::debug!(
                category_id = dialog.session.category_id(),
                modified = dialog.session.is_modified(),
                "Closed sort dialog"
            );
        }
    }

    // ------------------------------------------------------------------------
    // Status
    // ------------------------------------------------------------------------

    /// Set status message (will auto-expire after 3 seconds)
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Clear status message if expired (older than 3 seconds)
    /// Returns true if a message was actually cleared
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed().as_secs() >= 3 {
                self.status_message = None;
                return true;
            }
        }
        false
    }
}

// ============================================================================
// Resource Cleanup
// ============================================================================

/// Abort in-flight reads on drop. Sort saves are never tracked here and run
/// to completion.
impl Drop for App {
    fn drop(&mut self) {
        if let Some(handle) = self.reload_handle.take() {
            handle.abort();
            tracing::debug!("Aborted reload task on App drop");
        }
        if let Some(handle) = self.detail_handle.take() {
            handle.abort();
            tracing::debug!("Aborted product detail task on App drop");
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::catalog::{Category, Product, Subcategory};
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use tokio::time;
    use url::Url;

    pub(crate) fn category(id: i64, name: &str, sort_order: i64) -> Category {
        Category {
            id,
            name: name.to_string(),
            code: format!("c{}", id),
            icon: None,
            sort_order,
            is_active: true,
            image_url: None,
            style_redirect_page: None,
            created_at: None,
        }
    }

    pub(crate) fn subcategory(id: i64, category_id: i64, name: &str, sort_order: i64) -> Subcategory {
        Subcategory {
            id,
            category_id,
            name: name.to_string(),
            code: format!("s{}", id),
            icon: None,
            image_url: None,
            sort_order,
            is_active: true,
            created_at: None,
        }
    }

    pub(crate) fn product(id: i64, category_id: Option<i64>, subcategory_id: Option<i64>) -> Product {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "code": format!("p{}", id),
            "name": format!("Product {}", id),
            "category_id": category_id,
            "subcategory_id": subcategory_id,
        }))
        .unwrap()
    }

    pub(crate) fn sample_snapshot() -> CatalogSnapshot {
        CatalogSnapshot::new(
            vec![category(1, "Frames", 0), category(2, "Albums", 1)],
            vec![
                subcategory(10, 1, "A", 0),
                subcategory(11, 1, "B", 1),
                subcategory(12, 1, "C", 2),
                subcategory(20, 2, "Leather", 0),
            ],
            vec![
                product(100, Some(1), Some(10)),
                product(101, Some(1), Some(12)),
                product(102, Some(2), Some(20)),
                product(103, None, None),
            ],
        )
    }

    pub(crate) fn test_app() -> App {
        let client = CatalogClient::new(
            reqwest::Client::new(),
            Url::parse("http://127.0.0.1:9/").unwrap(),
            Duration::from_secs(1),
        );
        let mut app = App::new(client, &Config::default());
        app.apply_snapshot(sample_snapshot());
        app
    }

    #[tokio::test]
    async fn test_initial_view_shows_all_products() {
        let app = test_app();
        assert_eq!(app.product_view.count, 4);
        assert_eq!(app.product_view.title, "Product list");
        assert!(app.subcategory_rows.is_empty());
    }

    #[tokio::test]
    async fn test_select_category_filters_and_lists_subcategories() {
        let mut app = test_app();
        assert_eq!(app.select_category_at_cursor(), Some(1));
        assert_eq!(app.product_view.visible, vec![100, 101]);
        assert_eq!(app.product_view.title, "Frames");
        let names: Vec<&str> = app.subcategory_rows.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_select_subcategory_narrows_filter() {
        let mut app = test_app();
        app.select_category_at_cursor();
        app.subcategory_cursor = 2;
        assert!(app.select_subcategory_at_cursor());
        assert_eq!(app.product_view.visible, vec![101]);
        assert_eq!(app.product_view.title, "Frames - C");
    }

    #[tokio::test]
    async fn test_reselecting_category_clears_subcategory() {
        let mut app = test_app();
        app.select_category_at_cursor();
        app.subcategory_cursor = 0;
        app.select_subcategory_at_cursor();
        app.select_category_at_cursor();
        assert_eq!(app.selection.selected_subcategory_id, None);
        assert_eq!(app.product_view.count, 2);
    }

    #[tokio::test]
    async fn test_step_back_clears_subcategory_then_category() {
        let mut app = test_app();
        app.select_category_at_cursor();
        app.select_subcategory_at_cursor();

        assert!(app.step_back_selection());
        assert_eq!(app.selection.selected_category_id, Some(1));
        assert_eq!(app.selection.selected_subcategory_id, None);

        assert!(app.step_back_selection());
        assert_eq!(app.selection, SelectionState::default());
        assert!(!app.step_back_selection());
    }

    #[tokio::test]
    async fn test_open_sort_requires_category() {
        let mut app = test_app();
        assert!(!app.open_sort_dialog());
        assert!(app.sort_dialog.is_none());
        let (msg, _) = app.status_message.as_ref().unwrap();
        assert_eq!(msg, "Select a category first");
    }

    #[tokio::test]
    async fn test_second_sort_session_rejected() {
        let mut app = test_app();
        app.select_category_at_cursor();
        assert!(app.open_sort_dialog());
        app.sort_dialog.as_mut().unwrap().cursor = 2;
        assert!(!app.open_sort_dialog());
        // The existing session is untouched
        assert_eq!(app.sort_dialog.as_ref().unwrap().cursor, 2);
    }

    #[tokio::test]
    async fn test_sort_dialog_keyboard_drag_to_top() {
        let mut app = test_app();
        app.select_category_at_cursor();
        app.open_sort_dialog();
        let dialog = app.sort_dialog.as_mut().unwrap();

        dialog.cursor = 2;
        dialog.pick_up().unwrap();
        assert!(dialog.session.nudge(-1));
        assert!(dialog.session.nudge(-1));
        dialog.drop_here();

        assert_eq!(dialog.cursor, 0);
        let ids: Vec<i64> = dialog.session.working_order().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![12, 10, 11]);
    }

    #[tokio::test]
    async fn test_sort_dialog_mouse_hover_down_and_up() {
        let mut app = test_app();
        app.select_category_at_cursor();
        app.open_sort_dialog();
        let dialog = app.sort_dialog.as_mut().unwrap();

        // Drag A from the top down onto C: A lands last
        dialog.cursor = 0;
        dialog.pick_up().unwrap();
        assert!(dialog.hover_row(2));
        assert_eq!(dialog.cursor, 2);
        dialog.drop_here();
        let ids: Vec<i64> = dialog.session.working_order().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![11, 12, 10]);

        // Drag A back up onto B: A lands first
        dialog.pick_up().unwrap();
        assert!(dialog.hover_row(0));
        dialog.drop_here();
        let ids: Vec<i64> = dialog.session.working_order().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![10, 11, 12]);
    }

    #[tokio::test]
    async fn test_sort_dialog_abort_restores_cursor_and_order() {
        let mut app = test_app();
        app.select_category_at_cursor();
        app.open_sort_dialog();
        let dialog = app.sort_dialog.as_mut().unwrap();

        dialog.cursor = 0;
        dialog.pick_up().unwrap();
        dialog.hover_row(2);
        dialog.abort();

        assert_eq!(dialog.cursor, 0);
        assert!(!dialog.session.is_modified());
        let visual: Vec<i64> = dialog.session.visual_items().map(|s| s.id).collect();
        assert_eq!(visual, vec![10, 11, 12]);
    }

    #[tokio::test]
    async fn test_display_row_mapping_clamps_to_list() {
        let mut app = test_app();
        app.select_category_at_cursor();
        app.open_sort_dialog();
        let dialog = app.sort_dialog.as_mut().unwrap();
        assert_eq!(dialog.display_row_at(5), None);

        dialog.list_area = Some(Rect::new(10, 5, 30, 8));
        assert_eq!(dialog.display_row_at(5), Some(0));
        assert_eq!(dialog.display_row_at(6), Some(1));
        assert_eq!(dialog.display_row_at(12), Some(2));
        assert_eq!(dialog.display_row_at(0), Some(0));
        assert!(dialog.contains(10, 5));
        assert!(!dialog.contains(40, 5));
    }

    #[tokio::test]
    async fn test_replace_subcategories_drops_vanished_selection() {
        let mut app = test_app();
        app.select_category_at_cursor();
        app.subcategory_cursor = 1;
        app.select_subcategory_at_cursor();

        app.replace_subcategories(1, vec![subcategory(10, 1, "A", 5), subcategory(12, 1, "C", 0)]);
        assert_eq!(app.selection.selected_subcategory_id, None);
        let ids: Vec<i64> = app.subcategory_rows.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![12, 10]);
    }

    #[tokio::test]
    async fn test_apply_snapshot_keeps_existing_selection() {
        let mut app = test_app();
        app.select_category_at_cursor();
        app.apply_snapshot(sample_snapshot());
        assert_eq!(app.selection.selected_category_id, Some(1));

        app.apply_snapshot(CatalogSnapshot::new(vec![category(2, "Albums", 0)], vec![], vec![]));
        assert_eq!(app.selection, SelectionState::default());
        assert_eq!(app.category_cursor, 0);
    }

    #[tokio::test]
    async fn test_nav_clamps_to_list() {
        let mut app = test_app();
        app.nav_up();
        assert_eq!(app.category_cursor, 0);
        app.nav_down();
        app.nav_down();
        assert_eq!(app.category_cursor, 1);

        app.focus = Focus::Subcategories;
        app.nav_down();
        assert_eq!(app.subcategory_cursor, 0);
    }

    #[test]
    fn test_focus_cycles_through_panes() {
        assert_eq!(Focus::Categories.next(), Focus::Subcategories);
        assert_eq!(Focus::Products.next(), Focus::Categories);
    }

    #[test]
    fn test_form_builds_category_body() {
        let mut form = FormDialog::new_category();
        for c in "  Frames ".chars() {
            form.insert_char(c);
        }
        form.next_field();
        for c in "frame".chars() {
            form.insert_char(c);
        }
        let body = form.to_category_form().unwrap();
        assert_eq!(body.name, "Frames");
        assert_eq!(body.code, "frame");
        assert!(body.is_active);
        assert_eq!(body.sort_order, 0);
    }

    #[test]
    fn test_form_requires_name() {
        let form = FormDialog::new_subcategory(3);
        let err = form.to_subcategory_form(3).unwrap_err();
        assert_eq!(err.to_string(), "Subcategory name is required");
    }

    #[test]
    fn test_form_rejects_non_numeric_sort_order() {
        let mut form = FormDialog::edit_subcategory(&subcategory(5, 1, "A", 0));
        form.active = 3;
        form.insert_char('x');
        assert!(form.to_subcategory_form(1).is_err());
    }

    #[test]
    fn test_form_space_toggles_flag_and_wraps_fields() {
        let mut form = FormDialog::new_subcategory(1);
        form.prev_field();
        assert_eq!(form.fields[form.active].key, FieldKey::IsActive);
        form.insert_char(' ');
        assert_eq!(form.fields[form.active].value, FieldValue::Flag(false));
        form.next_field();
        assert_eq!(form.active, 0);
    }

    #[test]
    fn test_form_prefill_keeps_active_field() {
        let mut form = FormDialog::edit_category(&category(1, "Old", 0));
        assert!(form.loading);
        form.active = 2;
        form.prefill_category(&category(1, "New", 4));
        assert!(!form.loading);
        assert_eq!(form.active, 2);
        assert_eq!(form.to_category_form().unwrap().name, "New");
        assert_eq!(form.title(), "Edit category");
    }

    #[tokio::test]
    async fn test_status_expires_after_3_seconds() {
        let mut app = test_app();
        time::pause();
        app.set_status("Test message");

        time::advance(Duration::from_secs(2)).await;
        app.clear_expired_status();
        assert!(app.status_message.is_some());

        time::advance(Duration::from_secs(2)).await;
        assert!(app.clear_expired_status());
        assert!(app.status_message.is_none());
    }

    #[tokio::test]
    async fn test_cycle_theme_round_trip() {
        let mut app = test_app();
        assert_eq!(app.theme_variant, ThemeVariant::Dark);
        assert_eq!(app.cycle_theme(), "Light");
        assert_eq!(app.style("item_selected"), ThemeVariant::Light.palette().item_selected);
        assert_eq!(app.cycle_theme(), "Dark");
    }

    #[tokio::test]
    async fn test_config_theme_and_overrides_applied() {
        let mut config = Config::default();
        config.theme = "light".into();
        config
            .keybindings
            .insert("sort_subcategories".into(), "o".into());
        let client = CatalogClient::new(
            reqwest::Client::new(),
            Url::parse("http://127.0.0.1:9/").unwrap(),
            Duration::from_secs(1),
        );
        let app = App::new(client, &config);
        assert_eq!(app.theme_variant, ThemeVariant::Light);
        assert_eq!(
            app.keybindings.action_for_key(
                crossterm::event::KeyCode::Char('o'),
                crossterm::event::KeyModifiers::NONE,
                crate::keybindings::Context::Global
            ),
            Some(crate::keybindings::Action::OpenSort)
        );
    }
}

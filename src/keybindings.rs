//! Keybinding registry: maps actions to key events with config overrides.
//!
//! Every key the console reacts to is looked up here, so users can rebind
//! anything from the `[keybindings]` table in config.toml.
use crossterm::event::{KeyCode, KeyModifiers};
use std::collections::HashMap;

// ============================================================================
// Action Enum
// ============================================================================

/// All user-facing actions that can be triggered by keybindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    NavDown,
    NavUp,
    CycleFocus,
    Back,
    Select,
    Reload,
    ShowAllProducts,
    OpenSort,
    AddCategory,
    AddSubcategory,
    EditItem,
    CycleTheme,
    ShowHelp,
    PickUp,
    SaveOrder,
    CancelSort,
    NextField,
    PrevField,
    SubmitForm,
    CancelForm,
}

impl Action {
    /// Human-readable description for the help screen.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Quit => "Quit application",
            Self::NavDown => "Navigate down",
            Self::NavUp => "Navigate up",
            Self::CycleFocus => "Cycle panel focus",
            Self::Back => "Go back / dismiss",
            Self::Select => "Select / open",
            Self::Reload => "Reload catalog",
            Self::ShowAllProducts => "Show all products",
            Self::OpenSort => "Sort subcategories",
            Self::AddCategory => "Add category",
            Self::AddSubcategory => "Add subcategory",
            Self::EditItem => "Edit selected item",
            Self::CycleTheme => "Cycle theme",
            Self::ShowHelp => "Show help",
            Self::PickUp => "Pick up / drop row",
            Self::SaveOrder => "Save order",
            Self::CancelSort => "Cancel drag / close",
            Self::NextField => "Next field",
            Self::PrevField => "Previous field",
            Self::SubmitForm => "Save form",
            Self::CancelForm => "Discard form",
        }
    }
}

// ============================================================================
// Context Enum
// ============================================================================

/// Dispatch context: determines which bindings are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    Global,
    Categories,
    Subcategories,
    Products,
    SortDialog,
    Form,
}

// ============================================================================
// Key Specification
// ============================================================================

/// A key event: code + modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeySpec {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeySpec {
    pub const fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    pub const fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }
}

/// Parse a key string from config into a KeySpec.
///
/// Supported formats:
/// - Single char: "q", "j", "/"
/// - Named keys: "Enter", "Esc", "Tab", "Shift+Tab", "Up", "Down", "Space"
/// - Modifier combos: "Ctrl+s"
/// - Function keys: "F1" through "F12"
fn parse_key_string(s: &str) -> Option<KeySpec> {
    let s = s.trim();

    if let Some(rest) = s.strip_prefix("Ctrl+") {
        let rest = rest.trim();
        if rest.chars().count() == 1 {
            let c = rest.chars().next()?;
            return Some(KeySpec::ctrl(c));
        }
        return None;
    }

    match s.to_lowercase().as_str() {
        "enter" | "return" => return Some(KeySpec::plain(KeyCode::Enter)),
        "esc" | "escape" => return Some(KeySpec::plain(KeyCode::Esc)),
        "tab" => return Some(KeySpec::plain(KeyCode::Tab)),
        // crossterm reports Shift+Tab as BackTab with the SHIFT modifier set
        "shift+tab" | "backtab" => {
            return Some(KeySpec::new(KeyCode::BackTab, KeyModifiers::SHIFT))
        }
        "up" => return Some(KeySpec::plain(KeyCode::Up)),
        "down" => return Some(KeySpec::plain(KeyCode::Down)),
        "left" => return Some(KeySpec::plain(KeyCode::Left)),
        "right" => return Some(KeySpec::plain(KeyCode::Right)),
        "backspace" => return Some(KeySpec::plain(KeyCode::Backspace)),
        "space" => return Some(KeySpec::plain(KeyCode::Char(' '))),
        _ => {}
    }

    if s.starts_with('F') || s.starts_with('f') {
        if let Ok(n) = s[1..].parse::<u8>() {
            if (1..=12).contains(&n) {
                return Some(KeySpec::plain(KeyCode::F(n)));
            }
        }
    }

    if s.chars().count() == 1 {
        let c = s.chars().next()?;
        return Some(KeySpec::plain(KeyCode::Char(c)));
    }

    None
}

/// Format a KeySpec as a human-readable string for the help screen.
fn format_key(key: &KeySpec) -> String {
    let modifier = if key.modifiers.contains(KeyModifiers::CONTROL) {
        "Ctrl+"
    } else {
        ""
    };

    let key_name = match key.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::BackTab => "Shift+Tab".to_string(),
        KeyCode::Up => "Up".to_string(),
        KeyCode::Down => "Down".to_string(),
        KeyCode::Left => "Left".to_string(),
        KeyCode::Right => "Right".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::F(n) => format!("F{}", n),
        _ => "?".to_string(),
    };

    format!("{}{}", modifier, key_name)
}

// ============================================================================
// Keybinding Registry
// ============================================================================

/// Registry of keybindings, supporting default bindings and config overrides.
///
/// The same key can map to different actions in different contexts; lookups
/// that miss the active context fall back to `Context::Global`.
pub struct KeybindingRegistry {
    lookup: HashMap<(Context, KeySpec), Action>,
    /// All bindings in registration order, for the help screen.
    bindings: Vec<(Context, KeySpec, Action)>,
}

impl KeybindingRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            lookup: HashMap::new(),
            bindings: Vec::new(),
        };
        registry.register_defaults();
        registry
    }

    fn bind(&mut self, context: Context, key: KeySpec, action: Action) {
        self.lookup.insert((context, key), action);
        self.bindings.push((context, key, action));
    }

    fn register_defaults(&mut self) {
        use KeyCode::{BackTab, Char, Down, Enter, Esc, Left, Right, Tab, Up};

        // === Global (browse panes) ===
        self.bind(Context::Global, KeySpec::plain(Char('q')), Action::Quit);
        self.bind(Context::Global, KeySpec::plain(Char('j')), Action::NavDown);
        self.bind(Context::Global, KeySpec::plain(Down), Action::NavDown);
        self.bind(Context::Global, KeySpec::plain(Char('k')), Action::NavUp);
        self.bind(Context::Global, KeySpec::plain(Up), Action::NavUp);
        self.bind(Context::Global, KeySpec::plain(Tab), Action::CycleFocus);
        self.bind(Context::Global, KeySpec::plain(Esc), Action::Back);
        self.bind(Context::Global, KeySpec::plain(Enter), Action::Select);
        self.bind(Context::Global, KeySpec::plain(Char('r')), Action::Reload);
        self.bind(
            Context::Global,
            KeySpec::plain(Char('a')),
            Action::ShowAllProducts,
        );
        self.bind(Context::Global, KeySpec::plain(Char('s')), Action::OpenSort);
        self.bind(
            Context::Global,
            KeySpec::plain(Char('n')),
            Action::AddCategory,
        );
        self.bind(
            Context::Global,
            KeySpec::plain(Char('N')),
            Action::AddSubcategory,
        );
        self.bind(Context::Global, KeySpec::plain(Char('e')), Action::EditItem);
        self.bind(
            Context::Global,
            KeySpec::plain(Char('T')),
            Action::CycleTheme,
        );
        self.bind(Context::Global, KeySpec::plain(Char('?')), Action::ShowHelp);

        // === Pane-specific ===
        // Right/l drills into the subcategory pane, Left/h walks back out.
        self.bind(Context::Categories, KeySpec::plain(Right), Action::Select);
        self.bind(Context::Categories, KeySpec::plain(Char('l')), Action::Select);
        self.bind(Context::Subcategories, KeySpec::plain(Right), Action::Select);
        self.bind(
            Context::Subcategories,
            KeySpec::plain(Char('l')),
            Action::Select,
        );
        self.bind(Context::Subcategories, KeySpec::plain(Left), Action::Back);
        self.bind(Context::Subcategories, KeySpec::plain(Char('h')), Action::Back);
        self.bind(Context::Products, KeySpec::plain(Left), Action::Back);
        self.bind(Context::Products, KeySpec::plain(Char('h')), Action::Back);

        // === Sort dialog ===
        self.bind(Context::SortDialog, KeySpec::plain(Char(' ')), Action::PickUp);
        self.bind(Context::SortDialog, KeySpec::plain(Char('j')), Action::NavDown);
        self.bind(Context::SortDialog, KeySpec::plain(Down), Action::NavDown);
        self.bind(Context::SortDialog, KeySpec::plain(Char('k')), Action::NavUp);
        self.bind(Context::SortDialog, KeySpec::plain(Up), Action::NavUp);
        self.bind(Context::SortDialog, KeySpec::plain(Enter), Action::SaveOrder);
        self.bind(Context::SortDialog, KeySpec::ctrl('s'), Action::SaveOrder);
        self.bind(Context::SortDialog, KeySpec::plain(Esc), Action::CancelSort);

        // === Add/edit form ===
        self.bind(Context::Form, KeySpec::plain(Tab), Action::NextField);
        self.bind(Context::Form, KeySpec::plain(Down), Action::NextField);
        self.bind(
            Context::Form,
            KeySpec::new(BackTab, KeyModifiers::SHIFT),
            Action::PrevField,
        );
        self.bind(Context::Form, KeySpec::plain(Up), Action::PrevField);
        self.bind(Context::Form, KeySpec::plain(Enter), Action::SubmitForm);
        self.bind(Context::Form, KeySpec::ctrl('s'), Action::SubmitForm);
        self.bind(Context::Form, KeySpec::plain(Esc), Action::CancelForm);
    }

    /// Apply user overrides from config keybindings map.
    ///
    /// Keys in the map are action names (e.g., "quit", "sort_subcategories").
    /// Values are key strings (e.g., "q", "Ctrl+s", "F5").
    ///
    /// Returns a list of warnings for unrecognized action names or unparseable keys.
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, String>) -> Vec<String> {
        let mut warnings = Vec::new();

        for (action_name, key_str) in overrides {
            let action = match parse_action_name(action_name) {
                Some(a) => a,
                None => {
                    warnings.push(format!("Unknown action '{}', ignoring", action_name));
                    continue;
                }
            };

            let key = match parse_key_string(key_str) {
                Some(k) => k,
                None => {
                    warnings.push(format!(
                        "Cannot parse key '{}' for action '{}', ignoring",
                        key_str, action_name
                    ));
                    continue;
                }
            };

            // Re-bind in every context the action was bound in, once per context.
            let mut contexts_for_action: Vec<Context> = Vec::new();
            for (ctx, _, a) in &self.bindings {
                if *a == action && !contexts_for_action.contains(ctx) {
                    contexts_for_action.push(*ctx);
                }
            }

            self.lookup.retain(|_, a| *a != action);
            self.bindings.retain(|(_, _, a)| *a != action);

            for ctx in contexts_for_action {
                self.bind(ctx, key, action);
            }

            tracing::info!(
                action = %action_name,
                key = %key_str,
                "Applied keybinding override"
            );
        }

        warnings
    }

    /// Look up the action for a given key in a given context.
    ///
    /// Tries the specific context first, then falls back to Global.
    pub fn action_for_key(
        &self,
        code: KeyCode,
        modifiers: KeyModifiers,
        context: Context,
    ) -> Option<Action> {
        let key = KeySpec::new(code, modifiers);

        if let Some(&action) = self.lookup.get(&(context, key)) {
            return Some(action);
        }

        if context != Context::Global {
            if let Some(&action) = self.lookup.get(&(Context::Global, key)) {
                return Some(action);
            }
        }

        None
    }

    /// Get all bindings for the help screen.
    ///
    /// Returns (context, key_display_string, action, description) tuples.
    pub fn all_bindings(&self) -> Vec<(Context, String, Action, &'static str)> {
        self.bindings
            .iter()
            .map(|(ctx, key, action)| (*ctx, format_key(key), *action, action.describe()))
            .collect()
    }

    /// First key bound to `action` in `context`, for inline hints.
    pub fn key_hint(&self, context: Context, action: Action) -> Option<String> {
        self.bindings
            .iter()
            .find(|(c, _, a)| *c == context && *a == action)
            .map(|(_, key, _)| format_key(key))
    }
}

impl Default for KeybindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an action name string (from config) into an Action enum.
fn parse_action_name(name: &str) -> Option<Action> {
    match name.to_lowercase().as_str() {
        "quit" => Some(Action::Quit),
        "nav_down" | "navdown" | "down" => Some(Action::NavDown),
        "nav_up" | "navup" | "up" => Some(Action::NavUp),
        "cycle_focus" | "cyclefocus" | "tab" => Some(Action::CycleFocus),
        "back" => Some(Action::Back),
        "select" | "enter" => Some(Action::Select),
        "reload" | "refresh" => Some(Action::Reload),
        "show_all_products" | "showallproducts" | "all_products" => {
            Some(Action::ShowAllProducts)
        }
        "sort_subcategories" | "open_sort" | "opensort" | "sort" => Some(Action::OpenSort),
        "add_category" | "addcategory" => Some(Action::AddCategory),
        "add_subcategory" | "addsubcategory" => Some(Action::AddSubcategory),
        "edit_item" | "edititem" | "edit" => Some(Action::EditItem),
        "cycle_theme" | "cycletheme" | "theme" => Some(Action::CycleTheme),
        "show_help" | "showhelp" | "help" => Some(Action::ShowHelp),
        "pick_up" | "pickup" | "drag" => Some(Action::PickUp),
        "save_order" | "saveorder" => Some(Action::SaveOrder),
        "cancel_sort" | "cancelsort" => Some(Action::CancelSort),
        "next_field" | "nextfield" => Some(Action::NextField),
        "prev_field" | "prevfield" => Some(Action::PrevField),
        "submit_form" | "submitform" | "save_form" => Some(Action::SubmitForm),
        "cancel_form" | "cancelform" => Some(Action::CancelForm),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

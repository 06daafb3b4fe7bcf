//! Menu entries as seen by backends.
//!
//! A [`MenuEntry`] is a [`MenuItem`](crate::menu::MenuItem) whose callbacks
//! have already been bound to their icon, so backends can invoke them without
//! knowing the icon's type.

use std::fmt;
use std::sync::Arc;

/// A bound menu callback.
pub type Action = Arc<dyn Fn() + Send + Sync>;

/// A bound radio-group callback, receiving the selected index.
pub type SelectAction = Arc<dyn Fn(usize) + Send + Sync>;

#[derive(Clone)]
pub enum MenuEntry {
    Standard {
        label: String,
        icon_name: String,
        enabled: bool,
        visible: bool,
        default: bool,
        action: Option<Action>,
    },
    Checkmark {
        label: String,
        icon_name: String,
        enabled: bool,
        visible: bool,
        checked: bool,
        action: Option<Action>,
    },
    RadioGroup {
        selected: usize,
        options: Vec<RadioEntry>,
        on_select: Option<SelectAction>,
    },
    SubMenu {
        label: String,
        icon_name: String,
        enabled: bool,
        visible: bool,
        submenu: Vec<MenuEntry>,
    },
    Separator,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RadioEntry {
    pub label: String,
    pub icon_name: String,
    pub enabled: bool,
    pub visible: bool,
}

impl MenuEntry {
    /// Returns the action of the first enabled top-level default item.
    pub fn default_action(entries: &[MenuEntry]) -> Option<Action> {
        entries.iter().find_map(|entry| match entry {
            MenuEntry::Standard {
                default: true,
                enabled: true,
                action,
                ..
            } => action.clone(),
            _ => None,
        })
    }

    /// Follows `path` (one index per nesting level) to an entry.
    pub fn find_mut<'a>(entries: &'a mut [MenuEntry], path: &[usize]) -> Option<&'a mut MenuEntry> {
        let (first, rest) = path.split_first()?;
        let entry = entries.get_mut(*first)?;
        if rest.is_empty() {
            return Some(entry);
        }
        match entry {
            MenuEntry::SubMenu { submenu, .. } => Self::find_mut(submenu, rest),
            _ => None,
        }
    }

    /// Toggles the checkmark at `path`, returning its new state.
    pub fn toggle_checkmark(entries: &mut [MenuEntry], path: &[usize]) -> Option<bool> {
        match Self::find_mut(entries, path)? {
            MenuEntry::Checkmark { checked, .. } => {
                *checked = !*checked;
                Some(*checked)
            }
            _ => None,
        }
    }

    /// Selects `index` in the radio group at `path`.
    ///
    /// Returns `false` if there is no such group or the index is out of range.
    pub fn select_radio(entries: &mut [MenuEntry], path: &[usize], index: usize) -> bool {
        match Self::find_mut(entries, path) {
            Some(MenuEntry::RadioGroup {
                selected, options, ..
            }) if index < options.len() => {
                *selected = index;
                true
            }
            _ => false,
        }
    }
}

impl fmt::Debug for MenuEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuEntry::Standard {
                label,
                enabled,
                default,
                ..
            } => f
                .debug_struct("Standard")
                .field("label", label)
                .field("enabled", enabled)
                .field("default", default)
                .finish_non_exhaustive(),
            MenuEntry::Checkmark { label, checked, .. } => f
                .debug_struct("Checkmark")
                .field("label", label)
                .field("checked", checked)
                .finish_non_exhaustive(),
            MenuEntry::RadioGroup {
                selected, options, ..
            } => f
                .debug_struct("RadioGroup")
                .field("selected", selected)
                .field("options", options)
                .finish_non_exhaustive(),
            MenuEntry::SubMenu { label, submenu, .. } => f
                .debug_struct("SubMenu")
                .field("label", label)
                .field("submenu", submenu)
                .finish_non_exhaustive(),
            MenuEntry::Separator => f.write_str("Separator"),
        }
    }
}

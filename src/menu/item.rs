//! Menu item data structures.
//!
//! This module defines the menu items an application attaches to an icon:
//! standard items, checkmarks, radio groups, submenus, and separators. Their
//! callbacks receive the [`Icon`] the menu belongs to.

use crate::backend::Backend;
use crate::icon::Icon;
use crate::icon::handler::{Binder, Callback, SelectCallback};
use crate::menu::entry::{MenuEntry, RadioEntry};
use std::sync::Arc;

/// A single entry of an icon's popup menu.
pub enum MenuItem<B: Backend> {
    /// A standard clickable menu item.
    Standard {
        /// Display text for the menu item.
        label: String,
        /// Icon name from the freedesktop icon theme.
        icon_name: String,
        /// Whether the item can be clicked.
        enabled: bool,
        /// Whether the item is visible in the menu.
        visible: bool,
        /// Whether this item is the icon's default action.
        ///
        /// Only the first top-level default item counts. It is invoked when
        /// the icon is activated and no left-click callback is set.
        default: bool,
        /// Invoked when the item is clicked.
        action: Option<Callback<B>>,
    },
    /// A menu item with a checkmark that is toggled on every click.
    Checkmark {
        label: String,
        icon_name: String,
        enabled: bool,
        visible: bool,
        /// Initial checked state.
        checked: bool,
        /// Invoked after the checkmark has been toggled.
        action: Option<Callback<B>>,
    },
    /// A group of mutually exclusive radio button options.
    RadioGroup {
        /// Index of the initially selected option.
        selected: usize,
        options: Vec<RadioOption>,
        /// Invoked with the index of the newly selected option.
        on_select: Option<SelectCallback<B>>,
    },
    /// A submenu that contains other menu items.
    SubMenu {
        label: String,
        icon_name: String,
        enabled: bool,
        visible: bool,
        submenu: Vec<MenuItem<B>>,
    },
    /// A visual separator line in the menu.
    Separator,
}

/// A single radio button option within a radio group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RadioOption {
    pub label: String,
    pub icon_name: String,
    pub enabled: bool,
    pub visible: bool,
}

impl RadioOption {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            icon_name: String::new(),
            enabled: true,
            visible: true,
        }
    }
}

impl<B: Backend> MenuItem<B> {
    /// A clickable item running `action`.
    pub fn action<F>(label: impl Into<String>, action: F) -> Self
    where
        F: Fn(&Icon<B>) + Send + Sync + 'static,
    {
        Self::Standard {
            label: label.into(),
            icon_name: String::new(),
            enabled: true,
            visible: true,
            default: false,
            action: Some(Arc::new(action)),
        }
    }

    /// Like [`action`](Self::action), but also marked as the default item.
    pub fn default_action<F>(label: impl Into<String>, action: F) -> Self
    where
        F: Fn(&Icon<B>) + Send + Sync + 'static,
    {
        match Self::action(label, action) {
            Self::Standard {
                label,
                icon_name,
                enabled,
                visible,
                action,
                ..
            } => Self::Standard {
                label,
                icon_name,
                enabled,
                visible,
                default: true,
                action,
            },
            other => other,
        }
    }

    /// A disabled item without action, used as a caption.
    pub fn label(label: impl Into<String>) -> Self {
        Self::Standard {
            label: label.into(),
            icon_name: String::new(),
            enabled: false,
            visible: true,
            default: false,
            action: None,
        }
    }

    pub fn checkmark<F>(label: impl Into<String>, checked: bool, action: F) -> Self
    where
        F: Fn(&Icon<B>) + Send + Sync + 'static,
    {
        Self::Checkmark {
            label: label.into(),
            icon_name: String::new(),
            enabled: true,
            visible: true,
            checked,
            action: Some(Arc::new(action)),
        }
    }

    pub fn radio<F>(options: Vec<RadioOption>, selected: usize, on_select: F) -> Self
    where
        F: Fn(&Icon<B>, usize) + Send + Sync + 'static,
    {
        Self::RadioGroup {
            selected,
            options,
            on_select: Some(Arc::new(on_select)),
        }
    }

    pub fn submenu(label: impl Into<String>, submenu: Vec<MenuItem<B>>) -> Self {
        Self::SubMenu {
            label: label.into(),
            icon_name: String::new(),
            enabled: true,
            visible: true,
            submenu,
        }
    }

    /// Attaches a theme icon to items that display one.
    pub fn with_icon_name(mut self, name: impl Into<String>) -> Self {
        match &mut self {
            Self::Standard { icon_name, .. }
            | Self::Checkmark { icon_name, .. }
            | Self::SubMenu { icon_name, .. } => *icon_name = name.into(),
            Self::RadioGroup { .. } | Self::Separator => {}
        }
        self
    }

    /// Converts the item into its backend form, binding callbacks to the icon.
    pub(crate) fn bind(&self, binder: &Binder<B>) -> MenuEntry {
        match self {
            Self::Standard {
                label,
                icon_name,
                enabled,
                visible,
                default,
                action,
            } => MenuEntry::Standard {
                label: label.clone(),
                icon_name: icon_name.clone(),
                enabled: *enabled,
                visible: *visible,
                default: *default,
                action: action.as_ref().map(|cb| binder.action(cb.clone())),
            },
            Self::Checkmark {
                label,
                icon_name,
                enabled,
                visible,
                checked,
                action,
            } => MenuEntry::Checkmark {
                label: label.clone(),
                icon_name: icon_name.clone(),
                enabled: *enabled,
                visible: *visible,
                checked: *checked,
                action: action.as_ref().map(|cb| binder.action(cb.clone())),
            },
            Self::RadioGroup {
                selected,
                options,
                on_select,
            } => MenuEntry::RadioGroup {
                selected: *selected,
                options: options
                    .iter()
                    .map(|opt| RadioEntry {
                        label: opt.label.clone(),
                        icon_name: opt.icon_name.clone(),
                        enabled: opt.enabled,
                        visible: opt.visible,
                    })
                    .collect(),
                on_select: on_select.as_ref().map(|cb| binder.select(cb.clone())),
            },
            Self::SubMenu {
                label,
                icon_name,
                enabled,
                visible,
                submenu,
            } => MenuEntry::SubMenu {
                label: label.clone(),
                icon_name: icon_name.clone(),
                enabled: *enabled,
                visible: *visible,
                submenu: submenu.iter().map(|item| item.bind(binder)).collect(),
            },
            Self::Separator => MenuEntry::Separator,
        }
    }
}

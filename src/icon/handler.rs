//! Binding user callbacks to their icon.
//!
//! Callbacks are written against `&Icon<B>`, but backends only see plain
//! closures. A [`Binder`] closes over a weak reference to the icon and hands
//! the icon back to the callback on every invocation, without keeping the
//! icon alive.

use crate::backend::Backend;
use crate::icon::{Icon, IconInner};
use crate::menu::{Action, SelectAction};
use std::sync::{Arc, Weak};

/// A callback receiving the icon it is attached to.
pub type Callback<B> = Arc<dyn Fn(&Icon<B>) + Send + Sync>;

/// A radio-group callback receiving the icon and the selected index.
pub type SelectCallback<B> = Arc<dyn Fn(&Icon<B>, usize) + Send + Sync>;

pub(crate) struct Binder<B: Backend> {
    icon: Weak<IconInner<B>>,
}

impl<B: Backend> Binder<B> {
    pub(crate) fn new(icon: Weak<IconInner<B>>) -> Self {
        Self { icon }
    }

    pub(crate) fn action(&self, callback: Callback<B>) -> Action {
        let icon = self.icon.clone();
        Arc::new(move || {
            if let Some(inner) = icon.upgrade() {
                callback(&Icon { inner });
            }
        })
    }

    pub(crate) fn select(&self, callback: SelectCallback<B>) -> SelectAction {
        let icon = self.icon.clone();
        Arc::new(move |index| {
            if let Some(inner) = icon.upgrade() {
                callback(&Icon { inner }, index);
            }
        })
    }
}

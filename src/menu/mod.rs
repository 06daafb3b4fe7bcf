//! Popup menus.
//!
//! Applications describe menus with [`MenuItem`]; the icon binds their
//! callbacks and hands backends the resulting [`MenuEntry`] tree.

pub mod entry;
pub mod item;

pub use entry::{Action, MenuEntry, RadioEntry, SelectAction};
pub use item::{MenuItem, RadioOption};

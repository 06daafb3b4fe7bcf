//! Events sent from tray callbacks to the Godot node.
//!
//! Callbacks run on the icon's event loop, which the node drives from its
//! `process` step; the node drains these events afterwards and turns them
//! into Godot signals.

/// Events emitted by the tray icon towards the Godot node.
pub enum TrayEvent {
    /// The icon was activated with the primary button.
    LeftClicked,
    /// The icon was activated with the secondary button.
    RightClicked,
    /// A standard menu item was activated.
    MenuActivated(String),
    /// A checkmark menu item was clicked; the node tracks the new state.
    CheckmarkToggled(String),
    /// An option of a radio group was selected: group ID and option index.
    RadioSelected(String, usize),
}

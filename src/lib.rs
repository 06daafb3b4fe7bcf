//! # systray
//!
//! A system tray icon with a popup menu, click handlers and desktop
//! notifications, controllable from any thread.
//!
//! ## Overview
//!
//! An [`Icon`] holds the platform-independent state of a tray icon: its
//! image, title, visibility and menu. A [`Backend`] turns that state into
//! native calls. On Linux, [`SniBackend`] exports the icon over D-Bus as a
//! StatusNotifierItem (AppIndicator) using [ksni](https://crates.io/crates/ksni)
//! and shows notifications through the freedesktop notification service.
//!
//! Native objects belong to the backend's event loop thread. Property setters
//! may be called from any thread: they only queue work onto that loop (see
//! [`mainloop`]), so they never block on the native side.
//!
//! ## Lifecycle
//!
//! 1. Build the icon with [`Icon::builder`].
//! 2. Call [`Icon::run`] to drive the event loop on the current thread, or
//!    [`Icon::run_detached`] when the host application owns the loop.
//! 3. Once the backend is ready, a setup callback runs on its own thread. The
//!    default one shows the icon.
//! 4. Call [`Icon::stop`] from anywhere (a menu item, another thread) to leave
//!    the loop.
//!
//! ## Example
//!
//! ```no_run
//! use systray::image::{Rgba, RgbaImage};
//! use systray::{Icon, MenuItem, PlatformBackend};
//!
//! let icon = Icon::<PlatformBackend>::builder("my_app")
//!     .icon(RgbaImage::from_pixel(32, 32, Rgba([200, 40, 40, 255])))
//!     .title("My Application")
//!     .on_left_click(|icon| {
//!         let _ = icon.notify("Clicked!", None);
//!     })
//!     .menu(vec![
//!         MenuItem::default_action("Say hello", |icon| {
//!             let _ = icon.notify("Hello", Some("Greeting"));
//!         }),
//!         MenuItem::Separator,
//!         MenuItem::action("Quit", |icon| icon.stop()),
//!     ])
//!     .option("sni_category", "application")
//!     .build();
//!
//! icon.run().unwrap();
//! ```
//!
//! ## Platform options
//!
//! Backend-specific options are passed as `"<prefix>_<key>"` pairs through
//! [`IconBuilder::option`]. Each backend only sees pairs carrying its own
//! [`Backend::OPTION_PREFIX`]. The options understood by the
//! StatusNotifierItem backend are listed in [`backend::sni`].
//!
//! ## Godot
//!
//! With the `godot` feature, a `TrayIcon` node exposes the icon to GDScript.
//! Enable `gdextension` as well to build a standalone extension library.

// Module declarations
pub mod backend;
pub mod error;
#[cfg(feature = "godot")]
pub mod godot;
pub mod icon;
pub mod mainloop;
pub mod menu;
pub mod notification;
pub mod options;

// Public re-exports
pub use backend::sni::SniBackend;
pub use backend::{Backend, BackendContext, Capabilities, PlatformBackend};
pub use error::{Error, Result};
#[cfg(feature = "godot")]
pub use godot::TrayIcon;
pub use icon::{Icon, IconBuilder, ReadySignal};
pub use image;
pub use menu::{MenuEntry, MenuItem, RadioOption};
pub use options::Options;

// Conditional GDExtension entry point
#[cfg(feature = "gdextension")]
mod gdextension {
    use godot::prelude::*;

    struct SystrayExtension;

    #[gdextension]
    unsafe impl ExtensionLibrary for SystrayExtension {}
}

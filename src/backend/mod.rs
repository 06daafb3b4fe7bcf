//! Platform backends.
//!
//! A backend turns the abstract icon state into calls against a native tray
//! implementation. Every operation except `run`/`run_detached` is expected to
//! return immediately, marshaling the actual native call onto the backend's
//! event loop (see [`crate::mainloop`]).

pub mod fs_icon;
pub mod sni;

use crate::error::{Error, Result};
use crate::icon::ReadySignal;
use crate::menu::{Action, MenuEntry};
use crate::options::Options;
use image::RgbaImage;
use log::debug;
use std::sync::Arc;

/// The backend used by default on this platform.
pub type PlatformBackend = sni::SniBackend;

/// Everything a backend receives when its icon is built.
pub struct BackendContext {
    /// The icon name, used by the system to identify the icon.
    pub name: String,
    /// Options carrying the backend's prefix, with the prefix stripped.
    pub options: Options,
    pub left_click: Option<Action>,
    pub right_click: Option<Action>,
}

pub trait Backend: Send + Sync + Sized + 'static {
    /// Prefix selecting this backend's options, e.g. `"sni_"`.
    const OPTION_PREFIX: &'static str;

    /// Whether clicking the icon can invoke a default action.
    const HAS_DEFAULT_ACTION: bool = true;

    /// Whether popup menus are supported.
    const HAS_MENU: bool = true;

    /// Whether mutually exclusive radio items are supported.
    const HAS_MENU_RADIO: bool = true;

    /// Whether notifications are supported.
    const HAS_NOTIFICATION: bool = true;

    fn new(context: BackendContext) -> Self;

    fn show(&self);

    fn hide(&self);

    /// Replaces the displayed image.
    fn update_icon(&self, image: Arc<RgbaImage>);

    fn update_title(&self, title: &str);

    fn update_menu(&self, menu: Vec<MenuEntry>) {
        debug!("Backend has no menu support, ignoring {} entries", menu.len());
    }

    /// Runs the event loop until [`stop`](Self::stop) is called.
    ///
    /// Implementations must fire `ready` once their native objects exist.
    fn run(&self, ready: ReadySignal) -> Result<()>;

    /// Prepares the backend for an event loop owned by the host application.
    ///
    /// Implementations must fire `ready` once their native objects exist.
    fn run_detached(&self, ready: ReadySignal) -> Result<()> {
        ready.cancel();
        Err(Error::NotImplemented("detached run"))
    }

    /// Asks the event loop to exit.
    ///
    /// When called from outside the loop thread, blocks until the loop has
    /// returned.
    fn stop(&self);

    /// Returns `true` when called from the backend's event loop thread.
    fn is_loop_thread(&self) -> bool {
        false
    }

    fn notify(&self, message: &str, title: &str);

    fn remove_notification(&self);
}

/// The static feature set of a backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    pub default_action: bool,
    pub menu: bool,
    pub menu_radio: bool,
    pub notification: bool,
}

impl Capabilities {
    pub fn of<B: Backend>() -> Self {
        Self {
            default_action: B::HAS_DEFAULT_ACTION,
            menu: B::HAS_MENU,
            menu_radio: B::HAS_MENU_RADIO,
            notification: B::HAS_NOTIFICATION,
        }
    }
}

/// Restores the default SIGINT disposition so Ctrl+C still terminates the
/// process while a native loop is running.
pub fn restore_default_sigint() {
    use nix::sys::signal::{SigHandler, Signal, signal};

    // SAFETY: installing the default disposition does not run any handler code.
    if let Err(e) = unsafe { signal(Signal::SIGINT, SigHandler::SigDfl) } {
        debug!("Could not restore default SIGINT handler: {e}");
    }
}

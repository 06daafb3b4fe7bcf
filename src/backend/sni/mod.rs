//! StatusNotifierItem backend.
//!
//! Exports the icon over D-Bus using [ksni](https://crates.io/crates/ksni),
//! which works with KDE Plasma, the GNOME AppIndicator extension and other
//! hosts implementing the StatusNotifierItem/AppIndicator protocol.
//! Notifications go through the freedesktop notification service.
//!
//! All native state lives in [`SniNative`], which is only ever touched from
//! the backend's event loop thread.
//!
//! Supported options (prefix `sni_`):
//!
//! - `category`: `application` (default), `communications`, `system` or
//!   `hardware`
//! - `icon_dir`: directory for the temporary icon file handed to the
//!   notification service
//! - `app_name`: application name shown on notifications; defaults to the
//!   icon name

pub mod menu;
pub mod tray;

pub use tray::{SniCategory, SniTray};

use crate::backend::fs_icon::FsIcon;
use crate::backend::{Backend, BackendContext, restore_default_sigint};
use crate::error::{Error, Result};
use crate::icon::ReadySignal;
use crate::mainloop::{self, LoopHandle, MainLoop};
use crate::menu::{Action, MenuEntry};
use crate::notification::Notifier;
use crate::options::Options;
use image::RgbaImage;
use ksni::blocking::TrayMethods;
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;

/// Settings derived from the icon name and `sni_` options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SniConfig {
    pub id: String,
    pub category: SniCategory,
    pub icon_dir: Option<PathBuf>,
    pub app_name: String,
}

impl SniConfig {
    /// Reads the supported options, logging and skipping invalid values.
    pub fn new(name: &str, options: &Options) -> Self {
        let category = options.parse::<SniCategory>("category").unwrap_or_else(|e| {
            warn!("Ignoring option: {}", e);
            None
        });

        for (key, _) in options.iter() {
            if !matches!(key, "category" | "icon_dir" | "app_name") {
                warn!("Ignoring unknown option `{}{}`", SniBackend::OPTION_PREFIX, key);
            }
        }

        let icon_dir = options.get("icon_dir").map(PathBuf::from).filter(|dir| {
            let usable = dir.is_dir();
            if !usable {
                warn!("Ignoring option `icon_dir`: {} is not a directory", dir.display());
            }
            usable
        });

        Self {
            id: name.to_string(),
            category: category.unwrap_or_default(),
            icon_dir,
            app_name: options.get("app_name").unwrap_or(name).to_string(),
        }
    }
}

/// Native objects owned by the event loop thread.
pub struct SniNative {
    /// The latest item state; exported again on every show.
    tray: SniTray,
    handle: Option<ksni::blocking::Handle<SniTray>>,
    fs_icon: FsIcon,
    notifier: Notifier,
}

impl SniNative {
    fn new(config: &SniConfig, tray: SniTray) -> Self {
        Self {
            tray,
            handle: None,
            fs_icon: FsIcon::new(config.icon_dir.clone()),
            notifier: Notifier::new(config.app_name.clone()),
        }
    }

    fn show(&mut self) -> Result<()> {
        if self.handle.is_some() {
            return Ok(());
        }
        let handle = self
            .tray
            .clone()
            .spawn()
            .map_err(|e| Error::Toolkit(format!("Failed to spawn tray: {}", e)))?;
        debug!("Exported tray {}", self.tray.id);
        self.handle = Some(handle);
        Ok(())
    }

    fn hide(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!("Withdrawing tray {}", self.tray.id);
            let _ = handle.shutdown();
        }
    }

    /// Applies `change` to the stored state and to the exported item, if any.
    fn apply<F>(&mut self, change: F)
    where
        F: Fn(&mut SniTray) + Send + Sync,
    {
        change(&mut self.tray);
        if let Some(handle) = &self.handle {
            let _ = handle.update(|tray: &mut SniTray| change(tray));
        }
    }

    /// The file copy only serves notifications, so failing to write it
    /// leaves them without an icon but still updates the item.
    fn update_icon(&mut self, image: &RgbaImage) {
        if let Err(e) = self.fs_icon.update(image) {
            warn!("Failed to write icon file: {}", e);
        }
        let pixmap = tray::to_pixmap(image);
        self.apply(|tray| tray.pixmap = vec![pixmap.clone()]);
    }

    fn notify(&mut self, title: &str, message: &str) {
        // Failures are logged by the notifier and must not end the loop.
        let _ = self.notifier.notify(title, message, self.fs_icon.path());
    }

    /// Tears down everything created since initialization.
    fn finalize(&mut self) {
        self.hide();
        self.fs_icon.remove();
        self.notifier.hide();
    }
}

struct Detached {
    main_loop: MainLoop<SniNative>,
    native: SniNative,
}

/// The StatusNotifierItem backend. See the [module docs](self).
pub struct SniBackend {
    config: SniConfig,
    left_click: Option<Action>,
    right_click: Option<Action>,
    dispatcher: LoopHandle<SniNative>,
    main_loop: Mutex<Option<MainLoop<SniNative>>>,
    detached: Mutex<Option<Detached>>,
}

impl SniBackend {
    pub fn config(&self) -> &SniConfig {
        &self.config
    }

    /// Runs pending operations after [`Backend::run_detached`].
    ///
    /// The host application calls this regularly from the thread driving its
    /// own event loop. Returns `Ok(false)` once the icon has been stopped (or
    /// was never detached), after native objects have been torn down.
    pub fn dispatch_pending(&self) -> Result<bool> {
        let mut slot = self.detached.lock();
        let Some(detached) = slot.as_mut() else {
            return Ok(false);
        };

        let result = detached.main_loop.iteration(&mut detached.native);
        if let Ok(ControlFlow::Continue(())) = result {
            return Ok(true);
        }

        if let Some(mut detached) = slot.take() {
            detached.native.finalize();
            *self.main_loop.lock() = Some(detached.main_loop);
        }
        match result {
            Err(e) => {
                error!("An error occurred in the main loop: {}", e);
                Err(e)
            }
            Ok(_) => Ok(false),
        }
    }

    fn take_main_loop(&self) -> Result<MainLoop<SniNative>> {
        self.main_loop
            .lock()
            .take()
            .ok_or_else(|| Error::InvalidState("the event loop is already running".to_string()))
    }

    /// Performs the initialization shared by `run` and `run_detached`.
    fn initialize(&self) -> SniNative {
        restore_default_sigint();
        let tray = SniTray {
            id: self.config.id.clone(),
            title: String::new(),
            category: self.config.category,
            pixmap: Vec::new(),
            menu: Vec::new(),
            left_click: self.left_click.clone(),
            right_click: self.right_click.clone(),
            dispatcher: self.dispatcher.clone(),
        };
        SniNative::new(&self.config, tray)
    }
}

impl Backend for SniBackend {
    const OPTION_PREFIX: &'static str = "sni_";

    fn new(context: BackendContext) -> Self {
        let (dispatcher, main_loop) = mainloop::channel();
        Self {
            config: SniConfig::new(&context.name, &context.options),
            left_click: context.left_click,
            right_click: context.right_click,
            dispatcher,
            main_loop: Mutex::new(Some(main_loop)),
            detached: Mutex::new(None),
        }
    }

    fn show(&self) {
        self.dispatcher.invoke(|native| native.show());
    }

    fn hide(&self) {
        self.dispatcher.invoke(|native| {
            native.hide();
            Ok(())
        });
    }

    fn update_icon(&self, image: Arc<RgbaImage>) {
        self.dispatcher.invoke(move |native| {
            native.update_icon(&image);
            Ok(())
        });
    }

    fn update_title(&self, title: &str) {
        let title = title.to_string();
        self.dispatcher.invoke(move |native| {
            native.apply(|tray| tray.title = title.clone());
            Ok(())
        });
    }

    fn update_menu(&self, menu: Vec<MenuEntry>) {
        self.dispatcher.invoke(move |native| {
            native.apply(|tray| tray.menu = menu.clone());
            Ok(())
        });
    }

    fn run(&self, ready: ReadySignal) -> Result<()> {
        let main_loop = self.take_main_loop()?;
        let mut native = self.initialize();
        // Fired from inside the loop so that `stop` observes a running loop.
        self.dispatcher.invoke(move |_| {
            ready.fire();
            Ok(())
        });

        info!("Running tray {}", self.config.id);
        let result = main_loop.run(&mut native);
        if let Err(e) = &result {
            error!("An error occurred in the main loop: {}", e);
        }
        native.finalize();
        info!("Tray {} stopped", self.config.id);

        *self.main_loop.lock() = Some(main_loop);
        result
    }

    fn run_detached(&self, ready: ReadySignal) -> Result<()> {
        let main_loop = self.take_main_loop()?;
        let native = self.initialize();
        *self.detached.lock() = Some(Detached { main_loop, native });
        ready.fire();
        info!("Tray {} attached to host event loop", self.config.id);
        Ok(())
    }

    fn stop(&self) {
        self.dispatcher.quit();
        self.dispatcher.wait_exited();
    }

    fn is_loop_thread(&self) -> bool {
        self.dispatcher.is_loop_thread()
    }

    fn notify(&self, message: &str, title: &str) {
        let (message, title) = (message.to_string(), title.to_string());
        self.dispatcher.invoke(move |native| {
            native.notify(&title, &message);
            Ok(())
        });
    }

    fn remove_notification(&self) {
        self.dispatcher.invoke(|native| {
            native.notifier.hide();
            Ok(())
        });
    }
}

impl Drop for SniBackend {
    fn drop(&mut self) {
        if let Some(mut detached) = self.detached.get_mut().take() {
            detached.native.finalize();
        }
    }
}

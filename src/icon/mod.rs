//! The icon lifecycle controller.
//!
//! [`Icon`] owns the platform-independent state of a tray icon (image, title,
//! visibility, menu) and forwards changes to its [`Backend`]. Handles are
//! cheap to clone and can be used from any thread; the backend takes care of
//! running native calls on its own event loop.

pub mod handler;
pub mod ready;

pub use handler::{Callback, SelectCallback};
pub use ready::{ReadySignal, ReadyWaiter, ready_pair};

use crate::backend::{Backend, BackendContext, Capabilities};
use crate::error::{Error, Result};
use crate::menu::{MenuEntry, MenuItem};
use crate::options::Options;
use handler::Binder;
use image::RgbaImage;
use log::{debug, error};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

struct IconState {
    image: Option<Arc<RgbaImage>>,
    /// Whether the backend displays the current image.
    icon_valid: bool,
    title: String,
    /// Whether the backend displays the current title.
    title_valid: bool,
    visible: bool,
    menu: Vec<MenuEntry>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum SessionMode {
    #[default]
    Idle,
    /// Inside [`Icon::run_with`].
    Blocking,
    /// Between [`Icon::run_detached_with`] and [`Icon::stop`].
    Detached,
}

/// The current event loop session. `generation` counts started sessions.
#[derive(Default)]
struct Session {
    mode: SessionMode,
    generation: u64,
}

#[derive(Default)]
struct SetupSlot {
    ready: Option<ReadySignal>,
    thread: Option<JoinHandle<()>>,
}

pub(crate) struct IconInner<B: Backend> {
    name: String,
    options: Options,
    state: Mutex<IconState>,
    setup: Mutex<SetupSlot>,
    session: Mutex<Session>,
    session_ended: Condvar,
    running: AtomicBool,
    binder: Binder<B>,
    backend: B,
}

impl<B: Backend> Drop for IconInner<B> {
    fn drop(&mut self) {
        if self.state.get_mut().visible {
            self.backend.hide();
        }
    }
}

/// A system tray icon.
///
/// The icon is initially hidden. Once the event loop runs, the default setup
/// shows it; otherwise call [`set_visible`](Self::set_visible).
///
/// ```no_run
/// use systray::{Icon, MenuItem, PlatformBackend};
/// use systray::image::{Rgba, RgbaImage};
///
/// let icon = Icon::<PlatformBackend>::builder("example")
///     .icon(RgbaImage::from_pixel(32, 32, Rgba([0, 128, 255, 255])))
///     .title("Example")
///     .menu(vec![MenuItem::action("Quit", |icon| icon.stop())])
///     .build();
///
/// icon.run().unwrap();
/// ```
pub struct Icon<B: Backend> {
    pub(crate) inner: Arc<IconInner<B>>,
}

impl<B: Backend> Clone for Icon<B> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<B: Backend> Icon<B> {
    pub fn builder(name: impl Into<String>) -> IconBuilder<B> {
        IconBuilder::new(name)
    }

    /// The name passed to the builder.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Options addressed to this icon's backend, without their prefix.
    pub fn options(&self) -> &Options {
        &self.inner.options
    }

    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities::of::<B>()
    }

    /// The current image.
    pub fn icon(&self) -> Option<Arc<RgbaImage>> {
        self.inner.state.lock().image.clone()
    }

    /// Replaces the image.
    ///
    /// Clearing the image hides the icon. Setting an image while the icon is
    /// hidden takes effect when it is next shown.
    pub fn set_icon(&self, image: Option<RgbaImage>) {
        let mut state = self.inner.state.lock();
        state.image = image.map(Arc::new);
        state.icon_valid = false;

        if !state.visible {
            return;
        }
        match state.image.clone() {
            Some(image) => {
                self.inner.backend.update_icon(image);
                state.icon_valid = true;
            }
            None => self.hide_locked(&mut state),
        }
    }

    pub fn title(&self) -> String {
        self.inner.state.lock().title.clone()
    }

    /// Replaces the title.
    ///
    /// Setting the current title again does nothing. A title set while the
    /// icon is hidden is pushed to the backend when it is next shown.
    pub fn set_title(&self, title: impl Into<String>) {
        let title = title.into();
        let mut state = self.inner.state.lock();
        if state.title == title {
            return;
        }
        state.title = title;
        if state.visible {
            self.inner.backend.update_title(&state.title);
            state.title_valid = true;
        } else {
            state.title_valid = false;
        }
    }

    /// Whether the icon is currently visible.
    pub fn visible(&self) -> bool {
        self.inner.state.lock().visible
    }

    /// Shows or hides the icon.
    ///
    /// Fails with [`Error::InvalidState`] when asked to show an icon without
    /// an image.
    pub fn set_visible(&self, visible: bool) -> Result<()> {
        let mut state = self.inner.state.lock();
        if state.visible == visible {
            return Ok(());
        }

        if !visible {
            self.hide_locked(&mut state);
            return Ok(());
        }

        let image = state
            .image
            .clone()
            .ok_or_else(|| Error::InvalidState("cannot show icon without icon data".to_string()))?;
        let backend = &self.inner.backend;
        if !state.icon_valid {
            backend.update_icon(image);
            state.icon_valid = true;
        }
        if !state.title_valid {
            backend.update_title(&state.title);
            state.title_valid = true;
        }
        backend.show();
        state.visible = true;
        Ok(())
    }

    fn hide_locked(&self, state: &mut IconState) {
        self.inner.backend.hide();
        state.visible = false;
    }

    /// Replaces the popup menu.
    pub fn set_menu(&self, menu: Vec<MenuItem<B>>) {
        let entries: Vec<MenuEntry> = menu
            .iter()
            .map(|item| item.bind(&self.inner.binder))
            .collect();
        let mut state = self.inner.state.lock();
        state.menu = entries.clone();
        self.inner.backend.update_menu(entries);
    }

    /// Pushes the current menu to the backend again, resetting any checkmark
    /// or radio state changed by clicks.
    pub fn update_menu(&self) {
        let state = self.inner.state.lock();
        self.inner.backend.update_menu(state.menu.clone());
    }

    /// Number of top-level menu entries.
    pub fn menu_len(&self) -> usize {
        self.inner.state.lock().menu.len()
    }

    /// Whether the event loop is ready and [`stop`](Self::stop) has not been
    /// called since.
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Runs the event loop until [`stop`](Self::stop) is called, showing the
    /// icon once the loop is ready.
    pub fn run(&self) -> Result<()> {
        self.run_with(default_setup::<B>)
    }

    /// Runs the event loop until [`stop`](Self::stop) is called.
    ///
    /// `setup` runs on a separate thread once the loop is ready. It replaces
    /// the default setup, so it must show the icon itself if desired.
    ///
    /// Fails with [`Error::InvalidState`] if the icon is already running.
    /// The backend tears its native objects down when the loop exits, so a
    /// later run starts from a hidden icon again.
    pub fn run_with<F>(&self, setup: F) -> Result<()>
    where
        F: FnOnce(&Icon<B>) + Send + 'static,
    {
        self.begin_session(SessionMode::Blocking)?;
        let ready = match self.start_setup(setup) {
            Ok(ready) => ready,
            Err(e) => {
                self.end_session();
                return Err(e);
            }
        };
        let result = self.inner.backend.run(ready.clone());
        // Releases the setup thread if the loop never became ready.
        ready.cancel();
        self.end_session();
        result
    }

    /// Prepares the icon for an event loop owned by the host application,
    /// showing the icon once ready.
    ///
    /// Fails with [`Error::NotImplemented`] if the backend cannot do this.
    pub fn run_detached(&self) -> Result<()> {
        self.run_detached_with(default_setup::<B>)
    }

    /// Like [`run_detached`](Self::run_detached) with a custom setup callback.
    pub fn run_detached_with<F>(&self, setup: F) -> Result<()>
    where
        F: FnOnce(&Icon<B>) + Send + 'static,
    {
        self.begin_session(SessionMode::Detached)?;
        let result = self
            .start_setup(setup)
            .and_then(|ready| match self.inner.backend.run_detached(ready.clone()) {
                Ok(()) => Ok(()),
                Err(e) => {
                    ready.cancel();
                    Err(e)
                }
            });
        if result.is_err() {
            self.end_session();
        }
        result
    }

    /// Stops the event loop.
    ///
    /// Does nothing to the backend when the icon is not running. After a
    /// blocking [`run`](Self::run), returns once the loop has exited unless
    /// called from the event loop thread. Waits for the setup thread unless
    /// called from it or from the event loop thread.
    pub fn stop(&self) {
        let slot = std::mem::take(&mut *self.inner.setup.lock());
        if let Some(ready) = slot.ready {
            ready.cancel();
        }

        let (mode, generation) = {
            let session = self.inner.session.lock();
            (session.mode, session.generation)
        };
        match mode {
            SessionMode::Idle => debug!("{} is not running, nothing to stop", self.inner.name),
            SessionMode::Blocking => {
                self.inner.backend.stop();
                if !self.inner.backend.is_loop_thread() {
                    self.wait_session_end(generation);
                }
            }
            SessionMode::Detached => {
                self.inner.backend.stop();
                self.end_session();
            }
        }

        if let Some(handle) = slot.thread {
            let own_thread = handle.thread().id() == thread::current().id();
            if own_thread || self.inner.backend.is_loop_thread() {
                debug!("Not joining setup thread of {} from itself", self.inner.name);
            } else if handle.join().is_err() {
                error!("Setup thread of {} panicked", self.inner.name);
            }
        }
        self.inner.running.store(false, Ordering::SeqCst);
    }

    /// Displays a notification, replacing any previous one.
    ///
    /// `title` defaults to the icon title. Fails with
    /// [`Error::NotImplemented`] if the backend has no notification support.
    pub fn notify(&self, message: &str, title: Option<&str>) -> Result<()> {
        if !B::HAS_NOTIFICATION {
            return Err(Error::NotImplemented("notifications"));
        }
        let title = match title {
            Some(title) => title.to_string(),
            None => self.title(),
        };
        self.inner.backend.notify(message, &title);
        Ok(())
    }

    /// Withdraws the current notification.
    pub fn remove_notification(&self) -> Result<()> {
        if !B::HAS_NOTIFICATION {
            return Err(Error::NotImplemented("notifications"));
        }
        self.inner.backend.remove_notification();
        Ok(())
    }

    fn begin_session(&self, mode: SessionMode) -> Result<()> {
        let mut session = self.inner.session.lock();
        if session.mode != SessionMode::Idle {
            return Err(Error::InvalidState(format!(
                "{} is already running",
                self.inner.name
            )));
        }
        session.mode = mode;
        session.generation += 1;
        Ok(())
    }

    /// Marks the session as over. The backend has torn its native objects
    /// down, so everything must be pushed again on the next show.
    fn end_session(&self) {
        {
            let mut state = self.inner.state.lock();
            state.visible = false;
            state.icon_valid = false;
            state.title_valid = state.title.is_empty();
        }
        self.inner.running.store(false, Ordering::SeqCst);

        self.inner.session.lock().mode = SessionMode::Idle;
        self.inner.session_ended.notify_all();
    }

    fn wait_session_end(&self, generation: u64) {
        let mut session = self.inner.session.lock();
        while session.mode == SessionMode::Blocking && session.generation == generation {
            self.inner.session_ended.wait(&mut session);
        }
    }

    fn start_setup<F>(&self, setup: F) -> Result<ReadySignal>
    where
        F: FnOnce(&Icon<B>) + Send + 'static,
    {
        let (ready, waiter) = ready_pair();
        let icon = self.clone();
        let thread = thread::Builder::new()
            .name(format!("{}-setup", self.inner.name))
            .spawn(move || {
                if !waiter.wait() {
                    debug!("Setup of {} cancelled before the loop was ready", icon.name());
                    return;
                }
                icon.inner.running.store(true, Ordering::SeqCst);
                setup(&icon);
            })?;

        let mut slot = self.inner.setup.lock();
        if let Some(previous) = slot.ready.replace(ready.clone()) {
            previous.cancel();
        }
        slot.thread = Some(thread);
        Ok(ready)
    }
}

fn default_setup<B: Backend>(icon: &Icon<B>) {
    if let Err(e) = icon.set_visible(true) {
        error!("Failed to show icon {}: {}", icon.name(), e);
    }
}

/// Builds an [`Icon`].
pub struct IconBuilder<B: Backend> {
    name: String,
    image: Option<RgbaImage>,
    title: String,
    left_click: Option<Callback<B>>,
    right_click: Option<Callback<B>>,
    menu: Vec<MenuItem<B>>,
    options: Vec<(String, String)>,
}

impl<B: Backend> IconBuilder<B> {
    /// Starts an icon called `name`, used by the system to identify it.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: None,
            title: String::new(),
            left_click: None,
            right_click: None,
            menu: Vec::new(),
            options: Vec::new(),
        }
    }

    pub fn icon(mut self, image: RgbaImage) -> Self {
        self.image = Some(image);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn on_left_click<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Icon<B>) + Send + Sync + 'static,
    {
        self.left_click = Some(Arc::new(callback));
        self
    }

    pub fn on_right_click<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Icon<B>) + Send + Sync + 'static,
    {
        self.right_click = Some(Arc::new(callback));
        self
    }

    pub fn menu(mut self, menu: Vec<MenuItem<B>>) -> Self {
        self.menu = menu;
        self
    }

    /// Adds a platform option such as `"sni_category"`.
    ///
    /// Options for other backends are accepted and ignored.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.push((key.into(), value.into()));
        self
    }

    pub fn build(self) -> Icon<B> {
        let Self {
            name,
            image,
            title,
            left_click,
            right_click,
            menu,
            options,
        } = self;
        let options = Options::from_prefixed(B::OPTION_PREFIX, options);

        let inner = Arc::new_cyclic(|weak| {
            let binder = Binder::new(weak.clone());
            let backend = B::new(BackendContext {
                name: name.clone(),
                options: options.clone(),
                left_click: left_click.map(|cb| binder.action(cb)),
                right_click: right_click.map(|cb| binder.action(cb)),
            });
            IconInner {
                name,
                options,
                state: Mutex::new(IconState {
                    image: image.map(Arc::new),
                    icon_valid: false,
                    title_valid: title.is_empty(),
                    title,
                    visible: false,
                    menu: Vec::new(),
                }),
                setup: Mutex::new(SetupSlot::default()),
                session: Mutex::new(Session::default()),
                session_ended: Condvar::new(),
                running: AtomicBool::new(false),
                binder,
                backend,
            }
        });

        let icon = Icon { inner };
        if !menu.is_empty() {
            icon.set_menu(menu);
        }
        icon
    }
}

//! Test backends shared by the integration tests.

#![allow(dead_code)]

use parking_lot::Mutex;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};
use systray::backend::{Backend, BackendContext};
use systray::image::RgbaImage;
use systray::mainloop::{self, LoopHandle, MainLoop};
use systray::menu::Action;
use systray::{Error, Icon, MenuEntry, Options, ReadySignal, Result};

/// A native call as observed by [`RecordingBackend`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Show,
    Hide,
    UpdateIcon,
    UpdateTitle(String),
    UpdateMenu(usize),
    Notify { message: String, title: String },
    RemoveNotification,
}

type Log = Arc<Mutex<Vec<(Call, ThreadId)>>>;

/// Records every native call, together with the thread it ran on.
pub struct RecordingBackend {
    name: String,
    options: Options,
    left_click: Option<Action>,
    right_click: Option<Action>,
    menu: Mutex<Vec<MenuEntry>>,
    log: Log,
    loop_thread: Mutex<Option<ThreadId>>,
    dispatcher: LoopHandle<Log>,
    main_loop: Mutex<Option<MainLoop<Log>>>,
    detached: Mutex<Option<MainLoop<Log>>>,
}

impl RecordingBackend {
    fn record(&self, call: Call) {
        self.dispatcher.invoke(move |log| {
            log.lock().push((call, thread::current().id()));
            Ok(())
        });
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.lock().iter().map(|(call, _)| call.clone()).collect()
    }

    pub fn call_threads(&self) -> Vec<ThreadId> {
        self.log.lock().iter().map(|(_, thread)| *thread).collect()
    }

    /// The thread that last drove the event loop.
    pub fn loop_thread(&self) -> Option<ThreadId> {
        *self.loop_thread.lock()
    }

    pub fn loop_exited(&self) -> bool {
        self.dispatcher.has_exited()
    }

    fn left_action(&self) -> Option<Action> {
        match &self.left_click {
            Some(action) => Some(action.clone()),
            None => MenuEntry::default_action(&self.menu.lock()),
        }
    }

    /// Simulates a primary click, falling back to the default menu item.
    pub fn click_left(&self) {
        if let Some(action) = self.left_action() {
            action();
        }
    }

    /// Like [`click_left`](Self::click_left), but the handler runs on the
    /// event loop thread, the way a native toolkit delivers it.
    pub fn click_left_on_loop(&self) {
        let action = self.left_action();
        self.dispatcher.invoke(move |_| {
            if let Some(action) = action {
                action();
            }
            Ok(())
        });
    }

    pub fn click_right(&self) {
        if let Some(action) = &self.right_click {
            action();
        }
    }

    /// Runs queued calls after a detached run. Returns `false` once stopped.
    pub fn pump(&self) -> bool {
        let mut slot = self.detached.lock();
        let Some(main_loop) = slot.as_ref() else {
            return false;
        };
        *self.loop_thread.lock() = Some(thread::current().id());
        let mut log = self.log.clone();
        match main_loop.iteration(&mut log) {
            Ok(ControlFlow::Continue(())) => true,
            _ => {
                *self.main_loop.lock() = slot.take();
                false
            }
        }
    }

    fn take_main_loop(&self) -> Result<MainLoop<Log>> {
        self.main_loop
            .lock()
            .take()
            .ok_or_else(|| Error::InvalidState("the event loop is already running".to_string()))
    }
}

impl Backend for RecordingBackend {
    const OPTION_PREFIX: &'static str = "test_";

    fn new(context: BackendContext) -> Self {
        let (dispatcher, main_loop) = mainloop::channel();
        Self {
            name: context.name,
            options: context.options,
            left_click: context.left_click,
            right_click: context.right_click,
            menu: Mutex::new(Vec::new()),
            log: Log::default(),
            loop_thread: Mutex::new(None),
            dispatcher,
            main_loop: Mutex::new(Some(main_loop)),
            detached: Mutex::new(None),
        }
    }

    fn show(&self) {
        self.record(Call::Show);
    }

    fn hide(&self) {
        self.record(Call::Hide);
    }

    fn update_icon(&self, _image: Arc<RgbaImage>) {
        self.record(Call::UpdateIcon);
    }

    fn update_title(&self, title: &str) {
        self.record(Call::UpdateTitle(title.to_string()));
    }

    fn update_menu(&self, menu: Vec<MenuEntry>) {
        self.record(Call::UpdateMenu(menu.len()));
        *self.menu.lock() = menu;
    }

    fn run(&self, ready: ReadySignal) -> Result<()> {
        let main_loop = self.take_main_loop()?;
        *self.loop_thread.lock() = Some(thread::current().id());
        self.dispatcher.invoke(move |_| {
            ready.fire();
            Ok(())
        });

        let mut log = self.log.clone();
        let result = main_loop.run(&mut log);
        *self.main_loop.lock() = Some(main_loop);
        result
    }

    fn run_detached(&self, ready: ReadySignal) -> Result<()> {
        let main_loop = self.take_main_loop()?;
        *self.detached.lock() = Some(main_loop);
        ready.fire();
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
        self.record(Call::Notify {
            message: message.to_string(),
            title: title.to_string(),
        });
    }

    fn remove_notification(&self) {
        self.record(Call::RemoveNotification);
    }
}

/// A backend without notifications or a detached mode whose loop never
/// starts.
pub struct InertBackend;

impl Backend for InertBackend {
    const OPTION_PREFIX: &'static str = "inert_";
    const HAS_MENU_RADIO: bool = false;
    const HAS_NOTIFICATION: bool = false;

    fn new(_context: BackendContext) -> Self {
        InertBackend
    }

    fn show(&self) {}

    fn hide(&self) {}

    fn update_icon(&self, _image: Arc<RgbaImage>) {}

    fn update_title(&self, _title: &str) {}

    fn run(&self, _ready: ReadySignal) -> Result<()> {
        Err(Error::Toolkit("no display".to_string()))
    }

    fn stop(&self) {}

    fn notify(&self, _message: &str, _title: &str) {}

    fn remove_notification(&self) {}
}

pub fn image() -> RgbaImage {
    RgbaImage::new(16, 16)
}

/// Runs the icon's blocking loop on a new thread.
pub fn spawn_run(icon: &Icon<RecordingBackend>) -> JoinHandle<Result<()>> {
    let icon = icon.clone();
    thread::Builder::new()
        .name("tray-loop".into())
        .spawn(move || icon.run())
        .unwrap()
}

/// Polls `condition` until it holds, panicking after a few seconds.
pub fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for condition");
        thread::sleep(Duration::from_millis(2));
    }
}

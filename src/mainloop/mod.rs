//! Main-loop marshaling.
//!
//! Native tray objects may only be touched from the thread that drives their
//! event loop. This module provides a small task queue bound to that thread:
//! any thread can submit a closure through a [`LoopHandle`], and the closure
//! runs later on the thread that drives the matching [`MainLoop`], in
//! submission order.
//!
//! ```
//! use systray::mainloop;
//!
//! let (handle, main_loop) = mainloop::channel::<Vec<u32>>();
//! handle.invoke(|log| {
//!     log.push(1);
//!     Ok(())
//! });
//! handle.invoke(|log| {
//!     log.push(2);
//!     Ok(())
//! });
//! handle.quit();
//!
//! let mut log = Vec::new();
//! main_loop.run(&mut log).unwrap();
//! assert_eq!(log, vec![1, 2]);
//! ```

use crate::error::Result;
use log::debug;
use parking_lot::{Condvar, Mutex};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel as mpsc_channel};
use std::thread::{self, ThreadId};

type Task<T> = Box<dyn FnOnce(&mut T) -> Result<()> + Send>;

enum Message<T> {
    Task(Task<T>),
    Quit,
}

#[derive(Default)]
struct LoopState {
    /// Thread currently inside [`MainLoop::run`].
    owner: Option<ThreadId>,
    running: bool,
}

#[derive(Default)]
struct Shared {
    state: Mutex<LoopState>,
    exited: Condvar,
}

/// Creates a connected handle/loop pair.
pub fn channel<T>() -> (LoopHandle<T>, MainLoop<T>) {
    let (sender, receiver) = mpsc_channel();
    let shared = Arc::new(Shared::default());
    (
        LoopHandle {
            sender,
            shared: shared.clone(),
        },
        MainLoop { receiver, shared },
    )
}

/// Submits work to a [`MainLoop`] from any thread.
pub struct LoopHandle<T> {
    sender: Sender<Message<T>>,
    shared: Arc<Shared>,
}

impl<T> Clone for LoopHandle<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            shared: self.shared.clone(),
        }
    }
}

impl<T> LoopHandle<T> {
    /// Schedules `task` to run once on the loop thread.
    ///
    /// The call never blocks and never runs `task` inline, even when invoked
    /// from the loop thread itself. If the loop has been dropped the task is
    /// discarded.
    pub fn invoke<F>(&self, task: F)
    where
        F: FnOnce(&mut T) -> Result<()> + Send + 'static,
    {
        if self.sender.send(Message::Task(Box::new(task))).is_err() {
            debug!("Event loop is gone, discarding task");
        }
    }

    /// Asks the loop to exit once every task queued before this call has run.
    pub fn quit(&self) {
        if self.sender.send(Message::Quit).is_err() {
            debug!("Event loop is gone, nothing to quit");
        }
    }

    /// Returns `true` when called from inside [`MainLoop::run`].
    pub fn is_loop_thread(&self) -> bool {
        self.shared.state.lock().owner == Some(thread::current().id())
    }

    /// Returns `true` unless a blocking [`MainLoop::run`] is in progress.
    pub fn has_exited(&self) -> bool {
        !self.shared.state.lock().running
    }

    /// Blocks until the blocking loop (if any) has returned.
    ///
    /// Returns immediately when called from the loop thread.
    pub fn wait_exited(&self) {
        let mut state = self.shared.state.lock();
        if state.owner == Some(thread::current().id()) {
            return;
        }
        while state.running {
            self.shared.exited.wait(&mut state);
        }
    }
}

/// The receiving side of the task queue, driven by the thread owning the
/// native objects.
pub struct MainLoop<T> {
    receiver: Receiver<Message<T>>,
    shared: Arc<Shared>,
}

impl<T> MainLoop<T> {
    /// Runs queued tasks against `context` until [`LoopHandle::quit`] is
    /// processed.
    ///
    /// A task returning an error terminates the loop and the error is
    /// returned; tasks queued after it stay in the queue.
    pub fn run(&self, context: &mut T) -> Result<()> {
        {
            let mut state = self.shared.state.lock();
            state.owner = Some(thread::current().id());
            state.running = true;
        }

        let result = self.run_inner(context);

        {
            let mut state = self.shared.state.lock();
            state.owner = None;
            state.running = false;
        }
        self.shared.exited.notify_all();
        result
    }

    fn run_inner(&self, context: &mut T) -> Result<()> {
        while let Ok(message) = self.receiver.recv() {
            match message {
                Message::Task(task) => task(context)?,
                Message::Quit => {
                    debug!("Event loop received quit");
                    break;
                }
            }
        }
        Ok(())
    }

    /// Runs every task queued so far without blocking.
    ///
    /// Used when a host application owns the event loop and calls this once
    /// per frame. Returns [`ControlFlow::Break`] once a quit request has been
    /// processed.
    pub fn iteration(&self, context: &mut T) -> Result<ControlFlow<()>> {
        loop {
            match self.receiver.try_recv() {
                Ok(Message::Task(task)) => task(context)?,
                Ok(Message::Quit) => return Ok(ControlFlow::Break(())),
                Err(TryRecvError::Empty) => return Ok(ControlFlow::Continue(())),
                Err(TryRecvError::Disconnected) => return Ok(ControlFlow::Break(())),
            }
        }
    }
}

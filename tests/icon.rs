mod common;

use common::{Call, InertBackend, RecordingBackend, image, spawn_run, wait_until};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use systray::{Capabilities, Error, Icon, MenuItem};

fn recording(title: &str) -> Icon<RecordingBackend> {
    Icon::builder("test").icon(image()).title(title).build()
}

/// Runs the loop until the default setup has shown the icon.
fn run_visible(icon: &Icon<RecordingBackend>) -> thread::JoinHandle<systray::Result<()>> {
    let runner = spawn_run(icon);
    wait_until(|| icon.visible());
    runner
}

fn stop(icon: &Icon<RecordingBackend>, runner: thread::JoinHandle<systray::Result<()>>) {
    icon.stop();
    runner.join().unwrap().unwrap();
}

#[test]
fn showing_without_image_fails() {
    let icon = Icon::<RecordingBackend>::builder("test").title("Test").build();
    let err = icon.set_visible(true).unwrap_err();
    assert!(matches!(err, Error::InvalidState(_)));
    assert!(!icon.visible());
}

#[test]
fn default_setup_shows_icon_once_ready() {
    let icon = recording("Test");
    let runner = run_visible(&icon);
    assert!(icon.is_running());
    stop(&icon, runner);

    assert_eq!(
        icon.backend().calls(),
        vec![Call::UpdateIcon, Call::UpdateTitle("Test".into()), Call::Show]
    );
    assert!(!icon.is_running());
}

#[test]
fn setup_runs_after_loop_started() {
    let icon = recording("Test");
    let (tx, rx) = mpsc::channel();
    let runner = {
        let icon = icon.clone();
        thread::spawn(move || {
            icon.run_with(move |icon| {
                let _ = tx.send(icon.backend().loop_thread().is_some());
            })
        })
    };

    assert!(rx.recv().unwrap());
    // The custom setup replaces the default one, so nothing is shown.
    assert!(!icon.visible());
    stop(&icon, runner);
    assert_eq!(icon.backend().calls(), Vec::<Call>::new());
}

#[test]
fn setup_is_skipped_when_loop_fails_to_start() {
    let icon = Icon::<InertBackend>::builder("inert").icon(image()).build();
    let called = Arc::new(AtomicBool::new(false));
    let flag = called.clone();

    let err = icon
        .run_with(move |_| flag.store(true, Ordering::SeqCst))
        .unwrap_err();
    assert!(matches!(err, Error::Toolkit(_)));

    // Joins the setup thread.
    icon.stop();
    assert!(!called.load(Ordering::SeqCst));
    assert!(!icon.is_running());
}

#[test]
fn stop_from_another_thread_waits_for_loop() {
    let icon = recording("Test");
    let runner = run_visible(&icon);
    assert!(!icon.backend().loop_exited());

    let stopper = {
        let icon = icon.clone();
        thread::spawn(move || {
            icon.stop();
            icon.backend().loop_exited()
        })
    };
    assert!(stopper.join().unwrap());
    runner.join().unwrap().unwrap();
}

#[test]
fn native_calls_run_on_loop_thread_in_order() {
    let icon = recording("Test");
    let runner = run_visible(&icon);
    let loop_thread = runner.thread().id();

    let worker = {
        let icon = icon.clone();
        thread::spawn(move || {
            icon.set_title("One");
            icon.set_title("Two");
            icon.set_icon(Some(image()));
        })
    };
    worker.join().unwrap();
    stop(&icon, runner);

    let backend = icon.backend();
    assert_eq!(backend.loop_thread(), Some(loop_thread));
    assert!(backend.call_threads().iter().all(|id| *id == loop_thread));
    assert_eq!(
        backend.calls()[3..],
        [
            Call::UpdateTitle("One".into()),
            Call::UpdateTitle("Two".into()),
            Call::UpdateIcon,
        ]
    );
}

#[test]
fn setting_same_title_twice_updates_once() {
    let icon = recording("Test");
    let runner = run_visible(&icon);
    icon.set_title("A");
    icon.set_title("A");
    stop(&icon, runner);

    let titles: Vec<Call> = icon
        .backend()
        .calls()
        .into_iter()
        .filter(|call| matches!(call, Call::UpdateTitle(_)))
        .collect();
    assert_eq!(
        titles,
        vec![Call::UpdateTitle("Test".into()), Call::UpdateTitle("A".into())]
    );
    assert_eq!(icon.title(), "A");
}

#[test]
fn title_set_while_hidden_is_pushed_on_show() {
    let icon = recording("Test");
    let runner = spawn_run(&icon);
    icon.set_title("Later");
    wait_until(|| icon.visible());
    stop(&icon, runner);

    assert!(icon.backend().calls().contains(&Call::UpdateTitle("Later".into())));
}

#[test]
fn clearing_image_hides_icon() {
    let icon = recording("Test");
    let runner = run_visible(&icon);
    icon.set_icon(None);
    assert!(!icon.visible());
    assert!(icon.icon().is_none());
    assert!(matches!(icon.set_visible(true), Err(Error::InvalidState(_))));
    stop(&icon, runner);

    assert_eq!(icon.backend().calls().last(), Some(&Call::Hide));
}

#[test]
fn notify_defaults_to_icon_title() {
    let icon = recording("test");
    let runner = run_visible(&icon);
    icon.notify("hello", None).unwrap();
    icon.notify("bye", Some("Custom")).unwrap();
    icon.remove_notification().unwrap();
    stop(&icon, runner);

    assert_eq!(
        icon.backend().calls()[3..],
        [
            Call::Notify {
                message: "hello".into(),
                title: "test".into(),
            },
            Call::Notify {
                message: "bye".into(),
                title: "Custom".into(),
            },
            Call::RemoveNotification,
        ]
    );
}

#[test]
fn setup_can_notify_with_icon_title() {
    let icon = recording("test");
    let runner = {
        let icon = icon.clone();
        thread::spawn(move || {
            icon.run_with(|icon| {
                if let Err(e) = icon.notify("hello", None) {
                    panic!("notify failed: {e}");
                }
            })
        })
    };

    wait_until(|| !icon.backend().calls().is_empty());
    stop(&icon, runner);
    assert_eq!(
        icon.backend().calls(),
        vec![Call::Notify {
            message: "hello".into(),
            title: "test".into(),
        }]
    );
}

#[test]
fn unsupported_operations_report_not_implemented() {
    let icon = Icon::<InertBackend>::builder("inert").icon(image()).build();
    assert!(matches!(
        icon.notify("hello", None),
        Err(Error::NotImplemented(_))
    ));
    assert!(matches!(
        icon.remove_notification(),
        Err(Error::NotImplemented(_))
    ));
    assert!(matches!(icon.run_detached(), Err(Error::NotImplemented(_))));
    icon.stop();

    assert_eq!(
        icon.capabilities(),
        Capabilities {
            default_action: true,
            menu: true,
            menu_radio: false,
            notification: false,
        }
    );
}

#[test]
fn click_handlers_receive_their_icon() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let (left, right) = (seen.clone(), seen.clone());
    let icon = Icon::<RecordingBackend>::builder("test")
        .on_left_click(move |icon| left.lock().push(format!("left:{}", icon.name())))
        .on_right_click(move |icon| right.lock().push(format!("right:{}", icon.name())))
        .build();

    icon.backend().click_left();
    icon.backend().click_right();
    assert_eq!(*seen.lock(), vec!["left:test", "right:test"]);
}

#[test]
fn left_click_falls_back_to_default_menu_item() {
    let count = Arc::new(AtomicUsize::new(0));
    let counter = count.clone();
    let icon = Icon::<RecordingBackend>::builder("test")
        .menu(vec![
            MenuItem::action("Other", |_| panic!("not the default item")),
            MenuItem::default_action("Open", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        ])
        .build();

    icon.backend().click_left();
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(icon.menu_len(), 2);
}

#[test]
fn left_click_callback_wins_over_default_item() {
    let icon = Icon::<RecordingBackend>::builder("test")
        .on_left_click(|icon| icon.set_title("clicked"))
        .menu(vec![MenuItem::default_action("Open", |_| {
            panic!("default item must not run")
        })])
        .build();

    icon.backend().click_left();
    assert_eq!(icon.title(), "clicked");
}

#[test]
fn menu_set_at_build_reaches_backend_first() {
    let icon = Icon::<RecordingBackend>::builder("test")
        .icon(image())
        .menu(vec![
            MenuItem::action("Open", |_| {}),
            MenuItem::Separator,
            MenuItem::action("Quit", |icon| icon.stop()),
        ])
        .build();
    let runner = run_visible(&icon);
    icon.set_menu(vec![MenuItem::label("Busy")]);
    stop(&icon, runner);

    let calls = icon.backend().calls();
    assert_eq!(calls.first(), Some(&Call::UpdateMenu(3)));
    assert_eq!(calls.last(), Some(&Call::UpdateMenu(1)));
    assert_eq!(icon.menu_len(), 1);
}

#[test]
fn options_are_filtered_by_backend_prefix() {
    let icon = Icon::<RecordingBackend>::builder("test")
        .option("test_color", "red")
        .option("sni_category", "system")
        .option("test_", "ignored")
        .build();

    assert_eq!(icon.options().get("color"), Some("red"));
    assert_eq!(icon.options().get("category"), None);
    assert_eq!(icon.options().len(), 1);
    assert_eq!(icon.backend().options(), icon.options());
    assert_eq!(icon.backend().name(), "test");
}

#[test]
fn detached_run_is_driven_by_pumping() {
    let icon = recording("Test");
    icon.run_detached().unwrap();

    wait_until(|| icon.visible());
    assert!(icon.backend().pump());
    assert_eq!(
        icon.backend().calls(),
        vec![Call::UpdateIcon, Call::UpdateTitle("Test".into()), Call::Show]
    );
    assert_eq!(icon.backend().loop_thread(), Some(thread::current().id()));

    icon.stop();
    assert!(!icon.backend().pump());
    assert!(!icon.is_running());
}

#[test]
fn stop_from_loop_thread_does_not_deadlock() {
    let icon = Icon::<RecordingBackend>::builder("test")
        .icon(image())
        .on_left_click(|icon| icon.stop())
        .build();
    let runner = run_visible(&icon);

    icon.backend().click_left_on_loop();
    runner.join().unwrap().unwrap();
    assert!(icon.backend().loop_exited());
    assert!(!icon.is_running());
}

#[test]
fn quit_menu_item_ends_run() {
    let icon = Icon::<RecordingBackend>::builder("test")
        .icon(image())
        .menu(vec![MenuItem::default_action("Quit", |icon| icon.stop())])
        .build();
    let runner = run_visible(&icon);

    icon.backend().click_left_on_loop();
    runner.join().unwrap().unwrap();
    assert!(!icon.visible());
}

#[test]
fn icon_is_shown_again_on_second_run() {
    let icon = recording("Test");
    let runner = run_visible(&icon);
    stop(&icon, runner);
    assert!(!icon.visible());

    let runner = run_visible(&icon);
    stop(&icon, runner);

    let first = vec![Call::UpdateIcon, Call::UpdateTitle("Test".into()), Call::Show];
    assert_eq!(icon.backend().calls(), [first.clone(), first].concat());
}

#[test]
fn icon_is_shown_again_after_detached_restart() {
    let icon = recording("Test");
    for _ in 0..2 {
        icon.run_detached().unwrap();
        wait_until(|| icon.visible());
        assert!(icon.backend().pump());
        icon.stop();
        assert!(!icon.visible());
        assert!(!icon.backend().pump());
    }

    let shows = icon
        .backend()
        .calls()
        .into_iter()
        .filter(|call| *call == Call::Show)
        .count();
    assert_eq!(shows, 2);
}

#[test]
fn stop_on_idle_icon_does_not_end_next_run() {
    let icon = recording("Test");
    icon.stop();

    let runner = run_visible(&icon);
    thread::sleep(Duration::from_millis(20));
    assert!(!runner.is_finished());
    stop(&icon, runner);
}

#[test]
fn running_twice_is_rejected() {
    let icon = recording("Test");
    let runner = run_visible(&icon);

    assert!(matches!(icon.run(), Err(Error::InvalidState(_))));
    assert!(matches!(icon.run_detached(), Err(Error::InvalidState(_))));
    assert!(icon.is_running());
    stop(&icon, runner);
}

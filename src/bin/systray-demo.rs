//! A small tray icon exercising the library: a generated image, a menu with a
//! default item, a checkmark and a radio group, and notifications.
//!
//! Run with `RUST_LOG=debug` to see the event loop at work.

use env_logger::Env;
use log::{error, info};
use systray::image::{Rgba, RgbaImage};
use systray::{Icon, MenuItem, PlatformBackend, RadioOption};

const SIZE: u32 = 32;

/// A filled circle on a transparent background.
fn circle(color: Rgba<u8>) -> RgbaImage {
    let center = (SIZE as f32 - 1.0) / 2.0;
    let radius = SIZE as f32 / 2.0 - 1.0;
    RgbaImage::from_fn(SIZE, SIZE, |x, y| {
        let (dx, dy) = (x as f32 - center, y as f32 - center);
        if dx * dx + dy * dy <= radius * radius {
            color
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

const COLORS: [(&str, Rgba<u8>); 3] = [
    ("Red", Rgba([220, 50, 47, 255])),
    ("Green", Rgba([133, 153, 0, 255])),
    ("Blue", Rgba([38, 139, 210, 255])),
];

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or(log::Level::Info.as_str())).init();

    let icon = Icon::<PlatformBackend>::builder("systray-demo")
        .icon(circle(COLORS[0].1))
        .title("systray demo")
        .on_right_click(|icon| info!("{} was right-clicked", icon.name()))
        .menu(vec![
            MenuItem::default_action("Say hello", |icon| {
                if let Err(e) = icon.notify("Hello from the tray!", None) {
                    error!("Failed to notify: {}", e);
                }
            }),
            MenuItem::checkmark("Quiet", false, |_| info!("Quiet mode toggled")),
            MenuItem::submenu(
                "Color",
                vec![MenuItem::radio(
                    COLORS.iter().map(|(name, _)| RadioOption::new(*name)).collect(),
                    0,
                    |icon, index| {
                        if let Some((name, color)) = COLORS.get(index) {
                            info!("Switching to {}", name);
                            icon.set_icon(Some(circle(*color)));
                        }
                    },
                )],
            ),
            MenuItem::Separator,
            MenuItem::action("Quit", |icon| icon.stop()),
        ])
        .option("sni_category", "application")
        .build();

    info!("Capabilities: {:?}", icon.capabilities());
    if let Err(e) = icon.run() {
        error!("Tray icon failed: {}", e);
        std::process::exit(1);
    }
}

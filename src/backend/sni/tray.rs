//! KSNI tray bridge implementation.
//!
//! This module provides the bridge between the backend's native state and the
//! ksni library, implementing the `ksni::Tray` trait for the
//! StatusNotifierItem specification.

use crate::backend::sni::SniNative;
use crate::backend::sni::menu::build_menu_items;
use crate::error::Error;
use crate::mainloop::LoopHandle;
use crate::menu::{Action, MenuEntry};
use image::RgbaImage;
use ksni::menu::MenuItem;
use std::str::FromStr;

/// The StatusNotifierItem category reported to the host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SniCategory {
    #[default]
    ApplicationStatus,
    Communications,
    SystemServices,
    Hardware,
}

impl FromStr for SniCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "application" => Ok(Self::ApplicationStatus),
            "communications" => Ok(Self::Communications),
            "system" => Ok(Self::SystemServices),
            "hardware" => Ok(Self::Hardware),
            other => Err(Error::InvalidOption {
                key: "category".to_string(),
                reason: format!(
                    "unknown category `{other}`, expected application, communications, system or hardware"
                ),
            }),
        }
    }
}

impl From<SniCategory> for ksni::Category {
    fn from(category: SniCategory) -> Self {
        match category {
            SniCategory::ApplicationStatus => ksni::Category::ApplicationStatus,
            SniCategory::Communications => ksni::Category::Communications,
            SniCategory::SystemServices => ksni::Category::SystemServices,
            SniCategory::Hardware => ksni::Category::Hardware,
        }
    }
}

/// The item exported over D-Bus.
///
/// ksni calls into this struct from its own service thread. User callbacks
/// are never run there: they are queued onto the backend's event loop so
/// they observe the same threading as every other backend operation.
#[derive(Clone)]
pub struct SniTray {
    pub id: String,
    pub title: String,
    pub category: SniCategory,
    pub pixmap: Vec<ksni::Icon>,
    pub menu: Vec<MenuEntry>,
    pub left_click: Option<Action>,
    pub right_click: Option<Action>,
    pub dispatcher: LoopHandle<SniNative>,
}

impl SniTray {
    /// Queues `action` onto the event loop.
    pub fn dispatch(&self, action: Action) {
        self.dispatcher.invoke(move |_| {
            action();
            Ok(())
        });
    }
}

impl ksni::Tray for SniTray {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn category(&self) -> ksni::Category {
        self.category.into()
    }

    fn icon_pixmap(&self) -> Vec<ksni::Icon> {
        self.pixmap.clone()
    }

    fn tool_tip(&self) -> ksni::ToolTip {
        ksni::ToolTip {
            icon_name: String::new(),
            icon_pixmap: vec![],
            title: self.title.clone(),
            description: String::new(),
        }
    }

    fn activate(&mut self, _x: i32, _y: i32) {
        let action = self
            .left_click
            .clone()
            .or_else(|| MenuEntry::default_action(&self.menu));
        if let Some(action) = action {
            self.dispatch(action);
        }
    }

    fn secondary_activate(&mut self, _x: i32, _y: i32) {
        if let Some(action) = self.right_click.clone() {
            self.dispatch(action);
        }
    }

    fn menu(&self) -> Vec<MenuItem<Self>> {
        build_menu_items(&self.menu)
    }
}

/// Converts an RGBA image into the ARGB32 pixmap expected by SNI hosts.
pub fn to_pixmap(image: &RgbaImage) -> ksni::Icon {
    let mut data = image.as_raw().clone();
    for pixel in data.chunks_exact_mut(4) {
        pixel.rotate_right(1);
    }
    ksni::Icon {
        width: image.width() as i32,
        height: image.height() as i32,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn pixmap_is_argb() {
        let image = RgbaImage::from_pixel(2, 1, Rgba([10, 20, 30, 40]));
        let pixmap = to_pixmap(&image);
        assert_eq!(pixmap.width, 2);
        assert_eq!(pixmap.height, 1);
        assert_eq!(pixmap.data, vec![40, 10, 20, 30, 40, 10, 20, 30]);
    }

    #[test]
    fn category_parses_option_values() {
        assert_eq!(
            "hardware".parse::<SniCategory>().unwrap(),
            SniCategory::Hardware
        );
        assert_eq!(
            "application".parse::<SniCategory>().unwrap(),
            SniCategory::ApplicationStatus
        );
        assert!("desktop".parse::<SniCategory>().is_err());
    }
}

//! Menu conversion.
//!
//! Builds the ksni menu structure from bound menu entries. Clicks on
//! checkmarks and radio groups update the exported [`SniTray`] at once and
//! the loop's copy through a queued task, ahead of the user callback, so the
//! state survives the item being exported again.

use crate::backend::sni::tray::SniTray;
use crate::menu::MenuEntry;
use ksni::menu::*;

/// Builds the ksni menu structure from the tray's menu entries.
pub fn build_menu_items(entries: &[MenuEntry]) -> Vec<MenuItem<SniTray>> {
    build_level(entries, &[])
}

fn build_level(entries: &[MenuEntry], parent: &[usize]) -> Vec<MenuItem<SniTray>> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let mut path = parent.to_vec();
            path.push(index);
            build_menu_item(entry, path)
        })
        .collect()
}

/// Converts a single entry into a ksni `MenuItem`.
///
/// `path` locates the entry inside [`SniTray::menu`].
fn build_menu_item(entry: &MenuEntry, path: Vec<usize>) -> MenuItem<SniTray> {
    match entry {
        MenuEntry::Standard {
            label,
            icon_name,
            enabled,
            visible,
            action,
            ..
        } => {
            let action = action.clone();
            StandardItem {
                label: label.clone(),
                icon_name: icon_name.clone(),
                enabled: *enabled,
                visible: *visible,
                activate: Box::new(move |this: &mut SniTray| {
                    if let Some(action) = &action {
                        this.dispatch(action.clone());
                    }
                }),
                ..Default::default()
            }
            .into()
        }
        MenuEntry::Checkmark {
            label,
            icon_name,
            enabled,
            visible,
            checked,
            action,
        } => {
            let action = action.clone();
            CheckmarkItem {
                label: label.clone(),
                icon_name: icon_name.clone(),
                enabled: *enabled,
                visible: *visible,
                checked: *checked,
                activate: Box::new(move |this: &mut SniTray| {
                    if MenuEntry::toggle_checkmark(&mut this.menu, &path).is_none() {
                        return;
                    }
                    let path = path.clone();
                    this.dispatcher.invoke(move |native| {
                        MenuEntry::toggle_checkmark(&mut native.tray.menu, &path);
                        Ok(())
                    });
                    if let Some(action) = &action {
                        this.dispatch(action.clone());
                    }
                }),
                ..Default::default()
            }
            .into()
        }
        MenuEntry::RadioGroup {
            selected,
            options,
            on_select,
        } => {
            let on_select = on_select.clone();
            RadioGroup {
                selected: *selected,
                select: Box::new(move |this: &mut SniTray, index| {
                    if !MenuEntry::select_radio(&mut this.menu, &path, index) {
                        return;
                    }
                    let path = path.clone();
                    this.dispatcher.invoke(move |native| {
                        MenuEntry::select_radio(&mut native.tray.menu, &path, index);
                        Ok(())
                    });
                    if let Some(on_select) = &on_select {
                        let on_select = on_select.clone();
                        this.dispatch(std::sync::Arc::new(move || on_select(index)));
                    }
                }),
                options: options
                    .iter()
                    .map(|opt| RadioItem {
                        label: opt.label.clone(),
                        icon_name: opt.icon_name.clone(),
                        enabled: opt.enabled,
                        visible: opt.visible,
                        ..Default::default()
                    })
                    .collect(),
                ..Default::default()
            }
            .into()
        }
        MenuEntry::SubMenu {
            label,
            icon_name,
            enabled,
            visible,
            submenu,
        } => SubMenu {
            label: label.clone(),
            icon_name: icon_name.clone(),
            enabled: *enabled,
            visible: *visible,
            submenu: build_level(submenu, &path),
            ..Default::default()
        }
        .into(),
        MenuEntry::Separator => MenuItem::Separator,
    }
}

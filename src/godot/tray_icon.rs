//! Godot TrayIcon node implementation.
//!
//! This module contains the `TrayIcon` Godot node. It drives an
//! [`Icon`] in detached mode: the node pumps the icon's event loop from its
//! `process` step, so every native call happens on Godot's main thread.

use crate::backend::sni::SniBackend;
use crate::godot::event::TrayEvent;
use crate::icon::Icon;
use crate::menu::{MenuItem, RadioOption};
use godot::classes::{Image, ResourceLoader, Texture2D};
use godot::prelude::*;
use image::RgbaImage;
use std::sync::mpsc::{Receiver, Sender, channel};

/// Node-side description of a menu entry, kept so the menu can be rebuilt.
#[derive(Clone, Debug)]
enum MenuSpec {
    Item {
        id: String,
        label: String,
        icon_name: String,
        enabled: bool,
        visible: bool,
    },
    Checkmark {
        id: String,
        label: String,
        icon_name: String,
        checked: bool,
        enabled: bool,
        visible: bool,
    },
    RadioGroup {
        id: String,
        selected: usize,
        options: Vec<RadioSpec>,
    },
    SubMenu {
        label: String,
        icon_name: String,
        enabled: bool,
        visible: bool,
        submenu: Vec<MenuSpec>,
    },
    Separator,
}

#[derive(Clone, Debug)]
struct RadioSpec {
    id: String,
    label: String,
    icon_name: String,
    enabled: bool,
    visible: bool,
}

impl MenuSpec {
    fn build(&self, sender: &Sender<TrayEvent>) -> MenuItem<SniBackend> {
        match self {
            MenuSpec::Item {
                id,
                label,
                icon_name,
                enabled,
                visible,
            } => {
                let (id, sender) = (id.clone(), sender.clone());
                let mut item = MenuItem::action(label.clone(), move |_| {
                    let _ = sender.send(TrayEvent::MenuActivated(id.clone()));
                })
                .with_icon_name(icon_name.clone());
                if let MenuItem::Standard {
                    enabled: e,
                    visible: v,
                    ..
                } = &mut item
                {
                    *e = *enabled;
                    *v = *visible;
                }
                item
            }
            MenuSpec::Checkmark {
                id,
                label,
                icon_name,
                checked,
                enabled,
                visible,
            } => {
                let (id, sender) = (id.clone(), sender.clone());
                let mut item = MenuItem::checkmark(label.clone(), *checked, move |_| {
                    let _ = sender.send(TrayEvent::CheckmarkToggled(id.clone()));
                })
                .with_icon_name(icon_name.clone());
                if let MenuItem::Checkmark {
                    enabled: e,
                    visible: v,
                    ..
                } = &mut item
                {
                    *e = *enabled;
                    *v = *visible;
                }
                item
            }
            MenuSpec::RadioGroup {
                id,
                selected,
                options,
            } => {
                let (id, sender) = (id.clone(), sender.clone());
                let options = options
                    .iter()
                    .map(|opt| RadioOption {
                        label: opt.label.clone(),
                        icon_name: opt.icon_name.clone(),
                        enabled: opt.enabled,
                        visible: opt.visible,
                    })
                    .collect();
                MenuItem::radio(options, *selected, move |_, index| {
                    let _ = sender.send(TrayEvent::RadioSelected(id.clone(), index));
                })
            }
            MenuSpec::SubMenu {
                label,
                icon_name,
                enabled,
                visible,
                submenu,
            } => MenuItem::SubMenu {
                label: label.clone(),
                icon_name: icon_name.clone(),
                enabled: *enabled,
                visible: *visible,
                submenu: submenu.iter().map(|spec| spec.build(sender)).collect(),
            },
            MenuSpec::Separator => MenuItem::Separator,
        }
    }
}

/// Applies `f` to every spec of `menu`, descending into submenus, until it
/// returns `Some`.
fn find_spec<R>(menu: &mut [MenuSpec], f: &mut impl FnMut(&mut MenuSpec) -> Option<R>) -> Option<R> {
    for spec in menu.iter_mut() {
        if let Some(result) = f(spec) {
            return Some(result);
        }
        if let MenuSpec::SubMenu { submenu, .. } = spec
            && let Some(result) = find_spec(submenu, f)
        {
            return Some(result);
        }
    }
    None
}

/// The submenu labelled `label`, at any depth.
fn find_submenu<'a>(menu: &'a mut [MenuSpec], label: &str) -> Option<&'a mut Vec<MenuSpec>> {
    for spec in menu.iter_mut() {
        if let MenuSpec::SubMenu {
            label: sub_label,
            submenu,
            ..
        } = spec
        {
            if sub_label == label {
                return Some(submenu);
            }
            if let Some(found) = find_submenu(submenu, label) {
                return Some(found);
            }
        }
    }
    None
}

#[derive(GodotClass)]
#[class(base=Node)]
/// A Godot node that provides a system tray icon on Linux.
///
/// `TrayIcon` creates and manages a StatusNotifierItem tray icon. It supports
/// custom icons, a popup menu, notifications, and signals for user
/// interactions. An icon image must be set before `spawn_tray` for the icon
/// to appear.
///
/// # Signals
///
/// - `left_clicked()` - Emitted when the icon is activated
/// - `right_clicked()` - Emitted on secondary activation
/// - `menu_activated(id: String)` - Emitted when a standard menu item is clicked
/// - `checkmark_toggled(id: String, checked: bool)` - Emitted when a checkmark item is toggled
/// - `radio_selected(group_id: String, index: int, option_id: String)` - Emitted when a radio option is selected
///
/// # Example
///
/// ```gdscript
/// var tray = TrayIcon.new()
/// add_child(tray)
/// tray.set_tray_id("my_app")
/// tray.set_icon_from_path("res://icon.svg")
/// tray.add_menu_item("quit", "Quit", "application-exit", true, true)
/// tray.menu_activated.connect(_on_menu_activated)
/// tray.spawn_tray()
/// ```
pub struct TrayIcon {
    base: Base<Node>,
    tray_id: String,
    title: String,
    image: Option<RgbaImage>,
    menu: Vec<MenuSpec>,
    icon: Option<Icon<SniBackend>>,
    event_sender: Option<Sender<TrayEvent>>,
    event_receiver: Option<Receiver<TrayEvent>>,
}

#[godot_api]
impl INode for TrayIcon {
    fn init(base: Base<Node>) -> Self {
        Self {
            base,
            tray_id: "godot_tray_icon".to_string(),
            title: String::new(),
            image: None,
            menu: Vec::new(),
            icon: None,
            event_sender: None,
            event_receiver: None,
        }
    }

    fn ready(&mut self) {
        self.base_mut().set_process(true);
    }

    fn process(&mut self, _delta: f64) {
        let attached = match &self.icon {
            Some(icon) => match icon.backend().dispatch_pending() {
                Ok(attached) => attached,
                Err(e) => {
                    godot_error!("Tray event loop failed: {}", e);
                    false
                }
            },
            None => true,
        };
        if !attached {
            self.icon = None;
        }

        let mut events = Vec::new();
        if let Some(ref rx) = self.event_receiver {
            while let Ok(event) = rx.try_recv() {
                events.push(event);
            }
        }

        for event in events {
            match event {
                TrayEvent::LeftClicked => {
                    self.base_mut().emit_signal("left_clicked", &[]);
                }
                TrayEvent::RightClicked => {
                    self.base_mut().emit_signal("right_clicked", &[]);
                }
                TrayEvent::MenuActivated(id) => {
                    self.base_mut()
                        .emit_signal("menu_activated", &[Variant::from(id)]);
                }
                TrayEvent::RadioSelected(group_id, index) => {
                    if let Some(option_id) = self.select_radio(&group_id, index) {
                        self.base_mut().emit_signal(
                            "radio_selected",
                            &[
                                Variant::from(group_id),
                                Variant::from(index as i64),
                                Variant::from(option_id),
                            ],
                        );
                    }
                }
                TrayEvent::CheckmarkToggled(id) => {
                    if let Some(checked) = self.toggle_checkmark(&id) {
                        self.base_mut().emit_signal(
                            "checkmark_toggled",
                            &[Variant::from(id), Variant::from(checked)],
                        );
                    }
                }
            }
        }
    }

    fn exit_tree(&mut self) {
        self.stop_tray();
    }
}

impl TrayIcon {
    fn toggle_checkmark(&mut self, target: &str) -> Option<bool> {
        find_spec(&mut self.menu, &mut |spec| match spec {
            MenuSpec::Checkmark { id, checked, .. } if id == target => {
                *checked = !*checked;
                Some(*checked)
            }
            _ => None,
        })
    }

    /// Records a selection made in the tray, returning the option's ID.
    fn select_radio(&mut self, target: &str, index: usize) -> Option<String> {
        find_spec(&mut self.menu, &mut |spec| match spec {
            MenuSpec::RadioGroup {
                id,
                selected,
                options,
            } if id == target => {
                let option = options.get(index)?;
                *selected = index;
                Some(option.id.clone())
            }
            _ => None,
        })
    }

    fn build_menu(&self, sender: &Sender<TrayEvent>) -> Vec<MenuItem<SniBackend>> {
        self.menu.iter().map(|spec| spec.build(sender)).collect()
    }

    /// Pushes the menu to a spawned tray.
    fn refresh_menu(&self) {
        if let (Some(icon), Some(sender)) = (&self.icon, &self.event_sender) {
            icon.set_menu(self.build_menu(sender));
        }
    }

    fn push_to_submenu(&mut self, submenu_label: &GString, spec: MenuSpec) -> bool {
        let Some(submenu) = find_submenu(&mut self.menu, &submenu_label.to_string()) else {
            godot_warn!("Submenu not found: {}", submenu_label);
            return false;
        };
        submenu.push(spec);
        self.refresh_menu();
        true
    }

    fn apply_image(&mut self, image: RgbaImage) {
        if let Some(icon) = &self.icon {
            icon.set_icon(Some(image.clone()));
        }
        self.image = Some(image);
    }
}

#[godot_api]
impl TrayIcon {
    /// Signal emitted when the tray icon is activated.
    #[signal]
    fn left_clicked();

    /// Signal emitted on secondary activation of the tray icon.
    #[signal]
    fn right_clicked();

    /// Signal emitted when a standard menu item is clicked.
    ///
    /// # Parameters
    ///
    /// - `id` - The unique identifier of the menu item that was clicked
    #[signal]
    fn menu_activated(id: GString);

    /// Signal emitted when a checkmark menu item is toggled.
    ///
    /// # Parameters
    ///
    /// - `id` - The unique identifier of the checkmark item
    /// - `checked` - The new checked state
    #[signal]
    fn checkmark_toggled(id: GString, checked: bool);

    /// Signal emitted when a radio option is selected.
    ///
    /// # Parameters
    ///
    /// - `group_id` - The identifier of the radio group
    /// - `index` - The index of the selected option
    /// - `option_id` - The identifier of the selected option
    #[signal]
    fn radio_selected(group_id: GString, index: i64, option_id: GString);

    /// Spawns the system tray icon.
    ///
    /// It should only be called once; subsequent calls are ignored until
    /// `stop_tray` is called.
    ///
    /// # Returns
    ///
    /// Returns `true` if the tray was spawned, `false` if it was already
    /// spawned or an error occurred.
    #[func]
    fn spawn_tray(&mut self) -> bool {
        if self.icon.is_some() {
            godot_warn!("Tray already spawned");
            return false;
        }

        let (tx, rx) = channel();
        let (left, right) = (tx.clone(), tx.clone());
        let mut builder = Icon::<SniBackend>::builder(self.tray_id.clone())
            .title(self.title.clone())
            .on_left_click(move |_| {
                let _ = left.send(TrayEvent::LeftClicked);
            })
            .on_right_click(move |_| {
                let _ = right.send(TrayEvent::RightClicked);
            })
            .menu(self.build_menu(&tx));
        if let Some(image) = self.image.clone() {
            builder = builder.icon(image);
        }
        let icon = builder.build();

        match icon.run_detached() {
            Ok(()) => {
                self.icon = Some(icon);
                self.event_sender = Some(tx);
                self.event_receiver = Some(rx);
                true
            }
            Err(e) => {
                godot_error!("Failed to spawn tray: {}", e);
                false
            }
        }
    }

    /// Removes the tray icon and releases its native resources.
    #[func]
    fn stop_tray(&mut self) {
        if let Some(icon) = self.icon.take() {
            icon.stop();
            if let Err(e) = icon.backend().dispatch_pending() {
                godot_error!("Tray event loop failed while stopping: {}", e);
            }
        }
        self.event_sender = None;
    }

    /// Returns `true` while the tray icon is spawned.
    #[func]
    fn is_spawned(&self) -> bool {
        self.icon.is_some()
    }

    /// Sets the unique identifier for this tray icon.
    ///
    /// Takes effect the next time the tray is spawned.
    ///
    /// # Parameters
    ///
    /// - `tray_id` - A unique identifier string (e.g., "com.example.myapp")
    #[func]
    fn set_tray_id(&mut self, tray_id: GString) {
        self.tray_id = tray_id.to_string();
    }

    /// Sets the title of the tray icon.
    #[func]
    fn set_title(&mut self, title: GString) {
        self.title = title.to_string();
        if let Some(icon) = &self.icon {
            icon.set_title(self.title.clone());
        }
    }

    /// Sets the tray icon from a Godot Image resource.
    ///
    /// # Returns
    /// `true` if the icon was set successfully, `false` otherwise
    #[func]
    fn set_icon_from_image(&mut self, image: Gd<Image>) -> bool {
        let width = image.get_width();
        let height = image.get_height();

        if width <= 0 || height <= 0 {
            godot_error!("Invalid image dimensions: {}x{}", width, height);
            return false;
        }

        let Some(copy) = image.duplicate() else {
            godot_error!("Failed to copy image");
            return false;
        };
        let mut img = copy.cast::<Image>();
        img.convert(godot::classes::image::Format::RGBA8);

        let bytes: Vec<u8> = img.get_data().to_vec();
        match RgbaImage::from_raw(width as u32, height as u32, bytes) {
            Some(rgba) => {
                self.apply_image(rgba);
                true
            }
            None => {
                godot_error!("Image data size mismatch for {}x{} image", width, height);
                false
            }
        }
    }

    /// Sets the tray icon from a Godot Texture2D resource.
    ///
    /// Works with exported games because it uses Godot's resource system.
    #[func]
    fn set_icon_from_texture(&mut self, texture: Gd<Texture2D>) -> bool {
        match texture.get_image() {
            Some(image) => self.set_icon_from_image(image),
            None => {
                godot_error!("Failed to get image from texture");
                false
            }
        }
    }

    /// Sets the tray icon by loading a texture from a Godot resource path.
    ///
    /// # Example (GDScript)
    /// ```gdscript
    /// tray_icon.set_icon_from_path("res://icon.svg")
    /// ```
    #[func]
    fn set_icon_from_path(&mut self, path: GString) -> bool {
        let mut loader = ResourceLoader::singleton();
        let Some(resource) = loader.load(&path) else {
            godot_error!("Failed to load resource from path: {}", path);
            return false;
        };

        match resource.try_cast::<Texture2D>() {
            Ok(texture) => self.set_icon_from_texture(texture),
            Err(_) => {
                godot_error!("Resource is not a Texture2D: {}", path);
                false
            }
        }
    }

    /// Sets the tray icon from raw RGBA pixel data.
    ///
    /// # Parameters
    ///
    /// - `width` - Width of the icon in pixels
    /// - `height` - Height of the icon in pixels
    /// - `data` - Raw pixel data as RGBA bytes (length must be width * height * 4)
    #[func]
    fn set_icon_from_data(&mut self, width: i32, height: i32, data: PackedByteArray) -> bool {
        if width <= 0 || height <= 0 {
            godot_error!("Invalid image dimensions: {}x{}", width, height);
            return false;
        }
        match RgbaImage::from_raw(width as u32, height as u32, data.to_vec()) {
            Some(rgba) => {
                self.apply_image(rgba);
                true
            }
            None => {
                godot_error!("Invalid icon data size");
                false
            }
        }
    }

    /// Removes the icon image, which hides a spawned tray icon.
    #[func]
    fn clear_icon(&mut self) {
        self.image = None;
        if let Some(icon) = &self.icon {
            icon.set_icon(None);
        }
    }

    /// Shows a desktop notification.
    ///
    /// An empty `title` uses the tray title.
    #[func(rename = notify)]
    fn show_notification(&mut self, message: GString, title: GString) -> bool {
        let Some(icon) = &self.icon else {
            godot_warn!("Tray not spawned, dropping notification");
            return false;
        };
        let title = title.to_string();
        let title = (!title.is_empty()).then_some(title.as_str());
        match icon.notify(&message.to_string(), title) {
            Ok(()) => true,
            Err(e) => {
                godot_error!("Failed to show notification: {}", e);
                false
            }
        }
    }

    /// Withdraws the current notification.
    #[func]
    fn remove_notification(&mut self) {
        if let Some(icon) = &self.icon
            && let Err(e) = icon.remove_notification()
        {
            godot_error!("Failed to remove notification: {}", e);
        }
    }

    /// Clears all menu items from the tray menu.
    #[func]
    fn clear_menu(&mut self) {
        self.menu.clear();
        self.refresh_menu();
    }

    /// Adds a standard clickable menu item.
    ///
    /// When clicked, emits the `menu_activated` signal with the item's ID.
    #[func]
    fn add_menu_item(
        &mut self,
        id: GString,
        label: GString,
        icon_name: GString,
        enabled: bool,
        visible: bool,
    ) {
        self.menu.push(MenuSpec::Item {
            id: id.to_string(),
            label: label.to_string(),
            icon_name: icon_name.to_string(),
            enabled,
            visible,
        });
        self.refresh_menu();
    }

    /// Adds a menu item with a checkmark that can be toggled.
    ///
    /// When toggled, emits the `checkmark_toggled` signal with the item's ID and new state.
    #[func]
    fn add_checkmark_item(
        &mut self,
        id: GString,
        label: GString,
        icon_name: GString,
        checked: bool,
        enabled: bool,
        visible: bool,
    ) {
        self.menu.push(MenuSpec::Checkmark {
            id: id.to_string(),
            label: label.to_string(),
            icon_name: icon_name.to_string(),
            checked,
            enabled,
            visible,
        });
        self.refresh_menu();
    }

    /// Adds a visual separator line to the menu.
    #[func]
    fn add_separator(&mut self) {
        self.menu.push(MenuSpec::Separator);
        self.refresh_menu();
    }

    /// Creates a new radio button group.
    ///
    /// Options are added with `add_radio_option`. Only one option in a group
    /// can be selected at a time.
    #[func]
    fn add_radio_group(&mut self, id: GString, selected: i64) {
        self.menu.push(MenuSpec::RadioGroup {
            id: id.to_string(),
            selected: selected.max(0) as usize,
            options: Vec::new(),
        });
        self.refresh_menu();
    }

    /// Adds an option to an existing radio group, at any menu depth.
    ///
    /// # Returns
    ///
    /// Returns `true` if the option was added, `false` if the group was not found.
    #[func]
    fn add_radio_option(
        &mut self,
        group_id: GString,
        option_id: GString,
        label: GString,
        icon_name: GString,
        enabled: bool,
        visible: bool,
    ) -> bool {
        let group_id = group_id.to_string();
        let option = RadioSpec {
            id: option_id.to_string(),
            label: label.to_string(),
            icon_name: icon_name.to_string(),
            enabled,
            visible,
        };
        let added = find_spec(&mut self.menu, &mut |spec| match spec {
            MenuSpec::RadioGroup { id, options, .. } if *id == group_id => {
                options.push(option.clone());
                Some(())
            }
            _ => None,
        })
        .is_some();
        if added {
            self.refresh_menu();
        }
        added
    }

    /// Creates a submenu. Fill it with `add_submenu_item`,
    /// `add_submenu_checkmark`, `add_submenu_radio_group` and
    /// `add_submenu_separator`, addressing it by its label.
    #[func]
    fn begin_submenu(&mut self, label: GString, icon_name: GString, enabled: bool, visible: bool) {
        self.menu.push(MenuSpec::SubMenu {
            label: label.to_string(),
            icon_name: icon_name.to_string(),
            enabled,
            visible,
            submenu: Vec::new(),
        });
        self.refresh_menu();
    }

    /// Adds a standard item to the submenu labelled `submenu_label`.
    #[func]
    fn add_submenu_item(
        &mut self,
        submenu_label: GString,
        id: GString,
        label: GString,
        icon_name: GString,
        enabled: bool,
        visible: bool,
    ) -> bool {
        let spec = MenuSpec::Item {
            id: id.to_string(),
            label: label.to_string(),
            icon_name: icon_name.to_string(),
            enabled,
            visible,
        };
        self.push_to_submenu(&submenu_label, spec)
    }

    /// Adds a checkmark item to the submenu labelled `submenu_label`.
    #[func]
    fn add_submenu_checkmark(
        &mut self,
        submenu_label: GString,
        id: GString,
        label: GString,
        icon_name: GString,
        checked: bool,
        enabled: bool,
        visible: bool,
    ) -> bool {
        let spec = MenuSpec::Checkmark {
            id: id.to_string(),
            label: label.to_string(),
            icon_name: icon_name.to_string(),
            checked,
            enabled,
            visible,
        };
        self.push_to_submenu(&submenu_label, spec)
    }

    /// Adds an empty radio group to the submenu labelled `submenu_label`.
    #[func]
    fn add_submenu_radio_group(&mut self, submenu_label: GString, id: GString, selected: i64) -> bool {
        let spec = MenuSpec::RadioGroup {
            id: id.to_string(),
            selected: selected.max(0) as usize,
            options: Vec::new(),
        };
        self.push_to_submenu(&submenu_label, spec)
    }

    /// Adds a separator to the submenu labelled `submenu_label`.
    #[func]
    fn add_submenu_separator(&mut self, submenu_label: GString) -> bool {
        self.push_to_submenu(&submenu_label, MenuSpec::Separator)
    }

    /// Programmatically selects an option of a radio group.
    ///
    /// # Returns
    ///
    /// Returns `true` if the group was found and `index` is a valid option.
    #[func]
    fn set_radio_selected(&mut self, group_id: GString, index: i64) -> bool {
        if index < 0 {
            return false;
        }
        let found = self
            .select_radio(&group_id.to_string(), index as usize)
            .is_some();
        if found {
            self.refresh_menu();
        }
        found
    }

    /// Programmatically sets the state of a checkmark item.
    ///
    /// # Returns
    ///
    /// Returns `true` if the checkmark was found and updated, `false` otherwise.
    #[func]
    fn set_checkmark_state(&mut self, id: GString, checked: bool) -> bool {
        let id_str = id.to_string();
        let found = find_spec(&mut self.menu, &mut |spec| match spec {
            MenuSpec::Checkmark {
                id: item_id,
                checked: item_checked,
                ..
            } if *item_id == id_str => {
                *item_checked = checked;
                Some(())
            }
            _ => None,
        })
        .is_some();
        if found {
            self.refresh_menu();
        }
        found
    }
}

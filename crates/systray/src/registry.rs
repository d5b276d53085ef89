use std::collections::HashMap;

use x11rb::protocol::xproto::Window;

use crate::IconWindow;

/// What a window known to the tray is, used to route its events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowRole {
    Tray,
    Icon,
}

/// Docked icons in draw order, plus the dispatch table of every window the tray handles events for.
#[derive(Debug, Default)]
pub struct Registry {
    icons: Vec<IconWindow>,
    windows: HashMap<Window, WindowRole>,
}

impl Registry {
    pub fn role(&self, window: Window) -> Option<WindowRole> {
        self.windows.get(&window).copied()
    }

    pub fn register_tray(&mut self, window: Window) {
        self.windows.insert(window, WindowRole::Tray);
    }

    pub fn deregister_tray(&mut self, window: Window) {
        if self.role(window) == Some(WindowRole::Tray) {
            self.windows.remove(&window);
        }
    }

    /// Returns `false` and leaves everything untouched if the window is already known.
    pub fn register_icon(&mut self, icon: IconWindow) -> bool {
        if self.windows.contains_key(&icon.window()) {
            return false;
        }
        self.windows.insert(icon.window(), WindowRole::Icon);
        self.icons.push(icon);
        true
    }

    /// Remove an icon from both the dispatch table and the draw order.
    pub fn remove_icon(&mut self, window: Window) -> Option<IconWindow> {
        if self.role(window) != Some(WindowRole::Icon) {
            return None;
        }
        self.windows.remove(&window);
        let index = self.icons.iter().position(|icon| icon.window() == window)?;
        Some(self.icons.remove(index))
    }

    pub fn drain_icons(&mut self) -> Vec<IconWindow> {
        self.windows.retain(|_, role| *role != WindowRole::Icon);
        std::mem::take(&mut self.icons)
    }

    pub fn icon_mut(&mut self, window: Window) -> Option<&mut IconWindow> {
        self.icons.iter_mut().find(|icon| icon.window() == window)
    }

    pub fn icons(&self) -> &[IconWindow] {
        &self.icons
    }

    pub fn contains_icon(&self, window: Window) -> bool {
        self.role(window) == Some(WindowRole::Icon)
    }
}

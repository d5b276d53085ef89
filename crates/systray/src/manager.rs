use x11rb::{
    protocol::{
        xproto::{Atom, EventMask, Window},
        Event,
    },
    CURRENT_TIME, NONE,
};

use crate::{
    conn::{HostHandles, Rect},
    registry::{Registry, WindowRole},
    tray_window::{DockTarget, TrayWindow},
    wire, Drawer, IconWindow, Result, SystrayConfig, TrayConnection,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOwnership {
    Unowned,
    Owned { owner: Window, selection: Atom },
    /// Either we gave it up, or another manager took it from us. Never reacquired.
    Released,
}

/// The system tray widget.
///
/// Owns the `_NET_SYSTEM_TRAY_S<n>` selection while configured, docks icon windows into the bar
/// and lays them out left to right in the order they docked.
/// All methods are meant to be called from the single thread running the host's X event loop.
pub struct Systray<C, D> {
    conn: C,
    drawer: D,
    config: SystrayConfig,
    host: Option<HostHandles>,
    offset: i32,
    tray: Option<TrayWindow>,
    selection: SelectionOwnership,
    registry: Registry,
}

impl<C: TrayConnection, D: Drawer> Systray<C, D> {
    pub fn new(conn: C, drawer: D, config: SystrayConfig) -> Self {
        Systray {
            conn,
            drawer,
            config,
            host: None,
            offset: 0,
            tray: None,
            selection: SelectionOwnership::Unowned,
            registry: Registry::default(),
        }
    }

    pub fn conn(&self) -> &C {
        &self.conn
    }

    pub fn config(&self) -> &SystrayConfig {
        &self.config
    }

    pub fn selection(&self) -> SelectionOwnership {
        self.selection
    }

    pub fn tray_window(&self) -> Option<Window> {
        self.tray.map(|tray| tray.window())
    }

    /// Docked icons in draw order.
    pub fn icons(&self) -> &[IconWindow] {
        self.registry.icons()
    }

    pub fn contains(&self, window: Window) -> bool {
        self.registry.contains_icon(window)
    }

    /// Horizontal position of the tray inside the bar, set by the host before drawing.
    pub fn set_offset(&mut self, offset: i32) {
        self.offset = offset;
    }

    /// Claim the tray selection and tell everyone listening on the root window about it.
    ///
    /// Only the first call does anything.
    pub fn configure(&mut self, host: HostHandles) -> Result<()> {
        if self.host.is_some() {
            log::debug!("Systray is already configured");
            return Ok(());
        }
        self.host = Some(host);

        let window = self.conn.create_input_window(Rect { x: -1, y: -1, width: 1, height: 1 })?;
        let opcode = self.conn.intern_atom("_NET_SYSTEM_TRAY_OPCODE")?;
        self.tray = Some(TrayWindow::new(window, opcode));
        self.registry.register_tray(window);

        let selection = self.conn.intern_atom(&format!("_NET_SYSTEM_TRAY_S{}", host.screen))?;
        let manager = self.conn.intern_atom("MANAGER")?;
        self.conn.set_selection_owner(window, selection, CURRENT_TIME)?;
        self.selection = SelectionOwnership::Owned { owner: window, selection };
        log::info!("Acquired system tray selection for screen {} with window {:#x}", host.screen, window);

        let root = self.conn.root();
        let event = wire::encode_manager_broadcast(root, manager, selection, CURRENT_TIME, window);
        self.conn.send_event(root, EventMask::STRUCTURE_NOTIFY, event)?;
        self.conn.flush()
    }

    pub fn calculate_width(&self) -> i32 {
        let icons = self.registry.icons();
        let padding = i32::from(self.config.padding);
        let count = i32::try_from(icons.len()).unwrap_or(i32::MAX);
        icons
            .iter()
            .fold(0i32, |width, icon| width.saturating_add(icon.width))
            .saturating_add(padding.saturating_mul(count))
    }

    /// Repaint the tray area of the bar and move every icon into its slot.
    pub fn draw(&mut self) -> Result<()> {
        let Some(host) = self.host else {
            return Ok(());
        };
        self.drawer.clear(self.config.background.unwrap_or(host.bar_background))?;
        self.drawer.draw(self.offset, self.calculate_width())?;

        let padding = i32::from(self.config.padding);
        let icon_size = i32::from(self.config.icon_size);
        let y = i32::from(host.bar_height) / 2 - icon_size / 2;
        let mut x = padding;
        for icon in self.registry.icons() {
            let rect = Rect { x: self.offset.saturating_add(x), y, width: icon.width, height: icon_size };
            match self.conn.place_window(icon.window(), rect) {
                Ok(()) => {}
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) if err.is_transient() => {
                    log::debug!("Could not place tray icon {:#x}: {}", icon.window(), err);
                }
                Err(err) => log::warn!("Failed to place tray icon {:#x}: {}", icon.window(), err),
            }
            x = x.saturating_add(icon.width).saturating_add(padding);
        }
        self.conn.flush()
    }

    /// Route an X event to the tray window or the docked icon it concerns.
    ///
    /// Returns `false` if the event is none of the tray's business.
    pub fn handle_event(&mut self, event: &Event) -> Result<bool> {
        match event {
            Event::ClientMessage(ev) if self.is_tray(ev.window) => {
                let (Some(tray), Some(host)) = (self.tray, self.host) else {
                    return Ok(false);
                };
                let target = DockTarget { parent: host.bar_window, icon_size: self.config.icon_size };
                if tray.on_client_message(&self.conn, &mut self.registry, target, ev)? {
                    self.draw()?;
                }
                Ok(true)
            }
            Event::SelectionClear(ev) if self.is_tray(ev.owner) => {
                self.on_selection_lost(ev.selection);
                Ok(true)
            }
            Event::ConfigureNotify(ev) if self.registry.contains_icon(ev.window) => {
                self.on_icon_configure(ev.window)?;
                Ok(true)
            }
            Event::Expose(ev) if self.registry.contains_icon(ev.window) => {
                if ev.count == 0 {
                    self.draw()?;
                }
                Ok(true)
            }
            Event::DestroyNotify(ev) => self.on_icon_gone(ev.window),
            Event::UnmapNotify(ev) => self.on_icon_gone(ev.window),
            _ => Ok(false),
        }
    }

    /// Give up the selection and hand all icons back to the root window.
    ///
    /// Must be called by the host before it exits. Calling it again, or without a
    /// successful [`Systray::configure`], does nothing harmful.
    pub fn shutdown(&mut self) {
        if let SelectionOwnership::Owned { selection, .. } = self.selection {
            match self.conn.set_selection_owner(NONE, selection, CURRENT_TIME) {
                Ok(()) => log::info!("Released system tray selection"),
                Err(err) => log::warn!("Failed to release system tray selection: {}", err),
            }
            self.selection = SelectionOwnership::Released;
        }

        let root = self.conn.root();
        for icon in self.registry.drain_icons() {
            let result = self.conn.unmap_window(icon.window()).and_then(|_| self.conn.reparent_window(icon.window(), root, 0, 0));
            if let Err(err) = result {
                log::debug!("Could not release tray icon {:#x}: {}", icon.window(), err);
            }
        }

        if let Some(tray) = self.tray.take() {
            self.registry.deregister_tray(tray.window());
            if let Err(err) = self.conn.unmap_window(tray.window()) {
                log::debug!("Could not hide tray window: {}", err);
            }
        }

        if let Err(err) = self.conn.flush() {
            log::warn!("Failed to flush X connection during systray shutdown: {}", err);
        }
    }

    fn is_tray(&self, window: Window) -> bool {
        self.registry.role(window) == Some(WindowRole::Tray)
    }

    fn on_selection_lost(&mut self, lost: Atom) {
        if let SelectionOwnership::Owned { selection, .. } = self.selection {
            if selection == lost {
                log::info!("Another system tray took over the tray selection");
                self.selection = SelectionOwnership::Released;
            }
        }
    }

    fn on_icon_configure(&mut self, window: Window) -> Result<()> {
        let background = self.drawer.pixmap();
        let icon_size = self.config.icon_size;
        let Some(icon) = self.registry.icon_mut(window) else {
            return Ok(());
        };
        let before = (icon.width, icon.height);
        match icon.on_configure_change(&self.conn, icon_size, background) {
            Ok(()) => {}
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) if err.is_transient() => {
                log::debug!("Tray icon {:#x} is not ready yet: {}", window, err);
            }
            Err(err) => log::warn!("Failed to update tray icon {:#x}: {}", window, err),
        }
        // our own place_window calls come back as ConfigureNotify, only relayout on actual changes
        if before != (icon.width, icon.height) {
            self.draw()?;
        }
        Ok(())
    }

    fn on_icon_gone(&mut self, window: Window) -> Result<bool> {
        if self.registry.remove_icon(window).is_none() {
            return Ok(false);
        }
        log::info!("Tray icon {:#x} went away", window);
        self.draw()?;
        Ok(true)
    }
}

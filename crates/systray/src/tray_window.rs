use x11rb::protocol::xproto::{Atom, ClientMessageEvent, SetMode, Window};

use crate::{
    icon::icon_event_mask,
    registry::Registry,
    wire::{self, DockRequest, TrayOperation},
    IconWindow, Result, TrayConnection,
};

/// The hidden window owning the tray selection. Tray icon clients send their dock requests here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrayWindow {
    window: Window,
    opcode_atom: Atom,
}

/// Where docked icons end up.
#[derive(Debug, Clone, Copy)]
pub struct DockTarget {
    pub parent: Window,
    pub icon_size: u16,
}

impl TrayWindow {
    pub fn new(window: Window, opcode_atom: Atom) -> Self {
        TrayWindow { window, opcode_atom }
    }

    pub fn window(&self) -> Window {
        self.window
    }

    /// Returns whether a new icon got docked.
    pub fn on_client_message<C: TrayConnection>(
        &self,
        conn: &C,
        registry: &mut Registry,
        target: DockTarget,
        event: &ClientMessageEvent,
    ) -> Result<bool> {
        match wire::decode_dock_request(event, self.opcode_atom) {
            Some(request) => self.on_dock_request(conn, registry, target, request),
            None => Ok(false),
        }
    }

    /// Adopt the window named in a dock request.
    ///
    /// If the window vanishes (or was never realized) while we're adopting it, the registration
    /// is undone and the request dropped. The client will ask again once it sees a new MANAGER.
    pub fn on_dock_request<C: TrayConnection>(
        &self,
        conn: &C,
        registry: &mut Registry,
        target: DockTarget,
        request: DockRequest,
    ) -> Result<bool> {
        if request.operation != TrayOperation::RequestDock {
            log::debug!("Ignoring tray message {:?} from {:#x}", request.operation, request.window);
            return Ok(false);
        }
        let window = request.window;
        if !registry.register_icon(IconWindow::new(window, target.icon_size)) {
            log::debug!("Window {:#x} is already docked, ignoring dock request", window);
            return Ok(false);
        }

        let mut adoption = Adoption::default();
        match adoption.run(conn, window, target.parent) {
            Ok(()) => {
                log::info!("Docked tray icon {:#x}", window);
                Ok(true)
            }
            Err(err) => {
                registry.remove_icon(window);
                adoption.undo(conn, window);
                if err.is_fatal() {
                    Err(err)
                } else if err.is_transient() {
                    log::debug!("Tray icon {:#x} went away while docking it: {}", window, err);
                    Ok(false)
                } else {
                    log::warn!("Failed to dock tray icon {:#x}: {}", window, err);
                    Ok(false)
                }
            }
        }
    }
}

/// The steps of docking a window that reached the server, so a failed dock can be reverted.
#[derive(Debug, Default)]
struct Adoption {
    saved: bool,
    reparented: bool,
}

impl Adoption {
    fn run<C: TrayConnection>(&mut self, conn: &C, window: Window, parent: Window) -> Result<()> {
        conn.select_input(window, icon_event_mask())?;
        // if we die, the X server hands the icon back to the root window instead of destroying it
        conn.change_save_set(SetMode::INSERT, window)?;
        self.saved = true;
        conn.reparent_window(window, parent, 0, 0)?;
        self.reparented = true;
        // the reparent has to reach the server before the map
        conn.flush()?;
        conn.map_window(window)
    }

    /// Best effort, the window may well be gone already.
    fn undo<C: TrayConnection>(&self, conn: &C, window: Window) {
        if self.reparented {
            if let Err(err) = conn.reparent_window(window, conn.root(), 0, 0) {
                log::debug!("Could not hand {:#x} back to the root window: {}", window, err);
            }
        }
        if self.saved {
            if let Err(err) = conn.change_save_set(SetMode::DELETE, window) {
                log::debug!("Could not remove {:#x} from the save set: {}", window, err);
            }
        }
    }
}

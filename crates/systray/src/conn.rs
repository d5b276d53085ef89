//! The seams between the tray and its host: the X11 connection and the bar's drawing surface.

use x11rb::protocol::xproto::{Atom, EventMask, Pixmap, SetMode, Timestamp, Window};

use crate::{Color, Result};

/// Minimum size a client asked for through `WM_NORMAL_HINTS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeHints {
    pub min_width: i32,
    pub min_height: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// The raw protocol calls the tray needs from the X connection.
///
/// Requests are fire-and-forget unless stated otherwise. Implementations report
/// failures concerning a single foreign window as one of the transient [`crate::Error`] variants.
pub trait TrayConnection {
    fn root(&self) -> Window;

    /// Create a hidden, unmapped input-only window.
    fn create_input_window(&self, rect: Rect) -> Result<Window>;

    fn intern_atom(&self, name: &str) -> Result<Atom>;

    /// `owner == x11rb::NONE` releases the selection.
    fn set_selection_owner(&self, owner: Window, selection: Atom, time: Timestamp) -> Result<()>;

    fn send_event(&self, destination: Window, mask: EventMask, event: [u8; 32]) -> Result<()>;

    fn select_input(&self, window: Window, mask: EventMask) -> Result<()>;

    fn change_save_set(&self, mode: SetMode, window: Window) -> Result<()>;

    fn reparent_window(&self, window: Window, parent: Window, x: i16, y: i16) -> Result<()>;

    fn flush(&self) -> Result<()>;

    fn map_window(&self, window: Window) -> Result<()>;

    fn unmap_window(&self, window: Window) -> Result<()>;

    /// `Ok(None)` if the client did not set a minimum size.
    fn size_hints(&self, window: Window) -> Result<Option<SizeHints>>;

    fn set_background_pixmap(&self, window: Window, pixmap: Pixmap) -> Result<()>;

    /// Move and resize a window.
    fn place_window(&self, window: Window, rect: Rect) -> Result<()>;
}

/// Drawing surface the host bar hands to the tray.
pub trait Drawer {
    /// Backing pixmap, used as background of docked icons.
    fn pixmap(&self) -> Pixmap;

    fn clear(&mut self, color: Color) -> Result<()>;

    /// Copy the first `width` pixels of the surface into the bar at `offset`.
    fn draw(&mut self, offset: i32, width: i32) -> Result<()>;
}

/// Everything the tray needs to know about the bar it lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostHandles {
    pub bar_window: Window,
    pub bar_height: u16,
    pub bar_background: Color,
    /// Screen index used in the `_NET_SYSTEM_TRAY_S<n>` selection name.
    pub screen: usize,
}

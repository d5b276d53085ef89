use x11rb::protocol::xproto::{EventMask, Pixmap, Window};

use crate::{conn::SizeHints, Result, TrayConnection};

/// Events we need from a docked client window.
pub fn icon_event_mask() -> EventMask {
    EventMask::STRUCTURE_NOTIFY | EventMask::EXPOSURE
}

/// A client window docked into the tray.
///
/// The window itself belongs to the client process, we only ever reparent, move and map it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconWindow {
    window: Window,
    pub width: i32,
    pub height: i32,
}

impl IconWindow {
    pub fn new(window: Window, icon_size: u16) -> Self {
        let size = i32::from(icon_size);
        IconWindow { window, width: size, height: size }
    }

    pub fn window(&self) -> Window {
        self.window
    }

    /// Renegotiate the icon geometry after the client changed its window.
    ///
    /// Hints that can't be read (the window may not be realized yet) count as missing.
    /// The caller is responsible for redrawing the tray afterwards.
    pub fn on_configure_change<C: TrayConnection>(&mut self, conn: &C, icon_size: u16, background: Pixmap) -> Result<()> {
        let hints = conn.size_hints(self.window).unwrap_or_else(|err| {
            log::debug!("Could not read size hints of tray icon {:#x}: {}", self.window, err);
            None
        });
        let (width, height) = negotiate_size(hints, icon_size);
        self.width = width;
        self.height = height;
        conn.set_background_pixmap(self.window, background)
    }
}

/// Widest icon we accept. X coordinates are INT16, anything wider could never be laid out.
pub const MAX_ICON_WIDTH: i32 = i16::MAX as i32;

/// Scale the client's preferred size down so it's at most `icon_size` high, keeping the aspect ratio.
pub fn negotiate_size(hints: Option<SizeHints>, icon_size: u16) -> (i32, i32) {
    let icon_size = i32::from(icon_size);
    let Some(SizeHints { min_width: mut width, min_height: mut height }) = hints else {
        return (icon_size, icon_size);
    };
    if height > icon_size {
        width = (i64::from(width) * i64::from(icon_size) / i64::from(height)) as i32;
        height = icon_size;
    }
    if height <= 0 || width <= 0 {
        return (icon_size, icon_size);
    }
    (width.min(MAX_ICON_WIDTH), height)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{testing::MockConnection, Error};
    use pretty_assertions::assert_eq;

    fn hints(min_width: i32, min_height: i32) -> Option<SizeHints> {
        Some(SizeHints { min_width, min_height })
    }

    #[test]
    fn test_negotiate_size() {
        assert_eq!((20, 20), negotiate_size(None, 20));
        assert_eq!((16, 16), negotiate_size(hints(16, 16), 20));
        assert_eq!((40, 20), negotiate_size(hints(64, 32), 20));
        // floor(50 * 20 / 30) = 33
        assert_eq!((33, 20), negotiate_size(hints(50, 30), 20));
        assert_eq!((20, 20), negotiate_size(hints(16, 0), 20));
        assert_eq!((20, 20), negotiate_size(hints(16, -4), 20));
        // too narrow to survive the rescale
        assert_eq!((20, 20), negotiate_size(hints(1, 100), 20));
    }

    #[test]
    fn test_negotiate_size_caps_width() {
        assert_eq!((MAX_ICON_WIDTH, 10), negotiate_size(hints(i32::MAX, 10), 20));
        assert_eq!((MAX_ICON_WIDTH, 20), negotiate_size(hints(i32::MAX, i32::MAX / 2), 20));
        assert_eq!((MAX_ICON_WIDTH, 16), negotiate_size(hints(70000, 16), 20));
    }

    #[test]
    fn test_new_icon_uses_icon_size() {
        let icon = IconWindow::new(0x800003, 24);
        assert_eq!((24, 24), (icon.width, icon.height));
    }

    #[test]
    fn test_configure_change_reads_hints_and_sets_background() {
        let conn = MockConnection::new();
        conn.set_size_hints(0x800003, 48, 24);
        let mut icon = IconWindow::new(0x800003, 20);
        icon.on_configure_change(&conn, 20, 0x1000).unwrap();
        assert_eq!((40, 20), (icon.width, icon.height));
        assert!(conn.calls().contains(&"set_background_pixmap 0x800003 0x1000".to_string()));
    }

    #[test]
    fn test_configure_change_falls_back_when_hints_fail() {
        let conn = MockConnection::new();
        conn.set_size_hints(0x800003, 48, 24);
        conn.fail_window(0x800003, "size_hints", Error::BadWindow(0x800003));
        let mut icon = IconWindow::new(0x800003, 20);
        icon.width = 7;
        icon.on_configure_change(&conn, 20, 0x1000).unwrap();
        assert_eq!((20, 20), (icon.width, icon.height));
    }
}

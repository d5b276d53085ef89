//! [`TrayConnection`] on top of an x11rb connection.

use std::rc::Rc;

use x11rb::{
    connection::Connection,
    protocol::xproto::{
        Atom, AtomEnum, ChangeWindowAttributesAux, ConfigureWindowAux, ConnectionExt, CreateWindowAux, EventMask, Pixmap,
        SetMode, Timestamp, Window, WindowClass,
    },
    rust_connection::RustConnection,
    COPY_FROM_PARENT,
};

use crate::{
    conn::{Rect, SizeHints},
    Result, TrayConnection,
};

/// `PMinSize` bit in the flags of `WM_SIZE_HINTS`.
const P_MIN_SIZE: u32 = 1 << 4;

/// Every request is checked, so errors concerning a vanished icon window surface right at the
/// call that caused them instead of as an asynchronous error event.
pub struct X11Connection {
    conn: Rc<RustConnection>,
    root: Window,
}

impl X11Connection {
    pub fn new(conn: Rc<RustConnection>, screen_num: usize) -> Self {
        let root = conn.setup().roots[screen_num].root;
        X11Connection { conn, root }
    }

    pub fn connection(&self) -> &Rc<RustConnection> {
        &self.conn
    }
}

impl TrayConnection for X11Connection {
    fn root(&self) -> Window {
        self.root
    }

    fn create_input_window(&self, rect: Rect) -> Result<Window> {
        let window = self.conn.generate_id()?;
        let aux = CreateWindowAux::new().override_redirect(1).event_mask(EventMask::STRUCTURE_NOTIFY);
        self.conn
            .create_window(
                0,
                window,
                self.root,
                rect.x as i16,
                rect.y as i16,
                rect.width as u16,
                rect.height as u16,
                0,
                WindowClass::INPUT_ONLY,
                COPY_FROM_PARENT,
                &aux,
            )?
            .check()?;
        Ok(window)
    }

    fn intern_atom(&self, name: &str) -> Result<Atom> {
        Ok(self.conn.intern_atom(false, name.as_bytes())?.reply()?.atom)
    }

    fn set_selection_owner(&self, owner: Window, selection: Atom, time: Timestamp) -> Result<()> {
        self.conn.set_selection_owner(owner, selection, time)?.check()?;
        Ok(())
    }

    fn send_event(&self, destination: Window, mask: EventMask, event: [u8; 32]) -> Result<()> {
        self.conn.send_event(false, destination, mask, event)?.check()?;
        Ok(())
    }

    fn select_input(&self, window: Window, mask: EventMask) -> Result<()> {
        self.conn.change_window_attributes(window, &ChangeWindowAttributesAux::new().event_mask(mask))?.check()?;
        Ok(())
    }

    fn change_save_set(&self, mode: SetMode, window: Window) -> Result<()> {
        self.conn.change_save_set(mode, window)?.check()?;
        Ok(())
    }

    fn reparent_window(&self, window: Window, parent: Window, x: i16, y: i16) -> Result<()> {
        self.conn.reparent_window(window, parent, x, y)?.check()?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.conn.flush()?;
        Ok(())
    }

    fn map_window(&self, window: Window) -> Result<()> {
        self.conn.map_window(window)?.check()?;
        Ok(())
    }

    fn unmap_window(&self, window: Window) -> Result<()> {
        self.conn.unmap_window(window)?.check()?;
        Ok(())
    }

    fn size_hints(&self, window: Window) -> Result<Option<SizeHints>> {
        let reply =
            self.conn.get_property(false, window, AtomEnum::WM_NORMAL_HINTS, AtomEnum::WM_SIZE_HINTS, 0, 18)?.reply()?;
        Ok(reply.value32().and_then(|words| parse_min_size(&words.collect::<Vec<_>>())))
    }

    fn set_background_pixmap(&self, window: Window, pixmap: Pixmap) -> Result<()> {
        self.conn.change_window_attributes(window, &ChangeWindowAttributesAux::new().background_pixmap(pixmap))?.check()?;
        Ok(())
    }

    fn place_window(&self, window: Window, rect: Rect) -> Result<()> {
        let aux = ConfigureWindowAux::new().x(rect.x).y(rect.y).width(rect.width as u32).height(rect.height as u32);
        self.conn.configure_window(window, &aux)?.check()?;
        Ok(())
    }
}

/// Extract the minimum size from the words of a `WM_SIZE_HINTS` property.
///
/// The layout is `flags, x, y, width, height, min_width, min_height, ...`.
fn parse_min_size(words: &[u32]) -> Option<SizeHints> {
    let flags = *words.first()?;
    if flags & P_MIN_SIZE == 0 || words.len() < 7 {
        return None;
    }
    Some(SizeHints { min_width: words[5] as i32, min_height: words[6] as i32 })
}

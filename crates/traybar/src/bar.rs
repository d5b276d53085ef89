use std::rc::Rc;

use anyhow::{Context, Result};
use systray::{Color, Drawer};
use x11rb::{
    connection::Connection,
    protocol::xproto::{
        AtomEnum, ChangeGCAux, ConnectionExt, CreateGCAux, CreateWindowAux, EventMask, Gcontext, Pixmap, PropMode, Rectangle,
        Window, WindowClass,
    },
    rust_connection::RustConnection,
    wrapper::ConnectionExt as _,
};

/// A dock window spanning the top edge of the screen.
pub struct Bar {
    pub window: Window,
    pub width: u16,
    pub height: u16,
    pub depth: u8,
    pub background: Color,
}

impl Bar {
    pub fn create(conn: &RustConnection, screen_num: usize, height: u16, background: Color) -> Result<Self> {
        let screen = &conn.setup().roots[screen_num];
        let width = screen.width_in_pixels;
        let window = conn.generate_id()?;
        let aux = CreateWindowAux::new()
            .background_pixel(background.0)
            .event_mask(EventMask::EXPOSURE | EventMask::STRUCTURE_NOTIFY);
        conn.create_window(
            screen.root_depth,
            window,
            screen.root,
            0,
            0,
            width,
            height,
            0,
            WindowClass::INPUT_OUTPUT,
            screen.root_visual,
            &aux,
        )?
        .check()
        .context("Failed to create bar window")?;

        let atoms = AtomCollection::new(conn)?.reply()?;
        conn.change_property32(
            PropMode::REPLACE,
            window,
            atoms._NET_WM_WINDOW_TYPE,
            AtomEnum::ATOM,
            &[atoms._NET_WM_WINDOW_TYPE_DOCK],
        )?
        .check()?;

        // left, right, top, bottom, left_start_y, left_end_y, right_start_y, right_end_y, top_start_x, top_end_x, bottom_start_x, bottom_end_x
        let strut = [0, 0, height as u32, 0, 0, 0, 0, 0, 0, width as u32 - 1, 0, 0];
        conn.change_property32(PropMode::REPLACE, window, atoms._NET_WM_STRUT_PARTIAL, AtomEnum::CARDINAL, &strut)?.check()?;
        conn.change_property32(PropMode::REPLACE, window, atoms._NET_WM_STRUT, AtomEnum::CARDINAL, &strut[0..4])?.check()?;

        conn.map_window(window)?.check()?;
        conn.flush().context("Failed to send requests to X server")?;

        Ok(Bar { window, width, height, depth: screen.root_depth, background })
    }
}

/// Off-screen surface the tray area of the bar is painted from.
pub struct PixmapDrawer {
    conn: Rc<RustConnection>,
    pixmap: Pixmap,
    gc: Gcontext,
    target: Window,
    width: u16,
    height: u16,
}

impl PixmapDrawer {
    pub fn new(conn: Rc<RustConnection>, bar: &Bar) -> Result<Self> {
        let pixmap = conn.generate_id()?;
        conn.create_pixmap(bar.depth, pixmap, bar.window, bar.width, bar.height)?
            .check()
            .context("Failed to create tray pixmap")?;
        let gc = conn.generate_id()?;
        conn.create_gc(gc, pixmap, &CreateGCAux::new().foreground(bar.background.0).graphics_exposures(0))?.check()?;
        Ok(PixmapDrawer { conn, pixmap, gc, target: bar.window, width: bar.width, height: bar.height })
    }
}

impl Drawer for PixmapDrawer {
    fn pixmap(&self) -> Pixmap {
        self.pixmap
    }

    fn clear(&mut self, color: Color) -> systray::Result<()> {
        self.conn.change_gc(self.gc, &ChangeGCAux::new().foreground(color.0))?;
        let area = Rectangle { x: 0, y: 0, width: self.width, height: self.height };
        self.conn.poly_fill_rectangle(self.pixmap, self.gc, &[area])?;
        Ok(())
    }

    fn draw(&mut self, offset: i32, width: i32) -> systray::Result<()> {
        if width <= 0 {
            return Ok(());
        }
        let width = width.min(i32::from(self.width)) as u16;
        self.conn.copy_area(self.pixmap, self.target, self.gc, 0, 0, offset as i16, 0, width, self.height)?;
        Ok(())
    }
}

impl Drop for PixmapDrawer {
    fn drop(&mut self) {
        let _ = self.conn.free_gc(self.gc);
        let _ = self.conn.free_pixmap(self.pixmap);
    }
}

x11rb::atom_manager! {
    pub AtomCollection: AtomCollectionCookie {
        _NET_WM_WINDOW_TYPE,
        _NET_WM_WINDOW_TYPE_DOCK,
        _NET_WM_STRUT,
        _NET_WM_STRUT_PARTIAL,
    }
}

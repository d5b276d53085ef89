//! Recording fakes of the host collaborators, so the tray can be driven without an X server.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use x11rb::protocol::xproto::{Atom, EventMask, Pixmap, SetMode, Timestamp, Window};

use crate::{
    conn::{Rect, SizeHints},
    Color, Drawer, Error, Result, TrayConnection,
};

pub const ROOT: Window = 0x1e2;
pub const TRAY_WINDOW: Window = 0x600001;
pub const SURFACE: Pixmap = 0x1000;

#[derive(Debug, Default)]
struct State {
    calls: Vec<String>,
    atoms: HashMap<String, Atom>,
    hints: HashMap<Window, SizeHints>,
    failures: Vec<(Window, &'static str, Error)>,
    sent: Vec<[u8; 32]>,
}

/// Logs every request as a line like `"map_window 0x800003"`. Queries are not logged.
#[derive(Debug, Clone, Default)]
pub struct MockConnection(Rc<RefCell<State>>);

impl MockConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.0.borrow_mut().calls.clear();
    }

    pub fn sent_events(&self) -> Vec<[u8; 32]> {
        self.0.borrow().sent.clone()
    }

    pub fn atom(&self, name: &str) -> Option<Atom> {
        self.0.borrow().atoms.get(name).copied()
    }

    pub fn set_size_hints(&self, window: Window, min_width: i32, min_height: i32) {
        self.0.borrow_mut().hints.insert(window, SizeHints { min_width, min_height });
    }

    /// Make the next `request` concerning `window` fail with `err`.
    pub fn fail_window(&self, window: Window, request: &'static str, err: Error) {
        self.0.borrow_mut().failures.push((window, request, err));
    }

    fn check_failure(&self, window: Window, request: &'static str) -> Result<()> {
        let mut state = self.0.borrow_mut();
        match state.failures.iter().position(|(w, r, _)| *w == window && *r == request) {
            Some(index) => Err(state.failures.remove(index).2),
            None => Ok(()),
        }
    }

    fn request(&self, window: Window, request: &'static str, call: String) -> Result<()> {
        self.check_failure(window, request)?;
        self.0.borrow_mut().calls.push(call);
        Ok(())
    }
}

impl TrayConnection for MockConnection {
    fn root(&self) -> Window {
        ROOT
    }

    fn create_input_window(&self, _rect: Rect) -> Result<Window> {
        self.request(ROOT, "create_input_window", format!("create_input_window {:#x}", TRAY_WINDOW))?;
        Ok(TRAY_WINDOW)
    }

    fn intern_atom(&self, name: &str) -> Result<Atom> {
        let mut state = self.0.borrow_mut();
        let next = 100 + state.atoms.len() as Atom;
        Ok(*state.atoms.entry(name.to_string()).or_insert(next))
    }

    fn set_selection_owner(&self, owner: Window, selection: Atom, _time: Timestamp) -> Result<()> {
        self.request(owner, "set_selection_owner", format!("set_selection_owner {:#x} {}", owner, selection))
    }

    fn send_event(&self, destination: Window, _mask: EventMask, event: [u8; 32]) -> Result<()> {
        self.request(destination, "send_event", format!("send_event {:#x}", destination))?;
        self.0.borrow_mut().sent.push(event);
        Ok(())
    }

    fn select_input(&self, window: Window, _mask: EventMask) -> Result<()> {
        self.request(window, "select_input", format!("select_input {:#x}", window))
    }

    fn change_save_set(&self, mode: SetMode, window: Window) -> Result<()> {
        let mode = if mode == SetMode::INSERT { "insert" } else { "delete" };
        self.request(window, "change_save_set", format!("change_save_set {} {:#x}", mode, window))
    }

    fn reparent_window(&self, window: Window, parent: Window, x: i16, y: i16) -> Result<()> {
        self.request(window, "reparent_window", format!("reparent_window {:#x} {:#x} {} {}", window, parent, x, y))
    }

    fn flush(&self) -> Result<()> {
        self.0.borrow_mut().calls.push("flush".to_string());
        Ok(())
    }

    fn map_window(&self, window: Window) -> Result<()> {
        self.request(window, "map_window", format!("map_window {:#x}", window))
    }

    fn unmap_window(&self, window: Window) -> Result<()> {
        self.request(window, "unmap_window", format!("unmap_window {:#x}", window))
    }

    fn size_hints(&self, window: Window) -> Result<Option<SizeHints>> {
        self.check_failure(window, "size_hints")?;
        Ok(self.0.borrow().hints.get(&window).copied())
    }

    fn set_background_pixmap(&self, window: Window, pixmap: Pixmap) -> Result<()> {
        self.request(window, "set_background_pixmap", format!("set_background_pixmap {:#x} {:#x}", window, pixmap))
    }

    fn place_window(&self, window: Window, rect: Rect) -> Result<()> {
        self.request(
            window,
            "place_window",
            format!("place_window {:#x} {} {} {} {}", window, rect.x, rect.y, rect.width, rect.height),
        )
    }
}

/// Logs `clear` and `draw` calls as lines like `"draw 100 25"`.
#[derive(Debug, Clone, Default)]
pub struct MockDrawer(Rc<RefCell<Vec<String>>>);

impl MockDrawer {
    pub fn calls(&self) -> Vec<String> {
        self.0.borrow().clone()
    }
}

impl Drawer for MockDrawer {
    fn pixmap(&self) -> Pixmap {
        SURFACE
    }

    fn clear(&mut self, color: Color) -> Result<()> {
        self.0.borrow_mut().push(format!("clear {}", color));
        Ok(())
    }

    fn draw(&mut self, offset: i32, width: i32) -> Result<()> {
        self.0.borrow_mut().push(format!("draw {} {}", offset, width));
        Ok(())
    }
}

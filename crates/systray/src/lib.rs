//! Manager side of the freedesktop system tray protocol for X11.
//!
//! A [`Systray`] claims the `_NET_SYSTEM_TRAY_S<n>` selection, docks the windows of tray icon
//! clients into a host bar and keeps them laid out in a strip. The host supplies the X connection
//! through [`TrayConnection`] (see [`x11::X11Connection`] for the x11rb implementation), a drawing
//! surface through [`Drawer`], and feeds every X event into [`Systray::handle_event`].

mod config;
pub use config::*;

pub mod conn;
pub use conn::{Drawer, HostHandles, TrayConnection};

mod error;
pub use error::*;

mod icon;
pub use icon::*;

mod manager;
pub use manager::*;

mod registry;
pub use registry::{Registry, WindowRole};

mod tray_window;
pub use tray_window::{DockTarget, TrayWindow};

pub mod wire;

pub mod x11;

#[cfg(test)]
mod testing;

use std::{
    os::unix::io::AsRawFd,
    rc::Rc,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use anyhow::{Context, Result};
use clap::Parser;
use nix::{
    errno::Errno,
    poll::{poll, PollFd, PollFlags},
};
use systray::{x11::X11Connection, Color, HostHandles, Systray};
use x11rb::{connection::Connection, protocol::Event, rust_connection::RustConnection};

use bar::{Bar, PixmapDrawer};

mod bar;
mod opts;

const DEFAULT_BACKGROUND: Color = Color(0x222222);
/// The signal handler runs on its own thread and can't interrupt the wait for X input,
/// so the wait gives up this often to look at the shutdown flag.
const SHUTDOWN_CHECK_MS: i32 = 500;

fn main() {
    let opts = opts::Opt::parse();

    let log_level_filter = if opts.log_debug { log::LevelFilter::Debug } else { log::LevelFilter::Info };
    if std::env::var("RUST_LOG").is_ok() {
        pretty_env_logger::init_timed();
    } else {
        pretty_env_logger::formatted_timed_builder()
            .filter(Some("traybar"), log_level_filter)
            .filter(Some("systray"), log_level_filter)
            .init();
    }

    if let Err(err) = run(opts) {
        log::error!("{:?}", err);
        std::process::exit(1);
    }
}

fn run(opts: opts::Opt) -> Result<()> {
    let config = opts.systray_config()?;
    let (conn, screen_num) = RustConnection::connect(None).context("Failed to connect to the X server")?;
    let conn = Rc::new(conn);

    let background = config.background.unwrap_or(DEFAULT_BACKGROUND);
    let bar = Bar::create(&conn, screen_num, opts.height, background)?;
    let drawer = PixmapDrawer::new(conn.clone(), &bar)?;
    let mut systray = Systray::new(X11Connection::new(conn.clone(), screen_num), drawer, config);

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        simple_signal::set_handler(&[simple_signal::Signal::Int, simple_signal::Signal::Term], move |_| {
            log::info!("Shutting down traybar...");
            running.store(false, Ordering::SeqCst);
        });
    }

    let host = HostHandles { bar_window: bar.window, bar_height: bar.height, bar_background: bar.background, screen: screen_num };
    let result = systray
        .configure(host)
        .context("Failed to become the system tray")
        .and_then(|_| run_event_loop(&conn, &bar, &mut systray, &running));

    systray.shutdown();
    result
}

fn run_event_loop(conn: &RustConnection, bar: &Bar, systray: &mut Systray<X11Connection, PixmapDrawer>, running: &AtomicBool) -> Result<()> {
    systray.draw()?;
    while running.load(Ordering::SeqCst) {
        let Some(event) = conn.poll_for_event().context("Lost connection to the X server")? else {
            conn.flush().context("Lost connection to the X server")?;
            wait_for_input(conn)?;
            continue;
        };
        match &event {
            Event::Expose(ev) if ev.window == bar.window => {
                if ev.count == 0 {
                    systray.draw()?;
                }
            }
            Event::Error(err) => log::debug!("Asynchronous X11 error: {:?}", err),
            _ => {
                if !systray.handle_event(&event)? {
                    log::trace!("Ignoring event {:?}", event);
                }
            }
        }
    }
    Ok(())
}

/// Block until the X server has something for us, or the shutdown check is due.
fn wait_for_input(conn: &RustConnection) -> Result<()> {
    let mut fds = [PollFd::new(conn.stream().as_raw_fd(), PollFlags::POLLIN)];
    match poll(&mut fds, SHUTDOWN_CHECK_MS) {
        Ok(_) | Err(Errno::EINTR) => Ok(()),
        Err(err) => Err(err).context("Failed to wait for X events"),
    }
}

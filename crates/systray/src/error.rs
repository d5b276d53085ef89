use thiserror::Error;
use x11rb::{
    errors::{ConnectionError, ReplyError, ReplyOrIdError},
    protocol::{xproto::Window, ErrorKind},
    x11_utils::X11Error,
};

#[derive(Error, Debug)]
pub enum Error {
    #[error("X11 connection error")]
    Connection(#[from] ConnectionError),
    #[error("Drawable {0:#x} is not (or no longer) valid")]
    BadDrawable(Window),
    #[error("Window {0:#x} does not exist")]
    BadWindow(Window),
    #[error("Request on window {0:#x} did not match its current state")]
    BadMatch(Window),
    #[error("X11 request failed: {0:?}")]
    Protocol(X11Error),
    #[error("Ran out of X11 resource ids")]
    IdsExhausted,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Errors caused by a foreign window that vanished or is not realized yet.
    /// These only ever concern a single icon and are never fatal for the tray.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::BadDrawable(_) | Error::BadWindow(_) | Error::BadMatch(_))
    }

    /// Only a broken connection takes the whole tray down.
    /// Every other error is confined to the request (and icon) that caused it.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Connection(_))
    }
}

impl From<X11Error> for Error {
    fn from(err: X11Error) -> Self {
        match err.error_kind {
            ErrorKind::Drawable => Error::BadDrawable(err.bad_value),
            ErrorKind::Window => Error::BadWindow(err.bad_value),
            ErrorKind::Match => Error::BadMatch(err.bad_value),
            _ => Error::Protocol(err),
        }
    }
}

impl From<ReplyError> for Error {
    fn from(err: ReplyError) -> Self {
        match err {
            ReplyError::ConnectionError(e) => Error::Connection(e),
            ReplyError::X11Error(e) => e.into(),
        }
    }
}

impl From<ReplyOrIdError> for Error {
    fn from(err: ReplyOrIdError) -> Self {
        match err {
            ReplyOrIdError::IdsExhausted => Error::IdsExhausted,
            ReplyOrIdError::ConnectionError(e) => Error::Connection(e),
            ReplyOrIdError::X11Error(e) => e.into(),
        }
    }
}

//! Encoding and decoding of the two messages of the system tray protocol that the manager cares about.
//!
//! See <https://specifications.freedesktop.org/systemtray-spec/systemtray-spec-latest.html>.

use x11rb::protocol::xproto::{Atom, ClientMessageEvent, Timestamp, Window, CLIENT_MESSAGE_EVENT};

/// Every ClientMessage in this protocol uses 32 bit data words.
pub const FORMAT_32: u8 = 32;

/// Operation codes carried in data word 1 of a `_NET_SYSTEM_TRAY_OPCODE` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayOperation {
    RequestDock,
    BeginMessage,
    CancelMessage,
    Other(u32),
}

impl From<u32> for TrayOperation {
    fn from(code: u32) -> Self {
        match code {
            0 => TrayOperation::RequestDock,
            1 => TrayOperation::BeginMessage,
            2 => TrayOperation::CancelMessage,
            other => TrayOperation::Other(other),
        }
    }
}

impl From<TrayOperation> for u32 {
    fn from(op: TrayOperation) -> Self {
        match op {
            TrayOperation::RequestDock => 0,
            TrayOperation::BeginMessage => 1,
            TrayOperation::CancelMessage => 2,
            TrayOperation::Other(code) => code,
        }
    }
}

/// A `_NET_SYSTEM_TRAY_OPCODE` message sent by a tray icon client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DockRequest {
    pub opcode: Atom,
    pub timestamp: Timestamp,
    pub operation: TrayOperation,
    pub window: Window,
}

/// The MANAGER broadcast announcing a new owner of the tray selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerBroadcast {
    pub root: Window,
    pub manager_atom: Atom,
    pub selection_atom: Atom,
    pub time: Timestamp,
    pub owner: Window,
}

/// Pack a MANAGER ClientMessage.
///
/// Layout (native byte order, as the X server expects from this client):
/// code, format, sequence, window, type, then five data words `[time, selection, owner, 0, 0]`.
pub fn encode_manager_broadcast(
    root: Window,
    manager_atom: Atom,
    selection_atom: Atom,
    time: Timestamp,
    owner: Window,
) -> [u8; 32] {
    let mut event = [0u8; 32];
    event[0] = CLIENT_MESSAGE_EVENT;
    event[1] = FORMAT_32;
    // bytes 2..4 hold the sequence number, which the server fills in
    let words = [root, manager_atom, time, selection_atom, owner, 0, 0];
    for (chunk, word) in event[4..].chunks_exact_mut(4).zip(words) {
        chunk.copy_from_slice(&word.to_ne_bytes());
    }
    event
}

/// Inverse of [`encode_manager_broadcast`].
pub fn decode_manager_broadcast(event: &[u8; 32]) -> Option<ManagerBroadcast> {
    if event[0] & 0x7f != CLIENT_MESSAGE_EVENT || event[1] != FORMAT_32 {
        return None;
    }
    let word = |i: usize| {
        let offset = 4 + i * 4;
        u32::from_ne_bytes([event[offset], event[offset + 1], event[offset + 2], event[offset + 3]])
    };
    Some(ManagerBroadcast { root: word(0), manager_atom: word(1), time: word(2), selection_atom: word(3), owner: word(4) })
}

/// Parse a ClientMessage as a tray opcode message, if it is one.
///
/// Only [`TrayOperation::RequestDock`] is acted upon by the tray, the other operations are
/// still decoded so callers can log and drop them.
pub fn decode_dock_request(event: &ClientMessageEvent, opcode_atom: Atom) -> Option<DockRequest> {
    if event.type_ != opcode_atom || event.format != FORMAT_32 {
        return None;
    }
    let data = event.data.as_data32();
    Some(DockRequest { opcode: event.type_, timestamp: data[0], operation: data[1].into(), window: data[2] })
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_manager_broadcast_layout() {
        let event = encode_manager_broadcast(0x1e2, 0x12c, 0x130, 0, 0x600001);
        let mut expected = vec![33u8, 32, 0, 0];
        for word in [0x1e2u32, 0x12c, 0, 0x130, 0x600001, 0, 0] {
            expected.extend_from_slice(&word.to_ne_bytes());
        }
        assert_eq!(expected, event.to_vec());
    }

    #[test]
    fn test_manager_broadcast_matches_x11rb_client_message() {
        let ours = encode_manager_broadcast(0x1e2, 0x12c, 0x130, 0, 0x600001);
        let theirs: [u8; 32] = ClientMessageEvent::new(FORMAT_32, 0x1e2u32, 0x12cu32, [0, 0x130, 0x600001, 0, 0]).into();
        assert_eq!(theirs, ours);
    }

    #[test]
    fn test_manager_broadcast_decode() {
        let event = encode_manager_broadcast(7, 42, 43, 1234, 0x600001);
        assert_eq!(
            Some(ManagerBroadcast { root: 7, manager_atom: 42, selection_atom: 43, time: 1234, owner: 0x600001 }),
            decode_manager_broadcast(&event)
        );

        let mut not_a_client_message = event;
        not_a_client_message[0] = 22;
        assert_eq!(None, decode_manager_broadcast(&not_a_client_message));
    }

    #[test]
    fn test_decode_dock_request() {
        let event = ClientMessageEvent::new(FORMAT_32, 0x600001u32, 300u32, [0, 0, 0x800003, 0, 0]);
        assert_eq!(
            Some(DockRequest { opcode: 300, timestamp: 0, operation: TrayOperation::RequestDock, window: 0x800003 }),
            decode_dock_request(&event, 300)
        );
        assert_eq!(None, decode_dock_request(&event, 301));
    }

    #[test]
    fn test_decode_other_operations() {
        let begin = ClientMessageEvent::new(FORMAT_32, 0x600001u32, 300u32, [0, 1, 3000, 11, 1]);
        assert_eq!(Some(TrayOperation::BeginMessage), decode_dock_request(&begin, 300).map(|r| r.operation));

        let unknown = ClientMessageEvent::new(FORMAT_32, 0x600001u32, 300u32, [0, 17, 0x800003, 0, 0]);
        assert_eq!(Some(TrayOperation::Other(17)), decode_dock_request(&unknown, 300).map(|r| r.operation));
        assert_eq!(17u32, u32::from(TrayOperation::Other(17)));
    }
}

use std::net::UdpSocket;

use rosc::{encoder, OscMessage, OscPacket, OscType};
use thiserror::Error;

// Access global debug flag from crate root
use crate::is_debug_enabled;

#[derive(Debug, Error)]
pub enum SendError {
    #[error("OSC encoding failed: {0}")]
    Encode(#[from] rosc::OscError),
    #[error("UDP send failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Sink for single-argument OSC messages. The production implementation is
/// a UDP socket; tests substitute a recorder.
pub trait OscSink {
    fn send(&mut self, addr: &str, value: OscType) -> Result<(), SendError>;
}

/// Fire-and-forget OSC sender. The socket is connected to its target once,
/// so plain `send()` can be used afterwards.
pub struct OscSender {
    socket: UdpSocket,
    target: String,
}

impl OscSender {
    pub fn new(ip: &str, port: u16) -> Result<OscSender, SendError> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        let target = format!("{}:{}", ip, port);
        socket.connect(&target)?;
        Ok(OscSender { socket, target })
    }
}

impl OscSink for OscSender {
    fn send(&mut self, addr: &str, value: OscType) -> Result<(), SendError> {
        let msg = OscMessage {
            addr: addr.to_string(),
            args: vec![value],
        };
        let packet = OscPacket::Message(msg);
        let msg_buf = encoder::encode(&packet)?;
        let bytes_sent = self.socket.send(&msg_buf)?;
        if is_debug_enabled() {
            println!("[OSC] Sent {} bytes to {}: {}", bytes_sent, self.target, addr);
        }
        Ok(())
    }
}

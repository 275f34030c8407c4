use std::net::SocketAddr;

/// One UDP datagram. `peer` is the remote side: the sender on the way in,
/// the destination on the way out. `local` is the socket's own address, kept
/// so a handler can reconstruct the full addressing of the datagram.
pub struct Message {
    pub peer: SocketAddr,
    pub local: SocketAddr,
    pub buffer: [u8; 512],
    pub size: usize,
}

impl Message {
    /// An outbound datagram towards `peer`. Payloads over 512 bytes are cut;
    /// DNS over UDP never legitimately produces them.
    pub fn to(peer: SocketAddr, local: SocketAddr, payload: &[u8]) -> Self {
        let size = payload.len().min(512);
        let mut buffer = [0u8; 512];
        buffer[..size].copy_from_slice(&payload[..size]);
        Self {
            peer,
            local,
            buffer,
            size,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buffer[..self.size]
    }
}

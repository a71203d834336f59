//! Per-connection descriptor: buffers, framing, snoop, color.

use std::io::{self, Read, Write};

use bytes::BytesMut;
use mio::net::TcpStream;
use rustls::ServerConnection;

use mudstone_types::{strip_color, translate_color, ColorMode};

use crate::telnet::{filter_input, TelnetState};

/// One full command line; input beyond this is truncated.
pub const INPUT_BUFFER_SIZE: usize = 1024;
/// Output ceiling; a session that falls this far behind is dropped.
pub const OUTPUT_CEILING: usize = 128 * 1024;
/// Read chunk size per readiness event.
const READ_CHUNK: usize = 4096;

/// Stable descriptor identity, independent of the mio token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DescId(pub u64);

impl std::fmt::Display for DescId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "desc#{}", self.0)
    }
}

/// The transport under a descriptor; TLS is invisible above this enum.
pub(crate) enum Transport {
    Plain(TcpStream),
    Tls(TcpStream, Box<ServerConnection>),
}

impl Transport {
    pub(crate) fn stream_mut(&mut self) -> &mut TcpStream {
        match self {
            Transport::Plain(stream) | Transport::Tls(stream, _) => stream,
        }
    }

    /// Non-blocking read of decrypted bytes. `Ok(0)` is end of stream.
    fn read_plain(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Transport::Plain(stream) => stream.read(buf),
            Transport::Tls(stream, tls) => {
                while tls.wants_read() {
                    match tls.read_tls(stream) {
                        Ok(0) => return Ok(0),
                        Ok(_) => {
                            tls.process_new_packets()
                                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                            // Handshake replies leave through the same
                            // socket as soon as it will take them.
                            while tls.wants_write() {
                                match tls.write_tls(stream) {
                                    Ok(_) => {}
                                    Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                                    Err(e) => return Err(e),
                                }
                            }
                        }
                        Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                        Err(e) => return Err(e),
                    }
                }
                match tls.reader().read(buf) {
                    Ok(n) => Ok(n),
                    Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                        Err(io::ErrorKind::WouldBlock.into())
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }

    /// Non-blocking write of plaintext bytes; TLS flushes records as far
    /// as the socket allows.
    fn write_plain(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Transport::Plain(stream) => stream.write(buf),
            Transport::Tls(stream, tls) => {
                let written = tls.writer().write(buf)?;
                while tls.wants_write() {
                    match tls.write_tls(stream) {
                        Ok(_) => {}
                        Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                        Err(e) => return Err(e),
                    }
                }
                Ok(written)
            }
        }
    }
}

/// One client connection.
pub struct Descriptor {
    pub id: DescId,
    pub(crate) transport: Transport,
    pub host: String,

    telnet: TelnetState,
    /// Bytes of the line being assembled.
    line_buf: Vec<u8>,
    /// Completed lines awaiting dispatch.
    pending: std::collections::VecDeque<String>,
    /// Last dispatched command, for the `!` shortcut.
    inlast: String,
    outbuf: BytesMut,
    /// Set while a password is being typed; pending lines are not
    /// snooped or echoed into history.
    pub hide_input: bool,
    pub color: ColorMode,
    /// Descriptor receiving a mirror of this session's input.
    pub snoop_by: Option<DescId>,
    pub closing: bool,
    /// Output overflow or read error observed; reap after final flush.
    broken: bool,
}

impl Descriptor {
    pub(crate) fn new(id: DescId, transport: Transport, host: String) -> Self {
        Descriptor {
            id,
            transport,
            host,
            telnet: TelnetState::default(),
            line_buf: Vec::with_capacity(128),
            pending: std::collections::VecDeque::new(),
            inlast: String::new(),
            outbuf: BytesMut::with_capacity(4096),
            hide_input: false,
            color: ColorMode::Strip,
            snoop_by: None,
            closing: false,
            broken: false,
        }
    }

    /// Reads available bytes and assembles complete lines. Returns the
    /// lines completed by this read so the caller can mirror them to a
    /// snooper. A closed or errored stream marks the descriptor broken.
    pub(crate) fn fill(&mut self) -> Vec<String> {
        let mut completed = Vec::new();
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match self.transport.read_plain(&mut chunk) {
                Ok(0) => {
                    self.broken = true;
                    break;
                }
                Ok(n) => {
                    let mut data = Vec::with_capacity(n);
                    let mut reply = Vec::new();
                    filter_input(&mut self.telnet, &chunk[..n], &mut data, &mut reply);
                    if !reply.is_empty() {
                        self.queue_bytes(&reply);
                    }
                    for byte in data {
                        self.push_byte(byte, &mut completed);
                    }
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(_) => {
                    self.broken = true;
                    break;
                }
            }
        }
        completed
    }

    /// Feeds one data byte into the line buffer, honoring backspace and
    /// `^U` kill.
    fn push_byte(&mut self, byte: u8, completed: &mut Vec<String>) {
        match byte {
            b'\r' | b'\n' => {
                if self.line_buf.is_empty() {
                    // Swallow the LF of a CRLF pair.
                    return;
                }
                let line = String::from_utf8_lossy(&self.line_buf).into_owned();
                self.line_buf.clear();
                completed.push(line.clone());
                self.pending.push_back(line);
            }
            0x08 | 0x7f => {
                self.line_buf.pop();
            }
            0x15 => self.line_buf.clear(),
            _ if byte < 0x20 => {}
            _ => {
                if self.line_buf.len() < INPUT_BUFFER_SIZE {
                    self.line_buf.push(byte);
                }
            }
        }
    }

    /// Takes the next pending command, replaying the previous one for
    /// `!`.
    pub fn next_command(&mut self) -> Option<String> {
        let line = self.pending.pop_front()?;
        if line.trim() == "!" {
            return Some(self.inlast.clone());
        }
        if !self.hide_input {
            self.inlast = line.clone();
        }
        Some(line)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Queues text for the client, translating or stripping color
    /// escapes per the session preference.
    pub fn send(&mut self, text: &str) {
        let rendered = match self.color {
            ColorMode::Ansi => translate_color(text),
            ColorMode::Strip => strip_color(text),
        };
        self.queue_bytes(rendered.as_bytes());
    }

    /// Queues raw bytes (telnet sequences, prompts).
    pub fn queue_bytes(&mut self, bytes: &[u8]) {
        if self.outbuf.len() + bytes.len() > OUTPUT_CEILING {
            tracing::warn!(desc = %self.id, "output overflow, dropping session");
            self.broken = true;
            return;
        }
        self.outbuf.extend_from_slice(bytes);
    }

    /// Writes as much buffered output as the socket accepts.
    pub(crate) fn flush(&mut self) {
        while !self.outbuf.is_empty() {
            match self.transport.write_plain(&self.outbuf) {
                Ok(0) => {
                    self.broken = true;
                    break;
                }
                Ok(n) => {
                    let _ = self.outbuf.split_to(n);
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(_) => {
                    self.broken = true;
                    break;
                }
            }
        }
    }

    pub fn has_output(&self) -> bool {
        !self.outbuf.is_empty()
    }

    /// Whether the descriptor should be reaped this pulse.
    pub fn is_dead(&self) -> bool {
        self.broken || (self.closing && self.outbuf.is_empty())
    }

    pub(crate) fn mark_broken(&mut self) {
        self.broken = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a descriptor over an unconnected socket pair substitute;
    /// only the buffer logic is exercised.
    fn buffer_only() -> Descriptor {
        // A TcpStream is required structurally; connect to a listener we
        // immediately drop. The tests below never read or write it.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let stream = std::net::TcpStream::connect(addr).unwrap();
        stream.set_nonblocking(true).unwrap();
        let stream = TcpStream::from_std(stream);
        Descriptor::new(DescId(1), Transport::Plain(stream), "test".into())
    }

    fn feed(desc: &mut Descriptor, bytes: &[u8]) -> Vec<String> {
        let mut completed = Vec::new();
        for &b in bytes {
            desc.push_byte(b, &mut completed);
        }
        completed
    }

    #[test]
    fn crlf_completes_a_line() {
        let mut desc = buffer_only();
        let lines = feed(&mut desc, b"look\r\nnorth\r\n");
        assert_eq!(lines, vec!["look", "north"]);
        assert_eq!(desc.next_command().as_deref(), Some("look"));
        assert_eq!(desc.next_command().as_deref(), Some("north"));
        assert_eq!(desc.next_command(), None);
    }

    #[test]
    fn backspace_edits_in_buffer() {
        let mut desc = buffer_only();
        feed(&mut desc, b"lok\x08ok\r\n");
        assert_eq!(desc.next_command().as_deref(), Some("look"));
    }

    #[test]
    fn ctrl_u_kills_the_line() {
        let mut desc = buffer_only();
        feed(&mut desc, b"garbage\x15say hi\r\n");
        assert_eq!(desc.next_command().as_deref(), Some("say hi"));
    }

    #[test]
    fn bang_replays_last_command() {
        let mut desc = buffer_only();
        feed(&mut desc, b"kill rat\r\n!\r\n");
        assert_eq!(desc.next_command().as_deref(), Some("kill rat"));
        assert_eq!(desc.next_command().as_deref(), Some("kill rat"));
    }

    #[test]
    fn oversized_line_is_truncated() {
        let mut desc = buffer_only();
        let long = vec![b'a'; INPUT_BUFFER_SIZE + 100];
        feed(&mut desc, &long);
        feed(&mut desc, b"\r\n");
        let line = desc.next_command().unwrap();
        assert_eq!(line.len(), INPUT_BUFFER_SIZE);
    }

    #[test]
    fn output_overflow_breaks_the_descriptor() {
        let mut desc = buffer_only();
        let blob = "x".repeat(OUTPUT_CEILING + 1);
        desc.send(&blob);
        assert!(desc.is_dead());
    }

    #[test]
    fn color_strip_mode_removes_escapes() {
        let mut desc = buffer_only();
        desc.send("{Rred{x\n\r");
        assert_eq!(&desc.outbuf[..], b"red\n\r");
    }
}

//! The mio poll surface: listener, descriptor table, event pump.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mio::net::TcpListener;
use mio::{Events, Interest, Poll, Token};
use rustls::{ServerConfig, ServerConnection};
use tracing::{debug, info};

use crate::descriptor::{DescId, Descriptor, Transport};
use crate::error::{NetError, NetResult};
use crate::tls::TlsConfig;

const LISTENER: Token = Token(0);

/// Connection lifecycle events surfaced to the game loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetEvent {
    Connected(DescId),
    Disconnected(DescId),
}

/// The session layer: one listening socket, a descriptor table, and the
/// poll that the heartbeat blocks on.
pub struct NetServer {
    poll: Poll,
    events: Events,
    listener: TcpListener,
    tls: Option<Arc<ServerConfig>>,
    descriptors: HashMap<DescId, Descriptor>,
    tokens: HashMap<Token, DescId>,
    /// Insertion order; command processing follows accept order.
    order: Vec<DescId>,
    next_id: u64,
}

impl NetServer {
    /// Binds the listening socket and registers it with the poll.
    pub fn bind(addr: SocketAddr, tls: Option<&TlsConfig>) -> NetResult<Self> {
        let mut listener =
            TcpListener::bind(addr).map_err(|source| NetError::BindFailed { addr, source })?;
        let poll = Poll::new()?;
        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)?;
        let tls = match tls {
            Some(config) => Some(config.build()?),
            None => None,
        };
        info!(%addr, tls = tls.is_some(), "listening");
        Ok(NetServer {
            poll,
            events: Events::with_capacity(256),
            listener,
            tls,
            descriptors: HashMap::new(),
            tokens: HashMap::new(),
            order: Vec::new(),
            next_id: 1,
        })
    }

    /// Blocks up to `timeout` for socket readiness, then accepts new
    /// connections and drains readable descriptors into their line
    /// buffers. Input mirroring to snoopers happens here, at line
    /// granularity.
    pub fn pump(&mut self, timeout: Duration) -> NetResult<Vec<NetEvent>> {
        let mut lifecycle = Vec::new();
        match self.poll.poll(&mut self.events, Some(timeout)) {
            Ok(()) => {}
            Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => {
                return Ok(lifecycle);
            }
            Err(e) => return Err(e.into()),
        }

        let mut readable: Vec<DescId> = Vec::new();
        let mut accept_ready = false;
        for event in &self.events {
            if event.token() == LISTENER {
                accept_ready = true;
            } else if let Some(&id) = self.tokens.get(&event.token()) {
                if event.is_readable() {
                    readable.push(id);
                }
            }
        }

        if accept_ready {
            self.accept_pending(&mut lifecycle)?;
        }

        for id in readable {
            let (completed, hidden, snooper) = match self.descriptors.get_mut(&id) {
                Some(desc) => (desc.fill(), desc.hide_input, desc.snoop_by),
                None => continue,
            };
            if let Some(snoop_id) = snooper {
                if !hidden {
                    for line in &completed {
                        if let Some(watcher) = self.descriptors.get_mut(&snoop_id) {
                            watcher.send(&format!("% {line}\n\r"));
                        }
                    }
                }
            }
        }

        Ok(lifecycle)
    }

    fn accept_pending(&mut self, lifecycle: &mut Vec<NetEvent>) -> NetResult<()> {
        loop {
            match self.listener.accept() {
                Ok((mut stream, peer)) => {
                    self.next_id += 1;
                    let id = DescId(self.next_id);
                    let token = Token(self.next_id as usize);
                    self.poll.registry().register(
                        &mut stream,
                        token,
                        Interest::READABLE | Interest::WRITABLE,
                    )?;
                    let transport = match &self.tls {
                        Some(config) => match ServerConnection::new(Arc::clone(config)) {
                            Ok(conn) => Transport::Tls(stream, Box::new(conn)),
                            Err(e) => {
                                debug!(%peer, error = %e, "TLS session setup failed");
                                continue;
                            }
                        },
                        None => Transport::Plain(stream),
                    };
                    let host = peer.ip().to_string();
                    self.descriptors
                        .insert(id, Descriptor::new(id, transport, host));
                    self.tokens.insert(token, id);
                    self.order.push(id);
                    debug!(desc = %id, %peer, "connection accepted");
                    lifecycle.push(NetEvent::Connected(id));
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Descriptors in accept order, for the command pass.
    pub fn descriptor_ids(&self) -> Vec<DescId> {
        self.order.clone()
    }

    pub fn descriptor(&self, id: DescId) -> Option<&Descriptor> {
        self.descriptors.get(&id)
    }

    pub fn descriptor_mut(&mut self, id: DescId) -> Option<&mut Descriptor> {
        self.descriptors.get_mut(&id)
    }

    /// Queues text to one descriptor. Unknown ids are ignored (the
    /// session may have died earlier in the pulse).
    pub fn send(&mut self, id: DescId, text: &str) {
        if let Some(desc) = self.descriptors.get_mut(&id) {
            desc.send(text);
        }
    }

    /// Flushes every descriptor's pending output.
    pub fn flush_all(&mut self) {
        for desc in self.descriptors.values_mut() {
            if desc.has_output() {
                desc.flush();
            }
        }
    }

    /// Requests an orderly close once remaining output drains.
    pub fn close(&mut self, id: DescId) {
        if let Some(desc) = self.descriptors.get_mut(&id) {
            desc.closing = true;
        }
    }

    /// Drops a descriptor immediately (protocol violation, overflow).
    pub fn drop_now(&mut self, id: DescId) {
        if let Some(desc) = self.descriptors.get_mut(&id) {
            desc.mark_broken();
        }
    }

    /// Removes dead descriptors, deregistering their sockets, and
    /// reports them. Snoop links into the dead are cleared.
    pub fn reap(&mut self) -> Vec<NetEvent> {
        let dead: Vec<DescId> = self
            .descriptors
            .iter()
            .filter(|(_, d)| d.is_dead())
            .map(|(&id, _)| id)
            .collect();
        let mut events = Vec::new();
        for id in dead {
            if let Some(mut desc) = self.descriptors.remove(&id) {
                let _ = self.poll.registry().deregister(desc.transport.stream_mut());
                events.push(NetEvent::Disconnected(id));
            }
            self.tokens.retain(|_, v| *v != id);
            self.order.retain(|v| *v != id);
            for desc in self.descriptors.values_mut() {
                if desc.snoop_by == Some(id) {
                    desc.snoop_by = None;
                }
            }
            debug!(desc = %id, "connection reaped");
        }
        events
    }

    pub fn connection_count(&self) -> usize {
        self.descriptors.len()
    }
}

//! # mudstone-net: the client session layer
//!
//! Non-blocking TCP (optionally TLS) with a mio poll loop, owned by the
//! single server thread. This crate knows bytes, telnet, and lines; it
//! knows nothing about logins, characters, or commands.
//!
//! ```text
//! ┌───────────────────────────────────────────────────┐
//! │                    NetServer                      │
//! │  ┌──────────┐   ┌──────────────┐  ┌────────────┐  │
//! │  │ Listener │ → │ Descriptors  │→ │ line queue │  │
//! │  │ (mio)    │   │ (buffers,    │  │ per desc   │  │
//! │  └──────────┘   │  telnet, TLS)│  └────────────┘  │
//! │                 └──────────────┘                  │
//! └───────────────────────────────────────────────────┘
//! ```
//!
//! Each descriptor owns a bounded input line buffer, a growable output
//! buffer with a drop ceiling, the `!` replay scratch, a snoop link, and
//! a color preference applied when text is queued.

mod descriptor;
mod error;
mod server;
mod telnet;
mod tls;

pub use descriptor::{DescId, Descriptor, INPUT_BUFFER_SIZE, OUTPUT_CEILING};
pub use error::{NetError, NetResult};
pub use server::{NetEvent, NetServer};
pub use telnet::{echo_off, echo_on, go_ahead};
pub use tls::TlsConfig;

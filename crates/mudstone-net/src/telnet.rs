//! Minimal telnet option handling.
//!
//! The negotiation surface is what MUD clients need: suppress-go-ahead,
//! echo off during password entry, and consuming (without honoring) any
//! other option so IAC noise never reaches the line buffer.

const IAC: u8 = 255;
const DONT: u8 = 254;
const DO: u8 = 253;
const WONT: u8 = 252;
const WILL: u8 = 251;
const SB: u8 = 250;
const SE: u8 = 240;
const GA: u8 = 249;

const OPT_ECHO: u8 = 1;
const OPT_SGA: u8 = 3;

/// Telnet parse state carried per descriptor between reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum TelnetState {
    #[default]
    Data,
    Iac,
    /// Saw IAC WILL/WONT/DO/DONT; next byte is the option.
    Command(u8),
    /// Inside a subnegotiation, discarding until IAC SE.
    Sub,
    SubIac,
}

/// Filters one chunk of raw input. Plain data bytes are appended to
/// `out`; negotiation responses are appended to `reply`.
pub(crate) fn filter_input(
    state: &mut TelnetState,
    input: &[u8],
    out: &mut Vec<u8>,
    reply: &mut Vec<u8>,
) {
    for &byte in input {
        match *state {
            TelnetState::Data => {
                if byte == IAC {
                    *state = TelnetState::Iac;
                } else {
                    out.push(byte);
                }
            }
            TelnetState::Iac => match byte {
                IAC => {
                    out.push(IAC);
                    *state = TelnetState::Data;
                }
                WILL | WONT | DO | DONT => *state = TelnetState::Command(byte),
                SB => *state = TelnetState::Sub,
                _ => *state = TelnetState::Data,
            },
            TelnetState::Command(verb) => {
                respond(verb, byte, reply);
                *state = TelnetState::Data;
            }
            TelnetState::Sub => {
                if byte == IAC {
                    *state = TelnetState::SubIac;
                }
            }
            TelnetState::SubIac => {
                *state = if byte == SE {
                    TelnetState::Data
                } else {
                    TelnetState::Sub
                };
            }
        }
    }
}

/// Replies to a client request: agree to suppress-go-ahead, refuse
/// everything else.
fn respond(verb: u8, option: u8, reply: &mut Vec<u8>) {
    match (verb, option) {
        (DO, OPT_SGA) => reply.extend_from_slice(&[IAC, WILL, OPT_SGA]),
        (DO, _) => reply.extend_from_slice(&[IAC, WONT, option]),
        (WILL, _) => reply.extend_from_slice(&[IAC, DONT, option]),
        // WONT/DONT acknowledgements need no answer.
        _ => {}
    }
}

/// Sequence that turns client echo off (server claims echo) for password
/// entry.
pub fn echo_off() -> &'static [u8] {
    &[IAC, WILL, OPT_ECHO]
}

/// Sequence that restores client-side echo.
pub fn echo_on() -> &'static [u8] {
    &[IAC, WONT, OPT_ECHO]
}

/// Go-ahead mark sent after prompts for clients that want it.
pub fn go_ahead() -> &'static [u8] {
    &[IAC, GA]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_bytes_pass_through() {
        let mut state = TelnetState::default();
        let mut out = Vec::new();
        let mut reply = Vec::new();
        filter_input(&mut state, b"hello\r\n", &mut out, &mut reply);
        assert_eq!(out, b"hello\r\n");
        assert!(reply.is_empty());
    }

    #[test]
    fn escaped_iac_is_literal() {
        let mut state = TelnetState::default();
        let mut out = Vec::new();
        let mut reply = Vec::new();
        filter_input(&mut state, &[IAC, IAC, b'x'], &mut out, &mut reply);
        assert_eq!(out, &[IAC, b'x']);
    }

    #[test]
    fn negotiation_is_consumed_and_answered() {
        let mut state = TelnetState::default();
        let mut out = Vec::new();
        let mut reply = Vec::new();
        filter_input(&mut state, &[IAC, DO, OPT_SGA, b'a'], &mut out, &mut reply);
        assert_eq!(out, b"a");
        assert_eq!(reply, &[IAC, WILL, OPT_SGA]);
    }

    #[test]
    fn unknown_do_is_refused() {
        let mut state = TelnetState::default();
        let mut out = Vec::new();
        let mut reply = Vec::new();
        filter_input(&mut state, &[IAC, DO, 42], &mut out, &mut reply);
        assert_eq!(reply, &[IAC, WONT, 42]);
    }

    #[test]
    fn subnegotiation_spanning_reads_is_discarded() {
        let mut state = TelnetState::default();
        let mut out = Vec::new();
        let mut reply = Vec::new();
        filter_input(&mut state, &[IAC, SB, 1, 2, 3], &mut out, &mut reply);
        filter_input(&mut state, &[4, IAC, SE, b'z'], &mut out, &mut reply);
        assert_eq!(out, b"z");
    }
}

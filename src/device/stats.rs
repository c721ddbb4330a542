//! Typed payloads for the device's plain-text status endpoints.
//!
//! Every endpoint answers with a short comma-separated body such as
//! `"5,2,10,1"`. Position is the only contract, so each payload type
//! checks the field count and parses every field before handing values
//! to the dashboard. Nothing here renders blanks for missing fields.
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty response body")]
    Empty,
    #[error("expected {expected} comma-separated fields, found {found}")]
    FieldCount { expected: usize, found: usize },
    #[error("invalid number for {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
    #[error("invalid IPv4 address: {0:?}")]
    InvalidAddress(String),
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

/// Split a body into trimmed fields, requiring exactly `expected` of them.
fn split_fields(body: &str, expected: usize) -> Result<Vec<&str>, ParseError> {
    let body = body.trim();
    if body.is_empty() {
        return Err(ParseError::Empty);
    }

    let fields: Vec<&str> = body.split(',').map(str::trim).collect();
    if fields.len() != expected {
        return Err(ParseError::FieldCount {
            expected,
            found: fields.len(),
        });
    }
    Ok(fields)
}

fn parse_counter(field: &'static str, value: &str) -> Result<u64, ParseError> {
    value.parse::<u64>().map_err(|_| ParseError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Scheduler statistics (`/GetTXData`)
// ---------------------------------------------------------------------------

/// Scheduler counters reported by the RTOS.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxStats {
    pub resumptions: u64,
    pub suspensions: u64,
    pub idle_returns: u64,
    pub non_idle_returns: u64,
}

impl FromStr for TxStats {
    type Err = ParseError;

    fn from_str(body: &str) -> Result<Self, Self::Err> {
        let f = split_fields(body, 4)?;
        Ok(Self {
            resumptions: parse_counter("resumptions", f[0])?,
            suspensions: parse_counter("suspensions", f[1])?,
            idle_returns: parse_counter("idle_returns", f[2])?,
            non_idle_returns: parse_counter("non_idle_returns", f[3])?,
        })
    }
}

impl fmt::Display for TxStats {
    /// Wire format, as served by the device.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.resumptions, self.suspensions, self.idle_returns, self.non_idle_returns
        )
    }
}

// ---------------------------------------------------------------------------
// Network statistics (`/GetNXData`)
// ---------------------------------------------------------------------------

/// TCP counters reported by the network stack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NxStats {
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub connections: u64,
    pub disconnections: u64,
}

impl FromStr for NxStats {
    type Err = ParseError;

    fn from_str(body: &str) -> Result<Self, Self::Err> {
        let f = split_fields(body, 4)?;
        Ok(Self {
            bytes_sent: parse_counter("bytes_sent", f[0])?,
            bytes_received: parse_counter("bytes_received", f[1])?,
            connections: parse_counter("connections", f[2])?,
            disconnections: parse_counter("disconnections", f[3])?,
        })
    }
}

impl fmt::Display for NxStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.bytes_sent, self.bytes_received, self.connections, self.disconnections
        )
    }
}

// ---------------------------------------------------------------------------
// Network info (`/GetNetInfo`)
// ---------------------------------------------------------------------------

/// Address the device's HTTP server is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NetInfo {
    pub address: Ipv4Addr,
    pub port: u16,
}

impl FromStr for NetInfo {
    type Err = ParseError;

    fn from_str(body: &str) -> Result<Self, Self::Err> {
        let f = split_fields(body, 2)?;
        let address = f[0]
            .parse::<Ipv4Addr>()
            .map_err(|_| ParseError::InvalidAddress(f[0].to_string()))?;
        let port = f[1].parse::<u16>().map_err(|_| ParseError::InvalidNumber {
            field: "port",
            value: f[1].to_string(),
        })?;
        Ok(Self { address, port })
    }
}

// ---------------------------------------------------------------------------
// Thread run counters (`/GetTxCount`)
// ---------------------------------------------------------------------------

/// Run count of a single application thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadCount {
    pub name: String,
    pub run_count: u64,
}

/// Run counters for the device's application threads, in wire order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadCounts(pub Vec<ThreadCount>);

/// Number of `name,count` pairs the firmware reports.
pub const THREAD_COUNT_PAIRS: usize = 3;

impl FromStr for ThreadCounts {
    type Err = ParseError;

    fn from_str(body: &str) -> Result<Self, Self::Err> {
        let f = split_fields(body, THREAD_COUNT_PAIRS * 2)?;
        let threads = f
            .chunks_exact(2)
            .map(|pair| {
                Ok(ThreadCount {
                    name: pair[0].to_string(),
                    run_count: parse_counter("run_count", pair[1])?,
                })
            })
            .collect::<Result<Vec<_>, ParseError>>()?;
        Ok(Self(threads))
    }
}

// ---------------------------------------------------------------------------
// Packet pool (`/GetNXPacket`, `/GetNXPacketlen`)
// ---------------------------------------------------------------------------

/// Parse a single-counter body such as the packet pool endpoints return.
pub fn parse_single(field: &'static str, body: &str) -> Result<u64, ParseError> {
    let f = split_fields(body, 1)?;
    parse_counter(field, f[0])
}

/// Packet pool occupancy of the device's application pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PacketPool {
    /// Packets currently free in the pool.
    pub available: u64,
    /// Length of the packet at the head of the free list.
    pub head_length: u64,
}

// ---------------------------------------------------------------------------
// LED state
// ---------------------------------------------------------------------------

/// Requested state of the green LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedState {
    On,
    Off,
}

impl LedState {
    pub fn from_checked(checked: bool) -> Self {
        if checked { Self::On } else { Self::Off }
    }

    pub fn is_on(self) -> bool {
        self == Self::On
    }

    /// Label text mirrored next to the checkbox.
    pub fn label(self) -> &'static str {
        match self {
            Self::On => "On",
            Self::Off => "Off",
        }
    }
}

impl fmt::Display for LedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tx_stats_parse_positional_fields() {
        let tx: TxStats = "5,2,10,1".parse().unwrap();
        assert_eq!(
            tx,
            TxStats {
                resumptions: 5,
                suspensions: 2,
                idle_returns: 10,
                non_idle_returns: 1,
            }
        );
    }

    #[test]
    fn nx_stats_parse_positional_fields() {
        let nx: NxStats = "1000,2000,7,3".parse().unwrap();
        assert_eq!(nx.bytes_sent, 1000);
        assert_eq!(nx.bytes_received, 2000);
        assert_eq!(nx.connections, 7);
        assert_eq!(nx.disconnections, 3);
    }

    #[test]
    fn short_response_is_field_count_error() {
        let err = "5,2".parse::<TxStats>().unwrap_err();
        assert_eq!(
            err,
            ParseError::FieldCount {
                expected: 4,
                found: 2
            }
        );
    }

    #[test]
    fn long_response_is_field_count_error() {
        let err = "1,2,3,4,5".parse::<NxStats>().unwrap_err();
        assert!(matches!(err, ParseError::FieldCount { found: 5, .. }));
    }

    #[test]
    fn empty_response_is_empty_error() {
        assert_eq!("".parse::<TxStats>().unwrap_err(), ParseError::Empty);
        assert_eq!("  \r\n".parse::<NxStats>().unwrap_err(), ParseError::Empty);
    }

    #[test]
    fn non_numeric_field_names_the_field() {
        let err = "5,x,10,1".parse::<TxStats>().unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidNumber {
                field: "suspensions",
                value: "x".to_string()
            }
        );
    }

    #[test]
    fn negative_counter_rejected() {
        assert!("5,-2,10,1".parse::<TxStats>().is_err());
    }

    #[test]
    fn fields_are_trimmed() {
        let tx: TxStats = " 5, 2 ,10,1\r\n".parse().unwrap();
        assert_eq!(tx.suspensions, 2);
    }

    #[test]
    fn display_matches_wire_format() {
        let tx: TxStats = "5,2,10,1".parse().unwrap();
        assert_eq!(tx.to_string(), "5,2,10,1");
    }

    #[test]
    fn net_info_parses_address_and_port() {
        let info: NetInfo = "192.168.1.10,80".parse().unwrap();
        assert_eq!(info.address, Ipv4Addr::new(192, 168, 1, 10));
        assert_eq!(info.port, 80);
    }

    #[test]
    fn net_info_rejects_bad_address() {
        let err = "192.168.1,80".parse::<NetInfo>().unwrap_err();
        assert_eq!(err, ParseError::InvalidAddress("192.168.1".to_string()));
    }

    #[test]
    fn thread_counts_tolerate_firmware_spacing() {
        let counts: ThreadCounts = "App Main Thread,12 ,App Server Thread,340,LED Thread,7"
            .parse()
            .unwrap();
        assert_eq!(counts.0.len(), 3);
        assert_eq!(counts.0[0].name, "App Main Thread");
        assert_eq!(counts.0[0].run_count, 12);
        assert_eq!(counts.0[2].run_count, 7);
    }

    #[test]
    fn single_counter_parses() {
        assert_eq!(parse_single("available", "42").unwrap(), 42);
        assert!(parse_single("available", "42,1").is_err());
    }

    #[test]
    fn led_state_labels() {
        assert_eq!(LedState::from_checked(true).label(), "On");
        assert_eq!(LedState::from_checked(false).label(), "Off");
        assert!(LedState::On.is_on());
    }
}

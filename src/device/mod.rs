//! Device HTTP surface: endpoint paths, typed payloads, and the client seam.
//!
//! The device firmware answers a handful of fixed resources with short
//! comma-separated bodies. This module knows those paths and turns raw
//! bodies into typed values; it has no notion of pages or elements.

pub mod http;
pub mod stats;

use http::{DeviceError, HttpClient};
use stats::{LedState, NetInfo, NxStats, PacketPool, ThreadCounts, TxStats};

/// Scheduler statistics.
pub const TX_DATA: &str = "/GetTXData";
/// TCP statistics.
pub const NX_DATA: &str = "/GetNXData";
pub const LED_ON: &str = "/LedOn";
pub const LED_OFF: &str = "/LedOff";
/// Device IPv4 address and HTTP port.
pub const NET_INFO: &str = "/GetNetInfo";
/// Run counters of the application threads.
pub const TX_COUNT: &str = "/GetTxCount";
/// Free packets in the application pool.
pub const NX_PACKET: &str = "/GetNXPacket";
/// Length of the head packet in the pool's free list.
pub const NX_PACKET_LEN: &str = "/GetNXPacketlen";

/// Path of the command that drives the LED into `state`.
pub fn led_path(state: LedState) -> &'static str {
    match state {
        LedState::On => LED_ON,
        LedState::Off => LED_OFF,
    }
}

pub fn fetch_tx(client: &dyn HttpClient) -> Result<TxStats, DeviceError> {
    Ok(client.get(TX_DATA)?.parse()?)
}

pub fn fetch_nx(client: &dyn HttpClient) -> Result<NxStats, DeviceError> {
    Ok(client.get(NX_DATA)?.parse()?)
}

pub fn fetch_net_info(client: &dyn HttpClient) -> Result<NetInfo, DeviceError> {
    Ok(client.get(NET_INFO)?.parse()?)
}

pub fn fetch_thread_counts(client: &dyn HttpClient) -> Result<ThreadCounts, DeviceError> {
    Ok(client.get(TX_COUNT)?.parse()?)
}

pub fn fetch_packet_pool(client: &dyn HttpClient) -> Result<PacketPool, DeviceError> {
    let available = stats::parse_single("available", &client.get(NX_PACKET)?)?;
    let head_length = stats::parse_single("head_length", &client.get(NX_PACKET_LEN)?)?;
    Ok(PacketPool {
        available,
        head_length,
    })
}

/// Send the LED command for `state`. The response body is discarded.
pub fn send_led(client: &dyn HttpClient, state: LedState) -> Result<(), DeviceError> {
    client.post(led_path(state)).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::RecordingClient;
    use stats::ParseError;

    #[test]
    fn led_path_selects_endpoint() {
        assert_eq!(led_path(LedState::On), "/LedOn");
        assert_eq!(led_path(LedState::Off), "/LedOff");
    }

    #[test]
    fn fetch_tx_parses_body() {
        let client = RecordingClient::new();
        client.respond(TX_DATA, "5,2,10,1");
        let tx = fetch_tx(&client).unwrap();
        assert_eq!(tx.idle_returns, 10);
    }

    #[test]
    fn fetch_nx_surfaces_parse_error() {
        let client = RecordingClient::new();
        client.respond(NX_DATA, "1000,2000");
        let err = fetch_nx(&client).unwrap_err();
        assert!(matches!(
            err,
            DeviceError::Parse(ParseError::FieldCount {
                expected: 4,
                found: 2
            })
        ));
    }

    #[test]
    fn fetch_packet_pool_reads_both_endpoints() {
        let client = RecordingClient::new();
        client.respond(NX_PACKET, "18");
        client.respond(NX_PACKET_LEN, "0");
        let pool = fetch_packet_pool(&client).unwrap();
        assert_eq!(pool.available, 18);
        assert_eq!(pool.head_length, 0);
    }

    #[test]
    fn send_led_posts_once() {
        let client = RecordingClient::new();
        client.respond(LED_OFF, "");
        send_led(&client, LedState::Off).unwrap();
        assert_eq!(client.count("POST", LED_OFF), 1);
        assert_eq!(client.count("POST", LED_ON), 0);
    }
}

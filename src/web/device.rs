//! Simulated device state behind the fake web server.
//!
//! Counters only ever grow, roughly the way a lightly loaded board's
//! would: every request served bumps the scheduler counters, the TCP
//! byte counts (by the size of the exchange), and the connection counts.

use std::sync::Mutex;

use crate::device::stats::{LedState, NxStats, TxStats};
use crate::device::{
    LED_OFF, LED_ON, NET_INFO, NX_DATA, NX_PACKET, NX_PACKET_LEN, TX_COUNT, TX_DATA,
};

/// Names reported by `/GetTxCount`, in wire order.
const THREAD_NAMES: [&str; 3] = ["App Main Thread", "App Server Thread", "LED Thread"];

/// Packets in the simulated application pool.
const POOL_SIZE: u64 = 20;

#[derive(Debug)]
struct DeviceState {
    tx: TxStats,
    nx: NxStats,
    led: LedState,
    thread_runs: [u64; 3],
    port: u16,
}

/// Thread-safe simulated device.
#[derive(Debug)]
pub struct SimulatedDevice {
    state: Mutex<DeviceState>,
}

/// A response the simulator wants sent: status code and plain-text body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    fn ok(body: String) -> Self {
        Self { status: 200, body }
    }

    fn not_found() -> Self {
        Self {
            status: 404,
            body: "not found".to_string(),
        }
    }
}

impl SimulatedDevice {
    /// A freshly booted device that reports `port` as its HTTP port.
    pub fn new(port: u16) -> Self {
        Self {
            state: Mutex::new(DeviceState {
                tx: TxStats::default(),
                nx: NxStats::default(),
                led: LedState::Off,
                thread_runs: [1, 0, 0],
                port,
            }),
        }
    }

    pub fn led(&self) -> LedState {
        self.state.lock().map(|s| s.led).unwrap_or(LedState::Off)
    }

    /// Serve one request. The device dispatches on the resource only, so
    /// the method is not checked.
    pub fn handle(&self, path: &str, request_len: usize) -> Reply {
        let Ok(mut s) = self.state.lock() else {
            return Reply {
                status: 500,
                body: "device state unavailable".to_string(),
            };
        };

        let reply = match path {
            TX_DATA => Reply::ok(s.tx.to_string()),
            NX_DATA => Reply::ok(s.nx.to_string()),
            NET_INFO => Reply::ok(format!("127.0.0.1,{}", s.port)),
            TX_COUNT => Reply::ok(format!(
                "{},{} ,{},{},{},{}",
                THREAD_NAMES[0],
                s.thread_runs[0],
                THREAD_NAMES[1],
                s.thread_runs[1],
                THREAD_NAMES[2],
                s.thread_runs[2],
            )),
            NX_PACKET => Reply::ok(POOL_SIZE.saturating_sub(s.nx.connections % 3).to_string()),
            NX_PACKET_LEN => Reply::ok("0".to_string()),
            LED_ON => {
                s.led = LedState::On;
                Reply::ok(String::new())
            }
            LED_OFF => {
                s.led = LedState::Off;
                Reply::ok(String::new())
            }
            _ => return Reply::not_found(),
        };

        s.tick(request_len as u64, reply.body.len() as u64);
        reply
    }
}

impl DeviceState {
    /// Account for one served exchange.
    fn tick(&mut self, received: u64, sent: u64) {
        self.tx.resumptions += 5;
        self.tx.suspensions += 4;
        self.tx.idle_returns += 3;
        self.tx.non_idle_returns += 2;

        self.nx.bytes_received += received;
        self.nx.bytes_sent += sent;
        self.nx.connections += 1;
        self.nx.disconnections += 1;

        self.thread_runs[1] += 1;
        if self.led.is_on() {
            self.thread_runs[2] += 1;
        }
    }
}

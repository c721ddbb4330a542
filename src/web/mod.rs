//! Simulated device web server.
//!
//! Provides a lightweight HTTP server (sync, via `tiny_http`) answering the
//! same plain-text resources as the device firmware, so the dashboard can be
//! exercised without hardware.
//!
//! Launched via `nxdash simulate` (default: `http://127.0.0.1:8080`).

pub mod device;

use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use tiny_http::{Header, Request, Response, Server, StatusCode};

use device::SimulatedDevice;

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// A bound simulator: socket plus device state.
pub struct SimulatorServer {
    server: Arc<Server>,
    device: Arc<SimulatedDevice>,
    addr: SocketAddr,
}

impl SimulatorServer {
    /// Bind to `addr`. Port `0` picks a free port; see [`local_addr`](Self::local_addr).
    pub fn bind(addr: &str) -> Result<Self> {
        let server = Server::http(addr)
            .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;
        let addr = server
            .server_addr()
            .to_ip()
            .context("simulator must listen on an IP socket")?;
        Ok(Self {
            server: Arc::new(server),
            device: Arc::new(SimulatedDevice::new(addr.port())),
            addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn device(&self) -> Arc<SimulatedDevice> {
        Arc::clone(&self.device)
    }

    /// Serve requests on the current thread until the server is unblocked.
    ///
    /// Handles requests sequentially, like the single server thread on the
    /// device.
    pub fn run(&self) {
        for request in self.server.incoming_requests() {
            handle(&self.device, request);
        }
    }

    /// Serve from a background thread.
    pub fn spawn(self) -> RunningSimulator {
        let server = Arc::clone(&self.server);
        let device = Arc::clone(&self.device);
        let addr = self.addr;
        let worker = thread::spawn(move || self.run());
        RunningSimulator {
            server,
            device,
            addr,
            worker: Some(worker),
        }
    }
}

/// Handle to a simulator serving on a background thread.
pub struct RunningSimulator {
    server: Arc<Server>,
    device: Arc<SimulatedDevice>,
    addr: SocketAddr,
    worker: Option<JoinHandle<()>>,
}

impl RunningSimulator {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn device(&self) -> &SimulatedDevice {
        &self.device
    }

    pub fn shutdown(&mut self) {
        self.server.unblock();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for RunningSimulator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Bind `addr` and serve forever on the current thread.
pub fn serve(addr: &str) -> Result<()> {
    let server = SimulatorServer::bind(addr)?;
    println!("nxdash simulated device at {}", server.base_url());
    println!("Press Ctrl+C to stop.\n");
    server.run();
    Ok(())
}

// ---------------------------------------------------------------------------
// Request handling
// ---------------------------------------------------------------------------

fn handle(device: &SimulatedDevice, mut request: Request) {
    let method = request.method().clone();
    let url = request.url().to_string();
    // Strip query string for path matching
    let path = url.split('?').next().unwrap_or(&url);

    let mut body = Vec::new();
    let _ = request.as_reader().read_to_end(&mut body);
    let request_len = url.len() + body.len();

    let reply = device.handle(path, request_len);
    tracing::info!(%method, path, status = reply.status, "simulator request");

    let _ = request.respond(text_response(reply.status, reply.body));
}

fn text_response(status: u16, body: String) -> Response<Cursor<Vec<u8>>> {
    let response = Response::from_data(body.into_bytes()).with_status_code(StatusCode(status));
    match content_type_text() {
        Some(header) => response.with_header(header),
        None => response,
    }
}

/// Plain-text content type header.
fn content_type_text() -> Option<Header> {
    Header::from_bytes("Content-Type", "text/plain; charset=utf-8").ok()
}

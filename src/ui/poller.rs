//! Periodic status poller for the dashboard's statistics panel.
//!
//! Each round fetches the scheduler (TX) and network (NX) statistics on
//! two scoped threads and writes eight labelled values into the page.
//! Rounds start on a fixed 3 s cadence regardless of how long the device
//! takes to answer, so on a slow link several rounds may be in flight.
//! The two halves succeed or fail independently: a failed or malformed
//! response leaves its four elements untouched and is logged, while the
//! other half still renders.
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::device::http::{DeviceError, SharedClient};
use crate::device::stats::{NxStats, TxStats};
use crate::device::{self, NX_DATA, TX_DATA};
use crate::schedule::{Scheduler, TaskHandle};

use super::page::{Page, SharedPage};

/// Delay between poll rounds.
pub const POLL_INTERVAL: Duration = Duration::from_millis(3000);

/// Element ids written by the poller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusIds {
    pub tx_active: String,
    pub tx_suspended: String,
    pub idle_returns: String,
    pub non_idle_returns: String,
    pub nx_sent: String,
    pub nx_received: String,
    pub nx_connect: String,
    pub nx_disconnect: String,
}

impl Default for StatusIds {
    fn default() -> Self {
        Self {
            tx_active: "tx_active".to_string(),
            tx_suspended: "tx_suspended".to_string(),
            idle_returns: "idle_returns".to_string(),
            non_idle_returns: "non_idle_returns".to_string(),
            nx_sent: "nx_sent".to_string(),
            nx_received: "nx_received".to_string(),
            nx_connect: "nx_connect".to_string(),
            nx_disconnect: "nx_disconnect".to_string(),
        }
    }
}

impl StatusIds {
    /// All ids in display order: TX block, then NX block.
    pub fn all(&self) -> [&str; 8] {
        [
            self.tx_active.as_str(),
            self.tx_suspended.as_str(),
            self.idle_returns.as_str(),
            self.non_idle_returns.as_str(),
            self.nx_sent.as_str(),
            self.nx_received.as_str(),
            self.nx_connect.as_str(),
            self.nx_disconnect.as_str(),
        ]
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

// Label spacing and spelling match the device's stock dashboard markup.

pub fn render_tx(page: &mut dyn Page, ids: &StatusIds, tx: &TxStats) {
    page.set_text(&ids.tx_active, &format!("Resumptions : {}", tx.resumptions));
    page.set_text(&ids.tx_suspended, &format!("Suspentions : {}", tx.suspensions));
    page.set_text(&ids.idle_returns, &format!("Idle Returns : {}", tx.idle_returns));
    page.set_text(
        &ids.non_idle_returns,
        &format!("Non Idle returns : {}", tx.non_idle_returns),
    );
}

pub fn render_nx(page: &mut dyn Page, ids: &StatusIds, nx: &NxStats) {
    page.set_text(&ids.nx_sent, &format!("Total Bytes Sent  : {}", nx.bytes_sent));
    page.set_text(
        &ids.nx_received,
        &format!("Total Bytes Received  :  {}", nx.bytes_received),
    );
    page.set_text(&ids.nx_connect, &format!("Total connections  : {}", nx.connections));
    page.set_text(
        &ids.nx_disconnect,
        &format!("Total Disconnections  :  {}", nx.disconnections),
    );
}

// ---------------------------------------------------------------------------
// Poll report
// ---------------------------------------------------------------------------

/// Outcome of one poll round.
#[derive(Debug)]
pub struct PollReport {
    pub tx: Result<TxStats, DeviceError>,
    pub nx: Result<NxStats, DeviceError>,
}

impl PollReport {
    /// Both halves fetched and parsed.
    pub fn is_complete(&self) -> bool {
        self.tx.is_ok() && self.nx.is_ok()
    }

    /// Both values, when the round was complete.
    pub fn sample(&self) -> Option<(TxStats, NxStats)> {
        match (&self.tx, &self.nx) {
            (Ok(tx), Ok(nx)) => Some((*tx, *nx)),
            _ => None,
        }
    }
}

/// Callback invoked with every report, after the page has been updated.
pub type PollObserver = Arc<dyn Fn(&PollReport) + Send + Sync>;

// ---------------------------------------------------------------------------
// Poller
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct StatusPoller {
    client: SharedClient,
    ids: StatusIds,
    observer: Option<PollObserver>,
}

impl StatusPoller {
    pub fn new(client: SharedClient, ids: StatusIds) -> Self {
        Self {
            client,
            ids,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: PollObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn ids(&self) -> &StatusIds {
        &self.ids
    }

    /// Issue both status requests concurrently and wait for both.
    pub fn fetch(&self) -> PollReport {
        let client = self.client.as_ref();
        thread::scope(|s| {
            let tx = s.spawn(|| device::fetch_tx(client));
            let nx = s.spawn(|| device::fetch_nx(client));
            PollReport {
                tx: tx.join().unwrap_or_else(|_| Err(worker_panicked())),
                nx: nx.join().unwrap_or_else(|_| Err(worker_panicked())),
            }
        })
    }

    fn apply_tx(&self, page: &mut dyn Page, tx: &Result<TxStats, DeviceError>) {
        match tx {
            Ok(tx) => render_tx(page, &self.ids, tx),
            Err(e) => tracing::warn!(path = TX_DATA, error = %e, "status poll failed"),
        }
    }

    fn apply_nx(&self, page: &mut dyn Page, nx: &Result<NxStats, DeviceError>) {
        match nx {
            Ok(nx) => render_nx(page, &self.ids, nx),
            Err(e) => tracing::warn!(path = NX_DATA, error = %e, "status poll failed"),
        }
    }

    fn observe(&self, report: &PollReport) {
        if let Some(observer) = &self.observer {
            observer(report);
        }
    }

    /// Write whatever the report holds into the page.
    pub fn apply(&self, page: &mut dyn Page, report: &PollReport) {
        self.apply_tx(page, &report.tx);
        self.apply_nx(page, &report.nx);
        self.observe(report);
    }

    /// One full round: fetch both statistics and render them.
    pub fn load_data(&self, page: &mut dyn Page) -> PollReport {
        let report = self.fetch();
        self.apply(page, &report);
        report
    }

    /// One full round against a shared page.
    ///
    /// Each half renders as soon as its own response arrives, locking the
    /// page only for that render. The observer runs once both are in.
    pub fn load_shared(&self, page: &SharedPage) -> PollReport {
        let client = self.client.as_ref();
        let report = thread::scope(|s| {
            let tx = s.spawn(|| {
                let tx = device::fetch_tx(client);
                with_page(page, |p| self.apply_tx(p, &tx));
                tx
            });
            let nx = s.spawn(|| {
                let nx = device::fetch_nx(client);
                with_page(page, |p| self.apply_nx(p, &nx));
                nx
            });
            PollReport {
                tx: tx.join().unwrap_or_else(|_| Err(worker_panicked())),
                nx: nx.join().unwrap_or_else(|_| Err(worker_panicked())),
            }
        });
        self.observe(&report);
        report
    }

    /// Run [`load_shared`](Self::load_shared) now and then every
    /// [`POLL_INTERVAL`], whether or not earlier rounds have finished.
    pub fn start(self, scheduler: &dyn Scheduler, page: SharedPage) -> TaskHandle {
        scheduler.schedule_repeating(
            POLL_INTERVAL,
            Arc::new(move || {
                self.load_shared(&page);
            }),
        )
    }
}

fn with_page(page: &SharedPage, render: impl FnOnce(&mut dyn Page)) {
    match page.lock() {
        Ok(mut page) => render(&mut *page),
        Err(_) => tracing::error!("page lock poisoned; skipping render"),
    }
}

fn worker_panicked() -> DeviceError {
    DeviceError::Transport("request worker panicked".to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::device::http::RecordingClient;
    use crate::schedule::ManualScheduler;
    use crate::ui::page::PageModel;

    fn poller_with(tx: &str, nx: &str) -> (Arc<RecordingClient>, StatusPoller) {
        let client = Arc::new(RecordingClient::new());
        client.respond(TX_DATA, tx);
        client.respond(NX_DATA, nx);
        let poller = StatusPoller::new(client.clone(), StatusIds::default());
        (client, poller)
    }

    #[test]
    fn renders_tx_labels_exactly() {
        let (_, poller) = poller_with("5,2,10,1", "0,0,0,0");
        let mut page = PageModel::new();
        let report = poller.load_data(&mut page);

        assert!(report.is_complete());
        assert_eq!(page.text("tx_active"), Some("Resumptions : 5"));
        assert_eq!(page.text("tx_suspended"), Some("Suspentions : 2"));
        assert_eq!(page.text("idle_returns"), Some("Idle Returns : 10"));
        assert_eq!(page.text("non_idle_returns"), Some("Non Idle returns : 1"));
    }

    #[test]
    fn renders_nx_labels_exactly() {
        let (_, poller) = poller_with("0,0,0,0", "1000,2000,7,3");
        let mut page = PageModel::new();
        poller.load_data(&mut page);

        assert_eq!(page.text("nx_sent"), Some("Total Bytes Sent  : 1000"));
        assert_eq!(page.text("nx_received"), Some("Total Bytes Received  :  2000"));
        assert_eq!(page.text("nx_connect"), Some("Total connections  : 7"));
        assert_eq!(page.text("nx_disconnect"), Some("Total Disconnections  :  3"));
    }

    #[test]
    fn short_response_keeps_previous_text_and_other_half_renders() {
        let (client, poller) = poller_with("5,2,10,1", "1000,2000,7,3");
        let mut page = PageModel::new();
        poller.load_data(&mut page);

        client.respond(TX_DATA, "6,3");
        client.respond(NX_DATA, "1100,2100,8,3");
        let report = poller.load_data(&mut page);

        assert!(matches!(report.tx, Err(DeviceError::Parse(_))));
        assert!(report.nx.is_ok());
        assert!(report.sample().is_none());
        assert_eq!(page.text("tx_active"), Some("Resumptions : 5"));
        assert_eq!(page.text("nx_sent"), Some("Total Bytes Sent  : 1100"));
    }

    #[test]
    fn unreachable_device_renders_nothing() {
        let client = Arc::new(RecordingClient::new());
        let poller = StatusPoller::new(client.clone(), StatusIds::default());
        let mut page = PageModel::new();
        let report = poller.load_data(&mut page);

        assert!(report.tx.is_err());
        assert!(report.nx.is_err());
        for id in StatusIds::default().all() {
            assert_eq!(page.text(id), None);
        }
    }

    #[test]
    fn each_round_issues_one_request_per_endpoint() {
        let (client, poller) = poller_with("1,1,1,1", "1,1,1,1");
        let mut page = PageModel::new();
        poller.load_data(&mut page);
        assert_eq!(client.count("GET", TX_DATA), 1);
        assert_eq!(client.count("GET", NX_DATA), 1);
        assert_eq!(client.requests().len(), 2);
    }

    #[test]
    fn observer_sees_every_report() {
        let (_, poller) = poller_with("1,2,3,4", "5,6,7,8");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let poller = poller.with_observer(Arc::new(move |report: &PollReport| {
            sink.lock().unwrap().push(report.sample());
        }));

        let mut page = PageModel::new();
        poller.load_data(&mut page);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (tx, nx) = seen[0].unwrap();
        assert_eq!(tx.non_idle_returns, 4);
        assert_eq!(nx.disconnections, 8);
    }

    #[test]
    fn scheduled_poller_repeats_every_interval_until_stopped() {
        let (client, poller) = poller_with("5,2,10,1", "1000,2000,7,3");
        let scheduler = ManualScheduler::new();
        let page = PageModel::new().shared();

        let mut handle = poller.start(&scheduler, Arc::clone(&page));
        scheduler.advance(Duration::ZERO);
        assert_eq!(client.count("GET", TX_DATA), 1);
        assert_eq!(
            page.lock().unwrap().text("idle_returns"),
            Some("Idle Returns : 10")
        );

        scheduler.advance(POLL_INTERVAL * 3);
        assert_eq!(client.count("GET", TX_DATA), 4);
        assert_eq!(client.count("GET", NX_DATA), 4);

        handle.stop();
        scheduler.advance(POLL_INTERVAL * 10);
        assert_eq!(client.count("GET", TX_DATA), 4);
    }

    #[test]
    fn shared_round_renders_both_halves_and_observes_once() {
        let (_, poller) = poller_with("5,2,10,1", "1000,2000,7,3");
        let rounds = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&rounds);
        let poller = poller.with_observer(Arc::new(move |_: &PollReport| {
            *sink.lock().unwrap() += 1;
        }));
        let page = PageModel::new().shared();

        assert!(poller.load_shared(&page).is_complete());
        let page = page.lock().unwrap();
        assert_eq!(page.text("tx_active"), Some("Resumptions : 5"));
        assert_eq!(page.text("nx_connect"), Some("Total connections  : 7"));
        assert_eq!(*rounds.lock().unwrap(), 1);
    }

    #[test]
    fn poll_interval_is_three_seconds() {
        assert_eq!(POLL_INTERVAL, Duration::from_millis(3000));
    }
}

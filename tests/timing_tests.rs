//! Real-time tests against a device that answers slowly. These run on the
//! thread scheduler and take a few seconds each.
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use nxdash::device::http::{DeviceError, HttpClient};
use nxdash::device::stats::LedState;
use nxdash::device::{NX_DATA, TX_DATA};
use nxdash::schedule::ThreadScheduler;
use nxdash::ui::dashboard::{ClickOutcome, Dashboard, DashboardIds};
use nxdash::ui::poller::POLL_INTERVAL;

/// Answers every request after a per-endpoint delay.
#[derive(Default)]
struct SlowDevice {
    tx_delay: Duration,
    nx_delay: Duration,
    post_delay: Duration,
    started: Mutex<Vec<String>>,
}

impl SlowDevice {
    fn started(&self, path: &str) -> usize {
        self.started
            .lock()
            .unwrap()
            .iter()
            .filter(|p| *p == path)
            .count()
    }

    fn record(&self, path: &str) {
        self.started.lock().unwrap().push(path.to_string());
    }
}

impl HttpClient for SlowDevice {
    fn get(&self, path: &str) -> Result<String, DeviceError> {
        self.record(path);
        match path {
            TX_DATA => {
                thread::sleep(self.tx_delay);
                Ok("5,2,10,1".to_string())
            }
            NX_DATA => {
                thread::sleep(self.nx_delay);
                Ok("1000,2000,7,3".to_string())
            }
            _ => Err(DeviceError::Transport(format!("no route to {path}"))),
        }
    }

    fn post(&self, path: &str) -> Result<String, DeviceError> {
        self.record(path);
        thread::sleep(self.post_delay);
        Ok(String::new())
    }
}

#[test]
fn slow_device_does_not_stretch_poll_cadence() {
    let device = Arc::new(SlowDevice {
        tx_delay: Duration::from_secs(7),
        nx_delay: Duration::from_secs(7),
        ..SlowDevice::default()
    });
    let mut dash = Dashboard::new(device.clone(), DashboardIds::default());

    dash.start(&ThreadScheduler);
    thread::sleep(POLL_INTERVAL * 2 + Duration::from_millis(500));
    dash.stop();

    // Rounds at 0 s, 3 s and 6 s, none of which has been answered yet.
    assert_eq!(device.started(TX_DATA), 3);
    assert_eq!(device.started(NX_DATA), 3);
}

#[test]
fn each_half_renders_when_its_own_response_arrives() {
    let device = Arc::new(SlowDevice {
        nx_delay: Duration::from_secs(2),
        ..SlowDevice::default()
    });
    let dash = Arc::new(Dashboard::new(device, DashboardIds::default()));

    let round = {
        let dash = Arc::clone(&dash);
        thread::spawn(move || dash.load_data())
    };
    thread::sleep(Duration::from_millis(500));

    let view = dash.view();
    assert_eq!(view.stats[0].1, "Resumptions : 5");
    assert_eq!(view.stats[4].1, "");

    assert!(round.join().unwrap().is_complete());
    assert_eq!(dash.view().stats[4].1, "Total Bytes Sent  : 1000");
}

#[test]
fn led_click_does_not_hold_the_page() {
    let device = Arc::new(SlowDevice {
        post_delay: Duration::from_millis(1500),
        ..SlowDevice::default()
    });
    let dash = Arc::new(Dashboard::new(device, DashboardIds::default()));

    let click = {
        let dash = Arc::clone(&dash);
        thread::spawn(move || dash.click("greenLed"))
    };
    thread::sleep(Duration::from_millis(200));

    let before = Instant::now();
    let view = dash.view();
    assert!(before.elapsed() < Duration::from_millis(500));
    assert_eq!(view.led_label, "On");
    assert!(view.led_checked);

    assert_eq!(click.join().unwrap(), ClickOutcome::Led(LedState::On));
}

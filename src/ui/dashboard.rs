use serde::Serialize;

use crate::device::http::SharedClient;
use crate::device::stats::LedState;
use crate::schedule::{Scheduler, TaskHandle};

use super::led::{LedIds, LedToggle};
use super::page::{Page, PageModel, SharedPage};
use super::poller::{PollObserver, PollReport, StatusIds, StatusPoller};
use super::sidebar::{SidebarIds, SidebarToggler};

/// Every element id the dashboard touches, grouped per component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardIds {
    pub sidebar: SidebarIds,
    pub status: StatusIds,
    pub led: LedIds,
}

/// What a click ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The sidebar trigger was hit; carries whether it is now active.
    Sidebar(bool),
    /// The LED checkbox flipped; carries the state sent to the device.
    Led(LedState),
    Ignored,
}

/// Serializable snapshot of the page for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub sidebar_active: bool,
    /// `(element id, text)` pairs in display order.
    pub stats: Vec<(String, String)>,
    pub led_checked: bool,
    pub led_label: String,
}

/// The three dashboard components bound to one page.
pub struct Dashboard {
    page: SharedPage,
    ids: DashboardIds,
    sidebar: SidebarToggler,
    led: LedToggle,
    poller: StatusPoller,
    poll_task: Option<TaskHandle>,
}

impl Dashboard {
    pub fn new(client: SharedClient, ids: DashboardIds) -> Self {
        Self {
            page: PageModel::new().shared(),
            sidebar: SidebarToggler::new(ids.sidebar.clone()),
            led: LedToggle::new(client.clone(), ids.led.clone()),
            poller: StatusPoller::new(client, ids.status.clone()),
            ids,
            poll_task: None,
        }
    }

    /// Observe every poll round (used for the sample history).
    pub fn with_observer(mut self, observer: PollObserver) -> Self {
        self.poller = self.poller.clone().with_observer(observer);
        self
    }

    pub fn page(&self) -> SharedPage {
        self.page.clone()
    }

    pub fn led(&self) -> &LedToggle {
        &self.led
    }

    /// Begin polling on `scheduler`. A running poll task is replaced.
    pub fn start(&mut self, scheduler: &dyn Scheduler) {
        self.stop();
        let handle = self.poller.clone().start(scheduler, self.page.clone());
        self.poll_task = Some(handle);
    }

    pub fn stop(&mut self) {
        if let Some(mut handle) = self.poll_task.take() {
            handle.stop();
        }
    }

    pub fn is_polling(&self) -> bool {
        self.poll_task.as_ref().is_some_and(TaskHandle::is_running)
    }

    /// Run a single poll round outside the schedule.
    pub fn load_data(&self) -> PollReport {
        self.poller.load_shared(&self.page)
    }

    /// Dispatch a click on element `id` to whichever component owns it.
    ///
    /// Clicking the LED checkbox flips it before the toggle handler runs,
    /// as a browser would before firing the change event. The LED command
    /// goes out after the page is released, so renders never wait on it.
    pub fn click(&self, id: &str) -> ClickOutcome {
        let state = {
            let Ok(mut page) = self.page.lock() else {
                return ClickOutcome::Ignored;
            };

            if let Some(active) = self.sidebar.on_click(&mut *page, id) {
                return ClickOutcome::Sidebar(active);
            }
            if id != self.ids.led.checkbox {
                return ClickOutcome::Ignored;
            }
            let checked = !page.is_checked(id);
            page.set_checked(id, checked);
            self.led.mirror(&mut *page)
        };

        self.led.notify(state);
        ClickOutcome::Led(state)
    }

    /// Set the checkbox to `state` and run the toggle handler if it changed.
    pub fn set_led(&self, state: LedState) -> Option<LedState> {
        let checked = self.page.lock().ok()?.is_checked(&self.ids.led.checkbox);
        if checked == state.is_on() {
            return None;
        }
        match self.click(&self.ids.led.checkbox) {
            ClickOutcome::Led(sent) => Some(sent),
            _ => None,
        }
    }

    pub fn view(&self) -> DashboardView {
        let Ok(page) = self.page.lock() else {
            return DashboardView {
                sidebar_active: false,
                stats: Vec::new(),
                led_checked: false,
                led_label: String::new(),
            };
        };

        DashboardView {
            sidebar_active: page.has_class(&self.ids.sidebar.sidebar, &self.ids.sidebar.class),
            stats: self
                .ids
                .status
                .all()
                .iter()
                .map(|id| (id.to_string(), page.text(id).unwrap_or_default().to_string()))
                .collect(),
            led_checked: page.is_checked(&self.ids.led.checkbox),
            led_label: page
                .text(&self.ids.led.label)
                .unwrap_or_default()
                .to_string(),
        }
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        self.stop();
    }
}

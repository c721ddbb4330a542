use crate::device::http::{DeviceError, SharedClient};
use crate::device::stats::LedState;
use crate::device::{self, led_path};

use super::page::Page;

/// Element ids used by the LED toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedIds {
    pub checkbox: String,
    pub label: String,
}

impl Default for LedIds {
    fn default() -> Self {
        Self {
            checkbox: "greenLed".to_string(),
            label: "buttonLabel".to_string(),
        }
    }
}

/// Mirrors the LED checkbox into its label and pushes it to the device.
///
/// The checkbox is the only source of truth: the label is updated before
/// the request goes out and never waits for the device to confirm.
pub struct LedToggle {
    client: SharedClient,
    ids: LedIds,
}

impl LedToggle {
    pub fn new(client: SharedClient, ids: LedIds) -> Self {
        Self { client, ids }
    }

    pub fn ids(&self) -> &LedIds {
        &self.ids
    }

    /// React to a checkbox change. Fire-and-forget: a failed POST is logged
    /// and otherwise ignored.
    pub fn toggle_led(&self, page: &mut dyn Page) -> LedState {
        let state = self.mirror(page);
        self.notify(state);
        state
    }

    /// Copy the checkbox state into the label and return it.
    pub fn mirror(&self, page: &mut dyn Page) -> LedState {
        let state = LedState::from_checked(page.is_checked(&self.ids.checkbox));
        page.set_text(&self.ids.label, state.label());
        state
    }

    /// Push `state` to the device, logging instead of failing.
    pub fn notify(&self, state: LedState) {
        if let Err(e) = self.send(state) {
            tracing::warn!(path = led_path(state), error = %e, "LED command not delivered");
        }
    }

    /// Send the command for `state` and report whether the device took it.
    pub fn send(&self, state: LedState) -> Result<(), DeviceError> {
        tracing::debug!(%state, "sending LED command");
        device::send_led(self.client.as_ref(), state)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::device::http::RecordingClient;
    use crate::device::{LED_OFF, LED_ON};
    use crate::ui::page::PageModel;

    fn toggle() -> (Arc<RecordingClient>, LedToggle) {
        let client = Arc::new(RecordingClient::new());
        client.respond(LED_ON, "");
        client.respond(LED_OFF, "");
        let led = LedToggle::new(client.clone(), LedIds::default());
        (client, led)
    }

    #[test]
    fn checked_posts_led_on_once() {
        let (client, led) = toggle();
        let mut page = PageModel::new();
        page.set_checked("greenLed", true);

        assert_eq!(led.toggle_led(&mut page), LedState::On);
        assert_eq!(page.text("buttonLabel"), Some("On"));
        assert_eq!(client.count("POST", LED_ON), 1);
        assert_eq!(client.requests().len(), 1);
    }

    #[test]
    fn unchecked_posts_led_off_once() {
        let (client, led) = toggle();
        let mut page = PageModel::new();
        page.set_checked("greenLed", false);

        assert_eq!(led.toggle_led(&mut page), LedState::Off);
        assert_eq!(page.text("buttonLabel"), Some("Off"));
        assert_eq!(client.count("POST", LED_OFF), 1);
        assert_eq!(client.requests().len(), 1);
    }

    #[test]
    fn failed_post_keeps_optimistic_label() {
        let client = Arc::new(RecordingClient::new());
        let led = LedToggle::new(client.clone(), LedIds::default());
        let mut page = PageModel::new();
        page.set_checked("greenLed", true);

        led.toggle_led(&mut page);
        assert_eq!(page.text("buttonLabel"), Some("On"));
        assert_eq!(client.count("POST", LED_ON), 1);
    }

    #[test]
    fn mirror_updates_label_without_sending() {
        let (client, led) = toggle();
        let mut page = PageModel::new();
        page.set_checked("greenLed", true);

        assert_eq!(led.mirror(&mut page), LedState::On);
        assert_eq!(page.text("buttonLabel"), Some("On"));
        assert!(client.requests().is_empty());

        led.notify(LedState::On);
        assert_eq!(client.count("POST", LED_ON), 1);
    }

    #[test]
    fn send_reports_delivery_failure() {
        let client = Arc::new(RecordingClient::new());
        let led = LedToggle::new(client, LedIds::default());
        assert!(matches!(led.send(LedState::On), Err(DeviceError::Transport(_))));
    }
}

//! Headless rendition of the device dashboard page.
//!
//! The page itself is a [`page::PageModel`]; three independent components
//! act on it:
//!
//! - [`sidebar::SidebarToggler`] — flips the `active` class on click
//! - [`poller::StatusPoller`] — refreshes eight statistics every 3 s
//! - [`led::LedToggle`] — mirrors the LED checkbox and posts the command
//!
//! [`dashboard::Dashboard`] wires them together the way the stock page
//! does once its markup has loaded.

pub mod dashboard;
pub mod led;
pub mod page;
pub mod poller;
pub mod sidebar;

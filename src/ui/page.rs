//! Headless page model standing in for the dashboard's DOM.
//!
//! Components only see the [`Page`] trait: set text, flip a class, read a
//! checkbox. [`PageModel`] is the in-memory implementation the CLI renders
//! to the terminal and the tests inspect.
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use serde::Serialize;

/// Element operations the dashboard components rely on.
///
/// Unknown ids are created on first write and read as empty/unchecked.
pub trait Page {
    fn set_text(&mut self, id: &str, text: &str);
    fn text(&self, id: &str) -> Option<&str>;
    /// Toggle `class` on `id`, returning whether it is now present.
    fn toggle_class(&mut self, id: &str, class: &str) -> bool;
    fn has_class(&self, id: &str, class: &str) -> bool;
    fn is_checked(&self, id: &str) -> bool;
    fn set_checked(&mut self, id: &str, checked: bool);
}

/// State of a single element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Element {
    pub text: String,
    pub classes: BTreeSet<String>,
    pub checked: bool,
}

/// In-memory page keyed by element id.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PageModel {
    elements: BTreeMap<String, Element>,
}

/// Page shared between the terminal renderer and scheduled tasks.
pub type SharedPage = Arc<Mutex<PageModel>>;

impl PageModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> SharedPage {
        Arc::new(Mutex::new(self))
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.get(id)
    }

    fn element_mut(&mut self, id: &str) -> &mut Element {
        self.elements.entry(id.to_string()).or_default()
    }
}

impl Page for PageModel {
    fn set_text(&mut self, id: &str, text: &str) {
        self.element_mut(id).text = text.to_string();
    }

    fn text(&self, id: &str) -> Option<&str> {
        self.elements.get(id).map(|e| e.text.as_str())
    }

    fn toggle_class(&mut self, id: &str, class: &str) -> bool {
        let classes = &mut self.element_mut(id).classes;
        if classes.remove(class) {
            false
        } else {
            classes.insert(class.to_string());
            true
        }
    }

    fn has_class(&self, id: &str, class: &str) -> bool {
        self.elements
            .get(id)
            .is_some_and(|e| e.classes.contains(class))
    }

    fn is_checked(&self, id: &str) -> bool {
        self.elements.get(id).is_some_and(|e| e.checked)
    }

    fn set_checked(&mut self, id: &str, checked: bool) {
        self.element_mut(id).checked = checked;
    }
}

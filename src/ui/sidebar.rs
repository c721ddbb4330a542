use super::page::Page;

/// Element ids used by the sidebar toggler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarIds {
    pub trigger: String,
    pub sidebar: String,
    pub body: String,
    pub class: String,
}

impl Default for SidebarIds {
    fn default() -> Self {
        Self {
            trigger: "sidebarCollapse".to_string(),
            sidebar: "sidebar".to_string(),
            body: "body".to_string(),
            class: "active".to_string(),
        }
    }
}

/// Collapses and expands the sidebar when its trigger is clicked.
#[derive(Debug, Clone, Default)]
pub struct SidebarToggler {
    ids: SidebarIds,
}

impl SidebarToggler {
    pub fn new(ids: SidebarIds) -> Self {
        Self { ids }
    }

    pub fn ids(&self) -> &SidebarIds {
        &self.ids
    }

    /// Handle a click on `target`. Returns `Some(active)` if the click hit
    /// the trigger, `None` if it was meant for another element.
    pub fn on_click(&self, page: &mut dyn Page, target: &str) -> Option<bool> {
        if target != self.ids.trigger {
            return None;
        }
        let active = page.toggle_class(&self.ids.sidebar, &self.ids.class);
        page.toggle_class(&self.ids.body, &self.ids.class);
        Some(active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::page::PageModel;

    #[test]
    fn click_parity_decides_active_class() {
        let toggler = SidebarToggler::default();
        let mut page = PageModel::new();

        for click in 1..=4 {
            toggler.on_click(&mut page, "sidebarCollapse");
            let expect_active = click % 2 == 1;
            assert_eq!(page.has_class("sidebar", "active"), expect_active);
            assert_eq!(page.has_class("body", "active"), expect_active);
        }
    }

    #[test]
    fn clicks_elsewhere_are_ignored() {
        let toggler = SidebarToggler::default();
        let mut page = PageModel::new();
        assert_eq!(toggler.on_click(&mut page, "greenLed"), None);
        assert!(!page.has_class("sidebar", "active"));
    }

    #[test]
    fn injected_ids_are_honoured() {
        let toggler = SidebarToggler::new(SidebarIds {
            trigger: "menu".to_string(),
            sidebar: "nav".to_string(),
            body: "main".to_string(),
            class: "open".to_string(),
        });
        let mut page = PageModel::new();
        assert_eq!(toggler.on_click(&mut page, "menu"), Some(true));
        assert!(page.has_class("nav", "open"));
        assert!(page.has_class("main", "open"));
    }
}

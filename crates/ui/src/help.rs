/// Pages of the help modal, one per pointer control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HelpTab {
    #[default]
    Rotate,
    Zoom,
    Pan,
}

impl HelpTab {
    pub const ALL: [HelpTab; 3] = [HelpTab::Rotate, HelpTab::Zoom, HelpTab::Pan];

    pub fn title(self) -> &'static str {
        match self {
            Self::Rotate => "Rotate",
            Self::Zoom => "Zoom",
            Self::Pan => "Pan",
        }
    }

    pub fn instructions(self) -> &'static str {
        match self {
            Self::Rotate => "Left-click and drag to orbit the camera around the model.",
            Self::Zoom => "Scroll the mouse wheel to move the camera closer or further away.",
            Self::Pan => "Right-click and drag to slide the view sideways or up and down.",
        }
    }
}

/// Help modal with three mutually exclusive pages.
///
/// Exactly one selector is highlighted and exactly one instruction text is
/// visible while the modal is open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HelpModal {
    open: bool,
    selected: HelpTab,
}

impl HelpModal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn selected(&self) -> HelpTab {
        self.selected
    }

    pub fn select(&mut self, tab: HelpTab) {
        self.selected = tab;
    }

    pub fn is_highlighted(&self, tab: HelpTab) -> bool {
        self.selected == tab
    }

    pub fn is_text_visible(&self, tab: HelpTab) -> bool {
        self.open && self.selected == tab
    }
}

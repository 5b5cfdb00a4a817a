use crate::help::HelpTab;

/// A request produced by the overlay widgets.
///
/// Widgets never touch the camera or the scene; the viewer consumes actions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Restore the initial camera angles.
    ResetCamera,
    /// Seek the animation to the slider value.
    SeekFrame(f32),
    /// Show the help modal.
    OpenHelp,
    /// Pick one of the help pages.
    SelectHelp(HelpTab),
    /// Hide the help modal.
    CloseHelp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seek_carries_value() {
        let a = Action::SeekFrame(12.6);
        assert!(matches!(a, Action::SeekFrame(v) if v == 12.6));
    }

    #[test]
    fn select_help_carries_tab() {
        assert_eq!(Action::SelectHelp(HelpTab::Pan), Action::SelectHelp(HelpTab::Pan));
        assert_ne!(Action::SelectHelp(HelpTab::Pan), Action::SelectHelp(HelpTab::Zoom));
    }
}

use crate::action::Action;
use crate::help::HelpModal;
use egui::{Align2, Color32, CornerRadius, RichText, Stroke, vec2};

/// Button fill for the reset button and the selected help page.
pub const ACCENT: Color32 = Color32::from_rgb(0x25, 0x63, 0xeb);
/// Button fill for unselected help pages.
pub const MUTED: Color32 = Color32::from_rgb(0x37, 0x41, 0x51);

/// Frame slider bound to the animation.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSlider {
    pub min: f32,
    pub max: f32,
    pub value: f32,
}

impl Default for FrameSlider {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 100.0,
            value: 0.0,
        }
    }
}

impl FrameSlider {
    pub fn set_range(&mut self, min: f32, max: f32) {
        self.min = min;
        self.max = max.max(min);
        self.value = self.value.clamp(self.min, self.max);
    }
}

/// Everything the overlay shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayState {
    pub slider: FrameSlider,
    pub help: HelpModal,
}

impl OverlayState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the overlay's own share of an action. Camera and animation
    /// actions are left to the viewer.
    pub fn apply(&mut self, action: &Action) {
        match *action {
            Action::OpenHelp => self.help.open(),
            Action::CloseHelp => self.help.close(),
            Action::SelectHelp(tab) => self.help.select(tab),
            Action::SeekFrame(value) => {
                self.slider.value = value.clamp(self.slider.min, self.slider.max)
            }
            Action::ResetCamera => {}
        }
    }
}

fn filled_button(text: &str, fill: Color32) -> egui::Button<'_> {
    egui::Button::new(RichText::new(text).color(Color32::WHITE))
        .fill(fill)
        .stroke(Stroke::NONE)
        .corner_radius(CornerRadius::same(8))
}

/// Draw the overlay and collect the actions the user triggered this frame.
pub fn draw_overlay(ctx: &egui::Context, state: &OverlayState) -> Vec<Action> {
    let mut actions = Vec::new();

    egui::Area::new(egui::Id::new("reset_camera"))
        .anchor(Align2::CENTER_BOTTOM, vec2(0.0, -20.0))
        .show(ctx, |ui| {
            let button = filled_button("Reset Camera", ACCENT).min_size(vec2(160.0, 40.0));
            if ui.add(button).clicked() {
                actions.push(Action::ResetCamera);
            }
        });

    egui::Area::new(egui::Id::new("frame_slider"))
        .anchor(Align2::CENTER_BOTTOM, vec2(0.0, -72.0))
        .show(ctx, |ui| {
            let mut value = state.slider.value;
            let slider = egui::Slider::new(&mut value, state.slider.min..=state.slider.max)
                .text("Frame")
                .step_by(1.0);
            if ui.add(slider).changed() {
                actions.push(Action::SeekFrame(value));
            }
        });

    egui::Area::new(egui::Id::new("help_button"))
        .anchor(Align2::RIGHT_TOP, vec2(-12.0, 12.0))
        .show(ctx, |ui| {
            let button = filled_button("?", MUTED).min_size(vec2(32.0, 32.0));
            if ui.add(button).on_hover_text("Camera controls").clicked() {
                actions.push(Action::OpenHelp);
            }
        });

    if state.help.is_open() {
        egui::Window::new("Camera Controls")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    for tab in crate::HelpTab::ALL {
                        let fill = if state.help.is_highlighted(tab) {
                            ACCENT
                        } else {
                            MUTED
                        };
                        let button = filled_button(tab.title(), fill).min_size(vec2(80.0, 32.0));
                        if ui.add(button).clicked() {
                            actions.push(Action::SelectHelp(tab));
                        }
                    }
                });
                ui.add_space(8.0);
                for tab in crate::HelpTab::ALL {
                    if state.help.is_text_visible(tab) {
                        ui.label(tab.instructions());
                    }
                }
                ui.add_space(8.0);
                if ui.add(filled_button("Close", MUTED)).clicked() {
                    actions.push(Action::CloseHelp);
                }
            });
    }

    if !actions.is_empty() {
        tracing::debug!("overlay actions: {actions:?}");
    }
    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HelpTab;

    fn run_frame(state: &OverlayState) -> Vec<Action> {
        let ctx = egui::Context::default();
        let mut actions = Vec::new();
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            actions = draw_overlay(ctx, state);
        });
        actions
    }

    #[test]
    fn apply_toggles_help_modal() {
        let mut state = OverlayState::new();
        state.apply(&Action::OpenHelp);
        assert!(state.help.is_open());
        state.apply(&Action::SelectHelp(HelpTab::Zoom));
        assert!(state.help.is_text_visible(HelpTab::Zoom));
        assert!(!state.help.is_text_visible(HelpTab::Rotate));
        assert!(!state.help.is_text_visible(HelpTab::Pan));
        state.apply(&Action::CloseHelp);
        assert!(!state.help.is_open());
    }

    #[test]
    fn apply_seek_clamps_slider() {
        let mut state = OverlayState::new();
        state.slider.set_range(0.0, 40.0);
        state.apply(&Action::SeekFrame(55.0));
        assert_eq!(state.slider.value, 40.0);
    }

    #[test]
    fn reset_does_not_touch_overlay() {
        let mut state = OverlayState::new();
        let before = state.clone();
        state.apply(&Action::ResetCamera);
        assert_eq!(state, before);
    }

    #[test]
    fn slider_range_never_inverts() {
        let mut slider = FrameSlider::default();
        slider.value = 50.0;
        slider.set_range(10.0, 5.0);
        assert_eq!(slider.max, 10.0);
        assert_eq!(slider.value, 10.0);
    }

    #[test]
    fn idle_frame_produces_no_actions() {
        assert!(run_frame(&OverlayState::new()).is_empty());

        let mut state = OverlayState::new();
        state.apply(&Action::OpenHelp);
        assert!(run_frame(&state).is_empty());
    }
}

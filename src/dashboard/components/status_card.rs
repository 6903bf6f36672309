//! Status card showing the current readout

use egui::{Color32, RichText, Rounding, Vec2};

use crate::dashboard::theme::ThemeColors;
use crate::shared::ProbeState;

/// Overall status of the probe
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CardStatus {
    Idle,
    Busy,
    Notice,
    Error,
}

impl CardStatus {
    /// Derive the card status from the probe state
    pub fn from_state(state: &ProbeState) -> Self {
        if state.last_error.is_some() {
            CardStatus::Error
        } else if state.video_running || !state.text_enabled || !state.face_enabled {
            CardStatus::Busy
        } else if state.notice.is_some() {
            CardStatus::Notice
        } else {
            CardStatus::Idle
        }
    }

    pub fn color(&self) -> Color32 {
        match self {
            CardStatus::Idle => ThemeColors::STATUS_STOPPED,
            CardStatus::Busy => ThemeColors::STATUS_RUNNING,
            CardStatus::Notice => ThemeColors::ACCENT_WARNING,
            CardStatus::Error => ThemeColors::STATUS_ERROR,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CardStatus::Idle => "Idle",
            CardStatus::Busy => "Recognizing",
            CardStatus::Notice => "Notice",
            CardStatus::Error => "Error",
        }
    }
}

/// Card with the status label and an optional detail line
pub struct StatusCard {
    pub value: String,
    pub detail: Option<String>,
    pub status: CardStatus,
}

impl StatusCard {
    pub fn from_state(state: &ProbeState) -> Self {
        let detail = state.last_error.clone().or_else(|| state.notice.clone());
        Self {
            value: state.status_label.clone(),
            detail,
            status: CardStatus::from_state(state),
        }
    }

    pub fn show(&self, ui: &mut egui::Ui) {
        egui::Frame::none()
            .fill(ThemeColors::BG_MEDIUM)
            .rounding(Rounding::same(8.0))
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.set_min_width(220.0);

                ui.horizontal(|ui| {
                    let dot = ui.cursor().left_top() + Vec2::new(6.0, 12.0);
                    ui.painter().circle_filled(dot, 4.0, self.status.color());
                    ui.add_space(16.0);

                    ui.vertical(|ui| {
                        ui.label(
                            RichText::new(&self.value)
                                .size(18.0)
                                .color(ThemeColors::TEXT_PRIMARY)
                                .strong(),
                        );

                        let detail = self.detail.as_deref().unwrap_or(self.status.label());
                        ui.label(RichText::new(detail).size(11.0).color(self.status.color()));
                    });
                });
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_precedence() {
        let mut state = ProbeState::default();
        assert_eq!(CardStatus::from_state(&state), CardStatus::Idle);

        state.notice = Some("No face found".to_string());
        assert_eq!(CardStatus::from_state(&state), CardStatus::Notice);

        state.text_enabled = false;
        assert_eq!(CardStatus::from_state(&state), CardStatus::Busy);

        state.set_error("tesseract missing");
        let card = StatusCard::from_state(&state);
        assert_eq!(card.status, CardStatus::Error);
        assert_eq!(card.detail.as_deref(), Some("tesseract missing"));
    }
}

//! Dashboard application entry point

use eframe::egui;
use image::RgbaImage;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use crate::app::ProbeController;
use crate::dashboard::components::StatusCard;
use crate::dashboard::theme::{self, ThemeColors};
use crate::vision::ProfileId;

/// The probe window
pub struct DashboardApp {
    controller: ProbeController,
    /// Video polled by "Process video"
    video_path: PathBuf,
    theme_applied: bool,
    preview: Option<egui::TextureHandle>,
    recognition: Option<egui::TextureHandle>,
    /// Controller generation the textures were built from
    shown_generation: Option<u64>,
}

impl DashboardApp {
    pub fn new(controller: ProbeController, video_path: PathBuf) -> Self {
        Self {
            controller,
            video_path,
            theme_applied: false,
            preview: None,
            recognition: None,
            shown_generation: None,
        }
    }

    /// Create eframe options for the dashboard window
    pub fn options() -> eframe::NativeOptions {
        eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([900.0, 720.0])
                .with_min_inner_size([600.0, 480.0])
                .with_title("PingLens"),
            ..Default::default()
        }
    }

    /// Rebuild textures when the controller's images changed
    fn refresh_textures(&mut self, ctx: &egui::Context) {
        let generation = self.controller.generation();
        if self.shown_generation == Some(generation) {
            return;
        }
        self.shown_generation = Some(generation);

        let prepared = self.controller.prepared();
        self.preview = prepared.map(|p| to_texture(ctx, "preview", &p.preview));

        let recognition = self
            .controller
            .face_overlay()
            .or_else(|| prepared.map(|p| &p.recognition_input));
        self.recognition = recognition.map(|image| to_texture(ctx, "recognition_input", image));
    }

    fn render_controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let mut position = self.controller.profile().position();
            let response = egui::ComboBox::from_label("Profile").show_index(
                ui,
                &mut position,
                ProfileId::ALL.len(),
                |i| ProfileId::ALL[i].label(),
            );
            if response.changed() {
                if let Some(profile) = ProfileId::from_position(position) {
                    self.controller.select_profile(profile);
                    ui.ctx().request_repaint();
                }
            }

            let state = self.controller.state();
            let has_image = self.controller.prepared().is_some();
            let text_enabled = state.text_enabled && has_image;
            let face_enabled = state.face_enabled && has_image;
            let video_running = state.video_running;

            if ui
                .add_enabled(text_enabled, egui::Button::new("Run text recognition"))
                .clicked()
            {
                self.controller.run_text_recognition();
            }

            if ui
                .add_enabled(face_enabled, egui::Button::new("Run face detection"))
                .clicked()
            {
                self.controller.run_face_detection();
            }

            let video_label = if video_running { "Stop video" } else { "Process video" };
            if ui.button(video_label).clicked() {
                if video_running {
                    self.controller.stop_video();
                } else if let Err(e) = self.controller.start_video(self.video_path.clone()) {
                    warn!("Cannot start video: {:#}", e);
                }
            }
        });

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            StatusCard::from_state(self.controller.state()).show(ui);
            let state = self.controller.state();
            if state.video_running {
                ui.label(
                    egui::RichText::new(format!("Frame {}", state.frame_index))
                        .color(ThemeColors::TEXT_SECONDARY),
                );
            }
        });
    }

    fn render_images(&mut self, ui: &mut egui::Ui) {
        let pixels_per_point = ui.ctx().pixels_per_point();

        ui.columns(2, |columns| {
            columns[0].label(egui::RichText::new("Reference").color(ThemeColors::TEXT_MUTED));
            columns[1].label(egui::RichText::new("Recognition input").color(ThemeColors::TEXT_MUTED));

            // The first layout pass fixes the display target for the whole session
            if self.controller.display().is_none() {
                let available = columns[0].available_size() * pixels_per_point;
                let (width, height) = (available.x.max(0.0) as u32, available.y.max(0.0) as u32);
                match self.controller.measure_display(width, height) {
                    Ok(()) => {
                        info!("Image view measured at {}x{} px", width, height);
                        columns[0].ctx().request_repaint();
                    }
                    Err(e) => warn!("Image view not measurable yet: {}", e),
                }
            }

            show_texture(&mut columns[0], self.preview.as_ref(), pixels_per_point);
            show_texture(&mut columns[1], self.recognition.as_ref(), pixels_per_point);
        });
    }
}

fn to_texture(ctx: &egui::Context, name: &str, image: &RgbaImage) -> egui::TextureHandle {
    let size = [image.width() as usize, image.height() as usize];
    let color_image = egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw());
    ctx.load_texture(name, color_image, egui::TextureOptions::LINEAR)
}

/// Draw a texture at its pixel size, or a placeholder
fn show_texture(ui: &mut egui::Ui, texture: Option<&egui::TextureHandle>, pixels_per_point: f32) {
    match texture {
        Some(texture) => {
            ui.image((texture.id(), texture.size_vec2() / pixels_per_point));
        }
        None => {
            ui.label(egui::RichText::new("No image").size(11.0).color(ThemeColors::TEXT_MUTED));
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.theme_applied {
            theme::apply_theme(ctx);
            self.theme_applied = true;
        }

        self.controller.process_events();
        self.refresh_textures(ctx);

        // Keep polling the event channel while work is outstanding
        if !self.controller.is_idle() {
            ctx.request_repaint_after(Duration::from_millis(16));
        }

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            egui::Frame::none().inner_margin(12.0).show(ui, |ui| {
                self.render_controls(ui);
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_images(ui);
        });
    }
}

/// Run the dashboard application
pub fn run_dashboard(controller: ProbeController, video_path: PathBuf) -> Result<(), eframe::Error> {
    let app = DashboardApp::new(controller, video_path);
    eframe::run_native(
        "PingLens",
        DashboardApp::options(),
        Box::new(|_cc| Ok(Box::new(app))),
    )
}

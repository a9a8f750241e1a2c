//! The on-screen overlay: pick readout and the point-size slider.

use crate::config::POINT_SIZE_RANGE;
use egui::{Align2, Color32, Frame, Margin, RichText, Rounding};

/// What the overlay reports about the last picked point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickInfo {
    /// Vertex index in the loaded cloud.
    pub index: usize,
    /// World height of the hit in meters, offset applied.
    pub height: f32,
    /// Longitude/latitude in degrees; `None` when the transform failed.
    pub lon_lat: Option<[f64; 2]>,
}

impl PickInfo {
    pub fn height_line(info: Option<&Self>) -> String {
        match info {
            Some(i) => format!("Height: {:.2} meters", i.height),
            None => "Height: N/A".to_string(),
        }
    }

    pub fn coordinates_line(info: Option<&Self>) -> String {
        match info {
            Some(PickInfo {
                lon_lat: Some([lon, lat]),
                ..
            }) => format!("Coordinates: {lon:.6}, {lat:.6}"),
            Some(_) => "Coordinates: N/A, N/A".to_string(),
            None => "Coordinates: N/A, N/A, N/A".to_string(),
        }
    }
}

/// Draws the info panel in the top-left corner and the point-size slider
/// below it. Returns true when the slider changed `point_size`.
pub fn draw_overlay(ctx: &egui::Context, info: Option<&PickInfo>, point_size: &mut f32) -> bool {
    let mut changed = false;

    egui::Area::new(egui::Id::new("pick_info"))
        .anchor(Align2::LEFT_TOP, [10.0, 10.0])
        .show(ctx, |ui| {
            Frame::none()
                .fill(Color32::from_rgba_unmultiplied(0, 0, 0, 178))
                .rounding(Rounding::same(4.0))
                .inner_margin(Margin::same(8.0))
                .show(ui, |ui| {
                    ui.label(RichText::new(PickInfo::height_line(info)).color(Color32::WHITE));
                    ui.label(RichText::new(PickInfo::coordinates_line(info)).color(Color32::WHITE));
                    ui.add_space(6.0);
                    ui.horizontal(|ui| {
                        ui.label(RichText::new("Point size").color(Color32::WHITE));
                        changed = ui
                            .add(egui::Slider::new(point_size, POINT_SIZE_RANGE).step_by(0.01))
                            .changed();
                    });
                });
        });

    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_before_any_pick() {
        assert_eq!(PickInfo::height_line(None), "Height: N/A");
        assert_eq!(PickInfo::coordinates_line(None), "Coordinates: N/A, N/A, N/A");
    }

    #[test]
    fn picked_point_is_formatted() {
        let info = PickInfo {
            index: 3,
            height: 12.346,
            lon_lat: Some([5.387203581, 52.155172303]),
        };
        assert_eq!(PickInfo::height_line(Some(&info)), "Height: 12.35 meters");
        assert_eq!(
            PickInfo::coordinates_line(Some(&info)),
            "Coordinates: 5.387204, 52.155172"
        );
    }

    #[test]
    fn failed_transform_still_shows_height() {
        let info = PickInfo {
            index: 0,
            height: -1.0,
            lon_lat: None,
        };
        assert_eq!(PickInfo::height_line(Some(&info)), "Height: -1.00 meters");
        assert_eq!(PickInfo::coordinates_line(Some(&info)), "Coordinates: N/A, N/A");
    }

    #[test]
    fn overlay_renders_headless() {
        let ctx = egui::Context::default();
        let mut size = 0.2;
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            assert!(!draw_overlay(ctx, None, &mut size));
        });
        assert_eq!(size, 0.2);
    }
}

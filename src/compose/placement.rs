//! Scale-to-fit placement math

use tracing::debug;

use super::types::{ComposeError, Placement, Result};
use super::MIN_CONTENT_PX;
use crate::buffer::CHANNELS;
use crate::settings::{CompositionSettings, MarginSpec};

/// Margin in pixels before clamping.
///
/// Percentages are taken of the shorter canvas edge and rounded half away
/// from zero.
pub fn resolve_margin(margin: MarginSpec, final_width: u32, final_height: u32) -> u32 {
    match margin {
        MarginSpec::Pixels(px) => px,
        MarginSpec::Percent(pct) => {
            let edge = final_width.min(final_height) as f64;
            (edge * pct / 100.0).round().max(0.0) as u32
        }
    }
}

/// Compute where `content_width x content_height` lands on the canvas
pub fn compute_placement(
    content_width: u32,
    content_height: u32,
    settings: &CompositionSettings,
) -> Result<Placement> {
    if content_width == 0 || content_height == 0 {
        return Err(ComposeError::InvalidContent {
            width: content_width,
            height: content_height,
        });
    }

    let final_width = settings.final_width();
    let final_height = settings.final_height();
    if final_width == 0 || final_height == 0 {
        return Err(ComposeError::InvalidCanvas {
            width: final_width,
            height: final_height,
        });
    }
    let canvas_bytes = (final_width as usize)
        .checked_mul(final_height as usize)
        .and_then(|pixels| pixels.checked_mul(CHANNELS));
    if !matches!(canvas_bytes, Some(bytes) if bytes <= isize::MAX as usize) {
        return Err(ComposeError::CanvasTooLarge {
            width: final_width,
            height: final_height,
        });
    }

    let requested = resolve_margin(settings.margin(), final_width, final_height);
    let inner = |margin: u32| {
        (
            final_width as i64 - 2 * margin as i64,
            final_height as i64 - 2 * margin as i64,
        )
    };

    let (mut margin, mut margin_clamped) = (requested, false);
    let (mut target_w, mut target_h) = inner(margin);
    if target_w <= 0 || target_h <= 0 {
        let final_size = final_width.min(final_height);
        margin = final_size.saturating_sub(MIN_CONTENT_PX) / 2;
        margin_clamped = true;
        (target_w, target_h) = inner(margin);
        debug!(
            "Margin {} leaves no room on {}x{}, clamped to {}",
            requested, final_width, final_height, margin
        );
    }
    let target_width = target_w.max(1) as u32;
    let target_height = target_h.max(1) as u32;

    let scale = (target_width as f64 / content_width as f64)
        .min(target_height as f64 / content_height as f64);
    let draw_width = content_width as f64 * scale;
    let draw_height = content_height as f64 * scale;
    let draw_x = margin as f64 + (target_width as f64 - draw_width) / 2.0;
    let draw_y = margin as f64 + (target_height as f64 - draw_height) / 2.0;

    debug!(
        "Drawing content at x={:.2}, y={:.2}, w={:.2}, h={:.2} (scale {:.4})",
        draw_x, draw_y, draw_width, draw_height, scale
    );

    Ok(Placement {
        margin,
        margin_clamped,
        target_width,
        target_height,
        scale,
        draw_x,
        draw_y,
        draw_width,
        draw_height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_resolve_margin() {
        assert_eq!(resolve_margin(MarginSpec::Pixels(180), 1000, 1000), 180);
        assert_eq!(resolve_margin(MarginSpec::Percent(18.0), 1000, 1000), 180);
        assert_eq!(resolve_margin(MarginSpec::Percent(49.0), 20, 20), 10);
        assert_eq!(resolve_margin(MarginSpec::Percent(10.0), 800, 400), 40);
    }

    // TC-CMP-001: 50x50 content on 1000x1000 with 180px margin
    #[test]
    fn test_absolute_margin_scenario() {
        let settings = CompositionSettings::sized(1000, 1000, 180);
        let p = compute_placement(50, 50, &settings).unwrap();

        assert_eq!(p.margin, 180);
        assert!(!p.margin_clamped);
        assert_eq!(p.target_width, 640);
        assert_eq!(p.target_height, 640);
        assert!((p.scale - 12.8).abs() < EPS);
        assert!((p.draw_width - 640.0).abs() < EPS);
        assert!((p.draw_height - 640.0).abs() < EPS);
        assert!((p.draw_x - 180.0).abs() < EPS);
        assert!((p.draw_y - 180.0).abs() < EPS);
    }

    // TC-CMP-002: percentage margin that still leaves room
    #[test]
    fn test_percentage_no_clamp() {
        let settings = CompositionSettings::square(200, 49.0);
        let p = compute_placement(10, 10, &settings).unwrap();
        assert_eq!(p.margin, 98);
        assert_eq!(p.target_width, 4);
        assert_eq!(p.target_height, 4);
        assert!(!p.margin_clamped);
    }

    // TC-CMP-003: margin clamp
    #[test]
    fn test_percentage_clamp() {
        let settings = CompositionSettings::square(20, 49.0);
        let p = compute_placement(10, 10, &settings).unwrap();
        assert!(p.margin_clamped);
        assert_eq!(p.margin, 5);
        assert_eq!(p.target_width, 10);
        assert_eq!(p.target_height, 10);
        // Offsets use the clamped margin
        assert!((p.draw_x - 5.0).abs() < EPS);
        assert!((p.draw_y - 5.0).abs() < EPS);
    }

    #[test]
    fn test_absolute_margin_clamp_rectangular() {
        let settings = CompositionSettings::sized(300, 100, 60);
        let p = compute_placement(10, 10, &settings).unwrap();
        assert!(p.margin_clamped);
        assert_eq!(p.margin, 45);
        assert_eq!(p.target_width, 210);
        assert_eq!(p.target_height, 10);
    }

    #[test]
    fn test_tiny_canvas_clamps_to_zero_margin() {
        let settings = CompositionSettings::sized(6, 6, 4);
        let p = compute_placement(3, 3, &settings).unwrap();
        assert_eq!(p.margin, 0);
        assert_eq!(p.target_width, 6);
    }

    // TC-CMP-004: aspect ratio preserved
    #[test]
    fn test_aspect_ratio_preserved() {
        let cases = [(50, 50), (300, 20), (7, 900), (1, 1), (1234, 567)];
        let layouts = [
            CompositionSettings::sized(1000, 1000, 180),
            CompositionSettings::sized(1920, 1080, 40),
            CompositionSettings::square(512, 0.0),
            CompositionSettings::square(20, 49.0),
        ];
        for settings in &layouts {
            for &(w, h) in &cases {
                let p = compute_placement(w, h, settings).unwrap();
                let expected = w as f64 / h as f64;
                assert!((p.draw_width / p.draw_height - expected).abs() < 1e-9 * expected.max(1.0));
                assert!(p.draw_width <= p.target_width as f64 + EPS);
                assert!(p.draw_height <= p.target_height as f64 + EPS);
            }
        }
    }

    // TC-CMP-005: content centered with symmetric leftover space
    #[test]
    fn test_centered() {
        let settings = CompositionSettings::sized(1200, 800, 50);
        for &(w, h) in &[(300, 20), (20, 300), (99, 101)] {
            let p = compute_placement(w, h, &settings).unwrap();
            let m = p.margin as f64;
            let left = p.draw_x - m;
            let right = p.target_width as f64 - p.draw_width - left;
            assert!((left - right).abs() < 1e-9);
            let top = p.draw_y - m;
            let bottom = p.target_height as f64 - p.draw_height - top;
            assert!((top - bottom).abs() < 1e-9);
        }
    }

    // TC-CMP-006: upscale and downscale both allowed
    #[test]
    fn test_scale_direction() {
        let settings = CompositionSettings::sized(1000, 1000, 0);
        assert!(compute_placement(10, 10, &settings).unwrap().scale > 1.0);
        assert!(compute_placement(4000, 2000, &settings).unwrap().scale < 1.0);
    }

    // TC-CMP-007: composing composed output gives the same rectangle
    #[test]
    fn test_idempotent_for_square_content() {
        let settings = CompositionSettings::square(1000, 18.0);
        let first = compute_placement(50, 50, &settings).unwrap();
        let second = compute_placement(1000, 1000, &settings).unwrap();
        assert!((first.draw_x - second.draw_x).abs() < EPS);
        assert!((first.draw_width - second.draw_width).abs() < EPS);

        let again = compute_placement(50, 50, &settings).unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn test_zero_content_rejected() {
        let settings = CompositionSettings::default();
        assert_eq!(
            compute_placement(0, 10, &settings),
            Err(ComposeError::InvalidContent {
                width: 0,
                height: 10
            })
        );
    }

    #[test]
    fn test_zero_canvas_rejected() {
        let settings = CompositionSettings::sized(0, 100, 0);
        assert!(matches!(
            compute_placement(10, 10, &settings),
            Err(ComposeError::InvalidCanvas { .. })
        ));
    }

    #[test]
    fn test_oversized_canvas_is_an_error() {
        let settings = CompositionSettings::sized(u32::MAX, u32::MAX, 0);
        assert_eq!(
            compute_placement(2, 2, &settings),
            Err(ComposeError::CanvasTooLarge {
                width: u32::MAX,
                height: u32::MAX
            })
        );
    }
}

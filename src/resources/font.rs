//! Font loading and 3D text geometry.
//!
//! Glyphs are rasterised with `fontdue` and the filled spans of each coverage
//! row are extruded into boxes, yielding solid text geometry with real depth.
//! The extrusion works from coverage rather than outlines, the same way the
//! engine's other raster assets are handled.

use std::ops::Range;

use fontdue::{Font, FontSettings};

use crate::scene::{Geometry, Topology};

/// Pixel height glyphs are rasterised at before scaling into world units.
const RASTER_PX: f32 = 32.0;
/// Coverage at or above this counts as inside the glyph.
const COVERAGE_THRESHOLD: u8 = 128;

pub async fn load_font(file_name: &str) -> anyhow::Result<Font> {
    let bytes = super::load_binary(file_name).await?;
    Font::from_bytes(bytes, FontSettings::default())
        .map_err(|e| anyhow::anyhow!("failed to parse font {}: {}", file_name, e))
}

/// Builds extruded geometry for `text`.
///
/// `size` is the world-space glyph height, `depth` the extrusion along +z.
/// The baseline runs along y = 0 starting at the origin.
pub fn text_geometry(font: &Font, text: &str, size: f32, depth: f32) -> Geometry {
    let scale = size / RASTER_PX;
    let mut geometry = Geometry::empty(Topology::TriangleList);
    let mut pen_x = 0.0f32;

    for ch in text.chars() {
        let (metrics, coverage) = font.rasterize(ch, RASTER_PX);
        if metrics.width > 0 {
            for (row, line) in coverage.chunks(metrics.width).enumerate() {
                // Bitmap rows run top to bottom; flip into y-up world space.
                let y0 = (metrics.ymin + (metrics.height - 1 - row) as i32) as f32 * scale;
                for span in coverage_spans(line) {
                    let x0 = pen_x + (metrics.xmin + span.start as i32) as f32 * scale;
                    let x1 = pen_x + (metrics.xmin + span.end as i32) as f32 * scale;
                    let cell = Geometry::cuboid(x1 - x0, scale, depth).translated((
                        (x0 + x1) / 2.0,
                        y0 + scale / 2.0,
                        depth / 2.0,
                    ));
                    geometry.merge(cell);
                }
            }
        }
        pen_x += metrics.advance_width * scale;
    }

    geometry
}

/// Maximal `start..end` runs of filled pixels in one coverage row.
fn coverage_spans(row: &[u8]) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut start = None;
    for (x, &value) in row.iter().enumerate() {
        match (start, value >= COVERAGE_THRESHOLD) {
            (None, true) => start = Some(x),
            (Some(s), false) => {
                spans.push(s..x);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push(s..row.len());
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_row_has_no_spans() {
        assert!(coverage_spans(&[0, 10, 127, 0]).is_empty());
    }

    #[test]
    fn runs_are_maximal_and_half_open() {
        assert_eq!(coverage_spans(&[0, 255, 255, 0, 200, 0]), vec![1..3, 4..5]);
    }

    #[test]
    fn run_reaching_the_row_end_is_closed() {
        assert_eq!(coverage_spans(&[255, 0, 128, 255]), vec![0..1, 2..4]);
    }
}

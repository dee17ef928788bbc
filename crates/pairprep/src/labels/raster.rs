// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Polygon rasterization into binary masks.
//!
//! ## Fill Rule
//!
//! The polygon is treated as one closed ring. Rows are filled with an
//! even-odd scan-line pass sampled at integer pixel rows, then every edge is
//! drawn with Bresenham lines so boundary pixels are always set. With integer
//! corners `(x0, y0)..(x1, y1)` an axis-aligned rectangle therefore covers
//! exactly `(x1 - x0 + 1) * (y1 - y0 + 1)` pixels. Coordinates outside the
//! buffer are clipped.

use crate::Error;
use image::{GrayImage, ImageFormat};
use std::path::Path;

/// Value written inside a region.
pub const MASK_FOREGROUND: u8 = 255;

/// Single-channel 8-bit mask in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Mask {
    /// Zero-filled mask.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    fn set(&mut self, x: i64, y: i64) {
        if x >= 0 && y >= 0 && x < self.width as i64 && y < self.height as i64 {
            let idx = y as usize * self.width as usize + x as usize;
            self.data[idx] = MASK_FOREGROUND;
        }
    }

    fn fill_span(&mut self, y: i64, x_start: i64, x_end: i64) {
        if y < 0 || y >= self.height as i64 {
            return;
        }
        let x_start = x_start.max(0);
        let x_end = x_end.min(self.width as i64 - 1);
        if x_start > x_end {
            return;
        }
        let row = y as usize * self.width as usize;
        self.data[row + x_start as usize..=row + x_end as usize].fill(MASK_FOREGROUND);
    }

    /// Number of foreground pixels.
    pub fn filled_count(&self) -> usize {
        self.data.iter().filter(|&&v| v == MASK_FOREGROUND).count()
    }

    /// Inclusive `(min_x, min_y, max_x, max_y)` of the foreground, if any.
    pub fn bounding_box(&self) -> Option<(u32, u32, u32, u32)> {
        let w = self.width as usize;
        let mut bbox: Option<(u32, u32, u32, u32)> = None;
        for (idx, _) in self
            .data
            .iter()
            .enumerate()
            .filter(|(_, v)| **v == MASK_FOREGROUND)
        {
            let (x, y) = ((idx % w) as u32, (idx / w) as u32);
            bbox = Some(match bbox {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }
        bbox
    }

    /// Encode the mask as a grayscale PNG, replacing any existing file.
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let image = GrayImage::from_raw(self.width, self.height, self.data.clone()).ok_or_else(
            || {
                Error::InvalidParameters(format!(
                    "mask buffer does not match {}x{}",
                    self.width, self.height
                ))
            },
        )?;
        image.save_with_format(path.as_ref(), ImageFormat::Png)?;
        Ok(())
    }

    fn fill_interior(&mut self, polygon: &[(i32, i32)]) {
        let Some(y_min) = polygon.iter().map(|p| p.1).min() else {
            return;
        };
        let y_max = polygon.iter().map(|p| p.1).max().unwrap_or(y_min);
        let y_min = (y_min as i64).max(0);
        let y_max = (y_max as i64).min(self.height as i64 - 1);

        let n = polygon.len();
        let mut crossings: Vec<f64> = Vec::with_capacity(n);
        for y in y_min..=y_max {
            crossings.clear();
            for i in 0..n {
                let (x0, y0) = (polygon[i].0 as f64, polygon[i].1 as i64);
                let (x1, y1) = (polygon[(i + 1) % n].0 as f64, polygon[(i + 1) % n].1 as i64);
                if y0 == y1 {
                    continue;
                }
                // Half-open in y so a shared vertex is counted once.
                let (lo, hi) = if y0 < y1 { (y0, y1) } else { (y1, y0) };
                if y < lo || y >= hi {
                    continue;
                }
                let t = (y - y0) as f64 / (y1 - y0) as f64;
                crossings.push(x0 + t * (x1 - x0));
            }
            crossings.sort_by(|a, b| a.total_cmp(b));
            for span in crossings.chunks_exact(2) {
                self.fill_span(y, span[0].ceil() as i64, span[1].floor() as i64);
            }
        }
    }

    /// Liang-Barsky clip of a segment to the buffer plus a one pixel margin.
    ///
    /// Returns rounded endpoints, or `None` when the segment misses the
    /// buffer entirely.
    fn clip_segment(
        &self,
        from: (i32, i32),
        to: (i32, i32),
    ) -> Option<((i64, i64), (i64, i64))> {
        let (x0, y0) = (from.0 as f64, from.1 as f64);
        let (dx, dy) = (to.0 as f64 - x0, to.1 as f64 - y0);
        let (x_min, y_min) = (-1.0, -1.0);
        let (x_max, y_max) = (self.width as f64, self.height as f64);

        let mut t0 = 0.0_f64;
        let mut t1 = 1.0_f64;
        for (p, q) in [
            (-dx, x0 - x_min),
            (dx, x_max - x0),
            (-dy, y0 - y_min),
            (dy, y_max - y0),
        ] {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                t0 = t0.max(r);
            } else {
                t1 = t1.min(r);
            }
            if t0 > t1 {
                return None;
            }
        }

        let point = |t: f64| ((x0 + t * dx).round() as i64, (y0 + t * dy).round() as i64);
        Some((point(t0), point(t1)))
    }

    fn draw_line(&mut self, from: (i32, i32), to: (i32, i32)) {
        let Some(((mut x, mut y), (x1, y1))) = self.clip_segment(from, to) else {
            return;
        };
        let dx = (x1 - x).abs();
        let dy = -(y1 - y).abs();
        let sx = if x < x1 { 1 } else { -1 };
        let sy = if y < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.set(x, y);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }
}

/// Rasterize one polygon into a new `width` x `height` mask.
///
/// The interior and boundary are set to [`MASK_FOREGROUND`]. Fewer than
/// three points degrade to a line or a single pixel; an empty polygon
/// produces an empty mask.
///
/// # Example
/// ```
/// use pairprep::labels::rasterize_polygon;
///
/// let mask = rasterize_polygon(&[(2, 2), (5, 2), (5, 4), (2, 4)], 8, 8);
/// assert_eq!(mask.filled_count(), 4 * 3);
/// assert_eq!(mask.bounding_box(), Some((2, 2, 5, 4)));
/// ```
pub fn rasterize_polygon(polygon: &[(i32, i32)], width: u32, height: u32) -> Mask {
    let mut mask = Mask::new(width, height);
    if polygon.is_empty() || width == 0 || height == 0 {
        return mask;
    }

    mask.fill_interior(polygon);
    for i in 0..polygon.len() {
        mask.draw_line(polygon[i], polygon[(i + 1) % polygon.len()]);
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    #[test]
    fn test_rectangle_area_and_bbox() {
        let mask = rasterize_polygon(&[(10, 5), (20, 5), (20, 15), (10, 15)], 64, 48);
        assert_eq!(mask.filled_count(), 11 * 11);
        assert_eq!(mask.bounding_box(), Some((10, 5, 20, 15)));
        assert_eq!(mask.get(15, 10), MASK_FOREGROUND);
        assert_eq!(mask.get(9, 10), 0);
        assert_eq!(mask.get(21, 10), 0);
    }

    #[test]
    fn test_rectangle_winding_does_not_matter() {
        let cw = rasterize_polygon(&[(3, 3), (12, 3), (12, 9), (3, 9)], 16, 16);
        let ccw = rasterize_polygon(&[(3, 3), (3, 9), (12, 9), (12, 3)], 16, 16);
        assert_eq!(cw, ccw);
    }

    #[test]
    fn test_triangle_contains_centroid() {
        let mask = rasterize_polygon(&[(10, 10), (50, 10), (30, 40)], 64, 64);
        assert_eq!(mask.get(30, 20), MASK_FOREGROUND);
        assert_eq!(mask.get(5, 5), 0);
        assert_eq!(mask.get(12, 38), 0);
        assert_eq!(mask.bounding_box(), Some((10, 10, 50, 40)));
        // Shoelace area is 600; boundary pixels add to it.
        let filled = mask.filled_count();
        assert!((600..=600 + 2 * (40 + 37 + 37)).contains(&filled), "{}", filled);
    }

    #[test]
    fn test_concave_polygon_leaves_notch_empty() {
        // U shape: notch between x=4..6 from y=0..5.
        let polygon = [(0, 0), (3, 0), (3, 5), (7, 5), (7, 0), (10, 0), (10, 9), (0, 9)];
        let mask = rasterize_polygon(&polygon, 12, 12);
        assert_eq!(mask.get(5, 2), 0);
        assert_eq!(mask.get(1, 2), MASK_FOREGROUND);
        assert_eq!(mask.get(8, 2), MASK_FOREGROUND);
        assert_eq!(mask.get(5, 7), MASK_FOREGROUND);
    }

    #[test]
    fn test_out_of_bounds_is_clipped() {
        let mask = rasterize_polygon(&[(-10, -10), (5, -10), (5, 5), (-10, 5)], 8, 8);
        assert_eq!(mask.filled_count(), 6 * 6);
        assert_eq!(mask.bounding_box(), Some((0, 0, 5, 5)));
    }

    #[test]
    fn test_far_out_of_bounds_edges_are_clipped() {
        let start = Instant::now();
        let mask = rasterize_polygon(
            &[(-2_000_000_000, 0), (2_000_000_000, 0), (0, 4)],
            8,
            8,
        );
        assert!(start.elapsed() < Duration::from_secs(1), "{:?}", start.elapsed());
        // Rows 0..=3 from the fill, row 4 from the nearly flat boundary.
        assert_eq!(mask.filled_count(), 40);
        assert_eq!(mask.bounding_box(), Some((0, 0, 7, 4)));

        let outside = rasterize_polygon(&[(100, 100), (200, 100), (150, 200)], 8, 8);
        assert_eq!(outside.filled_count(), 0);
    }

    #[test]
    fn test_degenerate_polygons() {
        assert_eq!(rasterize_polygon(&[], 8, 8).filled_count(), 0);
        assert_eq!(rasterize_polygon(&[(3, 3)], 8, 8).filled_count(), 1);
        let line = rasterize_polygon(&[(1, 2), (6, 2)], 8, 8);
        assert_eq!(line.filled_count(), 6);
        assert_eq!(line.bounding_box(), Some((1, 2, 6, 2)));
    }

    #[test]
    fn test_save_png_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("p1_mask.png");
        let mask = rasterize_polygon(&[(1, 1), (4, 1), (4, 3)], 6, 5);
        mask.save_png(&path).unwrap();

        let decoded = image::open(&path).unwrap().to_luma8();
        assert_eq!(decoded.dimensions(), (6, 5));
        assert_eq!(decoded.as_raw().as_slice(), mask.data());
    }
}

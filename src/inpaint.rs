use std::cmp::Ordering;
use std::collections::BinaryHeap;

use image::{GrayImage, Rgb, RgbImage};

/// Neighborhood radius used when reconstructing a masked pixel.
pub const INPAINT_RADIUS: i32 = 3;

const KNOWN: u8 = 0;
const BAND: u8 = 1;
const INSIDE: u8 = 2;
const FAR: f64 = 1e6;

/// A pixel on the marching front, ordered so the binary heap pops the
/// smallest distance first.
struct FrontPoint {
    dist: f64,
    x: u32,
    y: u32,
}

impl PartialEq for FrontPoint {
    fn eq(&self, other: &Self) -> bool {
        self.dist == other.dist
    }
}

impl Eq for FrontPoint {}

impl PartialOrd for FrontPoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontPoint {
    fn cmp(&self, other: &Self) -> Ordering {
        other.dist.total_cmp(&self.dist)
    }
}

/// Fast-marching (Telea) inpainting restricted to the masked pixels.
///
/// Marches from the mask boundary inward by increasing distance to the
/// boundary, reconstructing each masked pixel from already-valid pixels
/// within [`INPAINT_RADIUS`]. Pixels with a zero mask value are never
/// written, and an all-zero mask leaves the frame untouched.
pub fn inpaint(image: &mut RgbImage, mask: &GrayImage) {
    let (width, height) = image.dimensions();
    debug_assert_eq!(mask.dimensions(), image.dimensions());
    if width == 0 || height == 0 {
        return;
    }
    let mut dist = vec![0.0f64; (width * height) as usize];
    let mut flags = vec![KNOWN; (width * height) as usize];
    for (x, y, pixel) in mask.enumerate_pixels() {
        if pixel[0] != 0 {
            let index = (y * width + x) as usize;
            flags[index] = INSIDE;
            dist[index] = FAR;
        }
    }

    let mut front = BinaryHeap::new();
    for y in 0..height {
        for x in 0..width {
            if flags[(y * width + x) as usize] != KNOWN {
                continue;
            }
            let touches_mask = orthogonal_neighbours(x, y, width, height)
                .into_iter()
                .flatten()
                .any(|(nx, ny)| flags[(ny * width + nx) as usize] == INSIDE);
            if touches_mask {
                flags[(y * width + x) as usize] = BAND;
                front.push(FrontPoint { dist: 0.0, x, y });
            }
        }
    }

    while let Some(point) = front.pop() {
        let index = (point.y * width + point.x) as usize;
        if flags[index] == KNOWN {
            continue;
        }
        flags[index] = KNOWN;
        for (nx, ny) in orthogonal_neighbours(point.x, point.y, width, height)
            .into_iter()
            .flatten()
        {
            let neighbour = (ny * width + nx) as usize;
            if flags[neighbour] == KNOWN {
                continue;
            }
            let solved = march_distance(&dist, &flags, nx, ny, width, height);
            if solved < dist[neighbour] {
                dist[neighbour] = solved;
            }
            if flags[neighbour] == INSIDE {
                flags[neighbour] = BAND;
                let color = reconstruct_pixel(image, &dist, &flags, nx, ny, width, height);
                image.put_pixel(nx, ny, color);
            }
            front.push(FrontPoint {
                dist: dist[neighbour],
                x: nx,
                y: ny,
            });
        }
    }
}

fn orthogonal_neighbours(x: u32, y: u32, width: u32, height: u32) -> [Option<(u32, u32)>; 4] {
    [
        (x > 0).then(|| (x - 1, y)),
        (x + 1 < width).then(|| (x + 1, y)),
        (y > 0).then(|| (x, y - 1)),
        (y + 1 < height).then(|| (x, y + 1)),
    ]
}

/// Distance of a known orthogonal neighbour, or `None` when the pixel is out
/// of bounds or not yet resolved.
fn known_distance(
    dist: &[f64],
    flags: &[u8],
    x: i64,
    y: i64,
    width: u32,
    height: u32,
) -> Option<f64> {
    if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
        return None;
    }
    let index = (y as u32 * width + x as u32) as usize;
    (flags[index] == KNOWN).then(|| dist[index])
}

/// One eikonal update from a horizontal/vertical neighbour pair.
fn solve_eikonal(horizontal: Option<f64>, vertical: Option<f64>) -> f64 {
    match (horizontal, vertical) {
        (Some(a), Some(b)) => {
            if (a - b).abs() >= 1.0 {
                return 1.0 + a.min(b);
            }
            let root = (2.0 - (a - b) * (a - b)).sqrt();
            let mut solution = (a + b - root) / 2.0;
            if solution >= a && solution >= b {
                return solution;
            }
            solution += root;
            if solution >= a && solution >= b {
                return solution;
            }
            FAR
        }
        (Some(a), None) => 1.0 + a,
        (None, Some(b)) => 1.0 + b,
        (None, None) => FAR,
    }
}

fn march_distance(dist: &[f64], flags: &[u8], x: u32, y: u32, width: u32, height: u32) -> f64 {
    let x = x as i64;
    let y = y as i64;
    let west = known_distance(dist, flags, x - 1, y, width, height);
    let east = known_distance(dist, flags, x + 1, y, width, height);
    let north = known_distance(dist, flags, x, y - 1, width, height);
    let south = known_distance(dist, flags, x, y + 1, width, height);
    solve_eikonal(west, north)
        .min(solve_eikonal(east, north))
        .min(solve_eikonal(west, south))
        .min(solve_eikonal(east, south))
}

/// Gradient of the distance field, one-sided at the mask interior.
fn distance_gradient(
    dist: &[f64],
    flags: &[u8],
    x: u32,
    y: u32,
    width: u32,
    height: u32,
) -> (f64, f64) {
    let value = dist[(y * width + x) as usize];
    let sample = |sx: i64, sy: i64| -> Option<f64> {
        if sx < 0 || sy < 0 || sx >= width as i64 || sy >= height as i64 {
            return None;
        }
        let index = (sy as u32 * width + sx as u32) as usize;
        (flags[index] != INSIDE).then(|| dist[index])
    };
    let axis = |previous: Option<f64>, next: Option<f64>| match (previous, next) {
        (Some(p), Some(n)) => (n - p) / 2.0,
        (None, Some(n)) => n - value,
        (Some(p), None) => value - p,
        (None, None) => 0.0,
    };
    let x = x as i64;
    let y = y as i64;
    (
        axis(sample(x - 1, y), sample(x + 1, y)),
        axis(sample(x, y - 1), sample(x, y + 1)),
    )
}

/// Weighted average of the valid pixels around (x, y). Weights favor nearby
/// pixels lying along the march direction on a similar level set.
fn reconstruct_pixel(
    image: &RgbImage,
    dist: &[f64],
    flags: &[u8],
    x: u32,
    y: u32,
    width: u32,
    height: u32,
) -> Rgb<u8> {
    let dist_here = dist[(y * width + x) as usize];
    let (grad_x, grad_y) = distance_gradient(dist, flags, x, y, width, height);
    let mut channels = [0.0f64; 3];
    let mut weight_sum = 0.0f64;

    for dy in -INPAINT_RADIUS..=INPAINT_RADIUS {
        for dx in -INPAINT_RADIUS..=INPAINT_RADIUS {
            if dx == 0 && dy == 0 {
                continue;
            }
            let length_sq = (dx * dx + dy * dy) as f64;
            if length_sq > (INPAINT_RADIUS * INPAINT_RADIUS) as f64 {
                continue;
            }
            let nx = x as i64 + dx as i64;
            let ny = y as i64 + dy as i64;
            if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                continue;
            }
            let neighbour = (ny as u32 * width + nx as u32) as usize;
            if flags[neighbour] == INSIDE {
                continue;
            }
            let length = length_sq.sqrt();
            let direction = ((dx as f64 * grad_x + dy as f64 * grad_y) / length)
                .abs()
                .max(1e-6);
            let geometric = 1.0 / length_sq;
            let level = 1.0 / (1.0 + (dist[neighbour] - dist_here).abs());
            let weight = direction * geometric * level;
            let pixel = image.get_pixel(nx as u32, ny as u32);
            for (channel, value) in channels.iter_mut().zip(pixel.0) {
                *channel += weight * value as f64;
            }
            weight_sum += weight;
        }
    }

    if weight_sum == 0.0 {
        return *image.get_pixel(x, y);
    }
    Rgb([
        (channels[0] / weight_sum).round().clamp(0.0, 255.0) as u8,
        (channels[1] / weight_sum).round().clamp(0.0, 255.0) as u8,
        (channels[2] / weight_sum).round().clamp(0.0, 255.0) as u8,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::build_mask;
    use crate::region::Region;

    fn patterned_image(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([
                (x * 13 % 256) as u8,
                (y * 29 % 256) as u8,
                ((x + y) * 7 % 256) as u8,
            ])
        })
    }

    #[test]
    fn unmasked_pixels_are_untouched() {
        let original = patterned_image(24, 24);
        let mut image = original.clone();
        let mask = build_mask(24, 24, &[Region::new(8, 8, 14, 14)]);
        inpaint(&mut image, &mask);
        for (x, y, pixel) in original.enumerate_pixels() {
            if mask.get_pixel(x, y)[0] == 0 {
                assert_eq!(pixel, image.get_pixel(x, y), "pixel ({x},{y}) changed");
            }
        }
    }

    #[test]
    fn constant_surroundings_fill_the_hole() {
        let mut image = RgbImage::from_pixel(20, 20, Rgb([200, 40, 90]));
        for y in 6..12 {
            for x in 6..12 {
                image.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
        let mask = build_mask(20, 20, &[Region::new(6, 6, 12, 12)]);
        inpaint(&mut image, &mask);
        for y in 6..12 {
            for x in 6..12 {
                let pixel = image.get_pixel(x, y);
                assert!(
                    pixel[0] >= 195 && pixel[1] <= 45 && (85..=95).contains(&pixel[2]),
                    "pixel ({x},{y}) = {:?} not reconstructed from surroundings",
                    pixel
                );
            }
        }
    }

    #[test]
    fn empty_mask_is_identity() {
        let original = patterned_image(16, 16);
        let mut image = original.clone();
        let mask = build_mask(16, 16, &[]);
        inpaint(&mut image, &mask);
        assert_eq!(original.as_raw(), image.as_raw());
    }

    #[test]
    fn degenerate_region_is_identity() {
        let original = patterned_image(16, 16);
        let mut image = original.clone();
        let mask = build_mask(16, 16, &[Region::new(4, 2, 4, 10)]);
        inpaint(&mut image, &mask);
        assert_eq!(original.as_raw(), image.as_raw());
    }

    #[test]
    fn mask_touching_the_border_is_filled() {
        let mut image = RgbImage::from_pixel(12, 12, Rgb([10, 220, 10]));
        for y in 0..4 {
            for x in 0..4 {
                image.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }
        let mask = build_mask(12, 12, &[Region::new(0, 0, 4, 4)]);
        inpaint(&mut image, &mask);
        for y in 0..4 {
            for x in 0..4 {
                let pixel = image.get_pixel(x, y);
                assert!(pixel[1] >= 200, "pixel ({x},{y}) = {:?} kept its old value", pixel);
            }
        }
    }
}

use crate::region::Region;

use image::GrayImage;

pub const MASKED: u8 = 255;

/// Builds the binary mask for one frame: every pixel covered by at least one
/// region is set to 255, everything else stays 0. Region corners are
/// normalized and clamped to the frame, so inverted or partially off-screen
/// rectangles mark only their visible area and degenerate rectangles mark
/// nothing.
pub fn build_mask(width: u32, height: u32, regions: &[Region]) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    for region in regions {
        if region.is_degenerate() {
            continue;
        }
        let (left, top, right, bottom) = region.normalized();
        let x_min = left.clamp(0, width as i32) as u32;
        let x_max = right.clamp(0, width as i32) as u32;
        let y_min = top.clamp(0, height as i32) as u32;
        let y_max = bottom.clamp(0, height as i32) as u32;
        for y in y_min..y_max {
            for x in x_min..x_max {
                mask.put_pixel(x, y, image::Luma([MASKED]));
            }
        }
    }
    mask
}

//! Image preprocessing for classifier inference.
//!
//! Produces an NCHW `[1, 3, height, width]` tensor in RGB order, applying
//! the resize, rescale and per-channel normalization described by
//! [`PreprocessSettings`].

use super::model_dir::PreprocessSettings;
use image::DynamicImage;
use ndarray::Array4;

/// Number of color channels (RGB).
const CHANNELS: usize = 3;

pub fn preprocess(image: &DynamicImage, settings: &PreprocessSettings) -> Array4<f32> {
    let rgb = if settings.do_resize {
        resize(image, settings).to_rgb8()
    } else {
        image.to_rgb8()
    };

    let (width, height) = (rgb.width() as usize, rgb.height() as usize);
    let plane = width * height;
    let scale = settings.rescale_factor.unwrap_or(1.0);

    let mut tensor = Array4::<f32>::zeros((1, CHANNELS, height, width));
    // A freshly allocated standard-layout array is always contiguous.
    let Some(tensor_data) = tensor.as_slice_mut() else {
        return tensor;
    };

    for (i, pixel) in rgb.as_raw().chunks_exact(CHANNELS).enumerate() {
        for (c, &val) in pixel.iter().enumerate() {
            let mut v = val as f32 * scale;
            if let Some((mean, std)) = settings.normalize {
                v = (v - mean[c]) / std[c];
            }
            // NCHW: channel plane, then row-major pixel offset
            tensor_data[c * plane + i] = v;
        }
    }

    tensor
}

fn resize(image: &DynamicImage, settings: &PreprocessSettings) -> DynamicImage {
    let (width, height) = (settings.width, settings.height);
    let Some(edge) = settings.shortest_edge else {
        return image.resize_exact(width, height, settings.filter);
    };

    let (src_w, src_h) = (image.width().max(1), image.height().max(1));
    let (scaled_w, scaled_h) = if src_w <= src_h {
        (edge, scale_side(src_h, edge, src_w))
    } else {
        (scale_side(src_w, edge, src_h), edge)
    };
    let scaled = image.resize_exact(scaled_w, scaled_h, settings.filter);

    let crop_w = width.min(scaled_w);
    let crop_h = height.min(scaled_h);
    let cropped = scaled.crop_imm(
        (scaled_w - crop_w) / 2,
        (scaled_h - crop_h) / 2,
        crop_w,
        crop_h,
    );

    // A crop larger than the resized image is stretched to the output size.
    if (crop_w, crop_h) == (width, height) {
        cropped
    } else {
        cropped.resize_exact(width, height, settings.filter)
    }
}

/// `side * edge / short`, rounded, at least 1.
fn scale_side(side: u32, edge: u32, short: u32) -> u32 {
    let scaled = (side as f64 * edge as f64 / short as f64).round() as u32;
    scaled.max(1)
}

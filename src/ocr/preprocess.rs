//! Image normalisation for the vision encoder.

use image::DynamicImage;
use ndarray::Array4;

/// Resize `image` to the model's square input and normalise it into an
/// NCHW `[1, 3, size, size]` float tensor.
///
/// Each channel value is mapped as `(x / 255 - mean[c]) / std[c]`.
/// `mean` and `std` must hold three entries; [`super::ModelConfig::validate`]
/// enforces that before an engine is built.
pub fn normalise(image: &DynamicImage, size: u32, mean: &[f32], std: &[f32]) -> Array4<f32> {
    let resized = image.resize_exact(size, size, image::imageops::FilterType::Lanczos3);
    let rgb = resized.to_rgb8();

    let side = size as usize;
    let mut tensor = Array4::<f32>::zeros((1, 3, side, side));
    for y in 0..side {
        for x in 0..side {
            let pixel = rgb.get_pixel(x as u32, y as u32);
            for c in 0..3 {
                tensor[[0, c, y, x]] = (pixel[c] as f32 / 255.0 - mean[c]) / std[c];
            }
        }
    }
    tensor
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    const MEAN: [f32; 3] = [0.5, 0.5, 0.5];
    const STD: [f32; 3] = [0.5, 0.5, 0.5];

    fn solid(colour: Rgb<u8>, w: u32, h: u32) -> DynamicImage {
        let mut img = RgbImage::new(w, h);
        for pixel in img.pixels_mut() {
            *pixel = colour;
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn output_shape_is_square_nchw() {
        let img = solid(Rgb([127, 127, 127]), 640, 480);
        let tensor = normalise(&img, 384, &MEAN, &STD);
        assert_eq!(tensor.shape(), &[1, 3, 384, 384]);
    }

    #[test]
    fn white_maps_to_one_black_to_minus_one() {
        let white = normalise(&solid(Rgb([255, 255, 255]), 8, 8), 4, &MEAN, &STD);
        let black = normalise(&solid(Rgb([0, 0, 0]), 8, 8), 4, &MEAN, &STD);
        assert!((white[[0, 0, 0, 0]] - 1.0).abs() < 1e-6);
        assert!((black[[0, 2, 3, 3]] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn deterministic_for_identical_input() {
        let img = solid(Rgb([40, 80, 160]), 32, 32);
        let a = normalise(&img, 16, &MEAN, &STD);
        let b = normalise(&img, 16, &MEAN, &STD);
        assert_eq!(a, b);
    }
}

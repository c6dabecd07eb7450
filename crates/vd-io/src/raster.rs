//! 2D rasters through the `image` crate (PNG, TIFF).

use std::path::Path;

use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use log::debug;
use vd_core::Image;

use crate::error::{IoError, IoResult};

/// Reads a single-channel raster as raw sample values.
///
/// 8- and 16-bit gray images keep their integer values; float gray images
/// keep their floats. Color images are converted to gray at their own bit
/// depth first.
pub fn read_raster(path: &Path) -> IoResult<Image<f32>> {
    let img = image::open(path)?;
    let (w, h) = (img.width() as usize, img.height() as usize);

    let data: Vec<f32> = match img {
        DynamicImage::ImageLuma8(buf) => buf.into_raw().into_iter().map(f32::from).collect(),
        DynamicImage::ImageLuma16(buf) => buf.into_raw().into_iter().map(f32::from).collect(),
        float @ (DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_)) => {
            float.to_luma32f().into_raw()
        }
        other => {
            let color = other.color();
            let bytes_per_channel = color.bytes_per_pixel() / color.channel_count().max(1);
            if bytes_per_channel <= 1 {
                other.to_luma8().into_raw().into_iter().map(f32::from).collect()
            } else {
                other.to_luma16().into_raw().into_iter().map(f32::from).collect()
            }
        }
    };

    debug!("read raster {} {w}x{h}", path.display());
    Ok(Image::from_vec(w, h, data)?)
}

pub fn write_raster_u8(path: &Path, img: &Image<u8>) -> IoResult<()> {
    let (w, h) = dims(img)?;
    let gray = GrayImage::from_raw(w, h, img.data().to_vec())
        .ok_or_else(|| IoError::Format("raster buffer does not match its size".to_string()))?;
    gray.save(path)?;
    debug!("wrote raster {} {w}x{h}", path.display());
    Ok(())
}

pub fn write_raster_u16(path: &Path, img: &Image<u16>) -> IoResult<()> {
    let (w, h) = dims(img)?;
    let gray: ImageBuffer<Luma<u16>, Vec<u16>> = ImageBuffer::from_raw(w, h, img.data().to_vec())
        .ok_or_else(|| IoError::Format("raster buffer does not match its size".to_string()))?;
    gray.save(path)?;
    debug!("wrote raster {} {w}x{h}", path.display());
    Ok(())
}

fn dims<T>(img: &Image<T>) -> IoResult<(u32, u32)> {
    let w = u32::try_from(img.width())
        .map_err(|_| IoError::Format("raster width exceeds u32".to_string()))?;
    let h = u32::try_from(img.height())
        .map_err(|_| IoError::Format("raster height exceeds u32".to_string()))?;
    Ok((w, h))
}

use rayon::prelude::*;
use vd_core::{BorderMode, Error, Image, map_index};

use crate::conv1d::convolve_f32;
use crate::kernels1d::GaussianKernel1D;

/// Separable Gaussian smoothing of a 2D map with replicate-edge borders.
///
/// `variance` is given per image axis `[x, y]` in pixels². A zero entry skips
/// that axis. Geometry is carried over from `src`.
pub fn gaussian_smooth(src: &Image<f32>, variance: [f64; 2]) -> Result<Image<f32>, Error> {
    if variance.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return Err(Error::InvalidParameter {
            name: "variance",
            reason: "must be finite and >= 0",
        });
    }

    let (w, h) = (src.width(), src.height());
    let kx = GaussianKernel1D::from_variance(variance[0]);
    let ky = GaussianKernel1D::from_variance(variance[1]);
    if w == 0 || h == 0 || (kx.is_identity() && ky.is_identity()) {
        return Ok(src.clone());
    }

    let mut tmp = vec![0.0f32; w * h];
    if kx.is_identity() {
        tmp.copy_from_slice(src.data());
    } else {
        tmp.par_chunks_mut(w).enumerate().for_each_init(Vec::new, |scratch, (y, out)| {
            convolve_f32(src.row(y), &kx.g, kx.radius, &BorderMode::Clamp, scratch, out);
        });
    }

    if ky.is_identity() {
        return Ok(Image::from_vec(w, h, tmp)?.with_geometry(src.geometry()));
    }

    let mut out = vec![0.0f32; w * h];
    let border = BorderMode::<f32>::Clamp;
    out.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        for (k, &g) in ky.g.iter().enumerate() {
            // Kernel tap k pairs with source row y + radius - k.
            let yy = y as isize + ky.radius as isize - k as isize;
            let Some(yy) = map_index(yy, h, &border) else {
                continue;
            };
            let src_row = &tmp[yy * w..(yy + 1) * w];
            for (o, &s) in row.iter_mut().zip(src_row) {
                *o += g * s;
            }
        }
    });

    Ok(Image::from_vec(w, h, out)?.with_geometry(src.geometry()))
}

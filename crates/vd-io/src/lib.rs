//! Reading volumes and writing depth maps and projections.
//!
//! Volumes come from MetaImage files (`.mha`, `.mhd`). 2D maps can also be
//! PNG or TIFF rasters. Files are classified by extension; the rank of a
//! MetaImage can be checked with [`probe_rank`] before its data is read.

mod error;
pub mod metaimage;
pub mod raster;

use std::path::Path;

use vd_core::{Error, Image, PlaneGeometry, VOLUME_RANK, Volume, VolumeGeometry};

pub use error::{IoError, IoResult};
pub use metaimage::{ElementType, MetaArray, MetaElement, MetaHeader, read_header, read_meta, write_meta};
pub use raster::{read_raster, write_raster_u8, write_raster_u16};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    MetaImage,
    Raster,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> IoResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "mha" | "mhd" => Ok(Self::MetaImage),
            "png" | "tif" | "tiff" => Ok(Self::Raster),
            _ => Err(IoError::Format(format!(
                "unknown extension for {} (expected mha, mhd, png, tif)",
                path.display()
            ))),
        }
    }
}

/// Rank of the array stored at `path`, read from the header only.
pub fn probe_rank(path: &Path) -> IoResult<usize> {
    match FileFormat::from_path(path)? {
        FileFormat::MetaImage => Ok(read_header(path)?.rank()),
        FileFormat::Raster => Ok(2),
    }
}

/// Reads a rank-3 volume. Any other rank is rejected.
pub fn read_volume(path: &Path) -> IoResult<Volume<f32>> {
    if FileFormat::from_path(path)? != FileFormat::MetaImage {
        return Err(IoError::Data(Error::RankMismatch {
            expected: VOLUME_RANK,
            actual: 2,
        }));
    }
    let arr = read_meta(path)?;
    let rank = arr.dim_size.len();
    if rank != VOLUME_RANK {
        return Err(IoError::Data(Error::RankMismatch {
            expected: VOLUME_RANK,
            actual: rank,
        }));
    }

    let shape = [arr.dim_size[0], arr.dim_size[1], arr.dim_size[2]];
    let geometry = VolumeGeometry {
        spacing: [arr.spacing[0], arr.spacing[1], arr.spacing[2]],
        origin: [arr.origin[0], arr.origin[1], arr.origin[2]],
    };
    Ok(Volume::from_vec(shape, arr.data)?.with_geometry(geometry))
}

/// Reads a rank-2 map from a MetaImage or raster file.
pub fn read_depth_map(path: &Path) -> IoResult<Image<f32>> {
    match FileFormat::from_path(path)? {
        FileFormat::Raster => read_raster(path),
        FileFormat::MetaImage => {
            let arr = read_meta(path)?;
            if arr.dim_size.len() != 2 {
                return Err(IoError::Data(Error::RankMismatch {
                    expected: 2,
                    actual: arr.dim_size.len(),
                }));
            }
            let geometry = PlaneGeometry {
                spacing: [arr.spacing[0], arr.spacing[1]],
                origin: [arr.origin[0], arr.origin[1]],
            };
            Ok(Image::from_vec(arr.dim_size[0], arr.dim_size[1], arr.data)?.with_geometry(geometry))
        }
    }
}

pub fn write_volume_f32(path: &Path, vol: &Volume<f32>) -> IoResult<()> {
    let g = vol.geometry();
    write_meta(path, &vol.shape(), &g.spacing, &g.origin, vol.data())
}

fn write_image<T: MetaElement>(
    path: &Path,
    img: &Image<T>,
    raster: impl FnOnce(&Path, &Image<T>) -> IoResult<()>,
) -> IoResult<()> {
    match FileFormat::from_path(path)? {
        FileFormat::MetaImage => {
            let g = img.geometry();
            write_meta(path, &img.shape(), &g.spacing, &g.origin, img.data())
        }
        FileFormat::Raster => raster(path, img),
    }
}

/// Writes an 8-bit map as MetaImage or raster, chosen by extension.
pub fn write_image_u8(path: &Path, img: &Image<u8>) -> IoResult<()> {
    write_image(path, img, write_raster_u8)
}

/// Writes a 16-bit map as MetaImage or raster, chosen by extension.
pub fn write_image_u16(path: &Path, img: &Image<u16>) -> IoResult<()> {
    write_image(path, img, write_raster_u16)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use vd_core::{Image, PlaneGeometry, Volume, VolumeGeometry};

    use crate::{
        FileFormat, probe_rank, read_depth_map, read_volume, write_image_u8, write_image_u16,
        write_volume_f32,
    };

    #[test]
    fn format_from_extension() {
        assert_eq!(
            FileFormat::from_path(Path::new("a/b.MHA")).expect("known"),
            FileFormat::MetaImage
        );
        assert_eq!(
            FileFormat::from_path(Path::new("x.tiff")).expect("known"),
            FileFormat::Raster
        );
        assert!(FileFormat::from_path(Path::new("x.nii")).is_err());
        assert!(FileFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn volume_round_trip_and_rank_probe() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("v.mha");
        let geometry = VolumeGeometry {
            spacing: [0.5, 0.5, 1.5],
            origin: [0.0, 1.0, 2.0],
        };
        let vol = Volume::from_vec([3, 2, 2], (0..12).map(|v| v as f32 * 0.5).collect())
            .expect("valid volume")
            .with_geometry(geometry);
        write_volume_f32(&path, &vol).expect("write");

        assert_eq!(probe_rank(&path).expect("probe"), 3);
        let back = read_volume(&path).expect("read");
        assert_eq!(back, vol);
    }

    #[test]
    fn volume_reader_rejects_2d() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("m.mha");
        let img = Image::from_vec(2, 2, vec![1u8, 2, 3, 4]).expect("valid image");
        write_image_u8(&path, &img).expect("write");

        assert_eq!(probe_rank(&path).expect("probe"), 2);
        assert!(read_volume(&path).is_err());
        assert!(read_volume(&dir.path().join("m.png")).is_err());
    }

    #[test]
    fn depth_map_from_metaimage_and_png() {
        let dir = tempfile::tempdir().expect("tempdir");
        let geometry = PlaneGeometry {
            spacing: [2.0, 3.0],
            origin: [0.5, 0.25],
        };
        let img = Image::from_vec(3, 1, vec![5u16, 6, 7])
            .expect("valid image")
            .with_geometry(geometry);

        let mha = dir.path().join("d.mha");
        write_image_u16(&mha, &img).expect("write mha");
        let back = read_depth_map(&mha).expect("read mha");
        assert_eq!(back.data(), &[5.0, 6.0, 7.0]);
        assert_eq!(back.geometry(), geometry);

        let png = dir.path().join("d.png");
        write_image_u16(&png, &img).expect("write png");
        assert_eq!(read_depth_map(&png).expect("read png").data(), &[5.0, 6.0, 7.0]);
    }
}

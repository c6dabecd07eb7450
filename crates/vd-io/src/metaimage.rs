//! Uncompressed, little-endian, single-channel MetaImage (`.mha`, `.mhd`).

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{IoError, IoResult};

/// Element types understood in the `ElementType` header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    UChar,
    Char,
    UShort,
    Short,
    UInt,
    Int,
    Float,
    Double,
}

impl ElementType {
    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "MET_UCHAR" => Self::UChar,
            "MET_CHAR" => Self::Char,
            "MET_USHORT" => Self::UShort,
            "MET_SHORT" => Self::Short,
            "MET_UINT" => Self::UInt,
            "MET_INT" => Self::Int,
            "MET_FLOAT" => Self::Float,
            "MET_DOUBLE" => Self::Double,
            _ => return None,
        })
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::UChar => "MET_UCHAR",
            Self::Char => "MET_CHAR",
            Self::UShort => "MET_USHORT",
            Self::Short => "MET_SHORT",
            Self::UInt => "MET_UINT",
            Self::Int => "MET_INT",
            Self::Float => "MET_FLOAT",
            Self::Double => "MET_DOUBLE",
        }
    }

    /// Bytes per element.
    pub fn size(self) -> usize {
        match self {
            Self::UChar | Self::Char => 1,
            Self::UShort | Self::Short => 2,
            Self::UInt | Self::Int | Self::Float => 4,
            Self::Double => 8,
        }
    }

    fn decode_f32(self, bytes: &[u8]) -> f32 {
        match self {
            Self::UChar => bytes[0] as f32,
            Self::Char => bytes[0] as i8 as f32,
            Self::UShort => u16::from_le_bytes([bytes[0], bytes[1]]) as f32,
            Self::Short => i16::from_le_bytes([bytes[0], bytes[1]]) as f32,
            Self::UInt => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f32,
            Self::Int => i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f32,
            Self::Float => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            Self::Double => {
                let mut b = [0u8; 8];
                b.copy_from_slice(&bytes[..8]);
                f64::from_le_bytes(b) as f32
            }
        }
    }
}

/// Sample types that can be written as MetaImage elements.
pub trait MetaElement: Copy {
    const ELEMENT_TYPE: ElementType;
    fn write_le(self, out: &mut Vec<u8>);
}

macro_rules! impl_meta_element {
    ($($t:ty => $e:ident),* $(,)?) => {
        $(
            impl MetaElement for $t {
                const ELEMENT_TYPE: ElementType = ElementType::$e;
                fn write_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_meta_element!(
    u8 => UChar,
    i8 => Char,
    u16 => UShort,
    i16 => Short,
    u32 => UInt,
    i32 => Int,
    f32 => Float,
    f64 => Double,
);

/// Where the element data lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataFile {
    /// Right after the header, in the same file.
    Local,
    External(PathBuf),
}

/// Parsed MetaImage header.
#[derive(Debug, Clone, PartialEq)]
pub struct MetaHeader {
    /// Extent per axis, fastest axis first.
    pub dim_size: Vec<usize>,
    pub element_type: ElementType,
    pub spacing: Vec<f64>,
    pub origin: Vec<f64>,
    pub data_file: DataFile,
    /// Byte offset of local element data.
    data_offset: u64,
}

impl MetaHeader {
    pub fn rank(&self) -> usize {
        self.dim_size.len()
    }

    pub fn element_count(&self) -> Option<usize> {
        self.dim_size
            .iter()
            .try_fold(1usize, |acc, &n| acc.checked_mul(n))
    }
}

/// Decoded MetaImage contents, converted to `f32`.
#[derive(Debug, Clone, PartialEq)]
pub struct MetaArray {
    pub dim_size: Vec<usize>,
    pub spacing: Vec<f64>,
    pub origin: Vec<f64>,
    pub data: Vec<f32>,
}

fn header_err(msg: impl Into<String>) -> IoError {
    IoError::Header(msg.into())
}

fn parse_list<T: std::str::FromStr>(key: &str, value: &str) -> IoResult<Vec<T>> {
    value
        .split_whitespace()
        .map(|tok| {
            tok.parse::<T>()
                .map_err(|_| header_err(format!("{key}: cannot parse `{tok}`")))
        })
        .collect()
}

fn parse_bool(key: &str, value: &str) -> IoResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(header_err(format!("{key}: expected True/False, got `{other}`"))),
    }
}

/// Reads the header of `path` without touching the element data.
pub fn read_header(path: &Path) -> IoResult<MetaHeader> {
    let mut reader = BufReader::new(File::open(path)?);

    let mut ndims: Option<usize> = None;
    let mut dim_size: Option<Vec<usize>> = None;
    let mut element_type: Option<ElementType> = None;
    let mut spacing: Option<Vec<f64>> = None;
    let mut origin: Option<Vec<f64>> = None;
    let mut data_file: Option<DataFile> = None;
    let mut offset = 0u64;

    let mut line = Vec::new();
    while data_file.is_none() {
        line.clear();
        let n = reader.read_until(b'\n', &mut line)?;
        if n == 0 {
            return Err(header_err("missing ElementDataFile"));
        }
        offset += n as u64;

        let text = std::str::from_utf8(&line)
            .map_err(|_| header_err("header is not valid text"))?
            .trim();
        if text.is_empty() {
            continue;
        }
        let Some((key, value)) = text.split_once('=') else {
            return Err(header_err(format!("expected `Key = Value`, got `{text}`")));
        };
        let (key, value) = (key.trim(), value.trim());

        match key {
            "NDims" => {
                ndims = Some(
                    value
                        .parse()
                        .map_err(|_| header_err(format!("NDims: cannot parse `{value}`")))?,
                );
            }
            "DimSize" => dim_size = Some(parse_list(key, value)?),
            "ElementType" => {
                element_type = Some(
                    ElementType::from_tag(value)
                        .ok_or_else(|| header_err(format!("unsupported ElementType {value}")))?,
                );
            }
            "ElementSpacing" => spacing = Some(parse_list(key, value)?),
            "Offset" | "Origin" | "Position" => origin = Some(parse_list(key, value)?),
            "BinaryDataByteOrderMSB" | "ElementByteOrderMSB" => {
                if parse_bool(key, value)? {
                    return Err(header_err("big-endian data is not supported"));
                }
            }
            "CompressedData" => {
                if parse_bool(key, value)? {
                    return Err(header_err("compressed data is not supported"));
                }
            }
            "ElementNumberOfChannels" => {
                if value != "1" {
                    return Err(header_err("only single-channel images are supported"));
                }
            }
            "ElementDataFile" => {
                data_file = Some(match value {
                    "LOCAL" | "Local" | "local" => DataFile::Local,
                    "LIST" => return Err(header_err("file lists are not supported")),
                    name => {
                        let base = path.parent().unwrap_or_else(|| Path::new(""));
                        DataFile::External(base.join(name))
                    }
                });
            }
            _ => {}
        }
    }

    let dim_size = dim_size.ok_or_else(|| header_err("missing DimSize"))?;
    let rank = ndims.unwrap_or(dim_size.len());
    if rank != dim_size.len() {
        return Err(header_err(format!(
            "NDims = {rank} but DimSize has {} entries",
            dim_size.len()
        )));
    }
    let spacing = spacing.unwrap_or_else(|| vec![1.0; rank]);
    let origin = origin.unwrap_or_else(|| vec![0.0; rank]);
    if spacing.len() != rank || origin.len() != rank {
        return Err(header_err("ElementSpacing/Offset do not match NDims"));
    }

    Ok(MetaHeader {
        dim_size,
        element_type: element_type.ok_or_else(|| header_err("missing ElementType"))?,
        spacing,
        origin,
        data_file: data_file.unwrap_or(DataFile::Local),
        data_offset: offset,
    })
}

/// Reads a MetaImage, converting every element to `f32`.
pub fn read_meta(path: &Path) -> IoResult<MetaArray> {
    let header = read_header(path)?;
    let count = header
        .element_count()
        .ok_or_else(|| header_err("DimSize overflows"))?;
    let size = header.element_type.size();
    let byte_len = count
        .checked_mul(size)
        .ok_or_else(|| header_err("DimSize overflows"))?;

    let (mut file, start) = match &header.data_file {
        DataFile::Local => (File::open(path)?, header.data_offset),
        DataFile::External(raw) => (File::open(raw)?, 0),
    };
    let available = file.metadata()?.len().saturating_sub(start);
    if (byte_len as u64) > available {
        return Err(header_err(format!(
            "DimSize needs {byte_len} data bytes, file holds {available}"
        )));
    }

    let mut bytes = vec![0u8; byte_len];
    file.seek(SeekFrom::Start(start))?;
    file.read_exact(&mut bytes)?;

    let data = bytes
        .chunks_exact(size)
        .map(|b| header.element_type.decode_f32(b))
        .collect();

    debug!(
        "read {} dims={:?} type={}",
        path.display(),
        header.dim_size,
        header.element_type.tag()
    );

    Ok(MetaArray {
        dim_size: header.dim_size,
        spacing: header.spacing,
        origin: header.origin,
        data,
    })
}

/// Writes `data` with extent `dim_size` (fastest axis first).
///
/// A `.mhd` path gets its elements in a sibling `.raw` file; anything else
/// stores them inline after the header.
pub fn write_meta<T: MetaElement>(
    path: &Path,
    dim_size: &[usize],
    spacing: &[f64],
    origin: &[f64],
    data: &[T],
) -> IoResult<()> {
    let count: usize = dim_size.iter().product();
    if count != data.len() {
        return Err(IoError::Data(vd_core::Error::SizeMismatch {
            expected: count,
            actual: data.len(),
        }));
    }
    if spacing.len() != dim_size.len() || origin.len() != dim_size.len() {
        return Err(header_err("spacing/origin must have one entry per axis"));
    }

    let external = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("mhd"));
    let raw_path = path.with_extension("raw");

    let join = |v: &[f64]| v.iter().map(|x| x.to_string()).collect::<Vec<_>>().join(" ");
    let dims = dim_size
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    let data_file = if external {
        raw_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| IoError::Format(format!("bad raw path for {}", path.display())))?
            .to_string()
    } else {
        "LOCAL".to_string()
    };

    let mut payload = Vec::with_capacity(data.len() * T::ELEMENT_TYPE.size());
    for &v in data {
        v.write_le(&mut payload);
    }

    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "ObjectType = Image")?;
    writeln!(w, "NDims = {}", dim_size.len())?;
    writeln!(w, "BinaryData = True")?;
    writeln!(w, "BinaryDataByteOrderMSB = False")?;
    writeln!(w, "CompressedData = False")?;
    writeln!(w, "Offset = {}", join(origin))?;
    writeln!(w, "ElementSpacing = {}", join(spacing))?;
    writeln!(w, "DimSize = {dims}")?;
    writeln!(w, "ElementType = {}", T::ELEMENT_TYPE.tag())?;
    writeln!(w, "ElementDataFile = {data_file}")?;
    if external {
        w.flush()?;
        let mut raw = BufWriter::new(File::create(&raw_path)?);
        raw.write_all(&payload)?;
        raw.flush()?;
    } else {
        w.write_all(&payload)?;
        w.flush()?;
    }

    debug!(
        "wrote {} dims={dim_size:?} type={}",
        path.display(),
        T::ELEMENT_TYPE.tag()
    );
    Ok(())
}

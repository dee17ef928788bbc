// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Lightweight frame probes for the inspection window.
//!
//! Thermal frames are NumPy `.npy` arrays; only the header is read to report
//! shape and dtype. RGB frames are opened through the `image` decoder to
//! report dimensions and color mode without decoding pixel data.

use crate::Error;
use image::{ColorType, ImageDecoder, ImageReader};
use std::{
    fmt,
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

const NPY_MAGIC: &[u8; 6] = b"\x93NUMPY";

/// Shape and element type of a thermal array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThermalProbe {
    pub shape: Vec<usize>,
    /// NumPy-style dtype name such as `float32` or `uint16`.
    pub dtype: String,
    pub fortran_order: bool,
}

impl fmt::Display for ThermalProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims: Vec<String> = self.shape.iter().map(|d| d.to_string()).collect();
        write!(f, "shape ({}), dtype {}", dims.join(", "), self.dtype)
    }
}

/// Dimensions and color mode of an RGB frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbProbe {
    pub width: u32,
    pub height: u32,
    /// Color mode name such as `RGB` or `L`.
    pub mode: String,
}

impl fmt::Display for RgbProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "size {}x{}, mode {}", self.width, self.height, self.mode)
    }
}

/// Outcome of probing one expected frame file.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome<T> {
    /// The file does not exist.
    Missing,
    /// The file exists and was probed.
    Found(T),
    /// The file exists but could not be probed.
    Unreadable(String),
}

impl<T> ProbeOutcome<T> {
    pub fn exists(&self) -> bool {
        !matches!(self, ProbeOutcome::Missing)
    }
}

/// Read the header of a `.npy` file.
///
/// Supports format versions 1.0 (16-bit header length) and 2.0/3.0 (32-bit
/// header length).
pub fn probe_thermal<P: AsRef<Path>>(path: P) -> Result<ThermalProbe, Error> {
    let path = path.as_ref();
    let mut reader = BufReader::new(File::open(path)?);

    let mut preamble = [0u8; 8];
    reader.read_exact(&mut preamble)?;
    if &preamble[..6] != NPY_MAGIC {
        return Err(Error::InvalidNpy(format!(
            "{}: missing NUMPY magic",
            path.display()
        )));
    }

    let header_len = match preamble[6] {
        1 => {
            let mut len = [0u8; 2];
            reader.read_exact(&mut len)?;
            u16::from_le_bytes(len) as usize
        }
        2 | 3 => {
            let mut len = [0u8; 4];
            reader.read_exact(&mut len)?;
            u32::from_le_bytes(len) as usize
        }
        v => {
            return Err(Error::InvalidNpy(format!(
                "{}: unsupported format version {}",
                path.display(),
                v
            )));
        }
    };

    let mut header = vec![0u8; header_len];
    reader.read_exact(&mut header)?;
    parse_npy_header(&String::from_utf8_lossy(&header))
        .map_err(|msg| Error::InvalidNpy(format!("{}: {}", path.display(), msg)))
}

/// Parse the Python dict literal stored in a `.npy` header.
fn parse_npy_header(header: &str) -> Result<ThermalProbe, String> {
    let descr = dict_value(header, "descr").ok_or("header has no descr")?;
    let descr = descr
        .strip_prefix('\'')
        .and_then(|s| s.split('\'').next())
        .ok_or("descr is not a string")?;

    let fortran_order = dict_value(header, "fortran_order")
        .ok_or("header has no fortran_order")?
        .starts_with("True");

    let shape = dict_value(header, "shape").ok_or("header has no shape")?;
    let shape = shape
        .strip_prefix('(')
        .and_then(|s| s.split(')').next())
        .ok_or("shape is not a tuple")?;
    let shape = shape
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| d.trim_end_matches('L').parse::<usize>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid shape: {}", e))?;

    Ok(ThermalProbe {
        shape,
        dtype: dtype_name(descr),
        fortran_order,
    })
}

/// Text following `'key':` in a header dict, leading whitespace removed.
fn dict_value<'a>(header: &'a str, key: &str) -> Option<&'a str> {
    let needle = format!("'{}':", key);
    let start = header.find(&needle)? + needle.len();
    Some(header[start..].trim_start())
}

/// Map a NumPy type descriptor such as `<f4` to its dtype name.
fn dtype_name(descr: &str) -> String {
    let body = descr.trim_start_matches(['<', '>', '|', '=']);
    let (kind, size) = body.split_at(body.len().min(1));
    let Ok(bytes) = size.parse::<usize>() else {
        return descr.to_string();
    };
    match kind {
        "f" => format!("float{}", bytes * 8),
        "i" => format!("int{}", bytes * 8),
        "u" => format!("uint{}", bytes * 8),
        "c" => format!("complex{}", bytes * 8),
        "b" if bytes == 1 => "bool".to_string(),
        _ => descr.to_string(),
    }
}

/// Read dimensions and color type of an image without decoding pixels.
pub fn probe_rgb<P: AsRef<Path>>(path: P) -> Result<RgbProbe, Error> {
    let decoder = ImageReader::open(path.as_ref())?
        .with_guessed_format()?
        .into_decoder()?;
    let (width, height) = decoder.dimensions();
    Ok(RgbProbe {
        width,
        height,
        mode: color_mode(decoder.color_type()),
    })
}

fn color_mode(color: ColorType) -> String {
    match color {
        ColorType::L8 => "L".to_string(),
        ColorType::La8 => "LA".to_string(),
        ColorType::Rgb8 => "RGB".to_string(),
        ColorType::Rgba8 => "RGBA".to_string(),
        ColorType::L16 => "I;16".to_string(),
        other => format!("{:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    /// Write a version 1.0 `.npy` file with the given header dict.
    fn write_npy(path: &Path, dict: &str, payload_len: usize) {
        let mut header = dict.to_string();
        // Pad so that magic + version + len + header is a multiple of 64.
        while (10 + header.len() + 1) % 64 != 0 {
            header.push(' ');
        }
        header.push('\n');

        let mut file = File::create(path).unwrap();
        file.write_all(NPY_MAGIC).unwrap();
        file.write_all(&[1, 0]).unwrap();
        file.write_all(&(header.len() as u16).to_le_bytes()).unwrap();
        file.write_all(header.as_bytes()).unwrap();
        file.write_all(&vec![0u8; payload_len]).unwrap();
    }

    #[test]
    fn test_probe_thermal_float32() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("frame_00000.npy");
        write_npy(
            &path,
            "{'descr': '<f4', 'fortran_order': False, 'shape': (120, 160), }",
            120 * 160 * 4,
        );

        let probe = probe_thermal(&path).unwrap();
        assert_eq!(probe.shape, vec![120, 160]);
        assert_eq!(probe.dtype, "float32");
        assert!(!probe.fortran_order);
        assert_eq!(probe.to_string(), "shape (120, 160), dtype float32");
    }

    #[test]
    fn test_probe_thermal_one_dimensional() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("frame_00001.npy");
        write_npy(
            &path,
            "{'descr': '<u2', 'fortran_order': True, 'shape': (64,), }",
            128,
        );

        let probe = probe_thermal(&path).unwrap();
        assert_eq!(probe.shape, vec![64]);
        assert_eq!(probe.dtype, "uint16");
        assert!(probe.fortran_order);
    }

    #[test]
    fn test_probe_thermal_rejects_non_npy() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("frame_00002.npy");
        std::fs::write(&path, b"definitely not numpy").unwrap();

        let err = probe_thermal(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidNpy(_)));
    }

    #[test]
    fn test_dtype_names() {
        assert_eq!(dtype_name("<f8"), "float64");
        assert_eq!(dtype_name("|u1"), "uint8");
        assert_eq!(dtype_name(">i2"), "int16");
        assert_eq!(dtype_name("|b1"), "bool");
        assert_eq!(dtype_name("<U10"), "<U10");
    }

    #[test]
    fn test_probe_rgb_png() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("frame_00000.png");
        image::RgbImage::new(32, 24).save(&path).unwrap();

        let probe = probe_rgb(&path).unwrap();
        assert_eq!(probe.width, 32);
        assert_eq!(probe.height, 24);
        assert_eq!(probe.mode, "RGB");
    }
}

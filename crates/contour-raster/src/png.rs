//! Heightmap and preview PNG export.
//!
//! Elevation buffers are turned into RGBA bytes by one of two encoders:
//! - **Heightmap**: 16-bit elevation packed into red (low byte) and green
//!   (high byte), blue and alpha opaque. Lossless for downstream terrain use.
//! - **Grayscale preview**: elevation stretched over the pass's range, no-data
//!   transparent, contour lines optionally tinted.
//!
//! `create_png` then writes a plain RGBA PNG (color type 6).

use crate::proximity::LineProximity;
use crate::rasterizer::RasterStats;
use crate::search::is_no_data;
use rayon::prelude::*;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Highest packed heightmap value; also the encoding of no-data.
pub const HEIGHTMAP_MAX: u16 = u16::MAX;

/// Brightness added to red and green on contour line pixels.
const LINE_TINT: u8 = 50;

/// Result type alias using ExportError.
pub type ExportResult<T> = Result<T, ExportError>;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Expected {expected} values for a {size}x{size} image, got {actual}")]
    BufferSize {
        size: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Image must be at least 1x1, got {width}x{height}")]
    EmptyImage { width: usize, height: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn check_len(len: usize, size: usize) -> ExportResult<()> {
    let expected = size * size;
    if len != expected {
        return Err(ExportError::BufferSize {
            size,
            expected,
            actual: len,
        });
    }
    Ok(())
}

/// Packed 16-bit value for one elevation.
#[inline]
pub fn heightmap_value(elevation: f64) -> u16 {
    if is_no_data(elevation) || elevation.is_nan() {
        return HEIGHTMAP_MAX;
    }
    (elevation.max(0.0) * 65536.0).floor().min(HEIGHTMAP_MAX as f64) as u16
}

#[inline]
fn heightmap_pixel(elevation: f64) -> [u8; 4] {
    let [low, high] = heightmap_value(elevation).to_le_bytes();
    [low, high, 255, 255]
}

/// Encode a `size x size` elevation buffer as heightmap RGBA bytes.
pub fn encode_heightmap_rgba(elevations: &[f64], size: usize) -> ExportResult<Vec<u8>> {
    check_len(elevations.len(), size)?;

    let mut pixels = vec![0u8; elevations.len() * 4];
    pixels
        .par_chunks_exact_mut(4)
        .zip(elevations.par_iter())
        .for_each(|(px, e)| px.copy_from_slice(&heightmap_pixel(*e)));

    Ok(pixels)
}

/// Encode a grayscale preview. `mask`, when given, must be the same length
/// as `elevations`.
pub fn encode_grayscale_rgba(
    elevations: &[f64],
    mask: Option<&[LineProximity]>,
    size: usize,
    stats: &RasterStats,
) -> ExportResult<Vec<u8>> {
    check_len(elevations.len(), size)?;
    if let Some(mask) = mask {
        check_len(mask.len(), size)?;
    }

    let min = stats.min_elevation.unwrap_or(0.0);
    let span = stats.elevation_span();

    let mut pixels = vec![0u8; elevations.len() * 4];
    pixels
        .par_chunks_exact_mut(4)
        .enumerate()
        .for_each(|(i, px)| {
            let e = elevations[i];
            if is_no_data(e) {
                px.copy_from_slice(&[0, 0, 0, 0]);
                return;
            }

            let gray = if span > 0.0 {
                (((e - min) / span) * 255.0).clamp(0.0, 255.0) as u8
            } else {
                0
            };
            let mut rgba = [gray, gray, gray, 255];

            if mask.is_some_and(|m| m[i].is_line()) {
                rgba[0] = rgba[0].saturating_add(LINE_TINT);
                rgba[1] = rgba[1].saturating_add(LINE_TINT);
            }
            px.copy_from_slice(&rgba);
        });

    Ok(pixels)
}

/// Create an RGBA PNG from raw pixel bytes (4 per pixel, row-major).
pub fn create_png(pixels: &[u8], width: usize, height: usize) -> ExportResult<Vec<u8>> {
    if width == 0 || height == 0 {
        return Err(ExportError::EmptyImage { width, height });
    }
    if pixels.len() != width * height * 4 {
        return Err(ExportError::BufferSize {
            size: width,
            expected: width * height * 4,
            actual: pixels.len(),
        });
    }

    let mut png = Vec::new();

    // PNG signature
    png.extend_from_slice(&[137, 80, 78, 71, 13, 10, 26, 10]);

    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&(width as u32).to_be_bytes());
    ihdr.extend_from_slice(&(height as u32).to_be_bytes());
    ihdr.push(8); // bit depth
    ihdr.push(6); // color type (RGBA)
    ihdr.push(0); // compression method
    ihdr.push(0); // filter method
    ihdr.push(0); // interlace method
    write_chunk(&mut png, b"IHDR", &ihdr);

    let idat = deflate_idat_rgba(pixels, width, height)?;
    write_chunk(&mut png, b"IDAT", &idat);

    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// Encode and write a PNG, creating parent directories as needed.
pub fn write_png(
    path: impl AsRef<Path>,
    pixels: &[u8],
    width: usize,
    height: usize,
) -> ExportResult<()> {
    let png = create_png(pixels, width, height)?;
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, png)?;
    Ok(())
}

fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// Prefix every scanline with filter byte 0 and zlib-compress.
fn deflate_idat_rgba(pixels: &[u8], width: usize, height: usize) -> std::io::Result<Vec<u8>> {
    let stride = width * 4;
    let mut filtered = vec![0u8; height * (stride + 1)];
    filtered
        .par_chunks_exact_mut(stride + 1)
        .zip(pixels.par_chunks_exact(stride))
        .for_each(|(dst, row)| {
            dst[0] = 0; // filter type: none
            dst[1..].copy_from_slice(row);
        });

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder.write_all(&filtered)?;
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::NO_DATA;
    use std::io::Read;
    use std::time::Duration;

    fn stats(min: f64, max: f64) -> RasterStats {
        RasterStats {
            min_elevation: Some(min),
            max_elevation: Some(max),
            no_data_pixels: 0,
            columns: 2,
            workers: 1,
            failed_columns: 0,
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn test_heightmap_value() {
        assert_eq!(heightmap_value(0.0), 0);
        assert_eq!(heightmap_value(0.5), 32768);
        assert_eq!(heightmap_value(1.0), 65535);
        assert_eq!(heightmap_value(NO_DATA), 65535);
        assert_eq!(heightmap_value(-0.25), 0);
    }

    #[test]
    fn test_heightmap_byte_order() {
        // 0.25 * 65536 = 16384 = 0x4000
        let pixels = encode_heightmap_rgba(&[0.25, 0.0, 1.0, NO_DATA], 2).unwrap();
        assert_eq!(&pixels[0..4], &[0x00, 0x40, 255, 255]);
        assert_eq!(&pixels[4..8], &[0, 0, 255, 255]);
        assert_eq!(&pixels[8..12], &[0xff, 0xff, 255, 255]);
        assert_eq!(&pixels[12..16], &[0xff, 0xff, 255, 255]);
    }

    #[test]
    fn test_heightmap_wrong_length() {
        assert!(matches!(
            encode_heightmap_rgba(&[0.0; 3], 2),
            Err(ExportError::BufferSize { expected: 4, actual: 3, .. })
        ));
    }

    #[test]
    fn test_grayscale_preview() {
        let mask = [
            LineProximity::None,
            LineProximity::NearSegment,
            LineProximity::None,
            LineProximity::NearVertex,
        ];
        let pixels =
            encode_grayscale_rgba(&[0.2, 0.2, 0.6, NO_DATA], Some(&mask), 2, &stats(0.2, 0.6))
                .unwrap();
        assert_eq!(&pixels[0..4], &[0, 0, 0, 255]);
        assert_eq!(&pixels[4..8], &[50, 50, 0, 255]);
        assert_eq!(&pixels[8..12], &[255, 255, 255, 255]);
        assert_eq!(&pixels[12..16], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_create_png_structure() {
        let pixels = vec![10u8; 3 * 2 * 4];
        let png = create_png(&pixels, 3, 2).unwrap();

        assert_eq!(&png[0..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
        assert_eq!(&png[12..16], b"IHDR");
        assert_eq!(u32::from_be_bytes([png[16], png[17], png[18], png[19]]), 3);
        assert_eq!(u32::from_be_bytes([png[20], png[21], png[22], png[23]]), 2);
        assert_eq!(png[25], 6);
        assert_eq!(&png[png.len() - 8..png.len() - 4], b"IEND");

        // IDAT begins right after the 25-byte IHDR chunk.
        let idat_len = u32::from_be_bytes([png[33], png[34], png[35], png[36]]) as usize;
        assert_eq!(&png[37..41], b"IDAT");
        let mut decoder = flate2::read::ZlibDecoder::new(&png[41..41 + idat_len]);
        let mut raw = Vec::new();
        decoder.read_to_end(&mut raw).unwrap();
        assert_eq!(raw.len(), 2 * (1 + 3 * 4));
        assert_eq!(raw[0], 0);
        assert_eq!(raw[1], 10);
    }

    #[test]
    fn test_create_png_rejects_empty() {
        assert!(matches!(
            create_png(&[], 0, 4),
            Err(ExportError::EmptyImage { .. })
        ));
    }

    #[test]
    fn test_write_png_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("3").join("5.png");
        write_png(&path, &[0u8; 4], 1, 1).unwrap();
        assert!(path.exists());
    }
}

//! Image ingestion pipeline for uploaded catalog photos.
//!
//! Clients send images as base64 payloads, either bare or wrapped in a data
//! URL, optionally paired with the original filename. Each upload is
//! decoded, validated, normalized for EXIF orientation, bounded to
//! [`MAX_DIMENSION`] pixels, given a safe unique name, and written to the
//! flat upload directory. A failed upload is dropped by the caller; it never
//! fails the request that carried it.

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{Cursor, ErrorKind, Write};
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use serde::Deserialize;
use thiserror::Error;

/// Longest allowed edge for a stored image; larger uploads are downscaled.
/// Images already within the bound are never upscaled.
pub const MAX_DIMENSION: u32 = 1024;

/// Encode quality for re-saved JPEGs.
const JPEG_QUALITY: u8 = 85;

/// Formats stored as detected; everything else is coerced to PNG.
const PRESERVED_FORMATS: &[ImageFormat] = &[ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::Gif];

/// Upper bound on collision-suffix probing before giving up.
const MAX_COLLISION_ATTEMPTS: u32 = 1000;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("unrecognized or corrupt image: {0}")]
    InvalidImage(#[source] image::ImageError),

    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("failed to store image: {0}")]
    Io(#[from] std::io::Error),
}

/// Decode, normalize, and persist one uploaded image.
///
/// Returns the filename it was stored under. `prefix` names the owning
/// entity type and seeds the synthetic filename used when the client did
/// not supply one.
pub fn ingest(
    upload_dir: &Path,
    payload: &str,
    prefix: &str,
    original_filename: Option<&str>,
) -> Result<String, IngestError> {
    // A data URL carries "<media type>;base64," ahead of the payload.
    // Split on the first comma only; the payload itself never contains one.
    let encoded = match payload.split_once(',') {
        Some((_, rest)) => rest,
        None => payload,
    };
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD.decode(compact.as_bytes())?;

    let reader = ImageReader::new(Cursor::new(&bytes)).with_guessed_format()?;
    let format = reader.format();
    let mut decoder = reader.into_decoder().map_err(IngestError::InvalidImage)?;

    // Bake the EXIF orientation into the pixel data. Re-encoding below never
    // carries EXIF forward, so consumers that ignore the tag render correctly.
    let orientation = decoder.orientation().map_err(IngestError::InvalidImage)?;
    let mut img = DynamicImage::from_decoder(decoder).map_err(IngestError::InvalidImage)?;
    img.apply_orientation(orientation);

    if img.width() > MAX_DIMENSION || img.height() > MAX_DIMENSION {
        img = img.resize(MAX_DIMENSION, MAX_DIMENSION, FilterType::Lanczos3);
    }

    let save_format = match format {
        Some(f) if PRESERVED_FORMATS.contains(&f) => f,
        _ => ImageFormat::Png,
    };

    let filename = match original_filename.and_then(sanitize_filename) {
        Some(sanitized) => {
            if Path::new(&sanitized).extension().is_some() {
                sanitized
            } else {
                let ext = save_format.extensions_str().first().copied().unwrap_or("png");
                format!("{sanitized}.{ext}")
            }
        }
        None => format!("{}_{}.png", prefix, Utc::now().format("%Y%m%d_%H%M%S")),
    };

    fs::create_dir_all(upload_dir)?;
    let data = encode(&img, save_format)?;
    let (mut file, stored) = create_unique(upload_dir, &filename)?;
    file.write_all(&data)?;
    Ok(stored)
}

/// Reduce a client-supplied filename to a safe basename.
///
/// Directory components are discarded, characters outside
/// `[A-Za-z0-9_.\- ]` become `_`, and leading/trailing whitespace and dots
/// are trimmed. Returns `None` when nothing usable remains, which callers
/// treat as "no filename provided". Idempotent.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let replaced: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = replaced.trim_matches(|c: char| c.is_whitespace() || c == '.');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Exclusively create a file under `dir`, suffixing `_1`, `_2`, ... before
/// the extension until a free name is found. `create_new` makes the
/// check-and-claim atomic, so two concurrent uploads of the same name get
/// two distinct files instead of overwriting each other.
fn create_unique(dir: &Path, filename: &str) -> Result<(File, String), IngestError> {
    let (stem, ext) = match filename.rsplit_once('.') {
        Some((stem, ext)) => (stem, Some(ext)),
        None => (filename, None),
    };

    for attempt in 0..MAX_COLLISION_ATTEMPTS {
        let candidate = match (attempt, ext) {
            (0, _) => filename.to_string(),
            (n, Some(ext)) => format!("{stem}_{n}.{ext}"),
            (n, None) => format!("{stem}_{n}"),
        };
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dir.join(&candidate))
        {
            Ok(file) => return Ok((file, candidate)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(IngestError::Io(e)),
        }
    }

    Err(IngestError::Io(std::io::Error::new(
        ErrorKind::AlreadyExists,
        format!("no free name for {filename} after {MAX_COLLISION_ATTEMPTS} attempts"),
    )))
}

fn encode(img: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, IngestError> {
    let mut buf = Cursor::new(Vec::new());
    match format {
        ImageFormat::Jpeg => {
            // The JPEG encoder rejects alpha channels.
            let encoder = JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY);
            img.to_rgb8()
                .write_with_encoder(encoder)
                .map_err(IngestError::Encode)?;
        }
        other => img.write_to(&mut buf, other).map_err(IngestError::Encode)?,
    }
    Ok(buf.into_inner())
}

/// Delete a stored image file. Callers log a failure and move on: a file
/// that cannot be removed becomes an orphan, never a failed request.
pub fn remove(upload_dir: &Path, filename: &str) -> std::io::Result<()> {
    let Some(safe) = sanitize_filename(filename) else {
        return Ok(());
    };
    fs::remove_file(upload_dir.join(safe))
}

/// One entry in an inbound `images` list.
///
/// Inline uploads come as `{data, filename}` objects or as bare data-URL
/// strings; both forms are supported indefinitely. Any other bare string
/// names an already-stored image.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(untagged)]
pub enum ImageEntry {
    Upload {
        data: String,
        #[serde(default)]
        filename: Option<String>,
    },
    Name(String),
}

/// Result of merging an entity's stored image list with inbound entries.
#[derive(Debug, Default)]
pub struct ResolvedImages {
    pub filenames: Vec<String>,
    /// Inline uploads dropped because they failed to decode or store.
    pub skipped: usize,
}

/// Merge inbound image entries into an entity's image list.
///
/// Inline uploads run through [`ingest`]; failures are logged and counted,
/// not propagated. Bare filenames are kept, appended only when not already
/// present. Entries named in `removed` are dropped from the list and their
/// files deleted best-effort.
pub fn resolve_images(
    upload_dir: &Path,
    existing: Vec<String>,
    entries: Vec<ImageEntry>,
    removed: &[String],
    prefix: &str,
) -> ResolvedImages {
    let mut filenames = existing;
    let mut skipped = 0;

    for entry in entries {
        let (data, original) = match entry {
            ImageEntry::Upload { data, filename } => (data, filename),
            ImageEntry::Name(s) if s.starts_with("data:") => (s, None),
            ImageEntry::Name(s) => {
                if !s.is_empty() && !filenames.contains(&s) {
                    filenames.push(s);
                }
                continue;
            }
        };
        match ingest(upload_dir, &data, prefix, original.as_deref()) {
            Ok(stored) => filenames.push(stored),
            Err(e) => {
                tracing::warn!(error = %e, "dropping image upload");
                skipped += 1;
            }
        }
    }

    if !removed.is_empty() {
        let removed: HashSet<&String> = removed.iter().collect();
        filenames.retain(|name| {
            if !removed.contains(name) {
                return true;
            }
            if let Err(e) = remove(upload_dir, name) {
                tracing::warn!(file = %name, error = %e, "failed to delete removed image file");
            }
            false
        });
    }

    ResolvedImages { filenames, skipped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::metadata::Orientation;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn png_base64(width: u32, height: u32) -> String {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 40, 40]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        STANDARD.encode(buf.into_inner())
    }

    /// A JPEG with a minimal EXIF APP1 segment carrying the given
    /// orientation, spliced in right after the SOI marker.
    fn jpeg_with_orientation(width: u32, height: u32, orientation: u16) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([10, 80, 160]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, ImageFormat::Jpeg)
            .unwrap();
        let jpeg = buf.into_inner();

        let mut app1 = Vec::new();
        app1.extend_from_slice(b"Exif\0\0");
        app1.extend_from_slice(b"II*\0"); // little-endian TIFF header
        app1.extend_from_slice(&8u32.to_le_bytes()); // IFD0 offset
        app1.extend_from_slice(&1u16.to_le_bytes()); // one entry
        app1.extend_from_slice(&0x0112u16.to_le_bytes()); // Orientation tag
        app1.extend_from_slice(&3u16.to_le_bytes()); // type SHORT
        app1.extend_from_slice(&1u32.to_le_bytes()); // count
        app1.extend_from_slice(&orientation.to_le_bytes());
        app1.extend_from_slice(&0u16.to_le_bytes()); // value padding
        app1.extend_from_slice(&0u32.to_le_bytes()); // no next IFD

        let mut out = Vec::new();
        out.extend_from_slice(&jpeg[..2]); // SOI
        out.extend_from_slice(&[0xFF, 0xE1]);
        out.extend_from_slice(&((app1.len() as u16 + 2).to_be_bytes()));
        out.extend_from_slice(&app1);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    #[test]
    fn test_sanitize_basic_names_unchanged() {
        assert_eq!(
            sanitize_filename("my_image.jpg"),
            Some("my_image.jpg".to_string())
        );
        assert_eq!(
            sanitize_filename("normal-image_123.png"),
            Some("normal-image_123.png".to_string())
        );
        assert_eq!(
            sanitize_filename("test image with spaces.png"),
            Some("test image with spaces.png".to_string())
        );
    }

    #[test]
    fn test_sanitize_strips_path_components() {
        assert_eq!(
            sanitize_filename("../../../etc/passwd"),
            Some("passwd".to_string())
        );
        assert_eq!(sanitize_filename("../image.jpg"), Some("image.jpg".to_string()));
        assert_eq!(
            sanitize_filename("..\\..\\evil.jpg"),
            Some("evil.jpg".to_string())
        );
        for input in ["../../../etc/passwd", "a/b\\c.png", "/absolute/path.gif"] {
            let out = sanitize_filename(input).unwrap();
            assert!(!out.contains('/'), "{out}");
            assert!(!out.contains('\\'), "{out}");
        }
    }

    #[test]
    fn test_sanitize_replaces_special_characters() {
        assert_eq!(
            sanitize_filename("image@#$%.jpg"),
            Some("image____.jpg".to_string())
        );
    }

    #[test]
    fn test_sanitize_empty_inputs() {
        assert_eq!(sanitize_filename(""), None);
        assert_eq!(sanitize_filename("   ...   "), None);
        assert_eq!(sanitize_filename("a/b/"), None);
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        for input in [
            "my_image.jpg",
            "../../../etc/passwd",
            "image@#$%.jpg",
            " padded.png ",
            "..dots..",
        ] {
            if let Some(once) = sanitize_filename(input) {
                assert_eq!(sanitize_filename(&once), Some(once.clone()));
            }
        }
    }

    #[test]
    fn test_ingest_synthetic_filename() {
        let dir = TempDir::new().unwrap();
        let stored = ingest(dir.path(), &png_base64(10, 10), "ingredient", None).unwrap();
        assert!(stored.starts_with("ingredient_"));
        assert!(stored.ends_with(".png"));
        assert!(dir.path().join(&stored).exists());
    }

    #[test]
    fn test_ingest_strips_data_url_prefix() {
        let dir = TempDir::new().unwrap();
        let payload = format!("data:image/png;base64,{}", png_base64(10, 10));
        let stored = ingest(dir.path(), &payload, "recipe", None).unwrap();
        assert!(stored.starts_with("recipe_"));
    }

    #[test]
    fn test_ingest_rejects_bad_base64() {
        let dir = TempDir::new().unwrap();
        let err = ingest(dir.path(), "data:image/png;base64,@@@@", "recipe", None).unwrap_err();
        assert!(matches!(err, IngestError::Decode(_)));
    }

    #[test]
    fn test_ingest_rejects_non_image_payload() {
        let dir = TempDir::new().unwrap();
        let payload = STANDARD.encode(b"definitely not pixels");
        let err = ingest(dir.path(), &payload, "recipe", None).unwrap_err();
        assert!(matches!(err, IngestError::InvalidImage(_)));
    }

    #[test]
    fn test_collision_suffixes_are_monotonic() {
        let dir = TempDir::new().unwrap();
        let payload = png_base64(10, 10);
        let mut stored = Vec::new();
        for _ in 0..3 {
            stored.push(ingest(dir.path(), &payload, "recipe", Some("photo.png")).unwrap());
        }
        assert_eq!(stored, vec!["photo.png", "photo_1.png", "photo_2.png"]);
    }

    #[test]
    fn test_missing_extension_derived_from_format() {
        let dir = TempDir::new().unwrap();
        let stored = ingest(dir.path(), &png_base64(10, 10), "recipe", Some("snapshot")).unwrap();
        assert_eq!(stored, "snapshot.png");
    }

    #[test]
    fn test_unusable_filename_falls_back_to_synthetic() {
        let dir = TempDir::new().unwrap();
        let stored = ingest(dir.path(), &png_base64(10, 10), "recipe", Some("   ...   ")).unwrap();
        assert!(stored.starts_with("recipe_"));
        assert!(stored.ends_with(".png"));
    }

    #[test]
    fn test_resize_bounds_longest_edge() {
        let dir = TempDir::new().unwrap();
        let stored = ingest(dir.path(), &png_base64(2000, 500), "recipe", Some("wide.png")).unwrap();
        let img = image::open(dir.path().join(stored)).unwrap();
        assert_eq!((img.width(), img.height()), (1024, 256));
    }

    #[test]
    fn test_small_images_are_not_upscaled() {
        let dir = TempDir::new().unwrap();
        let stored = ingest(dir.path(), &png_base64(100, 50), "recipe", Some("small.png")).unwrap();
        let img = image::open(dir.path().join(stored)).unwrap();
        assert_eq!((img.width(), img.height()), (100, 50));
    }

    #[test]
    fn test_exif_orientation_is_baked_in() {
        let dir = TempDir::new().unwrap();
        // Orientation 6: rotate 90 degrees clockwise to display.
        let payload = STANDARD.encode(jpeg_with_orientation(200, 100, 6));
        let stored = ingest(dir.path(), &payload, "recipe", Some("oriented.jpg")).unwrap();

        let mut decoder = ImageReader::open(dir.path().join(&stored))
            .unwrap()
            .into_decoder()
            .unwrap();
        assert_eq!(decoder.orientation().unwrap(), Orientation::NoTransforms);
        let img = DynamicImage::from_decoder(decoder).unwrap();
        assert_eq!((img.width(), img.height()), (100, 200));
    }

    #[test]
    fn test_jpeg_format_is_preserved() {
        let dir = TempDir::new().unwrap();
        let payload = STANDARD.encode(jpeg_with_orientation(40, 30, 1));
        let stored = ingest(dir.path(), &payload, "recipe", Some("shot.jpg")).unwrap();
        let reader = ImageReader::open(dir.path().join(&stored))
            .unwrap()
            .with_guessed_format()
            .unwrap();
        assert_eq!(reader.format(), Some(ImageFormat::Jpeg));
    }

    #[test]
    fn test_bare_string_and_object_forms_are_equivalent() {
        let dir = TempDir::new().unwrap();
        let payload = format!("data:image/png;base64,{}", png_base64(10, 10));
        let resolved = resolve_images(
            dir.path(),
            Vec::new(),
            vec![
                ImageEntry::Name(payload.clone()),
                ImageEntry::Upload {
                    data: payload,
                    filename: None,
                },
            ],
            &[],
            "recipe",
        );
        assert_eq!(resolved.skipped, 0);
        assert_eq!(resolved.filenames.len(), 2);
        for name in &resolved.filenames {
            assert!(name.starts_with("recipe_"), "{name}");
            assert!(dir.path().join(name).exists());
        }
    }

    #[test]
    fn test_corrupt_upload_is_dropped_not_fatal() {
        let dir = TempDir::new().unwrap();
        let resolved = resolve_images(
            dir.path(),
            vec!["keep.png".to_string()],
            vec![ImageEntry::Upload {
                data: "data:image/png;base64,@@@@".to_string(),
                filename: None,
            }],
            &[],
            "recipe",
        );
        assert_eq!(resolved.skipped, 1);
        assert_eq!(resolved.filenames, vec!["keep.png".to_string()]);
    }

    #[test]
    fn test_existing_filename_is_not_duplicated() {
        let dir = TempDir::new().unwrap();
        let resolved = resolve_images(
            dir.path(),
            vec!["a.png".to_string()],
            vec![
                ImageEntry::Name("a.png".to_string()),
                ImageEntry::Name("b.png".to_string()),
            ],
            &[],
            "recipe",
        );
        assert_eq!(
            resolved.filenames,
            vec!["a.png".to_string(), "b.png".to_string()]
        );
    }

    #[test]
    fn test_removed_images_leave_list_even_if_file_is_gone() {
        let dir = TempDir::new().unwrap();
        let resolved = resolve_images(
            dir.path(),
            vec!["a.png".to_string(), "b.png".to_string()],
            Vec::new(),
            &["a.png".to_string()],
            "recipe",
        );
        assert_eq!(resolved.filenames, vec!["b.png".to_string()]);
    }

    #[test]
    fn test_removed_images_delete_the_file() {
        let dir = TempDir::new().unwrap();
        let stored = ingest(dir.path(), &png_base64(10, 10), "recipe", Some("gone.png")).unwrap();
        assert!(dir.path().join(&stored).exists());
        let resolved = resolve_images(
            dir.path(),
            vec![stored.clone()],
            Vec::new(),
            &[stored.clone()],
            "recipe",
        );
        assert!(resolved.filenames.is_empty());
        assert!(!dir.path().join(&stored).exists());
    }
}

//! EXIF metadata extraction
//!
//! Reads the embedded tag directory of a local image and derives an
//! [`ExifSummary`]. Extraction never fails: unreadable or missing metadata
//! yields the default (empty) summary.

pub mod coordinates;

pub use coordinates::dms_to_decimal;

use crate::models::{ExifSummary, GpsCoordinates};
use crate::Result;
use exif::{Context, Exif, Field, In, Rational, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Extract the metadata summary of a local image file.
pub fn extract_exif_summary(path: &Path) -> ExifSummary {
    match read_exif(path) {
        Ok(exif) => summarize(&exif),
        Err(e) => {
            tracing::debug!("No readable EXIF in {}: {}", path.display(), e);
            ExifSummary::default()
        }
    }
}

fn read_exif(path: &Path) -> Result<Exif> {
    let mut reader = BufReader::new(File::open(path)?);
    Ok(Reader::new().read_from_container(&mut reader)?)
}

/// Build a summary from an already parsed tag directory.
pub fn summarize(exif: &Exif) -> ExifSummary {
    let mut summary = ExifSummary::default();
    if exif.fields().next().is_none() {
        return summary;
    }
    summary.has_exif = true;

    for field in exif.fields() {
        let name = tag_name(field);
        let lowered = name.to_ascii_lowercase();
        if lowered.contains("thumbnail") || lowered.contains("makernote") {
            continue;
        }
        summary.all_tags.insert(name, field_text(field, exif));
    }

    summary.camera_make = primary_text(exif, Tag::Make);
    summary.camera_model = primary_text(exif, Tag::Model);
    summary.datetime = primary_text(exif, Tag::DateTime);
    summary.software = primary_text(exif, Tag::Software);
    summary.orientation = primary_text(exif, Tag::Orientation);

    if let Some(gps) = gps_coordinates(exif) {
        tracing::info!(
            "Found GPS coordinates in EXIF: {}, {}",
            gps.latitude,
            gps.longitude
        );
        summary.has_gps = true;
        summary.gps_coordinates = Some(gps);
    }

    summary
}

fn gps_coordinates(exif: &Exif) -> Option<GpsCoordinates> {
    let (Some(lat), Some(lat_ref), Some(lon), Some(lon_ref)) = (
        rationals(exif, Tag::GPSLatitude),
        primary_text(exif, Tag::GPSLatitudeRef),
        rationals(exif, Tag::GPSLongitude),
        primary_text(exif, Tag::GPSLongitudeRef),
    ) else {
        tracing::debug!("No complete GPS data in EXIF");
        return None;
    };

    let (Some(latitude), Some(longitude)) = (
        dms_to_decimal(lat, Some(&lat_ref)),
        dms_to_decimal(lon, Some(&lon_ref)),
    ) else {
        tracing::warn!("GPS tags present but not convertible (zero denominator or bad arity)");
        return None;
    };

    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        tracing::warn!(
            "GPS coordinates out of range: {}, {}",
            latitude,
            longitude
        );
        return None;
    }

    Some(GpsCoordinates::new(latitude, longitude))
}

fn rationals(exif: &Exif, tag: Tag) -> Option<&[Rational]> {
    match &exif.get_field(tag, In::PRIMARY)?.value {
        Value::Rational(values) => Some(values.as_slice()),
        _ => None,
    }
}

fn primary_text(exif: &Exif, tag: Tag) -> Option<String> {
    exif.get_field(tag, In::PRIMARY)
        .map(|field| field_text(field, exif))
        .filter(|text| !text.is_empty())
}

/// `<IFD> <Tag>` naming, e.g. `Image Make` or `GPS GPSLatitude`.
fn tag_name(field: &Field) -> String {
    let ifd = if field.ifd_num == In::THUMBNAIL {
        "Thumbnail"
    } else {
        match field.tag.context() {
            Context::Exif => "EXIF",
            Context::Gps => "GPS",
            Context::Interop => "Interoperability",
            _ => "Image",
        }
    };
    format!("{} {}", ifd, field.tag)
}

fn field_text(field: &Field, exif: &Exif) -> String {
    match &field.value {
        Value::Ascii(parts) => parts
            .iter()
            .map(|part| {
                String::from_utf8_lossy(part)
                    .trim_end_matches('\0')
                    .trim()
                    .to_string()
            })
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        _ => field.display_value().with_unit(exif).to_string(),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use exif::experimental::Writer;
    use exif::{Field, In, Rational, Tag, Value};
    use std::io::Cursor;

    fn ascii(tag: Tag, text: &str) -> Field {
        Field {
            tag,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![text.as_bytes().to_vec()]),
        }
    }

    fn dms(tag: Tag, parts: [(u32, u32); 3]) -> Field {
        Field {
            tag,
            ifd_num: In::PRIMARY,
            value: Value::Rational(
                parts
                    .iter()
                    .map(|&(num, denom)| Rational { num, denom })
                    .collect(),
            ),
        }
    }

    /// Minimal JPEG (SOI, APP1/Exif, EOI) carrying the given fields.
    pub fn jpeg_with_fields(fields: &[Field]) -> Vec<u8> {
        let mut writer = Writer::new();
        for field in fields {
            writer.push_field(field);
        }
        let mut tiff = Cursor::new(Vec::new());
        writer.write(&mut tiff, false).unwrap();
        let tiff = tiff.into_inner();

        let segment_len = u16::try_from(tiff.len() + 8).unwrap();
        let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
        jpeg.extend_from_slice(&segment_len.to_be_bytes());
        jpeg.extend_from_slice(b"Exif\0\0");
        jpeg.extend_from_slice(&tiff);
        jpeg.extend_from_slice(&[0xFF, 0xD9]);
        jpeg
    }

    /// Camera tags plus GPS at 40.7484 N, 73.9857 W.
    pub fn jpeg_with_gps(lat_seconds: (u32, u32)) -> Vec<u8> {
        let fields = vec![
            ascii(Tag::Make, "Canon"),
            ascii(Tag::Model, "EOS 5D"),
            ascii(Tag::Software, "Firmware 1.0"),
            ascii(Tag::DateTime, "2024:05:01 12:30:00"),
            ascii(Tag::GPSLatitudeRef, "N"),
            dms(Tag::GPSLatitude, [(40, 1), (44, 1), lat_seconds]),
            ascii(Tag::GPSLongitudeRef, "W"),
            dms(Tag::GPSLongitude, [(73, 1), (59, 1), (852, 100)]),
        ];
        jpeg_with_fields(&fields)
    }

    pub fn jpeg_with_camera_only() -> Vec<u8> {
        jpeg_with_fields(&[ascii(Tag::Make, "Nikon"), ascii(Tag::Model, "D850")])
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use tempfile::TempDir;

    fn write_temp(dir: &TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_extracts_gps_and_camera_fields() {
        let dir = TempDir::new().unwrap();
        let path = write_temp(&dir, "gps.jpg", &jpeg_with_gps((5424, 100)));

        let summary = extract_exif_summary(&path);

        assert!(summary.has_exif);
        assert!(summary.has_gps);
        let gps = summary.gps_coordinates.as_ref().unwrap();
        assert!((gps.latitude - 40.7484).abs() < 1e-6);
        assert!((gps.longitude + 73.9857).abs() < 1e-6);
        assert!(gps.maps_url.contains("40.7484"));
        assert!(gps.maps_url.contains("-73.9857"));

        assert_eq!(summary.camera_make.as_deref(), Some("Canon"));
        assert_eq!(summary.camera_model.as_deref(), Some("EOS 5D"));
        assert_eq!(summary.software.as_deref(), Some("Firmware 1.0"));
        assert_eq!(summary.datetime.as_deref(), Some("2024:05:01 12:30:00"));
        assert_eq!(summary.all_tags.get("Image Make").map(String::as_str), Some("Canon"));
        assert!(summary.all_tags.contains_key("GPS GPSLatitude"));
    }

    #[test]
    fn test_zero_denominator_degrades_gps() {
        let dir = TempDir::new().unwrap();
        let path = write_temp(&dir, "bad.jpg", &jpeg_with_gps((5424, 0)));

        let summary = extract_exif_summary(&path);

        assert!(summary.has_exif);
        assert!(!summary.has_gps);
        assert!(summary.gps_coordinates.is_none());
    }

    #[test]
    fn test_camera_only_has_no_gps() {
        let dir = TempDir::new().unwrap();
        let path = write_temp(&dir, "camera.jpg", &jpeg_with_camera_only());

        let summary = extract_exif_summary(&path);

        assert!(summary.has_exif);
        assert!(!summary.has_gps);
        assert_eq!(summary.camera_make.as_deref(), Some("Nikon"));
        assert!(summary.orientation.is_none());
    }

    #[test]
    fn test_file_without_metadata_yields_default() {
        let dir = TempDir::new().unwrap();
        let path = write_temp(&dir, "plain.png", &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A]);

        let summary = extract_exif_summary(&path);

        assert_eq!(summary, ExifSummary::default());
        assert!(summary.all_tags.is_empty());
    }

    #[test]
    fn test_missing_file_yields_default() {
        let summary = extract_exif_summary(Path::new("/definitely/not/here.jpg"));
        assert!(!summary.has_exif);
        assert!(!summary.has_gps);
    }

    #[test]
    fn test_tag_names_carry_ifd_prefix() {
        let field = |tag, ifd_num| Field {
            tag,
            ifd_num,
            value: Value::Ascii(vec![]),
        };
        assert_eq!(tag_name(&field(Tag::Make, In::PRIMARY)), "Image Make");
        assert_eq!(tag_name(&field(Tag::Make, In::THUMBNAIL)), "Thumbnail Make");
        assert_eq!(
            tag_name(&field(Tag::GPSLatitude, In::PRIMARY)),
            "GPS GPSLatitude"
        );
        assert_eq!(
            tag_name(&field(Tag::DateTimeOriginal, In::PRIMARY)),
            "EXIF DateTimeOriginal"
        );
    }

    #[test]
    fn test_makernote_tags_are_skipped() {
        let fields = vec![
            Field {
                tag: Tag::Make,
                ifd_num: In::PRIMARY,
                value: Value::Ascii(vec![b"Sony".to_vec()]),
            },
            Field {
                tag: Tag::MakerNote,
                ifd_num: In::PRIMARY,
                value: Value::Undefined(vec![1, 2, 3, 4], 0),
            },
        ];
        let dir = TempDir::new().unwrap();
        let path = write_temp(&dir, "notes.jpg", &jpeg_with_fields(&fields));

        let summary = extract_exif_summary(&path);

        assert!(summary.has_exif);
        assert!(summary.all_tags.contains_key("Image Make"));
        assert!(summary
            .all_tags
            .keys()
            .all(|k| !k.to_ascii_lowercase().contains("makernote")
                && !k.to_ascii_lowercase().contains("thumbnail")));
    }
}

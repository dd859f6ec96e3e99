//! Normalized bounding-box text records.
//!
//! One record per line: `<class_id> <center_x> <center_y> <width> <height>`,
//! the four floats normalized by the image dimensions to `[0, 1]` and written
//! with exactly six decimal places. Conversion is lossy only up to that
//! rounding.

use crate::constants::{EXPORT_DECIMALS, RECORD_FIELDS};
use crate::error::{AnnotationError, Result, ensure_finite};
use crate::model::{BoundingBox, ClassId, Detection};

/// A record decoded back into natural pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedRecord {
    pub class_id: ClassId,
    pub bbox: BoundingBox,
}

/// Encode one detection as a normalized text record.
///
/// Fails with a validation error if the image dimensions are not positive
/// or a coordinate is not finite.
pub fn encode(detection: &Detection, image_width: f64, image_height: f64) -> Result<String> {
    let bbox = &detection.bbox;
    encode_corners(
        detection.class_id,
        [bbox.x1(), bbox.y1(), bbox.x2(), bbox.y2()],
        image_width,
        image_height,
    )
}

/// Encode detections one per line.
///
/// Fails with an empty input error before producing anything if the list is
/// empty; any failing record aborts the whole payload.
pub fn encode_all(detections: &[Detection], image_width: f64, image_height: f64) -> Result<String> {
    if detections.is_empty() {
        return Err(AnnotationError::empty_input("no detections"));
    }

    let lines = detections
        .iter()
        .map(|d| encode(d, image_width, image_height))
        .collect::<Result<Vec<_>>>()?;

    log::debug!(
        "Encoded {} detections for {}x{} image",
        lines.len(),
        image_width,
        image_height
    );
    Ok(lines.join("\n"))
}

/// Encode raw corner coordinates `[x1, y1, x2, y2]` under `class_id`.
pub fn encode_corners(
    class_id: ClassId,
    corners: [f64; 4],
    image_width: f64,
    image_height: f64,
) -> Result<String> {
    let (width, height) = positive_dimensions(image_width, image_height)?;
    let [x1, y1, x2, y2] = corners;
    let x1 = ensure_finite("x1", x1)?;
    let y1 = ensure_finite("y1", y1)?;
    let x2 = ensure_finite("x2", x2)?;
    let y2 = ensure_finite("y2", y2)?;

    let (x1, x2) = (x1.min(x2), x1.max(x2));
    let (y1, y2) = (y1.min(y2), y1.max(y2));

    let cx = unit((x1 + x2) / 2.0 / width);
    let cy = unit((y1 + y2) / 2.0 / height);
    let nw = unit((x2 - x1) / width);
    let nh = unit((y2 - y1) / height);

    Ok(format!(
        "{} {:.prec$} {:.prec$} {:.prec$} {:.prec$}",
        class_id,
        cx,
        cy,
        nw,
        nh,
        prec = EXPORT_DECIMALS
    ))
}

/// Decode one normalized text record into natural pixel space.
///
/// The line must hold exactly five whitespace-separated tokens. Zero image
/// dimensions are reported as empty input; other bad values as validation
/// errors.
pub fn decode(line: &str, image_width: f64, image_height: f64) -> Result<DecodedRecord> {
    let (width, height) = known_dimensions(image_width, image_height)?;
    decode_line(line, width, height)
}

/// Decode a multi-line payload, skipping blank lines.
///
/// Errors name the failing 1-based line number.
pub fn decode_all(text: &str, image_width: f64, image_height: f64) -> Result<Vec<DecodedRecord>> {
    let (width, height) = known_dimensions(image_width, image_height)?;

    let mut records = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record = decode_line(line, width, height).map_err(|e| match e {
            AnnotationError::Validation { message } => {
                AnnotationError::validation(format!("line {}: {}", idx + 1, message))
            }
            other => other,
        })?;
        records.push(record);
    }

    log::debug!("Decoded {} records", records.len());
    Ok(records)
}

fn decode_line(line: &str, width: f64, height: f64) -> Result<DecodedRecord> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != RECORD_FIELDS {
        return Err(AnnotationError::validation(format!(
            "expected {} fields, found {}",
            RECORD_FIELDS,
            tokens.len()
        )));
    }

    let class_id: ClassId = tokens[0].parse().map_err(|_| {
        AnnotationError::validation(format!("invalid class id '{}'", tokens[0]))
    })?;
    let cx = parse_field("center_x", tokens[1])?;
    let cy = parse_field("center_y", tokens[2])?;
    let nw = parse_field("width", tokens[3])?;
    let nh = parse_field("height", tokens[4])?;

    let bbox = BoundingBox::from_corners(
        (cx - nw / 2.0) * width,
        (cy - nh / 2.0) * height,
        (cx + nw / 2.0) * width,
        (cy + nh / 2.0) * height,
    )?;

    Ok(DecodedRecord { class_id, bbox })
}

fn parse_field(name: &str, token: &str) -> Result<f64> {
    let value: f64 = token
        .parse()
        .map_err(|_| AnnotationError::validation(format!("invalid {name} '{token}'")))?;
    ensure_finite(name, value)
}

fn positive_dimensions(width: f64, height: f64) -> Result<(f64, f64)> {
    if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
        Ok((width, height))
    } else {
        Err(AnnotationError::validation(format!(
            "image dimensions must be positive, got {width}x{height}"
        )))
    }
}

fn known_dimensions(width: f64, height: f64) -> Result<(f64, f64)> {
    if width == 0.0 || height == 0.0 {
        return Err(AnnotationError::empty_input(
            "image dimensions unknown, cannot decode",
        ));
    }
    positive_dimensions(width, height)
}

/// Clamp into `[0, 1]`, folding `-0.0` into `0.0` so it never prints a sign.
fn unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0) + 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_clamps_and_drops_sign() {
        assert_eq!(unit(1.5), 1.0);
        assert_eq!(unit(-0.2), 0.0);
        assert_eq!(format!("{:.6}", unit(-0.0)), "0.000000");
    }

    #[test]
    fn test_decode_line() {
        let record = decode("0 0.5 0.5 0.2 0.3", 100.0, 100.0).unwrap();
        assert_eq!(record.class_id, 0);
        assert!((record.bbox.x1() - 40.0).abs() < 1e-9);
        assert!((record.bbox.y1() - 35.0).abs() < 1e-9);
        assert!((record.bbox.width() - 20.0).abs() < 1e-9);
        assert!((record.bbox.height() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_known_dimensions() {
        assert!(known_dimensions(0.0, 10.0).unwrap_err().is_empty_input());
        assert!(known_dimensions(-5.0, 10.0).unwrap_err().is_validation());
        assert_eq!(known_dimensions(4.0, 3.0).unwrap(), (4.0, 3.0));
    }
}

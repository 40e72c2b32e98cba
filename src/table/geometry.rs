//! Text encoding of ROI outlines.
//!
//! An outline is written as `"x1 y1;x2 y2;...;xn yn"`: points separated by
//! `;`, coordinates separated by whitespace.

use crate::error::LabelSyncError;
use crate::model::Point;

const POINT_SEPARATOR: char = ';';

/// Parses an encoded outline.
///
/// Whitespace around points is ignored, as are empty segments (so a
/// trailing `;` is accepted).
///
/// # Errors
/// Returns [`LabelSyncError::MalformedRow`] for `row` if a point does not
/// have exactly two finite numeric coordinates, or if there are no points.
///
/// # Example
/// ```
/// use labelsync::table::parse_points;
///
/// let points = parse_points(2, "10 20;30 40;50 60").unwrap();
/// assert_eq!(points.len(), 3);
/// assert_eq!((points[1].x, points[1].y), (30.0, 40.0));
/// ```
pub fn parse_points(row: usize, text: &str) -> Result<Vec<Point>, LabelSyncError> {
    let points = text
        .split(POINT_SEPARATOR)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| parse_point(row, segment))
        .collect::<Result<Vec<_>, _>>()?;

    if points.is_empty() {
        return Err(malformed(row, "points column holds no points".to_string()));
    }
    Ok(points)
}

fn parse_point(row: usize, segment: &str) -> Result<Point, LabelSyncError> {
    let tokens: Vec<&str> = segment.split_whitespace().collect();
    let [x, y] = tokens.as_slice() else {
        return Err(malformed(
            row,
            format!(
                "point '{}' has {} coordinate(s), expected 2",
                segment,
                tokens.len()
            ),
        ));
    };
    Ok(Point::new(coordinate(row, x)?, coordinate(row, y)?))
}

fn coordinate(row: usize, token: &str) -> Result<f64, LabelSyncError> {
    match token.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(malformed(row, format!("'{}' is not a finite number", token))),
    }
}

/// Encodes an outline; the inverse of [`parse_points`].
pub fn format_points(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{} {}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(";")
}

fn malformed(row: usize, message: String) -> LabelSyncError {
    LabelSyncError::MalformedRow { row, message }
}

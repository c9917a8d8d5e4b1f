//! Fixed-point coordinates, timestamps and bounding boxes.
//!
//! OSM coordinates are stored as 32-bit signed integers in units of 1e-7
//! degrees. This gives roughly centimeter resolution while keeping a
//! node's location at 8 bytes, which matters because millions of them end
//! up packed into arena buffers.

use chrono::{NaiveDateTime, TimeZone, Utc};

use crate::error::{OsmarenaError, Result};

/// Number of fixed-point units per degree: one unit is 1e-7 degrees.
pub const COORDINATE_PRECISION: i32 = 10_000_000;

/// Sentinel coordinate meaning "not set".
const UNDEFINED_COORDINATE: i32 = i32::MIN;

/// A geographic location as a pair of fixed-point coordinates.
///
/// `x` is the longitude and `y` the latitude, both in units of 1e-7
/// degrees. The pair `(i32::MIN, i32::MIN)` is the undefined sentinel;
/// a freshly built way node carries it until a location cache fills it in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    x: i32,
    y: i32,
}

impl Location {
    /// Creates a location from raw fixed-point coordinates.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The undefined sentinel location.
    pub const fn undefined() -> Self {
        Self {
            x: UNDEFINED_COORDINATE,
            y: UNDEFINED_COORDINATE,
        }
    }

    /// Creates a location from degrees, rounding to the fixed-point grid.
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_degrees(lon: f64, lat: f64) -> Self {
        Self {
            x: (lon * f64::from(COORDINATE_PRECISION)).round() as i32,
            y: (lat * f64::from(COORDINATE_PRECISION)).round() as i32,
        }
    }

    /// Raw fixed-point longitude.
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Raw fixed-point latitude.
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Returns true unless this is the undefined sentinel.
    pub const fn is_defined(&self) -> bool {
        self.x != UNDEFINED_COORDINATE || self.y != UNDEFINED_COORDINATE
    }

    /// A defined location inside the valid lon/lat range.
    pub fn is_valid(&self) -> bool {
        const MAX_LON: i32 = 180 * COORDINATE_PRECISION;
        const MAX_LAT: i32 = 90 * COORDINATE_PRECISION;
        self.is_defined()
            && (-MAX_LON..=MAX_LON).contains(&self.x)
            && (-MAX_LAT..=MAX_LAT).contains(&self.y)
    }

    /// Longitude in degrees. Meaningless for an undefined location.
    pub fn lon(&self) -> f64 {
        f64::from(self.x) / f64::from(COORDINATE_PRECISION)
    }

    /// Latitude in degrees. Meaningless for an undefined location.
    pub fn lat(&self) -> f64 {
        f64::from(self.y) / f64::from(COORDINATE_PRECISION)
    }

    /// Longitude in degrees, failing on the undefined sentinel.
    pub fn checked_lon(&self) -> Result<f64> {
        if self.is_defined() {
            Ok(self.lon())
        } else {
            Err(OsmarenaError::UndefinedLocation)
        }
    }

    /// Latitude in degrees, failing on the undefined sentinel.
    pub fn checked_lat(&self) -> Result<f64> {
        if self.is_defined() {
            Ok(self.lat())
        } else {
            Err(OsmarenaError::UndefinedLocation)
        }
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::undefined()
    }
}

const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Seconds since the Unix epoch, as OSM stores object modification times.
///
/// Round-trips through ISO-8601 (`YYYY-MM-DDTHH:MM:SSZ`) exactly for all
/// values in `[0, 2^31)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(u32);

impl Timestamp {
    /// Creates a timestamp from epoch seconds.
    pub const fn new(seconds: u32) -> Self {
        Self(seconds)
    }

    /// Epoch seconds.
    pub const fn seconds(&self) -> u32 {
        self.0
    }

    /// Formats as `YYYY-MM-DDTHH:MM:SSZ`.
    pub fn to_iso(&self) -> String {
        match Utc.timestamp_opt(i64::from(self.0), 0).single() {
            Some(dt) => dt.format(ISO_FORMAT).to_string(),
            // Every u32 second count is representable.
            None => String::new(),
        }
    }

    /// Parses a `YYYY-MM-DDTHH:MM:SSZ` string.
    pub fn from_iso(s: &str) -> Result<Self> {
        let naive = NaiveDateTime::parse_from_str(s, ISO_FORMAT)
            .map_err(|e| OsmarenaError::MalformedBlock(format!("bad timestamp {s:?}: {e}")))?;
        let seconds = u32::try_from(naive.and_utc().timestamp())
            .map_err(|_| OsmarenaError::MalformedBlock(format!("timestamp out of range: {s:?}")))?;
        Ok(Self(seconds))
    }
}

impl From<u32> for Timestamp {
    fn from(seconds: u32) -> Self {
        Self(seconds)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso())
    }
}

/// An axis-aligned bounding box of two locations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoundingBox {
    bottom_left: Location,
    top_right: Location,
}

impl BoundingBox {
    /// An empty box; extend it with [`BoundingBox::extend`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Grows the box to contain `location`. Undefined locations are ignored.
    pub fn extend(&mut self, location: Location) {
        if !location.is_defined() {
            return;
        }
        if !self.bottom_left.is_defined() {
            self.bottom_left = location;
            self.top_right = location;
            return;
        }
        self.bottom_left = Location::new(
            self.bottom_left.x().min(location.x()),
            self.bottom_left.y().min(location.y()),
        );
        self.top_right = Location::new(
            self.top_right.x().max(location.x()),
            self.top_right.y().max(location.y()),
        );
    }

    /// Bottom-left corner.
    pub const fn bottom_left(&self) -> Location {
        self.bottom_left
    }

    /// Top-right corner.
    pub const fn top_right(&self) -> Location {
        self.top_right
    }
}

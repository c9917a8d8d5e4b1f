#![allow(missing_docs)]

use osmarena::{BoundingBox, Location, OsmarenaError, Timestamp, COORDINATE_PRECISION};

#[test]
fn location_degree_roundtrip() {
    let samples = [
        (0.0, 0.0),
        (13.377_8, 52.516_2),
        (-179.999_999_9, -89.999_999_9),
        (180.0, 90.0),
    ];
    for (lon, lat) in samples {
        let location = Location::from_degrees(lon, lat);
        assert!(
            (location.lon() - lon).abs() < 1e-7,
            "lon {lon} round-tripped to {}",
            location.lon()
        );
        assert!(
            (location.lat() - lat).abs() < 1e-7,
            "lat {lat} round-tripped to {}",
            location.lat()
        );
    }
}

#[test]
fn location_fixed_point_units() {
    let location = Location::from_degrees(1.0, -1.0);
    assert_eq!(location.x(), COORDINATE_PRECISION);
    assert_eq!(location.y(), -COORDINATE_PRECISION);
}

#[test]
fn undefined_location_is_checked() {
    let location = Location::default();
    assert!(!location.is_defined());
    assert!(!location.is_valid());
    assert!(matches!(
        location.checked_lon(),
        Err(OsmarenaError::UndefinedLocation)
    ));
    assert!(matches!(
        location.checked_lat(),
        Err(OsmarenaError::UndefinedLocation)
    ));

    // (0, 0) is a real place in the Gulf of Guinea, not "unset".
    let null_island = Location::new(0, 0);
    assert!(null_island.is_defined());
    assert!(null_island.is_valid());
}

#[test]
fn location_validity_range() {
    assert!(Location::from_degrees(180.0, 90.0).is_valid());
    assert!(!Location::from_degrees(180.1, 0.0).is_valid());
    assert!(!Location::from_degrees(0.0, 90.1).is_valid());
}

#[test]
fn timestamp_iso_formatting() {
    assert_eq!(Timestamp::new(0).to_iso(), "1970-01-01T00:00:00Z");
    assert_eq!(
        Timestamp::new(1_000_000_000).to_iso(),
        "2001-09-09T01:46:40Z"
    );
    assert_eq!(
        Timestamp::new(i32::MAX as u32).to_iso(),
        "2038-01-19T03:14:07Z"
    );
}

#[test]
fn timestamp_iso_roundtrip() {
    for seconds in [0u32, 1, 1_000_000_000, 1_700_000_000, i32::MAX as u32] {
        let iso = Timestamp::new(seconds).to_iso();
        let parsed = Timestamp::from_iso(&iso).expect("re-parse failed");
        assert_eq!(parsed.seconds(), seconds, "via {iso}");
    }
}

#[test]
fn timestamp_rejects_garbage() {
    assert!(Timestamp::from_iso("not a time").is_err());
    assert!(Timestamp::from_iso("1969-12-31T23:59:59Z").is_err());
}

#[test]
fn bounding_box_extend() {
    let mut bbox = BoundingBox::new();
    bbox.extend(Location::new(100, 200));
    bbox.extend(Location::new(-50, 400));
    bbox.extend(Location::undefined());
    assert_eq!(bbox.bottom_left(), Location::new(-50, 200));
    assert_eq!(bbox.top_right(), Location::new(100, 400));
}

//! The capability seam between decoded buffers and geometry libraries.
//!
//! Downstream geometry factories differ wildly (WKB writers, GEOS,
//! projected screen space...), so the crate only defines the three calls
//! every linestring construction needs and validates locations on the
//! way through. Anything still carrying the undefined sentinel fails with
//! [`OsmarenaError::UndefinedLocation`] before it reaches the sink.

use crate::error::{OsmarenaError, Result};
use crate::osm::{Way, WayNodeList};
use crate::types::Location;

/// Receiver of linestring construction calls.
pub trait GeometrySink {
    /// A linestring begins.
    fn linestring_start(&mut self);
    /// The next point of the current linestring.
    fn linestring_add_location(&mut self, location: Location);
    /// The current linestring is complete.
    fn linestring_finish(&mut self);
}

/// Validates a point location.
pub fn create_point(location: Location) -> Result<Location> {
    if location.is_defined() {
        Ok(location)
    } else {
        Err(OsmarenaError::UndefinedLocation)
    }
}

/// Feeds a way's node locations into `sink` as one linestring.
///
/// With `unique`, consecutive duplicate locations are dropped (ways often
/// repeat a node where they touch themselves). With `reverse`, the nodes
/// are fed in reverse order. An undefined location aborts with
/// [`OsmarenaError::UndefinedLocation`], with one deliberate exception:
/// the duplicate check seeds its accumulator with the undefined sentinel,
/// so under `unique` a leading run of undefined locations (a way nobody
/// has run through a location cache yet) is dropped as duplicates and an
/// all-undefined way yields an empty linestring instead of an error.
pub fn create_linestring<S: GeometrySink>(
    nodes: &WayNodeList<'_>,
    sink: &mut S,
    unique: bool,
    reverse: bool,
) -> Result<()> {
    sink.linestring_start();

    let mut last = Location::undefined();
    let mut feed = |location: Location| -> Result<()> {
        if unique && last == location {
            return Ok(());
        }
        if !location.is_defined() {
            return Err(OsmarenaError::UndefinedLocation);
        }
        last = location;
        sink.linestring_add_location(location);
        Ok(())
    };

    if reverse {
        for index in (0..nodes.len()).rev() {
            if let Some(way_node) = nodes.get(index) {
                feed(way_node.location)?;
            }
        }
    } else {
        for way_node in nodes.iter() {
            feed(way_node.location)?;
        }
    }

    sink.linestring_finish();
    Ok(())
}

/// [`create_linestring`] over a way's node list.
pub fn way_linestring<S: GeometrySink>(
    way: &Way<'_>,
    sink: &mut S,
    unique: bool,
    reverse: bool,
) -> Result<()> {
    create_linestring(&way.nodes(), sink, unique, reverse)
}

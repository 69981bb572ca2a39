//! Nearby-user resolver.
//!
//! Great-circle distance on a spherical Earth; the directory is filtered
//! to entries whose last known location lies within the radius of the
//! accident coordinate.

use log::debug;

use crate::model::{Coordinate, NearbyUser, UserDirectoryEntry};

/// Mean Earth radius used by the haversine formula (km).
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two coordinates in kilometres.
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push h a hair past 1.0 for antipodal points.
    let c = 2.0 * h.clamp(0.0, 1.0).sqrt().asin();
    EARTH_RADIUS_KM * c
}

/// Entries within `radius_km` (inclusive) of `origin`.
///
/// No origin means nobody is nearby.  Entries without a last known
/// location are skipped, as is any distance that is not a number.
/// Directory order is preserved.
pub fn resolve(
    origin: Option<Coordinate>,
    directory: &[UserDirectoryEntry],
    radius_km: f64,
) -> Vec<NearbyUser> {
    let Some(origin) = origin else {
        debug!("NEARBY: no accident coordinate, skipping resolution");
        return Vec::new();
    };

    let nearby: Vec<NearbyUser> = directory
        .iter()
        .filter_map(|entry| {
            let at = entry.last_known_location?;
            let distance_km = haversine_km(origin, at);
            (distance_km <= radius_km).then(|| NearbyUser {
                entry: entry.clone(),
                distance_km,
            })
        })
        .collect();

    debug!(
        "NEARBY: {} of {} users within {:.1} km of {}",
        nearby.len(),
        directory.len(),
        radius_km,
        origin
    );
    nearby
}

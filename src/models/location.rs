//! Location model and cache-key derivation

use std::fmt;

use serde::{Deserialize, Serialize};

/// Coordinate precision used for cache-key derivation (decimal places).
const KEY_PRECISION: usize = 3;

/// A geographic location as handed to us by collaborators (map click,
/// search result, preset, provider echo).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Location {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Stable identifier, when the collaborator has one (e.g. a preset id)
    pub id: Option<String>,
    /// Location name (city, region, etc.)
    pub name: Option<String>,
    /// Country code (ISO 3166-1 alpha-2)
    pub country: Option<String>,
    /// IANA timezone name
    pub timezone: Option<String>,
}

impl Location {
    /// Create a new location from bare coordinates
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            id: None,
            name: None,
            country: None,
            timezone: None,
        }
    }

    /// Attach a stable identifier
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Attach a display name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// Round coordinates to the given number of decimal places
    #[must_use]
    pub fn rounded_coordinates(&self, precision: u32) -> (f64, f64) {
        let multiplier = 10_f64.powi(precision as i32);
        let lat = (self.latitude * multiplier).round() / multiplier;
        let lon = (self.longitude * multiplier).round() / multiplier;
        (lat, lon)
    }

    /// Cache key identifying this location's slot in the resource cache
    #[must_use]
    pub fn key(&self) -> LocationKey {
        LocationKey::for_location(self)
    }
}

/// Canonical cache key derived from a location.
///
/// Two locations that round to the same coordinates at three decimal places
/// and carry the same identifier (or both carry none) collide to the same
/// key. That collision is what makes cache sharing and request coalescing
/// work, so the derivation must stay pure and deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationKey(String);

impl LocationKey {
    /// Derive the key for a location
    #[must_use]
    pub fn for_location(location: &Location) -> Self {
        let mut key = format!(
            "loc:{:.prec$},{:.prec$}",
            location.latitude,
            location.longitude,
            prec = KEY_PRECISION
        );
        if let Some(id) = &location.id {
            key.push(':');
            key.push_str(id);
        }
        Self(key)
    }

    /// The key as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_key_format() {
        let location = Location::new(40.4168, -3.7038);
        assert_eq!(location.key().as_str(), "loc:40.417,-3.704");
    }

    #[test]
    fn test_key_includes_identifier() {
        let location = Location::new(40.4168, -3.7038).with_id("madrid");
        assert_eq!(location.key().as_str(), "loc:40.417,-3.704:madrid");
    }

    #[rstest]
    #[case(46.8182, 46.818_49)]
    #[case(0.0005, 0.000_51)]
    #[case(-3.7038, -3.703_76)]
    fn test_coordinates_rounding_to_same_key_collide(#[case] a: f64, #[case] b: f64) {
        let first = Location::new(a, 8.0).key();
        let second = Location::new(b, 8.0).key();
        assert_eq!(first, second);
    }

    #[test]
    fn test_key_is_deterministic() {
        let location = Location::new(52.52, 13.405).with_id("berlin");
        assert_eq!(location.key(), location.key());
    }

    #[test]
    fn test_different_identifier_yields_different_key() {
        let base = Location::new(52.52, 13.405);
        let with_id = base.clone().with_id("berlin");
        assert_ne!(base.key(), with_id.key());

        let other_id = base.clone().with_id("mitte");
        assert_ne!(with_id.key(), other_id.key());
    }

    #[test]
    fn test_distant_coordinates_do_not_collide() {
        let a = Location::new(46.818, 8.227).key();
        let b = Location::new(46.819, 8.227).key();
        assert_ne!(a, b);
    }

    #[test]
    fn test_rounded_coordinates() {
        let location = Location::new(46.818_234, 8.227_456);
        let (lat, lon) = location.rounded_coordinates(2);
        assert_eq!(lat, 46.82);
        assert_eq!(lon, 8.23);
    }
}

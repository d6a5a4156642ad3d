//! Text helpers shared by place renderers.

use crate::geo::Coordinate;
use crate::place::{Place, PriceTier};

pub const METERS_TO_MILES: f64 = 0.000_621_37;

/// Formats a distance in meters as miles, rounded up to the next hundredth.
#[must_use]
pub fn format_distance_miles(meters: f64) -> String {
    let miles = meters * METERS_TO_MILES;
    format!("{:.2}", (miles * 100.0).ceil() / 100.0)
}

/// One-line summary of a place for list output:
/// `name | $$·· | 0.63 mi | category`.
///
/// Unused steps of the price scale are drawn as `·`, since plain text
/// cannot grey out a `$`.
#[must_use]
pub fn list_row(place: &Place, origin: Option<&Coordinate>) -> String {
    let (filled, unfilled) = PriceTier::scale(place.price_tier.as_ref());
    let mut row = format!(
        "{} | {}{}",
        place.name.as_deref().unwrap_or(""),
        filled,
        "·".repeat(unfilled.chars().count()),
    );
    if let Some(meters) = origin.and_then(|o| place.distance_from(o)) {
        row.push_str(" | ");
        row.push_str(&format_distance_miles(meters));
        row.push_str(" mi");
    }
    row.push_str(" | ");
    row.push_str(place.category.alias());
    row
}

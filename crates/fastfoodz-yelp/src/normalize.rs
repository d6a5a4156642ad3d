//! Normalization of raw Yelp business records into [`Place`] values.
//!
//! Every field is optional and read leniently: a field with an unexpected
//! type is treated as absent rather than failing the record.

use fastfoodz_core::{Category, Coordinate, Place, PriceTier};
use reqwest::Url;
use serde_json::Value;

/// Maps one element of the `businesses` array to a [`Place`].
///
/// Returns `None` if the element is not a JSON object.
#[must_use]
pub fn normalize_business(business: &Value) -> Option<Place> {
    let record = business.as_object()?;

    let text = |key: &str| record.get(key).and_then(Value::as_str).map(str::to_owned);
    let url = |key: &str| {
        record
            .get(key)
            .and_then(Value::as_str)
            .and_then(|raw| Url::parse(raw).ok())
            .map(String::from)
    };

    let coordinate = record.get("coordinates").and_then(|c| {
        let latitude = c.get("latitude").and_then(Value::as_f64)?;
        let longitude = c.get("longitude").and_then(Value::as_f64)?;
        Some(Coordinate::new(latitude, longitude))
    });

    let address = record
        .get("location")
        .and_then(|l| l.get("display_address"))
        .and_then(Value::as_array)
        .and_then(|lines| {
            let lines: Vec<&str> = lines.iter().filter_map(Value::as_str).collect();
            (!lines.is_empty()).then(|| lines.join(" "))
        });

    let category = record
        .get("categories")
        .and_then(Value::as_array)
        .map_or(Category::Unknown, |tags| {
            Category::resolve(
                tags.iter()
                    .filter_map(|t| t.get("alias").and_then(Value::as_str)),
            )
        });

    Some(Place {
        name: text("name"),
        image_url: url("image_url"),
        coordinate,
        address,
        phone: text("phone"),
        info_url: url("url"),
        category,
        price_tier: text("price").map(PriceTier::new),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn name_and_category_only_leaves_other_fields_empty() {
        let place = normalize_business(&json!({
            "name": "Slice",
            "categories": [{ "alias": "pizza" }]
        }))
        .expect("object should normalize");

        assert_eq!(place.name.as_deref(), Some("Slice"));
        assert_eq!(place.category, Category::Pizza);
        assert_eq!(place.image_url, None);
        assert_eq!(place.coordinate, None);
        assert_eq!(place.address, None);
        assert_eq!(place.phone, None);
        assert_eq!(place.info_url, None);
        assert_eq!(place.price_tier, None);
    }

    #[test]
    fn maps_every_field_of_a_full_record() {
        let place = normalize_business(&json!({
            "name": "Taqueria",
            "image_url": "https://s3-media.example.com/t.jpg",
            "coordinates": { "latitude": 37.76, "longitude": -122.42 },
            "location": { "display_address": ["3093 16th St", "San Francisco, CA 94103"] },
            "price": "$",
            "phone": "+14155551234",
            "url": "https://www.yelp.com/biz/taqueria",
            "categories": [{ "alias": "foodtrucks" }, { "alias": "mexican" }]
        }))
        .unwrap();

        assert_eq!(place.coordinate, Some(Coordinate::new(37.76, -122.42)));
        assert_eq!(
            place.address.as_deref(),
            Some("3093 16th St San Francisco, CA 94103")
        );
        assert_eq!(place.price_tier, Some(PriceTier::new("$")));
        assert_eq!(place.phone.as_deref(), Some("+14155551234"));
        assert_eq!(
            place.info_url.as_deref(),
            Some("https://www.yelp.com/biz/taqueria")
        );
        assert_eq!(place.category, Category::Mexican);
    }

    #[test]
    fn first_matching_category_wins() {
        let place = normalize_business(&json!({
            "categories": [{ "alias": "chinese" }, { "alias": "burgers" }]
        }))
        .unwrap();
        assert_eq!(place.category, Category::Chinese);
    }

    #[test]
    fn unmatched_categories_resolve_to_unknown() {
        let place = normalize_business(&json!({
            "categories": [{ "alias": "sushi" }, { "title": "no alias" }]
        }))
        .unwrap();
        assert_eq!(place.category, Category::Unknown);
    }

    #[test]
    fn empty_display_address_yields_no_address() {
        let place = normalize_business(&json!({ "location": { "display_address": [] } })).unwrap();
        assert_eq!(place.address, None);
    }

    #[test]
    fn unparseable_urls_and_partial_coordinates_are_dropped() {
        let place = normalize_business(&json!({
            "image_url": "not a url",
            "coordinates": { "latitude": 37.0 }
        }))
        .unwrap();
        assert_eq!(place.image_url, None);
        assert_eq!(place.coordinate, None);
    }

    #[test]
    fn non_object_is_rejected() {
        assert!(normalize_business(&json!("just a string")).is_none());
    }
}

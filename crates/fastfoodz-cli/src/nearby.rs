//! `fastfoodz nearby`: one location fix feeding a map view and a list view
//! that share a single search through the place cache.

use anyhow::Context;
use fastfoodz_core::{list_row, parse_categories, AppConfig, Category, Coordinate};
use fastfoodz_nearby::{
    CacheOptions, CancellationToken, FetchError, LocationState, PlaceFetchCache, PlaceSearch,
};
use fastfoodz_yelp::YelpClient;

use crate::NearbyArgs;

/// Runs one nearby search and returns the rendered output.
///
/// Text mode feeds a map consumer and a list consumer from the same cache;
/// JSON mode asks the cache once. Either way the cache is consulted for a
/// single search per run.
pub(crate) async fn run(config: &AppConfig, args: NearbyArgs) -> anyhow::Result<String> {
    let categories = match args.categories.as_deref() {
        Some(raw) => parse_categories(raw).map_err(anyhow::Error::msg)?,
        None => config.search_categories.clone(),
    };
    let origin = Coordinate::new(args.lat, args.lon);
    anyhow::ensure!(
        origin.is_valid(),
        "coordinate out of range: ({}, {})",
        args.lat,
        args.lon
    );

    let client = YelpClient::with_base_url(
        &config.yelp_api_key,
        config.request_timeout(),
        &config.yelp_base_url,
        &config.user_agent,
    )?;
    let cache = PlaceFetchCache::new(
        client,
        CacheOptions {
            limit: config.search_limit,
            radius_meters: config.search_radius_meters,
            timeout: config.request_timeout(),
            ttl: config.cache_ttl(),
        },
    );

    let shutdown = CancellationToken::new();
    let on_ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    let location = LocationState::new();
    let (subscription, mut updates) = location.subscribe_channel();

    // Stand-in for the device location provider: a single fix.
    location.set(origin);
    let here = updates
        .recv()
        .await
        .context("location subscription closed before the first fix")?;

    let output = if args.json {
        let places = cache.get_places(here, &categories, &shutdown).await;
        location.unsubscribe(subscription);
        let places = places.inspect_err(|err| {
            tracing::error!(error = %err, "nearby search failed");
        })?;
        let mut json = serde_json::to_string_pretty(&*places)?;
        json.push('\n');
        json
    } else {
        let (markers, rows) = tokio::join!(
            map_markers(&cache, here, &categories, &shutdown),
            list_rows(&cache, here, &categories, &shutdown),
        );
        location.unsubscribe(subscription);

        let (markers, rows) = match (markers, rows) {
            (Ok(markers), Ok(rows)) => (markers, rows),
            (Err(err), _) | (_, Err(err)) => {
                tracing::error!(error = %err, "nearby search failed");
                return Err(err.into());
            }
        };
        render_text(&markers, &rows)
    };
    Ok(output)
}

fn render_text(markers: &[Coordinate], rows: &[String]) -> String {
    let mut out = format!("Map ({} markers)\n", markers.len());
    for marker in markers {
        out.push_str(&format!(
            "  {:.6}, {:.6}\n",
            marker.latitude, marker.longitude
        ));
    }
    out.push('\n');
    out.push_str(&format!("List ({} places)\n", rows.len()));
    for row in rows {
        out.push_str(&format!("  {row}\n"));
    }
    out
}

/// Map view consumer: one marker per place, falling back to the current
/// location for places without coordinates.
async fn map_markers<S: PlaceSearch>(
    cache: &PlaceFetchCache<S>,
    here: Coordinate,
    categories: &[Category],
    cancel: &CancellationToken,
) -> Result<Vec<Coordinate>, FetchError> {
    let places = cache.get_places(here, categories, cancel).await?;
    Ok(places.iter().map(|p| p.marker_coordinate(here)).collect())
}

/// List view consumer: one text row per place, in server order.
async fn list_rows<S: PlaceSearch>(
    cache: &PlaceFetchCache<S>,
    here: Coordinate,
    categories: &[Category],
    cancel: &CancellationToken,
) -> Result<Vec<String>, FetchError> {
    let places = cache.get_places(here, categories, cancel).await?;
    Ok(places.iter().map(|p| list_row(p, Some(&here))).collect())
}

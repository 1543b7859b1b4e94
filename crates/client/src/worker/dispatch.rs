//! Request routing.
//!
//! Classification is recomputed for every request from its method, declared
//! destination and URL. Marker matching is plain substring containment on
//! the full URL.

use offgrid_core::{Destination, Method, Request};
use serde::Serialize;

/// What kind of resource a GET is after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestClass {
    ImageAsset,
    ApiCall,
    OtherStatic,
}

/// Which strategy answers a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Route {
    /// Non-GET: sent to the network untouched, no store interaction.
    Passthrough,
    NetworkFirst,
    CacheFirst,
}

/// Classify a request. Image destination wins over URL markers.
pub fn classify(request: &Request, api_markers: &[String]) -> RequestClass {
    if request.destination == Destination::Image {
        return RequestClass::ImageAsset;
    }

    let url = request.url.as_str();
    if api_markers.iter().any(|marker| url.contains(marker.as_str())) {
        RequestClass::ApiCall
    } else {
        RequestClass::OtherStatic
    }
}

/// Pick the route for a request. Total: every GET gets a strategy.
pub fn route(request: &Request, api_markers: &[String]) -> Route {
    if request.method != Method::Get {
        return Route::Passthrough;
    }

    match classify(request, api_markers) {
        RequestClass::ImageAsset => Route::CacheFirst,
        RequestClass::ApiCall => Route::NetworkFirst,
        RequestClass::OtherStatic => Route::CacheFirst,
    }
}

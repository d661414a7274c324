//! Address composition and map-link generation.

/// Search URL template the composed address is appended to.
pub const MAP_SEARCH_URL: &str = "https://www.google.com/maps/search/?api=1&query=";

/// Composes `"<street>, <postal code + city>, <fixed city>"`.
///
/// Empty parts are left out rather than rendered as blanks, so a listing
/// without a postal line still yields a usable address.
#[must_use]
pub fn compose_address(street: &str, postal_code_city: Option<&str>, city: &str) -> String {
    [Some(street), postal_code_city, Some(city)]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Builds the map search link for an address (spaces become `+`).
#[must_use]
pub fn map_link(address: &str) -> String {
    format!("{MAP_SEARCH_URL}{}", address.replace(' ', "+"))
}

/// Drops the leading word of a listing title (`"Flat Keizersgracht 10"` →
/// `"Keizersgracht 10"`).
#[must_use]
pub fn drop_first_word(title: &str) -> String {
    title.split_whitespace().skip(1).collect::<Vec<_>>().join(" ")
}

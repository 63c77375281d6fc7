//! `Cache-Control` handling.

/// Upper bound on how long a server may ask us to stay away (4 hours).
pub const MAX_CACHE_LIFETIME_SECS: u64 = 14_400;

/// Extract `max-age` from a Cache-Control header value.
///
/// Only the first `max-age` directive counts. A malformed or negative value
/// yields 0, and the result never exceeds `maximum`.
pub fn parse_max_age(cache_control: &str, maximum: u64) -> u64 {
    let first = cache_control
        .split(',')
        .filter_map(|directive| directive.trim().split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("max-age"));

    match first {
        Some((_, value)) => value
            .trim()
            .trim_matches('"')
            .parse::<u64>()
            .map(|secs| secs.min(maximum))
            .unwrap_or(0),
        None => 0,
    }
}

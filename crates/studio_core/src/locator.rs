use url::Url;

/// Resolves a result locator returned by the backend against the API base.
///
/// Absolute `http(s)` locators are returned as-is. Anything else is treated
/// as a path below the base, keeping any path prefix the base carries.
pub fn resolve_locator(api_base: &str, locator: &str) -> String {
    if let Ok(url) = Url::parse(locator) {
        if matches!(url.scheme(), "http" | "https") {
            return locator.to_string();
        }
    }
    let base = api_base.trim_end_matches('/');
    let path = locator.trim_start_matches('/');
    format!("{base}/{path}")
}

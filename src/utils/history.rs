//! Browser history bindings.
//!
//! Addresses inside the app are rooted at `/`; the page itself may be served
//! under [`BASE_PATH`]. These helpers translate between the two and drive
//! `history.pushState` / `replaceState`.

use crate::config::BASE_PATH;

/// App address for a browser pathname served under `base`.
pub fn strip_base(pathname: &str, base: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        return pathname.to_string();
    }
    match pathname.strip_prefix(base) {
        Some("") => "/".to_string(),
        Some(rest) if rest.starts_with('/') => rest.to_string(),
        _ => pathname.to_string(),
    }
}

/// Browser pathname for an app address served under `base`.
pub fn with_base(address: &str, base: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), address)
}

/// Current app address from `location.pathname`.
pub fn current_address() -> String {
    let pathname = web_sys::window()
        .and_then(|w| w.location().pathname().ok())
        .unwrap_or_else(|| "/".to_string());
    strip_base(&pathname, BASE_PATH)
}

/// Push an address onto browser history.
pub fn push_address(address: &str) {
    if let Some(window) = web_sys::window()
        && let Ok(history) = window.history()
    {
        let url = with_base(address, BASE_PATH);
        let _ = history.push_state_with_url(&wasm_bindgen::JsValue::NULL, "", Some(&url));
    }
}

/// Replace the current history entry, for redirects that should not be
/// reachable with the back button.
pub fn replace_address(address: &str) {
    if let Some(window) = web_sys::window()
        && let Ok(history) = window.history()
    {
        let url = with_base(address, BASE_PATH);
        let _ = history.replace_state_with_url(&wasm_bindgen::JsValue::NULL, "", Some(&url));
    }
}

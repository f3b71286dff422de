//! Feature catalogue.
//!
//! The upstream model is fitted on a subset of these indicator columns. This
//! module only resolves names; computing the indicators happens upstream.

/// Every feature the upstream model knows how to compute, in canonical order.
pub const FEATURE_CATALOG: &[&str] = &[
    "Return_Lag_1",
    "Return_Lag_5",
    "MA_10",
    "RSI_14",
    "BBL_20",
    "BBM_20",
    "BBU_20",
];

/// Check whether a feature name is in the catalogue (exact match).
pub fn is_known_feature(name: &str) -> bool {
    FEATURE_CATALOG.contains(&name)
}

/// Resolve a requested feature list against the catalogue.
///
/// Unknown names are dropped; order and repeats are kept. When nothing
/// valid remains, or nothing was requested, the full catalogue is used.
pub fn resolve_features<S: AsRef<str>>(requested: &[S]) -> Vec<String> {
    let mut resolved: Vec<String> = Vec::with_capacity(requested.len());

    for name in requested {
        let name = name.as_ref();
        if is_known_feature(name) {
            resolved.push(name.to_string());
        } else {
            tracing::debug!(feature = %name, "Dropping unknown feature");
        }
    }

    if resolved.is_empty() {
        return FEATURE_CATALOG.iter().map(|f| f.to_string()).collect();
    }

    resolved
}

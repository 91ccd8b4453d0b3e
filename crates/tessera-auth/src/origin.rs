//! Origin binding between a credential and the request presenting it.

use tessera_config::ApiMode;

const DEVELOPMENT_HOSTS: [&str; 4] = ["localhost", "127.0.0.1", "0.0.0.0", "::1"];

/// Lowercases and strips trailing slashes.
pub fn normalize_origin(origin: &str) -> String {
    origin.trim().trim_end_matches('/').to_lowercase()
}

/// Host part of `scheme://host[:port][/path]`, without port or IPv6 brackets.
pub fn origin_host(origin: &str) -> &str {
    let rest = origin
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(origin);
    let authority = rest.split('/').next().unwrap_or(rest);
    let authority = authority
        .rsplit_once('@')
        .map(|(_, host)| host)
        .unwrap_or(authority);

    if let Some(bracketed) = authority.strip_prefix('[') {
        return bracketed.split(']').next().unwrap_or(bracketed);
    }

    // A bare IPv6 literal has more than one colon and no port to strip.
    if authority.matches(':').count() > 1 {
        return authority;
    }

    authority
        .split_once(':')
        .map(|(host, _)| host)
        .unwrap_or(authority)
}

pub fn is_development_origin(origin: &str) -> bool {
    let normalized = normalize_origin(origin);
    DEVELOPMENT_HOSTS.contains(&origin_host(&normalized))
}

/// `true` when the normalized origins are equal, or when outside production
/// the observed origin is a loopback/development host.
pub fn origins_match(claimed: &str, observed: &str, mode: ApiMode) -> bool {
    if normalize_origin(claimed) == normalize_origin(observed) {
        return true;
    }
    !mode.is_production() && is_development_origin(observed)
}

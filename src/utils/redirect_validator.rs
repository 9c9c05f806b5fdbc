use crate::models::auth::AuthError;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

// In-app redirect targets are same-site relative paths; anything that could
// leave the application (scheme, protocol-relative, traversal) is refused.

static PATH_TRAVERSAL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.\.").expect("traversal pattern compiles")
});

static PROTOCOL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:[a-z][a-z0-9+.-]*:)|^/{2,}").expect("protocol pattern compiles")
});

static SUSPICIOUS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\x00-\x1F\x7F]|\\").expect("suspicious pattern compiles")
});

const ALLOWED_SCHEMES: &[&str] = &["http", "https"];

const MAX_REDIRECT_LENGTH: usize = 2048;

/// Validate an in-app redirect path such as a route guard override
///
/// # Errors
///
/// Returns a validation error if the path is not a plain relative path
pub fn validate_redirect_path(path: &str) -> Result<String, AuthError> {
    debug!("Validating redirect path: {path}");

    if path.len() > MAX_REDIRECT_LENGTH {
        warn!("Excessively long redirect path: {} characters", path.len());
        return Err(invalid_redirect_error(path));
    }
    if !path.starts_with('/') {
        warn!("Redirect path is not absolute within the app: {path}");
        return Err(invalid_redirect_error(path));
    }

    for variant in decoded_variants(path) {
        if PROTOCOL_PATTERN.is_match(&variant) {
            warn!("Protocol injection attempt in redirect: {path} -> {variant}");
            return Err(invalid_redirect_error(path));
        }
        if PATH_TRAVERSAL_PATTERN.is_match(&variant) {
            warn!("Path traversal attempt in redirect: {path} -> {variant}");
            return Err(invalid_redirect_error(path));
        }
        if SUSPICIOUS_PATTERN.is_match(&variant) {
            warn!("Suspicious characters in redirect: {path}");
            return Err(invalid_redirect_error(path));
        }
    }

    Ok(path.to_string())
}

/// Validate the absolute URL a verification email links back to
///
/// # Errors
///
/// Returns a configuration error if the URL does not parse or uses a
/// scheme other than http(s)
pub fn validate_email_redirect_url(redirect_url: &str) -> Result<String, AuthError> {
    let parsed = url::Url::parse(redirect_url).map_err(|e| {
        AuthError::Configuration(format!("Invalid email redirect URL '{redirect_url}': {e}"))
    })?;

    if !ALLOWED_SCHEMES.contains(&parsed.scheme()) {
        return Err(AuthError::Configuration(format!(
            "Email redirect URL must use http or https, got '{}'",
            parsed.scheme()
        )));
    }
    if parsed.host_str().is_none() {
        return Err(AuthError::Configuration(format!(
            "Email redirect URL has no host: {redirect_url}"
        )));
    }

    Ok(parsed.to_string())
}

fn invalid_redirect_error(path: &str) -> AuthError {
    AuthError::Validation(format!("Invalid redirect target: {path}"))
}

/// Original path plus its single and double URL-decoded forms
fn decoded_variants(path: &str) -> Vec<String> {
    let mut variants = Vec::with_capacity(3);
    variants.push(path.to_string());

    if let Ok(decoded) = urlencoding::decode(path) {
        let decoded = decoded.into_owned();
        if decoded != path {
            if let Ok(double_decoded) = urlencoding::decode(&decoded) {
                let double_decoded = double_decoded.into_owned();
                if double_decoded != decoded {
                    variants.push(double_decoded);
                }
            }
            variants.push(decoded);
        }
    }

    variants
}

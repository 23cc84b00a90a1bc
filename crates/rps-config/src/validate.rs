//! Parsing helpers for environment values.

use url::Url;

use crate::error::{ConfigError, ConfigResult};

pub(crate) fn parse_u32(name: &'static str, value: &str) -> ConfigResult<u32> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: value.to_string(),
        reason: "expected unsigned integer",
    })
}

pub(crate) fn parse_u64(name: &'static str, value: &str) -> ConfigResult<u64> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: value.to_string(),
        reason: "expected unsigned integer",
    })
}

pub(crate) fn parse_bool(name: &'static str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
            reason: "expected boolean",
        }),
    }
}

pub(crate) fn parse_url(name: &'static str, value: &str) -> ConfigResult<Url> {
    Url::parse(value.trim()).map_err(|_| ConfigError::InvalidValue {
        name,
        value: value.to_string(),
        reason: "expected absolute url",
    })
}

/// Parse a URL that later joins must treat as a directory.
pub(crate) fn parse_base_url(name: &'static str, value: &str) -> ConfigResult<Url> {
    let mut url = parse_url(name, value)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

pub(crate) fn ensure_positive(name: &'static str, value: u32) -> ConfigResult<u32> {
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
            reason: "must be greater than zero",
        });
    }
    Ok(value)
}

/// Normalise a KV mount prefix to `segment/segment/` form.
#[must_use]
pub fn normalize_secrets_path(value: &str) -> String {
    let trimmed = value.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans_accept_common_spellings() {
        assert!(parse_bool("X", "TRUE").expect("bool"));
        assert!(!parse_bool("X", "0").expect("bool"));
        assert!(matches!(
            parse_bool("X", "maybe"),
            Err(ConfigError::InvalidValue {
                reason: "expected boolean",
                ..
            })
        ));
    }

    #[test]
    fn integers_reject_garbage_and_zero() {
        assert_eq!(parse_u32("X", " 12 ").expect("u32"), 12);
        assert!(parse_u64("X", "-1").is_err());
        assert!(ensure_positive("X", 0).is_err());
    }

    #[test]
    fn secrets_path_is_slash_terminated() {
        assert_eq!(normalize_secrets_path("/secret/data"), "secret/data/");
        assert_eq!(normalize_secrets_path("kv/data/"), "kv/data/");
        assert_eq!(normalize_secrets_path("  "), "");
    }

    #[test]
    fn urls_must_be_absolute() {
        assert!(parse_url("X", "postgres://user@localhost/db").is_ok());
        assert!(parse_url("X", "not a url").is_err());
    }

    #[test]
    fn base_urls_keep_their_last_segment() {
        let proxied = parse_base_url("X", "https://host/vault-proxy").expect("url");
        assert_eq!(proxied.as_str(), "https://host/vault-proxy/");
        assert_eq!(
            proxied.join("v1/secret").expect("join").as_str(),
            "https://host/vault-proxy/v1/secret"
        );
        assert_eq!(
            parse_base_url("X", "http://vault:8200").expect("url").as_str(),
            "http://vault:8200/"
        );
        assert!(parse_base_url("X", "not a url").is_err());
    }
}

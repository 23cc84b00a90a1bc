use std::fmt::{self, Display, Formatter};
use std::net::{Ipv4Addr, Ipv6Addr};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

const FQDN_MAX_LEN: usize = 254;
const LABEL_MAX_LEN: usize = 63;
const DNS_SUFFIX_MAX_LEN: usize = 192;

static FQDN: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| {
    Regex::new(r"^(?:(?:xn--+)?[a-z0-9]+(?:-[a-z0-9]+)*\.)+[a-z]{2,63}$")
});

static DNS_SUFFIX: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z]{2,})+$")
});

/// How [`ProxyConfig::access_info`] is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum InfoFormat {
    /// Dotted-quad IPv4 literal.
    Ipv4,
    /// IPv6 literal.
    Ipv6,
    /// Fully qualified domain name.
    Fqdn,
}

impl InfoFormat {
    /// Wire code stored in the `info_format` column.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Ipv4 => 3,
            Self::Ipv6 => 4,
            Self::Fqdn => 201,
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Ipv4 => "IPv4",
            Self::Ipv6 => "IPv6",
            Self::Fqdn => "FQDN",
        }
    }
}

impl TryFrom<i32> for InfoFormat {
    type Error = UnknownInfoFormat;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            3 => Ok(Self::Ipv4),
            4 => Ok(Self::Ipv6),
            201 => Ok(Self::Fqdn),
            other => Err(UnknownInfoFormat(other)),
        }
    }
}

impl From<InfoFormat> for i32 {
    fn from(value: InfoFormat) -> Self {
        value.code()
    }
}

/// Raised when an `info_format` code is not 3, 4, or 201.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownInfoFormat(pub i32);

impl Display for UnknownInfoFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "unknown info format {}", self.0)
    }
}

impl std::error::Error for UnknownInfoFormat {}

/// Network proxy reachable from the managed device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfig {
    /// Unique name within the tenant.
    pub name: String,
    /// Proxy address, written according to `info_format`.
    pub access_info: String,
    /// Address syntax of `access_info`.
    #[sqlx(try_from = "i32")]
    pub info_format: InfoFormat,
    /// TCP port.
    #[sqlx(try_from = "i32")]
    pub port: u16,
    /// DNS suffix of the network the proxy serves.
    pub network_dns_suffix: String,
    /// Owning tenant.
    pub tenant_id: String,
    /// Assigned by the store on insert.
    #[serde(default)]
    pub creation_date: Option<DateTime<Utc>>,
}

impl ProxyConfig {
    /// Check that `access_info` matches `info_format` and the DNS suffix is
    /// a plausible domain name.
    ///
    /// # Errors
    ///
    /// Returns the first field that fails its check.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let valid_address = match self.info_format {
            InfoFormat::Ipv4 => self.access_info.parse::<Ipv4Addr>().is_ok(),
            InfoFormat::Ipv6 => self.access_info.parse::<Ipv6Addr>().is_ok(),
            InfoFormat::Fqdn => is_fqdn(&self.access_info)?,
        };
        if !valid_address {
            return Err(ValidationError::AccessInfo {
                format: self.info_format,
                value: self.access_info.clone(),
            });
        }
        if !is_dns_suffix(&self.network_dns_suffix)? {
            return Err(ValidationError::DnsSuffix {
                value: self.network_dns_suffix.clone(),
            });
        }
        Ok(())
    }
}

fn is_fqdn(value: &str) -> Result<bool, ValidationError> {
    if value.is_empty() || value.len() > FQDN_MAX_LEN {
        return Ok(false);
    }
    if value.split('.').any(|label| label.len() > LABEL_MAX_LEN) {
        return Ok(false);
    }
    Ok(compiled(&FQDN)?.is_match(value))
}

fn is_dns_suffix(value: &str) -> Result<bool, ValidationError> {
    if value.is_empty() || value.len() > DNS_SUFFIX_MAX_LEN {
        return Ok(false);
    }
    Ok(compiled(&DNS_SUFFIX)?.is_match(value))
}

fn compiled(pattern: &'static Lazy<Result<Regex, regex::Error>>) -> Result<&'static Regex, ValidationError> {
    Lazy::force(pattern)
        .as_ref()
        .map_err(|source| ValidationError::Pattern {
            source: source.clone(),
        })
}

/// Field-level problems found by [`ProxyConfig::validate`].
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// `access_info` does not match the declared format.
    #[error("access info does not match {} syntax", .format.label())]
    AccessInfo {
        /// Declared format.
        format: InfoFormat,
        /// Offending value.
        value: String,
    },
    /// `network_dns_suffix` is not a domain name of at most 192 characters.
    #[error("network dns suffix is not a valid domain name")]
    DnsSuffix {
        /// Offending value.
        value: String,
    },
    /// A built-in pattern failed to compile.
    #[error("validation pattern failed to compile")]
    Pattern {
        /// Regex compiler error.
        #[source]
        source: regex::Error,
    },
}

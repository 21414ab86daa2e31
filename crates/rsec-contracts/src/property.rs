//! The recognized property schema.
//!
//! Every key under a profile prefix must classify as a [`ProfileKey`];
//! anything else is reported as unrecognized.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Scalar security properties a profile may set.
///
/// Appendable properties hold comma-separated algorithm lists that an
/// extension may extend or shrink relative to the inherited value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PropertyKey {
    TlsDisabledNamedCurves,
    TlsDisabledAlgorithms,
    TlsEphemeralDhKeySize,
    TlsLegacyAlgorithms,
    CertpathDisabledAlgorithms,
    SecurityLegacyAlgorithm,
    KeystoreType,
    Keystore,
    SecureRandomProvider,
    SecureRandomAlgorithm,
}

impl PropertyKey {
    pub const ALL: [PropertyKey; 10] = [
        Self::TlsDisabledNamedCurves,
        Self::TlsDisabledAlgorithms,
        Self::TlsEphemeralDhKeySize,
        Self::TlsLegacyAlgorithms,
        Self::CertpathDisabledAlgorithms,
        Self::SecurityLegacyAlgorithm,
        Self::KeystoreType,
        Self::Keystore,
        Self::SecureRandomProvider,
        Self::SecureRandomAlgorithm,
    ];

    /// The suffix used under the profile prefix.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::TlsDisabledNamedCurves => "tls.disabledNamedCurves",
            Self::TlsDisabledAlgorithms => "tls.disabledAlgorithms",
            Self::TlsEphemeralDhKeySize => "tls.ephemeralDHKeySize",
            Self::TlsLegacyAlgorithms => "tls.legacyAlgorithms",
            Self::CertpathDisabledAlgorithms => "certpath.disabledAlgorithms",
            Self::SecurityLegacyAlgorithm => "security.legacyAlgorithm",
            Self::KeystoreType => "keystore.type",
            Self::Keystore => "keystore",
            Self::SecureRandomProvider => "securerandom.provider",
            Self::SecureRandomAlgorithm => "securerandom.algorithm",
        }
    }

    /// The host security property this key is written to.
    pub fn host_name(self) -> &'static str {
        match self {
            Self::TlsDisabledNamedCurves => "jdk.tls.disabledNamedCurves",
            Self::TlsDisabledAlgorithms => "jdk.tls.disabledAlgorithms",
            Self::TlsEphemeralDhKeySize => "jdk.tls.ephemeralDHKeySize",
            Self::TlsLegacyAlgorithms => "jdk.tls.legacyAlgorithms",
            Self::CertpathDisabledAlgorithms => "jdk.certpath.disabledAlgorithms",
            Self::SecurityLegacyAlgorithm => "jdk.security.legacyAlgorithm",
            Self::KeystoreType => "keystore.type",
            Self::Keystore => "javax.net.ssl.keyStore",
            Self::SecureRandomProvider => "securerandom.provider",
            Self::SecureRandomAlgorithm => "securerandom.algorithm",
        }
    }

    /// Whether an extension may append to or remove from the inherited value.
    pub fn is_appendable(self) -> bool {
        matches!(
            self,
            Self::TlsDisabledNamedCurves
                | Self::TlsDisabledAlgorithms
                | Self::TlsEphemeralDhKeySize
                | Self::TlsLegacyAlgorithms
                | Self::CertpathDisabledAlgorithms
                | Self::SecurityLegacyAlgorithm
        )
    }

    pub fn from_suffix(suffix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.suffix() == suffix)
    }

    /// The key whose host property is `name`, if any.
    pub fn from_host_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.host_name() == name)
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Fields of the `desc.*` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescField {
    Name,
    Default,
    Fips,
    Hash,
    Number,
    Policy,
    SunsetDate,
}

/// A recognized property suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileKey {
    Desc(DescField),
    FipsMode,
    /// `jce.provider.N`, N ≥ 1.
    Provider(u32),
    Scalar(PropertyKey),
    Extends,
}

impl ProfileKey {
    /// Classify a suffix such as `desc.name` or `jce.provider.3`.
    ///
    /// Provider numbers must be canonical positive integers, so
    /// `jce.provider.0` and `jce.provider.01` are not recognized.
    pub fn parse(suffix: &str) -> Option<Self> {
        let key = match suffix {
            "desc.name" => Self::Desc(DescField::Name),
            "desc.default" => Self::Desc(DescField::Default),
            "desc.fips" => Self::Desc(DescField::Fips),
            "desc.hash" => Self::Desc(DescField::Hash),
            "desc.number" => Self::Desc(DescField::Number),
            "desc.policy" => Self::Desc(DescField::Policy),
            "desc.sunsetDate" => Self::Desc(DescField::SunsetDate),
            "fips.mode" => Self::FipsMode,
            "extends" => Self::Extends,
            other => {
                if let Some(n) = other.strip_prefix("jce.provider.") {
                    return parse_position(n).map(Self::Provider);
                }
                return PropertyKey::from_suffix(other).map(Self::Scalar);
            }
        };
        Some(key)
    }
}

fn parse_position(n: &str) -> Option<u32> {
    if n.is_empty() || n.starts_with('0') || !n.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    n.parse().ok()
}

//! Provider entries and their per-service constraints.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One ordered slot of the provider list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEntry {
    /// 1-based order number.
    pub position: u32,
    /// Fully-qualified provider class. `None` marks an explicit removal.
    pub class_name: Option<String>,
    /// Optional configuration argument following the class name.
    pub argument: Option<String>,
    /// Restrictions on which services the provider may supply.
    /// Empty means unrestricted.
    pub constraints: Vec<ServiceConstraint>,
}

impl ProviderEntry {
    /// The simple class name, e.g. `SunJCE` for `com.sun.crypto.provider.SunJCE`.
    pub fn simple_name(&self) -> Option<&str> {
        self.class_name
            .as_deref()
            .map(|c| c.rsplit('.').next().unwrap_or(c))
    }

    /// The value written to `security.provider.N`: class name plus argument.
    pub fn declaration(&self) -> Option<String> {
        let class = self.class_name.as_deref()?;
        Some(match &self.argument {
            Some(arg) => format!("{class} {arg}"),
            None => class.to_string(),
        })
    }
}

/// How a constraint names the implementation class it binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BindingMode {
    /// `FullClassName:pkg.Impl`
    FullClassName,
    /// `ModuleAndFullClassName:module/pkg.Impl`
    ModuleAndFullClassName,
}

impl BindingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FullClassName => "FullClassName",
            Self::ModuleAndFullClassName => "ModuleAndFullClassName",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "FullClassName" => Some(Self::FullClassName),
            "ModuleAndFullClassName" => Some(Self::ModuleAndFullClassName),
            _ => None,
        }
    }
}

/// The implementation class a constraint is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Binding {
    pub mode: BindingMode,
    pub target: String,
}

/// A constraint attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttrValue {
    Text(String),
    /// Inclusive range, used by `KeySize`.
    Range { min: u32, max: u32 },
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Range { min, max } if min == max => write!(f, "{min}"),
            Self::Range { min, max } => write!(f, "{min}-{max}"),
        }
    }
}

/// A per-(service type, algorithm) restriction on a provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceConstraint {
    /// Service type such as `Cipher`, or `*`.
    pub service_type: String,
    /// Algorithm such as `AES/GCM/NoPadding`, or `*`.
    pub algorithm: String,
    /// Required service attributes. Empty means any.
    pub attributes: BTreeMap<String, AttrValue>,
    pub binding: Option<Binding>,
}

impl ServiceConstraint {
    /// True when this constraint targets the same (type, algorithm) pair.
    pub fn same_service(&self, other: &ServiceConstraint) -> bool {
        self.service_type == other.service_type && self.algorithm == other.algorithm
    }
}

impl fmt::Display for ServiceConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}, {}, ", self.service_type, self.algorithm)?;
        if self.attributes.is_empty() {
            f.write_str("*")?;
        } else {
            let attrs = self
                .attributes
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(":");
            f.write_str(&attrs)?;
        }
        if let Some(binding) = &self.binding {
            write!(f, ", {}:{}", binding.mode.as_str(), binding.target)?;
        }
        f.write_str("}")
    }
}

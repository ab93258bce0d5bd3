//! Functional roles, portfolios, and the dense role-indexed map.

use std::fmt;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A functional role in the organization's fixed role set.
///
/// `Fs` (full-stack generalist) is tracked as its own demand lane, but its
/// capacity additionally folds into the `Fe` and `Be` lanes; see
/// `capgov-capacity`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "FE")]
    Fe,
    #[serde(rename = "BE")]
    Be,
    #[serde(rename = "AI")]
    Ai,
    #[serde(rename = "PM")]
    Pm,
    #[serde(rename = "FS")]
    Fs,
}

impl Role {
    /// Number of roles; the width of a [`RoleMap`].
    pub const COUNT: usize = 5;

    /// Every role, in canonical iteration order.
    pub const ALL: [Role; Role::COUNT] = [Role::Fe, Role::Be, Role::Ai, Role::Pm, Role::Fs];

    /// The validation lanes. Proposals carry demand for these four roles;
    /// FS demand only ever arrives on existing commitment records.
    pub const LANES: [Role; 4] = [Role::Fe, Role::Be, Role::Ai, Role::Pm];

    /// Wire code, e.g. `"FE"`.
    pub fn code(self) -> &'static str {
        match self {
            Role::Fe => "FE",
            Role::Be => "BE",
            Role::Ai => "AI",
            Role::Pm => "PM",
            Role::Fs => "FS",
        }
    }

    /// Stable dense index in [`Role::ALL`] order.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Unrecognized role code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown role code: {0:?}")]
pub struct ParseRoleError(pub String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FE" => Ok(Role::Fe),
            "BE" => Ok(Role::Be),
            "AI" => Ok(Role::Ai),
            "PM" => Ok(Role::Pm),
            "FS" => Ok(Role::Fs),
            other => Err(ParseRoleError(other.to_string())),
        }
    }
}

/// A budget portfolio partitioning each role's capacity via quota fractions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Portfolio {
    Client,
    Internal,
    Rnd,
}

impl Portfolio {
    /// Every portfolio, in canonical iteration order.
    pub const ALL: [Portfolio; 3] = [Portfolio::Client, Portfolio::Internal, Portfolio::Rnd];

    /// Wire code, e.g. `"client"`.
    pub fn code(self) -> &'static str {
        match self {
            Portfolio::Client => "client",
            Portfolio::Internal => "internal",
            Portfolio::Rnd => "rnd",
        }
    }

    /// Stable dense index in [`Portfolio::ALL`] order.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Lenient normalization of collaborator-supplied portfolio labels.
    ///
    /// Case-insensitive; research synonyms map to [`Portfolio::Rnd`];
    /// anything unrecognized maps to [`Portfolio::Internal`].
    pub fn normalize(value: &str) -> Portfolio {
        match value.trim().to_ascii_lowercase().as_str() {
            "client" => Portfolio::Client,
            "rnd" | "research" | "research & development" => Portfolio::Rnd,
            "internal" => Portfolio::Internal,
            _ => Portfolio::Internal,
        }
    }
}

impl fmt::Display for Portfolio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A dense map from [`Role`] to `T`.
///
/// Backed by a fixed array, so every role always has an entry; iteration is
/// in [`Role::ALL`] order. Serializes as a JSON object keyed by role code.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RoleMap<T>([T; Role::COUNT]);

impl<T> RoleMap<T> {
    /// Iterate entries in [`Role::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Role, &T)> {
        Role::ALL.iter().copied().zip(self.0.iter())
    }
}

impl<T: Default> RoleMap<T> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RoleMap<f64> {
    /// Builder-style entry assignment.
    pub fn with(mut self, role: Role, value: f64) -> Self {
        self[role] = value;
        self
    }

    /// A copy with every entry clamped to a finite non-negative value.
    ///
    /// Misbehaving callers may supply negative (or NaN) FTE figures; the
    /// engine clamps rather than raising.
    pub fn clamped(&self) -> RoleMap<f64> {
        RoleMap(self.0.map(|v| v.max(0.0)))
    }
}

impl<T> Index<Role> for RoleMap<T> {
    type Output = T;

    fn index(&self, role: Role) -> &T {
        &self.0[role.index()]
    }
}

impl<T> IndexMut<Role> for RoleMap<T> {
    fn index_mut(&mut self, role: Role) -> &mut T {
        &mut self.0[role.index()]
    }
}

impl<T: Serialize> Serialize for RoleMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Role::COUNT))?;
        for (role, value) in self.iter() {
            map.serialize_entry(role.code(), value)?;
        }
        map.end()
    }
}

impl<'de, T: Deserialize<'de> + Default> Deserialize<'de> for RoleMap<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RoleMapVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de> + Default> Visitor<'de> for RoleMapVisitor<T> {
            type Value = RoleMap<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map keyed by role code")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut out = RoleMap::<T>::default();
                while let Some(key) = access.next_key::<String>()? {
                    match key.parse::<Role>() {
                        Ok(role) => out[role] = access.next_value()?,
                        // Unknown keys are tolerated, matching the engine's
                        // lenient posture toward collaborator payloads.
                        Err(_) => {
                            access.next_value::<de::IgnoredAny>()?;
                        }
                    }
                }
                Ok(out)
            }
        }

        deserializer.deserialize_map(RoleMapVisitor(PhantomData))
    }
}

//! Compiled-in tactic catalogs and the tactic search space built on them.
//!
//! Every catalog is a closed enum. Lookups by string key go through `FromStr`, which
//! fails with [`TacticError::UnknownKey`](crate::error::TacticError) instead of
//! handing an empty profile to the simulator.

/// A closed catalog of named entries addressed by a stable string key.
pub trait CatalogKey: Copy + Eq + std::hash::Hash + std::fmt::Debug + Send + Sync + 'static {
    /// Every entry, in enumeration order.
    const ALL: &'static [Self];
    /// Field name used in error messages.
    const FIELD: &'static str;

    fn key(self) -> &'static str;
}

macro_rules! catalog_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident : $field:literal {
            $($(#[$vmeta:meta])* $variant:ident => $key:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            pub const fn key(self) -> &'static str {
                match self {
                    $(Self::$variant => $key),+
                }
            }
        }

        impl $crate::catalog::CatalogKey for $name {
            const ALL: &'static [Self] = $name::ALL;
            const FIELD: &'static str = $field;

            fn key(self) -> &'static str {
                $name::key(self)
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::error::TacticError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($key => Ok(Self::$variant),)+
                    other => Err($crate::error::TacticError::UnknownKey {
                        field: $field,
                        key: other.to_string(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.key())
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.key())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

pub mod archetype;
pub mod formation;
pub mod space;
pub mod strategy;
pub mod tactic;

pub use archetype::{DefenderType, ForwardType, MidfielderType, StatLine};
pub use formation::{Formation, FormationProfile, Line, Phase, Role, Slot, SLOTS};
pub use space::TacticSpace;
pub use strategy::{AttackArea, AttackProfile, AttackStyle, BuildUp, DefenseProfile, DefenseStyle};
pub use tactic::{Gene, RawTactic, Tactic};

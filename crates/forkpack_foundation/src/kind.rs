//! Variable kinds for the source language.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The kind of a declared variable.
///
/// Entities are backed by an object tag, integers by a scoreboard slot,
/// and strings are substituted at compile time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum VariableKind {
    /// A tagged group of objects.
    Entity {
        /// Restricted to players (`@p` selectors).
        player: bool,
        /// Restricted to one object (`limit=1`).
        singleton: bool,
    },
    /// A scoreboard slot.
    Integer,
    /// A compile-time string.
    String,
}

impl VariableKind {
    /// The unrestricted entity kind.
    pub const ENTITY: Self = Self::Entity {
        player: false,
        singleton: false,
    };

    /// Parses a declaration clarifier (`e p 1 1p p1 i s`, plus `e1`/`1e`).
    #[must_use]
    pub fn from_declaration(clarifier: &str) -> Option<Self> {
        let kind = match clarifier {
            "e" => Self::ENTITY,
            "p" => Self::Entity {
                player: true,
                singleton: false,
            },
            "1" | "e1" | "1e" => Self::Entity {
                player: false,
                singleton: true,
            },
            "1p" | "p1" => Self::Entity {
                player: true,
                singleton: true,
            },
            "i" => Self::Integer,
            "s" => Self::String,
            _ => return None,
        };
        Some(kind)
    }

    /// Returns true for any entity kind.
    #[must_use]
    pub const fn is_entity(self) -> bool {
        matches!(self, Self::Entity { .. })
    }

    /// Returns true for the integer kind.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::Integer)
    }

    /// Returns true for the string kind.
    #[must_use]
    pub const fn is_string(self) -> bool {
        matches!(self, Self::String)
    }

    /// Narrows an entity kind with extra use-site flags.
    ///
    /// Flags only ever add restrictions. Non-entity kinds are returned as-is.
    #[must_use]
    pub const fn narrowed(self, extra_player: bool, extra_singleton: bool) -> Self {
        match self {
            Self::Entity { player, singleton } => Self::Entity {
                player: player || extra_player,
                singleton: singleton || extra_singleton,
            },
            other => other,
        }
    }

    /// Returns the canonical declaration clarifier for this kind.
    #[must_use]
    pub const fn clarifier(self) -> &'static str {
        match self {
            Self::Entity {
                player: false,
                singleton: false,
            } => "e",
            Self::Entity {
                player: true,
                singleton: false,
            } => "p",
            Self::Entity {
                player: false,
                singleton: true,
            } => "1",
            Self::Entity {
                player: true,
                singleton: true,
            } => "1p",
            Self::Integer => "i",
            Self::String => "s",
        }
    }
}

impl Default for VariableKind {
    fn default() -> Self {
        Self::ENTITY
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity { player, singleton } => {
                let noun = if *player { "player" } else { "entity" };
                if *singleton {
                    write!(f, "single {noun}")
                } else {
                    write!(f, "{noun}")
                }
            }
            Self::Integer => write!(f, "integer"),
            Self::String => write!(f, "string"),
        }
    }
}

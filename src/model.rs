//! Shared data model: annotation vocabulary and the manifest records.

use clap::ValueEnum;
use serde::Serialize;
use std::fmt;

/// Value of the `@type` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TagType {
    Command,
    Event,
}

impl TagType {
    pub fn as_str(self) -> &'static str {
        match self {
            TagType::Command => "command",
            TagType::Event => "event",
        }
    }
}

impl fmt::Display for TagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of the `@durability` tag on events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Durability {
    #[default]
    Volatile,
    Persistent,
}

impl fmt::Display for Durability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Durability::Volatile => "volatile",
            Durability::Persistent => "persistent",
        })
    }
}

/// C++ member access level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl Visibility {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "public" => Some(Visibility::Public),
            "protected" => Some(Visibility::Protected),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        }
    }
}

/// Modes listed at the top of a manifest when none are given.
pub const DEFAULT_MODES: [&str; 5] = ["normal", "diagnostics", "provisioning", "recovery", "low_power"];

/// Complete manifest for one header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Manifest {
    pub version: u32,
    pub modes: Vec<String>,
    pub subsystem: String,
    pub commands: Vec<CommandRecord>,
}

/// One tagged command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandRecord {
    /// `cmd.<snake_subsystem>.<snake_name>`
    pub id: String,
    pub name: String,
    pub allowed_modes: Vec<String>,
    pub request: Request,
    pub emit: Vec<String>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    /// First parameter type, or `void`.
    #[serde(rename = "type")]
    pub type_name: String,
}

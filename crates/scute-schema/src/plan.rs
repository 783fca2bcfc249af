//! Detect plans, the consolidated plan, and per-buildpack build plans.

use crate::buildpack::Buildpack;
use serde::{Deserialize, Serialize};
use toml::Table;

/// A named dependency token a buildpack offers to later group members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provide {
    pub name: String,
}

impl Provide {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A named dependency token a buildpack demands from earlier group members,
/// with optional free-form metadata for the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Require {
    pub name: String,
    #[serde(default, skip_serializing_if = "Table::is_empty")]
    pub metadata: Table,
}

impl Require {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metadata: Table::new(),
        }
    }
}

/// The plan file written by one buildpack's `bin/detect`: a primary
/// provides/requires block plus zero or more alternatives.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DetectPlan {
    #[serde(default)]
    pub provides: Vec<Provide>,
    #[serde(default)]
    pub requires: Vec<Require>,
    #[serde(default, rename = "or")]
    pub alternatives: Vec<PlanAlternative>,
}

/// An alternative provides/requires block; when selected, it replaces the
/// primary block entirely.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlanAlternative {
    #[serde(default)]
    pub provides: Vec<Provide>,
    #[serde(default)]
    pub requires: Vec<Require>,
}

/// The consolidated plan persisted between the detect and build phases
/// (`plan.toml`): one entry per require name, grouping every provider of
/// that name with every require of it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub entries: Vec<PlanEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub providers: Vec<Buildpack>,
    pub requires: Vec<Require>,
}

/// The plan handed to (and re-read from) one buildpack's `bin/build`: the
/// flattened requires of every consolidated entry that names it as a
/// provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildPlan {
    #[serde(default)]
    pub entries: Vec<Require>,
}

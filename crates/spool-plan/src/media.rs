// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Media type identities and the registry that owns them.
//!
//! A media type is a case-insensitive `(super, type)` pair such as
//! `application/pdf`. The registry stores each distinct pair exactly once and
//! hands out a [`MediaTypeId`]; every other structure in the planner refers to
//! types through that handle.

use std::fmt;
use std::str::FromStr;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{HandleKind, PlanError};

/// Super-type reserved for synthetic per-printer sink types.
pub const SINK_SUPER_TYPE: &str = "printer";

/// Longest accepted super-type name, in bytes.
pub const MAX_SUPER_LEN: usize = 15;

/// Longest accepted type name, in bytes.
pub const MAX_TYPE_LEN: usize = 255;

/// Stable handle for a media type inside one [`TypeRegistry`].
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct MediaTypeId(pub(crate) u32);

impl MediaTypeId {
    /// Position of the type in the registry arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Raw handle value (for diagnostics).
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// A `(super, type)` media type, stored lowercased.
///
/// Serializes as its `super/type` text; deserializing goes through
/// [`MediaType::new`], so invalid names are rejected and case is folded.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MediaType {
    super_type: String,
    sub_type: String,
}

impl MediaType {
    /// Validates and normalizes a pair.
    pub fn new(super_type: &str, sub_type: &str) -> Result<Self, PlanError> {
        validate_part("super-type", super_type, MAX_SUPER_LEN)?;
        validate_part("type", sub_type, MAX_TYPE_LEN)?;
        Ok(Self {
            super_type: super_type.to_ascii_lowercase(),
            sub_type: sub_type.to_ascii_lowercase(),
        })
    }

    /// The super-type, e.g. `application`.
    pub fn super_type(&self) -> &str {
        &self.super_type
    }

    /// The type below the super-type, e.g. `pdf`.
    pub fn sub_type(&self) -> &str {
        &self.sub_type
    }

    /// True for synthetic per-printer sink types (`printer/<name>`).
    ///
    /// Sink types are plumbing; they are never reported as document inputs.
    pub fn is_sink(&self) -> bool {
        self.super_type == SINK_SUPER_TYPE
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.super_type, self.sub_type)
    }
}

impl FromStr for MediaType {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (sup, sub) = s
            .split_once('/')
            .ok_or_else(|| PlanError::InvalidName(format!("{s:?} is not super/type")))?;
        Self::new(sup, sub)
    }
}

impl TryFrom<String> for MediaType {
    type Error = PlanError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MediaType> for String {
    fn from(media: MediaType) -> Self {
        media.to_string()
    }
}

fn validate_part(what: &str, value: &str, max: usize) -> Result<(), PlanError> {
    if value.is_empty() {
        return Err(PlanError::InvalidName(format!("empty {what}")));
    }
    if value.len() > max {
        return Err(PlanError::InvalidName(format!(
            "{what} {value:?} exceeds {max} bytes"
        )));
    }
    if let Some(bad) = value
        .chars()
        .find(|c| *c == '/' || c.is_whitespace() || c.is_control())
    {
        return Err(PlanError::InvalidName(format!(
            "{what} {value:?} contains {bad:?}"
        )));
    }
    Ok(())
}

/// Arena of media types addressed by [`MediaTypeId`].
///
/// Types are append-only: once created a handle stays valid for the
/// registry's lifetime.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: Vec<MediaType>,
    by_name: FxHashMap<MediaType, MediaTypeId>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handle for `super/type`, creating the type when unknown.
    pub fn add_type(&mut self, super_type: &str, sub_type: &str) -> Result<MediaTypeId, PlanError> {
        self.insert(MediaType::new(super_type, sub_type)?)
    }

    /// Registers the sink type `printer/<printer_name>`.
    pub fn add_sink_type(&mut self, printer_name: &str) -> Result<MediaTypeId, PlanError> {
        self.add_type(SINK_SUPER_TYPE, printer_name)
    }

    /// Registers an already validated media type.
    pub fn insert(&mut self, media: MediaType) -> Result<MediaTypeId, PlanError> {
        if let Some(id) = self.by_name.get(&media) {
            return Ok(*id);
        }
        let raw = u32::try_from(self.types.len())
            .map_err(|_| PlanError::InvalidName(format!("registry full, cannot add {media}")))?;
        self.types.try_reserve(1)?;
        self.by_name.try_reserve(1)?;
        let id = MediaTypeId(raw);
        self.by_name.insert(media.clone(), id);
        self.types.push(media);
        Ok(id)
    }

    /// Case-insensitive lookup.
    pub fn lookup(&self, super_type: &str, sub_type: &str) -> Option<MediaTypeId> {
        let key = MediaType {
            super_type: super_type.to_ascii_lowercase(),
            sub_type: sub_type.to_ascii_lowercase(),
        };
        self.by_name.get(&key).copied()
    }

    /// Looks up a `super/type` string.
    pub fn lookup_str(&self, name: &str) -> Option<MediaTypeId> {
        let (sup, sub) = name.split_once('/')?;
        self.lookup(sup, sub)
    }

    /// Returns the type behind `id`.
    pub fn get(&self, id: MediaTypeId) -> Option<&MediaType> {
        self.types.get(id.index())
    }

    pub(crate) fn check(&self, id: MediaTypeId) -> Result<&MediaType, PlanError> {
        self.get(id).ok_or(PlanError::InvalidReference {
            kind: HandleKind::MediaType,
            index: id.0,
        })
    }

    /// True when `id` names a sink type. Unknown handles are not sinks.
    pub fn is_sink(&self, id: MediaTypeId) -> bool {
        self.get(id).is_some_and(MediaType::is_sink)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no types are registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterates `(handle, type)` in registration order.
    #[allow(clippy::cast_possible_truncation)] // `insert` keeps len within u32
    pub fn iter(&self) -> impl Iterator<Item = (MediaTypeId, &MediaType)> {
        self.types
            .iter()
            .enumerate()
            .map(|(i, t)| (MediaTypeId(i as u32), t))
    }
}

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable handle to a vertex slot. The generation changes whenever the slot is
/// freed, so a handle to a removed vertex never aliases a later one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexId {
    pub index: u32,
    pub generation: u32,
}

impl VertexId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.generation == 0 {
            write!(f, "#{}", self.index)
        } else {
            write!(f, "#{}@{}", self.index, self.generation)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VertexKind {
    Person,
    Relationship,
    ChildHub,
    Virtual,
}

impl VertexKind {
    pub fn is_real(self) -> bool {
        self != VertexKind::Virtual
    }
}

impl fmt::Display for VertexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VertexKind::Person => "person",
            VertexKind::Relationship => "relationship",
            VertexKind::ChildHub => "childhub",
            VertexKind::Virtual => "virtual",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M", alias = "m", alias = "male")]
    Male,
    #[serde(rename = "F", alias = "f", alias = "female", alias = "fem")]
    Female,
    #[default]
    #[serde(rename = "U", alias = "u", alias = "unknown")]
    Unknown,
}

impl Gender {
    pub fn opposite(self) -> Gender {
        match self {
            Gender::Male => Gender::Female,
            Gender::Female => Gender::Male,
            Gender::Unknown => Gender::Unknown,
        }
    }

    /// Whether two people of these genders may form a partnership.
    pub fn compatible_with(self, other: Gender) -> bool {
        self == Gender::Unknown || other == Gender::Unknown || self.opposite() == other
    }
}

/// Display and structural properties attached to a vertex. Only persons use the
/// gender and twin fields; unknown keys survive a build/serialize round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VertexProperties {
    #[serde(default)]
    pub gender: Gender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twin_group: Option<u32>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_adopted: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl VertexProperties {
    pub fn with_gender(gender: Gender) -> Self {
        Self {
            gender,
            ..Default::default()
        }
    }
}

/// Everything needed to create a vertex, apart from its edges.
#[derive(Debug, Clone)]
pub struct VertexSpec {
    pub name: String,
    pub kind: VertexKind,
    pub properties: VertexProperties,
    pub width: Option<u32>,
}

impl VertexSpec {
    pub fn new(name: impl Into<String>, kind: VertexKind) -> Self {
        Self {
            name: name.into(),
            kind,
            properties: VertexProperties::default(),
            width: None,
        }
    }

    pub fn person(name: impl Into<String>, gender: Gender) -> Self {
        Self {
            properties: VertexProperties::with_gender(gender),
            ..Self::new(name, VertexKind::Person)
        }
    }

    pub fn with_properties(mut self, properties: VertexProperties) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Vertex {
    pub name: String,
    pub kind: VertexKind,
    pub properties: VertexProperties,
    pub width: u32,
    pub(crate) out_edges: Vec<(VertexId, u32)>,
    pub(crate) in_edges: Vec<VertexId>,
}

impl Vertex {
    pub fn out_edges(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.out_edges.iter().map(|(target, _)| *target)
    }

    pub fn in_edges(&self) -> &[VertexId] {
        &self.in_edges
    }

    pub fn out_degree(&self) -> usize {
        self.out_edges.len()
    }

    pub fn in_degree(&self) -> usize {
        self.in_edges.len()
    }

    pub fn weight_to(&self, target: VertexId) -> Option<u32> {
        self.out_edges
            .iter()
            .find(|(t, _)| *t == target)
            .map(|(_, weight)| *weight)
    }
}

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::{Graph, VertexId, VertexKind, VertexProperties, VertexSpec};
use crate::error::{GraphError, Result};

/// Serialized vertex: a kind, optional identity, properties and out-edges.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VertexDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default = "default_kind")]
    pub kind: VertexKind,
    /// Set on relationships whose childhub is listed as its own descriptor.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hub: bool,
    #[serde(default, alias = "prop")]
    pub properties: VertexProperties,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, alias = "outedges", skip_serializing_if = "Vec::is_empty")]
    pub out_edges: Vec<EdgeDescriptor>,
}

fn default_kind() -> VertexKind {
    VertexKind::Person
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeDescriptor {
    pub to: EdgeTarget,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EdgeTarget {
    Id(u64),
    Name(String),
}

impl VertexDescriptor {
    pub fn new(kind: VertexKind, name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
            kind,
            hub: false,
            properties: VertexProperties::default(),
            width: None,
            out_edges: Vec::new(),
        }
    }

    pub fn edge_to(mut self, target: impl Into<String>) -> Self {
        self.out_edges.push(EdgeDescriptor {
            to: EdgeTarget::Name(target.into()),
            weight: None,
        });
        self
    }

    pub fn weighted_edge_to(mut self, target: impl Into<String>, weight: u32) -> Self {
        self.out_edges.push(EdgeDescriptor {
            to: EdgeTarget::Name(target.into()),
            weight: Some(weight),
        });
        self
    }

    pub fn with_properties(mut self, properties: VertexProperties) -> Self {
        self.properties = properties;
        self
    }

    fn display_name(&self) -> Option<String> {
        match (&self.name, self.id) {
            (Some(name), _) => Some(name.clone()),
            (None, Some(id)) => Some(id.to_string()),
            (None, None) => None,
        }
    }
}

impl Graph {
    /// Builds and validates a graph from descriptors.
    ///
    /// Vertices are allocated in descriptor order. A relationship without
    /// `hub` gets an implicit childhub named `chhub_<name>`; its declared
    /// out-edges are moved onto that childhub and the relationship links to
    /// it with the heaviest child weight.
    pub fn build(descriptors: &[VertexDescriptor]) -> Result<Graph> {
        Self::build_with_widths(descriptors, 1, 1)
    }

    pub fn build_with_widths(
        descriptors: &[VertexDescriptor],
        person_width: u32,
        non_person_width: u32,
    ) -> Result<Graph> {
        let mut graph = Graph::with_default_widths(person_width, non_person_width);
        let mut by_descriptor_id: HashMap<u64, VertexId> = HashMap::new();
        let mut by_name: HashMap<String, VertexId> = HashMap::new();
        let mut allocated: Vec<(VertexId, Option<VertexId>)> = Vec::with_capacity(descriptors.len());

        for (position, descriptor) in descriptors.iter().enumerate() {
            let Some(name) = descriptor.display_name() else {
                return Err(GraphError::MalformedInput(format!(
                    "descriptor #{position} has neither id nor name"
                )));
            };
            if by_name.contains_key(&name) {
                return Err(GraphError::MalformedInput(format!(
                    "vertex name [{name}] is used twice"
                )));
            }
            let id = graph.add_vertex(VertexSpec {
                name: name.clone(),
                kind: descriptor.kind,
                properties: descriptor.properties.clone(),
                width: descriptor.width,
            })?;
            if let Some(descriptor_id) = descriptor.id {
                if by_descriptor_id.insert(descriptor_id, id).is_some() {
                    return Err(GraphError::MalformedInput(format!(
                        "vertex id {descriptor_id} is used twice"
                    )));
                }
            }
            by_name.insert(name.clone(), id);

            let hub = if descriptor.kind == VertexKind::Relationship && !descriptor.hub {
                let hub_name = format!("chhub_{name}");
                let hub = graph.add_vertex(VertexSpec {
                    name: hub_name.clone(),
                    kind: VertexKind::ChildHub,
                    properties: VertexProperties::default(),
                    width: descriptor.width,
                })?;
                by_name.insert(hub_name, hub);
                Some(hub)
            } else {
                None
            };
            allocated.push((id, hub));
        }

        let resolve = |target: &EdgeTarget| -> Result<VertexId> {
            let found = match target {
                EdgeTarget::Id(id) => by_descriptor_id.get(id),
                EdgeTarget::Name(name) => by_name.get(name),
            };
            found.copied().ok_or_else(|| {
                GraphError::MalformedInput(format!("edge target {target:?} does not exist"))
            })
        };

        for (descriptor, (id, hub)) in descriptors.iter().zip(&allocated) {
            let source = hub.unwrap_or(*id);
            let mut heaviest = 0;
            for edge in &descriptor.out_edges {
                let target = resolve(&edge.to)?;
                let weight = edge.weight.unwrap_or(1).max(1);
                heaviest = heaviest.max(weight);
                graph.add_edge(source, target, weight)?;
            }
            if let Some(hub) = hub {
                graph.add_edge(*id, *hub, heaviest.max(1))?;
            }
        }

        graph.validate()?;
        Ok(graph)
    }

    /// Parses a JSON array of descriptors and builds the graph.
    pub fn from_json(input: &str) -> crate::error::Result<Graph, crate::error::Error> {
        let descriptors: Vec<VertexDescriptor> = serde_json::from_str(input)?;
        Ok(Graph::build(&descriptors)?)
    }

    /// Descriptors that rebuild an equivalent graph: every vertex is listed
    /// with an explicit id, relationships carry `hub`, edges target ids.
    pub fn serialize(&self) -> Vec<VertexDescriptor> {
        let positions: HashMap<VertexId, u64> = self
            .vertices()
            .enumerate()
            .map(|(position, (id, _))| (id, position as u64))
            .collect();
        let mut used_names: HashSet<&str> = HashSet::new();
        self.vertices()
            .map(|(id, vertex)| {
                let name = if used_names.insert(vertex.name.as_str()) {
                    Some(vertex.name.clone())
                } else {
                    None
                };
                VertexDescriptor {
                    id: positions.get(&id).copied(),
                    name,
                    kind: vertex.kind,
                    hub: vertex.kind == VertexKind::Relationship,
                    properties: vertex.properties.clone(),
                    width: Some(vertex.width),
                    out_edges: vertex
                        .out_edges
                        .iter()
                        .filter_map(|(target, weight)| {
                            Some(EdgeDescriptor {
                                to: EdgeTarget::Id(*positions.get(target)?),
                                weight: Some(*weight),
                            })
                        })
                        .collect(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Gender;

    fn nuclear_family() -> Vec<VertexDescriptor> {
        serde_json::from_str(
            r#"[
                {"name": "father", "properties": {"gender": "M"}, "outEdges": [{"to": "marriage"}]},
                {"name": "mother", "properties": {"gender": "F"}, "outEdges": [{"to": "marriage"}]},
                {"name": "marriage", "kind": "relationship", "outEdges": [{"to": "son", "weight": 2}, {"to": "daughter"}]},
                {"name": "son", "properties": {"gender": "M"}},
                {"name": "daughter", "properties": {"gender": "F", "twinGroup": 1}}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn builds_implicit_childhub() {
        let graph = Graph::build(&nuclear_family()).unwrap();
        let marriage = graph.vertex_by_name("marriage").unwrap();
        let hub = graph.vertex_by_name("chhub_marriage").unwrap();
        assert!(graph.is_childhub(hub));
        assert_eq!(graph.out_edges(marriage).unwrap(), vec![hub]);
        assert_eq!(graph.edge_weight(marriage, hub), Some(2));
        assert_eq!(graph.out_edges(hub).unwrap().len(), 2);
        let daughter = graph.vertex_by_name("daughter").unwrap();
        let props = &graph.vertex(daughter).unwrap().properties;
        assert_eq!(props.gender, Gender::Female);
        assert_eq!(props.twin_group, Some(1));
    }

    #[test]
    fn rejects_descriptor_without_identity() {
        let descriptors: Vec<VertexDescriptor> = serde_json::from_str(r#"[{"kind": "person"}]"#).unwrap();
        assert!(matches!(
            Graph::build(&descriptors),
            Err(GraphError::MalformedInput(_))
        ));
    }

    #[test]
    fn rejects_unknown_targets_and_duplicate_names() {
        let mut descriptors = nuclear_family();
        descriptors[3] = descriptors[3].clone().edge_to("nobody");
        assert!(matches!(
            Graph::build(&descriptors),
            Err(GraphError::MalformedInput(_))
        ));

        let mut descriptors = nuclear_family();
        descriptors.push(VertexDescriptor::new(VertexKind::Person, "son"));
        assert!(matches!(
            Graph::build(&descriptors),
            Err(GraphError::MalformedInput(_))
        ));
    }

    #[test]
    fn numeric_ids_resolve_targets() {
        let descriptors: Vec<VertexDescriptor> = serde_json::from_str(
            r#"[
                {"id": 0, "outedges": [{"to": 2}]},
                {"id": 1, "outedges": [{"to": 2}]},
                {"id": 2, "kind": "relationship", "outedges": [{"to": 3}]},
                {"id": 3}
            ]"#,
        )
        .unwrap();
        let graph = Graph::build(&descriptors).unwrap();
        assert_eq!(graph.vertex_count(), 5);
        assert_eq!(graph.vertex_by_name("0").map(|id| graph.is_person(id)), Some(true));
    }

    #[test]
    fn serialize_round_trips() {
        let graph = Graph::build(&nuclear_family()).unwrap();
        let rebuilt = Graph::build(&graph.serialize()).unwrap();
        assert!(graph.same_structure(&rebuilt));
        assert_eq!(rebuilt.vertex_count(), graph.vertex_count());
    }

    #[test]
    fn validation_failure_is_reported() {
        let descriptors: Vec<VertexDescriptor> = serde_json::from_str(
            r#"[
                {"name": "a", "outEdges": [{"to": "r"}]},
                {"name": "r", "kind": "relationship", "outEdges": [{"to": "c"}]},
                {"name": "c"}
            ]"#,
        )
        .unwrap();
        let err = Graph::build(&descriptors).unwrap_err();
        assert_eq!(err.rule(), Some(crate::error::Rule::RelationshipTwoPartners));
    }
}

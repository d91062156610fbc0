mod build;
mod edit;
mod query;
mod split;
pub(crate) mod types;
mod validate;

pub use build::{EdgeDescriptor, EdgeTarget, VertexDescriptor};
pub use edit::Partnership;
pub use split::{Ranks, max_rank};
pub use types::*;

use std::collections::HashMap;

use crate::error::{GraphError, Result};

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    vertex: Option<Vertex>,
}

/// Typed pedigree multigraph stored in a generation-checked slot arena.
///
/// Vertex handles stay valid across unrelated insertions and removals; the
/// real/virtual split is carried by [`VertexKind`] rather than by id ranges.
#[derive(Debug, Clone)]
pub struct Graph {
    slots: Vec<Slot>,
    free: Vec<u32>,
    names: HashMap<String, VertexId>,
    default_person_width: u32,
    default_non_person_width: u32,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    pub fn new() -> Self {
        Self::with_default_widths(1, 1)
    }

    pub fn with_default_widths(person_width: u32, non_person_width: u32) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            names: HashMap::new(),
            default_person_width: person_width.max(1),
            default_non_person_width: non_person_width.max(1),
        }
    }

    pub fn default_width(&self, kind: VertexKind) -> u32 {
        match kind {
            VertexKind::Person => self.default_person_width,
            _ => self.default_non_person_width,
        }
    }

    pub fn contains(&self, id: VertexId) -> bool {
        self.vertex(id).is_ok()
    }

    pub fn vertex(&self, id: VertexId) -> Result<&Vertex> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.vertex.as_ref())
            .ok_or(GraphError::InvalidId(id))
    }

    fn vertex_mut(&mut self, id: VertexId) -> Result<&mut Vertex> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.vertex.as_mut())
            .ok_or(GraphError::InvalidId(id))
    }

    pub fn kind(&self, id: VertexId) -> Result<VertexKind> {
        Ok(self.vertex(id)?.kind)
    }

    pub fn is_person(&self, id: VertexId) -> bool {
        self.kind(id).is_ok_and(|kind| kind == VertexKind::Person)
    }

    pub fn is_relationship(&self, id: VertexId) -> bool {
        self.kind(id).is_ok_and(|kind| kind == VertexKind::Relationship)
    }

    pub fn is_childhub(&self, id: VertexId) -> bool {
        self.kind(id).is_ok_and(|kind| kind == VertexKind::ChildHub)
    }

    pub fn is_virtual(&self, id: VertexId) -> bool {
        self.kind(id).is_ok_and(|kind| kind == VertexKind::Virtual)
    }

    pub(crate) fn expect_kind(&self, id: VertexId, expected: VertexKind) -> Result<&Vertex> {
        let vertex = self.vertex(id)?;
        if vertex.kind != expected {
            return Err(GraphError::UnexpectedKind {
                vertex: id,
                expected,
                found: vertex.kind,
            });
        }
        Ok(vertex)
    }

    pub fn vertex_by_name(&self, name: &str) -> Option<VertexId> {
        self.names.get(name).copied()
    }

    pub fn name(&self, id: VertexId) -> Result<&str> {
        Ok(self.vertex(id)?.name.as_str())
    }

    /// All live vertices in slot order.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &Vertex)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.vertex
                .as_ref()
                .map(|vertex| (VertexId::new(index as u32, slot.generation), vertex))
        })
    }

    pub fn vertex_ids(&self) -> Vec<VertexId> {
        self.vertices().map(|(id, _)| id).collect()
    }

    pub fn real_vertex_ids(&self) -> Vec<VertexId> {
        self.vertices()
            .filter(|(_, vertex)| vertex.kind.is_real())
            .map(|(id, _)| id)
            .collect()
    }

    pub fn vertex_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.vertex.is_some()).count()
    }

    pub fn real_vertex_count(&self) -> usize {
        self.vertices()
            .filter(|(_, vertex)| vertex.kind.is_real())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.vertex_count() == 0
    }

    pub fn out_edges(&self, id: VertexId) -> Result<Vec<VertexId>> {
        Ok(self.vertex(id)?.out_edges().collect())
    }

    pub fn in_edges(&self, id: VertexId) -> Result<&[VertexId]> {
        Ok(self.vertex(id)?.in_edges())
    }

    pub fn has_edge(&self, from: VertexId, to: VertexId) -> bool {
        self.edge_weight(from, to).is_some()
    }

    pub fn edge_weight(&self, from: VertexId, to: VertexId) -> Option<u32> {
        self.vertex(from).ok()?.weight_to(to)
    }

    /// Every edge as `(from, to, weight)`, sources in slot order.
    pub fn edges(&self) -> Vec<(VertexId, VertexId, u32)> {
        self.vertices()
            .flat_map(|(id, vertex)| {
                vertex
                    .out_edges
                    .iter()
                    .map(move |(target, weight)| (id, *target, *weight))
            })
            .collect()
    }

    /// Real vertices with no in-edges.
    pub fn parentless_vertices(&self) -> Vec<VertexId> {
        self.vertices()
            .filter(|(_, vertex)| vertex.kind.is_real() && vertex.in_edges.is_empty())
            .map(|(id, _)| id)
            .collect()
    }

    /// Real vertices that have in-edges but no out-edges.
    pub fn leaf_vertices(&self) -> Vec<VertexId> {
        self.vertices()
            .filter(|(_, vertex)| {
                vertex.kind.is_real() && !vertex.in_edges.is_empty() && vertex.out_edges.is_empty()
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// Allocates a vertex without edges. Real vertices must have unique names;
    /// virtual vertex names are informational and never indexed.
    pub(crate) fn add_vertex(&mut self, spec: VertexSpec) -> Result<VertexId> {
        let registers_name = spec.kind.is_real() && !spec.name.is_empty();
        if registers_name && self.names.contains_key(&spec.name) {
            return Err(GraphError::MalformedInput(format!(
                "vertex name [{}] is already in use",
                spec.name
            )));
        }
        let width = spec.width.unwrap_or_else(|| self.default_width(spec.kind));
        let vertex = Vertex {
            name: spec.name,
            kind: spec.kind,
            properties: spec.properties,
            width: width.max(1),
            out_edges: Vec::new(),
            in_edges: Vec::new(),
        };
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.vertex = Some(vertex);
                VertexId::new(index, slot.generation)
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    vertex: Some(vertex),
                });
                VertexId::new(self.slots.len() as u32 - 1, 0)
            }
        };
        if registers_name {
            let name = self.vertex(id)?.name.clone();
            self.names.insert(name, id);
        }
        Ok(id)
    }

    /// Inserts a vertex together with its edges; every supplied edge gets
    /// `weight`. On error the graph is left as it was.
    pub fn insert_vertex(
        &mut self,
        spec: VertexSpec,
        in_edges: &[VertexId],
        out_edges: &[VertexId],
        weight: u32,
    ) -> Result<VertexId> {
        for endpoint in in_edges.iter().chain(out_edges) {
            self.vertex(*endpoint)?;
        }
        let id = self.add_vertex(spec)?;
        if let Err(err) = self.connect(id, in_edges, out_edges, weight) {
            self.remove_vertex(id)?;
            return Err(err);
        }
        Ok(id)
    }

    fn connect(
        &mut self,
        id: VertexId,
        in_edges: &[VertexId],
        out_edges: &[VertexId],
        weight: u32,
    ) -> Result<()> {
        for source in in_edges {
            self.add_edge(*source, id, weight)?;
        }
        for target in out_edges {
            self.add_edge(id, *target, weight)?;
        }
        Ok(())
    }

    /// Detaches every edge of `id` and frees its slot.
    pub fn remove_vertex(&mut self, id: VertexId) -> Result<Vertex> {
        let vertex = self.vertex(id)?.clone();
        for (target, _) in &vertex.out_edges {
            if let Ok(target) = self.vertex_mut(*target) {
                remove_first(&mut target.in_edges, id);
            }
        }
        for source in &vertex.in_edges {
            if let Ok(source) = self.vertex_mut(*source) {
                source.out_edges.retain(|(target, _)| *target != id);
            }
        }
        if self.names.get(&vertex.name) == Some(&id) {
            self.names.remove(&vertex.name);
        }
        let slot = &mut self.slots[id.index as usize];
        slot.vertex = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Ok(vertex)
    }

    pub fn add_edge(&mut self, from: VertexId, to: VertexId, weight: u32) -> Result<()> {
        self.vertex(to)?;
        if self.vertex(from)?.weight_to(to).is_some() {
            return Err(GraphError::DuplicateEdge { from, to });
        }
        self.vertex_mut(from)?.out_edges.push((to, weight.max(1)));
        self.vertex_mut(to)?.in_edges.push(from);
        Ok(())
    }

    /// Removes the edge and returns its weight.
    pub fn remove_edge(&mut self, from: VertexId, to: VertexId) -> Result<u32> {
        self.vertex(to)?;
        let source = self.vertex_mut(from)?;
        let Some(position) = source.out_edges.iter().position(|(t, _)| *t == to) else {
            return Err(GraphError::MissingEdge { from, to });
        };
        let (_, weight) = source.out_edges.remove(position);
        remove_first(&mut self.vertex_mut(to)?.in_edges, from);
        Ok(weight)
    }

    /// Reconnects the single predecessor of a virtual vertex straight to its
    /// single successor and leaves the vertex detached.
    pub fn unplug_virtual_vertex(&mut self, id: VertexId) -> Result<()> {
        let vertex = self.expect_kind(id, VertexKind::Virtual)?;
        let (Some(&parent), Some(&(child, _))) = (vertex.in_edges.first(), vertex.out_edges.first())
        else {
            return Ok(());
        };
        let weight = self.remove_edge(parent, id)?;
        self.remove_edge(id, child)?;
        self.add_edge(parent, child, weight)
    }

    /// Follows a chain of virtual vertices downwards to the first real vertex.
    pub fn down_to_real(&self, mut id: VertexId) -> Result<VertexId> {
        let mut guard = self.slots.len();
        while self.vertex(id)?.kind == VertexKind::Virtual {
            let vertex = self.vertex(id)?;
            let Some(&(next, _)) = vertex.out_edges.first() else {
                return Err(GraphError::invariant(
                    crate::error::Rule::VirtualSingleOutEdge,
                    vertex.name.clone(),
                ));
            };
            id = next;
            guard = guard.saturating_sub(1);
            if guard == 0 {
                return Err(GraphError::invariant(crate::error::Rule::Acyclic, vertex.name.clone()));
            }
        }
        Ok(id)
    }

    /// Follows a chain of virtual vertices upwards to the first real vertex.
    pub fn up_to_real(&self, mut id: VertexId) -> Result<VertexId> {
        let mut guard = self.slots.len();
        while self.vertex(id)?.kind == VertexKind::Virtual {
            let vertex = self.vertex(id)?;
            let Some(&next) = vertex.in_edges.first() else {
                return Err(GraphError::invariant(
                    crate::error::Rule::VirtualSingleInEdge,
                    vertex.name.clone(),
                ));
            };
            id = next;
            guard = guard.saturating_sub(1);
            if guard == 0 {
                return Err(GraphError::invariant(crate::error::Rule::Acyclic, vertex.name.clone()));
            }
        }
        Ok(id)
    }

    /// Real out-neighbours, looking through virtual chains.
    pub fn real_out_edges(&self, id: VertexId) -> Result<Vec<VertexId>> {
        self.vertex(id)?
            .out_edges()
            .map(|target| self.down_to_real(target))
            .collect()
    }

    /// Real in-neighbours, looking through virtual chains.
    pub fn real_in_edges(&self, id: VertexId) -> Result<Vec<VertexId>> {
        self.vertex(id)?
            .in_edges
            .iter()
            .map(|source| self.up_to_real(*source))
            .collect()
    }

    /// Compares real vertices (name, kind, properties) and real edges with
    /// weights, ignoring virtual vertices and slot layout.
    pub fn same_structure(&self, other: &Graph) -> bool {
        let mut ours = self.real_signature();
        let mut theirs = other.real_signature();
        ours.sort();
        theirs.sort();
        ours == theirs
            && self.vertices().filter(|(_, v)| v.kind.is_real()).all(|(_, v)| {
                other
                    .vertex_by_name(&v.name)
                    .and_then(|id| other.vertex(id).ok())
                    .is_some_and(|w| w.kind == v.kind && w.properties == v.properties)
            })
    }

    fn real_signature(&self) -> Vec<(String, String, u32)> {
        let mut signature = Vec::new();
        for (id, vertex) in self.vertices() {
            if !vertex.kind.is_real() {
                continue;
            }
            for (target, weight) in &vertex.out_edges {
                let target_name = self
                    .down_to_real(*target)
                    .and_then(|real| self.name(real).map(str::to_string))
                    .unwrap_or_default();
                signature.push((vertex.name.clone(), target_name, *weight));
            }
            if vertex.out_edges.is_empty() {
                signature.push((self.name(id).unwrap_or_default().to_string(), String::new(), 0));
            }
        }
        signature
    }
}

fn remove_first(list: &mut Vec<VertexId>, value: VertexId) {
    if let Some(position) = list.iter().position(|v| *v == value) {
        list.remove(position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(graph: &mut Graph, name: &str) -> VertexId {
        graph
            .add_vertex(VertexSpec::person(name, Gender::Unknown))
            .unwrap()
    }

    #[test]
    fn removed_ids_become_invalid_and_slots_are_reused() {
        let mut graph = Graph::new();
        let a = person(&mut graph, "a");
        let b = person(&mut graph, "b");
        graph.remove_vertex(a).unwrap();
        assert_eq!(graph.vertex(a).unwrap_err(), GraphError::InvalidId(a));
        let c = person(&mut graph, "c");
        assert_eq!(c.index, a.index);
        assert_ne!(c, a);
        assert_eq!(graph.name(b).unwrap(), "b");
        assert_eq!(graph.vertex_by_name("a"), None);
    }

    #[test]
    fn duplicate_edges_are_rejected() {
        let mut graph = Graph::new();
        let a = person(&mut graph, "a");
        let r = graph
            .add_vertex(VertexSpec::new("r", VertexKind::Relationship))
            .unwrap();
        graph.add_edge(a, r, 2).unwrap();
        assert_eq!(
            graph.add_edge(a, r, 1),
            Err(GraphError::DuplicateEdge { from: a, to: r })
        );
        assert_eq!(graph.edge_weight(a, r), Some(2));
        assert_eq!(graph.remove_edge(a, r), Ok(2));
        assert_eq!(
            graph.remove_edge(a, r),
            Err(GraphError::MissingEdge { from: a, to: r })
        );
    }

    #[test]
    fn insert_vertex_keeps_existing_ids() {
        let mut graph = Graph::new();
        let a = person(&mut graph, "a");
        let b = person(&mut graph, "b");
        let r = graph
            .insert_vertex(VertexSpec::new("r", VertexKind::Relationship), &[a, b], &[], 3)
            .unwrap();
        assert_eq!(graph.name(a).unwrap(), "a");
        assert_eq!(graph.in_edges(r).unwrap(), &[a, b]);
        assert_eq!(graph.edge_weight(b, r), Some(3));
    }

    #[test]
    fn remove_vertex_detaches_edges() {
        let mut graph = Graph::new();
        let a = person(&mut graph, "a");
        let b = person(&mut graph, "b");
        let r = graph
            .insert_vertex(VertexSpec::new("r", VertexKind::Relationship), &[a, b], &[], 1)
            .unwrap();
        graph.remove_vertex(r).unwrap();
        assert!(graph.out_edges(a).unwrap().is_empty());
        assert_eq!(graph.parentless_vertices(), vec![a, b]);
    }

    #[test]
    fn rejected_insert_leaves_graph_untouched() {
        let mut graph = Graph::new();
        let a = person(&mut graph, "a");
        let err = graph
            .insert_vertex(VertexSpec::new("r", VertexKind::Relationship), &[a, a], &[], 1)
            .unwrap_err();
        assert!(matches!(err, GraphError::DuplicateEdge { from, .. } if from == a));
        assert_eq!(graph.vertex_count(), 1);
        assert!(graph.out_edges(a).unwrap().is_empty());
        assert!(graph.in_edges(a).unwrap().is_empty());
        assert_eq!(graph.vertex_by_name("r"), None);
        assert!(graph.edges().is_empty());

        let gone = person(&mut graph, "gone");
        graph.remove_vertex(gone).unwrap();
        assert_eq!(
            graph.insert_vertex(VertexSpec::new("r", VertexKind::Relationship), &[a, gone], &[], 1),
            Err(GraphError::InvalidId(gone))
        );
        assert_eq!(graph.vertex_count(), 1);

        let r = graph
            .insert_vertex(VertexSpec::new("r", VertexKind::Relationship), &[a], &[], 1)
            .unwrap();
        assert_eq!(graph.vertex_by_name("r"), Some(r));
        assert_eq!(graph.out_edges(a).unwrap(), vec![r]);
    }

    #[test]
    fn rejected_edge_leaves_graph_untouched() {
        let mut graph = Graph::new();
        let a = person(&mut graph, "a");
        let b = person(&mut graph, "b");
        let gone = person(&mut graph, "gone");
        graph.remove_vertex(gone).unwrap();
        graph.add_edge(a, b, 4).unwrap();

        assert!(graph.add_edge(a, b, 1).is_err());
        assert_eq!(graph.add_edge(a, gone, 1), Err(GraphError::InvalidId(gone)));
        assert_eq!(graph.add_edge(gone, b, 1), Err(GraphError::InvalidId(gone)));
        assert_eq!(graph.edges(), vec![(a, b, 4)]);
        assert_eq!(graph.in_edges(b).unwrap(), &[a]);
        assert_eq!(graph.vertex_count(), 2);
    }

    #[test]
    fn leaves_and_founders_are_computed_on_demand() {
        let mut graph = Graph::new();
        let a = person(&mut graph, "a");
        let b = person(&mut graph, "b");
        let r = graph
            .insert_vertex(VertexSpec::new("r", VertexKind::Relationship), &[a, b], &[], 1)
            .unwrap();
        let hub = graph
            .insert_vertex(VertexSpec::new("hub", VertexKind::ChildHub), &[r], &[], 1)
            .unwrap();
        assert_eq!(graph.leaf_vertices(), vec![hub]);
        let c = graph
            .insert_vertex(VertexSpec::person("c", Gender::Male), &[hub], &[], 1)
            .unwrap();
        assert_eq!(graph.leaf_vertices(), vec![c]);
        assert_eq!(graph.parentless_vertices(), vec![a, b]);
    }

    #[test]
    fn unplugging_a_virtual_vertex_reconnects_its_ends() {
        let mut graph = Graph::new();
        let a = person(&mut graph, "a");
        let r = graph
            .add_vertex(VertexSpec::new("r", VertexKind::Relationship))
            .unwrap();
        let v = graph
            .insert_vertex(VertexSpec::new("a->r_0", VertexKind::Virtual), &[a], &[r], 3)
            .unwrap();
        assert_eq!(graph.real_out_edges(a).unwrap(), vec![r]);

        graph.unplug_virtual_vertex(v).unwrap();
        assert_eq!(graph.edge_weight(a, r), Some(3));
        assert!(graph.out_edges(v).unwrap().is_empty());
        assert!(graph.in_edges(v).unwrap().is_empty());
        graph.unplug_virtual_vertex(v).unwrap();
        assert_eq!(graph.edges(), vec![(a, r, 3)]);

        assert!(matches!(
            graph.unplug_virtual_vertex(a),
            Err(GraphError::UnexpectedKind { .. })
        ));
    }

    #[test]
    fn name_collisions_are_malformed_input() {
        let mut graph = Graph::new();
        person(&mut graph, "a");
        let err = graph
            .add_vertex(VertexSpec::person("a", Gender::Male))
            .unwrap_err();
        assert!(matches!(err, GraphError::MalformedInput(_)));
    }
}

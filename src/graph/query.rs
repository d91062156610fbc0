use std::collections::{BTreeSet, HashSet, VecDeque};

use super::{Graph, VertexId, VertexKind};
use crate::error::Result;

impl Graph {
    /// The relationship whose childhub produced `person`, if any.
    pub fn producing_relationship(&self, person: VertexId) -> Result<Option<VertexId>> {
        let vertex = self.expect_kind(person, VertexKind::Person)?;
        let Some(&source) = vertex.in_edges.first() else {
            return Ok(None);
        };
        let hub = self.up_to_real(source)?;
        match self.vertex(hub)?.in_edges.first() {
            Some(&rel) => Ok(Some(self.up_to_real(rel)?)),
            None => Ok(None),
        }
    }

    pub fn relationship_childhub(&self, relationship: VertexId) -> Result<Option<VertexId>> {
        self.expect_kind(relationship, VertexKind::Relationship)?;
        Ok(self.real_out_edges(relationship)?.first().copied())
    }

    pub fn relationship_children(&self, relationship: VertexId) -> Result<Vec<VertexId>> {
        match self.relationship_childhub(relationship)? {
            Some(hub) => self.real_out_edges(hub),
            None => Ok(Vec::new()),
        }
    }

    /// The two parents of `person`, or nothing when it has none.
    pub fn parents_of(&self, person: VertexId) -> Result<Vec<VertexId>> {
        match self.producing_relationship(person)? {
            Some(rel) => self.real_in_edges(rel),
            None => Ok(Vec::new()),
        }
    }

    /// Partners of `person`, one entry per relationship.
    pub fn partners_of(&self, person: VertexId) -> Result<Vec<VertexId>> {
        self.expect_kind(person, VertexKind::Person)?;
        let mut partners = Vec::new();
        for rel in self.real_out_edges(person)? {
            for partner in self.real_in_edges(rel)? {
                if partner != person {
                    partners.push(partner);
                }
            }
        }
        Ok(partners)
    }

    pub fn relationships_of(&self, person: VertexId) -> Result<Vec<VertexId>> {
        self.expect_kind(person, VertexKind::Person)?;
        self.real_out_edges(person)
    }

    /// Children of `person` across all of its relationships.
    pub fn children_of(&self, person: VertexId) -> Result<Vec<VertexId>> {
        let mut children = Vec::new();
        for rel in self.relationships_of(person)? {
            children.extend(self.relationship_children(rel)?);
        }
        Ok(children)
    }

    /// Every person from whom `person` descends.
    pub fn ancestors_of(&self, person: VertexId) -> Result<BTreeSet<VertexId>> {
        let mut ancestors = BTreeSet::new();
        let mut stack = self.parents_of(person)?;
        while let Some(next) = stack.pop() {
            if ancestors.insert(next) {
                stack.extend(self.parents_of(next)?);
            }
        }
        Ok(ancestors)
    }

    pub fn is_descendant_of(&self, person: VertexId, ancestor: VertexId) -> Result<bool> {
        self.vertex(ancestor)?;
        Ok(self.ancestors_of(person)?.contains(&ancestor))
    }

    /// Siblings born under the same childhub that share `person`'s twin group.
    pub fn twins_of(&self, person: VertexId) -> Result<Vec<VertexId>> {
        let vertex = self.expect_kind(person, VertexKind::Person)?;
        let Some(group) = vertex.properties.twin_group else {
            return Ok(Vec::new());
        };
        let Some(&source) = vertex.in_edges.first() else {
            return Ok(Vec::new());
        };
        let hub = self.up_to_real(source)?;
        let mut twins = Vec::new();
        for sibling in self.real_out_edges(hub)? {
            if sibling != person && self.vertex(sibling)?.properties.twin_group == Some(group) {
                twins.push(sibling);
            }
        }
        Ok(twins)
    }

    /// Fewest partnership hops from `from` to `to`; `None` when unconnected.
    pub fn steps_to_node(&self, from: VertexId, to: VertexId) -> Result<Option<usize>> {
        self.expect_kind(from, VertexKind::Person)?;
        self.expect_kind(to, VertexKind::Person)?;
        let mut seen = HashSet::from([from]);
        let mut queue = VecDeque::from([(from, 0usize)]);
        while let Some((vertex, steps)) = queue.pop_front() {
            if vertex == to {
                return Ok(Some(steps));
            }
            for partner in self.partners_of(vertex)? {
                if seen.insert(partner) {
                    queue.push_back((partner, steps + 1));
                }
            }
        }
        Ok(None)
    }

    /// Two distinct persons with compatible genders that are either not linked
    /// by partnerships at all or are an odd number of partnerships apart.
    pub fn can_partner_with(&self, a: VertexId, b: VertexId) -> Result<bool> {
        let gender_a = self.expect_kind(a, VertexKind::Person)?.properties.gender;
        let gender_b = self.expect_kind(b, VertexKind::Person)?.properties.gender;
        if a == b || !gender_a.compatible_with(gender_b) {
            return Ok(false);
        }
        Ok(match self.steps_to_node(a, b)? {
            None => true,
            Some(steps) => steps % 2 == 1,
        })
    }

    pub fn can_be_parent_of(&self, parent: VertexId, child: VertexId) -> Result<bool> {
        self.expect_kind(parent, VertexKind::Person)?;
        self.expect_kind(child, VertexKind::Person)?;
        if parent == child || self.producing_relationship(child)?.is_some() {
            return Ok(false);
        }
        if self.children_of(parent)?.contains(&child) {
            return Ok(false);
        }
        Ok(!self.is_descendant_of(parent, child)?)
    }
}

use std::collections::HashSet;

use super::{Graph, VertexId, VertexKind};
use crate::error::{GraphError, Result, Rule};

impl Graph {
    /// Checks every structural rule. Edges are judged by the real vertex at
    /// the far end of any virtual chain, so rank-split graphs validate too.
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }

        for (id, vertex) in self.vertices() {
            let fail = |rule: Rule| GraphError::invariant(rule, vertex.name.clone());
            match vertex.kind {
                VertexKind::Person => {
                    if vertex.in_degree() > 1 {
                        return Err(fail(Rule::PersonSingleProducingPregnancy));
                    }
                    for target in self.real_out_edges(id)? {
                        if !self.is_relationship(target) {
                            return Err(fail(Rule::PersonOutEdgesToRelationships));
                        }
                    }
                }
                VertexKind::Relationship => {
                    let targets = self.real_out_edges(id)?;
                    match targets.as_slice() {
                        [] => return Err(fail(Rule::RelationshipHasChildhub)),
                        [target] if !self.is_childhub(*target) => {
                            return Err(fail(Rule::RelationshipOutEdgeToChildhub));
                        }
                        [_] => {}
                        _ => return Err(fail(Rule::RelationshipSingleOutEdge)),
                    }
                    let partners = self.real_in_edges(id)?;
                    if partners.len() != 2 || partners.iter().any(|p| !self.is_person(*p)) {
                        return Err(fail(Rule::RelationshipTwoPartners));
                    }
                }
                VertexKind::ChildHub => {
                    let children = self.real_out_edges(id)?;
                    if children.is_empty() {
                        return Err(fail(Rule::ChildhubHasChildren));
                    }
                    if children.iter().any(|child| !self.is_person(*child)) {
                        return Err(fail(Rule::ChildhubOutEdgesToPersons));
                    }
                    let sources = self.real_in_edges(id)?;
                    if sources.len() != 1 || !self.is_relationship(sources[0]) {
                        return Err(fail(Rule::ChildhubSingleRelationship));
                    }
                }
                VertexKind::Virtual => {
                    if vertex.in_degree() != 1 {
                        return Err(fail(Rule::VirtualSingleInEdge));
                    }
                    if vertex.out_degree() != 1 {
                        return Err(fail(Rule::VirtualSingleOutEdge));
                    }
                }
            }
        }

        let roots = self.parentless_vertices();
        let Some(&first_root) = roots.first() else {
            let name = self.vertices().next().map(|(_, v)| v.name.clone());
            return Err(GraphError::invariant(Rule::Acyclic, name.unwrap_or_default()));
        };
        if let Some(vertex) = self.find_cycle() {
            return Err(GraphError::invariant(Rule::Acyclic, self.name(vertex)?.to_string()));
        }

        let reachable = self.weakly_reachable(first_root);
        if let Some((_, vertex)) = self.vertices().find(|(id, _)| !reachable.contains(id)) {
            return Err(GraphError::invariant(Rule::Connected, vertex.name.clone()));
        }
        Ok(())
    }

    /// Returns a vertex on a directed cycle, if any.
    fn find_cycle(&self) -> Option<VertexId> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Open,
            Done,
        }
        let mut marks: std::collections::HashMap<VertexId, Mark> = Default::default();
        for (start, _) in self.vertices() {
            if marks.contains_key(&start) {
                continue;
            }
            let mut stack: Vec<(VertexId, usize)> = vec![(start, 0)];
            marks.insert(start, Mark::Open);
            while let Some((vertex, next)) = stack.last().copied() {
                let targets = self.vertex(vertex).ok()?.out_edges.as_slice();
                if let Some(&(target, _)) = targets.get(next) {
                    if let Some(top) = stack.last_mut() {
                        top.1 += 1;
                    }
                    match marks.get(&target) {
                        Some(Mark::Open) => return Some(target),
                        Some(Mark::Done) => {}
                        None => {
                            marks.insert(target, Mark::Open);
                            stack.push((target, 0));
                        }
                    }
                } else {
                    marks.insert(vertex, Mark::Done);
                    stack.pop();
                }
            }
        }
        None
    }

    fn weakly_reachable(&self, start: VertexId) -> HashSet<VertexId> {
        let mut reachable = HashSet::from([start]);
        let mut stack = vec![start];
        while let Some(vertex) = stack.pop() {
            let Ok(data) = self.vertex(vertex) else {
                continue;
            };
            for next in data.out_edges().chain(data.in_edges.iter().copied()) {
                if reachable.insert(next) {
                    stack.push(next);
                }
            }
        }
        reachable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Gender, VertexSpec};

    fn couple_with_child() -> (Graph, [VertexId; 5]) {
        let mut graph = Graph::new();
        let father = graph.add_vertex(VertexSpec::person("father", Gender::Male)).unwrap();
        let mother = graph.add_vertex(VertexSpec::person("mother", Gender::Female)).unwrap();
        let rel = graph
            .insert_vertex(VertexSpec::new("rel", VertexKind::Relationship), &[father, mother], &[], 1)
            .unwrap();
        let hub = graph
            .insert_vertex(VertexSpec::new("hub", VertexKind::ChildHub), &[rel], &[], 1)
            .unwrap();
        let child = graph
            .insert_vertex(VertexSpec::person("child", Gender::Unknown), &[hub], &[], 1)
            .unwrap();
        (graph, [father, mother, rel, hub, child])
    }

    #[test]
    fn valid_family_passes() {
        let (graph, _) = couple_with_child();
        graph.validate().unwrap();
        Graph::new().validate().unwrap();
    }

    #[test]
    fn second_producing_pregnancy_is_rejected() {
        let (mut graph, [_, _, _, _, child]) = couple_with_child();
        let a = graph.add_vertex(VertexSpec::person("a", Gender::Male)).unwrap();
        let b = graph.add_vertex(VertexSpec::person("b", Gender::Female)).unwrap();
        let rel = graph
            .insert_vertex(VertexSpec::new("rel2", VertexKind::Relationship), &[a, b], &[], 1)
            .unwrap();
        graph
            .insert_vertex(VertexSpec::new("hub2", VertexKind::ChildHub), &[rel], &[child], 1)
            .unwrap();
        assert_eq!(
            graph.validate().unwrap_err().rule(),
            Some(Rule::PersonSingleProducingPregnancy)
        );
    }

    #[test]
    fn childless_hub_is_rejected() {
        let (mut graph, [_, _, _, hub, child]) = couple_with_child();
        graph.remove_edge(hub, child).unwrap();
        assert_eq!(graph.validate().unwrap_err().rule(), Some(Rule::ChildhubHasChildren));
    }

    #[test]
    fn disconnected_person_is_rejected() {
        let (mut graph, _) = couple_with_child();
        graph.add_vertex(VertexSpec::person("stranger", Gender::Unknown)).unwrap();
        assert_eq!(graph.validate().unwrap_err().rule(), Some(Rule::Connected));
    }

    #[test]
    fn cycles_are_rejected() {
        let (mut graph, [father, _, _, _, child]) = couple_with_child();
        let other = graph.add_vertex(VertexSpec::person("other", Gender::Female)).unwrap();
        let rel = graph
            .insert_vertex(VertexSpec::new("loop", VertexKind::Relationship), &[child, other], &[], 1)
            .unwrap();
        // father is grafted below his own grandchild's union
        graph
            .insert_vertex(VertexSpec::new("loop_hub", VertexKind::ChildHub), &[rel], &[father], 1)
            .unwrap();
        assert_eq!(graph.validate().unwrap_err().rule(), Some(Rule::Acyclic));
    }
}

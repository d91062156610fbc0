use super::{Gender, Graph, VertexId, VertexKind, VertexProperties, VertexSpec};
use crate::error::{GraphError, Result, Rule};

/// Vertices created or joined by a partnership edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partnership {
    pub partners: [VertexId; 2],
    pub relationship: VertexId,
    pub childhub: VertexId,
    pub children: Vec<VertexId>,
}

impl Graph {
    /// Adds a child below an existing childhub.
    pub fn add_child(&mut self, childhub: VertexId, properties: VertexProperties) -> Result<VertexId> {
        self.expect_kind(childhub, VertexKind::ChildHub)?;
        self.apply(|graph| {
            let name = graph.fresh_name("child");
            let spec = VertexSpec::new(name, VertexKind::Person).with_properties(properties);
            graph.insert_vertex(spec, &[childhub], &[], 1)
        })
    }

    /// Places an existing parentless person below `childhub`. Fails with
    /// `IllegalParent` when either partner of the childhub's relationship
    /// cannot become the person's parent.
    pub fn assign_child(&mut self, childhub: VertexId, child: VertexId) -> Result<()> {
        self.expect_kind(childhub, VertexKind::ChildHub)?;
        self.expect_kind(child, VertexKind::Person)?;
        let parents = match self.in_edges(childhub)?.first() {
            Some(relationship) => self.real_in_edges(*relationship)?,
            None => Vec::new(),
        };
        for parent in parents {
            if !self.can_be_parent_of(parent, child)? {
                return Err(GraphError::IllegalParent { parent, child });
            }
        }
        self.apply(|graph| graph.add_edge(childhub, child, 1))
    }

    /// Gives a parentless person a father, a mother and the partnership
    /// joining them.
    pub fn add_parents(&mut self, person: VertexId) -> Result<Partnership> {
        self.expect_kind(person, VertexKind::Person)?;
        if self.producing_relationship(person)?.is_some() {
            return Err(GraphError::invariant(
                Rule::PersonSingleProducingPregnancy,
                self.name(person)?,
            ));
        }
        self.apply(|graph| {
            let name = graph.fresh_name("father");
            let father = graph.add_vertex(VertexSpec::person(name, Gender::Male))?;
            let name = graph.fresh_name("mother");
            let mother = graph.add_vertex(VertexSpec::person(name, Gender::Female))?;
            let name = graph.fresh_name("rel");
            let relationship = graph.insert_vertex(
                VertexSpec::new(name, VertexKind::Relationship),
                &[father, mother],
                &[],
                1,
            )?;
            let name = graph.fresh_name("chhub");
            let childhub = graph.insert_vertex(
                VertexSpec::new(name, VertexKind::ChildHub),
                &[relationship],
                &[person],
                1,
            )?;
            Ok(Partnership {
                partners: [father, mother],
                relationship,
                childhub,
                children: vec![person],
            })
        })
    }

    /// Joins two persons with a new relationship whose childhub holds one
    /// placeholder child.
    pub fn add_partnership(
        &mut self,
        a: VertexId,
        b: VertexId,
        child_properties: VertexProperties,
    ) -> Result<Partnership> {
        if !self.can_partner_with(a, b)? {
            return Err(GraphError::IncompatiblePartners { a, b });
        }
        self.apply(|graph| {
            let name = graph.fresh_name("rel");
            let relationship =
                graph.insert_vertex(VertexSpec::new(name, VertexKind::Relationship), &[a, b], &[], 1)?;
            let name = graph.fresh_name("chhub");
            let childhub = graph.insert_vertex(
                VertexSpec::new(name, VertexKind::ChildHub),
                &[relationship],
                &[],
                1,
            )?;
            let name = graph.fresh_name("child");
            let child = graph.insert_vertex(
                VertexSpec::new(name, VertexKind::Person)
                    .with_properties(child_properties),
                &[childhub],
                &[],
                1,
            )?;
            Ok(Partnership {
                partners: [a, b],
                relationship,
                childhub,
                children: vec![child],
            })
        })
    }

    /// Runs an edit batch on a copy and keeps it only if the result validates.
    fn apply<T>(&mut self, edit: impl FnOnce(&mut Graph) -> Result<T>) -> Result<T> {
        let mut next = self.clone();
        let value = edit(&mut next)?;
        next.validate()?;
        *self = next;
        Ok(value)
    }

    fn fresh_name(&self, prefix: &str) -> String {
        let mut counter = self.vertex_count();
        loop {
            let name = format!("{prefix}_{counter}");
            if self.vertex_by_name(&name).is_none() {
                return name;
            }
            counter += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_person() -> (Graph, VertexId) {
        let mut graph = Graph::new();
        let id = graph
            .add_vertex(VertexSpec::person("proband", Gender::Female))
            .unwrap();
        (graph, id)
    }

    #[test]
    fn edit_sequence_keeps_graph_valid() {
        let (mut graph, proband) = single_person();
        let parents = graph.add_parents(proband).unwrap();
        graph.validate().unwrap();
        assert_eq!(graph.parents_of(proband).unwrap(), parents.partners.to_vec());

        let brother = graph
            .add_child(parents.childhub, VertexProperties::with_gender(Gender::Male))
            .unwrap();
        graph.validate().unwrap();
        assert_eq!(
            graph.children_of(parents.partners[0]).unwrap(),
            vec![proband, brother]
        );

        let grandparents = graph.add_parents(parents.partners[0]).unwrap();
        graph.validate().unwrap();
        assert!(graph.is_descendant_of(brother, grandparents.partners[1]).unwrap());

        let sister_in_law = graph
            .add_vertex(VertexSpec::person("sister_in_law", Gender::Female))
            .unwrap();
        let family = graph
            .add_partnership(brother, sister_in_law, VertexProperties::default())
            .unwrap();
        graph.validate().unwrap();
        assert_eq!(graph.partners_of(brother).unwrap(), vec![sister_in_law]);
        assert!(graph.twins_of(family.children[0]).unwrap().is_empty());

        let err = graph.add_parents(proband).unwrap_err();
        assert_eq!(err.rule(), Some(Rule::PersonSingleProducingPregnancy));
        graph.validate().unwrap();
    }

    #[test]
    fn partnership_creates_relationship_hub_and_child() {
        let (mut graph, proband) = single_person();
        let parents = graph.add_parents(proband).unwrap();
        let mother = parents.partners[1];
        let spouse = graph
            .add_vertex(VertexSpec::person("spouse", Gender::Male))
            .unwrap();
        let before = graph.vertex_count();

        let err = graph
            .add_partnership(proband, mother, VertexProperties::default())
            .unwrap_err();
        assert_eq!(err, GraphError::IncompatiblePartners { a: proband, b: mother });
        assert_eq!(graph.vertex_count(), before);

        let partnership = graph
            .add_partnership(proband, spouse, VertexProperties::default())
            .unwrap();
        assert_eq!(graph.vertex_count(), before + 3);
        assert_eq!(
            graph.relationship_childhub(partnership.relationship).unwrap(),
            Some(partnership.childhub)
        );
        assert_eq!(
            graph.parents_of(partnership.children[0]).unwrap(),
            vec![proband, spouse]
        );
        graph.validate().unwrap();
    }

    #[test]
    fn failed_edit_leaves_graph_untouched() {
        let (mut graph, proband) = single_person();
        let snapshot = graph.clone();
        assert!(graph.add_partnership(proband, proband, VertexProperties::default()).is_err());
        assert!(graph.same_structure(&snapshot));
        assert!(matches!(
            graph.add_child(proband, VertexProperties::default()),
            Err(GraphError::UnexpectedKind { .. })
        ));
    }

    #[test]
    fn ancestors_cannot_be_assigned_as_children() {
        let (mut graph, proband) = single_person();
        let parents = graph.add_parents(proband).unwrap();
        let father = parents.partners[0];
        let spouse = graph
            .add_vertex(VertexSpec::person("spouse", Gender::Male))
            .unwrap();
        let family = graph
            .add_partnership(proband, spouse, VertexProperties::default())
            .unwrap();
        let snapshot = graph.clone();

        assert_eq!(
            graph.assign_child(family.childhub, father),
            Err(GraphError::IllegalParent { parent: proband, child: father })
        );
        assert!(graph.same_structure(&snapshot));
        assert_eq!(
            graph.assign_child(family.childhub, family.children[0]),
            Err(GraphError::IllegalParent { parent: proband, child: family.children[0] })
        );

        let adoptee = graph
            .add_vertex(VertexSpec::person("adoptee", Gender::Unknown))
            .unwrap();
        graph.assign_child(family.childhub, adoptee).unwrap();
        graph.validate().unwrap();
        assert_eq!(graph.parents_of(adoptee).unwrap(), vec![proband, spouse]);
    }

    #[test]
    fn removing_a_leaf_child_keeps_graph_valid() {
        let (mut graph, proband) = single_person();
        let parents = graph.add_parents(proband).unwrap();
        let sibling = graph
            .add_child(parents.childhub, VertexProperties::default())
            .unwrap();
        graph.remove_vertex(sibling).unwrap();
        graph.validate().unwrap();
        assert!(!graph.contains(sibling));
        assert!(graph.contains(proband));
    }
}

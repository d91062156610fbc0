use crate::crossing::PairScore;
use crate::error::OptimizerError;

/// A maximal group of edges linked by the crossing relation.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    /// Edge indices, ascending.
    pub edges: Vec<usize>,
    /// Sum over crossing pairs of the cheaper of the two stacked orders.
    pub lower_bound: f64,
    /// Heuristic estimate of the lanes a perfect arrangement needs.
    pub min_num_levels: u32,
    /// Highest minimum level among the edges (1 when unconstrained).
    pub min_required_level: u32,
    /// Score at which searching this component stops early.
    pub stop_score: f64,
}

impl Component {
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Decomposition {
    /// Ordered by smallest edge index.
    pub components: Vec<Component>,
    /// For every edge, the edges it crosses.
    pub crosses: Vec<Vec<usize>>,
}

/// Penalty for the number of lanes used; always in `[0, 1)` for valid input
/// so it never outweighs a single crossing.
pub fn levels_penalty(max_level_used: u32, min_required: u32, num_edges: usize) -> f64 {
    max_level_used.saturating_sub(min_required) as f64 / (num_edges + 1) as f64
}

struct DisjointSet {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            size: vec![1; len],
        }
    }

    fn find(&mut self, mut item: usize) -> usize {
        let mut root = item;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        while self.parent[item] != root {
            let next = self.parent[item];
            self.parent[item] = root;
            item = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let (a, b) = (self.find(a), self.find(b));
        if a == b {
            return;
        }
        let (big, small) = if self.size[a] >= self.size[b] { (a, b) } else { (b, a) };
        self.parent[small] = big;
        self.size[big] += self.size[small];
    }
}

/// Finds the crossing pairs among `num_edges` edges and groups them into
/// independently optimizable components.
pub fn decompose<S: PairScore + ?Sized>(
    num_edges: usize,
    score: &S,
    min_levels: Option<&[u32]>,
) -> Result<Decomposition, OptimizerError> {
    if let Some(min_levels) = min_levels {
        if min_levels.len() != num_edges {
            return Err(OptimizerError::MinLevelsMismatch {
                expected: num_edges,
                found: min_levels.len(),
            });
        }
    }
    let min_of = |edge: usize| min_levels.map_or(1, |levels| levels[edge].max(1));

    let mut crosses: Vec<Vec<usize>> = vec![Vec::new(); num_edges];
    let mut above_for_perfect: Vec<Vec<usize>> = vec![Vec::new(); num_edges];
    let mut pair_bounds: Vec<(usize, f64)> = Vec::new();
    let mut sets = DisjointSet::new(num_edges);

    for i in 0..num_edges {
        for j in i + 1..num_edges {
            if score.pair_score(i, j, 1, 1, &[]) != f64::INFINITY {
                continue;
            }
            crosses[i].push(j);
            crosses[j].push(i);
            sets.union(i, j);

            let score_above = score.pair_score(i, j, 1, 2, &[]);
            let score_below = score.pair_score(i, j, 2, 1, &[]);
            pair_bounds.push((i, score_above.min(score_below)));
            if score_above < score_below {
                above_for_perfect[i].push(j);
            }
            if score_above > score_below {
                above_for_perfect[j].push(i);
            }
        }
    }

    let mut component_of_root: Vec<Option<usize>> = vec![None; num_edges];
    let mut components: Vec<Component> = Vec::new();
    for edge in 0..num_edges {
        if crosses[edge].is_empty() {
            continue;
        }
        let root = sets.find(edge);
        let index = *component_of_root[root].get_or_insert_with(|| {
            components.push(Component {
                edges: Vec::new(),
                lower_bound: 0.0,
                min_num_levels: 1,
                min_required_level: 1,
                stop_score: 0.0,
            });
            components.len() - 1
        });
        components[index].edges.push(edge);
    }
    for (edge, bound) in pair_bounds {
        let root = sets.find(edge);
        if let Some(index) = component_of_root[root] {
            components[index].lower_bound += bound;
        }
    }

    for component in &mut components {
        let mut min_num_levels = 1;
        let mut min_required = 1;
        let mut min_min_level = u32::MAX;
        for &edge in &component.edges {
            min_required = min_required.max(min_of(edge));
            min_min_level = min_min_level.min(min_of(edge));

            let mut min_for_edge = min_of(edge);
            for &other in &above_for_perfect[edge] {
                let mut min_for_other = min_of(other);
                if !above_for_perfect[other].is_empty() && min_for_other == 1 {
                    min_for_other += 1;
                }
                min_for_edge = min_for_edge.max(min_for_other + 1);
            }
            min_num_levels = min_num_levels.max(min_for_edge);
        }
        let need_extra = if component.lower_bound > 0.0 { 1 } else { 0 };
        min_num_levels = min_num_levels.max(min_min_level.saturating_add(need_extra));

        component.min_num_levels = min_num_levels;
        component.min_required_level = min_required;
        component.stop_score =
            component.lower_bound + levels_penalty(min_num_levels, min_required, component.len());
    }

    log::debug!(
        "{num_edges} edges form {} crossing components",
        components.len()
    );
    Ok(Decomposition { components, crosses })
}

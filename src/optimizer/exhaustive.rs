use super::{VerticalPosOptimizer, reached};
use crate::crossing::PairScore;

struct Best {
    levels: Vec<u32>,
    score: f64,
}

impl<S: PairScore + ?Sized> VerticalPosOptimizer<'_, S> {
    /// Tries every level in `min..min + len` for every edge of the component,
    /// stopping as soon as the component's stop score is reached.
    pub(super) fn exhaustive_search(&self, index: usize, levels: &[u32]) -> Vec<u32> {
        let component = &self.decomposition.components[index];
        let mut best = Best {
            levels: levels.to_vec(),
            score: self.starting_score(levels, index),
        };
        if !reached(best.score, component.stop_score) {
            let mut work = levels.to_vec();
            self.search(index, &component.edges, 0, &mut work, &mut best);
        }
        log::debug!(
            "component {index}: exhaustive search over {} edges scored {}",
            component.len(),
            best.score
        );
        best.levels
    }

    /// Returns true once the stop score is reached.
    fn search(
        &self,
        index: usize,
        edges: &[usize],
        depth: usize,
        work: &mut [u32],
        best: &mut Best,
    ) -> bool {
        let stop_score = self.decomposition.components[index].stop_score;
        if depth == edges.len() {
            let score = self.component_score(work, index);
            if score < best.score {
                best.levels.copy_from_slice(work);
                best.score = score;
            }
            return reached(best.score, stop_score);
        }

        let edge = edges[depth];
        let min_value = self.min_level(edge);
        let max_value = min_value + edges.len() as u32 - 1;
        for level in min_value..=max_value {
            work[edge] = level;
            if self.search(index, edges, depth + 1, work, best) {
                return true;
            }
        }
        false
    }
}

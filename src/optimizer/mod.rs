mod annealing;
mod exhaustive;
mod observer;

pub use observer::{AnnealObserver, NoopObserver};

use crate::components::{Component, Decomposition, decompose, levels_penalty};
use crate::config::OptimizerConfig;
use crate::crossing::PairScore;
use crate::error::OptimizerError;

const SCORE_EPSILON: f64 = 1e-9;

fn reached(score: f64, stop_score: f64) -> bool {
    score <= stop_score + SCORE_EPSILON
}

/// Assigns an integer lane (level, starting at 1) to every edge so that the
/// summed pair penalties plus a small lane-count term are minimal.
///
/// Components are optimized one after another and never read each other's
/// levels, so a caller may also drive [`optimize_component`] per component.
///
/// [`optimize_component`]: VerticalPosOptimizer::optimize_component
pub struct VerticalPosOptimizer<'a, S: PairScore + ?Sized> {
    score: &'a S,
    init_levels: Vec<u32>,
    min_levels: Option<Vec<u32>>,
    decomposition: Decomposition,
}

impl<'a, S: PairScore + ?Sized> VerticalPosOptimizer<'a, S> {
    pub fn new(
        score: &'a S,
        init_levels: &[u32],
        min_levels: Option<&[u32]>,
    ) -> Result<Self, OptimizerError> {
        let decomposition = decompose(init_levels.len(), score, min_levels)?;
        let min_levels = min_levels
            .filter(|levels| levels.iter().any(|level| *level > 1))
            .map(<[u32]>::to_vec);
        Ok(Self {
            score,
            init_levels: init_levels.to_vec(),
            min_levels,
            decomposition,
        })
    }

    pub fn components(&self) -> &[Component] {
        &self.decomposition.components
    }

    pub fn crosses(&self, edge: usize) -> &[usize] {
        self.decomposition
            .crosses
            .get(edge)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn init_levels(&self) -> &[u32] {
        &self.init_levels
    }

    pub fn min_level(&self, edge: usize) -> u32 {
        self.min_levels
            .as_ref()
            .and_then(|levels| levels.get(edge))
            .map_or(1, |level| (*level).max(1))
    }

    /// Penalty of one component under `levels`, which holds a level for
    /// every edge. An assignment of the wrong length scores infinity.
    pub fn component_score(&self, levels: &[u32], index: usize) -> f64 {
        if levels.len() != self.init_levels.len() {
            return f64::INFINITY;
        }
        let Some(component) = self.decomposition.components.get(index) else {
            return 0.0;
        };
        let mut penalty = 0.0;
        let mut max_level_used = 0;
        for &edge in &component.edges {
            max_level_used = max_level_used.max(levels[edge]);
            for &other in &self.decomposition.crosses[edge] {
                if other > edge {
                    penalty += self
                        .score
                        .pair_score(edge, other, levels[edge], levels[other], levels);
                    if !penalty.is_finite() {
                        return penalty;
                    }
                }
            }
        }
        penalty + levels_penalty(max_level_used, component.min_required_level, component.len())
    }

    pub fn total_score(&self, levels: &[u32]) -> f64 {
        (0..self.decomposition.components.len())
            .map(|index| self.component_score(levels, index))
            .sum()
    }

    /// Optimizes the edges of component `index` and returns `levels` with
    /// only those edges changed.
    pub fn optimize_component(
        &self,
        index: usize,
        levels: &[u32],
        config: &OptimizerConfig,
        observer: &mut dyn AnnealObserver,
    ) -> Result<Vec<u32>, OptimizerError> {
        if levels.len() != self.init_levels.len() {
            return Err(OptimizerError::LevelsMismatch {
                expected: self.init_levels.len(),
                found: levels.len(),
            });
        }
        Ok(self.optimize_checked(index, levels, config, observer))
    }

    fn optimize_checked(
        &self,
        index: usize,
        levels: &[u32],
        config: &OptimizerConfig,
        observer: &mut dyn AnnealObserver,
    ) -> Vec<u32> {
        let Some(component) = self.decomposition.components.get(index) else {
            return levels.to_vec();
        };
        if component.len() <= config.max_full_search_size {
            self.exhaustive_search(index, levels)
        } else {
            let seed = config.seed.wrapping_add(index as u64);
            self.simulated_annealing(index, levels, config.max_steps, seed, observer)
        }
    }

    pub fn compute_vertical_positions(&self, config: &OptimizerConfig) -> Vec<u32> {
        self.compute_vertical_positions_with(config, &mut NoopObserver)
    }

    pub fn compute_vertical_positions_with(
        &self,
        config: &OptimizerConfig,
        observer: &mut dyn AnnealObserver,
    ) -> Vec<u32> {
        let mut levels = self.init_levels.clone();
        for index in 0..self.decomposition.components.len() {
            levels = self.optimize_checked(index, &levels, config, observer);
        }
        levels
    }

    /// Score of `levels` for component `index`, or infinity when an edge sits
    /// below its minimum level.
    fn starting_score(&self, levels: &[u32], index: usize) -> f64 {
        let component = &self.decomposition.components[index];
        if component
            .edges
            .iter()
            .any(|&edge| levels[edge] < self.min_level(edge))
        {
            return f64::INFINITY;
        }
        self.component_score(levels, index)
    }
}

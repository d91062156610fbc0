use super::{AnnealObserver, VerticalPosOptimizer, reached};
use crate::crossing::PairScore;

/// Upper bound on random draws while picking an edge or a new level.
const MAX_PICK_ATTEMPTS: usize = 1000;

/// Sine-based generator: reproducible for a given seed on every platform
/// with IEEE doubles.
#[derive(Debug, Clone)]
pub(crate) struct SineRandom {
    seed: f64,
}

impl SineRandom {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            seed: if seed == 0 { 1.0 } else { seed as f64 },
        }
    }

    /// Next value in `[0, 1)`.
    pub(crate) fn next_f64(&mut self) -> f64 {
        let x = self.seed.sin() * 16.0;
        self.seed += 1.0;
        x - x.floor()
    }

    fn below(&mut self, bound: usize) -> usize {
        ((self.next_f64() * bound as f64).floor() as usize).min(bound.saturating_sub(1))
    }
}

struct Move {
    edge: usize,
    old_level: u32,
    max_used_level: u32,
    is_below_all: bool,
    is_above_all: bool,
    forbidden: Vec<u32>,
}

impl<S: PairScore + ?Sized> VerticalPosOptimizer<'_, S> {
    pub(super) fn simulated_annealing(
        &self,
        index: usize,
        levels: &[u32],
        max_steps: usize,
        seed: u64,
        observer: &mut dyn AnnealObserver,
    ) -> Vec<u32> {
        let component = &self.decomposition.components[index];
        let mut random = SineRandom::new(seed);

        let init_score = self.starting_score(levels, index);
        let (mut best_state, mut best_score) = if init_score.is_finite() {
            (levels.to_vec(), init_score)
        } else {
            let state = self.basic_valid_assignment(index, levels);
            let score = self.component_score(&state, index);
            (state, score)
        };
        observer.on_start(index, best_score);

        let mut current_state = best_state.clone();
        let mut current_score = best_score;
        let max_wrong_direction = max_steps as f64 / 6.0;
        let mut best_step = 0;
        let mut steps = 0;

        for step in 0..=max_steps {
            if reached(best_score, component.stop_score) {
                break;
            }
            steps = step + 1;

            if (step - best_step) as f64 > max_wrong_direction {
                current_state.clone_from(&best_state);
                current_score = best_score;
                best_step = step;
                log::trace!("component {index}: reset to score {best_score} at step {step}");
                observer.on_reset(index, step, best_score);
            }

            let neighbour = self.compute_neighbour(&current_state, index, &mut random);
            let neighbour_score = self.component_score(&neighbour, index);
            if accept(current_score, neighbour_score, step - best_step, &mut random) {
                current_state = neighbour;
                current_score = neighbour_score;
            }

            if current_score < best_score {
                best_state.clone_from(&current_state);
                best_score = current_score;
                best_step = step;
                log::trace!("component {index}: new best {best_score} at step {step}");
                observer.on_improvement(index, step, best_score, &best_state);
            }
        }

        log::debug!(
            "component {index}: annealing over {} edges scored {best_score} after {steps} steps",
            component.len()
        );
        observer.on_finish(index, best_score, steps);
        best_state
    }

    /// Every edge of the component on its own level, ascending.
    fn basic_valid_assignment(&self, index: usize, levels: &[u32]) -> Vec<u32> {
        let mut state = levels.to_vec();
        let mut value = 1;
        for &edge in &self.decomposition.components[index].edges {
            value = value.max(self.min_level(edge));
            state[edge] = value;
            value += 1;
        }
        state
    }

    /// Moves one edge to a random other level, making room if the level is
    /// taken by an edge it crosses, then normalizes.
    fn compute_neighbour(&self, state: &[u32], index: usize, random: &mut SineRandom) -> Vec<u32> {
        let edges = &self.decomposition.components[index].edges;
        let mut next = state.to_vec();

        let Some(change) = self.pick_move(&next, edges, random) else {
            return next;
        };
        let mut new_level = None;
        for _ in 0..MAX_PICK_ATTEMPTS {
            // level 0 lets the edge drop under everything; normalize lifts it
            let candidate = random.below(change.max_used_level as usize + 2) as u32;
            let useless = candidate == change.old_level
                || (change.is_below_all && candidate < change.old_level)
                || (change.is_above_all && candidate > change.old_level);
            if !useless {
                new_level = Some(candidate);
                break;
            }
        }
        let Some(new_level) = new_level else {
            return next;
        };

        if change.forbidden.contains(&new_level) {
            for &edge in edges {
                if next[edge] <= new_level {
                    next[edge] += 1;
                }
            }
        }
        next[change.edge] = new_level;
        self.normalize(&mut next, index);
        next
    }

    fn pick_move(&self, state: &[u32], edges: &[usize], random: &mut SineRandom) -> Option<Move> {
        for _ in 0..MAX_PICK_ATTEMPTS {
            let edge = edges[random.below(edges.len())];
            let old_level = state[edge];
            let mut max_used_level = old_level;
            let mut is_below_all = true;
            let mut is_above_all = true;
            let mut forbidden = Vec::new();
            for &other in &self.decomposition.crosses[edge] {
                let level = state[other];
                max_used_level = max_used_level.max(level);
                forbidden.push(level);
                if level >= old_level {
                    is_above_all = false;
                }
                if level <= old_level {
                    is_below_all = false;
                }
            }
            if self.min_levels.is_some() && old_level == self.min_level(edge) {
                is_below_all = true;
            }
            if !(is_below_all && is_above_all) {
                return Some(Move {
                    edge,
                    old_level,
                    max_used_level,
                    is_below_all,
                    is_above_all,
                    forbidden,
                });
            }
        }
        None
    }

    /// Closes gaps between used levels, lifts the component above every
    /// minimum level, then pulls each edge down to just above the highest
    /// edge it crosses.
    pub(super) fn normalize(&self, levels: &mut [u32], index: usize) {
        let edges = &self.decomposition.components[index].edges;

        let mut used: Vec<u32> = edges.iter().map(|&edge| levels[edge]).collect();
        used.sort_unstable();
        used.dedup();
        for i in (1..used.len()).rev() {
            let gap = used[i] - used[i - 1] - 1;
            if gap > 0 {
                for &edge in edges {
                    if levels[edge] >= used[i] {
                        levels[edge] -= gap;
                    }
                }
            }
        }

        for &edge in edges {
            let min_level = self.min_level(edge);
            if levels[edge] < min_level {
                let adjust = min_level - levels[edge];
                for &other in edges {
                    levels[other] += adjust;
                }
            }
        }

        loop {
            let mut changed = false;
            for &edge in edges {
                let current = levels[edge];
                let min_level = self.min_level(edge);
                if current <= min_level {
                    continue;
                }
                let highest_below = self.decomposition.crosses[edge]
                    .iter()
                    .map(|&other| levels[other])
                    .filter(|level| *level < current)
                    .max()
                    .unwrap_or(0);
                let target = (highest_below + 1).max(min_level);
                if target < current {
                    levels[edge] = target;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
    }
}

/// Improvements are always taken; a worse state with a probability that
/// shrinks quickly as steps pass since the last reset.
fn accept(old_score: f64, new_score: f64, steps_since_reset: usize, random: &mut SineRandom) -> bool {
    if new_score <= old_score {
        return true;
    }
    let probability =
        (-(new_score - old_score) * (((steps_since_reset + 1) * 5) as f64).ln()).exp();
    probability > random.next_f64()
}

/// Hooks into the annealing search. Every method defaults to doing nothing.
pub trait AnnealObserver {
    fn on_start(&mut self, _component: usize, _score: f64) {}

    fn on_improvement(&mut self, _component: usize, _step: usize, _score: f64, _levels: &[u32]) {}

    fn on_reset(&mut self, _component: usize, _step: usize, _score: f64) {}

    fn on_finish(&mut self, _component: usize, _score: f64, _steps: usize) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl AnnealObserver for NoopObserver {}

use crate::layout::simulation::LayoutNode;
use log::debug;

/// Called after every tick with the current node positions.
pub type TickCallback = Box<dyn FnMut(&[LayoutNode]) + Send>;

/// A running layout that can be started, stopped, and observed.
pub trait LayoutSimulation: Send {
    fn start(&mut self);

    fn stop(&mut self);

    fn is_running(&self) -> bool;

    /// Register a per-tick observer.
    fn on_tick(&mut self, callback: TickCallback);

    /// Advance one step. Returns `false` once the simulation is stopped or cooled.
    fn tick(&mut self) -> bool;
}

/// Owns at most one live simulation.
///
/// Starting a new simulation stops the previous one first, so two layouts
/// never animate the same view at once.
pub struct SimulationDriver<S: LayoutSimulation> {
    active: Option<S>,
    generation: u64,
}

impl<S: LayoutSimulation> Default for SimulationDriver<S> {
    fn default() -> Self {
        Self {
            active: None,
            generation: 0,
        }
    }
}

impl<S: LayoutSimulation> SimulationDriver<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current simulation and start the new one.
    pub fn rebuild(&mut self, mut simulation: S) {
        if let Some(mut previous) = self.active.take() {
            previous.stop();
        }
        simulation.start();
        self.active = Some(simulation);
        self.generation += 1;
        debug!("Started layout simulation generation {}", self.generation);
    }

    /// Stop and drop the current simulation, returning it.
    pub fn stop(&mut self) -> Option<S> {
        let mut previous = self.active.take()?;
        previous.stop();
        Some(previous)
    }

    pub fn tick(&mut self) -> bool {
        self.active.as_mut().map(|s| s.tick()).unwrap_or(false)
    }

    pub fn active(&self) -> Option<&S> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut S> {
        self.active.as_mut()
    }

    /// Number of simulations started so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct StubSimulation {
        running: Arc<AtomicBool>,
        ticks: usize,
    }

    impl StubSimulation {
        fn new() -> (Self, Arc<AtomicBool>) {
            let running = Arc::new(AtomicBool::new(false));
            (
                Self {
                    running: running.clone(),
                    ticks: 0,
                },
                running,
            )
        }
    }

    impl LayoutSimulation for StubSimulation {
        fn start(&mut self) {
            self.running.store(true, Ordering::SeqCst);
        }

        fn stop(&mut self) {
            self.running.store(false, Ordering::SeqCst);
        }

        fn is_running(&self) -> bool {
            self.running.load(Ordering::SeqCst)
        }

        fn on_tick(&mut self, _callback: TickCallback) {}

        fn tick(&mut self) -> bool {
            if self.is_running() {
                self.ticks += 1;
            }
            self.is_running()
        }
    }

    #[test]
    fn test_rebuild_stops_previous() {
        let mut driver = SimulationDriver::new();
        let (first, first_running) = StubSimulation::new();
        let (second, second_running) = StubSimulation::new();

        driver.rebuild(first);
        assert!(first_running.load(Ordering::SeqCst));

        driver.rebuild(second);
        assert!(!first_running.load(Ordering::SeqCst));
        assert!(second_running.load(Ordering::SeqCst));
        assert_eq!(driver.generation(), 2);
    }

    #[test]
    fn test_tick_drives_active() {
        let mut driver = SimulationDriver::new();
        assert!(!driver.tick());

        let (sim, _) = StubSimulation::new();
        driver.rebuild(sim);
        assert!(driver.tick());
        assert!(driver.tick());
        assert_eq!(driver.active().map(|s| s.ticks), Some(2));

        let stopped = driver.stop().unwrap();
        assert!(!stopped.is_running());
        assert!(driver.active().is_none());
        assert!(!driver.tick());
    }
}

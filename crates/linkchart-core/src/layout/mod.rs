//! Force layout and the manual-linking interaction.
//!
//! The graph model is pure data; this module owns positions. A layout is
//! always rebuilt from scratch for a new model, never patched.

mod driver;
mod linking;
mod simulation;

pub use driver::{LayoutSimulation, SimulationDriver, TickCallback};
pub use linking::{ClickOutcome, LinkState, LinkingSession};
pub use simulation::{node_radius, ForceSimulation, LayoutNode, Point};

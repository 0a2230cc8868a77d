use crate::config::LayoutConfig;
use crate::graph::{GraphModel, GraphNode};
use crate::layout::driver::{LayoutSimulation, TickCallback};
use crate::types::{NodeId, NodeKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Position state of one node in a running layout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutNode {
    pub id: NodeId,
    pub radius: f64,
    pub position: Point,
    pub velocity: Point,

    /// Set while the node is dragged; the node sits here and ignores forces.
    pub pinned: Option<Point>,
}

/// Circle radius for a node: fixed for cases, growing with degree for entities.
pub fn node_radius(node: &GraphNode, config: &LayoutConfig) -> f64 {
    match node.kind {
        NodeKind::Case => config.case_radius,
        NodeKind::Entity => (config.entity_base_radius
            + config.entity_radius_per_connection * node.connection_count as f64)
            .min(config.entity_max_radius),
    }
}

/// Velocity-Verlet force layout: many-body repulsion, link springs,
/// per-axis centering, and collision.
pub struct ForceSimulation {
    config: LayoutConfig,
    nodes: Vec<LayoutNode>,
    index: HashMap<NodeId, usize>,
    links: Vec<(usize, usize)>,
    degree: Vec<usize>,
    alpha: f64,
    alpha_target: f64,
    running: bool,
    callbacks: Vec<TickCallback>,
}

impl ForceSimulation {
    /// Lay out `model` from a phyllotaxis spiral around the canvas center.
    pub fn new(model: &GraphModel, config: LayoutConfig) -> Self {
        let center = Point::new(config.width / 2.0, config.height / 2.0);
        let golden_angle = std::f64::consts::PI * (3.0 - 5f64.sqrt());

        let mut index = HashMap::new();
        let nodes: Vec<LayoutNode> = model
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| {
                index.insert(node.id.clone(), i);
                let r = 10.0 * (0.5 + i as f64).sqrt();
                let angle = i as f64 * golden_angle;
                LayoutNode {
                    id: node.id.clone(),
                    radius: node_radius(node, &config),
                    position: Point::new(center.x + r * angle.cos(), center.y + r * angle.sin()),
                    velocity: Point::default(),
                    pinned: None,
                }
            })
            .collect();

        let mut degree = vec![0usize; nodes.len()];
        let links: Vec<(usize, usize)> = model
            .edges
            .iter()
            .filter_map(|e| Some((*index.get(&e.source)?, *index.get(&e.target)?)))
            .inspect(|&(s, t)| {
                degree[s] += 1;
                degree[t] += 1;
            })
            .collect();

        Self {
            config,
            nodes,
            index,
            links,
            degree,
            alpha: 1.0,
            alpha_target: 0.0,
            running: false,
            callbacks: Vec::new(),
        }
    }

    pub fn nodes(&self) -> &[LayoutNode] {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&LayoutNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn is_settled(&self) -> bool {
        self.alpha < self.config.alpha_min && self.alpha_target < self.config.alpha_min
    }

    /// Pin a node under the cursor and reheat the simulation.
    pub fn drag_start(&mut self, id: &str, at: Point) -> bool {
        let Some(&i) = self.index.get(id) else {
            return false;
        };
        self.nodes[i].pinned = Some(at);
        self.alpha_target = self.config.drag_alpha_target;
        self.running = true;
        true
    }

    pub fn drag_to(&mut self, id: &str, at: Point) -> bool {
        match self.index.get(id) {
            Some(&i) if self.nodes[i].pinned.is_some() => {
                self.nodes[i].pinned = Some(at);
                true
            }
            _ => false,
        }
    }

    /// Release a dragged node and let the simulation cool.
    pub fn drag_end(&mut self, id: &str) -> bool {
        let Some(&i) = self.index.get(id) else {
            return false;
        };
        self.nodes[i].pinned = None;
        self.alpha_target = 0.0;
        true
    }

    /// Tick until the simulation cools or `max_ticks` elapse. Returns ticks run.
    pub fn run_to_rest(&mut self, max_ticks: usize) -> usize {
        self.start();
        let mut ticks = 0;
        while ticks < max_ticks && self.tick() {
            ticks += 1;
        }
        ticks
    }

    fn apply_charge(&mut self) {
        let strength = self.config.charge_strength * self.alpha;
        let n = self.nodes.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let (mut dx, mut dy) = (
                    self.nodes[j].position.x - self.nodes[i].position.x,
                    self.nodes[j].position.y - self.nodes[i].position.y,
                );
                if dx == 0.0 && dy == 0.0 {
                    dx = 1e-6 * (j - i) as f64;
                    dy = 1e-6;
                }
                let l2 = (dx * dx + dy * dy).max(1.0);
                let k = strength / l2;
                self.nodes[i].velocity.x += dx * k;
                self.nodes[i].velocity.y += dy * k;
                self.nodes[j].velocity.x -= dx * k;
                self.nodes[j].velocity.y -= dy * k;
            }
        }
    }

    fn apply_links(&mut self) {
        for &(s, t) in &self.links {
            let (ds, dt) = (self.degree[s] as f64, self.degree[t] as f64);
            let strength = 1.0 / ds.min(dt).max(1.0);
            let bias = ds / (ds + dt);

            let source = &self.nodes[s];
            let target = &self.nodes[t];
            let mut dx = target.position.x + target.velocity.x - source.position.x - source.velocity.x;
            let mut dy = target.position.y + target.velocity.y - source.position.y - source.velocity.y;
            if dx == 0.0 && dy == 0.0 {
                dx = 1e-6;
            }
            let l = (dx * dx + dy * dy).sqrt();
            let k = (l - self.config.link_distance) / l * self.alpha * strength;
            dx *= k;
            dy *= k;

            self.nodes[t].velocity.x -= dx * bias;
            self.nodes[t].velocity.y -= dy * bias;
            self.nodes[s].velocity.x += dx * (1.0 - bias);
            self.nodes[s].velocity.y += dy * (1.0 - bias);
        }
    }

    fn apply_centering(&mut self) {
        let (cx, cy) = (self.config.width / 2.0, self.config.height / 2.0);
        let k = self.config.center_strength * self.alpha;
        for node in &mut self.nodes {
            node.velocity.x += (cx - node.position.x) * k;
            node.velocity.y += (cy - node.position.y) * k;
        }
    }

    fn apply_collision(&mut self) {
        let padding = self.config.collision_padding;
        let n = self.nodes.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let a = &self.nodes[i];
                let b = &self.nodes[j];
                let min = a.radius + b.radius + padding;
                let dx = (b.position.x + b.velocity.x) - (a.position.x + a.velocity.x);
                let dy = (b.position.y + b.velocity.y) - (a.position.y + a.velocity.y);
                let l2 = dx * dx + dy * dy;
                if l2 >= min * min {
                    continue;
                }
                let l = l2.sqrt().max(1e-6);
                let push = (min - l) / l * 0.5;
                let (px, py) = if l2 == 0.0 { (push, 0.0) } else { (dx * push, dy * push) };
                self.nodes[i].velocity.x -= px;
                self.nodes[i].velocity.y -= py;
                self.nodes[j].velocity.x += px;
                self.nodes[j].velocity.y += py;
            }
        }
    }

    fn integrate(&mut self) {
        let keep = 1.0 - self.config.velocity_decay;
        for node in &mut self.nodes {
            match node.pinned {
                Some(p) => {
                    node.position = p;
                    node.velocity = Point::default();
                }
                None => {
                    node.velocity.x *= keep;
                    node.velocity.y *= keep;
                    node.position.x += node.velocity.x;
                    node.position.y += node.velocity.y;
                }
            }
        }
    }
}

impl LayoutSimulation for ForceSimulation {
    fn start(&mut self) {
        self.running = true;
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn on_tick(&mut self, callback: TickCallback) {
        self.callbacks.push(callback);
    }

    fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }

        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;

        self.apply_charge();
        self.apply_links();
        self.apply_centering();
        self.apply_collision();
        self.integrate();

        for callback in &mut self.callbacks {
            callback(&self.nodes);
        }

        if self.is_settled() {
            self.running = false;
        }
        self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{build, GraphInputs, Visibility};
    use crate::types::{Entity, GraphState, Report};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn sample_model() -> GraphModel {
        let reports = vec![
            Report::new("r1", "One")
                .with_entity(Entity::person("Jane Roe"))
                .with_entity(Entity::organization("Atlas")),
            Report::new("r2", "Two")
                .with_entity(Entity::person("Jane Roe"))
                .with_entity(Entity::organization("Orion Labs")),
        ];
        let state = GraphState::default();
        build(&GraphInputs::new(&reports, &state, Visibility::new().with_singletons(true)))
    }

    fn distance(a: Point, b: Point) -> f64 {
        ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
    }

    #[test]
    fn test_radius_scaling() {
        let config = LayoutConfig::default();
        let model = sample_model();

        let case = model.node("case-r1").unwrap();
        assert_eq!(node_radius(case, &config), config.case_radius);

        let jane = model.node("entity-janeroe").unwrap();
        let atlas = model.node("entity-atlas").unwrap();
        assert!(node_radius(jane, &config) > node_radius(atlas, &config));

        let mut busy = jane.clone();
        busy.connection_count = 1_000;
        assert_eq!(node_radius(&busy, &config), config.entity_max_radius);
    }

    #[test]
    fn test_simulation_settles_without_overlap() {
        let model = sample_model();
        let mut sim = ForceSimulation::new(&model, LayoutConfig::default());
        let ticks = sim.run_to_rest(1_000);

        assert!(ticks > 0);
        assert!(!sim.is_running());
        for (i, a) in sim.nodes().iter().enumerate() {
            assert!(a.position.x.is_finite() && a.position.y.is_finite());
            for b in &sim.nodes()[i + 1..] {
                assert!(distance(a.position, b.position) > (a.radius + b.radius) * 0.5);
            }
        }
    }

    #[test]
    fn test_stopped_simulation_does_not_move() {
        let model = sample_model();
        let mut sim = ForceSimulation::new(&model, LayoutConfig::default());
        let before = sim.nodes().to_vec();
        assert!(!sim.tick());
        assert_eq!(sim.nodes(), before.as_slice());
    }

    #[test]
    fn test_drag_pins_and_reheats() {
        let model = sample_model();
        let mut sim = ForceSimulation::new(&model, LayoutConfig::default());
        sim.run_to_rest(1_000);
        assert!(sim.is_settled());

        let target = Point::new(42.0, 24.0);
        assert!(sim.drag_start("entity-janeroe", target));
        assert!(sim.is_running());
        for _ in 0..20 {
            sim.tick();
        }
        assert_eq!(sim.node("entity-janeroe").unwrap().position, target);
        assert!(sim.alpha() > LayoutConfig::default().alpha_min);

        assert!(sim.drag_end("entity-janeroe"));
        assert!(sim.node("entity-janeroe").unwrap().pinned.is_none());
        sim.run_to_rest(2_000);
        assert!(sim.is_settled());

        assert!(!sim.drag_start("entity-nobody", target));
        assert!(!sim.drag_to("case-r1", target));
    }

    #[test]
    fn test_on_tick_callback() {
        let model = sample_model();
        let mut sim = ForceSimulation::new(&model, LayoutConfig::default());
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        sim.on_tick(Box::new(move |nodes: &[LayoutNode]| {
            assert_eq!(nodes.len(), 5);
            seen.fetch_add(1, Ordering::SeqCst);
        }));

        sim.start();
        sim.tick();
        sim.tick();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}

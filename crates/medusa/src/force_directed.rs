//! Force-directed layout: maps graph structure onto point masses and springs, then
//! advances the system by semi-implicit Euler integration until the total kinetic
//! energy falls below a threshold.
//!
//! Physical state is cached lazily per node/edge id and survives across ticks; stale
//! entries for removed nodes and edges are pruned at the start of each tick.

use medusa_graphlib::{Edge, Graph, Node};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;

use crate::geom::{Vector, normalize_or_zero, vector};
use crate::physics::{Point, Spring};
use crate::render::RenderHooks;

/// Recommended fixed timestep per tick, in simulation time units.
pub const DEFAULT_TIMESTEP: f64 = 0.03;

// Added to every pairwise distance so coincident points produce a finite repulsion.
const REPULSION_EPSILON: f64 = 0.1;

/// Physical constants, fixed for the engine's lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct ForceDirectedConfig {
    /// Spring constant k.
    pub stiffness: f64,
    /// Coulomb-law constant for pairwise repulsion.
    pub repulsion: f64,
    /// Velocity decay factor per tick, in (0, 1].
    pub damping: f64,
    /// The simulation is converged once total kinetic energy falls below this.
    pub min_energy_threshold: f64,
    /// Hard clamp on any point's speed.
    pub max_speed: f64,
    /// Seed for initial point placement. `None` seeds from entropy; fix it for
    /// reproducible layouts.
    pub seed: Option<u64>,
}

impl Default for ForceDirectedConfig {
    fn default() -> Self {
        Self {
            stiffness: 400.0,
            repulsion: 400.0,
            damping: 0.5,
            min_energy_threshold: 0.01,
            max_speed: f64::INFINITY,
            seed: None,
        }
    }
}

/// Result of a nearest-point query.
#[derive(Debug, Clone, PartialEq)]
pub struct Nearest {
    pub node: Node,
    pub position: Vector,
    pub distance: f64,
}

/// Axis-aligned box covering all point positions, padded by 7% per axis and never
/// smaller than (-2,-2)..(2,2).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub bottom_left: Vector,
    pub top_right: Vector,
}

pub struct ForceDirected {
    config: ForceDirectedConfig,
    points: FxHashMap<String, Point>,
    springs: FxHashMap<String, Spring>,
    rng: StdRng,
    started: bool,
    stop_requested: bool,
}

impl Default for ForceDirected {
    fn default() -> Self {
        Self::new(ForceDirectedConfig::default())
    }
}

impl ForceDirected {
    pub fn new(config: ForceDirectedConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            points: FxHashMap::default(),
            springs: FxHashMap::default(),
            rng,
            started: false,
            stop_requested: false,
        }
    }

    pub fn config(&self) -> &ForceDirectedConfig {
        &self.config
    }

    /// The point mass bound to `node`, created on first access with a randomized
    /// position and the node's mass.
    pub fn point(&mut self, graph: &Graph, node: &Node) -> &Point {
        self.ensure_point(graph, &node.id);
        &self.points[&node.id]
    }

    /// Mutable access to the point bound to `node`, for hosts that drag or pin nodes
    /// between ticks.
    pub fn point_mut(&mut self, graph: &Graph, node: &Node) -> &mut Point {
        self.ensure_point(graph, &node.id);
        self.points
            .get_mut(&node.id)
            .expect("point should be present after ensure_point")
    }

    /// The spring observed through `edge`.
    ///
    /// The first edge between a node pair materializes a physical spring with the
    /// edge's rest length and the configured stiffness. Any further edge between the
    /// same pair, in either direction, observes a mirror spring (zero length, zero
    /// stiffness) over the same two points, swapped when the match ran the other way,
    /// so reciprocal pairs never double-count force contributions.
    pub fn spring(&mut self, graph: &Graph, edge: &Edge) -> Spring {
        if let Some(existing) = self.springs.get(&edge.id) {
            return existing.clone();
        }

        for e in graph.get_edges(&edge.source, &edge.target) {
            if let Some(existing) = self.springs.get(&e.id) {
                return Spring::new(
                    existing.point1.clone(),
                    existing.point2.clone(),
                    0.0,
                    0.0,
                );
            }
        }
        for e in graph.get_edges(&edge.target, &edge.source) {
            if let Some(existing) = self.springs.get(&e.id) {
                return Spring::new(
                    existing.point2.clone(),
                    existing.point1.clone(),
                    0.0,
                    0.0,
                );
            }
        }

        self.ensure_point(graph, &edge.source);
        self.ensure_point(graph, &edge.target);
        let spring = Spring::new(
            edge.source.clone(),
            edge.target.clone(),
            edge.data.length,
            self.config.stiffness,
        );
        self.springs.insert(edge.id.clone(), spring.clone());
        spring
    }

    /// Visits every node with its point, in graph insertion order.
    pub fn each_node(&mut self, graph: &Graph, mut f: impl FnMut(&Node, &Point)) {
        for node in graph.nodes() {
            self.ensure_point(graph, &node.id);
            f(node, &self.points[&node.id]);
        }
    }

    /// Visits every edge with its (possibly mirror) spring, in graph insertion order.
    pub fn each_edge(&mut self, graph: &Graph, mut f: impl FnMut(&Edge, &Spring)) {
        for edge in graph.edges() {
            let spring = self.spring(graph, edge);
            f(edge, &spring);
        }
    }

    /// Visits the spring observed through every edge, in graph insertion order.
    pub fn each_spring(&mut self, graph: &Graph, mut f: impl FnMut(&Spring)) {
        for edge in graph.edges() {
            let spring = self.spring(graph, edge);
            f(&spring);
        }
    }

    /// One simulation step: all three force laws accumulate acceleration, then the
    /// integrator runs once. Forces never interleave with integration, so the tick is
    /// order-independent with respect to which law runs first.
    pub fn tick(&mut self, graph: &Graph, timestep: f64) {
        self.prune_stale(graph);
        self.apply_coulombs_law(graph);
        self.apply_hookes_law(graph);
        self.attract_to_centre(graph);
        self.update_velocity(timestep);
        self.update_position(timestep);
    }

    /// Total kinetic energy of the system.
    pub fn total_energy(&mut self, graph: &Graph) -> f64 {
        let mut energy = 0.0;
        self.each_node(graph, |_, point| energy += point.kinetic_energy());
        energy
    }

    /// The point closest to `position`, with its owning node and the distance.
    /// Linear scan over all points.
    pub fn nearest(&mut self, graph: &Graph, position: Vector) -> Option<Nearest> {
        let mut best: Option<Nearest> = None;
        self.each_node(graph, |node, point| {
            let distance = (point.position - position).length();
            if best.as_ref().is_none_or(|b| distance < b.distance) {
                best = Some(Nearest {
                    node: node.clone(),
                    position: point.position,
                    distance,
                });
            }
        });
        best
    }

    /// Axis-aligned bounding box over all point positions, seeded with the minimum
    /// box (-2,-2)..(2,2) and expanded by 7% of its own extent on each side.
    pub fn bounding_box(&mut self, graph: &Graph) -> BoundingBox {
        let mut bottom_left = vector(-2.0, -2.0);
        let mut top_right = vector(2.0, 2.0);

        self.each_node(graph, |_, point| {
            let p = point.position;
            if p.x < bottom_left.x {
                bottom_left.x = p.x;
            }
            if p.y < bottom_left.y {
                bottom_left.y = p.y;
            }
            if p.x > top_right.x {
                top_right.x = p.x;
            }
            if p.y > top_right.y {
                top_right.y = p.y;
            }
        });

        let padding = (top_right - bottom_left) * 0.07;
        BoundingBox {
            bottom_left: bottom_left - padding,
            top_right: top_right + padding,
        }
    }

    /// Marks the simulation as running and fires `on_render_start`.
    ///
    /// Idempotent while a run is in progress: the second call returns `false` and
    /// fires no callbacks, preserving fire-and-forget semantics for callers.
    pub fn start<H: RenderHooks>(&mut self, hooks: &mut H) -> bool {
        if self.started {
            return false;
        }
        self.started = true;
        self.stop_requested = false;
        tracing::debug!("force-directed run started");
        hooks.on_render_start();
        true
    }

    /// Requests a stop, observed at the end of the next `step`. Not preemptive
    /// mid-tick.
    pub fn stop(&mut self) {
        self.stop_requested = true;
    }

    pub fn is_running(&self) -> bool {
        self.started
    }

    /// Advances one tick, draws one frame, then decides whether to continue.
    ///
    /// Returns `false` (and fires `on_render_stop`) once a stop was requested or the
    /// total kinetic energy fell below the configured threshold; the caller-owned
    /// loop should halt then.
    pub fn step<H: RenderHooks>(&mut self, graph: &Graph, hooks: &mut H, timestep: f64) -> bool {
        self.tick(graph, timestep);
        self.render_frame(graph, hooks);

        let energy = self.total_energy(graph);
        if self.stop_requested || energy < self.config.min_energy_threshold {
            self.started = false;
            tracing::debug!(energy, "force-directed run stopped");
            hooks.on_render_stop();
            return false;
        }
        true
    }

    /// Draws one frame: clear, every edge with its spring's endpoint positions, every
    /// node with its point position, then `on_render_frame`.
    pub fn render_frame<H: RenderHooks>(&mut self, graph: &Graph, hooks: &mut H) {
        hooks.clear();

        for edge in graph.edges() {
            let spring = self.spring(graph, edge);
            let p1 = self.points[&spring.point1].position;
            let p2 = self.points[&spring.point2].position;
            hooks.draw_edge(edge, p1, p2);
        }

        for node in graph.nodes() {
            self.ensure_point(graph, &node.id);
            hooks.draw_node(node, self.points[&node.id].position);
        }

        hooks.on_render_frame();
    }

    fn ensure_point(&mut self, graph: &Graph, id: &str) {
        if self.points.contains_key(id) {
            return;
        }
        let mass = graph.node(id).map(|n| n.data.mass).unwrap_or(1.0);
        let position = vector(
            self.rng.gen_range(-5.0..5.0),
            self.rng.gen_range(-5.0..5.0),
        );
        self.points.insert(id.to_string(), Point::new(position, mass));
    }

    /// Drops cached state for nodes/edges that have left the graph, bounding the
    /// caches for long-lived engines over mutating graphs.
    fn prune_stale(&mut self, graph: &Graph) {
        self.points.retain(|id, _| graph.has_node(id));
        self.springs.retain(|id, spring| {
            graph.has_edge(id) && graph.has_node(&spring.point1) && graph.has_node(&spring.point2)
        });
    }

    // Ensures every node has a point, returning ids in graph insertion order.
    fn materialize_points(&mut self, graph: &Graph) -> Vec<String> {
        let mut ids = Vec::with_capacity(graph.node_count());
        for node in graph.nodes() {
            self.ensure_point(graph, &node.id);
            ids.push(node.id.clone());
        }
        ids
    }

    // Pairwise Coulomb-like repulsion over every unordered pair of distinct points.
    // O(n^2) per tick; layout targets small-to-medium graphs.
    fn apply_coulombs_law(&mut self, graph: &Graph) {
        let ids = self.materialize_points(graph);
        for i in 0..ids.len() {
            for j in (i + 1)..ids.len() {
                let p1 = self.points[&ids[i]].position;
                let p2 = self.points[&ids[j]].position;

                let d = p1 - p2;
                let distance = d.length() + REPULSION_EPSILON;
                let direction = normalize_or_zero(d);
                let force = direction * (self.config.repulsion / (distance * distance * 2.0));

                if let Some(point) = self.points.get_mut(&ids[i]) {
                    point.apply_force(force);
                }
                if let Some(point) = self.points.get_mut(&ids[j]) {
                    point.apply_force(-force);
                }
            }
        }
    }

    // Hooke's law over every spring with nonzero stiffness. Mirror springs carry
    // zero stiffness and are skipped.
    fn apply_hookes_law(&mut self, graph: &Graph) {
        let mut springs = Vec::with_capacity(graph.edge_count());
        for edge in graph.edges() {
            springs.push(self.spring(graph, edge));
        }

        for s in &springs {
            if s.stiffness == 0.0 {
                continue;
            }
            let p1 = self.points[&s.point1].position;
            let p2 = self.points[&s.point2].position;

            let d = p2 - p1;
            let displacement = s.length - d.length();
            let direction = normalize_or_zero(d);

            if let Some(point) = self.points.get_mut(&s.point1) {
                point.apply_force(direction * (s.stiffness * displacement * -0.5));
            }
            if let Some(point) = self.points.get_mut(&s.point2) {
                point.apply_force(direction * (s.stiffness * displacement * 0.5));
            }
        }
    }

    // A small pull toward the origin keeps disconnected components from drifting off.
    fn attract_to_centre(&mut self, graph: &Graph) {
        let ids = self.materialize_points(graph);
        for id in &ids {
            if let Some(point) = self.points.get_mut(id) {
                let direction = point.position * -1.0;
                point.apply_force(direction * (self.config.repulsion / 50.0));
            }
        }
    }

    fn update_velocity(&mut self, timestep: f64) {
        for point in self.points.values_mut() {
            point.velocity = (point.velocity + point.acceleration * timestep) * self.config.damping;
            let speed = point.velocity.length();
            if speed > self.config.max_speed {
                point.velocity = point.velocity * (self.config.max_speed / speed);
            }
            point.acceleration = Vector::zero();
        }
    }

    fn update_position(&mut self, timestep: f64) {
        for point in self.points.values_mut() {
            point.position += point.velocity * timestep;
        }
    }
}

//! Force-directed 2D graph layout.
//!
//! `medusa` simulates a physical system derived from a [`graphlib::Graph`]: one point
//! mass per node, one spring per connected node pair, pairwise Coulomb-like repulsion,
//! and a weak pull toward the origin. A caller-owned loop advances the simulation one
//! tick at a time until the total kinetic energy falls below a threshold or a stop is
//! requested; each frame the current node and edge positions are handed to the
//! driving layer through [`RenderHooks`].
//!
//! ```
//! use medusa::graphlib::{EdgeData, Graph};
//! use medusa::{DEFAULT_TIMESTEP, ForceDirected, ForceDirectedConfig, NullHooks};
//!
//! let mut graph = Graph::new();
//! graph.add_nodes(&["a", "b"]);
//! graph
//!     .add_edges(&[("a", "b", EdgeData::default())])
//!     .unwrap();
//!
//! let mut layout = ForceDirected::new(ForceDirectedConfig {
//!     seed: Some(42),
//!     ..Default::default()
//! });
//! let mut hooks = NullHooks;
//! layout.start(&mut hooks);
//! for _ in 0..10_000 {
//!     if !layout.step(&graph, &mut hooks, DEFAULT_TIMESTEP) {
//!         break;
//!     }
//! }
//! ```

#![forbid(unsafe_code)]

pub use medusa_graphlib as graphlib;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod geom;

mod force_directed;
mod physics;
mod render;

pub use force_directed::{
    BoundingBox, DEFAULT_TIMESTEP, ForceDirected, ForceDirectedConfig, Nearest,
};
pub use physics::{Point, Spring};
pub use render::{NullHooks, RenderHooks};

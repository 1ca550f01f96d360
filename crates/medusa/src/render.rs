//! Render-loop contract. The engine never owns a scheduler or a drawing surface; a
//! driving layer supplies these callbacks and owns the frame loop, typically
//! `layout.start(&mut hooks)` followed by `while layout.step(&graph, &mut hooks, dt) {}`.

use medusa_graphlib::{Edge, Node};

use crate::geom::Vector;

pub trait RenderHooks {
    fn clear(&mut self);

    fn draw_node(&mut self, node: &Node, position: Vector);

    fn draw_edge(&mut self, edge: &Edge, source: Vector, target: Vector);

    /// Invoked once when a run begins. Never invoked for a `start` call that was
    /// ignored because a run was already in progress.
    fn on_render_start(&mut self) {}

    /// Invoked once when the run ends, either because kinetic energy fell below the
    /// threshold or because `stop` was requested.
    fn on_render_stop(&mut self) {}

    /// Invoked after each frame has been drawn.
    fn on_render_frame(&mut self) {}
}

/// Discards every frame. Useful for headless stepping and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHooks;

impl RenderHooks for NullHooks {
    fn clear(&mut self) {}

    fn draw_node(&mut self, _node: &Node, _position: Vector) {}

    fn draw_edge(&mut self, _edge: &Edge, _source: Vector, _target: Vector) {}
}

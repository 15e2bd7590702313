//! Draw-ready particle data.
//!
//! The renderer never touches [`Particle`](crate::Particle) directly. Each
//! frame the pool is packed into a structure-of-arrays with plain `f32`
//! arrays, ready to be copied into instance buffers.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::particles::ParticleSystem;

/// Per-frame instance data for the particle billboards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderFeed {
    pub positions: Vec<[f32; 3]>,
    pub colors: Vec<[f32; 4]>,
    pub sizes: Vec<[f32; 2]>,
    /// Logical path of the texture to bind, if the preset sets one.
    pub texture: Option<String>,
}

impl RenderFeed {
    /// Number of particles to draw.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    fn clear(&mut self) {
        self.positions.clear();
        self.colors.clear();
        self.sizes.clear();
    }
}

/// Camera data the billboard shader needs alongside the feed.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct BillboardUniforms {
    pub view_proj: [[f32; 4]; 4],
    /// World-space camera right, w unused.
    pub right: [f32; 4],
    /// World-space camera up, w unused.
    pub up: [f32; 4],
}

impl ParticleSystem {
    /// Build this frame's render feed, reusing `feed`'s allocations.
    ///
    /// In free mode every live particle's depth is refreshed and the live
    /// range is sorted back to front **in place**, so particle indices change.
    /// Grid particles keep their lattice order, which the springs depend on.
    pub fn prepare_render_feed(&mut self, view_proj: Mat4, feed: &mut RenderFeed) {
        let live = &mut self.particles[..self.active];

        if !self.config.is_grid() {
            for p in live.iter_mut() {
                let clip = view_proj * p.position.extend(1.0);
                p.depth = clip.z;
            }
            live.sort_unstable_by(|a, b| b.depth.total_cmp(&a.depth));
        }

        feed.clear();
        feed.positions.extend(live.iter().map(|p| p.position.to_array()));
        feed.colors.extend(live.iter().map(|p| p.color.to_array()));
        feed.sizes.extend(live.iter().map(|p| p.size.to_array()));
        feed.texture.clone_from(&self.config.texture);
    }

    /// Convenience wrapper returning a fresh feed.
    pub fn render_feed(&mut self, view_proj: Mat4) -> RenderFeed {
        let mut feed = RenderFeed::default();
        self.prepare_render_feed(view_proj, &mut feed);
        feed
    }
}

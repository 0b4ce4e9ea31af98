//! 2D ALife grid: a Moe world drawn as a triangulated plane, cells shaded by
//! food.

use rand::Rng;

use super::{Demo, DemoContext};
use crate::error::{ConstructionError, ConstructionStep};
use crate::gfx::backend::{GraphicsEncoder, RenderBackend};
use crate::gfx::camera::RenderView;
use crate::gfx::geometry::GridMesh;
use crate::gfx::rendering::{GridUniforms, RenderableObject};
use crate::world::{GridWorld, WorldMoe, WorldType};

pub const WORLD_WIDTH: u32 = 64;
pub const WORLD_HEIGHT: u32 = 64;

/// Upper bound for a seeded cell's food.
pub const MAX_FOOD: i16 = 255;

pub struct ALifeDemo {
    world: GridWorld,
    plane: RenderableObject<GridUniforms>,
    seed_count: i32,
}

impl ALifeDemo {
    pub fn new(ctx: &mut DemoContext<'_>) -> Result<Self, ConstructionError> {
        let world = GridWorld::new(WorldType::Moe, WORLD_WIDTH, WORLD_HEIGHT).map_err(|source| ConstructionError {
            label: "world2d".to_owned(),
            step: ConstructionStep::Geometry,
            source,
        })?;
        let plane =
            RenderableObject::<GridUniforms>::create(&GridMesh::for_world(&world), ctx.backend, ctx.shaders, &ctx.layout)?;
        log::debug!("ALife world {}x{} ready", world.width(), world.height());

        Ok(Self {
            world,
            plane,
            seed_count: 256,
        })
    }

    pub fn world(&self) -> &GridWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut GridWorld {
        &mut self.world
    }

    pub fn uniforms(&self) -> &GridUniforms {
        self.plane.uniforms()
    }

    pub fn index_count(&self) -> Option<u32> {
        self.plane.index_count()
    }

    /// Drops `count` random amounts of food on random cells.
    pub fn seed_food<R: Rng + ?Sized>(&mut self, rng: &mut R, count: usize) {
        let cells = self.world.mutable_elements_as::<WorldMoe>();
        if cells.is_empty() {
            return;
        }
        for _ in 0..count {
            let index = rng.random_range(0..cells.len());
            cells[index].food = rng.random_range(1..=MAX_FOOD);
        }
        log::debug!("Seeded {count} food cells");
    }

    pub fn clear(&mut self) {
        self.world.clear();
    }
}

impl Demo for ALifeDemo {
    fn name(&self) -> &'static str {
        "ALife"
    }

    fn update(&mut self, _delta_ms: f32, view: &RenderView) {
        self.plane.update(view);
        if self.plane.uniforms_mut().sync_from(&mut self.world) {
            log::trace!("ALife world re-synced");
        }
    }

    fn render(&self, encoder: &mut dyn GraphicsEncoder) {
        self.plane.render(encoder);
    }

    fn ui(&mut self, ui: &imgui::Ui) {
        ui.window("ALife")
            .size([260.0, 0.0], imgui::Condition::FirstUseEver)
            .position([20.0, 200.0], imgui::Condition::FirstUseEver)
            .build(|| {
                ui.text(format!("World {}x{}", self.world.width(), self.world.height()));
                let fed = self
                    .world
                    .elements_as::<WorldMoe>()
                    .iter()
                    .filter(|cell| cell.food > 0)
                    .count();
                ui.text(format!("Cells with food {fed}"));
                ui.separator();

                ui.slider("Seeds", 1, 2048, &mut self.seed_count);
                if ui.button("Seed food") {
                    let count = usize::try_from(self.seed_count).unwrap_or(0);
                    self.seed_food(&mut rand::rng(), count);
                }
                ui.same_line();
                if ui.button("Clear") {
                    self.clear();
                }
            });
    }

    fn destroy(self: Box<Self>, backend: &mut dyn RenderBackend) {
        self.plane.destroy(backend);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::assets::EmbeddedShaders;
    use crate::gfx::backend::{OutputLayout, RecordingBackend};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn demo(backend: &mut RecordingBackend) -> ALifeDemo {
        let mut ctx = DemoContext {
            backend,
            shaders: &EmbeddedShaders,
            layout: OutputLayout::color_only(wgpu::TextureFormat::Rgba8Unorm),
            surface_size: (640, 480),
        };
        ALifeDemo::new(&mut ctx).unwrap()
    }

    #[test]
    fn plane_matches_world() {
        let mut backend = RecordingBackend::new();
        let demo = demo(&mut backend);
        assert_eq!(demo.index_count(), Some(63 * 63 * 6));
        Box::new(demo).destroy(&mut backend);
        assert_eq!(backend.live_count(), 0);
    }

    #[test]
    fn update_resyncs_only_after_cells_change() {
        let mut backend = RecordingBackend::new();
        let mut demo = demo(&mut backend);
        let view = RenderView::default();

        demo.update(16.0, &view);
        assert_eq!(demo.uniforms().dims[..2], [64, 64]);
        assert!(!demo.world().is_dirty());

        let mut rng = StdRng::seed_from_u64(7);
        demo.seed_food(&mut rng, 32);
        assert!(demo.world().is_dirty());
        demo.update(16.0, &view);
        assert!(!demo.world().is_dirty());

        let cells = demo.world().elements_as::<WorldMoe>();
        for (i, cell) in cells.iter().enumerate() {
            assert_eq!(demo.uniforms().food_at(i), cell.food);
        }
        assert!(cells.iter().any(|cell| cell.food > 0));

        demo.clear();
        demo.update(16.0, &view);
        assert!((0..demo.world().cell_count()).all(|i| demo.uniforms().food_at(i) == 0));

        Box::new(demo).destroy(&mut backend);
    }
}

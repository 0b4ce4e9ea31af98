//! Gallery of spinning flat-shaded solids.
//!
//! Three rows of tetrahedron, cube, octahedron, icosahedron and dodecahedron
//! at `x = -4, -2, 0, 2, 4` and `y = 0, 1, 2`, plus a diamond at `(0, -2, 0)`.

use std::borrow::Cow;

use cgmath::Vector3;

use super::{Demo, DemoContext};
use crate::error::ConstructionError;
use crate::gfx::backend::{GraphicsEncoder, RenderBackend};
use crate::gfx::camera::RenderView;
use crate::gfx::geometry::{Solid, SolidMesh};
use crate::gfx::rendering::{MeshStyle, ObjectUniforms, RenderableObject, Transform};

pub const ROWS: usize = 3;
pub const ROW_SOLIDS: [Solid; 5] = [
    Solid::Tetrahedron,
    Solid::Cube,
    Solid::Octahedron,
    Solid::Icosahedron,
    Solid::Dodecahedron,
];
/// Radians of Y rotation per millisecond.
pub const SPIN_RATE: f32 = 0.005;

fn solid_color(solid: Solid) -> [f32; 4] {
    match solid {
        Solid::Tetrahedron => [0.95, 0.35, 0.3, 1.0],
        Solid::Cube => [0.3, 0.75, 0.95, 1.0],
        Solid::Octahedron => [0.4, 0.9, 0.45, 1.0],
        Solid::Icosahedron => [0.95, 0.8, 0.3, 1.0],
        Solid::Dodecahedron => [0.75, 0.45, 0.95, 1.0],
        Solid::Diamond => [0.85, 0.95, 1.0, 1.0],
    }
}

/// Where each shape of the gallery sits.
pub fn layout() -> Vec<(Solid, Vector3<f32>)> {
    let mut shapes = Vec::with_capacity(ROWS * ROW_SOLIDS.len() + 1);
    for row in 0..ROWS {
        for (col, solid) in ROW_SOLIDS.iter().enumerate() {
            let x = -4.0 + 2.0 * col as f32;
            shapes.push((*solid, Vector3::new(x, row as f32, 0.0)));
        }
    }
    shapes.push((Solid::Diamond, Vector3::new(0.0, -2.0, 0.0)));
    shapes
}

struct Shape {
    solid: Solid,
    transform: Transform,
    renderable: RenderableObject<ObjectUniforms>,
}

pub struct MeshShapesDemo {
    shapes: Vec<Shape>,
    style: MeshStyle,
}

impl MeshShapesDemo {
    pub fn new(ctx: &mut DemoContext<'_>) -> Result<Self, ConstructionError> {
        let placements = layout();
        let mut shapes: Vec<Shape> = Vec::with_capacity(placements.len());

        for (solid, position) in placements {
            let built =
                RenderableObject::<ObjectUniforms>::create(&SolidMesh { solid }, ctx.backend, ctx.shaders, &ctx.layout);
            match built {
                Ok(mut renderable) => {
                    renderable.uniforms_mut().set_color(solid_color(solid));
                    shapes.push(Shape {
                        solid,
                        transform: Transform::at(position),
                        renderable,
                    });
                }
                Err(err) => {
                    // Shapes built so far must not outlive the failed demo.
                    for shape in shapes.drain(..).rev() {
                        shape.renderable.destroy(ctx.backend);
                    }
                    return Err(err);
                }
            }
        }

        log::debug!("Mesh gallery built with {} shapes", shapes.len());
        Ok(Self {
            shapes,
            style: MeshStyle::default(),
        })
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    pub fn style(&self) -> MeshStyle {
        self.style
    }

    pub fn set_style(&mut self, style: MeshStyle) {
        self.style = style;
    }

    pub fn transforms(&self) -> impl Iterator<Item = (Solid, &Transform)> {
        self.shapes.iter().map(|shape| (shape.solid, &shape.transform))
    }

    pub fn uniforms(&self, index: usize) -> Option<&ObjectUniforms> {
        self.shapes.get(index).map(|shape| shape.renderable.uniforms())
    }
}

impl Demo for MeshShapesDemo {
    fn name(&self) -> &'static str {
        "Mesh shapes"
    }

    fn update(&mut self, delta_ms: f32, view: &RenderView) {
        for shape in &mut self.shapes {
            shape.renderable.update(view);
            shape.renderable.set_transform(&shape.transform);
            shape.renderable.uniforms_mut().set_style(self.style);
            // Matrices above use this frame's rotation; the step lands next frame.
            shape.transform.euler.y += SPIN_RATE * delta_ms;
        }
    }

    fn render(&self, encoder: &mut dyn GraphicsEncoder) {
        for shape in &self.shapes {
            shape.renderable.render(encoder);
        }
    }

    fn ui(&mut self, ui: &imgui::Ui) {
        let display_size = ui.io().display_size;
        ui.window("Mesh shapes")
            .size([260.0, 0.0], imgui::Condition::FirstUseEver)
            .position([display_size[0] - 280.0, 40.0], imgui::Condition::FirstUseEver)
            .build(|| {
                ui.text(format!("{} shapes", self.shapes.len()));
                let mut current = MeshStyle::ALL.iter().position(|s| *s == self.style).unwrap_or(0);
                if ui.combo("Style", &mut current, &MeshStyle::ALL, |style| Cow::Borrowed(style.label())) {
                    self.style = MeshStyle::ALL[current];
                }
            });
    }

    fn destroy(self: Box<Self>, backend: &mut dyn RenderBackend) {
        for shape in self.shapes {
            shape.renderable.destroy(backend);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::assets::EmbeddedShaders;
    use crate::gfx::backend::{OutputLayout, RecordingBackend, ResourceKind};
    use cgmath::SquareMatrix;

    fn context(backend: &mut RecordingBackend) -> DemoContext<'_> {
        DemoContext {
            backend,
            shaders: &EmbeddedShaders,
            layout: OutputLayout::with_depth(wgpu::TextureFormat::Rgba8Unorm, wgpu::TextureFormat::Depth32Float),
            surface_size: (640, 480),
        }
    }

    #[test]
    fn gallery_layout() {
        let shapes = layout();
        assert_eq!(shapes.len(), 16);
        assert_eq!(shapes[0], (Solid::Tetrahedron, Vector3::new(-4.0, 0.0, 0.0)));
        assert_eq!(shapes[9], (Solid::Dodecahedron, Vector3::new(4.0, 1.0, 0.0)));
        assert_eq!(shapes[15], (Solid::Diamond, Vector3::new(0.0, -2.0, 0.0)));
    }

    #[test]
    fn matrices_lag_rotation_by_one_frame() {
        let mut backend = RecordingBackend::new();
        let mut demo = MeshShapesDemo::new(&mut context(&mut backend)).unwrap();
        assert_eq!(demo.shape_count(), 16);
        assert_eq!(backend.live_count(), 16 * 7);

        demo.update(100.0, &RenderView::default());
        let first = demo.uniforms(0).unwrap();
        // Zero rotation on the first frame: the object matrix is a pure translation.
        let expected: [[f32; 4]; 4] = cgmath::Matrix4::from_translation(Vector3::new(-4.0, 0.0, 0.0)).into();
        assert_eq!(first.object, expected);
        for (_, transform) in demo.transforms() {
            assert!((transform.euler.y - 0.5).abs() < 1e-6);
        }

        let object: cgmath::Matrix4<f32> = first.object.into();
        let inverse: cgmath::Matrix4<f32> = first.inverse.into();
        let product = inverse * object;
        let identity = cgmath::Matrix4::<f32>::identity();
        for c in 0..4 {
            for r in 0..4 {
                assert!((product[c][r] - identity[c][r]).abs() < 1e-5);
            }
        }

        Box::new(demo).destroy(&mut backend);
        assert_eq!(backend.live_count(), 0);
    }

    #[test]
    fn style_reaches_every_shape() {
        let mut backend = RecordingBackend::new();
        let mut demo = MeshShapesDemo::new(&mut context(&mut backend)).unwrap();
        demo.set_style(MeshStyle::Normals);
        demo.update(16.0, &RenderView::default());
        for i in 0..demo.shape_count() {
            assert_eq!(demo.uniforms(i).unwrap().style[0], 1);
        }
        Box::new(demo).destroy(&mut backend);
    }

    #[test]
    fn partial_gallery_is_released_on_failure() {
        let mut backend = RecordingBackend::new();
        // Five full shapes, then the sixth dies at its root signature.
        backend.fail_after(5 * 7 + 4);
        assert!(MeshShapesDemo::new(&mut context(&mut backend)).is_err());
        assert_eq!(backend.live_count(), 0);
        assert_eq!(backend.destroyed_kinds().len(), 5 * 7 + 4);

        backend.clear_failures();
        backend.fail_on(ResourceKind::DescriptorSet);
        assert!(MeshShapesDemo::new(&mut context(&mut backend)).is_err());
        assert_eq!(backend.live_count(), 0);
    }

    #[test]
    fn one_draw_per_shape() {
        let mut backend = RecordingBackend::new();
        let demo = MeshShapesDemo::new(&mut context(&mut backend)).unwrap();
        let mut encoder = backend.encoder();
        demo.render(&mut encoder);
        assert_eq!(encoder.draw_count(), 16);
        assert_eq!(encoder.upload_count(), 16);
        Box::new(demo).destroy(&mut backend);
    }
}

//! Renders a lit spinning-cube frame to `cube.png`.
//!
//! ```text
//! cargo run --example cube --features image_compat
//! ```

use nalgebra::{Matrix4, Point3, Rotation3, Vector2, Vector3, Vector4};

use softraster::camera::PerspectiveCamera;
use softraster::canvas::{Canvas, RenderBuffer};
use softraster::color::Color;
use softraster::image_compat::ImageRenderBuffer;
use softraster::mesh::{Mesh, VertexInput};
use softraster::pipeline::Pipeline;
use softraster::shader::{Shader, Uniforms};
use softraster::varying::{
    ElementFormat, PixelQuad, Semantic, VaryingDecl, VaryingElement, VaryingMut,
};

const NORMAL_OFFSET: u32 = 16;
const TEXCOORD_OFFSET: u32 = 32;

struct LitShader {
    decl: VaryingDecl,
    light_dir: Vector3<f32>,
    albedo: Color,
}

impl LitShader {
    fn new(light_dir: Vector3<f32>, albedo: Color) -> LitShader {
        let decl = VaryingDecl::new(
            vec![
                VaryingElement {
                    offset: 0,
                    semantic: Semantic::SvPosition,
                    format: ElementFormat::V4,
                },
                VaryingElement {
                    offset: NORMAL_OFFSET,
                    semantic: Semantic::Normal,
                    format: ElementFormat::V3,
                },
                VaryingElement {
                    offset: TEXCOORD_OFFSET,
                    semantic: Semantic::Texcoord,
                    format: ElementFormat::V2,
                },
            ],
            48,
        )
        .expect("static layout");

        LitShader {
            decl,
            light_dir: light_dir.normalize(),
            albedo,
        }
    }
}

impl Shader for LitShader {
    fn decl(&self) -> &VaryingDecl {
        &self.decl
    }

    fn vertex(&self, input: &VertexInput<'_>, uniforms: &Uniforms, output: &mut VaryingMut<'_>) {
        let position = input.position.push(1.0);

        output.set_position(uniforms.mvp * position);

        // Rotation-only model transform, so normals transform directly.
        let normal = input.normal.copied().unwrap_or_else(Vector3::zeros);
        let world_normal = (uniforms.model * normal.push(0.0)).xyz();
        output.set_vec3(NORMAL_OFFSET, world_normal);

        let texcoord = input.texcoord.copied().unwrap_or_else(Vector2::zeros);
        output.set_vec2(TEXCOORD_OFFSET, texcoord);
    }

    fn pixel(&self, quad: &PixelQuad<'_>, lane: usize, _: &Uniforms) -> Color {
        let record = quad.lane(lane);

        let normal = record.get_vec3(NORMAL_OFFSET).normalize();
        let diffuse = normal.dot(&-self.light_dir).max(0.0);

        // Checker the faces from the interpolated texcoords.
        let uv = record.get_vec2(TEXCOORD_OFFSET);
        let checker = if ((uv.x * 4.0) as i32 + (uv.y * 4.0) as i32) % 2 == 0 {
            1.0
        } else {
            0.6
        };

        (self.albedo * checker * (0.15 + 0.85 * diffuse)).saturate()
    }
}

fn cube_mesh() -> Mesh {
    let mut mesh = Mesh::default();

    // Six faces, four unique vertices each.
    let faces: [(Vector3<f32>, Vector3<f32>, Vector3<f32>); 6] = [
        (Vector3::z(), Vector3::x(), Vector3::y()),
        (-Vector3::z(), -Vector3::x(), Vector3::y()),
        (Vector3::x(), -Vector3::z(), Vector3::y()),
        (-Vector3::x(), Vector3::z(), Vector3::y()),
        (Vector3::y(), Vector3::x(), -Vector3::z()),
        (-Vector3::y(), Vector3::x(), Vector3::z()),
    ];

    for (normal, tangent, bitangent) in faces {
        let base = mesh.positions.len() as u32;

        for (du, dv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            mesh.positions.push(normal + tangent * du + bitangent * dv);
            mesh.normals.push(normal);
            mesh.tangents.push(Vector4::new(tangent.x, tangent.y, tangent.z, 1.0));
            mesh.texcoords.push(Vector2::new(du * 0.5 + 0.5, dv * 0.5 + 0.5));
        }

        mesh.indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    mesh
}

fn main() {
    env_logger::init();

    let mut canvas = RenderBuffer::new(512, 512);
    canvas.clear(Color::new(0.1, 0.1, 0.12, 1.0), 1.0);

    let mut camera = PerspectiveCamera::new(60f32.to_radians(), 1.0, 0.3, 100.0);
    camera.look_at(
        Point3::new(0.0, 2.0, 4.5),
        Point3::new(0.0, 0.0, 0.0),
        Vector3::y(),
    );

    let model: Matrix4<f32> =
        Rotation3::from_euler_angles(0.0, 35f32.to_radians(), 0.0).to_homogeneous();

    let shader = LitShader::new(Vector3::new(-1.0, -1.0, -1.0), Color::new(0.9, 0.55, 0.25, 1.0));

    let mut pipeline = Pipeline::new();
    pipeline
        .draw(&mut canvas, &camera, &cube_mesh(), &model, &shader)
        .expect("draw");

    let image = canvas.copy_to_image().expect("canvas fits an image");
    image.save("cube.png").expect("save image");

    println!("wrote cube.png");
}

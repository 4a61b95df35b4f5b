use std::io::Write;

use glam::{DVec2, Vec3};
use phong_viewer::lighting::{DirectionalLight, PointLight};
use phong_viewer::{
    load_obj_from_str, DemoConfig, FrameContext, FrameUniform, KeyCode, LightingError, NamedKey,
    RenderParams, ShaderError, ShaderSource, WindowInput, WindowState,
};

const VIEWPORT: (u32, u32) = (800, 600);

fn lit_params(point_lights: usize) -> Result<RenderParams, LightingError> {
    let demo = RenderParams::demo();
    let point = demo.point_lights()[0];
    RenderParams::new(
        *demo.directional(),
        vec![point; point_lights],
        Vec::new(),
        demo.shininess(),
    )
}

#[test]
fn flying_forward_then_turning() {
    let mut frame = FrameContext::new(&DemoConfig::default(), RenderParams::demo());
    let mut window = WindowState::with_cursor(DVec2::new(400.0, 300.0));
    let mut block = FrameUniform::default();
    frame.configure(&mut block);

    // The first frame only seeds the cursor.
    frame.step(&mut window, 0.0, VIEWPORT, &mut block).expect("frame");

    window.set_key_down(KeyCode::Character('W'));
    window.set_key_down(KeyCode::Named(NamedKey::LeftShift));
    frame.step(&mut window, 0.5, VIEWPORT, &mut block).expect("frame");
    let position = frame.camera().position();
    assert!((position - Vec3::new(0.0, 0.0, 0.5)).length() < 1e-5);

    window.release_all();
    window.add_mouse_motion(DVec2::new(100.0, 0.0));
    frame.step(&mut window, 0.016, VIEWPORT, &mut block).expect("frame");
    assert!((frame.camera().yaw() - (-83.0)).abs() < 1e-4);
    assert_eq!(frame.camera().position(), position);
}

#[test]
fn pitch_stays_clamped_under_large_mouse_motion() {
    let mut frame = FrameContext::new(&DemoConfig::default(), RenderParams::demo());
    let mut window = WindowState::new();
    let mut block = FrameUniform::default();
    frame.step(&mut window, 0.0, VIEWPORT, &mut block).expect("frame");

    window.add_mouse_motion(DVec2::new(0.0, -100_000.0));
    frame.step(&mut window, 0.016, VIEWPORT, &mut block).expect("frame");
    assert_eq!(frame.camera().pitch(), 89.0);

    window.add_mouse_motion(DVec2::new(0.0, 200_000.0));
    frame.step(&mut window, 0.016, VIEWPORT, &mut block).expect("frame");
    assert_eq!(frame.camera().pitch(), -89.0);
}

#[test]
fn light_counts_reach_the_uniform_block() {
    let params = lit_params(3).expect("three point lights fit");
    let mut frame = FrameContext::new(&DemoConfig::default(), params);
    let mut block = FrameUniform::default();
    frame.configure(&mut block);
    assert_eq!(block.point_light_count(), 3);
    assert_eq!(block.spot_light_count(), 0);

    let mut window = WindowState::new();
    frame.step(&mut window, 0.016, VIEWPORT, &mut block).expect("frame");
    assert_eq!(block.point_lights[2].position[..3], [0.7, 0.2, 2.0]);
}

#[test]
fn rejects_more_lights_than_the_shader_holds() {
    let err = lit_params(5).unwrap_err();
    assert_eq!(err, LightingError::TooManyPointLights { count: 5, max: 4 });

    let sun = DirectionalLight {
        direction: Vec3::NEG_Y,
        ambient: Vec3::ZERO,
        diffuse: Vec3::ONE,
        specular: Vec3::ONE,
    };
    let lights: Vec<PointLight> = Vec::new();
    assert!(RenderParams::new(sun, lights, Vec::new(), 8.0).is_ok());
}

#[test]
fn escape_closes_the_window() {
    let mut frame = FrameContext::new(&DemoConfig::default(), RenderParams::demo());
    let mut window = WindowState::new();
    let mut block = FrameUniform::default();
    window.set_key_down(KeyCode::Named(NamedKey::Escape));
    assert!(frame.step(&mut window, 0.016, VIEWPORT, &mut block).is_none());
    assert!(window.close_requested());
}

#[test]
fn loads_shader_from_disk() {
    let mut file = tempfile::NamedTempFile::new().expect("temp shader");
    write!(
        file,
        "struct Shared {{ x: f32 }}\n#shader vertex\nfn vs_main() {{}}\n#SHADER Fragment\nfn fs_main() {{}}\n"
    )
    .expect("write shader");

    let source = ShaderSource::load(file.path()).expect("parse shader");
    assert!(source.vertex.starts_with("struct Shared"));
    assert!(source.vertex.contains("vs_main"));
    assert!(!source.vertex.contains("fs_main"));
    assert!(source.fragment.starts_with("struct Shared"));
    assert!(source.fragment.contains("fs_main"));

    let missing = file.path().with_extension("absent");
    assert!(matches!(
        ShaderSource::load(&missing),
        Err(ShaderError::Io { .. })
    ));
}

#[test]
fn bundled_assets_parse() {
    let root = env!("CARGO_MANIFEST_DIR");
    let config = DemoConfig::default();
    ShaderSource::load(format!("{root}/{}", config.assets.shader_path.display()))
        .expect("bundled shader");
    let obj = std::fs::read_to_string(format!("{root}/{}", config.assets.model_path.display()))
        .expect("bundled model");
    let model = load_obj_from_str(&obj).expect("parse cube");
    assert_eq!(model.meshes.len(), 1);
    assert_eq!(model.meshes[0].indices.len(), 36);
}

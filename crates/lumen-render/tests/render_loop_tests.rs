use std::time::Duration;

use lumen_core::{LumenError, RendererConfig};
use lumen_math::{to_uniform, DVec3};
use lumen_mesh::primitives::{cube, uv_sphere};
use lumen_mesh::GeometryDescriptor;
use lumen_render::headless::{Command, UniformValue};
use lumen_render::shaders::{U_MATERIAL_DIFFUSE, U_MODEL_VIEW, U_NORMAL, U_PROJECTION};
use lumen_render::{
    standard_controls, BufferTarget, ControlValue, CoordinateMode, FrameInput, HeadlessBackend, Primitive, Renderer,
};

fn renderer() -> Renderer<HeadlessBackend> {
    Renderer::with_phong(HeadlessBackend::new(), RendererConfig::default()).unwrap()
}

fn frame() -> FrameInput {
    FrameInput::new(1024, 768, Duration::from_millis(16))
}

fn triangle() -> GeometryDescriptor {
    GeometryDescriptor::new(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0], vec![0, 1, 2])
}

fn assert_nothing_bound(backend: &HeadlessBackend) {
    assert_eq!(backend.bound_vertex_array(), None);
    assert_eq!(backend.bound_buffer(BufferTarget::Array), None);
    assert_eq!(backend.bound_buffer(BufferTarget::ElementArray), None);
}

#[test]
fn test_objects_drawn_in_load_order() {
    let mut r = renderer();
    r.load(&uv_sphere(12, 12, 1.0), "sphere").unwrap();
    r.load(&triangle(), "triangle").unwrap();
    r.load(&cube(), "cube").unwrap();

    let mut labels = Vec::new();
    r.scene().traverse(|o| labels.push(o.label().to_string()));
    assert_eq!(labels, vec!["sphere", "triangle", "cube"]);

    let expected: Vec<_> = r.scene().iter().map(|o| o.vertex_array()).collect();
    r.backend_mut().clear_commands();
    let report = r.tick(frame());
    assert_eq!(report.drawn, 3);

    let drawn: Vec<_> = r.backend().draws().into_iter().map(|(vao, _, _)| vao).collect();
    assert_eq!(drawn, expected);
}

#[test]
fn test_every_draw_is_followed_by_unbinds() {
    let mut r = renderer();
    r.load(&cube(), "a").unwrap();
    r.load(&cube(), "b").unwrap();
    r.backend_mut().clear_commands();
    r.tick(frame());

    let commands = r.backend().commands();
    let draw_positions: Vec<usize> = commands
        .iter()
        .enumerate()
        .filter(|(_, c)| matches!(c, Command::Draw { .. }))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(draw_positions.len(), 2);

    for i in draw_positions {
        assert_eq!(commands[i + 1], Command::BindVertexArray(None));
        assert_eq!(commands[i + 2], Command::BindBuffer(BufferTarget::Array, None));
        assert_eq!(commands[i + 3], Command::BindBuffer(BufferTarget::ElementArray, None));
    }
    assert_nothing_bound(r.backend());
}

#[test]
fn test_draw_failure_skips_object_and_next_tick_recovers() {
    let mut r = renderer();
    r.load(&triangle(), "first").unwrap();
    r.load(&cube(), "second").unwrap();

    r.backend_mut().fail_next_draws(1);
    let report = r.tick(frame());
    assert_eq!(report.drawn, 1);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "first");
    assert!(report.failed[0].1.contains("GL_OUT_OF_MEMORY"));
    assert_nothing_bound(r.backend());

    let report = r.tick(frame());
    assert!(report.is_complete());
    assert_eq!(report.drawn, 2);
}

#[test]
fn test_matrix_uniforms_match_pipeline() {
    let mut r = renderer();
    r.transforms_mut().set_rotation(DVec3::new(15.0, 30.0, 45.0));
    r.tick(frame());

    let t = r.transforms();
    let b = r.backend();
    assert_eq!(b.uniform_value(U_PROJECTION), Some(&UniformValue::Mat4(to_uniform(&t.projection()))));
    assert_eq!(b.uniform_value(U_MODEL_VIEW), Some(&UniformValue::Mat4(to_uniform(&t.model_view()))));
    assert_eq!(
        b.uniform_value(U_NORMAL),
        Some(&UniformValue::Mat4(to_uniform(&t.camera().transpose())))
    );
}

#[test]
fn test_camera_mode_keeps_matrices_inverse() {
    let mut r = renderer();
    r.transforms_mut().set_mode(CoordinateMode::Camera);
    r.transforms_mut().set_rotation(DVec3::new(-20.0, 75.0, 5.0));
    r.tick(frame());

    let t = r.transforms();
    let product = t.model_view() * t.camera();
    assert!(product.abs_diff_eq(lumen_math::DMat4::IDENTITY, 1e-9));
}

#[test]
fn test_per_object_diffuse_pushed_before_draw() {
    let mut r = renderer();
    r.load(&triangle().with_diffuse([0.2, 0.4, 0.6, 1.0]), "tinted").unwrap();
    r.backend_mut().clear_commands();
    r.tick(frame());

    let commands = r.backend().commands();
    let draw = commands
        .iter()
        .position(|c| matches!(c, Command::Draw { .. }))
        .unwrap();
    let diffuse = commands[..draw]
        .iter()
        .rev()
        .find_map(|c| match c {
            Command::Uniform(name, value) if name == U_MATERIAL_DIFFUSE => Some(value.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(diffuse, UniformValue::Vec4([0.2, 0.4, 0.6, 1.0]));
}

#[test]
fn test_malformed_descriptor_leaves_scene_usable() {
    let mut r = renderer();
    r.load(&cube(), "cube").unwrap();

    let mut bad = triangle();
    bad.normals = Some(vec![0.0; 4]);
    assert!(matches!(r.load(&bad, "bad"), Err(LumenError::Geometry(_))));
    assert_eq!(r.scene().len(), 1);

    assert_eq!(r.tick(frame()).drawn, 1);
}

#[test]
fn test_wireframe_control_switches_primitive() {
    let mut r = renderer();
    r.load(&cube(), "a").unwrap();
    r.load(&triangle(), "b").unwrap();
    let mut panel = standard_controls(&r).unwrap();

    panel.set("Wireframe", ControlValue::Flag(true), &mut r).unwrap();
    r.tick(frame());
    assert!(r.backend().draws().iter().all(|(_, mode, _)| *mode == Primitive::Lines));

    r.backend_mut().clear_commands();
    panel.set("Wireframe", ControlValue::Flag(false), &mut r).unwrap();
    r.tick(frame());
    assert!(r.backend().draws().iter().all(|(_, mode, _)| *mode == Primitive::Triangles));
}

#[test]
fn test_position_controls_round_trip_through_camera_mode() {
    let mut r = renderer();
    let mut panel = standard_controls(&r).unwrap();

    panel.set("Position X", ControlValue::Number(2.5), &mut r).unwrap();
    panel.set("Position Y", ControlValue::Number(-1.0), &mut r).unwrap();
    let before = r.transforms().position();

    panel
        .set("Coordinates", ControlValue::Choice("Camera Coordinates".into()), &mut r)
        .unwrap();
    panel
        .set("Coordinates", ControlValue::Choice("World Coordinates".into()), &mut r)
        .unwrap();
    assert!((r.transforms().position() - before).length() < 1e-5);
}

#[test]
fn test_renderer_from_json_assets() {
    let config = RendererConfig::from_json_str(r#"{ "home": [0.0, 0.0, -4.0], "clear_color": [0.1, 0.1, 0.1, 1.0] }"#)
        .unwrap();
    let descriptor: GeometryDescriptor = serde_json::from_str(
        r#"{
            "alias": "quad",
            "vertices": [-1, -1, 0, 1, -1, 0, 1, 1, 0, -1, 1, 0],
            "indices": [0, 1, 2, 0, 2, 3],
            "diffuse": [1.0, 0.5, 0.0, 1.0]
        }"#,
    )
    .unwrap();

    let mut r = Renderer::with_phong(HeadlessBackend::new(), config).unwrap();
    assert_eq!(r.backend().clear_color_value(), [0.1, 0.1, 0.1, 1.0]);
    let label = descriptor.alias.clone();
    r.load(&descriptor, &label).unwrap();

    let report = r.tick(FrameInput::new(300, 300, Duration::ZERO));
    assert_eq!(report.drawn, 1);
    assert_eq!(r.backend().draws()[0].2, 6);
    assert_eq!(r.transforms().position(), DVec3::new(0.0, 0.0, -4.0));

    let backend = r.shutdown();
    assert_eq!(backend.live_buffers(), 0);
}

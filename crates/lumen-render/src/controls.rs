//! Control definitions and change dispatch.
//!
//! A [`ControlPanel`] holds a tree of named controls plus the current value
//! of every leaf. A UI collaborator renders the tree however it likes and
//! reports edits through [`ControlPanel::set`], which checks the value
//! against the control's shape and runs the registered callback against
//! the renderer on the caller's thread. Callbacks may move renderer state
//! that other controls display, so the panel re-reads that state after
//! every change.

use std::collections::HashMap;

use lumen_core::{LumenError, Result};
use lumen_math::{denormalize_color, normalize_color, DVec3};

use crate::backend::GraphicsBackend;
use crate::renderer::Renderer;
use crate::transform::{Axis, CoordinateMode};

#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    /// A button.
    Action,
    Folder(Vec<(String, Control)>),
    NumericRange {
        value: f64,
        min: f64,
        max: f64,
        step: f64,
    },
    /// RGBA, each channel 0–255.
    ColorValue([f32; 4]),
    OptionList {
        choices: Vec<String>,
        selected: usize,
    },
    Toggle(bool),
}

impl Control {
    pub fn range(value: f64, min: f64, max: f64, step: f64) -> Self {
        Control::NumericRange { value, min, max, step }
    }

    pub fn options(choices: &[&str], selected: usize) -> Self {
        Control::OptionList {
            choices: choices.iter().map(|c| c.to_string()).collect(),
            selected,
        }
    }

    /// Reject shapes `accept` cannot work with: ranges that are empty or
    /// not finite, and selections past the end of their options.
    fn check(&self, name: &str) -> Result<()> {
        match self {
            Control::NumericRange { value, min, max, step } => {
                if ![*value, *min, *max, *step].iter().all(|v| v.is_finite()) {
                    return Err(LumenError::Config(format!("control '{}': range is not finite", name)));
                }
                if min > max {
                    return Err(LumenError::Config(format!(
                        "control '{}': min {} is above max {}",
                        name, min, max
                    )));
                }
                Ok(())
            }
            Control::OptionList { choices, selected } if *selected >= choices.len() => Err(LumenError::Config(
                format!("control '{}': option {} of {}", name, selected, choices.len()),
            )),
            Control::Folder(children) => children.iter().try_for_each(|(child, c)| c.check(child)),
            _ => Ok(()),
        }
    }

    fn current(&self) -> Option<ControlValue> {
        match self {
            Control::Action | Control::Folder(_) => None,
            Control::NumericRange { value, .. } => Some(ControlValue::Number(*value)),
            Control::ColorValue(c) => Some(ControlValue::Color(*c)),
            Control::OptionList { choices, selected } => choices.get(*selected).cloned().map(ControlValue::Choice),
            Control::Toggle(on) => Some(ControlValue::Flag(*on)),
        }
    }

    /// Check `value` against this control's shape, returning the value as
    /// it will be stored and updating the control's own copy.
    fn accept(&mut self, name: &str, value: ControlValue) -> Result<ControlValue> {
        let mismatch = |value: &ControlValue| {
            LumenError::Config(format!("control '{}' does not take {:?}", name, value))
        };

        match (self, value) {
            (Control::Action, ControlValue::Trigger) => Ok(ControlValue::Trigger),
            (Control::NumericRange { value, min, max, step }, ControlValue::Number(v)) => {
                if !v.is_finite() {
                    return Err(LumenError::Config(format!("control '{}': {} is not a number", name, v)));
                }
                *value = snap(v, *min, *max, *step);
                Ok(ControlValue::Number(*value))
            }
            (Control::ColorValue(color), ControlValue::Color(c)) => {
                *color = c.map(|channel| channel.clamp(0.0, 255.0));
                Ok(ControlValue::Color(*color))
            }
            (Control::OptionList { choices, selected }, ControlValue::Choice(choice)) => {
                let index = choices.iter().position(|c| *c == choice).ok_or_else(|| {
                    LumenError::Config(format!("control '{}': unknown option '{}'", name, choice))
                })?;
                *selected = index;
                Ok(ControlValue::Choice(choice))
            }
            (Control::Toggle(on), ControlValue::Flag(flag)) => {
                *on = flag;
                Ok(ControlValue::Flag(flag))
            }
            (_, other) => Err(mismatch(&other)),
        }
    }
}

/// Clamp into `[min, max]` and round to the nearest step from `min`.
/// Steps may be given negative; only the magnitude matters.
fn snap(value: f64, min: f64, max: f64, step: f64) -> f64 {
    let step = step.abs();
    let clamped = value.clamp(min, max);
    if step == 0.0 {
        return clamped;
    }
    (min + ((clamped - min) / step).round() * step).clamp(min, max)
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControlValue {
    Trigger,
    Number(f64),
    Color([f32; 4]),
    Choice(String),
    Flag(bool),
}

/// Current value of every leaf control, by name.
#[derive(Debug, Clone, Default)]
pub struct ControlState {
    values: HashMap<String, ControlValue>,
}

impl ControlState {
    pub fn get(&self, name: &str) -> Option<&ControlValue> {
        self.values.get(name)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        match self.values.get(name) {
            Some(ControlValue::Number(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn color(&self, name: &str) -> Option<[f32; 4]> {
        match self.values.get(name) {
            Some(ControlValue::Color(c)) => Some(*c),
            _ => None,
        }
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        match self.values.get(name) {
            Some(ControlValue::Flag(f)) => Some(*f),
            _ => None,
        }
    }

    pub fn choice(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(ControlValue::Choice(c)) => Some(c),
            _ => None,
        }
    }
}

type Callback<B> = Box<dyn FnMut(&ControlValue, &ControlState, &mut Renderer<B>) -> Result<()>>;
type Refresh<B> = Box<dyn Fn(&Renderer<B>) -> Vec<(String, ControlValue)>>;

pub struct ControlPanel<B: GraphicsBackend> {
    layout: Vec<(String, Control)>,
    state: ControlState,
    callbacks: HashMap<String, Callback<B>>,
    refresh: Option<Refresh<B>>,
}

impl<B: GraphicsBackend> Default for ControlPanel<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: GraphicsBackend> ControlPanel<B> {
    pub fn new() -> Self {
        Self {
            layout: Vec::new(),
            state: ControlState::default(),
            callbacks: HashMap::new(),
            refresh: None,
        }
    }

    /// Register a top-level control. Names are unique across the whole
    /// tree, folders included.
    pub fn add(&mut self, name: &str, control: Control) -> Result<()> {
        control.check(name)?;
        let mut names = Vec::new();
        collect_names(name, &control, &mut names);
        if let Some(dup) = names.iter().find(|n| find(&self.layout, n).is_some()) {
            return Err(LumenError::Config(format!("control '{}' already exists", dup)));
        }

        record_state(name, &control, &mut self.state);
        self.layout.push((name.to_string(), control));
        Ok(())
    }

    pub fn add_folder(&mut self, name: &str, children: Vec<(String, Control)>) -> Result<()> {
        self.add(name, Control::Folder(children))
    }

    /// Callback run after `name` accepts a new value.
    pub fn on_change<F>(&mut self, name: &str, callback: F) -> Result<()>
    where
        F: FnMut(&ControlValue, &ControlState, &mut Renderer<B>) -> Result<()> + 'static,
    {
        if find(&self.layout, name).is_none() {
            return Err(LumenError::NotFound(format!("control '{}'", name)));
        }
        self.callbacks.insert(name.to_string(), Box::new(callback));
        Ok(())
    }

    /// Validate and store a new value for `name`, then run its callback.
    /// Returns the value actually stored, after clamping and snapping.
    pub fn set(&mut self, name: &str, value: ControlValue, renderer: &mut Renderer<B>) -> Result<ControlValue> {
        let control = find_mut(&mut self.layout, name)
            .ok_or_else(|| LumenError::NotFound(format!("control '{}'", name)))?;
        let accepted = control.accept(name, value)?;

        if accepted != ControlValue::Trigger {
            self.state.values.insert(name.to_string(), accepted.clone());
        }
        log::debug!("control '{}' = {:?}", name, accepted);

        if let Some(callback) = self.callbacks.get_mut(name) {
            callback(&accepted, &self.state, renderer)?;
        }
        self.refresh(renderer);
        Ok(accepted)
    }

    /// Source of the values the renderer owns. It runs after every `set`
    /// and on [`ControlPanel::refresh`].
    pub fn on_refresh<F>(&mut self, read: F)
    where
        F: Fn(&Renderer<B>) -> Vec<(String, ControlValue)> + 'static,
    {
        self.refresh = Some(Box::new(read));
    }

    /// Pull renderer-owned values back into the panel without running any
    /// callbacks. Unknown names and mismatched values are skipped.
    pub fn refresh(&mut self, renderer: &Renderer<B>) {
        let values = match &self.refresh {
            Some(read) => read(renderer),
            None => return,
        };
        for (name, value) in values {
            let Some(control) = find_mut(&mut self.layout, &name) else {
                log::warn!("refresh of unknown control '{}'", name);
                continue;
            };
            match control.accept(&name, value) {
                Ok(ControlValue::Trigger) => {}
                Ok(accepted) => {
                    self.state.values.insert(name, accepted);
                }
                Err(e) => log::warn!("refresh skipped: {}", e),
            }
        }
    }

    pub fn trigger(&mut self, name: &str, renderer: &mut Renderer<B>) -> Result<()> {
        self.set(name, ControlValue::Trigger, renderer).map(|_| ())
    }

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    pub fn control(&self, name: &str) -> Option<&Control> {
        find(&self.layout, name)
    }

    /// The control tree in registration order, with current values.
    pub fn layout(&self) -> &[(String, Control)] {
        &self.layout
    }
}

fn collect_names<'a>(name: &'a str, control: &'a Control, out: &mut Vec<&'a str>) {
    out.push(name);
    if let Control::Folder(children) = control {
        for (child, c) in children {
            collect_names(child, c, out);
        }
    }
}

fn record_state(name: &str, control: &Control, state: &mut ControlState) {
    match control {
        Control::Folder(children) => {
            for (child, c) in children {
                record_state(child, c, state);
            }
        }
        leaf => {
            if let Some(value) = leaf.current() {
                state.values.insert(name.to_string(), value);
            }
        }
    }
}

fn find<'a>(controls: &'a [(String, Control)], name: &str) -> Option<&'a Control> {
    for (n, control) in controls {
        if n.as_str() == name {
            return Some(control);
        }
        if let Control::Folder(children) = control {
            if let Some(found) = find(children, name) {
                return Some(found);
            }
        }
    }
    None
}

fn find_mut<'a>(controls: &'a mut [(String, Control)], name: &str) -> Option<&'a mut Control> {
    for (n, control) in controls.iter_mut() {
        if n.as_str() == name {
            return Some(control);
        }
        if let Control::Folder(children) = control {
            if let Some(found) = find_mut(children, name) {
                return Some(found);
            }
        }
    }
    None
}

pub const WORLD_COORDINATES: &str = "World Coordinates";
pub const CAMERA_COORDINATES: &str = "Camera Coordinates";

const TRANSLATE: [&str; 3] = ["Translate X", "Translate Y", "Translate Z"];
const POSITION: [&str; 3] = ["Position X", "Position Y", "Position Z"];
const ROTATION: [&str; 3] = ["Rotation X", "Rotation Y", "Rotation Z"];

fn grey(v: f64) -> [f32; 4] {
    let v = v as f32;
    [v, v, v, 1.0]
}

fn expect_number(value: &ControlValue) -> Result<f64> {
    match value {
        ControlValue::Number(v) => Ok(*v),
        other => Err(LumenError::Config(format!("expected a number, got {:?}", other))),
    }
}

fn expect_color(value: &ControlValue) -> Result<[f32; 4]> {
    match value {
        ControlValue::Color(c) => Ok(normalize_color(*c)),
        other => Err(LumenError::Config(format!("expected a color, got {:?}", other))),
    }
}

/// The default lighting, material and pose controls, seeded from the
/// renderer's current state.
pub fn standard_controls<B: GraphicsBackend + 'static>(renderer: &Renderer<B>) -> Result<ControlPanel<B>> {
    let mut panel = ControlPanel::new();
    let lighting = renderer.lighting().clone();
    let transforms = renderer.transforms();

    panel.add("Light Color", Control::ColorValue(denormalize_color(lighting.light_diffuse)))?;
    panel.on_change("Light Color", |v, _, r| {
        let color = expect_color(v)?;
        r.update_lighting(|l| l.light_diffuse = color);
        Ok(())
    })?;

    panel.add("Light Ambient Term", Control::range(lighting.light_ambient[0] as f64, 0.0, 1.0, 0.01))?;
    panel.on_change("Light Ambient Term", |v, _, r| {
        let term = grey(expect_number(v)?);
        r.update_lighting(|l| l.light_ambient = term);
        Ok(())
    })?;

    panel.add("Light Specular Term", Control::range(lighting.light_specular[0] as f64, 0.0, 1.0, 0.01))?;
    panel.on_change("Light Specular Term", |v, _, r| {
        let term = grey(expect_number(v)?);
        r.update_lighting(|l| l.light_specular = term);
        Ok(())
    })?;

    let direction = TRANSLATE
        .iter()
        .zip(lighting.light_direction)
        .map(|(name, d)| (name.to_string(), Control::range(d as f64, -10.0, 10.0, -0.1)))
        .collect();
    panel.add_folder("Light Direction", direction)?;
    for name in TRANSLATE {
        // X and Y are mirrored so the slider moves the light, not its direction.
        panel.on_change(name, |_, state, r| {
            let axis = |n: &str| state.number(n).unwrap_or(0.0) as f32;
            let direction = [-axis(TRANSLATE[0]), -axis(TRANSLATE[1]), axis(TRANSLATE[2])];
            r.update_lighting(|l| l.light_direction = direction);
            Ok(())
        })?;
    }

    let diffuse = renderer
        .scene()
        .iter()
        .next()
        .map(|o| o.diffuse)
        .unwrap_or([1.0, 1.0, 1.0, 1.0]);
    panel.add("Sphere Color", Control::ColorValue(denormalize_color(diffuse)))?;
    panel.on_change("Sphere Color", |v, _, r| {
        r.set_diffuse_all(expect_color(v)?);
        Ok(())
    })?;

    panel.add("Material Ambient Term", Control::range(lighting.material_ambient[0] as f64, 0.0, 1.0, 0.01))?;
    panel.on_change("Material Ambient Term", |v, _, r| {
        let term = grey(expect_number(v)?);
        r.update_lighting(|l| l.material_ambient = term);
        Ok(())
    })?;

    panel.add(
        "Material Specular Term",
        Control::range(lighting.material_specular[0] as f64, 0.0, 1.0, 0.01),
    )?;
    panel.on_change("Material Specular Term", |v, _, r| {
        let term = grey(expect_number(v)?);
        r.update_lighting(|l| l.material_specular = term);
        Ok(())
    })?;

    panel.add("Shininess", Control::range(lighting.shininess as f64, 0.0, 50.0, 0.1))?;
    panel.on_change("Shininess", |v, _, r| {
        let shininess = expect_number(v)? as f32;
        r.update_lighting(|l| l.shininess = shininess);
        Ok(())
    })?;

    panel.add("Background", Control::ColorValue(denormalize_color(renderer.clear_color())))?;
    panel.on_change("Background", |v, _, r| {
        let [red, green, blue, _] = expect_color(v)?;
        r.set_clear_color([red, green, blue, 1.0]);
        Ok(())
    })?;

    let wireframe = renderer.scene().iter().any(|o| o.wireframe);
    panel.add("Wireframe", Control::Toggle(wireframe))?;
    panel.on_change("Wireframe", |v, _, r| {
        if let ControlValue::Flag(on) = v {
            r.set_wireframe_all(*on);
        }
        Ok(())
    })?;

    let selected = match transforms.mode() {
        CoordinateMode::World => 0,
        CoordinateMode::Camera => 1,
    };
    panel.add("Coordinates", Control::options(&[WORLD_COORDINATES, CAMERA_COORDINATES], selected))?;
    panel.on_change("Coordinates", |v, _, r| {
        let mode = match v {
            ControlValue::Choice(c) if c == CAMERA_COORDINATES => CoordinateMode::Camera,
            _ => CoordinateMode::World,
        };
        r.transforms_mut().set_mode(mode);
        Ok(())
    })?;

    let position = transforms.position();
    let children = POSITION
        .iter()
        .enumerate()
        .map(|(i, name)| (name.to_string(), Control::range(position[i], -500.0, 500.0, 0.1)))
        .collect();
    panel.add_folder("Position", children)?;
    for (axis, name) in Axis::ALL.into_iter().zip(POSITION) {
        panel.on_change(name, move |v, _, r| {
            r.transforms_mut().set_position_axis(axis, expect_number(v)?);
            Ok(())
        })?;
    }

    let rotation: DVec3 = transforms.rotation();
    let children = ROTATION
        .iter()
        .enumerate()
        .map(|(i, name)| (name.to_string(), Control::range(rotation[i], -180.0, 180.0, 0.1)))
        .collect();
    panel.add_folder("Rotation", children)?;
    for (axis, name) in Axis::ALL.into_iter().zip(ROTATION) {
        panel.on_change(name, move |v, _, r| {
            r.transforms_mut().set_rotation_axis(axis, expect_number(v)?);
            Ok(())
        })?;
    }

    panel.add("Go Home", Control::Action)?;
    panel.on_change("Go Home", |_, _, r| {
        r.transforms_mut().reset();
        Ok(())
    })?;

    panel.on_refresh(pose_values);
    Ok(panel)
}

/// Mode, position and rotation as the pose controls show them.
fn pose_values<B: GraphicsBackend>(renderer: &Renderer<B>) -> Vec<(String, ControlValue)> {
    let transforms = renderer.transforms();
    let mode = match transforms.mode() {
        CoordinateMode::World => WORLD_COORDINATES,
        CoordinateMode::Camera => CAMERA_COORDINATES,
    };
    let position = transforms.position();
    let rotation = transforms.rotation();

    let mut values = vec![("Coordinates".to_string(), ControlValue::Choice(mode.to_string()))];
    for (axis, name) in Axis::ALL.into_iter().zip(POSITION) {
        values.push((name.to_string(), ControlValue::Number(position[axis.index()])));
    }
    for (axis, name) in Axis::ALL.into_iter().zip(ROTATION) {
        values.push((name.to_string(), ControlValue::Number(rotation[axis.index()])));
    }
    values
}

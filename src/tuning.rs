//! Runtime tunables and telemetry readouts
//!
//! Each tunable is a named, bounded, steppable value. [`Controls`] exposes them by
//! key and mirrors them, plus the telemetry readouts, onto the controls panel.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::platform::display::HudDisplay;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tunable {
    CameraHeight,
    CameraDistance,
    CameraZoom,
    CarSpeed,
    CarSteerAngle,
}

/// Initial value, inclusive range and slider step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub initial: f32,
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl Tunable {
    pub const ALL: [Tunable; 5] = [
        Tunable::CameraHeight,
        Tunable::CameraDistance,
        Tunable::CameraZoom,
        Tunable::CarSpeed,
        Tunable::CarSteerAngle,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Tunable::CameraHeight => "cameraPositionHeight",
            Tunable::CameraDistance => "cameraPositionDistance",
            Tunable::CameraZoom => "cameraZoom",
            Tunable::CarSpeed => "carSpeed",
            Tunable::CarSteerAngle => "carSteerAngle",
        }
    }

    pub fn bounds(&self) -> Bounds {
        let (initial, min, max, step) = match self {
            Tunable::CameraHeight => (5.0, -1.0, 10.0, 0.5),
            Tunable::CameraDistance => (10.0, -1.0, 30.0, 0.5),
            Tunable::CameraZoom => (5.0, -1.0, 10.0, 1.0),
            Tunable::CarSpeed => (3.0, 1.0, 5.0, 1.0),
            Tunable::CarSteerAngle => (5.0, 1.0, 10.0, 1.0),
        };
        Bounds {
            initial,
            min,
            max,
            step,
        }
    }
}

/// One field per tunable
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tunables {
    pub camera_height: f32,
    pub camera_distance: f32,
    pub camera_zoom: f32,
    pub car_speed: f32,
    pub car_steer_angle: f32,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            camera_height: Tunable::CameraHeight.bounds().initial,
            camera_distance: Tunable::CameraDistance.bounds().initial,
            camera_zoom: Tunable::CameraZoom.bounds().initial,
            car_speed: Tunable::CarSpeed.bounds().initial,
            car_steer_angle: Tunable::CarSteerAngle.bounds().initial,
        }
    }
}

impl Tunables {
    pub fn get(&self, tunable: Tunable) -> f32 {
        match tunable {
            Tunable::CameraHeight => self.camera_height,
            Tunable::CameraDistance => self.camera_distance,
            Tunable::CameraZoom => self.camera_zoom,
            Tunable::CarSpeed => self.car_speed,
            Tunable::CarSteerAngle => self.car_steer_angle,
        }
    }

    fn slot(&mut self, tunable: Tunable) -> &mut f32 {
        match tunable {
            Tunable::CameraHeight => &mut self.camera_height,
            Tunable::CameraDistance => &mut self.camera_distance,
            Tunable::CameraZoom => &mut self.camera_zoom,
            Tunable::CarSpeed => &mut self.car_speed,
            Tunable::CarSteerAngle => &mut self.car_steer_angle,
        }
    }
}

/// Telemetry shown on the controls panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Readout {
    CarPosX,
    CarPosY,
    CarPosZ,
    CarRotX,
    CarRotY,
    CarRotZ,
    CameraPosX,
    CameraPosY,
    CameraPosZ,
}

impl Readout {
    pub fn name(&self) -> &'static str {
        match self {
            Readout::CarPosX => "carPosX",
            Readout::CarPosY => "carPosY",
            Readout::CarPosZ => "carPosZ",
            Readout::CarRotX => "carRotX",
            Readout::CarRotY => "carRotY",
            Readout::CarRotZ => "carRotZ",
            Readout::CameraPosX => "cameraPosX",
            Readout::CameraPosY => "cameraPosY",
            Readout::CameraPosZ => "cameraPosZ",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Controls {
    values: Tunables,
    visible: bool,
    readouts: BTreeMap<Readout, String>,
    dirty: bool,
}

impl Controls {
    pub fn new(values: Tunables) -> Self {
        Self {
            values,
            visible: false,
            readouts: BTreeMap::new(),
            dirty: true,
        }
    }

    pub fn get(&self, tunable: Tunable) -> f32 {
        self.values.get(tunable)
    }

    pub fn values(&self) -> Tunables {
        self.values
    }

    /// Programmatic write, not clamped
    pub fn set(&mut self, tunable: Tunable, value: f32) {
        *self.values.slot(tunable) = value;
        self.dirty = true;
    }

    /// Interactive step, clamped to the tunable's bounds
    pub fn add(&mut self, tunable: Tunable, delta: f32) {
        let bounds = tunable.bounds();
        let value = (self.get(tunable) + delta).clamp(bounds.min, bounds.max);
        self.set(tunable, value);
    }

    pub fn toggle(&mut self) -> bool {
        self.visible = !self.visible;
        self.dirty = true;
        self.visible
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_readout(&mut self, readout: Readout, value: impl Into<String>) {
        self.readouts.insert(readout, value.into());
        self.dirty = true;
    }

    pub fn readout(&self, readout: Readout) -> Option<&str> {
        self.readouts.get(&readout).map(String::as_str)
    }

    /// Push pending changes to the panel
    pub fn sync(&mut self, display: &mut dyn HudDisplay) {
        if !self.dirty {
            return;
        }
        self.dirty = false;
        display.set_controls_visible(self.visible);
        for tunable in Tunable::ALL {
            display.set_control(tunable.name(), &self.get(tunable).to_string());
        }
        for (readout, value) in &self.readouts {
            display.set_control(readout.name(), value);
        }
    }
}

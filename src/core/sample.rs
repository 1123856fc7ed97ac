use std::{collections::HashMap, ops::Index, sync::Arc};

use glam::Mat4;
use strum::IntoEnumIterator;

use super::{
    blendshape::{BlendShape, NUM_SHAPES},
    rotation::{euler_angles, RotationError},
};

pub const FRAME_LEN: usize = 63;

const HEAD_POSITION: usize = NUM_SHAPES;
const HEAD_ROTATION: usize = HEAD_POSITION + 3;
const LEFT_EYE: usize = HEAD_ROTATION + 3;
const RIGHT_EYE: usize = LEFT_EYE + 2;
const TIMESTAMP: usize = RIGHT_EYE + 2;

pub type BlendShapes = HashMap<Arc<str>, f32>;

/// One face update as delivered by the sensor.
#[derive(Debug, Clone)]
pub struct TrackingSample {
    pub blendshapes: BlendShapes,
    pub head: Mat4,
    pub left_eye: Mat4,
    pub right_eye: Mat4,
}

impl Default for TrackingSample {
    fn default() -> Self {
        Self {
            blendshapes: BlendShapes::new(),
            head: Mat4::IDENTITY,
            left_eye: Mat4::IDENTITY,
            right_eye: Mat4::IDENTITY,
        }
    }
}

/// The fixed-layout argument list of one `/visage` message.
///
/// | index  | contents                                  |
/// |--------|-------------------------------------------|
/// | 0..52  | blendshapes, see [`BlendShape`]           |
/// | 52..55 | head position x, y, z                     |
/// | 55..58 | head rotation -roll, pitch, yaw (degrees) |
/// | 58..60 | left eye -roll, pitch                     |
/// | 60..62 | right eye -roll, pitch                    |
/// | 62     | timestamp in seconds                      |
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord([f32; FRAME_LEN]);

impl FrameRecord {
    pub fn values(&self) -> &[f32; FRAME_LEN] {
        &self.0
    }

    pub fn timestamp(&self) -> f32 {
        self.0[TIMESTAMP]
    }
}

impl Index<usize> for FrameRecord {
    type Output = f32;

    fn index(&self, index: usize) -> &f32 {
        &self.0[index]
    }
}

/// Turns samples into [`FrameRecord`]s.
///
/// Remembers which coefficients were reported missing so each one is only
/// warned about once.
pub struct SampleExtractor {
    warned: [bool; NUM_SHAPES],
}

impl Default for SampleExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleExtractor {
    pub fn new() -> Self {
        Self {
            warned: [false; NUM_SHAPES],
        }
    }

    pub fn extract(
        &mut self,
        sample: &TrackingSample,
        timestamp_secs: f32,
    ) -> Result<FrameRecord, RotationError> {
        let head = euler_angles(&sample.head)?;
        let left_eye = euler_angles(&sample.left_eye)?;
        let right_eye = euler_angles(&sample.right_eye)?;

        let mut data = [0f32; FRAME_LEN];

        for shape in BlendShape::iter() {
            data[shape.index()] = match sample.blendshapes.get(shape.name()) {
                Some(&value) if value.is_finite() => value.clamp(0., 1.),
                Some(value) => {
                    log::debug!("{} is not finite ({}), using 0", shape.name(), value);
                    0.
                }
                None => {
                    self.warn_missing(shape);
                    0.
                }
            };
        }

        let position = sample.head.w_axis;
        data[HEAD_POSITION..HEAD_ROTATION].copy_from_slice(&[position.x, position.y, position.z]);

        // the receiver expects roll negated and the axes in x, y, z order
        data[HEAD_ROTATION..LEFT_EYE].copy_from_slice(&[-head.roll, head.pitch, head.yaw]);
        data[LEFT_EYE..RIGHT_EYE].copy_from_slice(&[-left_eye.roll, left_eye.pitch]);
        data[RIGHT_EYE..TIMESTAMP].copy_from_slice(&[-right_eye.roll, right_eye.pitch]);

        data[TIMESTAMP] = timestamp_secs;

        Ok(FrameRecord(data))
    }

    fn warn_missing(&mut self, shape: BlendShape) {
        let warned = &mut self.warned[shape.index()];
        if !*warned {
            *warned = true;
            log::warn!(
                "Sensor does not report blendshape {}, sending 0 instead",
                shape.name()
            );
        }
    }

    pub fn missing(&self) -> impl Iterator<Item = BlendShape> + '_ {
        BlendShape::iter().filter(|shape| self.warned[shape.index()])
    }
}

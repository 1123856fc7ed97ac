use strum::{EnumCount, EnumIter, EnumString, IntoStaticStr};

/// Blendshape coefficients in wire order. The discriminant is the argument
/// index in the `/visage` message and the string form is the name the sensor
/// reports, so iterating this enum walks the whole coefficient layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount, EnumString, IntoStaticStr)]
#[strum(serialize_all = "camelCase")]
#[repr(usize)]
pub enum BlendShape {
    // brows, eyes
    BrowInnerUp,
    BrowDownLeft,
    BrowDownRight,
    BrowOuterUpLeft,
    BrowOuterUpRight,
    EyeLookUpLeft,
    EyeLookUpRight,
    EyeLookDownLeft,
    EyeLookDownRight,
    EyeLookInLeft,
    EyeLookInRight,
    EyeLookOutLeft,
    EyeLookOutRight,
    EyeBlinkLeft,
    EyeBlinkRight,
    EyeSquintLeft,
    EyeSquintRight,
    EyeWideLeft,
    EyeWideRight,

    // cheeks, nose
    CheekPuff,
    CheekSquintLeft,
    CheekSquintRight,
    NoseSneerLeft,
    NoseSneerRight,

    // jaw, mouth, tongue
    JawOpen,
    JawForward,
    JawLeft,
    JawRight,
    MouthFunnel,
    MouthPucker,
    MouthLeft,
    MouthRight,
    MouthRollUpper,
    MouthRollLower,
    MouthShrugUpper,
    MouthShrugLower,
    MouthClose,
    MouthSmileLeft,
    MouthSmileRight,
    MouthFrownLeft,
    MouthFrownRight,
    MouthDimpleLeft,
    MouthDimpleRight,
    MouthUpperUpLeft,
    MouthUpperUpRight,
    MouthLowerDownLeft,
    MouthLowerDownRight,
    MouthPressLeft,
    MouthPressRight,
    MouthStretchLeft,
    MouthStretchRight,
    TongueOut,
}

pub const NUM_SHAPES: usize = BlendShape::COUNT;

impl BlendShape {
    #[inline(always)]
    pub fn name(self) -> &'static str {
        self.into()
    }

    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn layout_is_dense() {
        assert_eq!(NUM_SHAPES, 52);
        for (i, shape) in BlendShape::iter().enumerate() {
            assert_eq!(shape.index(), i);
        }
    }

    #[test]
    fn group_boundaries() {
        assert_eq!(BlendShape::EyeWideRight.index(), 18);
        assert_eq!(BlendShape::CheekPuff.index(), 19);
        assert_eq!(BlendShape::NoseSneerRight.index(), 23);
        assert_eq!(BlendShape::JawOpen.index(), 24);
        assert_eq!(BlendShape::TongueOut.index(), 51);
    }

    #[test]
    fn sensor_names() {
        assert_eq!(BlendShape::JawOpen.name(), "jawOpen");
        assert_eq!(BlendShape::MouthLowerDownRight.name(), "mouthLowerDownRight");
        assert_eq!(BlendShape::from_str("tongueOut"), Ok(BlendShape::TongueOut));
        assert!(BlendShape::from_str("TongueOut").is_err());
    }
}

//! Compiled-in catalogs of consumer-format resources.
//!
//! The consumer editor identifies effects, filters, animations, transitions and
//! masks by resource ids baked into its asset store. Each catalog entry pairs a
//! display name with those ids plus, for effects, the adjustable parameter
//! table. `from_name` lookups are what `from_dict` uses to turn persisted
//! records back into typed values.

use crate::time::SECOND;

/// One adjustable parameter of an effect. `default`, `min` and `max` are in
/// the consumer's normalized 0.0–1.0 space; caller input is 0–100 and maps
/// linearly onto `[min, max]`.
#[derive(Debug, Clone, Copy)]
pub struct EffectParam {
    pub name: &'static str,
    pub default: f64,
    pub min: f64,
    pub max: f64,
}

impl EffectParam {
    pub const fn new(name: &'static str, default: f64, min: f64, max: f64) -> Self {
        Self {
            name,
            default,
            min,
            max,
        }
    }

    /// Map a 0–100 caller value onto this parameter's range.
    pub fn apply(&self, value: f64) -> f64 {
        self.min + (self.max - self.min) * value / 100.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EffectMeta {
    pub name: &'static str,
    pub effect_id: &'static str,
    pub resource_id: &'static str,
    pub params: &'static [EffectParam],
}

#[derive(Debug, Clone, Copy)]
pub struct FilterMeta {
    pub name: &'static str,
    pub effect_id: &'static str,
    pub resource_id: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct AnimationMeta {
    pub name: &'static str,
    pub resource_id: &'static str,
    /// Default play length in microseconds; group animations span the segment.
    pub duration: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct TransitionMeta {
    pub name: &'static str,
    pub effect_id: &'static str,
    pub resource_id: &'static str,
    pub default_duration: i64,
    pub is_overlap: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct MaskMeta {
    pub name: &'static str,
    pub resource_type: &'static str,
    pub resource_id: &'static str,
}

macro_rules! catalog_enum {
    ($(#[$attr:meta])* $name:ident, $meta:ty, { $($variant:ident => $entry:expr),+ $(,)? }) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn meta(&self) -> &'static $meta {
                match self {
                    $($name::$variant => {
                        const ENTRY: $meta = $entry;
                        &ENTRY
                    }),+
                }
            }

            /// Look a variant up by its catalog name, as persisted in exports.
            pub fn from_name(name: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|v| v.meta().name == name)
            }
        }
    };
}

catalog_enum!(
    /// Full-frame scene effects.
    VideoSceneEffectType,
    EffectMeta,
    {
        OldTv => EffectMeta {
            name: "Old TV",
            effect_id: "1064246",
            resource_id: "6724239388189921806",
            params: &[
                EffectParam::new("intensity", 0.6, 0.0, 1.0),
                EffectParam::new("speed", 0.33, 0.0, 1.0),
            ],
        },
        Glitch => EffectMeta {
            name: "Glitch",
            effect_id: "1064287",
            resource_id: "6724870185996292621",
            params: &[EffectParam::new("intensity", 0.8, 0.0, 1.0)],
        },
        Blur => EffectMeta {
            name: "Blur",
            effect_id: "1062412",
            resource_id: "6706773500528283143",
            params: &[EffectParam::new("blur", 0.5, 0.0, 1.0)],
        },
        Fireworks => EffectMeta {
            name: "Fireworks",
            effect_id: "1067500",
            resource_id: "6740885518856393230",
            params: &[
                EffectParam::new("density", 0.5, 0.0, 1.0),
                EffectParam::new("speed", 0.4, 0.0, 1.0),
                EffectParam::new("brightness", 0.75, 0.0, 1.0),
            ],
        },
        Neon => EffectMeta {
            name: "Neon",
            effect_id: "1069039",
            resource_id: "6748741854864691597",
            params: &[],
        },
    }
);

catalog_enum!(
    /// Effects applied to the detected character region.
    VideoCharacterEffectType,
    EffectMeta,
    {
        Outline => EffectMeta {
            name: "Outline",
            effect_id: "1109973",
            resource_id: "6896247684114977294",
            params: &[EffectParam::new("width", 0.25, 0.0, 1.0)],
        },
        Sparkle => EffectMeta {
            name: "Sparkle",
            effect_id: "1112362",
            resource_id: "6906224169100350983",
            params: &[
                EffectParam::new("density", 0.5, 0.0, 1.0),
                EffectParam::new("size", 0.3, 0.0, 1.0),
            ],
        },
    }
);

catalog_enum!(
    /// Color filters; all of these support an intensity slider.
    FilterType,
    FilterMeta,
    {
        Natural => FilterMeta {
            name: "Natural",
            effect_id: "1036636",
            resource_id: "6662965026755021326",
        },
        Vivid => FilterMeta {
            name: "Vivid",
            effect_id: "1036640",
            resource_id: "6662965027740682759",
        },
        Retro => FilterMeta {
            name: "Retro",
            effect_id: "1036696",
            resource_id: "6662965260427594254",
        },
        BlackWhite => FilterMeta {
            name: "Black & White",
            effect_id: "1036704",
            resource_id: "6662965441516360205",
        },
        Fresh => FilterMeta {
            name: "Fresh",
            effect_id: "1036712",
            resource_id: "6662965607786120712",
        },
        Film => FilterMeta {
            name: "Film",
            effect_id: "1036720",
            resource_id: "6662965762786137614",
        },
    }
);

catalog_enum!(
    /// Intro (entrance) animations.
    IntroType,
    AnimationMeta,
    {
        FadeIn => AnimationMeta {
            name: "Fade In",
            resource_id: "6798320778182923790",
            duration: SECOND / 2,
        },
        ZoomIn => AnimationMeta {
            name: "Zoom In",
            resource_id: "6798320977923520013",
            duration: SECOND / 2,
        },
        SlideRight => AnimationMeta {
            name: "Slide Right",
            resource_id: "6798321093518528014",
            duration: SECOND / 2,
        },
        Spin => AnimationMeta {
            name: "Spin",
            resource_id: "6798321195905290760",
            duration: SECOND,
        },
    }
);

catalog_enum!(
    /// Outro (exit) animations.
    OutroType,
    AnimationMeta,
    {
        FadeOut => AnimationMeta {
            name: "Fade Out",
            resource_id: "6798320827797836291",
            duration: SECOND / 2,
        },
        ZoomOut => AnimationMeta {
            name: "Zoom Out",
            resource_id: "6798321027936195083",
            duration: SECOND / 2,
        },
        SlideLeft => AnimationMeta {
            name: "Slide Left",
            resource_id: "6798321147176098311",
            duration: SECOND / 2,
        },
    }
);

catalog_enum!(
    /// Group animations spanning the whole segment.
    GroupAnimationType,
    AnimationMeta,
    {
        Swing => AnimationMeta {
            name: "Swing",
            resource_id: "6906224917922353671",
            duration: 0,
        },
        Rotate3d => AnimationMeta {
            name: "3D Rotate",
            resource_id: "6906225097518879239",
            duration: 0,
        },
        Flip => AnimationMeta {
            name: "Flip",
            resource_id: "6906225239272751111",
            duration: 0,
        },
    }
);

catalog_enum!(
    TransitionType,
    TransitionMeta,
    {
        Dissolve => TransitionMeta {
            name: "Dissolve",
            effect_id: "321493",
            resource_id: "6724855093732689421",
            default_duration: SECOND / 2,
            is_overlap: true,
        },
        FadeBlack => TransitionMeta {
            name: "Fade to Black",
            effect_id: "321505",
            resource_id: "6724855218510885389",
            default_duration: SECOND / 2,
            is_overlap: false,
        },
        WipeLeft => TransitionMeta {
            name: "Wipe Left",
            effect_id: "321521",
            resource_id: "6724855412329005581",
            default_duration: 2 * SECOND / 5,
            is_overlap: true,
        },
        BlurTransition => TransitionMeta {
            name: "Blur",
            effect_id: "321537",
            resource_id: "6724855633620266510",
            default_duration: SECOND / 2,
            is_overlap: true,
        },
    }
);

catalog_enum!(
    MaskType,
    MaskMeta,
    {
        Linear => MaskMeta {
            name: "Linear",
            resource_type: "mask",
            resource_id: "6744750697849557518",
        },
        Mirror => MaskMeta {
            name: "Mirror",
            resource_type: "mask",
            resource_id: "6744750697849573902",
        },
        Circle => MaskMeta {
            name: "Circle",
            resource_type: "mask",
            resource_id: "6744750697849590286",
        },
        Rectangle => MaskMeta {
            name: "Rectangle",
            resource_type: "mask",
            resource_id: "6744750697849606670",
        },
        Heart => MaskMeta {
            name: "Heart",
            resource_type: "mask",
            resource_id: "6744750697849623054",
        },
        Star => MaskMeta {
            name: "Star",
            resource_type: "mask",
            resource_id: "6744750697849639438",
        },
    }
);

catalog_enum!(
    AudioSceneEffectType,
    EffectMeta,
    {
        Echo => EffectMeta {
            name: "Echo",
            effect_id: "1065389",
            resource_id: "6729270322741505038",
            params: &[EffectParam::new("strength", 0.5, 0.0, 1.0)],
        },
        Reverb => EffectMeta {
            name: "Reverb",
            effect_id: "1065397",
            resource_id: "6729270456795631118",
            params: &[EffectParam::new("strength", 0.6, 0.0, 1.0)],
        },
        Telephone => EffectMeta {
            name: "Telephone",
            effect_id: "1065405",
            resource_id: "6729270601021257230",
            params: &[],
        },
    }
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_name_round_trips() {
        for filter in FilterType::ALL {
            assert_eq!(FilterType::from_name(filter.meta().name), Some(*filter));
        }
        assert_eq!(FilterType::from_name("No Such Filter"), None);
        assert_eq!(IntroType::from_name("Fade In"), Some(IntroType::FadeIn));
        assert_eq!(OutroType::from_name("Fade Out"), Some(OutroType::FadeOut));
    }

    #[test]
    fn param_mapping_is_linear() {
        let p = EffectParam::new("x", 0.5, 0.0, 1.0);
        assert_eq!(p.apply(0.0), 0.0);
        assert_eq!(p.apply(50.0), 0.5);
        assert_eq!(p.apply(100.0), 1.0);

        let shifted = EffectParam::new("y", 0.0, -1.0, 1.0);
        assert_eq!(shifted.apply(50.0), 0.0);
    }
}

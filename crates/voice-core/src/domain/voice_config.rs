//! `VoiceConfig` value object.
//!
//! Grounded in `app/domain/value_objects/voice_config.py::VoiceConfig` -- same
//! field set and the same validated ranges, ported from a validating
//! `__post_init__` to a validating constructor returning `Result`.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceConfig {
    pub name: String,
    pub speed: f32,
    pub pitch: i32,
    pub volume: u8,
    pub style: String,
    pub style_degree: f32,
}

impl VoiceConfig {
    pub const DEFAULT_STYLE: &'static str = "default";

    /// Constructs a `VoiceConfig`, validating every range invariant up front.
    pub fn new(
        name: impl Into<String>,
        speed: f32,
        pitch: i32,
        volume: u8,
        style: impl Into<String>,
        style_degree: f32,
    ) -> Result<Self, CoreError> {
        if !(0.5..=2.0).contains(&speed) {
            return Err(CoreError::InvalidVoiceConfig(format!(
                "speed {speed} out of range [0.5, 2.0]"
            )));
        }
        if !(-100..=100).contains(&pitch) {
            return Err(CoreError::InvalidVoiceConfig(format!(
                "pitch {pitch} out of range [-100, 100]"
            )));
        }
        if volume > 100 {
            return Err(CoreError::InvalidVoiceConfig(format!(
                "volume {volume} out of range [0, 100]"
            )));
        }
        if !(0.01..=2.0).contains(&style_degree) {
            return Err(CoreError::InvalidVoiceConfig(format!(
                "style_degree {style_degree} out of range [0.01, 2.0]"
            )));
        }
        Ok(Self {
            name: name.into(),
            speed,
            pitch,
            volume,
            style: style.into(),
            style_degree,
        })
    }

    pub fn default_for(name: impl Into<String>) -> Self {
        Self::new(name, 1.0, 0, 100, Self::DEFAULT_STYLE, 1.0)
            .expect("default voice config parameters are always in range")
    }

    /// Parameters to hand to an SSML builder, omitting style fields when the
    /// style is the provider's default (mirrors `to_ssml_params`).
    pub fn to_ssml_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("rate", format!("{:+.0}%", (self.speed - 1.0) * 100.0)),
            ("pitch", format!("{:+}Hz", self.pitch)),
            ("volume", self.volume.to_string()),
        ];
        if self.style != Self::DEFAULT_STYLE {
            params.push(("style", self.style.clone()));
            params.push(("styledegree", self.style_degree.to_string()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_speed() {
        assert!(VoiceConfig::new("es-MX-DaliaNeural", 2.5, 0, 100, "default", 1.0).is_err());
    }

    #[test]
    fn rejects_out_of_range_style_degree() {
        assert!(VoiceConfig::new("es-MX-DaliaNeural", 1.0, 0, 100, "cheerful", 3.0).is_err());
    }

    #[test]
    fn default_style_is_omitted_from_ssml_params() {
        let cfg = VoiceConfig::default_for("es-MX-DaliaNeural");
        assert!(cfg.to_ssml_params().iter().all(|(k, _)| *k != "style"));
    }

    #[test]
    fn non_default_style_is_included() {
        let cfg = VoiceConfig::new("es-MX-DaliaNeural", 1.0, 0, 100, "cheerful", 1.2).unwrap();
        assert!(cfg.to_ssml_params().iter().any(|(k, _)| *k == "style"));
    }
}

//! Brake system configuration files.

use super::*;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;

lazy_static! {
    static ref WAGON_PREFIX_REGEX: Regex = Regex::new(r"^wagon\(").unwrap();
    static ref WHITESPACE_REGEX: Regex = Regex::new(r"\s+").unwrap();
}

/// Lowercases a configuration key and strips whitespace and an optional `wagon(` prefix.
pub fn normalize_key(key: &str) -> String {
    let key = WHITESPACE_REGEX.replace_all(key, "").to_lowercase();
    WAGON_PREFIX_REGEX.replace(&key, "").into_owned()
}

/// Everything needed to build one car's brake system.
///
/// ```yaml
/// kind: air_twin_pipe
/// car_length_m: 14.0
/// settings:
///   graduated_release: true
/// parameters:
///   wagon(maxbrakeforce: 50000.0
///   TripleValveRatio: 2.0
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct BrakeConfig {
    #[serde(default)]
    pub kind: BrakeSystemKind,
    /// car file brake system type name; overrides the default [Self::kind] and must agree with
    /// any other
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    /// car length \[m\], sets the brake pipe volume
    #[serde(default)]
    pub car_length_m: f32,
    #[serde(default)]
    pub settings: BrakeSettings,
    /// configuration key to value, keys as they appear in car files
    #[serde(default)]
    pub parameters: BTreeMap<String, f32>,
}

impl SerdeAPI for BrakeConfig {
    fn init(&mut self) -> anyhow::Result<()> {
        ensure!(
            self.car_length_m.is_finite() && self.car_length_m >= 0.0,
            "{}\n`car_length_m` must be finite and non-negative, got {}",
            format_dbg!(),
            self.car_length_m
        );
        if let Some(max_substep_s) = self.settings.max_substep_s {
            ensure!(
                max_substep_s > 0.0,
                "{}\n`max_substep_s` must be positive, got {max_substep_s}",
                format_dbg!()
            );
        }
        for (key, value) in &self.parameters {
            ensure!(
                value.is_finite(),
                "{}\nParameter {key:?} must be finite, got {value}",
                format_dbg!()
            );
        }
        Ok(())
    }
}

impl BrakeConfig {
    pub fn resolved_kind(&self) -> BrakeSystemKind {
        self.type_name
            .as_deref()
            .map(BrakeSystemKind::from_type_name)
            .unwrap_or(self.kind)
    }

    /// Creates the configured brake system.  Keys no variant recognizes are logged and skipped.
    pub fn build(&self) -> anyhow::Result<BrakeSystemType> {
        if let Some(type_name) = &self.type_name {
            let named = BrakeSystemKind::from_type_name(type_name);
            ensure!(
                self.kind == BrakeSystemKind::default() || self.kind == named,
                "{}\nBrake system type name {type_name:?} selects `{named}` but `kind` is `{}`",
                format_dbg!(),
                self.kind
            );
        }
        let mut brakes = BrakeSystemType::new(self.resolved_kind(), self.car_length_m);
        for (key, value) in &self.parameters {
            let normalized = normalize_key(key);
            if !brakes.parse(&normalized, *value) {
                log::debug!(
                    "Ignoring brake parameter {key:?} for `{}` brake system",
                    brakes.kind()
                );
            }
        }
        Ok(brakes)
    }
}

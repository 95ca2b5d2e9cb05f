//! Twin-pipe air brake: the aux reservoir charges from the main-reservoir pipe (`line2`) and the
//! valve tracks the cylinder pressure implied by the brake pipe.

use super::flow::{charge_limit, decay_toward, substeps};
use super::valve::signal_transition;
use super::*;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, ApproxEq)]
pub struct AirTwinPipe {
    pub core: AirBrakeCore,
}

impl SerdeAPI for AirTwinPipe {}

impl AirTwinPipe {
    pub fn new(car_length_m: f32) -> Self {
        Self {
            core: AirBrakeCore::new(car_length_m),
        }
    }

    /// One twin-pipe integration step of length `dt`.
    pub fn integrate(&mut self, dt: f32) {
        let p = self.core.params;
        let s = &mut self.core.state;
        let lines = &mut self.core.lines;

        let threshold = s
            .retainer_threshold_psi
            .max((s.emerg_res_psi - lines.line1_psi) * p.aux_cyl_volume_ratio);
        if s.auto_cyl_psi > threshold {
            s.triple_valve_state = ValveState::Release;
            decay_toward(
                &mut s.auto_cyl_psi,
                threshold,
                dt * s.release_rate_psi_per_s,
            );
        } else if s.auto_cyl_psi < threshold {
            s.triple_valve_state = ValveState::Apply;
            let ratio = p.aux_cyl_volume_ratio;
            let mut dp = dt * p.max_application_rate_psi_per_s;
            if s.aux_res_psi - dp / ratio < s.auto_cyl_psi + dp {
                dp = (s.aux_res_psi - s.auto_cyl_psi) * ratio / (1.0 + ratio);
            }
            if threshold < s.auto_cyl_psi + dp {
                dp = threshold - s.auto_cyl_psi;
            }
            s.aux_res_psi -= dp / ratio;
            s.auto_cyl_psi += dp;
        } else {
            s.triple_valve_state = ValveState::Lap;
        }

        if lines.line1_psi > s.emerg_res_psi {
            let draw_ratio = p.emerg_aux_volume_ratio * p.aux_brake_line_volume_ratio;
            let dp = charge_limit(
                s.emerg_res_psi,
                lines.line1_psi,
                dt * p.emerg_res_charging_rate_psi_per_s,
                draw_ratio,
            );
            s.emerg_res_psi += dp;
            lines.line1_psi -= dp * draw_ratio;
            s.triple_valve_state = ValveState::Release;
        }

        if s.aux_res_psi < lines.line2_psi {
            let dp = charge_limit(
                s.aux_res_psi,
                lines.line2_psi,
                dt * p.max_aux_charging_rate_psi_per_s,
                p.aux_brake_line_volume_ratio,
            );
            s.aux_res_psi += dp;
            lines.line2_psi -= dp * p.aux_brake_line_volume_ratio;
        }
    }
}

impl BrakeSystem for AirTwinPipe {
    fn lines(&self) -> &BrakeLines {
        &self.core.lines
    }

    fn lines_mut(&mut self) -> &mut BrakeLines {
        &mut self.core.lines
    }

    fn initialize(&mut self, handbrake_on: bool, charged_pressure_psi: f32) {
        self.core.initialize(handbrake_on, charged_pressure_psi)
    }

    fn initialize_moving(&mut self) {
        self.core.initialize_moving()
    }

    fn initialize_from_copy(&mut self, template: &Self) -> anyhow::Result<()> {
        self.core.initialize_from_copy(&template.core);
        Ok(())
    }

    fn connect(&mut self) {
        self.core.lines.connect()
    }

    fn disconnect(&mut self) {
        self.core.disconnect()
    }

    fn update(&mut self, elapsed_s: f32, settings: &BrakeSettings, host: &mut dyn BrakeHost) {
        if self.core.lines.is_connected() {
            let prev = self.core.state.triple_valve_state;
            let (count, dt) = substeps(elapsed_s, settings.max_substep_s);
            for _ in 0..count {
                self.integrate(dt);
            }
            signal_transition(prev, self.core.state.triple_valve_state, host);
            self.core.bleed_independent_release(elapsed_s);
        }
        self.core.apply_brake_force(host);
    }

    fn set_ai_percent(&mut self, percent: f32) -> f32 {
        self.core.set_ai_percent(percent)
    }

    fn brake_percent(&self) -> f32 {
        self.core.state.brake_percent
    }

    fn set_handbrake_percent(&mut self, percent: f32) {
        self.core.state.handbrake_percent = clamp_percent(percent);
    }

    fn handbrake_percent(&self) -> f32 {
        self.core.state.handbrake_percent
    }

    fn set_retainer(&mut self, setting: RetainerSetting) {
        self.core.set_retainer(setting)
    }

    fn cylinder_pressure_psi(&self) -> f32 {
        self.core.state.cyl_psi
    }

    fn brake_force_n(&self) -> f32 {
        self.core.state.brake_force_n
    }

    fn status(&self, detail_level: u8) -> String {
        self.core.status(
            detail_level,
            Some(format!("MRP {:.0}", self.core.lines.line2_psi)),
        )
    }

    fn readout(&self) -> BrakeReadout {
        self.core.readout()
    }

    fn save(&self, wtr: &mut dyn Write) -> anyhow::Result<()> {
        self.core.save(wtr)
    }

    fn restore(&mut self, rdr: &mut dyn Read) -> anyhow::Result<()> {
        self.core.restore(rdr)
    }

    fn parse(&mut self, key: &str, value: f32) -> bool {
        self.core.parse(key, value, true)
    }
}

//! Automatic air brake with a triple valve, and the core shared by every air variant.

use super::flow::{charge_limit, decay_toward, discharge_limit, substeps};
use super::persist::{read_record, write_record, AirBrakeRecord};
use super::valve::{signal_transition, single_pipe_transition};
use super::*;

/// Tunable per-car parameters of an air brake.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, ApproxEq)]
pub struct AirBrakeParams {
    /// brake force at max cylinder pressure \[N\]
    pub max_brake_force_n: f32,
    /// brake force with handbrake fully applied \[N\]
    pub max_handbrake_force_n: f32,
    /// cylinder pressure giving [Self::max_brake_force_n] \[psi\]
    pub max_cyl_pressure_psi: f32,
    /// aux reservoir volume over brake cylinder volume
    pub aux_cyl_volume_ratio: f32,
    /// aux reservoir volume over brake pipe volume
    pub aux_brake_line_volume_ratio: f32,
    /// cylinder release rate with the retainer exhausting \[psi/s\]
    pub max_release_rate_psi_per_s: f32,
    /// cylinder application rate \[psi/s\]
    pub max_application_rate_psi_per_s: f32,
    /// aux reservoir charging rate \[psi/s\]
    pub max_aux_charging_rate_psi_per_s: f32,
    /// emergency reservoir charging rate \[psi/s\]
    pub emerg_res_charging_rate_psi_per_s: f32,
    /// emergency reservoir volume over aux reservoir volume
    pub emerg_aux_volume_ratio: f32,
    /// brake pipe volume \[ft³\]
    pub brake_pipe_volume_ft3: f32,
}

impl AirBrakeParams {
    pub fn new(car_length_m: f32) -> Self {
        Self {
            max_brake_force_n: 89e3,
            max_handbrake_force_n: 0.0,
            max_cyl_pressure_psi: 64.0,
            aux_cyl_volume_ratio: 2.5,
            aux_brake_line_volume_ratio: 3.1,
            max_release_rate_psi_per_s: 1.86,
            max_application_rate_psi_per_s: 0.9,
            max_aux_charging_rate_psi_per_s: 1.684,
            emerg_res_charging_rate_psi_per_s: 1.684,
            emerg_aux_volume_ratio: 1.4,
            brake_pipe_volume_ft3: BRAKE_PIPE_VOLUME_FT3_PER_M * (1.0 + car_length_m),
        }
    }
}

impl Default for AirBrakeParams {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Reservoir, cylinder, and valve state of one air-braked car.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, ApproxEq)]
pub struct AirBrakeState {
    /// last brake percent requested through AI control
    pub brake_percent: f32,
    pub handbrake_percent: f32,
    /// current cylinder release rate, set by the retainer \[psi/s\]
    pub release_rate_psi_per_s: f32,
    /// pressure the retainer holds in the cylinder \[psi\]
    pub retainer_threshold_psi: f32,
    /// cylinder pressure from the automatic brake \[psi\]
    pub auto_cyl_psi: f32,
    /// effective cylinder pressure, including the engine brake \[psi\]
    pub cyl_psi: f32,
    pub aux_res_psi: f32,
    pub emerg_res_psi: f32,
    pub triple_valve_state: ValveState,
    /// friction force from the latest update \[N\]
    pub brake_force_n: f32,
}

impl Default for AirBrakeState {
    fn default() -> Self {
        Self {
            brake_percent: 0.0,
            handbrake_percent: 0.0,
            release_rate_psi_per_s: 1.86,
            retainer_threshold_psi: 0.0,
            auto_cyl_psi: 64.0,
            cyl_psi: 64.0,
            aux_res_psi: 64.0,
            emerg_res_psi: 64.0,
            triple_valve_state: ValveState::Lap,
            brake_force_n: 0.0,
        }
    }
}

/// Parameters, state, and trainline pressures shared by all air variants.  Variants add their
/// own flow rules around the single-pipe integration step.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, ApproxEq)]
pub struct AirBrakeCore {
    pub params: AirBrakeParams,
    #[serde(default)]
    pub state: AirBrakeState,
    #[serde(default)]
    pub lines: BrakeLines,
}

impl AirBrakeCore {
    pub fn new(car_length_m: f32) -> Self {
        Self {
            params: AirBrakeParams::new(car_length_m),
            state: Default::default(),
            lines: Default::default(),
        }
    }

    pub fn initialize(&mut self, handbrake_on: bool, charged_pressure_psi: f32) {
        let line1_psi = self.lines.line1_psi.max(0.0);
        self.lines.line3_psi = 0.0;
        self.state.aux_res_psi = line1_psi;
        self.state.emerg_res_psi = charged_pressure_psi.max(0.0);
        self.state.auto_cyl_psi = ((charged_pressure_psi - line1_psi)
            * self.params.aux_cyl_volume_ratio)
            .min(self.params.max_cyl_pressure_psi)
            .max(0.0);
        self.state.cyl_psi = self.state.auto_cyl_psi;
        self.state.triple_valve_state = ValveState::Lap;
        self.state.handbrake_percent = if handbrake_on { 100.0 } else { 0.0 };
    }

    pub fn initialize_moving(&mut self) {
        let line1_psi = self.lines.line1_psi.max(0.0);
        self.lines.line3_psi = 0.0;
        self.state.aux_res_psi = line1_psi;
        self.state.auto_cyl_psi = 0.0;
        self.state.cyl_psi = 0.0;
        self.state.triple_valve_state = ValveState::Lap;
        self.state.handbrake_percent = 0.0;
    }

    pub fn initialize_from_copy(&mut self, template: &AirBrakeCore) {
        self.params = template.params;
        self.state.retainer_threshold_psi = template.state.retainer_threshold_psi;
        self.state.release_rate_psi_per_s = template.state.release_rate_psi_per_s;
    }

    pub fn disconnect(&mut self) {
        self.initialize(false, 0.0);
        self.lines.disconnect();
    }

    /// One single-pipe triple valve step of length `dt`.
    pub fn integrate_triple_valve(&mut self, dt: f32, graduated_release: bool) {
        let p = self.params;
        let s = &mut self.state;
        let line1 = &mut self.lines.line1_psi;

        s.triple_valve_state = single_pipe_transition(*line1, s.aux_res_psi, s.triple_valve_state);

        if matches!(
            s.triple_valve_state,
            ValveState::Apply | ValveState::Emergency
        ) {
            let ratio = p.aux_cyl_volume_ratio;
            let mut dp = dt * p.max_application_rate_psi_per_s;
            if s.aux_res_psi - dp / ratio < s.auto_cyl_psi + dp {
                dp = (s.aux_res_psi - s.auto_cyl_psi) * ratio / (1.0 + ratio);
            }
            if *line1 > s.aux_res_psi - dp / ratio {
                // aux has fallen to brake pipe pressure
                dp = (s.aux_res_psi - *line1) * ratio;
                s.triple_valve_state = ValveState::Lap;
            }
            s.aux_res_psi -= dp / ratio;
            s.auto_cyl_psi += dp;

            if s.triple_valve_state == ValveState::Emergency {
                let dp = discharge_limit(
                    s.emerg_res_psi,
                    s.aux_res_psi,
                    dt * p.max_application_rate_psi_per_s,
                    p.emerg_aux_volume_ratio,
                );
                s.emerg_res_psi -= dp;
                s.aux_res_psi += dp * p.emerg_aux_volume_ratio;
            }
        }

        if s.triple_valve_state == ValveState::Release {
            let mut threshold = s.retainer_threshold_psi;
            if graduated_release {
                threshold = threshold.max((s.emerg_res_psi - *line1) * p.aux_cyl_volume_ratio);
            }
            decay_toward(
                &mut s.auto_cyl_psi,
                threshold,
                dt * s.release_rate_psi_per_s,
            );

            if !graduated_release && s.aux_res_psi < s.emerg_res_psi && s.aux_res_psi < *line1 {
                let mut dp = discharge_limit(
                    s.emerg_res_psi,
                    s.aux_res_psi,
                    dt * p.emerg_res_charging_rate_psi_per_s,
                    p.emerg_aux_volume_ratio,
                );
                if *line1 < s.aux_res_psi + dp * p.emerg_aux_volume_ratio {
                    dp = (*line1 - s.aux_res_psi) / p.emerg_aux_volume_ratio;
                }
                s.emerg_res_psi -= dp;
                s.aux_res_psi += dp * p.emerg_aux_volume_ratio;
            }
            if s.aux_res_psi > s.emerg_res_psi {
                let dp = charge_limit(
                    s.emerg_res_psi,
                    s.aux_res_psi,
                    dt * p.emerg_res_charging_rate_psi_per_s,
                    p.emerg_aux_volume_ratio,
                );
                s.emerg_res_psi += dp;
                s.aux_res_psi -= dp * p.emerg_aux_volume_ratio;
            }
            if s.aux_res_psi < *line1 {
                let dp = charge_limit(
                    s.aux_res_psi,
                    *line1,
                    dt * p.max_aux_charging_rate_psi_per_s,
                    p.aux_brake_line_volume_ratio,
                );
                s.aux_res_psi += dp;
                *line1 -= dp * p.aux_brake_line_volume_ratio;
            }
        }
    }

    /// Strips the independent-release offset from `line3` and bleeds the automatic cylinder.
    pub fn bleed_independent_release(&mut self, elapsed_s: f32) {
        if self.lines.take_independent_release() && elapsed_s > 0.0 {
            self.state.auto_cyl_psi -= self.params.max_release_rate_psi_per_s * elapsed_s;
        }
    }

    /// Settles the cylinder pressure and adds the resulting friction force to `host`.
    pub fn apply_brake_force(&mut self, host: &mut dyn BrakeHost) {
        // disconnected cars skip the bleed but line3 must still be a real pressure here
        self.lines.take_independent_release();
        let s = &mut self.state;
        if s.auto_cyl_psi < 0.0 {
            s.auto_cyl_psi = 0.0;
        }
        s.cyl_psi = s.auto_cyl_psi.max(self.lines.line3_psi);
        let p = &self.params;
        let handbrake_force_n = p.max_handbrake_force_n * s.handbrake_percent / 100.0;
        s.brake_force_n = if p.max_cyl_pressure_psi > 0.0 {
            p.max_brake_force_n * s.cyl_psi / p.max_cyl_pressure_psi
        } else {
            0.0
        }
        .max(handbrake_force_n);
        host.add_friction_force(s.brake_force_n);
    }

    /// Brake pipe pressure that produces `percent` of a full service application.
    pub fn set_ai_percent(&mut self, percent: f32) -> f32 {
        self.state.brake_percent = clamp_percent(percent);
        CHARGED_BRAKE_PIPE_PSI - FULL_SERVICE_REDUCTION_PSI * self.state.brake_percent / 100.0
    }

    pub fn set_retainer(&mut self, setting: RetainerSetting) {
        self.state.retainer_threshold_psi = setting.threshold_psi();
        self.state.release_rate_psi_per_s =
            setting.release_rate_psi_per_s(self.params.max_release_rate_psi_per_s);
    }

    /// Status fields common to all air variants; `extra` goes before the handbrake field.
    pub fn status(&self, detail_level: u8, extra: Option<String>) -> String {
        if !self.lines.is_connected() {
            return String::new();
        }
        let s = &self.state;
        let mut fields = vec![format!("BP {:.0}", self.lines.line1_psi)];
        if detail_level >= 1 {
            fields.push(format!("BC {:.0}", s.cyl_psi));
        }
        if detail_level >= 2 {
            fields.push(format!("AR {:.0}", s.aux_res_psi));
            fields.push(format!("ER {:.0}", s.emerg_res_psi));
            fields.push(format!("State {}", s.triple_valve_state));
            fields.extend(extra);
            if s.handbrake_percent > 0.0 {
                fields.push(format!("Handbrake {:.0}%", s.handbrake_percent));
            }
        }
        fields.join(" ")
    }

    pub fn readout(&self) -> BrakeReadout {
        BrakeReadout {
            line1_psi: self.lines.line1_psi,
            line2_psi: self.lines.line2_psi,
            cylinder_psi: self.state.cyl_psi,
            aux_res_psi: self.state.aux_res_psi,
            emerg_res_psi: self.state.emerg_res_psi,
            brake_percent: self.state.brake_percent,
            brake_force_n: self.state.brake_force_n,
            valve_state: self.state.triple_valve_state,
        }
    }

    pub fn save(&self, wtr: &mut dyn Write) -> anyhow::Result<()> {
        write_record(wtr, &AirBrakeRecord::capture(self))
    }

    pub fn restore(&mut self, rdr: &mut dyn Read) -> anyhow::Result<()> {
        let record: AirBrakeRecord = read_record(rdr)?;
        record.apply_to(self)
    }

    /// Binds an air brake configuration key.  `sets_initial_cylinder` also seeds the automatic
    /// cylinder from the max cylinder pressure.
    pub fn parse(&mut self, key: &str, value: f32, sets_initial_cylinder: bool) -> bool {
        let p = &mut self.params;
        match key {
            "maxhandbrakeforce" => p.max_handbrake_force_n = value,
            "maxbrakeforce" => p.max_brake_force_n = value,
            "brakecylinderpressureformaxbrakebrakeforce" => {
                p.max_cyl_pressure_psi = value;
                if sets_initial_cylinder {
                    self.state.auto_cyl_psi = value;
                }
            }
            "triplevalveratio" => p.aux_cyl_volume_ratio = value,
            "maxreleaserate" => {
                p.max_release_rate_psi_per_s = value;
                self.state.release_rate_psi_per_s = value;
            }
            "maxapplicationrate" => p.max_application_rate_psi_per_s = value,
            "maxauxilarychargingrate" => p.max_aux_charging_rate_psi_per_s = value,
            "emergencyreschargingrate" => p.emerg_res_charging_rate_psi_per_s = value,
            "emergencyresvolumemultiplier" => p.emerg_aux_volume_ratio = value,
            "brakepipevolume" => p.brake_pipe_volume_ft3 = value,
            _ => return false,
        }
        true
    }
}

/// Single-pipe automatic air brake.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, ApproxEq)]
pub struct AirSinglePipe {
    pub core: AirBrakeCore,
}

impl SerdeAPI for AirSinglePipe {}

impl AirSinglePipe {
    pub fn new(car_length_m: f32) -> Self {
        Self {
            core: AirBrakeCore::new(car_length_m),
        }
    }
}

impl BrakeSystem for AirSinglePipe {
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
                self.core
                    .integrate_triple_valve(dt, settings.graduated_release);
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
        self.core.status(detail_level, None)
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

//! Electro-pneumatic brake: a single-pipe air brake whose cylinder also tracks the EP demand on
//! `line4`, charging from the main-reservoir pipe.

use super::flow::{discharge_limit, substeps};
use super::valve::signal_transition;
use super::*;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, ApproxEq)]
pub struct ElectroPneumatic {
    pub core: AirBrakeCore,
    /// EP valve state; only ever `Lap`, `Apply` or `Release`
    #[serde(default)]
    pub ep_state: ValveState,
}

impl SerdeAPI for ElectroPneumatic {}

impl ElectroPneumatic {
    pub fn new(car_length_m: f32) -> Self {
        Self {
            core: AirBrakeCore::new(car_length_m),
            ep_state: ValveState::Lap,
        }
    }

    /// Takes the EP demand as the retained cylinder pressure and opens the exhaust when the
    /// cylinder is above it.
    fn pre_integrate(&mut self) {
        let s = &mut self.core.state;
        s.retainer_threshold_psi = self.core.lines.line4_psi;
        if s.auto_cyl_psi > s.retainer_threshold_psi {
            self.ep_state = ValveState::Release;
            if s.triple_valve_state == ValveState::Lap {
                s.triple_valve_state = ValveState::Release;
            }
        }
    }

    /// Charges the cylinder from `line2` up to the EP demand.
    fn post_integrate(&mut self, elapsed_s: f32) {
        let p = self.core.params;
        let s = &mut self.core.state;
        let lines = &mut self.core.lines;
        if s.auto_cyl_psi < s.retainer_threshold_psi {
            self.ep_state = ValveState::Apply;
            let mut dp = discharge_limit(
                lines.line2_psi,
                s.auto_cyl_psi,
                elapsed_s.max(0.0) * p.max_application_rate_psi_per_s,
                1.0,
            );
            if s.retainer_threshold_psi < s.auto_cyl_psi + dp {
                dp = s.retainer_threshold_psi - s.auto_cyl_psi;
            }
            // an empty main reservoir pipe cannot draw the cylinder down
            let dp = dp.max(0.0);
            lines.line2_psi -= dp;
            s.auto_cyl_psi += dp;
        }
    }
}

impl BrakeSystem for ElectroPneumatic {
    fn lines(&self) -> &BrakeLines {
        &self.core.lines
    }

    fn lines_mut(&mut self) -> &mut BrakeLines {
        &mut self.core.lines
    }

    fn initialize(&mut self, handbrake_on: bool, charged_pressure_psi: f32) {
        self.core.initialize(handbrake_on, charged_pressure_psi);
        self.ep_state = ValveState::Lap;
    }

    fn initialize_moving(&mut self) {
        self.core.initialize_moving();
        self.ep_state = ValveState::Lap;
    }

    fn initialize_from_copy(&mut self, template: &Self) -> anyhow::Result<()> {
        self.core.initialize_from_copy(&template.core);
        Ok(())
    }

    fn connect(&mut self) {
        self.core.lines.connect()
    }

    fn disconnect(&mut self) {
        self.core.disconnect();
        self.ep_state = ValveState::Lap;
    }

    fn update(&mut self, elapsed_s: f32, settings: &BrakeSettings, host: &mut dyn BrakeHost) {
        if self.core.lines.is_connected() {
            let prev_triple = self.core.state.triple_valve_state;
            let prev_ep = self.ep_state;
            self.pre_integrate();
            let (count, dt) = substeps(elapsed_s, settings.max_substep_s);
            for _ in 0..count {
                self.core
                    .integrate_triple_valve(dt, settings.graduated_release);
            }
            signal_transition(prev_triple, self.core.state.triple_valve_state, host);
            self.post_integrate(elapsed_s);
            signal_transition(prev_ep, self.ep_state, host);
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

    /// The EP demand overrides the retainer threshold every tick; only the release rate sticks.
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
        self.core
            .status(detail_level, Some(format!("EP {}", self.ep_state)))
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
        self.core.parse(key, value, false)
    }
}

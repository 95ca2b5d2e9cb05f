//! Simplified vacuum brake: force follows the brake pipe vacuum directly, with no reservoirs and
//! no valve state machine.

use super::persist::{read_record, write_record, VacuumBrakeRecord};
use super::*;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, ApproxEq)]
pub struct VacuumBrakeParams {
    /// brake force with the pipe fully destroyed \[N\]
    pub max_brake_force_n: f32,
    /// brake force with handbrake fully applied \[N\]
    pub max_handbrake_force_n: f32,
    /// brake pipe pressure of a fully released train
    pub max_pressure_psi: f32,
}

impl Default for VacuumBrakeParams {
    fn default() -> Self {
        Self {
            max_brake_force_n: 89e3,
            max_handbrake_force_n: 0.0,
            max_pressure_psi: 21.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, ApproxEq)]
pub struct VacuumBrakeState {
    pub brake_percent: f32,
    pub handbrake_percent: f32,
    /// friction force from the latest update \[N\]
    pub brake_force_n: f32,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, ApproxEq)]
pub struct VacuumSinglePipe {
    pub params: VacuumBrakeParams,
    #[serde(default)]
    pub state: VacuumBrakeState,
    #[serde(default)]
    pub lines: BrakeLines,
}

impl SerdeAPI for VacuumSinglePipe {}

impl VacuumSinglePipe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Brake percent implied by the current brake pipe pressure.
    pub fn percent_from_line1(&self) -> f32 {
        if self.params.max_pressure_psi > 0.0 {
            clamp_percent(100.0 * (1.0 - self.lines.line1_psi / self.params.max_pressure_psi))
        } else {
            0.0
        }
    }
}

impl BrakeSystem for VacuumSinglePipe {
    fn lines(&self) -> &BrakeLines {
        &self.lines
    }

    fn lines_mut(&mut self) -> &mut BrakeLines {
        &mut self.lines
    }

    /// Vacuum brake pipe pressures are written externally, so only the handbrake and the brake
    /// percent are set here.
    fn initialize(&mut self, handbrake_on: bool, _charged_pressure_psi: f32) {
        self.state.handbrake_percent = if handbrake_on { 100.0 } else { 0.0 };
        self.state.brake_percent = if self.lines.is_connected() {
            self.percent_from_line1()
        } else {
            0.0
        };
    }

    fn initialize_moving(&mut self) {
        self.state.brake_percent = 0.0;
        self.state.handbrake_percent = 0.0;
    }

    fn initialize_from_copy(&mut self, template: &Self) -> anyhow::Result<()> {
        self.params = template.params;
        Ok(())
    }

    fn connect(&mut self) {
        self.lines.connect()
    }

    fn disconnect(&mut self) {
        self.lines.disconnect();
        self.state.brake_percent = 0.0;
        self.state.brake_force_n = 0.0;
    }

    fn update(&mut self, _elapsed_s: f32, _settings: &BrakeSettings, host: &mut dyn BrakeHost) {
        if !self.lines.is_connected() {
            return;
        }
        self.state.brake_percent = self.percent_from_line1();
        self.state.brake_force_n = self.params.max_brake_force_n * self.state.brake_percent / 100.0;
        host.add_friction_force(self.state.brake_force_n);
    }

    /// Writes the brake pipe pressure for `percent` straight into `line1`.
    fn set_ai_percent(&mut self, percent: f32) -> f32 {
        self.state.brake_percent = clamp_percent(percent);
        let line1_psi = self.params.max_pressure_psi * (1.0 - self.state.brake_percent / 100.0);
        if self.lines.is_connected() {
            self.lines.line1_psi = line1_psi;
        }
        line1_psi
    }

    fn brake_percent(&self) -> f32 {
        self.state.brake_percent
    }

    fn set_handbrake_percent(&mut self, percent: f32) {
        self.state.handbrake_percent = clamp_percent(percent);
    }

    fn handbrake_percent(&self) -> f32 {
        self.state.handbrake_percent
    }

    fn set_retainer(&mut self, _setting: RetainerSetting) {}

    fn cylinder_pressure_psi(&self) -> f32 {
        0.0
    }

    fn brake_force_n(&self) -> f32 {
        self.state.brake_force_n
    }

    fn status(&self, detail_level: u8) -> String {
        if !self.lines.is_connected() {
            return String::new();
        }
        let mut fields = vec![format!("BP {:.0}", self.lines.line1_psi)];
        if detail_level >= 1 {
            fields.push(format!("Brake {:.0}%", self.state.brake_percent));
        }
        if detail_level >= 2 && self.state.handbrake_percent > 0.0 {
            fields.push(format!("Handbrake {:.0}%", self.state.handbrake_percent));
        }
        fields.join(" ")
    }

    fn readout(&self) -> BrakeReadout {
        BrakeReadout {
            line1_psi: self.lines.line1_psi,
            line2_psi: self.lines.line2_psi,
            brake_percent: self.state.brake_percent,
            brake_force_n: self.state.brake_force_n,
            ..Default::default()
        }
    }

    fn save(&self, wtr: &mut dyn Write) -> anyhow::Result<()> {
        write_record(
            wtr,
            &VacuumBrakeRecord {
                line1_psi: self.lines.line1_psi,
                line2_psi: self.lines.line2_psi,
                line3_psi: self.lines.line3_psi,
                brake_percent: self.state.brake_percent,
            },
        )
    }

    fn restore(&mut self, rdr: &mut dyn Read) -> anyhow::Result<()> {
        let record: VacuumBrakeRecord = read_record(rdr)?;
        self.lines.line1_psi = record.line1_psi;
        self.lines.line2_psi = record.line2_psi;
        self.lines.line3_psi = record.line3_psi;
        self.state.brake_percent = record.brake_percent;
        Ok(())
    }

    fn parse(&mut self, key: &str, value: f32) -> bool {
        match key {
            "maxbrakeforce" => self.params.max_brake_force_n = value,
            "brakecylinderpressureformaxbrakebrakeforce" => self.params.max_pressure_psi = value,
            _ => return false,
        }
        true
    }
}

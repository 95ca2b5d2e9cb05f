//! Brake system variants sharing one per-car contract.

use crate::imports::*;

pub mod air_single_pipe;
pub mod air_twin_pipe;
pub mod config;
pub mod ep;
pub mod flow;
pub mod persist;
pub mod vacuum_single_pipe;
pub mod valve;


pub use air_single_pipe::{AirBrakeCore, AirBrakeParams, AirBrakeState, AirSinglePipe};
pub use air_twin_pipe::AirTwinPipe;
pub use config::BrakeConfig;
pub use ep::ElectroPneumatic;
pub use vacuum_single_pipe::{VacuumBrakeParams, VacuumBrakeState, VacuumSinglePipe};
pub use valve::{RetainerSetting, ValveState};

/// Simulation-wide options passed into every `update`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, ApproxEq)]
pub struct BrakeSettings {
    /// release in steps that follow the brake pipe instead of all at once
    #[serde(default)]
    pub graduated_release: bool,
    /// upper bound on one integration step \[s\]; `None` integrates each tick in one step
    #[serde(default = "default_max_substep_s")]
    pub max_substep_s: Option<f32>,
}

fn default_max_substep_s() -> Option<f32> {
    Some(DEFAULT_MAX_SUBSTEP_S)
}

impl Default for BrakeSettings {
    fn default() -> Self {
        Self {
            graduated_release: false,
            max_substep_s: default_max_substep_s(),
        }
    }
}

/// Snapshot of the quantities worth recording every tick.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct BrakeReadout {
    pub line1_psi: f32,
    pub line2_psi: f32,
    pub cylinder_psi: f32,
    pub aux_res_psi: f32,
    pub emerg_res_psi: f32,
    pub brake_percent: f32,
    pub brake_force_n: f32,
    pub valve_state: ValveState,
}

/// Per-car brake system contract.
pub trait BrakeSystem {
    fn lines(&self) -> &BrakeLines;
    fn lines_mut(&mut self) -> &mut BrakeLines;

    /// Sets up reservoirs for a stationary car whose brake pipe is already at its current
    /// pressure.  `charged_pressure_psi` is the pressure of a fully charged system.
    fn initialize(&mut self, handbrake_on: bool, charged_pressure_psi: f32);
    /// Sets up reservoirs for a car that starts in motion with brakes released.
    fn initialize_moving(&mut self);
    /// Copies tunable parameters from a template car of the same variant.
    fn initialize_from_copy(&mut self, template: &Self) -> anyhow::Result<()>
    where
        Self: Sized;
    fn connect(&mut self);
    fn disconnect(&mut self);

    /// Advances the brake system by `elapsed_s` and adds its friction force to `host`.
    fn update(&mut self, elapsed_s: f32, settings: &BrakeSettings, host: &mut dyn BrakeHost);

    /// Stores the clamped brake percent and returns the brake pipe pressure that produces it.
    fn set_ai_percent(&mut self, percent: f32) -> f32;
    fn brake_percent(&self) -> f32;
    fn increase(&mut self) -> f32 {
        self.set_ai_percent(self.brake_percent() + BRAKE_PERCENT_STEP)
    }
    fn decrease(&mut self) -> f32 {
        self.set_ai_percent(self.brake_percent() - BRAKE_PERCENT_STEP)
    }

    fn set_handbrake_percent(&mut self, percent: f32);
    fn handbrake_percent(&self) -> f32;
    fn handbrake_engaged(&self) -> bool {
        self.handbrake_percent() > 0.0
    }

    fn set_retainer(&mut self, setting: RetainerSetting);

    fn cylinder_pressure_psi(&self) -> f32;
    /// Friction force computed by the latest `update` \[N\]
    fn brake_force_n(&self) -> f32;
    /// Human readable status; higher `detail_level` adds more fields.
    fn status(&self, detail_level: u8) -> String;
    fn readout(&self) -> BrakeReadout;

    /// Writes the persisted fields in their fixed order.
    fn save(&self, wtr: &mut dyn Write) -> anyhow::Result<()>;
    /// Reads the persisted fields back without recomputing anything derived from them.
    fn restore(&mut self, rdr: &mut dyn Read) -> anyhow::Result<()>;
    /// Binds one normalized configuration key, returning whether it was recognized.
    fn parse(&mut self, key: &str, value: f32) -> bool;
}

/// Brake system variant selector used by configuration files.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BrakeSystemKind {
    #[default]
    AirSinglePipe,
    AirTwinPipe,
    Ep,
    VacuumSinglePipe,
}

impl BrakeSystemKind {
    /// Picks a variant from a car file's brake system type name.  Anything unrecognized is
    /// treated as a single-pipe air brake.
    pub fn from_type_name(name: &str) -> Self {
        let name = name.trim().to_lowercase();
        if name.starts_with("vacuum") {
            Self::VacuumSinglePipe
        } else if name == "ep" {
            Self::Ep
        } else if name == "air_twin_pipe" {
            Self::AirTwinPipe
        } else {
            Self::AirSinglePipe
        }
    }
}

impl std::fmt::Display for BrakeSystemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::AirSinglePipe => "air_single_pipe",
            Self::AirTwinPipe => "air_twin_pipe",
            Self::Ep => "ep",
            Self::VacuumSinglePipe => "vacuum_single_pipe",
        })
    }
}

/// Any brake system variant, dispatched by `match`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum BrakeSystemType {
    AirSinglePipe(AirSinglePipe),
    AirTwinPipe(AirTwinPipe),
    ElectroPneumatic(ElectroPneumatic),
    VacuumSinglePipe(VacuumSinglePipe),
}

impl SerdeAPI for BrakeSystemType {}

impl BrakeSystemType {
    /// Creates a brake system with default parameters for a car of `car_length_m`.
    pub fn new(kind: BrakeSystemKind, car_length_m: f32) -> Self {
        match kind {
            BrakeSystemKind::AirSinglePipe => Self::AirSinglePipe(AirSinglePipe::new(car_length_m)),
            BrakeSystemKind::AirTwinPipe => Self::AirTwinPipe(AirTwinPipe::new(car_length_m)),
            BrakeSystemKind::Ep => Self::ElectroPneumatic(ElectroPneumatic::new(car_length_m)),
            BrakeSystemKind::VacuumSinglePipe => Self::VacuumSinglePipe(VacuumSinglePipe::new()),
        }
    }

    /// Creates a brake system from a car file's brake system type name.
    pub fn from_type_name(name: &str, car_length_m: f32) -> Self {
        Self::new(BrakeSystemKind::from_type_name(name), car_length_m)
    }

    pub fn kind(&self) -> BrakeSystemKind {
        match self {
            Self::AirSinglePipe(_) => BrakeSystemKind::AirSinglePipe,
            Self::AirTwinPipe(_) => BrakeSystemKind::AirTwinPipe,
            Self::ElectroPneumatic(_) => BrakeSystemKind::Ep,
            Self::VacuumSinglePipe(_) => BrakeSystemKind::VacuumSinglePipe,
        }
    }

    /// Shared air brake core, if this is an air variant.
    pub fn air_core(&self) -> Option<&AirBrakeCore> {
        match self {
            Self::AirSinglePipe(b) => Some(&b.core),
            Self::AirTwinPipe(b) => Some(&b.core),
            Self::ElectroPneumatic(b) => Some(&b.core),
            Self::VacuumSinglePipe(_) => None,
        }
    }

    pub fn air_core_mut(&mut self) -> Option<&mut AirBrakeCore> {
        match self {
            Self::AirSinglePipe(b) => Some(&mut b.core),
            Self::AirTwinPipe(b) => Some(&mut b.core),
            Self::ElectroPneumatic(b) => Some(&mut b.core),
            Self::VacuumSinglePipe(_) => None,
        }
    }

    /// Persisted bytes of the current state.
    pub fn save_to_bytes(&self) -> anyhow::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.save(&mut buf)?;
        Ok(buf)
    }

    /// Restores state from persisted bytes.
    pub fn restore_from_bytes(&mut self, mut bytes: &[u8]) -> anyhow::Result<()> {
        self.restore(&mut bytes)
    }
}

impl BrakeSystem for BrakeSystemType {
    fn lines(&self) -> &BrakeLines {
        match self {
            Self::AirSinglePipe(b) => b.lines(),
            Self::AirTwinPipe(b) => b.lines(),
            Self::ElectroPneumatic(b) => b.lines(),
            Self::VacuumSinglePipe(b) => b.lines(),
        }
    }

    fn lines_mut(&mut self) -> &mut BrakeLines {
        match self {
            Self::AirSinglePipe(b) => b.lines_mut(),
            Self::AirTwinPipe(b) => b.lines_mut(),
            Self::ElectroPneumatic(b) => b.lines_mut(),
            Self::VacuumSinglePipe(b) => b.lines_mut(),
        }
    }

    fn initialize(&mut self, handbrake_on: bool, charged_pressure_psi: f32) {
        match self {
            Self::AirSinglePipe(b) => b.initialize(handbrake_on, charged_pressure_psi),
            Self::AirTwinPipe(b) => b.initialize(handbrake_on, charged_pressure_psi),
            Self::ElectroPneumatic(b) => b.initialize(handbrake_on, charged_pressure_psi),
            Self::VacuumSinglePipe(b) => b.initialize(handbrake_on, charged_pressure_psi),
        }
    }

    fn initialize_moving(&mut self) {
        match self {
            Self::AirSinglePipe(b) => b.initialize_moving(),
            Self::AirTwinPipe(b) => b.initialize_moving(),
            Self::ElectroPneumatic(b) => b.initialize_moving(),
            Self::VacuumSinglePipe(b) => b.initialize_moving(),
        }
    }

    fn initialize_from_copy(&mut self, template: &Self) -> anyhow::Result<()> {
        match (self, template) {
            (Self::AirSinglePipe(b), Self::AirSinglePipe(t)) => b.initialize_from_copy(t),
            (Self::AirTwinPipe(b), Self::AirTwinPipe(t)) => b.initialize_from_copy(t),
            (Self::ElectroPneumatic(b), Self::ElectroPneumatic(t)) => b.initialize_from_copy(t),
            (Self::VacuumSinglePipe(b), Self::VacuumSinglePipe(t)) => b.initialize_from_copy(t),
            (b, t) => bail!(
                "{}\nCannot copy a `{}` brake system into a `{}` brake system",
                format_dbg!(),
                t.kind(),
                b.kind()
            ),
        }
    }

    fn connect(&mut self) {
        match self {
            Self::AirSinglePipe(b) => b.connect(),
            Self::AirTwinPipe(b) => b.connect(),
            Self::ElectroPneumatic(b) => b.connect(),
            Self::VacuumSinglePipe(b) => b.connect(),
        }
    }

    fn disconnect(&mut self) {
        match self {
            Self::AirSinglePipe(b) => b.disconnect(),
            Self::AirTwinPipe(b) => b.disconnect(),
            Self::ElectroPneumatic(b) => b.disconnect(),
            Self::VacuumSinglePipe(b) => b.disconnect(),
        }
    }

    fn update(&mut self, elapsed_s: f32, settings: &BrakeSettings, host: &mut dyn BrakeHost) {
        match self {
            Self::AirSinglePipe(b) => b.update(elapsed_s, settings, host),
            Self::AirTwinPipe(b) => b.update(elapsed_s, settings, host),
            Self::ElectroPneumatic(b) => b.update(elapsed_s, settings, host),
            Self::VacuumSinglePipe(b) => b.update(elapsed_s, settings, host),
        }
    }

    fn set_ai_percent(&mut self, percent: f32) -> f32 {
        match self {
            Self::AirSinglePipe(b) => b.set_ai_percent(percent),
            Self::AirTwinPipe(b) => b.set_ai_percent(percent),
            Self::ElectroPneumatic(b) => b.set_ai_percent(percent),
            Self::VacuumSinglePipe(b) => b.set_ai_percent(percent),
        }
    }

    fn brake_percent(&self) -> f32 {
        match self {
            Self::AirSinglePipe(b) => b.brake_percent(),
            Self::AirTwinPipe(b) => b.brake_percent(),
            Self::ElectroPneumatic(b) => b.brake_percent(),
            Self::VacuumSinglePipe(b) => b.brake_percent(),
        }
    }

    fn set_handbrake_percent(&mut self, percent: f32) {
        match self {
            Self::AirSinglePipe(b) => b.set_handbrake_percent(percent),
            Self::AirTwinPipe(b) => b.set_handbrake_percent(percent),
            Self::ElectroPneumatic(b) => b.set_handbrake_percent(percent),
            Self::VacuumSinglePipe(b) => b.set_handbrake_percent(percent),
        }
    }

    fn handbrake_percent(&self) -> f32 {
        match self {
            Self::AirSinglePipe(b) => b.handbrake_percent(),
            Self::AirTwinPipe(b) => b.handbrake_percent(),
            Self::ElectroPneumatic(b) => b.handbrake_percent(),
            Self::VacuumSinglePipe(b) => b.handbrake_percent(),
        }
    }

    fn set_retainer(&mut self, setting: RetainerSetting) {
        match self {
            Self::AirSinglePipe(b) => b.set_retainer(setting),
            Self::AirTwinPipe(b) => b.set_retainer(setting),
            Self::ElectroPneumatic(b) => b.set_retainer(setting),
            Self::VacuumSinglePipe(b) => b.set_retainer(setting),
        }
    }

    fn cylinder_pressure_psi(&self) -> f32 {
        match self {
            Self::AirSinglePipe(b) => b.cylinder_pressure_psi(),
            Self::AirTwinPipe(b) => b.cylinder_pressure_psi(),
            Self::ElectroPneumatic(b) => b.cylinder_pressure_psi(),
            Self::VacuumSinglePipe(b) => b.cylinder_pressure_psi(),
        }
    }

    fn brake_force_n(&self) -> f32 {
        match self {
            Self::AirSinglePipe(b) => b.brake_force_n(),
            Self::AirTwinPipe(b) => b.brake_force_n(),
            Self::ElectroPneumatic(b) => b.brake_force_n(),
            Self::VacuumSinglePipe(b) => b.brake_force_n(),
        }
    }

    fn status(&self, detail_level: u8) -> String {
        match self {
            Self::AirSinglePipe(b) => b.status(detail_level),
            Self::AirTwinPipe(b) => b.status(detail_level),
            Self::ElectroPneumatic(b) => b.status(detail_level),
            Self::VacuumSinglePipe(b) => b.status(detail_level),
        }
    }

    fn readout(&self) -> BrakeReadout {
        match self {
            Self::AirSinglePipe(b) => b.readout(),
            Self::AirTwinPipe(b) => b.readout(),
            Self::ElectroPneumatic(b) => b.readout(),
            Self::VacuumSinglePipe(b) => b.readout(),
        }
    }

    fn save(&self, wtr: &mut dyn Write) -> anyhow::Result<()> {
        match self {
            Self::AirSinglePipe(b) => b.save(wtr),
            Self::AirTwinPipe(b) => b.save(wtr),
            Self::ElectroPneumatic(b) => b.save(wtr),
            Self::VacuumSinglePipe(b) => b.save(wtr),
        }
    }

    fn restore(&mut self, rdr: &mut dyn Read) -> anyhow::Result<()> {
        match self {
            Self::AirSinglePipe(b) => b.restore(rdr),
            Self::AirTwinPipe(b) => b.restore(rdr),
            Self::ElectroPneumatic(b) => b.restore(rdr),
            Self::VacuumSinglePipe(b) => b.restore(rdr),
        }
    }

    fn parse(&mut self, key: &str, value: f32) -> bool {
        match self {
            Self::AirSinglePipe(b) => b.parse(key, value),
            Self::AirTwinPipe(b) => b.parse(key, value),
            Self::ElectroPneumatic(b) => b.parse(key, value),
            Self::VacuumSinglePipe(b) => b.parse(key, value),
        }
    }
}

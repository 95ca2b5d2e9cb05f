pub use crate::brake_line::BrakeLines;
pub use crate::brakes::{
    AirBrakeParams, AirBrakeState, AirSinglePipe, AirTwinPipe, BrakeConfig, BrakeReadout,
    BrakeSettings, BrakeSystem, BrakeSystemKind, BrakeSystemType, ElectroPneumatic,
    RetainerSetting, VacuumBrakeParams, VacuumBrakeState, VacuumSinglePipe, ValveState,
};
pub use crate::host::{BrakeEvent, BrakeHost, CarForces};
pub use crate::simulation::{
    BrakeSimulation, BrakeTickState, EventRecord, PressureTrace, PressureTraceElement,
    SimulationSummary,
};
pub use crate::traits::{ApproxEq, SerdeAPI};

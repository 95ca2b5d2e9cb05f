//! Module containing brake model parameters that are shared by every car.

/// Offset added to `line3` by the locomotive to signal independent release
pub const INDEPENDENT_RELEASE_OFFSET_PSI: f32 = 1000.0;

/// Brake pipe pressure of a fully charged train, psi
pub const CHARGED_BRAKE_PIPE_PSI: f32 = 90.0;
/// Brake pipe reduction for a full-service application, psi
pub const FULL_SERVICE_REDUCTION_PSI: f32 = 26.0;
/// Step applied by `increase` and `decrease`, percent
pub const BRAKE_PERCENT_STEP: f32 = 10.0;

/// Brake pipe below aux reservoir by more than this triggers an emergency application
pub const EMERGENCY_TRIGGER_PSI: f32 = 10.0;
/// Dead band of the single-pipe triple valve, psi
pub const TRIPLE_VALVE_DEADBAND_PSI: f32 = 1.0;

/// Reference pressure of the retaining valve release-rate table, psi
pub const RETAINER_REFERENCE_PSI: f32 = 50.0;

/// Brake pipe volume per metre of car plus the fixed hose volume, ft³
pub const BRAKE_PIPE_VOLUME_FT3_PER_M: f32 = 0.028;

/// Default upper bound on one integration sub-step, s
pub const DEFAULT_MAX_SUBSTEP_S: f32 = 1.0;
/// Hard cap on sub-steps per tick
pub const MAX_SUBSTEPS: usize = 1000;

//! Valve states, triple-valve transition logic, and the retaining valve table.

use crate::imports::*;

/// Discrete state of a triple valve (or EP valve).  Persisted as an `i32` tag.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ValveState {
    #[default]
    Lap,
    Apply,
    Release,
    Emergency,
}

impl ValveState {
    pub fn tag(self) -> i32 {
        match self {
            Self::Lap => 0,
            Self::Apply => 1,
            Self::Release => 2,
            Self::Emergency => 3,
        }
    }

    /// Short label used in status strings
    pub fn label(self) -> &'static str {
        match self {
            Self::Lap => "Lap",
            Self::Apply => "Apply",
            Self::Release => "Release",
            Self::Emergency => "Emergency",
        }
    }

    /// Event raised on entering this state, if any.
    pub fn event(self) -> Option<BrakeEvent> {
        match self {
            Self::Lap => None,
            Self::Apply => Some(BrakeEvent::TrainBrakeApply),
            Self::Release => Some(BrakeEvent::TrainBrakeRelease),
            Self::Emergency => Some(BrakeEvent::TrainBrakeEmergency),
        }
    }
}

impl TryFrom<i32> for ValveState {
    type Error = anyhow::Error;

    fn try_from(tag: i32) -> anyhow::Result<Self> {
        Ok(match tag {
            0 => Self::Lap,
            1 => Self::Apply,
            2 => Self::Release,
            3 => Self::Emergency,
            _ => bail!("{}\nUnknown valve state tag: {tag}", format_dbg!()),
        })
    }
}

impl std::fmt::Display for ValveState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl ApproxEq for ValveState {
    fn approx_eq(&self, other: &ValveState, _tol: f64) -> bool {
        self == other
    }
}

/// Next single-pipe triple valve state.  Rules are checked in order and the first match wins.
pub fn single_pipe_transition(line1_psi: f32, aux_res_psi: f32, prev: ValveState) -> ValveState {
    if line1_psi < aux_res_psi - EMERGENCY_TRIGGER_PSI {
        ValveState::Emergency
    } else if line1_psi > aux_res_psi + TRIPLE_VALVE_DEADBAND_PSI {
        ValveState::Release
    } else if prev == ValveState::Emergency && line1_psi > aux_res_psi {
        ValveState::Release
    } else if prev != ValveState::Emergency && line1_psi < aux_res_psi - TRIPLE_VALVE_DEADBAND_PSI
    {
        ValveState::Apply
    } else if prev == ValveState::Apply && line1_psi >= aux_res_psi {
        ValveState::Lap
    } else {
        prev
    }
}

/// Raises the event for a state change between the start and the end of a tick.
pub fn signal_transition(prev: ValveState, next: ValveState, host: &mut dyn BrakeHost) {
    if prev != next {
        if let Some(event) = next.event() {
            host.signal_event(event);
        }
    }
}

/// Manual retaining valve position.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RetainerSetting {
    #[default]
    Exhaust,
    HighPressure,
    LowPressure,
    SlowDirect,
}

impl RetainerSetting {
    /// Retained cylinder pressure, psi
    pub fn threshold_psi(self) -> f32 {
        match self {
            Self::Exhaust | Self::SlowDirect => 0.0,
            Self::HighPressure => 20.0,
            Self::LowPressure => 10.0,
        }
    }

    /// Cylinder release rate, psi/s
    pub fn release_rate_psi_per_s(self, max_release_rate_psi_per_s: f32) -> f32 {
        match self {
            Self::Exhaust => max_release_rate_psi_per_s,
            Self::HighPressure => (RETAINER_REFERENCE_PSI - 20.0) / 90.0,
            Self::LowPressure => (RETAINER_REFERENCE_PSI - 10.0) / 60.0,
            Self::SlowDirect => (RETAINER_REFERENCE_PSI - 10.0) / 86.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::CarForces;
    use ValveState::*;

    #[test]
    fn test_tag_round_trip() {
        for state in [Lap, Apply, Release, Emergency] {
            assert_eq!(ValveState::try_from(state.tag()).unwrap(), state);
        }
        assert!(ValveState::try_from(4).is_err());
        assert!(ValveState::try_from(-1).is_err());
    }

    #[test]
    fn test_transition_precedence() {
        // emergency beats everything
        assert_eq!(single_pipe_transition(53.0, 64.0, Release), Emergency);
        assert_eq!(single_pipe_transition(53.0, 64.0, Emergency), Emergency);
        // exactly ten below is a service application
        assert_eq!(single_pipe_transition(54.0, 64.0, Lap), Apply);
        assert_eq!(single_pipe_transition(65.5, 64.0, Apply), Release);
        assert_eq!(single_pipe_transition(64.5, 64.0, Emergency), Release);
        // an emergency only recovers by a brake pipe rise
        assert_eq!(single_pipe_transition(60.0, 64.0, Emergency), Emergency);
        assert_eq!(single_pipe_transition(64.0, 64.0, Apply), Lap);
        assert_eq!(single_pipe_transition(64.5, 64.0, Apply), Lap);
        // dead band holds the previous state
        assert_eq!(single_pipe_transition(63.5, 64.0, Release), Release);
        assert_eq!(single_pipe_transition(63.5, 64.0, Lap), Lap);
        assert_eq!(single_pipe_transition(63.5, 64.0, Apply), Apply);
    }

    #[test]
    fn test_transition_is_pure() {
        for _ in 0..3 {
            assert_eq!(single_pipe_transition(70.0, 64.0, Lap), Release);
        }
    }

    #[test]
    fn test_signal_transition() {
        let mut host = CarForces::default();
        signal_transition(Lap, Lap, &mut host);
        signal_transition(Apply, Lap, &mut host);
        assert!(host.events.is_empty());
        signal_transition(Lap, Emergency, &mut host);
        signal_transition(Emergency, Release, &mut host);
        assert_eq!(
            host.events,
            vec![BrakeEvent::TrainBrakeEmergency, BrakeEvent::TrainBrakeRelease]
        );
    }

    #[test]
    fn test_retainer_table() {
        assert_eq!(RetainerSetting::Exhaust.threshold_psi(), 0.0);
        assert_eq!(RetainerSetting::Exhaust.release_rate_psi_per_s(1.86), 1.86);
        assert_eq!(RetainerSetting::HighPressure.threshold_psi(), 20.0);
        assert!(RetainerSetting::HighPressure
            .release_rate_psi_per_s(1.86)
            .approx_eq(&(30.0 / 90.0), 1e-6));
        assert_eq!(RetainerSetting::LowPressure.threshold_psi(), 10.0);
        assert!(RetainerSetting::LowPressure
            .release_rate_psi_per_s(1.86)
            .approx_eq(&(40.0 / 60.0), 1e-6));
        assert_eq!(RetainerSetting::SlowDirect.threshold_psi(), 0.0);
        assert!(RetainerSetting::SlowDirect
            .release_rate_psi_per_s(1.86)
            .approx_eq(&(40.0 / 86.0), 1e-6));
    }
}

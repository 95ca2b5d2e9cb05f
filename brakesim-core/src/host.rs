//! Capability the owning car exposes to its brake system.

use crate::imports::*;

/// Sound/visual triggers raised by a brake system when its valve changes state.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BrakeEvent {
    TrainBrakeApply,
    TrainBrakeRelease,
    TrainBrakeEmergency,
}

/// Implemented by whatever owns a brake system.  `update` only ever adds to the friction force.
pub trait BrakeHost {
    fn add_friction_force(&mut self, force_n: f32);
    fn signal_event(&mut self, event: BrakeEvent);
}

/// Minimal host that accumulates force and records events, one tick at a time.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct CarForces {
    /// friction force accumulated during the current tick
    pub friction_force_n: f32,
    /// events raised during the current tick
    pub events: Vec<BrakeEvent>,
}

impl CarForces {
    /// Clears per-tick accumulators.
    pub fn begin_tick(&mut self) {
        self.friction_force_n = 0.0;
        self.events.clear();
    }
}

impl BrakeHost for CarForces {
    fn add_friction_force(&mut self, force_n: f32) {
        self.friction_force_n += force_n;
    }

    fn signal_event(&mut self, event: BrakeEvent) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forces_accumulate_until_tick_reset() {
        let mut host = CarForces::default();
        host.add_friction_force(100.0);
        host.add_friction_force(50.0);
        host.signal_event(BrakeEvent::TrainBrakeApply);
        assert_eq!(host.friction_force_n, 150.0);
        assert_eq!(host.events, vec![BrakeEvent::TrainBrakeApply]);
        host.begin_tick();
        assert_eq!(host.friction_force_n, 0.0);
        assert!(host.events.is_empty());
    }
}

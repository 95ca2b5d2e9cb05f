//! Trainline pressures seen by one car.

use crate::imports::*;

/// Trainline-wide signals written by the coupling between cars.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, ApproxEq)]
pub struct BrakeLines {
    /// automatic brake pipe, psi; negative when disconnected
    pub line1_psi: f32,
    /// main-reservoir equalization pipe, psi
    pub line2_psi: f32,
    /// engine brake-cylinder equalization pipe, psi; offset by
    /// [INDEPENDENT_RELEASE_OFFSET_PSI] to signal independent release
    pub line3_psi: f32,
    /// EP brake demand, target cylinder pressure
    pub line4_psi: f32,
}

impl Default for BrakeLines {
    fn default() -> Self {
        Self {
            line1_psi: CHARGED_BRAKE_PIPE_PSI,
            line2_psi: 0.0,
            line3_psi: 0.0,
            line4_psi: 0.0,
        }
    }
}

impl BrakeLines {
    pub fn is_connected(&self) -> bool {
        self.line1_psi >= 0.0
    }

    /// Marks the brake pipe as disconnected and drains the equalization pipe.
    pub fn disconnect(&mut self) {
        self.line1_psi = -1.0;
        self.line2_psi = 0.0;
    }

    /// Reconnects a disconnected brake pipe at zero pressure.
    pub fn connect(&mut self) {
        if !self.is_connected() {
            self.line1_psi = 0.0;
        }
    }

    /// Strips the independent-release offset from `line3`, returning whether it was present.
    pub fn take_independent_release(&mut self) -> bool {
        if self.line3_psi >= INDEPENDENT_RELEASE_OFFSET_PSI {
            self.line3_psi -= INDEPENDENT_RELEASE_OFFSET_PSI;
            true
        } else {
            false
        }
    }
}

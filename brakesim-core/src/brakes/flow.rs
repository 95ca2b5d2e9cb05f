//! Bounded-rate transfer between two volumes, clamped so neither side crosses the shared
//! equalized pressure.

use crate::imports::*;

/// Transfer `dp` out of `source_psi` into a sink that gains `dp * gain_ratio`.
/// Returns `dp` reduced to the equalizing amount when the full step would overshoot.
pub fn discharge_limit(source_psi: f32, sink_psi: f32, dp: f32, gain_ratio: f32) -> f32 {
    if source_psi - dp < sink_psi + dp * gain_ratio {
        (source_psi - sink_psi) / (1.0 + gain_ratio)
    } else {
        dp
    }
}

/// Transfer `dp` into `sink_psi` from a source that loses `dp * draw_ratio`.
/// Returns `dp` reduced to the equalizing amount when the full step would overshoot.
pub fn charge_limit(sink_psi: f32, source_psi: f32, dp: f32, draw_ratio: f32) -> f32 {
    if sink_psi + dp > source_psi - dp * draw_ratio {
        (source_psi - sink_psi) / (1.0 + draw_ratio)
    } else {
        dp
    }
}

/// Lowers `pressure_psi` by `dp` when above `target_psi`, without undershooting it.
pub fn decay_toward(pressure_psi: &mut f32, target_psi: f32, dp: f32) {
    if *pressure_psi > target_psi {
        *pressure_psi -= dp;
        if *pressure_psi < target_psi {
            *pressure_psi = target_psi;
        }
    }
}

/// Splits a tick into equal integration steps no longer than `max_substep_s`.
/// Returns `(count, dt)`; `count` is zero when there is nothing to integrate.
pub fn substeps(elapsed_s: f32, max_substep_s: Option<f32>) -> (usize, f32) {
    if elapsed_s.is_nan() || elapsed_s < 0.0 {
        log::warn!("Skipping brake integration for elapsed time {elapsed_s} s");
        return (0, 0.0);
    }
    if elapsed_s == 0.0 {
        return (0, 0.0);
    }
    let count = match max_substep_s {
        Some(max_dt) if max_dt > 0.0 && elapsed_s > max_dt => {
            ((elapsed_s / max_dt).ceil() as usize).clamp(1, MAX_SUBSTEPS)
        }
        _ => 1,
    };
    if count > 1 {
        log::debug!("Splitting {elapsed_s} s brake tick into {count} sub-steps");
    }
    (count, elapsed_s / count as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discharge_limit_clamps_to_equilibrium() {
        // unconstrained step
        assert_eq!(discharge_limit(100.0, 0.0, 1.0, 1.0), 1.0);
        // overshooting step is cut to the equalizing amount
        let dp = discharge_limit(10.0, 6.0, 5.0, 1.0);
        assert_eq!(dp, 2.0);
        assert_eq!(10.0 - dp, 6.0 + dp);
    }

    #[test]
    fn test_charge_limit_clamps_to_equilibrium() {
        assert_eq!(charge_limit(60.0, 90.0, 1.684, 3.1), 1.684);
        let dp = charge_limit(89.0, 90.0, 1.684, 3.1);
        assert!(dp.approx_eq(&(1.0 / 4.1), 1e-6));
        assert!((89.0 + dp).approx_eq(&(90.0 - dp * 3.1), 1e-5));
    }

    #[test]
    fn test_decay_toward_never_undershoots() {
        let mut p = 21.0;
        decay_toward(&mut p, 20.0, 1.86);
        assert_eq!(p, 20.0);
        decay_toward(&mut p, 20.0, 1.86);
        assert_eq!(p, 20.0);
        let mut p = 10.0;
        decay_toward(&mut p, 0.0, 1.0);
        assert_eq!(p, 9.0);
    }

    #[test]
    fn test_substeps() {
        assert_eq!(substeps(0.0, Some(1.0)), (0, 0.0));
        assert_eq!(substeps(-0.5, Some(1.0)), (0, 0.0));
        assert_eq!(substeps(f32::NAN, Some(1.0)).0, 0);
        assert_eq!(substeps(0.5, Some(1.0)), (1, 0.5));
        assert_eq!(substeps(1.0, Some(1.0)), (1, 1.0));
        assert_eq!(substeps(2.5, Some(1.0)), (3, 2.5 / 3.0));
        assert_eq!(substeps(10.0, None), (1, 10.0));
        assert_eq!(substeps(1e9, Some(1.0)).0, MAX_SUBSTEPS);
    }
}

//! Module containing miscellaneous utility functions.

/// Clamps a brake or handbrake percentage into \[0, 100\]. NaN maps to 0.
pub fn clamp_percent(percent: f32) -> f32 {
    if percent.is_nan() {
        0.0
    } else {
        percent.clamp(0.0, 100.0)
    }
}

/// return max <f32> of arr
pub fn arrmax(arr: &[f32]) -> f32 {
    arr.iter().copied().fold(f32::NAN, f32::max)
}

/// return min <f32> of arr
pub fn arrmin(arr: &[f32]) -> f32 {
    arr.iter().copied().fold(f32::NAN, f32::min)
}

/// Return first index of `arr` greater than `cut`
pub fn first_grtr(arr: &[f32], cut: f32) -> Option<usize> {
    arr.iter().position(|&x| x > cut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_percent() {
        assert_eq!(clamp_percent(-5.0), 0.0);
        assert_eq!(clamp_percent(150.0), 100.0);
        assert_eq!(clamp_percent(42.5), 42.5);
        assert_eq!(clamp_percent(f32::NAN), 0.0);
    }

    #[test]
    fn test_that_arrmin_and_arrmax_find_extremes() {
        let xs = [10.0, 80.0, 3.0, 3.2, 9.0];
        assert_eq!(arrmin(&xs), 3.0);
        assert_eq!(arrmax(&xs), 80.0);
        assert!(arrmax(&[]).is_nan());
    }

    #[test]
    fn test_that_first_grtr_finds_the_right_index_when_one_exists() {
        let xs = [0.0, 1.2, 3.3, 4.4, 6.6];
        assert_eq!(first_grtr(&xs, 3.0), Some(2));
        assert_eq!(first_grtr(&xs, 7.0), None);
    }
}

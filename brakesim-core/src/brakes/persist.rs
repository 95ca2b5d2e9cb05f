//! Fixed-order binary records of the persisted brake fields.
//!
//! Records are written with bincode's default options: little-endian, fixed-width integers,
//! no framing, so the field order of each record is its byte layout.

use super::*;
use serde::de::DeserializeOwned;

/// Byte length of [AirBrakeRecord]
pub const AIR_RECORD_LEN: usize = 44;
/// Byte length of [VacuumBrakeRecord]
pub const VACUUM_RECORD_LEN: usize = 16;

/// Persisted fields of every air variant.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct AirBrakeRecord {
    pub line1_psi: f32,
    pub line2_psi: f32,
    pub line3_psi: f32,
    pub brake_percent: f32,
    pub handbrake_percent: f32,
    pub release_rate_psi_per_s: f32,
    pub retainer_threshold_psi: f32,
    pub auto_cyl_psi: f32,
    pub aux_res_psi: f32,
    pub emerg_res_psi: f32,
    pub triple_valve_tag: i32,
}

impl AirBrakeRecord {
    pub fn capture(core: &AirBrakeCore) -> Self {
        Self {
            line1_psi: core.lines.line1_psi,
            line2_psi: core.lines.line2_psi,
            line3_psi: core.lines.line3_psi,
            brake_percent: core.state.brake_percent,
            handbrake_percent: core.state.handbrake_percent,
            release_rate_psi_per_s: core.state.release_rate_psi_per_s,
            retainer_threshold_psi: core.state.retainer_threshold_psi,
            auto_cyl_psi: core.state.auto_cyl_psi,
            aux_res_psi: core.state.aux_res_psi,
            emerg_res_psi: core.state.emerg_res_psi,
            triple_valve_tag: core.state.triple_valve_state.tag(),
        }
    }

    /// Writes the record into `core`, leaving it untouched if the valve tag is invalid.
    pub fn apply_to(self, core: &mut AirBrakeCore) -> anyhow::Result<()> {
        let triple_valve_state = ValveState::try_from(self.triple_valve_tag)?;
        core.lines.line1_psi = self.line1_psi;
        core.lines.line2_psi = self.line2_psi;
        core.lines.line3_psi = self.line3_psi;
        core.state.brake_percent = self.brake_percent;
        core.state.handbrake_percent = self.handbrake_percent;
        core.state.release_rate_psi_per_s = self.release_rate_psi_per_s;
        core.state.retainer_threshold_psi = self.retainer_threshold_psi;
        core.state.auto_cyl_psi = self.auto_cyl_psi;
        core.state.aux_res_psi = self.aux_res_psi;
        core.state.emerg_res_psi = self.emerg_res_psi;
        core.state.triple_valve_state = triple_valve_state;
        Ok(())
    }
}

/// Persisted fields of the vacuum brake.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct VacuumBrakeRecord {
    pub line1_psi: f32,
    pub line2_psi: f32,
    pub line3_psi: f32,
    pub brake_percent: f32,
}

pub(crate) fn write_record<T: Serialize>(wtr: &mut dyn Write, record: &T) -> anyhow::Result<()> {
    bincode::serialize_into(wtr, record)
        .with_context(|| format!("{}\nFailed to write brake state", format_dbg!()))
}

pub(crate) fn read_record<T: DeserializeOwned>(rdr: &mut dyn Read) -> anyhow::Result<T> {
    bincode::deserialize_from(rdr)
        .with_context(|| format!("{}\nFailed to read brake state", format_dbg!()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_air_record_layout() {
        let record = AirBrakeRecord {
            line1_psi: 90.0,
            line2_psi: 0.0,
            line3_psi: 0.0,
            brake_percent: 0.0,
            handbrake_percent: 0.0,
            release_rate_psi_per_s: 1.86,
            retainer_threshold_psi: 0.0,
            auto_cyl_psi: 0.0,
            aux_res_psi: 0.0,
            emerg_res_psi: 0.0,
            triple_valve_tag: 3,
        };
        let mut buf = Vec::new();
        write_record(&mut buf, &record).unwrap();
        assert_eq!(buf.len(), AIR_RECORD_LEN);
        assert_eq!(&buf[0..4], &90.0_f32.to_le_bytes());
        assert_eq!(&buf[20..24], &1.86_f32.to_le_bytes());
        assert_eq!(&buf[40..44], &3_i32.to_le_bytes());
    }

    #[test]
    fn test_vacuum_record_layout() {
        let record = VacuumBrakeRecord {
            line1_psi: 21.0,
            line2_psi: 0.0,
            line3_psi: 0.0,
            brake_percent: 50.0,
        };
        let mut buf = Vec::new();
        write_record(&mut buf, &record).unwrap();
        assert_eq!(buf.len(), VACUUM_RECORD_LEN);
        assert_eq!(&buf[12..16], &50.0_f32.to_le_bytes());
        let back: VacuumBrakeRecord = read_record(&mut buf.as_slice()).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_short_input_is_an_error() {
        let bytes = [0_u8; 10];
        assert!(read_record::<AirBrakeRecord>(&mut &bytes[..]).is_err());
    }

    #[test]
    fn test_unknown_valve_tag_leaves_core_untouched() {
        let mut core = AirBrakeCore::new(10.0);
        let before = core.clone();
        let mut record = AirBrakeRecord::capture(&core);
        record.triple_valve_tag = 7;
        record.aux_res_psi = 12.0;
        assert!(record.apply_to(&mut core).is_err());
        assert_eq!(core, before);
    }
}

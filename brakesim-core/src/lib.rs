#![allow(clippy::field_reassign_with_default)]
// TODO: uncomment when docs are somewhat mature to check for missing docs
// #![warn(missing_docs)]

//! Crate containing models for pneumatic and vacuum train brakes, stepped once per
//! simulation tick per car.
//! # Brake systems:
//! - [brakes::AirSinglePipe]: automatic air brake with a triple valve
//! - [brakes::AirTwinPipe]: air brake with a main-reservoir equalization pipe
//! - [brakes::ElectroPneumatic]: air brake tracking an EP demand signal
//! - [brakes::VacuumSinglePipe]: simplified vacuum brake

#[macro_use]
pub mod macros;

pub mod brake_line;
pub mod brakes;
pub mod host;
pub mod imports;
pub mod params;
pub mod prelude;
pub mod simulation;
pub mod traits;
pub mod utils;

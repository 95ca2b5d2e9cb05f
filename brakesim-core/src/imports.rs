pub(crate) use anyhow::{bail, ensure, Context};
pub(crate) use brakesim_proc_macros::{ApproxEq, HistoryVec};
pub(crate) use serde::{Deserialize, Serialize};
pub(crate) use std::ffi::OsStr;
pub(crate) use std::fs::File;
pub(crate) use std::io::{Read, Write};
pub(crate) use std::path::Path;

pub(crate) use crate::brake_line::BrakeLines;
pub(crate) use crate::host::{BrakeEvent, BrakeHost};
pub(crate) use crate::params::*;
pub(crate) use crate::traits::*;
pub(crate) use crate::utils::*;

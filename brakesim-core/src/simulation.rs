//! Module for stepping a single car's brake system through a trainline pressure trace

use crate::brakes::{BrakeSettings, BrakeSystem, BrakeSystemType, ValveState};
use crate::host::CarForces;
use crate::imports::*;

/// Trainline pressures over time, as a locomotive and the car-to-car coupling would write them.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, ApproxEq)]
pub struct PressureTrace {
    /// simulation time \[s\]
    pub time_s: Vec<f32>,
    /// automatic brake pipe \[psi\]
    pub line1_psi: Vec<f32>,
    /// main-reservoir equalization pipe \[psi\], zeros when omitted
    #[serde(default)]
    pub line2_psi: Vec<f32>,
    /// engine brake pipe \[psi\], zeros when omitted
    #[serde(default)]
    pub line3_psi: Vec<f32>,
    /// EP demand \[psi\], zeros when omitted
    #[serde(default)]
    pub line4_psi: Vec<f32>,
}

impl SerdeAPI for PressureTrace {
    fn init(&mut self) -> anyhow::Result<()> {
        let len = self.len();
        ensure!(
            len >= 2,
            "{}\nPressure trace needs at least two time steps, got {len}",
            format_dbg!()
        );
        ensure!(
            self.line1_psi.len() == len,
            "{}\n`line1_psi` has {} entries but `time_s` has {len}",
            format_dbg!(),
            self.line1_psi.len()
        );
        for (name, line) in [
            ("line2_psi", &mut self.line2_psi),
            ("line3_psi", &mut self.line3_psi),
            ("line4_psi", &mut self.line4_psi),
        ] {
            if line.is_empty() {
                *line = vec![0.0; len];
            }
            ensure!(
                line.len() == len,
                "{}\n`{name}` has {} entries but `time_s` has {len}",
                format_dbg!(),
                line.len()
            );
        }
        ensure!(
            self.time_s.windows(2).all(|w| w[1] > w[0]),
            "{}\n`time_s` must be strictly increasing",
            format_dbg!()
        );
        Ok(())
    }
}

impl PressureTrace {
    pub fn empty() -> Self {
        Self {
            time_s: Vec::new(),
            line1_psi: Vec::new(),
            line2_psi: Vec::new(),
            line3_psi: Vec::new(),
            line4_psi: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.time_s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dt(&self, i: usize) -> f32 {
        self.time_s[i] - self.time_s[i - 1]
    }

    pub fn push(&mut self, element: PressureTraceElement) {
        self.time_s.push(element.time_s);
        self.line1_psi.push(element.line1_psi);
        self.line2_psi.push(element.line2_psi);
        self.line3_psi.push(element.line3_psi);
        self.line4_psi.push(element.line4_psi);
    }

    /// Trainline pressures at step `i`
    pub fn lines(&self, i: usize) -> BrakeLines {
        BrakeLines {
            line1_psi: self.line1_psi[i],
            line2_psi: self.line2_psi[i],
            line3_psi: self.line3_psi[i],
            line4_psi: self.line4_psi[i],
        }
    }

    /// Load trace from csv file with a header row.  `line2_psi` through `line4_psi` columns are
    /// optional.
    pub fn from_csv_file<P: AsRef<Path>>(filepath: P) -> anyhow::Result<Self> {
        let filepath = filepath.as_ref();
        let file = File::open(filepath)
            .with_context(|| format!("Could not open pressure trace: {filepath:?}"))?;
        Self::from_csv_reader(file)
            .with_context(|| format!("Invalid pressure trace file: {filepath:?}"))
    }

    pub fn from_csv_reader<R: std::io::Read>(rdr: R) -> anyhow::Result<Self> {
        let mut trace = Self::empty();
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(rdr);
        for result in rdr.deserialize() {
            let element: PressureTraceElement = result?;
            trace.push(element);
        }
        if trace.is_empty() {
            bail!("Invalid pressure trace; trace is empty")
        }
        trace.init()?;
        Ok(trace)
    }

    /// Loads a trace by extension: `csv`, or any [SerdeAPI] format.
    pub fn from_path<P: AsRef<Path>>(filepath: P) -> anyhow::Result<Self> {
        let filepath = filepath.as_ref();
        match filepath.extension().and_then(OsStr::to_str) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::from_csv_file(filepath),
            _ => Self::from_file(filepath),
        }
    }
}

impl Default for PressureTrace {
    /// Full-service application followed by a direct release, one point per second.  The brake
    /// pipe is reduced slowly enough that the triple valve stays in service.
    fn default() -> Self {
        let mut trace = Self::empty();
        for t in 0..=240 {
            let time_s = t as f32;
            let line1_psi = match t {
                0..=9 => CHARGED_BRAKE_PIPE_PSI,
                10..=89 => {
                    CHARGED_BRAKE_PIPE_PSI - FULL_SERVICE_REDUCTION_PSI * (t - 9) as f32 / 80.0
                }
                90..=149 => CHARGED_BRAKE_PIPE_PSI - FULL_SERVICE_REDUCTION_PSI,
                _ => CHARGED_BRAKE_PIPE_PSI,
            };
            trace.push(PressureTraceElement {
                time_s,
                line1_psi,
                line2_psi: 130.0,
                line3_psi: 0.0,
                line4_psi: ((CHARGED_BRAKE_PIPE_PSI - line1_psi) * 2.5).min(64.0),
            });
        }
        trace
    }
}

/// Element of [PressureTrace].  Used for vec-like operations and csv rows.
#[derive(Clone, Copy, Default, Debug, Serialize, Deserialize, PartialEq)]
pub struct PressureTraceElement {
    pub time_s: f32,
    pub line1_psi: f32,
    #[serde(default)]
    pub line2_psi: f32,
    #[serde(default)]
    pub line3_psi: f32,
    #[serde(default)]
    pub line4_psi: f32,
}

/// Brake state recorded at one time step
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, HistoryVec)]
pub struct BrakeTickState {
    pub i: usize,
    pub time_s: f32,
    pub line1_psi: f32,
    pub line2_psi: f32,
    pub cylinder_psi: f32,
    pub aux_res_psi: f32,
    pub emerg_res_psi: f32,
    pub brake_percent: f32,
    /// friction force reported to the car during this step \[N\]
    pub friction_force_n: f32,
    pub valve_state: ValveState,
}

/// Event raised during a simulation, with the time it was raised
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct EventRecord {
    pub time_s: f32,
    pub event: BrakeEvent,
}

/// Headline numbers of a finished simulation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SimulationSummary {
    pub kind: String,
    pub steps: usize,
    pub final_time_s: f32,
    pub peak_cylinder_psi: Option<f32>,
    pub peak_friction_force_n: Option<f32>,
    pub min_line1_psi: Option<f32>,
    /// first saved time with cylinder pressure above zero
    pub first_application_s: Option<f32>,
    pub final_valve_state: ValveState,
    pub final_status: String,
    pub events: usize,
}

/// Struct for simulating one car's brakes over a [PressureTrace]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BrakeSimulation {
    pub brakes: BrakeSystemType,
    pub trace: PressureTrace,
    #[serde(default)]
    pub settings: BrakeSettings,
    #[serde(default)]
    pub forces: CarForces,
    #[serde(default)]
    pub i: usize,
    /// Time step interval between saves. 1 is a good option. If None, no saving occurs.
    #[serde(default)]
    pub save_interval: Option<usize>,
    /// Custom vector of saved [BrakeTickState]
    #[serde(default)]
    pub history: BrakeTickStateHistoryVec,
    #[serde(default)]
    pub events: Vec<EventRecord>,
}

impl SerdeAPI for BrakeSimulation {
    fn init(&mut self) -> anyhow::Result<()> {
        self.trace.init()
    }
}

impl BrakeSimulation {
    pub fn new(
        brakes: BrakeSystemType,
        trace: PressureTrace,
        settings: BrakeSettings,
        save_interval: Option<usize>,
    ) -> anyhow::Result<Self> {
        let mut sim = Self {
            brakes,
            trace,
            settings,
            forces: Default::default(),
            i: 0,
            save_interval,
            history: Default::default(),
            events: Vec::new(),
        };
        sim.init()?;
        Ok(sim)
    }

    /// Writes the first trace point into the car and charges it against that brake pipe.
    pub fn initialize(&mut self, handbrake_on: bool) {
        *self.brakes.lines_mut() = self.trace.lines(0);
        self.brakes
            .initialize(handbrake_on, self.trace.line1_psi[0].max(0.0));
        self.i = 0;
        self.forces.begin_tick();
        self.history.clear();
        self.events.clear();
    }

    /// Iterates step to solve all time steps.
    pub fn walk(&mut self) -> anyhow::Result<()> {
        log::info!(
            "Walking `{}` brake system through {} trace points",
            self.brakes.kind(),
            self.trace.len()
        );
        if self.i == 0 {
            self.save_state();
            self.i = 1;
        }
        while self.i < self.trace.len() {
            self.step()?;
        }
        Ok(())
    }

    pub fn step(&mut self) -> anyhow::Result<()> {
        self.solve_step()
            .map_err(|err| err.context(format!("time step: {}", self.i)))?;
        self.save_state();
        self.i += 1;
        Ok(())
    }

    pub fn solve_step(&mut self) -> anyhow::Result<()> {
        ensure!(
            self.i >= 1 && self.i < self.trace.len(),
            "{}\nStep index {} outside trace of length {}",
            format_dbg!(),
            self.i,
            self.trace.len()
        );
        *self.brakes.lines_mut() = self.trace.lines(self.i);
        self.forces.begin_tick();
        self.brakes
            .update(self.trace.dt(self.i), &self.settings, &mut self.forces);
        let time_s = self.trace.time_s[self.i];
        self.events.extend(
            self.forces
                .events
                .iter()
                .map(|&event| EventRecord { time_s, event }),
        );
        Ok(())
    }

    fn save_state(&mut self) {
        if let Some(interval) = self.save_interval {
            if interval > 0 && self.i % interval == 0 {
                let readout = self.brakes.readout();
                self.history.push(BrakeTickState {
                    i: self.i,
                    time_s: self.trace.time_s[self.i],
                    line1_psi: readout.line1_psi,
                    line2_psi: readout.line2_psi,
                    cylinder_psi: readout.cylinder_psi,
                    aux_res_psi: readout.aux_res_psi,
                    emerg_res_psi: readout.emerg_res_psi,
                    brake_percent: readout.brake_percent,
                    friction_force_n: self.forces.friction_force_n,
                    valve_state: readout.valve_state,
                });
            }
        }
    }

    /// Headline numbers; peaks come from the saved history and are `None` when nothing was saved.
    pub fn summary(&self) -> SimulationSummary {
        let h = &self.history;
        let finite = |x: f32| (!x.is_nan()).then_some(x);
        SimulationSummary {
            kind: self.brakes.kind().to_string(),
            steps: self.i.saturating_sub(1),
            final_time_s: self.trace.time_s[self.i.clamp(1, self.trace.len()) - 1],
            peak_cylinder_psi: finite(arrmax(&h.cylinder_psi)),
            peak_friction_force_n: finite(arrmax(&h.friction_force_n)),
            min_line1_psi: finite(arrmin(&h.line1_psi)),
            first_application_s: first_grtr(&h.cylinder_psi, 0.0).map(|idx| h.time_s[idx]),
            final_valve_state: self.brakes.readout().valve_state,
            final_status: self.brakes.status(2),
            events: self.events.len(),
        }
    }
}

//! The automatable parameter surface.
//!
//! Values live in atomics so the audio thread reads them without locking.
//! Writers clamp to the parameter range and round discrete parameters, so a
//! stored value is always valid.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::atomic::AtomicF32;
use crate::error::{Error, Result};
use crate::transient::DetectionAlgorithm;

use super::consts::{GRID_SIZES, PATTERN_COUNT};

/// Identifies one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamId {
    Mix,
    Pattern,
    PatSync,
    Trigger,
    Sync,
    Rate,
    Phase,
    Min,
    Max,
    Smooth,
    Attack,
    Release,
    Tension,
    TensionAtk,
    TensionRel,
    Snap,
    Grid,
    Algo,
    Threshold,
    Sense,
    LowCut,
    HighCut,
    Offset,
}

pub const PARAM_COUNT: usize = 23;

struct ParamSpec {
    name: &'static str,
    min: f32,
    max: f32,
    default: f32,
    discrete: bool,
}

const fn float(name: &'static str, min: f32, max: f32, default: f32) -> ParamSpec {
    ParamSpec {
        name,
        min,
        max,
        default,
        discrete: false,
    }
}

const fn choice(name: &'static str, min: f32, max: f32, default: f32) -> ParamSpec {
    ParamSpec {
        name,
        min,
        max,
        default,
        discrete: true,
    }
}

impl ParamId {
    pub const ALL: [ParamId; PARAM_COUNT] = [
        ParamId::Mix,
        ParamId::Pattern,
        ParamId::PatSync,
        ParamId::Trigger,
        ParamId::Sync,
        ParamId::Rate,
        ParamId::Phase,
        ParamId::Min,
        ParamId::Max,
        ParamId::Smooth,
        ParamId::Attack,
        ParamId::Release,
        ParamId::Tension,
        ParamId::TensionAtk,
        ParamId::TensionRel,
        ParamId::Snap,
        ParamId::Grid,
        ParamId::Algo,
        ParamId::Threshold,
        ParamId::Sense,
        ParamId::LowCut,
        ParamId::HighCut,
        ParamId::Offset,
    ];

    fn spec(self) -> ParamSpec {
        match self {
            ParamId::Mix => float("mix", 0.0, 1.0, 1.0),
            ParamId::Pattern => choice("pattern", 1.0, PATTERN_COUNT as f32, 1.0),
            ParamId::PatSync => choice("patsync", 0.0, 5.0, 0.0),
            ParamId::Trigger => choice("trigger", 0.0, 2.0, 0.0),
            ParamId::Sync => choice("sync", 0.0, (SyncRate::TABLE.len() - 1) as f32, 5.0),
            ParamId::Rate => float("rate", 0.01, 5000.0, 1.0),
            ParamId::Phase => float("phase", 0.0, 1.0, 0.0),
            ParamId::Min => float("min", 0.0, 1.0, 0.0),
            ParamId::Max => float("max", 0.0, 1.0, 1.0),
            ParamId::Smooth => float("smooth", 0.0, 1.0, 0.0),
            ParamId::Attack => float("attack", 0.0, 1.0, 0.0),
            ParamId::Release => float("release", 0.0, 1.0, 0.0),
            ParamId::Tension => float("tension", -1.0, 1.0, 0.0),
            ParamId::TensionAtk => float("tensionatk", -1.0, 1.0, 0.0),
            ParamId::TensionRel => float("tensionrel", -1.0, 1.0, 0.0),
            ParamId::Snap => choice("snap", 0.0, 1.0, 0.0),
            ParamId::Grid => choice("grid", 0.0, (GRID_SIZES.len() - 1) as f32, 2.0),
            ParamId::Algo => choice("algo", 0.0, 1.0, 0.0),
            ParamId::Threshold => float("threshold", 0.0, 1.0, 0.5),
            ParamId::Sense => float("sense", 0.0, 1.0, 0.5),
            ParamId::LowCut => float("lowcut", 20.0, 20000.0, 20.0),
            ParamId::HighCut => float("highcut", 20.0, 20000.0, 20000.0),
            ParamId::Offset => float("offset", -1.0, 1.0, 0.0),
        }
    }

    /// Name used for lookup and in saved state.
    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.name() == name)
    }

    pub fn range(self) -> (f32, f32) {
        let spec = self.spec();
        (spec.min, spec.max)
    }

    pub fn default_value(self) -> f32 {
        self.spec().default
    }

    /// Whether the parameter only takes whole numbers.
    pub fn is_discrete(self) -> bool {
        self.spec().discrete
    }

    /// Brings `value` into the range, rounding discrete parameters. NaN maps
    /// to the default.
    pub fn clamp(self, value: f32) -> f32 {
        let spec = self.spec();
        if value.is_nan() {
            return spec.default;
        }
        let value = value.clamp(spec.min, spec.max);
        if spec.discrete { value.round() } else { value }
    }
}

/// Current values of every parameter.
///
/// # Examples
///
/// ```
/// use curvegate::processor::{ParamId, Params, Trigger};
///
/// let params = Params::new();
/// assert_eq!(params.trigger(), Trigger::Sync);
///
/// params.set(ParamId::Trigger, 2.4);
/// assert_eq!(params.trigger(), Trigger::Audio);
///
/// assert_eq!(params.set_by_name("mix", 3.0).unwrap(), 1.0);
/// assert!(params.get_by_name("volume").is_err());
/// ```
#[derive(Debug)]
pub struct Params {
    values: [AtomicF32; PARAM_COUNT],
    version: AtomicU64,
}

impl Default for Params {
    fn default() -> Self {
        Self::new()
    }
}

impl Params {
    pub fn new() -> Self {
        Self {
            values: std::array::from_fn(|i| AtomicF32::new(ParamId::ALL[i].default_value())),
            version: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn get(&self, id: ParamId) -> f32 {
        self.values[id as usize].load()
    }

    #[inline]
    pub fn get_f64(&self, id: ParamId) -> f64 {
        self.get(id) as f64
    }

    /// Stores a clamped value and returns it.
    pub fn set(&self, id: ParamId, value: f32) -> f32 {
        let value = id.clamp(value);
        self.values[id as usize].store(value);
        self.version.fetch_add(1, Ordering::Release);
        value
    }

    pub fn get_by_name(&self, name: &str) -> Result<f32> {
        ParamId::from_name(name)
            .map(|id| self.get(id))
            .ok_or_else(|| Error::UnknownParameter(name.to_string()))
    }

    pub fn set_by_name(&self, name: &str, value: f32) -> Result<f32> {
        ParamId::from_name(name)
            .map(|id| self.set(id, value))
            .ok_or_else(|| Error::UnknownParameter(name.to_string()))
    }

    /// Bumped on every write. The processor compares it against the last
    /// value it saw to find out whether anything changed.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// All values keyed by name.
    pub fn values(&self) -> BTreeMap<String, f32> {
        ParamId::ALL
            .into_iter()
            .map(|id| (id.name().to_string(), self.get(id)))
            .collect()
    }

    /// Replaces every value from a saved map. Parameters missing from the map
    /// go back to their defaults; unknown names are returned.
    pub fn restore(&self, values: &BTreeMap<String, f32>) -> Vec<String> {
        for id in ParamId::ALL {
            let value = values
                .get(id.name())
                .copied()
                .unwrap_or_else(|| id.default_value());
            self.set(id, value);
        }
        values
            .keys()
            .filter(|name| ParamId::from_name(name).is_none())
            .cloned()
            .collect()
    }

    /// Selected pattern, 1 based.
    pub fn pattern(&self) -> usize {
        self.get(ParamId::Pattern) as usize
    }

    pub fn trigger(&self) -> Trigger {
        Trigger::from_index(self.get(ParamId::Trigger) as usize)
    }

    pub fn pat_sync(&self) -> PatSync {
        PatSync::from_index(self.get(ParamId::PatSync) as usize)
    }

    pub fn sync_rate(&self) -> SyncRate {
        SyncRate::from_index(self.get(ParamId::Sync) as usize)
    }

    pub fn algorithm(&self) -> DetectionAlgorithm {
        DetectionAlgorithm::from_index(self.get(ParamId::Algo) as usize)
    }

    pub fn grid_index(&self) -> usize {
        self.get(ParamId::Grid) as usize
    }

    pub fn snap(&self) -> bool {
        self.get(ParamId::Snap) >= 0.5
    }
}

/// What starts and drives the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Trigger {
    /// Loops continuously, locked to the host tempo or a free rate
    #[default]
    Sync,
    /// Plays once per incoming note
    Midi,
    /// Plays once per detected transient
    Audio,
}

impl Trigger {
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Trigger::Sync,
            1 => Trigger::Midi,
            _ => Trigger::Audio,
        }
    }
}

/// Quantization of queued pattern switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PatSync {
    /// Switch on the next sample
    #[default]
    Off,
    QuarterBeat,
    HalfBeat,
    Beat,
    TwoBeats,
    FourBeats,
}

impl PatSync {
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => PatSync::Off,
            1 => PatSync::QuarterBeat,
            2 => PatSync::HalfBeat,
            3 => PatSync::Beat,
            4 => PatSync::TwoBeats,
            _ => PatSync::FourBeats,
        }
    }

    /// Switch grid in samples, or `None` when switches are immediate.
    pub fn interval(self, samples_per_beat: i64) -> Option<i64> {
        let interval = match self {
            PatSync::Off => return None,
            PatSync::QuarterBeat => samples_per_beat / 4,
            PatSync::HalfBeat => samples_per_beat / 2,
            PatSync::Beat => samples_per_beat,
            PatSync::TwoBeats => samples_per_beat * 2,
            PatSync::FourBeats => samples_per_beat * 4,
        };
        (interval > 0).then_some(interval)
    }

    /// Samples until the next multiple of the switch grid.
    pub fn countdown(self, samples_per_beat: i64, time_in_samples: i64) -> i64 {
        match self.interval(samples_per_beat) {
            Some(interval) => (interval - time_in_samples.rem_euclid(interval)) % interval,
            None => 0,
        }
    }
}

/// Length of one pattern cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SyncRate(usize);

impl Default for SyncRate {
    fn default() -> Self {
        SyncRate(5)
    }
}

impl SyncRate {
    /// Menu label and cycle length in quarter notes. The first entry runs
    /// free at the rate parameter instead.
    pub const TABLE: [(&'static str, Option<f64>); 18] = [
        ("Rate Hz", None),
        ("1/16", Some(1.0 / 4.0)),
        ("1/8", Some(1.0 / 2.0)),
        ("1/4", Some(1.0)),
        ("1/2", Some(2.0)),
        ("1/1", Some(4.0)),
        ("2/1", Some(8.0)),
        ("4/1", Some(16.0)),
        ("1/16t", Some(1.0 / 6.0)),
        ("1/8t", Some(1.0 / 3.0)),
        ("1/4t", Some(2.0 / 3.0)),
        ("1/2t", Some(4.0 / 3.0)),
        ("1/1t", Some(8.0 / 3.0)),
        ("1/16.", Some(1.0 / 4.0 * 1.5)),
        ("1/8.", Some(1.0 / 2.0 * 1.5)),
        ("1/4.", Some(1.5)),
        ("1/2.", Some(2.0 * 1.5)),
        ("1/1.", Some(4.0 * 1.5)),
    ];

    pub fn from_index(index: usize) -> Self {
        SyncRate(index.min(Self::TABLE.len() - 1))
    }

    pub fn index(self) -> usize {
        self.0
    }

    pub fn name(self) -> &'static str {
        Self::TABLE[self.0].0
    }

    /// Cycle length in quarter notes, `None` for the free running rate.
    pub fn quarter_notes(self) -> Option<f64> {
        Self::TABLE[self.0].1
    }
}

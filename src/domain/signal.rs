//! Position signals and the crossover events derived from them.

use crate::domain::indicator::IndicatorSeries;
use crate::domain::stage::Stage;
use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Long,
    Flat,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Long => write!(f, "LONG"),
            Signal::Flat => write!(f, "FLAT"),
        }
    }
}

/// Output of a signal generator, aligned bar-for-bar with its price series.
///
/// `values[i]` is `None` while the generator is still warming up. The moving
/// averages the rule was evaluated on travel along as `overlays`; the
/// Weinstein generator also attaches its stage labels.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSeries {
    pub values: Vec<Option<Signal>>,
    pub overlays: Vec<IndicatorSeries>,
    pub stages: Option<Vec<Option<Stage>>>,
}

impl SignalSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Signal at `index`, with warmup bars read as flat.
    pub fn position_at(&self, index: usize) -> Signal {
        self.values
            .get(index)
            .copied()
            .flatten()
            .unwrap_or(Signal::Flat)
    }

    pub fn first_defined(&self) -> Option<usize> {
        self.values.iter().position(|v| v.is_some())
    }

    pub fn stage_at(&self, index: usize) -> Option<Stage> {
        self.stages
            .as_ref()
            .and_then(|stages| stages.get(index).copied().flatten())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossoverKind {
    /// FLAT -> LONG
    Golden,
    /// LONG -> FLAT
    Death,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crossover {
    pub index: usize,
    pub date: NaiveDate,
    pub kind: CrossoverKind,
}

/// Lists every FLAT→LONG and LONG→FLAT transition. Absent signals count as flat.
pub fn crossovers(signals: &SignalSeries, dates: &[NaiveDate]) -> Vec<Crossover> {
    let mut events = Vec::new();
    let mut prev = Signal::Flat;

    for (index, date) in dates.iter().enumerate().take(signals.len()) {
        let current = signals.position_at(index);
        let kind = match (prev, current) {
            (Signal::Flat, Signal::Long) => Some(CrossoverKind::Golden),
            (Signal::Long, Signal::Flat) => Some(CrossoverKind::Death),
            _ => None,
        };
        if let Some(kind) = kind {
            events.push(Crossover {
                index,
                date: *date,
                kind,
            });
        }
        prev = current;
    }

    events
}

//! Named penalty categories, their weights, and per-transition cost breakdowns.

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Penalty categories, in evaluation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CostTerm {
    Mine,
    HoldSwitch,
    BracketTap,
    Other,
    BracketJack,
    Doublestep,
    Jump,
    SlowBracket,
    TwistedFoot,
    Facing,
    Spin,
    Footswitch,
    Sideswitch,
    MissedFootswitch,
    Jack,
    Distance,
    CrowdedBracket,
}

impl CostTerm {
    pub const COUNT: usize = 17;

    pub const ALL: [CostTerm; Self::COUNT] = [
        CostTerm::Mine,
        CostTerm::HoldSwitch,
        CostTerm::BracketTap,
        CostTerm::Other,
        CostTerm::BracketJack,
        CostTerm::Doublestep,
        CostTerm::Jump,
        CostTerm::SlowBracket,
        CostTerm::TwistedFoot,
        CostTerm::Facing,
        CostTerm::Spin,
        CostTerm::Footswitch,
        CostTerm::Sideswitch,
        CostTerm::MissedFootswitch,
        CostTerm::Jack,
        CostTerm::Distance,
        CostTerm::CrowdedBracket,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Interchange name (upper snake case).
    pub fn name(self) -> &'static str {
        match self {
            CostTerm::Mine => "MINE",
            CostTerm::HoldSwitch => "HOLDSWITCH",
            CostTerm::BracketTap => "BRACKETTAP",
            CostTerm::Other => "OTHER",
            CostTerm::BracketJack => "BRACKETJACK",
            CostTerm::Doublestep => "DOUBLESTEP",
            CostTerm::Jump => "JUMP",
            CostTerm::SlowBracket => "SLOW_BRACKET",
            CostTerm::TwistedFoot => "TWISTED_FOOT",
            CostTerm::Facing => "FACING",
            CostTerm::Spin => "SPIN",
            CostTerm::Footswitch => "FOOTSWITCH",
            CostTerm::Sideswitch => "SIDESWITCH",
            CostTerm::MissedFootswitch => "MISSED_FOOTSWITCH",
            CostTerm::Jack => "JACK",
            CostTerm::Distance => "DISTANCE",
            CostTerm::CrowdedBracket => "CROWDED_BRACKET",
        }
    }

    pub fn from_name(name: &str) -> Option<CostTerm> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }
}

/// Key of the hard-exclusion penalty inside a serialized breakdown.
pub const OVERRIDE_KEY: &str = "OVERRIDE";
/// Key of the summed cost inside a serialized breakdown.
pub const TOTAL_KEY: &str = "TOTAL";

/// One numeric dial per `CostTerm`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct Weights([f64; CostTerm::COUNT]);

impl Default for Weights {
    fn default() -> Self {
        let mut w = [0.0; CostTerm::COUNT];
        for t in CostTerm::ALL {
            w[t.index()] = match t {
                CostTerm::Doublestep => 850.0,
                CostTerm::BracketJack => 20.0,
                CostTerm::Jack => 30.0,
                CostTerm::Jump => 30.0,
                CostTerm::BracketTap => 400.0,
                CostTerm::HoldSwitch => 55.0,
                CostTerm::Mine => 10000.0,
                CostTerm::Footswitch => 325.0,
                CostTerm::MissedFootswitch => 500.0,
                CostTerm::Facing => 2.0,
                CostTerm::Distance => 6.0,
                CostTerm::Spin => 1000.0,
                CostTerm::Sideswitch => 130.0,
                CostTerm::SlowBracket => 300.0,
                CostTerm::CrowdedBracket => 0.0,
                CostTerm::Other => 500.0,
                CostTerm::TwistedFoot => 100000.0,
            };
        }
        Self(w)
    }
}

impl Weights {
    #[inline]
    pub fn get(&self, term: CostTerm) -> f64 {
        self.0[term.index()]
    }

    /// Set one weight. Non-finite or negative values are rejected.
    pub fn set(&mut self, term: CostTerm, value: f64) -> bool {
        if !value.is_finite() || value < 0.0 {
            return false;
        }
        self.0[term.index()] = value;
        true
    }

    /// Apply recognized keys; unknown names and unusable values are skipped.
    /// Returns how many weights changed.
    pub fn update_from_map(&mut self, values: &BTreeMap<String, f64>) -> usize {
        let mut applied = 0;
        for (name, &value) in values {
            match CostTerm::from_name(name) {
                Some(term) => {
                    if self.get(term) != value && self.set(term, value) {
                        applied += 1;
                    } else if !value.is_finite() || value < 0.0 {
                        tracing::warn!(name, value, "ignoring unusable weight value");
                    }
                }
                None => tracing::debug!(name, "ignoring unknown weight key"),
            }
        }
        applied
    }

    pub fn to_map(&self) -> BTreeMap<String, f64> {
        CostTerm::ALL
            .into_iter()
            .map(|t| (t.name().to_string(), self.get(t)))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CostTerm, f64)> + '_ {
        CostTerm::ALL.into_iter().map(|t| (t, self.get(t)))
    }
}

impl From<BTreeMap<String, f64>> for Weights {
    fn from(values: BTreeMap<String, f64>) -> Self {
        let mut w = Weights::default();
        w.update_from_map(&values);
        w
    }
}

impl From<Weights> for BTreeMap<String, f64> {
    fn from(w: Weights) -> Self {
        w.to_map()
    }
}

/// Named penalty terms of one transition plus the hard-exclusion penalty and their sum.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(from = "BTreeMap<String, f64>")]
pub struct CostBreakdown {
    terms: [f64; CostTerm::COUNT],
    override_penalty: f64,
    total: f64,
}

impl Default for CostBreakdown {
    fn default() -> Self {
        Self::zero()
    }
}

impl CostBreakdown {
    pub fn zero() -> Self {
        Self {
            terms: [0.0; CostTerm::COUNT],
            override_penalty: 0.0,
            total: 0.0,
        }
    }

    #[inline]
    pub fn get(&self, term: CostTerm) -> f64 {
        self.terms[term.index()]
    }

    /// Set a term; call `finalize` afterwards to refresh the total.
    #[inline]
    pub fn set(&mut self, term: CostTerm, value: f64) {
        self.terms[term.index()] = value;
    }

    #[inline]
    pub fn total(&self) -> f64 {
        self.total
    }

    #[inline]
    pub fn override_penalty(&self) -> f64 {
        self.override_penalty
    }

    /// Recompute the total from the named terms and the override penalty.
    pub fn finalize(&mut self) {
        self.total = self.terms.iter().sum::<f64>() + self.override_penalty;
    }

    /// Add to the hard-exclusion penalty and to the total.
    pub fn add_override_penalty(&mut self, penalty: f64) {
        self.override_penalty += penalty;
        self.total += penalty;
    }

    pub fn terms(&self) -> impl Iterator<Item = (CostTerm, f64)> + '_ {
        CostTerm::ALL.into_iter().map(|t| (t, self.get(t)))
    }
}

impl Serialize for CostBreakdown {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(CostTerm::COUNT + 2))?;
        for (t, v) in self.terms() {
            map.serialize_entry(t.name(), &v)?;
        }
        map.serialize_entry(OVERRIDE_KEY, &self.override_penalty)?;
        map.serialize_entry(TOTAL_KEY, &self.total)?;
        map.end()
    }
}

impl From<BTreeMap<String, f64>> for CostBreakdown {
    fn from(values: BTreeMap<String, f64>) -> Self {
        let mut c = CostBreakdown::zero();
        for (name, &v) in &values {
            if let Some(t) = CostTerm::from_name(name) {
                c.set(t, v);
            }
        }
        c.override_penalty = values.get(OVERRIDE_KEY).copied().unwrap_or(0.0);
        match values.get(TOTAL_KEY) {
            Some(&total) => c.total = total,
            None => c.finalize(),
        }
        c
    }
}

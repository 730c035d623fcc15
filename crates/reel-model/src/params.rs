//! Typed stand-ins for the original's free-form `params`/`comp_pattern`/
//! `hit_params` dictionaries. Per-kind variants cover the recognized shapes;
//! `Opaque` preserves anything else round-trippably instead of dropping it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClipParams {
    Drums {
        style: String,
        density: f64,
        #[serde(default)]
        swing: f64,
        #[serde(default)]
        pause_probability: f64,
        #[serde(default)]
        fill_probability: f64,
        #[serde(default = "default_roll_probability")]
        roll_probability: f64,
    },
    Progression {
        start_on: String,
        #[serde(default = "default_true")]
        prefer_circle_motion: bool,
        #[serde(default = "default_true")]
        cadence_ending: bool,
    },
    Melody {
        stepwise_bias: f64,
        leap_probability: f64,
    },
    Bass {
        syncopation: f64,
    },
    Opaque(serde_json::Value),
}

impl Default for ClipParams {
    fn default() -> Self {
        ClipParams::Opaque(serde_json::Value::Null)
    }
}

fn default_true() -> bool {
    true
}

fn default_roll_probability() -> f64 {
    0.1
}

/// The 1/N subdivision grid driving a `comp` pattern-type chord event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompPattern {
    pub grid: u32,
    pub steps: Vec<bool>,
    #[serde(default)]
    pub accents: Vec<f64>,
    #[serde(default)]
    pub swing: f64,
}

impl CompPattern {
    pub fn accent_for(&self, step: usize) -> f64 {
        self.accents.get(step).copied().unwrap_or(1.0)
    }
}

/// Mode-specific extras a generator may read; anything unrecognized is kept
/// as opaque JSON rather than discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HitParams {
    HatMode { mode: String },
    ArpSubdivision { subdivision: u32 },
    Opaque(serde_json::Value),
}

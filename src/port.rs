//! Signal Conventions and Port System
//!
//! This module defines the signal types, port definitions, and the
//! type-erased module interface that the sequencer engine presents to a
//! host (rack, plugin shell, or test harness). Only the numeric contract
//! lives here; rendering, panel layout, and cable plumbing belong to the
//! host.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Unique identifier for a port within a module
pub type PortId = u32;

/// Unique identifier for a parameter within a module
pub type ParamId = u32;

/// Semantic signal classification following hardware modular conventions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    /// Unipolar control voltage, 0–10V (percentage knobs exposed as CV)
    CvUnipolar,

    /// Pitch CV following the 1V/octave standard
    VoltPerOctave,

    /// Gate signal, binary state: 0V (low) or +5V (high)
    /// Remains high while a note/event is active
    Gate,

    /// Trigger signal, short pulse at +5V for instantaneous events
    Trigger,

    /// Clock signal, regular trigger pulses at tempo
    Clock,
}

impl SignalKind {
    /// Returns the typical voltage range (min, max) for this signal type
    pub fn voltage_range(&self) -> (f64, f64) {
        match self {
            SignalKind::CvUnipolar => (0.0, 10.0),
            SignalKind::VoltPerOctave => (-5.0, 5.0),
            SignalKind::Gate => (0.0, 5.0),
            SignalKind::Trigger => (0.0, 5.0),
            SignalKind::Clock => (0.0, 5.0),
        }
    }

    /// Threshold voltage for high/low detection
    pub fn gate_threshold(&self) -> Option<f64> {
        match self {
            SignalKind::Gate | SignalKind::Trigger | SignalKind::Clock => Some(2.5),
            _ => None,
        }
    }
}

/// Definition of a single port (input or output)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortDef {
    /// Unique identifier within the module
    pub id: PortId,

    /// Human-readable name (e.g., "clock", "pitch", "gate")
    pub name: String,

    /// Signal type for validation and UI hints
    pub kind: SignalKind,

    /// Default value when nothing is connected
    pub default: f64,
}

impl PortDef {
    pub fn new(id: PortId, name: impl Into<String>, kind: SignalKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            default: 0.0,
        }
    }

    pub fn with_default(mut self, default: f64) -> Self {
        self.default = default;
        self
    }
}

/// Specification of all ports for a module
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortSpec {
    pub inputs: Vec<PortDef>,
    pub outputs: Vec<PortDef>,
}

impl PortSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input_by_name(&self, name: &str) -> Option<&PortDef> {
        self.inputs.iter().find(|p| p.name == name)
    }

    pub fn output_by_name(&self, name: &str) -> Option<&PortDef> {
        self.outputs.iter().find(|p| p.name == name)
    }

    pub fn input_by_id(&self, id: PortId) -> Option<&PortDef> {
        self.inputs.iter().find(|p| p.id == id)
    }

    pub fn output_by_id(&self, id: PortId) -> Option<&PortDef> {
        self.outputs.iter().find(|p| p.id == id)
    }
}

/// Runtime port values container
#[derive(Debug, Clone, Default)]
pub struct PortValues {
    pub values: HashMap<PortId, f64>,
}

impl PortValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: PortId) -> Option<f64> {
        self.values.get(&id).copied()
    }

    pub fn get_or(&self, id: PortId, default: f64) -> f64 {
        self.values.get(&id).copied().unwrap_or(default)
    }

    pub fn set(&mut self, id: PortId, value: f64) {
        self.values.insert(id, value);
    }

    pub fn has(&self, id: PortId) -> bool {
        self.values.contains_key(&id)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

/// Parameter definition for host/UI binding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamDef {
    pub id: ParamId,
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub default: f64,
}

impl ParamDef {
    pub fn new(id: ParamId, name: impl Into<String>, min: f64, max: f64, default: f64) -> Self {
        Self {
            id,
            name: name.into(),
            min,
            max,
            default,
        }
    }

    /// Clamp a host-supplied value into this parameter's range.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// Type-erased module interface for host integration
pub trait GraphModule: Send + Sync {
    /// Returns the module's port specification
    fn port_spec(&self) -> &PortSpec;

    /// Process one sample given port values
    fn tick(&mut self, inputs: &PortValues, outputs: &mut PortValues);

    /// Reset internal state
    fn reset(&mut self);

    /// Set sample rate
    fn set_sample_rate(&mut self, sample_rate: f64);

    /// Get parameter definitions for host binding
    fn params(&self) -> &[ParamDef] {
        &[]
    }

    /// Get a parameter value
    fn get_param(&self, _id: ParamId) -> Option<f64> {
        None
    }

    /// Set a parameter value
    fn set_param(&mut self, _id: ParamId, _value: f64) {}

    /// Get module type identifier for serialization
    fn type_id(&self) -> &'static str {
        "unknown"
    }

    /// Serialize module state
    fn serialize_state(&self) -> Option<serde_json::Value> {
        None
    }

    /// Deserialize module state
    fn deserialize_state(&mut self, _state: &serde_json::Value) -> Result<(), String> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_kind_ranges() {
        assert_eq!(SignalKind::Gate.voltage_range(), (0.0, 5.0));
        assert_eq!(SignalKind::CvUnipolar.voltage_range(), (0.0, 10.0));
        assert_eq!(SignalKind::VoltPerOctave.voltage_range(), (-5.0, 5.0));
    }

    #[test]
    fn test_signal_kind_gate_threshold() {
        assert!(SignalKind::Gate.gate_threshold().is_some());
        assert!(SignalKind::Trigger.gate_threshold().is_some());
        assert!(SignalKind::Clock.gate_threshold().is_some());
        assert!(SignalKind::VoltPerOctave.gate_threshold().is_none());
    }

    #[test]
    fn test_port_values() {
        let mut pv = PortValues::new();
        pv.set(0, 1.0);
        pv.set(1, 2.0);
        assert_eq!(pv.get(0), Some(1.0));
        assert_eq!(pv.get(1), Some(2.0));
        assert_eq!(pv.get(2), None);
        assert_eq!(pv.get_or(2, 5.0), 5.0);

        assert!(pv.has(0));
        pv.clear();
        assert!(!pv.has(0));
    }

    #[test]
    fn test_port_spec_lookup() {
        let spec = PortSpec {
            inputs: vec![
                PortDef::new(0, "clock", SignalKind::Clock),
                PortDef::new(1, "reset", SignalKind::Trigger),
            ],
            outputs: vec![
                PortDef::new(10, "pitch", SignalKind::VoltPerOctave),
                PortDef::new(11, "gate", SignalKind::Gate),
            ],
        };

        assert!(spec.input_by_name("clock").is_some());
        assert!(spec.input_by_name("nonexistent").is_none());
        assert!(spec.output_by_name("pitch").is_some());
        assert!(spec.input_by_id(1).is_some());
        assert!(spec.output_by_id(11).is_some());
        assert!(spec.output_by_id(99).is_none());
    }

    #[test]
    fn test_param_def_clamp() {
        let def = ParamDef::new(0, "density", 0.0, 100.0, 50.0);
        assert_eq!(def.clamp(-5.0), 0.0);
        assert_eq!(def.clamp(50.0), 50.0);
        assert_eq!(def.clamp(150.0), 100.0);
    }

    #[test]
    fn test_port_def_with_default() {
        let port = PortDef::new(0, "density", SignalKind::CvUnipolar).with_default(5.0);
        assert!((port.default - 5.0).abs() < 1e-12);
    }
}

//! Contract between the data model and quality-control algorithms.
//!
//! An algorithm reads and adjusts a scan through the ordinary value
//! accessors and produces one [`QualityField`] per scan. The helpers here
//! stamp that field with `how/task` and `how/task_args` and attach it to the
//! scan, so every algorithm leaves the same provenance behind.
//!
//! Algorithm parameters come from named [`ParameterSet`]s kept in YAML:
//!
//! ```yaml
//! - name: SPIKE
//!   task: fi.fmi.ropo.detector
//!   parameters:
//!     threshold: 8
//!     width: 3
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use radar_common::{AttributeValue, Handle};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PolarDataError, Result};
use crate::field::{QualityField, HOW_TASK, HOW_TASK_ARGS};
use crate::scan::PolarScan;
use crate::volume::PolarVolume;

/// A quality-control algorithm operating on one scan at a time.
pub trait QualityControl {
    /// Identifier written to `how/task`, e.g. `fi.fmi.ropo.detector`.
    fn task(&self) -> &str;

    /// Serialized arguments written to `how/task_args`.
    fn task_args(&self) -> String;

    /// Process a scan, adjusting its parameters in place if needed, and
    /// return the quality field describing the result.
    fn process_scan(&self, scan: &mut PolarScan) -> Result<QualityField>;
}

/// Run `qc` on one scan and append the stamped quality field to it.
pub fn apply_to_scan(qc: &dyn QualityControl, scan: &Handle<PolarScan>) -> Result<Handle<QualityField>> {
    let mut scan = scan
        .try_borrow_mut()
        .map_err(|_| PolarDataError::quality_control(qc.task(), "scan is already borrowed"))?;

    let mut field = qc.process_scan(&mut scan)?;
    field.add_attribute(HOW_TASK, qc.task())?;
    field.add_attribute(HOW_TASK_ARGS, qc.task_args())?;

    let field = Handle::new(field);
    scan.add_quality_field(field.clone());
    info!(
        task = qc.task(),
        elangle = scan.elangle().to_degrees(),
        "Applied quality control to scan"
    );
    Ok(field)
}

/// Run `qc` on every scan of a volume. Returns the number of scans processed.
///
/// Stops at the first failing scan; scans processed before it keep their
/// quality field.
pub fn apply_to_volume(qc: &dyn QualityControl, volume: &PolarVolume) -> Result<usize> {
    for scan in volume.scans() {
        apply_to_scan(qc, scan)?;
    }
    info!(task = qc.task(), scans = volume.scan_count(), "Applied quality control to volume");
    Ok(volume.scan_count())
}

/// Named set of algorithm parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    pub name: String,

    /// Task identifier the set is meant for.
    #[serde(default)]
    pub task: Option<String>,

    #[serde(default)]
    pub parameters: BTreeMap<String, AttributeValue>,
}

impl ParameterSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            task: None,
            parameters: BTreeMap::new(),
        }
    }

    /// Builder-style parameter insertion.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.parameters.get(key)
    }

    pub fn get_double(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(AttributeValue::as_double)
    }

    pub fn get_long(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(AttributeValue::as_long)
    }

    /// `NAME: key=value, key=value` in key order, or just `NAME` when empty.
    pub fn task_args(&self) -> String {
        if self.parameters.is_empty() {
            return self.name.clone();
        }
        let args: Vec<String> = self
            .parameters
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        format!("{}: {}", self.name, args.join(", "))
    }
}

/// Parse a YAML list of parameter sets.
pub fn load_parameter_sets(yaml: &str) -> Result<Vec<ParameterSet>> {
    let sets: Vec<ParameterSet> = serde_yaml::from_str(yaml)?;
    if let Some(set) = sets.iter().find(|s| s.name.trim().is_empty()) {
        return Err(PolarDataError::config(format!(
            "parameter set without name: {:?}",
            set.parameters.keys().collect::<Vec<_>>()
        )));
    }
    Ok(sets)
}

/// Read parameter sets from a YAML file.
pub fn load_parameter_sets_file(path: impl AsRef<Path>) -> Result<Vec<ParameterSet>> {
    let contents = std::fs::read_to_string(path)?;
    load_parameter_sets(&contents)
}

/// Find a set by name.
pub fn find_parameter_set<'a>(sets: &'a [ParameterSet], name: &str) -> Option<&'a ParameterSet> {
    sets.iter().find(|s| s.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETS: &str = r#"
- name: SPIKE
  task: fi.fmi.ropo.detector
  parameters:
    threshold: 8
    width: 3
    mode: strict
- name: EMITTER
  parameters:
    intensity: -10.5
- name: NOOP
"#;

    #[test]
    fn test_load_parameter_sets() {
        let sets = load_parameter_sets(SETS).unwrap();
        assert_eq!(sets.len(), 3);

        let spike = find_parameter_set(&sets, "SPIKE").unwrap();
        assert_eq!(spike.task.as_deref(), Some("fi.fmi.ropo.detector"));
        assert_eq!(spike.get_long("threshold"), Some(8));
        assert_eq!(spike.get("mode"), Some(&AttributeValue::String("strict".into())));

        let emitter = find_parameter_set(&sets, "EMITTER").unwrap();
        assert_eq!(emitter.get_double("intensity"), Some(-10.5));
        assert!(find_parameter_set(&sets, "MISSING").is_none());
    }

    #[test]
    fn test_task_args_rendering() {
        let sets = load_parameter_sets(SETS).unwrap();
        assert_eq!(sets[0].task_args(), "SPIKE: mode=strict, threshold=8, width=3");
        assert_eq!(sets[1].task_args(), "EMITTER: intensity=-10.5");
        assert_eq!(sets[2].task_args(), "NOOP");
    }

    #[test]
    fn test_unnamed_set_rejected() {
        let err = load_parameter_sets("- name: ''\n  parameters:\n    a: 1\n").unwrap_err();
        assert!(matches!(err, PolarDataError::Config(_)));
        assert!(matches!(
            load_parameter_sets("name: SPIKE").unwrap_err(),
            PolarDataError::Yaml(_)
        ));
    }

    #[test]
    fn test_builder() {
        let set = ParameterSet::new("BEAMB").with("dBlimit", -6.0).with("bbl_limit", 1_i64);
        assert_eq!(set.task_args(), "BEAMB: bbl_limit=1, dBlimit=-6");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qc.yaml");
        std::fs::write(&path, SETS).unwrap();
        assert_eq!(load_parameter_sets_file(&path).unwrap().len(), 3);
    }
}

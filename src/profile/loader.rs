//! Profile document loading
//!
//! Walks the JSON document once and turns it into typed profiles. Every
//! failure carries the path of the offending field, e.g.
//! `Hypothyroidism > panels > Thyroid Function > TSH > mean`.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Instant;

use log::{debug, info, warn};
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};

use super::types::{
    AgeAdjustment, AgeBand, DifferentialProps, Distribution, LifestyleEffect, Multiplier,
    SexAdjustment,
};
use super::{ConditionProfile, DiseaseProfiles, Panel, TestSpec};
use crate::error::{LabError, Result};

/// Panel entry holding differential metadata rather than a test
pub const DIFFERENTIAL_KEY: &str = "differential_props";

impl DiseaseProfiles {
    /// Load and validate a profile document from disk
    pub fn from_path(path: &Path) -> Result<Self> {
        let start = Instant::now();
        let file = File::open(path)?;
        let profiles = Self::from_reader(BufReader::new(file))?;
        info!(
            "Loaded {} conditions from {} in {:?}",
            profiles.len(),
            path.display(),
            start.elapsed()
        );
        Ok(profiles)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let value: Value = serde_json::from_reader(reader)?;
        Self::from_value(&value)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    /// Validate an already-parsed document
    pub fn from_value(document: &Value) -> Result<Self> {
        let conditions = as_object(document).map_err(|e| e.at("<document>"))?;
        let mut profiles = Self::new();
        for (name, body) in conditions {
            let condition = parse_condition(name, body)?;
            debug!(
                "Condition '{}': {} panels",
                condition.name(),
                condition.panels().len()
            );
            profiles.insert(condition);
        }
        Ok(profiles)
    }
}

fn parse_condition(name: &str, body: &Value) -> Result<ConditionProfile> {
    let body = as_object(body).map_err(|e| e.at(name))?;
    let panels_value = body
        .get("panels")
        .ok_or_else(|| LabError::MalformedProfile("missing 'panels'".into()).at(name))?;
    let panels_map = as_object(panels_value).map_err(|e| e.at(format!("{name} > panels")))?;

    let panels = panels_map
        .iter()
        .map(|(panel_name, tests)| {
            parse_panel(panel_name, tests, &format!("{name} > panels > {panel_name}"))
        })
        .collect::<Result<Vec<_>>>()?;

    ConditionProfile::new(name, panels)
}

fn parse_panel(name: &str, body: &Value, location: &str) -> Result<Panel> {
    let entries = as_object(body).map_err(|e| e.at(location))?;
    let mut panel = Panel::new(name, Vec::with_capacity(entries.len()));

    for (key, value) in entries {
        if key == DIFFERENTIAL_KEY {
            panel.differential_position = Some(panel.tests.len());
            panel.differential_props = parse_differential(value);
            if panel.differential_props.is_none() {
                warn!("{location} > {key}: malformed, default proportions will be used");
            }
            continue;
        }
        let test_location = format!("{location} > {key}");
        panel.tests.push(parse_test(key, value, &test_location)?);
    }
    Ok(panel)
}

fn parse_test(name: &str, body: &Value, location: &str) -> Result<TestSpec> {
    let fields = as_object(body).map_err(|e| e.at(location))?;
    let field_location = |field: &str| format!("{location} > {field}");

    let distribution = match fields.get("distribution") {
        None | Some(Value::Null) => Distribution::default(),
        Some(Value::String(s)) => s
            .parse::<Distribution>()
            .map_err(|e| e.at(field_location("distribution")))?,
        Some(_) => {
            return Err(LabError::MalformedProfile("expected a string".into())
                .at(field_location("distribution")));
        }
    };

    let mean = require_number(fields, "mean").map_err(|e| e.at(field_location("mean")))?;
    let sd = optional_number(fields, &["sd"]).map_err(|e| e.at(field_location("sd")))?;
    if let Some(sd) = sd.filter(|sd| *sd < 0.0) {
        return Err(
            LabError::MalformedProfile(format!("'sd' must be non-negative, got {sd}"))
                .at(field_location("sd")),
        );
    }
    let min =
        optional_number(fields, &["min", "min_val"]).map_err(|e| e.at(field_location("min")))?;
    let max =
        optional_number(fields, &["max", "max_val"]).map_err(|e| e.at(field_location("max")))?;

    let sex_adjustment = fields
        .get("sex_adjustment")
        .map(parse_sex_adjustment)
        .transpose()
        .map_err(|e| e.at(field_location("sex_adjustment")))?;
    let age_adjustment = fields
        .get("age_adjustment")
        .map(parse_age_adjustment)
        .transpose()
        .map_err(|e| e.at(field_location("age_adjustment")))?;
    let lifestyle = match fields.get("lifestyle") {
        Some(value) => {
            parse_lifestyle(value).map_err(|e| e.at(field_location("lifestyle")))?
        }
        None => FxHashMap::default(),
    };

    Ok(TestSpec {
        name: name.to_string(),
        distribution,
        mean,
        sd,
        min,
        max,
        sex_adjustment,
        age_adjustment,
        lifestyle,
    })
}

fn parse_sex_adjustment(value: &Value) -> Result<SexAdjustment> {
    let entries = as_object(value)?;
    let mut adjustment = SexAdjustment::new();
    for (sex, entry) in entries {
        let multiplier = match entry {
            Value::Number(_) => Multiplier::new(number(entry, sex)?, 1.0),
            Value::Object(obj) => Multiplier::new(
                optional_number(obj, &["multiplier", "mean_multiplier"])?.unwrap_or(1.0),
                optional_number(obj, &["sd_multiplier"])?.unwrap_or(1.0),
            ),
            _ => {
                return Err(LabError::MalformedProfile(format!(
                    "'{sex}' must be a number or {{multiplier, sd_multiplier}}"
                )));
            }
        };
        adjustment = adjustment.with_entry(sex, multiplier);
    }
    Ok(adjustment)
}

fn parse_age_adjustment(value: &Value) -> Result<AgeAdjustment> {
    match value {
        Value::Array(bands) => parse_age_bands(bands),
        Value::Object(obj) => {
            if let Some(Value::Array(bands)) = obj.get("age_bands") {
                return parse_age_bands(bands);
            }
            if !obj.contains_key("slope") {
                return Err(LabError::MalformedProfile(
                    "expected {slope, ref_age} or a list of age bands".into(),
                ));
            }
            Ok(AgeAdjustment::Slope {
                slope: require_number(obj, "slope")?,
                ref_age: optional_number(obj, &["ref_age"])?
                    .unwrap_or(AgeAdjustment::DEFAULT_REF_AGE),
            })
        }
        _ => Err(LabError::MalformedProfile(
            "expected {slope, ref_age} or a list of age bands".into(),
        )),
    }
}

fn parse_age_bands(bands: &[Value]) -> Result<AgeAdjustment> {
    bands
        .iter()
        .enumerate()
        .map(|(i, band)| {
            let obj = as_object(band).map_err(|e| e.at(format!("band {i}")))?;
            let parse = || -> Result<AgeBand> {
                Ok(AgeBand {
                    min_age: require_number(obj, "min_age")?,
                    max_age: require_number(obj, "max_age")?,
                    multiplier: multiplier_pair(obj)?,
                })
            };
            parse().map_err(|e| e.at(format!("band {i}")))
        })
        .collect::<Result<Vec<_>>>()
        .map(AgeAdjustment::Bands)
}

fn parse_lifestyle(value: &Value) -> Result<FxHashMap<String, LifestyleEffect>> {
    let factors = as_object(value)?;
    factors
        .iter()
        .map(|(factor, body)| {
            let parse = || -> Result<LifestyleEffect> {
                let obj = as_object(body)?;
                let exceptions = match obj.get("exceptions") {
                    Some(Value::Object(map)) => map.clone(),
                    _ => Map::new(),
                };
                Ok(LifestyleEffect {
                    multiplier: multiplier_pair(obj)?,
                    exceptions,
                })
            };
            parse()
                .map(|effect| (factor.clone(), effect))
                .map_err(|e| e.at(factor.as_str()))
        })
        .collect()
}

/// Lenient: any failure yields `None` and the reconciler falls back to defaults
fn parse_differential(value: &Value) -> Option<DifferentialProps> {
    let obj = value.as_object()?;
    let defaults = DifferentialProps::default().to_array();
    let mut values = defaults;
    for (slot, key) in values.iter_mut().zip(DifferentialProps::KEYS) {
        if let Some(v) = obj.get(key) {
            *slot = v.as_f64()?;
        }
    }
    let props = DifferentialProps::from_array(values);
    props.is_usable().then_some(props)
}

fn multiplier_pair(obj: &Map<String, Value>) -> Result<Multiplier> {
    Ok(Multiplier::new(
        optional_number(obj, &["mean_multiplier"])?.unwrap_or(1.0),
        optional_number(obj, &["sd_multiplier"])?.unwrap_or(1.0),
    ))
}

fn as_object(value: &Value) -> Result<&Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| LabError::MalformedProfile("expected an object".into()))
}

fn number(value: &Value, field: &str) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| LabError::MalformedProfile(format!("'{field}' must be a number")))
}

fn require_number(obj: &Map<String, Value>, field: &str) -> Result<f64> {
    match obj.get(field) {
        Some(value) => number(value, field),
        None => Err(LabError::MalformedProfile(format!(
            "missing required number '{field}'"
        ))),
    }
}

/// First present, non-null field among `aliases`
fn optional_number(obj: &Map<String, Value>, aliases: &[&str]) -> Result<Option<f64>> {
    aliases
        .iter()
        .find_map(|field| match obj.get(*field) {
            None | Some(Value::Null) => None,
            Some(value) => Some(number(value, field)),
        })
        .transpose()
}

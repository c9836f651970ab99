//! Input sample and output record schemas.
//!
//! Field names follow the attribute table consumed by the
//! presentation layer, e.g. `dtm_Z`, `distance_DER_m`.

use crate::{
    shadow::ShadowStatus, EvaluationResult, Outcome, SampleElevations, SamplePoint, Skip,
    SkipReason, TofpaError,
};
use geo::Coord;
use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use std::{
    fmt,
    io::{Read, Write},
};

/// Sample identifiers may be numeric or textual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

/// One input sample as supplied by the host application.
///
/// Fields are read leniently: a value of the wrong type reads as
/// absent, so a bad attribute costs that attribute and not the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleRecord {
    #[serde(deserialize_with = "lenient_id")]
    pub id: Option<RecordId>,

    #[serde(deserialize_with = "lenient_text")]
    pub obj_type: Option<String>,

    #[serde(deserialize_with = "lenient_number")]
    pub lat: Option<f64>,

    #[serde(deserialize_with = "lenient_number")]
    pub lon: Option<f64>,

    /// Planar easting.
    #[serde(deserialize_with = "lenient_number")]
    pub x: Option<f64>,

    /// Planar northing.
    #[serde(deserialize_with = "lenient_number")]
    pub y: Option<f64>,

    #[serde(deserialize_with = "lenient_number")]
    pub elev_ellipsoidal_m: Option<f64>,

    #[serde(deserialize_with = "lenient_number")]
    pub height_from_ground_m: Option<f64>,

    #[serde(deserialize_with = "lenient_number")]
    pub geoid_undulation: Option<f64>,

    #[serde(deserialize_with = "lenient_number")]
    pub ortho_ground_m: Option<f64>,

    #[serde(deserialize_with = "lenient_number")]
    pub amsl_m: Option<f64>,

    #[serde(rename = "dtm_Z", deserialize_with = "lenient_number")]
    pub dtm_z: Option<f64>,
}

fn lenient_number<'de, D: Deserializer<'de>>(de: D) -> Result<Option<f64>, D::Error> {
    Ok(match JsonValue::deserialize(de)? {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_text<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    Ok(match JsonValue::deserialize(de)? {
        JsonValue::String(s) if !s.trim().is_empty() => Some(s),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_id<'de, D: Deserializer<'de>>(de: D) -> Result<Option<RecordId>, D::Error> {
    Ok(match JsonValue::deserialize(de)? {
        JsonValue::Number(n) => Some(
            n.as_i64()
                .map_or_else(|| RecordId::Text(n.to_string()), RecordId::Int),
        ),
        JsonValue::String(s) if !s.trim().is_empty() => Some(RecordId::Text(s)),
        _ => None,
    })
}

impl TryFrom<SampleRecord> for SamplePoint {
    type Error = SkipReason;

    fn try_from(record: SampleRecord) -> Result<Self, SkipReason> {
        let id = record.id.ok_or(SkipReason::MissingId)?;
        let position = match (record.x, record.y) {
            (Some(x), Some(y)) => Some(Coord { x, y }),
            _ => None,
        };
        Ok(Self {
            id: id.to_string(),
            obj_type: record.obj_type,
            lat: record.lat,
            lon: record.lon,
            position,
            elevations: SampleElevations {
                ellipsoidal_m: record.elev_ellipsoidal_m,
                geoid_undulation_m: record.geoid_undulation,
                height_from_ground_m: record.height_from_ground_m,
                ortho_ground_m: record.ortho_ground_m,
                amsl_m: record.amsl_m,
                dtm_m: record.dtm_z,
            },
        })
    }
}

/// Samples read from an input file, plus the records that could not
/// become samples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSet {
    pub samples: Vec<SamplePoint>,

    /// Rejected records, named `#<index>` after their position in the
    /// input array.
    pub rejected: Vec<Skip>,
}

/// Reads a JSON array of [`SampleRecord`]s.
///
/// Only an unreadable file or a top level that is not an array fails;
/// bad records are collected in [`SampleSet::rejected`].
pub fn read_samples<R: Read>(rdr: R) -> Result<SampleSet, TofpaError> {
    let values: Vec<JsonValue> = serde_json::from_reader(rdr)?;
    let mut set = SampleSet::default();
    for (index, value) in values.into_iter().enumerate() {
        let sample = serde_json::from_value::<SampleRecord>(value)
            .map_err(|e| SkipReason::Malformed(e.to_string()))
            .and_then(SamplePoint::try_from);
        match sample {
            Ok(sample) => set.samples.push(sample),
            Err(reason) => {
                warn!("rejecting input record #{index}: {reason:?}");
                set.rejected.push(Skip {
                    id: format!("#{index}"),
                    reason,
                });
            }
        }
    }
    Ok(set)
}

/// One output record per evaluated sample.
#[allow(non_snake_case)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleRecord {
    pub id: String,
    pub obj_type: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub x: f64,
    pub y: f64,
    pub elev_ellipsoidal_m: Option<f64>,
    pub height_from_ground_m: Option<f64>,
    pub geoid_undulation: Option<f64>,
    pub ortho_ground_m: Option<f64>,
    pub amsl_m: f64,
    pub dtm_Z: Option<f64>,
    pub qa_check_ground: Option<f64>,
    pub distance_DER_m: f64,
    pub tofpa_Z_m: Option<f64>,
    pub penetration_m: Option<f64>,

    /// `clear`, `penetrates`, or null outside the footprint.
    pub penetrates: Option<Outcome>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow_status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadowed_by: Option<String>,
}

impl From<&EvaluationResult> for ObstacleRecord {
    fn from(result: &EvaluationResult) -> Self {
        let elevations = &result.elevations;
        Self {
            id: result.id.clone(),
            obj_type: result.obj_type.clone(),
            lat: result.lat,
            lon: result.lon,
            x: result.position.x,
            y: result.position.y,
            elev_ellipsoidal_m: elevations.ellipsoidal_m,
            height_from_ground_m: elevations.height_from_ground_m,
            geoid_undulation: elevations.geoid_undulation_m,
            ortho_ground_m: elevations.ground_m(),
            amsl_m: result.sample_elevation_m,
            dtm_Z: elevations.dtm_m,
            qa_check_ground: result.qa_check_ground,
            distance_DER_m: result.distance_der_m,
            tofpa_Z_m: result.design_elevation_m,
            penetration_m: result.penetration_m,
            penetrates: match result.outcome {
                Outcome::NotApplicable => None,
                outcome => Some(outcome),
            },
            shadow_status: None,
            shadowed_by: None,
        }
    }
}

impl ObstacleRecord {
    /// Attaches the result of shadow analysis.
    #[must_use]
    pub fn with_shadow(mut self, status: &ShadowStatus) -> Self {
        self.shadow_status = Some(status.label().to_owned());
        self.shadowed_by = match status {
            ShadowStatus::Shadowed { by } => Some(by.clone()),
            _ => None,
        };
        self
    }
}

/// Writes `records` as a JSON array.
pub fn write_json<W: Write>(records: &[ObstacleRecord], wtr: W) -> Result<(), TofpaError> {
    serde_json::to_writer_pretty(wtr, records)?;
    Ok(())
}

/// Writes `records` as CSV, leaving unset fields empty.
pub fn write_csv<W: Write>(records: &[ObstacleRecord], mut wtr: W) -> Result<(), TofpaError> {
    fn opt<T: fmt::Display>(val: Option<T>) -> String {
        val.map(|v| v.to_string()).unwrap_or_default()
    }

    writeln!(
        wtr,
        "id,obj_type,lat,lon,x,y,elev_ellipsoidal_m,height_from_ground_m,geoid_undulation,ortho_ground_m,amsl_m,dtm_Z,qa_check_ground,distance_DER_m,tofpa_Z_m,penetration_m,penetrates,shadow_status,shadowed_by"
    )?;
    for r in records {
        let penetrates = match r.penetrates {
            Some(Outcome::Penetrates) => "penetrates",
            Some(_) => "clear",
            None => "",
        };
        writeln!(
            wtr,
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            csv_text(&r.id),
            csv_text(r.obj_type.as_deref().unwrap_or_default()),
            opt(r.lat),
            opt(r.lon),
            r.x,
            r.y,
            opt(r.elev_ellipsoidal_m),
            opt(r.height_from_ground_m),
            opt(r.geoid_undulation),
            opt(r.ortho_ground_m),
            r.amsl_m,
            opt(r.dtm_Z),
            opt(r.qa_check_ground),
            r.distance_DER_m,
            opt(r.tofpa_Z_m),
            opt(r.penetration_m),
            penetrates,
            opt(r.shadow_status.as_deref()),
            csv_text(r.shadowed_by.as_deref().unwrap_or_default()),
        )?;
    }
    Ok(())
}

/// Quotes `text` if it contains a delimiter, quote or newline.
fn csv_text(text: &str) -> String {
    if text.contains([',', '"', '\n']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::{csv_text, read_samples, write_csv, ObstacleRecord};
    use crate::{evaluate::evaluate, DerReference, SkipReason, TofpaParameters, TofpaSurface};
    use geo::coord;

    const SAMPLES: &str = r#"[
        {"id": 1, "obj_type": "mast", "lat": 40.1, "lon": -3.5, "x": 0.0, "y": 500.0,
         "elev_ellipsoidal_m": 165.0, "geoid_undulation": 50.0, "height_from_ground_m": 12.0,
         "dtm_Z": 104.0},
        {"id": "tree-7", "x": 200.0, "y": 500.0, "amsl_m": 115.0},
        {"id": 3, "x": 0.0, "y": 800.0, "height_from_ground_m": 30.0}
    ]"#;

    fn surface() -> TofpaSurface {
        let der = DerReference::new(coord!(x: 0.0, y: 0.0), 100.0, 0.0).unwrap();
        let params = TofpaParameters {
            splay_deg: TofpaParameters::splay_for_divergence(0.06),
            max_length_m: 3_000.0,
            max_width_m: None,
            ..TofpaParameters::default()
        };
        TofpaSurface::build(der, params).unwrap()
    }

    #[test]
    fn test_read_samples() {
        let samples = read_samples(SAMPLES.as_bytes()).unwrap().samples;
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].id, "1");
        assert_eq!(samples[0].elevations.top_m(), Some(115.0));
        assert_eq!(samples[0].elevations.dtm_m, Some(104.0));
        assert_eq!(samples[1].id, "tree-7");
        assert_eq!(samples[2].elevations.top_m(), None);
    }

    #[test]
    fn test_bad_records_do_not_abort_read() {
        let input = r#"[
            {"id": 1, "x": 0, "y": 500, "amsl_m": 115},
            {"x": 0, "y": 600, "amsl_m": 115},
            {"id": 3, "x": 0, "y": 700, "amsl_m": "n/a", "obj_type": 7},
            {"id": "", "x": 0, "y": 800, "amsl_m": 115},
            42,
            {"id": 6, "x": "10.5", "y": 900, "amsl_m": 115}
        ]"#;
        let set = read_samples(input.as_bytes()).unwrap();

        let ids: Vec<&str> = set.samples.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["1", "3", "6"]);
        assert_eq!(set.samples[1].elevations.amsl_m, None);
        assert_eq!(set.samples[1].obj_type.as_deref(), Some("7"));
        assert_eq!(set.samples[2].position.map(|p| p.x), Some(10.5));

        let rejected: Vec<&str> = set.rejected.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(rejected, ["#1", "#3", "#4"]);
        assert_eq!(set.rejected[0].reason, SkipReason::MissingId);
        assert!(matches!(set.rejected[2].reason, SkipReason::Malformed(_)));

        let evaluation = evaluate(&surface(), &set.samples, 0.01).unwrap();
        assert_eq!(evaluation.results.len(), 2);
        assert_eq!(evaluation.diagnostics.skipped.len(), 1);
        assert_eq!(
            evaluation.diagnostics.skipped[0].reason,
            SkipReason::MissingElevation
        );
    }

    #[test]
    fn test_non_array_input_fails() {
        assert!(read_samples(r#"{"id": 1}"#.as_bytes()).is_err());
    }

    #[test]
    fn test_output_records() {
        let samples = read_samples(SAMPLES.as_bytes()).unwrap().samples;
        let evaluation = evaluate(&surface(), &samples, 0.01).unwrap();
        assert_eq!(evaluation.diagnostics.skipped.len(), 1);

        let records: Vec<ObstacleRecord> =
            evaluation.results.iter().map(ObstacleRecord::from).collect();
        let json = serde_json::to_value(&records).unwrap();

        let mast = &json[0];
        assert_eq!(mast["id"], "1");
        assert_eq!(mast["dtm_Z"], 104.0);
        assert_eq!(mast["ortho_ground_m"], 103.0);
        assert_eq!(mast["qa_check_ground"], 1.0);
        assert_eq!(mast["distance_DER_m"], 500.0);
        assert_eq!(mast["penetrates"], "penetrates");
        assert!(mast.get("shadow_status").is_none());

        let tree = &json[1];
        assert!(tree["tofpa_Z_m"].is_null());
        assert!(tree["penetration_m"].is_null());
        assert!(tree["penetrates"].is_null());
    }

    #[test]
    fn test_write_csv() {
        let samples = read_samples(SAMPLES.as_bytes()).unwrap().samples;
        let evaluation = evaluate(&surface(), &samples, 0.01).unwrap();
        let records: Vec<ObstacleRecord> =
            evaluation.results.iter().map(ObstacleRecord::from).collect();
        let mut out = Vec::new();
        write_csv(&records, &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("id,obj_type,lat,lon,x,y,"));
        assert!(lines[1].starts_with("1,mast,40.1,-3.5,0,500,"));
        assert!(lines[2].starts_with("tree-7,,,,200,500,"));
        assert_eq!(lines[1].split(',').count(), lines[0].split(',').count());
    }

    #[test]
    fn test_csv_text() {
        assert_eq!(csv_text("mast"), "mast");
        assert_eq!(csv_text("mast, lit"), "\"mast, lit\"");
        assert_eq!(csv_text("8\" pipe"), "\"8\"\" pipe\"");
    }
}

//! GeoJSON export of a surface and its evaluated obstacles.
//!
//! Coordinates are written as-is, in the planar system the surface was
//! built in.

use crate::{record::ObstacleRecord, TofpaError, TofpaSurface};
use geo::Point;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};
use std::io::Write;

fn feature(value: Value, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn layer(name: &str) -> JsonObject {
    let mut properties = JsonObject::new();
    properties.insert("layer".to_owned(), JsonValue::from(name));
    properties
}

/// Collects the footprint, centerline, reference line and one point per
/// record into a feature collection.
pub fn feature_collection(
    surface: &TofpaSurface,
    records: &[ObstacleRecord],
) -> Result<FeatureCollection, TofpaError> {
    let der = surface.der();
    let params = surface.params();

    let mut footprint = layer("surface");
    footprint.insert("der_elevation_m".to_owned(), der.elevation_m.into());
    footprint.insert("bearing_deg".to_owned(), der.bearing_deg.into());
    footprint.insert("slope_ratio".to_owned(), params.slope_ratio.into());
    footprint.insert("length_m".to_owned(), params.max_length_m.into());

    let mut features = vec![
        feature(Value::from(surface.footprint()), footprint),
        feature(Value::from(&surface.centerline()), layer("centerline")),
        feature(Value::from(&surface.reference_line()), layer("reference_line")),
    ];

    for record in records {
        let mut properties = match serde_json::to_value(record)? {
            JsonValue::Object(map) => map,
            _ => JsonObject::new(),
        };
        properties.insert("layer".to_owned(), JsonValue::from("obstacle"));
        let point = Point::new(record.x, record.y);
        features.push(feature(Value::from(&point), properties));
    }

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

/// Writes the feature collection as GeoJSON.
pub fn write_geojson<W: Write>(
    surface: &TofpaSurface,
    records: &[ObstacleRecord],
    wtr: W,
) -> Result<(), TofpaError> {
    let collection = feature_collection(surface, records)?;
    serde_json::to_writer(wtr, &collection)?;
    Ok(())
}

use std::{collections::BTreeSet, fmt::Display};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Geometry types a GeoJSON document may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryKind {
    Point,
    MultiPoint,
    LineString,
    MultiLineString,
    Polygon,
    MultiPolygon,
    GeometryCollection,
}

impl Display for GeometryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Point => "Point",
            Self::MultiPoint => "MultiPoint",
            Self::LineString => "LineString",
            Self::MultiLineString => "MultiLineString",
            Self::Polygon => "Polygon",
            Self::MultiPolygon => "MultiPolygon",
            Self::GeometryCollection => "GeometryCollection",
        };
        write!(f, "{}", name)
    }
}

/// A GeoJSON geometry. Members other than `type` (`coordinates`,
/// `geometries`, `bbox`, ...) are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: GeometryKind,
    #[serde(flatten)]
    pub members: Map<String, Value>,
}

impl Geometry {
    /// Builds a point geometry from a longitude/latitude pair.
    pub fn point(lon: f64, lat: f64) -> Self {
        let mut members = Map::new();
        members.insert("coordinates".to_owned(), serde_json::json!([lon, lat]));
        Self {
            kind: GeometryKind::Point,
            members,
        }
    }

    pub fn is_point(&self) -> bool {
        self.kind == GeometryKind::Point
    }

    /// Returns the `(x, y)` pair of a point geometry, or `None` for any other
    /// geometry type or malformed coordinates.
    pub fn as_point(&self) -> Option<(f64, f64)> {
        if !self.is_point() {
            return None;
        }
        let coordinates = self.members.get("coordinates")?.as_array()?;
        let x = coordinates.first()?.as_f64()?;
        let y = coordinates.get(1)?.as_f64()?;
        Some((x, y))
    }
}

/// One feature of a dataset: geometry plus attribute columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    /// Feature identifier, when the source provides one.
    pub id: Option<Value>,
    /// `None` for features whose geometry is `null`.
    pub geometry: Option<Geometry>,
    /// Attribute columns keyed by column name.
    pub properties: Map<String, Value>,
}

impl Row {
    pub fn new(geometry: Option<Geometry>, properties: Map<String, Value>) -> Self {
        Self {
            id: None,
            geometry,
            properties,
        }
    }

    /// Geometry type of the row, `None` when the geometry is missing.
    pub fn geom_type(&self) -> Option<GeometryKind> {
        self.geometry.as_ref().map(|geometry| geometry.kind)
    }

    pub fn is_point(&self) -> bool {
        self.geometry.as_ref().is_some_and(Geometry::is_point)
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.properties.get(column)
    }
}

/// In-memory table of geometry + attribute rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoTable {
    rows: Vec<Row>,
}

impl GeoTable {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Row] {
        &mut self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// Sorted union of the attribute columns of every row.
    pub fn columns(&self) -> Vec<String> {
        self.rows
            .iter()
            .flat_map(|row| row.properties.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.rows
            .iter()
            .any(|row| row.properties.contains_key(column))
    }

    /// Values of one column, one entry per row; `None` where the row lacks it.
    pub fn column(&self, column: &str) -> Vec<Option<&Value>> {
        self.rows.iter().map(|row| row.get(column)).collect()
    }

    pub fn geom_types(&self) -> Vec<Option<GeometryKind>> {
        self.rows.iter().map(Row::geom_type).collect()
    }

    /// Number of rows whose geometry is missing or not a point.
    pub fn non_point_count(&self) -> usize {
        self.rows.iter().filter(|row| !row.is_point()).count()
    }

    /// Typed camp view over every row.
    pub fn records(&self) -> impl Iterator<Item = CampRecord> + '_ {
        self.rows.iter().map(CampRecord::from_row)
    }

    /// Serializes the table back into a GeoJSON feature collection.
    pub fn to_geojson(&self) -> Value {
        let features = self
            .rows
            .iter()
            .map(|row| {
                let mut feature = Map::new();
                feature.insert("type".to_owned(), Value::from("Feature"));
                if let Some(id) = &row.id {
                    feature.insert("id".to_owned(), id.clone());
                }
                feature.insert(
                    "geometry".to_owned(),
                    serde_json::to_value(&row.geometry).unwrap_or(Value::Null),
                );
                feature.insert(
                    "properties".to_owned(),
                    Value::Object(row.properties.clone()),
                );
                Value::Object(feature)
            })
            .collect::<Vec<_>>();

        serde_json::json!({
            "type": "FeatureCollection",
            "features": features,
        })
    }
}

impl FromIterator<Row> for GeoTable {
    fn from_iter<I: IntoIterator<Item = Row>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// A camp row after column normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampRecord {
    pub camp_name: Option<String>,
    pub country_name: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub geometry: Option<Geometry>,
    /// Every attribute other than the four normalized columns.
    pub attributes: Map<String, Value>,
}

impl CampRecord {
    pub fn from_row(row: &Row) -> Self {
        let mut attributes = row.properties.clone();
        let camp_name = attributes.remove("camp_name").and_then(into_string);
        let country_name = attributes.remove("country_name").and_then(into_string);
        let lat = attributes.remove("lat").and_then(into_f64);
        let lon = attributes.remove("lon").and_then(into_f64);

        Self {
            camp_name,
            country_name,
            lat,
            lon,
            geometry: row.geometry.clone(),
            attributes,
        }
    }

    /// Returns the record as tab separated `camp_name country_name lat lon`.
    pub fn as_text(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}",
            self.camp_name.as_deref().unwrap_or_default(),
            self.country_name.as_deref().unwrap_or_default(),
            self.lat.map(|lat| lat.to_string()).unwrap_or_default(),
            self.lon.map(|lon| lon.to_string()).unwrap_or_default(),
        )
    }

    pub fn as_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

fn into_string(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn into_f64(value: Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

impl Display for CampRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<Camp {} {}",
            self.country_name.as_deref().unwrap_or("--"),
            self.camp_name.as_deref().unwrap_or("--"),
        )?;
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => write!(f, " ({:.4}, {:.4})>", lat, lon),
            _ => write!(f, ">"),
        }
    }
}

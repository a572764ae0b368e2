//! ---
//! ems_section: "02-messaging-ipc-data-model"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "OpenADR 3.0 data model and wire codecs."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Values maps: the typed tuples used for payloads, targets and attributes.

use serde_json::Value as JsonValue;

use crate::enums::PayloadType;
use crate::errors::{DecodeError, DecodeResult, ModelError, ModelResult};
use crate::fields::{json_record, DecodeOptions, Field, FieldReader, FieldWriter, FromJson, JsonRecord, ToJson};
use crate::hashing::{cached_hash, HashCode, StructuralHasher};
use crate::numbers::{Float32, Float64};

/// 2D coordinate usable as a values-map element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    x: Float32,
    y: Float32,
}

impl Point {
    /// Point at `(x, y)`; both coordinates must be finite.
    pub fn new(x: f32, y: f32) -> ModelResult<Self> {
        Ok(Self {
            x: Float32::new(x)?,
            y: Float32::new(y)?,
        })
    }

    /// Horizontal coordinate.
    pub fn x(&self) -> f32 {
        self.x.get()
    }

    /// Vertical coordinate.
    pub fn y(&self) -> f32 {
        self.y.get()
    }
}

impl JsonRecord for Point {
    const KIND: &'static str = "Point";

    fn read_fields(reader: &mut FieldReader<'_>) -> Field<Self> {
        let x = reader.mandatory("x");
        let y = reader.mandatory("y");
        Ok(Self { x: x?, y: y? })
    }

    fn write_fields(&self, writer: &mut FieldWriter) {
        writer.put("x", &self.x).put("y", &self.y);
    }
}

/// One element of [`ValuesMap::values`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// JSON number without fraction that fits `i64`.
    Integer(i64),
    /// Any other JSON number.
    Decimal(Float64),
    /// JSON string.
    Text(String),
    /// JSON boolean.
    Boolean(bool),
    /// JSON object `{"x": .., "y": ..}`.
    Point(Point),
}

impl FromJson for Value {
    fn from_json(json: &JsonValue, options: &DecodeOptions) -> DecodeResult<Self> {
        match json {
            JsonValue::Number(n) => Ok(match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => {
                    let decimal = n
                        .as_f64()
                        .ok_or_else(|| DecodeError::InvalidValue(format!("{n} is not representable as f64")))?;
                    Value::Decimal(Float64::new(decimal)?)
                }
            }),
            JsonValue::String(s) => Ok(Value::Text(s.clone())),
            JsonValue::Bool(b) => Ok(Value::Boolean(*b)),
            JsonValue::Object(_) => Point::from_json(json, options).map(Value::Point),
            other => Err(DecodeError::wrong_type("number, string, boolean or point", other)),
        }
    }
}

impl ToJson for Value {
    fn to_json(&self) -> JsonValue {
        match self {
            Value::Integer(i) => JsonValue::from(*i),
            Value::Decimal(d) => d.to_json(),
            Value::Text(s) => JsonValue::String(s.clone()),
            Value::Boolean(b) => JsonValue::Bool(*b),
            Value::Point(p) => p.to_json(),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl Value {
    /// Decimal element; NaN and infinities are rejected.
    pub fn decimal(value: f64) -> ModelResult<Self> {
        Float64::new(value).map(Value::Decimal)
    }
}

impl TryFrom<f64> for Value {
    type Error = ModelError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Value::decimal(value)
    }
}

impl From<Float64> for Value {
    fn from(value: Float64) -> Self {
        Value::Decimal(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Point> for Value {
    fn from(value: Point) -> Self {
        Value::Point(value)
    }
}

/// Typed tuple of values, e.g. `{"type": "PRICE", "values": [0.17]}`.
///
/// `values` is order-significant: `[lat, long]` is not `[long, lat]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuesMap {
    hash: HashCode,
    value_type: PayloadType,
    values: Vec<Value>,
}

cached_hash!(ValuesMap);

impl ValuesMap {
    /// Map of `value_type` holding `values` in order.
    pub fn new(value_type: PayloadType, values: Vec<Value>) -> Self {
        Self {
            hash: HashCode::default(),
            value_type,
            values,
        }
        .sealed()
    }

    /// Convenience constructor converting each element into a [`Value`].
    pub fn of<V: Into<Value>>(value_type: PayloadType, values: impl IntoIterator<Item = V>) -> Self {
        Self::new(value_type, values.into_iter().map(Into::into).collect())
    }

    /// Map of decimal values, e.g. prices; fails on the first non-finite one.
    pub fn decimals(value_type: PayloadType, values: impl IntoIterator<Item = f64>) -> ModelResult<Self> {
        let values = values
            .into_iter()
            .map(Value::decimal)
            .collect::<ModelResult<Vec<_>>>()?;
        Ok(Self::new(value_type, values))
    }

    /// Payload, target or attribute type.
    pub fn value_type(&self) -> &PayloadType {
        &self.value_type
    }

    /// Values in wire order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    fn sealed(mut self) -> Self {
        self.hash = StructuralHasher::new("ValuesMap")
            .field(&self.value_type)
            .field(&self.values)
            .finish();
        self
    }
}

impl JsonRecord for ValuesMap {
    const KIND: &'static str = "ValuesMap";

    fn read_fields(reader: &mut FieldReader<'_>) -> Field<Self> {
        let value_type = reader.mandatory("type");
        let values = reader.mandatory_list("values");
        Ok(Self::new(value_type?, values?))
    }

    fn write_fields(&self, writer: &mut FieldWriter) {
        writer.put("type", &self.value_type).put_all("values", &self.values);
    }
}

json_record!(Point, ValuesMap);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::hash_one;
    use serde_json::json;

    #[test]
    fn price_values_map_round_trips() {
        let doc = json!({"type": "PRICE", "values": [0.17]});
        let map = ValuesMap::from_json(&doc, &DecodeOptions::default()).unwrap();
        assert_eq!(map.value_type(), &PayloadType::PRICE);
        assert_eq!(map.values(), &[Value::decimal(0.17).unwrap()]);
        assert_eq!(map.to_json(), doc);
        assert_eq!(
            serde_json::to_string(&map).unwrap(),
            r#"{"type":"PRICE","values":[0.17]}"#
        );
    }

    #[test]
    fn values_order_is_significant() {
        let a = ValuesMap::decimals(PayloadType::LOCATION, [1.5, 2.5]).unwrap();
        let b = ValuesMap::decimals(PayloadType::LOCATION, [2.5, 1.5]).unwrap();
        assert_ne!(a, b);
        assert_ne!(hash_one(&a), hash_one(&b));
    }

    #[test]
    fn type_comparison_ignores_case() {
        let doc = json!({"type": "price", "values": [1]});
        let map = ValuesMap::from_json(&doc, &DecodeOptions::default()).unwrap();
        assert_eq!(map, ValuesMap::of(PayloadType::PRICE, [1_i64]));
    }

    #[test]
    fn mixed_scalars_and_points_decode() {
        let doc = json!({"type": "CURVE", "values": [1, 2.5, "x", true, {"x": 1.0, "y": 2.0}]});
        let map = ValuesMap::from_json(&doc, &DecodeOptions::default()).unwrap();
        assert_eq!(
            map.values(),
            &[
                Value::Integer(1),
                Value::decimal(2.5).unwrap(),
                Value::from("x"),
                Value::Boolean(true),
                Value::Point(Point::new(1.0, 2.0).unwrap()),
            ]
        );
        assert_eq!(map.to_json(), doc);
    }

    #[test]
    fn empty_values_is_allowed_but_missing_is_not() {
        let empty = ValuesMap::from_json(&json!({"type": "SIMPLE", "values": []}), &DecodeOptions::default());
        assert!(empty.unwrap().values().is_empty());
        let err = ValuesMap::from_json(&json!({"type": "SIMPLE"}), &DecodeOptions::default()).unwrap_err();
        assert_eq!(err, DecodeError::MissingField { field: "values" });
    }

    #[test]
    fn nested_arrays_and_nulls_are_rejected() {
        let err = ValuesMap::from_json(&json!({"type": "SIMPLE", "values": [[1]]}), &DecodeOptions::default())
            .unwrap_err();
        assert!(matches!(err, DecodeError::InvalidElement { field: "values", index: 0, .. }));
        let err = ValuesMap::from_json(&json!({"type": "SIMPLE", "values": [1, null]}), &DecodeOptions::default())
            .unwrap_err();
        assert!(matches!(err, DecodeError::InvalidElement { field: "values", index: 1, .. }));
    }

    #[test]
    fn empty_type_is_an_empty_identifier() {
        let err = ValuesMap::from_json(&json!({"type": "  ", "values": []}), &DecodeOptions::default())
            .unwrap_err();
        assert_eq!(err.root_cause(), &DecodeError::EmptyIdentifier);
    }

    #[test]
    fn non_finite_values_cannot_be_built() {
        assert!(ValuesMap::decimals(PayloadType::PRICE, [0.17, f64::INFINITY]).is_err());
        assert!(ValuesMap::decimals(PayloadType::PRICE, [f64::NAN]).is_err());
        assert!(Value::try_from(f64::NEG_INFINITY).is_err());
        assert!(Point::new(f32::NAN, 0.0).is_err());
        assert!(Point::new(0.0, f32::INFINITY).is_err());
    }

    #[test]
    fn built_decimals_round_trip() {
        let map = ValuesMap::decimals(PayloadType::PRICE, [0.17, -1e300]).unwrap();
        let doc = map.to_json();
        assert_eq!(doc, json!({"type": "PRICE", "values": [0.17, -1e300]}));
        assert_eq!(ValuesMap::from_json(&doc, &DecodeOptions::default()).unwrap(), map);
    }

    #[test]
    fn point_coordinates_beyond_f32_are_rejected() {
        let doc = json!({"type": "LOCATION", "values": [{"x": 1e39, "y": 0.0}]});
        let err = ValuesMap::from_json(&doc, &DecodeOptions::default()).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidElement { field: "values", index: 0, .. }));
        assert!(matches!(err.root_cause(), DecodeError::InvalidValue(_)));

        let doc = json!({"type": "LOCATION", "values": [{"x": 3.0e38, "y": -0.5}]});
        let map = ValuesMap::from_json(&doc, &DecodeOptions::default()).unwrap();
        assert_eq!(ValuesMap::from_json(&map.to_json(), &DecodeOptions::default()).unwrap(), map);
    }

    #[test]
    fn point_requires_both_coordinates() {
        let err = Point::from_json(&json!({"x": 1.0}), &DecodeOptions::default()).unwrap_err();
        assert_eq!(err, DecodeError::MissingField { field: "y" });
    }
}

use chrono::NaiveDate;

use super::*;

#[test]
fn unsigned_integers_narrow_only_when_they_fit() {
    assert_eq!(Value::UInt64(255).coerce(LogicalType::UInt8).unwrap(), Value::UInt8(255));
    assert!(Value::UInt64(256).coerce(LogicalType::UInt8).is_err());
    assert_eq!(Value::UInt8(7).coerce(LogicalType::UInt64).unwrap(), Value::UInt64(7));
    assert_eq!(Value::UInt16(3).coerce(LogicalType::Float64).unwrap(), Value::Float64(3.0));
}

#[test]
fn lossy_conversions_are_rejected() {
    let err = Value::Float64(1.5).coerce(LogicalType::UInt64).unwrap_err();
    assert_eq!(err.target(), LogicalType::UInt64);
    assert_eq!(err.to_string(), "cannot cast value Float64(1.5) of type float64 to uint64");
    assert!(Value::Text("John".into()).coerce(LogicalType::UInt8).is_err());
    assert!(Value::Float64(0.5).coerce(LogicalType::Float32).is_err());
}

#[test]
fn integers_become_floats_only_when_exact() {
    let max_exact = 1u64 << 53;
    assert_eq!(Value::UInt64(max_exact).coerce(LogicalType::Float64).unwrap(), Value::Float64(9007199254740992.0));
    assert!(Value::UInt64(max_exact + 1).coerce(LogicalType::Float64).is_err());
    // large powers of two are still exact
    assert_eq!(Value::UInt64(1 << 60).coerce(LogicalType::Float64).unwrap(), Value::Float64((1u64 << 60) as f64));
    assert!(Value::UInt64(u64::MAX).coerce(LogicalType::Float64).is_err());

    assert_eq!(Value::UInt32(1 << 24).coerce(LogicalType::Float32).unwrap(), Value::Float32(16777216.0));
    assert!(Value::UInt32((1 << 24) + 1).coerce(LogicalType::Float32).is_err());
    assert!(Value::UInt64(u64::MAX).coerce(LogicalType::Float32).is_err());
}

#[test]
fn null_coerces_to_every_type() {
    for ty in [LogicalType::UInt8, LogicalType::Text, LogicalType::Timestamp] {
        assert_eq!(Value::Null.coerce(ty).unwrap(), Value::Null);
    }
}

#[test]
fn text_coerces_to_timestamp() {
    let expected = NaiveDate::from_ymd_opt(2018, 4, 18).unwrap().and_hms_opt(9, 41, 13).unwrap();
    let value = Value::from("2018-04-18 09:41:13").coerce(LogicalType::Timestamp).unwrap();
    assert_eq!(value, Value::Timestamp(expected));
    assert_eq!(value.to_string(), "2018-04-18 09:41:13");
    assert!(Value::from("yesterday").coerce(LogicalType::Timestamp).is_err());
}

#[test]
fn cast_to_rust_values() {
    assert_eq!(Value::UInt8(4).cast_non_null::<u64>().unwrap(), 4);
    assert_eq!(Value::Null.cast::<u64>().unwrap(), None);
    assert_eq!(Value::UInt32(2).cast_non_null::<f64>().unwrap(), 2.0);
    assert_eq!(Value::from("John").cast_non_null::<String>().unwrap(), "John");
    assert!(Value::from("John").cast_non_null::<u64>().is_err());
}

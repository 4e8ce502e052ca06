//! Shared data types for the Stride step tracker.
//!
//! This crate provides the plain data types exchanged between the step
//! detector (stride-core), the activity store (stride-store) and the HTTP
//! service (stride-service). It has no knowledge of storage or transport.
//!
//! # Features
//!
//! - Accelerometer samples and their magnitude
//! - Immutable per-device activity entries (step-count deltas)
//! - The packet shape posted by sample sources
//! - The derived analytics report
//!
//! # Example
//!
//! ```
//! use stride_types::{AccelerationSample, ActivityEntry};
//! use time::OffsetDateTime;
//!
//! let sample = AccelerationSample::new(0.0, 0.0, 9.81);
//! assert!(sample.magnitude() > 9.0);
//!
//! let entry = ActivityEntry::new(OffsetDateTime::now_utc(), 12);
//! assert_eq!(entry.steps, 12);
//! ```

pub mod error;
pub mod types;

pub use error::{ParseError, ParseResult};
pub use types::{
    AccelerationSample, ActivityEntry, ActivityRange, AnalyticsReport, DailyTotal, MAX_DEVICE_ID_LEN,
    StepPacket, validate_device_id,
};

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    // --- AccelerationSample tests ---

    #[test]
    fn test_magnitude_of_gravity_only() {
        let sample = AccelerationSample::new(0.0, 0.0, 9.8);
        assert!((sample.magnitude() - 9.8).abs() < 1e-12);
    }

    #[test]
    fn test_magnitude_uses_all_axes() {
        let sample = AccelerationSample::new(1.0, 2.0, 2.0);
        assert!((sample.magnitude() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_sample_from_tuple() {
        let sample = AccelerationSample::from((1.0, -1.0, 0.5));
        assert_eq!(sample, AccelerationSample::new(1.0, -1.0, 0.5));
    }

    #[test]
    fn test_sample_is_finite() {
        assert!(AccelerationSample::new(1.0, 2.0, 3.0).is_finite());
        assert!(!AccelerationSample::new(f64::NAN, 0.0, 0.0).is_finite());
        assert!(!AccelerationSample::new(0.0, f64::INFINITY, 0.0).is_finite());
        assert!(!AccelerationSample::new(0.0, 0.0, f64::NEG_INFINITY).is_finite());
    }

    // --- ActivityEntry tests ---

    #[test]
    fn test_entry_normalizes_to_utc() {
        let entry = ActivityEntry::new(datetime!(2025-06-01 00:30 +01:00), 5);
        assert_eq!(entry.timestamp.offset(), time::UtcOffset::UTC);
        assert_eq!(entry.date(), date!(2025 - 05 - 31));
    }

    #[test]
    fn test_entry_ordering_by_timestamp_then_steps() {
        let a = ActivityEntry::new(datetime!(2025-06-01 10:00 UTC), 9);
        let b = ActivityEntry::new(datetime!(2025-06-01 10:01 UTC), 1);
        let c = ActivityEntry::new(datetime!(2025-06-01 10:01 UTC), 3);

        let mut entries = vec![c, a, b];
        entries.sort();
        assert_eq!(entries, vec![a, b, c]);
    }

    #[test]
    fn test_entry_display() {
        let entry = ActivityEntry::new(datetime!(2025-06-01 10:00 UTC), 42);
        assert!(entry.to_string().starts_with("42 steps at"));
    }

    // --- StepPacket tests ---

    #[test]
    fn test_packet_validate_ok() {
        let packet = StepPacket::new("phone_1", 10, datetime!(2025-06-01 10:00 UTC));
        assert!(packet.validate().is_ok());
    }

    #[test]
    fn test_packet_validate_empty_device() {
        let packet = StepPacket::new("   ", 10, datetime!(2025-06-01 10:00 UTC));
        assert!(matches!(
            packet.validate(),
            Err(ParseError::InvalidDeviceId(_))
        ));
    }

    #[test]
    fn test_packet_validate_long_device() {
        let packet = StepPacket::new(
            "x".repeat(MAX_DEVICE_ID_LEN + 1),
            10,
            datetime!(2025-06-01 10:00 UTC),
        );
        let err = packet.validate().unwrap_err();
        assert!(err.to_string().contains("maximum is 128"));
    }

    #[test]
    fn test_packet_to_entry() {
        let packet = StepPacket::new("phone_1", 7, datetime!(2025-06-01 12:00 +02:00));
        let entry = packet.to_entry();
        assert_eq!(entry.steps, 7);
        assert_eq!(entry.timestamp, datetime!(2025-06-01 10:00 UTC));
    }

    // --- ActivityRange tests ---

    #[test]
    fn test_range_default_is_unbounded() {
        assert!(ActivityRange::default().is_unbounded());
        let range = ActivityRange {
            offset: Some(0),
            ..ActivityRange::default()
        };
        assert!(!range.is_unbounded());
    }

    // --- ParseError tests ---

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::InvalidData("test message".to_string());
        assert_eq!(err.to_string(), "Invalid data: test message");
    }

    // --- Serialization tests ---

    #[test]
    fn test_packet_deserialization_from_iso_timestamp() {
        let json = r#"{"device_id":"phone_1","steps":12,"timestamp":"2025-06-01T10:00:00.123456+00:00"}"#;
        let packet: StepPacket = serde_json::from_str(json).unwrap();
        assert_eq!(packet.device_id, "phone_1");
        assert_eq!(packet.steps, 12);
        assert_eq!(packet.timestamp.hour(), 10);
    }

    #[test]
    fn test_packet_rejects_negative_steps() {
        let json = r#"{"device_id":"phone_1","steps":-3,"timestamp":"2025-06-01T10:00:00Z"}"#;
        assert!(serde_json::from_str::<StepPacket>(json).is_err());
    }

    #[test]
    fn test_entry_serialization() {
        let entry = ActivityEntry::new(datetime!(2025-06-01 10:00 UTC), 8);
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"steps\":8"));
        assert!(json.contains("2025-06-01T10:00:00Z"));
    }

    #[test]
    fn test_report_serialization_field_names() {
        let report = AnalyticsReport {
            pace_spm: 12.5,
            raw_steps_today: 100,
            corrected_steps_today: 110,
            calories_today: 3.25,
            predicted_daily_steps: 4000,
        };
        let json = serde_json::to_value(report).unwrap();
        assert_eq!(json["pace_spm"], 12.5);
        assert_eq!(json["raw_steps_today"], 100);
        assert_eq!(json["corrected_steps_today"], 110);
        assert_eq!(json["calories_today"], 3.25);
        assert_eq!(json["predicted_daily_steps"], 4000);
    }

    #[test]
    fn test_range_serialization_skips_unset_fields() {
        let range = ActivityRange {
            since: Some(datetime!(2025-06-01 10:00 UTC)),
            limit: Some(20),
            ..ActivityRange::default()
        };
        let json = serde_json::to_value(range).unwrap();
        assert_eq!(json["since"], "2025-06-01T10:00:00Z");
        assert_eq!(json["limit"], 20);
        assert!(json.get("until").is_none());
        assert!(json.get("offset").is_none());

        let empty: ActivityRange = serde_json::from_str("{}").unwrap();
        assert!(empty.is_unbounded());
    }

    #[test]
    fn test_report_default_is_all_zero() {
        let report = AnalyticsReport::default();
        assert_eq!(report.pace_spm, 0.0);
        assert_eq!(report.raw_steps_today, 0);
        assert_eq!(report.corrected_steps_today, 0);
        assert_eq!(report.calories_today, 0.0);
        assert_eq!(report.predicted_daily_steps, 0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn magnitude_is_non_negative(
                x in -100.0f64..100.0,
                y in -100.0f64..100.0,
                z in -100.0f64..100.0,
            ) {
                let m = AccelerationSample::new(x, y, z).magnitude();
                prop_assert!(m >= 0.0);
                prop_assert!(m >= x.abs().max(y.abs()).max(z.abs()) - 1e-9);
            }
        }
    }
}

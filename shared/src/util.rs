use chrono::{DateTime, Utc};

/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert processor epoch seconds to an absolute UTC timestamp.
///
/// The processor sends `null` or `0` for "not set"; both map to `None`.
pub fn epoch_to_utc(secs: Option<i64>) -> Option<DateTime<Utc>> {
    match secs {
        Some(s) if s > 0 => DateTime::from_timestamp(s, 0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_to_utc() {
        let ts = epoch_to_utc(Some(1_700_000_000)).unwrap();
        assert_eq!(ts.to_rfc3339(), "2023-11-14T22:13:20+00:00");
    }

    #[test]
    fn test_epoch_to_utc_unset() {
        assert!(epoch_to_utc(None).is_none());
        assert!(epoch_to_utc(Some(0)).is_none());
    }
}

use chrono::DateTime;

/// RFC3339 rendering of a unix timestamp, empty when out of range.
pub fn to_rfc3339(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|date| date.to_rfc3339())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_rfc3339() {
        assert_eq!(to_rfc3339(0), "1970-01-01T00:00:00+00:00");
        assert_eq!(to_rfc3339(i64::MAX), "");
    }
}

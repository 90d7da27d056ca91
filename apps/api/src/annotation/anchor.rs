use chrono::{DateTime, Utc};

use crate::errors::AppError;

/// Canonical single-anchor form. An anchor locates an imaged moment within a
/// video reference by exactly one of three indexing schemes.
#[derive(Debug, Clone, PartialEq)]
pub enum Anchor {
    /// Absolute instant the frame was recorded.
    Recorded(DateTime<Utc>),
    /// Tape timecode, `HH:MM:SS:FF`.
    Timecode(String),
    /// Milliseconds since the start of the video.
    Elapsed(i64),
}

/// The anchor fields supplied on a request. A creation request must supply at
/// least one; an update may supply none (no anchor change).
///
/// Dedup rule: a request reuses an existing imaged moment when ANY supplied
/// field matches, probed in the order recorded -> timecode -> elapsed. A request
/// that names the same instant through a *different* field is not considered a
/// duplicate; that asymmetry is documented behavior, not a defect.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnchorSet {
    pub recorded_timestamp: Option<DateTime<Utc>>,
    pub timecode: Option<String>,
    pub elapsed_time_millis: Option<i64>,
}

impl AnchorSet {
    /// Builds an `AnchorSet` from raw form fields. Returns `Ok(None)` when no
    /// anchor field was supplied so callers can distinguish "no anchor change"
    /// (updates) from "missing anchor" (creates).
    pub fn from_fields(
        recorded_timestamp: Option<&str>,
        timecode: Option<&str>,
        elapsed_time_millis: Option<i64>,
    ) -> Result<Option<Self>, AppError> {
        let recorded_timestamp = recorded_timestamp.map(parse_timestamp).transpose()?;
        let timecode = timecode
            .map(|tc| validate_timecode(tc).map(|_| tc.to_string()))
            .transpose()?;

        if recorded_timestamp.is_none() && timecode.is_none() && elapsed_time_millis.is_none() {
            return Ok(None);
        }
        Ok(Some(AnchorSet {
            recorded_timestamp,
            timecode,
            elapsed_time_millis,
        }))
    }

    /// Supplied anchors in dedup precedence order.
    pub fn anchors(&self) -> Vec<Anchor> {
        let mut anchors = Vec::new();
        if let Some(t) = self.recorded_timestamp {
            anchors.push(Anchor::Recorded(t));
        }
        if let Some(tc) = &self.timecode {
            anchors.push(Anchor::Timecode(tc.clone()));
        }
        if let Some(ms) = self.elapsed_time_millis {
            anchors.push(Anchor::Elapsed(ms));
        }
        anchors
    }

    pub fn is_empty(&self) -> bool {
        self.recorded_timestamp.is_none()
            && self.timecode.is_none()
            && self.elapsed_time_millis.is_none()
    }
}

/// Parses an RFC3339 instant such as `2016-07-28T14:29:01.030Z`.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| AppError::Validation(format!("Invalid timestamp '{raw}': {e}")))
}

/// Timecodes are fixed-shape `HH:MM:SS:FF` tape positions.
fn validate_timecode(raw: &str) -> Result<(), AppError> {
    let parts: Vec<&str> = raw.split(':').collect();
    let well_formed = parts.len() == 4
        && parts
            .iter()
            .all(|p| p.len() == 2 && p.bytes().all(|b| b.is_ascii_digit()));
    if well_formed {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Invalid timecode '{raw}': expected HH:MM:SS:FF"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_fields_yields_none() {
        let set = AnchorSet::from_fields(None, None, None).unwrap();
        assert!(set.is_none());
    }

    #[test]
    fn single_field_yields_one_anchor() {
        let set = AnchorSet::from_fields(None, None, Some(12345))
            .unwrap()
            .unwrap();
        assert_eq!(set.anchors(), vec![Anchor::Elapsed(12345)]);
    }

    #[test]
    fn all_fields_yield_precedence_order() {
        let set = AnchorSet::from_fields(
            Some("2016-07-28T14:39:02.123Z"),
            Some("01:23:34:09"),
            Some(112345),
        )
        .unwrap()
        .unwrap();

        let anchors = set.anchors();
        assert_eq!(anchors.len(), 3);
        assert!(matches!(anchors[0], Anchor::Recorded(_)));
        assert_eq!(anchors[1], Anchor::Timecode("01:23:34:09".to_string()));
        assert_eq!(anchors[2], Anchor::Elapsed(112345));
    }

    #[test]
    fn fractional_seconds_parse() {
        let t = parse_timestamp("2016-07-12T16:47:03.12Z").unwrap();
        assert_eq!(t.timestamp_subsec_millis(), 120);
    }

    #[test]
    fn garbage_timestamp_is_a_validation_error() {
        let err = AnchorSet::from_fields(Some("yesterday-ish"), None, None).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn malformed_timecode_is_a_validation_error() {
        for bad in ["1:23:34:09", "01:23:34", "01:23:34:9x", ""] {
            let err = AnchorSet::from_fields(None, Some(bad), None).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "accepted {bad:?}");
        }
    }

    #[test]
    fn well_formed_timecode_is_kept_verbatim() {
        let set = AnchorSet::from_fields(None, Some("08:00:34:09"), None)
            .unwrap()
            .unwrap();
        assert_eq!(set.timecode.as_deref(), Some("08:00:34:09"));
    }
}

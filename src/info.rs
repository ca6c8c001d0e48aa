//! ==============================================================================
//! info.rs - device info string parser
//! ==============================================================================
//!
//! purpose:
//!     turns the `key:value,key:value,...` payload pushed by the sensor device
//!     into a typed mapping. `Fan-lvl` is an integer, every other key is a float.
//!
//! relationships:
//!     - used by: routes.rs (upload handler)
//!     - feeds: domain.rs (SensorRecord::from_parsed)
//!
//! ==============================================================================

use std::collections::BTreeMap;
use std::num::{ParseFloatError, ParseIntError};

use thiserror::Error;

/// the only key whose value is parsed as an integer
pub const FAN_LEVEL_KEY: &str = "Fan-lvl";

/// a single parsed value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InfoValue {
    Int(i64),
    Float(f64),
}

/// mapping produced from one request's info string
///
/// lives only for the duration of the request that produced it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedInfo {
    values: BTreeMap<String, InfoValue>,
}

impl ParsedInfo {
    pub fn get(&self, key: &str) -> Option<InfoValue> {
        self.values.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

#[derive(Debug, Error)]
pub enum ParseErrorKind {
    #[error("info string is empty")]
    Empty,
    #[error("segment {segment:?} has no ':' separator")]
    MissingColon { segment: String },
    #[error("invalid integer {value:?} for {key}: {source}")]
    InvalidInteger {
        key: String,
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("invalid number {value:?} for {key}: {source}")]
    InvalidFloat {
        key: String,
        value: String,
        #[source]
        source: ParseFloatError,
    },
    #[error("non-finite value {value:?} for {key}")]
    NonFinite { key: String, value: String },
}

/// parse failure; keeps the untouched input for diagnostics
#[derive(Debug, Error)]
#[error("error parsing info: {input}, {kind}")]
pub struct ParseError {
    pub input: String,
    #[source]
    pub kind: ParseErrorKind,
}

/// parse a device info string
///
/// fails on the first bad segment; no partial mapping is ever returned.
pub fn parse_info(input: &str) -> Result<ParsedInfo, ParseError> {
    let fail = |kind| ParseError { input: input.to_string(), kind };

    if input.trim().is_empty() {
        return Err(fail(ParseErrorKind::Empty));
    }

    let mut values = BTreeMap::new();
    for segment in input.split(',') {
        let (key, value) = segment.split_once(':').ok_or_else(|| {
            fail(ParseErrorKind::MissingColon { segment: segment.to_string() })
        })?;
        let key = key.trim();
        let value = value.trim();

        let parsed = if key == FAN_LEVEL_KEY {
            value.parse::<i64>().map(InfoValue::Int).map_err(|source| {
                fail(ParseErrorKind::InvalidInteger {
                    key: key.to_string(),
                    value: value.to_string(),
                    source,
                })
            })?
        } else {
            let number = value.parse::<f64>().map_err(|source| {
                fail(ParseErrorKind::InvalidFloat {
                    key: key.to_string(),
                    value: value.to_string(),
                    source,
                })
            })?;
            // a failed sensor read arrives as `nan`; json cannot carry it back
            if !number.is_finite() {
                return Err(fail(ParseErrorKind::NonFinite {
                    key: key.to_string(),
                    value: value.to_string(),
                }));
            }
            InfoValue::Float(number)
        };

        // later duplicates overwrite earlier ones
        values.insert(key.to_string(), parsed);
    }

    Ok(ParsedInfo { values })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Fan-lvl:2,LDR:512,Temp:26.5,Hum:40.1,X:0.01,Y:0.02,Z:9.81";

    #[test]
    fn parses_full_device_payload() {
        let info = parse_info(SAMPLE).unwrap();

        assert_eq!(info.len(), 7);
        assert_eq!(info.get("Fan-lvl"), Some(InfoValue::Int(2)));
        assert_eq!(info.get("LDR"), Some(InfoValue::Float(512.0)));
        assert_eq!(info.get("Temp"), Some(InfoValue::Float(26.5)));
        assert_eq!(info.get("Hum"), Some(InfoValue::Float(40.1)));
        assert_eq!(info.get("X"), Some(InfoValue::Float(0.01)));
        assert_eq!(info.get("Y"), Some(InfoValue::Float(0.02)));
        assert_eq!(info.get("Z"), Some(InfoValue::Float(9.81)));
    }

    #[test]
    fn trims_keys_and_values() {
        let info = parse_info(" Fan-lvl : 3 , Temp: -4.25").unwrap();
        assert_eq!(info.get("Fan-lvl"), Some(InfoValue::Int(3)));
        assert_eq!(info.get("Temp"), Some(InfoValue::Float(-4.25)));
    }

    #[test]
    fn keeps_only_keys_present() {
        let info = parse_info("Temp:21").unwrap();
        assert_eq!(info.keys().collect::<Vec<_>>(), vec!["Temp"]);
        assert!(info.get("Hum").is_none());
    }

    #[test]
    fn last_duplicate_wins() {
        let info = parse_info("Temp:1,Temp:2").unwrap();
        assert_eq!(info.get("Temp"), Some(InfoValue::Float(2.0)));
    }

    #[test]
    fn rejects_segment_without_colon() {
        let err = parse_info("Fan-lvl:2,LDR512").unwrap_err();
        assert_eq!(err.input, "Fan-lvl:2,LDR512");
        assert!(matches!(err.kind, ParseErrorKind::MissingColon { ref segment } if segment == "LDR512"));
    }

    #[test]
    fn rejects_non_numeric_value() {
        let err = parse_info("Temp:warm").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::InvalidFloat { .. }));
        assert!(err.to_string().starts_with("error parsing info: Temp:warm, "));
    }

    #[test]
    fn fan_level_must_be_an_integer() {
        let err = parse_info("Fan-lvl:2.5").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::InvalidInteger { .. }));
    }

    #[test]
    fn only_first_colon_splits() {
        // "1:2" is handed to the float parser as a whole
        let err = parse_info("X:1:2").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::InvalidFloat { ref value, .. } if value == "1:2"));
    }

    #[test]
    fn accepts_every_number_form_the_device_sends() {
        let cases: &[(&str, f64)] = &[
            ("-12.75", -12.75),
            ("1e-3", 0.001),
            ("2.5E2", 250.0),
            ("512", 512.0),
            ("512.0", 512.0),
            ("+0.5", 0.5),
            ("-0", 0.0),
            (".25", 0.25),
        ];
        for (text, expected) in cases {
            let info = parse_info(&format!("Fan-lvl:-1,Temp:{}", text)).unwrap();
            assert_eq!(info.get("Temp"), Some(InfoValue::Float(*expected)), "input {}", text);
            assert_eq!(info.get("Fan-lvl"), Some(InfoValue::Int(-1)));
        }
    }

    #[test]
    fn rejects_non_finite_readings() {
        for text in ["nan", "NaN", "inf", "-inf", "infinity", "1e400"] {
            let err = parse_info(&format!("Fan-lvl:0,Temp:{}", text)).unwrap_err();
            assert!(
                matches!(err.kind, ParseErrorKind::NonFinite { ref key, .. } if key == "Temp"),
                "input {}",
                text
            );
        }
    }

    #[test]
    fn fan_level_is_bounded_to_i64() {
        let err = parse_info("Fan-lvl:99999999999999999999").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::InvalidInteger { .. }));
        assert_eq!(parse_info("Fan-lvl:-3").unwrap().get("Fan-lvl"), Some(InfoValue::Int(-3)));
    }

    #[test]
    fn rejects_empty_and_dangling_input() {
        assert!(matches!(parse_info("").unwrap_err().kind, ParseErrorKind::Empty));
        assert!(matches!(parse_info("   ").unwrap_err().kind, ParseErrorKind::Empty));
        assert!(matches!(
            parse_info("Temp:1,").unwrap_err().kind,
            ParseErrorKind::MissingColon { .. }
        ));
    }
}

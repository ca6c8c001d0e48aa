use serde::{Deserialize, Serialize};

use crate::error::{TelemetryError, TelemetryResult};
use crate::info::{InfoValue, ParsedInfo, FAN_LEVEL_KEY};

/// timestamp layout used in the store, local time
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// column order of every stored row
pub const CSV_HEADER: &str = "timestamp,fan_lvl,ldr,temp,hum,x,y,z";

const FIELD_COUNT: usize = 8;

/// one reading as stored on disk and returned by `/data`
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct SensorRecord {
    /// server-assigned at ingestion (`YYYY-MM-DD HH:MM:SS`)
    pub timestamp: String,
    /// fan speed level
    pub fan_lvl: i64,
    /// light dependent resistor reading
    pub ldr: f64,
    /// temperature in celsius
    pub temp: f64,
    /// relative humidity
    pub hum: f64,
    /// accelerometer axes
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// current local time in store format
pub fn now_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

impl SensorRecord {
    /// build a record from a parsed info string
    ///
    /// every field is looked up by its device label; a missing label fails
    /// the whole record.
    pub fn from_parsed(timestamp: String, info: &ParsedInfo) -> TelemetryResult<Self> {
        let fan_lvl = match info.get(FAN_LEVEL_KEY) {
            Some(InfoValue::Int(v)) => v,
            _ => return Err(TelemetryError::MissingField(FAN_LEVEL_KEY)),
        };

        Ok(Self {
            timestamp,
            fan_lvl,
            ldr: float_field(info, "LDR")?,
            temp: float_field(info, "Temp")?,
            hum: float_field(info, "Hum")?,
            x: float_field(info, "X")?,
            y: float_field(info, "Y")?,
            z: float_field(info, "Z")?,
        })
    }

    /// render as one csv line (no trailing newline)
    pub fn to_csv_line(&self) -> String {
        // `{:?}` keeps the fractional part on whole numbers (512 -> 512.0)
        format!(
            "{},{},{:?},{:?},{:?},{:?},{:?},{:?}",
            self.timestamp, self.fan_lvl, self.ldr, self.temp, self.hum, self.x, self.y, self.z
        )
    }

    /// parse one csv data line; `line_no` is 1-based and only used for errors
    pub fn from_csv_line(line: &str, line_no: usize) -> TelemetryResult<Self> {
        let corrupt = |reason: String| TelemetryError::CorruptRow { line: line_no, reason };

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != FIELD_COUNT {
            return Err(corrupt(format!(
                "expected {} fields, found {}",
                FIELD_COUNT,
                fields.len()
            )));
        }

        let float = |idx: usize| {
            fields[idx]
                .parse::<f64>()
                .map_err(|e| corrupt(format!("column {}: {}", idx + 1, e)))
        };

        Ok(Self {
            timestamp: fields[0].to_string(),
            fan_lvl: fields[1]
                .parse::<i64>()
                .map_err(|e| corrupt(format!("column 2: {}", e)))?,
            ldr: float(2)?,
            temp: float(3)?,
            hum: float(4)?,
            x: float(5)?,
            y: float(6)?,
            z: float(7)?,
        })
    }
}

fn float_field(info: &ParsedInfo, key: &'static str) -> TelemetryResult<f64> {
    match info.get(key) {
        Some(InfoValue::Float(v)) => Ok(v),
        _ => Err(TelemetryError::MissingField(key)),
    }
}

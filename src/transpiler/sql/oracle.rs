use chrono::{NaiveDateTime, Timelike};

use crate::ast::{HostType, Value};

use super::super::traits::{SqlDialect, numeric_text, render_generic};

/// Longest numeric literal emitted for real/decimal values; longer text is cut.
const MAX_NUMERIC_TEXT: usize = 20;

/// Oracle dialect.
///
/// Oracle SQL has no boolean type, so booleans are stored as `'1'`/`'0'` character
/// flags. GUIDs are either raw hex (`compact_guid`) or a `VARCHAR2(37)` cast.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleDialect {
    pub compact_guid: bool,
}

impl OracleDialect {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compact_guid(compact_guid: bool) -> Self {
        Self { compact_guid }
    }

    fn render_timestamp(&self, dt: &NaiveDateTime) -> String {
        let has_millis = dt.nanosecond() / 1_000_000 != 0;
        let midnight = dt.num_seconds_from_midnight() == 0 && !has_millis;
        let (text, format) = if midnight {
            (dt.format("%Y-%m-%d").to_string(), "YYYY-MM-DD")
        } else if has_millis {
            (
                dt.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
                "YYYY-MM-DD HH24:MI:SS.FF3",
            )
        } else {
            (
                dt.format("%Y-%m-%d %H:%M:%S").to_string(),
                "YYYY-MM-DD HH24:MI:SS",
            )
        };
        format!(
            "TO_TIMESTAMP({}, {})",
            self.quote_string(&text),
            self.quote_string(format)
        )
    }
}

impl SqlDialect for OracleDialect {
    fn name(&self) -> &'static str {
        "oracle"
    }

    fn render_value(&self, value: &Value, declared: &HostType) -> String {
        match (value, declared.underlying()) {
            (Value::Null, _) => "NULL".to_string(),
            (Value::Guid(g), _) => {
                if self.compact_guid {
                    // Byte order of the host GUID layout (little-endian leading fields)
                    let hex: String =
                        g.to_bytes_le().iter().map(|b| format!("{:02X}", b)).collect();
                    self.quote_string(&hex)
                } else {
                    format!("CAST('{}' AS VARCHAR2(37))", g)
                }
            }
            (Value::DateTime(dt), _) => self.render_timestamp(dt),
            (Value::Bool(b), _) => self.quote_string(if *b { "1" } else { "0" }),
            // Legacy: real/decimal literals are cut to 20 characters and sent as strings.
            (v, HostType::Float32 | HostType::Float64 | HostType::Decimal) => {
                match numeric_text(v) {
                    Some(text) => {
                        let cut: String = text.chars().take(MAX_NUMERIC_TEXT).collect();
                        self.quote_string(&cut)
                    }
                    None => render_generic(self, value, declared),
                }
            }
            (Value::Float(_) | Value::Decimal(_), HostType::Null) => {
                self.render_value(value, &value.host_type())
            }
            _ => render_generic(self, value, declared),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    #[test]
    fn test_oracle_booleans_are_char_flags() {
        let d = OracleDialect::new();
        assert_eq!(d.true_literal(), "'1'");
        assert_eq!(d.true_expression(), "('1'='1')");
        assert_eq!(d.false_expression(), "('1'='0')");
    }

    #[test]
    fn test_oracle_decimal_truncation() {
        let d = OracleDialect::new();
        assert_eq!(d.render_value(&Value::Decimal(Decimal::ZERO), &HostType::Decimal), "'0'");
        let long: Decimal = "123456789.123456789012345".parse().unwrap();
        assert_eq!(
            d.render_value(&Value::Decimal(long), &HostType::Decimal),
            "'123456789.1234567890'"
        );
        assert_eq!(d.render_value(&Value::Float(1.5), &HostType::Float64), "'1.5'");
        assert_eq!(d.render_value(&Value::Int(42), &HostType::Int32), "42");
    }

    #[test]
    fn test_oracle_timestamps() {
        let d = OracleDialect::new();
        let day = NaiveDate::from_ymd_opt(1997, 7, 4).unwrap();
        assert_eq!(
            d.render_value(
                &Value::DateTime(day.and_hms_opt(0, 0, 0).unwrap()),
                &HostType::DateTime
            ),
            "TO_TIMESTAMP('1997-07-04', 'YYYY-MM-DD')"
        );
        assert_eq!(
            d.render_value(
                &Value::DateTime(day.and_hms_opt(13, 5, 9).unwrap()),
                &HostType::DateTime
            ),
            "TO_TIMESTAMP('1997-07-04 13:05:09', 'YYYY-MM-DD HH24:MI:SS')"
        );
        assert_eq!(
            d.render_value(
                &Value::DateTime(day.and_hms_milli_opt(13, 5, 9, 120).unwrap()),
                &HostType::DateTime
            ),
            "TO_TIMESTAMP('1997-07-04 13:05:09.120', 'YYYY-MM-DD HH24:MI:SS.FF3')"
        );
    }

    #[test]
    fn test_oracle_guids() {
        let g = Uuid::parse_str("00112233-4455-6677-8899-aabbccddeeff").unwrap();
        assert_eq!(
            OracleDialect::new().render_value(&Value::Guid(g), &HostType::Guid),
            "CAST('00112233-4455-6677-8899-aabbccddeeff' AS VARCHAR2(37))"
        );
        assert_eq!(
            OracleDialect::with_compact_guid(true).render_value(&Value::Guid(g), &HostType::Guid),
            "'33221100554477668899AABBCCDDEEFF'"
        );
    }
}

//! render::filters
//!
//! Custom formatting functions required by downstream templates.
//!
//! Registered on every [`crate::render::Renderer`] environment:
//!
//! - `ips_add_port` — joins a comma-separated IP list with a port
//! - `convert_time` — reformats times between strftime patterns and
//!   epoch timestamps
//!
//! # Template usage
//!
//! ```text
//! {{ self.NODE_IPS | ips_add_port(self.PORT, 'all') }}
//! {{ '%Y%m%d' | convert_time }}
//! {{ 'timestamp' | convert_time(self.STARTED_AT, '%Y-%m-%d %H:%M:%S') }}
//! ```

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use minijinja::{Environment, Error, ErrorKind, Value};

/// Literal output/input format token selecting epoch-seconds form.
const TIMESTAMP_TOKEN: &str = "timestamp";

/// Register all custom filters on an environment.
pub fn register(env: &mut Environment<'_>) {
    env.add_filter("ips_add_port", ips_add_port);
    env.add_filter("convert_time", convert_time);
}

/// Join a comma-separated IP list with a port.
///
/// `mode` `"one"` returns only the first `ip:port` pair; any other mode
/// returns all pairs comma-joined. An empty IP list or port short-circuits
/// to the empty string rather than producing dangling separators.
fn ips_add_port(ips: String, port: String, mode: String) -> String {
    if ips.is_empty() || port.is_empty() {
        return String::new();
    }
    let mut pairs = ips.split(',').map(|ip| format!("{ip}:{port}"));
    if mode == "one" {
        pairs.next().unwrap_or_default()
    } else {
        pairs.collect::<Vec<_>>().join(",")
    }
}

/// Reformat a time value.
///
/// `format` is the output form: a strftime pattern, or the literal
/// `timestamp` token for integer epoch seconds. `time` is the input value;
/// omitted means "now". `time_format` describes the input (strftime
/// pattern or `timestamp`); omitted means the input is already in output
/// form and is passed through unchanged.
fn convert_time(
    format: String,
    time: Option<String>,
    time_format: Option<String>,
) -> Result<Value, Error> {
    if format == TIMESTAMP_TOKEN {
        match time {
            None => Ok(Value::from(Local::now().timestamp())),
            Some(time) => match time_format.as_deref() {
                Some(TIMESTAMP_TOKEN) => Ok(Value::from(parse_epoch(&time)?)),
                Some(input_format) => {
                    let parsed = parse_local(&time, input_format)?;
                    Ok(Value::from(parsed.timestamp()))
                }
                None => Ok(Value::from(time)),
            },
        }
    } else {
        match time {
            None => Ok(Value::from(format_local(Local::now(), &format)?)),
            Some(time) => match time_format.as_deref() {
                Some(TIMESTAMP_TOKEN) => {
                    let epoch = parse_epoch(&time)?;
                    let parsed = Local.timestamp_opt(epoch, 0).earliest().ok_or_else(|| {
                        Error::new(
                            ErrorKind::InvalidOperation,
                            format!("epoch value out of range: {epoch}"),
                        )
                    })?;
                    Ok(Value::from(format_local(parsed, &format)?))
                }
                Some(input_format) => {
                    let parsed = parse_local(&time, input_format)?;
                    Ok(Value::from(format_local(parsed, &format)?))
                }
                None => Ok(Value::from(time)),
            },
        }
    }
}

fn parse_epoch(time: &str) -> Result<i64, Error> {
    time.trim().parse::<i64>().map_err(|_| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("not an epoch timestamp: {time}"),
        )
    })
}

/// Parse a wall-clock string in the local timezone.
fn parse_local(time: &str, input_format: &str) -> Result<DateTime<Local>, Error> {
    let naive = NaiveDateTime::parse_from_str(time, input_format).map_err(|e| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("cannot parse '{time}' with format '{input_format}': {e}"),
        )
    })?;
    naive.and_local_timezone(Local).earliest().ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("'{time}' does not exist in the local timezone"),
        )
    })
}

/// Format with a validated pattern; a bad pattern is an error, not a panic.
fn format_local(value: DateTime<Local>, format: &str) -> Result<String, Error> {
    let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(Error::new(
            ErrorKind::InvalidOperation,
            format!("invalid time format: {format}"),
        ));
    }
    Ok(value.format_with_items(items.iter()).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ips_add_port_joins_all_pairs() {
        let out = ips_add_port("10.0.0.1,10.0.0.2".into(), "80".into(), "all".into());
        assert_eq!(out, "10.0.0.1:80,10.0.0.2:80");
    }

    #[test]
    fn ips_add_port_one_takes_first() {
        let out = ips_add_port("10.0.0.1,10.0.0.2".into(), "80".into(), "one".into());
        assert_eq!(out, "10.0.0.1:80");
    }

    #[test]
    fn ips_add_port_empty_inputs_yield_empty() {
        assert_eq!(ips_add_port("".into(), "80".into(), "all".into()), "");
        assert_eq!(ips_add_port("10.0.0.1".into(), "".into(), "all".into()), "");
    }

    #[test]
    fn convert_time_reformats_between_patterns() {
        let out = convert_time(
            "%Y%m%d".into(),
            Some("2024-01-02 03:04:05".into()),
            Some("%Y-%m-%d %H:%M:%S".into()),
        )
        .unwrap();
        assert_eq!(out.to_string(), "20240102");
    }

    #[test]
    fn convert_time_round_trips_through_epoch() {
        let original = "2024-01-02 03:04:05";
        let epoch = convert_time(
            TIMESTAMP_TOKEN.into(),
            Some(original.into()),
            Some("%Y-%m-%d %H:%M:%S".into()),
        )
        .unwrap();
        let back = convert_time(
            "%Y-%m-%d %H:%M:%S".into(),
            Some(epoch.to_string()),
            Some(TIMESTAMP_TOKEN.into()),
        )
        .unwrap();
        assert_eq!(back.to_string(), original);
    }

    #[test]
    fn convert_time_epoch_input_passes_through_as_integer() {
        let out = convert_time(
            TIMESTAMP_TOKEN.into(),
            Some("1700000000".into()),
            Some(TIMESTAMP_TOKEN.into()),
        )
        .unwrap();
        assert_eq!(out.to_string(), "1700000000");
    }

    #[test]
    fn convert_time_without_input_format_passes_through() {
        let out = convert_time("%Y".into(), Some("already formatted".into()), None).unwrap();
        assert_eq!(out.to_string(), "already formatted");
    }

    #[test]
    fn convert_time_now_produces_a_value() {
        let epoch = convert_time(TIMESTAMP_TOKEN.into(), None, None).unwrap();
        assert!(epoch.to_string().parse::<i64>().unwrap() > 0);
        let formatted = convert_time("%Y".into(), None, None).unwrap();
        assert_eq!(formatted.to_string().len(), 4);
    }

    #[test]
    fn convert_time_rejects_bad_inputs() {
        assert!(convert_time(
            TIMESTAMP_TOKEN.into(),
            Some("not a number".into()),
            Some(TIMESTAMP_TOKEN.into()),
        )
        .is_err());
        assert!(convert_time(
            "%Y".into(),
            Some("garbage".into()),
            Some("%Y-%m-%d".into()),
        )
        .is_err());
        assert!(convert_time(
            "%Q_unknown_pattern".into(),
            Some("1700000000".into()),
            Some(TIMESTAMP_TOKEN.into()),
        )
        .is_err());
    }
}

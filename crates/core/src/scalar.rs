//! The wire-scalar lattice shared by every backend.
//!
//! The Backend Contract exchanges leaf values through the closed [`Scalar`]
//! enum. A backend declares which kinds it natively carries via
//! `supports(ScalarKind)`; kinds it rejects degrade to their canonical
//! textual form (see [`Scalar::canonical`]).

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use num_bigint::BigInt;

use crate::error::MapError;

/// A scalar wire value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    UInt64(u64),
    BigInt(BigInt),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    ObjectId(ObjectId),
    DateTime(DateTime),
    Timestamp(Timestamp),
    Regex(RegexValue),
}

/// Discriminant-only view of [`Scalar`], used for backend capability checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Null,
    Bool,
    Int32,
    Int64,
    UInt64,
    BigInt,
    Float,
    Str,
    Bytes,
    ObjectId,
    DateTime,
    Timestamp,
    Regex,
}

impl Scalar {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Null => ScalarKind::Null,
            Scalar::Bool(_) => ScalarKind::Bool,
            Scalar::Int32(_) => ScalarKind::Int32,
            Scalar::Int64(_) => ScalarKind::Int64,
            Scalar::UInt64(_) => ScalarKind::UInt64,
            Scalar::BigInt(_) => ScalarKind::BigInt,
            Scalar::Float(_) => ScalarKind::Float,
            Scalar::Str(_) => ScalarKind::Str,
            Scalar::Bytes(_) => ScalarKind::Bytes,
            Scalar::ObjectId(_) => ScalarKind::ObjectId,
            Scalar::DateTime(_) => ScalarKind::DateTime,
            Scalar::Timestamp(_) => ScalarKind::Timestamp,
            Scalar::Regex(_) => ScalarKind::Regex,
        }
    }

    /// Name of the active variant, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self.kind() {
            ScalarKind::Null => "null",
            ScalarKind::Bool => "bool",
            ScalarKind::Int32 => "int32",
            ScalarKind::Int64 => "int64",
            ScalarKind::UInt64 => "uint64",
            ScalarKind::BigInt => "bigint",
            ScalarKind::Float => "float",
            ScalarKind::Str => "string",
            ScalarKind::Bytes => "bytes",
            ScalarKind::ObjectId => "object-id",
            ScalarKind::DateTime => "date",
            ScalarKind::Timestamp => "timestamp",
            ScalarKind::Regex => "regex",
        }
    }

    /// Degrades the scalar to the canonical textual form used when a
    /// backend does not natively carry its kind.
    pub fn canonical(self) -> Scalar {
        match self {
            Scalar::BigInt(v) => Scalar::Str(v.to_string()),
            Scalar::Bytes(v) => Scalar::Str(BASE64.encode(&v)),
            Scalar::ObjectId(v) => Scalar::Str(v.to_hex()),
            Scalar::DateTime(v) => Scalar::Str(v.to_iso_string()),
            Scalar::Timestamp(v) => Scalar::Str(v.packed().to_string()),
            Scalar::Regex(v) => Scalar::Str(v.to_string()),
            other => other,
        }
    }

    pub fn into_bool(self) -> Result<bool, MapError> {
        match self {
            Scalar::Bool(v) => Ok(v),
            other => Err(MapError::TypeMismatch {
                expected: "bool",
                found: other.type_name().to_owned(),
            }),
        }
    }

    /// Converts any integer-bearing variant into `i64`, range-checked.
    pub fn into_i64(self) -> Result<i64, MapError> {
        match self {
            Scalar::Int32(v) => Ok(v as i64),
            Scalar::Int64(v) => Ok(v),
            Scalar::UInt64(v) => i64::try_from(v).map_err(|_| MapError::Overflow {
                value: v.to_string(),
                target: "i64",
            }),
            Scalar::BigInt(v) => i64::try_from(&v).map_err(|_| MapError::Overflow {
                value: v.to_string(),
                target: "i64",
            }),
            other => Err(MapError::TypeMismatch {
                expected: "integer",
                found: other.type_name().to_owned(),
            }),
        }
    }

    /// Converts any integer-bearing variant into `u64`, range-checked.
    pub fn into_u64(self) -> Result<u64, MapError> {
        match self {
            Scalar::Int32(v) => u64::try_from(v).map_err(|_| MapError::Overflow {
                value: v.to_string(),
                target: "u64",
            }),
            Scalar::Int64(v) => u64::try_from(v).map_err(|_| MapError::Overflow {
                value: v.to_string(),
                target: "u64",
            }),
            Scalar::UInt64(v) => Ok(v),
            Scalar::BigInt(v) => u64::try_from(&v).map_err(|_| MapError::Overflow {
                value: v.to_string(),
                target: "u64",
            }),
            other => Err(MapError::TypeMismatch {
                expected: "integer",
                found: other.type_name().to_owned(),
            }),
        }
    }

    /// Converts numeric variants into `f64`; integers widen losslessly up
    /// to 2^53 and approximately beyond, which mirrors the text model.
    pub fn into_f64(self) -> Result<f64, MapError> {
        match self {
            Scalar::Float(v) => Ok(v),
            Scalar::Int32(v) => Ok(v as f64),
            Scalar::Int64(v) => Ok(v as f64),
            Scalar::UInt64(v) => Ok(v as f64),
            other => Err(MapError::TypeMismatch {
                expected: "number",
                found: other.type_name().to_owned(),
            }),
        }
    }

    pub fn into_string(self) -> Result<String, MapError> {
        match self {
            Scalar::Str(v) => Ok(v),
            other => Err(MapError::TypeMismatch {
                expected: "string",
                found: other.type_name().to_owned(),
            }),
        }
    }

    pub fn into_bigint(self) -> Result<BigInt, MapError> {
        match self {
            Scalar::Int32(v) => Ok(BigInt::from(v)),
            Scalar::Int64(v) => Ok(BigInt::from(v)),
            Scalar::UInt64(v) => Ok(BigInt::from(v)),
            Scalar::BigInt(v) => Ok(v),
            Scalar::Str(s) => BigInt::parse_bytes(s.as_bytes(), 10).ok_or(MapError::TypeMismatch {
                expected: "integer digits",
                found: s,
            }),
            other => Err(MapError::TypeMismatch {
                expected: "integer",
                found: other.type_name().to_owned(),
            }),
        }
    }
}

/// Binary blob wrapper.
///
/// `Vec<u8>` maps as a homogeneous sequence of numbers; wrap it in `Bytes`
/// to carry it as a single blob scalar instead.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.0)
    }

    pub fn from_base64(text: &str) -> Result<Bytes, MapError> {
        BASE64
            .decode(text)
            .map(Bytes)
            .map_err(|e| MapError::Parse {
                message: format!("invalid base64: {e}"),
                line: 0,
            })
    }
}

/// A 12-byte globally orderable entity id.
///
/// Layout: 4-byte big-endian unix seconds, 3-byte generator id, 2-byte
/// process id, 3-byte big-endian monotonic counter. Byte order equals
/// semantic order, so `Ord` derives from the raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ObjectId(pub [u8; 12]);

static OBJECT_ID_COUNTER: OnceLock<AtomicU32> = OnceLock::new();
static OBJECT_ID_GENERATOR: OnceLock<[u8; 3]> = OnceLock::new();

impl ObjectId {
    /// Derives a fresh id from the current time. Ids generated within the
    /// same second stay distinguishable through the counter.
    pub fn generate() -> ObjectId {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0);
        Self::generate_at(secs)
    }

    /// Like [`ObjectId::generate`] with an explicit timestamp.
    pub fn generate_at(unix_seconds: u32) -> ObjectId {
        let generator = *OBJECT_ID_GENERATOR.get_or_init(rand::random);
        let counter = OBJECT_ID_COUNTER
            .get_or_init(|| AtomicU32::new(rand::random::<u32>() & 0x00ff_ffff))
            .fetch_add(1, Ordering::Relaxed)
            & 0x00ff_ffff;
        let pid = (std::process::id() & 0xffff) as u16;

        let mut bytes = [0u8; 12];
        bytes[0..4].copy_from_slice(&unix_seconds.to_be_bytes());
        bytes[4..7].copy_from_slice(&generator);
        bytes[7..9].copy_from_slice(&pid.to_be_bytes());
        bytes[9] = (counter >> 16) as u8;
        bytes[10] = (counter >> 8) as u8;
        bytes[11] = counter as u8;
        ObjectId(bytes)
    }

    /// Unix seconds embedded in the id.
    pub fn time(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    /// Whether all bytes are zero.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 12]
    }

    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(24);
        for b in self.0 {
            out.push_str(&format!("{b:02x}"));
        }
        out
    }

    pub fn from_hex(text: &str) -> Result<ObjectId, MapError> {
        let bytes = text.as_bytes();
        if bytes.len() != 24 {
            return Err(MapError::Parse {
                message: format!("object id must be 24 hex digits, got {}", bytes.len()),
                line: 0,
            });
        }
        let mut out = [0u8; 12];
        for (i, chunk) in bytes.chunks_exact(2).enumerate() {
            let hi = hex_digit(chunk[0])?;
            let lo = hex_digit(chunk[1])?;
            out[i] = (hi << 4) | lo;
        }
        Ok(ObjectId(out))
    }
}

fn hex_digit(b: u8) -> Result<u8, MapError> {
    match b {
        b'0'..=b'9' => Ok(b - b'0'),
        b'a'..=b'f' => Ok(b - b'a' + 10),
        b'A'..=b'F' => Ok(b - b'A' + 10),
        _ => Err(MapError::Parse {
            message: format!("invalid hex digit 0x{b:02x}"),
            line: 0,
        }),
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A point in time as milliseconds since the unix epoch (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DateTime(pub i64);

impl DateTime {
    pub fn now() -> DateTime {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        DateTime(millis)
    }

    /// ISO 8601 extended form in UTC, e.g. `2023-07-01T12:30:00.123Z`.
    /// The millisecond part is omitted when zero.
    pub fn to_iso_string(&self) -> String {
        let millis = self.0.rem_euclid(1000);
        let secs = (self.0 - millis).div_euclid(1000);
        let days = secs.div_euclid(86_400);
        let tod = secs.rem_euclid(86_400);
        let (year, month, day) = civil_from_days(days);
        let (h, m, s) = (tod / 3600, (tod % 3600) / 60, tod % 60);
        if millis == 0 {
            format!("{year:04}-{month:02}-{day:02}T{h:02}:{m:02}:{s:02}Z")
        } else {
            format!("{year:04}-{month:02}-{day:02}T{h:02}:{m:02}:{s:02}.{millis:03}Z")
        }
    }

    /// Parses the subset of ISO 8601 produced by [`DateTime::to_iso_string`]
    /// (UTC, optional fractional seconds, optional trailing `Z`).
    pub fn from_iso_string(text: &str) -> Result<DateTime, MapError> {
        let bad = |msg: &str| MapError::Parse {
            message: format!("invalid date `{text}`: {msg}"),
            line: 0,
        };
        let t = text.strip_suffix('Z').unwrap_or(text);
        let (date, time) = t.split_once('T').ok_or_else(|| bad("missing `T`"))?;
        let mut date_parts = date.splitn(3, '-');
        let year: i64 = parse_num(date_parts.next(), || bad("missing year"))?;
        let month: i64 = parse_num(date_parts.next(), || bad("missing month"))?;
        let day: i64 = parse_num(date_parts.next(), || bad("missing day"))?;
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return Err(bad("month or day out of range"));
        }
        let (hms, frac) = match time.split_once('.') {
            Some((hms, frac)) => (hms, Some(frac)),
            None => (time, None),
        };
        let mut time_parts = hms.splitn(3, ':');
        let hour: i64 = parse_num(time_parts.next(), || bad("missing hour"))?;
        let minute: i64 = parse_num(time_parts.next(), || bad("missing minute"))?;
        let second: i64 = parse_num(time_parts.next(), || bad("missing second"))?;
        if hour > 23 || minute > 59 || second > 60 {
            return Err(bad("time of day out of range"));
        }
        let millis: i64 = match frac {
            None => 0,
            Some(frac) => {
                // Take at most millisecond precision.
                let digits: String = frac.chars().take(3).collect();
                let scale = 10i64.pow(3 - digits.len() as u32);
                digits.parse::<i64>().map_err(|_| bad("bad fraction"))? * scale
            }
        };
        let days = days_from_civil(year, month as u32, day as u32);
        Ok(DateTime(
            ((days * 86_400 + hour * 3600 + minute * 60 + second) * 1000) + millis,
        ))
    }
}

fn parse_num(part: Option<&str>, err: impl Fn() -> MapError) -> Result<i64, MapError> {
    part.ok_or_else(&err)?.parse::<i64>().map_err(|_| err())
}

// Days <-> civil date conversions (proleptic Gregorian calendar).
fn civil_from_days(z: i64) -> (i64, u32, u32) {
    let z = z + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    (if m <= 2 { y + 1 } else { y }, m, d)
}

fn days_from_civil(y: i64, m: u32, d: u32) -> i64 {
    let y = if m <= 2 { y - 1 } else { y };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = y - era * 400;
    let mp = if m > 2 { m - 3 } else { m + 9 } as i64;
    let doy = (153 * mp + 2) / 5 + d as i64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

/// An opaque 64-bit timestamp split into seconds and an increment, as
/// carried by the binary wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp {
    pub time: u32,
    pub increment: u32,
}

impl Timestamp {
    /// Packs into a single u64, seconds in the high half.
    pub fn packed(&self) -> u64 {
        ((self.time as u64) << 32) | self.increment as u64
    }

    pub fn from_packed(packed: u64) -> Timestamp {
        Timestamp {
            time: (packed >> 32) as u32,
            increment: packed as u32,
        }
    }
}

/// A regular expression pattern plus its option flags.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RegexValue {
    pub pattern: String,
    pub options: String,
}

impl RegexValue {
    pub fn new(pattern: impl Into<String>, options: impl Into<String>) -> RegexValue {
        RegexValue {
            pattern: pattern.into(),
            options: options.into(),
        }
    }

    /// Parses the `/pattern/options` canonical text form.
    pub fn from_text(text: &str) -> Result<RegexValue, MapError> {
        let rest = text.strip_prefix('/').ok_or_else(|| MapError::Parse {
            message: format!("invalid regex literal `{text}`"),
            line: 0,
        })?;
        let split = rest.rfind('/').ok_or_else(|| MapError::Parse {
            message: format!("invalid regex literal `{text}`"),
            line: 0,
        })?;
        Ok(RegexValue {
            pattern: rest[..split].to_owned(),
            options: rest[split + 1..].to_owned(),
        })
    }
}

impl fmt::Display for RegexValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.pattern, self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_id_layout_and_order() {
        let a = ObjectId::generate_at(100);
        let b = ObjectId::generate_at(100);
        let c = ObjectId::generate_at(101);
        assert_eq!(a.time(), 100);
        assert_ne!(a, b);
        assert!(a < c && b < c);
    }

    #[test]
    fn object_id_hex_roundtrip() {
        let id = ObjectId([
            0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc, 0xde, 0xf0, 0x11, 0x22, 0x33, 0x44,
        ]);
        let hex = id.to_hex();
        assert_eq!(hex, "123456789abcdef011223344");
        assert_eq!(ObjectId::from_hex(&hex).unwrap(), id);
        assert!(ObjectId::from_hex("abc").is_err());
    }

    #[test]
    fn datetime_iso_roundtrip() {
        let dt = DateTime::from_iso_string("2023-07-01T12:30:00.123Z").unwrap();
        assert_eq!(dt.to_iso_string(), "2023-07-01T12:30:00.123Z");
        let epoch = DateTime(0);
        assert_eq!(epoch.to_iso_string(), "1970-01-01T00:00:00Z");
        assert_eq!(DateTime::from_iso_string(&epoch.to_iso_string()).unwrap(), epoch);
        // Pre-epoch dates use euclidean division, not truncation.
        let before = DateTime(-86_400_000);
        assert_eq!(before.to_iso_string(), "1969-12-31T00:00:00Z");
    }

    #[test]
    fn timestamp_packing() {
        let ts = Timestamp {
            time: 1_689_235_200,
            increment: 7,
        };
        assert_eq!(Timestamp::from_packed(ts.packed()), ts);
    }

    #[test]
    fn regex_text_form() {
        let re = RegexValue::new("a/b", "i");
        assert_eq!(re.to_string(), "/a/b/i");
        let parsed = RegexValue::from_text("/a/b/i").unwrap();
        assert_eq!(parsed.pattern, "a/b");
        assert_eq!(parsed.options, "i");
    }

    #[test]
    fn scalar_canonical_forms() {
        let big: BigInt = "99999999999999999999999999".parse().unwrap();
        assert_eq!(
            Scalar::BigInt(big).canonical(),
            Scalar::Str("99999999999999999999999999".to_owned())
        );
        assert_eq!(
            Scalar::Bytes(vec![1, 2, 3]).canonical(),
            Scalar::Str("AQID".to_owned())
        );
    }

    #[test]
    fn scalar_narrowing() {
        assert_eq!(Scalar::Int64(7).into_i64().unwrap(), 7);
        assert!(matches!(
            Scalar::UInt64(u64::MAX).into_i64(),
            Err(MapError::Overflow { .. })
        ));
        assert!(matches!(
            Scalar::Str("x".into()).into_i64(),
            Err(MapError::TypeMismatch { .. })
        ));
    }
}

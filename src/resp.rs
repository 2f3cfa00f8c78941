use bytes::{Buf, BytesMut};

/// A RESP2 value, extended with the double (`,`) frame.
#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    /// +OK\r\n
    SimpleString(String),
    /// -ERR message\r\n
    Error(String),
    /// :+1000\r\n
    Integer(i64),
    /// $6\r\nfoobar\r\n  or  $-1\r\n (null)
    BulkString(Option<Vec<u8>>),
    /// *2\r\n...  or  *-1\r\n (null, distinct from *0\r\n)
    Array(Option<Vec<RespValue>>),
    /// ,+3.14\r\n  with the special forms ,inf\r\n ,-inf\r\n ,nan\r\n
    Double(f64),
}

impl RespValue {
    pub fn ok() -> Self {
        RespValue::SimpleString("OK".to_string())
    }

    pub fn simple_string(s: impl Into<String>) -> Self {
        RespValue::SimpleString(s.into())
    }

    pub fn error(s: impl Into<String>) -> Self {
        RespValue::Error(s.into())
    }

    pub fn integer(n: i64) -> Self {
        RespValue::Integer(n)
    }

    pub fn bulk_string(data: impl Into<Vec<u8>>) -> Self {
        RespValue::BulkString(Some(data.into()))
    }

    pub fn null_bulk_string() -> Self {
        RespValue::BulkString(None)
    }

    pub fn array(items: Vec<RespValue>) -> Self {
        RespValue::Array(Some(items))
    }

    pub fn empty_array() -> Self {
        RespValue::Array(Some(Vec::new()))
    }

    pub fn null_array() -> Self {
        RespValue::Array(None)
    }

    /// Serialize this value to RESP bytes.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.write_to(&mut buf);
        buf
    }

    /// Write the canonical RESP encoding into the given buffer.
    pub fn write_to(&self, buf: &mut Vec<u8>) {
        match self {
            RespValue::SimpleString(s) => {
                buf.push(b'+');
                buf.extend_from_slice(s.as_bytes());
                buf.extend_from_slice(b"\r\n");
            }
            RespValue::Error(s) => {
                buf.push(b'-');
                buf.extend_from_slice(s.as_bytes());
                buf.extend_from_slice(b"\r\n");
            }
            RespValue::Integer(n) => {
                buf.push(b':');
                // Non-negative integers carry an explicit sign on the wire.
                if *n >= 0 {
                    buf.push(b'+');
                }
                buf.extend_from_slice(n.to_string().as_bytes());
                buf.extend_from_slice(b"\r\n");
            }
            RespValue::BulkString(None) => {
                buf.extend_from_slice(b"$-1\r\n");
            }
            RespValue::BulkString(Some(data)) => {
                buf.push(b'$');
                buf.extend_from_slice(data.len().to_string().as_bytes());
                buf.extend_from_slice(b"\r\n");
                buf.extend_from_slice(data);
                buf.extend_from_slice(b"\r\n");
            }
            RespValue::Array(None) => {
                buf.extend_from_slice(b"*-1\r\n");
            }
            RespValue::Array(Some(items)) => {
                buf.push(b'*');
                buf.extend_from_slice(items.len().to_string().as_bytes());
                buf.extend_from_slice(b"\r\n");
                for item in items {
                    item.write_to(buf);
                }
            }
            RespValue::Double(d) => {
                // Non-finite forms have fixed literals.
                if d.is_nan() {
                    buf.extend_from_slice(b",nan\r\n");
                } else if *d == f64::INFINITY {
                    buf.extend_from_slice(b",inf\r\n");
                } else if *d == f64::NEG_INFINITY {
                    buf.extend_from_slice(b",-inf\r\n");
                } else {
                    buf.push(b',');
                    // is_sign_positive keeps -0.0 from encoding as "+-0"
                    if d.is_sign_positive() {
                        buf.push(b'+');
                    }
                    // Display gives the shortest round-trip form.
                    buf.extend_from_slice(d.to_string().as_bytes());
                    buf.extend_from_slice(b"\r\n");
                }
            }
        }
    }

    /// Try to interpret this value as raw string bytes (for command parsing).
    pub fn as_str(&self) -> Option<&[u8]> {
        match self {
            RespValue::BulkString(Some(data)) => Some(data),
            RespValue::SimpleString(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Convert to a UTF-8 string, if this value carries string bytes.
    pub fn to_string_lossy(&self) -> Option<String> {
        self.as_str()
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }
}

/// Streaming RESP parser.
///
/// Handles partial reads — call `parse()` repeatedly as data arrives.
/// Returns `Ok(Some(value))` when a complete frame was consumed,
/// `Ok(None)` when more data is needed (the buffer is left untouched).
pub struct RespParser;

impl RespParser {
    /// Try to parse one complete RESP frame from the front of the buffer.
    pub fn parse(buf: &mut BytesMut) -> Result<Option<RespValue>, RespError> {
        if buf.is_empty() {
            return Ok(None);
        }

        match buf[0] {
            b'+' => Self::parse_line(buf).map(|r| r.map(RespValue::SimpleString)),
            b'-' => Self::parse_line(buf).map(|r| r.map(RespValue::Error)),
            b':' => Self::parse_integer(buf),
            b'$' => Self::parse_bulk_string(buf),
            b'*' => Self::parse_array(buf),
            b',' => Self::parse_double(buf),
            other => Err(RespError::UnknownTag(other)),
        }
    }

    /// Consume `<tag><text>\r\n` and return the text.
    fn parse_line(buf: &mut BytesMut) -> Result<Option<String>, RespError> {
        match find_crlf(buf, 1) {
            Some(end) => {
                let s = String::from_utf8_lossy(&buf[1..end]).into_owned();
                buf.advance(end + 2);
                Ok(Some(s))
            }
            None => Ok(None),
        }
    }

    fn parse_integer(buf: &mut BytesMut) -> Result<Option<RespValue>, RespError> {
        let end = match find_crlf(buf, 1) {
            Some(end) => end,
            None => return Ok(None),
        };
        let s = std::str::from_utf8(&buf[1..end])
            .map_err(|_| RespError::Malformed("invalid integer encoding".into()))?;
        let n: i64 = s
            .parse()
            .map_err(|_| RespError::Malformed(format!("invalid integer: {s}")))?;
        buf.advance(end + 2);
        Ok(Some(RespValue::Integer(n)))
    }

    fn parse_double(buf: &mut BytesMut) -> Result<Option<RespValue>, RespError> {
        let end = match find_crlf(buf, 1) {
            Some(end) => end,
            None => return Ok(None),
        };
        let s = std::str::from_utf8(&buf[1..end])
            .map_err(|_| RespError::Malformed("invalid double encoding".into()))?;
        let d = match s {
            "inf" | "+inf" => f64::INFINITY,
            "-inf" => f64::NEG_INFINITY,
            "nan" => f64::NAN,
            other => other
                .parse()
                .map_err(|_| RespError::Malformed(format!("invalid double: {other}")))?,
        };
        buf.advance(end + 2);
        Ok(Some(RespValue::Double(d)))
    }

    fn parse_bulk_string(buf: &mut BytesMut) -> Result<Option<RespValue>, RespError> {
        let crlf = match find_crlf(buf, 1) {
            Some(pos) => pos,
            None => return Ok(None),
        };

        let len = parse_length(&buf[1..crlf])?;

        if len == -1 {
            buf.advance(crlf + 2);
            return Ok(Some(RespValue::BulkString(None)));
        }
        if len < -1 || len > 512 * 1024 * 1024 {
            return Err(RespError::Malformed("invalid bulk length".into()));
        }

        let len = len as usize;
        // header + payload + trailing CRLF
        let total_needed = crlf + 2 + len + 2;
        if buf.len() < total_needed {
            return Ok(None);
        }

        if buf[crlf + 2 + len] != b'\r' || buf[crlf + 2 + len + 1] != b'\n' {
            return Err(RespError::Malformed(
                "missing trailing CRLF after bulk string".into(),
            ));
        }

        let data = buf[crlf + 2..crlf + 2 + len].to_vec();
        buf.advance(total_needed);
        Ok(Some(RespValue::BulkString(Some(data))))
    }

    fn parse_array(buf: &mut BytesMut) -> Result<Option<RespValue>, RespError> {
        let crlf = match find_crlf(buf, 1) {
            Some(pos) => pos,
            None => return Ok(None),
        };

        let len = parse_length(&buf[1..crlf])?;

        if len < 0 {
            // -1 is the null array; any other negative count degrades to it.
            buf.advance(crlf + 2);
            return Ok(Some(RespValue::Array(None)));
        }
        if len > 1024 * 1024 {
            return Err(RespError::Malformed("invalid multibulk length".into()));
        }

        let len = len as usize;

        // Elements parse recursively; if any is incomplete the whole frame
        // must be retried, so keep a copy to restore from.
        let saved = buf.clone();
        buf.advance(crlf + 2);

        let mut items = Vec::with_capacity(len);
        for _ in 0..len {
            match Self::parse(buf) {
                Ok(Some(val)) => items.push(val),
                Ok(None) => {
                    *buf = saved;
                    return Ok(None);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(Some(RespValue::Array(Some(items))))
    }
}

/// Parse a decimal length prefix (may be negative for null markers).
fn parse_length(raw: &[u8]) -> Result<i64, RespError> {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| RespError::Malformed("invalid length prefix".into()))
}

/// Find \r\n at or after `start`, returning the index of the \r.
fn find_crlf(buf: &[u8], start: usize) -> Option<usize> {
    if buf.len() < start + 2 {
        return None;
    }
    (start..buf.len() - 1).find(|&i| buf[i] == b'\r' && buf[i + 1] == b'\n')
}

#[derive(Debug, thiserror::Error)]
pub enum RespError {
    #[error("unknown frame tag '{}'", *.0 as char)]
    UnknownTag(u8),

    #[error("{0}")]
    Malformed(String),
}

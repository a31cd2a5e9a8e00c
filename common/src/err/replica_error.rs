use std::fmt::Display;
use std::num::ParseIntError;
use std::str::Utf8Error;
use std::string::FromUtf8Error;
use std::{fmt, io};

/// Error surface of the whole workspace. Decode failures, wire failures and
/// engine-level failures all travel through this one enum so the pump loop
/// can classify them in one place.
#[derive(Debug)]
pub enum ReError {
    //////////////////////
    // Common
    //////////////////////
    /// The parser had an error (recoverable)
    Error(String),

    /// Byte code is incomplete: the buffer ended before the declared width
    Incomplete(Needed),

    /// Malformed bytes at a known offset inside an event body
    DecodeError { offset: usize, reason: String },

    //////////////////////
    // IO / wire
    //////////////////////
    IoError(io::Error),
    Utf8Error(Utf8Error),
    FromUtf8Error(FromUtf8Error),
    ParseIntError(ParseIntError),

    ConnectionError(String),
    /// The admin connection died mid-command; retried up to 3 times
    BadConnection(String),
    Unauthorized(String),

    //////////////////////
    // Engine
    //////////////////////
    /// `binlog_format` is not ROW
    BinlogFormatMismatch(String),
    /// Table is filtered out by the include/exclude regex lists
    ExcludedTable(String),
    /// Schema fetch failed recently; negative-cached
    MissingTableMeta(String),
    TableNotExist(String),
    /// Non-nil status returned by a user handler
    HandlerError(String),
    /// The stream was closed while a read was pending
    StreamClosed,

    ConfigError(String),
}

impl Display for ReError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> fmt::Result {
        match self {
            ReError::Error(s) | ReError::ConnectionError(s) | ReError::BadConnection(s) => {
                write!(f, "{}", s)
            }
            ReError::Incomplete(n) => write!(f, "incomplete data: {}", n),
            ReError::DecodeError { offset, reason } => {
                write!(f, "decode error at offset {}: {}", offset, reason)
            }
            ReError::IoError(err) => write!(f, "{}", err),
            ReError::Utf8Error(err) => write!(f, "{}", err),
            ReError::FromUtf8Error(err) => write!(f, "{}", err),
            ReError::ParseIntError(err) => write!(f, "{}", err),
            ReError::Unauthorized(s) => write!(f, "unauthorized: {}", s),
            ReError::BinlogFormatMismatch(s) => {
                write!(f, "binlog must be ROW format, but {} now", s)
            }
            ReError::ExcludedTable(s) => write!(f, "excluded table meta: {}", s),
            ReError::MissingTableMeta(s) => write!(f, "missing table meta: {}", s),
            ReError::TableNotExist(s) => write!(f, "table not exist: {}", s),
            ReError::HandlerError(s) => write!(f, "handler error: {}", s),
            ReError::StreamClosed => write!(f, "stream closed"),
            ReError::ConfigError(s) => write!(f, "config error: {}", s),
        }
    }
}

impl std::error::Error for ReError {}

impl ReError {
    pub fn incomplete() -> Self {
        ReError::Incomplete(Needed::NoEnoughData)
    }

    pub fn decode(offset: usize, reason: impl Into<String>) -> Self {
        ReError::DecodeError {
            offset,
            reason: reason.into(),
        }
    }

    /// Transport-level failures are the ones the engine may retry through
    /// the reconnect state machine.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ReError::IoError(_)
                | ReError::ConnectionError(_)
                | ReError::BadConnection(_)
                | ReError::StreamClosed
        )
    }
}

impl From<io::Error> for ReError {
    fn from(error: io::Error) -> Self {
        ReError::IoError(error)
    }
}

impl From<Utf8Error> for ReError {
    fn from(error: Utf8Error) -> Self {
        ReError::Utf8Error(error)
    }
}

impl From<FromUtf8Error> for ReError {
    fn from(error: FromUtf8Error) -> Self {
        ReError::FromUtf8Error(error)
    }
}

impl From<ParseIntError> for ReError {
    fn from(error: ParseIntError) -> Self {
        ReError::ParseIntError(error)
    }
}

/// Contains information on needed data if a parser returned `Incomplete`
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Needed {
    /// Needs more data, but we do not know how much
    Unknown,

    NoEnoughData,

    InvalidUtf8,

    InvalidData(String),
}

impl Display for Needed {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> fmt::Result {
        match self {
            Needed::Unknown => write!(f, "Unknown"),
            Needed::NoEnoughData => write!(f, "NoEnoughData"),
            Needed::InvalidUtf8 => write!(f, "InvalidUtf8"),
            Needed::InvalidData(s) => write!(f, "{}", s),
        }
    }
}

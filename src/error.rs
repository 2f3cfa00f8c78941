/// Command- and store-level failures. Handlers never panic; every variant's
/// `Display` form is the exact error line sent back to the client.
#[derive(Debug, thiserror::Error)]
pub enum RillError {
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,

    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongArgCount(String),

    #[error("ERR value is not an integer or out of range")]
    NotInteger,

    #[error("ERR value is out of range, must be positive")]
    NegativeCount,

    #[error("ERR timeout is not a float or out of range")]
    BadTimeout,

    #[error("ERR syntax error")]
    SyntaxError,

    #[error("ERR unknown command '{0}', with args beginning with: {1}")]
    UnknownCommand(String, String),

    #[error("ERR Invalid stream ID specified as stream command argument")]
    InvalidStreamId,

    #[error("ERR The ID specified in XADD must be greater than 0-0")]
    StreamIdTooSmall,

    #[error("ERR The ID specified in XADD is equal or smaller than the target stream top item")]
    StreamIdNotMonotonic,

    #[error("ERR XREAD requires the STREAMS option")]
    MissingStreamsToken,

    #[error("ERR Protocol error: {0}")]
    Protocol(String),
}

pub type RillResult<T> = Result<T, RillError>;

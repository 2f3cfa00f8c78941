pub mod key;
pub mod list;
pub mod server_cmd;
pub mod stream;
pub mod string;

use crate::error::RillError;
use crate::resp::RespValue;
use crate::store::SharedStore;

/// Route a parsed command to its handler.
///
/// Names are canonicalized by ASCII upper-casing, so `get`, `Get` and `GET`
/// are the same command. The dispatcher itself is stateless; the shared
/// store is the only mutable state handlers touch.
pub async fn dispatch(cmd_name: &str, args: &[RespValue], store: &SharedStore) -> RespValue {
    let cmd_name = cmd_name.to_ascii_uppercase();
    match cmd_name.as_str() {
        // Connection
        "PING" => server_cmd::cmd_ping(args),
        "ECHO" => server_cmd::cmd_echo(args),

        // Strings
        "SET" => string::cmd_set(args, store).await,
        "GET" => string::cmd_get(args, store).await,

        // Keys
        "TYPE" => key::cmd_type(args, store).await,

        // Lists
        "LPUSH" => list::cmd_lpush(args, store).await,
        "RPUSH" => list::cmd_rpush(args, store).await,
        "LRANGE" => list::cmd_lrange(args, store).await,
        "LLEN" => list::cmd_llen(args, store).await,
        "LPOP" => list::cmd_lpop(args, store).await,
        "BLPOP" => list::cmd_blpop(args, store).await,

        // Streams
        "XADD" => stream::cmd_xadd(args, store).await,
        "XRANGE" => stream::cmd_xrange(args, store).await,
        "XREAD" => stream::cmd_xread(args, store).await,

        _ => {
            let args_preview: Vec<String> = args
                .iter()
                .take(3)
                .filter_map(|a| a.to_string_lossy())
                .map(|s| format!("'{s}'"))
                .collect();
            RespValue::error(
                RillError::UnknownCommand(cmd_name.clone(), args_preview.join(" ")).to_string(),
            )
        }
    }
}

/// Extract raw string bytes from an argument.
pub fn arg_to_bytes(arg: &RespValue) -> Option<&[u8]> {
    arg.as_str()
}

/// Extract a UTF-8 string from an argument.
pub fn arg_to_string(arg: &RespValue) -> Option<String> {
    arg.to_string_lossy()
}

/// Extract an i64 from an argument.
pub fn arg_to_i64(arg: &RespValue) -> Option<i64> {
    arg.to_string_lossy()?.parse().ok()
}

/// The canonical WRONGTYPE reply.
pub fn wrong_type_error() -> RespValue {
    RespValue::error(RillError::WrongType.to_string())
}

/// The canonical arity-failure reply.
pub fn wrong_arg_count(cmd: &str) -> RespValue {
    RespValue::error(RillError::WrongArgCount(cmd.to_string()).to_string())
}

use crate::command::{arg_to_bytes, wrong_arg_count};
use crate::resp::RespValue;

pub fn cmd_ping(args: &[RespValue]) -> RespValue {
    match args.len() {
        0 => RespValue::simple_string("PONG"),
        1 => match arg_to_bytes(&args[0]) {
            Some(msg) => RespValue::bulk_string(msg.to_vec()),
            None => RespValue::error("ERR invalid argument"),
        },
        _ => wrong_arg_count("ping"),
    }
}

pub fn cmd_echo(args: &[RespValue]) -> RespValue {
    if args.len() != 1 {
        return wrong_arg_count("echo");
    }
    match arg_to_bytes(&args[0]) {
        Some(msg) => RespValue::bulk_string(msg.to_vec()),
        None => RespValue::error("ERR invalid argument"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping_bare_and_with_message() {
        assert_eq!(cmd_ping(&[]), RespValue::simple_string("PONG"));
        assert_eq!(
            cmd_ping(&[RespValue::bulk_string(b"hi".to_vec())]),
            RespValue::bulk_string(b"hi".to_vec())
        );
        assert!(matches!(
            cmd_ping(&[
                RespValue::bulk_string(b"a".to_vec()),
                RespValue::bulk_string(b"b".to_vec())
            ]),
            RespValue::Error(_)
        ));
    }

    #[test]
    fn test_echo_requires_one_argument() {
        assert_eq!(
            cmd_echo(&[RespValue::bulk_string(b"hey".to_vec())]),
            RespValue::bulk_string(b"hey".to_vec())
        );
        assert!(matches!(cmd_echo(&[]), RespValue::Error(_)));
    }
}

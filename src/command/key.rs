use crate::command::{arg_to_string, wrong_arg_count};
use crate::resp::RespValue;
use crate::store::SharedStore;

/// TYPE key — "string" | "list" | "stream" | "none".
pub async fn cmd_type(args: &[RespValue], store: &SharedStore) -> RespValue {
    if args.len() != 1 {
        return wrong_arg_count("type");
    }
    let key = match arg_to_string(&args[0]) {
        Some(k) => k,
        None => return RespValue::error("ERR invalid key"),
    };

    let mut store = store.write().await;
    match store.get(&key) {
        Some(entry) => RespValue::simple_string(entry.value.type_name()),
        None => RespValue::simple_string("none"),
    }
}

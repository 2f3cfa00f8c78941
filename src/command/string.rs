use crate::command::{arg_to_bytes, arg_to_i64, arg_to_string, wrong_arg_count};
use crate::error::RillError;
use crate::resp::RespValue;
use crate::store::SharedStore;
use crate::store::entry::{Entry, now_millis};
use crate::types::Value;

/// SET key value [EX seconds | PX milliseconds]
pub async fn cmd_set(args: &[RespValue], store: &SharedStore) -> RespValue {
    if args.len() != 2 && args.len() != 4 {
        return wrong_arg_count("set");
    }
    let key = match arg_to_string(&args[0]) {
        Some(k) if !k.is_empty() => k,
        _ => return RespValue::error("ERR invalid key"),
    };
    let value = match arg_to_bytes(&args[1]) {
        Some(v) => v.to_vec(),
        None => return RespValue::error("ERR invalid value"),
    };

    let mut expires_at = None;
    if args.len() == 4 {
        let opt = match arg_to_string(&args[2]) {
            Some(s) => s.to_ascii_uppercase(),
            None => return RespValue::error(RillError::SyntaxError.to_string()),
        };
        let num = match arg_to_i64(&args[3]) {
            Some(n) if n >= 0 => n as u64,
            _ => return RespValue::error(RillError::NotInteger.to_string()),
        };
        expires_at = Some(match opt.as_str() {
            "EX" => now_millis() + num * 1000,
            "PX" => now_millis() + num,
            _ => return RespValue::error(RillError::SyntaxError.to_string()),
        });
    }

    let mut store = store.write().await;
    let entry = match expires_at {
        Some(at) => Entry::with_expiry(Value::String(value), at),
        None => Entry::new(Value::String(value)),
    };
    store.set(key, entry);

    RespValue::ok()
}

/// GET key — null bulk for a missing, expired, or non-string key.
pub async fn cmd_get(args: &[RespValue], store: &SharedStore) -> RespValue {
    if args.len() != 1 {
        return wrong_arg_count("get");
    }
    let key = match arg_to_string(&args[0]) {
        Some(k) if !k.is_empty() => k,
        _ => return RespValue::error("ERR invalid key"),
    };

    let mut store = store.write().await;
    match store.get(&key) {
        Some(entry) => match &entry.value {
            Value::String(data) => RespValue::bulk_string(data.clone()),
            _ => RespValue::null_bulk_string(),
        },
        None => RespValue::null_bulk_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    fn shared() -> SharedStore {
        Arc::new(RwLock::new(Store::new()))
    }

    fn bulk(s: &str) -> RespValue {
        RespValue::bulk_string(s.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let store = shared();
        let reply = cmd_set(&[bulk("foo"), bulk("bar")], &store).await;
        assert_eq!(reply, RespValue::ok());
        let reply = cmd_get(&[bulk("foo")], &store).await;
        assert_eq!(reply, bulk("bar"));
    }

    #[tokio::test]
    async fn test_get_missing_key_is_null() {
        let store = shared();
        assert_eq!(
            cmd_get(&[bulk("nope")], &store).await,
            RespValue::null_bulk_string()
        );
    }

    #[tokio::test]
    async fn test_set_px_expires() {
        let store = shared();
        let reply = cmd_set(&[bulk("k"), bulk("v"), bulk("PX"), bulk("30")], &store).await;
        assert_eq!(reply, RespValue::ok());
        assert_eq!(cmd_get(&[bulk("k")], &store).await, bulk("v"));

        tokio::time::sleep(std::time::Duration::from_millis(60)).await;
        assert_eq!(
            cmd_get(&[bulk("k")], &store).await,
            RespValue::null_bulk_string()
        );
    }

    #[tokio::test]
    async fn test_set_rejects_bad_expiry() {
        let store = shared();
        let reply = cmd_set(&[bulk("k"), bulk("v"), bulk("EX"), bulk("soon")], &store).await;
        assert_eq!(
            reply,
            RespValue::error("ERR value is not an integer or out of range")
        );
        let reply = cmd_set(&[bulk("k"), bulk("v"), bulk("EX"), bulk("-1")], &store).await;
        assert_eq!(
            reply,
            RespValue::error("ERR value is not an integer or out of range")
        );
    }

    #[tokio::test]
    async fn test_set_rejects_unknown_option() {
        let store = shared();
        let reply = cmd_set(&[bulk("k"), bulk("v"), bulk("ZZ"), bulk("5")], &store).await;
        assert_eq!(reply, RespValue::error("ERR syntax error"));
    }

    #[tokio::test]
    async fn test_get_on_list_kind_is_null() {
        let store = shared();
        {
            let mut guard = store.write().await;
            guard.list_push("l", vec![b"a".to_vec()], false).unwrap();
        }
        assert_eq!(
            cmd_get(&[bulk("l")], &store).await,
            RespValue::null_bulk_string()
        );
    }
}

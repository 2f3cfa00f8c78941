use crate::command::{arg_to_bytes, arg_to_i64, arg_to_string, wrong_arg_count, wrong_type_error};
use crate::error::RillError;
use crate::range::normalize_range;
use crate::resp::RespValue;
use crate::store::SharedStore;
use std::time::Duration;

/// Parse BLPOP's trailing timeout: decimal seconds, fractions allowed,
/// `0` meaning block until delivery.
fn parse_blocking_timeout(arg: &RespValue) -> Result<f64, RespValue> {
    match arg.to_string_lossy().and_then(|s| s.parse::<f64>().ok()) {
        Some(t) if t.is_finite() && t >= 0.0 => Ok(t),
        _ => Err(RespValue::error(RillError::BadTimeout.to_string())),
    }
}

fn collect_values(args: &[RespValue]) -> Option<Vec<Vec<u8>>> {
    args.iter()
        .map(|a| arg_to_bytes(a).map(<[u8]>::to_vec))
        .collect()
}

async fn push_common(args: &[RespValue], store: &SharedStore, at_head: bool, name: &str) -> RespValue {
    if args.len() < 2 {
        return wrong_arg_count(name);
    }
    let key = match arg_to_string(&args[0]) {
        Some(k) => k,
        None => return RespValue::error("ERR invalid key"),
    };
    let values = match collect_values(&args[1..]) {
        Some(v) => v,
        None => return RespValue::error("ERR invalid value"),
    };

    let mut store = store.write().await;
    match store.list_push(&key, values, at_head) {
        Ok(len) => RespValue::integer(len),
        Err(e) => RespValue::error(e.to_string()),
    }
}

pub async fn cmd_lpush(args: &[RespValue], store: &SharedStore) -> RespValue {
    push_common(args, store, true, "lpush").await
}

pub async fn cmd_rpush(args: &[RespValue], store: &SharedStore) -> RespValue {
    push_common(args, store, false, "rpush").await
}

/// LRANGE key start stop — inclusive window, negative indices from the end.
pub async fn cmd_lrange(args: &[RespValue], store: &SharedStore) -> RespValue {
    if args.len() != 3 {
        return wrong_arg_count("lrange");
    }
    let key = match arg_to_string(&args[0]) {
        Some(k) => k,
        None => return RespValue::error("ERR invalid key"),
    };
    let (start, stop) = match (arg_to_i64(&args[1]), arg_to_i64(&args[2])) {
        (Some(a), Some(b)) => (a, b),
        _ => return RespValue::error(RillError::NotInteger.to_string()),
    };

    let mut store = store.write().await;
    let list = match store.get(&key) {
        Some(entry) => match entry.value.as_list() {
            Some(list) => list,
            None => return wrong_type_error(),
        },
        None => return RespValue::empty_array(),
    };

    let (from, to) = normalize_range(start, stop, list.len());
    let items = list
        .slice(from, to)
        .into_iter()
        .map(|v| RespValue::bulk_string(v.clone()))
        .collect();
    RespValue::array(items)
}

/// LLEN key — the only handler that settles for the read lock.
pub async fn cmd_llen(args: &[RespValue], store: &SharedStore) -> RespValue {
    if args.len() != 1 {
        return wrong_arg_count("llen");
    }
    let key = match arg_to_string(&args[0]) {
        Some(k) => k,
        None => return RespValue::error("ERR invalid key"),
    };

    let store = store.read().await;
    match store.peek(&key) {
        Some(entry) => match entry.value.as_list() {
            Some(list) => RespValue::integer(list.len() as i64),
            None => wrong_type_error(),
        },
        None => RespValue::integer(0),
    }
}

/// LPOP key [count]
pub async fn cmd_lpop(args: &[RespValue], store: &SharedStore) -> RespValue {
    if args.is_empty() || args.len() > 2 {
        return wrong_arg_count("lpop");
    }
    let key = match arg_to_string(&args[0]) {
        Some(k) => k,
        None => return RespValue::error("ERR invalid key"),
    };

    let count = if args.len() == 2 {
        match arg_to_i64(&args[1]) {
            Some(n) if n >= 0 => Some(n as usize),
            Some(_) => return RespValue::error(RillError::NegativeCount.to_string()),
            None => return RespValue::error(RillError::NotInteger.to_string()),
        }
    } else {
        None
    };

    let mut store = store.write().await;
    let reply;
    let drained;
    {
        let Some(entry) = store.get_mut(&key) else {
            return RespValue::null_bulk_string();
        };
        let Some(list) = entry.value.as_list_mut() else {
            return wrong_type_error();
        };
        if list.is_empty() {
            reply = RespValue::null_bulk_string();
        } else {
            reply = match count {
                None => match list.pop_front() {
                    Some(value) => RespValue::bulk_string(value),
                    None => RespValue::null_bulk_string(),
                },
                Some(count) => {
                    let take = count.min(list.len());
                    let mut popped = Vec::with_capacity(take);
                    for _ in 0..take {
                        if let Some(value) = list.pop_front() {
                            popped.push(RespValue::bulk_string(value));
                        }
                    }
                    RespValue::array(popped)
                }
            };
        }
        drained = list.is_empty();
    }

    // The last pop takes the key with it.
    if drained {
        store.remove(&key);
    }

    reply
}

/// BLPOP key [key ...] timeout
///
/// Scans the keys under the write lock first; if nothing is poppable,
/// parks a single-slot delivery endpoint on every key and waits for a
/// pusher or the timer. Cleanup always unregisters from every queue.
pub async fn cmd_blpop(args: &[RespValue], store: &SharedStore) -> RespValue {
    if args.len() < 2 {
        return wrong_arg_count("blpop");
    }

    let keys: Option<Vec<String>> = args[..args.len() - 1].iter().map(arg_to_string).collect();
    let Some(keys) = keys else {
        return RespValue::error("ERR invalid key");
    };
    let timeout = match parse_blocking_timeout(&args[args.len() - 1]) {
        Ok(t) => t,
        Err(reply) => return reply,
    };

    let (waiter_id, mut slot) = {
        let mut store = store.write().await;
        match store.blocked_pop_scan(&keys) {
            Ok(Some((key, value))) => return pop_reply(key, value),
            Ok(None) => {}
            Err(e) => return RespValue::error(e.to_string()),
        }
        store.waiters.register(&keys)
    };

    let delivery = if timeout > 0.0 {
        tokio::select! {
            d = slot.recv() => d,
            _ = tokio::time::sleep(Duration::from_secs_f64(timeout)) => None,
        }
    } else {
        slot.recv().await
    };

    {
        let mut store = store.write().await;
        store.waiters.unregister(&keys, waiter_id);
    }

    // A pusher can fill the slot between the timer firing and the
    // unregistration above; that value belongs to this client.
    let delivery = delivery.or_else(|| slot.try_recv().ok());

    match delivery {
        Some((key, value)) => pop_reply(key, value),
        None => RespValue::null_array(),
    }
}

fn pop_reply(key: String, value: Vec<u8>) -> RespValue {
    RespValue::array(vec![
        RespValue::bulk_string(key.into_bytes()),
        RespValue::bulk_string(value),
    ])
}

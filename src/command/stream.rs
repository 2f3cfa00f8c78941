use crate::command::{arg_to_bytes, arg_to_string, wrong_arg_count, wrong_type_error};
use crate::error::{RillError, RillResult};
use crate::resp::RespValue;
use crate::store::SharedStore;
use crate::store::entry::Entry;
use crate::types::Value;
use crate::types::stream::{Stream, StreamEntry, StreamId, parse_range_id};

fn entry_reply(entry: &StreamEntry) -> RespValue {
    let fields = entry
        .fields
        .iter()
        .map(|f| RespValue::bulk_string(f.clone()))
        .collect();
    RespValue::array(vec![
        RespValue::bulk_string(entry.id.to_string()),
        RespValue::array(fields),
    ])
}

fn append_entry(stream: &mut Stream, token: &str, fields: Vec<Vec<u8>>) -> RillResult<StreamId> {
    let id = stream.resolve_entry_id(token)?;
    stream.validate_and_commit_id(id)?;
    stream.append(id, fields);
    Ok(id)
}

/// XADD key id field value [field value ...]
pub async fn cmd_xadd(args: &[RespValue], store: &SharedStore) -> RespValue {
    // key + id + at least one field/value pair, pairs complete
    if args.len() < 4 || args.len() % 2 != 0 {
        return wrong_arg_count("xadd");
    }
    let key = match arg_to_string(&args[0]) {
        Some(k) => k,
        None => return RespValue::error("ERR invalid key"),
    };
    let id_token = match arg_to_string(&args[1]) {
        Some(t) => t,
        None => return RespValue::error(RillError::InvalidStreamId.to_string()),
    };
    let fields: Option<Vec<Vec<u8>>> = args[2..]
        .iter()
        .map(|a| arg_to_bytes(a).map(<[u8]>::to_vec))
        .collect();
    let Some(fields) = fields else {
        return RespValue::error("ERR invalid field or value");
    };

    let mut store = store.write().await;
    match store.get_mut(&key) {
        Some(entry) => {
            let Some(stream) = entry.value.as_stream_mut() else {
                return wrong_type_error();
            };
            match append_entry(stream, &id_token, fields) {
                Ok(id) => RespValue::bulk_string(id.to_string()),
                Err(e) => RespValue::error(e.to_string()),
            }
        }
        None => {
            // First write creates the stream — but only if the ID passes.
            let mut stream = Stream::new();
            match append_entry(&mut stream, &id_token, fields) {
                Ok(id) => {
                    store.set(key, Entry::new(Value::Stream(stream)));
                    RespValue::bulk_string(id.to_string())
                }
                Err(e) => RespValue::error(e.to_string()),
            }
        }
    }
}

/// XRANGE key start end — inclusive on both bounds.
pub async fn cmd_xrange(args: &[RespValue], store: &SharedStore) -> RespValue {
    if args.len() != 3 {
        return wrong_arg_count("xrange");
    }
    let key = match arg_to_string(&args[0]) {
        Some(k) => k,
        None => return RespValue::error("ERR invalid key"),
    };
    let (start_token, end_token) = match (arg_to_string(&args[1]), arg_to_string(&args[2])) {
        (Some(s), Some(e)) => (s, e),
        _ => return RespValue::error(RillError::InvalidStreamId.to_string()),
    };
    let start = match parse_range_id(&start_token, true) {
        Ok(id) => id,
        Err(e) => return RespValue::error(e.to_string()),
    };
    let end = match parse_range_id(&end_token, false) {
        Ok(id) => id,
        Err(e) => return RespValue::error(e.to_string()),
    };

    let mut store = store.write().await;
    let stream = match store.get(&key) {
        Some(entry) => match entry.value.as_stream() {
            Some(stream) => stream,
            None => return wrong_type_error(),
        },
        None => return RespValue::empty_array(),
    };

    let items = stream.range(start, end).iter().map(entry_reply).collect();
    RespValue::array(items)
}

/// XREAD STREAMS key id — exclusive lower bound, single-key form.
pub async fn cmd_xread(args: &[RespValue], store: &SharedStore) -> RespValue {
    if args.len() != 3 {
        return wrong_arg_count("xread");
    }
    // The STREAMS token is matched byte-for-byte.
    if arg_to_bytes(&args[0]) != Some(b"STREAMS".as_slice()) {
        return RespValue::error(RillError::MissingStreamsToken.to_string());
    }
    let key = match arg_to_string(&args[1]) {
        Some(k) => k,
        None => return RespValue::error("ERR invalid key"),
    };
    let after = match arg_to_string(&args[2]).as_deref().map(|t| parse_range_id(t, true)) {
        Some(Ok(id)) => id,
        _ => return RespValue::error(RillError::InvalidStreamId.to_string()),
    };

    let mut store = store.write().await;
    let stream = match store.get(&key) {
        Some(entry) => match entry.value.as_stream() {
            Some(stream) => stream,
            None => return wrong_type_error(),
        },
        None => return RespValue::empty_array(),
    };

    let fresh = stream.entries_after(after);
    if fresh.is_empty() {
        return RespValue::null_array();
    }

    let entries = fresh.iter().map(entry_reply).collect();
    RespValue::array(vec![RespValue::array(vec![
        RespValue::bulk_string(key.into_bytes()),
        RespValue::array(entries),
    ])])
}

use reef_wire::Value;

use super::parse_numbers::{parse_int, parse_score};
use super::state::{DispatchState, StoredValue};
use super::{bad_arg, not_found, CommandFrame};
use crate::zset::SortedSet;

/// Resolves the sorted set stored at `key`.
///
/// `Ok(None)` means the key is absent (and `create` was false); `Err` carries the
/// reply for a type mismatch.
fn open_set<'a>(
    state: &'a mut DispatchState,
    key: &[u8],
    create: bool,
) -> Result<Option<&'a mut SortedSet>, Value> {
    if create && state.keyspace.lookup(key).is_none() {
        state
            .keyspace
            .insert(key.to_vec(), StoredValue::SortedSet(SortedSet::new()));
    }
    match state.keyspace.lookup(key) {
        None => Ok(None),
        Some(entry) => match entry.value_mut() {
            StoredValue::SortedSet(set) => Ok(Some(set)),
            StoredValue::Bytes(_) => Err(bad_arg("expect zset value")),
        },
    }
}

pub(super) fn handle_zadd(frame: &CommandFrame, state: &mut DispatchState) -> Value {
    let key = &frame.args[0];
    let Some(score) = parse_score(&frame.args[1]) else {
        return bad_arg("expect float");
    };
    let name = &frame.args[2];

    let set = match open_set(state, key, true) {
        Ok(Some(set)) => set,
        Ok(None) => return bad_arg("expect zset value"),
        Err(reply) => return reply,
    };
    if set.insert(name, score) {
        Value::Str(b"added new entry".to_vec())
    } else {
        Value::Str(b"entry updated".to_vec())
    }
}

pub(super) fn handle_zrem(frame: &CommandFrame, state: &mut DispatchState) -> Value {
    let key = &frame.args[0];
    let name = &frame.args[1];
    let set = match open_set(state, key, false) {
        Ok(Some(set)) => set,
        Ok(None) => return Value::Int(1),
        Err(reply) => return reply,
    };
    if set.remove(name) {
        Value::Int(0)
    } else {
        Value::Int(1)
    }
}

pub(super) fn handle_zrank(frame: &CommandFrame, state: &mut DispatchState) -> Value {
    let key = &frame.args[0];
    let name = &frame.args[1];
    let set = match open_set(state, key, false) {
        Ok(Some(set)) => set,
        Ok(None) => return Value::Nil,
        Err(reply) => return reply,
    };
    match set.lookup(name) {
        Some(member) => Value::Int(set.rank(member) as i64),
        None => Value::Nil,
    }
}

pub(super) fn handle_zscore(frame: &CommandFrame, state: &mut DispatchState) -> Value {
    let key = &frame.args[0];
    let name = &frame.args[1];
    let set = match open_set(state, key, false) {
        Ok(Some(set)) => set,
        Ok(None) => return Value::Nil,
        Err(reply) => return reply,
    };
    match set.lookup(name) {
        Some(member) => Value::Dbl(set.node(member).score()),
        None => Value::Nil,
    }
}

pub(super) fn handle_zquery(frame: &CommandFrame, state: &mut DispatchState) -> Value {
    let key = &frame.args[0];
    let Some(score) = parse_score(&frame.args[1]) else {
        return bad_arg("expect float");
    };
    let name = &frame.args[2];
    let Some(offset) = parse_int(&frame.args[3]) else {
        return bad_arg("expect int");
    };
    let Some(limit) = parse_int(&frame.args[4]) else {
        return bad_arg("expect int");
    };
    if limit <= 0 {
        return bad_arg("expect a positive limit");
    }

    let set = match open_set(state, key, false) {
        Ok(Some(set)) => set,
        Ok(None) => return not_found("seek past the end"),
        Err(reply) => return reply,
    };
    let Some(start) = set.seek_ge(score, name) else {
        return not_found("seek past the end");
    };
    let Some(mut cursor) = set.offset_from(start, offset) else {
        return not_found("seek past the end");
    };

    let mut items = Vec::new();
    for _ in 0..limit {
        let node = set.node(cursor);
        items.push(Value::Str(node.name().to_vec()));
        items.push(Value::Dbl(node.score()));
        match set.offset_from(cursor, 1) {
            Some(next) => cursor = next,
            None => break,
        }
    }
    Value::Arr(items)
}

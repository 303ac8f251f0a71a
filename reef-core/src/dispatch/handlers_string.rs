use reef_wire::Value;

use super::state::{DispatchState, StoredValue};
use super::{bad_arg, CommandFrame};

pub(super) fn handle_get(frame: &CommandFrame, state: &mut DispatchState) -> Value {
    let key = &frame.args[0];
    match state.keyspace.lookup(key) {
        None => Value::Nil,
        Some(entry) => match entry.value() {
            StoredValue::Bytes(bytes) => Value::Str(bytes.clone()),
            StoredValue::SortedSet(_) => bad_arg("expect string value"),
        },
    }
}

pub(super) fn handle_set(frame: &CommandFrame, state: &mut DispatchState) -> Value {
    let key = &frame.args[0];
    let value = frame.args[1].clone();
    match state.keyspace.lookup(key) {
        Some(entry) => match entry.value_mut() {
            StoredValue::Bytes(current) => {
                let previous = std::mem::replace(current, value);
                Value::Str(previous)
            }
            StoredValue::SortedSet(_) => bad_arg("expect string value"),
        },
        None => {
            state.keyspace.insert(key.clone(), StoredValue::Bytes(value));
            Value::Nil
        }
    }
}

pub(super) fn handle_del(frame: &CommandFrame, state: &mut DispatchState) -> Value {
    let key = &frame.args[0];
    match state.keyspace.remove(key) {
        None => Value::Nil,
        Some(entry) => match entry.into_value() {
            StoredValue::Bytes(bytes) => Value::Str(bytes),
            // Dropping the entry reclaims the whole set; there is no string-shaped
            // previous value to report.
            StoredValue::SortedSet(_) => Value::Nil,
        },
    }
}

pub(super) fn handle_keys(_frame: &CommandFrame, state: &mut DispatchState) -> Value {
    let mut keys = Vec::with_capacity(state.keyspace.len());
    state
        .keyspace
        .for_each_key(|key| keys.push(Value::Str(key.to_vec())));
    Value::Arr(keys)
}

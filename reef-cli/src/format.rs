//! Pretty-printer for decoded response values.

use reef_wire::Value;

/// Renders a response value in the client's line-oriented display format.
#[must_use]
pub fn render(value: &Value) -> String {
    let mut out = String::new();
    render_into(value, 0, &mut out);
    out
}

fn render_into(value: &Value, depth: usize, out: &mut String) {
    let pad = "\t".repeat(depth);
    match value {
        Value::Nil => {
            out.push_str(&pad);
            out.push_str("(nil)");
        }
        Value::Err(code, message) => {
            out.push_str(&pad);
            out.push_str(&format!("(err) {} {message}", code.code()));
        }
        Value::Str(bytes) => {
            out.push_str(&pad);
            out.push_str(&format!("(str) {}", String::from_utf8_lossy(bytes)));
        }
        Value::Int(value) => {
            out.push_str(&pad);
            out.push_str(&format!("(int) {value}"));
        }
        Value::Dbl(value) => {
            out.push_str(&pad);
            out.push_str(&format!("(dbl) {value}"));
        }
        Value::Arr(items) => {
            out.push_str(&pad);
            out.push_str("(arr) [");
            for item in items {
                out.push('\n');
                render_into(item, depth + 1, out);
            }
            out.push('\n');
            out.push_str(&pad);
            out.push(']');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::render;
    use googletest::prelude::*;
    use reef_wire::{ErrCode, Value};
    use rstest::rstest;

    #[rstest]
    #[case(Value::Nil, "(nil)")]
    #[case(Value::Str(b"bar".to_vec()), "(str) bar")]
    #[case(Value::Int(2), "(int) 2")]
    #[case(Value::Dbl(1.5), "(dbl) 1.5")]
    #[case(Value::Err(ErrCode::NotFound, "past the end".to_owned()), "(err) 3 past the end")]
    fn scalars_render_on_one_line(#[case] value: Value, #[case] expected: &str) {
        assert_that!(render(&value), eq(expected));
    }

    #[rstest]
    fn arrays_render_nested_items_indented() {
        let value = Value::Arr(vec![
            Value::Str(b"b".to_vec()),
            Value::Dbl(2.0),
        ]);
        assert_that!(render(&value), eq("(arr) [\n\t(str) b\n\t(dbl) 2\n]"));
    }
}

//! `%`-style interpolation of a record's splat into its message.
//!
//! Recognized tokens are `%s %d %i %f %j %o %O` and the escape `%%`. Splat
//! entries left over after every token is filled are treated as metadata:
//! JSON objects among them are merged into the record's metadata and anything
//! else is dropped.

use crate::record::{Arg, LogRecord};
use serde_json::Value;

/// Interpolate and consume `record.splat`.
pub fn apply(record: &mut LogRecord) {
    if record.splat.is_empty() {
        return;
    }
    let splat = std::mem::take(&mut record.splat);

    let Some(message) = record.message.as_text().map(str::to_string) else {
        merge_metas(record, splat);
        return;
    };

    let tokens = count_tokens(&message);
    if tokens.total == 0 {
        merge_metas(record, splat);
        return;
    }

    let expected = tokens.total - tokens.escapes;
    let (args, metas) = if splat.len() > expected {
        let mut args = splat;
        let metas = args.split_off(expected);
        (args, metas)
    } else {
        (splat, Vec::new())
    };

    merge_metas(record, metas);
    record.message = Arg::Text(interpolate(&message, &args));
}

fn merge_metas(record: &mut LogRecord, metas: Vec<Arg>) {
    for meta in metas {
        if let Arg::Json(Value::Object(fields)) = meta {
            record.metadata.extend(fields);
        }
    }
}

struct TokenCount {
    total: usize,
    escapes: usize,
}

fn is_token(c: char) -> bool {
    matches!(c, 's' | 'c' | 'd' | 'j' | 'i' | 'f' | 'o' | 'O' | '%')
}

fn count_tokens(message: &str) -> TokenCount {
    let mut count = TokenCount { total: 0, escapes: 0 };
    let mut chars = message.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            continue;
        }
        if let Some(&next) = chars.peek() {
            if is_token(next) {
                chars.next();
                count.total += 1;
                if next == '%' {
                    count.escapes += 1;
                }
            }
        }
    }
    count
}

/// Replace tokens left to right; tokens without an argument stay literal.
pub fn interpolate(message: &str, args: &[Arg]) -> String {
    let mut out = String::with_capacity(message.len());
    let mut args = args.iter();
    let mut chars = message.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let Some(&spec) = chars.peek() else {
            out.push(c);
            continue;
        };
        if !is_token(spec) {
            out.push(c);
            continue;
        }
        chars.next();

        if spec == '%' {
            out.push('%');
            continue;
        }
        // %c (CSS) consumes an argument and prints nothing
        match args.next() {
            Some(_) if spec == 'c' => {}
            Some(arg) => out.push_str(&render(spec, arg)),
            None => {
                out.push('%');
                out.push(spec);
            }
        }
    }
    out
}

fn render(spec: char, arg: &Arg) -> String {
    match spec {
        's' => arg.display(),
        'd' => number(arg).map(format_number).unwrap_or_else(|| "NaN".to_string()),
        'i' => number(arg)
            .map(|n| format_number(n.trunc()))
            .unwrap_or_else(|| "NaN".to_string()),
        'f' => number(arg).map(|n| n.to_string()).unwrap_or_else(|| "NaN".to_string()),
        _ => arg.to_value().to_string(),
    }
}

fn number(arg: &Arg) -> Option<f64> {
    match arg {
        Arg::Json(Value::Number(n)) => n.as_f64(),
        Arg::Json(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        other => other.as_text().and_then(|text| text.trim().parse().ok()),
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;
    use serde_json::json;

    fn record(message: &str, splat: Vec<Arg>) -> LogRecord {
        let mut record = LogRecord::new(Level::Info, message);
        record.splat = splat;
        record
    }

    #[test]
    fn fills_string_tokens() {
        let mut r = record("Testing %s?", vec![Arg::from("1 2 3")]);
        apply(&mut r);
        assert_eq!(r.message, Arg::from("Testing 1 2 3?"));
        assert!(r.splat.is_empty());
    }

    #[test]
    fn surplus_objects_become_metadata() {
        let mut r = record(
            "Is there a %s?",
            vec![Arg::from("foo"), Arg::from(json!({"foo": "yes!"})), Arg::from("dropped")],
        );
        apply(&mut r);
        assert_eq!(r.message, Arg::from("Is there a foo?"));
        assert_eq!(r.metadata["foo"], json!("yes!"));
        assert_eq!(r.metadata.len(), 1);
    }

    #[test]
    fn messages_without_tokens_merge_every_object() {
        let mut r = record(
            "Testing?",
            vec![Arg::from(json!({"foo": "bar"})), Arg::from(json!({"arr": ["1 2 3"]}))],
        );
        apply(&mut r);
        assert_eq!(r.message, Arg::from("Testing?"));
        assert_eq!(r.metadata["foo"], json!("bar"));
        assert_eq!(r.metadata["arr"], json!(["1 2 3"]));
    }

    #[test]
    fn escapes_do_not_consume_arguments() {
        let mut r = record("100%% of %d", vec![Arg::from(7_i64)]);
        apply(&mut r);
        assert_eq!(r.message, Arg::from("100% of 7"));
    }

    #[test]
    fn missing_arguments_leave_tokens() {
        assert_eq!(interpolate("%s and %s", &[Arg::from("a")]), "a and %s");
    }

    #[test]
    fn numeric_and_json_tokens() {
        let args = [
            Arg::from("12.7"),
            Arg::from(12.7_f64),
            Arg::from("x"),
            Arg::from(json!({"k": [1, 2]})),
        ];
        assert_eq!(interpolate("%i %f %d %j", &args), "12 12.7 NaN {\"k\":[1,2]}");
    }

    #[test]
    fn non_text_messages_only_merge() {
        let mut r = record("", vec![]);
        r.message = Arg::from(json!({"structured": true}));
        r.splat = vec![Arg::from(json!({"extra": 1}))];
        apply(&mut r);
        assert_eq!(r.message, Arg::from(json!({"structured": true})));
        assert_eq!(r.metadata["extra"], json!(1));
    }
}

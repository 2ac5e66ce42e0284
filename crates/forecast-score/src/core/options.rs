use indexmap::IndexMap;
use serde_json::Value;

/// Free-form options passed through to metrics and reducers (`na_rm`, `digits`, ...).
///
/// Keys a callee does not know are ignored.
pub type Options = IndexMap<String, Value>;

pub fn option_bool(options: &Options, key: &str) -> Option<bool> {
    options.get(key).and_then(Value::as_bool)
}

pub fn option_f64(options: &Options, key: &str) -> Option<f64> {
    options.get(key).and_then(Value::as_f64)
}

/// Integer option. Whole floats such as `2.0` are accepted.
pub fn option_i64(options: &Options, key: &str) -> Option<i64> {
    let value = options.get(key)?;
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|v| v.fract() == 0.0)
            .map(|v| v as i64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn typed_lookups() {
        let mut options = Options::new();
        options.insert("na_rm".into(), json!(true));
        options.insert("digits".into(), json!(2.0));
        options.insert("label".into(), json!("x"));

        assert_eq!(option_bool(&options, "na_rm"), Some(true));
        assert_eq!(option_i64(&options, "digits"), Some(2));
        assert_eq!(option_f64(&options, "digits"), Some(2.0));
        assert_eq!(option_bool(&options, "label"), None);
        assert_eq!(option_i64(&options, "missing"), None);
    }
}

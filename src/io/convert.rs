use crate::core::value::Value;

type Converter = fn(&str) -> Option<Value>;

/// Tried in order; the first converter that accepts the whole value wins.
const CONVERTERS: [Converter; 6] = [
    empty_string,
    boolean,
    integer,
    float,
    integer_array,
    float_array,
];

fn empty_string(value: &str) -> Option<Value> {
    value.is_empty().then(|| Value::Str(String::new()))
}

fn boolean(value: &str) -> Option<Value> {
    if value.eq_ignore_ascii_case("true") {
        Some(Value::Bool(true))
    } else if value.eq_ignore_ascii_case("false") {
        Some(Value::Bool(false))
    } else {
        None
    }
}

fn integer(value: &str) -> Option<Value> {
    value.parse::<i64>().ok().map(Value::Int)
}

fn float(value: &str) -> Option<Value> {
    value.parse::<f64>().ok().map(Value::Float)
}

/// Parses every whitespace-separated token, requiring at least one.
fn tokens<T: std::str::FromStr>(value: &str) -> Option<Vec<T>> {
    let parsed = value
        .split_whitespace()
        .map(|token| token.parse::<T>().ok())
        .collect::<Option<Vec<T>>>()?;
    (!parsed.is_empty()).then_some(parsed)
}

fn integer_array(value: &str) -> Option<Value> {
    tokens::<i64>(value).map(Value::IntArray)
}

fn float_array(value: &str) -> Option<Value> {
    tokens::<f64>(value).map(Value::FloatArray)
}

/// Converts a raw keyword value into its most specific type:
/// empty string, bool, int, float, int array, float array, and finally the
/// unchanged string.
pub fn convert_type(value: &str) -> Value {
    CONVERTERS
        .iter()
        .find_map(|convert| convert(value))
        .unwrap_or_else(|| Value::Str(value.to_string()))
}

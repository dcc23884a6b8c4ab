//! Functions callable from templates by name.

use crate::{
    context::expect_args, error::TemplateError, interval::PgInterval, runtime::TemplateRuntime,
};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use once_cell::sync::Lazy;
use rand::Rng;
use serde_json::Value as JsonValue;
use std::{cmp::Ordering, collections::HashMap};
use veil_core::{jsonpath, parse_timestamp, Value};

pub type TemplateFunction =
    fn(&mut TemplateRuntime, Vec<Value>) -> Result<Value, TemplateError>;

type FunctionResult = Result<Value, TemplateError>;

const DEFAULT_SYMBOLS: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ1234567890";
const DEFAULT_FLOAT_PRECISION: i64 = 4;

static FUNCTIONS: Lazy<HashMap<&'static str, TemplateFunction>> = Lazy::new(builtin_functions);

pub fn lookup(name: &str) -> Option<TemplateFunction> {
    FUNCTIONS.get(name).copied()
}

pub fn function_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = FUNCTIONS.keys().copied().collect();
    names.sort_unstable();
    names
}

fn builtin_functions() -> HashMap<&'static str, TemplateFunction> {
    let mut functions: HashMap<&'static str, TemplateFunction> = HashMap::new();

    functions.insert("null", null);
    functions.insert("isNull", is_null);
    functions.insert("isNotNull", is_not_null);
    functions.insert("sqlCoalesce", sql_coalesce);

    functions.insert("jsonExists", json_exists);
    functions.insert("mustJsonGet", must_json_get);
    functions.insert("mustJsonGetRaw", must_json_get_raw);
    functions.insert("jsonGet", json_get);
    functions.insert("jsonGetRaw", json_get_raw);
    functions.insert("jsonSet", json_set);
    functions.insert("jsonSetRaw", json_set_raw);
    functions.insert("jsonDelete", json_delete);
    functions.insert("jsonValidate", json_validate);
    functions.insert("jsonIsValid", json_is_valid);
    functions.insert("toJsonRawValue", to_json_raw_value);

    functions.insert("isInt", is_int);
    functions.insert("isFloat", is_float);
    functions.insert("isNil", is_nil);
    functions.insert("isString", is_string);
    functions.insert("isMap", is_map);
    functions.insert("isSlice", is_slice);
    functions.insert("isBool", is_bool);

    functions.insert("truncateDate", truncate_date);
    functions.insert("noiseDatePgInterval", noise_date_pg_interval);
    functions.insert("noiseFloat", noise_float);
    functions.insert("noiseInt", noise_int);
    functions.insert("randomBool", random_bool);
    functions.insert("randomDate", random_date);
    functions.insert("randomFloat", random_float);
    functions.insert("randomInt", random_int);
    functions.insert("randomString", random_string);
    functions.insert("roundFloat", round_float);

    functions.insert("upper", upper);
    functions.insert("lower", lower);
    functions.insert("trim", trim);
    functions.insert("trunc", trunc);
    functions.insert("replace", replace);
    functions.insert("contains", contains);
    functions.insert("hasPrefix", has_prefix);
    functions.insert("hasSuffix", has_suffix);
    functions.insert("default", default);
    functions.insert("toString", to_string);

    functions.insert("eq", eq);
    functions.insert("ne", ne);
    functions.insert("lt", lt);
    functions.insert("le", le);
    functions.insert("gt", gt);
    functions.insert("ge", ge);
    functions.insert("and", and);
    functions.insert("or", or);
    functions.insert("not", not);

    functions
}

/// Go template truthiness: zero values and NULL are false.
pub fn is_true(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(value) => *value,
        Value::Int(value) => *value != 0,
        Value::Float(value) => *value != 0.0,
        Value::Text(value) => !value.is_empty(),
        Value::Date(_) | Value::Timestamp(_) => true,
        Value::Json(JsonValue::Null) => false,
        Value::Json(JsonValue::Array(items)) => !items.is_empty(),
        Value::Json(JsonValue::Object(map)) => !map.is_empty(),
        Value::Json(_) => true,
    }
}

fn to_f64(name: &str, value: &Value) -> Result<f64, TemplateError> {
    match value {
        Value::Int(value) => Ok(*value as f64),
        Value::Float(value) => Ok(*value),
        Value::Bool(value) => Ok(if *value { 1.0 } else { 0.0 }),
        Value::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| TemplateError::call(name, format!("cannot cast \"{}\" to float", text))),
        Value::Json(JsonValue::Number(number)) => number
            .as_f64()
            .ok_or_else(|| TemplateError::call(name, "number out of range")),
        other => Err(TemplateError::call(
            name,
            format!("cannot cast {} to float", other.type_label()),
        )),
    }
}

fn to_i64(name: &str, value: &Value) -> Result<i64, TemplateError> {
    match value {
        Value::Int(value) => Ok(*value),
        Value::Float(value) => Ok(value.trunc() as i64),
        Value::Bool(value) => Ok(*value as i64),
        Value::Text(text) => text
            .trim()
            .parse::<i64>()
            .map_err(|_| TemplateError::call(name, format!("cannot cast \"{}\" to int", text))),
        Value::Json(JsonValue::Number(number)) => number
            .as_i64()
            .ok_or_else(|| TemplateError::call(name, "number is not an integer")),
        other => Err(TemplateError::call(
            name,
            format!("cannot cast {} to int", other.type_label()),
        )),
    }
}

fn to_timestamp(name: &str, value: &Value) -> Result<NaiveDateTime, TemplateError> {
    match value {
        Value::Timestamp(value) => Ok(*value),
        Value::Date(value) => value
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| TemplateError::call(name, "invalid date")),
        Value::Text(text) => parse_timestamp(text).map_err(|reason| TemplateError::call(name, reason)),
        other => Err(TemplateError::call(
            name,
            format!("cannot cast {} to time", other.type_label()),
        )),
    }
}

fn to_precision(name: &str, value: &Value) -> Result<i64, TemplateError> {
    let precision = to_i64(name, value)?;
    if precision < 0 {
        return Err(TemplateError::call(
            name,
            format!("precision must be 0 or higher got {}", precision),
        ));
    }
    Ok(precision)
}

fn to_ratio(name: &str, value: &Value) -> Result<f64, TemplateError> {
    let ratio = to_f64(name, value)?;
    if ratio > 1.0 || ratio <= 0.0 {
        return Err(TemplateError::call(
            name,
            format!("ratio must be in interval (0, 1] got {}", ratio),
        ));
    }
    Ok(ratio)
}

fn round(precision: i64, value: f64) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}

fn json_document(value: &Value) -> Result<JsonValue, TemplateError> {
    match value {
        Value::Json(document) => Ok(document.clone()),
        Value::Text(text) if text.trim().is_empty() => Ok(JsonValue::Null),
        other => Ok(serde_json::from_str(&other.to_string())?),
    }
}

fn null(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    expect_args("null", &args, 0)?;
    Ok(Value::Null)
}

fn is_null(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    expect_args("isNull", &args, 1)?;
    Ok(Value::Bool(args[0].is_null()))
}

fn is_not_null(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    expect_args("isNotNull", &args, 1)?;
    Ok(Value::Bool(!args[0].is_null()))
}

fn sql_coalesce(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    Ok(args
        .into_iter()
        .find(|value| !value.is_null())
        .unwrap_or(Value::Null))
}

fn json_exists(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    expect_args("jsonExists", &args, 2)?;
    let document = match json_document(&args[1]) {
        Ok(document) => document,
        Err(_) => return Ok(Value::Bool(false)),
    };
    Ok(Value::Bool(jsonpath::exists(&document, &args[0].to_string())?))
}

fn must_json_get(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    expect_args("mustJsonGet", &args, 2)?;
    let path = args[0].to_string();
    let document = json_document(&args[1])?;
    match jsonpath::get(&document, &path)? {
        Some(value) => Ok(Value::from_json(value.clone())),
        None => Err(TemplateError::call(
            "mustJsonGet",
            format!("json path \"{}\" does not exist", path),
        )),
    }
}

fn must_json_get_raw(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    expect_args("mustJsonGetRaw", &args, 2)?;
    let path = args[0].to_string();
    let document = json_document(&args[1])?;
    match jsonpath::get(&document, &path)? {
        Some(value) => Ok(Value::Text(value.to_string())),
        None => Err(TemplateError::call(
            "mustJsonGetRaw",
            format!("json path \"{}\" does not exist", path),
        )),
    }
}

fn json_get(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    expect_args("jsonGet", &args, 2)?;
    let document = json_document(&args[1])?;
    Ok(jsonpath::get(&document, &args[0].to_string())?
        .map(|value| Value::from_json(value.clone()))
        .unwrap_or(Value::Json(JsonValue::Null)))
}

fn json_get_raw(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    expect_args("jsonGetRaw", &args, 2)?;
    let document = json_document(&args[1])?;
    Ok(Value::Text(
        jsonpath::get(&document, &args[0].to_string())?
            .map(|value| value.to_string())
            .unwrap_or_default(),
    ))
}

fn json_set(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    expect_args("jsonSet", &args, 3)?;
    let mut document = json_document(&args[2])?;
    jsonpath::set(&mut document, &args[0].to_string(), args[1].to_json())?;
    Ok(Value::Text(document.to_string()))
}

fn json_set_raw(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    expect_args("jsonSetRaw", &args, 3)?;
    let raw: JsonValue = serde_json::from_str(&args[1].to_string())?;
    let mut document = json_document(&args[2])?;
    jsonpath::set(&mut document, &args[0].to_string(), raw)?;
    Ok(Value::Text(document.to_string()))
}

fn json_delete(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    expect_args("jsonDelete", &args, 2)?;
    let mut document = json_document(&args[1])?;
    jsonpath::delete(&mut document, &args[0].to_string())?;
    Ok(Value::Text(document.to_string()))
}

fn json_validate(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    expect_args("jsonValidate", &args, 1)?;
    let text = args[0].to_string();
    if serde_json::from_str::<JsonValue>(&text).is_err() {
        return Err(TemplateError::call(
            "jsonValidate",
            format!("json is invalid: {}", text),
        ));
    }
    Ok(Value::Text(text))
}

fn json_is_valid(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    expect_args("jsonIsValid", &args, 1)?;
    Ok(Value::Bool(
        serde_json::from_str::<JsonValue>(&args[0].to_string()).is_ok(),
    ))
}

fn to_json_raw_value(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    expect_args("toJsonRawValue", &args, 1)?;
    Ok(Value::Text(args[0].to_json().to_string()))
}

fn is_int(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    expect_args("isInt", &args, 1)?;
    Ok(Value::Bool(matches!(args[0], Value::Int(_))))
}

fn is_float(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    expect_args("isFloat", &args, 1)?;
    Ok(Value::Bool(matches!(args[0], Value::Float(_))))
}

fn is_nil(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    expect_args("isNil", &args, 1)?;
    Ok(Value::Bool(matches!(args[0], Value::Json(JsonValue::Null))))
}

fn is_string(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    expect_args("isString", &args, 1)?;
    Ok(Value::Bool(matches!(args[0], Value::Text(_))))
}

fn is_map(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    expect_args("isMap", &args, 1)?;
    Ok(Value::Bool(matches!(args[0], Value::Json(JsonValue::Object(_)))))
}

fn is_slice(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    expect_args("isSlice", &args, 1)?;
    Ok(Value::Bool(matches!(args[0], Value::Json(JsonValue::Array(_)))))
}

fn is_bool(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    expect_args("isBool", &args, 1)?;
    Ok(Value::Bool(matches!(args[0], Value::Bool(_))))
}

fn truncate_date(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    expect_args("truncateDate", &args, 2)?;
    let part = args[0].to_string();
    let value = to_timestamp("truncateDate", &args[1])?;

    let (month, day) = match part.as_str() {
        "year" => (1, 1),
        "month" => (value.month(), 1),
        _ => (value.month(), value.day()),
    };
    let (hour, minute, second, nano) = match part.as_str() {
        "nano" => (
            value.hour(),
            value.minute(),
            value.second(),
            value.nanosecond(),
        ),
        "second" => (value.hour(), value.minute(), value.second(), 0),
        "minute" => (value.hour(), value.minute(), 0, 0),
        "hour" => (value.hour(), 0, 0, 0),
        "day" | "month" | "year" => (0, 0, 0, 0),
        _ => {
            return Err(TemplateError::call(
                "truncateDate",
                format!("wrong part value \"{}\"", part),
            ))
        }
    };

    NaiveDate::from_ymd_opt(value.year(), month, day)
        .and_then(|date| date.and_hms_nano_opt(hour, minute, second, nano))
        .map(Value::Timestamp)
        .ok_or_else(|| TemplateError::call("truncateDate", "invalid date"))
}

fn noise_date_pg_interval(runtime: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    let name = "noiseDatePgInterval";
    expect_args(name, &args, 2)?;
    let source = args[0].to_string();
    let interval = PgInterval::parse(&source).map_err(|reason| {
        TemplateError::call(
            name,
            format!("error parsing \"interval\" value \"{}\": {}", source, reason),
        )
    })?;
    let value = to_timestamp(name, &args[1])?;

    let forward = runtime.rng().gen_bool(0.5);
    let bound = interval
        .shift(value, forward)
        .ok_or_else(|| TemplateError::call(name, "date is out of range"))?;
    let max_delta = (bound - value)
        .num_microseconds()
        .map(i64::abs)
        .unwrap_or(i64::MAX);
    if max_delta == 0 {
        return Ok(Value::Timestamp(value));
    }

    let delta = Duration::microseconds(runtime.rng().gen_range(0..max_delta));
    let noised = if forward { value + delta } else { value - delta };
    Ok(Value::Timestamp(noised))
}

fn noise_float(runtime: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    let name = "noiseFloat";
    expect_args(name, &args, 3)?;
    let ratio = to_ratio(name, &args[0])?;
    let precision = to_precision(name, &args[1])?;
    let value = to_f64(name, &args[2])?;

    let mut random_ratio = runtime.rng().gen::<f64>() * ratio;
    if runtime.rng().gen_bool(0.5) {
        random_ratio = -random_ratio;
    }
    Ok(Value::Float(round(precision, value + value * random_ratio)))
}

fn noise_int(runtime: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    let name = "noiseInt";
    expect_args(name, &args, 2)?;
    let ratio = to_ratio(name, &args[0])?;
    let value = to_i64(name, &args[1])?;

    let mut random_ratio = runtime.rng().gen::<f64>() * ratio;
    if runtime.rng().gen_bool(0.5) {
        random_ratio = -random_ratio;
    }
    let delta = (value as f64 * random_ratio) as i64;
    value
        .checked_add(delta)
        .map(Value::Int)
        .ok_or_else(|| TemplateError::call(name, "integer overflow"))
}

fn random_bool(runtime: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    expect_args("randomBool", &args, 0)?;
    Ok(Value::Bool(runtime.rng().gen_bool(0.5)))
}

fn random_date(runtime: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    let name = "randomDate";
    expect_args(name, &args, 2)?;
    let min = to_timestamp(name, &args[0])?;
    let max = to_timestamp(name, &args[1])?;
    if min > max {
        return Err(TemplateError::call(
            name,
            format!("min date ({}) must before the max date ({})", min, max),
        ));
    }

    let span = (max - min).num_microseconds().unwrap_or(i64::MAX);
    if span == 0 {
        return Ok(Value::Timestamp(min));
    }
    let delta = runtime.rng().gen_range(0..span);
    Ok(Value::Timestamp(min + Duration::microseconds(delta)))
}

fn random_float(runtime: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    let name = "randomFloat";
    if args.len() != 2 && args.len() != 3 {
        return Err(TemplateError::Arity {
            name: name.to_string(),
            want: "2 or 3".to_string(),
            got: args.len(),
        });
    }
    let min = to_f64(name, &args[0])?;
    let max = to_f64(name, &args[1])?;
    let precision = match args.get(2) {
        Some(precision) => to_precision(name, precision)?,
        None => DEFAULT_FLOAT_PRECISION,
    };
    if min > max {
        return Err(TemplateError::call(
            name,
            format!("min value ({}) must be less than the max ({})", min, max),
        ));
    }

    let value = min + runtime.rng().gen::<f64>() * (max - min);
    Ok(Value::Float(round(precision, value)))
}

fn random_int(runtime: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    let name = "randomInt";
    expect_args(name, &args, 2)?;
    let min = to_i64(name, &args[0])?;
    let max = to_i64(name, &args[1])?;
    if min > max {
        return Err(TemplateError::call(
            name,
            format!("min value ({}) must be less than the max ({})", min, max),
        ));
    }
    Ok(Value::Int(runtime.rng().gen_range(min..=max)))
}

fn random_string(runtime: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    let name = "randomString";
    if args.len() != 2 && args.len() != 3 {
        return Err(TemplateError::Arity {
            name: name.to_string(),
            want: "2 or 3".to_string(),
            got: args.len(),
        });
    }
    let min_length = to_i64(name, &args[0])?;
    let max_length = to_i64(name, &args[1])?;
    if min_length < 0 || max_length < 0 {
        return Err(TemplateError::call(name, "length must be higher or equal 0"));
    }
    if min_length > max_length {
        return Err(TemplateError::call(
            name,
            format!(
                "minLength ({}) must be less or equal maxLength ({})",
                min_length, max_length
            ),
        ));
    }

    let symbols: Vec<char> = match args.get(2) {
        Some(symbols) => symbols.to_string().chars().collect(),
        None => DEFAULT_SYMBOLS.chars().collect(),
    };
    if symbols.is_empty() {
        return Err(TemplateError::call(name, "symbols must not be empty"));
    }

    let rng = runtime.rng();
    let length = rng.gen_range(min_length..=max_length);
    let value: String = (0..length)
        .map(|_| symbols[rng.gen_range(0..symbols.len())])
        .collect();
    Ok(Value::Text(value))
}

fn round_float(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    let name = "roundFloat";
    expect_args(name, &args, 2)?;
    let precision = to_precision(name, &args[0])?;
    let value = to_f64(name, &args[1])?;
    Ok(Value::Float(round(precision, value)))
}

fn upper(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    expect_args("upper", &args, 1)?;
    Ok(Value::Text(args[0].to_string().to_uppercase()))
}

fn lower(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    expect_args("lower", &args, 1)?;
    Ok(Value::Text(args[0].to_string().to_lowercase()))
}

fn trim(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    expect_args("trim", &args, 1)?;
    Ok(Value::Text(args[0].to_string().trim().to_string()))
}

fn trunc(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    expect_args("trunc", &args, 2)?;
    let count = to_i64("trunc", &args[0])?;
    let chars: Vec<char> = args[1].to_string().chars().collect();
    let length = chars.len() as i64;

    let value: String = if count < 0 && length + count > 0 {
        chars[(length + count) as usize..].iter().collect()
    } else if count >= 0 && length > count {
        chars[..count as usize].iter().collect()
    } else {
        chars.iter().collect()
    };
    Ok(Value::Text(value))
}

fn replace(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    expect_args("replace", &args, 3)?;
    Ok(Value::Text(
        args[2]
            .to_string()
            .replace(&args[0].to_string(), &args[1].to_string()),
    ))
}

fn contains(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    expect_args("contains", &args, 2)?;
    Ok(Value::Bool(
        args[1].to_string().contains(&args[0].to_string()),
    ))
}

fn has_prefix(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    expect_args("hasPrefix", &args, 2)?;
    Ok(Value::Bool(
        args[1].to_string().starts_with(&args[0].to_string()),
    ))
}

fn has_suffix(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    expect_args("hasSuffix", &args, 2)?;
    Ok(Value::Bool(
        args[1].to_string().ends_with(&args[0].to_string()),
    ))
}

fn default(_: &mut TemplateRuntime, mut args: Vec<Value>) -> FunctionResult {
    expect_args("default", &args, 2)?;
    let given = args.pop().unwrap_or(Value::Null);
    let fallback = args.pop().unwrap_or(Value::Null);
    Ok(if is_true(&given) { given } else { fallback })
}

fn to_string(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    expect_args("toString", &args, 1)?;
    Ok(Value::Text(args[0].to_string()))
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Int(left), Value::Float(right)) => (*left as f64) == *right,
        (Value::Float(left), Value::Int(right)) => *left == (*right as f64),
        (left, right) => left == right,
    }
}

fn compare(name: &str, left: &Value, right: &Value) -> Result<Ordering, TemplateError> {
    let ordering = match (left, right) {
        (Value::Int(left), Value::Int(right)) => Some(left.cmp(right)),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            to_f64(name, left)?.partial_cmp(&to_f64(name, right)?)
        }
        (Value::Text(left), Value::Text(right)) => Some(left.cmp(right)),
        (Value::Date(left), Value::Date(right)) => Some(left.cmp(right)),
        (Value::Timestamp(left), Value::Timestamp(right)) => Some(left.cmp(right)),
        _ => None,
    };
    ordering.ok_or_else(|| {
        TemplateError::call(
            name,
            format!(
                "incompatible types for comparison: {} and {}",
                left.type_label(),
                right.type_label()
            ),
        )
    })
}

fn eq(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    if args.len() < 2 {
        return Err(TemplateError::Arity {
            name: "eq".to_string(),
            want: "at least 2".to_string(),
            got: args.len(),
        });
    }
    Ok(Value::Bool(
        args[1..].iter().any(|other| values_equal(&args[0], other)),
    ))
}

fn ne(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    expect_args("ne", &args, 2)?;
    Ok(Value::Bool(!values_equal(&args[0], &args[1])))
}

fn lt(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    expect_args("lt", &args, 2)?;
    Ok(Value::Bool(compare("lt", &args[0], &args[1])? == Ordering::Less))
}

fn le(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    expect_args("le", &args, 2)?;
    Ok(Value::Bool(compare("le", &args[0], &args[1])? != Ordering::Greater))
}

fn gt(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    expect_args("gt", &args, 2)?;
    Ok(Value::Bool(compare("gt", &args[0], &args[1])? == Ordering::Greater))
}

fn ge(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    expect_args("ge", &args, 2)?;
    Ok(Value::Bool(compare("ge", &args[0], &args[1])? != Ordering::Less))
}

fn and(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    let mut last = Value::Bool(true);
    for value in args {
        if !is_true(&value) {
            return Ok(value);
        }
        last = value;
    }
    Ok(last)
}

fn or(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    let mut last = Value::Bool(false);
    for value in args {
        if is_true(&value) {
            return Ok(value);
        }
        last = value;
    }
    Ok(last)
}

fn not(_: &mut TemplateRuntime, args: Vec<Value>) -> FunctionResult {
    expect_args("not", &args, 1)?;
    Ok(Value::Bool(!is_true(&args[0])))
}

//! YAML documents as `serde_json::Value`
//!
//! Provider specs are usually authored as YAML and embedded into resources
//! as raw blobs. Parsing goes through yaml-rust2 and lands in a JSON value so
//! the rest of the stack only ever deals with serde_json.

use serde_json::{Map, Number, Value};
use yaml_rust2::{Yaml, YamlLoader};

use crate::Error;

/// Parse the first YAML document in `input`.
///
/// JSON is valid YAML, so this accepts both. Empty input yields `Value::Null`.
pub fn parse_yaml(input: &str) -> Result<Value, Error> {
    let mut docs =
        YamlLoader::load_from_str(input).map_err(|e| Error::codec("yaml", e.to_string()))?;
    if docs.is_empty() {
        return Ok(Value::Null);
    }
    to_json(docs.swap_remove(0))
}

fn to_json(node: Yaml) -> Result<Value, Error> {
    let value = match node {
        Yaml::Null => Value::Null,
        Yaml::Boolean(b) => Value::Bool(b),
        Yaml::Integer(i) => Value::from(i),
        Yaml::Real(text) => {
            let f: f64 = text
                .parse()
                .map_err(|_| Error::codec("yaml", format!("invalid float literal '{}'", text)))?;
            Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Array(items) => {
            Value::Array(items.into_iter().map(to_json).collect::<Result<_, _>>()?)
        }
        Yaml::Hash(entries) => {
            let mut object = Map::with_capacity(entries.len());
            for (key, item) in entries {
                object.insert(key_string(key)?, to_json(item)?);
            }
            Value::Object(object)
        }
        Yaml::Alias(_) => return Err(Error::codec("yaml", "aliases are not supported")),
        Yaml::BadValue => return Err(Error::codec("yaml", "malformed value")),
    };
    Ok(value)
}

fn key_string(key: Yaml) -> Result<String, Error> {
    match key {
        Yaml::String(s) | Yaml::Real(s) => Ok(s),
        Yaml::Integer(i) => Ok(i.to_string()),
        Yaml::Boolean(b) => Ok(b.to_string()),
        Yaml::Null => Ok("null".to_string()),
        _ => Err(Error::codec("yaml", "mapping keys must be scalars")),
    }
}

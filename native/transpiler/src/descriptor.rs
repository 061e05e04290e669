//! Deployment descriptor: load, fold the registry into `functions`, print.
//!
//! The document itself is owned by the user; every section other than
//! `functions` passes through untouched.

use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;

use crate::error::TranspileError;
use crate::registry::FunctionRegistry;

const FUNCTIONS_KEY: &str = "functions";

pub fn load(path: &Path) -> Result<Value, TranspileError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(TranspileError::MissingDescriptor {
                path: path.to_path_buf(),
                help: reference_descriptor(),
            })
        }
        Err(e) => return Err(TranspileError::io("read", path, e)),
    };
    parse(&text).map_err(|source| TranspileError::Descriptor {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse(text: &str) -> Result<Value, serde_yaml::Error> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_yaml::from_str(text)
}

/// Registry entries are added to (or replace entries in) the `functions`
/// section. An empty registry leaves the document exactly as it was.
pub fn merge_into_descriptor(doc: Value, registry: &FunctionRegistry) -> Result<Value, TranspileError> {
    if registry.is_empty() {
        return Ok(doc);
    }

    let mut root = match doc {
        Value::Null => Mapping::new(),
        Value::Mapping(map) => map,
        _ => {
            return Err(TranspileError::InvalidDescriptor(
                "the document root must be a mapping".to_string(),
            ))
        }
    };

    // Edited in place so the user's key order survives.
    let slot = root
        .entry(Value::String(FUNCTIONS_KEY.to_string()))
        .or_insert(Value::Null);
    if slot.is_null() {
        *slot = Value::Mapping(Mapping::new());
    }
    let Value::Mapping(functions) = slot else {
        return Err(TranspileError::InvalidDescriptor(
            "`functions` must be a mapping".to_string(),
        ));
    };

    for entry in registry.iter() {
        let config = serde_yaml::to_value(entry.to_config())
            .map_err(|e| TranspileError::InvalidDescriptor(e.to_string()))?;
        functions.insert(Value::String(entry.function_name.clone()), config);
    }

    Ok(Value::Mapping(root))
}

pub fn to_string(doc: &Value) -> Result<String, TranspileError> {
    serde_yaml::to_string(doc).map_err(|e| TranspileError::InvalidDescriptor(e.to_string()))
}

/// Minimal document shown when no descriptor exists yet.
pub fn reference_descriptor() -> String {
    let mut provider = Mapping::new();
    provider.insert("name".into(), "aws".into());
    provider.insert("runtime".into(), "nodejs14.x".into());
    provider.insert("region".into(), "us-east-1".into());

    let mut doc = Mapping::new();
    doc.insert("service".into(), "my-service-name".into());
    doc.insert("provider".into(), Value::Mapping(provider));

    let example = serde_yaml::to_string(&Value::Mapping(doc)).unwrap_or_default();
    format!(
        "Please, provide a valid configuration file. You can use the following reference:\n\n{}",
        example
    )
}

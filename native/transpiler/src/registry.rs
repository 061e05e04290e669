//! Function registry: function name → deployment trigger, accumulated over
//! the whole run. Last write wins.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::annotation::HttpMethod;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TriggerDescriptor {
    /// Plain handler with no external event source.
    Handler,
    HttpRoute { path: String, method: HttpMethod },
    Schedule { expression: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
    pub function_name: String,
    /// `<module path without extension>.<function name>`.
    pub handler: String,
    /// File the entry was discovered in.
    pub source: String,
    pub trigger: TriggerDescriptor,
}

#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    entries: IndexMap<String, RegistryEntry>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the entry for `entry.function_name`, returning
    /// the one it replaced. An overwritten name keeps its original position.
    pub fn register(&mut self, entry: RegistryEntry) -> Option<RegistryEntry> {
        let previous = self.entries.insert(entry.function_name.clone(), entry);
        if let Some(prev) = &previous {
            if let Some(current) = self.entries.get(&prev.function_name) {
                if current.source != prev.source {
                    log::warn!(
                        "function '{}' from {} overrides the one registered from {}",
                        current.function_name,
                        current.source,
                        prev.source
                    );
                }
            }
        }
        previous
    }

    pub fn get(&self, name: &str) -> Option<&RegistryEntry> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DESCRIPTOR SHAPE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionConfig {
    pub handler: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<EventConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpEventConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpEventConfig {
    pub path: String,
    pub method: String,
}

impl RegistryEntry {
    pub fn to_config(&self) -> FunctionConfig {
        let events = match &self.trigger {
            TriggerDescriptor::Handler => Vec::new(),
            TriggerDescriptor::HttpRoute { path, method } => vec![EventConfig {
                http: Some(HttpEventConfig {
                    path: path.clone(),
                    method: method.to_string(),
                }),
                schedule: None,
            }],
            TriggerDescriptor::Schedule { expression } => vec![EventConfig {
                http: None,
                schedule: Some(expression.clone()),
            }],
        };
        FunctionConfig {
            handler: self.handler.clone(),
            events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(name: &str, source: &str, trigger: TriggerDescriptor) -> RegistryEntry {
        RegistryEntry {
            function_name: name.to_string(),
            handler: format!("output/{}.{}", source, name),
            source: format!("src/{}.ts", source),
            trigger,
        }
    }

    #[test]
    fn test_last_write_wins_in_place() {
        let mut registry = FunctionRegistry::new();
        registry.register(entry("handler", "a", TriggerDescriptor::Handler));
        registry.register(entry("other", "a", TriggerDescriptor::Handler));
        let previous = registry.register(entry(
            "handler",
            "b",
            TriggerDescriptor::Schedule {
                expression: "rate(1 hour)".to_string(),
            },
        ));

        assert_eq!(previous.map(|p| p.source), Some("src/a.ts".to_string()));
        assert_eq!(registry.len(), 2);
        let names: Vec<&str> = registry.iter().map(|e| e.function_name.as_str()).collect();
        assert_eq!(names, vec!["handler", "other"]);
        assert_eq!(
            registry.get("handler").map(|e| e.handler.as_str()),
            Some("output/b.handler")
        );
    }

    #[test]
    fn test_config_shapes() {
        let http = entry(
            "createUser",
            "users",
            TriggerDescriptor::HttpRoute {
                path: "/users".to_string(),
                method: HttpMethod::Post,
            },
        );
        let yaml = serde_yaml::to_string(&http.to_config()).expect("yaml");
        assert_eq!(
            yaml,
            "handler: output/users.createUser\nevents:\n- http:\n    path: /users\n    method: POST\n"
        );

        let plain = entry("scan", "scan", TriggerDescriptor::Handler);
        let yaml = serde_yaml::to_string(&plain.to_config()).expect("yaml");
        assert_eq!(yaml, "handler: output/scan.scan\n");
    }
}

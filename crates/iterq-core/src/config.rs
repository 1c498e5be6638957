//! Runtime configuration shared by the planner and the CLI.

use serde::{Deserialize, Serialize};

/// How the CLI reads its input document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// One JSON value per line.
    #[default]
    Jsonl,
    /// A single JSON document classified by the JSON adapter.
    Json,
}

impl InputFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jsonl" | "ndjson" => Some(InputFormat::Jsonl),
            "json" => Some(InputFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub input_format: InputFormat,

    /// Pretty-print each output value.
    pub pretty: bool,

    /// Stop after emitting this many results.
    pub output_limit: Option<usize>,

    /// Page size used by `page_by` steps that do not name one.
    pub default_page_size: usize,

    /// Fallback filter directive when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            input_format: InputFormat::Jsonl,
            pretty: false,
            output_limit: None,
            default_page_size: 100,
            log_level: "warn".to_string(),
        }
    }
}

impl QueryConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `ITERQ_INPUT_FORMAT`: `jsonl` or `json`
    /// - `ITERQ_PRETTY`: `1`/`true`/`yes` to pretty-print
    /// - `ITERQ_OUTPUT_LIMIT`: maximum number of results
    /// - `ITERQ_PAGE_SIZE`: default page size
    /// - `ITERQ_LOG`: fallback log filter
    ///
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`QueryConfig::from_env`] over an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(s) = lookup("ITERQ_INPUT_FORMAT") {
            if let Some(v) = InputFormat::parse(&s) {
                cfg.input_format = v;
            }
        }

        if let Some(s) = lookup("ITERQ_PRETTY") {
            if let Some(v) = parse_flag(&s) {
                cfg.pretty = v;
            }
        }

        if let Some(s) = lookup("ITERQ_OUTPUT_LIMIT") {
            if let Ok(v) = s.trim().parse::<usize>() {
                cfg.output_limit = Some(v);
            }
        }

        if let Some(s) = lookup("ITERQ_PAGE_SIZE") {
            if let Ok(v) = s.trim().parse::<usize>() {
                if v > 0 {
                    cfg.default_page_size = v;
                }
            }
        }

        if let Some(s) = lookup("ITERQ_LOG") {
            if !s.trim().is_empty() {
                cfg.log_level = s.trim().to_string();
            }
        }

        cfg
    }
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = QueryConfig::from_lookup(|_| None);
        assert_eq!(cfg, QueryConfig::default());
        assert_eq!(cfg.default_page_size, 100);
        assert_eq!(cfg.log_level, "warn");
    }

    #[test]
    fn test_env_overrides() {
        let cfg = QueryConfig::from_lookup(lookup(&[
            ("ITERQ_INPUT_FORMAT", "JSON"),
            ("ITERQ_PRETTY", "yes"),
            ("ITERQ_OUTPUT_LIMIT", "5"),
            ("ITERQ_PAGE_SIZE", "10"),
            ("ITERQ_LOG", "debug"),
        ]));
        assert_eq!(cfg.input_format, InputFormat::Json);
        assert!(cfg.pretty);
        assert_eq!(cfg.output_limit, Some(5));
        assert_eq!(cfg.default_page_size, 10);
        assert_eq!(cfg.log_level, "debug");
    }

    #[test]
    fn test_bad_values_are_ignored() {
        let cfg = QueryConfig::from_lookup(lookup(&[
            ("ITERQ_INPUT_FORMAT", "xml"),
            ("ITERQ_OUTPUT_LIMIT", "-3"),
            ("ITERQ_PAGE_SIZE", "0"),
        ]));
        assert_eq!(cfg.input_format, InputFormat::Jsonl);
        assert_eq!(cfg.output_limit, None);
        assert_eq!(cfg.default_page_size, 100);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let cfg: QueryConfig = serde_json::from_str(r#"{"pretty": true}"#).unwrap();
        assert!(cfg.pretty);
        assert_eq!(cfg.default_page_size, 100);
    }
}

//! Inbound request normalization.
//!
//! HAPI requests arrive with several shapes for the same meaning: tag
//! segments may precede the `hapi` path root, query keys differ between
//! protocol versions 2.x (`id`, `time.min`, `time.max`) and 3.x (`dataset`,
//! `start`, `stop`), and backend-specific options ride in namespaced keys.
//! Everything here canonicalizes those shapes before validation runs.

use std::collections::HashMap;

use serde_json::Value;

use crate::metadata::CustomOption;

/// Strip a query fragment, then trailing and leading slashes.
pub fn clean_path(path: &str) -> &str {
    let path = match path.find('?') {
        Some(i) => &path[..i],
        None => path,
    };
    path.trim_end_matches('/').trim_start_matches('/')
}

/// Split allow-listed tag segments off a path prefixed before the `hapi`
/// root, returning the tags and the protocol-rooted remainder.
///
/// Tags not on the allow-list are silently dropped; the filter is a safety
/// measure, not a validation error.
pub fn extract_tags(path: &str, allowed: &[String]) -> (Vec<String>, String) {
    if let Some(i) = path.find("hapi") {
        if i > 0 {
            let (prefix, rest) = path.split_at(i);
            let mut tags: Vec<String> = Vec::new();
            for tag in prefix.split('/') {
                if allowed.iter().any(|a| a == tag) && !tags.iter().any(|t| t == tag) {
                    tags.push(tag.to_string());
                }
            }
            return (tags, rest.to_string());
        }
    }
    (Vec::new(), path.to_string())
}

/// Percent-decode a raw query string into key/value pairs.
///
/// The first occurrence of a repeated key wins.
pub fn parse_query(raw: &str) -> HashMap<String, String> {
    let mut query = HashMap::new();
    for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
        query
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }
    query
}

/// Copy legacy protocol-version keys onto the canonical key set.
///
/// The legacy keys are left in place so either form stays readable
/// downstream.
pub fn apply_version_synonyms(query: &mut HashMap<String, String>) {
    for (synonym, canonical) in [("dataset", "id"), ("start", "time.min"), ("stop", "time.max")] {
        if let Some(value) = query.get(synonym).cloned() {
            query.insert(canonical.to_string(), value);
        }
    }
}

/// The requested parameter names, split from the `parameters` query value,
/// or `None` when the caller asked for everything.
pub fn parameters_list(query: &HashMap<String, String>) -> Option<Vec<String>> {
    query
        .get("parameters")
        .map(|value| value.split(',').map(str::to_string).collect())
}

/// Collect `x_customRequestOptions.<name>` query values validated against a
/// dataset's custom-option schema, as `name=value` strings.
///
/// Values failing their constraint, and options with no constraint at all,
/// are dropped rather than rejected.
pub fn custom_options(query: &HashMap<String, String>, schema: &[CustomOption]) -> Vec<String> {
    let mut selected = Vec::new();
    for option in schema {
        let key = format!("x_customRequestOptions.{}", option.name);
        let Some(value) = query.get(&key) else { continue };
        let Some(constraint) = &option.constraint else { continue };
        if let Some(allowed) = constraint.get("enum").and_then(Value::as_array) {
            if allowed.iter().any(|a| a.as_str() == Some(value.as_str())) {
                selected.push(format!("{}={}", option.name, value));
            }
        } else if constraint.get("number").is_some() {
            if let Ok(number) = value.parse::<f64>() {
                selected.push(format!("{}={}", option.name, number));
            }
        }
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn allow(tags: &[&str]) -> Vec<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path("/hapi/data/"), "hapi/data");
        assert_eq!(clean_path("hapi/info?id=x"), "hapi/info");
        assert_eq!(clean_path("//hapi//"), "hapi");
        assert_eq!(clean_path(""), "");
    }

    #[test]
    fn test_extract_tags_allowed() {
        let allowed = allow(&["delta=default", "baseline=yearly"]);
        let (tags, path) = extract_tags("delta=default/hapi/data", &allowed);
        assert_eq!(tags, vec!["delta=default"]);
        assert_eq!(path, "hapi/data");
    }

    #[test]
    fn test_extract_tags_filters_unknown() {
        let allowed = allow(&["delta=default"]);
        let (tags, path) = extract_tags("evil=1/delta=default/hapi/data", &allowed);
        assert_eq!(tags, vec!["delta=default"]);
        assert_eq!(path, "hapi/data");
    }

    #[test]
    fn test_extract_tags_none_when_rooted() {
        let (tags, path) = extract_tags("hapi/data", &allow(&["delta=default"]));
        assert!(tags.is_empty());
        assert_eq!(path, "hapi/data");
    }

    #[test]
    fn test_parse_query_decodes() {
        let query = parse_query("id=cputemp&time.min=2020-01-01T00%3A00Z");
        assert_eq!(query["id"], "cputemp");
        assert_eq!(query["time.min"], "2020-01-01T00:00Z");
    }

    #[test]
    fn test_parse_query_first_occurrence_wins() {
        let query = parse_query("id=first&id=second");
        assert_eq!(query["id"], "first");
    }

    #[test]
    fn test_version_synonyms_copied_not_moved() {
        let mut query = parse_query("dataset=cputemp&start=2020-01-01&stop=2020-01-02");
        apply_version_synonyms(&mut query);
        assert_eq!(query["id"], "cputemp");
        assert_eq!(query["time.min"], "2020-01-01");
        assert_eq!(query["time.max"], "2020-01-02");
        assert_eq!(query["dataset"], "cputemp");
    }

    #[test]
    fn test_parameters_list() {
        let query = parse_query("parameters=Time,temperature");
        assert_eq!(
            parameters_list(&query),
            Some(vec!["Time".to_string(), "temperature".to_string()])
        );
        assert_eq!(parameters_list(&parse_query("id=x")), None);
    }

    #[test]
    fn test_custom_options_enum_constraint() {
        let schema = vec![CustomOption {
            name: "baseline".to_string(),
            constraint: Some(serde_json::json!({"enum": ["yearly", "none"]})),
        }];
        let query = parse_query("x_customRequestOptions.baseline=yearly");
        assert_eq!(custom_options(&query, &schema), vec!["baseline=yearly"]);

        let query = parse_query("x_customRequestOptions.baseline=weekly");
        assert!(custom_options(&query, &schema).is_empty());
    }

    #[test]
    fn test_custom_options_number_constraint() {
        let schema = vec![CustomOption {
            name: "cadence".to_string(),
            constraint: Some(serde_json::json!({"number": true})),
        }];
        let query = parse_query("x_customRequestOptions.cadence=60");
        assert_eq!(custom_options(&query, &schema), vec!["cadence=60"]);

        let query = parse_query("x_customRequestOptions.cadence=abc");
        assert!(custom_options(&query, &schema).is_empty());
    }
}

use std::collections::HashMap;

use crate::error::{PipelineError, Result};
use crate::model::field::CategoricalField;
use crate::model::selection::FilterSelection;

#[derive(Debug, PartialEq)]
pub struct ParsedInput {
    /// Arguments that are not `key:value` pairs, in order.
    pub positional: Vec<String>,
    pub metadata: HashMap<String, Vec<String>>,
}

/// Splits `key:value` arguments from the rest. A repeated key accumulates its values.
pub fn parse_args(args: &[String]) -> ParsedInput {
    let mut positional = Vec::new();
    let mut metadata: HashMap<String, Vec<String>> = HashMap::new();

    for arg in args {
        if let Some((key, value)) = arg.split_once(':') {
            if !key.is_empty() {
                metadata.entry(key.to_string()).or_default().push(value.to_string());
                continue;
            }
        }
        positional.push(arg.clone());
    }

    ParsedInput {
        positional,
        metadata,
    }
}

pub fn expand_key(key: &str, candidates: &[&str]) -> Result<String> {
    // 1. Exact match
    if candidates.contains(&key) {
        return Ok(key.to_string());
    }

    // 2. Prefix match
    let matches: Vec<&str> = candidates
        .iter()
        .filter(|&&c| c.starts_with(key))
        .cloned()
        .collect();

    match matches.len() {
        1 => Ok(matches[0].to_string()),
        0 => Err(PipelineError::InvalidRequest(format!("Unknown key: '{}'", key))),
        _ => Err(PipelineError::InvalidRequest(format!(
            "Ambiguous key: '{}' matches {:?}",
            key, matches
        ))),
    }
}

/// Builds a selection from `city:Yangon,Mandalay gen:Female` style arguments.
///
/// Keys expand by unique prefix; values are comma separated and matched literally.
pub fn parse_selection(args: &[String]) -> Result<FilterSelection> {
    let parsed = parse_args(args);
    if let Some(extra) = parsed.positional.first() {
        return Err(PipelineError::InvalidRequest(format!(
            "expected key:value filter, got '{}'",
            extra
        )));
    }

    let mut selection = FilterSelection::new();
    for (key, values) in parsed.metadata {
        let field = CategoricalField::from_key(&key)?;
        for value in values.iter().flat_map(|v| v.split(',')) {
            let value = value.trim();
            if !value.is_empty() {
                selection.allow(field, value);
            }
        }
    }
    Ok(selection)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_simple() {
        let parsed = parse_args(&args(&["view", "city:Yangon", "gender:Female", "city:Mandalay"]));
        assert_eq!(parsed.positional, vec!["view".to_string()]);
        assert_eq!(
            parsed.metadata.get("city"),
            Some(&vec!["Yangon".to_string(), "Mandalay".to_string()])
        );
        assert_eq!(parsed.metadata.get("gender"), Some(&vec!["Female".to_string()]));
    }

    #[test]
    fn test_expand_key() {
        let candidates = vec!["city", "customer", "gender", "product", "payment"];

        assert_eq!(expand_key("ci", &candidates).unwrap(), "city");
        assert_eq!(expand_key("g", &candidates).unwrap(), "gender");
        assert_eq!(expand_key("city", &candidates).unwrap(), "city");
        assert_eq!(expand_key("pr", &candidates).unwrap(), "product");

        // Ambiguous
        assert!(expand_key("c", &candidates).is_err()); // matches city, customer
        assert!(expand_key("p", &candidates).is_err()); // matches product, payment

        // Unknown
        assert!(expand_key("x", &candidates).is_err());
    }

    #[test]
    fn test_parse_selection() {
        let selection = parse_selection(&args(&[
            "ci:Yangon,Mandalay",
            "prod:Health and beauty",
            "gen:Female",
        ]))
        .unwrap();

        let cities = selection.get(CategoricalField::City).unwrap();
        assert!(cities.contains("Yangon"));
        assert!(cities.contains("Mandalay"));
        assert!(selection.is_selected(CategoricalField::ProductLine, "Health and beauty"));
        assert!(selection.is_selected(CategoricalField::Gender, "Female"));
    }

    #[test]
    fn test_parse_selection_errors() {
        assert!(parse_selection(&args(&["c:Yangon"])).is_err());
        assert!(parse_selection(&args(&["Yangon"])).is_err());
        assert!(parse_selection(&args(&[])).unwrap().is_unconstrained());
    }
}

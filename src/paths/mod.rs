//! # Resource Path Matching
//!
//! Templated resource paths for routing commands to handlers by resource.
//! A pattern like `/orders/{orderId}` matched against `/orders/42` yields the
//! binding `orderId = "42"`.

use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Errors from parsing or matching resource paths
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("path must start with '/': {path}")]
    MissingLeadingSlash { path: String },

    #[error("path contains an empty segment: {path}")]
    EmptySegment { path: String },

    #[error("path {path} has {actual} segments, pattern {pattern} expects {expected}")]
    SegmentCountMismatch {
        pattern: String,
        path: String,
        expected: usize,
        actual: usize,
    },
}

/// Named path variables extracted from a resource path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathVariables(HashMap<String, String>);

impl PathVariables {
    /// Look up a variable by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over (name, value) bindings
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for PathVariables {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn split_segments(path: &str) -> Result<Vec<String>, PathError> {
    let Some(rest) = path.strip_prefix('/') else {
        return Err(PathError::MissingLeadingSlash {
            path: path.to_string(),
        });
    };
    if rest.is_empty() {
        return Ok(Vec::new());
    }
    let segments: Vec<String> = rest.split('/').map(str::to_string).collect();
    if segments.iter().any(String::is_empty) {
        return Err(PathError::EmptySegment {
            path: path.to_string(),
        });
    }
    Ok(segments)
}

/// A concrete resource path carried on an inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePath {
    segments: Vec<String>,
}

impl ResourcePath {
    /// Parse a concrete path such as `/orders/42`
    pub fn parse(path: &str) -> Result<Self, PathError> {
        Ok(Self {
            segments: split_segments(path)?,
        })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn length(&self) -> usize {
        self.segments.len()
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        if self.segments.is_empty() {
            write!(f, "/")?;
        }
        Ok(())
    }
}

/// A templated resource path with `{name}` placeholder segments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePathPattern {
    segments: Vec<String>,
}

impl ResourcePathPattern {
    /// Parse a pattern such as `/orders/{orderId}`
    pub fn parse(pattern: &str) -> Result<Self, PathError> {
        Ok(Self {
            segments: split_segments(pattern)?,
        })
    }

    pub fn length(&self) -> usize {
        self.segments.len()
    }

    /// Extract the placeholder bindings from a concrete path
    ///
    /// The path must have exactly as many segments as the pattern; literal
    /// segments are not compared, matching the routing model where the
    /// command type selects the handler and the path only carries variables.
    pub fn path_variable_values(&self, path: &ResourcePath) -> Result<PathVariables, PathError> {
        if path.length() != self.length() {
            return Err(PathError::SegmentCountMismatch {
                pattern: self.to_string(),
                path: path.to_string(),
                expected: self.length(),
                actual: path.length(),
            });
        }
        Ok(self
            .segments
            .iter()
            .zip(path.segments())
            .filter_map(|(template, value)| {
                placeholder_name(template).map(|name| (name.to_string(), value.clone()))
            })
            .collect())
    }
}

impl fmt::Display for ResourcePathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        if self.segments.is_empty() {
            write!(f, "/")?;
        }
        Ok(())
    }
}

fn placeholder_name(segment: &str) -> Option<&str> {
    segment.strip_prefix('{')?.strip_suffix('}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_missing_leading_slash() {
        assert!(matches!(
            ResourcePath::parse("orders/42"),
            Err(PathError::MissingLeadingSlash { .. })
        ));
        assert!(matches!(
            ResourcePathPattern::parse("orders/{orderId}"),
            Err(PathError::MissingLeadingSlash { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_empty_segment() {
        assert!(matches!(
            ResourcePath::parse("/orders//42"),
            Err(PathError::EmptySegment { .. })
        ));
    }

    #[test]
    fn test_single_variable_extraction() {
        let pattern = ResourcePathPattern::parse("/orders/{orderId}").unwrap();
        let path = ResourcePath::parse("/orders/42").unwrap();
        let vars = pattern.path_variable_values(&path).unwrap();
        assert_eq!(vars.len(), 1);
        assert_eq!(vars.get("orderId"), Some("42"));
    }

    #[test]
    fn test_multiple_variable_extraction() {
        let pattern =
            ResourcePathPattern::parse("/customers/{customerId}/orders/{orderId}").unwrap();
        let path = ResourcePath::parse("/customers/7/orders/42").unwrap();
        let vars = pattern.path_variable_values(&path).unwrap();
        assert_eq!(vars.get("customerId"), Some("7"));
        assert_eq!(vars.get("orderId"), Some("42"));
    }

    #[test]
    fn test_pattern_without_placeholders_yields_empty() {
        let pattern = ResourcePathPattern::parse("/orders").unwrap();
        let path = ResourcePath::parse("/orders").unwrap();
        let vars = pattern.path_variable_values(&path).unwrap();
        assert!(vars.is_empty());
    }

    #[test]
    fn test_segment_count_mismatch() {
        let pattern = ResourcePathPattern::parse("/orders/{orderId}").unwrap();
        let path = ResourcePath::parse("/orders/42/items").unwrap();
        let err = pattern.path_variable_values(&path).unwrap_err();
        assert!(matches!(err, PathError::SegmentCountMismatch { .. }));
    }

    #[test]
    fn test_display_round_trip() {
        let path = ResourcePath::parse("/orders/42").unwrap();
        assert_eq!(path.to_string(), "/orders/42");
        let pattern = ResourcePathPattern::parse("/orders/{orderId}").unwrap();
        assert_eq!(pattern.to_string(), "/orders/{orderId}");
    }
}

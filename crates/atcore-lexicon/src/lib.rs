//! Runtime validation of arbitrary JSON against AT Protocol lexicon schemas
//! (§4.11), plus the blob-reference data model (§2 L2 Records).

pub mod blob;
pub mod error;
pub mod schema;

pub use blob::{Blob, MimeType};
pub use error::{LexiconError, PathSegment, ValidationError};
pub use schema::{LexiconDoc, Schema};

use serde_json::Value;
use unicode_segmentation::UnicodeSegmentation;

/// Validate `value` against `schema`, accumulating every failure at the
/// current level rather than short-circuiting on the first one (§4.11).
pub fn validate(schema: &Schema, value: &Value) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    validate_at(schema, value, &mut Vec::new(), &mut errors);
    if !errors.is_empty() {
        tracing::debug!(count = errors.len(), "lexicon validation failed");
    }
    errors
}

fn validate_at(
    schema: &Schema,
    value: &Value,
    path: &mut Vec<PathSegment>,
    errors: &mut Vec<ValidationError>,
) {
    match schema {
        Schema::Null => {
            if !value.is_null() {
                push(errors, path, "expected null");
            }
        }
        Schema::Boolean => {
            if !value.is_boolean() {
                push(errors, path, "expected boolean");
            }
        }
        Schema::Integer {
            minimum,
            maximum,
            enum_values,
        } => match value.as_i64() {
            None => push(errors, path, "expected integer"),
            Some(n) => {
                if let Some(min) = minimum {
                    if n < *min {
                        push(errors, path, &format!("must be >= {min}"));
                    }
                }
                if let Some(max) = maximum {
                    if n > *max {
                        push(errors, path, &format!("must be <= {max}"));
                    }
                }
                if let Some(values) = enum_values {
                    if !values.contains(&n) {
                        push(errors, path, "not one of the allowed values");
                    }
                }
            }
        },
        Schema::String {
            min_length,
            max_length,
            max_graphemes,
            enum_values,
        } => match value.as_str() {
            None => push(errors, path, "expected string"),
            Some(s) => {
                let scalar_count = s.chars().count();
                if let Some(min) = min_length {
                    if scalar_count < *min {
                        push(errors, path, &format!("must be at least {min} characters"));
                    }
                }
                if let Some(max) = max_length {
                    if scalar_count > *max {
                        push(errors, path, &format!("must be at most {max} characters"));
                    }
                }
                if let Some(max) = max_graphemes {
                    let grapheme_count = s.graphemes(true).count();
                    if grapheme_count > *max {
                        push(errors, path, &format!("must be at most {max} graphemes"));
                    }
                }
                if let Some(values) = enum_values {
                    if !values.iter().any(|v| v.as_str() == s) {
                        push(errors, path, "not one of the allowed values");
                    }
                }
            }
        },
        Schema::Object {
            required,
            properties,
        } => match value.as_object() {
            None => push(errors, path, "expected object"),
            Some(obj) => {
                for field in required {
                    if !obj.contains_key(field.as_str()) {
                        path.push(PathSegment::Property(field.clone()));
                        errors.push(ValidationError {
                            path: path.clone(),
                            message: "missing required property".into(),
                        });
                        path.pop();
                    }
                }
                for (name, prop_schema) in properties {
                    if let Some(prop_value) = obj.get(name.as_str()) {
                        path.push(PathSegment::Property(name.clone()));
                        validate_at(prop_schema, prop_value, path, errors);
                        path.pop();
                    }
                }
            }
        },
        Schema::Array {
            items,
            min_length,
            max_length,
        } => match value.as_array() {
            None => push(errors, path, "expected array"),
            Some(arr) => {
                if let Some(min) = min_length {
                    if arr.len() < *min {
                        push(errors, path, &format!("must have at least {min} items"));
                    }
                }
                if let Some(max) = max_length {
                    if arr.len() > *max {
                        push(errors, path, &format!("must have at most {max} items"));
                    }
                }
                for (i, item) in arr.iter().enumerate() {
                    path.push(PathSegment::Index(i));
                    validate_at(items, item, path, errors);
                    path.pop();
                }
            }
        },
        Schema::Unknown | Schema::Bytes | Schema::CidLink | Schema::Blob | Schema::Const { .. } => {}
    }
}

fn push(errors: &mut Vec<ValidationError>, path: &[PathSegment], message: &str) {
    errors.push(ValidationError {
        path: path.to_vec(),
        message: message.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn object_required_fields_both_missing() {
        let schema = Schema::Object {
            required: vec!["name".into(), "age".into()],
            properties: BTreeMap::new(),
        };
        let errors = validate(&schema, &json!({}));
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].path, vec![PathSegment::Property("name".into())]);
        assert_eq!(errors[1].path, vec![PathSegment::Property("age".into())]);
    }

    #[test]
    fn nested_required_property_single_error() {
        let mut profile_props = BTreeMap::new();
        profile_props.insert(
            "email".into(),
            Schema::String {
                min_length: None,
                max_length: None,
                max_graphemes: None,
                enum_values: None,
            },
        );
        let mut props = BTreeMap::new();
        props.insert(
            "profile".into(),
            Schema::Object {
                required: vec!["email".into()],
                properties: profile_props,
            },
        );
        let schema = Schema::Object {
            required: vec!["profile".into()],
            properties: props,
        };
        let errors = validate(&schema, &json!({"profile": {}}));
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].path,
            vec![
                PathSegment::Property("profile".into()),
                PathSegment::Property("email".into())
            ]
        );
    }

    #[test]
    fn validates_post_like_record() {
        let mut properties = BTreeMap::new();
        properties.insert(
            "text".into(),
            Schema::String {
                min_length: None,
                max_length: Some(300),
                max_graphemes: None,
                enum_values: None,
            },
        );
        properties.insert(
            "createdAt".into(),
            Schema::String {
                min_length: None,
                max_length: None,
                max_graphemes: None,
                enum_values: None,
            },
        );
        let schema = Schema::Object {
            required: vec!["text".into(), "createdAt".into()],
            properties,
        };
        let value = json!({"text": "Hello, ATProto!", "createdAt": "2024-01-15T12:00:00Z"});
        assert!(validate(&schema, &value).is_empty());
    }

    #[test]
    fn array_item_errors_record_index() {
        let schema = Schema::Array {
            items: Box::new(Schema::Integer {
                minimum: Some(0),
                maximum: None,
                enum_values: None,
            }),
            min_length: None,
            max_length: None,
        };
        let errors = validate(&schema, &json!([1, -5, 3]));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, vec![PathSegment::Index(1)]);
    }

    #[test]
    fn max_graphemes_counts_extended_grapheme_clusters() {
        let schema = Schema::String {
            min_length: None,
            max_length: None,
            max_graphemes: Some(1),
            enum_values: None,
        };
        // a single "family" emoji is multiple code points but one grapheme
        let family = "\u{1F468}\u{200D}\u{1F469}\u{200D}\u{1F467}";
        assert!(validate(&schema, &json!(family)).is_empty());
    }

    #[test]
    fn unknown_bytes_cid_link_blob_accept_anything() {
        for schema in [Schema::Unknown, Schema::Bytes, Schema::CidLink, Schema::Blob] {
            assert!(validate(&schema, &json!({"whatever": 1})).is_empty());
            assert!(validate(&schema, &json!(null)).is_empty());
        }
    }
}

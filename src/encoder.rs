use serde::Deserialize;
use std::collections::HashMap;

use crate::error::EncodingError;

// On-disk shape: the sorted class list, code = position.
#[derive(Deserialize)]
pub(crate) struct EncoderJson {
    pub(crate) classes: Vec<String>,
}

/// Fixed bijection between category names and integer codes.
#[derive(Debug, Clone)]
pub struct CategoryEncoder {
    field: &'static str,
    classes: Vec<String>,
    codes: HashMap<String, i64>,
}

impl CategoryEncoder {
    /// Builds an encoder for `field`. Classes must be non-empty, unique and sorted,
    /// which is what makes `code = index` a bijection.
    pub fn new(field: &'static str, classes: Vec<String>) -> Result<Self, String> {
        if classes.is_empty() {
            return Err("encoder has no classes".to_string());
        }
        for pair in classes.windows(2) {
            if pair[0] >= pair[1] {
                return Err(format!(
                    "classes must be sorted and unique (`{}` before `{}`)",
                    pair[0], pair[1]
                ));
            }
        }
        let codes = classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i as i64))
            .collect();
        Ok(Self {
            field,
            classes,
            codes,
        })
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn contains(&self, value: &str) -> bool {
        self.codes.contains_key(value)
    }

    pub fn encode(&self, value: &str) -> Result<i64, EncodingError> {
        self.codes
            .get(value)
            .copied()
            .ok_or_else(|| EncodingError::UnknownCategory {
                field: self.field,
                value: value.to_string(),
            })
    }

    pub fn decode(&self, code: i64) -> Result<&str, EncodingError> {
        usize::try_from(code)
            .ok()
            .and_then(|i| self.classes.get(i))
            .map(String::as_str)
            .ok_or(EncodingError::UnknownCode {
                field: self.field,
                code,
                size: self.classes.len(),
            })
    }
}

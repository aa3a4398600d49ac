use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};
use crate::core::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    Text,
    Keyword,
    Long,
}

impl FieldType {
    /// Whether term positions are meaningful for phrase matching
    pub fn has_positions(&self) -> bool {
        matches!(self, FieldType::Text | FieldType::Keyword)
    }
}

/// Index-wide field registry, grown as documents introduce new field names.
/// A name keeps the type it was first indexed with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub fields: BTreeMap<String, FieldType>,
}

impl Schema {
    pub fn new() -> Self {
        Schema { fields: BTreeMap::new() }
    }

    pub fn get(&self, name: &str) -> Option<FieldType> {
        self.fields.get(name).copied()
    }

    /// Type of a field a query refers to; unknown names are an argument error
    pub fn require(&self, name: &str) -> Result<FieldType> {
        self.get(name)
            .ok_or_else(|| Error::invalid_argument(format!("unknown field '{}'", name)))
    }

    /// Returns true when the field was not known before
    pub fn register(&mut self, name: &str, field_type: FieldType) -> Result<bool> {
        match self.fields.get(name) {
            Some(existing) if *existing == field_type => Ok(false),
            Some(existing) => Err(Error::invalid_argument(format!(
                "field '{}' is {:?}, cannot index a {:?} value",
                name, existing, field_type
            ))),
            None => {
                self.fields.insert(name.to_string(), field_type);
                Ok(true)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

use serde::{Serialize, Deserialize};
use crate::schema::schema::FieldType;

/// Index-wide document identifier, assigned by the writer in increasing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocId(pub u64);

impl DocId {
    pub fn new(id: u64) -> Self {
        DocId(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for DocId {
    fn from(id: u64) -> Self {
        DocId(id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Text(String),      // Analyzed into positioned terms
    Keyword(String),   // Indexed verbatim as a single term
    Long(i64),         // Range index + doc value + decimal term
}

impl FieldValue {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::Text(_) => FieldType::Text,
            FieldValue::Keyword(_) => FieldType::Keyword,
            FieldValue::Long(_) => FieldType::Long,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) | FieldValue::Keyword(s) => Some(s),
            FieldValue::Long(_) => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            FieldValue::Long(v) => Some(*v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: FieldValue,
    pub indexed: bool,
    pub stored: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, value: FieldValue) -> Self {
        Field {
            name: name.into(),
            value,
            indexed: true,
            stored: true,
        }
    }

    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Field::new(name, FieldValue::Text(value.into()))
    }

    pub fn keyword(name: impl Into<String>, value: impl Into<String>) -> Self {
        Field::new(name, FieldValue::Keyword(value.into()))
    }

    pub fn long(name: impl Into<String>, value: i64) -> Self {
        Field::new(name, FieldValue::Long(value))
    }

    /// Index the value without keeping a retrievable copy
    pub fn unstored(mut self) -> Self {
        self.stored = false;
        self
    }

    /// Keep a retrievable copy without indexing the value
    pub fn stored_only(mut self) -> Self {
        self.indexed = false;
        self.stored = true;
        self
    }
}

/// A document as built by the caller: an ordered list of fields, names may repeat
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub fields: Vec<Field>,
}

impl Document {
    pub fn new() -> Self {
        Document { fields: Vec::new() }
    }

    pub fn add_field(&mut self, field: Field) {
        self.fields.push(field);
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// First value stored under `name`
    pub fn get_field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FieldValue> + 'a {
        self.fields.iter().filter(move |f| f.name == name).map(|f| &f.value)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

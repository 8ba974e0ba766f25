//! Avro object container reader.
//!
//! Each datum is converted into the tagged JSON tree the router expects: a
//! non-null union branch becomes `{"<branch name>": value}` (the Avro JSON
//! encoding), a null branch becomes `null`. Named branches are keyed by the
//! type's bare name, without its namespace, so the record union under `object`
//! turns into `{"<type>": {...}}` even when the writer schema declares a
//! namespace. Type names are matched against `name` and `dst_name`, which never
//! carry one.

use crate::error::{IngestError, Result};
use apache_avro::schema::{Name, Schema};
use apache_avro::types::Value as AvroValue;
use apache_avro::Reader;
use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

type NamedSchemas = HashMap<Name, Schema>;

pub struct AvroContainerReader<R: Read> {
    reader: Reader<'static, R>,
    schema: Schema,
    names: NamedSchemas,
    path: PathBuf,
    index: usize,
    failed: bool,
}

impl<R: Read> AvroContainerReader<R> {
    /// Reads the container header; a bad header is reported as [`IngestError::Header`].
    pub fn new(reader: R, path: &Path) -> Result<Self> {
        let reader = Reader::new(reader).map_err(|err| IngestError::Header {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        let schema = reader.writer_schema().clone();
        let mut names = NamedSchemas::new();
        collect_named(&schema, &mut names);
        Ok(Self {
            reader,
            schema,
            names,
            path: path.to_path_buf(),
            index: 0,
            failed: false,
        })
    }
}

impl<R: Read> Iterator for AvroContainerReader<R> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let datum = self.reader.next()?;
        let index = self.index;
        self.index += 1;
        match datum {
            Ok(datum) => Some(Ok(to_tagged(datum, &self.schema, &self.names))),
            Err(err) => {
                self.failed = true;
                Some(Err(IngestError::Decode {
                    path: self.path.clone(),
                    index,
                    message: err.to_string(),
                }))
            }
        }
    }
}

fn collect_named(schema: &Schema, names: &mut NamedSchemas) {
    match schema {
        Schema::Record(record) => {
            if names.contains_key(&record.name) {
                return;
            }
            names.insert(record.name.clone(), schema.clone());
            for field in &record.fields {
                collect_named(&field.schema, names);
            }
        }
        Schema::Enum(e) => {
            names.insert(e.name.clone(), schema.clone());
        }
        Schema::Fixed(f) => {
            names.insert(f.name.clone(), schema.clone());
        }
        Schema::Union(union) => {
            for variant in union.variants() {
                collect_named(variant, names);
            }
        }
        Schema::Array(array) => collect_named(&array.items, names),
        Schema::Map(map) => collect_named(&map.types, names),
        _ => {}
    }
}

fn branch_name(schema: &Schema) -> String {
    match schema {
        Schema::Null => "null".to_string(),
        Schema::Boolean => "boolean".to_string(),
        Schema::Int => "int".to_string(),
        Schema::Long => "long".to_string(),
        Schema::Float => "float".to_string(),
        Schema::Double => "double".to_string(),
        Schema::Bytes => "bytes".to_string(),
        Schema::String => "string".to_string(),
        Schema::Array(_) => "array".to_string(),
        Schema::Map(_) => "map".to_string(),
        Schema::Record(record) => record.name.name.clone(),
        Schema::Enum(e) => e.name.name.clone(),
        Schema::Fixed(f) => f.name.name.clone(),
        Schema::Ref { name } => name.name.clone(),
        _ => "string".to_string(),
    }
}

fn to_tagged(value: AvroValue, schema: &Schema, names: &NamedSchemas) -> Value {
    match (value, schema) {
        (value, Schema::Ref { name }) => match names.get(name) {
            Some(resolved) => to_tagged(value, resolved, names),
            None => plain(value),
        },
        (AvroValue::Union(index, inner), Schema::Union(union)) => {
            let inner = *inner;
            match (inner, union.variants().get(index as usize)) {
                (AvroValue::Null, _) => Value::Null,
                (inner, Some(branch)) => {
                    let mut wrapper = Map::new();
                    wrapper.insert(branch_name(branch), to_tagged(inner, branch, names));
                    Value::Object(wrapper)
                }
                (inner, None) => plain(inner),
            }
        }
        (AvroValue::Record(fields), Schema::Record(record)) => Value::Object(
            fields
                .into_iter()
                .map(|(name, value)| {
                    let field_schema = record
                        .lookup
                        .get(&name)
                        .and_then(|&i| record.fields.get(i))
                        .map(|field| &field.schema);
                    let value = match field_schema {
                        Some(field_schema) => to_tagged(value, field_schema, names),
                        None => plain(value),
                    };
                    (name, value)
                })
                .collect(),
        ),
        (AvroValue::Array(items), Schema::Array(array)) => Value::Array(
            items
                .into_iter()
                .map(|item| to_tagged(item, &array.items, names))
                .collect(),
        ),
        (AvroValue::Map(entries), Schema::Map(map)) => Value::Object(
            entries
                .into_iter()
                .map(|(key, value)| (key, to_tagged(value, &map.types, names)))
                .collect(),
        ),
        (value, _) => plain(value),
    }
}

fn float(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

fn bytes(b: Vec<u8>) -> Value {
    Value::Array(b.into_iter().map(Value::from).collect())
}

/// Schema-free conversion; unions lose their branch tag.
fn plain(value: AvroValue) -> Value {
    match value {
        AvroValue::Null => Value::Null,
        AvroValue::Boolean(b) => Value::Bool(b),
        AvroValue::Int(i) => Value::from(i),
        AvroValue::Long(l) => Value::from(l),
        AvroValue::Float(f) => float(f64::from(f)),
        AvroValue::Double(d) => float(d),
        AvroValue::Bytes(b) => bytes(b),
        AvroValue::Fixed(_, b) => bytes(b),
        AvroValue::String(s) => Value::String(s),
        AvroValue::Enum(_, symbol) => Value::String(symbol),
        AvroValue::Union(_, inner) => plain(*inner),
        AvroValue::Array(items) => Value::Array(items.into_iter().map(plain).collect()),
        AvroValue::Map(entries) => {
            Value::Object(entries.into_iter().map(|(k, v)| (k, plain(v))).collect())
        }
        AvroValue::Record(fields) => {
            Value::Object(fields.into_iter().map(|(k, v)| (k, plain(v))).collect())
        }
        other => Value::String(format!("{other:?}")),
    }
}

//! Record sources.
//!
//! The router consumes decoded records one at a time. Two decoders feed it:
//!
//! - [`JsonRecordReader`]: a stream of JSON documents in Avro's JSON encoding
//!   (what `avro-tools tojson` prints), where unions are single-key maps.
//! - `AvroContainerReader` (feature `avro`): an Avro object container file,
//!   converted datum by datum into the same tagged JSON form.
//!
//! Both yield `Result<Value, IngestError>`; any `Err` ends the load.

use crate::error::{IngestError, Result};
use serde::{Deserialize, Serialize};
use serde_json::de::IoRead;
use serde_json::{StreamDeserializer, Value};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputFormat {
    Json,
    Avro,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" | "jsonl" | "ndjson" => Some(InputFormat::Json),
            "avro" | "pfb" => Some(InputFormat::Avro),
            _ => None,
        }
    }
}

/// Boxed record stream.
pub type Records = Box<dyn Iterator<Item = Result<Value>>>;

pub struct JsonRecordReader<R: Read> {
    stream: StreamDeserializer<'static, IoRead<R>, Value>,
    path: PathBuf,
    index: usize,
    failed: bool,
}

impl<R: Read> JsonRecordReader<R> {
    /// `path` is only used in error messages.
    pub fn new(reader: R, path: impl Into<PathBuf>) -> Self {
        Self {
            stream: serde_json::Deserializer::from_reader(reader).into_iter::<Value>(),
            path: path.into(),
            index: 0,
            failed: false,
        }
    }
}

impl<R: Read> Iterator for JsonRecordReader<R> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.stream.next()?;
        let index = self.index;
        self.index += 1;
        Some(item.map_err(|err| {
            self.failed = true;
            IngestError::Decode {
                path: self.path.clone(),
                index,
                message: err.to_string(),
            }
        }))
    }
}

/// Opens `path` as a record stream of the given format.
pub fn open_records(path: &Path, format: InputFormat) -> Result<Records> {
    let file = File::open(path).map_err(|source| IngestError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    match format {
        InputFormat::Json => Ok(Box::new(JsonRecordReader::new(BufReader::new(file), path))),
        InputFormat::Avro => open_avro(BufReader::new(file), path),
    }
}

#[cfg(feature = "avro")]
fn open_avro(reader: BufReader<File>, path: &Path) -> Result<Records> {
    Ok(Box::new(crate::avro::AvroContainerReader::new(reader, path)?))
}

#[cfg(not(feature = "avro"))]
fn open_avro(_reader: BufReader<File>, _path: &Path) -> Result<Records> {
    Err(IngestError::FormatDisabled { format: "avro" })
}

//! Parser for the CSV content type. Header row supplies field names; each
//! subsequent row becomes one JSON object. Also backs the static GTFS
//! content type, since a GTFS feed is itself a collection of CSV tables --
//! this implementation treats one buffered GTFS blob as one CSV table.
use crate::{ContentParser, ParseError};
use models::ContentType;
use serde_json::{Map, Value};

pub struct CsvParser {
    content_type: ContentType,
}

impl CsvParser {
    pub fn new(content_type: ContentType) -> Self {
        CsvParser { content_type }
    }
}

impl ContentParser for CsvParser {
    fn parse(&self, bytes: &[u8]) -> Result<Vec<Value>, ParseError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(bytes);
        let headers = reader.headers()?.clone();

        let mut records = Vec::new();
        for result in reader.records() {
            let record = result?;
            let mut object = Map::with_capacity(headers.len());
            for (field, value) in headers.iter().zip(record.iter()) {
                object.insert(field.to_string(), Value::String(value.to_string()));
            }
            records.push(Value::Object(object));
        }
        Ok(records)
    }

    fn serialize(&self, value: &Value) -> Result<Vec<u8>, ParseError> {
        let object = value.as_object().ok_or_else(|| {
            ParseError::TypeMismatch(self.content_type, "expected a JSON object".into())
        })?;

        let mut writer = csv::WriterBuilder::new().has_headers(true).from_writer(vec![]);
        let headers: Vec<&str> = object.keys().map(String::as_str).collect();
        writer.write_record(&headers)?;

        let row: Vec<String> = object
            .values()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();
        writer.write_record(&row)?;

        writer.into_inner().map_err(|e| e.into_error().into())
    }

    fn content_type(&self) -> ContentType {
        self.content_type
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_header_and_rows() {
        let parser = CsvParser::new(ContentType::Csv);
        let records = parser.parse(b"a,b\n1,2\n3,4\n").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["a"], "1");
        assert_eq!(records[1]["b"], "4");
    }
}

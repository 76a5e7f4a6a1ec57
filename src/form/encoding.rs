use std::fmt::{Display, Formatter};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rand::Rng;
use rand::distributions::Alphanumeric;
use url::form_urlencoded;

use super::controller::{FormError, FormResult};
use super::files::FileEntry;
use super::validation::FormModel;

const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const MAX_BOUNDARY_LEN: usize = 70;

pub fn encode_uri_component(input: &str) -> String {
    utf8_percent_encode(input, URI_COMPONENT).to_string()
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FormDataValue {
    Text(String),
    File(FileEntry),
}

impl FormDataValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FormDataValue::Text(text) => Some(text),
            FormDataValue::File(_) => None,
        }
    }
}

impl From<String> for FormDataValue {
    fn from(value: String) -> Self {
        FormDataValue::Text(value)
    }
}

impl From<&str> for FormDataValue {
    fn from(value: &str) -> Self {
        FormDataValue::Text(value.to_string())
    }
}

impl From<FileEntry> for FormDataValue {
    fn from(value: FileEntry) -> Self {
        FormDataValue::File(value)
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FormData {
    entries: Vec<(String, FormDataValue)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_model<M: FormModel>(model: &M) -> Self {
        let mut data = Self::new();
        for (key, value) in model.field_strings() {
            data.set(key.as_str(), value);
        }
        data
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FormDataValue>) {
        set_entry(&mut self.entries, name.into(), value.into());
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<FormDataValue>) {
        self.entries.push((name.into(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&FormDataValue> {
        self.entries
            .iter()
            .find_map(|(entry, value)| (entry == name).then_some(value))
    }

    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FormDataValue::as_text)
    }

    pub fn get_all(&self, name: &str) -> Vec<&FormDataValue> {
        self.entries
            .iter()
            .filter_map(|(entry, value)| (entry == name).then_some(value))
            .collect()
    }

    pub fn has(&self, name: &str) -> bool {
        self.entries.iter().any(|(entry, _)| entry == name)
    }

    pub fn delete(&mut self, name: &str) {
        self.entries.retain(|(entry, _)| entry != name);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FormDataValue)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn generate_boundary() -> String {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(24)
            .map(char::from)
            .collect();
        format!("----calmformBoundary{suffix}")
    }

    pub fn to_multipart(&self, boundary: &str) -> FormResult<Vec<u8>> {
        validate_boundary(boundary)?;

        let mut body = Vec::new();
        for (name, value) in &self.entries {
            body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            match value {
                FormDataValue::Text(text) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                            escape_disposition(name)
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(normalize_newlines(text).as_bytes());
                }
                FormDataValue::File(file) => {
                    let content_type = file
                        .content_type
                        .as_deref()
                        .unwrap_or("application/octet-stream");
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                             Content-Type: {content_type}\r\n\r\n",
                            escape_disposition(name),
                            escape_disposition(&file.name)
                        )
                        .as_bytes(),
                    );
                    if let Some(contents) = &file.contents {
                        body.extend_from_slice(contents);
                    }
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
        Ok(body)
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct UrlSearchParams {
    pairs: Vec<(String, String)>,
}

impl UrlSearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// One pair per field whose value is the `encode_uri_component` form of
    /// the field's string. Rendering the container encodes it a second time,
    /// so `"a@b"` is serialized as `a%2540b`.
    pub fn from_model<M: FormModel>(model: &M) -> Self {
        let mut params = Self::new();
        for (key, value) in model.field_strings() {
            params.set(key.as_str(), encode_uri_component(&value));
        }
        params
    }

    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self {
            pairs: form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
        }
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        set_entry(&mut self.pairs, name.into(), value.into());
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find_map(|(entry, value)| (entry == name).then_some(value.as_str()))
    }

    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter_map(|(entry, value)| (entry == name).then_some(value.as_str()))
            .collect()
    }

    pub fn has(&self, name: &str) -> bool {
        self.pairs.iter().any(|(entry, _)| entry == name)
    }

    pub fn delete(&mut self, name: &str) {
        self.pairs.retain(|(entry, _)| entry != name);
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl Display for UrlSearchParams {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish();
        f.write_str(&encoded)
    }
}

fn set_entry<V>(entries: &mut Vec<(String, V)>, name: String, value: V) {
    match entries.iter().position(|(entry, _)| *entry == name) {
        Some(first) => {
            entries[first].1 = value;
            let mut index = 0;
            entries.retain(|(entry, _)| {
                let keep = index <= first || *entry != name;
                index += 1;
                keep
            });
        }
        None => entries.push((name, value)),
    }
}

fn validate_boundary(boundary: &str) -> FormResult<()> {
    let valid_chars = boundary.bytes().all(|byte| {
        byte.is_ascii_alphanumeric() || b"'()+_,-./:=? ".contains(&byte)
    });
    if boundary.is_empty()
        || boundary.len() > MAX_BOUNDARY_LEN
        || boundary.ends_with(' ')
        || !valid_chars
    {
        return Err(FormError::InvalidBoundary(boundary.to_string()));
    }
    Ok(())
}

fn escape_disposition(value: &str) -> String {
    value
        .replace('\r', "%0D")
        .replace('\n', "%0A")
        .replace('"', "%22")
}

fn normalize_newlines(value: &str) -> String {
    value
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\n', "\r\n")
}

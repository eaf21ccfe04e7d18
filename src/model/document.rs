use serde::Serialize;

/// A rendered receipt, ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn handle(&self) -> DocumentHandle {
        DocumentHandle {
            file_name: self.file_name.clone(),
            content_type: self.content_type.clone(),
            size_bytes: self.bytes.len(),
        }
    }
}

/// What a fulfillment job remembers about its rendered document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentHandle {
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: usize,
}

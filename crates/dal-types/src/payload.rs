use bytes::Bytes;

use crate::fingerprint::Fingerprint;

/// Raw document bytes plus an optional declared media type.
///
/// The payload is immutable once read: the bytes are held in a reference
/// counted [`Bytes`] buffer, so handing the payload to a store client is a
/// cheap clone rather than a copy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentPayload {
    bytes: Bytes,
    media_type: Option<String>,
}

impl DocumentPayload {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            media_type: None,
        }
    }

    /// Attach a declared media type (e.g. `application/pdf`).
    ///
    /// Blank media types are treated as undeclared.
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        let media_type = media_type.into();
        self.media_type = if media_type.trim().is_empty() {
            None
        } else {
            Some(media_type)
        };
        self
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The locally computed content fingerprint of the payload bytes.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::from_content(&self.bytes)
    }
}

impl From<Vec<u8>> for DocumentPayload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&'static [u8]> for DocumentPayload {
    fn from(bytes: &'static [u8]) -> Self {
        Self::new(Bytes::from_static(bytes))
    }
}

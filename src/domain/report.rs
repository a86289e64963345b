/// One failure travelling to the error sink: what went wrong, and the raw
/// bytes that caused it (empty when there were none).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub message: String,
    pub body: Vec<u8>,
}

impl ErrorReport {
    pub fn new(message: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            message: message.into(),
            body,
        }
    }

    /// Rendering written to the error log: message line, body, newline.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.message.len() + self.body.len() + 2);
        out.extend_from_slice(self.message.as_bytes());
        out.push(b'\n');
        out.extend_from_slice(&self.body);
        out.push(b'\n');
        out
    }
}

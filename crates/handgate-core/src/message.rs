//! Inbound message model
//!
//! Mirrors the shape of an OSC message (address pattern plus typed
//! arguments) without tying the core to a particular OSC library.

/// A raw inbound argument
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    String(String),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bool(bool),
    Blob(Vec<u8>),
    Nil,
    /// Any other OSC type, identified by its type tag
    Other(char),
}

impl Arg {
    /// Get the string contents, if this is a string argument
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Arg::String(s) => Some(s),
            _ => None,
        }
    }

    /// OSC type tag for this argument
    pub fn type_tag(&self) -> char {
        match self {
            Arg::String(_) => 's',
            Arg::Int(_) => 'i',
            Arg::Long(_) => 'h',
            Arg::Float(_) => 'f',
            Arg::Double(_) => 'd',
            Arg::Bool(true) => 'T',
            Arg::Bool(false) => 'F',
            Arg::Blob(_) => 'b',
            Arg::Nil => 'N',
            Arg::Other(tag) => *tag,
        }
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::String(s.to_string())
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Arg::String(s)
    }
}

/// One message as received from the peer
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingMessage {
    /// Address pattern, including the leading `/`
    pub address: String,
    /// Arguments in wire order
    pub args: Vec<Arg>,
}

impl IncomingMessage {
    pub fn new(address: impl Into<String>, args: Vec<Arg>) -> Self {
        Self {
            address: address.into(),
            args,
        }
    }

    /// Message carrying a single JSON string argument
    pub fn with_json(address: impl Into<String>, json: impl Into<String>) -> Self {
        Self::new(address, vec![Arg::String(json.into())])
    }

    /// Address with the leading delimiter removed
    ///
    /// Returns `None` when the address does not start with `/`.
    pub fn pattern_name(&self) -> Option<&str> {
        self.address.strip_prefix('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_name_strips_delimiter() {
        let msg = IncomingMessage::with_json("/left_hand", "{}");
        assert_eq!(msg.pattern_name(), Some("left_hand"));
    }

    #[test]
    fn test_pattern_name_requires_delimiter() {
        let msg = IncomingMessage::with_json("connect", "{}");
        assert_eq!(msg.pattern_name(), None);
    }

    #[test]
    fn test_type_tags() {
        assert_eq!(Arg::from("x").type_tag(), 's');
        assert_eq!(Arg::Bool(true).type_tag(), 'T');
        assert_eq!(Arg::Double(0.5).type_tag(), 'd');
    }
}

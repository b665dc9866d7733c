//! Two-level XML envelope.

use std::borrow::Cow;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::ProtocolError;
use crate::security::redact::redact_payload;

pub const CONTENT_ELEMENT: &str = "content";
pub const REQUEST_ROOT: &str = "operation_in";
pub const RESPONSE_ROOT: &str = "operation_out";

/// A parsed envelope: root name plus the leaf fields of `content`, in
/// document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Envelope {
    pub root: String,
    pub fields: Vec<(String, String)>,
}

impl Envelope {
    pub fn new(root: &str) -> Self {
        Self {
            root: root.to_string(),
            fields: Vec::new(),
        }
    }

    pub fn push(&mut self, name: &str, value: &str) {
        self.fields.push((name.to_string(), value.to_string()));
    }

    /// First field with the given name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Serialize with an UTF-8 XML declaration. Field order is preserved.
    pub fn to_xml(&self) -> Result<String, ProtocolError> {
        let mut writer = Writer::new(Vec::new());

        write(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        write(&mut writer, Event::Start(BytesStart::new(self.root.as_str())))?;
        write(&mut writer, Event::Start(BytesStart::new(CONTENT_ELEMENT)))?;
        for (name, value) in &self.fields {
            write(&mut writer, Event::Start(BytesStart::new(name.as_str())))?;
            write(&mut writer, Event::Text(BytesText::new(value)))?;
            write(&mut writer, Event::End(BytesEnd::new(name.as_str())))?;
        }
        write(&mut writer, Event::End(BytesEnd::new(CONTENT_ELEMENT)))?;
        write(&mut writer, Event::End(BytesEnd::new(self.root.as_str())))?;

        String::from_utf8(writer.into_inner()).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    /// Parse an envelope, reading the first `content` child of the root.
    pub fn parse(xml: &str) -> Result<Self, ProtocolError> {
        let mut reader = Reader::from_str(xml);

        // Open element names from the root down.
        let mut path: Vec<String> = Vec::new();
        let mut root: Option<String> = None;
        let mut seen_content = false;
        let mut in_content = false;
        let mut fields = Vec::new();
        let mut leaf_text = String::new();

        loop {
            let event = reader
                .read_event()
                .map_err(|e| decode_error(xml, format!("malformed XML: {}", e)))?;

            match event {
                Event::Start(e) => {
                    let name = element_name(xml, e.name().as_ref())?;
                    match path.len() {
                        0 => root = Some(name.clone()),
                        1 if name == CONTENT_ELEMENT && !seen_content => {
                            seen_content = true;
                            in_content = true;
                        }
                        2 if in_content => leaf_text.clear(),
                        3 if in_content => {
                            return Err(decode_error(
                                xml,
                                format!("unexpected nested element {} in {}", name, path[2]),
                            ));
                        }
                        _ => {}
                    }
                    path.push(name);
                }
                Event::Empty(e) => {
                    let name = element_name(xml, e.name().as_ref())?;
                    match path.len() {
                        0 => {
                            root = Some(name);
                            break;
                        }
                        1 if name == CONTENT_ELEMENT && !seen_content => seen_content = true,
                        2 if in_content => fields.push((name, String::new())),
                        3 if in_content => {
                            return Err(decode_error(
                                xml,
                                format!("unexpected nested element {} in {}", name, path[2]),
                            ));
                        }
                        _ => {}
                    }
                }
                Event::Text(t) => {
                    if in_content && path.len() == 3 {
                        let text = t
                            .unescape()
                            .map_err(|e| decode_error(xml, format!("invalid text: {}", e)))?;
                        leaf_text.push_str(&text);
                    }
                }
                Event::CData(c) => {
                    if in_content && path.len() == 3 {
                        let bytes = c.into_inner();
                        let text = std::str::from_utf8(&bytes)
                            .map_err(|e| decode_error(xml, format!("invalid CDATA: {}", e)))?;
                        leaf_text.push_str(text);
                    }
                }
                Event::End(_) => {
                    if in_content && path.len() == 3 {
                        fields.push((path[2].clone(), std::mem::take(&mut leaf_text)));
                    } else if in_content && path.len() == 2 {
                        in_content = false;
                    }
                    path.pop();
                    if path.is_empty() {
                        break;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        let root = match root {
            Some(root) => root,
            None => return Err(decode_error(xml, "empty payload".to_string())),
        };
        if !path.is_empty() {
            return Err(decode_error(
                xml,
                format!("truncated payload, unclosed element {}", path[path.len() - 1]),
            ));
        }
        if !seen_content {
            return Err(decode_error(
                xml,
                format!("missing element {}", CONTENT_ELEMENT),
            ));
        }

        Ok(Self { root, fields })
    }
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), ProtocolError> {
    writer
        .write_event(event)
        .map_err(|e| ProtocolError::Encode(e.to_string()))
}

fn element_name(xml: &str, raw: &[u8]) -> Result<String, ProtocolError> {
    match String::from_utf8_lossy(raw) {
        Cow::Borrowed(name) => Ok(name.to_string()),
        Cow::Owned(_) => Err(decode_error(xml, "element name is not UTF-8".to_string())),
    }
}

/// Decode failure with the redacted payload attached.
pub(crate) fn decode_error(xml: &str, reason: String) -> ProtocolError {
    ProtocolError::Decode {
        reason,
        payload: redact_payload(xml),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_xml_shape_and_order() {
        let mut envelope = Envelope::new(REQUEST_ROOT);
        envelope.push("dbtype", "2");
        envelope.push("dbtns", "ORCLTNS");
        envelope.push("remark", "");

        let xml = envelope.to_xml().unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(
            "<operation_in><content><dbtype>2</dbtype><dbtns>ORCLTNS</dbtns>\
             <remark></remark></content></operation_in>"
        ));
    }

    #[test]
    fn test_to_xml_escapes_text() {
        let mut envelope = Envelope::new(REQUEST_ROOT);
        envelope.push("hostapp", "a<b>&c");
        let xml = envelope.to_xml().unwrap();
        assert!(xml.contains("<hostapp>a&lt;b&gt;&amp;c</hostapp>"));

        let parsed = Envelope::parse(&xml).unwrap();
        assert_eq!(parsed.get("hostapp"), Some("a<b>&c"));
    }

    #[test]
    fn test_parse_ignores_root_name_and_whitespace_between_fields() {
        let xml = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<anything>\n  <content>\n    \
                   <resultcode>1</resultcode>\n    <dbuser>app_user</dbuser>\n    \
                   <errormsg/>\n  </content>\n</anything>";
        let parsed = Envelope::parse(xml).unwrap();
        assert_eq!(parsed.root, "anything");
        assert_eq!(parsed.field_names(), vec!["resultcode", "dbuser", "errormsg"]);
        assert_eq!(parsed.get("resultcode"), Some("1"));
        assert_eq!(parsed.get("errormsg"), Some(""));
    }

    #[test]
    fn test_parse_keeps_leaf_whitespace_and_cdata() {
        let xml = "<r><content><a>  padded  </a><b><![CDATA[x<y]]></b></content></r>";
        let parsed = Envelope::parse(xml).unwrap();
        assert_eq!(parsed.get("a"), Some("  padded  "));
        assert_eq!(parsed.get("b"), Some("x<y"));
    }

    #[test]
    fn test_parse_uses_first_content_only() {
        let xml = "<r><header><a>skip</a></header><content><a>1</a></content>\
                   <content><a>2</a></content></r>";
        let parsed = Envelope::parse(xml).unwrap();
        assert_eq!(parsed.fields, vec![("a".to_string(), "1".to_string())]);
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        let cases = [
            ("", "empty payload"),
            ("<r><other/></r>", "missing element content"),
            ("<r/>", "missing element content"),
            ("<r><content><a><b>1</b></a></content></r>", "unexpected nested element b"),
            ("<r><content><a>1</b></content></r>", "malformed XML"),
        ];
        for (xml, expected) in cases {
            match Envelope::parse(xml) {
                Err(ProtocolError::Decode { reason, .. }) => {
                    assert!(reason.contains(expected), "{:?} -> {}", xml, reason)
                }
                other => panic!("expected decode error for {:?}, got {:?}", xml, other),
            }
        }
    }

    #[test]
    fn test_parse_rejects_truncated_payload() {
        match Envelope::parse("<r><content><a>1</a>") {
            Err(ProtocolError::Decode { reason, .. }) => assert!(
                reason.contains("truncated payload") || reason.contains("malformed XML"),
                "{}",
                reason
            ),
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_error_payload_is_redacted() {
        let xml = "<r><content><dbuserpwd>CAFEBABE</dbuserpwd><x>";
        match Envelope::parse(xml) {
            Err(ProtocolError::Decode { payload, .. }) => {
                assert!(!payload.contains("CAFEBABE"));
                assert!(payload.contains("[REDACTED]"));
            }
            other => panic!("expected decode error, got {:?}", other),
        }
    }
}

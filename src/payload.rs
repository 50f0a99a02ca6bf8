use crate::entry::LogEntry;
use serde::ser::Error as _;
use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::value::RawValue;
use serde_json::Value;
use std::io;

/// Level label written into every payload, whatever the entry's own level.
pub const PAYLOAD_LEVEL: &str = "error";

/// Wire document accepted by the log-collection service.
///
/// Field order is part of the wire format. `request_param` holds JSON that
/// was already marshaled from the entry, so it is embedded as-is rather
/// than encoded a second time as a string.
#[derive(Debug, Serialize)]
pub struct LogPayload<'a> {
    pub level: &'static str,
    pub route: Option<&'a Value>,
    pub request_param: Box<RawValue>,
    pub record: &'a str,
    pub belong_system: &'a str,
}

impl<'a> LogPayload<'a> {
    /// Build the payload for `entry` on behalf of the system `belong_system`.
    ///
    /// **Returns**
    /// - `Err(..)` if the entry's `request_param` could not be marshaled.
    pub fn from_entry(entry: &'a LogEntry, belong_system: &'a str) -> Result<Self, serde_json::Error> {
        let encoded = to_vec_html_safe(&entry.request_param())?;
        let encoded = String::from_utf8(encoded).map_err(serde_json::Error::custom)?;
        let request_param = RawValue::from_string(encoded)?;

        Ok(LogPayload {
            level: PAYLOAD_LEVEL,
            route: entry.route(),
            request_param,
            record: &entry.message,
            belong_system,
        })
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        to_vec_html_safe(self)
    }
}

/// Compact JSON that additionally escapes `<`, `>`, `&`, U+2028 and U+2029
/// as `\uXXXX`, matching the bytes the collection service already receives
/// from other producers.
pub fn to_vec_html_safe<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::with_capacity(128);
    let mut ser = serde_json::Serializer::with_formatter(&mut out, HtmlSafeFormatter);
    value.serialize(&mut ser)?;
    Ok(out)
}

struct HtmlSafeFormatter;

impl Formatter for HtmlSafeFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (i, ch) in fragment.char_indices() {
            let escaped = match ch {
                '<' => "\\u003c",
                '>' => "\\u003e",
                '&' => "\\u0026",
                '\u{2028}' => "\\u2028",
                '\u{2029}' => "\\u2029",
                _ => continue,
            };
            writer.write_all(fragment[start..i].as_bytes())?;
            writer.write_all(escaped.as_bytes())?;
            start = i + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{REQUEST_PARAM_KEY, ROUTE_KEY};
    use rstest::rstest;
    use serde_json::json;
    use tracing::Level;

    fn encode(entry: &LogEntry, system: &str) -> String {
        let payload = LogPayload::from_entry(entry, system).expect("build payload");
        String::from_utf8(payload.to_vec().expect("serialize payload")).expect("utf8")
    }

    #[test]
    fn encodes_fixed_shape_document() {
        let entry = LogEntry::new(Level::ERROR, "user lookup failed")
            .with_data(ROUTE_KEY, "/api/users")
            .with_data(REQUEST_PARAM_KEY, json!({"page": 2, "id": 7}));

        assert_eq!(
            encode(&entry, "accounts"),
            r#"{"level":"error","route":"/api/users","request_param":{"id":7,"page":2},"record":"user lookup failed","belong_system":"accounts"}"#
        );
    }

    #[test]
    fn absent_fields_encode_as_null() {
        let entry = LogEntry::new(Level::ERROR, "bare");

        assert_eq!(
            encode(&entry, "svc"),
            r#"{"level":"error","route":null,"request_param":null,"record":"bare","belong_system":"svc"}"#
        );
    }

    #[test]
    fn escapes_html_characters_everywhere() {
        let entry = LogEntry::new(Level::ERROR, "a<b>&c\u{2028}d\u{2029}")
            .with_data(ROUTE_KEY, "/search?q=<x>&n=1")
            .with_data(REQUEST_PARAM_KEY, json!({"q": "fish & chips"}));

        assert_eq!(
            encode(&entry, "R&D"),
            r#"{"level":"error","route":"/search?q=\u003cx\u003e\u0026n=1","request_param":{"q":"fish \u0026 chips"},"record":"a\u003cb\u003e\u0026c\u2028d\u2029","belong_system":"R\u0026D"}"#
        );
    }

    #[test]
    fn escaped_output_still_parses_back() {
        let entry = LogEntry::new(Level::ERROR, "tab\there <ok>\n")
            .with_data(ROUTE_KEY, json!({"path": "/a&b", "list": [1, "\u{2028}"]}));
        let doc: Value = serde_json::from_str(&encode(&entry, "svc")).unwrap();

        assert_eq!(doc["record"], json!("tab\there <ok>\n"));
        assert_eq!(doc["route"], json!({"path": "/a&b", "list": [1, "\u{2028}"]}));
    }

    #[test]
    fn string_request_param_stays_a_json_string() {
        let entry = LogEntry::new(Level::ERROR, "m").with_data(REQUEST_PARAM_KEY, "a=1&b=2");
        let doc: Value = serde_json::from_str(&encode(&entry, "svc")).unwrap();

        assert_eq!(doc["request_param"], json!("a=1&b=2"));
    }

    #[rstest]
    #[case(Level::TRACE)]
    #[case(Level::DEBUG)]
    #[case(Level::INFO)]
    #[case(Level::WARN)]
    #[case(Level::ERROR)]
    fn level_is_always_error(#[case] level: Level) {
        let entry = LogEntry::new(level, "m");
        let doc: Value = serde_json::from_str(&encode(&entry, "svc")).unwrap();

        assert_eq!(doc["level"], json!("error"));
    }

    #[test]
    fn belong_system_ignores_entry_data() {
        let entry = LogEntry::new(Level::ERROR, "m")
            .with_data("belong_system", "spoofed")
            .with_data("service_name", "spoofed");
        let doc: Value = serde_json::from_str(&encode(&entry, "billing")).unwrap();

        assert_eq!(doc["belong_system"], json!("billing"));
        assert_eq!(doc.as_object().unwrap().len(), 5);
    }

    #[rstest]
    #[case(json!("/orders/42"))]
    #[case(json!(17))]
    #[case(json!(["a", {"b": null}]))]
    #[case(json!({"path": "/x", "method": "GET"}))]
    fn route_round_trips(#[case] route: Value) {
        let entry = LogEntry::new(Level::ERROR, "m").with_data(ROUTE_KEY, route.clone());
        let doc: Value = serde_json::from_str(&encode(&entry, "svc")).unwrap();

        assert_eq!(doc["route"], route);
    }
}

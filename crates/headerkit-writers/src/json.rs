//! JSON serialization of the full header IR.
//!
//! Suitable for inspection, debugging, inter-process exchange, or as
//! input to custom code generators. Every declaration kind is
//! representable, so nothing is ever skipped.

use headerkit_ir::{Header, HeaderWriter};

/// Construction-time configuration for [`JsonWriter`].
#[derive(Debug, Clone)]
pub struct JsonOptions {
    /// Pretty-print with indentation. Compact when false.
    pub pretty: bool,
}

impl Default for JsonOptions {
    fn default() -> Self {
        Self { pretty: true }
    }
}

/// Writer serializing a [`Header`] to JSON.
#[derive(Debug, Default)]
pub struct JsonWriter {
    options: JsonOptions,
}

impl JsonWriter {
    pub fn new(options: JsonOptions) -> Self {
        Self { options }
    }
}

impl HeaderWriter for JsonWriter {
    fn name(&self) -> &str {
        "json"
    }

    fn format_description(&self) -> &str {
        "JSON serialization of IR for inspection and tooling"
    }

    fn write(&self, header: &Header) -> String {
        // Serialization of our own types cannot fail.
        if self.options.pretty {
            serde_json::to_string_pretty(header).expect("header serialization")
        } else {
            serde_json::to_string(header).expect("header serialization")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use headerkit_ir::{
        Declaration, EnumDecl, EnumValue, Field, FunctionDecl, Parameter, StructDecl, TypeExpr,
    };

    fn sample_header() -> Header {
        Header::new(
            "api.h",
            vec![
                Declaration::Struct(StructDecl::new(
                    "point",
                    vec![
                        Field::new("x", TypeExpr::base("int")),
                        Field::new("y", TypeExpr::base("int")),
                    ],
                )),
                Declaration::Enum(EnumDecl::new(
                    "mode",
                    vec![EnumValue::new("OFF", None), EnumValue::new("ON", Some(7))],
                )),
                Declaration::Function(FunctionDecl::new(
                    "move_to",
                    TypeExpr::base("void"),
                    vec![Parameter::new(
                        "p",
                        TypeExpr::pointer(TypeExpr::base("struct point")),
                    )],
                )),
            ],
        )
        .with_includes(["stddef.h".to_string()].into_iter().collect())
    }

    #[test]
    fn test_json_shape() {
        let out = JsonWriter::default().write(&sample_header());
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(json["path"], "api.h");
        assert_eq!(json["included_headers"][0], "stddef.h");
        assert_eq!(json["declarations"][0]["kind"], "struct");
        assert_eq!(json["declarations"][0]["fields"][0]["name"], "x");
        assert_eq!(json["declarations"][1]["kind"], "enum");
        assert_eq!(json["declarations"][1]["values"][1]["value"], 7);
        assert_eq!(json["declarations"][2]["kind"], "function");
        assert_eq!(
            json["declarations"][2]["parameters"][0]["type"]["kind"],
            "pointer"
        );
    }

    #[test]
    fn test_round_trip() {
        let header = sample_header();
        let out = JsonWriter::default().write(&header);
        let back: Header = serde_json::from_str(&out).unwrap();
        assert_eq!(back, header);
    }

    #[test]
    fn test_compact_output() {
        let writer = JsonWriter::new(JsonOptions { pretty: false });
        let out = writer.write(&sample_header());
        assert!(!out.contains('\n'));
    }

    #[test]
    fn test_declaration_order_preserved() {
        let out = JsonWriter::default().write(&sample_header());
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        let kinds: Vec<_> = json["declarations"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["kind"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(kinds, vec!["struct", "enum", "function"]);
    }
}

//! Details view: descriptor, raw attributes and optional preview as Markdown.

use std::fmt::Write;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::domain::{Descriptor, Node};

/// Guess the image type of a preview buffer from its magic bytes.
pub fn preview_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => "image/png",
    }
}

/// Render the details document of a node.
pub fn render_details(node: &Node, descriptor: &Descriptor, preview: Option<&[u8]>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {} {}", node.kind().icon(), node.title);
    let _ = writeln!(out);
    let _ = writeln!(out, "kind: `{}`  id: `{}`", node.kind(), node.id());
    let _ = writeln!(out);

    let _ = writeln!(out, "## Descriptor");
    let _ = writeln!(out);
    let _ = writeln!(out, "```json");
    let _ = writeln!(out, "{}", to_pretty_json(descriptor));
    let _ = writeln!(out, "```");
    let _ = writeln!(out);

    let _ = writeln!(out, "## Attributes");
    let _ = writeln!(out);
    let _ = writeln!(out, "```json");
    let _ = writeln!(out, "{}", to_pretty_json(&node.attributes));
    let _ = writeln!(out, "```");

    if let Some(bytes) = preview {
        let _ = writeln!(out);
        let _ = writeln!(out, "## Preview");
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "![{}](data:{};base64,{})",
            node.title,
            preview_mime(bytes),
            STANDARD.encode(bytes)
        );
    }
    out
}

fn to_pretty_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("<unserializable: {e}>"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LayerRecord, LinkResolver, LinkSettings, Locator};
    use url::Url;

    fn layer() -> Node {
        Node::from_layer_record(
            LayerRecord::new("L", "Logo", "cafe"),
            Locator::layer("O", "P", "B", "F", "Pg", "L", "cafe"),
        )
    }

    fn descriptor(node: &Node) -> Descriptor {
        LinkResolver::new(LinkSettings {
            web_base_url: Url::parse("https://app.goabstract.com").unwrap(),
            app_scheme: "abstract".into(),
        })
        .descriptor_of(node)
    }

    #[test]
    fn given_magic_bytes_when_sniffing_then_detects_type() {
        assert_eq!(preview_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), "image/jpeg");
        assert_eq!(preview_mime(b"GIF89a"), "image/gif");
        assert_eq!(preview_mime(b"RIFF\0\0\0\0WEBPVP8"), "image/webp");
        assert_eq!(preview_mime(&[0x89, b'P', b'N', b'G']), "image/png");
        assert_eq!(preview_mime(&[]), "image/png");
    }

    #[test]
    fn given_layer_without_preview_when_render_then_no_image() {
        let node = layer();
        let doc = render_details(&node, &descriptor(&node), None);

        assert!(doc.starts_with("# 🔲 Logo"));
        assert!(doc.contains("\"layerId\": \"L\""));
        assert!(doc.contains("\"lastChangedAtSha\": \"cafe\""));
        assert!(!doc.contains("## Preview"));
    }

    #[test]
    fn given_preview_when_render_then_embeds_data_uri() {
        let node = layer();
        let doc = render_details(&node, &descriptor(&node), Some(b"GIF89a"));

        assert!(doc.contains("![Logo](data:image/gif;base64,R0lGODlh)"), "{doc}");
    }
}

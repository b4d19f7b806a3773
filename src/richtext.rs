use serde::Deserialize;

/// One node of a Prismic rich-text field (paragraph, heading, list item, image...).
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct RichTextNode {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
    /// Set on `image` nodes.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
}

#[cfg(test)]
impl RichTextNode {
    pub fn paragraph(text: &str) -> Self {
        Self {
            kind: "paragraph".to_string(),
            text: Some(text.to_string()),
            ..Default::default()
        }
    }
}

/// Flatten rich text into plain text.
///
/// Nodes without text (images, embeds) still take a slot, so their neighbours
/// end up separated by two spaces rather than being glued together.
pub fn as_text(nodes: &[RichTextNode]) -> String {
    nodes
        .iter()
        .map(|node| node.text.as_deref().unwrap_or(""))
        .collect::<Vec<_>>()
        .join(" ")
}

//! Normalization of raw API documents into the shapes the pages render.
//!
//! Mapping never fails: anything missing or of an unexpected shape comes out
//! as `None` (or empty), and the renderer copes with it.

use crate::date::RawTimestamp;
use crate::prismic::RawDoc;
use crate::richtext::{self, RichTextNode};
use serde_json::Value;

/// A post as shown in the list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Post {
    pub uid: Option<String>,
    pub publication_date: Option<RawTimestamp>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub author: Option<String>,
}

/// A heading followed by its rich-text body.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContentBlock {
    pub heading: String,
    pub body: Vec<RichTextNode>,
}

/// A post as shown on its own page.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PostDetail {
    pub uid: Option<String>,
    pub publication_date: Option<RawTimestamp>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub banner_url: Option<String>,
    pub content: Vec<ContentBlock>,
}

impl Post {
    pub fn from_raw(doc: &RawDoc) -> Self {
        Self {
            uid: doc.uid.clone(),
            publication_date: publication_date(doc),
            title: text_field(&doc.data["title"]),
            subtitle: text_field(&doc.data["subtitle"]),
            author: text_field(&doc.data["author"]),
        }
    }
}

impl PostDetail {
    pub fn from_raw(doc: &RawDoc) -> Self {
        let content = doc.data["content"]
            .as_array()
            .map(|blocks| blocks.iter().filter_map(content_block).collect())
            .unwrap_or_default();

        Self {
            uid: doc.uid.clone(),
            publication_date: publication_date(doc),
            title: text_field(&doc.data["title"]),
            author: text_field(&doc.data["author"]),
            banner_url: doc.data["banner"]["url"].as_str().map(str::to_string),
            content,
        }
    }
}

fn publication_date(doc: &RawDoc) -> Option<RawTimestamp> {
    doc.first_publication_date.as_deref().map(RawTimestamp::new)
}

/// A text field may be stored as plain key text or as rich text.
fn text_field(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(_) => rich_text(value).map(|nodes| richtext::as_text(&nodes)),
        _ => None,
    }
}

fn rich_text(value: &Value) -> Option<Vec<RichTextNode>> {
    serde_json::from_value(value.clone()).ok()
}

fn content_block(value: &Value) -> Option<ContentBlock> {
    if !value.is_object() {
        return None;
    }
    Some(ContentBlock {
        heading: text_field(&value["heading"]).unwrap_or_default(),
        body: rich_text(&value["body"]).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawDoc {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_post_from_raw() {
        let doc = raw(json!({
            "uid": "hello",
            "first_publication_date": "2021-01-15T00:00:00Z",
            "tags": ["ignored"],
            "data": {
                "title": "Hello",
                "subtitle": "A first post",
                "author": "Ana",
                "banner": {"url": "https://images.example.com/b.png"}
            }
        }));
        let post = Post::from_raw(&doc);
        assert_eq!(
            post,
            Post {
                uid: Some("hello".to_string()),
                publication_date: Some(RawTimestamp::new("2021-01-15T00:00:00Z")),
                title: Some("Hello".to_string()),
                subtitle: Some("A first post".to_string()),
                author: Some("Ana".to_string()),
            }
        );
    }

    #[test]
    fn test_missing_subtitle_is_none() {
        let doc = raw(json!({"uid": "x", "data": {"title": "T", "author": "A"}}));
        let post = Post::from_raw(&doc);
        assert_eq!(post.subtitle, None);
        assert_eq!(post.title.as_deref(), Some("T"));
    }

    #[test]
    fn test_missing_data_maps_to_empty_post() {
        let doc = raw(json!({"uid": "x", "first_publication_date": null}));
        let post = Post::from_raw(&doc);
        assert_eq!(post.uid.as_deref(), Some("x"));
        assert_eq!(post.publication_date, None);
        assert_eq!(post.title, None);
        assert_eq!(post.author, None);
    }

    #[test]
    fn test_rich_text_title_is_flattened() {
        let doc = raw(json!({
            "data": {"title": [{"type": "heading1", "text": "Rich", "spans": []}]}
        }));
        assert_eq!(Post::from_raw(&doc).title.as_deref(), Some("Rich"));
    }

    #[test]
    fn test_non_text_field_is_none() {
        let doc = raw(json!({"data": {"title": 42}}));
        assert_eq!(Post::from_raw(&doc).title, None);
    }

    #[test]
    fn test_mapping_is_pure() {
        let doc = raw(json!({"uid": "p", "data": {"title": "Same"}}));
        assert_eq!(Post::from_raw(&doc), Post::from_raw(&doc));
    }

    #[test]
    fn test_detail_from_raw() {
        let doc = raw(json!({
            "uid": "hooks",
            "first_publication_date": "2021-03-15T19:25:28+0000",
            "data": {
                "title": "Hooks",
                "author": "Joseph",
                "banner": {"url": "https://images.example.com/banner.png"},
                "content": [
                    {
                        "heading": "Intro",
                        "body": [{"type": "paragraph", "text": "First.", "spans": []}]
                    },
                    {"heading": "No body"},
                    "garbage"
                ]
            }
        }));
        let detail = PostDetail::from_raw(&doc);
        assert_eq!(detail.uid.as_deref(), Some("hooks"));
        assert_eq!(
            detail.banner_url.as_deref(),
            Some("https://images.example.com/banner.png")
        );
        assert_eq!(detail.content.len(), 2);
        assert_eq!(detail.content[0].heading, "Intro");
        assert_eq!(detail.content[0].body, vec![RichTextNode::paragraph("First.")]);
        assert_eq!(detail.content[1].heading, "No body");
        assert!(detail.content[1].body.is_empty());
    }

    #[test]
    fn test_detail_without_banner_or_content() {
        let detail = PostDetail::from_raw(&raw(json!({"data": {"title": "Bare"}})));
        assert_eq!(detail.banner_url, None);
        assert!(detail.content.is_empty());
    }
}

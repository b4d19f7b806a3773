use crate::date::{DateFormatter, RawTimestamp};
use crate::error::Result;
use crate::pagination::Pagination;
use crate::post::{Post, PostDetail};
use crate::reading_time;
use crate::richtext::RichTextNode;
use std::path::PathBuf;

const SITE_NAME: &str = "spacetraveling";
const LOAD_MORE_LABEL: &str = "Carregar mais posts";

/// Render every loaded post on one page, with a load-more control carrying
/// the API cursor while there are more pages.
pub fn render_index(pagination: &Pagination, dates: &DateFormatter) -> Result<String> {
    let control = pagination.next_cursor().map(|cursor| {
        format!(
            "<button class=\"load-more\" data-next-page=\"{}\">{}</button>\n",
            html_escape(&cursor),
            LOAD_MORE_LABEL
        )
    });
    render_list(&pagination.results(), "", control, dates)
}

/// Render one static list page per fetched page.
///
/// Page 1 is `index.html`, page n is `page/{n}.html`; each links to the next
/// through its load-more control. Returns `(relative path, html)` pairs.
pub fn render_list_pages(
    pagination: &Pagination,
    dates: &DateFormatter,
) -> Result<Vec<(PathBuf, String)>> {
    let pages = pagination.pages();
    let last = pages.len().saturating_sub(1);

    pages
        .iter()
        .enumerate()
        .map(|(i, posts)| -> Result<(PathBuf, String)> {
            let number = i + 1;
            let (path, root) = if number == 1 {
                (PathBuf::from("index.html"), "")
            } else {
                (PathBuf::from("page").join(format!("{}.html", number)), "../")
            };
            let control = (i < last).then(|| {
                format!(
                    "<a class=\"load-more\" href=\"{}page/{}.html\">{}</a>\n",
                    root,
                    number + 1,
                    LOAD_MORE_LABEL
                )
            });
            Ok((path, render_list(posts, root, control, dates)?))
        })
        .collect()
}

fn render_list(
    posts: &[Post],
    root: &str,
    control: Option<String>,
    dates: &DateFormatter,
) -> Result<String> {
    let mut out = String::new();

    out.push_str("<div class=\"posts\">\n");
    for post in posts {
        out.push_str(&render_post_summary(post, root, dates)?);
    }
    out.push_str("</div>\n");

    if let Some(control) = control {
        out.push_str(&control);
    }

    Ok(layout(SITE_NAME, root, &out))
}

fn render_post_summary(post: &Post, root: &str, dates: &DateFormatter) -> Result<String> {
    let href = format!("{}post/{}.html", root, post.uid.as_deref().unwrap_or_default());
    Ok(format!(
        "<a href=\"{}\">\n<h1>{}</h1>\n<p>{}</p>\n<div class=\"info\">{}<span>{}</span></div>\n</a>\n",
        html_escape(&href),
        text(&post.title),
        text(&post.subtitle),
        time(post.publication_date.as_ref(), dates)?,
        text(&post.author),
    ))
}

/// Render a single post page.
pub fn render_post(post: &PostDetail, dates: &DateFormatter) -> Result<String> {
    let mut out = String::new();

    if let Some(banner) = &post.banner_url {
        out.push_str(&format!(
            "<div class=\"banner\"><img src=\"{}\" alt=\"\"></div>\n",
            html_escape(banner)
        ));
    }

    out.push_str("<article class=\"post\">\n");
    out.push_str(&format!("<h1>{}</h1>\n", text(&post.title)));
    out.push_str(&format!(
        "<div class=\"info\">{}<span>{}</span><span>{} min</span></div>\n",
        time(post.publication_date.as_ref(), dates)?,
        text(&post.author),
        reading_time::estimate(&post.content),
    ));

    out.push_str("<div class=\"content\">\n");
    for block in &post.content {
        out.push_str("<div class=\"text\">\n");
        out.push_str(&format!("<strong>{}</strong>\n", html_escape(&block.heading)));
        out.push_str(&render_rich_text(&block.body));
        out.push_str("</div>\n");
    }
    out.push_str("</div>\n</article>\n");

    let title = post.title.as_deref().unwrap_or(SITE_NAME);
    Ok(layout(title, "../", &out))
}

/// Placeholder for a post page that has not been generated yet.
pub fn render_fallback() -> String {
    layout(SITE_NAME, "../", "<div class=\"fallback\">Carregando...</div>\n")
}

fn render_rich_text(nodes: &[RichTextNode]) -> String {
    let mut out = String::new();
    let mut open_list: Option<&str> = None;

    for node in nodes {
        let list = match node.kind.as_str() {
            "list-item" => Some("ul"),
            "o-list-item" => Some("ol"),
            _ => None,
        };
        if open_list != list {
            if let Some(tag) = open_list {
                out.push_str(&format!("</{}>\n", tag));
            }
            if let Some(tag) = list {
                out.push_str(&format!("<{}>\n", tag));
            }
            open_list = list;
        }

        let content = html_escape(node.text.as_deref().unwrap_or_default());
        match node.kind.as_str() {
            "heading1" | "heading2" | "heading3" | "heading4" | "heading5" | "heading6" => {
                let level = &node.kind["heading".len()..];
                out.push_str(&format!("<h{0}>{1}</h{0}>\n", level, content));
            }
            "list-item" | "o-list-item" => out.push_str(&format!("<li>{}</li>\n", content)),
            "preformatted" => out.push_str(&format!("<pre>{}</pre>\n", content)),
            "image" => {
                if let Some(url) = &node.url {
                    out.push_str(&format!(
                        "<img src=\"{}\" alt=\"{}\">\n",
                        html_escape(url),
                        html_escape(node.alt.as_deref().unwrap_or_default())
                    ));
                }
            }
            _ => out.push_str(&format!("<p>{}</p>\n", content)),
        }
    }
    if let Some(tag) = open_list {
        out.push_str(&format!("</{}>\n", tag));
    }

    out
}

fn time(date: Option<&RawTimestamp>, dates: &DateFormatter) -> Result<String> {
    Ok(match date {
        Some(raw) => format!(
            "<time datetime=\"{}\">{}</time>",
            html_escape(raw.as_str()),
            dates.format(raw)?
        ),
        None => String::new(),
    })
}

fn text(value: &Option<String>) -> String {
    html_escape(value.as_deref().unwrap_or_default())
}

fn layout(title: &str, root: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"pt-BR\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n<header><a href=\"{}index.html\">{}</a></header>\n<main class=\"container\">\n{}</main>\n</body>\n</html>\n",
        html_escape(title),
        root,
        SITE_NAME,
        body
    )
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

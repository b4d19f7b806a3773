use crate::error::{Error, Result};
use crate::pagination::PageSource;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use url::Url;

/// A document as returned by the content API, before any normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDoc {
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub first_publication_date: Option<String>,
    /// Type-specific fields; shape is owned by the CMS, not by us.
    #[serde(default)]
    pub data: serde_json::Value,
}

/// One page of search results.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPage {
    #[serde(default)]
    pub results: Vec<RawDoc>,
    /// URL of the next page, `null` on the last one
    #[serde(default)]
    pub next_page: Option<String>,
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub total_pages: Option<u64>,
}

/// API root response; only the refs matter to us.
#[derive(Debug, Deserialize)]
struct ApiInfo {
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master_ref: bool,
}

/// A search predicate in the API's query language.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    At { path: String, value: String },
    Fulltext { path: String, text: String },
}

impl Predicate {
    pub fn at(path: &str, value: &str) -> Self {
        Predicate::At {
            path: path.to_string(),
            value: value.to_string(),
        }
    }

    /// Free-text search across the whole document.
    pub fn fulltext(text: &str) -> Self {
        Predicate::Fulltext {
            path: "document".to_string(),
            text: text.to_string(),
        }
    }

    fn to_query(&self) -> String {
        match self {
            Predicate::At { path, value } => format!("[at({},\"{}\")]", path, quote(value)),
            Predicate::Fulltext { path, text } => {
                format!("[fulltext({},\"{}\")]", path, quote(text))
            }
        }
    }
}

fn quote(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// A document search: type filter, extra predicates, selected fields, page size.
#[derive(Debug, Clone)]
pub struct Query {
    pub document_type: String,
    pub fields: Vec<String>,
    pub page_size: u32,
    pub predicates: Vec<Predicate>,
    pub orderings: Option<String>,
}

impl Query {
    pub fn documents(document_type: &str) -> Self {
        Self {
            document_type: document_type.to_string(),
            fields: Vec::new(),
            page_size: 20,
            predicates: vec![Predicate::at("document.type", document_type)],
            orderings: None,
        }
    }

    /// Restrict the returned `data` to these fields of the document type.
    pub fn fetch(mut self, fields: &[&str]) -> Self {
        self.fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// e.g. `document.first_publication_date desc`
    pub fn order_by(mut self, ordering: &str) -> Self {
        self.orderings = Some(ordering.to_string());
        self
    }

    fn q(&self) -> String {
        let inner: String = self.predicates.iter().map(Predicate::to_query).collect();
        format!("[{}]", inner)
    }

    fn fetch_param(&self) -> String {
        self.fields
            .iter()
            .map(|f| format!("{}.{}", self.document_type, f))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Blocking client for a Prismic-style content API.
///
/// Construct one per run and pass it to whatever needs to fetch.
pub struct Client {
    endpoint: Url,
    access_token: Option<String>,
    http: reqwest::blocking::Client,
    master_ref: OnceCell<String>,
}

impl Client {
    /// `endpoint` is the API root, e.g. `https://my-repo.cdn.prismic.io/api/v2`.
    pub fn new(endpoint: &str, access_token: Option<String>) -> Result<Self> {
        let endpoint = Url::parse(endpoint)?;
        Ok(Self {
            endpoint,
            access_token,
            http: reqwest::blocking::Client::new(),
            master_ref: OnceCell::new(),
        })
    }

    /// Repository host, used to namespace the local cache.
    pub fn host(&self) -> &str {
        self.endpoint.host_str().unwrap_or("unknown")
    }

    /// The ref every search must be pinned to. Fetched once per client.
    pub fn master_ref(&self) -> Result<String> {
        if let Some(reference) = self.master_ref.get() {
            return Ok(reference.clone());
        }
        let mut url = self.endpoint.clone();
        if let Some(token) = &self.access_token {
            url.query_pairs_mut().append_pair("access_token", token);
        }
        let info: ApiInfo = self.get_json(url.as_str())?;
        let reference = info
            .refs
            .into_iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference)
            .ok_or(Error::MissingMasterRef)?;
        tracing::debug!("Master ref: {}", reference);
        let _ = self.master_ref.set(reference.clone());
        Ok(reference)
    }

    /// Run a search and return its first page.
    pub fn query(&self, query: &Query) -> Result<RawPage> {
        let reference = self.master_ref()?;
        let url = self.search_url(&reference, query)?;
        let page: RawPage = self.get_json(url.as_str())?;
        tracing::debug!(
            "Query returned {} results (page {:?} of {:?})",
            page.results.len(),
            page.page,
            page.total_pages
        );
        Ok(page)
    }

    /// Fetch a single document by its uid.
    pub fn get_by_uid(&self, document_type: &str, uid: &str) -> Result<RawDoc> {
        let query = Query::documents(document_type)
            .filter(Predicate::at(&format!("my.{}.uid", document_type), uid))
            .page_size(1);
        let page = self.query(&query)?;
        page.results
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound {
                uid: uid.to_string(),
            })
    }

    fn search_url(&self, reference: &str, query: &Query) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push("documents")
            .push("search");
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("ref", reference);
            pairs.append_pair("q", &query.q());
            pairs.append_pair("pageSize", &query.page_size.to_string());
            if !query.fields.is_empty() {
                pairs.append_pair("fetch", &query.fetch_param());
            }
            if let Some(orderings) = &query.orderings {
                pairs.append_pair("orderings", &format!("[{}]", orderings));
            }
            if let Some(token) = &self.access_token {
                pairs.append_pair("access_token", token);
            }
        }
        Ok(url)
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        tracing::debug!("GET {}", url);
        let resp = self
            .http
            .get(url)
            .header("Accept", "application/json")
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = resp.text()?;
        Ok(serde_json::from_str(&body)?)
    }
}

impl PageSource for Client {
    /// Cursors are complete URLs handed out by the API, so this is a plain GET.
    fn fetch_page(&self, cursor: &str) -> Result<RawPage> {
        self.get_json(cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> Client {
        Client::new("https://blog.cdn.prismic.io/api/v2", None).unwrap()
    }

    fn query_pairs(url: &Url) -> Vec<(String, String)> {
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn test_predicate_syntax() {
        assert_eq!(
            Predicate::at("document.type", "post").to_query(),
            r#"[at(document.type,"post")]"#
        );
        assert_eq!(
            Predicate::fulltext(r#"say "hi""#).to_query(),
            r#"[fulltext(document,"say \"hi\"")]"#
        );
    }

    #[test]
    fn test_query_combines_predicates() {
        let query = Query::documents("post").filter(Predicate::fulltext("rust"));
        assert_eq!(
            query.q(),
            r#"[[at(document.type,"post")][fulltext(document,"rust")]]"#
        );
    }

    #[test]
    fn test_search_url() {
        let query = Query::documents("post")
            .fetch(&["title", "subtitle", "author"])
            .page_size(1)
            .order_by("document.first_publication_date desc");
        let url = client().search_url("abc123", &query).unwrap();

        assert_eq!(url.path(), "/api/v2/documents/search");
        assert_eq!(
            query_pairs(&url),
            vec![
                ("ref".to_string(), "abc123".to_string()),
                ("q".to_string(), r#"[[at(document.type,"post")]]"#.to_string()),
                ("pageSize".to_string(), "1".to_string()),
                (
                    "fetch".to_string(),
                    "post.title,post.subtitle,post.author".to_string()
                ),
                (
                    "orderings".to_string(),
                    "[document.first_publication_date desc]".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_search_url_with_token_and_trailing_slash() {
        let client = Client::new(
            "https://blog.cdn.prismic.io/api/v2/",
            Some("secret".to_string()),
        )
        .unwrap();
        let url = client
            .search_url("r", &Query::documents("post"))
            .unwrap();
        assert_eq!(url.path(), "/api/v2/documents/search");
        assert!(query_pairs(&url).contains(&("access_token".to_string(), "secret".to_string())));
    }

    #[test]
    fn test_invalid_endpoint() {
        assert!(matches!(
            Client::new("not a url", None),
            Err(Error::Url(_))
        ));
    }

    #[test]
    fn test_host() {
        assert_eq!(client().host(), "blog.cdn.prismic.io");
    }

    #[test]
    fn test_parse_raw_page() {
        let page: RawPage = serde_json::from_str(
            r#"{
                "page": 1,
                "results_per_page": 1,
                "total_pages": 3,
                "next_page": "https://blog.cdn.prismic.io/api/v2/documents/search?page=2",
                "results": [{
                    "id": "YDx",
                    "uid": "como-utilizar-hooks",
                    "type": "post",
                    "first_publication_date": "2021-03-15T19:25:28+0000",
                    "data": {"title": "Como utilizar Hooks", "author": "Joseph Oliveira"}
                }]
            }"#,
        )
        .unwrap();
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.results[0].uid.as_deref(), Some("como-utilizar-hooks"));
        assert_eq!(page.total_pages, Some(3));
        assert!(page.next_page.is_some());
    }

    #[test]
    fn test_parse_last_page() {
        let page: RawPage = serde_json::from_str(r#"{"results": [], "next_page": null}"#).unwrap();
        assert!(page.results.is_empty());
        assert_eq!(page.next_page, None);
    }

    #[test]
    fn test_parse_api_info() {
        let info: ApiInfo = serde_json::from_str(
            r#"{"refs": [
                {"id": "preview", "ref": "p1", "isMasterRef": false},
                {"id": "master", "ref": "m1", "label": "Master", "isMasterRef": true}
            ]}"#,
        )
        .unwrap();
        let master = info.refs.iter().find(|r| r.is_master_ref).unwrap();
        assert_eq!(master.reference, "m1");
    }
}

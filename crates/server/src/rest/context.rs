use axum::http::{HeaderMap, Uri, header};
use fhir_facade_core::SummaryMode;
use url::form_urlencoded;

use super::headers::{self, PreferReturn, header_str};
use super::negotiate::{self, Format};

/// Negotiation parameters, never forwarded to the store
const NEGOTIATION_PARAMS: &[&str] = &["_format"];

/// Stripped from conditional criteria and the echoed query
const PAGING_PARAMS: &[&str] = &["_format", "_summary", "_count", "_page"];

/// Everything a handler needs to know about the inbound request besides its body
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub format: Format,
    pub utf8: bool,
    pub prefer: PreferReturn,
    pub summary: SummaryMode,
    pub base_url: String,
    pub query: Vec<(String, String)>,
    pub content_type: Option<String>,
    pub if_match: Option<String>,
    pub if_none_exist: Option<String>,
}

impl RequestContext {
    pub fn from_request(request_headers: &HeaderMap, uri: &Uri) -> Self {
        let query: Vec<(String, String)> = uri
            .query()
            .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        let param = |name: &str| {
            query
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        };

        let accept = header_str(request_headers, header::ACCEPT.as_str());
        let format = negotiate::output_format(param("_format"), accept);
        let utf8 = negotiate::wants_utf8(
            accept,
            header_str(request_headers, header::ACCEPT_CHARSET.as_str()),
        );
        let summary = param("_summary")
            .and_then(SummaryMode::parse)
            .unwrap_or_default();

        Self {
            format,
            utf8,
            prefer: headers::parse_prefer(header_str(request_headers, "prefer")),
            summary,
            base_url: headers::base_url(request_headers, uri),
            content_type: header_str(request_headers, header::CONTENT_TYPE.as_str())
                .map(str::to_string),
            if_match: header_str(request_headers, header::IF_MATCH.as_str())
                .and_then(headers::parse_if_match),
            if_none_exist: header_str(request_headers, "if-none-exist")
                .map(|v| v.trim().trim_start_matches('?').to_string())
                .filter(|v| !v.is_empty()),
            query,
        }
    }

    /// Query forwarded to the store for search
    pub fn store_query(&self) -> String {
        encode_without(&self.query, NEGOTIATION_PARAMS)
    }

    /// Search criteria of a conditional interaction: the query without
    /// negotiation and paging parameters
    pub fn criteria(&self) -> String {
        encode_without(&self.query, PAGING_PARAMS)
    }
}

fn encode_without(pairs: &[(String, String)], skip: &[&str]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (k, v) in pairs.iter().filter(|(k, _)| !skip.contains(&k.as_str())) {
        serializer.append_pair(k, v);
    }
    serializer.finish()
}

//! Representation negotiation
//!
//! Output format: `_format` first, then the `Accept` header, then JSON.
//! Input format: `Content-Type`, then a sniff of the body, then JSON.

/// FHIR XML namespace, looked for as a quoted `xmlns` value when sniffing bodies
const XML_NAMESPACE: &str = "http://hl7.org/fhir";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Json,
    Xml,
}

impl Format {
    /// Map a MIME type or `_format` shorthand to a format. Parameters after
    /// `;` are ignored.
    pub fn from_token(raw: &str) -> Option<Self> {
        let token = raw.split(';').next().unwrap_or(raw).trim();
        match token.to_ascii_lowercase().as_str() {
            "json" | "application/json" | "application/fhir+json" | "application/json+fhir"
            | "text/json" => Some(Self::Json),
            "xml" | "text/xml" | "application/xml" | "application/fhir+xml"
            | "application/xml+fhir" | "html" | "text/html" => Some(Self::Xml),
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Json => "application/fhir+json",
            Self::Xml => "application/fhir+xml",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Xml => "xml",
        }
    }

    /// Content-Type header value, with the charset echoed when UTF-8 was asked for
    pub fn content_type(self, utf8: bool) -> String {
        if utf8 {
            format!("{};charset=UTF-8", self.mime_type())
        } else {
            self.mime_type().to_string()
        }
    }
}

/// Format of the response body
pub fn output_format(format_param: Option<&str>, accept: Option<&str>) -> Format {
    if let Some(format) = format_param.and_then(Format::from_token) {
        return format;
    }
    accept
        .and_then(|accept| accept.split(',').find_map(Format::from_token))
        .unwrap_or_default()
}

/// Format of the request body
pub fn input_format(content_type: Option<&str>, body: &[u8]) -> Format {
    if let Some(format) = content_type.and_then(Format::from_token) {
        return format;
    }
    let sample = String::from_utf8_lossy(&body[..body.len().min(1024)]);
    if declares_fhir_namespace(&sample) {
        Format::Xml
    } else {
        Format::Json
    }
}

/// `xmlns="http://hl7.org/fhir"` with either quote character
fn declares_fhir_namespace(sample: &str) -> bool {
    ['"', '\''].iter().any(|quote| {
        let declaration = format!("xmlns={quote}{XML_NAMESPACE}{quote}");
        sample.contains(&declaration)
    })
}

/// Whether the client mentioned UTF-8 in `Accept` or `Accept-Charset`
pub fn wants_utf8(accept: Option<&str>, accept_charset: Option<&str>) -> bool {
    [accept, accept_charset]
        .into_iter()
        .flatten()
        .any(|h| h.to_ascii_lowercase().contains("utf-8"))
}

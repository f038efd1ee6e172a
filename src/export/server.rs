//! Server strategy: serialize the invoice to standalone HTML and hand it to a
//! headless-browser print service.
//!
//! Wire format: `POST {endpoint}` with JSON `{"html": ..., "filename": ...}`.
//! Success is a 2xx `application/pdf` body, optionally with
//! `Content-Disposition: attachment; filename="..."`. Failures carry a JSON
//! body `{"error": ..., "details": ...}`.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{ExportJob, ExportMethod, ExportProgress, ExportedPdf};
use crate::error::{ExportError, Result};
use crate::html::{render_html, PrintSettings};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrintRequest {
    pub html: String,
    pub filename: String,
}

/// Raw reply of the print service.
#[derive(Debug, Clone, Default)]
pub struct PrintResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub body: Vec<u8>,
}

pub trait PrintTransport: Send + Sync {
    fn submit(&self, request: &PrintRequest) -> Result<PrintResponse>;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    details: Option<String>,
}

/// Message for a non-2xx reply, preferring the service's JSON error body.
fn error_message(body: &[u8]) -> String {
    if let Ok(err) = serde_json::from_slice::<ErrorBody>(body) {
        return match err.details {
            Some(details) if !details.is_empty() => format!("{}: {details}", err.error),
            _ => err.error,
        };
    }
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        "no details".to_string()
    } else {
        text.chars().take(200).collect()
    }
}

/// Filename from a `Content-Disposition` header. `filename*` wins over
/// `filename`; path components are stripped.
pub fn content_disposition_filename(header: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;
    for part in disposition_params(header) {
        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => {
                // RFC 5987: charset'lang'percent-encoded
                let encoded = value.trim().splitn(3, '\'').nth(2).unwrap_or(value);
                extended = percent_decode(encoded);
            }
            "filename" => {
                plain = Some(unquote(value.trim()));
            }
            _ => {}
        }
    }
    let name = extended.or(plain)?;
    let name = name.rsplit(['/', '\\']).next().unwrap_or("").trim().to_string();
    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name)
    }
}

/// Split header parameters on `;` outside quoted strings.
fn disposition_params(header: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let (mut start, mut quoted, mut escaped) = (0, false, false);
    for (i, ch) in header.char_indices() {
        match ch {
            _ if escaped => escaped = false,
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            ';' if !quoted => {
                parts.push(header[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(header[start..].trim());
    parts
}

fn unquote(value: &str) -> String {
    let Some(inner) = value.strip_prefix('"') else {
        return value.to_string();
    };
    let inner = inner.strip_suffix('"').unwrap_or(inner);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => out.extend(chars.next()),
            _ => out.push(ch),
        }
    }
    out
}

fn percent_decode(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = s.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

/// Check a reply and extract `(pdf bytes, filename)`. A 2xx reply that is
/// not a PDF is rejected so a broken document never reaches the caller.
pub fn accept_response(response: PrintResponse, default_filename: &str) -> Result<(Vec<u8>, String)> {
    if !(200..300).contains(&response.status) {
        return Err(ExportError::Status {
            status: response.status,
            message: error_message(&response.body),
        });
    }
    if let Some(ct) = &response.content_type {
        let mime = ct.split(';').next().unwrap_or("").trim();
        if !mime.eq_ignore_ascii_case("application/pdf") {
            return Err(ExportError::InvalidResponse(format!(
                "unexpected content type {mime:?}"
            )));
        }
    }
    if !response.body.starts_with(b"%PDF-") {
        return Err(ExportError::InvalidResponse(
            "body does not start with %PDF-".to_string(),
        ));
    }
    let filename = response
        .content_disposition
        .as_deref()
        .and_then(content_disposition_filename)
        .unwrap_or_else(|| default_filename.to_string());
    Ok((response.body, filename))
}

/// [`PrintTransport`] over HTTP with `ureq`.
pub struct HttpPrintTransport {
    endpoint: String,
    timeout: Duration,
    agent: ureq::Agent,
}

impl HttpPrintTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            endpoint: endpoint.into(),
            timeout,
            agent,
        }
    }

}

impl PrintTransport for HttpPrintTransport {
    fn submit(&self, request: &PrintRequest) -> Result<PrintResponse> {
        if self.endpoint.trim().is_empty() {
            return Err(ExportError::NoEndpoint);
        }
        let payload = serde_json::to_string(request)
            .map_err(|e| ExportError::Unexpected(format!("print request encoding: {e}")))?;
        let sent = self
            .agent
            .post(self.endpoint.as_str())
            .header("Content-Type", "application/json")
            .header("Accept", "application/pdf")
            .send(payload);
        let mut response = match sent {
            Ok(r) => r,
            Err(ureq::Error::Timeout(_)) => return Err(ExportError::Timeout(self.timeout)),
            Err(e) => return Err(ExportError::Transport(e.to_string())),
        };

        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let status = response.status().as_u16();
        let content_type = header("content-type");
        let content_disposition = header("content-disposition");
        let body = match response.body_mut().read_to_vec() {
            Ok(b) => b,
            Err(ureq::Error::Timeout(_)) => return Err(ExportError::Timeout(self.timeout)),
            Err(e) => return Err(ExportError::Transport(e.to_string())),
        };
        Ok(PrintResponse {
            status,
            content_type,
            content_disposition,
            body,
        })
    }
}

pub struct ServerPrint {
    transport: Arc<dyn PrintTransport>,
    pub print: PrintSettings,
}

impl ServerPrint {
    pub fn new(transport: Arc<dyn PrintTransport>) -> Self {
        Self {
            transport,
            print: PrintSettings::default(),
        }
    }

    pub fn with_print_settings(mut self, print: PrintSettings) -> Self {
        self.print = print;
        self
    }

    pub fn export(
        &self,
        job: &ExportJob,
        progress: &mut dyn FnMut(ExportProgress),
    ) -> Result<ExportedPdf> {
        progress(ExportProgress::Rendering);
        let request = PrintRequest {
            html: render_html(&job.document, &self.print),
            filename: job.filename.clone(),
        };
        progress(ExportProgress::Submitting);
        let response = self.transport.submit(&request)?;
        let (bytes, filename) = accept_response(response, &job.filename)?;
        Ok(ExportedPdf {
            bytes,
            filename,
            method: ExportMethod::Server,
            pages: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf_response() -> PrintResponse {
        PrintResponse {
            status: 200,
            content_type: Some("application/pdf".to_string()),
            content_disposition: Some("attachment; filename=\"INV-9.pdf\"".to_string()),
            body: b"%PDF-1.7\n...".to_vec(),
        }
    }

    #[test]
    fn request_serializes_as_html_and_filename() {
        let req = PrintRequest {
            html: "<p>x</p>".to_string(),
            filename: "invoice-1.pdf".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&req).unwrap(),
            r#"{"html":"<p>x</p>","filename":"invoice-1.pdf"}"#
        );
    }

    #[test]
    fn accepts_pdf_and_takes_disposition_filename() {
        let (bytes, name) = accept_response(pdf_response(), "invoice-1.pdf").unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        assert_eq!(name, "INV-9.pdf");
    }

    #[test]
    fn non_2xx_uses_json_error_body() {
        let resp = PrintResponse {
            status: 500,
            body: br#"{"error":"Failed to generate PDF","details":"browser crashed"}"#.to_vec(),
            ..Default::default()
        };
        match accept_response(resp, "x.pdf") {
            Err(ExportError::Status { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "Failed to generate PDF: browser crashed");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn rejects_non_pdf_success() {
        let mut html = pdf_response();
        html.content_type = Some("text/html; charset=utf-8".to_string());
        assert!(matches!(
            accept_response(html, "x.pdf"),
            Err(ExportError::InvalidResponse(_))
        ));

        let mut truncated = pdf_response();
        truncated.body = b"<html>".to_vec();
        assert!(matches!(
            accept_response(truncated, "x.pdf"),
            Err(ExportError::InvalidResponse(_))
        ));
    }

    #[test]
    fn disposition_parsing() {
        assert_eq!(
            content_disposition_filename("attachment; filename*=UTF-8''inv%20%231.pdf").as_deref(),
            Some("inv #1.pdf")
        );
        assert_eq!(
            content_disposition_filename("attachment; filename=\"../../etc/a.pdf\"").as_deref(),
            Some("a.pdf")
        );
        assert_eq!(
            content_disposition_filename("attachment; filename=\"INV;14.pdf\"; size=42").as_deref(),
            Some("INV;14.pdf")
        );
        assert_eq!(
            content_disposition_filename(r#"attachment; filename="say \"hi\".pdf""#).as_deref(),
            Some("say \"hi\".pdf")
        );
        assert_eq!(content_disposition_filename("inline"), None);
    }

    #[test]
    fn unreachable_endpoint_is_a_transport_error() {
        let transport = HttpPrintTransport::new("http://127.0.0.1:9/print", Duration::from_secs(2));
        let err = transport
            .submit(&PrintRequest {
                html: String::new(),
                filename: "x.pdf".to_string(),
            })
            .unwrap_err();
        assert!(err.is_transport(), "{err}");
    }

    #[test]
    fn blank_endpoint_is_rejected_before_sending() {
        let transport = HttpPrintTransport::new("  ", DEFAULT_TIMEOUT);
        let err = transport
            .submit(&PrintRequest {
                html: String::new(),
                filename: "x.pdf".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, ExportError::NoEndpoint));
    }
}

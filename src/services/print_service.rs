use std::future::Future;

use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::api::dto::{MultiPdfRequest, PdfRequest, PrintOptions, PrintSelection};
use crate::domain::{Actor, KanbanError};
use crate::services::{EntityStore, PermissionService};

/// The PDF engine. Rendering and merging happen outside this service.
pub trait PrintRenderer {
    fn render(
        &self,
        doctype: &str,
        name: &str,
        options: &PrintOptions,
    ) -> impl Future<Output = Result<Vec<u8>, KanbanError>> + Send;

    fn merge(&self, parts: Vec<Vec<u8>>) -> impl Future<Output = Result<Vec<u8>, KanbanError>> + Send;
}

#[derive(Debug, Clone)]
pub struct PdfDocument {
    pub filename: String,
    pub content: Vec<u8>,
}

pub struct HttpPrintRenderer {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpPrintRenderer {
    pub fn new(http_client: reqwest::Client, base_url: String) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn read_pdf(response: reqwest::Response, what: &str) -> Result<Vec<u8>, KanbanError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(KanbanError::Upstream(format!(
                "print service {} returned {}: {}",
                what, status, body
            )));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

impl PrintRenderer for HttpPrintRenderer {
    async fn render(
        &self,
        doctype: &str,
        name: &str,
        options: &PrintOptions,
    ) -> Result<Vec<u8>, KanbanError> {
        let response = self
            .http_client
            .post(format!("{}/render", self.base_url))
            .json(&json!({
                "doctype": doctype,
                "name": name,
                "format": options.format,
                "letterhead": options.letterhead,
                "no_letterhead": options.no_letterhead,
                "pdf_options": options.pdf_options,
                "address_display": options.address_display,
            }))
            .send()
            .await?;

        Self::read_pdf(response, "render").await
    }

    async fn merge(&self, parts: Vec<Vec<u8>>) -> Result<Vec<u8>, KanbanError> {
        let mut form = Form::new();
        for (i, part) in parts.into_iter().enumerate() {
            let part = Part::bytes(part)
                .file_name(format!("part-{}.pdf", i))
                .mime_str("application/pdf")?;
            form = form.part("files", part);
        }

        let response = self
            .http_client
            .post(format!("{}/merge", self.base_url))
            .multipart(form)
            .send()
            .await?;

        Self::read_pdf(response, "merge").await
    }
}

pub struct PrintService<R> {
    pool: SqlitePool,
    renderer: R,
}

impl<R: PrintRenderer> PrintService<R> {
    pub fn new(pool: SqlitePool, renderer: R) -> Self {
        Self { pool, renderer }
    }

    pub async fn download_pdf(&self, actor: &Actor, req: PdfRequest) -> Result<PdfDocument, KanbanError> {
        let content = self
            .render_document(actor, &req.doctype, &req.name, &req.options)
            .await?;

        Ok(PdfDocument {
            filename: pdf_filename(&req.name),
            content,
        })
    }

    /// Renders several documents into one PDF. In the grouped form a document
    /// that fails is logged and left out; in the single-doctype form any
    /// failure aborts the whole job.
    pub async fn download_multi_pdf(
        &self,
        actor: &Actor,
        req: MultiPdfRequest,
    ) -> Result<PdfDocument, KanbanError> {
        let mut parts = Vec::new();

        let filename = match &req.selection {
            PrintSelection::Single { doctype, names } => {
                for name in names {
                    parts.push(self.render_document(actor, doctype, name, &req.options).await?);
                }
                pdf_filename(doctype)
            }
            PrintSelection::Grouped { documents, name } => {
                for (doctype, names) in documents {
                    for doc_name in names {
                        match self.render_document(actor, doctype, doc_name, &req.options).await {
                            Ok(part) => parts.push(part),
                            Err(e) => tracing::error!(
                                doctype = doctype.as_str(),
                                name = doc_name.as_str(),
                                "Error in multi PDF download: {}",
                                e
                            ),
                        }
                    }
                }
                pdf_filename(name)
            }
        };

        if parts.is_empty() {
            return Err(KanbanError::NotFound("No printable documents".into()));
        }

        let content = if parts.len() == 1 {
            parts.remove(0)
        } else {
            self.renderer.merge(parts).await?
        };

        Ok(PdfDocument { filename, content })
    }

    async fn render_document(
        &self,
        actor: &Actor,
        doctype: &str,
        name: &str,
        options: &PrintOptions,
    ) -> Result<Vec<u8>, KanbanError> {
        PermissionService::require_read(&self.pool, actor, doctype).await?;
        let data = EntityStore::get_data(&self.pool, doctype, name).await?;

        let mut options = options.clone();
        options.address_display = data
            .get("address")
            .filter(|address| address.is_object())
            .map(format_address_display);

        self.renderer.render(doctype, name, &options).await
    }
}

/// One address line per part, with zip code and city sharing a line.
/// Blank parts are left out; lines are joined with `<br>`.
pub fn format_address_display(address: &Value) -> String {
    let part = |key: &str| {
        address
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };

    let mut lines: Vec<String> = Vec::new();
    lines.extend(part("address_line1").map(str::to_string));
    lines.extend(part("address_line2").map(str::to_string));

    let zip_city: Vec<&str> = [part("pincode"), part("city")].into_iter().flatten().collect();
    if !zip_city.is_empty() {
        lines.push(zip_city.join(", "));
    }

    lines.extend(part("country").map(str::to_string));
    lines.join("<br>")
}

fn pdf_filename(stem: &str) -> String {
    format!("{}.pdf", stem.replace([' ', '/'], "-"))
}

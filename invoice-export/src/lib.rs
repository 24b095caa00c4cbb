use std::borrow::Cow;
use std::{io, io::Write};

use invoice_core::{format_amount, InvoiceDraft, LineItem, SavedInvoice};
use thiserror::Error;

pub use json::{
    export_file_name, from_json, to_json, ExportError, InvoiceArchive, ARCHIVE_FILE_NAME,
    JSON_MIME,
};

pub mod json;


/// Renders an invoice record as a complete, self-contained printable HTML
/// document: inline styling only, one table row per line item, and the
/// derived totals block.  Totals come from the same calculator as the live
/// display, so the printed and on-screen numbers cannot diverge.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, Debug)]
pub struct HtmlRenderer {}

impl HtmlRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Renders the printable document for an invoice record into `w`.
pub fn render<W: Write>(w: &mut W, record: &InvoiceDraft) -> Result<(), HtmlRenderError> {
    HtmlRenderer::default().render(record, w)
}

/// Convenience wrapper returning the document as a string.
pub fn render_to_string(record: &InvoiceDraft) -> Result<String, HtmlRenderError> {
    let mut out = Vec::new();
    render(&mut out, record)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

#[derive(Error, Debug)]
pub enum HtmlRenderError {
    #[error("an io error occurred")]
    Io(#[from] io::Error),
}

pub trait Renderer<T, W: Write> {
    type Error;
    fn render(&self, renderable: T, write: &mut W) -> Result<(), Self::Error>;
}

// Inline styling keeps the document free of external resources; it is
// handed as-is to whatever prints or displays it.
const DOCUMENT_STYLE: &str = "\
body { font-family: Arial; padding: 28px; }
.r { text-align: right; }
table { width: 100%; border-collapse: collapse; }
td, th { border-bottom: 1px solid #ccc; padding: 6px; }
.totals { text-align: right; margin-top: 20px; }";

impl<'a, W: Write> Renderer<&'a InvoiceDraft, W> for HtmlRenderer {
    type Error = HtmlRenderError;
    fn render(&self, record: &'a InvoiceDraft, w: &mut W) -> Result<(), Self::Error> {
        let totals = record.totals().rounded();
        writeln!(w, "<html>")?;
        writeln!(w, "<head>")?;
        writeln!(w, "<title>{}</title>", escape_html(&record.invoice_number))?;
        writeln!(w, "<style>")?;
        writeln!(w, "{}", DOCUMENT_STYLE)?;
        writeln!(w, "</style>")?;
        writeln!(w, "</head>")?;
        writeln!(w, "<body>")?;
        writeln!(
            w,
            "<h2>Invoice — {}</h2>",
            escape_html(&record.invoice_number)
        )?;
        writeln!(w, "<p>Issue date: {}</p>", escape_html(&record.issue_date))?;
        writeln!(
            w,
            "<p>Bill to: <strong>{}</strong> — {}</p>",
            escape_html(&record.client_name),
            escape_html(&record.client_email)
        )?;
        writeln!(w, "<table>")?;
        writeln!(w, "<thead>")?;
        writeln!(
            w,
            "<tr><th>Description</th><th class=\"r\">Qty</th><th class=\"r\">Unit</th><th class=\"r\">Total</th></tr>"
        )?;
        writeln!(w, "</thead>")?;
        writeln!(w, "<tbody>")?;
        for line in &record.lines {
            self.render(line, w)?;
        }
        writeln!(w, "</tbody>")?;
        writeln!(w, "</table>")?;
        writeln!(w, "<h3 class=\"totals\">")?;
        writeln!(w, "Subtotal: {} <br>", format_amount(totals.subtotal))?;
        writeln!(
            w,
            "Tax ({}%): {} <br>",
            record.tax_pct,
            format_amount(totals.tax_amount)
        )?;
        writeln!(w, "<strong>Total: {}</strong>", format_amount(totals.total))?;
        writeln!(w, "</h3>")?;
        writeln!(w, "</body>")?;
        writeln!(w, "</html>")?;
        Ok(())
    }
}

impl<'a, W: Write> Renderer<&'a SavedInvoice, W> for HtmlRenderer {
    type Error = HtmlRenderError;
    fn render(&self, saved: &'a SavedInvoice, w: &mut W) -> Result<(), Self::Error> {
        // The identity fields never appear on the printed document.
        self.render(&saved.record, w)
    }
}

impl<'a, W: Write> Renderer<&'a LineItem, W> for HtmlRenderer {
    type Error = HtmlRenderError;
    fn render(&self, line: &'a LineItem, w: &mut W) -> Result<(), Self::Error> {
        write!(w, "<tr><td>{}</td>", escape_html(&line.description))?;
        write!(w, "<td class=\"r\">{}</td>", line.qty)?;
        write!(w, "<td class=\"r\">{}</td>", format_amount(line.price))?;
        writeln!(
            w,
            "<td class=\"r\">{}</td></tr>",
            format_amount(line.total())
        )?;
        Ok(())
    }
}

/// Escapes the characters that would let user-supplied text act as
/// structural markup.  Every free-text field passes through here before it
/// is embedded in a document; there is no unescaped path.
pub fn escape_html(s: &str) -> Cow<'_, str> {
    if !s.contains(|c| matches!(c, '&' | '<' | '>')) {
        return Cow::Borrowed(s);
    }
    let mut escaped = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

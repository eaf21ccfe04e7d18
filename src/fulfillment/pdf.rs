//! PDF invoices: a header block, an item table and the grand total.

use super::renderer::{money, DocumentRenderer, RenderError};
use crate::model::{Document, Invoice, InvoiceLine};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, Stream};

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const LEFT: i64 = 50;
const ROW_HEIGHT: i64 = 20;
const ROWS_PER_PAGE: usize = 25;
/// Item, quantity, price and total columns.
const COLUMNS: [i64; 4] = [LEFT, 300, 350, 450];

/// `invoice_<id>.pdf` on A4 using the built-in Helvetica fonts.
#[derive(Debug, Clone)]
pub struct PdfInvoiceRenderer {
    title: String,
}

impl Default for PdfInvoiceRenderer {
    fn default() -> Self {
        Self::new("Retail Billing Invoice")
    }
}

impl PdfInvoiceRenderer {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    fn header(&self, invoice: &Invoice, page: &mut Page) {
        page.text("F2", 20, LEFT, PAGE_HEIGHT - 60, &self.title);
        let mut y = PAGE_HEIGHT - 100;
        let mut info = vec![
            format!("Invoice Number: {}", invoice.id),
            format!("Date: {}", invoice.created_at.format("%Y-%m-%d")),
            format!("Customer Name: {}", invoice.customer_name),
        ];
        if let Some(contact) = &invoice.customer_contact {
            info.push(format!("Contact: {contact}"));
        }
        info.push(format!("Payment: {:?}", invoice.payment_method));
        for line in info {
            page.text("F1", 12, LEFT, y, &line);
            y -= 18;
        }
    }
}

/// Operations for one page, drawn top down.
#[derive(Default)]
struct Page {
    ops: Vec<Operation>,
}

impl Page {
    fn text(&mut self, font: &str, size: i64, x: i64, y: i64, text: &str) {
        // The standard fonts here only cover ASCII.
        let text: String = text
            .chars()
            .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
            .collect();
        self.ops.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![font.into(), Object::Integer(size)]),
            Operation::new("Td", vec![Object::Integer(x), Object::Integer(y)]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ]);
    }

    /// Column headings then one row per line; returns the y below the table.
    fn table(&mut self, top: i64, lines: &[InvoiceLine]) -> i64 {
        for (x, heading) in COLUMNS.iter().zip(["Item", "Qty", "Price", "Total"]) {
            self.text("F2", 12, *x, top, heading);
        }
        let mut y = top - 30;
        for line in lines {
            let cells = [
                line.name.clone(),
                line.quantity.to_string(),
                format!("Rs. {}", money(line.unit_price)),
                format!("Rs. {}", money(line.line_total)),
            ];
            for (x, cell) in COLUMNS.iter().zip(cells) {
                self.text("F1", 12, *x, y, &cell);
            }
            y -= ROW_HEIGHT;
        }
        y
    }
}

impl DocumentRenderer for PdfInvoiceRenderer {
    fn render(&self, invoice: &Invoice) -> Result<Document, RenderError> {
        if invoice.lines.is_empty() {
            return Err(RenderError::EmptyInvoice(invoice.id.to_string()));
        }

        let chunks: Vec<&[InvoiceLine]> = invoice.lines.chunks(ROWS_PER_PAGE).collect();
        let mut pages = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            let mut page = Page::default();
            let top = if i == 0 {
                self.header(invoice, &mut page);
                PAGE_HEIGHT - 200
            } else {
                PAGE_HEIGHT - 60
            };
            let bottom = page.table(top, chunk);
            if i + 1 == chunks.len() {
                let total = format!("Grand Total: Rs. {}", money(invoice.total));
                page.text("F2", 12, 400, bottom - 20, &total);
            }
            pages.push(page);
        }

        Ok(Document {
            file_name: format!("invoice_{}.pdf", invoice.id),
            content_type: "application/pdf".to_string(),
            bytes: write_pdf(pages)?,
        })
    }
}

fn write_pdf(pages: Vec<Page>) -> Result<Vec<u8>, RenderError> {
    let failed = |e: lopdf::Error| RenderError::Failed(e.to_string());

    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });
    let resources = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => regular, "F2" => bold },
    });

    let mut kids = Vec::with_capacity(pages.len());
    for page in pages {
        let content = Content { operations: page.ops }.encode().map_err(failed)?;
        let contents = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => contents,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(PAGE_WIDTH),
                Object::Integer(PAGE_HEIGHT),
            ],
        }),
    );
    let catalog = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| RenderError::Failed(e.to_string()))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InvoiceId, ItemId, PaymentMethod, TenantId};
    use chrono::Utc;

    fn line(name: &str, unit_price: u64, quantity: u32) -> InvoiceLine {
        InvoiceLine {
            item_id: ItemId(1),
            name: name.into(),
            unit_price,
            quantity,
            line_total: unit_price * u64::from(quantity),
        }
    }

    fn invoice(lines: Vec<InvoiceLine>) -> Invoice {
        let total = lines.iter().map(|l| l.line_total).sum();
        Invoice {
            id: InvoiceId::new(),
            tenant: TenantId::from("shop-a"),
            customer_name: "Kiran".into(),
            customer_contact: Some("9876543210".into()),
            lines,
            total,
            payment_method: PaymentMethod::Card,
            created_at: Utc::now(),
        }
    }

    fn contains(haystack: &[u8], needle: &str) -> bool {
        haystack
            .windows(needle.len())
            .any(|w| w == needle.as_bytes())
    }

    #[test]
    fn renders_a_readable_pdf() {
        let invoice = invoice(vec![line("Vitamin C", 1250, 2), line("ORS", 500, 1)]);
        let document = PdfInvoiceRenderer::default().render(&invoice).unwrap();

        assert_eq!(document.file_name, format!("invoice_{}.pdf", invoice.id));
        assert_eq!(document.content_type, "application/pdf");
        assert!(document.bytes.starts_with(b"%PDF-1.5"));
        assert!(contains(&document.bytes, "(Vitamin C)"));
        assert!(contains(&document.bytes, "(Rs. 25.00)"));
        assert!(contains(&document.bytes, "(Grand Total: Rs. 30.00)"));

        let parsed = lopdf::Document::load_mem(&document.bytes).unwrap();
        assert_eq!(parsed.get_pages().len(), 1);
    }

    #[test]
    fn long_invoices_span_pages() {
        let lines = (0..ROWS_PER_PAGE + 1).map(|i| line(&format!("Item {i}"), 100, 1)).collect();
        let document = PdfInvoiceRenderer::default().render(&invoice(lines)).unwrap();
        let parsed = lopdf::Document::load_mem(&document.bytes).unwrap();
        assert_eq!(parsed.get_pages().len(), 2);
    }

    #[test]
    fn rendering_is_deterministic() {
        let invoice = invoice(vec![line("Paracetamol", 300, 3)]);
        let renderer = PdfInvoiceRenderer::new("Corner Pharmacy");
        assert_eq!(renderer.render(&invoice).unwrap(), renderer.render(&invoice).unwrap());
    }

    #[test]
    fn empty_invoices_fail() {
        let result = PdfInvoiceRenderer::default().render(&invoice(vec![]));
        assert!(matches!(result, Err(RenderError::EmptyInvoice(_))));
    }
}

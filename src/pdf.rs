// src/pdf.rs

use chrono::NaiveDate;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Rgb,
};
use tracing::debug;

use crate::error::ReportError;
use crate::model::{DayRecord, ShiftRecord};

const TIME_FORMAT_LONG: &str = "%a %b %-d, %Y";
const TIME_FORMAT_SHORT: &str = "%Y-%m-%d";

// US Letter, portrait.
const PAGE_W: f32 = 215.9;
const PAGE_H: f32 = 279.4;
const MARGIN_L: f32 = 10.0;
const MARGIN_BOTTOM: f32 = 20.0;
const TOP_Y: f32 = PAGE_H - 18.0;

// Cell geometry in mm, mirroring the report's fixed column plan.
const CELL_H: f32 = 7.0;
const SUMMARY_CELL_H: f32 = 9.0;
const HEADER_SPACING: f32 = 5.0;
const FUEL_SALE_COL: f32 = 50.0;
const LABEL_W: f32 = 90.0;
const VALUE_W: f32 = 40.0;

const BODY_PT: f32 = 12.0;
const TITLE_PT: f32 = 14.0;
const HEADING_PT: f32 = 20.0;

/// Display labels for fuel grades, in pump order. Grade 6 is aggregated but
/// has no label defined upstream, so it never gets its own line.
pub const FUEL_GRADE_LABELS: [Option<&str>; 6] = [
    Some("Regular"),
    Some("Mid Grade"),
    Some("Hi Grade"),
    Some("Diesel"),
    Some("Coloured Diesel"),
    None,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub text: String,
    pub width: f32,
    pub align: Align,
}

impl Cell {
    fn left(text: impl Into<String>, width: f32) -> Self {
        Self { text: text.into(), width, align: Align::Left }
    }

    fn right(text: impl Into<String>, width: f32) -> Self {
        Self { text: text.into(), width, align: Align::Right }
    }
}

/// One ordered, immutable layout element. The builders below produce a flat
/// section list; `render` is the only code that touches the PDF backend, so
/// all conditional-section logic is testable against plain data.
#[derive(Clone, Debug, PartialEq)]
pub enum Section {
    /// Report heading plus station/date meta lines.
    Header { title: String, meta: Vec<String> },
    /// Grey section title with a bottom rule.
    Title(String),
    /// A row of cells, optionally bold and/or underlined.
    Row { cells: Vec<Cell>, bold: bool, tall: bool, rule: bool },
    /// Free-running text (overshort description).
    Text(String),
    Gap(f32),
    PageBreak,
}

impl Section {
    fn row(cells: Vec<Cell>) -> Self {
        Self::Row { cells, bold: false, tall: false, rule: true }
    }

    fn total_row(cells: Vec<Cell>) -> Self {
        Self::Row { cells, bold: true, tall: true, rule: true }
    }

    fn labeled(label: &str, value: String) -> Self {
        Self::row(vec![Cell::left(label, LABEL_W), Cell::right(value, VALUE_W)])
    }

    fn labeled_total(label: &str, value: String) -> Self {
        Self::total_row(vec![Cell::left(label, LABEL_W), Cell::right(value, VALUE_W)])
    }
}

pub struct RenderedDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
}

// ===================== Formatting =====================

/// Fixed two decimal places; NaN renders as an empty string, never "NaN".
pub fn fmt_money(value: f64) -> String {
    fmt_fixed(value, 2)
}

/// Fixed three decimal places for litre volumes.
pub fn fmt_volume(value: f64) -> String {
    fmt_fixed(value, 3)
}

fn fmt_fixed(value: f64, decimals: usize) -> String {
    if value.is_nan() {
        return String::new();
    }
    format!("{:.*}", decimals, value)
}

fn hyphenate(name: &str) -> String {
    name.replace(' ', "-")
}

pub fn day_file_name(station_name: &str, date: &str) -> String {
    format!("DayReport_{}_{}.pdf", hyphenate(station_name), date)
}

pub fn shift_file_name(station_name: &str, record_number: &str) -> String {
    format!("ShiftReport_{}_{}.pdf", hyphenate(station_name), record_number)
}

// ===================== Section builders =====================

pub fn day_sections(record: &DayRecord) -> Vec<Section> {
    let date_str = NaiveDate::parse_from_str(&record.date, TIME_FORMAT_SHORT)
        .map(|d| d.format(TIME_FORMAT_LONG).to_string())
        .unwrap_or_else(|_| record.date.clone());

    let mut sections = vec![Section::Header {
        title: "Day Summary Report".to_string(),
        meta: vec![
            format!("Station: {}", record.station_name),
            format!("Date: {}", date_str),
        ],
    }];

    sections.push(Section::Title("Fuel Summary".to_string()));
    sections.push(Section::Row {
        cells: vec![
            Cell::left("Grade", FUEL_SALE_COL),
            Cell::right("Dollar", FUEL_SALE_COL),
            Cell::right("Litre", FUEL_SALE_COL),
        ],
        bold: false,
        tall: false,
        rule: false,
    });
    for (grade, label) in record.fuel.grades.iter().zip(FUEL_GRADE_LABELS) {
        let label = match label {
            Some(label) => label,
            None => continue,
        };
        if grade.dollar == 0.0 {
            continue;
        }
        sections.push(Section::row(vec![
            Cell::left(label, FUEL_SALE_COL),
            Cell::right(fmt_money(grade.dollar), FUEL_SALE_COL),
            Cell::right(fmt_volume(grade.litre), FUEL_SALE_COL),
        ]));
    }
    sections.push(Section::total_row(vec![
        Cell::left("Total Fuel", FUEL_SALE_COL),
        Cell::right(fmt_money(record.fuel.total_dollar), FUEL_SALE_COL),
        Cell::right(fmt_volume(record.fuel.total_litre), FUEL_SALE_COL),
    ]));

    sections.push(Section::Title("Non Fuel Summary".to_string()));
    sections.push(Section::total_row(vec![
        Cell::left("Total", FUEL_SALE_COL),
        Cell::right(fmt_money(record.summary.non_fuel), FUEL_SALE_COL),
    ]));

    sections.push(Section::Title("Total Sales".to_string()));
    sections.push(Section::total_row(vec![
        Cell::left("Total", FUEL_SALE_COL),
        Cell::right(fmt_money(record.summary.total), FUEL_SALE_COL),
    ]));

    sections.push(Section::Title("Cash & Cards".to_string()));
    let money_rows = [
        ("Visa", record.cards.visa),
        ("Mastercard", record.cards.mastercard),
        ("Gales", record.cards.gales),
        ("Amex", record.cards.amex),
        ("Discover", record.cards.discover),
        ("Debit", record.cards.debit),
        ("Diesel Discount", record.cards.diesel_discount),
        ("Lottery Payout", record.cash.lottery_payout),
        ("Supplier Payout", record.cash.payout),
        ("Cash", record.cash.cash),
        ("Gales Loyalty Redeemed", record.cash.gales_loyalty_redeem),
        ("Gift Cert Redeemable", record.cash.gift_cert_redeem),
        ("OS Adjusted", record.cash.os_adjusted),
        ("Drive Offs / NSF", record.cash.drive_off_nsf),
        ("Write Offs", record.cash.write_off),
        ("Other", record.cash.other),
    ];
    for (label, value) in money_rows {
        sections.push(Section::row(vec![
            Cell::left(label, FUEL_SALE_COL),
            Cell::right(fmt_money(value), FUEL_SALE_COL),
        ]));
    }
    sections.push(Section::total_row(vec![
        Cell::left("Total", FUEL_SALE_COL),
        Cell::right(fmt_money(record.summary.total_cash_cards), FUEL_SALE_COL),
    ]));

    sections
}

pub fn shift_sections(record: &ShiftRecord) -> Vec<Section> {
    let mut sections = vec![Section::Header {
        title: "Shift Report".to_string(),
        meta: vec![
            format!("Station: {}", record.station_name),
            format!("Record: {}", record.record_number),
        ],
    }];

    // Sales
    sections.push(Section::Title("Sales".to_string()));
    sections.push(Section::labeled("Fuel", fmt_money(record.summary.fuel)));
    if record.summary.other_fuel_dollar > 0.0 {
        sections.push(Section::labeled(
            "Other Fuel",
            fmt_money(record.summary.other_fuel_dollar),
        ));
    }
    sections.push(Section::labeled("Non-Fuel", fmt_money(record.summary.non_fuel)));
    sections.push(Section::labeled(
        "Fuel Adjustment",
        fmt_money(record.summary.fuel_adjust),
    ));
    sections.push(Section::labeled_total("Total", fmt_money(record.summary.total)));
    sections.push(Section::labeled_total(
        "Total Fuel (L)",
        fmt_volume(record.summary.litres),
    ));
    if record.summary.other_fuel_dollar > 0.0 {
        sections.push(Section::labeled(
            "Total Other Fuel (L)",
            fmt_volume(record.summary.other_fuel_litre),
        ));
    }

    // Cash & cards
    sections.push(Section::Title("Cash & Cards".to_string()));
    let card_rows = [
        ("Visa", record.cards.visa),
        ("Mastercard", record.cards.mastercard),
        ("Gales", record.cards.gales),
        ("Amex", record.cards.amex),
        ("Discover", record.cards.discover),
        ("Debit", record.cards.debit),
        ("Diesel Discount", record.cards.diesel_discount),
    ];
    for (label, value) in card_rows {
        sections.push(Section::labeled(label, fmt_money(value)));
    }
    sections.push(Section::labeled_total(
        "Subtotal",
        fmt_money(record.cards.total_cards),
    ));
    sections.push(Section::Gap(3.0));
    let cash_rows = [
        ("Lottery Payout", record.cash.lottery_payout),
        ("Supplier Payout", record.cash.payout),
        ("Cash", record.cash.cash),
        ("Gales Loyalty Redeemed", record.cash.gales_loyalty_redeem),
        ("Gift Certificate Redeemed", record.cash.gift_cert_redeem),
        ("OS Adjust", record.cash.os_adjusted),
        ("Drive Offs / NSF", record.cash.drive_off_nsf),
        ("Write Offs", record.cash.write_off),
        ("Other", record.cash.other),
    ];
    for (label, value) in cash_rows {
        sections.push(Section::labeled(label, fmt_money(value)));
    }
    sections.push(Section::labeled_total(
        "Total",
        fmt_money(record.summary.total_cash_cards),
    ));

    // Overshort
    sections.push(Section::Title("Overshort".to_string()));
    sections.push(Section::labeled("Amount", fmt_money(record.overshort_amount)));
    sections.push(Section::Text(record.overshort_descrip.clone()));

    // Attendant and journal always land on the second page, even when empty.
    sections.push(Section::PageBreak);
    sections.push(Section::Title("Attendant".to_string()));
    sections.push(Section::labeled("Name", record.attendant.name.clone()));
    sections.push(Section::labeled(
        "Sheet Completed",
        record.attendant.sheet_complete.clone(),
    ));
    sections.push(Section::labeled(
        "Overshort Checked",
        record.attendant.overshort_complete.clone(),
    ));
    sections.push(Section::labeled(
        "Overshort amount",
        fmt_money(record.attendant.overshort_value),
    ));

    sections.push(Section::Title("Journal Entries".to_string()));
    sections.push(Section::row(vec![
        Cell::left("Product", 50.0),
        Cell::right("Amount", 20.0),
        Cell::left("", 10.0),
        Cell::left("Comments", 110.0),
    ]));
    for journal in &record.product_adjust {
        sections.push(Section::row(vec![
            Cell::left(journal.product_name.clone(), 50.0),
            Cell::right(fmt_money(journal.amount), 20.0),
            Cell::left("", 10.0),
            Cell::left(journal.comments.clone(), 110.0),
        ]));
    }

    sections
}

// ===================== Layout pass =====================

pub fn render_day(record: &DayRecord) -> Result<RenderedDocument, ReportError> {
    let sections = day_sections(record);
    let filename = day_file_name(&record.station_name, &record.date);
    debug!(filename, "rendering day report");
    let bytes = render("Day Report PDF", &sections, false)?;
    Ok(RenderedDocument { filename, bytes })
}

pub fn render_shift(record: &ShiftRecord) -> Result<RenderedDocument, ReportError> {
    let sections = shift_sections(record);
    let filename = shift_file_name(&record.station_name, &record.record_number);
    debug!(filename, "rendering shift report");
    let bytes = render("Shift Report PDF", &sections, true)?;
    Ok(RenderedDocument { filename, bytes })
}

// Primitive draw operations, one list per page. Produced before any PDF
// object exists so the page count is known when footers are drawn.
enum Op {
    Text { text: String, size: f32, bold: bool, grey: bool, x: f32, y: f32 },
    Rule { x1: f32, x2: f32, y: f32 },
}

fn paginate(sections: &[Section]) -> Vec<Vec<Op>> {
    let mut pages: Vec<Vec<Op>> = Vec::new();
    let mut page: Vec<Op> = Vec::new();
    let mut y = TOP_Y;

    for section in sections {
        if y < MARGIN_BOTTOM + CELL_H && !matches!(section, Section::PageBreak) {
            pages.push(std::mem::take(&mut page));
            y = TOP_Y;
        }

        match section {
            Section::Header { title, meta } => {
                page.push(Op::Text {
                    text: title.clone(),
                    size: HEADING_PT,
                    bold: false,
                    grey: false,
                    x: MARGIN_L,
                    y,
                });
                y -= 8.0;
                for line in meta {
                    page.push(Op::Text {
                        text: line.clone(),
                        size: BODY_PT,
                        bold: false,
                        grey: false,
                        x: MARGIN_L,
                        y,
                    });
                    y -= 6.0;
                }
            }
            Section::Title(text) => {
                y -= HEADER_SPACING;
                page.push(Op::Text {
                    text: text.clone(),
                    size: TITLE_PT,
                    bold: false,
                    grey: true,
                    x: MARGIN_L,
                    y,
                });
                page.push(Op::Rule {
                    x1: MARGIN_L,
                    x2: PAGE_W - MARGIN_L,
                    y: y - 2.0,
                });
                y -= 8.0 + 3.0;
            }
            Section::Row { cells, bold, tall, rule } => {
                let height = if *tall { SUMMARY_CELL_H } else { CELL_H };
                let mut x = MARGIN_L;
                let mut row_end = MARGIN_L;
                for cell in cells {
                    let text_x = match cell.align {
                        Align::Left => x,
                        Align::Right => x + cell.width - text_width_mm(&cell.text, BODY_PT),
                    };
                    if !cell.text.is_empty() {
                        page.push(Op::Text {
                            text: cell.text.clone(),
                            size: BODY_PT,
                            bold: *bold,
                            grey: false,
                            x: text_x,
                            y,
                        });
                    }
                    x += cell.width;
                    row_end = x;
                }
                if *rule {
                    page.push(Op::Rule {
                        x1: MARGIN_L,
                        x2: row_end,
                        y: y - 2.0,
                    });
                }
                y -= height;
            }
            Section::Text(text) => {
                if !text.is_empty() {
                    page.push(Op::Text {
                        text: text.clone(),
                        size: BODY_PT,
                        bold: false,
                        grey: false,
                        x: MARGIN_L,
                        y,
                    });
                }
                y -= CELL_H;
            }
            Section::Gap(height) => {
                y -= height;
            }
            Section::PageBreak => {
                pages.push(std::mem::take(&mut page));
                y = TOP_Y;
            }
        }
    }

    pages.push(page);
    pages
}

fn render(title: &str, sections: &[Section], number_pages: bool) -> Result<Vec<u8>, ReportError> {
    let pages = paginate(sections);
    let page_count = pages.len();

    let (doc, first_page, first_layer) =
        PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
    let font = add_font(&doc, BuiltinFont::Helvetica)?;
    let font_bold = add_font(&doc, BuiltinFont::HelveticaBold)?;
    let font_italic = add_font(&doc, BuiltinFont::HelveticaOblique)?;

    for (index, ops) in pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
            doc.get_page(page).get_layer(layer)
        };

        for op in ops {
            draw(&layer, op, &font, &font_bold);
        }

        if number_pages {
            let text = format!("Page {} of {}", index + 1, page_count);
            let x = (PAGE_W - text_width_mm(&text, 8.0)) / 2.0;
            layer.set_fill_color(black());
            layer.use_text(text, 8.0, Mm(x), Mm(10.0), &font_italic);
        }
    }

    doc.save_to_bytes()
        .map_err(|e| ReportError::render("pdf.render", e.to_string()))
}

fn draw(layer: &PdfLayerReference, op: &Op, font: &IndirectFontRef, font_bold: &IndirectFontRef) {
    match op {
        Op::Text { text, size, bold, grey, x, y } => {
            layer.set_fill_color(if *grey { grey_text() } else { black() });
            let font = if *bold { font_bold } else { font };
            layer.use_text(text.clone(), *size, Mm(*x), Mm(*y), font);
        }
        Op::Rule { x1, x2, y } => {
            layer.set_outline_color(rule_grey());
            layer.set_outline_thickness(0.3);
            layer.add_line(Line {
                points: vec![
                    (Point::new(Mm(*x1), Mm(*y)), false),
                    (Point::new(Mm(*x2), Mm(*y)), false),
                ],
                is_closed: false,
            });
        }
    }
}

fn add_font(
    doc: &PdfDocumentReference,
    font: BuiltinFont,
) -> Result<IndirectFontRef, ReportError> {
    doc.add_builtin_font(font)
        .map_err(|e| ReportError::render("pdf.render", e.to_string()))
}

// Rough Helvetica advance estimate, good enough for right alignment of
// short numeric cells.
fn text_width_mm(text: &str, size_pt: f32) -> f32 {
    text.chars().count() as f32 * size_pt * 0.5 * 0.3528
}

fn black() -> Color {
    Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None))
}

fn grey_text() -> Color {
    Color::Rgb(Rgb::new(0.47, 0.47, 0.47, None))
}

fn rule_grey() -> Color {
    Color::Rgb(Rgb::new(0.75, 0.75, 0.75, None))
}

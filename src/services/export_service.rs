use crate::dto::admin_dto::ReportMeta;
use crate::error::Result;
use crate::models::responder::ResponderRow;
use rust_xlsxwriter::*;

/// Paper size index for A4 in the spreadsheet page setup.
const PAPER_A4: u8 = 9;

pub struct ExportService;

impl ExportService {
    /// Renders the admin list as a printable A4 portrait workbook.
    pub fn generate_responders_xlsx(rows: &[ResponderRow], report: &ReportMeta) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Message Responder")?;
        worksheet.set_paper_size(PAPER_A4);
        worksheet.set_portrait();

        let header_bg = Color::RGB(0x0F172A);
        let alt_row = Color::RGB(0xF8FAFC);
        let border_color = Color::RGB(0xE2E8F0);

        let columns = [
            ("Id", 10.0),
            ("Text Recieved", 40.0),
            ("Response By Bot", 50.0),
            ("Botid", 12.0),
        ];
        for (i, (_, width)) in columns.iter().enumerate() {
            worksheet.set_column_width(i as u16, *width)?;
        }

        let title_format = Format::new()
            .set_font_size(14)
            .set_bold()
            .set_align(FormatAlign::CenterAcross)
            .set_align(FormatAlign::VerticalCenter);
        worksheet.set_row_height(0, 30)?;
        worksheet.merge_range(
            0,
            0,
            0,
            (columns.len() - 1) as u16,
            &report.report_title,
            &title_format,
        )?;

        let header_format = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(Color::White)
            .set_background_color(header_bg)
            .set_align(FormatAlign::Center)
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);
        let header_row = 1;
        for (i, (name, _)) in columns.iter().enumerate() {
            worksheet.write_string_with_format(header_row, i as u16, *name, &header_format)?;
        }

        let data_start_row = 2;
        for (idx, row) in rows.iter().enumerate() {
            let line = data_start_row + idx as u32;
            let mut cell = Format::new()
                .set_font_size(10)
                .set_text_wrap()
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color);
            if idx % 2 == 0 {
                cell = cell.set_background_color(alt_row);
            }

            worksheet.write_number_with_format(line, 0, row.id as f64, &cell)?;
            worksheet.write_string_with_format(line, 1, &row.text_recieved, &cell)?;
            worksheet.write_string_with_format(line, 2, &row.response_by_bot, &cell)?;
            worksheet.write_number_with_format(line, 3, row.botid as f64, &cell)?;
        }

        worksheet.set_freeze_panes(data_start_row, 0)?;

        let buffer = workbook.save_to_buffer()?;
        Ok(buffer)
    }
}

use crate::error::Result;
use crate::models::webhook_log::{WebhookLog, WebhookStatus};
use crate::services::webhook_service::webhook_stats;
use crate::utils::money::format_brl;
use rust_xlsxwriter::*;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const EMPTY_CELL: &str = "—";

pub struct ExportService;

impl ExportService {
    fn status_label(status: &str) -> &str {
        match status.parse::<WebhookStatus>() {
            Ok(WebhookStatus::Received) => "Recebido",
            Ok(WebhookStatus::Pending) => "Pendente",
            Ok(WebhookStatus::Success) => "Processado",
            Ok(WebhookStatus::Failed) => "Falhou",
            Err(_) => status,
        }
    }

    fn status_color(status: &str) -> Color {
        match status.parse::<WebhookStatus>() {
            Ok(WebhookStatus::Received) => Color::RGB(0x3B82F6), // Blue
            Ok(WebhookStatus::Pending) => Color::RGB(0xF59E0B),  // Amber
            Ok(WebhookStatus::Success) => Color::RGB(0x10B981),  // Emerald
            Ok(WebhookStatus::Failed) => Color::RGB(0xEF4444),   // Red
            Err(_) => Color::RGB(0x64748B),
        }
    }

    /// Styled XLSX workbook of webhook logs, one row per log plus a summary row.
    pub fn generate_webhook_logs_xlsx(logs: &[WebhookLog]) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Webhooks")?;

        // ── Color palette ──
        let primary_color = Color::RGB(0x1E293B); // Slate 800
        let header_bg = Color::RGB(0x0F172A); // Slate 900
        let header_text = Color::White;
        let alt_row_1 = Color::RGB(0xF8FAFC); // Slate 50
        let alt_row_2 = Color::White;
        let border_color = Color::RGB(0xE2E8F0); // Slate 200

        // ── Column definitions ──
        let columns = [
            ("№", 8.0),
            ("Data", 18.0),
            ("Plataforma", 14.0),
            ("Evento", 22.0),
            ("Email", 32.0),
            ("Valor", 14.0),
            ("Status", 14.0),
            ("Produtos", 45.0),
            ("Usuário", 38.0),
            ("Erro", 45.0),
        ];
        let last_col = (columns.len() - 1) as u16;

        for (i, (_, width)) in columns.iter().enumerate() {
            worksheet.set_column_width(i as u16, *width)?;
        }

        // ── Title row ──
        let title_format = Format::new()
            .set_font_size(16)
            .set_bold()
            .set_font_color(header_text)
            .set_background_color(primary_color)
            .set_align(FormatAlign::CenterAcross)
            .set_align(FormatAlign::VerticalCenter);

        worksheet.set_row_height(0, 40)?;
        worksheet.merge_range(0, 0, 0, last_col, "Relatório de webhooks", &title_format)?;

        // ── Subtitle row ──
        let subtitle_format = Format::new()
            .set_font_size(10)
            .set_italic()
            .set_font_color(Color::RGB(0x94A3B8))
            .set_background_color(primary_color)
            .set_align(FormatAlign::CenterAcross)
            .set_align(FormatAlign::VerticalCenter);

        worksheet.set_row_height(1, 22)?;
        let now = chrono::Utc::now().format("%d/%m/%Y %H:%M UTC").to_string();
        let subtitle_text = format!(
            "Exportado em: {}  •  Total de webhooks: {}",
            now,
            logs.len()
        );
        worksheet.merge_range(1, 0, 1, last_col, &subtitle_text, &subtitle_format)?;

        // ── Header row ──
        let header_format = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(header_text)
            .set_background_color(header_bg)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_text_wrap()
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);

        let header_row = 2;
        worksheet.set_row_height(header_row, 30)?;
        for (i, (name, _)) in columns.iter().enumerate() {
            worksheet.write_string_with_format(header_row, i as u16, *name, &header_format)?;
        }

        // ── Data rows ──
        let data_start_row = 3;
        for (idx, log) in logs.iter().enumerate() {
            let row = data_start_row + idx as u32;
            let bg = if idx % 2 == 0 { alt_row_1 } else { alt_row_2 };

            let base_fmt = Format::new()
                .set_font_size(10)
                .set_background_color(bg)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color);
            let center_fmt = base_fmt.clone().set_align(FormatAlign::Center);
            let wrap_fmt = base_fmt.clone().set_text_wrap();
            let money_fmt = base_fmt.clone().set_align(FormatAlign::Right);

            worksheet.set_row_height(row, 22)?;

            worksheet.write_number_with_format(row, 0, (idx + 1) as f64, &center_fmt)?;

            let created = log.created_at.format("%d/%m/%Y %H:%M").to_string();
            worksheet.write_string_with_format(row, 1, &created, &center_fmt)?;

            worksheet.write_string_with_format(row, 2, &log.platform, &center_fmt)?;
            worksheet.write_string_with_format(
                row,
                3,
                log.event_type.as_deref().unwrap_or(EMPTY_CELL),
                &base_fmt,
            )?;
            worksheet.write_string_with_format(
                row,
                4,
                log.customer_email.as_deref().unwrap_or(EMPTY_CELL),
                &base_fmt,
            )?;

            let amount = log
                .amount
                .map(format_brl)
                .unwrap_or_else(|| EMPTY_CELL.to_string());
            worksheet.write_string_with_format(row, 5, &amount, &money_fmt)?;

            // Status (colored)
            let status_fmt = Format::new()
                .set_font_size(10)
                .set_bold()
                .set_font_color(Color::White)
                .set_background_color(Self::status_color(&log.status))
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color);
            worksheet.write_string_with_format(row, 6, Self::status_label(&log.status), &status_fmt)?;

            let summary = crate::dto::webhook_dto::WebhookLogSummary::from(log.clone());
            let products = if summary.product_titles.is_empty() {
                EMPTY_CELL.to_string()
            } else {
                summary.product_titles.join("\n")
            };
            worksheet.write_string_with_format(row, 7, &products, &wrap_fmt)?;

            let user = log
                .processed_user_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| EMPTY_CELL.to_string());
            worksheet.write_string_with_format(row, 8, &user, &center_fmt)?;

            worksheet.write_string_with_format(
                row,
                9,
                log.error_message.as_deref().unwrap_or(EMPTY_CELL),
                &wrap_fmt,
            )?;
        }

        // ── Summary row ──
        let stats = webhook_stats(logs);
        let total_row = data_start_row + logs.len() as u32 + 1;
        let summary_fmt = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(primary_color)
            .set_background_color(Color::RGB(0xE0E7FF)) // Indigo 100
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);

        worksheet.set_row_height(total_row, 26)?;
        worksheet.merge_range(
            total_row,
            0,
            total_row,
            2,
            &format!("Total: {} webhooks", stats.total),
            &summary_fmt,
        )?;

        let count = |status: WebhookStatus| stats.by_status.get(status.as_str()).copied().unwrap_or(0);
        let status_summary = format!(
            "Processados: {} | Pendentes: {} | Falhas: {} | Recebidos: {}",
            count(WebhookStatus::Success),
            count(WebhookStatus::Pending),
            count(WebhookStatus::Failed),
            count(WebhookStatus::Received),
        );
        worksheet.merge_range(total_row, 3, total_row, 6, &status_summary, &summary_fmt)?;

        let amount_summary = format!("Valor processado: {}", stats.processed_amount_display);
        worksheet.merge_range(total_row, 7, total_row, last_col, &amount_summary, &summary_fmt)?;

        // Freeze panes (header stays visible while scrolling)
        worksheet.set_freeze_panes(3, 0)?;

        worksheet.autofilter(
            2,
            0,
            (data_start_row + logs.len() as u32).saturating_sub(1).max(2),
            last_col,
        )?;

        let buffer = workbook.save_to_buffer()?;
        Ok(buffer)
    }
}

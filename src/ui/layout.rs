use crate::app::{App, Status};
use crate::ui::theme::{sky_theme, SkyTheme};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use ratatui_image::StatefulImage;

pub fn draw(f: &mut Frame, app: &mut App) {
    let theme = sky_theme();
    let area = f.area();

    // Main container
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_focused))
        .style(Style::default().bg(theme.bg_dark));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Header with pickers
            Constraint::Min(8),    // Preview
            Constraint::Length(2), // Status + key hints
        ])
        .split(inner);

    draw_header(f, app, chunks[0], &theme);

    // ratatui-image renders directly to the terminal, bypassing widget
    // z-order, so skip the preview while the help popup is up
    if app.show_help {
        draw_preview_placeholder(f, chunks[1], &theme);
    } else {
        draw_preview(f, app, chunks[1], &theme);
    }

    draw_footer(f, app, chunks[2], &theme);

    if app.show_help {
        draw_help_popup(f, area, &theme);
    }
}

fn draw_header(f: &mut Frame, app: &App, area: Rect, theme: &SkyTheme) {
    let source_name = app
        .config
        .source()
        .map(|s| s.name.clone())
        .unwrap_or_else(|| app.config.current_source.clone());

    let picker_style = if app.busy {
        // Pickers are inert during a download; show them dimmed
        Style::default().fg(theme.fg_muted)
    } else {
        Style::default().fg(theme.accent_primary)
    };

    let header = Line::from(vec![
        Span::styled(
            " SkyWall ",
            Style::default()
                .fg(theme.accent_highlight)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("│ ", Style::default().fg(theme.fg_muted)),
        Span::styled(format!("[s] {source_name}"), picker_style),
        Span::styled(" │ ", Style::default().fg(theme.fg_muted)),
        Span::styled(
            format!("[b] {}", app.config.resolution.display_name()),
            picker_style,
        ),
        Span::styled(" │ ", Style::default().fg(theme.fg_muted)),
        Span::styled(format!("[i] {}", app.config.interval_label()), picker_style),
        Span::styled(" │ ", Style::default().fg(theme.fg_muted)),
        Span::styled(
            if app.busy { "[r] ···" } else { "[r] refresh" },
            if app.busy {
                Style::default().fg(theme.fg_muted)
            } else {
                Style::default().fg(theme.accent_highlight)
            },
        ),
    ]);

    let paragraph = Paragraph::new(header).alignment(Alignment::Center);
    f.render_widget(paragraph, area);
}

fn draw_preview(f: &mut Frame, app: &mut App, area: Rect, theme: &SkyTheme) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.fg_muted))
        .title(Span::styled(
            " preview ",
            Style::default().fg(theme.fg_secondary),
        ));
    let inner = block.inner(area);
    f.render_widget(block, area);

    if let Some(protocol) = app.preview.as_mut() {
        let image = StatefulImage::new(None);
        f.render_stateful_widget(image, inner, protocol);
    } else {
        let hint = if app.busy {
            "Downloading..."
        } else {
            "No wallpaper yet — press r to refresh"
        };
        let text = Paragraph::new(hint)
            .style(Style::default().fg(theme.fg_muted))
            .alignment(Alignment::Center);
        f.render_widget(text, center_vertically(inner, 1));
    }
}

fn draw_preview_placeholder(f: &mut Frame, area: Rect, theme: &SkyTheme) {
    let text = Paragraph::new("(help open)")
        .style(Style::default().fg(theme.fg_muted))
        .alignment(Alignment::Center);
    f.render_widget(text, center_vertically(area, 1));
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect, theme: &SkyTheme) {
    let status_style = match &app.status {
        Status::Error(_) | Status::NoWallpaper => Style::default().fg(theme.error),
        Status::Downloading => Style::default().fg(theme.warning),
        Status::Updated | Status::UsedCache => Style::default().fg(theme.success),
        Status::Ready => Style::default().fg(theme.fg_secondary),
    };

    let mut spans = vec![Span::styled(app.status.message(), status_style)];
    if let Some(next) = &app.next_refresh_label {
        spans.push(Span::styled(" │ ", Style::default().fg(theme.fg_muted)));
        spans.push(Span::styled(
            format!("next refresh {next}"),
            Style::default().fg(theme.fg_secondary),
        ));
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(area);

    f.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Center),
        rows[0],
    );
    f.render_widget(
        Paragraph::new("s source · b resolution · i interval · r refresh · ? help · q quit")
            .style(Style::default().fg(theme.fg_muted))
            .alignment(Alignment::Center),
        rows[1],
    );
}

fn draw_help_popup(f: &mut Frame, area: Rect, theme: &SkyTheme) {
    let popup_width = 46.min(area.width.saturating_sub(4));
    let popup_height = 12.min(area.height.saturating_sub(2));
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    let clear = Block::default().style(Style::default().bg(theme.bg_dark));
    f.render_widget(clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.accent_highlight))
        .title(Span::styled(
            " Keys ",
            Style::default()
                .fg(theme.accent_highlight)
                .add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(popup_area);
    f.render_widget(block, popup_area);

    let key = |k: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {k:<8}"), Style::default().fg(theme.accent_primary)),
            Span::styled(desc, Style::default().fg(theme.fg_secondary)),
        ])
    };

    let help_text = vec![
        key("r/Enter", "Refresh wallpaper now"),
        key("s", "Cycle image source"),
        key("b", "Cycle resolution (auto/uhd/1080p/768p/mobile)"),
        key("i", "Cycle refresh interval"),
        key("?", "Toggle this help"),
        key("q/Esc", "Quit"),
        Line::from(""),
        Line::from(Span::styled(
            "  Interval \"manual\" disables auto refresh.",
            Style::default().fg(theme.fg_muted),
        )),
        Line::from(Span::styled(
            "  Pickers lock while a download runs.",
            Style::default().fg(theme.fg_muted),
        )),
    ];

    f.render_widget(Paragraph::new(help_text), inner);
}

fn center_vertically(area: Rect, height: u16) -> Rect {
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(area.x, y, area.width, height.min(area.height))
}

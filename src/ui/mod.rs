pub mod components;

use crate::app::{App, Focus, Mode};
use crate::ui::components::command_overlay::draw_command_overlay;
use crate::ui::components::input::TextInput;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Status bar
    ])
    .split(frame.area());

  draw_header(frame, chunks[0], app);

  let main = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
    .split(chunks[1]);

  draw_form(frame, main[0], app);

  let panes = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
    .split(main[1]);

  app
    .folder_pane()
    .render(frame, panes[0], app.mode() == Mode::FolderPick);
  app
    .marker_pane()
    .render(frame, panes[1], app.mode() == Mode::Normal);

  draw_status_bar(frame, chunks[2], app);

  match app.mode() {
    Mode::Command => draw_command_overlay(
      frame,
      chunks[1],
      app.command_input(),
      &app.autocomplete_suggestions(),
      app.selected_suggestion(),
    ),
    Mode::SymbolPick => draw_symbol_overlay(frame, chunks[1], app),
    _ => {}
  }
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
  let connection = if app.map_id().is_none() {
    Span::styled(" offline ", Style::default().fg(Color::DarkGray))
  } else if app.connected() {
    Span::styled(
      format!(" {} ", app.map_id().unwrap_or("")),
      Style::default().fg(Color::Green),
    )
  } else {
    Span::styled(
      format!(" {} (unreachable) ", app.map_id().unwrap_or("")),
      Style::default().fg(Color::Red),
    )
  };

  let header = Line::from(vec![
    Span::styled(
      " sartopo-address ",
      Style::default().fg(Color::Cyan).bold(),
    ),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    connection,
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(
      format!(" {} ", app.account_name().unwrap_or("no account")),
      Style::default().fg(Color::Yellow),
    ),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(
      format!(" {} addresses ", app.address_count()),
      Style::default().fg(Color::White),
    ),
  ]);

  frame.render_widget(
    Paragraph::new(header).style(Style::default().bg(Color::Black)),
    area,
  );
}

fn draw_form(frame: &mut Frame, area: Rect, app: &App) {
  let block = Block::default()
    .title(" Marker ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(if app.mode() == Mode::Insert {
      Color::Yellow
    } else {
      Color::Blue
    }));

  let editing = app
    .editing_label()
    .map(|label| format!("editing: {}", label));

  let mut lines = vec![
    field_line(
      "Address",
      app.address_input(),
      app.mode() == Mode::Insert && app.focus() == Focus::Address,
    ),
    completion_line(app),
    Line::from(vec![
      Span::styled("     Lat  ", Style::default().fg(Color::DarkGray)),
      Span::raw(app.lat_text().to_string()),
      Span::styled("   Lon  ", Style::default().fg(Color::DarkGray)),
      Span::raw(app.lon_text().to_string()),
    ]),
    Line::default(),
    field_line(
      "Label",
      app.label_input(),
      app.mode() == Mode::Insert && app.focus() == Focus::Label,
    ),
    field_line(
      "Descr",
      app.description_input(),
      app.mode() == Mode::Insert && app.focus() == Focus::Description,
    ),
    Line::from(vec![
      Span::styled("  Symbol  ", Style::default().fg(Color::DarkGray)),
      Span::raw(app.symbol_name().unwrap_or("point").to_string()),
    ]),
    Line::from(vec![
      Span::styled("  Folder  ", Style::default().fg(Color::DarkGray)),
      Span::raw(app.selected_folder_name().unwrap_or("(auto)").to_string()),
    ]),
  ];

  if let Some(editing) = editing {
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
      format!("  {}", editing),
      Style::default().fg(Color::Magenta),
    )));
  }

  frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn field_line<'a>(label: &'a str, input: &'a TextInput, focused: bool) -> Line<'a> {
  let mut spans = vec![
    Span::styled(
      format!("{:>8}  ", label),
      Style::default().fg(if focused {
        Color::Yellow
      } else {
        Color::DarkGray
      }),
    ),
    Span::raw(input.value()),
  ];
  if focused {
    spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
  }
  Line::from(spans)
}

/// Grey hint with the rest of the first autocomplete match, if any.
fn completion_line(app: &App) -> Line<'_> {
  let typed = app.address_input().value();
  match app.completion_hint() {
    Some(hit) if !typed.is_empty() && hit.len() > typed.len() => Line::from(vec![
      Span::raw("          "),
      Span::styled(hit.to_string(), Style::default().fg(Color::DarkGray)),
      Span::styled("  (Tab)", Style::default().fg(Color::DarkGray)),
    ]),
    _ => Line::default(),
  }
}

fn draw_symbol_overlay(frame: &mut Frame, area: Rect, app: &App) {
  let height = (app.symbol_names().len().min(12) as u16) + 2;
  let width = (area.width * 40 / 100).clamp(24, 48);
  let overlay = Rect::new(area.x + 2, area.y + 1, width, height);

  frame.render_widget(Clear, overlay);

  let items: Vec<ListItem> = app
    .symbol_names()
    .iter()
    .map(|name| ListItem::new(name.as_str()))
    .collect();

  let list = List::new(items)
    .block(
      Block::default()
        .title(" Symbol ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow)),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White))
    .highlight_symbol("> ");

  let mut state = ListState::default();
  state.select(Some(app.symbol_selected()));

  frame.render_stateful_widget(list, overlay, &mut state);
}

fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
  let (content, style) = match app.status() {
    Some(status) => (status.to_string(), Style::default().fg(Color::Yellow)),
    None => {
      let hint = match app.mode() {
        Mode::Insert => " Esc:done  Tab:complete  (address fills lat/lon)",
        Mode::FolderPick => " j/k:move  Enter:choose folder  Esc:cancel",
        Mode::SymbolPick => " j/k:move  Enter:choose symbol  Esc:cancel",
        _ => " a:address  l:label  d:descr  f:folder  s:symbol  g:go  r:refresh  :command  q:quit",
      };
      (hint.to_string(), Style::default().fg(Color::DarkGray))
    }
  };

  frame.render_widget(Paragraph::new(content).style(style), area);
}

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use crate::sartopo::store::{FeatureListSink, ItemPayload};

/// A list pane fed by the feature store's publish fan-out.
///
/// Implements [`FeatureListSink`], so it can be registered as an observer
/// for one feature class and redrawn from whatever the last publish sent.
#[derive(Debug, Clone)]
pub struct FeaturePane {
  title: &'static str,
  items: Vec<(String, ItemPayload)>,
  selected: usize,
}

impl FeaturePane {
  pub fn new(title: &'static str) -> Self {
    Self {
      title,
      items: Vec::new(),
      selected: 0,
    }
  }

  pub fn items(&self) -> &[(String, ItemPayload)] {
    &self.items
  }

  pub fn selected_item(&self) -> Option<&(String, ItemPayload)> {
    self.items.get(self.selected)
  }

  pub fn move_selection(&mut self, delta: i32) {
    let len = self.items.len();
    if len > 0 {
      self.selected = (self.selected as i32 + delta).rem_euclid(len as i32) as usize;
    }
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn render(&self, frame: &mut Frame, area: Rect, focused: bool) {
    let border_color = if focused { Color::Yellow } else { Color::Blue };
    let block = Block::default()
      .title(format!(" {} ({}) ", self.title, self.items.len()))
      .borders(Borders::ALL)
      .border_style(Style::default().fg(border_color));

    if self.items.is_empty() {
      let paragraph = Paragraph::new("(none)")
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = self
      .items
      .iter()
      .map(|(label, _)| ListItem::new(Line::from(label.as_str())))
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(Some(self.selected));

    frame.render_stateful_widget(list, area, &mut state);
  }
}

impl FeatureListSink for FeaturePane {
  fn set_items(&mut self, items: &[(String, ItemPayload)]) {
    self.items = items.to_vec();
    if self.selected >= self.items.len() {
      self.selected = 0;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn items(labels: &[&str]) -> Vec<(String, ItemPayload)> {
    labels
      .iter()
      .enumerate()
      .map(|(i, l)| (l.to_string(), ItemPayload::Id(format!("id{}", i))))
      .collect()
  }

  #[test]
  fn test_set_items_clamps_selection() {
    let mut pane = FeaturePane::new("Folders");
    pane.set_items(&items(&["a", "b", "c"]));
    pane.move_selection(2);
    assert_eq!(pane.selected_item().unwrap().0, "c");

    pane.set_items(&items(&["a"]));
    assert_eq!(pane.selected_item().unwrap().0, "a");
  }

  #[test]
  fn test_selection_wraps() {
    let mut pane = FeaturePane::new("Markers");
    pane.set_items(&items(&["a", "b"]));
    pane.move_selection(-1);
    assert_eq!(pane.selected_item().unwrap().0, "b");
    pane.move_selection(1);
    assert_eq!(pane.selected_item().unwrap().0, "a");
  }

  #[test]
  fn test_empty_pane_has_no_selection() {
    let mut pane = FeaturePane::new("Markers");
    pane.move_selection(1);
    assert!(pane.selected_item().is_none());
  }
}

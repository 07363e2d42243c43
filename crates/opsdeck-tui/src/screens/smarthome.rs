//! Smart-home screen — room→device tree with live SSE patching.
//!
//! Devices are grouped by room with an unassigned section at the end.
//! Outside edit mode a tap controls the device (no optimistic update —
//! the stream or the fallback poll is the source of truth). Edit mode
//! adds multi-select and the Bulk Action Bar: set category, move to room,
//! toggle visibility, delete.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};
use tokio::sync::mpsc::UnboundedSender;

use opsdeck_api::StreamEvent;
use opsdeck_core::model::{
    BulkImportRequest, DeviceBulkUpdate, DeviceCategory, DeviceUpdates, SmartDevice,
};
use opsdeck_core::{Notice, NoticeLevel, SmartHomeController};

use crate::action::{Action, ConfirmAction};
use crate::component::Component;
use crate::theme;
use crate::widgets::fmt;

/// Sentinel "room id" for the unassigned section in the collapsed set.
const UNASSIGNED: i64 = -1;

// ── Bulk menu ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BulkKind {
    Category,
    Room,
    Visibility,
}

struct BulkMenu {
    kind: BulkKind,
    index: usize,
}

// ── Discovery modal ──────────────────────────────────────────────────

struct DiscoveryEntry {
    domain: String,
    entity_id: String,
    friendly_name: Option<String>,
    is_registered: bool,
}

struct DiscoveryModal {
    entries: Vec<DiscoveryEntry>,
    selected: BTreeSet<usize>,
    cursor: usize,
    loading: bool,
    busy: bool,
}

// ── Screen ───────────────────────────────────────────────────────────

pub struct SmartHomeScreen {
    focused: bool,
    action_tx: Option<UnboundedSender<Action>>,
    ctrl: SmartHomeController,
    cursor: usize,
    notice: Option<(Notice, Instant)>,
    bulk_menu: Option<BulkMenu>,
    discovery: Option<DiscoveryModal>,
}

impl SmartHomeScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            action_tx: None,
            ctrl: SmartHomeController::new(),
            cursor: 0,
            notice: None,
            bulk_menu: None,
            discovery: None,
        }
    }

    fn dispatch(&self, action: Action) {
        if let Some(tx) = &self.action_tx {
            let _ = tx.send(action);
        }
    }

    fn reload(&mut self) {
        let token = self.ctrl.begin_reload();
        self.dispatch(Action::FetchSmartHome { token });
    }

    fn set_notice(&mut self, notice: Notice) {
        self.notice = Some((notice, Instant::now()));
    }

    fn expire_notice(&mut self) {
        if let Some((notice, shown_at)) = &self.notice {
            if shown_at.elapsed() >= notice.ttl {
                self.notice = None;
            }
        }
    }

    /// Devices visible under the current collapse state, in render order,
    /// each paired with its section id (room id or the unassigned
    /// sentinel).
    fn visible_devices(&self) -> Vec<(i64, &SmartDevice)> {
        let Some(dashboard) = &self.ctrl.dashboard else {
            return Vec::new();
        };

        let mut rows = Vec::new();
        for room in &dashboard.rooms {
            if self.ctrl.collapsed.contains(&room.id) {
                continue;
            }
            for device in &room.devices {
                rows.push((room.id, device));
            }
        }
        if !self.ctrl.collapsed.contains(&UNASSIGNED) {
            for device in &dashboard.unassigned {
                rows.push((UNASSIGNED, device));
            }
        }
        rows
    }

    fn device_under_cursor(&self) -> Option<(i64, i64)> {
        let rows = self.visible_devices();
        rows.get(self.cursor.min(rows.len().saturating_sub(1)))
            .map(|(section, device)| (*section, device.id))
    }

    // ── Bulk submissions ─────────────────────────────────────────────

    fn bulk_menu_options(&self, kind: BulkKind) -> Vec<String> {
        match kind {
            BulkKind::Category => DeviceCategory::ALL
                .iter()
                .map(|c| c.as_str().to_owned())
                .collect(),
            BulkKind::Room => {
                let mut options: Vec<String> =
                    self.ctrl.rooms.iter().map(|r| r.name.clone()).collect();
                options.push("Unassigned".into());
                options
            }
            BulkKind::Visibility => vec!["shown".into(), "hidden".into()],
        }
    }

    fn bulk_submission(&self, menu: &BulkMenu) -> Option<DeviceBulkUpdate> {
        let ids = self.ctrl.selected_ids();
        if ids.is_empty() {
            return None;
        }

        let updates = match menu.kind {
            BulkKind::Category => DeviceUpdates {
                category: DeviceCategory::ALL.get(menu.index).copied(),
                ..DeviceUpdates::default()
            },
            BulkKind::Room => {
                let room_id = if menu.index >= self.ctrl.rooms.len() {
                    // Explicit "Unassigned" — serialized as null.
                    None
                } else {
                    Some(self.ctrl.rooms[menu.index].id)
                };
                DeviceUpdates {
                    room_id: Some(room_id),
                    ..DeviceUpdates::default()
                }
            }
            BulkKind::Visibility => DeviceUpdates {
                is_visible: Some(menu.index == 0),
                ..DeviceUpdates::default()
            },
        };

        Some(DeviceBulkUpdate { ids, updates })
    }

    // ── Key handling ─────────────────────────────────────────────────

    fn handle_bulk_menu_key(&mut self, key: KeyEvent) -> Option<Action> {
        let menu = self.bulk_menu.as_mut()?;
        let option_count = match menu.kind {
            BulkKind::Category => DeviceCategory::ALL.len(),
            BulkKind::Room => self.ctrl.rooms.len() + 1,
            BulkKind::Visibility => 2,
        };

        match key.code {
            KeyCode::Esc => {
                self.bulk_menu = None;
            }
            KeyCode::Char('j') | KeyCode::Down => {
                menu.index = (menu.index + 1) % option_count;
            }
            KeyCode::Char('k') | KeyCode::Up => {
                menu.index = (menu.index + option_count - 1) % option_count;
            }
            KeyCode::Enter => {
                let menu = self.bulk_menu.take()?;
                let update = self.bulk_submission(&menu)?;
                return Some(Action::BulkUpdateDevices(update));
            }
            _ => {}
        }
        None
    }

    fn handle_discovery_key(&mut self, key: KeyEvent) -> Option<Action> {
        let modal = self.discovery.as_mut()?;
        if modal.busy {
            return None;
        }

        match key.code {
            KeyCode::Esc => {
                self.discovery = None;
            }
            KeyCode::Char('j') | KeyCode::Down => {
                if !modal.entries.is_empty() {
                    modal.cursor = (modal.cursor + 1).min(modal.entries.len() - 1);
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                modal.cursor = modal.cursor.saturating_sub(1);
            }
            KeyCode::Char(' ') => {
                if let Some(entry) = modal.entries.get(modal.cursor) {
                    // Already-registered entities are server-skipped
                    // anyway; don't offer them.
                    if !entry.is_registered && !modal.selected.remove(&modal.cursor) {
                        modal.selected.insert(modal.cursor);
                    }
                }
            }
            KeyCode::Enter => {
                if modal.selected.is_empty() {
                    return None;
                }
                let entity_ids: Vec<String> = modal
                    .selected
                    .iter()
                    .filter_map(|&idx| modal.entries.get(idx))
                    .map(|e| e.entity_id.clone())
                    .collect();
                modal.busy = true;
                return Some(Action::BulkImport(BulkImportRequest {
                    entity_ids,
                    room_id: None,
                    category: None,
                }));
            }
            _ => {}
        }
        None
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn render_notice(&self, frame: &mut Frame, area: Rect) {
        let Some((notice, _)) = &self.notice else {
            return;
        };

        let color = match notice.level {
            NoticeLevel::Success => theme::success(),
            NoticeLevel::Info => theme::info(),
            NoticeLevel::Warning => theme::warning(),
            NoticeLevel::Error => theme::danger(),
        };

        frame.render_widget(
            Paragraph::new(Span::styled(
                format!(" {} ", notice.message),
                Style::default().fg(theme::bg()).bg(color),
            )),
            area,
        );
    }

    fn render_bulk_bar(&self, frame: &mut Frame, area: Rect) {
        if !self.ctrl.bulk_bar_visible() {
            if self.ctrl.edit_mode {
                frame.render_widget(
                    Paragraph::new(" EDIT — Space select devices, e to exit")
                        .style(Style::default().fg(theme::warning())),
                    area,
                );
            }
            return;
        }

        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(
                    format!(" {} selected ", self.ctrl.selection.len()),
                    Style::default()
                        .fg(theme::bg())
                        .bg(theme::accent())
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    "  g category · m room · v visibility · x delete",
                    theme::key_hint(),
                ),
            ])),
            area,
        );
    }

    fn device_line<'a>(&self, device: &'a SmartDevice, selected_row: bool) -> Line<'a> {
        let mut spans = vec![Span::raw("  ")];

        if self.ctrl.edit_mode {
            let mark = if self.ctrl.selection.contains(&device.id) {
                "[x] "
            } else {
                "[ ] "
            };
            spans.push(Span::styled(mark, Style::default().fg(theme::accent())));
        }

        let name_style = if selected_row {
            theme::selected_row()
        } else if device.is_visible {
            theme::table_row()
        } else {
            Style::default().fg(theme::dim())
        };

        let star = if device.is_favorited { "★ " } else { "" };
        spans.push(Span::styled(
            format!("{star}{:<24}", fmt::truncate(&device.friendly_name, 24)),
            name_style,
        ));

        // Effective state plus the unit, when the attribute map has one.
        let unit = device
            .last_attributes
            .as_ref()
            .and_then(|a| a.get("unit_of_measurement"))
            .and_then(|u| u.as_str())
            .unwrap_or("");
        let state = device.last_state.as_deref().unwrap_or("--");
        spans.push(Span::styled(
            format!("{:<14}", format!("{state} {unit}").trim_end().to_owned()),
            Style::default().fg(theme::info()),
        ));

        spans.push(Span::styled(
            format!("{:<14}", device.domain.as_str()),
            Style::default().fg(theme::dim()),
        ));
        spans.push(Span::styled(
            device.category.as_str(),
            Style::default().fg(theme::dim()),
        ));

        if !device.is_visible {
            spans.push(Span::styled(
                "  hidden",
                Style::default().fg(theme::warning()),
            ));
        }

        Line::from(spans)
    }

    fn render_tree(&self, frame: &mut Frame, area: Rect) {
        let Some(dashboard) = &self.ctrl.dashboard else {
            frame.render_widget(Paragraph::new("  Loading…").style(theme::key_hint()), area);
            return;
        };

        if self.ctrl.show_empty_state() {
            frame.render_widget(
                Paragraph::new(vec![
                    Line::from(""),
                    Line::from(Span::styled(
                        "  No devices registered yet.",
                        Style::default().fg(theme::text()),
                    )),
                    Line::from(""),
                    Line::from(Span::styled(
                        "  Press d to discover entities from your home-automation hub.",
                        theme::key_hint(),
                    )),
                ]),
                area,
            );
            return;
        }

        let rows = self.visible_devices();
        let cursor = self.cursor.min(rows.len().saturating_sub(1));

        let mut lines = Vec::new();
        let mut flat_idx = 0usize;

        for room in &dashboard.rooms {
            let collapsed = self.ctrl.collapsed.contains(&room.id);
            let marker = if collapsed { "▸" } else { "▾" };
            lines.push(Line::from(Span::styled(
                format!(" {marker} {} ({})", room.name, room.devices.len()),
                Style::default()
                    .fg(theme::accent())
                    .add_modifier(Modifier::BOLD),
            )));

            if collapsed {
                continue;
            }
            for device in &room.devices {
                lines.push(self.device_line(device, flat_idx == cursor));
                flat_idx += 1;
            }
        }

        if !dashboard.unassigned.is_empty() {
            let collapsed = self.ctrl.collapsed.contains(&UNASSIGNED);
            let marker = if collapsed { "▸" } else { "▾" };
            lines.push(Line::from(Span::styled(
                format!(" {marker} Unassigned ({})", dashboard.unassigned.len()),
                Style::default().fg(theme::dim()).add_modifier(Modifier::BOLD),
            )));

            if !collapsed {
                for device in &dashboard.unassigned {
                    lines.push(self.device_line(device, flat_idx == cursor));
                    flat_idx += 1;
                }
            }
        }

        frame.render_widget(Paragraph::new(lines), area);
    }

    fn render_bulk_menu(&self, frame: &mut Frame, area: Rect) {
        let Some(menu) = &self.bulk_menu else { return };

        let title = match menu.kind {
            BulkKind::Category => " Set Category ",
            BulkKind::Room => " Move To Room ",
            BulkKind::Visibility => " Visibility ",
        };
        let options = self.bulk_menu_options(menu.kind);

        let width = 30u16.min(area.width.saturating_sub(4));
        let height = (options.len() as u16 + 3).min(area.height.saturating_sub(2));
        let x = area.x + (area.width.saturating_sub(width)) / 2;
        let y = area.y + (area.height.saturating_sub(height)) / 2;
        let popup = Rect::new(x, y, width, height);

        frame.render_widget(Clear, popup);
        let block = Block::default()
            .title(title)
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let mut lines = Vec::new();
        for (idx, option) in options.iter().enumerate() {
            let style = if idx == menu.index {
                theme::selected_row()
            } else {
                theme::table_row()
            };
            lines.push(Line::from(Span::styled(format!("  {option}"), style)));
        }

        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_discovery(&self, frame: &mut Frame, area: Rect) {
        let Some(modal) = &self.discovery else { return };

        let width = 64u16.min(area.width.saturating_sub(4));
        let height = 18u16.min(area.height.saturating_sub(2));
        let x = area.x + (area.width.saturating_sub(width)) / 2;
        let y = area.y + (area.height.saturating_sub(height)) / 2;
        let popup = Rect::new(x, y, width, height);

        frame.render_widget(Clear, popup);
        let block = Block::default()
            .title(" Discover Entities ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        if modal.loading {
            frame.render_widget(
                Paragraph::new("  Querying the integration…").style(theme::key_hint()),
                inner,
            );
            return;
        }

        let mut lines = Vec::new();
        let max_rows = inner.height.saturating_sub(2) as usize;

        // Window around the cursor so long entity lists stay navigable.
        let start = modal.cursor.saturating_sub(max_rows.saturating_sub(1));
        for (idx, entry) in modal.entries.iter().enumerate().skip(start).take(max_rows) {
            let style = if idx == modal.cursor {
                theme::selected_row()
            } else if entry.is_registered {
                Style::default().fg(theme::dim())
            } else {
                theme::table_row()
            };

            let mark = if entry.is_registered {
                "  ✓ "
            } else if modal.selected.contains(&idx) {
                " [x]"
            } else {
                " [ ]"
            };

            let name = entry
                .friendly_name
                .as_deref()
                .unwrap_or(entry.entity_id.as_str());

            lines.push(Line::from(vec![
                Span::styled(mark.to_owned(), Style::default().fg(theme::accent())),
                Span::styled(format!(" {:<26}", fmt::truncate(name, 26)), style),
                Span::styled(
                    format!("{:<12}", entry.domain),
                    Style::default().fg(theme::dim()),
                ),
            ]));
        }

        let hint = if modal.busy {
            "  importing…"
        } else {
            "  Space select · Enter import · ✓ already registered · Esc close"
        };
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(hint, theme::key_hint())));

        frame.render_widget(Paragraph::new(lines), inner);
    }
}

impl Component for SmartHomeScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        // The fetch task loads dashboard and rooms in parallel.
        self.reload();
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.discovery.is_some() {
            return Ok(self.handle_discovery_key(key));
        }
        if self.bulk_menu.is_some() {
            return Ok(self.handle_bulk_menu_key(key));
        }

        let row_count = self.visible_devices().len();

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if row_count > 0 {
                    self.cursor = (self.cursor + 1).min(row_count - 1);
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::Char('e') => {
                self.ctrl.toggle_edit_mode();
            }
            KeyCode::Char(' ') => {
                if let Some((_, device_id)) = self.device_under_cursor() {
                    self.ctrl.toggle_selected(device_id);
                }
            }
            KeyCode::Enter => {
                if self.ctrl.edit_mode {
                    if let Some((_, device_id)) = self.device_under_cursor() {
                        self.ctrl.toggle_selected(device_id);
                    }
                } else if let Some((_, device_id)) = self.device_under_cursor() {
                    let action = self
                        .ctrl
                        .devices()
                        .find(|d| d.id == device_id)
                        .and_then(SmartHomeController::control_action_for);
                    if let Some(action) = action {
                        return Ok(Some(Action::ControlDevice {
                            id: device_id,
                            action,
                        }));
                    }
                }
            }
            KeyCode::Char('f') => {
                if let Some((_, device_id)) = self.device_under_cursor() {
                    return Ok(Some(Action::FavoriteDevice(device_id)));
                }
            }
            KeyCode::Char('c') => {
                if let Some((section, _)) = self.device_under_cursor() {
                    self.ctrl.toggle_room_collapsed(section);
                }
            }
            KeyCode::Char('r') => self.reload(),
            KeyCode::Char('d') => {
                self.discovery = Some(DiscoveryModal {
                    entries: Vec::new(),
                    selected: BTreeSet::new(),
                    cursor: 0,
                    loading: true,
                    busy: false,
                });
                return Ok(Some(Action::FetchDiscovery));
            }
            KeyCode::Char('g') if self.ctrl.bulk_bar_visible() => {
                self.bulk_menu = Some(BulkMenu {
                    kind: BulkKind::Category,
                    index: 0,
                });
            }
            KeyCode::Char('m') if self.ctrl.bulk_bar_visible() => {
                self.bulk_menu = Some(BulkMenu {
                    kind: BulkKind::Room,
                    index: 0,
                });
            }
            KeyCode::Char('v') if self.ctrl.bulk_bar_visible() => {
                self.bulk_menu = Some(BulkMenu {
                    kind: BulkKind::Visibility,
                    index: 0,
                });
            }
            KeyCode::Char('x') if self.ctrl.bulk_bar_visible() => {
                return Ok(Some(Action::ShowConfirm(ConfirmAction::BulkDeleteDevices {
                    ids: self.ctrl.selected_ids(),
                    prompt: self.ctrl.delete_prompt(),
                })));
            }
            _ => {}
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::Tick => self.expire_notice(),

            // 60s fallback poll — safety net for missed stream events.
            Action::PollSmartHome => {
                let token = self.ctrl.begin_reload();
                return Ok(Some(Action::FetchSmartHome { token }));
            }

            Action::SmartHomeLoaded { token, dashboard } => {
                self.ctrl.apply_dashboard(*token, dashboard.clone());
            }

            Action::RoomsLoaded(rooms) => {
                self.ctrl.apply_rooms(rooms.clone());
            }

            Action::StreamEvent(event) => {
                if let StreamEvent::StateChanged {
                    entity_id,
                    state,
                    attributes,
                } = event.as_ref()
                {
                    self.ctrl.apply_state_changed(entity_id, state, attributes);
                }
            }

            Action::BulkCompleted(result) => {
                let notice = self.ctrl.bulk_completed(result);
                self.set_notice(notice);
                self.bulk_menu = None;
                // Reload after any bulk completion, partial failures
                // included.
                let token = self.ctrl.begin_reload();
                return Ok(Some(Action::FetchSmartHome { token }));
            }

            Action::ImportCompleted(result) => {
                self.discovery = None;
                self.set_notice(Notice::success(
                    format!(
                        "{} entities registered, {} skipped",
                        result.registered_count, result.skipped_count
                    ),
                    Duration::from_secs(6),
                ));
                let token = self.ctrl.begin_reload();
                return Ok(Some(Action::FetchSmartHome { token }));
            }

            Action::DiscoveryLoaded(by_domain) => {
                if let Some(modal) = self.discovery.as_mut() {
                    modal.loading = false;
                    modal.entries = by_domain
                        .iter()
                        .flat_map(|(domain, entities)| {
                            entities.iter().map(move |e| DiscoveryEntry {
                                domain: domain.clone(),
                                entity_id: e.entity_id.clone(),
                                friendly_name: e.friendly_name.clone(),
                                is_registered: e.is_registered,
                            })
                        })
                        .collect();
                }
            }

            Action::ActionFailed(err) if self.focused => {
                if let Some(modal) = self.discovery.as_mut() {
                    modal.busy = false;
                }
                self.set_notice(Notice::error(
                    err.to_string(),
                    Duration::from_secs(6),
                ));
            }

            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let title = if self.ctrl.edit_mode {
            " Smart Home · EDIT "
        } else {
            " Smart Home "
        };

        let block = Block::default()
            .title(Line::from(vec![
                Span::styled(title, theme::title_style()),
                Span::styled(
                    format!(" {} devices ", self.ctrl.total_devices()),
                    Style::default().fg(theme::dim()),
                ),
            ]))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if self.focused {
                theme::border_focused()
            } else {
                theme::border_default()
            });

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::vertical([
            Constraint::Length(1), // notice
            Constraint::Length(1), // bulk bar / edit banner
            Constraint::Min(4),    // tree
            Constraint::Length(1), // hints
        ])
        .split(inner);

        self.render_notice(frame, rows[0]);
        self.render_bulk_bar(frame, rows[1]);
        self.render_tree(frame, rows[2]);

        let hints = if self.ctrl.edit_mode {
            " Space select · g/m/v/x bulk · e exit edit"
        } else {
            " Enter control · f favorite · e edit · c collapse · d discover · r reload"
        };
        frame.render_widget(Paragraph::new(hints).style(theme::key_hint()), rows[3]);

        self.render_bulk_menu(frame, area);
        self.render_discovery(frame, area);
    }

    fn wants_input(&self) -> bool {
        self.bulk_menu.is_some() || self.discovery.is_some()
    }

    fn focused(&self) -> bool {
        self.focused
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &str {
        "SmartHome"
    }
}

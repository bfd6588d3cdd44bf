use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use chrono::Local;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use tmi_terminal::config::AppConfig;
use tmi_terminal::provider::spawn_provider;
use tmi_terminal::state::{
    self, AppState, ProviderCommand, Screen, apply_delta, game_type_label, screen_label,
};
use tmi_terminal::time_format::{format_rate, format_record};
use tmi_terminal::track_ranking::{SortField, SortSeq, sort_field_label, sort_seq_label};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
}

impl App {
    fn new(state: AppState, cmd_tx: Option<mpsc::Sender<ProviderCommand>>) -> Self {
        Self {
            state,
            should_quit: false,
            cmd_tx,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.alert.is_some() {
            match key.code {
                KeyCode::Enter | KeyCode::Esc => self.state.dismiss_alert(),
                KeyCode::Char('q') => self.should_quit = true,
                _ => {}
            }
            return;
        }

        if self.state.filter_input_active {
            match key.code {
                KeyCode::Enter | KeyCode::Esc => self.state.filter_input_active = false,
                KeyCode::Backspace => self.state.pop_filter_char(),
                KeyCode::Char(ch) => self.state.push_filter_char(ch),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab | KeyCode::BackTab => {
                self.state.switch_screen();
                self.request_current(false);
            }
            KeyCode::Char('j') | KeyCode::Down => match self.state.screen {
                Screen::Home => self.state.karts.select_next(),
                Screen::Track => self.state.tracks.select_next(),
            },
            KeyCode::Char('k') | KeyCode::Up => match self.state.screen {
                Screen::Home => self.state.karts.select_prev(),
                Screen::Track => self.state.tracks.select_prev(),
            },
            KeyCode::Char(ch @ '1'..='9') if self.state.screen == Screen::Home => {
                let index = (ch as u8 - b'1') as usize;
                if let Err(err) = self.state.on_select(index) {
                    self.state.push_log(format!("[WARN] {err}"));
                }
            }
            KeyCode::Char('/') if self.state.screen == Screen::Track => {
                self.state.filter_input_active = true;
            }
            KeyCode::Char('s') if self.state.screen == Screen::Track => {
                self.state.cycle_sort_field();
            }
            KeyCode::Char('r') if self.state.screen == Screen::Track => {
                self.state.flip_sort_seq();
            }
            KeyCode::Char('m') | KeyCode::Char('M') => {
                let next = self.state.game_type.toggled();
                if self.state.set_game_type(next) {
                    self.request_current(true);
                }
            }
            KeyCode::Char('R') | KeyCode::F(5) => self.request_current(true),
            KeyCode::Char('g') if self.state.screen == Screen::Track => {
                self.state.guide_overlay = !self.state.guide_overlay;
            }
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            _ => {}
        }
    }

    fn request_current(&mut self, announce: bool) {
        match self.state.screen {
            Screen::Home => self.request_karts(announce),
            Screen::Track => self.request_tracks(announce),
        }
    }

    fn request_tracks(&mut self, announce: bool) {
        let game_type = self.state.game_type;
        if self.send(ProviderCommand::FetchTracks { game_type }, announce, "Tracks") {
            self.state.tracks_loading = !self.state.tracks.has_data();
        }
    }

    fn request_karts(&mut self, announce: bool) {
        let Some(nickname) = self.state.nickname.clone() else {
            if announce {
                self.state
                    .push_log("[INFO] No nickname configured (TMI_NICKNAME)");
            }
            return;
        };
        let game_type = self.state.game_type;
        if self.send(
            ProviderCommand::FetchUserKarts {
                nickname,
                game_type,
            },
            announce,
            "Kart records",
        ) {
            self.state.karts_loading = self.state.karts.is_empty();
        }
    }

    fn send(&mut self, cmd: ProviderCommand, announce: bool, what: &str) -> bool {
        let Some(tx) = &self.cmd_tx else {
            if announce {
                self.state.push_log(format!("[INFO] {what} fetch unavailable"));
            }
            return false;
        };
        if tx.send(cmd).is_err() {
            self.state.push_log(format!("[WARN] {what} request failed"));
            return false;
        }
        if announce {
            self.state.push_log(format!("[INFO] {what} request sent"));
        }
        true
    }

    fn probe_assets(&mut self) {
        for (kind, id, url) in self.state.take_unprobed_assets() {
            self.send(ProviderCommand::ProbeAsset { kind, id, url }, false, "Asset");
        }
    }
}

fn main() -> io::Result<()> {
    let config = AppConfig::load();
    let state = AppState::new(config.game_type, config.nickname.clone());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    spawn_provider(tx, cmd_rx, config);

    let mut app = App::new(state, Some(cmd_tx));
    app.request_current(true);
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<state::Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        app.probe_assets();

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(4),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.screen {
        Screen::Home => render_kart_record(frame, chunks[1], &app.state),
        Screen::Track => render_track_ranking(frame, chunks[1], &app.state),
    }

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::TOP));
    frame.render_widget(console, chunks[2]);

    let footer =
        Paragraph::new(footer_text(&app.state)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if app.state.guide_overlay && app.state.screen == Screen::Track {
        render_guide_overlay(frame, frame.size());
    }
    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
    if let Some(alert) = &app.state.alert {
        render_alert(frame, frame.size(), alert);
    }
}

fn header_text(state: &AppState) -> String {
    let player = state.nickname.as_deref().unwrap_or("-");
    let line1 = format!(
        " TMI | {} | {} | Rider: {}",
        screen_label(state.screen),
        game_type_label(state.game_type),
        player
    );
    let line2 = match state.screen {
        Screen::Home => " Kart record".to_string(),
        Screen::Track => format!(
            " {} track ranking | Ranking period: as of {}",
            game_type_label(state.game_type),
            Local::now().format("%Y-%m-%d")
        ),
    };
    format!("{line1}\n{line2}")
}

fn footer_text(state: &AppState) -> String {
    if state.filter_input_active {
        return "Type to filter | Backspace Delete | Enter/Esc Done".to_string();
    }
    match state.screen {
        Screen::Home => {
            "Tab Tracks | j/k/↑/↓ Move | 1-9 Select | m Mode | R Refresh | ? Help | q Quit"
                .to_string()
        }
        Screen::Track => {
            "Tab Karts | j/k Move | / Search | s Sort | r Reverse | m Mode | g Guide | R Refresh | ? Help | q Quit"
                .to_string()
        }
    }
}

fn render_kart_record(frame: &mut Frame, area: Rect, state: &AppState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(1)])
        .split(area);

    let Some(kart) = state.karts.selected() else {
        let msg = if state.karts_loading {
            "Loading kart records..."
        } else if state.nickname.is_none() {
            "No rider configured. Set TMI_NICKNAME to load kart records."
        } else if state.cleared_by_failure {
            "Records cleared after a failed fetch. Press R to reload."
        } else {
            "No kart records"
        };
        let empty = Paragraph::new(msg)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().title("Kart Record").borders(Borders::ALL));
        frame.render_widget(empty, area);
        return;
    };

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(sections[0]);

    let thumb = vec![
        Line::from(vec![
            Span::styled("[General] ", Style::default().fg(Color::Cyan)),
            Span::styled(kart.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            state.kart_image_url(&kart.id),
            Style::default().fg(Color::DarkGray),
        )),
    ];
    let thumbnail = Paragraph::new(thumb)
        .wrap(Wrap { trim: true })
        .block(Block::default().title("Kart").borders(Borders::ALL));
    frame.render_widget(thumbnail, top[0]);

    let records: Vec<Line> = state
        .karts
        .nested_records()
        .map(|(name, time)| Line::from(format!("{name:<24} {time:>10}")))
        .collect();
    let records = if records.is_empty() {
        Paragraph::new("No track records").style(Style::default().fg(Color::DarkGray))
    } else {
        Paragraph::new(records)
    };
    frame.render_widget(
        records.block(Block::default().title("Records").borders(Borders::ALL)),
        top[1],
    );

    render_kart_table(frame, sections[1], state);
}

fn kart_columns() -> [Constraint; 5] {
    [
        Constraint::Length(8),
        Constraint::Min(20),
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Length(9),
    ]
}

fn render_kart_table(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("Karts").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height < 2 {
        return;
    }

    let widths = kart_columns();
    let header_area = Rect { height: 1, ..inner };
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths)
        .split(header_area);
    let bold = Style::default().add_modifier(Modifier::BOLD);
    render_cell_text(frame, cols[0], "Select", bold);
    render_cell_text(frame, cols[1], "Kart", bold);
    render_cell_text(frame, cols[2], "Races", bold);
    render_cell_text(frame, cols[3], "Win", bold);
    render_cell_text(frame, cols[4], "Retire", bold);

    let rows = state.karts.rows();
    let list_height = (inner.height - 1) as usize;
    let selected = state.karts.selected_index().unwrap_or(0);
    let (start, end) = visible_range(selected, rows.len(), list_height);

    for (i, row) in rows[start..end].iter().enumerate() {
        let row_area = Rect {
            x: inner.x,
            y: inner.y + 1 + i as u16,
            width: inner.width,
            height: 1,
        };
        let style = if row.selected {
            Style::default().fg(Color::White).bg(Color::Blue)
        } else {
            Style::default()
        };
        if row.selected {
            frame.render_widget(Block::default().style(style), row_area);
        }
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(widths)
            .split(row_area);
        let radio = if row.selected { "(•)" } else { "( )" };
        render_cell_text(frame, cols[0], radio, style);
        render_cell_text(frame, cols[1], &row.kart.name, style);
        render_cell_text(frame, cols[2], &row.kart.count.to_string(), style);
        render_cell_text(frame, cols[3], &format_rate(row.win_rate), style);
        render_cell_text(frame, cols[4], &format_rate(row.retire_rate), style);
    }
}

fn track_columns() -> [Constraint; 7] {
    [
        Constraint::Length(5),
        Constraint::Min(22),
        Constraint::Length(9),
        Constraint::Length(8),
        Constraint::Length(16),
        Constraint::Length(12),
        Constraint::Length(12),
    ]
}

fn render_track_ranking(frame: &mut Frame, area: Rect, state: &AppState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    let search_style = if state.filter_input_active {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let cursor = if state.filter_input_active { "_" } else { "" };
    let search = Paragraph::new(vec![
        Line::from(Span::styled(
            format!("Search track / best rider: {}{cursor}", state.tracks.filter()),
            search_style,
        )),
        Line::from(Span::styled(
            format!(
                "Stats for {} public rooms. [g] Indicator guide",
                game_type_label(state.game_type)
            ),
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(search, sections[0]);

    let list_area = sections[1];
    if state.tracks_loading {
        let loading =
            Paragraph::new("Loading tracks...").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(loading, list_area);
        return;
    }
    if list_area.height < 2 {
        return;
    }

    let widths = track_columns();
    render_track_header(frame, Rect { height: 1, ..list_area }, &widths, state);

    if state.tracks.visible_len() == 0 {
        let msg = if state.tracks.has_data() {
            "No tracks match the search"
        } else {
            "No track data"
        };
        let empty = Paragraph::new(msg).style(Style::default().fg(Color::DarkGray));
        frame.render_widget(
            empty,
            Rect {
                y: list_area.y + 1,
                height: 1,
                ..list_area
            },
        );
        return;
    }

    let visible = (list_area.height - 1) as usize;
    let selected = state.tracks.selected_index();
    let (start, end) = visible_range(selected, state.tracks.visible_len(), visible);

    for (i, (rank, track)) in state
        .tracks
        .visible()
        .enumerate()
        .skip(start)
        .take(end - start)
        .enumerate()
    {
        let row_area = Rect {
            x: list_area.x,
            y: list_area.y + 1 + i as u16,
            width: list_area.width,
            height: 1,
        };
        let is_selected = rank == selected;
        let style = if is_selected {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else {
            Style::default()
        };
        if is_selected {
            frame.render_widget(Block::default().style(style), row_area);
        }
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(widths)
            .split(row_area);
        render_cell_text(frame, cols[0], &format!("{}", rank + 1), style);
        render_cell_text(frame, cols[1], &track.name, style);
        render_cell_text(frame, cols[2], &track.count.to_string(), style);
        render_cell_text(frame, cols[3], &format_rate(state.tracks.pick_rate(track)), style);
        render_cell_text(frame, cols[4], &track.best_rider, style);
        render_cell_text(frame, cols[5], &format_record(track.best_record), style);
        render_cell_text(frame, cols[6], &format_record(track.average_record), style);
    }

    if let Some(track) = state.tracks.selected() {
        let detail = Paragraph::new(format!(
            "{} | {} of {} races | {}",
            track.name,
            track.count,
            state.tracks.total_count(),
            state.track_image_url(&track.id)
        ))
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(detail, sections[2]);
    }
}

fn render_track_header(frame: &mut Frame, area: Rect, widths: &[Constraint], state: &AppState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths)
        .split(area);
    let style = Style::default().add_modifier(Modifier::BOLD);
    let sort = state.tracks.sort();
    let label = |field: SortField| {
        let arrow = if sort.standard == field {
            match sort.seq {
                SortSeq::Asc => " ▲",
                SortSeq::Desc => " ▼",
            }
        } else {
            ""
        };
        format!("{}{arrow}", sort_field_label(field))
    };

    render_cell_text(frame, cols[0], "#", style);
    render_cell_text(frame, cols[1], &label(SortField::Name), style);
    render_cell_text(frame, cols[2], &label(SortField::Count), style);
    render_cell_text(frame, cols[3], "Pick", style);
    render_cell_text(frame, cols[4], &label(SortField::BestRider), style);
    render_cell_text(frame, cols[5], &label(SortField::BestRecord), style);
    render_cell_text(frame, cols[6], &label(SortField::AverageRecord), style);
}

fn render_cell_text(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    let text_area = Rect {
        x: area.x,
        y: area.y + (area.height / 2),
        width: area.width,
        height: 1,
    };
    let paragraph = Paragraph::new(text).style(style);
    frame.render_widget(paragraph, text_area);
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No messages yet".to_string();
    }
    let skip = state.logs.len().saturating_sub(3);
    state
        .logs
        .iter()
        .skip(skip)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_alert(frame: &mut Frame, area: Rect, message: &str) {
    let popup_area = centered_rect(50, 25, area);
    frame.render_widget(Clear, popup_area);
    let text = format!("{message}\n\nEnter / Esc  Back to home");
    let alert = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(Color::Red))
        .block(Block::default().title("Error").borders(Borders::ALL));
    frame.render_widget(alert, popup_area);
}

fn render_guide_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 50, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Indicator guide",
        "",
        "Races       Races played on the track in the ranking period",
        "Pick        Share of all races played on the track",
        "Best Rider  Rider holding the fastest record",
        "Best        Fastest record (min'sec'ms)",
        "Average     Average finishing record",
        "",
        "g  Close",
    ]
    .join("\n");

    let guide = Paragraph::new(text)
        .block(Block::default().title("Guide").borders(Borders::ALL));
    frame.render_widget(guide, popup_area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let sort = format!(
        "  s / r        Sort column / direction ({} {} by default)",
        sort_field_label(SortField::Count),
        sort_seq_label(SortSeq::Desc)
    );
    let text = [
        "TMI Terminal - Help",
        "",
        "Global:",
        "  Tab          Switch kart / track tab",
        "  m            Toggle game mode",
        "  R / F5       Refresh",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "Kart record:",
        "  j/k or ↑/↓   Move selection",
        "  1-9          Select kart row",
        "",
        "Track ranking:",
        "  /            Search track or best rider",
        sort.as_str(),
        "  g            Indicator guide",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}

use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Gauge, Paragraph, Wrap};

use insight_terminal::feed;
use insight_terminal::pattern_decode::{ColorRole, PatternSummary};
use insight_terminal::pattern_view::PatternFilter;
use insight_terminal::performance::{MetricCards, PerformanceHistory};
use insight_terminal::settings::{self, Settings};
use insight_terminal::state::{self, AppState, Load, ProviderCommand, Screen, apply_delta};

const EMPTY_PATTERNS: &str =
    "No patterns detected yet. Patterns will appear after analyzing match data.";
const EMPTY_PERFORMANCE: &str = "No performance data available yet. Performance metrics will appear after predictions are evaluated.";

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: mpsc::Sender<ProviderCommand>,
    default_team: Option<String>,
}

impl App {
    fn new(cmd_tx: mpsc::Sender<ProviderCommand>, settings: &Settings) -> Self {
        let filter = settings
            .team_filter
            .clone()
            .map(PatternFilter::team)
            .unwrap_or_default();
        Self {
            state: AppState::with_filter(filter),
            should_quit: false,
            cmd_tx,
            default_team: settings.team_filter.clone(),
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab => self.state.toggle_screen(),
            KeyCode::Char('1') => self.state.screen = Screen::Patterns,
            KeyCode::Char('2') => self.state.screen = Screen::Performance,
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char('t') => self.focus_selected_team(),
            KeyCode::Char('a') => self.set_filter(PatternFilter::all()),
            KeyCode::Char('r') => self.refresh(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => {
                if self.state.help_overlay {
                    self.state.help_overlay = false;
                } else if let Some(team) = self.default_team.clone() {
                    self.set_filter(PatternFilter::team(team));
                }
            }
            _ => {}
        }
    }

    fn focus_selected_team(&mut self) {
        let Some(team) = self.state.selected_pattern().map(|p| p.team_name.clone()) else {
            return;
        };
        self.set_filter(PatternFilter::team(team));
    }

    fn set_filter(&mut self, filter: PatternFilter) {
        if filter == self.state.filter {
            return;
        }
        self.state.filter = filter.clone();
        self.state.patterns.clear();
        self.state.patterns_load = Load::Pending;
        self.state.selected = 0;
        let _ = self.cmd_tx.send(ProviderCommand::FetchPatterns { filter });
    }

    fn refresh(&mut self) {
        let _ = self.cmd_tx.send(ProviderCommand::FetchPatterns {
            filter: self.state.filter.clone(),
        });
        let _ = self.cmd_tx.send(ProviderCommand::FetchPerformance);
        self.state.push_log("[INFO] Refresh requested".to_string());
    }
}

fn main() -> anyhow::Result<()> {
    let mut settings = Settings::load()?;
    if let Some(path) = settings::parse_db_path_arg() {
        settings.db_path = path;
    }
    let log_path = settings::init_file_logging();
    tracing::info!(db = %settings.db_path.display(), "starting insight terminal");

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let mut app = App::new(cmd_tx, &settings);
    if let Some(path) = log_path {
        app.state
            .push_log(format!("[INFO] Logging to {}", path.display()));
    }
    feed::spawn_provider(settings, tx, cmd_rx);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %err, "terminal loop failed");
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
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(4),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .style(Style::default().add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.screen {
        Screen::Patterns => render_patterns(frame, chunks[1], &app.state),
        Screen::Performance => render_performance(frame, chunks[1], &app.state),
    }

    let console = Paragraph::new(console_text(&app.state, chunks[2].height.saturating_sub(1)))
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::TOP).title("Console"));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(
        "Tab/1/2 Switch | j/k Move | t Team | a All teams | r Refresh | ? Help | q Quit",
    );
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    match state.screen {
        Screen::Patterns => format!("DETECTED PATTERNS | {}", state.filter.heading()),
        Screen::Performance => {
            "MODEL PERFORMANCE | Tracking prediction accuracy over time".to_string()
        }
    }
}

fn console_text(state: &AppState, lines: u16) -> String {
    let take = lines as usize;
    let skip = state.logs.len().saturating_sub(take);
    state
        .logs
        .iter()
        .skip(skip)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn role_color(role: ColorRole) -> Color {
    match role {
        ColorRole::Neutral => Color::Gray,
        ColorRole::Info => Color::Blue,
        ColorRole::Caution => Color::Yellow,
        ColorRole::Positive => Color::Green,
    }
}

fn render_patterns(frame: &mut Frame, area: Rect, state: &AppState) {
    match &state.patterns_load {
        Load::Pending => {
            let loading = Paragraph::new("Loading patterns...")
                .style(Style::default().fg(Color::DarkGray));
            frame.render_widget(loading, area);
            return;
        }
        Load::Failed(message) => {
            let failed = Paragraph::new(format!("Failed to load patterns: {message}"))
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: true });
            frame.render_widget(failed, area);
            return;
        }
        Load::Ready => {}
    }

    if state.patterns.is_empty() {
        let empty = Paragraph::new(EMPTY_PATTERNS).style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    }

    const ROW_HEIGHT: u16 = 4;
    let visible = (area.height / ROW_HEIGHT).max(1) as usize;
    let (start, end) = visible_range(state.selected, state.patterns.len(), visible);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(ROW_HEIGHT); end - start])
        .split(area);

    for (slot, idx) in (start..end).enumerate() {
        let pattern = &state.patterns[idx];
        render_pattern_row(frame, rows[slot], pattern, idx == state.selected);
    }
}

fn render_pattern_row(frame: &mut Frame, area: Rect, pattern: &PatternSummary, selected: bool) {
    let badge_style = Style::default()
        .fg(Color::Black)
        .bg(role_color(pattern.bucket.color()));
    let mut lines = vec![
        Line::from(vec![
            Span::raw(format!("{} ", pattern.icon.glyph())),
            Span::styled(
                pattern.team_name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled(format!(" {} ", pattern.confidence_label()), badge_style),
        ]),
        Line::from(Span::styled(
            format!("  {}", pattern.title),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(format!("  {}", pattern.description)),
    ];
    if let Some(last_seen) = pattern.last_seen.as_deref() {
        lines.push(Line::from(Span::styled(
            format!("  Last seen: {last_seen}"),
            Style::default().fg(Color::DarkGray),
        )));
    }

    let mut style = Style::default();
    if selected {
        style = style.bg(Color::Rgb(30, 30, 30));
    }
    frame.render_widget(Paragraph::new(lines).style(style), area);
}

fn render_performance(frame: &mut Frame, area: Rect, state: &AppState) {
    match &state.performance_load {
        Load::Pending => {
            let loading = Paragraph::new("Loading performance metrics...")
                .style(Style::default().fg(Color::DarkGray));
            frame.render_widget(loading, area);
            return;
        }
        Load::Failed(message) => {
            let failed = Paragraph::new(format!("Failed to load performance: {message}"))
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: true });
            frame.render_widget(failed, area);
            return;
        }
        Load::Ready => {}
    }

    let Some(latest) = state.history.latest.as_ref() else {
        let empty = Paragraph::new(EMPTY_PERFORMANCE)
            .style(Style::default().fg(Color::DarkGray))
            .wrap(Wrap { trim: true });
        frame.render_widget(empty, area);
        return;
    };

    let cards = MetricCards::from_snapshot(latest);
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    render_metric_cards(frame, sections[0], &cards);
    if state.history.chartable() {
        frame.render_widget(trend_chart(&state.history), sections[1]);
    }
    let footer = Paragraph::new(cards.footer()).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, sections[2]);
}

fn render_metric_cards(frame: &mut Frame, area: Rect, cards: &MetricCards) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Ratio(1, cards.cards.len().max(1) as u32); cards.cards.len()])
        .split(area);

    for (card, column) in cards.cards.iter().zip(columns.iter()) {
        let block = Block::default().borders(Borders::ALL).title(card.label);
        match card.ratio {
            Some(ratio) => {
                let gauge = Gauge::default()
                    .block(block)
                    .gauge_style(Style::default().fg(Color::Cyan))
                    .ratio(ratio)
                    .label(card.value.clone());
                frame.render_widget(gauge, *column);
            }
            None => {
                let value = Paragraph::new(card.value.clone())
                    .style(Style::default().add_modifier(Modifier::BOLD))
                    .block(block);
                frame.render_widget(value, *column);
            }
        }
    }
}

fn trend_chart(history: &PerformanceHistory) -> BarChart<'static> {
    let mut chart = BarChart::default()
        .block(Block::default().borders(Borders::ALL).title(Line::from(vec![
            Span::styled("Accuracy %", Style::default().fg(Color::Cyan)),
            Span::raw(" / "),
            Span::styled("Precision %", Style::default().fg(Color::Magenta)),
        ])))
        .bar_width(5)
        .bar_gap(1)
        .group_gap(3)
        .max(100);

    for point in &history.trend {
        let accuracy = Bar::default()
            .value(point.accuracy.round().max(0.0) as u64)
            .style(Style::default().fg(Color::Cyan));
        let precision = Bar::default()
            .value(point.precision.round().max(0.0) as u64)
            .style(Style::default().fg(Color::Magenta));
        chart = chart.data(
            BarGroup::default()
                .label(Line::from(point.period.clone()))
                .bars(&[accuracy, precision]),
        );
    }
    chart
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

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Insight Terminal - Help",
        "",
        "  Tab          Switch patterns / performance",
        "  1 / 2        Patterns / Performance",
        "  j/k or ↑/↓   Move selection",
        "  t            Only the selected team",
        "  a            All teams",
        "  Esc          Back to configured team",
        "  r            Refresh now",
        "  ?            Toggle help",
        "  q            Quit",
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

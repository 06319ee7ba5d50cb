use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use crossterm::{
    cursor::Show,
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Paragraph, Row, Table},
    Frame, Terminal,
};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::PresentationSink;
use crate::models::SyncReport;

/// How often keyboard input is checked between redraws
const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(200);

const HEADERS: [&str; 10] = [
    "Node",
    "Current Block",
    "Target Block",
    "Sync %",
    "Blocks Left",
    "Sync Rate",
    "ETA",
    "Latest Block Age",
    "Synced",
    "Peers",
];

/// Last known report per node
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    pub reports: BTreeMap<String, SyncReport>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Snapshot shared between the poll loop and the table view
pub type SharedSnapshot = Arc<Mutex<Snapshot>>;

/// Publishes each cycle's reports into the shared snapshot.
/// Nodes missing from a cycle keep their previous row.
#[derive(Debug, Clone)]
pub struct TableSink {
    snapshot: SharedSnapshot,
}

impl TableSink {
    pub fn new(snapshot: SharedSnapshot) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl PresentationSink for TableSink {
    async fn render(&mut self, reports: &[SyncReport]) {
        let mut snapshot = self.snapshot.lock().await;
        for report in reports {
            snapshot.reports.insert(report.node.clone(), report.clone());
        }
        snapshot.updated_at = Some(Utc::now());
    }
}

/// Cells for one table row, in header order
fn row_cells(report: &SyncReport) -> [String; 10] {
    [
        report.node.clone(),
        report.current_block.to_string(),
        report.highest_block.to_string(),
        report.progress_display(),
        report.blocks_remaining.to_string(),
        report.rate_display(),
        report.eta_display(),
        report.block_age_display(),
        if report.is_synced { "yes" } else { "no" }.to_string(),
        report.peers_display(),
    ]
}

fn footer_text(snapshot: &Snapshot) -> String {
    let updated = snapshot
        .updated_at
        .map(|at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "waiting for first poll".to_string());

    format!("Last updated: {}  |  q to quit", updated)
}

fn draw(frame: &mut Frame, snapshot: &Snapshot) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(frame.area());

    let rows = snapshot.reports.values().map(|report| {
        let style = if report.is_synced {
            Style::default().fg(Color::Green)
        } else {
            Style::default()
        };
        Row::new(row_cells(report)).style(style)
    });

    let widths = [
        Constraint::Length(18),
        Constraint::Length(14),
        Constraint::Length(14),
        Constraint::Length(9),
        Constraint::Length(12),
        Constraint::Length(20),
        Constraint::Length(16),
        Constraint::Length(18),
        Constraint::Length(7),
        Constraint::Length(6),
    ];

    let table = Table::new(rows, widths)
        .header(
            Row::new(HEADERS)
                .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                .bottom_margin(1),
        )
        .block(Block::default().borders(Borders::ALL).title(" Node Sync Monitor "));
    frame.render_widget(table, chunks[0]);

    let footer = Paragraph::new(footer_text(snapshot))
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, chunks[1]);
}

/// Drains pending terminal events; true if the user asked to quit
fn quit_requested() -> io::Result<bool> {
    while event::poll(Duration::ZERO)? {
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            let ctrl_c = key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL);
            if ctrl_c || matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Full-screen table redrawn from the shared snapshot on its own timer
pub struct TableView {
    snapshot: SharedSnapshot,
    refresh_interval: Duration,
}

impl TableView {
    pub fn new(snapshot: SharedSnapshot, refresh_interval: Duration) -> Self {
        Self {
            snapshot,
            refresh_interval,
        }
    }

    /// Run until `shutdown` is cancelled or the user quits, which cancels it
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        enable_raw_mode()?;
        let _restore = TerminalGuard::new(restore_terminal);

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

        self.draw_loop(&mut terminal, &shutdown).await
    }

    async fn draw_loop<B: Backend>(
        &self,
        terminal: &mut Terminal<B>,
        shutdown: &CancellationToken,
    ) -> Result<()> {
        let mut redraw = tokio::time::interval(self.refresh_interval);
        let mut input = tokio::time::interval(INPUT_POLL_INTERVAL);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return Ok(()),
                _ = redraw.tick() => {
                    let snapshot = self.snapshot.lock().await.clone();
                    terminal.draw(|frame| draw(frame, &snapshot))?;
                }
                _ = input.tick() => {
                    if quit_requested()? {
                        info!("Quit requested from table view");
                        shutdown.cancel();
                        return Ok(());
                    }
                }
            }
        }
    }
}

/// Runs `restore` when dropped, covering early `?` returns and panics alike
struct TerminalGuard<F: FnMut()> {
    restore: F,
}

impl<F: FnMut()> TerminalGuard<F> {
    fn new(restore: F) -> Self {
        Self { restore }
    }
}

impl<F: FnMut()> Drop for TerminalGuard<F> {
    fn drop(&mut self) {
        (self.restore)();
    }
}

/// Leave raw mode and the alternate screen; failures are only logged
fn restore_terminal() {
    if let Err(e) = disable_raw_mode() {
        warn!("Failed to disable raw mode: {}", e);
    }
    if let Err(e) = execute!(io::stdout(), LeaveAlternateScreen, Show) {
        warn!("Failed to restore terminal: {}", e);
    }
}

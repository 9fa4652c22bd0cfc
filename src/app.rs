use crate::config::Config;
use crate::controller::Controller;
use crate::persona::Persona;
use crate::relay::{GeminiRelay, ReplySource};
use crate::ui::{
    get_help_text, ChatView, Composer, ComposerResult, DisclaimerOverlay, SessionEntry,
    SessionList, SlashCommand,
};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};
use std::time::Duration;

/// Which pane receives key input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Composer,
    Sessions,
}

/// Top-level TUI application state
pub struct App<R: ReplySource> {
    controller: Controller<R>,
    composer: Composer,
    focus: Focus,
    disclaimer_visible: bool,
    session_cursor: usize,
    status: Option<String>,
    should_exit: bool,
}

/// Run the consultation TUI until the user exits
pub async fn run(config: Config, show_disclaimer: bool) -> Result<()> {
    let persona = Persona::from_config(&config);
    let relay = GeminiRelay::new(config, persona);
    let mut app = App::new(relay, show_disclaimer);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = app.event_loop(&mut terminal).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

impl<R: ReplySource> App<R> {
    fn new(relay: R, show_disclaimer: bool) -> Self {
        let mut composer = Composer::new();
        composer.set_focus(true);

        Self {
            controller: Controller::new(relay),
            composer,
            focus: Focus::Composer,
            disclaimer_visible: show_disclaimer,
            session_cursor: 0,
            status: None,
            should_exit: false,
        }
    }

    async fn event_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        while !self.should_exit {
            self.controller.poll();
            terminal.draw(|frame| self.render(frame))?;

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key);
                }
            }
        }
        Ok(())
    }

    fn render(&self, frame: &mut Frame) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(30), Constraint::Min(40)])
            .split(frame.size());

        let current_id = self.controller.current_session_id().to_string();
        let sessions = self.controller.store().list_sessions();
        let entries: Vec<SessionEntry> = sessions
            .iter()
            .map(|s| SessionEntry {
                title: s.title.clone(),
                last_updated: s.last_updated,
                is_current: s.id == current_id,
            })
            .collect();
        frame.render_widget(
            SessionList {
                entries,
                selected: self.session_cursor,
                has_focus: self.focus == Focus::Sessions,
            },
            columns[0],
        );

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(10),
                Constraint::Length(3),
                Constraint::Length(1),
            ])
            .split(columns[1]);

        if let Some(session) = self.controller.current_session() {
            frame.render_widget(
                ChatView::new(
                    session.title.clone(),
                    session.messages.clone(),
                    self.controller.is_streaming(&current_id),
                ),
                rows[0],
            );
        }

        frame.render_widget(self.composer.clone(), rows[1]);

        let hint = self
            .status
            .clone()
            .unwrap_or_else(|| "Tab: switch pane  •  type / for commands".to_string());
        frame.render_widget(
            Paragraph::new(Line::from(vec![Span::styled(
                hint,
                Style::default().fg(Color::DarkGray),
            )])),
            rows[2],
        );

        if self.disclaimer_visible {
            frame.render_widget(DisclaimerOverlay, frame.size());
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_exit = true;
            return;
        }

        // The disclaimer swallows all input until acknowledged
        if self.disclaimer_visible {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.disclaimer_visible = false;
            }
            return;
        }

        if key.code == KeyCode::Tab {
            self.focus = match self.focus {
                Focus::Composer => Focus::Sessions,
                Focus::Sessions => Focus::Composer,
            };
            self.composer.set_focus(self.focus == Focus::Composer);
            return;
        }

        match self.focus {
            Focus::Sessions => self.handle_session_key(key),
            Focus::Composer => self.handle_composer_key(key),
        }
    }

    fn handle_session_key(&mut self, key: KeyEvent) {
        let session_count = self.controller.store().list_sessions().len();
        match key.code {
            KeyCode::Up => {
                self.session_cursor = self.session_cursor.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.session_cursor + 1 < session_count {
                    self.session_cursor += 1;
                }
            }
            KeyCode::Enter => {
                let selected_id = self
                    .controller
                    .store()
                    .list_sessions()
                    .get(self.session_cursor)
                    .map(|s| s.id.clone());
                if let Some(id) = selected_id {
                    self.controller.select_session(&id);
                }
                self.focus = Focus::Composer;
                self.composer.set_focus(true);
            }
            _ => {}
        }
    }

    fn handle_composer_key(&mut self, key: KeyEvent) {
        match self.composer.handle_key(key) {
            ComposerResult::Submitted(text) => {
                self.status = None;
                if !self.controller.send_message(&text) {
                    let current = self.controller.current_session_id().to_string();
                    if self.controller.is_streaming(&current) {
                        self.status =
                            Some("Dr. Singh is still replying, please wait...".to_string());
                    }
                }
            }
            ComposerResult::Command(command) => self.run_command(command),
            ComposerResult::None => {}
        }
    }

    fn run_command(&mut self, command: SlashCommand) {
        self.status = None;
        match command {
            SlashCommand::New => {
                self.controller.new_session();
                // New sessions land at the top of the picker
                self.session_cursor = 0;
            }
            SlashCommand::Disclaimer => {
                self.disclaimer_visible = true;
            }
            SlashCommand::Help => {
                self.status = Some(get_help_text());
            }
            SlashCommand::Quit => {
                self.should_exit = true;
            }
        }
    }
}

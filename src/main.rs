pub mod achievements;
pub mod app_dirs;
pub mod config;
pub mod engine;
pub mod error;
pub mod kana;
pub mod progress;
pub mod question;
pub mod quiz;
pub mod runtime;
pub mod session;
pub mod session_log;
pub mod stats;
pub mod ui;
pub mod util;

use crate::{
    achievements::{Achievement, AchievementLadder},
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    kana::{group_names, Deck, KanaSet},
    progress::FileProgressStore,
    quiz::{Quiz, SessionSummary},
    runtime::{CrosstermEventSource, QuizEvent, Runner},
    session_log::{SessionLog, SessionRecord},
    stats::AnswerDb,
};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    sync::Arc,
    time::Duration,
};
use tracing_subscriber::EnvFilter;

const TICK_RATE_MS: u64 = 100;

/// adaptive kana quiz tui
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "An adaptive kana quiz TUI that weights questions toward the characters you miss, widens the choice set as you improve, and keeps all-time mastery statistics."
)]
pub struct Cli {
    /// kana set to quiz
    #[clap(short = 'k', long, value_enum)]
    kana: Option<KanaSet>,

    /// comma-separated gojūon groups to include (e.g. "a,ka,sa"); all groups by default
    #[clap(short = 'g', long)]
    groups: Option<String>,

    /// fewest answer options offered
    #[clap(long)]
    min_options: Option<usize>,

    /// most answer options offered
    #[clap(long)]
    max_options: Option<usize>,

    /// consecutive correct answers per extra option
    #[clap(long)]
    streak_per_level: Option<usize>,

    /// accumulated wrong answers that remove an option
    #[clap(long)]
    wrongs_to_decrease: Option<usize>,

    /// quiz glyph -> reading only; never flip into reverse mode
    #[clap(long)]
    no_reverse: bool,

    /// print the available group names and exit
    #[clap(long)]
    list_groups: bool,

    /// erase all-time progress and exit
    #[clap(long)]
    clear_progress: bool,
}

impl Cli {
    /// Overlay CLI flags onto the stored configuration.
    fn apply_to(&self, mut config: Config) -> Config {
        if let Some(set) = self.kana {
            config.kana_set = set.to_string().to_lowercase();
        }
        if let Some(ref groups) = self.groups {
            config.groups = Some(
                groups
                    .split(',')
                    .map(|g| g.trim().to_string())
                    .filter(|g| !g.is_empty())
                    .collect(),
            );
        }
        if let Some(n) = self.min_options {
            config.difficulty.min_options = n;
        }
        if let Some(n) = self.max_options {
            config.difficulty.max_options = n;
        }
        if let Some(n) = self.streak_per_level {
            config.difficulty.streak_per_level = n;
        }
        if let Some(n) = self.wrongs_to_decrease {
            config.difficulty.wrongs_to_decrease = n;
        }
        if self.no_reverse {
            config.smart_reverse = false;
        }
        config
    }
}

fn kana_set_from_config(config: &Config) -> KanaSet {
    match config.kana_set.as_str() {
        "katakana" => KanaSet::Katakana,
        "both" => KanaSet::Both,
        _ => KanaSet::Hiragana,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppScreen {
    Quiz,
    Summary,
    Progress,
}

pub struct App {
    pub quiz: Quiz,
    pub screen: AppScreen,
    pub summary: Option<SessionSummary>,
    pub ladder: Arc<AchievementLadder>,
    pub fresh_achievements: Vec<Achievement>,
    pub recent_sessions: Vec<SessionRecord>,
    session_log: SessionLog,
}

impl App {
    pub fn new(config: &Config) -> Result<Self, Box<dyn Error>> {
        let set = kana_set_from_config(config);
        let deck = Deck::build(set, config.groups.as_deref())?;

        let ladder = Arc::new(AchievementLadder::new());
        let mut quiz = Quiz::new(
            deck,
            config,
            Box::new(FileProgressStore::new()),
            Some(ladder.clone()),
        )?;

        if let Ok(db) = AnswerDb::open() {
            quiz.attach_answer_db(db);
        }
        let session_log = SessionLog::new();
        quiz.attach_session_log(session_log.clone());

        Ok(Self {
            quiz,
            screen: AppScreen::Quiz,
            summary: None,
            ladder,
            fresh_achievements: Vec::new(),
            recent_sessions: Vec::new(),
            session_log,
        })
    }

    /// True while answers are accumulating toward an unsaved session.
    fn session_open(&self) -> bool {
        self.summary.is_none()
    }

    /// Save the running session and land on the summary screen.
    fn finish_session(&mut self) {
        let summary = self.quiz.finish();
        // Evaluate synchronously for immediate display; the deferred
        // notification then finds everything already unlocked.
        self.fresh_achievements = self.ladder.evaluate(&summary.snapshot);
        self.summary = Some(summary);
        self.screen = AppScreen::Summary;
    }

    fn open_progress(&mut self) {
        self.recent_sessions = self.session_log.recent(5);
        self.screen = AppScreen::Progress;
    }
}

fn init_tracing() {
    if std::env::var("KANADO_LOG").is_err() {
        return;
    }
    let Some(path) = AppDirs::log_file_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
    {
        let filter =
            EnvFilter::try_from_env("KANADO_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Arc::new(file))
            .with_ansi(false)
            .try_init();
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing();

    if cli.list_groups {
        let set = cli.kana.unwrap_or(KanaSet::Hiragana);
        for name in group_names(set) {
            println!("{name}");
        }
        return Ok(());
    }

    if cli.clear_progress {
        let mut stats = session::StatsAggregator::new(Box::new(FileProgressStore::new()), None);
        stats.clear_all_progress();
        println!("all-time progress cleared");
        return Ok(());
    }

    let config = cli.apply_to(FileConfigStore::new().load());

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(&config)?;
    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        Duration::from_millis(TICK_RATE_MS),
    );

    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    loop {
        match runner.step() {
            QuizEvent::Tick => continue,
            QuizEvent::Resize => {
                terminal.draw(|f| f.render_widget(&*app, f.area()))?;
            }
            QuizEvent::Key(key) => {
                if key.modifiers.contains(KeyModifiers::CONTROL)
                    && key.code == KeyCode::Char('c')
                {
                    if app.session_open() {
                        app.finish_session();
                    }
                    break;
                }

                match app.screen {
                    AppScreen::Quiz => match key.code {
                        KeyCode::Char(c @ '1'..='9') => {
                            let index = c as usize - '1' as usize;
                            let options = &app.quiz.current().options;
                            if index < options.len() {
                                let selected = options[index].clone();
                                app.quiz.submit(&selected);
                            }
                        }
                        KeyCode::Char('p') => app.open_progress(),
                        KeyCode::Esc => app.finish_session(),
                        _ => {}
                    },
                    AppScreen::Summary => match key.code {
                        KeyCode::Char('r') => {
                            app.quiz.restart()?;
                            app.summary = None;
                            app.fresh_achievements.clear();
                            app.screen = AppScreen::Quiz;
                        }
                        KeyCode::Char('p') => app.open_progress(),
                        KeyCode::Esc | KeyCode::Char('q') => break,
                        _ => {}
                    },
                    AppScreen::Progress => match key.code {
                        KeyCode::Char('b') | KeyCode::Backspace => {
                            app.screen = if app.summary.is_some() {
                                AppScreen::Summary
                            } else {
                                AppScreen::Quiz
                            };
                        }
                        KeyCode::Char('c') => {
                            app.quiz.stats_mut().clear_all_progress();
                        }
                        KeyCode::Esc => {
                            if app.session_open() {
                                app.finish_session();
                            }
                            break;
                        }
                        _ => {}
                    },
                }
                terminal.draw(|f| f.render_widget(&*app, f.area()))?;
            }
        }
    }

    Ok(())
}

use crate::{
    chain::{Chain, ChainRegistry},
    components::Component,
    config::AppConfig,
    resolver::{AddressResolver, EnsNameService, InputSetter},
    storage::{SessionRecord, Storage},
    ui::{
        bottom_bar::BottomBar,
        main_view::ResolutionView,
        sidebar::{ChainList, ChainListCommand},
        top::{AddressBar, AddressCommand},
    },
};
pub type AppResult<T> = color_eyre::Result<T>;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Constraint, Direction, Layout},
};
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;

pub use navigation::FocusedPane;

const TICK_RATE: Duration = Duration::from_millis(100);

/// Central application type that orchestrates state and delegates to UI components.
pub struct App {
    running: bool,
    pub state: AppState,
    pub storage: Storage,
    address_bar: AddressBar,
    chain_list: ChainList,
    main_view: ResolutionView,
    bottom_bar: BottomBar,
    input_setter: InputSetter,
    // Resolution tasks run here; dropping it cancels them.
    _runtime: Runtime,
}

impl App {
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let storage = Storage::open(config.storage_dir())?;
        Self::with_storage(config, storage)
    }

    fn with_storage(config: &AppConfig, storage: Storage) -> AppResult<Self> {
        let mut registry = ChainRegistry::load(config.chains_file())?;
        if let Some(name) = config.default_chain.as_deref() {
            if !registry.set_default(name) {
                tracing::warn!(chain = name, "unknown default chain, keeping built-in default");
            }
        }

        let session = match storage.settings().session() {
            Ok(session) => session.unwrap_or_default(),
            Err(err) => {
                tracing::warn!(error = %err, "ignoring unreadable saved session");
                SessionRecord::default()
            }
        };
        let chain = session
            .chain
            .as_deref()
            .and_then(|name| registry.find(name))
            .unwrap_or_else(|| registry.default_chain())
            .clone();
        tracing::info!(chain = %chain.name, input = %session.input, "restoring session");

        let runtime = Runtime::new()?;
        let resolver = AddressResolver::new(
            session.input,
            chain.clone(),
            EnsNameService::new(config.rpc_override.clone())?,
            runtime.handle().clone(),
        );
        let input_setter = resolver.setter();

        let mut state = AppState {
            chain,
            ..AppState::default()
        };
        let mut address_bar = AddressBar::new(resolver);
        let mut chain_list = ChainList::new(registry);
        let mut main_view = ResolutionView::default();
        let mut bottom_bar = BottomBar;

        {
            let mut ctx = AppContext { state: &mut state };
            address_bar.init(&mut ctx)?;
            chain_list.init(&mut ctx)?;
            main_view.init(&mut ctx)?;
            bottom_bar.init(&mut ctx)?;
        }

        Ok(Self {
            running: false,
            state,
            storage,
            address_bar,
            chain_list,
            main_view,
            bottom_bar,
            input_setter,
            _runtime: runtime,
        })
    }

    pub fn run(mut self, mut terminal: DefaultTerminal) -> AppResult<()> {
        self.running = true;
        while self.running {
            self.tick()?;
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events()?;
        }
        self.save_session()
    }

    fn render(&mut self, frame: &mut Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Min(1),
                Constraint::Length(3),
            ])
            .split(frame.area());

        let top_area = layout[0];
        let main_area = layout[1];
        let bottom_area = layout[2];

        let app_panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(32), Constraint::Min(1)])
            .split(main_area);

        let sidebar_area = app_panes[0];
        let content_area = app_panes[1];

        let view = AppView { state: &self.state };

        self.address_bar.render(frame, top_area, &view);
        self.chain_list.render(frame, sidebar_area, &view);
        self.main_view.render(frame, content_area, &view);
        self.bottom_bar.render(frame, bottom_area, &view);
    }

    fn handle_events(&mut self) -> AppResult<()> {
        if !event::poll(TICK_RATE)? {
            return Ok(());
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.on_key_event(key)?,
            Event::Paste(text) => self.on_paste(&text)?,
            _ => {}
        }
        Ok(())
    }

    fn on_paste(&mut self, text: &str) -> AppResult<()> {
        let pasted = format!(
            "{}{}",
            self.state.resolution.input,
            text.trim_end_matches(['\r', '\n'])
        );
        self.input_setter.set(pasted);
        self.dispatch(Action::FocusPane(FocusedPane::Top))
    }

    fn on_key_event(&mut self, key: KeyEvent) -> AppResult<()> {
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            return self.dispatch(Action::Quit);
        }

        if self.address_bar.is_editing() {
            match key.code {
                KeyCode::Esc => return self.address_command(AddressCommand::StopEditing),
                KeyCode::Enter => return self.dispatch(Action::FocusPane(FocusedPane::MainView)),
                KeyCode::Backspace => return self.address_command(AddressCommand::Backspace),
                KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return self.address_command(AddressCommand::Clear);
                }
                KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return self.address_command(AddressCommand::InputChar(c));
                }
                _ => {}
            }
        }

        match (key.modifiers, key.code) {
            (_, KeyCode::Esc | KeyCode::Char('q')) => self.dispatch(Action::Quit)?,
            (KeyModifiers::NONE, KeyCode::Char('/') | KeyCode::Char('i')) => {
                self.dispatch(Action::FocusPane(FocusedPane::Top))?;
            }
            (KeyModifiers::NONE, KeyCode::Tab) => self.dispatch(Action::FocusNextPane)?,
            (_, KeyCode::BackTab) => self.dispatch(Action::FocusPreviousPane)?,
            (KeyModifiers::NONE, KeyCode::Char('j') | KeyCode::Down) => {
                self.chain_list_command(ChainListCommand::MoveDown)?;
            }
            (KeyModifiers::NONE, KeyCode::Char('k') | KeyCode::Up) => {
                self.chain_list_command(ChainListCommand::MoveUp)?;
            }
            (KeyModifiers::NONE, KeyCode::Enter) => {
                self.chain_list_command(ChainListCommand::Select)?;
            }
            (KeyModifiers::NONE, KeyCode::Char(d)) if d.is_ascii_digit() => {
                if let Some(pane) = d
                    .to_digit(10)
                    .and_then(|n| FocusedPane::from_number(n as usize))
                {
                    self.dispatch(Action::FocusPane(pane))?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn dispatch(&mut self, action: Action) -> AppResult<()> {
        match action {
            Action::Quit => self.running = false,
            Action::FocusPane(pane) => self.focus(pane)?,
            Action::FocusNextPane => {
                self.state.navigation.focus_next();
                self.focus(self.state.navigation.focused_pane)?;
            }
            Action::FocusPreviousPane => {
                self.state.navigation.focus_previous();
                self.focus(self.state.navigation.focused_pane)?;
            }
            Action::ChainSelected(chain) => {
                if chain != self.state.chain {
                    self.state.chain = chain.clone();
                    self.address_command(AddressCommand::SetChain(chain))?;
                    self.save_session()?;
                }
            }
        }
        Ok(())
    }

    fn focus(&mut self, pane: FocusedPane) -> AppResult<()> {
        self.state.navigation.focused_pane = pane;
        let command = if pane == FocusedPane::Top {
            AddressCommand::StartEditing
        } else {
            AddressCommand::StopEditing
        };
        self.address_command(command)
    }

    fn chain_list_command(&mut self, command: ChainListCommand) -> AppResult<()> {
        if self.state.navigation.focused_pane != FocusedPane::Sidebar {
            return Ok(());
        }
        let mut ctx = AppContext {
            state: &mut self.state,
        };
        if let Some(action) = self.chain_list.update(&command, &mut ctx)? {
            self.dispatch(action)?;
        }
        Ok(())
    }

    fn address_command(&mut self, command: AddressCommand) -> AppResult<()> {
        let mut ctx = AppContext {
            state: &mut self.state,
        };
        if let Some(action) = self.address_bar.update(&command, &mut ctx)? {
            self.dispatch(action)?;
        }
        Ok(())
    }

    fn save_session(&self) -> AppResult<()> {
        let record = SessionRecord {
            input: self.state.resolution.input.clone(),
            chain: Some(self.state.chain.name.clone()),
        };
        self.storage.settings().save_session(&record)
    }

    fn tick(&mut self) -> AppResult<()> {
        let mut actions = Vec::new();
        {
            let mut ctx = AppContext {
                state: &mut self.state,
            };
            actions.extend(self.address_bar.tick(&mut ctx)?);
            actions.extend(self.chain_list.tick(&mut ctx)?);
            actions.extend(self.main_view.tick(&mut ctx)?);
            actions.extend(self.bottom_bar.tick(&mut ctx)?);
        }
        for action in actions {
            self.dispatch(action)?;
        }
        Ok(())
    }
}

/// State shared across components.
#[derive(Debug, Default)]
pub struct AppState {
    pub navigation: NavigationState,
    pub loading: PaneLoading,
    pub chain: Chain,
    pub resolution: ResolutionSnapshot,
}

/// Latest resolver output as the panes render it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionSnapshot {
    pub input: String,
    pub is_valid: bool,
    pub address: String,
    pub pending: bool,
    pub revision: u64,
}

#[derive(Debug, Default)]
pub struct NavigationState {
    pub focused_pane: FocusedPane,
}

impl NavigationState {
    pub fn focus_next(&mut self) {
        self.focused_pane = match self.focused_pane {
            FocusedPane::Top => FocusedPane::Sidebar,
            FocusedPane::Sidebar => FocusedPane::MainView,
            FocusedPane::MainView => FocusedPane::BottomBar,
            FocusedPane::BottomBar => FocusedPane::Top,
        };
    }

    pub fn focus_previous(&mut self) {
        self.focused_pane = match self.focused_pane {
            FocusedPane::Top => FocusedPane::BottomBar,
            FocusedPane::Sidebar => FocusedPane::Top,
            FocusedPane::MainView => FocusedPane::Sidebar,
            FocusedPane::BottomBar => FocusedPane::MainView,
        };
    }
}

#[derive(Debug, Default)]
pub struct PaneLoading {
    pub is_loading: bool,
    pub started_at: Option<Instant>,
}

impl PaneLoading {
    pub fn set_loading(&mut self, value: bool) {
        if self.is_loading == value {
            return;
        }
        self.is_loading = value;
        self.started_at = if value { Some(Instant::now()) } else { None };
    }
}

/// Mutable context passed to components while handling logic.
pub struct AppContext<'a> {
    pub state: &'a mut AppState,
}

/// Read-only context used during rendering.
pub struct AppView<'a> {
    pub state: &'a AppState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    FocusPane(FocusedPane),
    FocusNextPane,
    FocusPreviousPane,
    ChainSelected(Chain),
}

mod navigation {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum FocusedPane {
        #[default]
        Top,
        Sidebar,
        MainView,
        BottomBar,
    }

    impl FocusedPane {
        pub fn from_number(number: usize) -> Option<Self> {
            match number {
                1 => Some(Self::Top),
                2 => Some(Self::Sidebar),
                3 => Some(Self::MainView),
                4 => Some(Self::BottomBar),
                _ => None,
            }
        }
    }
}

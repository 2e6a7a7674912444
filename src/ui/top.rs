use crate::{
    app::{Action, AppContext, AppResult, AppView, FocusedPane, ResolutionSnapshot},
    chain::Chain,
    components::Component,
    resolver::{AddressResolver, EnsNameService},
};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
};

/// Address input field backed by an [`AddressResolver`].
pub struct AddressBar {
    title: String,
    editing: bool,
    resolver: AddressResolver<EnsNameService>,
    status: Option<String>,
}

#[derive(Debug, Clone)]
pub enum AddressCommand {
    StartEditing,
    StopEditing,
    InputChar(char),
    Backspace,
    Clear,
    SetChain(Chain),
}

impl AddressBar {
    pub fn new(resolver: AddressResolver<EnsNameService>) -> Self {
        Self {
            title: "evm-address-tui".to_string(),
            editing: true,
            resolver,
            status: None,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    fn edit(&mut self, ctx: &mut AppContext<'_>, change: impl FnOnce(&mut String)) {
        let mut next = self.resolver.input().to_string();
        change(&mut next);
        self.resolver.set_input(next);
        self.publish(ctx);
    }

    fn publish(&self, ctx: &mut AppContext<'_>) {
        let (address, status, _) = self.resolver.parts();
        let pending = self.resolver.is_pending();
        let revision = self.resolver.revision();
        let snapshot = &mut ctx.state.resolution;
        if snapshot.revision != revision || snapshot.pending != pending {
            *snapshot = ResolutionSnapshot {
                input: status.input.clone(),
                is_valid: status.is_valid,
                address: address.to_string(),
                pending,
                revision,
            };
        }
        ctx.state.loading.set_loading(pending);
    }

    fn input_style(resolution: &ResolutionSnapshot) -> Style {
        let color = if resolution.input.is_empty() {
            Color::Gray
        } else if resolution.pending {
            Color::Yellow
        } else if resolution.is_valid && !resolution.address.is_empty() {
            Color::Green
        } else if resolution.is_valid {
            Color::Yellow
        } else {
            Color::Red
        };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }

    fn outcome_line(resolution: &ResolutionSnapshot) -> Line<'static> {
        let (text, color) = if resolution.input.trim().is_empty() {
            ("Type an address or ENS name".to_string(), Color::Gray)
        } else if resolution.pending {
            ("Resolving…".to_string(), Color::Yellow)
        } else if !resolution.is_valid {
            ("✗ Not an address or resolvable name".to_string(), Color::Red)
        } else if resolution.address.is_empty() {
            ("Name has no address record".to_string(), Color::Yellow)
        } else {
            (format!("✓ {}", resolution.address), Color::Green)
        };
        Line::from(Span::styled(text, Style::default().fg(color)))
    }
}

impl Component for AddressBar {
    type Command = AddressCommand;

    fn init(&mut self, ctx: &mut AppContext<'_>) -> AppResult<()> {
        self.publish(ctx);
        Ok(())
    }

    fn update(
        &mut self,
        command: &Self::Command,
        ctx: &mut AppContext<'_>,
    ) -> AppResult<Option<Action>> {
        match command {
            AddressCommand::StartEditing => {
                self.editing = true;
                self.status = None;
            }
            AddressCommand::StopEditing => {
                self.editing = false;
            }
            AddressCommand::InputChar(c) => {
                self.editing = true;
                self.edit(ctx, |input| input.push(*c));
            }
            AddressCommand::Backspace => {
                self.edit(ctx, |input| {
                    input.pop();
                });
            }
            AddressCommand::Clear => {
                self.edit(ctx, String::clear);
            }
            AddressCommand::SetChain(chain) => {
                self.status = Some(format!("Resolving on {}", chain.name));
                self.resolver.set_chain(chain.clone());
                self.publish(ctx);
            }
        }
        Ok(None)
    }

    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, ctx: &AppView<'_>) {
        let is_focused = matches!(ctx.state.navigation.focused_pane, FocusedPane::Top);
        let chain = self.resolver.chain();
        let title = Line::from(format!(
            "[1] {} • {} ({})",
            self.title, chain.name, chain.chain_id
        ));
        let style = if is_focused {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };

        let resolution = &ctx.state.resolution;
        let cursor = if self.editing { "_" } else { "" };
        let mut lines = vec![
            Line::from(Span::styled(
                format!("› {}{cursor}", resolution.input),
                Self::input_style(resolution),
            )),
            Self::outcome_line(resolution),
        ];
        if let Some(status) = &self.status {
            lines.push(Line::from(status.clone()).style(Style::default().fg(Color::Gray)));
        } else if !self.editing {
            lines.push(Line::from("Press / to edit the address"));
        }

        let widget = Paragraph::new(lines)
            .style(Style::default().fg(Color::Gray))
            .block(Block::bordered().title(title.style(style)));
        frame.render_widget(widget, area);
    }

    fn tick(&mut self, ctx: &mut AppContext<'_>) -> AppResult<Option<Action>> {
        if self.resolver.poll() {
            let resolved = self.resolver.resolved();
            tracing::debug!(
                valid = resolved.is_valid,
                address = %resolved.address,
                "address resolution updated"
            );
        }
        self.publish(ctx);
        Ok(None)
    }
}

use crate::{
    app::{Action, AppContext, AppResult, AppView, FocusedPane},
    chain::{Chain, ChainRegistry},
    components::Component,
};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

#[derive(Debug)]
pub struct ChainList {
    registry: ChainRegistry,
    selected_index: usize,
}

#[derive(Debug)]
pub enum ChainListCommand {
    MoveUp,
    MoveDown,
    Select,
}

impl ChainList {
    pub fn new(registry: ChainRegistry) -> Self {
        Self {
            registry,
            selected_index: 0,
        }
    }

    fn highlighted(&self) -> Option<&Chain> {
        self.registry.chains().get(self.selected_index)
    }

    fn display_label(chain: &Chain, active: &Chain) -> String {
        let marker = if chain == active { "●" } else { " " };
        let ens = if chain.supports_ens() { " • ENS" } else { "" };
        format!("{marker} {} ({}){ens}", chain.name, chain.chain_id)
    }
}

impl Component for ChainList {
    type Command = ChainListCommand;

    fn init(&mut self, ctx: &mut AppContext<'_>) -> AppResult<()> {
        self.selected_index = self.registry.position(&ctx.state.chain.name).unwrap_or(0);
        Ok(())
    }

    fn update(
        &mut self,
        command: &Self::Command,
        _ctx: &mut AppContext<'_>,
    ) -> AppResult<Option<Action>> {
        match command {
            ChainListCommand::MoveUp => {
                self.selected_index = self.selected_index.saturating_sub(1);
            }
            ChainListCommand::MoveDown => {
                let len = self.registry.len();
                if len > 0 {
                    self.selected_index = (self.selected_index + 1).min(len - 1);
                }
            }
            ChainListCommand::Select => {
                if let Some(chain) = self.highlighted() {
                    return Ok(Some(Action::ChainSelected(chain.clone())));
                }
            }
        }
        Ok(None)
    }

    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, ctx: &AppView<'_>) {
        let is_focused = matches!(ctx.state.navigation.focused_pane, FocusedPane::Sidebar);
        let border_style = if is_focused {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
                .add_modifier(Modifier::UNDERLINED)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title(Line::from("[2] Chains").style(border_style));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.registry.is_empty() {
            let empty = Paragraph::new("No chains configured.")
                .style(Style::default().fg(Color::Gray));
            frame.render_widget(empty, inner);
            return;
        }

        let list_items: Vec<ListItem> = self
            .registry
            .chains()
            .iter()
            .map(|chain| ListItem::new(Self::display_label(chain, &ctx.state.chain)))
            .collect();
        let highlight = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let mut state = ListState::default();
        state.select(Some(self.selected_index));

        let list = List::new(list_items)
            .highlight_style(highlight)
            .highlight_symbol("▸ ");
        frame.render_stateful_widget(list, inner, &mut state);
    }

    fn tick(&mut self, _ctx: &mut AppContext<'_>) -> AppResult<Option<Action>> {
        Ok(None)
    }
}

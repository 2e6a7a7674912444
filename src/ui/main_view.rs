use super::util::short_hex;
use crate::{
    app::{Action, AppContext, AppResult, AppView, FocusedPane},
    components::Component,
    resolver::is_literal_address,
};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

/// Read-only breakdown of how the current input was interpreted.
#[derive(Debug, Default)]
pub struct ResolutionView {
    placeholder: String,
}

impl ResolutionView {
    fn field(label: &str, value: String) -> Line<'static> {
        Line::from(vec![
            Span::styled(format!("{label:<12}"), Style::default().fg(Color::DarkGray)),
            Span::raw(value),
        ])
    }
}

impl Component for ResolutionView {
    type Command = ();

    fn init(&mut self, _ctx: &mut AppContext<'_>) -> AppResult<()> {
        self.placeholder = "Type an address or ENS name in the bar above".into();
        Ok(())
    }

    fn update(
        &mut self,
        _command: &Self::Command,
        _ctx: &mut AppContext<'_>,
    ) -> AppResult<Option<Action>> {
        Ok(None)
    }

    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, ctx: &AppView<'_>) {
        let is_focused = matches!(ctx.state.navigation.focused_pane, FocusedPane::MainView);
        let border_style = if is_focused {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(Line::from("[3] Resolution").style(border_style));

        let resolution = &ctx.state.resolution;
        if resolution.input.is_empty() {
            let body = Paragraph::new(self.placeholder.as_str())
                .style(Style::default().fg(Color::Gray))
                .block(block);
            frame.render_widget(body, area);
            return;
        }

        let chain = &ctx.state.chain;
        let trimmed = resolution.input.trim();
        let kind = if is_literal_address(trimmed) {
            "literal address"
        } else if chain.supports_ens() {
            "ENS name lookup"
        } else {
            "name lookup (chain has no ENS registry)"
        };
        let outcome = if resolution.pending {
            match ctx.state.loading.started_at {
                Some(started) => format!("resolving… {:.1}s", started.elapsed().as_secs_f32()),
                None => "resolving…".to_string(),
            }
        } else if resolution.is_valid {
            "valid".to_string()
        } else {
            "invalid".to_string()
        };
        let address = if resolution.address.is_empty() {
            "(none)".to_string()
        } else {
            resolution.address.clone()
        };

        let mut lines = vec![
            Self::field("Input", format!("{:?}", resolution.input)),
            Self::field("Read as", kind.to_string()),
            Self::field("Status", outcome),
            Self::field("Address", address),
            Self::field("Chain", format!("{} ({})", chain.name, chain.chain_id)),
            Self::field(
                "Endpoint",
                chain.primary_rpc().unwrap_or("(none)").to_string(),
            ),
        ];
        if let Some(registry) = chain.ens_registry {
            lines.push(Self::field(
                "Registry",
                short_hex(&registry.to_checksum(None)),
            ));
        }
        if !resolution.pending && resolution.is_valid && resolution.address.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "The name exists but has no address record on this chain.",
                Style::default().fg(Color::Yellow),
            )));
        }

        let body = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .style(Style::default().fg(Color::Gray))
            .block(block);
        frame.render_widget(body, area);
    }

    fn tick(&mut self, _ctx: &mut AppContext<'_>) -> AppResult<Option<Action>> {
        Ok(None)
    }
}

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};

use crate::app::{App, InputMode};
use crate::listing::{Property, PropertyKind, SearchMode};
use crate::session::{ResponseMode, Role, TurnContent};

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, search bar, body, footer
    let [header_area, search_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header_area);
    render_search_bar(app, frame, search_area);

    let (main_area, services_area) = if app.show_services {
        let [main, services] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(9)]).areas(body_area);
        (main, Some(services))
    } else {
        (body_area, None)
    };

    if app.session.is_open() {
        let [list_area, chat_area] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                .areas(main_area);
        render_listings(app, frame, list_area);
        render_chat(app, frame, chat_area);
    } else {
        let [list_area, detail_area] =
            Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)])
                .areas(main_area);
        render_listings(app, frame, list_area);
        render_detail(app, frame, detail_area);
    }

    if let Some(services) = services_area {
        render_services(frame, services);
    }

    render_footer(app, frame, footer_area);
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Vistura", Style::default().fg(Color::White).bold()),
        Span::styled("360", Style::default().fg(Color::Blue).bold()),
        Span::styled(
            ": Habita antes de llegar. ",
            Style::default().fg(Color::Gray),
        ),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::Black));
    frame.render_widget(header, area);
}

fn render_search_bar(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing && !app.session.is_open();
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Busca por Ciudad, Colonia o Título ");

    let mut spans: Vec<Span> = Vec::new();
    for mode in SearchMode::all() {
        let style = if mode == app.search_mode {
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!(" {} ", mode.label()), style));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::raw("  "));

    if app.search_input.is_empty() && !editing {
        spans.push(Span::styled(
            "Pregunta con / para escribir...",
            Style::default().fg(Color::DarkGray),
        ));
    } else {
        spans.push(Span::styled(
            app.search_input.as_str(),
            Style::default().fg(Color::Cyan),
        ));
        if editing {
            spans.push(Span::styled("█", Style::default().fg(Color::Cyan)));
        }
    }

    let bar = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(bar, area);
}

fn render_listings(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(
            " Propiedades Destacadas ({} encontradas) ",
            app.filtered.len()
        ));

    if app.filtered.is_empty() {
        render_no_results(frame, block, area);
        return;
    }

    let items: Vec<ListItem> = app.filtered.iter().map(listing_item).collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn listing_item(property: &Property) -> ListItem<'_> {
    let price_suffix = match property.kind {
        PropertyKind::Rent => "/mes",
        PropertyKind::Sale => "",
    };

    let kind_color = match property.kind {
        PropertyKind::Rent => Color::Blue,
        PropertyKind::Sale => Color::Green,
    };

    let mut badges = vec![Span::styled(
        format!(" {} ", property.kind.badge()),
        Style::default().fg(kind_color),
    )];
    if property.has_tour {
        badges.push(Span::styled(" TOUR 4K ", Style::default().fg(Color::Magenta)));
    }

    let mut title_line = vec![
        Span::styled(
            property.title.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            format!("{}{}", property.price, price_suffix),
            Style::default().fg(Color::Yellow),
        ),
    ];
    title_line.extend(badges);

    let detail_line = Line::from(Span::styled(
        format!(
            "  {} · {} Hab. · {} Baños · {} m²",
            property.location, property.beds, property.baths, property.sqm
        ),
        Style::default().fg(Color::Gray),
    ));

    ListItem::new(vec![Line::from(title_line), detail_line, Line::default()])
}

fn render_no_results(frame: &mut Frame, block: Block, area: Rect) {
    let text = Text::from(vec![
        Line::default(),
        Line::from(Span::styled(
            "No se encontraron resultados",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(Span::styled(
            "Intenta ajustar tus filtros o buscar otra ubicación.",
            Style::default().fg(Color::Gray),
        )),
        Line::default(),
        Line::from(vec![
            Span::styled("Presiona ", Style::default().fg(Color::DarkGray)),
            Span::styled("r", Style::default().fg(Color::Cyan).bold()),
            Span::styled(
                " para limpiar la búsqueda",
                Style::default().fg(Color::DarkGray),
            ),
        ]),
    ]);

    let notice = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(notice, area);
}

fn render_detail(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Detalle ");

    let Some(property) = app.selected_property() else {
        let placeholder = Paragraph::new(Span::styled(
            "Selecciona una propiedad para ver el detalle",
            Style::default().fg(Color::DarkGray),
        ))
        .block(block);
        frame.render_widget(placeholder, area);
        return;
    };

    let mut lines: Vec<Line> = vec![
        Line::from(Span::styled(
            property.title.as_str(),
            Style::default().fg(Color::Yellow).bold(),
        )),
        Line::from(vec![
            Span::styled(
                property.price.as_str(),
                Style::default().fg(Color::White).bold(),
            ),
            Span::raw("   "),
            Span::styled(
                property.kind.badge(),
                Style::default().fg(match property.kind {
                    PropertyKind::Rent => Color::Blue,
                    PropertyKind::Sale => Color::Green,
                }),
            ),
        ]),
        Line::from(Span::styled(
            property.location.as_str(),
            Style::default().fg(Color::Gray),
        )),
        Line::from(Span::styled(
            format!(
                "{} Hab. · {} Baños · {} m²",
                property.beds, property.baths, property.sqm
            ),
            Style::default().fg(Color::Gray),
        )),
    ];

    if property.has_tour {
        lines.push(Line::from(Span::styled(
            "Recorrido inmersivo 4K disponible",
            Style::default().fg(Color::Magenta),
        )));
    }

    if let Some(description) = &property.description {
        lines.push(Line::default());
        for line in description.lines() {
            lines.push(Line::from(line.to_string()));
        }
    }

    if !property.amenities.is_empty() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "Amenidades",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for amenity in &property.amenities {
            lines.push(Line::from(format!("  • {}", amenity)));
        }
    }

    let detail = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(detail, area);
}

fn render_services(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Para Propietarios y Agentes ");

    let text = Text::from(vec![
        Line::from(Span::styled(
            "Vende más Rápido. Renta Antes.",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Las propiedades con Tours Vistura 4K reciben un 300% más de interacción.",
            Style::default().fg(Color::Gray),
        )),
        Line::from("  ✓ Fotografía Profesional 4K HDR"),
        Line::from("  ✓ Recorridos 3D Inmersivos"),
        Line::from("  ✓ Descripciones Mejoradas por IA"),
        Line::from("  ✓ Posicionamiento Premium"),
    ]);

    let services = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
    frame.render_widget(services, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let [selector_area, messages_area, input_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    // Response mode selector
    let mut selector: Vec<Span> = vec![Span::raw(" ")];
    for mode in ResponseMode::all() {
        let style = if mode == app.session.mode() {
            let bg = match mode {
                ResponseMode::Fast => Color::Green,
                ResponseMode::Standard => Color::Blue,
                ResponseMode::Thinking => Color::Magenta,
            };
            Style::default().bg(bg).fg(Color::White).bold()
        } else {
            Style::default().fg(Color::DarkGray)
        };
        selector.push(Span::styled(format!(" {} ", mode.label()), style));
        selector.push(Span::raw(" "));
    }
    frame.render_widget(Paragraph::new(Line::from(selector)), selector_area);

    // Conversation
    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Vistura AI · Asistente de Propiedades ");

    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = messages_area.height.saturating_sub(2);
    app.chat_width = messages_area.width.saturating_sub(2);

    let mut lines: Vec<Line> = Vec::new();
    for turn in app.session.turns() {
        match turn.role {
            Role::User => {
                lines.push(Line::from(Span::styled(
                    "Tú:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
            }
            Role::Model => {
                lines.push(Line::from(Span::styled(
                    "Vistura:",
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                )));
            }
        }

        match &turn.content {
            TurnContent::Pending { mode } => {
                // Animated ellipsis: cycles through ".", "..", "..."
                let dots = ".".repeat((app.animation_frame as usize) + 1);
                let (label, color) = match mode {
                    ResponseMode::Thinking => ("Razonando", Color::Magenta),
                    _ => ("Escribiendo", Color::DarkGray),
                };
                lines.push(Line::from(Span::styled(
                    format!("{}{}", label, dots),
                    Style::default().fg(color).add_modifier(Modifier::ITALIC),
                )));
            }
            TurnContent::Text(text) => {
                for line in text.lines() {
                    lines.push(Line::from(line.to_string()));
                }
            }
        }
        lines.push(Line::default());
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, messages_area);

    // Input line
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Pregunta sobre propiedades... ");

    // Keep the tail of the input visible; the cursor sits at the end
    let inner_width = input_area.width.saturating_sub(3) as usize;
    let char_count = app.chat_input.chars().count();
    let visible_text: String = app
        .chat_input
        .chars()
        .skip(char_count.saturating_sub(inner_width))
        .collect();

    let input = Paragraph::new(Line::from(vec![
        Span::styled(visible_text, Style::default().fg(Color::Cyan)),
        Span::styled("█", Style::default().fg(Color::Cyan)),
    ]))
    .block(input_block);
    frame.render_widget(input, input_area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints: Vec<Span> = if app.session.is_open() {
        vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" enviar ", label_style),
            Span::styled(" Tab ", key_style),
            Span::styled(" modo ", label_style),
            Span::styled(" ↑/↓ ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" cerrar ", label_style),
        ]
    } else if app.input_mode == InputMode::Editing {
        vec![
            Span::styled(" Enter/Esc ", key_style),
            Span::styled(" listo ", label_style),
            Span::styled(" escribe ", key_style),
            Span::styled(" filtra en vivo ", label_style),
        ]
    } else {
        vec![
            Span::styled(" j/k ", key_style),
            Span::styled(" nav ", label_style),
            Span::styled(" / ", key_style),
            Span::styled(" buscar ", label_style),
            Span::styled(" t ", key_style),
            Span::styled(" modo ", label_style),
            Span::styled(" r ", key_style),
            Span::styled(" limpiar ", label_style),
            Span::styled(" s ", key_style),
            Span::styled(" servicios ", label_style),
            Span::styled(" a ", key_style),
            Span::styled(" asistente ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" salir ", label_style),
        ]
    };

    let footer = Paragraph::new(Line::from(hints));
    frame.render_widget(footer, area);
}

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap},
};
use std::io::stdout;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::app::{Action, App, Tab};
use crate::history::{CompareMark, HistoryState};
use crate::rating::{rating_label, severity};
use crate::render::{analysis_text, comparison_table};
use crate::requests::{Completion, Dispatch};
use crate::uploader::{ResultDisplay, UploaderState};

const FEATURES: [(&str, &str); 6] = [
    ("Live Resume Analysis", "Instantly analyze your resume and get AI-driven insights."),
    ("File Upload & Parsing", "Upload PDF resumes. The system extracts and structures your data automatically."),
    ("AI Feedback & Ratings", "Receive a rating, improvement areas, and upskilling suggestions."),
    ("Structured Data Display", "View personal info, skills, work experience, education, projects, and certifications."),
    ("Historical Viewer", "Access all previously uploaded resumes in one place."),
    ("Resume Comparison", "Compare multiple resumes side by side for skills, ratings, and feedback."),
];

const HINT: &str = "Upload your resume to get an instant analysis with improvement areas.";

pub fn run<D: Dispatch>(app: &mut App<D>, completions: &mut UnboundedReceiver<Completion>) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, app, completions);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop<D: Dispatch>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App<D>,
    completions: &mut UnboundedReceiver<Completion>,
) -> Result<()> {
    loop {
        while let Ok(completion) = completions.try_recv() {
            app.handle_completion(completion);
        }

        terminal.draw(|frame| draw(frame, app))?;
        if app.should_quit() {
            break;
        }

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if let Some(action) = action_for(app, key) {
                app.update(action);
            }
        }
    }
    Ok(())
}

/// Key bindings depend on what is on screen: alerts and prompts capture
/// input first, then open dialogs, then the active tab.
pub fn action_for<D: Dispatch>(app: &App<D>, key: KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }

    if app.alert().is_some() {
        return match key.code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => Some(Action::DismissAlert),
            _ => None,
        };
    }

    if app.file_input().is_some() {
        return match key.code {
            KeyCode::Enter => Some(Action::InputSubmit),
            KeyCode::Esc => Some(Action::InputCancel),
            KeyCode::Backspace => Some(Action::InputBackspace),
            KeyCode::Char(c) => Some(Action::InputChar(c)),
            _ => None,
        };
    }

    if app.showing_landing() {
        return match key.code {
            KeyCode::Enter | KeyCode::Char(' ') => Some(Action::Start),
            KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
            _ => None,
        };
    }

    if let Some(uploader) = app.uploader() {
        if let Some(action) = uploader_keys(uploader, key.code) {
            return Some(action);
        }
    }
    if let Some(history) = app.history() {
        if let Some(action) = history_keys(history, key.code) {
            return Some(action);
        }
    }

    match key.code {
        KeyCode::Tab | KeyCode::BackTab => Some(Action::NextTab),
        KeyCode::Char('1') => Some(Action::SelectTab(Tab::Analysis)),
        KeyCode::Char('2') => Some(Action::SelectTab(Tab::History)),
        KeyCode::Char('q') => Some(Action::Quit),
        _ => None,
    }
}

fn uploader_keys(uploader: &UploaderState, code: KeyCode) -> Option<Action> {
    if uploader.overlay_open() {
        return match code {
            KeyCode::Enter | KeyCode::Esc => Some(Action::DismissOverlay),
            KeyCode::Down | KeyCode::Char('j') | KeyCode::PageDown => Some(Action::ScrollDown),
            KeyCode::Up | KeyCode::Char('k') | KeyCode::PageUp => Some(Action::ScrollUp),
            _ => None,
        };
    }
    match code {
        KeyCode::Char('f') => Some(Action::BeginFileInput),
        KeyCode::Enter | KeyCode::Char('u') => Some(Action::Submit),
        KeyCode::Down | KeyCode::Char('j') | KeyCode::PageDown => Some(Action::ScrollDown),
        KeyCode::Up | KeyCode::Char('k') | KeyCode::PageUp => Some(Action::ScrollUp),
        _ => None,
    }
}

fn history_keys(history: &HistoryState, code: KeyCode) -> Option<Action> {
    if history.compare_open() {
        return match code {
            KeyCode::Enter | KeyCode::Esc => Some(Action::CloseCompare),
            _ => None,
        };
    }
    if history.selected().is_some() {
        return match code {
            KeyCode::Enter | KeyCode::Esc => Some(Action::CloseDetails),
            KeyCode::Down | KeyCode::Char('j') | KeyCode::PageDown => Some(Action::ScrollDown),
            KeyCode::Up | KeyCode::Char('k') | KeyCode::PageUp => Some(Action::ScrollUp),
            _ => None,
        };
    }
    if history.is_empty_state() {
        return match code {
            KeyCode::Char('u') | KeyCode::Enter => Some(Action::SelectTab(Tab::Analysis)),
            KeyCode::Char('r') => Some(Action::Reload),
            _ => None,
        };
    }
    match code {
        KeyCode::Down | KeyCode::Char('j') => Some(Action::CursorDown),
        KeyCode::Up | KeyCode::Char('k') => Some(Action::CursorUp),
        KeyCode::Enter => Some(Action::OpenDetails),
        KeyCode::Char(' ') | KeyCode::Char('s') => Some(Action::ToggleCompare),
        KeyCode::Char('c') => Some(Action::OpenCompare),
        KeyCode::Char('r') => Some(Action::Reload),
        _ => None,
    }
}

fn draw<D: Dispatch>(frame: &mut Frame, app: &App<D>) {
    if app.showing_landing() {
        draw_landing(frame);
    } else {
        draw_main(frame, app);
    }

    if let Some(input) = app.file_input() {
        draw_file_prompt(frame, input);
    }
    if let Some(message) = app.alert() {
        draw_alert(frame, message);
    }
}

fn draw_landing(frame: &mut Frame) {
    let mut lines = vec![
        Line::from(Span::styled(
            "Welcome to Resume Analyzer",
            Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
        ))
        .centered(),
        Line::from(""),
    ];
    for (title, description) in FEATURES {
        lines.push(Line::from(Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            format!("  {}", description),
            Style::default().fg(Color::Gray),
        )));
        lines.push(Line::from(""));
    }
    lines.push(
        Line::from(Span::styled(
            "[ Get Started ]  press Enter",
            Style::default().fg(Color::Black).bg(Color::Blue),
        ))
        .centered(),
    );

    let area = centered_rect(70, 80, frame.area());
    let panel = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: false });
    frame.render_widget(panel, area);
}

fn draw_main<D: Dispatch>(frame: &mut Frame, app: &App<D>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let title = Paragraph::new(Span::styled(
        " Resume Analyzer",
        Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
    ));
    frame.render_widget(title, chunks[0]);

    let tabs = Tabs::new(Tab::ALL.iter().map(|t| t.title()))
        .block(Block::default().borders(Borders::BOTTOM))
        .highlight_style(Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD))
        .select(app.tab().index());
    frame.render_widget(tabs, chunks[1]);

    let help = if let Some(uploader) = app.uploader() {
        draw_uploader(frame, chunks[2], uploader, app.scroll());
        if uploader.overlay_open() {
            " j/k:scroll  Enter/Esc:close  q:quit"
        } else {
            " f:select file  Enter:upload & analyze  j/k:scroll  Tab:switch  q:quit"
        }
    } else if let Some(history) = app.history() {
        draw_history(frame, chunks[2], history, app.scroll());
        if history.compare_open() || history.selected().is_some() {
            " j/k:scroll  Enter/Esc:close  q:quit"
        } else {
            " j/k:navigate  Enter:details  Space:select  c:compare  r:reload  Tab:switch  q:quit"
        }
    } else {
        ""
    };

    frame.render_widget(
        Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
        chunks[3],
    );
}

fn draw_uploader(frame: &mut Frame, area: Rect, uploader: &UploaderState, scroll: u16) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(0)])
        .split(area);

    let file = match uploader.selected_file() {
        Some(path) => Span::raw(path.display().to_string()),
        None => Span::styled("(none) press f to select a PDF", Style::default().fg(Color::DarkGray)),
    };
    let button = if uploader.is_busy() {
        Span::styled("[ Uploading... ]", Style::default().fg(Color::DarkGray))
    } else {
        Span::styled(
            "[ Upload & Analyze ]",
            Style::default().fg(Color::Black).bg(Color::Blue),
        )
    };
    let form = Paragraph::new(vec![
        Line::from(Span::styled(
            "Upload Your Resume",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![Span::raw("File: "), file]),
        Line::from(button),
    ])
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(form, chunks[0]);

    match uploader.result() {
        None => {
            let hint = Paragraph::new(HINT)
                .style(Style::default().fg(Color::Cyan))
                .block(Block::default().borders(Borders::ALL).title(" Info "))
                .wrap(Wrap { trim: true });
            frame.render_widget(hint, chunks[1]);
        }
        Some(result) if uploader.display() == ResultDisplay::Inline => {
            let inline = Paragraph::new(analysis_text(result))
                .block(Block::default().borders(Borders::ALL).title(" Resume Analysis "))
                .wrap(Wrap { trim: false })
                .scroll((scroll, 0));
            frame.render_widget(inline, chunks[1]);
        }
        Some(result) => {
            draw_popup(frame, " Resume Analysis Result ", analysis_text(result), scroll);
        }
    }
}

fn draw_history(frame: &mut Frame, area: Rect, history: &HistoryState, scroll: u16) {
    if history.is_loading() {
        frame.render_widget(
            Paragraph::new("Loading history...").block(Block::default().borders(Borders::ALL)),
            area,
        );
        return;
    }

    if history.rows().is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "No Resumes Found",
                Style::default().add_modifier(Modifier::BOLD),
            ))
            .centered(),
            Line::from(""),
            Line::from(
                "You haven't uploaded any resumes yet. Once you upload and analyze your resume, \
                 it will appear here in your history for quick access.",
            )
            .centered(),
            Line::from(""),
            Line::from(Span::styled(
                "[ Upload Resume ]  press u",
                Style::default().fg(Color::Black).bg(Color::Blue),
            ))
            .centered(),
        ])
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(empty, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let header = Row::new(["Select", "ID", "File Name", "Name", "Email", "Rating"])
        .style(Style::default().fg(Color::White).bg(Color::Blue).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = history
        .rows()
        .iter()
        .map(|r| {
            let mark = match history.compare_mark(r.id) {
                CompareMark::Selected => "[x]",
                CompareMark::Loading => "[~]",
                CompareMark::Available => "[ ]",
                CompareMark::Disabled => " - ",
            };
            let rating = match r.resume_rating.filter(|v| v.is_finite()) {
                Some(value) => Span::styled(
                    rating_label(Some(value)),
                    Style::default().fg(severity(value).color()).add_modifier(Modifier::BOLD),
                ),
                None => Span::styled(rating_label(r.resume_rating), Style::default().fg(Color::DarkGray)),
            };
            Row::new(vec![
                Cell::from(mark),
                Cell::from(r.id.to_string()),
                Cell::from(r.filename.clone()),
                Cell::from(r.name.clone().unwrap_or_default()),
                Cell::from(r.email.clone().unwrap_or_default()),
                Cell::from(rating),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(7),
            Constraint::Length(6),
            Constraint::Percentage(30),
            Constraint::Percentage(25),
            Constraint::Percentage(30),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(format!(" Resumes ({}) ", history.rows().len())))
    .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("> ");

    let mut state = TableState::default().with_selected(Some(history.cursor()));
    frame.render_stateful_widget(table, chunks[0], &mut state);

    let compare_style = if history.can_compare() {
        Style::default().fg(Color::Black).bg(Color::Magenta)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let status = if history.is_fetching_details() {
        "  loading details..."
    } else if !history.comparison().is_empty() && !history.can_compare() {
        "  select one more resume to compare"
    } else {
        ""
    };
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(
                format!(" Compare Selected Resumes ({}/2) ", history.comparison().len()),
                compare_style,
            ),
            Span::styled(status, Style::default().fg(Color::DarkGray)),
        ])),
        chunks[1],
    );

    if history.compare_open() {
        draw_comparison(frame, history);
    } else if let Some(detail) = history.selected() {
        let title = format!(" {} - Details ", detail.display_title());
        draw_popup(frame, &title, analysis_text(detail), scroll);
    }
}

fn draw_comparison(frame: &mut Frame, history: &HistoryState) {
    let table = comparison_table(history.comparison().details());
    let area = centered_rect(90, 85, frame.area());
    frame.render_widget(Clear, area);

    let field_width: u16 = 22;
    let columns = table.headers.len().max(1) as u16;
    let column_width = (area.width.saturating_sub(field_width + 2) / columns).saturating_sub(1) as usize;

    let header = Row::new(
        std::iter::once(Cell::from("Field")).chain(table.headers.iter().map(|h| Cell::from(h.clone()))),
    )
    .style(Style::default().fg(Color::White).bg(Color::Blue).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = table
        .rows
        .iter()
        .map(|row| {
            let cells: Vec<Vec<Line<'static>>> = row
                .cells
                .iter()
                .map(|c| wrap_lines(c.lines(), column_width))
                .collect();
            let height = cells.iter().map(Vec::len).max().unwrap_or(1).max(1) as u16;
            let mut out = vec![Cell::from(Span::styled(
                row.field,
                Style::default().add_modifier(Modifier::BOLD),
            ))];
            out.extend(cells.into_iter().map(|lines| Cell::from(Text::from(lines))));
            Row::new(out).height(height + 1)
        })
        .collect();

    let mut widths = vec![Constraint::Length(field_width)];
    widths.extend(std::iter::repeat(Constraint::Fill(1)).take(columns as usize));

    let widget = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Resume Comparison ")
                .title_bottom(" Enter/Esc: close "),
        );
    frame.render_widget(widget, area);
}

fn wrap_lines(lines: Vec<Line<'static>>, width: usize) -> Vec<Line<'static>> {
    if width < 8 {
        return lines;
    }
    let mut out = Vec::new();
    for line in lines {
        if line.width() <= width {
            out.push(line);
            continue;
        }
        let raw: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        out.extend(textwrap::wrap(&raw, width).into_iter().map(|l| Line::from(l.into_owned())));
    }
    out
}

fn draw_popup(frame: &mut Frame, title: &str, body: Text<'static>, scroll: u16) {
    let area = centered_rect(80, 85, frame.area());
    frame.render_widget(Clear, area);
    let popup = Paragraph::new(body)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue))
                .title(Span::styled(
                    title.to_string(),
                    Style::default().add_modifier(Modifier::BOLD),
                ))
                .title_bottom(" Enter/Esc: close "),
        )
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(popup, area);
}

fn draw_file_prompt(frame: &mut Frame, input: &str) {
    let area = centered_rect(60, 20, frame.area());
    frame.render_widget(Clear, area);
    let prompt = Paragraph::new(vec![
        Line::from("Path to a PDF resume:"),
        Line::from(Span::styled(
            format!("{}_", input),
            Style::default().fg(Color::Yellow),
        )),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Select PDF ")
            .title_bottom(" Enter: choose  Esc: cancel "),
    )
    .wrap(Wrap { trim: false });
    frame.render_widget(prompt, area);
}

fn draw_alert(frame: &mut Frame, message: &str) {
    let area = centered_rect(50, 25, frame.area());
    frame.render_widget(Clear, area);
    let alert = Paragraph::new(message.to_string())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title(" Alert ")
                .title_bottom(" Enter: OK "),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(alert, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

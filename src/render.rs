//! Presentation shared by every view that shows resume data: the analysis
//! card stack, the comparison table, and plain-text output for the CLI.

use ratatui::prelude::*;

use crate::models::{non_blank, Education, ResumeDetail, WorkExperience};
use crate::rating::{rating_label, severity, Severity};

const PLACEHOLDER: &str = "-";

fn heading(title: &str, color: Color) -> Line<'static> {
    Line::from(Span::styled(
        title.to_string(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))
}

fn field(label: &str, value: Option<&str>) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{}: ", label), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(value.unwrap_or(PLACEHOLDER).to_string()),
    ])
}

fn chips(items: &[String], color: Color) -> Line<'static> {
    let mut spans = Vec::with_capacity(items.len() * 2);
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled(format!("[{}]", item), Style::default().fg(color)));
    }
    Line::from(spans)
}

/// Rating chip: label colored by severity, severity spelled out for terminals
/// without color. An absent rating gets a bare placeholder.
pub fn rating_chip(rating: Option<f64>) -> Vec<Span<'static>> {
    let label = rating_label(rating);
    match rating {
        Some(r) if r.is_finite() => {
            let tier = severity(r);
            let style = Style::default()
                .fg(Color::Black)
                .bg(tier.color())
                .add_modifier(Modifier::BOLD);
            vec![
                Span::styled(format!(" {} ", label), style),
                Span::styled(format!(" ({})", tier.label()), Style::default().fg(tier.color())),
            ]
        }
        _ => vec![Span::styled(format!(" {} ", label), Style::default().fg(Color::DarkGray))],
    }
}

fn work_line(we: &WorkExperience) -> Option<Line<'static>> {
    let mut spans = Vec::new();
    if let Some(title) = non_blank(&we.title) {
        spans.push(Span::styled(title.to_string(), Style::default().add_modifier(Modifier::BOLD)));
    }
    if let Some(company) = non_blank(&we.company) {
        spans.push(Span::raw(format!(" at {}", company)));
    }
    if let Some(duration) = non_blank(&we.duration) {
        spans.push(Span::raw(format!(" ({})", duration)));
    }
    if let Some(location) = non_blank(&we.location) {
        spans.push(Span::raw(format!(" - {}", location)));
    }
    (!spans.is_empty()).then(|| Line::from(spans))
}

fn education_line(ed: &Education) -> Option<Line<'static>> {
    let mut spans = Vec::new();
    if let Some(degree) = non_blank(&ed.degree) {
        spans.push(Span::styled(degree.to_string(), Style::default().add_modifier(Modifier::BOLD)));
    }
    if let Some(university) = non_blank(&ed.university) {
        spans.push(Span::raw(format!(", {}", university)));
    }
    if let Some(duration) = non_blank(&ed.duration) {
        spans.push(Span::raw(format!(" ({})", duration)));
    }
    if let Some(location) = non_blank(&ed.location) {
        spans.push(Span::raw(format!(" - {}", location)));
    }
    (!spans.is_empty()).then(|| Line::from(spans))
}

fn indented(text: &str) -> Line<'static> {
    Line::from(format!("  {}", text))
}

/// Best-effort pretty timestamp; the backend may or may not include an offset.
pub fn format_uploaded_at(raw: &str) -> String {
    if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(raw) {
        return ts.format("%Y-%m-%d %H:%M").to_string();
    }
    if let Ok(ts) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return ts.format("%Y-%m-%d %H:%M").to_string();
    }
    raw.to_string()
}

/// The full analysis of one resume. Used for the upload result (overlay and
/// inline) and for the history detail dialog.
pub fn analysis_text(detail: &ResumeDetail) -> Text<'static> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    lines.push(heading("Basic Information", Color::Blue));
    lines.push(field("Name", non_blank(&detail.name)));
    lines.push(field("Email", non_blank(&detail.email)));
    lines.push(field("Phone", non_blank(&detail.phone)));
    if let Some(url) = non_blank(&detail.linkedin_url) {
        lines.push(field("LinkedIn", Some(url)));
    }
    if let Some(url) = non_blank(&detail.portfolio_url) {
        lines.push(field("Portfolio", Some(url)));
    }
    if let Some(raw) = non_blank(&detail.uploaded_at) {
        lines.push(field("Uploaded", Some(&format_uploaded_at(raw))));
    }
    lines.push(Line::from(""));

    if !detail.core_skills.is_empty() {
        lines.push(heading("Core Skills", Color::Cyan));
        lines.push(chips(&detail.core_skills, Color::Cyan));
        lines.push(Line::from(""));
    }

    if !detail.soft_skills.is_empty() {
        lines.push(heading("Soft Skills", Color::Magenta));
        lines.push(chips(&detail.soft_skills, Color::Magenta));
        lines.push(Line::from(""));
    }

    if !detail.work_experience.is_empty() {
        lines.push(heading("Work Experience", Color::Yellow));
        for we in &detail.work_experience {
            if let Some(line) = work_line(we) {
                lines.push(line);
            }
            if let Some(description) = non_blank(&we.description) {
                lines.push(indented(description));
            }
        }
        lines.push(Line::from(""));
    }

    if !detail.education.is_empty() {
        lines.push(heading("Education", Color::Green));
        for ed in &detail.education {
            if let Some(line) = education_line(ed) {
                lines.push(line);
            }
            if let Some(cgpa) = non_blank(&ed.cgpa) {
                lines.push(indented(&format!("CGPA: {}", cgpa)));
            }
            if let Some(percentage) = non_blank(&ed.percentage) {
                lines.push(indented(&format!("Percentage: {}", percentage)));
            }
            if let Some(additional) = non_blank(&ed.additional) {
                lines.push(indented(&format!("Additional: {}", additional)));
            }
        }
        lines.push(Line::from(""));
    }

    if !detail.projects.is_empty() {
        lines.push(heading("Projects", Color::Cyan));
        for project in &detail.projects {
            if let Some(name) = non_blank(&project.name) {
                lines.push(Line::from(Span::styled(
                    name.to_string(),
                    Style::default().add_modifier(Modifier::BOLD),
                )));
            }
            if let Some(description) = non_blank(&project.description) {
                lines.push(indented(description));
            }
            if !project.technologies.is_empty() {
                let mut line = chips(&project.technologies, Color::Blue);
                line.spans.insert(0, Span::raw("  "));
                lines.push(line);
            }
        }
        lines.push(Line::from(""));
    }

    if !detail.certifications.is_empty() {
        lines.push(heading("Certifications", Color::Magenta));
        for cert in &detail.certifications {
            let name = non_blank(&cert.name).unwrap_or(PLACEHOLDER);
            match non_blank(&cert.issuer) {
                Some(issuer) => lines.push(Line::from(format!("• {} (Issued by: {})", name, issuer))),
                None => lines.push(Line::from(format!("• {}", name))),
            }
        }
        lines.push(Line::from(""));
    }

    lines.push(heading("Resume Rating", Color::Yellow));
    lines.push(Line::from(rating_chip(detail.resume_rating)));
    lines.push(Line::from(""));

    lines.push(heading("Improvement Areas", Color::Red));
    lines.push(Line::from(
        non_blank(&detail.improvement_areas).unwrap_or(PLACEHOLDER).to_string(),
    ));

    if !detail.upskill_suggestions.is_empty() {
        lines.push(Line::from(""));
        lines.push(heading("Upskill Suggestions", Color::Green));
        for suggestion in &detail.upskill_suggestions {
            lines.push(Line::from(format!("• {}", suggestion)));
        }
    }

    Text::from(lines)
}

/// One cell of the comparison table.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Tags(Vec<String>),
    Text(String),
    Rating {
        label: String,
        severity: Option<Severity>,
    },
    Bullets(Vec<String>),
    Empty,
}

impl Cell {
    fn from_list(items: &[String], make: fn(Vec<String>) -> Cell) -> Cell {
        if items.is_empty() {
            Cell::Empty
        } else {
            make(items.to_vec())
        }
    }

    pub fn lines(&self) -> Vec<Line<'static>> {
        match self {
            Cell::Tags(tags) => tags.iter().map(|t| Line::from(format!("[{}]", t))).collect(),
            Cell::Text(text) => vec![Line::from(text.clone())],
            Cell::Rating { label, severity } => {
                let style = match severity {
                    Some(s) => Style::default().fg(s.color()).add_modifier(Modifier::BOLD),
                    None => Style::default().fg(Color::DarkGray),
                };
                vec![Line::from(Span::styled(label.clone(), style))]
            }
            Cell::Bullets(items) => items.iter().map(|s| Line::from(format!("• {}", s))).collect(),
            Cell::Empty => vec![Line::from(PLACEHOLDER)],
        }
    }

    pub fn plain(&self) -> String {
        match self {
            Cell::Tags(tags) => tags.join(", "),
            Cell::Text(text) => text.clone(),
            Cell::Rating {
                label,
                severity: Some(s),
            } => format!("{} ({})", label, s.label()),
            Cell::Rating { label, severity: None } => label.clone(),
            Cell::Bullets(items) => items.join("; "),
            Cell::Empty => PLACEHOLDER.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub field: &'static str,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonTable {
    pub headers: Vec<String>,
    pub rows: Vec<ComparisonRow>,
}

/// Field-by-field table with one column per record.
pub fn comparison_table<'a>(records: impl IntoIterator<Item = &'a ResumeDetail>) -> ComparisonTable {
    let records: Vec<&ResumeDetail> = records.into_iter().collect();
    let row = |field: &'static str, cell: fn(&ResumeDetail) -> Cell| ComparisonRow {
        field,
        cells: records.iter().map(|r| cell(r)).collect(),
    };

    ComparisonTable {
        headers: records.iter().map(|r| r.display_title()).collect(),
        rows: vec![
            row("Core Skills", |r| Cell::from_list(&r.core_skills, Cell::Tags)),
            row("Soft Skills", |r| Cell::from_list(&r.soft_skills, Cell::Tags)),
            row("Resume Rating", |r| Cell::Rating {
                label: rating_label(r.resume_rating),
                severity: r.resume_rating.filter(|v| v.is_finite()).map(severity),
            }),
            row("Improvements", |r| match non_blank(&r.improvement_areas) {
                Some(text) => Cell::Text(text.to_string()),
                None => Cell::Empty,
            }),
            row("Upskill Suggestions", |r| {
                Cell::from_list(&r.upskill_suggestions, Cell::Bullets)
            }),
        ],
    }
}

/// Flatten styled text for stdout, wrapping long lines.
pub fn to_plain(text: &Text<'_>, width: usize) -> String {
    let mut out = String::new();
    for line in &text.lines {
        let raw: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        let raw = raw.trim_end();
        if raw.is_empty() {
            out.push('\n');
            continue;
        }
        let body = raw.trim_start();
        let indent = &raw[..raw.len() - body.len()];
        let options = textwrap::Options::new(width.max(20))
            .initial_indent(indent)
            .subsequent_indent(indent);
        out.push_str(&textwrap::fill(body, options));
        out.push('\n');
    }
    out
}

// Drawing. Everything here reads App state; nothing mutates it except list
// scroll offsets.

use std::time::Instant;

use clap::ValueEnum;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Bar, BarChart, BarGroup, Block, Borders, Clear, List, ListItem, Paragraph, Tabs, Wrap,
    },
    Frame,
};
use serde::Deserialize;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::{App, Focus, Overlay, Tab};
use crate::deck::DeckSession;
use crate::import::ImportLine;
use crate::model::CardDirection;
use crate::session::format_clock;
use crate::stats::{format_study_time, HistorySummary, ProgressSummary};

// ---------------- theme ----------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeKind {
    Dark,
    Light,
}

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub fg: Color,
    pub muted: Color,
    pub accent: Color,
    pub bar_bg: Color,
    pub selection_bg: Color,
    pub good: Color,
    pub warn: Color,
    pub bad: Color,
}

pub fn theme_of(kind: ThemeKind) -> Theme {
    match kind {
        ThemeKind::Dark => Theme {
            fg: Color::Rgb(220, 220, 220),
            muted: Color::Rgb(140, 140, 140),
            accent: Color::Rgb(95, 175, 255),
            bar_bg: Color::Rgb(35, 40, 46),
            selection_bg: Color::Rgb(60, 65, 72),
            good: Color::Rgb(130, 200, 120),
            warn: Color::Rgb(255, 200, 110),
            bad: Color::Rgb(240, 110, 110),
        },
        ThemeKind::Light => Theme {
            fg: Color::Rgb(30, 30, 30),
            muted: Color::Rgb(120, 120, 120),
            accent: Color::Rgb(0, 122, 255),
            bar_bg: Color::Rgb(235, 240, 245),
            selection_bg: Color::Rgb(210, 220, 235),
            good: Color::Rgb(38, 166, 91),
            warn: Color::Rgb(255, 160, 0),
            bad: Color::Rgb(210, 50, 50),
        },
    }
}

/// Card colour presets, keyed by the id stored in `card_colors.front`.
/// Each entry is (id, front, back).
pub const COLOR_PRESETS: [(&str, Color, Color); 6] = [
    ("blue", Color::Rgb(74, 144, 226), Color::Rgb(100, 181, 246)),
    ("green", Color::Rgb(76, 175, 80), Color::Rgb(129, 199, 132)),
    ("orange", Color::Rgb(255, 152, 0), Color::Rgb(255, 183, 77)),
    ("purple", Color::Rgb(156, 39, 176), Color::Rgb(186, 104, 200)),
    ("red", Color::Rgb(244, 67, 54), Color::Rgb(239, 83, 80)),
    ("teal", Color::Rgb(0, 150, 136), Color::Rgb(38, 166, 154)),
];

/// Unknown ids fall back to blue.
pub fn preset_colors(id: &str) -> (Color, Color) {
    let (_, front, back) = COLOR_PRESETS
        .iter()
        .find(|(pid, _, _)| *pid == id)
        .unwrap_or(&COLOR_PRESETS[0]);
    (*front, *back)
}

pub fn next_preset(id: &str) -> &'static str {
    let i = COLOR_PRESETS
        .iter()
        .position(|(pid, _, _)| *pid == id)
        .map_or(0, |i| (i + 1) % COLOR_PRESETS.len());
    COLOR_PRESETS[i].0
}

/// Truncates to `max` terminal columns, marking the cut with an ellipsis.
pub fn fit_width(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

// ---------------- frame ----------------

pub fn ui(f: &mut Frame, app: &mut App) {
    let v = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_header(f, v[0], app);
    draw_tabs(f, v[1], app);
    match app.tab {
        Tab::Manage => draw_manage(f, v[2], app),
        Tab::Cards => draw_deck(f, v[2], app, DeckPane::Cards),
        Tab::Review => draw_deck(f, v[2], app, DeckPane::Review),
        Tab::History => draw_history(f, v[2], app),
        Tab::Settings => draw_settings(f, v[2], app),
    }
    draw_footer(f, v[3], app);

    draw_overlay(f, app);
    if let Some(msg) = app.notices.front() {
        draw_notice(f, app, msg);
    }
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let th = app.theme;
    let notebook = app
        .current_notebook()
        .map(|n| n.name.as_str())
        .unwrap_or("no notebook");
    let mut segs = vec![
        Span::styled(
            " vocadeck ",
            Style::default().fg(th.accent).add_modifier(Modifier::BOLD),
        ),
        Span::styled("| notebook:", Style::default().fg(th.muted)),
        Span::styled(format!(" {notebook} "), Style::default().fg(th.fg)),
        Span::styled("| session:", Style::default().fg(th.muted)),
    ];
    let c = app.tracker.counters();
    if app.tracker.is_active() {
        segs.push(Span::styled(
            format!(" {} ", format_clock(app.tracker.elapsed(Instant::now()))),
            Style::default().fg(th.good),
        ));
    } else {
        segs.push(Span::styled(" off ", Style::default().fg(th.muted)));
    }
    segs.extend([
        Span::styled(format!("✓{} ", c.correct), Style::default().fg(th.good)),
        Span::styled(format!("✗{} ", c.wrong), Style::default().fg(th.bad)),
        Span::styled(
            format!("studied:{} acc:{}%", c.studied, c.accuracy()),
            Style::default().fg(th.fg),
        ),
    ]);
    let para = Paragraph::new(Line::from(segs)).style(Style::default().bg(th.bar_bg).fg(th.fg));
    f.render_widget(para, area);
}

fn draw_tabs(f: &mut Frame, area: Rect, app: &App) {
    let th = app.theme;
    let titles = Tab::ALL
        .iter()
        .enumerate()
        .map(|(i, t)| Line::from(format!("{} {}", i + 1, t.title())));
    let tabs = Tabs::new(titles)
        .select(app.tab.index())
        .style(Style::default().fg(th.muted))
        .highlight_style(Style::default().fg(th.accent).add_modifier(Modifier::BOLD))
        .divider("│");
    f.render_widget(tabs, area);
}

fn draw_footer(f: &mut Frame, area: Rect, app: &App) {
    let th = app.theme;
    if let Some(status) = &app.status {
        let para = Paragraph::new(Span::styled(format!(" {status}"), Style::default().fg(th.good)))
            .style(Style::default().bg(th.bar_bg));
        f.render_widget(para, area);
        return;
    }
    let tips = match app.tab {
        Tab::Manage => " [←/→]pane [j/k]move [Enter]open [a/e/D]word add/edit/del [N/E/X]notebook [i]import [/]search [R]reload [q]quit",
        Tab::Cards | Tab::Review => " [space]flip [h/l]prev/next [c/x]correct/wrong [m]mastered [d]direction [o]order [r]reset [s/S]session start/end",
        Tab::History => " [←/→ or [ ]]window [R]reload [Tab]switch [q]quit",
        Tab::Settings => " [j/k]field [Enter]change [w]save [P]reset progress [Tab]switch [q]quit",
    };
    let help = Paragraph::new(Span::styled(tips, Style::default().fg(th.muted)))
        .style(Style::default().bg(th.bar_bg));
    f.render_widget(help, area);
}

// ---------------- manage ----------------

fn draw_manage(f: &mut Frame, area: Rect, app: &mut App) {
    let th = app.theme;
    let h = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(area);

    let border = |focused: bool| {
        Style::default().fg(if focused { th.accent } else { th.muted })
    };

    let items: Vec<ListItem> = app
        .notebooks
        .iter()
        .map(|n| {
            let mark = if app.notebook == Some(n.id) { "● " } else { "  " };
            ListItem::new(Line::from(vec![
                Span::styled(mark, Style::default().fg(th.accent)),
                Span::styled(
                    fit_width(&n.name, h[0].width.saturating_sub(5) as usize),
                    Style::default().fg(th.fg),
                ),
            ]))
        })
        .collect();
    let list = List::new(items)
        .block(
            Block::default()
                .title(" Notebooks ")
                .borders(Borders::ALL)
                .border_style(border(app.focus == Focus::Notebooks)),
        )
        .highlight_style(Style::default().bg(th.selection_bg));
    f.render_stateful_widget(list, h[0], &mut app.notebook_state);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(h[1]);
    let word_w = (right[0].width as usize / 3).max(8);
    let meaning_w = (right[0].width as usize).saturating_sub(word_w + 20).max(8);
    let items: Vec<ListItem> = app
        .cards
        .words()
        .iter()
        .map(|w| {
            let word = fit_width(&w.word, word_w);
            let pad = word_w.saturating_sub(word.width());
            ListItem::new(Line::from(vec![
                Span::styled(
                    if w.mastered { "★ " } else { "  " },
                    Style::default().fg(th.warn),
                ),
                Span::styled(format!("{word}{} ", " ".repeat(pad)), Style::default().fg(th.fg)),
                Span::styled(fit_width(&w.meaning, meaning_w), Style::default().fg(th.muted)),
                Span::styled(format!("  ✓{}", w.correct_count), Style::default().fg(th.good)),
                Span::styled(format!(" ✗{}", w.wrong_count), Style::default().fg(th.bad)),
            ]))
        })
        .collect();
    let title = format!(" Words ({}) ", app.cards.words().len());
    let list = List::new(items)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(border(app.focus == Focus::Words)),
        )
        .highlight_style(Style::default().bg(th.selection_bg));
    f.render_stateful_widget(list, right[0], &mut app.word_state);

    draw_progress(f, right[1], app, &ProgressSummary::of(app.cards.words()));
}

fn draw_progress(f: &mut Frame, area: Rect, app: &App, s: &ProgressSummary) {
    let th = app.theme;
    let line = Line::from(vec![
        Span::styled(" total ", Style::default().fg(th.muted)),
        Span::styled(s.total.to_string(), Style::default().fg(th.fg)),
        Span::styled("  mastered ", Style::default().fg(th.muted)),
        Span::styled(
            format!("{} ({}%)", s.mastered, s.mastery_rate()),
            Style::default().fg(th.warn),
        ),
        Span::styled("  correct ", Style::default().fg(th.muted)),
        Span::styled(s.correct.to_string(), Style::default().fg(th.good)),
        Span::styled("  wrong ", Style::default().fg(th.muted)),
        Span::styled(s.wrong.to_string(), Style::default().fg(th.bad)),
        Span::styled("  accuracy ", Style::default().fg(th.muted)),
        Span::styled(format!("{}%", s.accuracy()), Style::default().fg(th.fg)),
    ]);
    let para = Paragraph::new(line).block(
        Block::default()
            .title(" Progress ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(th.muted)),
    );
    f.render_widget(para, area);
}

// ---------------- cards ----------------

#[derive(Clone, Copy)]
enum DeckPane {
    Cards,
    Review,
}

fn draw_deck(f: &mut Frame, area: Rect, app: &App, pane: DeckPane) {
    let th = app.theme;
    let deck: &DeckSession = match pane {
        DeckPane::Cards => &app.cards,
        DeckPane::Review => &app.review,
    };
    let v = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(area);

    draw_progress(f, v[0], app, &ProgressSummary::of(deck.words()));

    let Some(word) = deck.current() else {
        let msg = match pane {
            DeckPane::Cards if deck.words().is_empty() => "No words yet. Add some on the Manage tab.",
            DeckPane::Cards => "Every word is mastered. Turn off \"exclude mastered\" to keep studying.",
            DeckPane::Review => "No words answered wrong yet.",
        };
        let para = Paragraph::new(Span::styled(msg, Style::default().fg(th.muted)))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(th.muted)));
        f.render_widget(para, v[1]);
        return;
    };

    let (front, back) = match deck.direction() {
        CardDirection::WordToMeaning => (&word.word, &word.meaning),
        CardDirection::MeaningToWord => (&word.meaning, &word.word),
    };
    let (front_bg, back_bg) = preset_colors(&app.settings.card_colors.front);
    let flipped = deck.is_flipped();
    let (text, bg, side) = if flipped {
        (back, back_bg, "answer")
    } else {
        (front, front_bg, "question")
    };
    let pos = deck.cursor().map_or(0, |i| i + 1);
    let title = format!(
        " {}/{} · {} · {}{} ",
        pos,
        deck.len(),
        deck.direction().label(),
        deck.policy().order.as_str(),
        if deck.policy().exclude_mastered {
            " · mastered hidden"
        } else {
            ""
        }
    );

    let card = centered_rect(70, 70, v[1]);
    let block = Block::default()
        .title(Span::styled(title, Style::default().fg(Color::White)))
        .borders(Borders::ALL)
        .style(Style::default().bg(bg).fg(Color::White));
    let inner_h = card.height.saturating_sub(2) as usize;
    let max_w = card.width.saturating_sub(4) as usize;
    let mut lines: Vec<Line> = Vec::new();
    for _ in 0..inner_h.saturating_sub(3) / 2 {
        lines.push(Line::raw(""));
    }
    lines.push(Line::from(Span::styled(
        fit_width(text, max_w),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::raw(""));
    let mut tail = vec![Span::raw(format!("({side})"))];
    if word.mastered {
        tail.push(Span::raw("  ★ mastered"));
    }
    lines.push(Line::from(tail));
    let para = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(block);
    f.render_widget(Clear, card);
    f.render_widget(para, card);

    let hint = if flipped {
        Line::from(vec![
            Span::styled("[c] correct  ", Style::default().fg(th.good)),
            Span::styled("[x] wrong  ", Style::default().fg(th.bad)),
            Span::styled(
                if word.mastered { "[m] unmark mastered" } else { "[m] mastered" },
                Style::default().fg(th.warn),
            ),
        ])
    } else {
        Line::from(Span::styled(
            "[space/Enter] show answer   [h/l] previous/next",
            Style::default().fg(th.muted),
        ))
    };
    f.render_widget(Paragraph::new(hint).alignment(Alignment::Center), v[2]);
}

// ---------------- history ----------------

fn draw_history(f: &mut Frame, area: Rect, app: &App) {
    let th = app.theme;
    let v = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Percentage(55),
            Constraint::Min(3),
        ])
        .split(area);

    let sum = HistorySummary::of(&app.history);
    let line = Line::from(vec![
        Span::styled(
            format!(" last {} days ", app.history_days()),
            Style::default().fg(th.accent).add_modifier(Modifier::BOLD),
        ),
        Span::styled(" days studied ", Style::default().fg(th.muted)),
        Span::styled(sum.days_studied.to_string(), Style::default().fg(th.fg)),
        Span::styled("  time ", Style::default().fg(th.muted)),
        Span::styled(format_study_time(sum.study_time_seconds), Style::default().fg(th.fg)),
        Span::styled("  words ", Style::default().fg(th.muted)),
        Span::styled(sum.words_studied.to_string(), Style::default().fg(th.fg)),
        Span::styled("  avg accuracy ", Style::default().fg(th.muted)),
        Span::styled(format!("{:.1}%", sum.average_accuracy), Style::default().fg(th.good)),
    ]);
    f.render_widget(
        Paragraph::new(line).block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(th.muted))),
        v[0],
    );

    let bars: Vec<Bar> = app
        .history
        .iter()
        .map(|d| {
            Bar::default()
                .value(u64::from(d.words_studied))
                .label(Line::from(d.date.format("%m-%d").to_string()))
        })
        .collect();
    let chart = BarChart::default()
        .block(
            Block::default()
                .title(" Words studied per day ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(th.muted)),
        )
        .data(BarGroup::default().bars(&bars))
        .bar_width(5)
        .bar_gap(1)
        .bar_style(Style::default().fg(th.accent))
        .value_style(Style::default().fg(th.bar_bg).bg(th.accent));
    f.render_widget(chart, v[1]);

    let rows: Vec<Line> = app
        .history
        .iter()
        .rev()
        .map(|d| {
            Line::from(vec![
                Span::styled(format!(" {}  ", d.date), Style::default().fg(th.fg)),
                Span::styled(
                    format!("{:>7}  ", format_study_time(d.study_time_seconds)),
                    Style::default().fg(th.muted),
                ),
                Span::styled(format!("{:>4} words  ", d.words_studied), Style::default().fg(th.fg)),
                Span::styled(format!("✓{:<4}", d.correct_count), Style::default().fg(th.good)),
                Span::styled(format!("✗{:<4}", d.wrong_count), Style::default().fg(th.bad)),
                Span::styled(format!("{:.1}%", d.accuracy_rate), Style::default().fg(th.fg)),
            ])
        })
        .collect();
    let body = if rows.is_empty() {
        vec![Line::from(Span::styled(" no study sessions in this window", Style::default().fg(th.muted)))]
    } else {
        rows
    };
    f.render_widget(
        Paragraph::new(body).block(
            Block::default()
                .title(" Daily ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(th.muted)),
        ),
        v[2],
    );
}

// ---------------- settings ----------------

fn draw_settings(f: &mut Frame, area: Rect, app: &App) {
    let th = app.theme;
    let d = &app.settings_draft;
    let (front, back) = preset_colors(&d.card_colors.front);
    let fields: [(&str, Vec<Span>); 4] = [
        (
            "Exclude mastered",
            vec![Span::raw(if d.exclude_mastered { "yes" } else { "no" })],
        ),
        ("Default direction", vec![Span::raw(d.default_direction.label())]),
        ("Default order", vec![Span::raw(d.default_order.as_str())]),
        (
            "Card colours",
            vec![
                Span::raw(format!("{} ", d.card_colors.front)),
                Span::styled("  front  ", Style::default().bg(front).fg(Color::White)),
                Span::styled("  back  ", Style::default().bg(back).fg(Color::White)),
            ],
        ),
    ];
    let mut lines = vec![Line::raw("")];
    for (i, (label, value)) in fields.into_iter().enumerate() {
        let selected = i == app.settings_field;
        let mut spans = vec![
            Span::styled(
                if selected { " ▶ " } else { "   " },
                Style::default().fg(th.accent),
            ),
            Span::styled(format!("{label:<20}"), Style::default().fg(th.muted)),
        ];
        spans.extend(value);
        let style = if selected {
            Style::default().bg(th.selection_bg).fg(th.fg)
        } else {
            Style::default().fg(th.fg)
        };
        lines.push(Line::from(spans).style(style));
    }
    lines.push(Line::raw(""));
    if app.settings_draft != app.settings {
        lines.push(Line::from(Span::styled(
            "   unsaved changes, press [w] to save",
            Style::default().fg(th.warn),
        )));
    }
    let title = match app.current_notebook() {
        Some(nb) => format!(" Settings · {} ", nb.name),
        None => " Settings ".to_string(),
    };
    let para = Paragraph::new(lines).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(th.muted)),
    );
    f.render_widget(para, area);
}

// ---------------- overlays ----------------

fn draw_overlay(f: &mut Frame, app: &mut App) {
    let th = app.theme;
    let Some(overlay) = app.overlay.as_mut() else {
        return;
    };
    match overlay {
        Overlay::Prompt(p) => {
            let area = fixed_height_rect(60, 3, f.area());
            f.render_widget(Clear, area);
            let block = Block::default()
                .title(Span::styled(p.title(), Style::default().fg(th.accent)))
                .title_bottom(Span::styled(" Enter ok · Esc cancel ", Style::default().fg(th.muted)))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(th.muted));
            let chars: Vec<char> = p.buffer.chars().collect();
            let a = p.cursor.min(chars.len());
            let left: String = chars[..a].iter().collect();
            let right: String = chars[a..].iter().collect();
            let line = Line::from(vec![
                Span::raw(left),
                Span::styled("▏", Style::default().fg(th.accent)),
                Span::raw(right),
            ]);
            f.render_widget(Paragraph::new(line).block(block), area);
        }
        Overlay::Confirm(c) => {
            let area = fixed_height_rect(50, 5, f.area());
            f.render_widget(Clear, area);
            let lines = vec![
                Line::from(Span::styled(c.message.as_str(), Style::default().fg(th.fg))),
                Line::raw(""),
                Line::from(Span::styled("[y] yes   [n] no", Style::default().fg(th.muted))),
            ];
            let para = Paragraph::new(lines)
                .wrap(Wrap { trim: true })
                .alignment(Alignment::Center)
                .block(
                    Block::default()
                        .title(Span::styled(" Confirm ", Style::default().fg(th.warn)))
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(th.warn)),
                );
            f.render_widget(para, area);
        }
        Overlay::Import(draft) => {
            let area = centered_rect(80, 80, f.area());
            f.render_widget(Clear, area);
            let v = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(area);
            let title = if draft.submitting {
                " Import · sending… "
            } else {
                " Import · one \"- word: meaning\" per line · Ctrl+S import · Esc cancel "
            };
            let block = Block::default()
                .title(Span::styled(title, Style::default().fg(th.accent)))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(th.muted));
            let inner = block.inner(v[0]);
            f.render_widget(block, v[0]);
            f.render_widget(&draft.textarea, inner);

            let p = &draft.preview;
            let mut lines = vec![Line::from(vec![
                Span::styled(format!(" ✓ {} valid  ", p.valid_count()), Style::default().fg(th.good)),
                Span::styled(format!("✗ {} invalid", p.invalid_count()), Style::default().fg(th.bad)),
            ])];
            for l in &p.lines {
                if let ImportLine::Invalid { line, text, reason } = l {
                    lines.push(Line::from(vec![
                        Span::styled(format!(" line {line}: "), Style::default().fg(th.muted)),
                        Span::styled(text.as_str(), Style::default().fg(th.fg)),
                        Span::styled(format!("  ({})", reason.as_str()), Style::default().fg(th.bad)),
                    ]));
                }
            }
            f.render_widget(
                Paragraph::new(lines).block(
                    Block::default()
                        .title(" Preview ")
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(th.muted)),
                ),
                v[1],
            );
        }
        Overlay::Search(view) => {
            let area = centered_rect(70, 60, f.area());
            f.render_widget(Clear, area);
            let block = Block::default()
                .title(Span::styled(
                    format!(" Search: {} ", view.query),
                    Style::default().fg(th.accent),
                ))
                .title_bottom(Span::styled(" Enter open · Esc close ", Style::default().fg(th.muted)))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(th.muted));
            match &view.hits {
                None => f.render_widget(
                    Paragraph::new(Span::styled(" searching…", Style::default().fg(th.muted))).block(block),
                    area,
                ),
                Some(hits) if hits.is_empty() => f.render_widget(
                    Paragraph::new(Span::styled(" no matches", Style::default().fg(th.muted))).block(block),
                    area,
                ),
                Some(hits) => {
                    let items: Vec<ListItem> = hits
                        .iter()
                        .map(|h| {
                            ListItem::new(Line::from(vec![
                                Span::styled(
                                    if h.mastered { "★ " } else { "  " },
                                    Style::default().fg(th.warn),
                                ),
                                Span::styled(format!("{}  ", h.word), Style::default().fg(th.fg)),
                                Span::styled(h.meaning.as_str(), Style::default().fg(th.muted)),
                                Span::styled(format!("  [{}]", h.notebook_name), Style::default().fg(th.accent)),
                                Span::styled(
                                    format!("  ✓{} ✗{}", h.correct_count, h.wrong_count),
                                    Style::default().fg(th.muted),
                                ),
                            ]))
                        })
                        .collect();
                    let list = List::new(items)
                        .block(block)
                        .highlight_style(Style::default().bg(th.selection_bg));
                    f.render_stateful_widget(list, area, &mut view.state);
                }
            }
        }
    }
}

fn draw_notice(f: &mut Frame, app: &App, msg: &str) {
    let th = app.theme;
    let area = fixed_height_rect(60, 6, f.area());
    f.render_widget(Clear, area);
    let more = app.notices.len().saturating_sub(1);
    let footer = if more > 0 {
        format!(" Enter ok · {more} more ")
    } else {
        " Enter ok ".to_string()
    };
    let para = Paragraph::new(Span::styled(msg, Style::default().fg(th.fg)))
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title(Span::styled(" Error ", Style::default().fg(th.bad).add_modifier(Modifier::BOLD)))
                .title_bottom(Span::styled(footer, Style::default().fg(th.muted)))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(th.bad)),
        );
    f.render_widget(para, area);
}

pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vert[1]);
    horiz[1]
}

fn fixed_height_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let h = height.min(r.height);
    let row = Rect {
        y: r.y + (r.height - h) / 2,
        height: h,
        ..r
    };
    centered_rect(percent_x, 100, row)
}

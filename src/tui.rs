use anyhow::Result;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io::stdout;

use crate::catalog::{apply_filters, job_types, locations};
use crate::models::{FilterCriteria, JobListingEntry};

struct BrowseState {
    all_entries: Vec<JobListingEntry>,
    filtered: Vec<JobListingEntry>,
    criteria: FilterCriteria,
    job_types: Vec<String>,
    locations: Vec<String>,
    // 0 selects "all"; 1.. index into the distinct lists.
    type_index: usize,
    location_index: usize,
    selected: usize,
    scroll_offset: u16,
    searching: bool,
}

impl BrowseState {
    fn new(entries: Vec<JobListingEntry>, criteria: FilterCriteria) -> Self {
        let job_types = job_types(&entries);
        let locations = locations(&entries);
        let type_index = position_of(&job_types, &criteria.job_type);
        let location_index = position_of(&locations, &criteria.location);
        let mut state = Self {
            filtered: Vec::new(),
            all_entries: entries,
            criteria,
            job_types,
            locations,
            type_index,
            location_index,
            selected: 0,
            scroll_offset: 0,
            searching: false,
        };
        state.refilter();
        state
    }

    fn current_entry(&self) -> Option<&JobListingEntry> {
        self.filtered.get(self.selected)
    }

    /// Recomputed whenever any criterion changes.
    fn refilter(&mut self) {
        self.filtered = apply_filters(&self.all_entries, &self.criteria);
        if self.selected >= self.filtered.len() {
            self.selected = self.filtered.len().saturating_sub(1);
        }
        self.scroll_offset = 0;
    }

    fn cycle_job_type(&mut self) {
        self.type_index = (self.type_index + 1) % (self.job_types.len() + 1);
        self.criteria.job_type = option_at(&self.job_types, self.type_index);
        self.refilter();
    }

    fn cycle_location(&mut self) {
        self.location_index = (self.location_index + 1) % (self.locations.len() + 1);
        self.criteria.location = option_at(&self.locations, self.location_index);
        self.refilter();
    }

    fn clear_filters(&mut self) {
        self.criteria = FilterCriteria::reset();
        self.type_index = 0;
        self.location_index = 0;
        self.refilter();
    }

    fn push_search(&mut self, c: char) {
        self.criteria.search_term.push(c);
        self.refilter();
    }

    fn pop_search(&mut self) {
        self.criteria.search_term.pop();
        self.refilter();
    }

    fn next(&mut self) {
        if !self.filtered.is_empty() && self.selected < self.filtered.len() - 1 {
            self.selected += 1;
            self.scroll_offset = 0;
        }
    }

    fn prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.scroll_offset = 0;
        }
    }

    fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_add(3);
    }

    fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(3);
    }
}

fn position_of(values: &[String], current: &str) -> usize {
    if current.is_empty() || current == "all" {
        return 0;
    }
    values.iter().position(|v| v == current).map_or(0, |i| i + 1)
}

fn option_at(values: &[String], index: usize) -> String {
    if index == 0 {
        String::new()
    } else {
        values[index - 1].clone()
    }
}

pub fn run_browse(entries: Vec<JobListingEntry>, criteria: FilterCriteria) -> Result<()> {
    if entries.is_empty() {
        println!("No jobs in the catalog.");
        return Ok(());
    }

    let mut state = BrowseState::new(entries, criteria);

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut state);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut BrowseState,
) -> Result<()> {
    let mut list_state = ListState::default();
    list_state.select(Some(0));

    loop {
        terminal.draw(|frame| draw(frame, state, &mut list_state))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }

            if state.searching {
                match key.code {
                    KeyCode::Esc | KeyCode::Enter => state.searching = false,
                    KeyCode::Backspace => state.pop_search(),
                    KeyCode::Char(c) => state.push_search(c),
                    _ => {}
                }
                list_state.select(Some(state.selected));
                continue;
            }

            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Char('/') => state.searching = true,
                KeyCode::Down | KeyCode::Char('j') => state.next(),
                KeyCode::Up | KeyCode::Char('k') => state.prev(),
                KeyCode::Char('J') | KeyCode::PageDown => state.scroll_down(),
                KeyCode::Char('K') | KeyCode::PageUp => state.scroll_up(),
                KeyCode::Char('t') => state.cycle_job_type(),
                KeyCode::Char('l') => state.cycle_location(),
                KeyCode::Char('c') => state.clear_filters(),
                _ => {}
            }
            list_state.select(Some(state.selected));
        }
    }
    Ok(())
}

fn draw(frame: &mut Frame, state: &BrowseState, list_state: &mut ListState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    // Filter bar
    let type_label = if state.criteria.job_type.is_empty() {
        "all"
    } else {
        state.criteria.job_type.as_str()
    };
    let location_label = if state.criteria.location.is_empty() {
        "all"
    } else {
        state.criteria.location.as_str()
    };
    let cursor = if state.searching { "_" } else { "" };
    let filter_bar = Paragraph::new(format!(
        " search: {}{}   type: {}   location: {}",
        state.criteria.search_term, cursor, type_label, location_label
    ))
    .block(Block::default().borders(Borders::ALL).title(" Filters "));
    frame.render_widget(filter_bar, rows[0]);

    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[1]);

    // Left panel: filtered listings
    let items: Vec<ListItem> = state
        .filtered
        .iter()
        .map(|entry| {
            let title = if entry.job.title.len() > 30 {
                format!("{}...", &entry.job.title[..27])
            } else {
                entry.job.title.clone()
            };
            ListItem::new(format!("{} | {}", title, entry.company_name))
        })
        .collect();

    let found = state.filtered.len();
    let noun = if found == 1 { "Job" } else { "Jobs" };
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(format!(
            " {} {} Found ",
            found, noun
        )))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, panels[0], list_state);

    // Right panel: job detail
    let detail = build_detail(state, panels[1].width.saturating_sub(4) as usize);
    let detail_widget = Paragraph::new(detail)
        .block(Block::default().borders(Borders::ALL).title(" Detail "))
        .wrap(Wrap { trim: false })
        .scroll((state.scroll_offset, 0));

    frame.render_widget(detail_widget, panels[1]);

    // Footer help
    let help = Paragraph::new(if state.searching {
        " type to search  Enter/Esc:done"
    } else {
        " j/k:navigate  J/K:scroll  /:search  t:job type  l:location  c:clear  q:quit"
    })
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, rows[2]);
}

fn build_detail(state: &BrowseState, width: usize) -> Text<'_> {
    let Some(entry) = state.current_entry() else {
        return Text::raw("No jobs found matching your criteria.\nTry adjusting your search terms or filters (c clears them).");
    };

    let wrap_width = width.clamp(20, 80);
    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(Span::styled(
        &entry.job.title,
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(format!("at {}", entry.company_name)));
    lines.push(Line::from(""));
    lines.push(Line::from(format!("Location: {}", entry.job.location)));
    lines.push(Line::from(format!("Type: {}", entry.job.job_type)));
    lines.push(Line::from(format!("Salary: {}", entry.job.salary)));
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled(
        "Description",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for line in textwrap::fill(&entry.job.description, wrap_width).lines() {
        lines.push(Line::from(line.to_string()));
    }
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled(
        "Requirements",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for requirement in &entry.job.requirements {
        for (i, line) in textwrap::fill(requirement, wrap_width.saturating_sub(2)).lines().enumerate() {
            if i == 0 {
                lines.push(Line::from(format!("- {}", line)));
            } else {
                lines.push(Line::from(format!("  {}", line)));
            }
        }
    }
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled(
        format!("Apply: {}", entry.company_website),
        Style::default().fg(Color::Cyan),
    )));

    Text::from(lines)
}

//! Subcommand implementations
//!
//! Each command writes its user-facing output to the given writer; logs go
//! to stderr through tracing.

use std::collections::BTreeMap;
use std::io::Write;

use anyhow::{bail, Context, Result};
use annotation_core::{HighlightStore, ReaderSession};
use elibrary_client::{ApiClient, Credentials};
use reader_types::{
    Highlight, HighlightId, ProgressUpdate, ReadingProgress, RecordId, SessionUpdate, StreakStats,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Markdown,
    Json,
}

pub async fn login(client: &ApiClient, email: String, password: String, out: &mut impl Write) -> Result<()> {
    let user = client
        .login(&Credentials { email, password })
        .await
        .context("Sign-in failed")?;
    writeln!(out, "Signed in as {}", user.display_name())?;
    Ok(())
}

pub async fn logout(client: &ApiClient, out: &mut impl Write) -> Result<()> {
    if let Err(e) = client.logout().await {
        tracing::warn!(error = %e, "Server did not acknowledge logout");
    }
    writeln!(out, "Signed out")?;
    Ok(())
}

pub async fn whoami(client: &ApiClient, out: &mut impl Write) -> Result<()> {
    let user = client.profile().await.context("Failed to fetch profile")?;
    writeln!(out, "{} <{}>", user.display_name(), user.email)?;
    if let Some(role) = &user.role {
        writeln!(out, "role: {}", role)?;
    }
    Ok(())
}

pub async fn list_highlights(client: &ApiClient, book_id: &str, out: &mut impl Write) -> Result<()> {
    let mut reader = ReaderSession::new(book_id, 1);
    let count = reader
        .load(client)
        .await
        .with_context(|| format!("Failed to load highlights for book {}", book_id))?;
    if count == 0 {
        writeln!(out, "No highlights")?;
        return Ok(());
    }
    for h in sorted(reader.highlights()) {
        writeln!(
            out,
            "{:>6}  p.{:<4} {:<18} {}",
            h.id,
            h.page_number,
            h.color.to_wire(),
            excerpt(&h.text_content, 60)
        )?;
    }
    Ok(())
}

pub async fn export_highlights(
    client: &ApiClient,
    book_id: &str,
    format: ExportFormat,
    out: &mut impl Write,
) -> Result<()> {
    let highlights = client
        .list(book_id)
        .await
        .with_context(|| format!("Failed to load highlights for book {}", book_id))?;
    let rendered = match format {
        ExportFormat::Markdown => render_markdown(book_id, &highlights),
        ExportFormat::Json => serde_json::to_string_pretty(&sorted(&highlights))?,
    };
    writeln!(out, "{}", rendered)?;
    Ok(())
}

pub async fn delete_highlight(
    client: &ApiClient,
    book_id: &str,
    id: &str,
    out: &mut impl Write,
) -> Result<()> {
    let mut reader = ReaderSession::new(book_id, 1);
    reader.load(client).await?;
    let id = HighlightId::from(id);
    if reader.highlights().iter().all(|h| h.id != id) {
        bail!("Book {} has no highlight {}", book_id, id);
    }
    reader.remove(&id, client).await?;
    writeln!(out, "Removed highlight {}", id)?;
    Ok(())
}

pub async fn show_progress(client: &ApiClient, book_id: &str, out: &mut impl Write) -> Result<()> {
    let progress = client.progress(book_id).await?;
    writeln!(out, "{}", describe_progress(&progress))?;
    Ok(())
}

pub async fn set_progress(
    client: &ApiClient,
    book_id: &str,
    page: u32,
    total_pages: Option<u32>,
    out: &mut impl Write,
) -> Result<()> {
    if page == 0 {
        bail!("Pages are numbered from 1");
    }
    let progress = client
        .update_progress(
            book_id,
            &ProgressUpdate {
                current_page: page,
                total_pages,
            },
        )
        .await?;
    writeln!(out, "{}", describe_progress(&progress))?;
    Ok(())
}

pub async fn start_session(client: &ApiClient, book_id: &str, out: &mut impl Write) -> Result<()> {
    let session = client.active_session(book_id).await?;
    writeln!(
        out,
        "Session {} at page {}",
        session.id,
        session.current_page.or(session.start_page).unwrap_or(1)
    )?;
    Ok(())
}

pub async fn update_session(
    client: &ApiClient,
    session_id: &str,
    page: u32,
    pages_read: Option<u32>,
    out: &mut impl Write,
) -> Result<()> {
    let session = client
        .update_session(
            &RecordId::from(session_id),
            &SessionUpdate {
                current_page: page,
                pages_read,
            },
        )
        .await?;
    writeln!(out, "Session {} at page {}", session.id, page)?;
    Ok(())
}

pub async fn end_session(client: &ApiClient, session_id: &str, out: &mut impl Write) -> Result<()> {
    let session = client.end_session(&RecordId::from(session_id)).await?;
    match session.pages_read {
        Some(pages) => writeln!(out, "Session {} ended, {} pages read", session.id, pages)?,
        None => writeln!(out, "Session {} ended", session.id)?,
    }
    Ok(())
}

pub async fn show_streak(client: &ApiClient, period: &str, out: &mut impl Write) -> Result<()> {
    let dashboard = client
        .dashboard(period)
        .await
        .context("Failed to load the reading dashboard")?;
    write!(out, "{}", describe_streak(&dashboard.stats))?;
    Ok(())
}

fn days(n: u32) -> String {
    if n == 1 {
        "1 day".to_string()
    } else {
        format!("{} days", n)
    }
}

/// Streak counters followed by the reading days, one per line
pub fn describe_streak(stats: &StreakStats) -> String {
    let mut text = format!(
        "Current streak: {}
Longest streak: {}
",
        days(stats.current_streak_days),
        days(stats.longest_streak_days)
    );
    let reading_days = stats.reading_days();
    if reading_days.is_empty() {
        text.push_str("No reading days in this period
");
        return text;
    }
    text.push_str("Read on:
");
    for day in reading_days {
        text.push_str(&format!("  {}
", day.format("%a %Y-%m-%d")));
    }
    text
}

fn sorted(highlights: &[Highlight]) -> Vec<&Highlight> {
    let mut sorted: Vec<&Highlight> = highlights.iter().collect();
    sorted.sort_by_key(|h| h.page_number);
    sorted
}

fn excerpt(text: &str, max_chars: usize) -> String {
    let line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if line.chars().count() <= max_chars {
        return line;
    }
    let cut: String = line.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", cut.trim_end())
}

pub fn describe_progress(progress: &ReadingProgress) -> String {
    let pages = match progress.total_pages {
        Some(total) => format!("page {} of {}", progress.current_page, total),
        None => format!("page {}", progress.current_page),
    };
    let mut line = match progress.percent() {
        Some(percent) => format!("{} ({:.0}%)", pages, percent),
        None => pages,
    };
    if progress.is_completed {
        line.push_str(", completed");
    }
    line
}

/// Highlights grouped under one heading per page, in page order
pub fn render_markdown(book_id: &str, highlights: &[Highlight]) -> String {
    let mut by_page: BTreeMap<u32, Vec<&Highlight>> = BTreeMap::new();
    for h in highlights {
        by_page.entry(h.page_number).or_default().push(h);
    }

    let mut doc = format!("# Highlights for book {}\n", book_id);
    if by_page.is_empty() {
        doc.push_str("\n_No highlights._\n");
        return doc;
    }
    for (page, items) in by_page {
        doc.push_str(&format!("\n## Page {}\n\n", page));
        for h in items {
            let text = h.text_content.split_whitespace().collect::<Vec<_>>().join(" ");
            if h.color.is_underline() {
                doc.push_str(&format!("- _{}_ ({})\n", text, h.color.color.label()));
            } else {
                doc.push_str(&format!("- {} ({})\n", text, h.color.color.label()));
            }
        }
    }
    doc
}

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::ticket::Ticket;

pub const PAGE_SIZE: usize = 10;

#[derive(Debug, Default, Clone)]
pub struct ListQuery {
    pub search: Option<String>,
    /// 1-based. `None` returns every matching ticket.
    pub page: Option<usize>
}

/// Case-insensitive substring match on the subject or the owner's name.
pub fn matches_search(ticket: &Ticket, term: &str) -> bool {
    let needle = term.trim().to_lowercase();
    needle.is_empty()
        || ticket.subject.to_lowercase().contains(&needle)
        || ticket.user_name.to_lowercase().contains(&needle)
}

pub fn page_count(total: usize) -> usize {
    (total + PAGE_SIZE - 1) / PAGE_SIZE
}

pub fn page_slice<T>(items: &[T], page: usize) -> &[T] {
    let start = page.saturating_sub(1).saturating_mul(PAGE_SIZE);
    if start >= items.len() {
        return &[];
    }
    let end = (start + PAGE_SIZE).min(items.len());
    &items[start..end]
}

/// Largest whole unit elapsed, e.g. `3 days ago` or `1 minute ago`.
pub fn time_ago(since: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - since).num_seconds().max(0);
    let (amount, unit) = if seconds >= 86_400 {
        (seconds / 86_400, "day")
    } else if seconds >= 3_600 {
        (seconds / 3_600, "hour")
    } else if seconds >= 60 {
        (seconds / 60, "minute")
    } else {
        (seconds, "second")
    };

    if amount == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", amount, unit)
    }
}

pub fn last_reply(ticket: &Ticket, now: DateTime<Utc>) -> String {
    match ticket.last_reply_at() {
        Some(at) => time_ago(at, now),
        None => String::from("N/A")
    }
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TicketRow {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub last_reply: String
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TicketPage {
    pub tickets: Vec<TicketRow>,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    pub total_pages: usize
}

impl TicketPage {
    pub fn build(tickets: Vec<Ticket>, query: &ListQuery, now: DateTime<Utc>) -> TicketPage {
        let term = query.search.as_deref().unwrap_or("");
        let filtered: Vec<Ticket> = tickets
            .into_iter()
            .filter(|ticket| matches_search(ticket, term))
            .collect();
        let total = filtered.len();
        let page = query.page.map(|page| page.max(1));

        let visible = match page {
            Some(page) => page_slice(&filtered, page).to_vec(),
            None => filtered
        };

        TicketPage {
            tickets: visible
                .into_iter()
                .map(|ticket| TicketRow {
                    last_reply: last_reply(&ticket, now),
                    ticket
                })
                .collect(),
            total,
            page,
            total_pages: page_count(total)
        }
    }
}

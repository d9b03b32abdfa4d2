//! Recipient-reason aggregation.
//!
//! A [`ReasonTable`] maps each recipient address to the reasons it should be
//! notified. Accumulation order is preserved per address; deduplication and
//! alphabetical sorting of reasons happen only when the table is rendered
//! into email tasks, one per unique address in sorted-address order.

use std::collections::{BTreeMap, BTreeSet};

use herald_common::types::EmailTask;

/// Mapping from recipient address to the reasons collected for it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReasonTable {
    entries: BTreeMap<String, Vec<String>>,
}

impl ReasonTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `reason` for each address, creating entries as needed.
    ///
    /// Categories are non-exclusive: an address appearing in several
    /// accumulation calls collects every contributed reason.
    pub fn accumulate(&mut self, addresses: &[String], reason: &str) {
        for addr in addresses {
            self.entries
                .entry(addr.clone())
                .or_default()
                .push(reason.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All addresses in the table, sorted.
    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Reasons collected so far for one address, in accumulation order.
    pub fn reasons(&self, addr: &str) -> Option<&[String]> {
        self.entries.get(addr).map(Vec::as_slice)
    }

    /// Render one email task per unique recipient, in sorted-address order.
    ///
    /// `may_reply` holds the addresses allowed to reply to the triggering
    /// user (registered users who can create features); everyone else gets
    /// no reply-to.
    pub fn into_tasks(
        self,
        email_html: &str,
        subject: &str,
        triggering_user_email: Option<&str>,
        may_reply: &BTreeSet<String>,
        site_url: &str,
    ) -> Vec<EmailTask> {
        self.entries
            .into_iter()
            .map(|(addr, reasons)| {
                let can_reply = may_reply.contains(&addr);
                convert_reasons_to_task(
                    &addr,
                    &reasons,
                    email_html,
                    subject,
                    triggering_user_email,
                    can_reply,
                    site_url,
                )
            })
            .collect()
    }
}

/// Build the email task for one recipient.
///
/// A recipient with zero reasons is a programming error, not an input
/// condition, so this fails loudly.
pub fn convert_reasons_to_task(
    addr: &str,
    reasons: &[String],
    email_html: &str,
    subject: &str,
    triggering_user_email: Option<&str>,
    can_reply: bool,
    site_url: &str,
) -> EmailTask {
    assert!(!reasons.is_empty(), "We are emailing {addr} without any reason");

    let mut footer_lines = vec![
        "<p>You are receiving this email because:</p>".to_string(),
        "<ul>".to_string(),
    ];
    let unique: BTreeSet<&String> = reasons.iter().collect();
    for reason in unique {
        footer_lines.push(format!("<li>{reason}</li>"));
    }
    footer_lines.push("</ul>".to_string());
    footer_lines.push(format!("<p><a href=\"{site_url}settings\">Unsubscribe</a></p>"));

    let html = format!("{email_html}\n\n{}", footer_lines.join("\n"));

    let reply_to = if can_reply {
        triggering_user_email.map(str::to_string)
    } else {
        None
    };

    EmailTask::new(addr.to_string(), subject.to_string(), reply_to, html)
}

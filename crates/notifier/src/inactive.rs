//! Inactivity notices for dormant accounts.

use chrono::{DateTime, Duration, Utc};

use herald_common::types::{AppUser, EmailTask};

/// Users idle this long get a one-time inactivity notice.
pub const INACTIVE_WARN_DAYS: i64 = 180;

/// Emails of users that should be warned about inactivity.
///
/// Site admins and editors are never warned, and users are only warned once.
/// A user with no recorded visit counts as last seen at account creation.
pub fn determine_users_to_notify(users: &[AppUser], now: DateTime<Utc>) -> Vec<String> {
    let inactive_cutoff = now - Duration::days(INACTIVE_WARN_DAYS);

    users
        .iter()
        .filter(|user| !user.is_admin && !user.is_site_editor && !user.notified_inactive)
        .filter(|user| {
            let mut last_visit = user.last_visit.unwrap_or(user.created);
            if user.created > last_visit {
                last_visit = user.created;
            }
            last_visit < inactive_cutoff
        })
        .map(|user| user.email.clone())
        .collect()
}

/// The notice sent to one inactive user.
pub fn build_inactive_email(email: &str, site_url: &str) -> EmailTask {
    let html = format!(
        "<p>Your account has been inactive for over {INACTIVE_WARN_DAYS} days.</p>\n\
         <p>Sign in at <a href=\"{site_url}\">{site_url}</a> to keep receiving\n\
         notifications for the features you follow.</p>\n"
    );

    EmailTask::new(
        email.to_string(),
        format!("Notice of LaunchHerald user inactivity for {email}"),
        None,
        html,
    )
}

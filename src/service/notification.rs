use async_trait::async_trait;

use crate::{errors::ServiceResult, models::Event};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmailOptions {
    pub track_clicks: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub options: EmailOptions,
}

/// Outbound mail collaborator.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, email: &Email) -> ServiceResult<()>;
}

pub fn voting_link(base_url: &str, event: &Event) -> String {
    format!("{}{}/vote", base_url, event.unique_url)
}

/// Invitation mail; links must reach the voting page untouched, so click
/// tracking is off.
pub fn invitation_email(event: &Event, to: &str, base_url: &str) -> Email {
    let link = voting_link(base_url, event);
    let html = format!(
        "<p>You have been invited to <strong>{title}</strong>.</p>\
        <p>When: {date} at {time}<br/>Where: {location}</p>\
        <p>Read the nominated stories and cast your vote here: \
        <a href=\"{link}\">{link}</a></p>",
        title = event.title,
        date = event.date.format("%B %-d, %Y"),
        time = event.time,
        location = event.location,
        link = link,
    );
    Email {
        to: to.to_string(),
        subject: format!("You're invited to {}", event.title),
        html,
        options: EmailOptions { track_clicks: false },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sample_event;
    use uuid::Uuid;

    #[test]
    fn invitation_mentions_title_date_and_voting_link() {
        let event = sample_event(Uuid::new_v4());
        let email = invitation_email(&event, "guest@example.com", "https://acts.example");

        assert_eq!(email.to, "guest@example.com");
        assert!(email.subject.contains(&event.title));
        assert!(email.html.contains("June 1, 2031"));
        assert!(email
            .html
            .contains(&format!("https://acts.example/events/{}/vote", event.id)));
        assert!(!email.options.track_clicks);
    }
}

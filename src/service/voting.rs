use std::collections::{HashMap, HashSet};

use chrono::Utc;
use log::{debug, info, warn};
use uuid::Uuid;

use crate::{
    db::Stores,
    dto::{ResultsDto, StoryResult, VoteDto},
    errors::{ServiceError, ServiceResult},
    models::{normalize_email, Actor, Event, Vote},
    service::event::get_by_id,
};

pub const UNCATEGORIZED: &str = "Uncategorized";
const WINNER: &str = "Winner";
const RUNNER_UP: &str = "Runner-up";

/// Everyone who takes part in an event, by lowercased email: invitees,
/// registered guests and the host, each counted once.
pub async fn participant_emails(event: &Event, stores: &Stores) -> ServiceResult<HashSet<String>> {
    let mut emails: HashSet<String> = event
        .invited_emails
        .iter()
        .map(|e| normalize_email(e))
        .collect();
    for guest in stores.users.find_by_ids(&event.guests).await? {
        emails.insert(normalize_email(&guest.email));
    }
    match stores.users.find_by_id(event.host_id).await? {
        Some(host) => {
            emails.insert(normalize_email(&host.email));
        }
        None => warn!("host {} of event {} not found", event.host_id, event.id),
    }
    Ok(emails)
}

pub async fn submit_vote(
    event_id: Uuid,
    dto: &VoteDto,
    stores: &Stores,
    enforce_eligibility: bool,
) -> ServiceResult<Vote> {
    let event = get_by_id(event_id, stores).await?;
    let voter_email = normalize_email(&dto.voter_email);
    if voter_email.is_empty() {
        return Err(ServiceError::validation("voterEmail is required"));
    }
    if enforce_eligibility && !participant_emails(&event, stores).await?.contains(&voter_email) {
        return Err(ServiceError::forbidden("not invited to vote in this event"));
    }
    if stores.votes.find_one(event_id, &voter_email).await?.is_some() {
        return Err(ServiceError::conflict("already voted"));
    }
    match stores.stories.find_by_id(dto.story_id).await? {
        Some(story) if story.event_id == event_id => {}
        _ => return Err(ServiceError::validation("story does not belong to this event")),
    }

    let vote = Vote {
        id: Uuid::new_v4(),
        event_id,
        story_id: dto.story_id,
        voter_email,
        vote_value: 1,
        created_at: Utc::now(),
    };
    if !stores.votes.insert_if_absent(&vote).await? {
        debug!("concurrent duplicate vote by {} on {}", vote.voter_email, event_id);
        return Err(ServiceError::conflict("already voted"));
    }
    info!("vote recorded on event {} for story {}", event_id, vote.story_id);
    Ok(vote)
}

fn format_percent(part: f64, whole: f64) -> String {
    if whole == 0.0 {
        return "0.00".to_string();
    }
    format!("{:.2}", part / whole * 100.0)
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Ranks the event's stories by votes. Equal vote counts keep story
/// creation order, and the top category on a tie is the one seen first.
pub async fn compute_results(
    event_id: Uuid,
    actor: &Actor,
    stores: &Stores,
) -> ServiceResult<ResultsDto> {
    let event = get_by_id(event_id, stores).await?;
    if !event.is_host(actor.id) && !event.is_guest(actor.id) {
        return Err(ServiceError::forbidden("only the host and guests can see results"));
    }

    let votes = stores.votes.find_by_event_id(event_id).await?;
    let total_votes_cast = votes.len() as u64;
    let mut tally: HashMap<Uuid, u64> = HashMap::new();
    for vote in &votes {
        *tally.entry(vote.story_id).or_insert(0) += vote.vote_value.max(0) as u64;
    }

    let stories = stores.stories.find_by_event_id(event_id).await?;
    let total_funds = event.current_amount;
    let total_participants = participant_emails(&event, stores).await?.len() as u64;
    let completion_rate = format_percent(total_votes_cast as f64, total_participants as f64);

    let mut category_totals: Vec<(String, u64)> = Vec::new();
    let mut results: Vec<StoryResult> = Vec::with_capacity(stories.len());
    for story in &stories {
        let votes = tally.get(&story.id).copied().unwrap_or(0);
        let category = story
            .recipient
            .category_of_need
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(UNCATEGORIZED)
            .to_string();
        match category_totals.iter_mut().find(|(name, _)| *name == category) {
            Some((_, total)) => *total += votes,
            None => category_totals.push((category.clone(), votes)),
        }

        let funds_distributed = if total_votes_cast == 0 {
            0.0
        } else {
            round_cents(votes as f64 / total_votes_cast as f64 * total_funds)
        };
        results.push(StoryResult {
            story_id: story.id,
            title: story.title.clone(),
            recipient_name: story.recipient.name.clone(),
            category,
            votes,
            percentage: format_percent(votes as f64, total_votes_cast as f64),
            funds_distributed,
            status: None,
        });
    }

    let mut top_category: Option<(String, u64)> = None;
    for (name, total) in category_totals {
        if top_category.as_ref().map_or(true, |(_, best)| total > *best) {
            top_category = Some((name, total));
        }
    }

    results.sort_by(|a, b| b.votes.cmp(&a.votes));
    if let Some(first) = results.get_mut(0) {
        first.status = Some(WINNER.to_string());
    }
    if let Some(second) = results.get_mut(1) {
        second.status = Some(RUNNER_UP.to_string());
    }

    Ok(ResultsDto {
        total_participants,
        total_votes_cast,
        completion_rate,
        top_category: top_category.map(|(name, _)| name),
        results,
        total_funds,
    })
}

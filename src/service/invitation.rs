use log::{error, info};
use uuid::Uuid;

use crate::{
    db::Stores,
    dto::{InviteFormDto, InviteOutcome},
    errors::{ServiceError, ServiceResult},
    models::{normalize_email, Actor, Event},
    service::{
        event::get_by_id,
        notification::{invitation_email, Notifier},
    },
};

fn check_invitable(event: &Event) -> ServiceResult<()> {
    if event.is_draft {
        return Err(ServiceError::invalid_state(
            "publish the event before inviting guests",
        ));
    }
    Ok(())
}

pub async fn invite_guest_by_email(
    event_id: Uuid,
    actor: &Actor,
    email: &str,
    stores: &Stores,
    notifier: &dyn Notifier,
    base_url: &str,
) -> ServiceResult<InviteOutcome> {
    let event = get_by_id(event_id, stores).await?;
    check_invitable(&event)?;
    if !event.is_host(actor.id) {
        return Err(ServiceError::forbidden("only the host can invite guests"));
    }
    record_invitation(&event, email, stores, notifier, base_url).await
}

/// Invitation sent from the host's form, which names the host by email.
pub async fn invite_guest_by_form(
    event_id: Uuid,
    actor: &Actor,
    form: &InviteFormDto,
    stores: &Stores,
    notifier: &dyn Notifier,
    base_url: &str,
) -> ServiceResult<InviteOutcome> {
    let event = get_by_id(event_id, stores).await?;
    check_invitable(&event)?;
    let host = stores
        .users
        .find_by_email(&normalize_email(&form.host_email))
        .await?
        .ok_or_else(|| ServiceError::not_found("host not found"))?;
    if host.id != actor.id || !event.is_host(host.id) {
        return Err(ServiceError::forbidden("only the host can invite guests"));
    }
    record_invitation(&event, &form.guest_email, stores, notifier, base_url).await
}

/// Appends the guest and the invited email, then mails the invitation once.
/// The mail is best effort: a failed send leaves the recorded invitation in
/// place and is only logged.
async fn record_invitation(
    event: &Event,
    email: &str,
    stores: &Stores,
    notifier: &dyn Notifier,
    base_url: &str,
) -> ServiceResult<InviteOutcome> {
    let email = normalize_email(email);
    if !email.contains('@') {
        return Err(ServiceError::validation("a valid email address is required"));
    }

    let mut guest_added = false;
    if let Some(user) = stores.users.find_by_email(&email).await? {
        if !event.is_guest(user.id) {
            guest_added = stores.events.add_guest(event.id, user.id).await?;
        }
    }

    let appended = stores.events.add_invited_email(event.id, &email).await?;
    if !appended {
        info!("{} already invited to event {}", email, event.id);
        return Ok(InviteOutcome {
            email,
            already_invited: true,
            guest_added,
            notified: false,
        });
    }

    let mail = invitation_email(event, &email, base_url);
    let notified = match notifier.send(&mail).await {
        Ok(()) => true,
        Err(err) => {
            error!(
                "[{:} : {:}] invitation mail to {} for event {} failed: {:?}",
                file!(),
                line!(),
                email,
                event.id,
                err
            );
            false
        }
    };
    info!("{} invited to event {}", email, event.id);
    Ok(InviteOutcome {
        email,
        already_invited: false,
        guest_added,
        notified,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{sample_event, TestEnv};

    const BASE_URL: &str = "http://localhost:3000";

    #[actix_rt::test]
    async fn inviting_twice_records_and_mails_once() {
        let env = TestEnv::new();
        let host = env.user("Hana", "hana@example.com").await;
        let event = sample_event(host.id);
        env.put_event(&event).await;

        let first = invite_guest_by_email(
            event.id,
            &host,
            "New.Guest@Example.com",
            &env.stores,
            env.notifier.as_ref(),
            BASE_URL,
        )
        .await
        .unwrap();
        let second = invite_guest_by_email(
            event.id,
            &host,
            "new.guest@example.com",
            &env.stores,
            env.notifier.as_ref(),
            BASE_URL,
        )
        .await
        .unwrap();

        assert!(first.notified && !first.already_invited);
        assert!(second.already_invited && !second.notified);
        let stored = get_by_id(event.id, &env.stores).await.unwrap();
        assert_eq!(stored.invited_emails, vec!["new.guest@example.com".to_string()]);
        let sent = env.notifier.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "new.guest@example.com");
    }

    #[actix_rt::test]
    async fn registered_invitee_joins_guest_list() {
        let env = TestEnv::new();
        let host = env.user("Hana", "hana@example.com").await;
        let guest = env.user("Gus", "Gus@Example.com").await;
        let event = sample_event(host.id);
        env.put_event(&event).await;

        let outcome = invite_guest_by_email(
            event.id,
            &host,
            "gus@example.com",
            &env.stores,
            env.notifier.as_ref(),
            BASE_URL,
        )
        .await
        .unwrap();

        assert!(outcome.guest_added);
        let stored = get_by_id(event.id, &env.stores).await.unwrap();
        assert_eq!(stored.guests, vec![guest.id]);
    }

    #[actix_rt::test]
    async fn drafts_and_strangers_are_rejected() {
        let env = TestEnv::new();
        let host = env.user("Hana", "hana@example.com").await;
        let stranger = env.user("Ugo", "ugo@example.com").await;
        let mut draft = sample_event(host.id);
        draft.is_draft = true;
        env.put_event(&draft).await;
        let event = sample_event(host.id);
        env.put_event(&event).await;

        let res = invite_guest_by_email(
            draft.id,
            &host,
            "a@x.com",
            &env.stores,
            env.notifier.as_ref(),
            BASE_URL,
        )
        .await;
        assert!(matches!(res, Err(ServiceError::InvalidState { .. })));

        let res = invite_guest_by_email(
            event.id,
            &stranger,
            "a@x.com",
            &env.stores,
            env.notifier.as_ref(),
            BASE_URL,
        )
        .await;
        assert!(matches!(res, Err(ServiceError::Forbidden { .. })));
        assert!(env.notifier.sent().await.is_empty());
    }

    #[actix_rt::test]
    async fn failed_mail_keeps_the_invitation() {
        let env = TestEnv::new();
        let host = env.user("Hana", "hana@example.com").await;
        let event = sample_event(host.id);
        env.put_event(&event).await;
        env.notifier.set_failing(true);

        let outcome = invite_guest_by_email(
            event.id,
            &host,
            "a@x.com",
            &env.stores,
            env.notifier.as_ref(),
            BASE_URL,
        )
        .await
        .unwrap();

        assert!(!outcome.notified);
        let stored = get_by_id(event.id, &env.stores).await.unwrap();
        assert_eq!(stored.invited_emails, vec!["a@x.com".to_string()]);

        // a retry does not resend: the invitation is already on record
        env.notifier.set_failing(false);
        let retry = invite_guest_by_email(
            event.id,
            &host,
            "a@x.com",
            &env.stores,
            env.notifier.as_ref(),
            BASE_URL,
        )
        .await
        .unwrap();
        assert!(retry.already_invited);
        assert!(env.notifier.sent().await.is_empty());
    }

    #[actix_rt::test]
    async fn form_invite_requires_matching_registered_host() {
        let env = TestEnv::new();
        let host = env.user("Hana", "hana@example.com").await;
        let other = env.user("Olga", "olga@example.com").await;
        let event = sample_event(host.id);
        env.put_event(&event).await;

        let unknown = InviteFormDto {
            host_email: "nobody@example.com".to_string(),
            guest_email: "a@x.com".to_string(),
        };
        let res = invite_guest_by_form(
            event.id,
            &host,
            &unknown,
            &env.stores,
            env.notifier.as_ref(),
            BASE_URL,
        )
        .await;
        assert!(matches!(res, Err(ServiceError::NotFound { .. })));

        let form = InviteFormDto {
            host_email: "HANA@example.com".to_string(),
            guest_email: "a@x.com".to_string(),
        };
        let res = invite_guest_by_form(
            event.id,
            &other,
            &form,
            &env.stores,
            env.notifier.as_ref(),
            BASE_URL,
        )
        .await;
        assert!(matches!(res, Err(ServiceError::Forbidden { .. })));

        let outcome = invite_guest_by_form(
            event.id,
            &host,
            &form,
            &env.stores,
            env.notifier.as_ref(),
            BASE_URL,
        )
        .await
        .unwrap();
        assert!(outcome.notified);
    }
}

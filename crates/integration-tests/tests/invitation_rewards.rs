//! Invitation codes, the ledger, and reward accounting.

#![allow(clippy::unwrap_used)]

use std::collections::HashSet;

use quickimage_core::Credits;
use quickimage_identity::IdentityServices;
use quickimage_identity::models::{Inviter, User};
use quickimage_identity::services::InvitationError;
use quickimage_integration_tests::fresh_services;

async fn register_email(services: &IdentityServices, email: &str, code: Option<&str>) -> User {
    services
        .auth
        .register_with_password(email, "secret123", "tester", code)
        .await
        .unwrap()
}

#[tokio::test]
async fn every_user_gets_a_distinct_stable_code() {
    let (_, services) = fresh_services().await;

    let mut codes = HashSet::new();
    for i in 0..10 {
        let user = register_email(&services, &format!("u{i}@example.com"), None).await;
        let code = services.invitations.get_or_create_code(&user.id).await.unwrap();
        let again = services.invitations.get_or_create_code(&user.id).await.unwrap();
        assert_eq!(code, again);
        assert_ne!(code.as_str(), "1919", "promotional codes are reserved");
        assert!(codes.insert(code));
    }
}

#[tokio::test]
async fn one_code_rewards_the_inviter_per_distinct_invitee() {
    let (_, services) = fresh_services().await;

    let inviter = register_email(&services, "inviter@example.com", None).await;
    let code = services
        .invitations
        .get_or_create_code(&inviter.id)
        .await
        .unwrap();

    register_email(&services, "first@example.com", Some(code.as_str())).await;
    register_email(&services, "second@example.com", Some(code.as_str())).await;

    let balance = services
        .accounts
        .find_by_id(&inviter.id)
        .await
        .unwrap()
        .unwrap()
        .credits;
    // 50 signup + 2 × 1000 referral rewards
    assert_eq!(balance, Credits::new(2050));

    let stats = services.invitations.stats(&inviter.id).await.unwrap();
    assert_eq!(stats.successful_invitations, 2);
    assert_eq!(stats.total_credits_earned, 2000);
    assert_eq!(stats.invitation_code, code);
}

#[tokio::test]
async fn repeat_redemption_by_the_same_contact_pays_once() {
    let (_, services) = fresh_services().await;

    let inviter = register_email(&services, "inviter@example.com", None).await;
    let code = services
        .invitations
        .get_or_create_code(&inviter.id)
        .await
        .unwrap();

    let invitee = register_email(&services, "guest@example.com", Some(code.as_str())).await;

    // A second attribution attempt for the same email is rejected
    let err = services
        .invitations
        .process_invitation(quickimage_identity::models::ProcessInvitation {
            code: code.as_str().to_owned(),
            invitee_id: invitee.id.clone(),
            invitee_name: invitee.name.clone(),
            invitee_email: invitee.email.clone(),
            invitee_phone: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, InvitationError::AlreadyUsedByThisAccount));

    let stats = services.invitations.stats(&inviter.id).await.unwrap();
    assert_eq!(stats.successful_invitations, 1);
    assert_eq!(stats.total_credits_earned, 1000);
}

#[tokio::test]
async fn promotional_code_rewards_the_invitee() {
    let (_, services) = fresh_services().await;

    let user = register_email(&services, "promo@example.com", Some("1919")).await;
    // 50 signup + 1000 promotional grant
    assert_eq!(user.credits, Credits::new(1050));

    // The ledger records the promotion against the system inviter; it does
    // not show up in any user's invitation history.
    let own = services.invitations.list_for_user(&user.id).await.unwrap();
    assert!(own.is_empty());
}

#[tokio::test]
async fn bad_invitation_codes_never_fail_registration() {
    let (_, services) = fresh_services().await;

    let user = register_email(&services, "optimist@example.com", Some("0000")).await;
    assert_eq!(user.credits, Credits::new(50));
    assert!(services.auth.is_authenticated());
}

#[tokio::test]
async fn history_pages_are_newest_first_with_ceiling_page_count() {
    let (_, services) = fresh_services().await;

    let inviter = register_email(&services, "inviter@example.com", None).await;
    let code = services
        .invitations
        .get_or_create_code(&inviter.id)
        .await
        .unwrap();

    for i in 0..7 {
        register_email(&services, &format!("guest{i}@example.com"), Some(code.as_str())).await;
    }

    let page1 = services
        .invitations
        .list_for_user_paginated(&inviter.id, 1, 3)
        .await
        .unwrap();
    assert_eq!(page1.invitations.len(), 3);
    assert_eq!(page1.total, 7);
    assert_eq!(page1.total_pages, 3);
    assert_eq!(
        page1.invitations[0].invitee_email.as_ref().map(quickimage_core::Email::as_str),
        Some("guest6@example.com")
    );

    let page2 = services
        .invitations
        .list_for_user_paginated(&inviter.id, 2, 3)
        .await
        .unwrap();
    assert_eq!(page2.invitations.len(), 3);

    let page3 = services
        .invitations
        .list_for_user_paginated(&inviter.id, 3, 3)
        .await
        .unwrap();
    assert_eq!(page3.invitations.len(), 1);
    assert_eq!(
        page3.invitations[0].invitee_email.as_ref().map(quickimage_core::Email::as_str),
        Some("guest0@example.com")
    );

    let past_end = services
        .invitations
        .list_for_user_paginated(&inviter.id, 4, 3)
        .await
        .unwrap();
    assert!(past_end.invitations.is_empty());
    assert_eq!(past_end.total, 7);
}

#[tokio::test]
async fn ledger_records_carry_full_attribution() {
    let (_, services) = fresh_services().await;

    let inviter = register_email(&services, "inviter@example.com", None).await;
    let code = services
        .invitations
        .get_or_create_code(&inviter.id)
        .await
        .unwrap();
    let invitee = register_email(&services, "guest@example.com", Some(code.as_str())).await;

    let records = services.invitations.list_for_user(&inviter.id).await.unwrap();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.inviter_id, Inviter::User(inviter.id.clone()));
    assert_eq!(record.invitee_id, invitee.id);
    assert_eq!(record.invitation_code, code);
    assert_eq!(record.reward_credits, 1000);
    assert!(record.completed_at.is_some());
}

#[tokio::test]
async fn invitation_links_and_validity_checks() {
    let (_, services) = fresh_services().await;

    let user = register_email(&services, "inviter@example.com", None).await;
    let code = services.invitations.get_or_create_code(&user.id).await.unwrap();

    assert_eq!(
        services.invitations.invitation_url(&code),
        format!("https://quickimage.ai/signup?invitation={code}")
    );
    assert!(services.invitations.is_valid_code(code.as_str()).await.unwrap());
    assert!(services.invitations.is_valid_code(" 1919 ").await.unwrap());
    assert!(!services.invitations.is_valid_code("9999999").await.unwrap());
}

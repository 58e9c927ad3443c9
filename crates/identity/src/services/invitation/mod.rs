//! Invitation codes, the invitation ledger, and referral rewards.
//!
//! Every user gets exactly one code, assigned lazily on first request. Codes
//! are drawn from the 4-digit space; if that space is too contended the
//! generator widens to 6 digits rather than looping forever. Promotional
//! codes come from configuration, reward the invitee directly, and are
//! recorded against the system inviter.
//!
//! All ledger mutations run under one lock so the duplicate-use check and the
//! record append are a single atomic step.

mod error;

pub use error::InvitationError;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use rand::Rng;

use quickimage_core::{InvitationCode, InvitationStatus, RecordId, UserId};

use crate::config::{IdentityConfig, LONG_CODE_ATTEMPTS, PromotionalCode, SHORT_CODE_ATTEMPTS};
use crate::db::invitations::InvitationRepository;
use crate::models::{
    InvitationRecord, InvitationStats, Inviter, PaginatedInvitations, ProcessInvitation,
};
use crate::services::accounts::AccountService;
use crate::store::KeyValueStore;

/// Invitation code assignment, ledger queries, and reward processing.
pub struct InvitationService {
    store: Arc<dyn KeyValueStore>,
    accounts: Arc<AccountService>,
    config: IdentityConfig,
    ledger_lock: tokio::sync::Mutex<()>,
}

impl InvitationService {
    /// Create a new invitation service.
    #[must_use]
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        accounts: Arc<AccountService>,
        config: IdentityConfig,
    ) -> Self {
        Self {
            store,
            accounts,
            config,
            ledger_lock: tokio::sync::Mutex::new(()),
        }
    }

    fn repo(&self) -> InvitationRepository<'_> {
        InvitationRepository::new(&*self.store)
    }

    /// Get the user's invitation code, assigning one on first call.
    ///
    /// The assignment is stable: every later call returns the same code.
    ///
    /// # Errors
    ///
    /// Returns `InvitationError::CodeSpaceExhausted` if no free code can be
    /// found, or `InvitationError::Repository` on storage failure.
    pub async fn get_or_create_code(
        &self,
        user_id: &UserId,
    ) -> Result<InvitationCode, InvitationError> {
        let _guard = self.ledger_lock.lock().await;
        let repo = self.repo();
        let mut codes = repo.codes().await?;

        if let Some(code) = codes.get(user_id) {
            return Ok(code.clone());
        }

        let code = generate_code(&codes, &self.config.promotional_codes)
            .ok_or(InvitationError::CodeSpaceExhausted)?;
        codes.insert(user_id.clone(), code.clone());
        repo.save_codes(&codes).await?;

        tracing::info!(%user_id, %code, "invitation code assigned");
        Ok(code)
    }

    /// Aggregate invitation statistics for one inviter.
    ///
    /// Assigns a code as a side effect if the user has none yet.
    ///
    /// # Errors
    ///
    /// Returns `InvitationError::Repository` on storage failure.
    pub async fn stats(&self, user_id: &UserId) -> Result<InvitationStats, InvitationError> {
        let invitation_code = self.get_or_create_code(user_id).await?;
        let records = self.records_for_user(user_id).await?;

        Ok(InvitationStats {
            successful_invitations: records.len(),
            total_credits_earned: records.iter().map(|r| r.reward_credits).sum(),
            invitation_code,
        })
    }

    /// The user's invitation records, newest first.
    ///
    /// # Errors
    ///
    /// Returns `InvitationError::Repository` on storage failure.
    pub async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<InvitationRecord>, InvitationError> {
        let mut records = self.records_for_user(user_id).await?;
        records.reverse();
        Ok(records)
    }

    /// One page of the user's invitation records, newest first.
    ///
    /// `page` is 1-based; zero values for `page` or `limit` are clamped to 1.
    /// A page past the end comes back empty with accurate totals.
    ///
    /// # Errors
    ///
    /// Returns `InvitationError::Repository` on storage failure.
    pub async fn list_for_user_paginated(
        &self,
        user_id: &UserId,
        page: usize,
        limit: usize,
    ) -> Result<PaginatedInvitations, InvitationError> {
        let page = page.max(1);
        let limit = limit.max(1);

        let all = self.list_for_user(user_id).await?;
        let total = all.len();
        let total_pages = total.div_ceil(limit);
        let invitations = all.into_iter().skip((page - 1) * limit).take(limit).collect();

        Ok(PaginatedInvitations {
            invitations,
            total,
            page,
            limit,
            total_pages,
        })
    }

    /// Attribute a fresh signup to an invitation code and pay out the reward.
    ///
    /// Promotional codes reward the invitee and are logged against the system
    /// inviter; regular codes reward the inviter. The duplicate-use check
    /// matches on the same code plus the same email or the same phone, so one
    /// account cannot farm a code across channels.
    ///
    /// Reward payment is best-effort: a failed credit grant is logged and the
    /// ledger record stands.
    ///
    /// # Errors
    ///
    /// Returns `InvitationError::InvalidCode` if the code maps to no inviter
    /// and no promotion, or `InvitationError::AlreadyUsedByThisAccount` on a
    /// repeat redemption.
    pub async fn process_invitation(
        &self,
        request: ProcessInvitation,
    ) -> Result<InvitationRecord, InvitationError> {
        let trimmed = request.code.trim().to_owned();

        if let Some(promo) = self.config.promotional_codes.get(&trimmed) {
            return self
                .process_promotional(&trimmed, promo.clone(), request)
                .await;
        }

        let _guard = self.ledger_lock.lock().await;
        let repo = self.repo();

        let codes = repo.codes().await?;
        let Some((inviter_id, code)) = codes
            .iter()
            .find(|(_, code)| code.as_str() == trimmed)
            .map(|(id, code)| (id.clone(), code.clone()))
        else {
            return Err(InvitationError::InvalidCode);
        };

        let records = repo.records().await?;
        let already_used = records.iter().any(|r| {
            r.invitation_code == code
                && ((r.invitee_email.is_some() && r.invitee_email == request.invitee_email)
                    || (r.invitee_phone.is_some() && r.invitee_phone == request.invitee_phone))
        });
        if already_used {
            return Err(InvitationError::AlreadyUsedByThisAccount);
        }

        let now = Utc::now();
        let record = InvitationRecord {
            id: RecordId::generate(),
            inviter_id: Inviter::User(inviter_id.clone()),
            invitee_id: request.invitee_id,
            invitee_name: request.invitee_name,
            invitee_email: request.invitee_email,
            invitee_phone: request.invitee_phone,
            invitation_code: code,
            status: InvitationStatus::Completed,
            created_at: now,
            completed_at: Some(now),
            reward_credits: self.config.invitation_reward_credits,
        };
        repo.append(record.clone()).await?;

        if let Err(error) = self
            .accounts
            .add_credits(&inviter_id, self.config.invitation_reward_credits)
            .await
        {
            tracing::warn!(%error, inviter = %inviter_id, "invitation reward grant failed");
        }

        tracing::info!(
            inviter = %inviter_id,
            invitee = %record.invitee_id,
            code = %record.invitation_code,
            "invitation completed"
        );
        Ok(record)
    }

    async fn process_promotional(
        &self,
        code: &str,
        promo: PromotionalCode,
        request: ProcessInvitation,
    ) -> Result<InvitationRecord, InvitationError> {
        // Promotional redemptions skip the duplicate-use check: the campaign
        // code is shared, and a signup can only redeem once by construction.
        let now = Utc::now();
        let record = InvitationRecord {
            id: RecordId::generate(),
            inviter_id: Inviter::System,
            invitee_id: request.invitee_id.clone(),
            invitee_name: request.invitee_name,
            invitee_email: request.invitee_email,
            invitee_phone: request.invitee_phone,
            invitation_code: InvitationCode::parse(code)
                .map_err(|_| InvitationError::InvalidCode)?,
            status: InvitationStatus::Completed,
            created_at: now,
            completed_at: Some(now),
            reward_credits: promo.credits_reward,
        };

        {
            let _guard = self.ledger_lock.lock().await;
            self.repo().append(record.clone()).await?;
        }

        if let Err(error) = self
            .accounts
            .add_credits(&request.invitee_id, promo.credits_reward)
            .await
        {
            tracing::warn!(%error, invitee = %request.invitee_id, "promotional grant failed");
        }

        tracing::info!(
            invitee = %record.invitee_id,
            code,
            description = %promo.description,
            "promotional code redeemed"
        );
        Ok(record)
    }

    /// The shareable signup link for `code`.
    #[must_use]
    pub fn invitation_url(&self, code: &InvitationCode) -> String {
        format!("{}/signup?invitation={code}", self.config.base_url)
    }

    /// Whether `code` would be accepted by [`Self::process_invitation`].
    ///
    /// # Errors
    ///
    /// Returns `InvitationError::Repository` on storage failure.
    pub async fn is_valid_code(&self, code: &str) -> Result<bool, InvitationError> {
        let trimmed = code.trim();
        if self.config.promotional_codes.contains_key(trimmed) {
            return Ok(true);
        }
        let codes = self.repo().codes().await?;
        Ok(codes.values().any(|c| c.as_str() == trimmed))
    }

    /// The promotion behind `code`, if it is a promotional code.
    #[must_use]
    pub fn promotional_info(&self, code: &str) -> Option<&PromotionalCode> {
        self.config.promotional_codes.get(code.trim())
    }

    async fn records_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<InvitationRecord>, InvitationError> {
        let records = self.repo().records().await?;
        let inviter = Inviter::User(user_id.clone());
        Ok(records.into_iter().filter(|r| r.inviter_id == inviter).collect())
    }
}

/// Draw a code nobody holds yet.
///
/// Synchronous on purpose: the RNG is not `Send`, so it must be created and
/// dropped between await points. Tries the 4-digit space a bounded number of
/// times, then widens to 6 digits; returns `None` only if both spaces fail.
fn generate_code(
    assigned: &HashMap<UserId, InvitationCode>,
    promotional: &HashMap<String, PromotionalCode>,
) -> Option<InvitationCode> {
    let taken: HashSet<&str> = assigned
        .values()
        .map(InvitationCode::as_str)
        .chain(promotional.keys().map(String::as_str))
        .collect();

    let mut rng = rand::rng();
    for _ in 0..SHORT_CODE_ATTEMPTS {
        let candidate = format!("{:04}", rng.random_range(0..10_000u32));
        if !taken.contains(candidate.as_str()) {
            return InvitationCode::parse(&candidate).ok();
        }
    }
    for _ in 0..LONG_CODE_ATTEMPTS {
        let candidate = format!("{:06}", rng.random_range(0..1_000_000u32));
        if !taken.contains(candidate.as_str()) {
            return InvitationCode::parse(&candidate).ok();
        }
    }
    None
}

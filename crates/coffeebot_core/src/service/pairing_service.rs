//! Pairing workflow: generate the next assignment and dispatch invitations.
//!
//! # Responsibility
//! - Wire roster, history and assignment stores around the pairing engine.
//! - Run the two independently triggered cycles, generate and dispatch.
//!
//! # Invariants
//! - Generate never touches history; dispatch appends one entry per group,
//!   only after that group's notification succeeded.
//! - Dispatch is one failure boundary: the first fault stops the remaining
//!   groups, and groups already sent stay sent and recorded.
//! - At most one generate and one dispatch cycle run at a time. Callers
//!   (cron, CLI) enforce this; the service takes no locks.

use crate::model::participant::Participant;
use crate::notify::{Notifier, NotifyError};
use crate::pairing::eligibility::{filter_eligible, iso_week_number};
use crate::pairing::engine::{random_unique_pairing_with, PairingOptions, PairingOutcome};
use crate::pairing::random::{shuffle, RandomSource};
use crate::repo::assignment_repo::AssignmentRepository;
use crate::repo::history_repo::HistoryRepository;
use crate::repo::roster_repo::RosterRepository;
use crate::repo::RepoError;
use crate::service::message::{compose_message, resolve_members};
use chrono::NaiveDate;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;
use uuid::Uuid;

/// Service error for pairing workflow cycles.
#[derive(Debug)]
pub enum PairingServiceError {
    /// Store failure.
    Repo(RepoError),
    /// An assigned email is not among today's eligible participants.
    UnknownParticipant(String),
    /// Delivery failure.
    Notify(NotifyError),
    /// Dispatch stopped early; `delivered` groups were already sent.
    DispatchAborted {
        cycle_id: Uuid,
        delivered: usize,
        cause: Box<PairingServiceError>,
    },
}

impl Display for PairingServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::UnknownParticipant(email) => {
                write!(f, "assigned participant `{email}` is not eligible for this dispatch")
            }
            Self::Notify(err) => write!(f, "{err}"),
            Self::DispatchAborted {
                cycle_id,
                delivered,
                cause,
            } => write!(
                f,
                "dispatch {cycle_id} aborted after {delivered} delivered group(s): {cause}"
            ),
        }
    }
}

impl Error for PairingServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Notify(err) => Some(err),
            Self::DispatchAborted { cause, .. } => Some(cause.as_ref()),
            Self::UnknownParticipant(_) => None,
        }
    }
}

impl From<RepoError> for PairingServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<NotifyError> for PairingServiceError {
    fn from(value: NotifyError) -> Self {
        Self::Notify(value)
    }
}

/// Summary of one generate cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateReport {
    pub cycle_id: Uuid,
    /// ISO week used for the cadence check.
    pub week_number: u32,
    /// Participants that passed eligibility.
    pub eligible_count: usize,
    /// Engine output, as persisted.
    pub outcome: PairingOutcome,
}

/// Summary of one completed dispatch cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub cycle_id: Uuid,
    /// Canonical keys of notified groups, in dispatch order.
    pub delivered: Vec<String>,
}

/// Workflow facade over the roster, history and assignment stores.
pub struct PairingService<R, H, A>
where
    R: RosterRepository,
    H: HistoryRepository,
    A: AssignmentRepository,
{
    roster: R,
    history: H,
    assignments: A,
    options: PairingOptions,
}

impl<R, H, A> PairingService<R, H, A>
where
    R: RosterRepository,
    H: HistoryRepository,
    A: AssignmentRepository,
{
    /// Creates a service with default engine options.
    pub fn new(roster: R, history: H, assignments: A) -> Self {
        Self {
            roster,
            history,
            assignments,
            options: PairingOptions::default(),
        }
    }

    /// Replaces engine options, e.g. the per-anchor retry budget.
    pub fn with_options(mut self, options: PairingOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the participants due on `today`, randomly ordered.
    pub fn list_eligible<Rn: RandomSource + ?Sized>(
        &self,
        today: NaiveDate,
        rng: &mut Rn,
    ) -> Result<Vec<Participant>, PairingServiceError> {
        let roster = self.roster.list_participants()?;
        let mut eligible = filter_eligible(&roster, iso_week_number(today), today);
        shuffle(&mut eligible, rng);
        Ok(eligible)
    }

    /// Computes the next assignment and replaces the stored one.
    ///
    /// # Side effects
    /// - Overwrites the pending assignment store.
    /// - Emits `generate_assignment` logging events.
    pub fn generate_assignment<Rn: RandomSource + ?Sized>(
        &self,
        today: NaiveDate,
        rng: &mut Rn,
    ) -> Result<GenerateReport, PairingServiceError> {
        let started_at = Instant::now();
        let cycle_id = Uuid::new_v4();
        let week_number = iso_week_number(today);
        info!(
            "event=generate_assignment module=service status=start cycle_id={cycle_id} week={week_number}"
        );

        let result = self.run_generate(today, rng).and_then(|(eligible_count, outcome)| {
            self.assignments.replace_all(&outcome.keys())?;
            Ok((eligible_count, outcome))
        });

        match result {
            Ok((eligible_count, outcome)) => {
                info!(
                    "event=generate_assignment module=service status=ok cycle_id={cycle_id} eligible={eligible_count} groups={} repeated={} duration_ms={}",
                    outcome.groups.len(),
                    outcome.repeated_keys.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(GenerateReport {
                    cycle_id,
                    week_number,
                    eligible_count,
                    outcome,
                })
            }
            Err(err) => {
                error!(
                    "event=generate_assignment module=service status=error cycle_id={cycle_id} duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    fn run_generate<Rn: RandomSource + ?Sized>(
        &self,
        today: NaiveDate,
        rng: &mut Rn,
    ) -> Result<(usize, PairingOutcome), PairingServiceError> {
        let eligible = self.list_eligible(today, rng)?;
        let history = self.history.load_keys()?;
        let outcome = random_unique_pairing_with(&history, &eligible, rng, self.options);
        Ok((eligible.len(), outcome))
    }

    /// Sends one invitation per pending group and records it in history.
    ///
    /// # Side effects
    /// - One `notifier.send` and one history append per delivered group.
    /// - The pending assignment is left in place.
    ///
    /// Members are looked up among the participants eligible on `today`, so
    /// someone who left or snoozed after generate is not contacted.
    ///
    /// # Errors
    /// - Returns `DispatchAborted` on the first lookup, delivery or history
    ///   fault. Groups delivered before the fault are not rolled back.
    pub fn dispatch_notifications<N, Rn>(
        &self,
        notifier: &N,
        today: NaiveDate,
        sender_name: &str,
        rng: &mut Rn,
    ) -> Result<DispatchReport, PairingServiceError>
    where
        N: Notifier + ?Sized,
        Rn: RandomSource + ?Sized,
    {
        let started_at = Instant::now();
        let cycle_id = Uuid::new_v4();
        info!("event=dispatch_notifications module=service status=start cycle_id={cycle_id}");

        let mut delivered = Vec::new();
        if let Err(cause) = self.run_dispatch(notifier, today, sender_name, rng, cycle_id, &mut delivered)
        {
            error!(
                "event=dispatch_notifications module=service status=error cycle_id={cycle_id} delivered={} duration_ms={} error={}",
                delivered.len(),
                started_at.elapsed().as_millis(),
                cause
            );
            return Err(PairingServiceError::DispatchAborted {
                cycle_id,
                delivered: delivered.len(),
                cause: Box::new(cause),
            });
        }

        info!(
            "event=dispatch_notifications module=service status=ok cycle_id={cycle_id} delivered={} duration_ms={}",
            delivered.len(),
            started_at.elapsed().as_millis()
        );
        Ok(DispatchReport {
            cycle_id,
            delivered,
        })
    }

    fn run_dispatch<N, Rn>(
        &self,
        notifier: &N,
        today: NaiveDate,
        sender_name: &str,
        rng: &mut Rn,
        cycle_id: Uuid,
        delivered: &mut Vec<String>,
    ) -> Result<(), PairingServiceError>
    where
        N: Notifier + ?Sized,
        Rn: RandomSource + ?Sized,
    {
        let group_keys = self.assignments.read_all()?;
        let roster = self.roster.list_participants()?;
        let eligible = filter_eligible(&roster, iso_week_number(today), today);

        for group_key in group_keys {
            let members = resolve_members(&group_key, |email| {
                eligible.iter().find(|participant| participant.email == email).cloned()
            })
            .map_err(PairingServiceError::UnknownParticipant)?;

            let message = compose_message(&members, sender_name, rng);
            notifier.send(&message)?;
            self.history.append(&group_key, today, cycle_id)?;
            delivered.push(group_key);
        }

        Ok(())
    }
}

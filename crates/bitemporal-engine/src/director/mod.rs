//! Temporal directors: stateless edit algorithms, one per temporal style.
//!
//! Every edit computes the affected business range, loads the segments that
//! intersect it through the container, and classifies each segment against
//! the range: cut at the start, matched exactly, or superseded.

mod audit_only;
mod bitemporal;
mod non_audited;
mod segments;

use bitemporal_core::errors::BitemporalResult;
use bitemporal_core::models::{AttributeUpdate, TemporalStyle, Timestamp};

pub use audit_only::AuditOnlyDirector;
pub use bitemporal::BitemporalDirector;
pub use non_audited::NonAuditedDirector;

use crate::behavior::EditKind;
use crate::container::TemporalContainer;
use crate::context::TxContext;
use crate::object::DatedObject;

/// The edit algorithms for one temporal style.
pub trait TemporalDirector: Send + Sync {
    fn insert(
        &self,
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
    ) -> BitemporalResult<()>;

    /// Inserts a segment ending at `until`.
    fn insert_until(
        &self,
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
        until: Timestamp,
    ) -> BitemporalResult<()>;

    fn insert_with_increment(
        &self,
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
    ) -> BitemporalResult<()>;

    fn insert_with_increment_until(
        &self,
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
        until: Timestamp,
    ) -> BitemporalResult<()>;

    /// Re-inserts a fully dated snapshot, typically replayed from an archive.
    fn insert_for_recovery(
        &self,
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
    ) -> BitemporalResult<()>;

    fn update(
        &self,
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
        update: &AttributeUpdate,
    ) -> BitemporalResult<()>;

    fn update_until(
        &self,
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
        update: &AttributeUpdate,
        until: Timestamp,
    ) -> BitemporalResult<()>;

    /// Rewrites the overlapping segments without creating history.
    fn in_place_update(
        &self,
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
        update: &AttributeUpdate,
    ) -> BitemporalResult<()>;

    fn increment(
        &self,
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
        update: &AttributeUpdate,
    ) -> BitemporalResult<()>;

    fn increment_until(
        &self,
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
        update: &AttributeUpdate,
        until: Timestamp,
    ) -> BitemporalResult<()>;

    fn terminate(
        &self,
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
    ) -> BitemporalResult<()>;

    fn terminate_until(
        &self,
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
        until: Timestamp,
    ) -> BitemporalResult<()>;

    /// Removes every version of the identity, with no history kept.
    fn purge(
        &self,
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
    ) -> BitemporalResult<()>;

    fn inactivate_for_archiving(
        &self,
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
        processing_to: Timestamp,
        business_to: Option<Timestamp>,
    ) -> BitemporalResult<()>;
}

static AUDIT_ONLY: AuditOnlyDirector = AuditOnlyDirector;
static NON_AUDITED: NonAuditedDirector = NonAuditedDirector;
static BITEMPORAL: BitemporalDirector = BitemporalDirector;

pub fn director_for(style: TemporalStyle) -> &'static dyn TemporalDirector {
    match style {
        TemporalStyle::AuditOnly => &AUDIT_ONLY,
        TemporalStyle::NonAudited => &NON_AUDITED,
        TemporalStyle::Bitemporal => &BITEMPORAL,
    }
}

/// A requested edit together with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum TemporalEdit {
    Insert,
    InsertUntil {
        until: Timestamp,
    },
    InsertWithIncrement,
    InsertWithIncrementUntil {
        until: Timestamp,
    },
    InsertForRecovery,
    Update(AttributeUpdate),
    UpdateUntil {
        update: AttributeUpdate,
        until: Timestamp,
    },
    InPlaceUpdate(AttributeUpdate),
    Increment(AttributeUpdate),
    IncrementUntil {
        update: AttributeUpdate,
        until: Timestamp,
    },
    Terminate,
    TerminateUntil {
        until: Timestamp,
    },
    Purge,
    InactivateForArchiving {
        processing_to: Timestamp,
        business_to: Option<Timestamp>,
    },
}

impl TemporalEdit {
    pub fn kind(&self) -> EditKind {
        match self {
            Self::Insert => EditKind::Insert,
            Self::InsertUntil { .. } => EditKind::InsertUntil,
            Self::InsertWithIncrement => EditKind::InsertWithIncrement,
            Self::InsertWithIncrementUntil { .. } => EditKind::InsertWithIncrementUntil,
            Self::InsertForRecovery => EditKind::InsertForRecovery,
            Self::Update(_) => EditKind::Update,
            Self::UpdateUntil { .. } => EditKind::UpdateUntil,
            Self::InPlaceUpdate(_) => EditKind::InPlaceUpdate,
            Self::Increment(_) => EditKind::Increment,
            Self::IncrementUntil { .. } => EditKind::IncrementUntil,
            Self::Terminate => EditKind::Terminate,
            Self::TerminateUntil { .. } => EditKind::TerminateUntil,
            Self::Purge => EditKind::Purge,
            Self::InactivateForArchiving { .. } => EditKind::InactivateForArchiving,
        }
    }

    /// The attribute change carried by update-like edits.
    pub fn attribute_update(&self) -> Option<&AttributeUpdate> {
        match self {
            Self::Update(update)
            | Self::InPlaceUpdate(update)
            | Self::Increment(update)
            | Self::UpdateUntil { update, .. }
            | Self::IncrementUntil { update, .. } => Some(update),
            _ => None,
        }
    }

    pub fn execute(
        &self,
        director: &dyn TemporalDirector,
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
    ) -> BitemporalResult<()> {
        match self {
            Self::Insert => director.insert(ctx, container, object),
            Self::InsertUntil { until } => director.insert_until(ctx, container, object, *until),
            Self::InsertWithIncrement => director.insert_with_increment(ctx, container, object),
            Self::InsertWithIncrementUntil { until } => {
                director.insert_with_increment_until(ctx, container, object, *until)
            }
            Self::InsertForRecovery => director.insert_for_recovery(ctx, container, object),
            Self::Update(update) => director.update(ctx, container, object, update),
            Self::UpdateUntil { update, until } => {
                director.update_until(ctx, container, object, update, *until)
            }
            Self::InPlaceUpdate(update) => director.in_place_update(ctx, container, object, update),
            Self::Increment(update) => director.increment(ctx, container, object, update),
            Self::IncrementUntil { update, until } => {
                director.increment_until(ctx, container, object, update, *until)
            }
            Self::Terminate => director.terminate(ctx, container, object),
            Self::TerminateUntil { until } => director.terminate_until(ctx, container, object, *until),
            Self::Purge => director.purge(ctx, container, object),
            Self::InactivateForArchiving {
                processing_to,
                business_to,
            } => director.inactivate_for_archiving(
                ctx,
                container,
                object,
                *processing_to,
                *business_to,
            ),
        }
    }
}

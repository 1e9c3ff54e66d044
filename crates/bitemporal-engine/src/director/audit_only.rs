//! Director for entities with a processing axis only. There is a single
//! current row per identity; an edit closes it at the transaction's
//! processing timestamp and inserts its successor.

use std::slice;

use bitemporal_core::errors::{BitemporalError, BitemporalResult, TemporalError};
use bitemporal_core::models::{
    infinity, is_infinity, AttributeUpdate, DateRange, PersistenceState, Timestamp,
};
use tracing::warn;

use super::segments::{
    self, apply_logged, copy_for_insert, edit_data, flush_inserts, insert_new, log_update,
    segments_for, single_segment,
};
use super::TemporalDirector;
use crate::container::{TemporalContainer, TxObjectId};
use crate::context::TxContext;
use crate::object::DatedObject;

#[derive(Debug, Clone, Copy, Default)]
pub struct AuditOnlyDirector;

fn unsupported(operation: &'static str, what: &str) -> BitemporalError {
    BitemporalError::unsupported(
        operation,
        format!("audit only objects do not provide {what} functionality"),
    )
}

impl AuditOnlyDirector {
    fn check_infinity_processing_date(object: &DatedObject) -> BitemporalResult<()> {
        if !is_infinity(object.processing_date()) {
            return Err(TemporalError::NonCurrentInsert {
                key: object.describe(),
            }
            .into());
        }
        Ok(())
    }

    /// The one wrapper an audit-only edit acts on.
    fn current_segment(
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &DatedObject,
    ) -> BitemporalResult<TxObjectId> {
        let ids = segments_for(ctx, container, object, DateRange::unbounded())?;
        single_segment(&ids, object)
    }

    fn inactivate(
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        id: TxObjectId,
        processing_to: Timestamp,
    ) -> BitemporalResult<()> {
        let committed_from = container
            .object(id)?
            .committed_data()
            .and_then(|c| c.processing_from);
        if committed_from == Some(processing_to) && ctx.config.delete_on_changed_too_fast {
            warn!(
                key = %container.key(),
                processing_from = %processing_to,
                "object has changed too fast, deleting instead of inactivating"
            );
            return segments::delete(ctx, container, id);
        }
        edit_data(ctx, container, id, |data| data.processing_to = Some(processing_to))?;
        container.inactivate_object(id);
        log_update(
            ctx,
            container,
            id,
            &AttributeUpdate::ProcessingTo {
                value: processing_to,
            },
        )
    }
}

impl TemporalDirector for AuditOnlyDirector {
    fn insert(
        &self,
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
    ) -> BitemporalResult<()> {
        Self::check_infinity_processing_date(object)?;
        let mut data = object.data_for_insert()?;
        if container.get_active_data_for(None).is_some() {
            return Err(segments::insert_conflict(object));
        }
        data.processing_from = Some(ctx.processing_timestamp());
        data.processing_to = Some(infinity());
        insert_new(ctx, container, object, data)
    }

    fn insert_until(
        &self,
        _ctx: &mut TxContext<'_>,
        _container: &mut dyn TemporalContainer,
        _object: &mut DatedObject,
        _until: Timestamp,
    ) -> BitemporalResult<()> {
        Err(unsupported("insert_until", "insert until"))
    }

    fn insert_with_increment(
        &self,
        _ctx: &mut TxContext<'_>,
        _container: &mut dyn TemporalContainer,
        _object: &mut DatedObject,
    ) -> BitemporalResult<()> {
        Err(unsupported("insert_with_increment", "insert with increment"))
    }

    fn insert_with_increment_until(
        &self,
        _ctx: &mut TxContext<'_>,
        _container: &mut dyn TemporalContainer,
        _object: &mut DatedObject,
        _until: Timestamp,
    ) -> BitemporalResult<()> {
        Err(unsupported("insert_with_increment_until", "insert with increment"))
    }

    fn insert_for_recovery(
        &self,
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
    ) -> BitemporalResult<()> {
        let data = object.data_for_insert()?;
        for (field, value) in [
            ("processing_from", data.processing_from),
            ("processing_to", data.processing_to),
        ] {
            if value.is_none() {
                return Err(TemporalError::MissingDate {
                    key: object.describe(),
                    field,
                }
                .into());
            }
        }
        if !data.matches_processing_date(object.processing_date()) {
            return Err(TemporalError::DateOutOfRange {
                key: object.describe(),
                axis: "processing",
            }
            .into());
        }
        if data.is_current() && container.get_active_data_for(None).is_some() {
            return Err(BitemporalError::conflict(
                object.describe(),
                "cannot insert data. Active data already exists",
            ));
        }
        insert_new(ctx, container, object, data)
    }

    fn update(
        &self,
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
        update: &AttributeUpdate,
    ) -> BitemporalResult<()> {
        container.enroll_in_write(ctx.tx, object.committed_data());
        Self::check_infinity_processing_date(object)?;
        let tx_start = ctx.processing_timestamp();
        let id = Self::current_segment(ctx, container, object)?;

        if container.object(id)?.is_new_in_this_transaction() {
            apply_logged(ctx, container, id, slice::from_ref(update))?;
        } else {
            // The successor is copied before the row is closed.
            let successor = copy_for_insert(container, id, |data| {
                update.apply(data)?;
                data.processing_from = Some(tx_start);
                Ok(())
            })?;
            Self::inactivate(ctx, container, id, tx_start)?;
            flush_inserts(ctx, container, &[successor])?;
        }
        object.clear_tx_data();
        Ok(())
    }

    fn update_until(
        &self,
        _ctx: &mut TxContext<'_>,
        _container: &mut dyn TemporalContainer,
        _object: &mut DatedObject,
        _update: &AttributeUpdate,
        _until: Timestamp,
    ) -> BitemporalResult<()> {
        Err(unsupported("update_until", "update until"))
    }

    fn in_place_update(
        &self,
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
        update: &AttributeUpdate,
    ) -> BitemporalResult<()> {
        Self::check_infinity_processing_date(object)?;
        container.enroll_in_write(ctx.tx, object.committed_data());
        let id = Self::current_segment(ctx, container, object)?;
        segments::apply_in_place(ctx, container, id, slice::from_ref(update))?;
        log_update(ctx, container, id, update)?;
        object.clear_tx_data();
        Ok(())
    }

    fn increment(
        &self,
        _ctx: &mut TxContext<'_>,
        _container: &mut dyn TemporalContainer,
        _object: &mut DatedObject,
        _update: &AttributeUpdate,
    ) -> BitemporalResult<()> {
        Err(unsupported("increment", "increment"))
    }

    fn increment_until(
        &self,
        _ctx: &mut TxContext<'_>,
        _container: &mut dyn TemporalContainer,
        _object: &mut DatedObject,
        _update: &AttributeUpdate,
        _until: Timestamp,
    ) -> BitemporalResult<()> {
        Err(unsupported("increment_until", "increment until"))
    }

    fn terminate(
        &self,
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
    ) -> BitemporalResult<()> {
        container.enroll_in_write(ctx.tx, object.committed_data());
        let tx_start = ctx.processing_timestamp();
        self.inactivate_for_archiving(ctx, container, object, tx_start, None)
    }

    fn terminate_until(
        &self,
        _ctx: &mut TxContext<'_>,
        _container: &mut dyn TemporalContainer,
        _object: &mut DatedObject,
        _until: Timestamp,
    ) -> BitemporalResult<()> {
        Err(unsupported("terminate_until", "terminate until"))
    }

    fn purge(
        &self,
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
    ) -> BitemporalResult<()> {
        segments::purge(ctx, container, object)
    }

    /// `business_to` is ignored: there is no business axis.
    fn inactivate_for_archiving(
        &self,
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
        processing_to: Timestamp,
        _business_to: Option<Timestamp>,
    ) -> BitemporalResult<()> {
        Self::check_infinity_processing_date(object)?;
        container.enroll_in_write(ctx.tx, object.committed_data());
        let id = Self::current_segment(ctx, container, object)?;

        if container.object(id)?.is_new_in_this_transaction() {
            let wrapper = container.object_mut(id)?;
            ctx.cache.remove_dated_data(wrapper.data_for_read());
            wrapper.mark_deleted();
            ctx.tx.delete(wrapper);
            container.inactivate_object(id);
        } else {
            Self::inactivate(ctx, container, id, processing_to)?;
        }
        object.clear_tx_data();
        object.set_persistence(PersistenceState::Deleted);
        Ok(())
    }
}

//! Director for entities with a business axis only. Without a processing
//! axis there is no history to keep: segments are truncated or deleted in
//! place.

use std::slice;

use bitemporal_core::errors::{BitemporalError, BitemporalResult, TemporalError};
use bitemporal_core::models::{
    infinity, is_infinity, AttributeUpdate, DateRange, PersistenceState, Snapshot, Timestamp,
    TxObject,
};

use super::segments::{
    self, apply_all, apply_in_place, bounds, business_from_for, check_insert_overlap,
    copy_for_insert, edit_data, flush_inserts, increments_from, insert_conflict, insert_new,
    log_update, log_updates, segments_for, until_range,
};
use super::TemporalDirector;
use crate::container::{TemporalContainer, TxObjectId};
use crate::context::TxContext;
use crate::object::DatedObject;

#[derive(Debug, Clone, Copy, Default)]
pub struct NonAuditedDirector;

impl NonAuditedDirector {
    fn check_infinity_date(object: &DatedObject) -> BitemporalResult<Timestamp> {
        let business_date = object.require_business_date()?;
        if is_infinity(business_date) {
            return Err(TemporalError::InfinityDate {
                key: object.describe(),
            }
            .into());
        }
        Ok(business_date)
    }

    /// Ends a segment at `at` and keeps it active.
    fn cut_tail(
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        id: TxObjectId,
        at: Timestamp,
    ) -> BitemporalResult<()> {
        container.void_data(id);
        {
            let wrapper = container.object_mut(id)?;
            if let Some(committed) = wrapper.committed_data() {
                ctx.cache.remove_dated_data(committed);
            }
        }
        edit_data(ctx, container, id, |data| data.business_to = Some(at))?;
        container.object_mut(id)?.bump_committed_version();
        container.add_active_data(id);
        if container.object(id)?.needs_transactional_update() {
            log_update(ctx, container, id, &AttributeUpdate::BusinessTo { value: at })?;
        }
        Ok(())
    }

    /// Copy of the segment starting at `end`, for the part an until edit
    /// leaves alone.
    fn split_tail_end(
        container: &mut dyn TemporalContainer,
        id: TxObjectId,
        end: Timestamp,
    ) -> BitemporalResult<TxObjectId> {
        copy_for_insert(container, id, |data| {
            data.business_from = Some(end);
            Ok(())
        })
    }

    fn update_in_place(
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        id: TxObjectId,
        updates: &[AttributeUpdate],
    ) -> BitemporalResult<()> {
        container.object_mut(id)?.set_to_be_updated();
        apply_in_place(ctx, container, id, updates)?;
        container.add_active_data(id);
        if container.object(id)?.needs_transactional_update() {
            log_updates(ctx, container, id, updates)?;
        }
        container.object_mut(id)?.bump_committed_version();
        Ok(())
    }

    fn copy_from(
        container: &mut dyn TemporalContainer,
        id: TxObjectId,
        from: Timestamp,
        updates: &[AttributeUpdate],
    ) -> BitemporalResult<TxObjectId> {
        copy_for_insert(container, id, |data| {
            apply_all(updates, data)?;
            data.business_from = Some(from);
            Ok(())
        })
    }

    fn increment_segments(
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        ids: &[TxObjectId],
        from: Timestamp,
        updates: &[AttributeUpdate],
    ) -> BitemporalResult<()> {
        let mut to_insert = Vec::with_capacity(ids.len());
        for &id in ids {
            let (active_from, _) = bounds(container, id)?;
            if active_from < from {
                to_insert.push(Self::copy_from(container, id, from, updates)?);
                Self::cut_tail(ctx, container, id, from)?;
            } else {
                Self::update_in_place(ctx, container, id, updates)?;
            }
        }
        flush_inserts(ctx, container, &to_insert)
    }

    fn increment_segments_until(
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        ids: &[TxObjectId],
        range: DateRange,
        updates: &[AttributeUpdate],
    ) -> BitemporalResult<()> {
        let (from, end) = (range.start, range.end);
        let mut to_insert = Vec::with_capacity(ids.len() + 1);
        for &id in ids {
            let (active_from, active_to) = bounds(container, id)?;
            if active_to > end {
                to_insert.push(Self::split_tail_end(container, id, end)?);
                Self::cut_tail(ctx, container, id, end)?;
            }
            if active_from < from {
                to_insert.push(Self::copy_from(container, id, from, updates)?);
                Self::cut_tail(ctx, container, id, from)?;
            } else {
                Self::update_in_place(ctx, container, id, updates)?;
            }
        }
        flush_inserts(ctx, container, &to_insert)
    }

    fn insert_data(
        &self,
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
        mut data: Snapshot,
    ) -> BitemporalResult<()> {
        let business_date = Self::check_infinity_date(object)?;
        if container.get_active_data_for(Some(business_date)).is_some() {
            return Err(insert_conflict(object));
        }
        if data.business_to.is_none() {
            data.business_to = Some(infinity());
        }
        if data.business_from.is_none() {
            data.business_from = Some(business_from_for(ctx.config, business_date));
        }
        check_insert_overlap(ctx, container, object, data.business_range())?;
        insert_new(ctx, container, object, data)
    }

    fn insert_with_increment_to(
        &self,
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
        until: Option<Timestamp>,
    ) -> BitemporalResult<()> {
        let as_of = Self::check_infinity_date(object)?;
        let mut data = object.data_for_insert()?;
        if container.get_active_data_for(Some(as_of)).is_some() {
            return Err(insert_conflict(object));
        }
        let from = business_from_for(ctx.config, as_of);
        let range = match until {
            Some(until) => until_range(object, from, business_from_for(ctx.config, until))?,
            None => DateRange::open_ended(from),
        };
        let ids = segments_for(ctx, container, object, range)?;
        let Some(&earliest) = ids.last() else {
            if until.is_some() {
                data.business_to = Some(range.end);
            }
            return self.insert_data(ctx, container, object, data);
        };

        if data.business_from.is_none() {
            data.business_from = Some(from);
        }
        let (next_from, _) = bounds(container, earliest)?;
        data.business_to = Some(next_from);

        let increments = increments_from(&data);
        if !increments.is_empty() {
            match until {
                None => Self::increment_segments(ctx, container, &ids, next_from, &increments)?,
                Some(_) => Self::increment_segments_until(ctx, container, &ids, range, &increments)?,
            }
        }
        insert_new(ctx, container, object, data)
    }

    /// Allocates and logs the segment an update or update-until writes.
    fn insert_replacement(
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &DatedObject,
        update: &AttributeUpdate,
        mut data: Snapshot,
        range: DateRange,
    ) -> BitemporalResult<()> {
        update.apply(&mut data)?;
        data.business_from = Some(range.start);
        data.business_to = Some(range.end);
        let id = container.alloc(TxObject::replacing(object.committed_data().cloned(), data));
        flush_inserts(ctx, container, &[id])
    }
}

impl TemporalDirector for NonAuditedDirector {
    fn insert(
        &self,
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
    ) -> BitemporalResult<()> {
        let data = object.data_for_insert()?;
        self.insert_data(ctx, container, object, data)
    }

    fn insert_until(
        &self,
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
        until: Timestamp,
    ) -> BitemporalResult<()> {
        let end = business_from_for(ctx.config, until);
        let mut data = object.data_for_insert()?;
        segments::check_until_date(object, &mut data, end)?;
        self.insert_data(ctx, container, object, data)
    }

    fn insert_with_increment(
        &self,
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
    ) -> BitemporalResult<()> {
        self.insert_with_increment_to(ctx, container, object, None)
    }

    fn insert_with_increment_until(
        &self,
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
        until: Timestamp,
    ) -> BitemporalResult<()> {
        self.insert_with_increment_to(ctx, container, object, Some(until))
    }

    fn insert_for_recovery(
        &self,
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
    ) -> BitemporalResult<()> {
        let data = object.data_for_insert()?;
        if data.business_from.is_none() {
            return Err(TemporalError::MissingDate {
                key: object.describe(),
                field: "business_from",
            }
            .into());
        }
        if data.business_to.is_none() {
            return Err(TemporalError::MissingDate {
                key: object.describe(),
                field: "business_to",
            }
            .into());
        }
        self.insert_data(ctx, container, object, data)
    }

    fn update(
        &self,
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
        update: &AttributeUpdate,
    ) -> BitemporalResult<()> {
        let as_of = Self::check_infinity_date(object)?;
        container.enroll_in_write(ctx.tx, object.committed_data());
        let from = business_from_for(ctx.config, as_of);
        let ids = segments_for(ctx, container, object, DateRange::open_ended(from))?;

        let mut data_for_insert = None;
        for id in ids {
            let (active_from, active_to) = bounds(container, id)?;
            if active_from < from {
                data_for_insert = Some(container.object(id)?.data_for_read().successor());
                Self::cut_tail(ctx, container, id, from)?;
            } else if active_from == from && is_infinity(active_to) {
                Self::update_in_place(ctx, container, id, slice::from_ref(update))?;
            } else {
                data_for_insert = Some(container.object(id)?.data_for_read().successor());
                segments::delete(ctx, container, id)?;
            }
        }
        if let Some(data) = data_for_insert {
            let range = DateRange::open_ended(from);
            Self::insert_replacement(ctx, container, object, update, data, range)?;
        }
        object.clear_tx_data();
        Ok(())
    }

    fn update_until(
        &self,
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
        update: &AttributeUpdate,
        until: Timestamp,
    ) -> BitemporalResult<()> {
        let as_of = Self::check_infinity_date(object)?;
        container.enroll_in_write(ctx.tx, object.committed_data());
        let from = business_from_for(ctx.config, as_of);
        let range = until_range(object, from, business_from_for(ctx.config, until))?;
        let end = range.end;
        let ids = segments_for(ctx, container, object, range)?;
        let source = object.resolve_tx_data(container)?;

        let mut must_insert = false;
        let mut to_insert = Vec::with_capacity(2);
        for id in ids {
            let (active_from, active_to) = bounds(container, id)?;
            if active_from < from {
                if active_to > end {
                    to_insert.push(Self::split_tail_end(container, id, end)?);
                }
                Self::cut_tail(ctx, container, id, from)?;
                must_insert = true;
            } else if active_from == from && active_to == end {
                Self::update_in_place(ctx, container, id, slice::from_ref(update))?;
            } else if active_from == from && active_to > end {
                to_insert.push(Self::split_tail_end(container, id, end)?);
                Self::update_in_place(ctx, container, id, slice::from_ref(update))?;
                Self::cut_tail(ctx, container, id, end)?;
            } else {
                if active_to > end {
                    to_insert.push(Self::split_tail_end(container, id, end)?);
                }
                segments::delete(ctx, container, id)?;
                must_insert = true;
            }
        }
        flush_inserts(ctx, container, &to_insert)?;

        if must_insert {
            Self::insert_replacement(ctx, container, object, update, source.successor(), range)?;
        }
        object.clear_tx_data();
        Ok(())
    }

    fn in_place_update(
        &self,
        _ctx: &mut TxContext<'_>,
        _container: &mut dyn TemporalContainer,
        _object: &mut DatedObject,
        _update: &AttributeUpdate,
    ) -> BitemporalResult<()> {
        Err(BitemporalError::unsupported("in_place_update", "Not implemented yet!"))
    }

    fn increment(
        &self,
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
        update: &AttributeUpdate,
    ) -> BitemporalResult<()> {
        let as_of = Self::check_infinity_date(object)?;
        container.enroll_in_write(ctx.tx, object.committed_data());
        let from = business_from_for(ctx.config, as_of);
        let ids = segments_for(ctx, container, object, DateRange::open_ended(from))?;
        Self::increment_segments(ctx, container, &ids, from, slice::from_ref(update))?;
        object.clear_tx_data();
        Ok(())
    }

    fn increment_until(
        &self,
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
        update: &AttributeUpdate,
        until: Timestamp,
    ) -> BitemporalResult<()> {
        let as_of = Self::check_infinity_date(object)?;
        container.enroll_in_write(ctx.tx, object.committed_data());
        let from = business_from_for(ctx.config, as_of);
        let range = until_range(object, from, business_from_for(ctx.config, until))?;
        let ids = segments_for(ctx, container, object, range)?;
        Self::increment_segments_until(ctx, container, &ids, range, slice::from_ref(update))?;
        object.clear_tx_data();
        Ok(())
    }

    fn terminate(
        &self,
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
    ) -> BitemporalResult<()> {
        let as_of = Self::check_infinity_date(object)?;
        container.enroll_in_write(ctx.tx, object.committed_data());
        let from = business_from_for(ctx.config, as_of);
        let ids = segments_for(ctx, container, object, DateRange::open_ended(from))?;
        for id in ids {
            if bounds(container, id)?.0 < from {
                Self::cut_tail(ctx, container, id, from)?;
            } else {
                segments::delete(ctx, container, id)?;
            }
        }
        object.set_persistence(PersistenceState::Deleted);
        Ok(())
    }

    fn terminate_until(
        &self,
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
        until: Timestamp,
    ) -> BitemporalResult<()> {
        let as_of = Self::check_infinity_date(object)?;
        container.enroll_in_write(ctx.tx, object.committed_data());
        let from = business_from_for(ctx.config, as_of);
        let range = until_range(object, from, business_from_for(ctx.config, until))?;
        let end = range.end;
        let ids = segments_for(ctx, container, object, range)?;

        let mut to_insert = Vec::with_capacity(2);
        for id in ids {
            let (active_from, active_to) = bounds(container, id)?;
            if active_to > end {
                to_insert.push(Self::split_tail_end(container, id, end)?);
            }
            if active_from < from {
                Self::cut_tail(ctx, container, id, from)?;
            } else {
                segments::delete(ctx, container, id)?;
            }
        }
        flush_inserts(ctx, container, &to_insert)?;
        object.set_persistence(PersistenceState::Deleted);
        Ok(())
    }

    fn purge(
        &self,
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
    ) -> BitemporalResult<()> {
        Self::check_infinity_date(object)?;
        segments::purge(ctx, container, object)
    }

    fn inactivate_for_archiving(
        &self,
        _ctx: &mut TxContext<'_>,
        _container: &mut dyn TemporalContainer,
        _object: &mut DatedObject,
        _processing_to: Timestamp,
        _business_to: Option<Timestamp>,
    ) -> BitemporalResult<()> {
        Err(BitemporalError::unsupported(
            "inactivate_for_archiving",
            "entities without a processing axis cannot be archived",
        ))
    }
}

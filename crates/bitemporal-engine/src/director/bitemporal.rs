//! Director for entities with both a business and a processing axis.
//!
//! Committed segments are never rewritten: an edit closes their processing
//! range at the transaction's processing timestamp and inserts replacement
//! segments. Segments created earlier in the same transaction are edited in
//! place.

use std::slice;

use chrono::Duration;

use bitemporal_core::errors::{BitemporalError, BitemporalResult, TemporalError};
use bitemporal_core::models::{
    infinity, is_infinity, AttributeUpdate, DateRange, PersistenceState, Snapshot, Timestamp,
    TxObject,
};
use tracing::warn;

use super::segments::{
    self, apply_all, apply_logged, bounds, business_from_for, check_insert_overlap,
    copy_for_insert, edit_data, flush_inserts, increments_from, insert_conflict, insert_new,
    is_new, log_update, log_updates, segments_for, until_range,
};
use super::TemporalDirector;
use crate::container::{TemporalContainer, TxObjectId};
use crate::context::TxContext;
use crate::object::DatedObject;

#[derive(Debug, Clone, Copy, Default)]
pub struct BitemporalDirector;

impl BitemporalDirector {
    /// Only the current processing-time view may be edited, and only at a
    /// finite business date. Returns that business date.
    fn check_infinity_date(object: &DatedObject) -> BitemporalResult<Timestamp> {
        if !object.is_current_view() {
            return Err(TemporalError::ImmutableHistory {
                key: object.describe(),
            }
            .into());
        }
        let business_date = object.require_business_date()?;
        if is_infinity(business_date) {
            return Err(TemporalError::InfiniteBusinessDate {
                key: object.describe(),
            }
            .into());
        }
        Ok(business_date)
    }

    fn may_cut_tail_without_inactivation(
        ctx: &TxContext<'_>,
        container: &dyn TemporalContainer,
        id: TxObjectId,
    ) -> BitemporalResult<bool> {
        let (_, active_to) = bounds(container, id)?;
        Ok(is_new(container, id)?
            || (is_infinity(active_to) && !ctx.config.inactivate_on_same_day_update))
    }

    /// Closes a committed segment's processing range at `processing_to`. New
    /// segments, and segments whose processing range would be empty, are
    /// deleted instead.
    fn inactivate(
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        id: TxObjectId,
        processing_to: Timestamp,
    ) -> BitemporalResult<()> {
        let wrapper = container.object(id)?;
        if wrapper.is_new_in_this_transaction() {
            return segments::delete(ctx, container, id);
        }
        let committed_from = wrapper.committed_data().and_then(|c| c.processing_from);
        if committed_from == Some(processing_to) && ctx.config.delete_on_changed_too_fast {
            warn!(
                key = %container.key(),
                processing_from = %processing_to,
                "object has changed too fast, deleting instead of inactivating"
            );
            return segments::delete(ctx, container, id);
        }

        {
            let wrapper = container.object_mut(id)?;
            if let Some(committed) = wrapper.committed_data() {
                ctx.cache.remove_dated_data(committed);
            }
            let data = wrapper.data_for_write();
            ctx.cache.remove_dated_data(data);
            data.processing_to = Some(processing_to);
        }
        container.inactivate_object(id);

        let stamp = Self::business_to_stamp(ctx, container, id, processing_to)?;
        let wrapper = container.object_mut(id)?;
        if let Some(update) = &stamp {
            update.apply(wrapper.data_for_write())?;
        }
        ctx.cache.put_dated_data(wrapper.data_for_read());
        if let Some(update) = &stamp {
            log_update(ctx, container, id, update)?;
        }
        log_update(
            ctx,
            container,
            id,
            &AttributeUpdate::ProcessingTo {
                value: processing_to,
            },
        )
    }

    /// Business-to for a segment that was open-ended and already in effect,
    /// when inactivation is configured to close it.
    fn business_to_stamp(
        ctx: &TxContext<'_>,
        container: &dyn TemporalContainer,
        id: TxObjectId,
        today: Timestamp,
    ) -> BitemporalResult<Option<AttributeUpdate>> {
        if !ctx.config.stamp_business_to_on_inactivation {
            return Ok(None);
        }
        let (active_from, active_to) = bounds(container, id)?;
        if !is_infinity(active_to) || active_from > today {
            return Ok(None);
        }
        let days = i64::from(ctx.config.inactivation_business_to_days);
        Ok(Some(AttributeUpdate::BusinessTo {
            value: today + Duration::days(days),
        }))
    }

    /// Truncates a segment at `from` in place and keeps it active.
    fn cut_tail(
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        id: TxObjectId,
        from: Timestamp,
    ) -> BitemporalResult<()> {
        container.void_data(id);
        let update = Self::cut_tail_without_update(ctx, container, id, from, None)?;
        container.add_active_data(id);
        if container.object(id)?.needs_transactional_update() {
            log_update(ctx, container, id, &update)?;
        }
        Ok(())
    }

    fn cut_tail_without_update(
        ctx: &TxContext<'_>,
        container: &mut dyn TemporalContainer,
        id: TxObjectId,
        from: Timestamp,
        processing_from: Option<Timestamp>,
    ) -> BitemporalResult<AttributeUpdate> {
        edit_data(ctx, container, id, |data| {
            data.business_to = Some(from);
            if let Some(stamp) = processing_from {
                data.processing_from = Some(stamp);
            }
        })?;
        container.object_mut(id)?.bump_committed_version();
        Ok(AttributeUpdate::BusinessTo { value: from })
    }

    /// Inactivates a committed segment that starts before `from` and queues
    /// its head `[active_from, from)` as a new segment.
    fn split_committed_head(
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        id: TxObjectId,
        from: Timestamp,
        tx_start: Timestamp,
    ) -> BitemporalResult<TxObjectId> {
        let head = copy_for_insert(container, id, |_| Ok(()))?;
        Self::inactivate(ctx, container, id, tx_start)?;
        Self::cut_tail_without_update(ctx, container, head, from, Some(tx_start))?;
        Ok(head)
    }

    /// Copy of the segment covering `[end, active_to)`.
    fn split_tail_end(
        container: &mut dyn TemporalContainer,
        id: TxObjectId,
        end: Timestamp,
        tx_start: Timestamp,
    ) -> BitemporalResult<TxObjectId> {
        copy_for_insert(container, id, |data| {
            data.business_from = Some(end);
            data.processing_from = Some(tx_start);
            Ok(())
        })
    }

    /// Rewrites a committed open-ended segment without keeping history: the
    /// old row is logically deleted and the same wrapper reinserted with a new
    /// processing-from.
    fn update_committed_in_place(
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        id: TxObjectId,
        updates: &[AttributeUpdate],
        tx_start: Timestamp,
    ) -> BitemporalResult<()> {
        {
            let wrapper = container.object_mut(id)?;
            wrapper.set_to_be_updated();
            if let Some(committed) = wrapper.committed_data() {
                ctx.cache.remove_dated_data(committed);
            }
            ctx.tx.enroll_object(&wrapper.copy_for_delete());
            let data = wrapper.data_for_write();
            ctx.cache.remove_dated_data(data);
            data.processing_from = Some(tx_start);
            apply_all(updates, data)?;
            ctx.cache.put_dated_data(data);
        }
        container.update_in_place_data(id)?;
        if container.object(id)?.needs_transactional_update() {
            log_update(
                ctx,
                container,
                id,
                &AttributeUpdate::ProcessingFrom { value: tx_start },
            )?;
            log_updates(ctx, container, id, updates)?;
        }
        Ok(())
    }

    fn copy_for_increment(
        container: &mut dyn TemporalContainer,
        id: TxObjectId,
        updates: &[AttributeUpdate],
        tx_start: Timestamp,
    ) -> BitemporalResult<TxObjectId> {
        copy_for_insert(container, id, |data| {
            apply_all(updates, data)?;
            data.processing_from = Some(tx_start);
            Ok(())
        })
    }

    /// Applies `updates` to every segment from `from` onwards.
    fn increment_segments(
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        ids: &[TxObjectId],
        from: Timestamp,
        updates: &[AttributeUpdate],
    ) -> BitemporalResult<()> {
        let tx_start = ctx.processing_timestamp();
        let mut to_insert = Vec::with_capacity(ids.len());
        for &id in ids {
            let (active_from, active_to) = bounds(container, id)?;
            if active_from < from {
                let tail = Self::copy_for_increment(container, id, updates, tx_start)?;
                edit_data(ctx, container, tail, |data| data.business_from = Some(from))?;
                to_insert.push(tail);
                if Self::may_cut_tail_without_inactivation(ctx, container, id)? {
                    Self::cut_tail(ctx, container, id, from)?;
                } else {
                    to_insert.push(Self::split_committed_head(ctx, container, id, from, tx_start)?);
                }
            } else if is_new(container, id)? {
                apply_logged(ctx, container, id, updates)?;
            } else if active_from == from
                && is_infinity(active_to)
                && !ctx.config.inactivate_on_same_day_update
            {
                Self::update_committed_in_place(ctx, container, id, updates, tx_start)?;
            } else {
                to_insert.push(Self::copy_for_increment(container, id, updates, tx_start)?);
                Self::inactivate(ctx, container, id, tx_start)?;
            }
        }
        flush_inserts(ctx, container, &to_insert)
    }

    /// Applies `updates` to the part of every segment inside `[from, end)`.
    fn increment_segments_until(
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        ids: &[TxObjectId],
        range: DateRange,
        updates: &[AttributeUpdate],
    ) -> BitemporalResult<()> {
        let (from, end) = (range.start, range.end);
        let tx_start = ctx.processing_timestamp();
        let update_in_place = !ctx.config.inactivate_on_same_day_update;
        let mut to_insert = Vec::with_capacity(ids.len() + 2);
        for &id in ids {
            let (active_from, active_to) = bounds(container, id)?;
            if update_in_place || is_new(container, id)? {
                if active_from >= from && active_to <= end {
                    Self::update_in_place_until(ctx, container, id, updates, tx_start)?;
                } else if active_from < from {
                    if active_to > end {
                        to_insert.push(Self::split_tail_end(container, id, end, tx_start)?);
                    }
                    to_insert.push(Self::increment_until_segment(
                        container, id, updates, range, tx_start,
                    )?);
                    Self::cut_tail(ctx, container, id, from)?;
                } else {
                    to_insert.push(Self::split_tail_end(container, id, end, tx_start)?);
                    Self::cut_tail(ctx, container, id, end)?;
                    Self::update_in_place_until(ctx, container, id, updates, tx_start)?;
                }
            } else {
                if active_to > end {
                    to_insert.push(Self::split_tail_end(container, id, end, tx_start)?);
                }
                to_insert.push(Self::increment_until_segment(
                    container, id, updates, range, tx_start,
                )?);
                if active_from < from {
                    to_insert.push(Self::split_committed_head(ctx, container, id, from, tx_start)?);
                } else {
                    Self::inactivate(ctx, container, id, tx_start)?;
                }
            }
        }
        flush_inserts(ctx, container, &to_insert)
    }

    /// Copy of the overlap between a segment and `range`, with `updates` applied.
    fn increment_until_segment(
        container: &mut dyn TemporalContainer,
        id: TxObjectId,
        updates: &[AttributeUpdate],
        range: DateRange,
        tx_start: Timestamp,
    ) -> BitemporalResult<TxObjectId> {
        let (active_from, active_to) = bounds(container, id)?;
        copy_for_insert(container, id, |data| {
            data.processing_from = Some(tx_start);
            data.business_from = Some(active_from.max(range.start));
            data.business_to = Some(active_to.min(range.end));
            apply_all(updates, data)
        })
    }

    fn update_in_place_until(
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        id: TxObjectId,
        updates: &[AttributeUpdate],
        tx_start: Timestamp,
    ) -> BitemporalResult<()> {
        let processing_from = container.object(id)?.data_for_read().processing_from;
        if processing_from == Some(tx_start) {
            apply_logged(ctx, container, id, updates)
        } else {
            Self::update_committed_in_place(ctx, container, id, updates, tx_start)
        }
    }

    /// Final segment of an open-ended update.
    fn insert_for_update(
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        update: &AttributeUpdate,
        mut data: Snapshot,
        tx_start: Timestamp,
        from: Timestamp,
    ) -> BitemporalResult<()> {
        update.apply(&mut data)?;
        data.processing_from = Some(tx_start);
        data.processing_to = Some(infinity());
        data.business_from = Some(from);
        data.business_to = Some(infinity());
        let id = container.make_uninserted_data_active_and_create_object(ctx.tx, data);
        let wrapper = container.object(id)?;
        ctx.cache.put_dated_data(wrapper.data_for_read());
        ctx.tx.insert(wrapper);
        Ok(())
    }

    fn successor_of(container: &dyn TemporalContainer, id: TxObjectId) -> BitemporalResult<Snapshot> {
        Ok(container.object(id)?.data_for_read().successor())
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
        data.processing_from = Some(ctx.processing_timestamp());
        data.processing_to = Some(infinity());
        if data.business_to.is_none() {
            data.business_to = Some(infinity());
        }
        if data.business_from.is_none() {
            data.business_from = Some(business_from_for(ctx.config, business_date));
        }
        check_insert_overlap(ctx, container, object, data.business_range())?;
        insert_new(ctx, container, object, data)
    }

    /// Inserts ahead of existing segments, adding the inserted numeric values
    /// to the segments it overlaps.
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

        data.processing_from = Some(ctx.processing_timestamp());
        data.processing_to = Some(infinity());
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

    /// Shared body of `terminate` and `terminate_until`: closes `range` with
    /// no replacement.
    fn terminate_range(
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
        range: DateRange,
        bounded: bool,
    ) -> BitemporalResult<()> {
        let (from, end) = (range.start, range.end);
        let ids = segments_for(ctx, container, object, range)?;
        let tx_start = ctx.processing_timestamp();
        let mut to_insert = Vec::with_capacity(2);
        for id in ids {
            let (active_from, active_to) = bounds(container, id)?;
            if bounded && active_to > end {
                to_insert.push(Self::split_tail_end(container, id, end, tx_start)?);
            }
            if active_from < from {
                let cut_in_place = if bounded {
                    is_new(container, id)?
                } else {
                    Self::may_cut_tail_without_inactivation(ctx, container, id)?
                };
                if cut_in_place {
                    Self::cut_tail(ctx, container, id, from)?;
                } else {
                    to_insert.push(Self::split_committed_head(ctx, container, id, from, tx_start)?);
                }
            } else if !bounded
                && active_from == from
                && is_infinity(active_to)
                && !is_new(container, id)?
                && !ctx.config.inactivate_on_same_day_update
            {
                segments::delete(ctx, container, id)?;
            } else {
                Self::inactivate(ctx, container, id, tx_start)?;
            }
        }
        flush_inserts(ctx, container, &to_insert)?;
        object.set_persistence(PersistenceState::Deleted);
        Ok(())
    }
}

impl TemporalDirector for BitemporalDirector {
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
        let key = object.describe();
        let business_date = object.require_business_date()?;
        if is_infinity(business_date) {
            return Err(TemporalError::InfiniteBusinessDate { key }.into());
        }
        let data = object.data_for_insert()?;
        let required = [
            ("business_from", data.business_from),
            ("business_to", data.business_to),
            ("processing_from", data.processing_from),
            ("processing_to", data.processing_to),
        ];
        if let Some(&(field, _)) = required.iter().find(|(_, value)| value.is_none()) {
            return Err(TemporalError::MissingDate { key, field }.into());
        }
        if !data.matches_processing_date(object.processing_date()) {
            return Err(TemporalError::DateOutOfRange {
                key,
                axis: "processing",
            }
            .into());
        }
        if !data.matches_business_date(business_date) {
            return Err(TemporalError::DateOutOfRange {
                key,
                axis: "business",
            }
            .into());
        }
        if data.is_current() && container.get_active_data_for(Some(business_date)).is_some() {
            return Err(insert_conflict(object));
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
        let as_of = Self::check_infinity_date(object)?;
        container.enroll_in_write(ctx.tx, object.committed_data());
        let from = business_from_for(ctx.config, as_of);
        let ids = segments_for(ctx, container, object, DateRange::open_ended(from))?;
        let tx_start = ctx.processing_timestamp();

        // The segment covering `from` comes last and seeds the new segment.
        let mut data_for_insert = None;
        for id in ids {
            let (active_from, active_to) = bounds(container, id)?;
            if active_from < from {
                data_for_insert = Some(Self::successor_of(container, id)?);
                if Self::may_cut_tail_without_inactivation(ctx, container, id)? {
                    Self::cut_tail(ctx, container, id, from)?;
                } else {
                    let head = Self::split_committed_head(ctx, container, id, from, tx_start)?;
                    flush_inserts(ctx, container, &[head])?;
                }
            } else if active_from == from && is_infinity(active_to) && is_new(container, id)? {
                apply_logged(ctx, container, id, slice::from_ref(update))?;
            } else if active_from == from
                && is_infinity(active_to)
                && !ctx.config.inactivate_on_same_day_update
            {
                Self::update_committed_in_place(ctx, container, id, slice::from_ref(update), tx_start)?;
            } else {
                data_for_insert = Some(Self::successor_of(container, id)?);
                Self::inactivate(ctx, container, id, tx_start)?;
            }
        }
        if let Some(data) = data_for_insert {
            Self::insert_for_update(ctx, container, update, data, tx_start, from)?;
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
        let tx_start = ctx.processing_timestamp();
        let source = object.resolve_tx_data(container)?;

        let mut must_insert = false;
        let mut to_insert = Vec::with_capacity(2);
        for id in ids {
            let (active_from, active_to) = bounds(container, id)?;
            if active_from < from {
                if active_to > end {
                    to_insert.push(Self::split_tail_end(container, id, end, tx_start)?);
                }
                if is_new(container, id)? {
                    Self::cut_tail(ctx, container, id, from)?;
                } else {
                    to_insert.push(Self::split_committed_head(ctx, container, id, from, tx_start)?);
                }
                must_insert = true;
            } else if active_from == from && active_to == end && is_new(container, id)? {
                // exact match
                apply_logged(ctx, container, id, slice::from_ref(update))?;
            } else {
                if active_to > end {
                    to_insert.push(Self::split_tail_end(container, id, end, tx_start)?);
                }
                Self::inactivate(ctx, container, id, tx_start)?;
                must_insert = true;
            }
        }
        flush_inserts(ctx, container, &to_insert)?;

        if must_insert {
            let mut data = source.successor();
            update.apply(&mut data)?;
            data.processing_from = Some(tx_start);
            data.processing_to = Some(infinity());
            data.business_from = Some(from);
            data.business_to = Some(end);
            let id = container.alloc(TxObject::replacing(object.committed_data().cloned(), data));
            flush_inserts(ctx, container, &[id])?;
        }
        object.clear_tx_data();
        Ok(())
    }

    fn in_place_update(
        &self,
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
        update: &AttributeUpdate,
    ) -> BitemporalResult<()> {
        let as_of = Self::check_infinity_date(object)?;
        container.enroll_in_write(ctx.tx, object.committed_data());
        let from = business_from_for(ctx.config, as_of);
        let end = object.resolve_tx_data(container)?.business_end();
        let ids = segments_for(ctx, container, object, DateRange::new(from, end))?;
        for id in ids {
            segments::apply_in_place(ctx, container, id, slice::from_ref(update))?;
            log_update(ctx, container, id, update)?;
        }
        object.clear_tx_data();
        Ok(())
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
        Self::terminate_range(ctx, container, object, DateRange::open_ended(from), false)
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
        Self::terminate_range(ctx, container, object, range, true)
    }

    fn purge(
        &self,
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
    ) -> BitemporalResult<()> {
        segments::purge(ctx, container, object)
    }

    fn inactivate_for_archiving(
        &self,
        ctx: &mut TxContext<'_>,
        container: &mut dyn TemporalContainer,
        object: &mut DatedObject,
        processing_to: Timestamp,
        business_to: Option<Timestamp>,
    ) -> BitemporalResult<()> {
        Self::check_infinity_date(object)?;
        container.enroll_in_write(ctx.tx, object.committed_data());
        let current = object.resolve_tx_data(container)?;
        let from = current.business_start();
        let ids = segments_for(ctx, container, object, current.business_range())?;
        let id = segments::single_segment(&ids, object)?;
        if bounds(container, id)?.0 != from {
            return Err(BitemporalError::InvariantViolation(format!(
                "should not get here: stale data in object {}",
                object.describe()
            )));
        }

        if is_new(container, id)? {
            segments::delete(ctx, container, id)?;
        } else {
            {
                let wrapper = container.object_mut(id)?;
                if let Some(committed) = wrapper.committed_data() {
                    ctx.cache.remove_dated_data(committed);
                }
                let data = wrapper.data_for_write();
                ctx.cache.remove_dated_data(data);
                if let Some(value) = business_to {
                    data.business_to = Some(value);
                }
                data.processing_to = Some(processing_to);
            }
            if let Some(value) = business_to {
                log_update(ctx, container, id, &AttributeUpdate::BusinessTo { value })?;
            }
            container.inactivate_object(id);
            ctx.cache.put_dated_data(container.object(id)?.data_for_read());
            log_update(
                ctx,
                container,
                id,
                &AttributeUpdate::ProcessingTo {
                    value: processing_to,
                },
            )?;
        }
        object.clear_tx_data();
        object.set_persistence(PersistenceState::Deleted);
        Ok(())
    }
}

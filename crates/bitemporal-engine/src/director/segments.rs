//! Segment helpers shared by the three directors: ordering, bounds, the
//! delete/insert primitives and the logging of field-level updates.

use chrono::Duration;

use bitemporal_core::config::TemporalConfig;
use bitemporal_core::errors::{BitemporalError, BitemporalResult, TemporalError};
use bitemporal_core::models::{
    AttributeUpdate, DateRange, PersistenceState, Snapshot, Timestamp, TxObject,
};
use tracing::debug;

use crate::cache_edit::reindex;
use crate::container::{TemporalContainer, TxObjectId};
use crate::context::TxContext;
use crate::object::DatedObject;

/// First business date covered by an edit effective at `date`.
pub(crate) fn business_from_for(config: &TemporalConfig, date: Timestamp) -> Timestamp {
    if config.business_to_is_inclusive {
        date - Duration::days(1)
    } else {
        date
    }
}

/// Loads `range` into the container and returns the intersecting wrappers,
/// latest business-from first.
pub(crate) fn segments_for(
    ctx: &mut TxContext<'_>,
    container: &mut dyn TemporalContainer,
    object: &DatedObject,
    range: DateRange,
) -> BitemporalResult<Vec<TxObjectId>> {
    let mut ids = container.get_objects_for_range(ctx, object, range)?;
    ids.sort_by_key(|id| {
        std::cmp::Reverse(
            container
                .object(*id)
                .map(|o| o.data_for_read().business_start())
                .ok(),
        )
    });
    Ok(ids)
}

/// `[business_from, business_to)` of a wrapper's working copy.
pub(crate) fn bounds(
    container: &dyn TemporalContainer,
    id: TxObjectId,
) -> BitemporalResult<(Timestamp, Timestamp)> {
    let data = container.object(id)?.data_for_read();
    Ok((data.business_start(), data.business_end()))
}

pub(crate) fn is_new(container: &dyn TemporalContainer, id: TxObjectId) -> BitemporalResult<bool> {
    Ok(container.object(id)?.is_new_in_this_transaction())
}

/// Non-zero numeric attributes of an inserted snapshot, as increments for
/// the segments it lands in front of.
pub(crate) fn increments_from(data: &Snapshot) -> Vec<AttributeUpdate> {
    data.attributes
        .iter()
        .filter(|(_, value)| value.is_numeric() && !value.is_zero())
        .map(|(name, value)| AttributeUpdate::increment(name, value.clone()))
        .collect()
}

pub(crate) fn apply_all(updates: &[AttributeUpdate], data: &mut Snapshot) -> Result<(), TemporalError> {
    for update in updates {
        update.apply(data)?;
    }
    Ok(())
}

/// Rewrites a wrapper's working copy under the cache remove/put protocol.
pub(crate) fn edit_data<R>(
    ctx: &TxContext<'_>,
    container: &mut dyn TemporalContainer,
    id: TxObjectId,
    edit: impl FnOnce(&mut Snapshot) -> R,
) -> BitemporalResult<R> {
    let wrapper = container.object_mut(id)?;
    Ok(reindex(ctx.cache, wrapper.data_for_write(), edit))
}

/// Appends `update` to the log for the wrapper.
pub(crate) fn log_update(
    ctx: &mut TxContext<'_>,
    container: &mut dyn TemporalContainer,
    id: TxObjectId,
    update: &AttributeUpdate,
) -> BitemporalResult<()> {
    let wrapper = container.object_mut(id)?;
    wrapper.set_to_be_updated();
    ctx.tx.update(wrapper, update);
    Ok(())
}

pub(crate) fn log_updates(
    ctx: &mut TxContext<'_>,
    container: &mut dyn TemporalContainer,
    id: TxObjectId,
    updates: &[AttributeUpdate],
) -> BitemporalResult<()> {
    for update in updates {
        log_update(ctx, container, id, update)?;
    }
    Ok(())
}

/// Registers a replacement copy of `id` with the arena. Bumps the version of
/// the superseded data first, so the copy is always strictly newer.
pub(crate) fn copy_for_insert(
    container: &mut dyn TemporalContainer,
    id: TxObjectId,
    edit: impl FnOnce(&mut Snapshot) -> Result<(), TemporalError>,
) -> BitemporalResult<TxObjectId> {
    let wrapper = container.object_mut(id)?;
    wrapper.bump_versions();
    let mut copy = wrapper.copy_for_insert();
    edit(copy.data_for_write())?;
    Ok(container.alloc(copy))
}

/// Removes a wrapper's rows outright: no history is kept.
pub(crate) fn delete(
    ctx: &mut TxContext<'_>,
    container: &mut dyn TemporalContainer,
    id: TxObjectId,
) -> BitemporalResult<()> {
    {
        let wrapper = container.object_mut(id)?;
        if let Some(committed) = wrapper.committed_data() {
            ctx.cache.remove_dated_data(committed);
        }
        ctx.cache.remove_dated_data(wrapper.data_for_read());
        wrapper.bump_versions();
    }
    container.delete_in_tx_object(id);
    let wrapper = container.object_mut(id)?;
    wrapper.mark_deleted();
    ctx.tx.delete(wrapper);
    Ok(())
}

/// Enlists freshly allocated segments, indexes them and logs their inserts.
pub(crate) fn flush_inserts(
    ctx: &mut TxContext<'_>,
    container: &mut dyn TemporalContainer,
    ids: &[TxObjectId],
) -> BitemporalResult<()> {
    for id in ids {
        container.add_object_for_tx(ctx.tx, *id);
        let wrapper = container.object(*id)?;
        ctx.cache.put_dated_data(wrapper.data_for_read());
        ctx.tx.insert(wrapper);
    }
    Ok(())
}

/// New data becomes an active wrapper and a logged insert.
pub(crate) fn insert_new(
    ctx: &mut TxContext<'_>,
    container: &mut dyn TemporalContainer,
    object: &mut DatedObject,
    data: Snapshot,
) -> BitemporalResult<()> {
    let id = container.make_uninserted_data_active_and_create_object(ctx.tx, data.clone());
    ctx.tx.insert(container.object(id)?);
    ctx.cache.put(&data);
    object.set_current_data(data);
    object.clear_tx_data();
    object.set_persistence(PersistenceState::Persisted);
    Ok(())
}

pub(crate) fn check_until_date(
    object: &DatedObject,
    data: &mut Snapshot,
    end: Timestamp,
) -> Result<(), TemporalError> {
    match data.business_to {
        None => {
            data.business_to = Some(end);
            Ok(())
        }
        Some(current) if current == end => Ok(()),
        Some(current) => Err(TemporalError::UntilDateMismatch {
            key: object.describe(),
            expected: end.to_rfc3339(),
            actual: current.to_rfc3339(),
        }),
    }
}

/// `[from, end)` of an until edit; an empty range has nothing to edit.
pub(crate) fn until_range(
    object: &DatedObject,
    from: Timestamp,
    end: Timestamp,
) -> Result<DateRange, TemporalError> {
    let range = DateRange::new(from, end);
    if range.is_empty() {
        return Err(TemporalError::DateOutOfRange {
            key: object.describe(),
            axis: "business",
        });
    }
    Ok(range)
}

/// Applies `updates` to a wrapper's working copy in place.
pub(crate) fn apply_in_place(
    ctx: &TxContext<'_>,
    container: &mut dyn TemporalContainer,
    id: TxObjectId,
    updates: &[AttributeUpdate],
) -> BitemporalResult<()> {
    edit_data(ctx, container, id, |data| apply_all(updates, data))?.map_err(Into::into)
}

/// In-place application that also reaches the log once the wrapper's insert
/// has been written.
pub(crate) fn apply_logged(
    ctx: &mut TxContext<'_>,
    container: &mut dyn TemporalContainer,
    id: TxObjectId,
    updates: &[AttributeUpdate],
) -> BitemporalResult<()> {
    apply_in_place(ctx, container, id, updates)?;
    if container.object(id)?.needs_transactional_update() {
        log_updates(ctx, container, id, updates)?;
    }
    Ok(())
}

pub(crate) fn insert_conflict(object: &DatedObject) -> BitemporalError {
    BitemporalError::conflict(object.describe(), "cannot insert data. data already exists")
}

/// Refuses an insert whose business range overlaps a segment that is still
/// active. The range is loaded first, so committed rows count too.
pub(crate) fn check_insert_overlap(
    ctx: &mut TxContext<'_>,
    container: &mut dyn TemporalContainer,
    object: &DatedObject,
    range: DateRange,
) -> BitemporalResult<()> {
    let ids = container.get_objects_for_range(ctx, object, range)?;
    for id in ids {
        let data = container.object(id)?.data_for_read();
        if container.get_active_data_from_data(data).is_some() {
            return Err(insert_conflict(object));
        }
    }
    Ok(())
}

/// The wrapper an audit-only edit or an archiving edit acts on.
pub(crate) fn single_segment(ids: &[TxObjectId], object: &DatedObject) -> BitemporalResult<TxObjectId> {
    match ids {
        [id] => Ok(*id),
        _ => Err(BitemporalError::InvariantViolation(format!(
            "should not get here: stale data in object {} ({} segments)",
            object.describe(),
            ids.len()
        ))),
    }
}

/// Removes every version of the object's identity from the cache and the
/// container, in any state.
pub(crate) fn purge(
    ctx: &mut TxContext<'_>,
    container: &mut dyn TemporalContainer,
    object: &mut DatedObject,
) -> BitemporalResult<()> {
    container.enroll_in_write(ctx.tx, object.committed_data());
    let passed_in = object.resolve_tx_data(container)?;

    let current = TxObject::committed(passed_in.clone()).copy_for_delete();
    ctx.tx.enroll_object(&current);
    ctx.cache.remove_dated_data(&passed_in);

    for id in container.in_tx_objects() {
        container.object_mut(id)?.mark_deleted();
    }

    let others = ctx.cache.get_dated_data_ignoring_dates(container.key());
    debug!(key = %container.key(), rows = others.len(), "purging cached rows");
    for data in others {
        let tombstone = TxObject::committed(data).copy_for_delete();
        ctx.tx.enroll_object(&tombstone);
        ctx.cache.remove_dated_data(tombstone.data_for_read());
    }

    container.clear_all_objects();
    ctx.tx.purge(&current);
    object.clear_tx_data();
    object.set_persistence(PersistenceState::Deleted);
    Ok(())
}

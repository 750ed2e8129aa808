// src/repositories/mapper.rs
//
// Join-row -> aggregate reconstruction
//
// A LEFT JOIN yields one row per (parent x child) combination, with the child
// columns NULL when the parent has no children. Rows are grouped by parent key,
// child rows are folded into per-parent collections, and one aggregate is
// materialized per distinct parent key, ordered by that key.
//
// This module knows nothing about SQL: backends decode their rows into the
// row types below and hand them over.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDateTime;

use crate::domain::{Contact, Event, Group, Id, Registration, RegistrationStatus, Scout, Versioned};
use crate::error::{AppError, AppResult};

/// An aggregate under construction from the join rows sharing its key
pub trait PartialAggregate: Sized {
    type Row;
    type Output;

    fn parent_key(row: &Self::Row) -> Id;

    /// Called on first sight of a parent key, with parent columns only
    fn start(row: &Self::Row) -> Self;

    /// Folds the row's child columns (if any) into the partial aggregate
    fn absorb(&mut self, row: Self::Row);

    fn finish(self) -> Self::Output;
}

/// Groups `rows` by parent key and materializes one aggregate per key,
/// ordered by key ascending. Row arrival order is irrelevant.
///
/// The first row error aborts the fold.
pub fn fold_rows<P, I, E>(rows: I) -> Result<Vec<P::Output>, E>
where
    P: PartialAggregate,
    I: IntoIterator<Item = Result<P::Row, E>>,
{
    let mut partials: BTreeMap<Id, P> = BTreeMap::new();

    for row in rows {
        let row = row?;
        partials
            .entry(P::parent_key(&row))
            .or_insert_with(|| P::start(&row))
            .absorb(row);
    }

    Ok(partials.into_values().map(P::finish).collect())
}

/// Owned children positioned by an explicit order column.
///
/// Joins do not guarantee order and may repeat a child once per row of a
/// sibling join, so children are keyed by position: the sequence comes out
/// sorted by position with each position present once.
#[derive(Debug)]
pub struct OrderedChildren<C> {
    by_position: BTreeMap<i64, C>,
}

impl<C> OrderedChildren<C> {
    pub fn new() -> Self {
        Self {
            by_position: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, position: i64, child: C) {
        self.by_position.entry(position).or_insert(child);
    }

    pub fn into_vec(self) -> Vec<C> {
        self.by_position.into_values().collect()
    }
}

impl<C> Default for OrderedChildren<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Association targets deduplicated by child identity
#[derive(Debug)]
pub struct ChildSet<C> {
    by_id: BTreeMap<Id, C>,
}

impl<C: Ord> ChildSet<C> {
    pub fn new() -> Self {
        Self {
            by_id: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, id: Id, child: C) {
        self.by_id.entry(id).or_insert(child);
    }

    pub fn into_set(self) -> BTreeSet<C> {
        self.by_id.into_values().collect()
    }
}

impl<C: Ord> Default for ChildSet<C> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------
// Event <-> Group
// ---------------------------------------------------------------------

/// One row of `events LEFT JOIN event_groups LEFT JOIN member_groups`
#[derive(Debug, Clone)]
pub struct EventRow {
    pub event_id: Id,
    /// Parent columns; `participating_groups` is ignored
    pub event: Event,
    /// Present when the group columns are non-null
    pub group: Option<(Id, Group)>,
}

pub struct PartialEvent {
    event: Event,
    groups: ChildSet<Group>,
}

impl PartialAggregate for PartialEvent {
    type Row = EventRow;
    type Output = Event;

    fn parent_key(row: &EventRow) -> Id {
        row.event_id
    }

    fn start(row: &EventRow) -> Self {
        Self {
            event: row.event.clone(),
            groups: ChildSet::new(),
        }
    }

    fn absorb(&mut self, row: EventRow) {
        if let Some((group_id, group)) = row.group {
            self.groups.insert(group_id, group);
        }
    }

    fn finish(self) -> Event {
        Event {
            participating_groups: self.groups.into_set(),
            ..self.event
        }
    }
}

// ---------------------------------------------------------------------
// Scout <-> Contact, Scout <-> Group
// ---------------------------------------------------------------------

/// One row of `scouts LEFT JOIN scout_contacts LEFT JOIN scout_groups
/// LEFT JOIN member_groups`: contacts and groups are multiplied together.
#[derive(Debug, Clone)]
pub struct ScoutRow {
    pub scout_id: Id,
    /// Parent columns; `contacts` and `groups` are ignored
    pub scout: Scout,
    /// `(contact_order, contact)` when the contact columns are non-null
    pub contact: Option<(i64, Contact)>,
    pub group: Option<(Id, Group)>,
}

pub struct PartialScout {
    scout: Scout,
    contacts: OrderedChildren<Contact>,
    groups: ChildSet<Group>,
}

impl PartialAggregate for PartialScout {
    type Row = ScoutRow;
    type Output = Scout;

    fn parent_key(row: &ScoutRow) -> Id {
        row.scout_id
    }

    fn start(row: &ScoutRow) -> Self {
        Self {
            scout: row.scout.clone(),
            contacts: OrderedChildren::new(),
            groups: ChildSet::new(),
        }
    }

    fn absorb(&mut self, row: ScoutRow) {
        if let Some((position, contact)) = row.contact {
            self.contacts.insert(position, contact);
        }
        if let Some((group_id, group)) = row.group {
            self.groups.insert(group_id, group);
        }
    }

    fn finish(self) -> Scout {
        Scout {
            contacts: self.contacts.into_vec(),
            groups: self.groups.into_set(),
            ..self.scout
        }
    }
}

// ---------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------

/// The flat registration row: scout and event by id only.
///
/// This is also what the in-memory backend stores, so both backends embed
/// scouts and events through the same path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRecord {
    pub id: Option<Id>,
    pub version: i64,
    pub scout_id: Id,
    pub event_id: Id,
    pub note: String,
    pub status: RegistrationStatus,
    pub registration_date: NaiveDateTime,
    pub account_id: String,
}

impl RegistrationRecord {
    /// Flattens a registration; the embedded scout and event must be stored
    pub fn from_registration(registration: &Registration) -> AppResult<Self> {
        let scout_id = registration.scout.id.ok_or_else(|| {
            AppError::ConstraintViolation("Registration references an unsaved scout".to_string())
        })?;
        let event_id = registration.event.id.ok_or_else(|| {
            AppError::ConstraintViolation("Registration references an unsaved event".to_string())
        })?;

        Ok(Self {
            id: registration.id,
            version: registration.version,
            scout_id,
            event_id,
            note: registration.note.clone(),
            status: registration.status,
            registration_date: registration.registration_date,
            account_id: registration.account_id.clone(),
        })
    }

    fn embed(self, scout: Scout, event: Event) -> Registration {
        Registration {
            id: self.id,
            version: self.version,
            scout,
            event,
            note: self.note,
            status: self.status,
            registration_date: self.registration_date,
            account_id: self.account_id,
        }
    }
}

impl Versioned for RegistrationRecord {
    const KIND: &'static str = Registration::KIND;

    fn id(&self) -> Option<Id> {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn with_identity(mut self, id: Id, version: i64) -> Self {
        self.id = Some(id);
        self.version = version;
        self
    }
}

/// Embeds the full, current Scout and Event into each registration record.
///
/// Registrations are never rebuilt from a single wide join: each scout and
/// event is fetched through its own reconstruction, once per distinct id.
/// Records are deduplicated by id and returned in id order. A record whose
/// scout or event cannot be found is a dangling reference.
pub fn assemble_registrations<I, FS, FE>(
    records: I,
    mut fetch_scout: FS,
    mut fetch_event: FE,
) -> AppResult<Vec<Registration>>
where
    I: IntoIterator<Item = RegistrationRecord>,
    FS: FnMut(Id) -> AppResult<Option<Scout>>,
    FE: FnMut(Id) -> AppResult<Option<Event>>,
{
    let mut by_id: BTreeMap<Id, RegistrationRecord> = BTreeMap::new();
    for record in records {
        if let Some(id) = record.id {
            by_id.entry(id).or_insert(record);
        }
    }

    let mut scouts: HashMap<Id, Scout> = HashMap::new();
    let mut events: HashMap<Id, Event> = HashMap::new();
    let mut registrations = Vec::with_capacity(by_id.len());

    for (id, record) in by_id {
        if !scouts.contains_key(&record.scout_id) {
            let scout = fetch_scout(record.scout_id)?.ok_or_else(|| {
                AppError::ConstraintViolation(format!(
                    "Registration {} references missing scout {}",
                    id, record.scout_id
                ))
            })?;
            scouts.insert(record.scout_id, scout);
        }
        if !events.contains_key(&record.event_id) {
            let event = fetch_event(record.event_id)?.ok_or_else(|| {
                AppError::ConstraintViolation(format!(
                    "Registration {} references missing event {}",
                    id, record.event_id
                ))
            })?;
            events.insert(record.event_id, event);
        }

        let scout = scouts[&record.scout_id].clone();
        let event = events[&record.event_id].clone();
        registrations.push(record.embed(scout, event));
    }

    Ok(registrations)
}

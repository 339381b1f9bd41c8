//! Write-time timestamp stamping.
//!
//! Repositories call [`stamp_on_write`] on every record they persist. Creation
//! sets both timestamps to the same instant; updates only move `updated_at`.

use chrono::{DateTime, Utc};

use crate::models::{Entry, Metadata, Project, Tag, Template};

/// Whether a record is being inserted or updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Create,
    Update,
}

impl WriteKind {
    pub fn from_is_new(is_new: bool) -> Self {
        if is_new {
            WriteKind::Create
        } else {
            WriteKind::Update
        }
    }
}

/// A persisted record carrying creation and modification timestamps.
pub trait Stamped {
    fn set_created_at(&mut self, at: DateTime<Utc>);
    fn set_updated_at(&mut self, at: DateTime<Utc>);
}

/// Stamp `record` for a write happening at `now`.
pub fn stamp_on_write<T: Stamped>(mut record: T, kind: WriteKind, now: DateTime<Utc>) -> T {
    if kind == WriteKind::Create {
        record.set_created_at(now);
    }
    record.set_updated_at(now);
    record
}

macro_rules! impl_stamped {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Stamped for $ty {
                fn set_created_at(&mut self, at: DateTime<Utc>) {
                    self.created_at = at;
                }
                fn set_updated_at(&mut self, at: DateTime<Utc>) {
                    self.updated_at = at;
                }
            }
        )*
    };
}

impl_stamped!(Entry, Tag, Metadata, Project, Template);

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn tag_at(at: DateTime<Utc>) -> Tag {
        Tag {
            id: Uuid::nil(),
            name: "rust".to_string(),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_create_sets_both() {
        let epoch = Utc.timestamp_opt(0, 0).unwrap();
        let now = Utc::now();
        let tag = stamp_on_write(tag_at(epoch), WriteKind::Create, now);
        assert_eq!(tag.created_at, now);
        assert_eq!(tag.updated_at, now);
    }

    #[test]
    fn test_update_only_moves_updated_at() {
        let created = Utc::now() - Duration::days(3);
        let now = Utc::now();
        let tag = stamp_on_write(tag_at(created), WriteKind::Update, now);
        assert_eq!(tag.created_at, created);
        assert_eq!(tag.updated_at, now);
    }

    #[test]
    fn test_from_is_new() {
        assert_eq!(WriteKind::from_is_new(true), WriteKind::Create);
        assert_eq!(WriteKind::from_is_new(false), WriteKind::Update);
    }

    #[test]
    fn test_untouched_fields_survive() {
        let now = Utc::now();
        let tag = stamp_on_write(tag_at(now), WriteKind::Update, now);
        assert_eq!(tag.name, "rust");
        assert_eq!(tag.id, Uuid::nil());
    }
}

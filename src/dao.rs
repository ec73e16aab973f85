use crate::column::Column;
use crate::entity::Entity;
use crate::error::Result;

/// Create, read, update, delete and search over one entity type.
///
/// Failures during a call are logged and turned into sentinel values, so an
/// absent result means "not found" or "failed" alike. Implementations hold
/// database resources that must be released through [`Dao::close`] on every
/// exit path.
pub trait Dao<T: Entity> {
    fn entity_name(&self) -> &str;

    /// Inserts `obj` and returns it as stored, identifying value included.
    fn create(&mut self, obj: Option<&T>) -> Option<T>;
    fn find(&mut self, id: i64) -> Option<T>;
    /// Whether the update executed without error, `false` for `None`.
    fn update(&mut self, obj: Option<&T>) -> bool;
    /// Whether the delete executed without error. Deleting `None` is a
    /// successful no-op.
    fn delete(&mut self, obj: Option<&T>) -> bool;
    /// Reads the whole table into memory, mind the size.
    fn retrieve_all(&mut self) -> Vec<T>;
    /// Prefix match for textual columns, exact match otherwise. Without a
    /// column or a value this is [`Dao::retrieve_all`].
    fn search(&mut self, column: Option<&Column>, value: Option<&str>) -> Vec<T>;

    fn close(&mut self) -> Result<()>;
    fn is_closed(&self) -> bool;
}

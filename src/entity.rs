use crate::column::{ColumnMap, EntityColumn};

/// A record type that can describe its own persisted shape.
///
/// Implementations report their table, their columns in declaration order and
/// the text form of their identifying value. Exactly one of the declared
/// columns must be flagged as identifying; an entity without one cannot be
/// persisted and is rejected when SQL is first generated for it.
///
/// ```
/// use sqldao::column::{Column, ColumnMap, ColumnType, EntityColumn};
/// use sqldao::entity::Entity;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// enum BookColumn { Id, Title }
///
/// impl EntityColumn for BookColumn {
///     fn column(&self) -> Column {
///         match self {
///             BookColumn::Id => Column::id("id", ColumnType::Integer),
///             BookColumn::Title => Column::new("title", ColumnType::Text, false),
///         }
///     }
///     fn all() -> &'static [Self] {
///         &[BookColumn::Id, BookColumn::Title]
///     }
/// }
///
/// #[derive(Debug, Clone, Default)]
/// struct Book { id: Option<i64>, title: String }
///
/// impl Entity for Book {
///     type Key = BookColumn;
///     fn entity_name(&self) -> &str { "Book" }
///     fn entity_columns(&self) -> ColumnMap<BookColumn> { ColumnMap::from_keys() }
///     fn id(&self) -> String { self.id.map(|id| id.to_string()).unwrap_or_default() }
/// }
///
/// assert_eq!(Book::default().entity_columns().len(), 2);
/// ```
pub trait Entity: Clone + 'static {
    type Key: EntityColumn;

    /// Table identifier.
    fn entity_name(&self) -> &str;
    fn entity_columns(&self) -> ColumnMap<Self::Key>;
    /// Text form of the identifying value, empty while the entity is unsaved.
    fn id(&self) -> String;
}

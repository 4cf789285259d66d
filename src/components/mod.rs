pub mod collection_table;
pub mod entity_preview;
pub mod field_widget;
pub mod hooks;
pub mod popup_field;
pub mod ui;

pub use collection_table::CollectionTable;
pub use entity_preview::EntityPreview;
pub use field_widget::FieldWidget;
pub use popup_field::PopupFormField;

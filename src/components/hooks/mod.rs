pub mod use_debounced_data;
pub mod use_random;
pub mod use_window_size;

pub use use_debounced_data::use_debounced_data;
pub use use_random::use_random_id_for;
pub use use_window_size::use_window_size;

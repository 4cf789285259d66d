pub mod alert;
pub mod button;
pub mod input;
pub mod label;

pub use alert::*;
pub use button::*;
pub use input::*;
pub use label::*;

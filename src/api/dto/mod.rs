pub mod boards;
pub mod print;
pub mod settings;

pub use boards::*;
pub use print::*;
pub use settings::*;

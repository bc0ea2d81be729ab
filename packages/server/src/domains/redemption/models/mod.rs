pub mod redemption_code;

pub use redemption_code::*;

mod decode;
mod encode;
mod remux;

pub use decode::Decode;
pub use encode::Encode;
pub use remux::Remux;

mod gray;
pub use gray::*;

mod hsv;
pub use hsv::*;

mod rgb;
pub use rgb::*;

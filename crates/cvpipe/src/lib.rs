#![doc = env!("CARGO_PKG_DESCRIPTION")]

#[doc(inline)]
pub use cvpipe_image as image;

#[doc(inline)]
pub use cvpipe_imgproc as imgproc;

#[doc(inline)]
pub use cvpipe_io as io;

#[doc(inline)]
pub use cvpipe_pipeline as pipeline;

mod encoder;

pub use encoder::DocumentEncoder;

pub mod hada;
pub mod static_source;

pub use hada::HadaNewsSource;
pub use static_source::StaticNewsSource;

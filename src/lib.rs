pub mod error;
pub mod fields;
pub mod h1;

#[cfg(feature = "bin")]
#[doc(hidden)]
pub mod app;

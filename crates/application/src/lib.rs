pub mod providers;
pub mod usecases;

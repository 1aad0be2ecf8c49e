pub mod aggregate;
pub mod boundary;
pub mod record;
pub mod selection;
pub mod series;
pub mod store;

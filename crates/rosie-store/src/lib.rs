//! Dataset IO: CSV/xz loading, the company join, module adapters and the
//! compressed suspicions output.

mod error;
pub use error::StoreError;

pub mod adapter;
pub mod csv;
pub mod join;
pub mod output;
pub mod source;
pub mod table;

pub use adapter::{Adapter, ChamberOfDeputiesAdapter, FederalSenateAdapter, adapter_for};
pub use output::{write_atomic, write_csv_xz};
pub use source::{DatasetSource, LocalFiles};

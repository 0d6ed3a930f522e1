pub mod tsv;

pub use tsv::Tsv;

pub struct Reader;

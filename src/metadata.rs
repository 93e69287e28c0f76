mod metadata_parser;
mod metadata_record;

pub use metadata_parser::{NameParts, parse_metadata, parse_name_parts};
pub use metadata_record::MetadataRecord;

mod generate_u16_id;
pub use generate_u16_id::generate_u16_id;

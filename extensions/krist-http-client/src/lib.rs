mod http_client;
mod paged_list;

pub use http_client::{DEFAULT_USER_AGENT, KristHttpClient, take_field};
pub use paged_list::PagedList;

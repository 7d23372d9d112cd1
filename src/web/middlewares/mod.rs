mod ident;
pub use ident::{IDENT_HEADER, extract_context_fn};
